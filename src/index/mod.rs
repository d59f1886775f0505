//! Secondary indexes
//!
//! Index declarations supporting the aggregation queries, and the builder
//! that issues them against a store. Creation is idempotent on every store.

mod builder;
mod types;

pub use builder::IndexBuilder;
pub use types::{IndexKey, IndexSpec};

use crate::types::SortOrder;

/// Indexes on the `movies` collection
pub fn movie_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::single("title"),
        IndexSpec::single("release_year"),
        genre_rating(),
    ]
}

/// Indexes on the `series` collection
pub fn series_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::single("title"),
        IndexSpec::single("seasons"),
        genre_rating(),
    ]
}

/// Indexes on the `viewing_sessions` table
pub fn session_indexes() -> Vec<IndexSpec> {
    vec![IndexSpec::single("user_id"), IndexSpec::single("content_id")]
}

fn genre_rating() -> IndexSpec {
    IndexSpec::compound([
        ("genre", SortOrder::Ascending),
        ("rating", SortOrder::Descending),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog;
    use crate::store::{MemoryDocumentStore, TargetStore};

    #[test]
    fn test_index_names() {
        assert_eq!(IndexSpec::single("title").name("movies"), "movies_title_asc");
        assert_eq!(
            genre_rating().name("series"),
            "series_genre_asc_rating_desc"
        );
        assert_eq!(
            IndexSpec::unique("content_id").name("movies"),
            "movies_content_id_asc_key"
        );
    }

    #[test]
    fn test_catalog_indexes() {
        let movies = movie_indexes();
        assert_eq!(movies.len(), 3);
        assert_eq!(movies[1].fields(), vec!["release_year"]);
        assert_eq!(movies[2].fields(), vec!["genre", "rating"]);
        assert_eq!(movies[2].keys[1].order, SortOrder::Descending);

        let series = series_indexes();
        assert_eq!(series[1].fields(), vec!["seasons"]);
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store.create_entity(&catalog::movies()).await.unwrap();
        let builder = IndexBuilder::new(&store);

        builder.build("movies", &movie_indexes()).await.unwrap();
        builder.build("movies", &movie_indexes()).await.unwrap();

        // the primary key index plus the three declared ones
        assert_eq!(store.index_names("movies").len(), 4);
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_field() {
        let store = MemoryDocumentStore::new();
        store.create_entity(&catalog::movies()).await.unwrap();
        let builder = IndexBuilder::new(&store);

        let result = builder
            .build("movies", &[IndexSpec::single("title; drop")])
            .await;
        assert!(result.is_err());
        assert_eq!(store.index_names("movies").len(), 1);
    }
}
