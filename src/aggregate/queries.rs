//! The canonical validation queries run after every document load

use super::types::{Accumulator, AggregationQuery, Condition, Pipeline, Projection};
use crate::schema::catalog::{MOVIES, SERIES};

/// Minimum average rating kept by [`yearly_rating_budget`]
pub const MIN_AVG_RATING: i64 = 3;
/// Number of genres kept by [`top_genres_by_views`]
pub const TOP_GENRES: usize = 3;
/// Minimum summed views kept by [`high_engagement_genres`]
pub const MIN_GENRE_VIEWS: i64 = 100_000;
/// Minimum average budget kept by [`high_engagement_genres`]
pub const MIN_GENRE_BUDGET: i64 = 40_000_000;
/// Minimum season count kept by [`long_running_series`]
pub const MIN_SEASONS: i64 = 5;
/// Minimum episode count kept by [`long_running_series`]
pub const MIN_EPISODES: i64 = 50;

/// Average rating and budget per release year, well-rated years only,
/// biggest budgets first
pub fn yearly_rating_budget() -> AggregationQuery {
    AggregationQuery::new(
        "yearly_rating_budget",
        "Average rating and budget per release year (movies)",
        MOVIES,
        Pipeline::new()
            .group_by(
                "release_year",
                vec![
                    Accumulator::avg("avg_rating", "rating"),
                    Accumulator::avg("avg_budget", "production_budget"),
                ],
            )
            .matching(vec![Condition::gte("avg_rating", MIN_AVG_RATING)])
            .sort_desc("avg_budget"),
    )
}

/// Most watched movie genres, one row per genre value
pub fn top_genres_by_views() -> AggregationQuery {
    AggregationQuery::new(
        "top_genres_by_views",
        "Top genres by total views (movies)",
        MOVIES,
        Pipeline::new()
            .unwind("genre")
            .group_by("genre", vec![Accumulator::sum("total_views", "views_count")])
            .sort_desc("total_views")
            .limit(TOP_GENRES),
    )
}

/// Series genre lists with high reach and high average budget
pub fn high_engagement_genres() -> AggregationQuery {
    AggregationQuery::new(
        "high_engagement_genres",
        "High-engagement genres: total views and average budget (series)",
        SERIES,
        Pipeline::new()
            .group_by(
                "genre",
                vec![
                    Accumulator::sum("total_views", "total_views"),
                    Accumulator::avg("avg_budget", "production_budget"),
                ],
            )
            .matching(vec![
                Condition::gte("total_views", MIN_GENRE_VIEWS),
                Condition::gte("avg_budget", MIN_GENRE_BUDGET),
            ])
            .sort_desc("total_views"),
    )
}

/// Series with many seasons and many episodes
pub fn long_running_series() -> AggregationQuery {
    AggregationQuery::new(
        "long_running_series",
        "Long-running series: 5+ seasons and 50+ episodes",
        SERIES,
        Pipeline::new()
            .project(vec![
                Projection::field("title"),
                Projection::field("seasons"),
                Projection::field("episodes_per_season"),
                Projection::sum("total_episodes", "episodes_per_season"),
            ])
            .matching(vec![
                Condition::gte("seasons", MIN_SEASONS),
                Condition::gte("total_episodes", MIN_EPISODES),
            ])
            .sort_desc("total_episodes"),
    )
}

/// The four canonical queries, in execution order
pub fn canonical_queries() -> Vec<AggregationQuery> {
    vec![
        yearly_rating_budget(),
        top_genres_by_views(),
        high_engagement_genres(),
        long_running_series(),
    ]
}
