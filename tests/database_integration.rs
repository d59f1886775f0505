//! Integration tests with live stores
//!
//! These tests require running services.
//! Set POSTGRES_TEST_URL and/or MONGO_TEST_URI to run them.

use catalog_loader::config::LoaderSettings;
use catalog_loader::pipeline::{document_plan, relational_plan, run_documents, run_relational};
use catalog_loader::schema::catalog;
use catalog_loader::source::parse_catalog;
use catalog_loader::store::{MongoStore, PostgresStore, TargetStore};
use serde_json::json;

const TEST_DATABASE: &str = "catalog_loader_test";

fn postgres_url() -> Option<String> {
    std::env::var("POSTGRES_TEST_URL").ok()
}

fn mongo_uri() -> Option<String> {
    std::env::var("MONGO_TEST_URI").ok()
}

fn users() -> Vec<catalog_loader::Record> {
    vec![
        json!({"user_id": "IT-U1", "age": 40, "country": "Chile", "registration_date": "2022-05-01"}),
        json!({"user_id": "IT-U2", "subscription_type": "Basic", "total_watch_time_hours": 3.5}),
    ]
    .into_iter()
    .map(|v| v.as_object().unwrap().clone())
    .collect()
}

fn sessions() -> Vec<catalog_loader::Record> {
    vec![json!({
        "session_id": "IT-S1",
        "user_id": "IT-U1",
        "content_id": "M001",
        "watch_date": "2024-02-01",
        "watch_duration_minutes": 30,
        "completion_percentage": 50.0
    })]
    .into_iter()
    .map(|v| v.as_object().unwrap().clone())
    .collect()
}

#[tokio::test]
async fn test_postgres_connection() {
    let Some(url) = postgres_url() else {
        println!("Skipping: POSTGRES_TEST_URL not set");
        return;
    };

    let store = PostgresStore::connect_url(&url).await;
    assert!(store.is_ok(), "Failed to connect: {:?}", store.err());

    let store = store.unwrap();
    assert!(store.describe().starts_with("PostgreSQL"));
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_postgres_pipeline_rerun_keeps_row_counts() {
    let Some(url) = postgres_url() else {
        println!("Skipping: POSTGRES_TEST_URL not set");
        return;
    };

    let plan = relational_plan(users(), sessions(), &LoaderSettings::default()).unwrap();

    let store = PostgresStore::connect_url(&url).await.unwrap();
    run_relational(&store, &plan).await.unwrap();

    let store = PostgresStore::connect_url(&url).await.unwrap();
    let users_before = store.count(catalog::USERS).await.unwrap();
    let sessions_before = store.count(catalog::VIEWING_SESSIONS).await.unwrap();

    let report = run_relational(&store, &plan).await.unwrap();
    assert_eq!(report.records_written(), 0);

    let store = PostgresStore::connect_url(&url).await.unwrap();
    assert_eq!(store.count(catalog::USERS).await.unwrap(), users_before);
    assert_eq!(
        store.count(catalog::VIEWING_SESSIONS).await.unwrap(),
        sessions_before
    );
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_mongo_document_pipeline() {
    let Some(uri) = mongo_uri() else {
        println!("Skipping: MONGO_TEST_URI not set");
        return;
    };

    let content = parse_catalog(
        r#"{
            "movies": [
                {"content_id": "IT-M1", "title": "Test Movie", "genre": ["Drama"], "release_year": 2020, "rating": 4.0, "views_count": 10, "production_budget": 1000}
            ],
            "series": [
                {"content_id": "IT-S1", "title": "Test Series", "genre": ["Crime"], "seasons": 5, "total_views": 100000, "episodes_per_season": [10, 10, 10, 10, 10], "production_budget": 40000000}
            ]
        }"#,
        "inline",
    )
    .unwrap();
    let plan = document_plan(content, Vec::new(), &LoaderSettings::default()).unwrap();

    let store = MongoStore::connect(&uri, TEST_DATABASE).await.unwrap();
    let report = run_documents(&store, &plan).await.unwrap();

    assert_eq!(report.batches_failed(), 0);
    assert_eq!(report.queries.len(), 4);
    assert!(report.queries[1].rows.len() <= 3);

    let store = MongoStore::connect(&uri, TEST_DATABASE).await.unwrap();
    assert!(store.count(catalog::MOVIES).await.unwrap() >= 1);
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_mongo_rejects_document_without_title() {
    let Some(uri) = mongo_uri() else {
        println!("Skipping: MONGO_TEST_URI not set");
        return;
    };

    let store = MongoStore::connect(&uri, TEST_DATABASE).await.unwrap();
    let schema = catalog::movies();
    if !store.entity_exists(catalog::MOVIES).await.unwrap() {
        store.create_entity(&schema).await.unwrap();
    }

    let untitled = json!({"content_id": "IT-NO-TITLE", "genre": ["Drama"]});
    let result = store
        .insert_batch(&schema, &[untitled.as_object().unwrap().clone()])
        .await;

    assert!(result.is_err(), "expected validator rejection, got {result:?}");
    store.close().await.unwrap();
}
