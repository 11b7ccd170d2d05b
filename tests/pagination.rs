mod common;

use axum::{http::StatusCode, Router};
use common::*;
use serde_json::json;

async fn seeded(n: usize) -> Router {
    let mut cfg = potato_config();
    cfg.pagination = true;
    let app = app(vec![memory_router(&cfg)]);
    for i in 0..n {
        let body = json!({ "thickness": i as f64, "mass": 1.0, "color": "Red" });
        assert_eq!(send(&app, "POST", "/potato", Some(body)).await.0, StatusCode::CREATED);
    }
    app
}

#[tokio::test]
async fn pages_walk_the_collection() {
    let app = seeded(7).await;
    let (status, body) = send(&app, "GET", "/potato?page=1&size=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(7));
    assert_eq!(body["pages"], json!(3));
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["items"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["items"][0]["id"], json!(1));

    let (_, last) = send(&app, "GET", "/potato?page=3&size=3", None).await;
    assert_eq!(last["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(last["items"][0]["id"], json!(7));

    let (_, past) = send(&app, "GET", "/potato?page=9&size=3", None).await;
    assert_eq!(past["items"], json!([]));
    assert_eq!(past["total"], json!(7));
}

#[tokio::test]
async fn default_page_size() {
    let app = seeded(2).await;
    let (_, body) = send(&app, "GET", "/potato", None).await;
    assert_eq!(body["size"], json!(50));
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["pages"], json!(1));
}

#[tokio::test]
async fn empty_collection_has_zero_pages() {
    let app = seeded(0).await;
    let (_, body) = send(&app, "GET", "/potato", None).await;
    assert_eq!(body["total"], json!(0));
    assert_eq!(body["pages"], json!(0));
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn invalid_page_params_are_422() {
    let app = seeded(1).await;
    for q in ["page=0", "page=-1", "page=abc", "size=0", "size=101", "size=x"] {
        let (status, body) = send(&app, "GET", &format!("/potato?{}", q), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", q);
        assert_eq!(body["error"]["details"][0]["loc"][0], json!("query"), "{}", q);
    }
    assert_eq!(send(&app, "GET", "/potato?size=100", None).await.0, StatusCode::OK);
}

#[tokio::test]
async fn page_beyond_offset_range_is_422() {
    let app = seeded(1).await;
    let (status, body) = send(&app, "GET", "/potato?page=9223372036854775807&size=100", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["loc"], json!(["query", "page"]));
}

#[tokio::test]
async fn total_counts_the_filtered_set() {
    let app = seeded(5).await;
    let filter = encode(r#"{"field":"thickness","op":">=","value":3}"#);
    let (_, body) = send(&app, "GET", &format!("/potato?size=1&filter={}", filter), None).await;
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["pages"], json!(2));
    assert_eq!(body["items"][0]["id"], json!(4));
}
