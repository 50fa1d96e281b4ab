use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use lettersearch_core::{JsonLetterStore, Letter, SearchConfig};
use serde_json::Value;
use server::AppOptions;
use std::fs;
use tempfile::{tempdir, TempDir};
use time::macros::date;
use tower::ServiceExt;

fn build_tiny_archive() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Schwartze");
    for (folder, text) in [("1", "hello world"), ("2", "hello there")] {
        fs::create_dir_all(root.join(folder)).unwrap();
        fs::write(root.join(folder).join("tekst.txt"), text).unwrap();
    }
    fs::create_dir_all(root.join("3")).unwrap();

    let letters: JsonLetterStore =
        vec![Letter::new(1, Some(date!(1915 - 05 - 01))), Letter::new(2, Some(date!(1910 - 02 - 14)))]
            .into_iter()
            .collect();
    let options = AppOptions { admin_token: Some("secret".into()), allowed_origins: vec!["https://brieven.example".into()] };
    let app = server::build_app(SearchConfig::new(root), letters, options);
    (dir, app)
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn index_request(token: &str) -> Request<Body> {
    Request::post("/index").header("X-ADMIN-TOKEN", token).body(Body::empty()).unwrap()
}

fn numbers(json: &Value) -> Vec<i64> {
    json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["record"]["number"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn index_then_search() {
    let (_dir, app) = build_tiny_archive();

    let (status, outcome) = call(&app, index_request("secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["indexed"], 2);

    let (status, json) = call(&app, get("/search?q=hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 2);
    assert_eq!(numbers(&json), vec![2, 1]);
    assert_eq!(json["results"][0]["status"], "found");
    assert_eq!(json["results"][0]["record"]["date"], "1910-02-14");

    let (status, json) = call(&app, get("/fuzzy?q=helo")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&json), vec![2, 1]);
}

#[tokio::test]
async fn post_search_accepts_request_body() {
    let (_dir, app) = build_tiny_archive();
    call(&app, index_request("secret")).await;

    let req = Request::post("/search")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"search_term": "wrold", "fuzzy": true}"#))
        .unwrap();
    let (status, json) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&json), vec![1]);
}

#[tokio::test]
async fn rejects_bad_queries_and_tokens() {
    let (_dir, app) = build_tiny_archive();
    let (status, _) = call(&app, index_request("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // No index yet.
    let (status, _) = call(&app, get("/search?q=hello")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    call(&app, index_request("secret")).await;
    let (status, _) = call(&app, get("/search?q=%3F%3F")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_allows_only_the_configured_origin() {
    let (_dir, app) = build_tiny_archive();
    let allowed = Request::get("/health").header("origin", "https://brieven.example").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "https://brieven.example");

    let other = Request::get("/health").header("origin", "https://elders.example").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(other).await.unwrap();
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}
