use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crudlayer::memory::InMemoryStore;

use crate::{app::build_app, settings::Settings};

async fn app() -> Router {
    let mut settings = Settings::default();
    settings.search.page_size = 2;

    build_app(InMemoryStore::new(), &settings).await.unwrap()
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

fn book(id: &str, title: &str, author: &str, categories: &[&str]) -> Value {
    json!({
        "book_id": id,
        "title": title,
        "author": author,
        "description": "A book",
        "categories": categories,
    })
}

async fn seeded() -> Router {
    let app = app().await;
    for body in [
        book("book_0", "Title A", "Author A", &["Category A"]),
        book("book_1", "Title B", "Author A", &["Category B"]),
        book("book_3", "Title A", "Author B", &["Category A", "Category B"]),
    ] {
        let (status, _) = send(&app, Method::POST, "/api/books", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    app
}

fn ids(page: &Value) -> Vec<&str> {
    page["result"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["book_id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn insert_answers_created_with_ok_status() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(book("book_0", "Dune", "Frank Herbert", &[])),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "result": { "status": "OK" } }));
}

#[tokio::test]
async fn read_one_returns_item_or_not_found() {
    let app = seeded().await;

    let (status, body) = send(&app, Method::GET, "/api/books/book_1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], book("book_1", "Title B", "Author A", &["Category B"]));

    let (status, body) = send(&app, Method::GET, "/api/books/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 200_002);
    assert_eq!(body["error"]["name"], "ObjectIDNotFound");
}

#[tokio::test]
async fn duplicate_insert_is_a_bad_request() {
    let app = seeded().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(book("book_9", "Title A", "Author A", &[])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["name"], "DataAlreadyInUsed");
}

#[tokio::test]
async fn search_pages_and_filters() {
    let app = seeded().await;

    let (status, body) = send(&app, Method::GET, "/api/books", Some(json!({ "current_page": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["page"], 1);
    assert_eq!(body["result"]["total_pages"], 2);
    assert_eq!(body["result"]["count"], 3);
    assert_eq!(ids(&body), vec!["book_0", "book_3"]);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/books",
        Some(json!({
            "current_page": 1,
            "title": { "match_type": 1, "value": "b" },
        })),
    )
    .await;
    assert_eq!(ids(&body), vec!["book_1"]);
    assert_eq!(body["result"]["total_pages"], 1);
}

#[tokio::test]
async fn search_errors_are_reported_with_codes() {
    let app = seeded().await;

    let (status, body) = send(&app, Method::GET, "/api/books", Some(json!({ "current_page": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["name"], "CurrentPageInvalid");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/books",
        Some(json!({
            "current_page": 1,
            "author": { "match_type": -1, "value": "a" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 200_004);
}

#[tokio::test]
async fn update_answers_no_content() {
    let app = seeded().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/books",
        Some(json!({ "book_id": "book_0", "description": "Revised" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, body) = send(&app, Method::GET, "/api/books/book_0", None).await;
    assert_eq!(body["result"]["description"], "Revised");
    assert_eq!(body["result"]["title"], "Title A");
}

#[tokio::test]
async fn delete_uses_key_from_body() {
    let app = seeded().await;

    let (status, _) = send(&app, Method::DELETE, "/api/books", Some(json!({ "book_id": "book_0" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, "/api/books", Some(json!({ "book_id": "book_0" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/api/books", Some(json!({ "title": "Title B" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["name"], "DataValidationFailed");
}

#[tokio::test]
async fn malformed_body_is_a_validation_failure() {
    let app = app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"user_id\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], 200_009);
}

#[tokio::test]
async fn users_are_served_alongside_books() {
    let app = app().await;
    let user = json!({
        "user_id": "user_1",
        "username": "alice",
        "password": "secret",
        "account_name": "Alice",
        "email": "alice@example.com",
    });

    let (status, _) = send(&app, Method::POST, "/api/users", Some(user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/users",
        Some(json!({ "current_page": 1, "user_id": "user_1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["data"], json!([user]));
}
