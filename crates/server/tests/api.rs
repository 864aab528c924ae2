use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{Engine, LocalBlobStore};
use migration::MigratorTrait;
use server::{ServerOptions, ServerState, router};

const BASE_URL: &str = "http://localhost:3000/attachments";

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    let root = std::env::temp_dir().join(format!("expensa_server_{}", Uuid::new_v4()));
    let blobs = LocalBlobStore::new(root, BASE_URL);

    router(ServerState::new(
        engine,
        db,
        blobs,
        ServerOptions {
            page_size: 2,
            page_siblings: 1,
        },
    ))
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user, "password"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn create_expense(app: &Router, amount: f64, currency: &str, date: &str) -> Value {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({ "amount": amount, "currency": currency, "date": date })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn requests_without_valid_credentials_are_rejected() {
    let app = app().await;

    let (status, body) = send(&app, request("GET", "/expenses", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let bad = Request::builder()
        .uri("/expenses")
        .header(header::AUTHORIZATION, basic("alice", "nope"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, bad).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_expenses_are_listed_with_formatted_amounts() {
    let app = app().await;
    let created = create_expense(&app, 1234.5, "usd", "2024-01-05").await;
    assert_eq!(created["currency"], "USD");
    assert_eq!(created["formatted_amount"], "$1,234.50");
    assert_eq!(created["category_label"], "Uncategorized");

    let (status, body) = send(&app, request("GET", "/expenses", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["expenses"][0]["id"], created["id"]);

    let (status, body) = send(&app, request("GET", "/expenses", Some("bob"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 0);
}

#[tokio::test]
async fn list_is_filtered_sorted_and_paginated() {
    let app = app().await;
    create_expense(&app, 100.0, "USD", "2024-01-05").await;
    create_expense(&app, 50.0, "USD", "2024-01-10").await;
    create_expense(&app, 30.0, "EUR", "2024-01-01").await;

    let (status, body) = send(&app, request("GET", "/expenses", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["expenses"][0]["date"], "2024-01-10");
    assert_eq!(body["expenses"][1]["date"], "2024-01-05");
    assert_eq!(body["links"], json!([{ "page": 1 }, { "page": 2 }]));

    let (_, body) = send(
        &app,
        request(
            "GET",
            "/expenses?sort=amount&order=asc&page=2",
            Some("alice"),
            None,
        ),
    )
    .await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["expenses"][0]["amount"], 100.0);
    assert_eq!(body["start_index"], 2);
    assert_eq!(body["end_index"], 3);

    let (_, body) = send(
        &app,
        request("GET", "/expenses?currency=EUR", Some("alice"), None),
    )
    .await;
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["expenses"][0]["date"], "2024-01-01");
}

#[tokio::test]
async fn stats_report_totals_per_currency() {
    let app = app().await;
    create_expense(&app, 100.0, "USD", "2024-01-05").await;
    create_expense(&app, 50.0, "USD", "2024-01-10").await;
    create_expense(&app, 30.0, "EUR", "2024-01-01").await;

    let (status, body) = send(&app, request("GET", "/stats", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["primary_currency"], "USD");
    assert_eq!(body["has_multiple_currencies"], true);
    assert_eq!(body["currencies"][0]["currency"], "USD");
    assert_eq!(body["currencies"][0]["total"], 150.0);
    assert_eq!(body["currencies"][0]["formatted_total"], "$150.00");
    assert_eq!(body["top_category"]["name"], "Uncategorized");

    let (status, body) = send(&app, request("GET", "/stats", Some("bob"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["primary_currency"], Value::Null);
}

#[tokio::test]
async fn invalid_input_maps_to_422() {
    let app = app().await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({ "amount": -1.0, "currency": "USD", "date": "2024-01-01" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({ "amount": 1.0, "currency": "US$", "date": "2024-01-01" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        request(
            "GET",
            "/expenses?start_date=2024-02-01&end_date=2024-01-01",
            Some("alice"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn expenses_of_other_users_are_not_found() {
    let app = app().await;
    let created = create_expense(&app, 10.0, "USD", "2024-01-05").await;
    let uri = format!("/expenses/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, request("GET", &uri, Some("bob"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        request("PATCH", &uri, Some("bob"), Some(json!({ "amount": 1.0 }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("DELETE", &uri, Some("bob"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("DELETE", &uri, Some("alice"), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request("GET", &uri, Some("alice"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn receipts_are_uploaded_served_and_removed() {
    let app = app().await;
    let data = vec![137u8, 80, 78, 71, 1, 2, 3, 4];
    let (status, created) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({
                "amount": 12.0,
                "currency": "EUR",
                "date": "2024-03-01",
                "description": "Lunch",
                "attachment": {
                    "name": "lunch.png",
                    "content_type": "image/png",
                    "data_base64": STANDARD.encode(&data),
                },
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["attachment"]["name"], "lunch.png");

    let url = created["attachment"]["url"].as_str().unwrap();
    let path = url.strip_prefix("http://localhost:3000").unwrap();
    let response = app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), data.as_slice());

    let uri = format!("/expenses/{}", created["id"].as_str().unwrap());
    let (status, updated) = send(
        &app,
        request(
            "PATCH",
            &uri,
            Some("alice"),
            Some(json!({ "remove_attachment": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["attachment"], Value::Null);
    assert_eq!(updated["description"], "Lunch");

    let (status, _) = send(&app, request("GET", path, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_receipts_are_rejected() {
    let app = app().await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({
                "amount": 12.0,
                "currency": "EUR",
                "date": "2024-03-01",
                "attachment": {
                    "name": "notes.txt",
                    "content_type": "text/plain",
                    "data_base64": STANDARD.encode(b"hello"),
                },
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({
                "amount": 12.0,
                "currency": "EUR",
                "date": "2024-03-01",
                "attachment": {
                    "name": "lunch.png",
                    "content_type": "image/png",
                    "data_base64": "not base64!",
                },
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn categories_can_be_created_listed_and_deleted() {
    let app = app().await;

    let (status, food) = send(
        &app,
        request(
            "POST",
            "/categories",
            Some("alice"),
            Some(json!({ "name": "Food", "icon": "🍔" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/categories",
            Some("alice"),
            Some(json!({ "name": "Food" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, expense) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({
                "amount": 8.0,
                "currency": "USD",
                "date": "2024-02-02",
                "category_id": food["id"],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(expense["category_label"], "Food");

    let (_, listed) = send(&app, request("GET", "/categories", Some("alice"), None)).await;
    assert_eq!(listed["categories"][0]["name"], "Food");

    let uri = format!("/categories/{}", food["id"].as_str().unwrap());
    let (status, _) = send(&app, request("DELETE", &uri, Some("alice"), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let expense_uri = format!("/expenses/{}", expense["id"].as_str().unwrap());
    let (_, reloaded) = send(&app, request("GET", &expense_uri, Some("alice"), None)).await;
    assert_eq!(reloaded["category_label"], "Uncategorized");
    assert_eq!(reloaded["category"], Value::Null);
}

#[tokio::test]
async fn categories_are_private_to_their_owner() {
    let app = app().await;

    let (status, food) = send(
        &app,
        request(
            "POST",
            "/categories",
            Some("alice"),
            Some(json!({ "name": "Food" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, expense) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({
                "amount": 8.0,
                "currency": "USD",
                "date": "2024-02-02",
                "category_id": food["id"],
            })),
        ),
    )
    .await;

    let (_, listed) = send(&app, request("GET", "/categories", Some("bob"), None)).await;
    assert_eq!(listed["categories"], json!([]));

    let uri = format!("/categories/{}", food["id"].as_str().unwrap());
    let (status, body) = send(&app, request("DELETE", &uri, Some("bob"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let expense_uri = format!("/expenses/{}", expense["id"].as_str().unwrap());
    let (_, reloaded) = send(&app, request("GET", &expense_uri, Some("alice"), None)).await;
    assert_eq!(reloaded["category_label"], "Food");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/categories",
            Some("bob"),
            Some(json!({ "name": "Food" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn pdf_form(len: usize) -> Value {
    json!({
        "amount": 120.0,
        "currency": "USD",
        "date": "2024-07-01",
        "attachment": {
            "name": "invoice.pdf",
            "content_type": "application/pdf",
            "data_base64": STANDARD.encode(vec![b'%'; len]),
        },
    })
}

#[tokio::test]
async fn receipts_up_to_the_upload_limit_are_accepted() {
    let app = app().await;

    let (status, created) = send(
        &app,
        request("POST", "/expenses", Some("alice"), Some(pdf_form(3 * 1024 * 1024))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["attachment"]["content_type"], "application/pdf");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(pdf_form(engine::MAX_UPLOAD_BYTES + 1)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("5MB"));

    let (status, body) = send(
        &app,
        request("POST", "/expenses", Some("alice"), Some(pdf_form(server::MAX_BODY_BYTES))),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = app().await;

    let (status, body) = send(
        &app,
        request("GET", "/expenses/not-a-uuid", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        request("GET", "/expenses?start_date=2024-13-99", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/expenses",
            Some("alice"),
            Some(json!({ "amount": "lots", "currency": "USD", "date": "2024-07-01" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}
