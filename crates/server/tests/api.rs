use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, Value};
use serde_json::Value as Json;
use tower::ServiceExt;
use uuid::Uuid;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

const WORKSPACE: Uuid = Uuid::from_u128(1000);

async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<Value>) {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        sql,
        values,
    ))
    .await
    .unwrap();
}

async fn state() -> ServerState {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    for user in ["alice", "mallory"] {
        exec(
            &db,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        )
        .await;
    }
    exec(
        &db,
        "INSERT INTO workspaces (id, name, owner_id, default_currency) VALUES (?, ?, ?, ?)",
        vec![
            WORKSPACE.to_string().into(),
            "Studio".into(),
            "alice".into(),
            "EUR".into(),
        ],
    )
    .await;
    let customer = Uuid::from_u128(100).to_string();
    exec(
        &db,
        "INSERT INTO customers (id, workspace_id, name) VALUES (?, ?, ?)",
        vec![
            customer.clone().into(),
            WORKSPACE.to_string().into(),
            "Acme".into(),
        ],
    )
    .await;
    for (n, status) in [(1u128, "DRAFT"), (2, "PAID"), (3, "SENT")] {
        exec(
            &db,
            "INSERT INTO invoices (id, workspace_id, customer_id, title, status, date_issued, due_date, amount_minor, currency, notes) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                Uuid::from_u128(n).to_string().into(),
                WORKSPACE.to_string().into(),
                customer.clone().into(),
                format!("Invoice {n}").into(),
                status.into(),
                format!("2024-05-0{n}").into(),
                format!("2024-06-0{n}").into(),
                (n as i64 * 100).into(),
                "EUR".into(),
                Option::<String>::None.into(),
            ],
        )
        .await;
    }
    for (n, status, title) in [
        (10u128, "FINALIZED", "Train"),
        (11, "PENDING_CONVERSION", "Hotel"),
        (12, "FINALIZED", "Laptop"),
    ] {
        exec(
            &db,
            "INSERT INTO expenses (id, workspace_id, title, category, status, date_paid, amount_minor, currency) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                Uuid::from_u128(n).to_string().into(),
                WORKSPACE.to_string().into(),
                title.into(),
                Option::<String>::None.into(),
                status.into(),
                format!("2024-07-{n}").into(),
                (n as i64).into(),
                "EUR".into(),
            ],
        )
        .await;
    }

    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    ServerState {
        engine: Arc::new(engine),
        db,
    }
}

fn basic(user: &str, password: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
    format!("Basic {token}")
}

async fn get(state: ServerState, uri: &str, user: &str, password: &str) -> (StatusCode, Json) {
    let response = router(state)
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, basic(user, password))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Json::Null)
    };
    (status, body)
}

#[tokio::test]
async fn invoices_are_filtered_and_paginated() {
    let state = state().await;
    let uri = format!("/workspaces/{WORKSPACE}/invoices?status%5Bin%5D=DRAFT,SENT&limit=1");

    let (status, body) = get(state, &uri, "alice", "password").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pageNumber"], 1);
    assert_eq!(body["pageSize"], 1);
    assert_eq!(body["totalElements"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["status"], "SENT");
    assert_eq!(body["data"][0]["dateIssued"], "2024-05-03");
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let state = state().await;

    let uri = format!("/workspaces/{WORKSPACE}/invoices?sortBy=dateIssued");
    let (status, body) = get(state.clone(), &uri, "alice", "password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid sorting expression: 'dateIssued'");

    let uri = format!("/workspaces/{WORKSPACE}/invoices?page=1&page=2");
    let (status, _) = get(state.clone(), &uri, "alice", "password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/workspaces/{WORKSPACE}/customers?currency%5Beq%5D=EUR");
    let (status, body) = get(state, &uri, "alice", "password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown filter field: 'currency'");
}

#[tokio::test]
async fn customers_are_listed() {
    let state = state().await;
    let uri = format!("/workspaces/{WORKSPACE}/customers?name%5Beq%5D=Acme");

    let (status, body) = get(state, &uri, "alice", "password").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalElements"], 1);
    assert_eq!(body["data"][0]["name"], "Acme");
    assert_eq!(body["data"][0]["id"], Uuid::from_u128(100).to_string());
}

#[tokio::test]
async fn expenses_accept_the_typed_query() {
    let state = state().await;
    let uri = format!(
        "/workspaces/{WORKSPACE}/expenses?status=FINALIZED&sortBy=amount&sortOrder=ASC&pageSize=5"
    );

    let (status, body) = get(state, &uri, "alice", "password").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pageSize"], 5);
    assert_eq!(body["totalElements"], 2);
    assert_eq!(body["data"][0]["title"], "Train");
    assert_eq!(body["data"][1]["title"], "Laptop");
}

#[tokio::test]
async fn undecodable_typed_query_is_a_bad_request() {
    let state = state().await;
    let uri = format!("/workspaces/{WORKSPACE}/expenses?pageNumber=first");

    let (status, body) = get(state, &uri, "alice", "password").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_paging_is_a_bad_request() {
    let state = state().await;

    let uri = format!("/workspaces/{WORKSPACE}/invoices?limit=18446744073709551615");
    let (status, body) = get(state.clone(), &uri, "alice", "password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Page size must not exceed 9223372036854775807");

    let uri = format!("/workspaces/{WORKSPACE}/expenses?pageNumber=9223372036854775807&pageSize=10");
    let (status, body) = get(state, &uri, "alice", "password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Page 9223372036854775807 of size 10 is out of range");
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let state = state().await;
    let uri = format!("/workspaces/{WORKSPACE}/invoices");

    let (status, _) = get(state, &uri, "alice", "nope").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_members_get_not_found() {
    let state = state().await;
    let uri = format!("/workspaces/{WORKSPACE}/invoices");

    let (status, body) = get(state, &uri, "mallory", "password").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "\"workspace not exists\" key not found!");
}
