#![cfg(feature = "web")]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use storeplan::app::{self, AppState};
use storeplan::cell::CellValue;
use storeplan::config::Config;
use storeplan::login::hash_password;
use storeplan::{CalculationRow, ensure_workbook, save_all};

fn workbook() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planning.xlsx");
    ensure_workbook(&path).unwrap();
    (dir, path)
}

fn app_for(config: &Config) -> Router {
    app::router(Arc::new(AppState::new(config)))
}

fn app(path: &Path) -> Router {
    app_for(&Config::for_workbook(path))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn calc(store: &str, sku: &str, week: &str, sales: f64, gm: f64) -> CalculationRow {
    CalculationRow {
        store: Some(CellValue::from(store)),
        sku: Some(CellValue::from(sku)),
        week: Some(CellValue::from(week)),
        sales_units: Some(CellValue::from(1i64)),
        sales_dollars: Some(CellValue::from(sales)),
        gm_dollars: Some(CellValue::from(gm)),
        ..CalculationRow::default()
    }
}

#[tokio::test]
async fn created_store_is_listed_with_sequence_number() {
    let (_dir, path) = workbook();
    let app = app(&path);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/stores",
        Some(json!({"ID": "S1", "Label": "Main St", "City": "Austin", "State": "TX"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["store"],
        json!({"Seq No.": 1, "ID": "S1", "Label": "Main St", "City": "Austin", "State": "TX"})
    );

    let (status, body) = send(&app, Method::GET, "/api/stores", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"Seq No.": 1, "ID": "S1", "Label": "Main St", "City": "Austin", "State": "TX"}])
    );
}

#[tokio::test]
async fn store_validation_and_not_found() {
    let (_dir, path) = workbook();
    let app = app(&path);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/stores",
        Some(json!({"ID": "S1", "Label": "Main St", "City": "Austin"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("required"));

    let before = std::fs::read(&path).unwrap();
    let (status, _) = send(&app, Method::DELETE, "/api/stores?ID=S404", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(std::fs::read(&path).unwrap(), before);

    let (status, _) = send(&app, Method::DELETE, "/api/stores", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_delete_removes_one_record() {
    let (_dir, path) = workbook();
    let app = app(&path);

    for id in ["S1", "S2"] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/stores",
            Some(json!({"id": id, "label": "L", "city": "C", "state": "ST"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::DELETE, "/api/stores?ID=S1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Store with ID S1 deleted successfully");

    let (_, body) = send(&app, Method::GET, "/api/stores", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["ID"], "S2");
    assert_eq!(body[0]["Seq No."], 2);
}

#[tokio::test]
async fn sku_crud_round_trip() {
    let (_dir, path) = workbook();
    let app = app(&path);
    let sku = json!({
        "ID": "SK1", "Label": "Tee", "Class": "Tops",
        "Department": "Apparel", "Price": 19.5, "Cost": 7
    });

    let (status, body) = send(&app, Method::POST, "/api/skus", Some(sku.clone()), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["skus"], json!([sku]));

    let (status, body) = send(&app, Method::GET, "/api/skus?skuId=SK1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, sku);

    let (status, _) = send(&app, Method::GET, "/api/skus?skuId=SK9", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut updated = sku.clone();
    updated["Label"] = json!("Polo");
    let (status, body) = send(&app, Method::PUT, "/api/skus", Some(updated.clone()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skus"], json!([updated]));

    let before = std::fs::read(&path).unwrap();
    let mut missing = sku.clone();
    missing["ID"] = json!("SK9");
    let (status, _) = send(&app, Method::PUT, "/api/skus", Some(missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(std::fs::read(&path).unwrap(), before);

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/api/skus",
        Some(json!({"ID": "SK1"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skus"], json!([]));

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/skus",
        Some(json!({"ID": "SK1"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sku_create_with_missing_fields_is_rejected() {
    let (_dir, path) = workbook();
    let app = app(&path);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/skus",
        Some(json!({"ID": "SK1", "Label": "Tee"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing SKU fields");
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let (_dir, path) = workbook();
    let app = app(&path);

    let (status, body) = send(&app, Method::DELETE, "/api/skus", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/stores",
        Some(json!({"ID": [1], "Label": "L", "City": "C", "State": "S"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::POST, "/api/login", Some(json!([])), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn chart_aggregates_sum_then_divide() {
    let (_dir, path) = workbook();
    save_all(
        &path,
        &[
            calc("S1", "A", "W1", 100.0, 10.0),
            calc("S1", "B", "W1", 50.0, 5.0),
            calc("S2", "A", "W1", 0.0, 3.0),
            calc("S1", "A", "W2", 80.0, 20.0),
        ],
    )
    .unwrap();
    let app = app(&path);

    let (status, body) = send(&app, Method::GET, "/api/chart", None, None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body[0]["store"], "S1");
    let w1 = &body[0]["weeks"][0];
    assert_eq!(w1["week"], "W1");
    assert_eq!(w1["gmDollars"].as_f64(), Some(15.0));
    assert!((w1["gmPercent"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert_eq!(body[0]["weeks"][1]["week"], "W2");

    assert_eq!(body[1]["store"], "S2");
    assert_eq!(body[1]["weeks"][0]["gmPercent"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn planning_data_annotates_each_row() {
    let (_dir, path) = workbook();
    let mut unitless = calc("S1", "B", "W1", 0.0, 5.0);
    unitless.sales_units = None;
    unitless.extra.insert("Cost Dollars".to_string(), json!(60));
    let mut unreadable = calc("S1", "C", "W1", 0.0, 5.0);
    unreadable.sales_dollars = Some(CellValue::from("NaN"));
    save_all(&path, &[calc("S1", "A", "W1", 200.0, 50.0), unitless, unreadable]).unwrap();
    let app = app(&path);

    let (status, body) = send(&app, Method::GET, "/api/getPlanningData", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["SKU"], "A");
    assert_eq!(rows[0]["Sales Dollars"], json!(200));
    assert_eq!(rows[0]["Sales Units"], json!(1));
    assert_eq!(rows[0]["GM %"].as_f64(), Some(25.0));

    assert!(rows[1].get("Sales Units").is_none());
    assert_eq!(rows[1]["Cost Dollars"], json!(60));
    assert_eq!(rows[1]["GM %"].as_f64(), Some(0.0));

    assert_eq!(rows[2]["Sales Dollars"], "NaN");
    assert_eq!(rows[2]["GM %"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn storage_failures_are_generic_server_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir.path().join("missing.xlsx"));

    let (status, body) = send(&app, Method::GET, "/api/skus", None, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal Server Error"}));
}

fn auth_config(path: &Path) -> Config {
    let mut config = Config::for_workbook(path);
    config.jwt_secret = Some("integration-secret".to_string());
    config.user_email = Some("planner@example.com".to_string());
    config.user_password = Some(hash_password("s3cret").unwrap());
    config
}

#[tokio::test]
async fn login_then_access_protected_endpoint() {
    let (_dir, path) = workbook();
    let app = app_for(&auth_config(&path));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"email": "planner@example.com", "password": "nope"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"email": "planner@example.com", "password": "s3cret"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/api/protected", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/protected", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/api/protected", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Access granted");
}

#[tokio::test]
async fn protected_api_requires_a_token() {
    let (_dir, path) = workbook();
    let mut config = auth_config(&path);
    config.protect_api = true;
    let app = app_for(&config);

    let (status, _) = send(&app, Method::GET, "/api/stores", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"email": "planner@example.com", "password": "s3cret"})),
        None,
    )
    .await;
    let token = body["token"].as_str().unwrap();

    let (status, body) = send(&app, Method::GET, "/api/stores", None, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
