#![cfg(feature = "web")]

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use axum_extra::extract::WithRejection;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::error::ApiError;
use crate::graph::{self, GraphOptions};
use crate::login::{self, Authenticator};
use crate::models::{CalculationRow, PlanningRow, Sku, Store, StoreAggregate};
use crate::records;
use crate::reporting;
use crate::skus::{self, SkuId, SkuPayload};
use crate::stores::{self, NewStore};

pub struct AppState {
    pub workbook: PathBuf,
    pub auth: Authenticator,
    pub protect_api: bool,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        AppState {
            workbook: config.workbook.clone(),
            auth: Authenticator::from_config(config),
            protect_api: config.protect_api,
            static_dir: config.static_dir.clone(),
        }
    }
}

#[derive(Deserialize)]
struct StoreIdQuery {
    #[serde(rename = "ID")]
    id: Option<String>,
}

#[derive(Deserialize)]
struct SkuQuery {
    #[serde(rename = "skuId")]
    sku_id: Option<String>,
}

#[derive(Deserialize)]
struct ChartQuery {
    store: Option<String>,
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if records::ensure_workbook(&config.workbook)? {
        log::info!("created empty workbook at {}", config.workbook.display());
    }

    let state = Arc::new(AppState::new(&config));
    let app = router(state);

    let listener = TcpListener::bind(config.bind).await?;
    log::info!("Listening on http://{}", config.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut data = Router::new()
        .route(
            "/api/stores",
            get(list_stores).post(create_store).delete(delete_store),
        )
        .route(
            "/api/skus",
            get(get_skus).post(create_sku).put(update_sku).delete(delete_sku),
        )
        .route("/api/getPlanningData", get(get_planning_data))
        .route("/api/chart", get(get_chart))
        .route("/api/chart.png", get(get_chart_png));

    if state.protect_api {
        data = data.route_layer(middleware::from_fn_with_state(
            state.clone(),
            login::require_auth,
        ));
    }

    let mut app = Router::new()
        .route("/api/login", post(login::handle_login))
        .route("/api/logout", post(login::handle_logout))
        .route("/api/protected", get(login::handle_protected))
        .merge(data);

    if let Some(dir) = &state.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}

/// Run workbook I/O off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

async fn list_stores(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Store>>, ApiError> {
    let path = state.workbook.clone();
    blocking(move || stores::list_stores(&path)).await.map(Json)
}

async fn create_store(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<NewStore>, ApiError>,
) -> Result<Response, ApiError> {
    let path = state.workbook.clone();
    let store = blocking(move || stores::create_store(&path, body)).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Store added successfully", "store": store })),
    )
        .into_response())
}

async fn delete_store(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<StoreIdQuery>, ApiError>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = query.id.unwrap_or_default();
    let path = state.workbook.clone();
    let removed = blocking(move || stores::delete_store(&path, &id)).await?;

    Ok(Json(json!({
        "message": format!("Store with ID {} deleted successfully", removed.id)
    })))
}

async fn get_skus(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<SkuQuery>, ApiError>,
) -> Result<Response, ApiError> {
    let path = state.workbook.clone();
    match query.sku_id {
        Some(id) => {
            let sku: Sku = blocking(move || skus::find_sku(&path, &id)).await?;
            Ok(Json(sku).into_response())
        }
        None => {
            let all: Vec<Sku> = blocking(move || skus::list_skus(&path)).await?;
            Ok(Json(all).into_response())
        }
    }
}

async fn create_sku(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<SkuPayload>, ApiError>,
) -> Result<Response, ApiError> {
    let path = state.workbook.clone();
    let skus = blocking(move || skus::create_sku(&path, body)).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "SKU added successfully", "skus": skus })),
    )
        .into_response())
}

async fn update_sku(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<SkuPayload>, ApiError>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let path = state.workbook.clone();
    let skus = blocking(move || skus::update_sku(&path, body)).await?;
    Ok(Json(json!({ "message": "SKU updated successfully", "skus": skus })))
}

async fn delete_sku(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<SkuId>, ApiError>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let path = state.workbook.clone();
    let skus = blocking(move || skus::delete_sku(&path, body)).await?;
    Ok(Json(json!({ "message": "SKU deleted successfully", "skus": skus })))
}

fn load_calculations(
    path: PathBuf,
) -> impl FnOnce() -> Result<Vec<CalculationRow>, ApiError> + Send + 'static {
    move || {
        let rows: Vec<CalculationRow> = records::load_all(&path)?;
        log::info!("loaded {} calculation rows", rows.len());
        Ok(rows)
    }
}

async fn get_planning_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlanningRow>>, ApiError> {
    let rows = blocking(load_calculations(state.workbook.clone())).await?;
    Ok(Json(reporting::planning_rows(rows)))
}

async fn get_chart(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoreAggregate>>, ApiError> {
    let rows = blocking(load_calculations(state.workbook.clone())).await?;
    Ok(Json(reporting::aggregate_by_store_week(&rows)))
}

async fn get_chart_png(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<ChartQuery>, ApiError>,
) -> Result<Response, ApiError> {
    let load = load_calculations(state.workbook.clone());
    let png = blocking(move || {
        let rows = load()?;
        let aggregates = reporting::aggregate_by_store_week(&rows);
        let aggregate = match &query.store {
            Some(store) => aggregates.into_iter().find(|a| &a.store == store),
            None => aggregates.into_iter().next(),
        }
        .ok_or_else(|| ApiError::NotFound("Store not found".to_string()))?;

        let options = GraphOptions {
            title: format!("Gross Margin - {}", aggregate.store),
            ..GraphOptions::default()
        };
        graph::create_gm_bar_graph(&aggregate, &options)
            .map_err(|e| ApiError::Internal(format!("chart rendering failed: {}", e)))
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
