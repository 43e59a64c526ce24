//! HTTP trigger shell
//!
//! - `POST /scrape` starts a background harvest and answers `202` at once
//! - `GET /jobs` lists stored records
//! - `GET /health` liveness probe

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::{HarvestRequest, HarvestService, InvalidRequest};
use crate::domain::{JobRepository, RepositoryError, StandardizedRecord};

#[derive(Clone)]
pub struct AppState {
    pub harvests: HarvestService,
    pub repository: Arc<dyn JobRepository>,
}

impl AppState {
    pub fn new(harvests: HarvestService) -> Self {
        let repository = harvests.repository();
        Self {
            harvests,
            repository,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeBody {
    pub keyword: String,
    /// Falls back to `harvest.default_pages`; signed so that negative values
    /// get a 400 instead of a body rejection
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub city_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapeAccepted {
    pub message: String,
    pub status: String,
    pub run_id: Uuid,
}

pub enum ApiError {
    BadRequest(InvalidRequest),
    Repository(RepositoryError),
}

impl From<InvalidRequest> for ApiError {
    fn from(err: InvalidRequest) -> Self {
        Self::BadRequest(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Repository(err) => {
                error!("Error getting jobs info: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to read jobs".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/scrape", post(trigger_scrape))
        .route("/jobs", get(list_jobs))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn trigger_scrape(
    State(state): State<AppState>,
    Json(body): Json<ScrapeBody>,
) -> Result<(StatusCode, Json<ScrapeAccepted>), ApiError> {
    let pages = match body.pages {
        Some(pages) => u32::try_from(pages).map_err(|_| InvalidRequest::NoPages)?,
        None => state.harvests.default_pages(),
    };
    let request = HarvestRequest::new(&body.keyword, pages, body.city_code)?;

    let run_id = state.harvests.spawn(request.clone());
    info!("Accepted scrape for '{}' as run {}", request.keyword, run_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(ScrapeAccepted {
            message: format!("Scraper started for keyword: {}", request.keyword),
            status: "processing".to_string(),
            run_id,
        }),
    ))
}

async fn list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<StandardizedRecord>>, ApiError> {
    Ok(Json(state.repository.find_all().await?))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
