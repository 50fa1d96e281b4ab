use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use lettersearch_core::{IndexOutcome, JsonLetterStore, Letter, LetterSearch, QueryError, ResolvedRecord, SearchConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, String);

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Body of `POST /search`.
#[derive(Deserialize)]
pub struct SearchRequest {
    pub search_term: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub fuzzy: bool,
}

#[derive(Deserialize)]
pub struct IndexParams {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<ResolvedRecord<Letter>>,
}

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<LetterSearch<JsonLetterStore>>,
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Required in `X-ADMIN-TOKEN` for `POST /index`; `None` refuses indexing over HTTP.
    pub admin_token: Option<String>,
    /// Origins the letter frontend is served from. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl AppOptions {
    /// `ADMIN_TOKEN` and comma-separated `CORS_ALLOW_ORIGIN`.
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("CORS_ALLOW_ORIGIN")
            .map(|val| val.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default();
        Self { admin_token: std::env::var("ADMIN_TOKEN").ok(), allowed_origins }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
    let allow = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_origin(allow).allow_methods([Method::GET, Method::POST]).allow_headers(Any)
}

pub fn build_app(config: SearchConfig, letters: JsonLetterStore, options: AppOptions) -> Router {
    let cors = cors_layer(&options.allowed_origins);
    let app_state = AppState { search: Arc::new(LetterSearch::new(config, letters)), admin_token: options.admin_token };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler).post(search_request_handler))
        .route("/fuzzy", get(fuzzy_handler))
        .route("/index", post(index_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    run_search(state, params.q, params.language, false).await
}

pub async fn fuzzy_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    run_search(state, params.q, params.language, true).await
}

pub async fn search_request_handler(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> Result<Json<SearchResponse>, ApiError> {
    run_search(state, req.search_term, req.language, req.fuzzy).await
}

async fn run_search(state: AppState, query: String, language: Option<String>, fuzzy: bool) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let search = Arc::clone(&state.search);
    let q = query.clone();
    let rows = tokio::task::spawn_blocking(move || {
        if fuzzy {
            search.fuzzy_search(&q, language.as_deref())
        } else {
            search.search(&q, language.as_deref())
        }
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(query_error)?;

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query, took_s: elapsed.as_secs_f64(), total_hits: rows.len(), results: rows }))
}

fn query_error(e: QueryError) -> ApiError {
    if e.is_parse_error() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::error!(error = %e, "search failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

async fn index_handler(State(state): State<AppState>, headers: HeaderMap, Query(params): Query<IndexParams>) -> Result<Json<IndexOutcome>, ApiError> {
    authorize(&state, &headers)?;
    let search = Arc::clone(&state.search);
    let outcome = tokio::task::spawn_blocking(move || search.index_files(params.language.as_deref()))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %e, "index run failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(outcome))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
