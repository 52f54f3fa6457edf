//! HTTP API: portal events and sentiment scoring.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/wiki?date=&limit=` | Events of one portal page, cacheable for 300 s |
//! | POST | `/api/sentiment` | Score a batch of texts |
//! | GET | `/api/health/live` | Liveness check |
//!
//! Every request to `/api/wiki` performs exactly one upstream fetch; nothing
//! is cached or coalesced in process.

use crate::clock::Clock;
use crate::config::Settings;
use crate::error::ApiError;
use crate::models::{AggregateSentiment, EventsResponse, SentimentResult};
use crate::scrapers::wikipedia::PortalClient;
use crate::sentiment;
use crate::utils::parse_limit;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{Method, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, instrument};

/// Sent with every successful events response.
pub const EVENTS_CACHE_CONTROL: &str = "public, max-age=300, s-maxage=300";

/// State shared across handlers; everything in it is read-only.
#[derive(Debug, Clone)]
pub struct AppState {
    pub portal: PortalClient,
    pub clock: Arc<dyn Clock>,
}

/// Query parameters for the events endpoint.
///
/// Both stay strings: `date` is echoed back verbatim and `limit` has its own
/// lenient parsing.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub date: Option<String>,
    pub limit: Option<String>,
}

/// Body of the sentiment endpoint; `null` entries score as empty text.
#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    #[serde(default)]
    pub texts: Vec<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub results: Vec<SentimentResult>,
    pub aggregate: AggregateSentiment,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/wiki", get(get_events))
        .route("/sentiment", post(post_sentiment))
        .route("/health/live", get(liveness));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/wiki - events of the requested (or today's) portal page
#[instrument(level = "info", skip(state))]
async fn get_events(
    State(state): State<AppState>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = query?;
    let limit = parse_limit(params.limit.as_deref());
    let response: EventsResponse = state
        .portal
        .current_events(params.date.as_deref(), limit, state.clock.as_ref())
        .await?;

    Ok(([(header::CACHE_CONTROL, EVENTS_CACHE_CONTROL)], Json(response)))
}

/// POST /api/sentiment - per-text scores plus their aggregate
async fn post_sentiment(Json(request): Json<SentimentRequest>) -> Json<SentimentResponse> {
    let results = request
        .texts
        .iter()
        .map(|t| sentiment::score_opt(t.as_deref()))
        .collect();
    let texts: Vec<&str> = request.texts.iter().flatten().map(String::as_str).collect();
    let aggregate = sentiment::analyze(&texts);
    Json(SentimentResponse { results, aggregate })
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Bind `settings.bind` and serve until Ctrl-C.
#[instrument(level = "info", skip_all, fields(bind = %settings.bind))]
pub async fn serve(settings: &Settings, state: AppState) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
