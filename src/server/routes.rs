//! HTTP route handlers for the rankings API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::rankings::core::errors::{RankingError, RankingResult};
use crate::rankings::core::fields::{CategoricalFilters, FilterField};
use crate::rankings::core::query::{RankQuery, Scope, TimeWindow};
use crate::rankings::core::tags::{normalize_tag, popular_tags};
use crate::rankings::display::{LeaderboardRow, LeaderboardSummary, facets, leaderboard_rows};
use crate::rankings::pipeline::{AggregatedRanking, aggregate_window, rank_aggregation};
use crate::rankings::source::{EventPredicate, Snapshot, fetch_snapshot};

use super::state::AppState;

/// Fields offered as drop-down filters.
const FACET_FIELDS: [FilterField; 2] = [FilterField::Category, FilterField::MashbillStyle];

/// Tags returned when the caller gives no limit.
const DEFAULT_POPULAR_TAGS: usize = 12;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/rankings", post(rankings))
        .route("/api/tags/popular", get(tags_popular))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "viscosity-rank",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Leaderboard request; omitted fields take the configured defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankingsRequest {
    /// Author scope.
    pub scope: Option<Scope>,
    /// Time window.
    pub window: Option<TimeWindow>,
    /// Tag as typed; normalized before matching.
    pub tag: Option<String>,
    /// Label search.
    pub search: Option<String>,
    /// Categorical filters.
    #[serde(default)]
    pub filters: CategoricalFilters,
    /// Minimum rated pours.
    pub min_sample_count: Option<usize>,
    /// Number of entries.
    pub limit: Option<usize>,
}

impl RankingsRequest {
    /// Resolve into a complete query.
    ///
    /// # Errors
    /// Returns an error if the tag cannot be normalized.
    pub fn into_query(self, state: &AppState) -> RankingResult<RankQuery> {
        let defaults = &state.config.defaults;
        let tag = self.tag.as_deref().map(normalize_tag).transpose()?;

        Ok(RankQuery {
            scope: self.scope.unwrap_or_default(),
            window: self.window.unwrap_or(defaults.window),
            tag: tag.filter(|t| !t.is_empty()),
            search: self.search,
            filters: self.filters,
            min_sample_count: self.min_sample_count.unwrap_or(defaults.min_sample_count),
            limit: self
                .limit
                .unwrap_or(defaults.limit)
                .min(state.config.server.max_limit),
        })
    }
}

/// Leaderboard response.
#[derive(Debug, Serialize)]
pub struct RankingsResponse {
    /// Ranked aggregates.
    pub results: Vec<AggregatedRanking>,
    /// Pre-rendered rows.
    pub rows: Vec<LeaderboardRow>,
    /// Matches before truncation.
    pub total_before_limit: usize,
    /// Rated events in scope and window.
    pub rated_events: usize,
    /// Headline numbers.
    pub summary: LeaderboardSummary,
    /// Filter options over the unfiltered aggregate.
    pub facets: BTreeMap<FilterField, Vec<String>>,
}

/// Handle leaderboard requests.
async fn rankings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RankingsRequest>,
) -> Result<Json<RankingsResponse>, (StatusCode, String)> {
    let query = request.into_query(&state).map_err(error_response)?;
    query.validate().map_err(error_response)?;

    let snapshot = fetch_with_timeout(&state, &query).await.map_err(error_response)?;
    let aggregation = aggregate_window(&snapshot.events, &snapshot.items, &query, Utc::now());
    let facets = facets(&aggregation.rankings, &FACET_FIELDS);
    let board = rank_aggregation(aggregation, &query).map_err(error_response)?;

    Ok(Json(RankingsResponse {
        rows: leaderboard_rows(&board),
        summary: LeaderboardSummary::new(&board, &query),
        total_before_limit: board.total_before_limit,
        rated_events: board.rated_events,
        results: board.results,
        facets,
    }))
}

/// Popular tags query parameters.
#[derive(Debug, Deserialize)]
pub struct PopularTagsParams {
    /// Number of tags.
    pub limit: Option<usize>,
}

/// Handle popular tag requests.
async fn tags_popular(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PopularTagsParams>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let predicate = EventPredicate::default();
    let timeout = Duration::from_secs(state.config.server.fetch_timeout_secs);
    let events = tokio::time::timeout(timeout, state.source.fetch_events(&predicate))
        .await
        .map_err(|_| error_response(RankingError::FetchTimeout(timeout.as_secs())))?
        .map_err(error_response)?;

    let tags = popular_tags(&events, params.limit.unwrap_or(DEFAULT_POPULAR_TAGS)).map_err(error_response)?;
    Ok(Json(tags))
}

async fn fetch_with_timeout(state: &AppState, query: &RankQuery) -> RankingResult<Snapshot> {
    let secs = state.config.server.fetch_timeout_secs;
    tokio::time::timeout(Duration::from_secs(secs), fetch_snapshot(state.source.as_ref(), query))
        .await
        .map_err(|_| RankingError::FetchTimeout(secs))?
}

fn error_response(err: RankingError) -> (StatusCode, String) {
    let status = match &err {
        RankingError::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        err if err.is_fetch_failure() => StatusCode::BAD_GATEWAY,
        RankingError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    if status.is_server_error() {
        tracing::error!("Rankings request failed: {err}");
    } else {
        tracing::warn!("Rejected rankings request: {err}");
    }
    (status, err.to_string())
}
