use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use live_core::{AggregateStatus, PlatformType};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListLiveStatusesRequest {
    pub streamer_id: String,
    /// Also return the platform's broadcast id for live entries.
    #[serde(default)]
    pub include_content_id: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveStatusesQuery {
    #[serde(default)]
    pub include_content_id: bool,
}

#[derive(Debug, Serialize)]
pub struct ListLiveStatusesResponse {
    pub live_statuses: Vec<LiveStatus>,
}

#[derive(Debug, Serialize)]
pub struct LiveStatus {
    pub platform_type: PlatformType,
    pub is_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StreamersResponse {
    pub streamers: Vec<String>,
}

impl ListLiveStatusesResponse {
    pub fn from_status(status: &AggregateStatus, include_content_id: bool) -> Self {
        let live_statuses = status
            .results
            .iter()
            .map(|r| LiveStatus {
                platform_type: r.platform,
                is_live: r.live.is_live,
                content_id: if include_content_id {
                    r.live.content_id.clone()
                } else {
                    None
                },
            })
            .collect();
        Self { live_statuses }
    }
}

async fn lookup(
    state: &AppState,
    streamer_id: &str,
    include_content_id: bool,
) -> Result<Json<ListLiveStatusesResponse>, ApiError> {
    let streamer_id = streamer_id.trim();
    if streamer_id.is_empty() {
        return Err(ApiError::BadRequest("streamer_id must not be empty".into()));
    }

    let status = state.aggregator.aggregate(streamer_id).await;
    state.metrics.record(&status);

    Ok(Json(ListLiveStatusesResponse::from_status(
        &status,
        include_content_id,
    )))
}

/// POST /live_statuses
///
/// The body is decoded as JSON whatever its `Content-Type`.
pub async fn list_live_statuses(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ListLiveStatusesResponse>, ApiError> {
    let body: ListLiveStatusesRequest = serde_json::from_slice(&body)?;
    lookup(&state, &body.streamer_id, body.include_content_id).await
}

/// GET /api/v1/streamers/:streamer_id/live_statuses
pub async fn get_live_statuses(
    State(state): State<AppState>,
    Path(streamer_id): Path<String>,
    Query(query): Query<LiveStatusesQuery>,
) -> Result<Json<ListLiveStatusesResponse>, ApiError> {
    lookup(&state, &streamer_id, query.include_content_id).await
}

/// GET /api/v1/streamers
pub async fn list_streamers(State(state): State<AppState>) -> Json<StreamersResponse> {
    Json(StreamersResponse {
        streamers: state.aggregator.directory().streamer_ids(),
    })
}
