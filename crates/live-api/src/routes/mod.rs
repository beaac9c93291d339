pub mod live_statuses;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/streamers", get(live_statuses::list_streamers))
        .route(
            "/streamers/{streamer_id}/live_statuses",
            get(live_statuses::get_live_statuses),
        )
}
