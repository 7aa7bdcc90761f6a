//! View counter endpoint.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::client::ClientInfo;

/// Body of `GET /api/views`.
///
/// `total_views` is `-1` when the counter could not be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewsResponse {
    pub total_views: i64,
}

/// Counts one view and returns the new total.
///
/// # Example
///
/// ```ignore
/// GET /api/views HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"total_views":42}
/// ```
pub async fn views_handler(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Json<ViewsResponse> {
    let total_views = state.counter().increment();
    state.log_action("Viewed /api/views", client);
    Json(ViewsResponse { total_views })
}
