//! Route definitions for checkpoint submission.

use axum::routing::post;
use axum::Router;

use crate::handlers::checkpoint;
use crate::state::AppState;

/// Routes mounted under `/checkpoint`.
///
/// ```text
/// POST /submit -> submit_checkpoint
/// POST /batch  -> submit_checkpoint_batch
/// ```
pub fn checkpoint_routes() -> Router<AppState> {
    Router::new()
        .route("/submit", post(checkpoint::submit_checkpoint))
        .route("/batch", post(checkpoint::submit_checkpoint_batch))
}
