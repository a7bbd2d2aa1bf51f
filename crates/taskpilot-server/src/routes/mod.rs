pub mod chat;

use crate::state::AppState;
use axum::Router;

/// Configure all routes
pub fn configure(state: AppState) -> Router {
    chat::routes(state)
}
