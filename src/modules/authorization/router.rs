use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::check_permission;

/// Routes nested under `/api/roles`: GET /{id}/can
pub fn init_authorization_router() -> Router<AppState> {
    Router::new().route("/{id}/can", get(check_permission))
}
