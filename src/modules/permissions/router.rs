use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_capabilities, get_module_actions, get_modules};

/// Routes: GET /, GET /modules, GET /modules/{module}/actions
pub fn init_permissions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_capabilities))
        .route("/modules", get(get_modules))
        .route("/modules/{module}/actions", get(get_module_actions))
}
