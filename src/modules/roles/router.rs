use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_role, delete_role, duplicate_role, get_role_by_id, get_roles, grant_capabilities,
    revoke_capabilities, update_role,
};

/// Routes: GET /, POST /, GET|PUT|DELETE /{id}, POST|DELETE /{id}/capabilities,
/// POST /{id}/duplicate
pub fn init_roles_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_roles).post(create_role))
        .route(
            "/{id}",
            get(get_role_by_id).put(update_role).delete(delete_role),
        )
        .route(
            "/{id}/capabilities",
            post(grant_capabilities).delete(revoke_capabilities),
        )
        .route("/{id}/duplicate", post(duplicate_role))
}
