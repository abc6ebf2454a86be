use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    close_registration, close_semester, create_semester, delete_semester, get_current_semester,
    get_semester_by_id, get_semesters, open_registration, reopen_semester, set_current_semester,
    update_semester,
};

/// Routes: GET|POST /, GET /current, GET|PUT|DELETE /{id}, and the
/// lifecycle transitions under /{id}
pub fn init_semesters_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_semesters).post(create_semester))
        .route("/current", get(get_current_semester))
        .route(
            "/{id}",
            get(get_semester_by_id)
                .put(update_semester)
                .delete(delete_semester),
        )
        .route("/{id}/set-current", post(set_current_semester))
        .route("/{id}/close", post(close_semester))
        .route("/{id}/reopen", post(reopen_semester))
        .route("/{id}/open-registration", post(open_registration))
        .route("/{id}/close-registration", post(close_registration))
}
