use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use registrar::modules::roles::service::RoleService;
use registrar::registrar_core::PermissionCatalog;
use registrar::router::init_router;
use registrar::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Router over a fresh in-memory state with the default roles seeded.
pub async fn setup_test_app() -> (Router, AppState) {
    let state = AppState::in_memory(PermissionCatalog::builtin());
    RoleService::seed_default_roles(&state)
        .await
        .expect("seeding default roles");
    (init_router(state.clone()), state)
}

/// Sends one request and returns the status with the parsed JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    if bytes.is_empty() {
        return (status, Value::Null);
    }

    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        panic!(
            "Failed to parse response. Status: {}, Body: {:?}",
            status,
            String::from_utf8_lossy(&bytes)
        )
    });
    (status, body)
}

#[allow(dead_code)]
pub async fn role_id_by_name(app: &Router, name: &str) -> String {
    let (_, roles) = send(app, "GET", "/api/roles", None).await;
    roles
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .unwrap_or_else(|| panic!("role '{}' not seeded", name))["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub fn semester_body(name: &str, start: &str, end: &str) -> Value {
    json!({
        "name": name,
        "name_localized": name,
        "academic_year": "2026-2027",
        "semester_type": "FALL",
        "start_date": start,
        "end_date": end,
        "registration_start": start,
        "registration_end": end
    })
}

#[allow(dead_code)]
pub async fn create_semester(app: &Router, name: &str, start: &str, end: &str) -> String {
    let (status, body) = send(app, "POST", "/api/semesters", Some(semester_body(name, start, end))).await;
    assert_eq!(status, StatusCode::CREATED, "create semester failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}
