mod common;

use axum::http::StatusCode;
use common::{role_id_by_name, send, setup_test_app};
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let (app, _) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_modules_in_catalog_order() {
    let (app, _) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/api/permissions/modules", None).await;

    assert_eq!(status, StatusCode::OK);
    let modules = body.as_array().unwrap();
    assert_eq!(modules.len(), 14);
    assert_eq!(modules[0]["id"], "dashboard");
    assert_eq!(modules[13]["id"], "roles");
}

#[tokio::test]
async fn test_list_module_actions() {
    let (app, _) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/api/permissions/modules/settings/actions", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["module"], "settings");
    assert_eq!(body["actions"], json!(["view", "edit"]));
}

#[tokio::test]
async fn test_list_module_actions_unknown_module() {
    let (app, _) = setup_test_app().await;

    let (status, _) = send(&app, "GET", "/api/permissions/modules/grading/actions", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_all_capabilities() {
    let (app, _) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/api/permissions", None).await;

    assert_eq!(status, StatusCode::OK);
    let caps = body.as_array().unwrap();
    assert_eq!(caps[0], json!({"module": "dashboard", "action": "view"}));
    assert!(caps.contains(&json!({"module": "roles", "action": "delete"})));
}

#[tokio::test]
async fn test_super_role_may_do_anything() {
    let (app, _) = setup_test_app().await;
    let admin = role_id_by_name(&app, "admin").await;

    for (module, action) in [("students", "delete"), ("spaceship", "launch")] {
        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/roles/{}/can?module={}&action={}", admin, module, action),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], true);
    }
}

#[tokio::test]
async fn test_role_permission_follows_capabilities() {
    let (app, _) = setup_test_app().await;
    let (_, role) = send(
        &app,
        "POST",
        "/api/roles",
        Some(json!({
            "name": "viewer",
            "name_localized": "viewer",
            "capabilities": [{"module": "students", "action": "view"}]
        })),
    )
    .await;
    let id = role["id"].as_str().unwrap();

    let can = |module: &'static str, action: &'static str| {
        format!("/api/roles/{}/can?module={}&action={}", id, module, action)
    };

    let (_, body) = send(&app, "GET", &can("students", "view"), None).await;
    assert_eq!(body["allowed"], true);

    let (_, body) = send(&app, "GET", &can("students", "delete"), None).await;
    assert_eq!(body["allowed"], false);

    let (_, body) = send(&app, "GET", &can("spaceship", "launch"), None).await;
    assert_eq!(body["allowed"], false);
}

#[tokio::test]
async fn test_unknown_role_is_denied() {
    let (app, _) = setup_test_app().await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/roles/00000000-0000-0000-0000-000000000042/can?module=students&action=view",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
}
