use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use authkeeper_backend::docs;
use tower::ServiceExt;
use utoipa::OpenApi;

mod support;

#[test]
fn openapi_includes_every_route_and_bearer_scheme() {
    let openapi = docs::ApiDoc::openapi();
    let json = serde_json::to_value(&openapi).expect("serialize openapi");

    let paths = json
        .get("paths")
        .and_then(|v| v.as_object())
        .expect("paths object");
    for path in [
        "/auth/login",
        "/auth/refresh",
        "/auth/logout",
        "/auth/me",
        "/users",
        "/users/{id}",
        "/health",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }

    let bearer = json
        .pointer("/components/securitySchemes/BearerAuth")
        .expect("BearerAuth scheme");
    assert_eq!(bearer.get("type").and_then(Value::as_str), Some("http"));
    assert_eq!(
        bearer.get("scheme").and_then(Value::as_str),
        Some("bearer")
    );
}

#[tokio::test]
async fn swagger_ui_is_mounted_on_the_app() {
    let app = support::TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/swagger-ui")
                .body(Body::empty())
                .expect("build docs request"),
        )
        .await
        .expect("call swagger ui");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, "/swagger-ui/");
}

#[tokio::test]
async fn openapi_json_route_serves_spec() {
    let app = support::TestApp::new();
    let (status, json) = app
        .send_json(support::empty_request("GET", "/api-docs/openapi.json", None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]
        .as_object()
        .expect("paths object")
        .contains_key("/auth/login"));
}
