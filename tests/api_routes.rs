//! Router tests for the paths that never reach PostgreSQL: credential
//! checks, parameter validation and routing.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use icgeo::{
    api::{self, AppState},
    config::{ConfigOverrides, FileConfig, ServerConfig, Settings},
    db,
};
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    let settings =
        Settings::resolve(ConfigOverrides::default(), FileConfig::default())
            .unwrap();
    let server = ServerConfig {
        min_connections: 0,
        ..settings.server
    };
    let pool = db::lazy_pool(&settings.database, &server);
    api::router(AppState::new(pool, settings.database, 1000))
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

async fn send(
    request: Request<Body>,
) -> (StatusCode, header::HeaderMap, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

#[tokio::test]
async fn interviews_require_credentials() {
    let request = Request::get("/interviews/all").body(Body::empty()).unwrap();
    let (status, headers, body) = send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        headers.get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"icgeo\""
    );
    assert_eq!(body["message"], "Unauthorized Access");
}

#[tokio::test]
async fn non_basic_authorization_is_rejected() {
    let request = Request::get("/interviews/1,2/text")
        .header(header::AUTHORIZATION, "Bearer abc")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(headers.contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn field_routes_are_protected_too() {
    let request = Request::get("/interviews/salto/meta")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_requires_api_user() {
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"new_password": "x"}"#))
        .unwrap();
    let (status, _, _) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_user_lists_missing_parameters() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::AUTHORIZATION, basic("admin", "pw"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"new_username": "ana"}"#))
        .unwrap();
    let (status, _, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Required parameters:"));
    assert!(message.contains("new_username, new_password"));
}

#[tokio::test]
async fn create_user_without_credentials_is_a_bad_request() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .body(Body::from(r#"{"new_username": "ana", "new_password": "x"}"#))
        .unwrap();
    let (status, _, _) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_user_requires_username() {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/users")
        .header(header::AUTHORIZATION, basic("admin", "pw"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("json:[username]"));
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let request = Request::get("/interviews").body(Body::empty()).unwrap();
    let (status, _, _) = send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::get("/interviews/1/text/extra")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_route_rejects_get() {
    let request = Request::get("/users").body(Body::empty()).unwrap();
    let (status, _, _) = send(request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
