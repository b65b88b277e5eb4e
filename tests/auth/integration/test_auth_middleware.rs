use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::Duration;
use confido_auth::auth::{TokenCodec, TokenKind};
use serde_json::json;

use crate::support::{read_problem, send_raw, send_request, setup_test_app};

#[tokio::test]
async fn protected_route_without_token_is_access_denied() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::GET, "/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_problem(response).await;
    assert_eq!(
        body,
        json!({
            "status": 403,
            "title": "Access Denied",
            "detail": "You are not authorized to access this resource",
            "message": "You are not authorized to access this resource",
        })
    );
}

#[tokio::test]
async fn malformed_authorization_header_is_treated_as_anonymous() {
    let app = setup_test_app().await;
    let request = Request::builder()
        .method(Method::GET)
        .uri("/auth/me")
        .header("Authorization", "Basic YWxpY2U6c2VjcmV0")
        .body(Body::empty())
        .unwrap();

    let response = send_raw(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_paths_reveal_nothing_to_anonymous_callers() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;
    let access = tokens["accessToken"].as_str().unwrap();

    let anonymous = send_request(&app, Method::GET, "/admin/users", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);

    let authenticated = send_request(&app, Method::GET, "/admin/users", Some(access), None).await;
    assert_eq!(authenticated.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_problem(authenticated).await["title"], "Not Found");
}

#[tokio::test]
async fn refresh_token_is_not_a_bearer_credential() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;
    let refresh = tokens["refreshToken"].as_str().unwrap();

    let response = send_request(&app, Method::GET, "/auth/me", Some(refresh), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_problem(response).await["title"], "Invalid Token");
}

#[tokio::test]
async fn forged_and_expired_tokens_render_identical_bodies() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;
    let access = tokens["accessToken"].as_str().unwrap().to_string();

    let forger = TokenCodec::new(
        b"a-completely-different-secret-32-bytes!",
        "confido",
        app.clock.clone(),
    )
    .unwrap();
    let forged = forger.issue("alice@example.com", TokenKind::Access, Duration::hours(1)).unwrap();

    app.clock.advance(app.config.auth.access_token_ttl());

    let expired = send_request(&app, Method::GET, "/auth/me", Some(&access), None).await;
    assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
    let forged = send_request(&app, Method::GET, "/auth/me", Some(&forged.token), None).await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(read_problem(expired).await, read_problem(forged).await);
}

#[tokio::test]
async fn token_for_disabled_account_stops_working() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;
    let access = tokens["accessToken"].as_str().unwrap();

    app.state.auth.set_account_enabled("alice@example.com", false).await.unwrap();
    let response = send_request(&app, Method::GET, "/auth/me", Some(access), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_routes_ignore_bad_tokens() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;

    let response = send_request(
        &app,
        Method::POST,
        "/auth/login",
        Some("garbage"),
        Some(json!({ "email": "alice@example.com", "password": crate::support::PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
