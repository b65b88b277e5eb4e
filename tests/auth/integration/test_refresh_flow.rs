use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, FixedOffset};
use serde_json::json;

use crate::support::{read_json, read_problem, send_request, setup_test_app, setup_test_app_with};

async fn refresh(app: &crate::support::TestApp, token: &str) -> axum::response::Response {
    send_request(app, Method::POST, "/auth/refresh", None, Some(json!({ "refreshToken": token })))
        .await
}

#[tokio::test]
async fn refresh_issues_a_working_access_token() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;

    app.clock.advance(Duration::hours(2));
    let response = refresh(&app, tokens["refreshToken"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body.get("refreshToken").is_none());

    let access = body["accessToken"].as_str().unwrap();
    let response = send_request(&app, Method::GET, "/auth/me", Some(access), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn access_token_is_rejected_by_refresh() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;

    let response = refresh(&app, tokens["accessToken"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_problem(response).await["title"], "Invalid Token");
}

#[tokio::test]
async fn expired_refresh_token_is_rejected() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;

    app.clock.advance(app.config.auth.refresh_token_ttl());
    let response = refresh(&app, tokens["refreshToken"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_for_disabled_account_is_rejected() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;
    app.state.auth.set_account_enabled("alice@example.com", false).await.unwrap();

    let response = refresh(&app, tokens["refreshToken"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rotation_returns_a_new_refresh_token_when_enabled() {
    let app = setup_test_app_with(|config| config.auth.rotate_refresh_tokens = true).await;
    let tokens = app.signed_in("alice@example.com").await;
    let original = tokens["refreshToken"].as_str().unwrap();

    app.clock.advance(Duration::minutes(1));
    let response = refresh(&app, original).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let rotated = body["refreshToken"].as_str().expect("rotated refresh token");
    assert_ne!(rotated, original);
    assert!(
        instant(&body["refreshTokenExpiresIn"]) > instant(&tokens["refreshTokenExpiresIn"]),
        "rotated refresh token must expire later than the one it replaces"
    );

    let response = refresh(&app, rotated).await;
    assert_eq!(response.status(), StatusCode::OK);
}

fn instant(value: &serde_json::Value) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value.as_str().expect("RFC 3339 string")).unwrap()
}
