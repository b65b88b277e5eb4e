use axum::http::{Method, StatusCode};
use chrono::Duration;
use serde_json::json;

use crate::support::{read_json, read_problem, send_request, setup_test_app, TestApp, PASSWORD};

const NEW_PASSWORD: &str = "Newpass1!";

async fn forgot(app: &TestApp, email: &str) -> axum::response::Response {
    send_request(app, Method::POST, "/auth/forgot-password", None, Some(json!({ "email": email })))
        .await
}

async fn reset(app: &TestApp, token: &str, password: &str) -> axum::response::Response {
    send_request(
        app,
        Method::PUT,
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "password": password })),
    )
    .await
}

#[tokio::test]
async fn forgot_password_response_does_not_reveal_existence() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;

    let known = forgot(&app, "alice@example.com").await;
    let unknown = forgot(&app, "nobody@example.com").await;
    assert_eq!(known.status(), StatusCode::OK);
    assert_eq!(unknown.status(), StatusCode::OK);
    assert_eq!(read_json(known).await, read_json(unknown).await);

    let mail = app.mail.next_mail().await;
    assert_eq!(mail.to, "alice@example.com");
    assert_eq!(app.mail.sent_count(), 0);
}

#[tokio::test]
async fn reset_changes_password_and_token_works_once() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;
    forgot(&app, "alice@example.com").await;
    let token = app.mail.next_mail().await.reset_token();

    let response = reset(&app, &token, NEW_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["message"], "Password has been reset successfully");

    assert_eq!(app.login("alice@example.com", NEW_PASSWORD).await.status(), StatusCode::OK);
    assert_eq!(app.login("alice@example.com", PASSWORD).await.status(), StatusCode::UNAUTHORIZED);

    let replay = reset(&app, &token, "Another1!").await;
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_problem(replay).await["title"], "Invalid Reset Token");
}

#[tokio::test]
async fn concurrent_consumers_succeed_exactly_once() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;
    forgot(&app, "alice@example.com").await;
    let token = app.mail.next_mail().await.reset_token();

    let (first, second) = tokio::join!(reset(&app, &token, NEW_PASSWORD), reset(&app, &token, "Other123!"));
    let statuses = [first.status(), second.status()];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count(), 1);
}

#[tokio::test]
async fn second_request_invalidates_first_token() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;

    forgot(&app, "alice@example.com").await;
    let first = app.mail.next_mail().await.reset_token();
    forgot(&app, "alice@example.com").await;
    let second = app.mail.next_mail().await.reset_token();

    assert_eq!(reset(&app, &first, NEW_PASSWORD).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(reset(&app, &second, NEW_PASSWORD).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn reset_after_ttl_is_expired() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;
    forgot(&app, "alice@example.com").await;
    let token = app.mail.next_mail().await.reset_token();

    app.clock.advance(app.config.auth.reset_token_ttl() + Duration::seconds(1));
    let response = reset(&app, &token, NEW_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_problem(response).await["title"], "Expired Reset Token");
}

#[tokio::test]
async fn reset_enforces_password_policy() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;
    forgot(&app, "alice@example.com").await;
    let token = app.mail.next_mail().await.reset_token();

    let response = reset(&app, &token, "weak").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_problem(response).await["title"], "Validation Error");

    // rejected input does not burn the token
    assert_eq!(reset(&app, &token, NEW_PASSWORD).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn access_tokens_survive_a_password_reset() {
    let app = setup_test_app().await;
    let tokens = app.signed_in("alice@example.com").await;
    let access = tokens["accessToken"].as_str().unwrap();

    forgot(&app, "alice@example.com").await;
    let token = app.mail.next_mail().await.reset_token();
    assert_eq!(reset(&app, &token, NEW_PASSWORD).await.status(), StatusCode::OK);

    // No revocation store: tokens issued before the reset stay valid until expiry.
    let response = send_request(&app, Method::GET, "/auth/me", Some(access), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn forgot_password_for_disabled_account_sends_nothing() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;
    app.state.auth.set_account_enabled("alice@example.com", false).await.unwrap();

    let response = forgot(&app, "alice@example.com").await;
    assert_eq!(response.status(), StatusCode::OK);
    tokio::task::yield_now().await;
    assert_eq!(app.mail.sent_count(), 0);
}
