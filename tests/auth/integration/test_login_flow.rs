use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::support::{read_json, read_problem, send_request, setup_test_app, PASSWORD};

fn instant(value: &serde_json::Value) -> DateTime<Utc> {
    value.as_str().and_then(|s| s.parse().ok()).expect("RFC 3339 instant")
}

#[tokio::test]
async fn register_login_and_me_resolve_the_same_account() {
    let app = setup_test_app().await;

    let response = app.register("Alice@Example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let registered = read_json(response).await;
    assert_eq!(
        registered,
        json!({
            "email": "alice@example.com",
            "firstName": "Alice",
            "lastName": "Liddell",
            "phoneNumber": null,
        })
    );

    let response = app.login("alice@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let tokens = read_json(response).await;
    assert!(instant(&tokens["accessTokenExpiresIn"]) < instant(&tokens["refreshTokenExpiresIn"]));

    let access = tokens["accessToken"].as_str().unwrap();
    let response = send_request(&app, Method::GET, "/auth/me", Some(access), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, registered);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;

    let wrong_password = app.login("alice@example.com", "Wrong123!").await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = read_problem(wrong_password).await;

    let unknown = app.login("nobody@example.com", PASSWORD).await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown = read_problem(unknown).await;

    assert_eq!(wrong_password, unknown);
    assert_eq!(wrong_password["title"], "Authentication Failed");
    assert_eq!(wrong_password["message"], "The username or password is incorrect");
}

#[tokio::test]
async fn disabled_account_is_locked() {
    let app = setup_test_app().await;
    app.register("alice@example.com").await;
    app.state.auth.set_account_enabled("alice@example.com", false).await.unwrap();

    let response = app.login("alice@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_problem(response).await;
    assert_eq!(body["title"], "Account Locked");

    // a wrong password still reports bad credentials, never the lock
    let response = app.login("alice@example.com", "Wrong123!").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = setup_test_app().await;
    assert_eq!(app.register("alice@example.com").await.status(), StatusCode::CREATED);

    let response = app.register("ALICE@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_problem(response).await;
    assert_eq!(body["title"], "Bad Request");
    assert_eq!(body["message"], "Email already in use");
}

#[tokio::test]
async fn registration_enforces_email_and_password_rules() {
    let app = setup_test_app().await;

    let response = send_request(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "alice@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_problem(response).await;
    assert_eq!(body["title"], "Validation Error");
    assert!(body["message"].as_str().unwrap().starts_with("password:"));

    let response = send_request(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = setup_test_app().await;
    let response = send_request(&app, Method::POST, "/auth/login", None, Some(json!({ "email": 5 })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_problem(response).await["title"], "Validation Error");
}
