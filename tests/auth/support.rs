#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use confido_auth::{
    api::{build_router, ApiState},
    config::{AppConfig, DatabaseConfig},
    domain::ManualClock,
    mail::MailSender,
    storage::create_pool,
    Result,
};
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;

pub const PASSWORD: &str = "Abcd123!";
pub const JWT_SECRET: &str = "integration-test-secret-with-32-plus-chars";

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub content: String,
}

impl SentMail {
    /// Clear reset token embedded in the link
    pub fn reset_token(&self) -> String {
        self.content
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .expect("reset link in mail body")
            .to_string()
    }
}

#[derive(Default)]
pub struct RecordingMailSender {
    sent: Mutex<Vec<SentMail>>,
    notify: Notify,
}

impl RecordingMailSender {
    pub async fn next_mail(&self) -> SentMail {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(mail) = self.take_first() {
                    return mail;
                }
                self.notify.notified().await;
            }
        })
        .await
        .expect("mail delivered in time")
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn take_first(&self) -> Option<SentMail> {
        let mut sent = self.sent.lock().unwrap();
        (!sent.is_empty()).then(|| sent.remove(0))
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, to: &str, content: &str, subject: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
        });
        self.notify.notify_one();
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: ApiState,
    pub clock: Arc<ManualClock>,
    pub mail: Arc<RecordingMailSender>,
    pub config: AppConfig,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::from_lookup(|key| match key {
        "CONFIDO_JWT_SECRET" => Some(JWT_SECRET.to_string()),
        "CONFIDO_ENABLE_CORS" => Some("false".to_string()),
        _ => None,
    });
    config.database = DatabaseConfig::in_memory();
    config
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(customize: impl FnOnce(&mut AppConfig)) -> TestApp {
    let mut config = test_config();
    customize(&mut config);
    config.validate().expect("valid test configuration");

    let pool = create_pool(&config.database).await.expect("create sqlite pool");
    let clock = Arc::new(ManualClock::starting_now());
    let mail = Arc::new(RecordingMailSender::default());
    let state = ApiState::from_config(&config, pool, mail.clone(), clock.clone())
        .expect("build api state");
    let router = build_router(state.clone(), &config.server);

    TestApp { router, state, clock, mail, config }
}

impl TestApp {
    pub async fn register(&self, email: &str) -> Response {
        send_request(
            self,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "email": email,
                "password": PASSWORD,
                "firstName": "Alice",
                "lastName": "Liddell",
            })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        send_request(
            self,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register then log in, returning the login body
    pub async fn signed_in(&self, email: &str) -> Value {
        assert_eq!(self.register(email).await.status(), StatusCode::CREATED);
        let response = self.login(email, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await
    }
}

pub async fn send_request(
    app: &TestApp,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    app.router.clone().oneshot(request).await.expect("router response")
}

pub async fn send_raw(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.expect("router response")
}

pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Problem body with the volatile timestamp removed
pub async fn read_problem(response: Response) -> Value {
    let mut body = read_json(response).await;
    let timestamp = body
        .as_object_mut()
        .and_then(|object| object.remove("timestamp"))
        .expect("problem body carries a timestamp");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp.as_str().unwrap()).is_ok());
    body
}
