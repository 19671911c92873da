//! Test helpers shared by the integration tests.
//!
//! In-memory SQLite with migrations, user and event factories, a recording
//! mail transport, and request helpers for the router.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tower::util::ServiceExt;

use reminder::db::connect_with_url;
use reminder::endpoints::create_router;
use reminder::models::prelude::*;
use reminder::models::{event, event_recipient, role, user};
use reminder::services::mail::{
    deliver_batch, MailError, MailSession, MailSettings, MailTransport, OutgoingMail, Recipient,
};
use reminder::services::runtime_config::{
    MAIL_PASSWORD, MAIL_PORT, MAIL_SECURITY, MAIL_SERVER, MAIL_USERNAME,
};
use reminder::services::security::{create_session_token, SESSION_COOKIE};
use reminder::services::{RuntimeConfig, SearchService};
use reminder::state::AppState;

/// Password accepted by the password policy, used for every test account
pub const TEST_PASSWORD: &str = "Passw0rd!";

/// Create an in-memory SQLite database with all migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    connect_with_url("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

pub async fn role_id(db: &DatabaseConnection, name: &str) -> i64 {
    Role::find()
        .filter(role::Column::Name.eq(name))
        .one(db)
        .await
        .unwrap()
        .expect("seeded role")
        .id
}

/// Create an enabled account with [`TEST_PASSWORD`]
pub async fn create_test_user(db: &DatabaseConnection, username: &str, role_name: &str) -> user::Model {
    let role_id = role_id(db, role_name).await;
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set(bcrypt::hash(TEST_PASSWORD, 4).unwrap()),
        access_granted: Set(true),
        failed_login_attempts: Set(0),
        pass_change_req: Set(false),
        role_id: Set(role_id),
        last_seen: Set(None),
        creation_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user")
}

pub async fn reload_user(db: &DatabaseConnection, id: i64) -> user::Model {
    User::find_by_id(id).one(db).await.unwrap().expect("user exists")
}

pub async fn reload_event(db: &DatabaseConnection, id: i64) -> event::Model {
    Event::find_by_id(id).one(db).await.unwrap().expect("event exists")
}

/// Event starting in a day, to be notified at `notify_at`
pub fn event_template(author_id: i64, title: &str, notify_at: Option<DateTime<Utc>>) -> event::ActiveModel {
    let now = Utc::now();
    let start = now + Duration::days(1);
    event::ActiveModel {
        title: Set(title.to_string()),
        details: Set(Some(format!("Details of {}", title))),
        time_creation: Set(now),
        all_day_event: Set(false),
        time_event_start: Set(start),
        time_event_stop: Set(start + Duration::hours(1)),
        to_notify: Set(notify_at.is_some()),
        time_notify: Set(notify_at),
        notification_sent: Set(false),
        is_active: Set(true),
        author_id: Set(author_id),
        ..Default::default()
    }
}

pub async fn insert_event(db: &DatabaseConnection, model: event::ActiveModel) -> event::Model {
    model.insert(db).await.expect("Failed to create test event")
}

pub async fn add_recipients(db: &DatabaseConnection, event_id: i64, users: &[&user::Model]) {
    for user in users {
        event_recipient::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user.id),
        }
        .insert(db)
        .await
        .unwrap();
    }
}

// ============================================================================
// Fake Mail Transport
// ============================================================================

/// How the fake server answers when a session is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerBehaviour {
    Accept,
    RejectCredentials,
    Unreachable,
}

#[derive(Default)]
struct FakeSession {
    reject: Mutex<Vec<String>>,
    sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl MailSession for FakeSession {
    async fn deliver(&self, mail: OutgoingMail) -> Result<(), MailError> {
        if self.reject.lock().contains(&mail.to.email) {
            return Err(MailError::Rejected(format!("550 mailbox unavailable: {}", mail.to.email)));
        }
        self.sent.lock().push(mail);
        Ok(())
    }
}

/// Mail transport that records messages instead of talking SMTP
pub struct FakeMailer {
    session: FakeSession,
    behaviour: Mutex<ServerBehaviour>,
    sessions_opened: AtomicUsize,
    tests_run: AtomicUsize,
}

impl FakeMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            session: FakeSession::default(),
            behaviour: Mutex::new(ServerBehaviour::Accept),
            sessions_opened: AtomicUsize::new(0),
            tests_run: AtomicUsize::new(0),
        })
    }

    pub fn set_behaviour(&self, behaviour: ServerBehaviour) {
        *self.behaviour.lock() = behaviour;
    }

    pub fn reject_address(&self, email: &str) {
        self.session.reject.lock().push(email.to_string());
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.session.sent.lock().clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn tests_run(&self) -> usize {
        self.tests_run.load(Ordering::SeqCst)
    }

    fn connect(&self) -> Result<(), MailError> {
        match *self.behaviour.lock() {
            ServerBehaviour::Accept => Ok(()),
            ServerBehaviour::RejectCredentials => Err(MailError::Authentication(
                "535 5.7.8 Authentication credentials invalid".to_string(),
            )),
            ServerBehaviour::Unreachable => {
                Err(MailError::Connection("connection refused".to_string()))
            }
        }
    }
}

#[async_trait]
impl MailTransport for FakeMailer {
    async fn send(
        &self,
        _settings: &MailSettings,
        subject: &str,
        recipients: &[Recipient],
        event: &event::Model,
    ) -> Result<Vec<Recipient>, MailError> {
        self.connect()?;
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        deliver_batch(&self.session, subject, recipients, event).await
    }

    async fn test_connection(&self, _settings: &MailSettings) -> Result<(), MailError> {
        self.tests_run.fetch_add(1, Ordering::SeqCst);
        self.connect()
    }
}

// ============================================================================
// Application State & Requests
// ============================================================================

/// Runtime config holding complete, valid mail settings
pub fn test_runtime_config() -> RuntimeConfig {
    let config = RuntimeConfig::new();
    config.set(MAIL_SERVER, "smtp.example.com");
    config.set(MAIL_PORT, "587");
    config.set(MAIL_SECURITY, "tls");
    config.set(MAIL_USERNAME, "reminder@example.com");
    config.set(MAIL_PASSWORD, "mail-secret");
    config
}

pub fn create_test_state(db: DatabaseConnection, mailer: Arc<FakeMailer>) -> AppState {
    AppState::new(db, test_runtime_config(), mailer, SearchService::disabled())
}

pub fn create_test_app(state: &AppState) -> Router {
    create_router(state.clone())
}

/// `Cookie` header value carrying a fresh session for `user`
pub fn session_cookie(user: &user::Model) -> String {
    format!("{}={}", SESSION_COOKIE, create_session_token(user.id).unwrap())
}

/// Send a request and return the status and JSON body (`Null` when empty)
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Like [`send`], also returning the response headers
pub async fn send_with_headers(
    app: &Router,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, headers, json)
}
