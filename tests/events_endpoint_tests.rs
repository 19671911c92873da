//! Event Endpoint Integration Tests
//!
//! Covers the public and author-facing event API: listings, creation with
//! recipient filtering, author-only edits, soft delete and the calendar feed.

use axum::http::StatusCode;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

mod common;
use common::*;

fn event_body(title: &str, recipients: &[i64]) -> Value {
    let start = Utc::now() + Duration::days(2);
    json!({
        "title": title,
        "details": "  Bring slides  ",
        "time_event_start": start.to_rfc3339_opts(SecondsFormat::Secs, true),
        "time_event_stop": (start + Duration::hours(2)).to_rfc3339_opts(SecondsFormat::Secs, true),
        "to_notify": true,
        "time_notify": (start - Duration::hours(3)).to_rfc3339_opts(SecondsFormat::Secs, true),
        "notified_users": recipients,
    })
}

fn titles(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_event_keeps_only_standard_recipients() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let alice = create_test_user(&db, "alice", "user").await;
    let bob = create_test_user(&db, "bob", "user").await;
    let admin = create_test_user(&db, "admin", "admin").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/events",
            Some(&session_cookie(&alice)),
            event_body("Quarterly review", &[bob.id, admin.id, 9999]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author_id"], alice.id);
    assert_eq!(body["details"], "Bring slides");
    assert_eq!(body["notification_sent"], false);
    assert_eq!(body["timing"], "upcoming");

    let recipients = body["notified_users"].as_array().unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0]["username"], "bob");
}

#[tokio::test]
async fn test_create_event_requires_session() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/events", None, event_body("Anonymous", &[])),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_event_is_rejected() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let alice = create_test_user(&db, "alice", "user").await;
    let cookie = session_cookie(&alice);

    let mut body = event_body("Backwards", &[]);
    body["time_event_stop"] = json!((Utc::now() - Duration::days(1)).to_rfc3339());
    let (status, _) = send(&app, json_request("POST", "/api/events", Some(&cookie), body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = event_body("No notify time", &[]);
    body["time_notify"] = Value::Null;
    let (status, _) = send(&app, json_request("POST", "/api/events", Some(&cookie), body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_listing_modes() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let alice = create_test_user(&db, "alice", "user").await;
    let bob = create_test_user(&db, "bob", "user").await;

    insert_event(&db, event_template(alice.id, "Alice upcoming", None)).await;
    insert_event(&db, event_template(bob.id, "Bob upcoming", None)).await;

    let mut finished = event_template(alice.id, "Alice finished", None);
    finished.time_event_start = sea_orm::Set(Utc::now() - Duration::days(3));
    finished.time_event_stop = sea_orm::Set(Utc::now() - Duration::days(2));
    insert_event(&db, finished).await;

    let mut hidden = event_template(alice.id, "Alice hidden", None);
    hidden.is_active = sea_orm::Set(false);
    insert_event(&db, hidden).await;

    let (status, current) = send(&app, get("/api/events", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["total"], 2);

    let (_, all) = send(&app, get("/api/events?list=all", None)).await;
    let mut all_titles = titles(&all);
    all_titles.sort();
    assert_eq!(all_titles, vec!["Alice finished", "Alice upcoming", "Bob upcoming"]);

    let (_, own) = send(&app, get("/api/events?list=own", Some(&session_cookie(&alice)))).await;
    assert_eq!(titles(&own), vec!["Alice upcoming"]);

    let (_, by_author) = send(&app, get(&format!("/api/events?list=author&id={}", bob.id), None)).await;
    assert_eq!(titles(&by_author), vec!["Bob upcoming"]);

    let (status, _) = send(&app, get("/api/events?list=own", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_author_can_edit() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let alice = create_test_user(&db, "alice", "user").await;
    let mallory = create_test_user(&db, "mallory", "user").await;
    let event = insert_event(&db, event_template(alice.id, "Standup", None)).await;
    let uri = format!("/api/events/{}", event.id);

    let (status, _) = send(
        &app,
        json_request("PUT", &uri, Some(&session_cookie(&mallory)), event_body("Hijacked", &[])),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reload_event(&db, event.id).await.title, "Standup");

    let (status, body) = send(
        &app,
        json_request("PUT", &uri, Some(&session_cookie(&alice)), event_body("Standup moved", &[mallory.id])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Standup moved");
    assert_eq!(body["notified_users"][0]["username"], "mallory");
}

#[tokio::test]
async fn test_author_edit_keeps_sent_flag() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let alice = create_test_user(&db, "alice", "user").await;

    let mut sent = event_template(alice.id, "Already mailed", Some(Utc::now() - Duration::hours(1)));
    sent.notification_sent = sea_orm::Set(true);
    let event = insert_event(&db, sent).await;

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/events/{}", event.id),
            Some(&session_cookie(&alice)),
            event_body("Already mailed, renamed", &[]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(reload_event(&db, event.id).await.notification_sent);
}

#[tokio::test]
async fn test_deactivate_hides_event() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let alice = create_test_user(&db, "alice", "user").await;
    let event = insert_event(&db, event_template(alice.id, "Cancelled trip", None)).await;
    let cookie = session_cookie(&alice);

    let (status, _) = send(
        &app,
        json_request("POST", &format!("/api/events/{}/deactivate", event.id), Some(&cookie), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!reload_event(&db, event.id).await.is_active);

    let (status, _) = send(&app, get(&format!("/api/events/{}", event.id), Some(&cookie))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listing) = send(&app, get("/api/events?list=all", None)).await;
    assert_eq!(listing["total"], 0);
}

#[tokio::test]
async fn test_calendar_colours_by_timing() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let alice = create_test_user(&db, "alice", "user").await;
    let now = Utc::now();

    insert_event(&db, event_template(alice.id, "Tomorrow", None)).await;

    let mut ongoing = event_template(alice.id, "Right now", None);
    ongoing.time_event_start = sea_orm::Set(now - Duration::hours(1));
    ongoing.time_event_stop = sea_orm::Set(now + Duration::hours(1));
    insert_event(&db, ongoing).await;

    let mut past = event_template(alice.id, "Yesterday", None);
    past.time_event_start = sea_orm::Set(now - Duration::days(1));
    past.time_event_stop = sea_orm::Set(now - Duration::days(1) + Duration::hours(1));
    insert_event(&db, past).await;

    let start = (now - Duration::days(7)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let end = (now + Duration::days(7)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let (status, body) = send(
        &app,
        get(&format!("/api/events/calendar?start={}&end={}", start, end), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let colour_of = |title: &str| {
        body.as_array()
            .unwrap()
            .iter()
            .find(|e| e["title"] == title)
            .map(|e| e["backgroundColor"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(colour_of("Tomorrow"), "blue");
    assert_eq!(colour_of("Right now"), "green");
    assert_eq!(colour_of("Yesterday"), "red");
    assert_eq!(body[0]["extendedProps"]["details"], "Details of Yesterday");
}

#[tokio::test]
async fn test_search_without_engine_is_unavailable() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);

    let (status, body) = send(&app, get("/api/events/search?q=lunch", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Sorry! No connection with search engine!");
}

#[tokio::test]
async fn test_notifiable_users_lists_standard_accounts() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let alice = create_test_user(&db, "alice", "user").await;
    create_test_user(&db, "admin", "admin").await;

    let (status, body) = send(&app, get("/api/users/notifiable", Some(&session_cookie(&alice)))).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice"]);
}
