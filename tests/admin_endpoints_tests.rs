//! Admin Portal Integration Tests
//!
//! Covers the admin guards, dashboard counters, event and account
//! management, and log maintenance.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::json;

mod common;
use common::*;

use reminder::models::log;
use reminder::models::prelude::*;

async fn insert_log(db: &sea_orm::DatabaseConnection, msg: &str, age: Duration) {
    log::ActiveModel {
        log_name: Set("main".to_string()),
        level: Set("INFO".to_string()),
        msg: Set(msg.to_string()),
        time: Set(Utc::now() - age),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_admin_routes_are_guarded() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let bob = create_test_user(&db, "bob", "user").await;

    for uri in ["/api/admin/dashboard", "/api/admin/users", "/api/admin/events", "/api/admin/logs"] {
        let (status, _) = send(&app, get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);

        let (status, _) = send(&app, get(uri, Some(&session_cookie(&bob)))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_dashboard_counts() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let admin = create_test_user(&db, "admin", "admin").await;
    let alice = create_test_user(&db, "alice", "user").await;
    create_test_user(&db, "bob", "user").await;

    insert_event(&db, event_template(alice.id, "Active", None)).await;
    let mut inactive = event_template(alice.id, "Inactive", None);
    inactive.is_active = Set(false);
    insert_event(&db, inactive).await;

    let (status, body) = send(&app, get("/api/admin/dashboard", Some(&session_cookie(&admin)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users_count"], 3);
    assert_eq!(body["admin_users_count"], 1);
    assert_eq!(body["standard_users_count"], 2);
    assert_eq!(body["events_count"], 2);
    assert_eq!(body["events_active"], 1);
    assert_eq!(body["events_notactive"], 1);
    assert_eq!(body["search_status"], false);
    assert_eq!(body["notification_status"], false);

    let chart = body["events_created"].as_array().unwrap();
    assert_eq!(chart.len(), 31);
    assert_eq!(chart.last().unwrap()["count"], 2);
}

#[tokio::test]
async fn test_admin_edit_can_rearm_notification() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let admin = create_test_user(&db, "admin", "admin").await;
    let alice = create_test_user(&db, "alice", "user").await;

    let notify_at = Utc::now() + Duration::hours(2);
    let mut sent = event_template(alice.id, "Dentist", Some(notify_at));
    sent.notification_sent = Set(true);
    let event = insert_event(&db, sent).await;

    let start = event.time_event_start;
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/events/{}", event.id),
            Some(&session_cookie(&admin)),
            json!({
                "title": "Dentist",
                "time_event_start": start.to_rfc3339(),
                "time_event_stop": (start + Duration::hours(1)).to_rfc3339(),
                "to_notify": true,
                "time_notify": notify_at.to_rfc3339(),
                "notified_users": [alice.id],
                "notification_sent": false
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notification_sent"], false);
    assert!(!reload_event(&db, event.id).await.notification_sent);
}

#[tokio::test]
async fn test_toggle_active_and_delete_event() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let admin = create_test_user(&db, "admin", "admin").await;
    let alice = create_test_user(&db, "alice", "user").await;
    let event = insert_event(&db, event_template(alice.id, "Board meeting", None)).await;
    add_recipients(&db, event.id, &[&alice]).await;
    let cookie = session_cookie(&admin);

    let toggle = format!("/api/admin/events/{}/toggle-active", event.id);
    let (status, body) = send(&app, json_request("POST", &toggle, Some(&cookie), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (_, body) = send(&app, json_request("POST", &toggle, Some(&cookie), json!({}))).await;
    assert_eq!(body["is_active"], true);

    let (status, _) = send(&app, delete(&format!("/api/admin/events/{}", event.id), Some(&cookie))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(Event::find_by_id(event.id).one(&db).await.unwrap().is_none());
    assert_eq!(EventRecipient::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_admin_event_listing_sorts_by_column() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let admin = create_test_user(&db, "admin", "admin").await;

    let first = insert_event(&db, event_template(admin.id, "First", None)).await;
    let second = insert_event(&db, event_template(admin.id, "Second", None)).await;

    let (status, body) = send(
        &app,
        get("/api/admin/events?col=id&dir=desc", Some(&session_cookie(&admin))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["id"], second.id);
    assert_eq!(body["items"][1]["id"], first.id);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let admin = create_test_user(&db, "admin", "admin").await;
    create_test_user(&db, "alice", "user").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/users",
            Some(&session_cookie(&admin)),
            json!({
                "username": "alice",
                "email": "other@example.com",
                "password": TEST_PASSWORD,
                "role": "user"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/users",
            Some(&session_cookie(&admin)),
            json!({
                "username": "carol",
                "email": "Carol@Example.com",
                "password": TEST_PASSWORD,
                "role": "user",
                "pass_change_req": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "carol@example.com");
    assert_eq!(body["role"], "user");
    assert_eq!(body["pass_change_req"], true);
}

#[tokio::test]
async fn test_delete_user_removes_authored_events() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let admin = create_test_user(&db, "admin", "admin").await;
    let alice = create_test_user(&db, "alice", "user").await;
    let bob = create_test_user(&db, "bob", "user").await;

    let authored = insert_event(&db, event_template(alice.id, "Alice's party", None)).await;
    add_recipients(&db, authored.id, &[&bob]).await;
    let other = insert_event(&db, event_template(bob.id, "Bob's party", None)).await;
    add_recipients(&db, other.id, &[&alice]).await;
    let cookie = session_cookie(&admin);

    let (status, _) = send(&app, delete(&format!("/api/admin/users/{}", admin.id), Some(&cookie))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, delete(&format!("/api/admin/users/{}", alice.id), Some(&cookie))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(User::find_by_id(alice.id).one(&db).await.unwrap().is_none());
    assert!(Event::find_by_id(authored.id).one(&db).await.unwrap().is_none());
    assert!(Event::find_by_id(other.id).one(&db).await.unwrap().is_some());
    assert_eq!(EventRecipient::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_logs_listing_and_clearing_by_range() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let admin = create_test_user(&db, "admin", "admin").await;
    let cookie = session_cookie(&admin);

    insert_log(&db, "fresh", Duration::minutes(5)).await;
    insert_log(&db, "three days old", Duration::days(3)).await;
    insert_log(&db, "two weeks old", Duration::days(15)).await;

    let (status, body) = send(&app, get("/api/admin/logs", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["items"][0]["msg"], "fresh");

    let (status, body) = send(&app, delete("/api/admin/logs?range=week1", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (_, body) = send(&app, delete("/api/admin/logs?range=day1", Some(&cookie))).await;
    assert_eq!(body["deleted"], 1);
    assert_eq!(Log::find().count(&db).await.unwrap(), 1);

    let (_, body) = send(&app, delete("/api/admin/logs?range=all", Some(&cookie))).await;
    assert_eq!(body["deleted"], 1);
}

#[tokio::test]
async fn test_search_status_without_engine() {
    let db = create_test_db().await;
    let state = create_test_state(db.clone(), FakeMailer::new());
    let app = create_test_app(&state);
    let admin = create_test_user(&db, "admin", "admin").await;

    let (status, body) = send(&app, get("/api/admin/search-engine", Some(&session_cookie(&admin)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
}
