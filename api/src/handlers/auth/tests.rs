use axum::http::{Method, StatusCode, header};
use chrono::{Duration, Utc};
use httptest::Server;
use pdash_db::{
    models::DbSession,
    storage::{SessionStore, SettingsStore},
};
use serde_json::json;

use crate::handlers::test_support::{TEST_PASSWORD, TestApp};

#[tokio::test]
async fn status_without_password_is_open() {
    let server = Server::run();
    let app = TestApp::open(&server).await;

    let (status, body) = app.get("/api/v1/auth/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["password_configured"], false);
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn status_reports_locked_dashboard() {
    let server = Server::run();
    let app = TestApp::locked(&server).await;

    let (status, body) = app.get("/api/v1/auth/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["password_configured"], true);
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn open_dashboard_serves_gated_endpoints() {
    let server = Server::run();
    let app = TestApp::open(&server).await;

    let (status, body) = app.get("/api/v1/auth/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auto_lock_minutes"], 0);
}

#[tokio::test]
async fn locked_dashboard_rejects_anonymous_requests() {
    let server = Server::run();
    let app = TestApp::locked(&server).await;

    let (status, body) = app.get("/api/v1/auth/settings").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "Unauthorized");
}

#[tokio::test]
async fn setup_sets_password_and_starts_session() {
    let server = Server::run();
    let mut app = TestApp::open(&server).await;

    let (status, headers, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/setup",
            Some(json!({ "password": "hunter2hunter2" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token_type"], "Session");
    let cookie = headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("pdash_session="));
    assert!(cookie.contains("HttpOnly"));

    app.adopt_session(&headers, &body);
    let (status, body) = app.get("/api/v1/auth/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["password_configured"], true);
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn setup_twice_conflicts() {
    let server = Server::run();
    let app = TestApp::locked(&server).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/setup",
            json!({ "password": "another password" }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "Conflict");
}

#[tokio::test]
async fn concurrent_setups_set_one_password() {
    let server = Server::run();
    let app = TestApp::open(&server).await;

    let (first, second) = tokio::join!(
        app.json(
            Method::POST,
            "/api/v1/auth/setup",
            json!({ "password": "first password" }),
        ),
        app.json(
            Method::POST,
            "/api/v1/auth/setup",
            json!({ "password": "second password" }),
        ),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let winner = if first.0 == StatusCode::CREATED {
        "first password"
    } else {
        "second password"
    };
    let settings = app.db.get_settings().await.unwrap();
    let stored = settings.password_hash.unwrap();
    assert!(pdash_db::password::verify_password(winner, &stored));
    assert_eq!(app.db.delete_all_sessions().await.unwrap(), 1);
}

#[tokio::test]
async fn setup_rejects_short_password() {
    let server = Server::run();
    let app = TestApp::open(&server).await;

    let (status, body) = app
        .json(Method::POST, "/api/v1/auth/setup", json!({ "password": "short" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidParams");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/setup",
            json!({ "password": "x".repeat(73) }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidParams");
    assert!(!app.db.get_settings().await.unwrap().has_password());
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let server = Server::run();
    let mut app = TestApp::locked(&server).await;

    let (status, _) = app.login("wrong password").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.cookie().is_none());
    assert_eq!(app.db.session_count().await, 0);
}

#[tokio::test]
async fn login_without_password_is_bad_request() {
    let server = Server::run();
    let mut app = TestApp::open(&server).await;

    let (status, _) = app.login(TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_grants_access() {
    let server = Server::run();
    let app = TestApp::logged_in(&server).await;

    assert!(app.csrf().is_some());
    assert_eq!(app.db.session_count().await, 1);

    let (status, _) = app.get("/api/v1/auth/settings").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn mutating_request_without_csrf_is_rejected() {
    let server = Server::run();
    let mut app = TestApp::logged_in(&server).await;
    let cookie = app.cookie().map(str::to_string);

    app.set_credentials(cookie.clone(), None);
    let (status, body) = app
        .json(
            Method::PUT,
            "/api/v1/auth/settings",
            json!({ "auto_lock_minutes": 15 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "CsrfFailed");

    app.set_credentials(cookie, Some("not-the-token".into()));
    let (status, body) = app
        .json(
            Method::PUT,
            "/api/v1/auth/settings",
            json!({ "auto_lock_minutes": 15 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "CsrfFailed");

    // the session itself is still good
    assert_eq!(app.db.session_count().await, 1);
}

#[tokio::test]
async fn expired_session_is_rejected_and_deleted() {
    let server = Server::run();
    let mut app = TestApp::locked(&server).await;

    let session = DbSession::issue(Utc::now() - Duration::hours(3), Duration::hours(1));
    app.db.create_session(session.clone()).await.unwrap();
    let cookie = format!("pdash_session={}", app.ctx.signer.sign(&session.id));
    app.set_credentials(Some(cookie), Some(session.csrf_token.clone()));

    let (status, body) = app.get("/api/v1/auth/settings").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "SessionExpired");
    assert!(app.db.get_session(&session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn idle_session_reports_lock() {
    let server = Server::run();
    let mut app = TestApp::locked(&server).await;

    let mut settings = app.db.get_settings().await.unwrap();
    settings.auto_lock_minutes = 10;
    app.db.put_settings(settings).await.unwrap();

    let session = DbSession::issue(Utc::now() - Duration::minutes(30), Duration::hours(24));
    app.db.create_session(session.clone()).await.unwrap();
    let cookie = format!("pdash_session={}", app.ctx.signer.sign(&session.id));
    app.set_credentials(Some(cookie), Some(session.csrf_token.clone()));

    let (status, body) = app.get("/api/v1/auth/settings").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "SessionLocked");
    assert!(app.db.get_session(&session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let server = Server::run();
    let mut app = TestApp::logged_in(&server).await;

    let (status, headers, _) = app.send(Method::POST, "/api/v1/auth/logout", None).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(app.db.session_count().await, 0);

    let (status, _) = app.get("/api/v1/auth/settings").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.set_credentials(None, None);
    let (status, _, _) = app.send(Method::POST, "/api/v1/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn changing_password_revokes_other_sessions() {
    let server = Server::run();
    let mut app = TestApp::logged_in(&server).await;

    let other_session = DbSession::issue(Utc::now(), Duration::hours(1));
    app.db.create_session(other_session.clone()).await.unwrap();

    let (status, headers, body) = app
        .send(
            Method::PUT,
            "/api/v1/auth/password",
            Some(json!({
                "current_password": TEST_PASSWORD,
                "new_password": "a much better password",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.db.get_session(&other_session.id).await.unwrap().is_none());
    assert_eq!(app.db.session_count().await, 1);

    app.adopt_session(&headers, &body);
    let (status, _) = app.get("/api/v1/auth/settings").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login(TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("a much better password").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn changing_password_requires_current_password() {
    let server = Server::run();
    let app = TestApp::logged_in(&server).await;

    let (status, _) = app
        .json(
            Method::PUT,
            "/api/v1/auth/password",
            json!({
                "current_password": "not it",
                "new_password": "a much better password",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.db.session_count().await, 1);
}

#[tokio::test]
async fn removing_password_opens_dashboard() {
    let server = Server::run();
    let mut app = TestApp::logged_in(&server).await;

    let (status, _) = app
        .json(
            Method::DELETE,
            "/api/v1/auth/password",
            json!({ "current_password": TEST_PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.db.session_count().await, 0);
    assert!(!app.db.get_settings().await.unwrap().has_password());

    app.set_credentials(None, None);
    let (_, body) = app.get("/api/v1/auth/status").await;
    assert_eq!(body["password_configured"], false);
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn settings_update_is_validated_and_persisted() {
    let server = Server::run();
    let app = TestApp::logged_in(&server).await;

    let (status, body) = app
        .json(
            Method::PUT,
            "/api/v1/auth/settings",
            json!({ "auto_lock_minutes": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auto_lock_minutes"], 30);
    assert_eq!(body["session_ttl_hours"], 168);

    let (status, _) = app
        .json(
            Method::PUT,
            "/api/v1/auth/settings",
            json!({ "auto_lock_minutes": 1_000_000 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = app.db.get_settings().await.unwrap();
    assert_eq!(stored.auto_lock_minutes, 30);
}
