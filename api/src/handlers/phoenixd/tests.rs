use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures::{SinkExt, StreamExt};
use httptest::{
    Expectation, Server,
    matchers::request,
    responders::{json_encoded, status_code},
};
use pdash_common::views::PhoenixdEvent;
use pdash_db::storage::SettingsStore;
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, accept_async, connect_async, tungstenite::Message,
};

use crate::{handlers::test_support::TestApp, phoenixd::manager::EVENT_CHANNEL_CAPACITY};

fn node_info(node_id: &str) -> Value {
    json!({
        "nodeId": node_id,
        "channels": [],
        "chain": "testnet",
        "blockHeight": 100,
        "version": "0.5.1"
    })
}

#[tokio::test]
async fn status_reports_local_instance() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/getinfo"))
            .respond_with(json_encoded(node_info("03local"))),
    );

    let app = TestApp::open(&server).await;
    let (status, body) = app.get("/api/v1/phoenixd/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "local");
    assert_eq!(body["http_reachable"], true);
    assert_eq!(body["events"]["state"], "stopped");
    assert_eq!(body["launcher"], Value::Null);
}

#[tokio::test]
async fn switching_to_external_persists_and_applies() {
    let local = Server::run();
    let external = Server::run();
    external.expect(
        Expectation::matching(request::method_path("GET", "/getinfo"))
            .respond_with(json_encoded(node_info("03remote"))),
    );

    let app = TestApp::logged_in(&local).await;
    let external_url = external.url_str("/");

    let (status, body) = app
        .json(
            Method::PUT,
            "/api/v1/phoenixd/config",
            json!({ "mode": "external", "url": external_url, "password": "remote" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "external");
    assert_eq!(body["url"], external_url.trim_end_matches('/'));
    assert_eq!(body["http_reachable"], true);

    let stored = app.db.get_settings().await.unwrap();
    assert!(stored.phoenixd.use_external);
    assert_eq!(stored.phoenixd.external_password.as_deref(), Some("remote"));

    let active = app.ctx.phoenixd.connection().await;
    assert_eq!(active.password(), "remote");
}

#[tokio::test]
async fn switching_back_to_local_keeps_saved_external() {
    let local = Server::run();
    local.expect(
        Expectation::matching(request::method_path("GET", "/getinfo"))
            .respond_with(json_encoded(node_info("03local"))),
    );

    let app = TestApp::open(&local).await;
    let mut settings = app.db.get_settings().await.unwrap();
    settings.phoenixd.use_external = true;
    settings.phoenixd.external_url = Some("https://node.example.com".into());
    settings.phoenixd.external_password = Some("remote".into());
    app.db.put_settings(settings).await.unwrap();

    let (status, body) = app
        .json(Method::PUT, "/api/v1/phoenixd/config", json!({ "mode": "local" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "local");

    let stored = app.db.get_settings().await.unwrap();
    assert!(!stored.phoenixd.use_external);
    assert_eq!(
        stored.phoenixd.external_url.as_deref(),
        Some("https://node.example.com")
    );
}

#[tokio::test]
async fn external_mode_requires_credentials() {
    let server = Server::run();
    let app = TestApp::open(&server).await;

    let (status, body) = app
        .json(
            Method::PUT,
            "/api/v1/phoenixd/config",
            json!({ "mode": "external", "url": "https://node.example.com" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidParams");
    assert!(!app.db.get_settings().await.unwrap().phoenixd.use_external);
}

#[tokio::test]
async fn probe_does_not_switch() {
    let local = Server::run();
    let candidate = Server::run();
    candidate.expect(
        Expectation::matching(request::method_path("GET", "/getinfo"))
            .respond_with(json_encoded(node_info("03candidate"))),
    );

    let app = TestApp::open(&local).await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/phoenixd/test",
            json!({ "url": candidate.url_str("/"), "password": "pw" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["node_id"], "03candidate");
    assert_eq!(
        app.ctx.phoenixd.connection().await.url(),
        local.url_str("/").trim_end_matches('/')
    );
}

#[tokio::test]
async fn failed_probe_is_reported_not_raised() {
    let local = Server::run();
    let candidate = Server::run();
    candidate.expect(
        Expectation::matching(request::method_path("GET", "/getinfo"))
            .respond_with(status_code(401)),
    );

    let app = TestApp::open(&local).await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/phoenixd/test",
            json!({ "url": candidate.url_str("/"), "password": "wrong" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());
}

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("no message within 5s")
            .expect("socket closed")
            .unwrap();

        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn events_socket_relays_state_and_events() {
    let phoenixd = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let phoenixd_addr = phoenixd.local_addr().unwrap();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let (tcp, _) = phoenixd.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let _ = release_rx.await;
        ws.send(Message::text(
            r#"{"type":"payment_received","amountSat":42,"paymentHash":"h42"}"#.to_string(),
        ))
        .await
        .unwrap();
        let _ = ws.next().await;
    });

    let app = TestApp::with_phoenixd_url(&format!("http://{phoenixd_addr}")).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let (mut client, _) = connect_async(format!("ws://{addr}/api/v1/events"))
        .await
        .unwrap();

    let first = next_json(&mut client).await;
    assert_eq!(first["channel"], "connection");
    assert_eq!(first["data"]["state"], "stopped");

    app.ctx.phoenixd.start().await;
    loop {
        let message = next_json(&mut client).await;
        if message["channel"] == "connection" && message["data"]["state"] == "connected" {
            break;
        }
    }

    release_tx.send(()).unwrap();
    loop {
        let message = next_json(&mut client).await;
        if message["channel"] == "phoenixd" {
            assert_eq!(message["data"]["type"], "payment_received");
            assert_eq!(message["data"]["amountSat"], 42);
            break;
        }
    }

    app.ctx.phoenixd.stop().await;
    assert!(matches!(
        app.ctx.phoenixd.stream_state(),
        pdash_common::views::StreamState::Stopped
    ));
}

#[tokio::test]
async fn slow_client_is_told_it_lagged_and_keeps_streaming() {
    let server = Server::run();
    let app = TestApp::open(&server).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let (mut client, _) = connect_async(format!("ws://{addr}/api/v1/events"))
        .await
        .unwrap();
    let first = next_json(&mut client).await;
    assert_eq!(first["channel"], "connection");

    // no await in between, so the relay cannot drain the channel
    let burst = EVENT_CHANNEL_CAPACITY + 44;
    for n in 0..burst {
        let event =
            PhoenixdEvent::from_json(&format!(r#"{{"type":"payment_received","amountSat":{n}}}"#))
                .unwrap();
        app.ctx.phoenixd.publish(event);
    }

    let lagged = next_json(&mut client).await;
    assert_eq!(lagged["channel"], "lagged");
    assert_eq!(lagged["data"]["skipped"], 44);

    let marker = PhoenixdEvent::from_json(r#"{"type":"payment_received","amountSat":-1}"#).unwrap();
    app.ctx.phoenixd.publish(marker);

    let mut relayed = 0;
    loop {
        let message = next_json(&mut client).await;
        assert_eq!(message["channel"], "phoenixd");
        if message["data"]["amountSat"] == -1 {
            break;
        }
        relayed += 1;
    }
    assert_eq!(relayed, EVENT_CHANNEL_CAPACITY);
}

#[tokio::test]
async fn events_socket_requires_session_when_locked() {
    let server = Server::run();
    let app = TestApp::locked(&server).await;

    let (status, _) = app.get("/api/v1/events").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
