//! End-to-end realtime delivery tests.
//!
//! Runs the full server on an ephemeral port with a wiremock stand-in for
//! the authentication authority, drives member mutations over HTTP, and
//! asserts what connected WebSocket clients observe.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use carebridge_server::config::{AppConfig, SeedCaregiver};
use carebridge_server::{AppState, build_app};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const ALICE_TOKEN: &str = "token-alice";
const BOB_TOKEN: &str = "token-bob";

struct TestApp {
    addr: SocketAddr,
    client: reqwest::Client,
    // Held so the mock authority outlives the test
    _authority: MockServer,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/ws?token={token}", self.addr)
    }

    /// Open a realtime session and give the server a beat to register it.
    async fn connect_ws(&self, token: &str) -> WsClient {
        let (socket, _response) = connect_async(self.ws_url(token))
            .await
            .expect("websocket connect failed");
        sleep(Duration::from_millis(100)).await;
        socket
    }

    async fn create_member(&self, token: &str, first_name: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/protected-members"))
            .bearer_auth(token)
            .json(&json!({
                "firstName": first_name,
                "lastName": "Example",
                "relationship": "Parent",
                "birthYear": 1950,
            }))
            .send()
            .await
            .expect("create request failed");
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("create response body");
        body["data"].clone()
    }

    async fn update_member(&self, token: &str, id: &str, first_name: &str) {
        let response = self
            .client
            .patch(self.url(&format!("/api/protected-members/{id}")))
            .bearer_auth(token)
            .json(&json!({ "firstName": first_name }))
            .send()
            .await
            .expect("update request failed");
        assert_eq!(response.status(), 200);
    }

    async fn delete_member(&self, token: &str, id: &str) {
        let response = self
            .client
            .delete(self.url(&format!("/api/protected-members/{id}")))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        assert_eq!(response.status(), 200);
    }
}

/// Start the server on an ephemeral port with two seeded caregivers and a
/// mock authority that accepts one token per caregiver.
async fn spawn_app() -> TestApp {
    let authority = MockServer::start().await;

    for (token, subject) in [(ALICE_TOKEN, "sub-alice"), (BOB_TOKEN, "sub-bob")] {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("Authorization", format!("Bearer {token}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": subject,
                "email": format!("{subject}@example.com"),
            })))
            .with_priority(1)
            .mount(&authority)
            .await;
    }

    // Everything else is rejected
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "invalid JWT" })),
        )
        .mount(&authority)
        .await;

    let mut config = AppConfig::default();
    config.auth.provider_url = authority.uri();
    config.auth.api_key = "test-api-key".to_string();
    config.seed.caregivers = vec![
        SeedCaregiver {
            subject_id: "sub-alice".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        },
        SeedCaregiver {
            subject_id: "sub-bob".to_string(),
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
        },
    ];

    let state = AppState::from_config(config).await;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server task");
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
        _authority: authority,
    }
}

/// Wait for the next JSON notification, skipping transport frames.
async fn next_notification(socket: &mut WsClient) -> Value {
    timeout(Duration::from_secs(5), async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    break serde_json::from_str(&text).expect("notification is JSON");
                }
                // Control frames are answered by the library
                Some(Ok(_)) => continue,
                other => panic!("socket ended while waiting: {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for notification")
}

/// Assert no notification arrives within a short window.
async fn expect_silence(socket: &mut WsClient) {
    let outcome = timeout(Duration::from_millis(300), async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => break Some(text),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => break None,
            }
        }
    })
    .await;

    if let Ok(Some(text)) = outcome {
        panic!("expected no notification, got {text}");
    }
}

#[tokio::test]
async fn all_sessions_of_a_caregiver_receive_member_added() {
    let app = spawn_app().await;
    let mut first = app.connect_ws(ALICE_TOKEN).await;
    let mut second = app.connect_ws(ALICE_TOKEN).await;

    let member = app.create_member(ALICE_TOKEN, "June").await;
    let member_id = member["id"].as_str().expect("member id");

    for socket in [&mut first, &mut second] {
        let notification = next_notification(socket).await;
        assert_eq!(notification["type"], "member_added");
        assert_eq!(notification["data"]["memberId"], member_id);
        assert!(notification["data"]["timestamp"].is_string());
        // Routing information never leaks into the payload
        assert!(notification["data"].get("caregiverId").is_none());
        assert!(notification.get("caregiverId").is_none());
    }
}

#[tokio::test]
async fn other_caregivers_sessions_stay_silent() {
    let app = spawn_app().await;
    let mut alice = app.connect_ws(ALICE_TOKEN).await;
    let mut bob = app.connect_ws(BOB_TOKEN).await;

    app.create_member(ALICE_TOKEN, "June").await;

    let notification = next_notification(&mut alice).await;
    assert_eq!(notification["type"], "member_added");

    expect_silence(&mut bob).await;
}

#[tokio::test]
async fn lifecycle_events_arrive_in_order() {
    let app = spawn_app().await;
    let mut socket = app.connect_ws(ALICE_TOKEN).await;

    let member = app.create_member(ALICE_TOKEN, "June").await;
    let member_id = member["id"].as_str().expect("member id").to_string();
    app.update_member(ALICE_TOKEN, &member_id, "Offred").await;
    app.delete_member(ALICE_TOKEN, &member_id).await;

    let kinds: Vec<String> = [
        next_notification(&mut socket).await,
        next_notification(&mut socket).await,
        next_notification(&mut socket).await,
    ]
    .iter()
    .map(|n| {
        assert_eq!(n["data"]["memberId"], member_id.as_str());
        n["type"].as_str().expect("type").to_string()
    })
    .collect();

    assert_eq!(kinds, ["member_added", "member_updated", "member_deleted"]);
}

#[tokio::test]
async fn rejected_credential_cannot_connect() {
    let app = spawn_app().await;

    let err = connect_async(app.ws_url("bogus-token"))
        .await
        .expect_err("upgrade should be refused");
    match err {
        WsError::Http(response) => assert_eq!(response.status(), 401),
        other => panic!("expected HTTP rejection, got {other:?}"),
    }

    // The failed attempt leaves the system fully working
    let mut socket = app.connect_ws(ALICE_TOKEN).await;
    app.create_member(ALICE_TOKEN, "June").await;
    let notification = next_notification(&mut socket).await;
    assert_eq!(notification["type"], "member_added");
}

#[tokio::test]
async fn missing_credential_cannot_connect() {
    let app = spawn_app().await;

    let err = connect_async(format!("ws://{}/ws", app.addr))
        .await
        .expect_err("upgrade should be refused");
    match err {
        WsError::Http(response) => assert_eq!(response.status(), 401),
        other => panic!("expected HTTP rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn credential_in_authorization_header_is_accepted() {
    let app = spawn_app().await;

    let mut request = format!("ws://{}/ws", app.addr)
        .into_client_request()
        .expect("client request");
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {ALICE_TOKEN}").parse().expect("header value"),
    );

    let (mut socket, _response) = connect_async(request)
        .await
        .expect("header-authenticated connect failed");
    sleep(Duration::from_millis(100)).await;

    app.create_member(ALICE_TOKEN, "June").await;
    let notification = next_notification(&mut socket).await;
    assert_eq!(notification["type"], "member_added");
}

#[tokio::test]
async fn disconnected_session_receives_nothing_and_no_backlog_replays() {
    let app = spawn_app().await;

    let mut early = app.connect_ws(ALICE_TOKEN).await;
    early.close(None).await.expect("close");
    sleep(Duration::from_millis(150)).await;

    // Published with no live sessions: dropped, not queued
    app.create_member(ALICE_TOKEN, "First").await;

    let mut late = app.connect_ws(ALICE_TOKEN).await;
    let second = app.create_member(ALICE_TOKEN, "Second").await;

    // The late session sees only what was published after it joined
    let notification = next_notification(&mut late).await;
    assert_eq!(notification["data"]["memberId"], second["id"]);
    expect_silence(&mut late).await;
}

#[tokio::test]
async fn mutations_by_one_caregiver_never_cross_rooms() {
    let app = spawn_app().await;
    let mut alice = app.connect_ws(ALICE_TOKEN).await;
    let mut bob = app.connect_ws(BOB_TOKEN).await;

    let alice_member = app.create_member(ALICE_TOKEN, "June").await;
    let bob_member = app.create_member(BOB_TOKEN, "Luke").await;

    let to_alice = next_notification(&mut alice).await;
    assert_eq!(to_alice["data"]["memberId"], alice_member["id"]);

    let to_bob = next_notification(&mut bob).await;
    assert_eq!(to_bob["data"]["memberId"], bob_member["id"]);

    expect_silence(&mut alice).await;
    expect_silence(&mut bob).await;
}
