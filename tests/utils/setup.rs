#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

use wsrs::{
    build_router, AppState, EventDispatcher, InMemoryMessageRepository, InMemoryRoomRepository,
    RoomHub,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// Wait until the hub reports `expected` listeners for a room
pub async fn wait_for_listeners(hub: &RoomHub, room_id: Uuid, expected: usize) {
    for _ in 0..400 {
        if hub.listener_count(room_id).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "room {} has {} listeners, expected {}",
        room_id,
        hub.listener_count(room_id).await,
        expected
    );
}

/// A real server on an ephemeral port, backed by in-memory storage
///
/// HTTP calls go through the router directly; websocket clients connect
/// over TCP. Both share the same state.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    app: Router,
    _server: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let hub = RoomHub::new(Duration::from_millis(500));
        let (publisher, _dispatcher) = EventDispatcher::spawn(hub.clone());
        let state = AppState::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
            hub,
            publisher,
            CancellationToken::new(),
        );
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_app = app.clone();
        let server = tokio::spawn(async move {
            axum::serve(listener, server_app).await.unwrap();
        });

        Self {
            addr,
            state,
            app,
            _server: server,
        }
    }

    pub fn hub(&self) -> &RoomHub {
        &self.state.hub
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn create_room(&self, theme: &str) -> Uuid {
        let (status, body) = self
            .request("POST", "/api/rooms", Some(serde_json::json!({ "theme": theme })))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn post_message(&self, room_id: Uuid, message: &str) -> Uuid {
        let (status, body) = self
            .request(
                "POST",
                &format!("/api/rooms/{}/messages", room_id),
                Some(serde_json::json!({ "message": message })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn react(&self, room_id: Uuid, message_id: Uuid) -> i64 {
        let (status, body) = self
            .request(
                "PATCH",
                &format!("/api/rooms/{}/messages/{}/react", room_id, message_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["count"].as_i64().unwrap()
    }

    pub async fn unreact(&self, room_id: Uuid, message_id: Uuid) -> i64 {
        let (status, body) = self
            .request(
                "DELETE",
                &format!("/api/rooms/{}/messages/{}/react", room_id, message_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["count"].as_i64().unwrap()
    }

    pub async fn mark_answered(&self, room_id: Uuid, message_id: Uuid) {
        let (status, _) = self
            .request(
                "PATCH",
                &format!("/api/rooms/{}/messages/{}/answer", room_id, message_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    pub fn subscribe_url(&self, room_id: impl std::fmt::Display) -> String {
        format!("ws://{}/subscribe/{}", self.addr, room_id)
    }

    /// Open a listening connection and wait until the hub has registered it
    pub async fn connect(&self, room_id: Uuid) -> WsClient {
        let before = self.hub().listener_count(room_id).await;
        let (stream, _) = connect_async(self.subscribe_url(room_id)).await.unwrap();
        wait_for_listeners(self.hub(), room_id, before + 1).await;
        WsClient { stream }
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Next event from the server as JSON, panicking after two seconds
    pub async fn next_event(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(2), self.stream.next())
                .await
                .expect("timed out waiting for event")
                .expect("connection closed")
                .expect("websocket error");

            if let Message::Text(_) = frame {
                return serde_json::from_str(frame.to_text().unwrap()).unwrap();
            }
        }
    }

    /// Assert nothing arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(Ok(Message::Text(text)))) =
            tokio::time::timeout(window, self.stream.next()).await
        {
            panic!("unexpected event: {:?}", text);
        }
    }

    /// Close handshake initiated by the client; the stream stays readable
    pub async fn close(&mut self) {
        self.stream.close(None).await.unwrap();
        // Drain until the server acknowledges the close
        while let Ok(Some(Ok(_))) =
            tokio::time::timeout(Duration::from_secs(1), self.stream.next()).await
        {}
    }

    /// Drop the TCP connection without a close handshake
    pub fn abort(self) {
        drop(self.stream);
    }

    pub async fn send_text(&mut self, text: &str) {
        self.stream.send(Message::text(text)).await.unwrap();
    }
}
