//! End-to-end run against a local fake gateway over plain `ws://`.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use spoticheck_core::protocol::{ClientProperties, Identify};
use spoticheck_core::{MemorySink, WatchedSet};
use spoticheck_gateway::{handshake, run_session, Connection, Dispatcher, SessionEnd, WsConnection};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

const TIMEOUT: Duration = Duration::from_secs(5);

type ServerStream = WebSocketStream<tokio::net::TcpStream>;

async fn read_json(ws: &mut ServerStream) -> Value {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for client frame")
            .expect("client hung up")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("client sent invalid json");
        }
    }
}

async fn send_json(ws: &mut ServerStream, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

fn presence(user_id: &str, song: &str) -> Value {
    json!({
        "op": 0,
        "t": "PRESENCE_UPDATE",
        "s": 3,
        "d": {
            "user": { "id": user_id, "username": format!("user-{user_id}") },
            "status": "online",
            "activities": [{
                "name": "Spotify",
                "type": 2,
                "details": song,
                "state": "Artist A",
                "assets": { "large_text": "Album A", "large_image": "spotify:track:abc" },
                "timestamps": { "start": 1000, "end": 5000 }
            }]
        }
    })
}

/// Accept one client, run a short scripted session, and return the identify
/// payload it sent.
async fn fake_gateway(listener: TcpListener) -> Value {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();

    send_json(&mut ws, json!({ "op": 10, "t": null, "s": null, "d": { "heartbeat_interval": 50 } })).await;
    let identify = read_json(&mut ws).await;

    send_json(&mut ws, json!({ "op": 0, "t": "READY", "s": 1, "d": { "user": { "username": "bot" } } })).await;
    ws.send(Message::text("{ this is not json")).await.unwrap();
    send_json(&mut ws, json!({ "op": 0, "t": "PRESENCE_UPDATE", "s": 2, "d": { "user": { "id": "42" } } })).await;
    send_json(&mut ws, presence("7", "Unwatched Song")).await;
    send_json(&mut ws, presence("42", "Song A")).await;

    // Wait for a keep-alive before hanging up.
    loop {
        let frame = read_json(&mut ws).await;
        if frame["op"] == json!(1) {
            assert_eq!(frame["d"], Value::Null);
            break;
        }
    }

    ws.close(None).await.unwrap();
    identify
}

#[tokio::test]
async fn full_session_against_fake_gateway() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(fake_gateway(listener));

    let conn = Arc::new(WsConnection::connect(&url).await.unwrap());
    let identify = Identify::new("test-token", ClientProperties::default());
    let interval = handshake(conn.as_ref(), &identify).await.unwrap();
    assert_eq!(interval, Duration::from_millis(50));

    let sink = Arc::new(MemorySink::new());
    let dispatcher = Dispatcher::new(sink.clone(), WatchedSet::parse("42"));
    let end = timeout(TIMEOUT, run_session(conn.clone(), interval, dispatcher))
        .await
        .expect("session did not end after server close");

    assert!(matches!(end, SessionEnd::Dispatcher(_)), "unexpected end: {end:?}");
    assert!(!conn.is_open());

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].song(), "Song A");
    assert_eq!(records[0].discord_id(), "42");
    assert_eq!(records[0].discord_name(), "user-42");

    let sent = server.await.unwrap();
    assert_eq!(sent["op"], json!(2));
    assert_eq!(sent["d"]["token"], json!("test-token"));
    assert_eq!(sent["d"]["intents"], json!(512));
    assert_eq!(sent["d"]["properties"]["device"], json!("pc"));
}

#[tokio::test]
async fn connect_to_nothing_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = WsConnection::connect(&url).await.err().unwrap();
    assert!(err.is_fatal());
}
