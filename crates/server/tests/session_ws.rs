mod common;

use common::{database_url, ALICE, BOB};
use futures::{SinkExt, StreamExt};
use linkline_server::config::{AppState, ServerConfig};
use linkline_server::presence::PresenceRegistry;
use linkline_server::relay::ServerEvent;
use linkline_server::router;
use linkline_server::store::Database;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    _dir: TempDir,
    db: Database,
    addr: SocketAddr,
    presence: Arc<PresenceRegistry>,
}

/// Serve the full router on an ephemeral port.
async fn serve() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let url = database_url(&dir);
    let db = Database::open(&url, 5).await.unwrap();
    let state = AppState::new(ServerConfig::with_database_url(url), &db);
    let presence = state.presence.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestServer {
        _dir: dir,
        db,
        addr,
        presence,
    }
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/v1/ws", addr)).await.unwrap();
    ws
}

async fn send_frame(ws: &mut Client, frame: Value) {
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

async fn next_event(ws: &mut Client) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).unwrap();
                }
                Some(Ok(_)) => continue,
                other => panic!("session ended: {:?}", other),
            }
        }
    })
    .await
    .unwrap()
}

async fn wait_until(check: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_message_reaches_online_session() {
    let server = serve().await;
    let mut alice = connect(server.addr).await;
    let mut bob = connect(server.addr).await;

    send_frame(&mut alice, json!({ "event": "join", "data": ALICE })).await;
    send_frame(&mut bob, json!({ "event": "join", "data": BOB })).await;
    wait_until(|| server.presence.is_online(ALICE) && server.presence.is_online(BOB)).await;

    send_frame(
        &mut alice,
        json!({
            "event": "send-message",
            "data": { "fromEmail": ALICE, "toEmail": BOB, "message": "hi" }
        }),
    )
    .await;

    let ServerEvent::ReceiveMessage(pushed) = next_event(&mut bob).await else {
        panic!("expected receive-message");
    };
    assert_eq!(pushed.from_email, ALICE);
    assert_eq!(pushed.to_email, BOB);
    assert_eq!(pushed.message, "hi");

    let stored = server.db.messages().between(ALICE, BOB).await.unwrap();
    assert_eq!(stored, vec![pushed]);
}

#[tokio::test]
async fn test_session_survives_bad_frames_and_reports_failures() {
    let server = serve().await;
    let mut alice = connect(server.addr).await;

    send_frame(&mut alice, json!({ "event": "join", "data": ALICE })).await;
    alice.send(Message::text("not json")).await.unwrap();
    send_frame(&mut alice, json!({ "event": "no-such-event", "data": 1 })).await;

    // Sender comes from the join, but the recipient is missing.
    send_frame(
        &mut alice,
        json!({ "event": "send-message", "data": { "message": "hi" } }),
    )
    .await;

    assert_eq!(
        next_event(&mut alice).await,
        ServerEvent::SendFailed {
            error: "All fields are required".to_string()
        }
    );
    assert!(server.presence.is_online(ALICE));
    assert!(server.db.messages().between(ALICE, BOB).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_closing_the_socket_ends_presence() {
    let server = serve().await;
    let mut bob = connect(server.addr).await;

    send_frame(&mut bob, json!({ "event": "join", "data": BOB })).await;
    wait_until(|| server.presence.is_online(BOB)).await;

    bob.close(None).await.unwrap();
    wait_until(|| !server.presence.is_online(BOB)).await;
    assert!(server.presence.is_empty());
}

#[tokio::test]
async fn test_dropped_connection_ends_presence() {
    let server = serve().await;
    let mut bob = connect(server.addr).await;

    send_frame(&mut bob, json!({ "event": "join", "data": BOB })).await;
    wait_until(|| server.presence.is_online(BOB)).await;

    drop(bob);
    wait_until(|| !server.presence.is_online(BOB)).await;
}
