mod common;

use common::{open_db, ALICE, BOB, CAROL};
use linkline_server::error::Error;
use linkline_server::presence::{PresenceRegistry, SessionHandle};
use linkline_server::relay::{OutgoingMessage, Relay, ServerEvent, SessionEvent};
use linkline_server::store::Database;
use std::sync::Arc;

fn relay(db: &Database) -> Relay {
    Relay::new(db.messages(), Arc::new(PresenceRegistry::new()))
}

fn join(email: &str) -> SessionEvent {
    SessionEvent::Join {
        email: email.to_string(),
    }
}

fn send(from: Option<&str>, to: Option<&str>, text: Option<&str>) -> SessionEvent {
    SessionEvent::SendMessage(OutgoingMessage {
        from_email: from.map(str::to_string),
        to_email: to.map(str::to_string),
        message: text.map(str::to_string),
    })
}

#[tokio::test]
async fn test_online_recipient_receives_what_was_persisted() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let (alice, mut alice_rx) = SessionHandle::channel();
    let (bob, mut bob_rx) = SessionHandle::channel();
    relay.handle(&alice, join(ALICE)).await;
    relay.handle(&bob, join(BOB)).await;

    relay
        .handle(&alice, send(Some(ALICE), Some(BOB), Some("hi")))
        .await;

    let ServerEvent::ReceiveMessage(pushed) = bob_rx.try_recv().unwrap() else {
        panic!("expected receive-message");
    };
    assert_eq!(pushed.from_email, ALICE);
    assert_eq!(pushed.to_email, BOB);
    assert_eq!(pushed.message, "hi");

    let history = relay.history(ALICE, BOB).await.unwrap();
    assert_eq!(history, vec![pushed]);

    // The sender gets neither an echo nor an error.
    assert!(alice_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_offline_recipient_only_sees_history() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let sent = relay.send(ALICE, BOB, "are you there?").await.unwrap();

    // Bob joins afterwards: nothing is replayed live.
    let (bob, mut bob_rx) = SessionHandle::channel();
    relay.handle(&bob, join(BOB)).await;
    assert!(bob_rx.try_recv().is_err());

    let history = relay.history(BOB, ALICE).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], sent);
}

#[tokio::test]
async fn test_history_is_ordered_and_complete() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let mut sent = Vec::new();
    for i in 0..6 {
        let (from, to) = if i % 2 == 0 { (ALICE, BOB) } else { (BOB, ALICE) };
        sent.push(relay.send(from, to, &format!("message {}", i)).await.unwrap());
    }
    // Unrelated conversation stays out.
    relay.send(ALICE, CAROL, "psst").await.unwrap();

    let history = relay.history(ALICE, BOB).await.unwrap();
    assert_eq!(history.len(), 6);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));

    let ids: Vec<&str> = history.iter().map(|m| m.id.as_str()).collect();
    let expected: Vec<&str> = sent.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, expected);

    assert_eq!(relay.history(BOB, ALICE).await.unwrap(), history);
}

#[tokio::test]
async fn test_stale_disconnect_keeps_rejoined_session() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let (old_bob, mut old_rx) = SessionHandle::channel();
    let (new_bob, mut new_rx) = SessionHandle::channel();
    relay.handle(&old_bob, join(BOB)).await;
    relay.handle(&new_bob, join(BOB)).await;

    relay.handle(&old_bob, SessionEvent::Disconnect).await;
    assert!(relay.presence().is_online(BOB));

    relay.send(ALICE, BOB, "still there").await.unwrap();

    assert!(old_rx.try_recv().is_err());
    assert!(matches!(
        new_rx.try_recv().unwrap(),
        ServerEvent::ReceiveMessage(ref m) if m.message == "still there"
    ));

    relay.handle(&new_bob, SessionEvent::Disconnect).await;
    assert!(!relay.presence().is_online(BOB));
}

#[tokio::test]
async fn test_vanished_session_downgrades_to_offline() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let (bob, bob_rx) = SessionHandle::channel();
    relay.handle(&bob, join(BOB)).await;
    drop(bob_rx);

    let sent = relay.send(ALICE, BOB, "into the void").await.unwrap();
    assert_eq!(relay.history(ALICE, BOB).await.unwrap(), vec![sent]);
}

#[tokio::test]
async fn test_invalid_send_is_reported_to_sender() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let (alice, mut alice_rx) = SessionHandle::channel();
    relay.handle(&alice, join(ALICE)).await;

    relay.handle(&alice, send(Some(ALICE), None, Some("hi"))).await;

    assert_eq!(
        alice_rx.try_recv().unwrap(),
        ServerEvent::SendFailed {
            error: "All fields are required".to_string()
        }
    );
    assert!(relay.history(ALICE, BOB).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sender_defaults_to_joined_email() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let (alice, _alice_rx) = SessionHandle::channel();
    let (bob, mut bob_rx) = SessionHandle::channel();
    relay.handle(&alice, join(ALICE)).await;
    relay.handle(&bob, join(BOB)).await;

    relay.handle(&alice, send(None, Some(BOB), Some("it's me"))).await;

    let ServerEvent::ReceiveMessage(pushed) = bob_rx.try_recv().unwrap() else {
        panic!("expected receive-message");
    };
    assert_eq!(pushed.from_email, ALICE);
}

#[tokio::test]
async fn test_storage_failure_fails_the_send() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let (alice, mut alice_rx) = SessionHandle::channel();
    let (bob, mut bob_rx) = SessionHandle::channel();
    relay.handle(&alice, join(ALICE)).await;
    relay.handle(&bob, join(BOB)).await;

    db.close().await;

    let err = relay.send(ALICE, BOB, "lost?").await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)), "got {:?}", err);

    relay
        .handle(&alice, send(Some(ALICE), Some(BOB), Some("lost?")))
        .await;
    assert_eq!(
        alice_rx.try_recv().unwrap(),
        ServerEvent::SendFailed {
            error: "Server error".to_string()
        }
    );

    // Nothing reaches Bob when the write did not happen.
    assert!(bob_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_sender_is_the_latest_joined_email() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let (shared, _shared_rx) = SessionHandle::channel();
    let (bob, mut bob_rx) = SessionHandle::channel();
    relay.handle(&shared, join(ALICE)).await;
    relay.handle(&shared, join(CAROL)).await;
    relay.handle(&bob, join(BOB)).await;

    for _ in 0..5 {
        relay.handle(&shared, send(None, Some(BOB), Some("who am i"))).await;
        let ServerEvent::ReceiveMessage(pushed) = bob_rx.try_recv().unwrap() else {
            panic!("expected receive-message");
        };
        assert_eq!(pushed.from_email, CAROL);
    }
}

#[tokio::test]
async fn test_whitespace_message_is_content() {
    let (_dir, db) = open_db().await;
    let relay = relay(&db);

    let sent = relay.send(ALICE, BOB, "   ").await.unwrap();
    assert_eq!(sent.message, "   ");
    assert_eq!(relay.history(BOB, ALICE).await.unwrap(), vec![sent]);

    let err = relay.send(ALICE, BOB, "").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(ref m) if m == "All fields are required"));
}
