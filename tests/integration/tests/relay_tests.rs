//! End-to-end tests for the session endpoint and group messaging

use std::time::Duration;

use integration_tests::{RelayClient, TestServer};
use relay_gateway::peer::PeerState;
use relay_gateway::protocol::{
    AckMessage, DownstreamMessage, MessageData, SendToGroupMessage, UpstreamMessage,
};
use tokio_tungstenite::tungstenite;

const QUIET: Duration = Duration::from_millis(300);

fn http_status(result: Result<RelayClient, tungstenite::Error>) -> Option<u16> {
    match result {
        Err(tungstenite::Error::Http(response)) => Some(response.status().as_u16()),
        _ => None,
    }
}

async fn join(client: &mut RelayClient, group: &str, ack_id: u64) {
    client
        .send(&UpstreamMessage::join_group(group, Some(ack_id)))
        .await
        .unwrap();
    assert_eq!(
        client.recv().await.unwrap(),
        DownstreamMessage::Ack(AckMessage::success(ack_id))
    );
}

fn payload(message: DownstreamMessage) -> (Option<String>, Option<String>, MessageData) {
    match message {
        DownstreamMessage::Message(data) => (data.from, data.group, data.data),
        other => panic!("Expected a data message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_missing_credentials_rejected_before_upgrade() {
    let server = TestServer::start().await.unwrap();

    let status = http_status(RelayClient::try_connect(&server.ws_url("/client")).await);
    assert_eq!(status, Some(401));
}

#[tokio::test]
async fn test_invalid_access_token_rejected() {
    let server = TestServer::start().await.unwrap();

    let url = server.ws_url("/client?access_token=not-a-jwt");
    assert_eq!(http_status(RelayClient::try_connect(&url).await), Some(401));
}

#[tokio::test]
async fn test_partial_reconnect_credentials_rejected() {
    let server = TestServer::start().await.unwrap();

    let url = server.ws_url("/client?connection_id=abc");
    assert_eq!(http_status(RelayClient::try_connect(&url).await), Some(401));
}

#[tokio::test]
async fn test_connected_handshake() {
    let server = TestServer::start().await.unwrap();

    let client = server.connect("alice").await.unwrap();
    let connected = client.connected.clone().unwrap();

    assert_eq!(connected.user_id, "alice");
    assert!(!connected.connection_id.is_empty());
    assert!(!connected.reconnection_token.is_empty());

    let peer = server.peer(&connected.connection_id).unwrap();
    assert_eq!(peer.user_id(), "alice");
    assert_eq!(peer.state(), PeerState::Alive);
}

#[tokio::test]
async fn test_group_broadcast() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();

    join(&mut alice, "room", 1).await;
    join(&mut bob, "room", 1).await;

    alice
        .send(&SendToGroupMessage::new("room", MessageData::text("hello")).with_ack_id(2).into())
        .await
        .unwrap();

    // The sender receives its own broadcast unless it opts out
    let mut alice_seen = Vec::new();
    for _ in 0..2 {
        alice_seen.push(alice.recv().await.unwrap());
    }
    assert!(alice_seen.contains(&DownstreamMessage::Ack(AckMessage::success(2))));

    let (from, group, data) = payload(bob.recv().await.unwrap());
    assert_eq!(from.as_deref(), Some(alice.connection_id()));
    assert_eq!(group.as_deref(), Some("room"));
    assert_eq!(data, MessageData::text("hello"));
}

#[tokio::test]
async fn test_no_echo_skips_sender() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();

    join(&mut alice, "room", 1).await;
    join(&mut bob, "room", 1).await;

    let message = SendToGroupMessage::new("room", MessageData::Json(serde_json::json!({"n": 1})))
        .with_no_echo(true);
    alice.send(&message.into()).await.unwrap();

    let (_, _, data) = payload(bob.recv().await.unwrap());
    assert_eq!(data, MessageData::Json(serde_json::json!({"n": 1})));
    assert!(alice.recv_timeout(QUIET).await.unwrap().is_none());
}

#[tokio::test]
async fn test_send_outside_group_refused() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();
    join(&mut bob, "room", 1).await;

    alice
        .send(&SendToGroupMessage::new("room", MessageData::text("hi")).with_ack_id(7).into())
        .await
        .unwrap();

    match alice.recv().await.unwrap() {
        DownstreamMessage::Ack(ack) => {
            assert_eq!(ack.ack_id, 7);
            assert!(!ack.success);
            assert_eq!(ack.error.unwrap().name, "NotInGroup");
        }
        other => panic!("Expected an ack, got {other:?}"),
    }
    assert!(bob.recv_timeout(QUIET).await.unwrap().is_none());
}

#[tokio::test]
async fn test_hubs_are_isolated() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect_to_hub("north", "alice").await.unwrap();
    let mut bob = server.connect_to_hub("north", "bob").await.unwrap();

    let url = server.ws_url(&format!(
        "/client?hubId=south&access_token={}",
        server.access_token("carol")
    ));
    let mut carol = RelayClient::connect(&url).await.unwrap();

    join(&mut alice, "room", 1).await;
    join(&mut bob, "room", 1).await;
    join(&mut carol, "room", 1).await;

    let message = SendToGroupMessage::new("room", MessageData::text("north only")).with_no_echo(true);
    alice.send(&message.into()).await.unwrap();

    let (_, _, data) = payload(bob.recv().await.unwrap());
    assert_eq!(data, MessageData::text("north only"));
    assert!(carol.recv_timeout(QUIET).await.unwrap().is_none());

    assert_eq!(server.hub("north").unwrap().peer_count(), 2);
    assert_eq!(server.hub("south").unwrap().peer_count(), 1);
}

#[tokio::test]
async fn test_leave_group_stops_delivery() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();

    join(&mut alice, "room", 1).await;
    join(&mut bob, "room", 1).await;

    bob.send(&UpstreamMessage::leave_group("room", Some(2)))
        .await
        .unwrap();
    assert_eq!(
        bob.recv().await.unwrap(),
        DownstreamMessage::Ack(AckMessage::success(2))
    );

    let message = SendToGroupMessage::new("room", MessageData::text("anyone?")).with_no_echo(true);
    alice.send(&message.into()).await.unwrap();

    assert!(bob.recv_timeout(QUIET).await.unwrap().is_none());
}

#[tokio::test]
async fn test_binary_frame_envelope() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();
    join(&mut bob, "room", 1).await;

    let join_bytes = serde_json::to_vec(&UpstreamMessage::join_group("room", Some(5))).unwrap();
    alice.send_binary(join_bytes).await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        DownstreamMessage::Ack(AckMessage::success(5))
    );

    let message: UpstreamMessage =
        SendToGroupMessage::new("room", MessageData::Binary(vec![0, 1, 2, 255]))
            .with_no_echo(true)
            .into();
    alice
        .send_binary(serde_json::to_vec(&message).unwrap())
        .await
        .unwrap();

    let (_, _, data) = payload(bob.recv().await.unwrap());
    assert_eq!(data, MessageData::Binary(vec![0, 1, 2, 255]));
}

#[tokio::test]
async fn test_malformed_frame_closes_with_decode_error() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let connection_id = alice.connection_id().to_string();

    alice.send_text("{not json").await.unwrap();

    let (code, _) = alice.recv_close().await.unwrap();
    assert_eq!(code, Some(4002));
    assert!(
        server
            .wait_for_peer_state(&connection_id, PeerState::AwaitingReconnect)
            .await
    );
}

#[tokio::test]
async fn test_groups_in_one_hub_are_isolated() {
    let server = TestServer::start().await.unwrap();
    let mut x = server.connect("x").await.unwrap();
    let mut y = server.connect("y").await.unwrap();

    join(&mut x, "g1", 1).await;
    join(&mut y, "g1", 1).await;
    join(&mut y, "g2", 2).await;

    let message = SendToGroupMessage::new("g1", MessageData::text("g1 only")).with_no_echo(true);
    x.send(&message.into()).await.unwrap();

    assert!(y.recv_timeout(QUIET).await.unwrap().is_none());
    let hub = server.default_hub();
    assert!(!hub.group("g1").unwrap().contains(y.connection_id()));
    assert!(hub.group("g2").unwrap().contains(y.connection_id()));
}

#[tokio::test]
async fn test_repeated_join_delivers_once() {
    let server = TestServer::start().await.unwrap();
    let mut x = server.connect("x").await.unwrap();
    let mut y = server.connect("y").await.unwrap();

    join(&mut y, "room", 1).await;
    join(&mut y, "room", 2).await;
    join(&mut x, "room", 1).await;

    let message = SendToGroupMessage::new("room", MessageData::text("once")).with_no_echo(true);
    x.send(&message.into()).await.unwrap();

    let (_, _, data) = payload(y.recv().await.unwrap());
    assert_eq!(data, MessageData::text("once"));
    assert!(y.recv_timeout(QUIET).await.unwrap().is_none());
}
