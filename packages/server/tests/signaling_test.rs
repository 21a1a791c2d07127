//! Integration tests for the signaling broker.
//!
//! Each test starts the broker in-process on an ephemeral port and talks to it
//! over real WebSocket / HTTP connections.

use std::{net::SocketAddr, num::NonZeroUsize, time::Duration};

use futures_util::{SinkExt, StreamExt};
use peersend_server::{app::build_server, config::BrokerConfig, domain::ReceiverCapacity};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(BrokerConfig::default()).await
    }

    async fn start_with(config: BrokerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = build_server(config);
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        TestServer { addr, handle }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Helper struct for a browser-like WebSocket client
struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    connection_id: String,
}

impl TestClient {
    /// Connect and consume the welcome frame
    async fn connect(server: &TestServer) -> Self {
        let (stream, _) = connect_async(server.ws_url()).await.unwrap();
        let mut client = TestClient {
            stream,
            connection_id: String::new(),
        };
        let welcome = client.recv().await;
        assert_eq!(welcome["type"], "welcome");
        client.connection_id = welcome["connectionId"].as_str().unwrap().to_string();
        client
    }

    async fn send(&mut self, value: Value) {
        self.stream
            .send(Message::Text(value.to_string().into()))
            .await
            .unwrap();
    }

    async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string().into()))
            .await
            .unwrap();
    }

    /// Receive the next JSON frame
    async fn recv(&mut self) -> Value {
        loop {
            let msg = timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for a message")
                .expect("connection closed")
                .unwrap();
            match msg {
                Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {:?}", other),
            }
        }
    }

    /// Assert that nothing arrives for a short while
    async fn expect_silence(&mut self) {
        if let Ok(Some(Ok(msg))) = timeout(SILENCE_WINDOW, self.stream.next()).await {
            panic!("expected no message, got {:?}", msg);
        }
    }

    /// Assert that the broker closes this connection
    async fn expect_closed(&mut self) {
        loop {
            let next = timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for close");
            match next {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(other)) => panic!("expected close, got {:?}", other),
            }
        }
    }

    async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }

    /// Create a session and return its code
    async fn create_code(&mut self, name: &str, size: u64) -> String {
        self.send(json!({"type": "create-code", "name": name, "size": size}))
            .await;
        let reply = self.recv().await;
        assert_eq!(reply["type"], "code-created");
        reply["code"].as_str().unwrap().to_string()
    }

    /// Present a code and return the join-result frame
    async fn join_code(&mut self, code: &str) -> Value {
        self.send(json!({"type": "join-code", "code": code})).await;
        let reply = self.recv().await;
        assert_eq!(reply["type"], "join-result");
        reply
    }
}

#[tokio::test]
async fn test_end_to_end_signaling() {
    // テスト項目: 作成・参加・offer / answer / ICE の中継・送信者切断までの一連の流れ
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;

    // when (操作): alice がコードを作成する
    alice
        .send(json!({"type": "create-code", "requestId": 1, "name": "f.txt", "size": 1024}))
        .await;
    let created = alice.recv().await;

    // then (期待する結果): 6 桁のコードが requestId 付きで返る
    assert_eq!(created["type"], "code-created");
    assert_eq!(created["requestId"], 1);
    let code = created["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    // when (操作): bob がコードで参加する
    bob.send(json!({"type": "join-code", "requestId": "j1", "code": code}))
        .await;
    let joined = bob.recv().await;

    // then (期待する結果): ファイル記述子が返り、alice に参加が通知される
    assert_eq!(
        joined,
        json!({
            "type": "join-result",
            "requestId": "j1",
            "ok": true,
            "fileDescriptor": {"name": "f.txt", "size": 1024}
        })
    );
    assert_eq!(
        alice.recv().await,
        json!({"type": "receiver-joined", "code": code})
    );

    // when (操作): offer / answer / ICE candidate を交換する
    let offer = json!({"type": "offer", "sdp": "v=0 offer"});
    alice
        .send(json!({"type": "webrtc-offer", "code": code, "desc": offer}))
        .await;
    let relayed_offer = bob.recv().await;

    let answer = json!({"type": "answer", "sdp": "v=0 answer"});
    bob.send(json!({"type": "webrtc-answer", "code": code, "desc": answer}))
        .await;
    let relayed_answer = alice.recv().await;

    let candidate = json!({"candidate": "candidate:1 1 udp 1 10.0.0.2 5000 typ host", "sdpMLineIndex": 0});
    bob.send(json!({"type": "webrtc-ice", "code": code, "candidate": candidate}))
        .await;
    let relayed_ice_to_sender = alice.recv().await;
    alice
        .send(json!({"type": "webrtc-ice", "code": code, "candidate": candidate}))
        .await;
    let relayed_ice_to_receiver = bob.recv().await;

    // then (期待する結果): ペイロードは変更されず、送信元の ID が付与される
    assert_eq!(
        relayed_offer,
        json!({"type": "webrtc-offer", "desc": offer, "from": alice.connection_id})
    );
    assert_eq!(
        relayed_answer,
        json!({"type": "webrtc-answer", "desc": answer, "from": bob.connection_id})
    );
    assert_eq!(
        relayed_ice_to_sender,
        json!({"type": "webrtc-ice", "candidate": candidate, "from": bob.connection_id})
    );
    assert_eq!(
        relayed_ice_to_receiver,
        json!({"type": "webrtc-ice", "candidate": candidate, "from": alice.connection_id})
    );

    // when (操作): alice が切断する
    alice.close().await;

    // then (期待する結果): bob も切断され、コードは使えなくなる
    bob.expect_closed().await;
    let mut carol = TestClient::connect(&server).await;
    assert_eq!(carol.join_code(&code).await["ok"], false);
}

#[tokio::test]
async fn test_join_unknown_code() {
    // テスト項目: 存在しないコード・不正な形式のコードへの参加は ok: false になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut bob = TestClient::connect(&server).await;

    // when (操作):
    let unknown = bob.join_code("000000").await;
    let malformed = bob.join_code("12ab").await;

    // then (期待する結果):
    assert_eq!(unknown, json!({"type": "join-result", "ok": false}));
    assert_eq!(malformed["ok"], false);
}

#[tokio::test]
async fn test_sender_cannot_join_own_session() {
    // テスト項目: 送信者が自分のコードで参加しようとすると ok: false になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1).await;

    // when (操作):
    let result = alice.join_code(&code).await;

    // then (期待する結果):
    assert_eq!(result["ok"], false);
    alice.expect_silence().await;
}

#[tokio::test]
async fn test_single_receiver_policy() {
    // テスト項目: 単一受信者ポリシーでは 2 人目の参加が拒否され、1 人目のセッションは影響を受けない
    // given (前提条件):
    let server = TestServer::start_with(BrokerConfig {
        receiver_capacity: ReceiverCapacity::single(),
        ..BrokerConfig::default()
    })
    .await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    let mut carol = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1024).await;

    // when (操作):
    let first = bob.join_code(&code).await;
    let second = carol.join_code(&code).await;

    // then (期待する結果):
    assert_eq!(first["ok"], true);
    assert_eq!(second, json!({"type": "join-result", "ok": false}));
    assert_eq!(alice.recv().await["type"], "receiver-joined");
    alice.expect_silence().await;

    alice
        .send(json!({"type": "webrtc-offer", "code": code, "desc": {"sdp": "x"}}))
        .await;
    assert_eq!(bob.recv().await["type"], "webrtc-offer");
    carol.expect_silence().await;
}

#[tokio::test]
async fn test_single_receiver_rejoin_is_rejected() {
    // テスト項目: 単一受信者ポリシーでは、参加済みの受信者が同じコードに再参加しても拒否される
    // given (前提条件):
    let server = TestServer::start_with(BrokerConfig {
        receiver_capacity: ReceiverCapacity::single(),
        ..BrokerConfig::default()
    })
    .await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1024).await;
    assert_eq!(bob.join_code(&code).await["ok"], true);
    assert_eq!(alice.recv().await["type"], "receiver-joined");

    // when (操作):
    let second = bob.join_code(&code).await;

    // then (期待する結果):
    assert_eq!(second, json!({"type": "join-result", "ok": false}));
    alice.expect_silence().await;
}

#[tokio::test]
async fn test_capacity_limit_of_two() {
    // テスト項目: 上限 2 のセッションには 3 人目が参加できない
    // given (前提条件):
    let server = TestServer::start_with(BrokerConfig {
        receiver_capacity: ReceiverCapacity::Limited(NonZeroUsize::new(2).unwrap()),
        ..BrokerConfig::default()
    })
    .await;
    let mut alice = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1024).await;
    let mut receivers = Vec::new();
    for _ in 0..3 {
        receivers.push(TestClient::connect(&server).await);
    }

    // when (操作):
    let mut results = Vec::new();
    for receiver in receivers.iter_mut() {
        results.push(receiver.join_code(&code).await["ok"].clone());
    }

    // then (期待する結果):
    assert_eq!(results, vec![json!(true), json!(true), json!(false)]);
}

#[tokio::test]
async fn test_multi_receiver_offer_fan_out() {
    // テスト項目: offer は受信者全員に届き、`to` 指定時はその受信者にのみ届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    let mut carol = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1024).await;
    bob.join_code(&code).await;
    carol.join_code(&code).await;
    alice.recv().await;
    alice.recv().await;

    // when (操作):
    alice
        .send(json!({"type": "webrtc-offer", "code": code, "desc": {"sdp": "all"}}))
        .await;

    // then (期待する結果):
    assert_eq!(bob.recv().await["desc"]["sdp"], "all");
    assert_eq!(carol.recv().await["desc"]["sdp"], "all");

    // when (操作):
    alice
        .send(json!({
            "type": "webrtc-offer",
            "code": code,
            "desc": {"sdp": "carol only"},
            "to": carol.connection_id
        }))
        .await;

    // then (期待する結果):
    assert_eq!(carol.recv().await["desc"]["sdp"], "carol only");
    bob.expect_silence().await;
}

#[tokio::test]
async fn test_receiver_disconnect_keeps_session_open() {
    // テスト項目: 受信者が切断してもセッションは残り、別の受信者が参加できる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1024).await;
    bob.join_code(&code).await;
    alice.recv().await;

    // when (操作):
    bob.close().await;
    let mut carol = TestClient::connect(&server).await;
    let result = carol.join_code(&code).await;

    // then (期待する結果):
    assert_eq!(result["ok"], true);
    assert_eq!(
        alice.recv().await,
        json!({"type": "receiver-joined", "code": code})
    );
}

#[tokio::test]
async fn test_recreate_releases_previous_code() {
    // テスト項目: 送信者が再度コードを作成すると、以前のコードは無効になり受信者は切断される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    let first = alice.create_code("a.txt", 1).await;
    bob.join_code(&first).await;
    alice.recv().await;

    // when (操作):
    let second = alice.create_code("b.txt", 2).await;

    // then (期待する結果):
    bob.expect_closed().await;
    let mut carol = TestClient::connect(&server).await;
    let joined = carol.join_code(&second).await;
    assert_eq!(joined["fileDescriptor"], json!({"name": "b.txt", "size": 2}));
    if first != second {
        let mut dave = TestClient::connect(&server).await;
        assert_eq!(dave.join_code(&first).await["ok"], false);
    }
}

#[tokio::test]
async fn test_orphan_and_malformed_messages_are_dropped() {
    // テスト項目: 存在しないセッションへの中継や不正なフレームは黙って破棄され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1024).await;

    // when (操作):
    alice
        .send(json!({"type": "webrtc-offer", "code": "000000", "desc": {}}))
        .await;
    alice
        .send(json!({"type": "webrtc-offer", "code": code, "desc": {}}))
        .await;
    bob.send(json!({"type": "webrtc-answer", "code": code, "desc": {}}))
        .await;
    bob.send_raw("not json").await;
    bob.send(json!({"type": "unknown-type"})).await;

    // then (期待する結果): 誰にも何も届かず、接続はそのまま使える
    alice.expect_silence().await;
    bob.expect_silence().await;
    assert_eq!(bob.join_code(&code).await["ok"], true);
}

#[tokio::test]
async fn test_health_and_stats_endpoints() {
    // テスト項目: ヘルスチェックと統計情報が取得でき、統計にコードが含まれない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1024).await;
    bob.join_code(&code).await;

    // when (操作):
    let health: Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let stats_body = reqwest::get(server.http_url("/api/stats"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health, json!({"status": "ok"}));
    let stats: Value = serde_json::from_str(&stats_body).unwrap();
    assert_eq!(stats["sessions"], 1);
    assert_eq!(stats["receivers"], 1);
    assert_eq!(stats["connections"], 2);
    assert!(stats["oldestSessionCreatedAt"].is_string());
    assert!(!stats_body.contains(&code));
}

#[tokio::test]
async fn test_idle_session_expires() {
    // テスト項目: 誰も参加しないセッションは期限切れで閉じられ、送信者に通知される
    // given (前提条件):
    let server = TestServer::start_with(BrokerConfig {
        idle_session_ttl: Some(Duration::from_secs(1)),
        ..BrokerConfig::default()
    })
    .await;
    let mut alice = TestClient::connect(&server).await;
    let code = alice.create_code("f.txt", 1024).await;

    // when (操作):
    let expired = alice.recv().await;

    // then (期待する結果):
    assert_eq!(expired, json!({"type": "session-expired", "code": code}));
    let mut bob = TestClient::connect(&server).await;
    assert_eq!(bob.join_code(&code).await["ok"], false);
}
