//! UseCase: クライアント切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//! - 切断した接続の役割に応じた後始末
//!
//! ### なぜこのテストが必要か
//! - 送信者の切断でセッションが閉じられ、受信者が強制切断されることを保証
//! - 受信者の切断ではセッションが残ることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者の切断、受信者の切断
//! - エッジケース：どのセッションにも属さない接続、二重の切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, Session, SessionCode, SessionRepository};

/// 切断処理の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// 送信者として所有していたために閉じられたセッション
    pub closed_session: Option<Session>,
    /// 強制切断した受信者
    pub disconnected_receivers: Vec<ConnectionId>,
    /// 受信者として離脱したセッション
    pub left_sessions: Vec<SessionCode>,
}

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// クライアント切断を実行
    ///
    /// 1. 全てのセッションから接続を取り除く
    /// 2. 送信者だった場合、閉じたセッションの受信者を強制切断する
    /// 3. MessagePusher から接続の登録を解除する
    ///
    /// 何度呼び出しても結果は同じ（2 回目以降は何もしない）。
    pub async fn execute(&self, connection_id: &ConnectionId) -> DisconnectOutcome {
        let removal = self.repository.remove_connection(connection_id).await;

        let mut disconnected_receivers = Vec::new();
        if let Some(session) = &removal.closed_session {
            tracing::info!(
                "Session {} closed: sender '{}' disconnected",
                session.code,
                connection_id
            );
            for receiver in &session.receivers {
                if self.message_pusher.disconnect(receiver).await {
                    disconnected_receivers.push(*receiver);
                }
            }
        }
        for code in &removal.left_sessions {
            tracing::info!("Connection '{}' left session {}", connection_id, code);
        }

        self.message_pusher.unregister_client(connection_id).await;

        DisconnectOutcome {
            closed_session: removal.closed_session,
            disconnected_receivers,
            left_sessions: removal.left_sessions,
        }
    }
}
