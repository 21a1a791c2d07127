//! UseCase: セッション作成処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CreateSessionUseCase::execute() メソッド
//! - コードの払い出しとセッションの登録
//!
//! ### なぜこのテストが必要か
//! - 作成したセッションが送信者・ファイル記述子とともに登録されることを保証
//! - 置き換えられたセッションの受信者が取り残されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規セッションの作成
//! - エッジケース：同じ送信者による再作成、コード衝突による置き換え
//! - 異常系：空きコードが見つからない（Reroll ポリシー）

use std::sync::Arc;

use peersend_shared::time::Clock;

use crate::domain::{
    ConnectionId, FileDescriptor, MessagePusher, ReceiverCapacity, Session, SessionCode,
    SessionRepository, Timestamp,
};

use super::error::CreateSessionError;

/// セッション作成のユースケース
pub struct CreateSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    /// 新しいセッションに適用する受信者の上限
    receiver_capacity: ReceiverCapacity,
}

impl CreateSessionUseCase {
    /// 新しい CreateSessionUseCase を作成
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        receiver_capacity: ReceiverCapacity,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            receiver_capacity,
        }
    }

    /// セッション作成を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信者の接続 ID
    /// * `file_descriptor` - 送信するファイルの記述子
    ///
    /// # Returns
    ///
    /// * `Ok(SessionCode)` - 払い出したコード
    /// * `Err(CreateSessionError)` - コードを払い出せなかった
    pub async fn execute(
        &self,
        sender: ConnectionId,
        file_descriptor: FileDescriptor,
    ) -> Result<SessionCode, CreateSessionError> {
        let created_at = Timestamp::new(self.clock.now_millis());

        let created = self
            .repository
            .create_session(sender, file_descriptor, self.receiver_capacity, created_at)
            .await
            .map_err(|e| CreateSessionError::CodeAllocationFailed(e.to_string()))?;

        for session in &created.displaced {
            tracing::info!(
                "Session {} closed: replaced by session {}",
                session.code,
                created.code
            );
            self.disconnect_receivers(session).await;
        }

        tracing::info!("Session {} created by '{}'", created.code, sender);
        Ok(created.code)
    }

    /// 閉じられたセッションの受信者を強制切断する
    async fn disconnect_receivers(&self, session: &Session) {
        for receiver in &session.receivers {
            self.message_pusher.disconnect(receiver).await;
        }
    }
}
