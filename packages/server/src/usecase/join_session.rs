//! UseCase: セッション参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinSessionUseCase::execute() メソッド
//! - JoinSessionUseCase::notify_sender() メソッド
//!
//! ### なぜこのテストが必要か
//! - 受信者がコードでセッションに参加し、ファイル記述子を受け取れることを保証
//! - 送信者への参加通知が新規参加時のみ行われることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：受信者の参加
//! - 異常系：存在しないコード、送信者自身の参加、受信者数の上限超過
//! - エッジケース：同じ受信者の重複参加

use std::sync::Arc;

use crate::domain::{
    ConnectionId, FileDescriptor, JoinOutcome, MessagePushError, MessagePusher, RepositoryError,
    SessionCode, SessionError, SessionRepository,
};

use super::error::JoinSessionError;

/// 参加に成功したセッションの情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedSession {
    pub code: SessionCode,
    pub sender: ConnectionId,
    pub file_descriptor: FileDescriptor,
    /// 今回の操作で新しく参加したか（重複参加では false）
    pub newly_joined: bool,
}

/// セッション参加のユースケース
pub struct JoinSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinSessionUseCase {
    /// 新しい JoinSessionUseCase を作成
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// セッション参加を実行
    ///
    /// # Arguments
    ///
    /// * `code` - 参加するセッションのコード
    /// * `receiver` - 参加する受信者の接続 ID
    ///
    /// # Returns
    ///
    /// * `Ok(JoinedSession)` - 参加成功
    /// * `Err(JoinSessionError)` - 参加失敗
    pub async fn execute(
        &self,
        code: SessionCode,
        receiver: ConnectionId,
    ) -> Result<JoinedSession, JoinSessionError> {
        let (session, outcome) = self
            .repository
            .add_receiver(&code, receiver)
            .await
            .map_err(|e| match e {
                RepositoryError::Session(SessionError::SenderCannotJoin) => {
                    JoinSessionError::SenderCannotJoin
                }
                RepositoryError::Session(SessionError::CapacityExceeded(limit)) => {
                    JoinSessionError::CapacityExceeded(limit)
                }
                _ => JoinSessionError::SessionNotFound(code.as_str().to_string()),
            })?;

        let newly_joined = outcome == JoinOutcome::Joined;
        if newly_joined {
            tracing::info!(
                "Connection '{}' joined session {} ({} receiver(s))",
                receiver,
                session.code,
                session.receivers.len()
            );
        } else {
            tracing::debug!(
                "Connection '{}' is already a receiver of session {}",
                receiver,
                session.code
            );
        }

        Ok(JoinedSession {
            code: session.code,
            sender: session.sender,
            file_descriptor: session.file_descriptor,
            newly_joined,
        })
    }

    /// 受信者が参加したことを送信者に通知
    ///
    /// # Arguments
    ///
    /// * `joined` - 参加したセッションの情報
    /// * `message` - 送信者に送るメッセージ（JSON）
    pub async fn notify_sender(
        &self,
        joined: &JoinedSession,
        message: &str,
    ) -> Result<(), MessagePushError> {
        self.message_pusher.push_to(&joined.sender, message).await
    }
}
