//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ConnectionId, FileDescriptor, JoinOutcome, ReceiverCapacity, RepositoryError, Session,
    SessionCode, Timestamp,
};

/// セッション作成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    /// 払い出されたコード
    pub code: SessionCode,
    /// 新しいセッションによって閉じられたセッション
    ///
    /// 送信者が以前に作成していたセッションと、コード衝突で置き換えられたセッション。
    pub displaced: Vec<Session>,
}

/// 接続削除の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionRemoval {
    /// 送信者として所有していたために閉じられたセッション
    pub closed_session: Option<Session>,
    /// 受信者として離脱したセッションのコード
    pub left_sessions: Vec<SessionCode>,
}

impl ConnectionRemoval {
    /// どのセッションにも属していなかったか
    pub fn is_noop(&self) -> bool {
        self.closed_session.is_none() && self.left_sessions.is_empty()
    }
}

/// Session Repository trait（コードレジストリ）
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
/// 全ての操作はセッション表に対してアトミックに行われる。
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// コードを払い出してセッションを作成
    async fn create_session(
        &self,
        sender: ConnectionId,
        file_descriptor: FileDescriptor,
        receiver_capacity: ReceiverCapacity,
        created_at: Timestamp,
    ) -> Result<CreatedSession, RepositoryError>;

    /// コードに対応するセッションを取得
    async fn find_session(&self, code: &SessionCode) -> Option<Session>;

    /// セッションに受信者を追加
    ///
    /// 成功時は追加後のセッションを返す。
    async fn add_receiver(
        &self,
        code: &SessionCode,
        receiver: ConnectionId,
    ) -> Result<(Session, JoinOutcome), RepositoryError>;

    /// 接続を全てのセッションから取り除く（冪等）
    async fn remove_connection(&self, connection_id: &ConnectionId) -> ConnectionRemoval;

    /// 受信者がおらず `created_before` より前に作成されたセッションを削除
    async fn remove_idle_sessions(&self, created_before: Timestamp) -> Vec<Session>;

    /// 稼働中の全セッションを作成順で取得
    async fn get_sessions(&self) -> Vec<Session>;
}
