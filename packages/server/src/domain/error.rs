//! ドメイン層のエラー型

use thiserror::Error;

use super::value_object::SignalKind;

/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// セッションコードが 6 桁の数字ではない
    #[error("Invalid session code: '{0}'")]
    InvalidSessionCode(String),

    /// 接続 ID が UUID として解釈できない
    #[error("Invalid connection id: '{0}'")]
    InvalidConnectionId(String),
}

/// セッション操作（参加・中継先の解決）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 送信者が自分のセッションに受信者として参加しようとした
    #[error("Sender cannot join its own session")]
    SenderCannotJoin,

    /// 受信者数が上限に達している
    #[error("Session is at receiver capacity ({0})")]
    CapacityExceeded(usize),

    /// 送信元がこの種類のメッセージを送る役割を持っていない
    #[error("Connection has no role allowed to send {0}")]
    NotPermitted(SignalKind),

    /// 中継先が存在しない
    #[error("No recipient for {0}")]
    NoRecipients(SignalKind),
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// 再生成の試行回数内に空きコードが見つからなかった
    #[error("No free session code after {0} attempts")]
    CodeSpaceExhausted(usize),

    #[error("Failed to generate session code: {0}")]
    CodeGeneration(#[from] ValueObjectError),
}

/// メッセージ送信（プッシュ）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}
