//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::SignalKind;

/// セッション作成のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateSessionError {
    #[error("Failed to allocate a session code: {0}")]
    CodeAllocationFailed(String),
}

/// セッション参加のエラー
///
/// どのエラーもクライアントには `ok: false` として返される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinSessionError {
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Sender cannot join its own session")]
    SenderCannotJoin,

    #[error("Session is at receiver capacity ({0})")]
    CapacityExceeded(usize),
}

/// シグナリング中継のエラー
///
/// 中継はベストエフォートのため、これらは送信元には通知されず破棄される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Originator is not allowed to send {0} in this session")]
    NotPermitted(SignalKind),

    #[error("No recipient for {0}")]
    NoRecipients(SignalKind),

    #[error("Failed to push {0}")]
    PushFailed(String),
}
