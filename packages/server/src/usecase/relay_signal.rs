//! UseCase: シグナリングメッセージ中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelaySignalUseCase::execute() メソッド
//! - 役割に応じた中継先の選択
//!
//! ### なぜこのテストが必要か
//! - offer / answer / ICE candidate が正しい相手にだけ届くことを保証
//! - 閉じたセッションや無関係な接続からのメッセージが破棄されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者から受信者全員へ、受信者から送信者へ
//! - エッジケース：`to` による宛先指定、受信者がいない状態での offer
//! - 異常系：存在しないコード、役割を持たない接続

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, SessionCode, SessionError, SessionRepository, SignalKind,
};

use super::error::RelayError;

/// シグナリングメッセージ中継のユースケース
pub struct RelaySignalUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelaySignalUseCase {
    /// 新しい RelaySignalUseCase を作成
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// シグナリングメッセージの中継を実行
    ///
    /// # Arguments
    ///
    /// * `from` - 送信元の接続 ID
    /// * `code` - 対象セッションのコード
    /// * `kind` - メッセージの種類
    /// * `to` - 宛先の受信者（送信者からの offer / ICE candidate のみ有効）
    /// * `message` - 中継するメッセージ（JSON、`from` 付与済み）
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ConnectionId>)` - 中継先
    /// * `Err(RelayError)` - 中継されなかった
    pub async fn execute(
        &self,
        from: ConnectionId,
        code: &SessionCode,
        kind: SignalKind,
        to: Option<ConnectionId>,
        message: &str,
    ) -> Result<Vec<ConnectionId>, RelayError> {
        let session = self
            .repository
            .find_session(code)
            .await
            .ok_or_else(|| RelayError::SessionNotFound(code.as_str().to_string()))?;

        let targets = session
            .relay_targets(&from, kind, to.as_ref())
            .map_err(|e| match e {
                SessionError::NoRecipients(kind) => RelayError::NoRecipients(kind),
                _ => RelayError::NotPermitted(kind),
            })?;

        self.message_pusher
            .broadcast(targets.clone(), message)
            .await
            .map_err(|e| RelayError::PushFailed(e.to_string()))?;

        tracing::debug!(
            "Relayed {} in session {} from '{}' to {} connection(s)",
            kind,
            code,
            from,
            targets.len()
        );
        Ok(targets)
    }
}
