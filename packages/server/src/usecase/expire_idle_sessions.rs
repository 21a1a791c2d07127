//! UseCase: アイドルセッションの期限切れ処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ExpireIdleSessionsUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 誰も参加しないまま放置されたセッションのコードが解放されることを保証
//! - 受信者のいるセッションや新しいセッションが削除されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：期限を過ぎたアイドルセッションの削除
//! - エッジケース：期限内のセッション、受信者が参加済みのセッション

use std::{sync::Arc, time::Duration};

use peersend_shared::time::Clock;

use crate::domain::{MessagePushError, MessagePusher, Session, SessionRepository, Timestamp};

/// アイドルセッション期限切れのユースケース
pub struct ExpireIdleSessionsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    /// 受信者のいないセッションを保持する時間
    ttl: Duration,
}

impl ExpireIdleSessionsUseCase {
    /// 新しい ExpireIdleSessionsUseCase を作成
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 期限切れのアイドルセッションを削除
    ///
    /// # Returns
    ///
    /// 削除したセッション
    pub async fn execute(&self) -> Vec<Session> {
        let ttl_millis = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let cutoff = Timestamp::new(self.clock.now_millis().saturating_sub(ttl_millis));

        let expired = self.repository.remove_idle_sessions(cutoff).await;
        for session in &expired {
            tracing::info!(
                "Session {} expired: no receiver joined within {}s",
                session.code,
                self.ttl.as_secs()
            );
        }
        expired
    }

    /// セッションが期限切れになったことを送信者に通知
    ///
    /// # Arguments
    ///
    /// * `session` - 期限切れになったセッション
    /// * `message` - 送信者に送るメッセージ（JSON）
    pub async fn notify_sender(
        &self,
        session: &Session,
        message: &str,
    ) -> Result<(), MessagePushError> {
        self.message_pusher.push_to(&session.sender, message).await
    }
}
