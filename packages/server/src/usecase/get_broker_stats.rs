//! UseCase: ブローカー統計情報取得処理

use std::sync::Arc;

use crate::domain::{BrokerStats, MessagePusher, SessionRepository};

/// ブローカー統計情報取得のユースケース
///
/// セッションコードは含めない。
pub struct GetBrokerStatsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// MessagePusher（接続数の取得に使用）
    message_pusher: Arc<dyn MessagePusher>,
}

impl GetBrokerStatsUseCase {
    /// 新しい GetBrokerStatsUseCase を作成
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 統計情報取得を実行
    pub async fn execute(&self) -> BrokerStats {
        let sessions = self.repository.get_sessions().await;

        BrokerStats {
            sessions: sessions.len(),
            receivers: sessions.iter().map(|s| s.receivers.len()).sum(),
            connections: self.message_pusher.count_clients().await,
            oldest_session_created_at: sessions.iter().map(|s| s.created_at).min(),
        }
    }
}
