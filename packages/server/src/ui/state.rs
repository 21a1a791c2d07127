//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::MessagePusher,
    usecase::{
        ConnectClientUseCase, CreateSessionUseCase, DisconnectClientUseCase,
        GetBrokerStatsUseCase, JoinSessionUseCase, RelaySignalUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// MessagePusher（リクエストへの応答の送信に使用）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// CreateSessionUseCase（セッション作成のユースケース）
    pub create_session_usecase: Arc<CreateSessionUseCase>,
    /// JoinSessionUseCase（セッション参加のユースケース）
    pub join_session_usecase: Arc<JoinSessionUseCase>,
    /// RelaySignalUseCase（シグナリング中継のユースケース）
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// GetBrokerStatsUseCase（統計情報取得のユースケース）
    pub get_broker_stats_usecase: Arc<GetBrokerStatsUseCase>,
}
