//! UseCase 層
//!
//! ビジネスロジックを実装します。Domain 層の trait（Repository, MessagePusher）にのみ依存し、
//! UI 層（WebSocket ハンドラ）から呼び出されます。

pub mod connect_client;
pub mod create_session;
pub mod disconnect_client;
pub mod error;
pub mod expire_idle_sessions;
pub mod get_broker_stats;
pub mod join_session;
pub mod relay_signal;

pub use connect_client::ConnectClientUseCase;
pub use create_session::CreateSessionUseCase;
pub use disconnect_client::{DisconnectClientUseCase, DisconnectOutcome};
pub use error::{CreateSessionError, JoinSessionError, RelayError};
pub use expire_idle_sessions::ExpireIdleSessionsUseCase;
pub use get_broker_stats::GetBrokerStatsUseCase;
pub use join_session::{JoinSessionUseCase, JoinedSession};
pub use relay_signal::RelaySignalUseCase;
