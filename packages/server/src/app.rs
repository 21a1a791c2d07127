//! Dependency wiring.

use std::{collections::HashMap, sync::Arc};

use peersend_shared::time::SystemClock;
use tokio::sync::Mutex;

use crate::{
    config::BrokerConfig,
    domain::RandomCodeGenerator,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemorySessionRepository,
    },
    ui::{Server, state::AppState},
    usecase::{
        ConnectClientUseCase, CreateSessionUseCase, DisconnectClientUseCase,
        ExpireIdleSessionsUseCase, GetBrokerStatsUseCase, JoinSessionUseCase, RelaySignalUseCase,
    },
};

/// Build a ready-to-run server from the broker configuration
///
/// Dependencies are initialized in order:
/// 1. Repository
/// 2. MessagePusher
/// 3. UseCases
/// 4. Server
pub fn build_server(config: BrokerConfig) -> Server {
    let clock = Arc::new(SystemClock);

    // 1. Create Repository (in-memory database)
    let repository = Arc::new(InMemorySessionRepository::new(
        Arc::new(RandomCodeGenerator),
        config.collision_policy,
    ));

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher_clients = Arc::new(Mutex::new(HashMap::new()));
    let message_pusher = Arc::new(WebSocketMessagePusher::new(message_pusher_clients));

    // 3. Create UseCases
    let state = AppState {
        message_pusher: message_pusher.clone(),
        connect_client_usecase: Arc::new(ConnectClientUseCase::new(message_pusher.clone())),
        create_session_usecase: Arc::new(CreateSessionUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            clock.clone(),
            config.receiver_capacity,
        )),
        join_session_usecase: Arc::new(JoinSessionUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        relay_signal_usecase: Arc::new(RelaySignalUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        get_broker_stats_usecase: Arc::new(GetBrokerStatsUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
    };

    // 4. Create the server
    let mut server = Server::new(state);
    if let Some(ttl) = config.idle_session_ttl {
        server = server.with_idle_expiry(Arc::new(ExpireIdleSessionsUseCase::new(
            repository,
            message_pusher,
            clock,
            ttl,
        )));
    }
    if let Some(dir) = config.static_dir {
        server = server.with_static_dir(dir);
    }
    server
}
