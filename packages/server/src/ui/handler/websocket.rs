//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ConnectionId, FileDescriptor, SessionCode, SignalKind},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage},
    ui::state::AppState,
    usecase::JoinSessionError,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// When every sender of the channel is dropped (normal teardown or a forced
/// disconnect), a close frame is sent and the task ends.
///
/// # Arguments
///
/// * `rx` - Channel receiver for messages addressed to this connection
/// * `sender` - WebSocket sink to send messages to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_client_usecase.execute(tx).await;
    tracing::info!("Connection '{}' opened", connection_id);

    reply(
        &state,
        &connection_id,
        ServerMessage::Welcome {
            connection_id: connection_id.to_string(),
        },
    )
    .await;

    let state_clone = state.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch(&state_clone, connection_id, text.as_str()).await;
                }
                Message::Binary(_) => {
                    tracing::warn!("Dropping binary frame from '{}'", connection_id);
                }
                Message::Close(_) => {
                    tracing::debug!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push messages addressed to this connection
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, stop the other
    let remaining = tokio::select! {
        _ = &mut recv_task => send_task,
        _ = &mut send_task => recv_task,
    };
    stop_task(remaining).await;

    let outcome = state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await;
    if let Some(session) = outcome.closed_session {
        tracing::info!(
            "Connection '{}' closed (session {} closed, {} receiver(s) disconnected)",
            connection_id,
            session.code,
            outcome.disconnected_receivers.len()
        );
    } else {
        tracing::info!("Connection '{}' closed", connection_id);
    }
}

/// Aborts `task` and waits until it has finished.
///
/// A dispatch still in flight when the socket goes away must not touch the
/// session table after the connection has been removed from it.
async fn stop_task(task: JoinHandle<()>) {
    task.abort();
    if let Err(e) = task.await {
        if !e.is_cancelled() {
            tracing::error!("Connection task failed: {}", e);
        }
    }
}

/// Handle one inbound text frame
async fn dispatch(state: &AppState, connection_id: ConnectionId, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(
                "Dropping malformed message from '{}': {}",
                connection_id,
                e
            );
            return;
        }
    };

    match message {
        ClientMessage::CreateCode {
            request_id,
            name,
            size,
        } => {
            create_code(
                state,
                connection_id,
                request_id,
                FileDescriptor::new(name, size),
            )
            .await
        }
        ClientMessage::JoinCode { request_id, code } => {
            join_code(state, connection_id, request_id, code).await
        }
        ClientMessage::WebrtcOffer { code, desc, to } => {
            let message = ServerMessage::WebrtcOffer {
                desc,
                from: connection_id.to_string(),
            };
            relay(state, connection_id, &code, SignalKind::Offer, to, message).await
        }
        ClientMessage::WebrtcAnswer { code, desc } => {
            let message = ServerMessage::WebrtcAnswer {
                desc,
                from: connection_id.to_string(),
            };
            relay(state, connection_id, &code, SignalKind::Answer, None, message).await
        }
        ClientMessage::WebrtcIce {
            code,
            candidate,
            to,
        } => {
            let message = ServerMessage::WebrtcIce {
                candidate,
                from: connection_id.to_string(),
            };
            relay(
                state,
                connection_id,
                &code,
                SignalKind::IceCandidate,
                to,
                message,
            )
            .await
        }
    }
}

async fn create_code(
    state: &AppState,
    connection_id: ConnectionId,
    request_id: Option<Value>,
    file_descriptor: FileDescriptor,
) {
    let response = match state
        .create_session_usecase
        .execute(connection_id, file_descriptor)
        .await
    {
        Ok(code) => ServerMessage::CodeCreated {
            request_id,
            code: code.into_string(),
        },
        Err(e) => {
            tracing::error!("Failed to create session for '{}': {}", connection_id, e);
            ServerMessage::Error {
                request_id,
                message: e.to_string(),
            }
        }
    };
    reply(state, &connection_id, response).await;
}

async fn join_code(
    state: &AppState,
    connection_id: ConnectionId,
    request_id: Option<Value>,
    code: String,
) {
    // Convert String -> SessionCode (Domain Model)
    let result = match SessionCode::try_from(code.clone()) {
        Ok(code) => state.join_session_usecase.execute(code, connection_id).await,
        Err(_) => Err(JoinSessionError::SessionNotFound(code)),
    };

    let joined = match result {
        Ok(joined) => joined,
        Err(e) => {
            tracing::info!("Join rejected for '{}': {}", connection_id, e);
            let response = ServerMessage::JoinResult {
                request_id,
                ok: false,
                file_descriptor: None,
            };
            reply(state, &connection_id, response).await;
            return;
        }
    };

    let response = ServerMessage::JoinResult {
        request_id,
        ok: true,
        file_descriptor: Some(joined.file_descriptor.clone().into()),
    };
    reply(state, &connection_id, response).await;

    if joined.newly_joined {
        let notification = ServerMessage::ReceiverJoined {
            code: joined.code.to_string(),
        };
        match notification.to_json() {
            Ok(json) => {
                if let Err(e) = state.join_session_usecase.notify_sender(&joined, &json).await {
                    tracing::warn!("Failed to notify sender of session {}: {}", joined.code, e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize receiver-joined: {}", e),
        }
    }
}

async fn relay(
    state: &AppState,
    from: ConnectionId,
    code: &str,
    kind: SignalKind,
    to: Option<String>,
    message: ServerMessage,
) {
    let Ok(code) = SessionCode::try_from(code.to_string()) else {
        tracing::debug!("Dropped {} from '{}': invalid session code", kind, from);
        return;
    };
    let to = match to.as_deref().map(ConnectionId::parse).transpose() {
        Ok(to) => to,
        Err(e) => {
            tracing::debug!("Dropped {} from '{}': {}", kind, from, e);
            return;
        }
    };
    let json = match message.to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize {}: {}", kind, e);
            return;
        }
    };

    if let Err(e) = state
        .relay_signal_usecase
        .execute(from, &code, kind, to, &json)
        .await
    {
        tracing::debug!("Dropped {} from '{}': {}", kind, from, e);
    }
}

/// Send a response to the connection that made the request
async fn reply(state: &AppState, connection_id: &ConnectionId, message: ServerMessage) {
    let json = match message.to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize response: {}", e);
            return;
        }
    };
    if let Err(e) = state.message_pusher.push_to(connection_id, &json).await {
        tracing::warn!("Failed to reply to '{}': {}", connection_id, e);
    }
}
