use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::SinkExt;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::auth::resolve_user;
use crate::engine::{chat, orders};
use crate::error::AppError;
use crate::models::chat::ChatEvent;
use crate::models::order::OrderEvent;
use crate::models::user::User;
use crate::state::AppState;

/// Browsers cannot set headers on a WebSocket handshake, so the caller id
/// travels in the query string here.
#[derive(Deserialize)]
pub struct SocketParams {
    pub user_id: Option<String>,
}

fn socket_user(state: &AppState, params: &SocketParams) -> Result<User, AppError> {
    let raw = params
        .user_id
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("missing user_id query parameter".to_string()))?;
    resolve_user(state, raw)
}

pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Query(params): Query<SocketParams>,
) -> Result<impl IntoResponse, AppError> {
    let actor = socket_user(&state, &params)?;
    chat::ensure_can_read(&state, order_id, &actor)?;

    let events = BroadcastStream::new(state.chat_events_tx.subscribe());
    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, events, order_id, actor.id)))
}

pub async fn order_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SocketParams>,
) -> Result<impl IntoResponse, AppError> {
    let actor = socket_user(&state, &params)?;

    let events = BroadcastStream::new(state.order_events_tx.subscribe());
    Ok(ws.on_upgrade(move |socket| handle_order_socket(socket, events, actor)))
}

/// Serializes `event` as a text frame. `false` once the peer is gone.
async fn send_json<T: Serialize>(sender: &mut SplitSink<WebSocket, Message>, event: &T) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "failed to serialize event for ws");
            return true;
        }
    };
    sender.send(Message::Text(json)).await.is_ok()
}

/// Ends when either task finishes: the feed closed or the peer hung up.
async fn drive<F>(socket: WebSocket, feed: F)
where
    F: FnOnce(SplitSink<WebSocket, Message>) -> JoinHandle<()>,
{
    let (sender, mut receiver) = socket.split();
    let send_task = feed(sender);
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }
}

async fn handle_chat_socket(
    socket: WebSocket,
    mut events: BroadcastStream<ChatEvent>,
    order_id: Uuid,
    user_id: Uuid,
) {
    info!(order_id = %order_id, user_id = %user_id, "chat socket connected");

    drive(socket, |mut sender| {
        tokio::spawn(async move {
            while let Some(item) = events.next().await {
                let event = match item {
                    Ok(event) if event.order_id() == order_id => event,
                    Ok(_) => continue,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(order_id = %order_id, skipped, "chat socket lagged");
                        continue;
                    }
                };

                if !send_json(&mut sender, &event).await {
                    break;
                }

                if matches!(event, ChatEvent::Closed { .. }) {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        })
    })
    .await;

    info!(order_id = %order_id, user_id = %user_id, "chat socket disconnected");
}

async fn handle_order_socket(
    socket: WebSocket,
    mut events: BroadcastStream<OrderEvent>,
    actor: User,
) {
    info!(user_id = %actor.id, role = ?actor.role, "order socket connected");
    let user_id = actor.id;

    drive(socket, |mut sender| {
        tokio::spawn(async move {
            while let Some(item) = events.next().await {
                let event = match item {
                    Ok(event) if orders::can_follow(&event, &actor) => event,
                    Ok(_) => continue,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(user_id = %actor.id, skipped, "order socket lagged");
                        continue;
                    }
                };

                if !send_json(&mut sender, &event).await {
                    break;
                }
            }
        })
    })
    .await;

    info!(user_id = %user_id, "order socket disconnected");
}
