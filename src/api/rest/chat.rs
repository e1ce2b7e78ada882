use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::Actor;
use crate::engine::chat;
use crate::error::AppError;
use crate::models::chat::ChatMessage;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/:id/messages", get(list_messages).post(send_message))
        .route("/orders/:id/messages/read", post(mark_read))
        .route("/orders/:id/messages/unread", get(unread))
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Serialize)]
struct CountResponse {
    count: usize,
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    chat::list_messages(&state, order_id, &actor).map(Json)
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    chat::send_message(&state, order_id, &actor, &payload.message).map(Json)
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(order_id): Path<Uuid>,
) -> Result<Json<CountResponse>, AppError> {
    let count = chat::mark_read(&state, order_id, &actor)?;
    Ok(Json(CountResponse { count }))
}

async fn unread(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(order_id): Path<Uuid>,
) -> Result<Json<CountResponse>, AppError> {
    chat::ensure_can_read(&state, order_id, &actor)?;
    let count = chat::unread_count(&state, order_id, &actor);
    Ok(Json(CountResponse { count }))
}
