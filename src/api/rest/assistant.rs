use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;

use crate::api::auth::Actor;
use crate::engine::assistant::{self, AssistantReply, AssistantRequest};
use crate::engine::orders;
use crate::error::AppError;
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/assistant", post(ask_assistant))
}

async fn ask_assistant(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(payload): Json<AssistantRequest>,
) -> Result<Json<AssistantReply>, AppError> {
    let visible = match actor.role {
        Role::Client => orders::orders_by_client(&state, actor.id),
        Role::Driver => orders::orders_by_driver(&state, actor.id),
        Role::Admin => Vec::new(),
    };

    tracing::debug!(user_id = %actor.id, "assistant question");
    assistant::answer(&actor, &payload.message, &visible).map(Json)
}
