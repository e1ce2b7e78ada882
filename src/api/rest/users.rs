use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::api::auth::Actor;
use crate::engine::users;
use crate::error::AppError;
use crate::models::user::{NewUser, Role, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register).get(list_users))
        .route("/users/:id", get(get_user))
        .route("/me", get(me))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewUser>,
) -> Result<Json<User>, AppError> {
    users::register(&state, payload).map(Json)
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<User>>, AppError> {
    actor.require(Role::Admin)?;
    Ok(Json(users::all_users(&state)))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    if actor.id != id && actor.role != Role::Admin {
        return Err(AppError::Forbidden(format!(
            "user {} cannot view user {id}",
            actor.id
        )));
    }

    state
        .user(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
}

async fn me(Actor(actor): Actor) -> Json<User> {
    Json(actor)
}
