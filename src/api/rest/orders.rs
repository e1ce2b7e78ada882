use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::api::auth::Actor;
use crate::engine::lifecycle::{self, OrderAction};
use crate::engine::orders;
use crate::engine::pricing::{self, PriceBreakdown, QuoteRequest};
use crate::error::AppError;
use crate::models::order::{NewOrder, Order};
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_all_orders))
        .route("/orders/available", get(list_available_orders))
        .route("/orders/mine", get(list_my_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/accept", post(accept_order))
        .route("/orders/:id/start", post(start_order))
        .route("/orders/:id/complete", post(complete_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/pricing/quote", post(quote))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(payload): Json<NewOrder>,
) -> Result<Json<Order>, AppError> {
    orders::create_order(&state, &actor, payload).map(Json)
}

async fn list_all_orders(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Order>>, AppError> {
    actor.require(Role::Admin)?;
    Ok(Json(orders::all_orders(&state)))
}

async fn list_available_orders(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Order>>, AppError> {
    actor.require(Role::Driver)?;
    Ok(Json(orders::available_orders(&state)))
}

async fn list_my_orders(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
) -> Result<Json<Vec<Order>>, AppError> {
    let mine = match actor.role {
        Role::Client => orders::orders_by_client(&state, actor.id),
        Role::Driver => orders::orders_by_driver(&state, actor.id),
        Role::Admin => orders::all_orders(&state),
    };
    Ok(Json(mine))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    orders::get_order(&state, id, &actor).map(Json)
}

async fn accept_order(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    lifecycle::apply(&state, id, &actor, OrderAction::Accept).map(Json)
}

async fn start_order(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    lifecycle::apply(&state, id, &actor, OrderAction::Start).map(Json)
}

async fn complete_order(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    lifecycle::apply(&state, id, &actor, OrderAction::Complete).map(Json)
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    lifecycle::apply(&state, id, &actor, OrderAction::Cancel).map(Json)
}

async fn quote(Json(payload): Json<QuoteRequest>) -> Result<Json<PriceBreakdown>, AppError> {
    pricing::quote(&payload).map(Json)
}
