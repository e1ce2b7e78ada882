use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::api::auth::Actor;
use crate::engine::orders;
use crate::engine::stats::{self, Activity, DashboardStats};
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::user::{Role, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(dashboard))
        .route("/activity", get(activity))
}

fn snapshot_orders(state: &AppState) -> Vec<Order> {
    state
        .orders
        .iter()
        .map(|entry| entry.value().clone())
        .collect()
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
) -> Json<DashboardStats> {
    let orders = snapshot_orders(&state);

    let body = match actor.role {
        Role::Admin => {
            let users: Vec<User> = state
                .users
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            DashboardStats::Admin(stats::admin_stats(&users, &orders))
        }
        Role::Driver => DashboardStats::Driver(stats::driver_stats(actor.id, &orders)),
        Role::Client => DashboardStats::Client(stats::client_stats(actor.id, &orders)),
    };

    Json(body)
}

async fn activity(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Activity>>, AppError> {
    actor.require(Role::Admin)?;
    let orders = orders::all_orders(&state);
    Ok(Json(stats::recent_activity(&orders)))
}
