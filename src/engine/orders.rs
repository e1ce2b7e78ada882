use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::engine::pricing::{self, QuoteRequest};
use crate::error::AppError;
use crate::models::order::{NewOrder, Order, OrderEvent, OrderStatus};
use crate::models::user::{Role, User};
use crate::state::AppState;

static CAMEROON_MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+237\s?6\d{2}\s?\d{3}\s?\d{3}$").expect("valid phone pattern")
});

pub fn is_valid_phone(phone: &str) -> bool {
    CAMEROON_MOBILE.is_match(phone.trim())
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub fn create_order(state: &AppState, actor: &User, new: NewOrder) -> Result<Order, AppError> {
    if actor.role != Role::Client {
        return Err(AppError::Forbidden("only clients can create orders".to_string()));
    }

    require("pickup_address", &new.pickup_address)?;
    require("delivery_address", &new.delivery_address)?;
    require("description", &new.description)?;
    require("recipient_name", &new.recipient_name)?;
    if !is_valid_phone(&new.recipient_phone) {
        return Err(AppError::BadRequest(
            "recipient_phone must look like +237 6XX XXX XXX".to_string(),
        ));
    }

    let breakdown = pricing::quote(&QuoteRequest {
        weight_kg: new.weight_kg,
        from: new.from,
        to: new.to,
        urgent: new.urgent,
        fragile: new.fragile,
    })?;

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        client_id: actor.id,
        client_name: actor.name.clone(),
        client_phone: actor.phone.clone(),
        driver_id: None,
        driver_name: None,
        status: OrderStatus::Pending,
        from: new.from,
        to: new.to,
        pickup_address: new.pickup_address.trim().to_string(),
        delivery_address: new.delivery_address.trim().to_string(),
        description: new.description.trim().to_string(),
        weight_kg: new.weight_kg,
        fragile: new.fragile,
        urgent: new.urgent,
        recipient_name: new.recipient_name.trim().to_string(),
        recipient_phone: new.recipient_phone.trim().to_string(),
        price: breakdown.total,
        created_at: now,
        updated_at: now,
    };

    state.orders.insert(order.id, order.clone());
    state.metrics.orders_created_total.inc();
    state.metrics.open_orders.inc();
    let _ = state.order_events_tx.send(OrderEvent::from(&order));

    info!(
        order_id = %order.id,
        client_id = %actor.id,
        route = %format!("{}-{}", order.from.slug(), order.to.slug()),
        price = order.price,
        "order created"
    );

    Ok(order)
}

/// Admins see every order, clients their own, drivers the open pool plus
/// whatever is assigned to them.
pub fn can_view(order: &Order, actor: &User) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Client => order.client_id == actor.id,
        Role::Driver => order.status == OrderStatus::Pending || order.is_assigned_to(actor.id),
    }
}

/// Whether `actor` receives `event` on the live order feed. Drivers also hear
/// when a pending order leaves the pool, whoever took it.
pub fn can_follow(event: &OrderEvent, actor: &User) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Client => event.client_id == actor.id,
        Role::Driver => {
            event.driver_id.is_none()
                || event.driver_id == Some(actor.id)
                || event.status == OrderStatus::Accepted
        }
    }
}

pub fn get_order(state: &AppState, order_id: Uuid, actor: &User) -> Result<Order, AppError> {
    let order = state
        .order(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if !can_view(&order, actor) {
        return Err(AppError::Forbidden(format!(
            "user {} cannot view order {order_id}",
            actor.id
        )));
    }

    Ok(order)
}

fn collect_sorted<F>(state: &AppState, keep: F) -> Vec<Order>
where
    F: Fn(&Order) -> bool,
{
    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| entry.value().clone())
        .collect();

    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

pub fn orders_by_client(state: &AppState, client_id: Uuid) -> Vec<Order> {
    collect_sorted(state, |order| order.client_id == client_id)
}

pub fn orders_by_driver(state: &AppState, driver_id: Uuid) -> Vec<Order> {
    collect_sorted(state, |order| order.is_assigned_to(driver_id))
}

pub fn available_orders(state: &AppState) -> Vec<Order> {
    collect_sorted(state, |order| order.status == OrderStatus::Pending)
}

pub fn all_orders(state: &AppState) -> Vec<Order> {
    collect_sorted(state, |_| true)
}
