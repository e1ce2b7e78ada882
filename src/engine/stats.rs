use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::pricing::{commission, driver_earning};
use crate::models::order::{Order, OrderStatus};
use crate::models::user::{Role, User};

const ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AdminStats {
    pub total_users: usize,
    pub total_clients: usize,
    pub total_drivers: usize,
    pub total_admins: usize,
    pub total_orders: usize,
    pub pending_orders: usize,
    pub in_progress_orders: usize,
    pub completed_orders: usize,
    pub cancelled_orders: usize,
    pub total_revenue: u64,
    pub total_commission: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DriverStats {
    pub active_orders: usize,
    pub completed_orders: usize,
    pub total_earnings: u64,
    pub total_commission: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ClientStats {
    pub pending_orders: usize,
    pub active_orders: usize,
    pub completed_orders: usize,
    pub total_spent: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DashboardStats {
    Admin(AdminStats),
    Driver(DriverStats),
    Client(ClientStats),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    OrderCreated,
    OrderAccepted,
    OrderCompleted,
    OrderUpdated,
}

#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub order_id: Uuid,
    pub short_ref: String,
    pub kind: ActivityKind,
    pub actor_name: String,
    pub at: DateTime<Utc>,
}

pub fn admin_stats<'a, U, O>(users: U, orders: O) -> AdminStats
where
    U: IntoIterator<Item = &'a User>,
    O: IntoIterator<Item = &'a Order>,
{
    let mut stats = AdminStats::default();

    for user in users {
        stats.total_users += 1;
        match user.role {
            Role::Client => stats.total_clients += 1,
            Role::Driver => stats.total_drivers += 1,
            Role::Admin => stats.total_admins += 1,
        }
    }

    for order in orders {
        stats.total_orders += 1;
        match order.status {
            OrderStatus::Pending => stats.pending_orders += 1,
            OrderStatus::Accepted | OrderStatus::InProgress => stats.in_progress_orders += 1,
            OrderStatus::Completed => {
                stats.completed_orders += 1;
                stats.total_revenue += order.price;
                stats.total_commission += commission(order.price);
            }
            OrderStatus::Cancelled => stats.cancelled_orders += 1,
        }
    }

    stats
}

pub fn driver_stats<'a, O>(driver_id: Uuid, orders: O) -> DriverStats
where
    O: IntoIterator<Item = &'a Order>,
{
    let mut stats = DriverStats::default();

    for order in orders.into_iter().filter(|o| o.is_assigned_to(driver_id)) {
        if order.status == OrderStatus::Completed {
            stats.completed_orders += 1;
            stats.total_earnings += driver_earning(order.price);
            stats.total_commission += commission(order.price);
        } else if order.status.is_active() {
            stats.active_orders += 1;
        }
    }

    stats
}

pub fn client_stats<'a, O>(client_id: Uuid, orders: O) -> ClientStats
where
    O: IntoIterator<Item = &'a Order>,
{
    let mut stats = ClientStats::default();

    for order in orders.into_iter().filter(|o| o.client_id == client_id) {
        match order.status {
            OrderStatus::Pending => stats.pending_orders += 1,
            OrderStatus::Accepted | OrderStatus::InProgress => stats.active_orders += 1,
            OrderStatus::Completed => {
                stats.completed_orders += 1;
                stats.total_spent += order.price;
            }
            OrderStatus::Cancelled => {}
        }
    }

    stats
}

/// Latest orders as a feed. `orders` must already be sorted newest first.
pub fn recent_activity(orders: &[Order]) -> Vec<Activity> {
    orders
        .iter()
        .take(ACTIVITY_LIMIT)
        .map(|order| {
            let kind = match order.status {
                OrderStatus::Pending => ActivityKind::OrderCreated,
                OrderStatus::Accepted => ActivityKind::OrderAccepted,
                OrderStatus::Completed => ActivityKind::OrderCompleted,
                OrderStatus::InProgress | OrderStatus::Cancelled => ActivityKind::OrderUpdated,
            };
            let actor_name = match kind {
                ActivityKind::OrderAccepted | ActivityKind::OrderCompleted => order
                    .driver_name
                    .clone()
                    .unwrap_or_else(|| order.client_name.clone()),
                _ => order.client_name.clone(),
            };

            Activity {
                order_id: order.id,
                short_ref: order.short_ref(),
                kind,
                actor_name,
                at: order.updated_at,
            }
        })
        .collect()
}
