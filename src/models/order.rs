use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::City;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Chat is open only while a driver is carrying the order.
    pub fn is_active(self) -> bool {
        matches!(self, OrderStatus::Accepted | OrderStatus::InProgress)
    }

    pub fn has_driver(self) -> bool {
        matches!(
            self,
            OrderStatus::Accepted | OrderStatus::InProgress | OrderStatus::Completed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_phone: String,
    pub driver_id: Option<Uuid>,
    pub driver_name: Option<String>,
    pub status: OrderStatus,
    pub from: City,
    pub to: City,
    pub pickup_address: String,
    pub delivery_address: String,
    pub description: String,
    pub weight_kg: f64,
    pub fragile: bool,
    pub urgent: bool,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub price: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.driver_id == Some(user_id)
    }

    /// Last six characters of the id, the short reference shown to users.
    pub fn short_ref(&self) -> String {
        let id = self.id.simple().to_string();
        id[id.len() - 6..].to_string()
    }
}

/// Client-supplied fields of a new order. Price and ownership are filled in
/// server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub from: City,
    pub to: City,
    pub pickup_address: String,
    pub delivery_address: String,
    pub description: String,
    pub weight_kg: f64,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub urgent: bool,
    pub recipient_name: String,
    pub recipient_phone: String,
}

/// Published on every order creation and status change.
#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub order_id: Uuid,
    pub client_id: Uuid,
    pub status: OrderStatus,
    pub driver_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

impl From<&Order> for OrderEvent {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            client_id: order.client_id,
            status: order.status,
            driver_id: order.driver_id,
            at: order.updated_at,
        }
    }
}
