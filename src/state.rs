use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::Config;
use crate::models::chat::{ChatEvent, ChatMessage};
use crate::models::order::{Order, OrderEvent};
use crate::models::user::User;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub users: DashMap<Uuid, User>,
    /// Lowercased email to user id; the uniqueness guard for registration.
    pub user_emails: DashMap<String, Uuid>,
    pub orders: DashMap<Uuid, Order>,
    /// Chat threads keyed by order id, messages in send order.
    pub chats: DashMap<Uuid, Vec<ChatMessage>>,
    pub order_events_tx: broadcast::Sender<OrderEvent>,
    pub chat_events_tx: broadcast::Sender<ChatEvent>,
    pub admin_emails: Vec<String>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let (order_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);
        let (chat_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            users: DashMap::new(),
            user_emails: DashMap::new(),
            orders: DashMap::new(),
            chats: DashMap::new(),
            order_events_tx,
            chat_events_tx,
            admin_emails: config.admin_emails.clone(),
            metrics: Metrics::new(),
        }
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.orders.get(&id).map(|entry| entry.value().clone())
    }
}
