use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    Client,
    Driver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub order_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_role: SenderRole,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Message(ChatMessage),
    Read { order_id: Uuid, reader_id: Uuid, count: usize },
    Closed { order_id: Uuid },
}

impl ChatEvent {
    pub fn order_id(&self) -> Uuid {
        match self {
            ChatEvent::Message(message) => message.order_id,
            ChatEvent::Read { order_id, .. } | ChatEvent::Closed { order_id } => *order_id,
        }
    }
}
