use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::chat::{ChatEvent, ChatMessage, SenderRole};
use crate::models::order::Order;
use crate::models::user::{Role, User};
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 2_000;

/// Role the actor plays in this order's chat, or `None` for onlookers.
fn participant_role(order: &Order, actor: &User) -> Option<SenderRole> {
    if actor.role == Role::Client && order.client_id == actor.id {
        Some(SenderRole::Client)
    } else if actor.role == Role::Driver && order.is_assigned_to(actor.id) {
        Some(SenderRole::Driver)
    } else {
        None
    }
}

fn open_order(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    let order = state
        .order(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if !order.status.is_active() {
        return Err(AppError::Conflict(format!(
            "chat for order {order_id} is closed while it is {}",
            order.status.as_str()
        )));
    }

    Ok(order)
}

fn ensure_reader(order: &Order, actor: &User) -> Result<(), AppError> {
    if actor.role == Role::Admin || participant_role(order, actor).is_some() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "user {} is not part of order {}",
            actor.id, order.id
        )))
    }
}

pub fn send_message(
    state: &AppState,
    order_id: Uuid,
    actor: &User,
    text: &str,
) -> Result<ChatMessage, AppError> {
    let order = open_order(state, order_id)?;
    let sender_role = participant_role(&order, actor).ok_or_else(|| {
        AppError::Forbidden(format!(
            "user {} cannot write in the chat of order {order_id}",
            actor.id
        ))
    })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let message = ChatMessage {
        id: Uuid::new_v4(),
        order_id,
        sender_id: actor.id,
        sender_name: actor.name.clone(),
        sender_role,
        message: text.to_string(),
        timestamp: Utc::now(),
        read: false,
    };

    {
        let mut thread = state.chats.entry(order_id).or_default();
        // Re-check under the thread lock: purge takes the same lock after
        // the order is marked completed.
        let still_open = state
            .orders
            .get(&order_id)
            .map(|order| order.status.is_active())
            .unwrap_or(false);
        if !still_open {
            drop(thread);
            state.chats.remove_if(&order_id, |_, thread| thread.is_empty());
            return Err(AppError::Conflict(format!(
                "chat for order {order_id} is closed"
            )));
        }
        thread.push(message.clone());
    }

    state.metrics.chat_messages_total.inc();
    let _ = state
        .chat_events_tx
        .send(ChatEvent::Message(message.clone()));

    debug!(order_id = %order_id, sender_id = %actor.id, "chat message sent");
    Ok(message)
}

/// Read access to an order's chat: the order is active and the actor is a
/// participant or an admin.
pub fn ensure_can_read(state: &AppState, order_id: Uuid, actor: &User) -> Result<Order, AppError> {
    let order = open_order(state, order_id)?;
    ensure_reader(&order, actor)?;
    Ok(order)
}

/// Messages of an active order, oldest first.
pub fn list_messages(
    state: &AppState,
    order_id: Uuid,
    actor: &User,
) -> Result<Vec<ChatMessage>, AppError> {
    ensure_can_read(state, order_id, actor)?;

    let mut messages = state
        .chats
        .get(&order_id)
        .map(|thread| thread.value().clone())
        .unwrap_or_default();
    messages.sort_by_key(|message| message.timestamp);

    Ok(messages)
}

/// Marks messages written by the other party as read. Returns how many changed.
pub fn mark_read(state: &AppState, order_id: Uuid, actor: &User) -> Result<usize, AppError> {
    let order = open_order(state, order_id)?;
    if participant_role(&order, actor).is_none() {
        return Err(AppError::Forbidden(format!(
            "user {} is not part of order {order_id}",
            actor.id
        )));
    }

    let mut count = 0;
    if let Some(mut thread) = state.chats.get_mut(&order_id) {
        for message in thread
            .iter_mut()
            .filter(|message| message.sender_id != actor.id && !message.read)
        {
            message.read = true;
            count += 1;
        }
    }

    if count > 0 {
        let _ = state.chat_events_tx.send(ChatEvent::Read {
            order_id,
            reader_id: actor.id,
            count,
        });
    }

    Ok(count)
}

pub fn unread_count(state: &AppState, order_id: Uuid, actor: &User) -> usize {
    state
        .chats
        .get(&order_id)
        .map(|thread| {
            thread
                .iter()
                .filter(|message| message.sender_id != actor.id && !message.read)
                .count()
        })
        .unwrap_or(0)
}

/// Drops the whole thread of an order and tells live listeners it is closed.
pub fn purge(state: &AppState, order_id: Uuid) -> usize {
    let removed = state
        .chats
        .remove(&order_id)
        .map(|(_, thread)| thread.len())
        .unwrap_or(0);

    let _ = state.chat_events_tx.send(ChatEvent::Closed { order_id });
    info!(order_id = %order_id, removed, "chat closed");

    removed
}
