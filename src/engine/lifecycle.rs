use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::chat;
use crate::error::AppError;
use crate::models::order::{Order, OrderEvent, OrderStatus};
use crate::models::user::{Role, User};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Accept,
    Start,
    Complete,
    Cancel,
}

impl OrderAction {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderAction::Accept => "accept",
            OrderAction::Start => "start",
            OrderAction::Complete => "complete",
            OrderAction::Cancel => "cancel",
        }
    }

    pub fn target(self) -> OrderStatus {
        match self {
            OrderAction::Accept => OrderStatus::Accepted,
            OrderAction::Start => OrderStatus::InProgress,
            OrderAction::Complete => OrderStatus::Completed,
            OrderAction::Cancel => OrderStatus::Cancelled,
        }
    }

    fn allowed_from(self) -> &'static [OrderStatus] {
        match self {
            OrderAction::Accept => &[OrderStatus::Pending],
            OrderAction::Start => &[OrderStatus::Accepted],
            OrderAction::Complete => &[OrderStatus::Accepted, OrderStatus::InProgress],
            OrderAction::Cancel => &[OrderStatus::Pending],
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates `action` for `actor` against the current state of `order` and
/// returns the updated order. Does not touch shared state.
pub fn transition(
    order: &Order,
    actor: &User,
    action: OrderAction,
    now: DateTime<Utc>,
) -> Result<Order, AppError> {
    authorize(order, actor, action)?;

    if !action.allowed_from().contains(&order.status) {
        return Err(AppError::Conflict(format!(
            "cannot {action} order {} while it is {}",
            order.id,
            order.status.as_str()
        )));
    }

    let mut updated = order.clone();
    updated.status = action.target();
    updated.updated_at = now;

    if action == OrderAction::Accept {
        updated.driver_id = Some(actor.id);
        updated.driver_name = Some(actor.name.clone());
    }

    Ok(updated)
}

fn authorize(order: &Order, actor: &User, action: OrderAction) -> Result<(), AppError> {
    let allowed = match action {
        OrderAction::Accept => actor.role == Role::Driver,
        OrderAction::Start | OrderAction::Complete => {
            actor.role == Role::Driver && order.is_assigned_to(actor.id)
        }
        OrderAction::Cancel => match actor.role {
            Role::Client => order.client_id == actor.id,
            Role::Admin => true,
            Role::Driver => false,
        },
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "user {} may not {action} order {}",
            actor.id, order.id
        )))
    }
}

/// Applies a transition to the stored order. The map entry stays locked
/// between the status check and the write, so two drivers racing to accept
/// the same order cannot both succeed.
pub fn apply(
    state: &AppState,
    order_id: Uuid,
    actor: &User,
    action: OrderAction,
) -> Result<Order, AppError> {
    let updated = {
        let mut entry = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        let updated = transition(entry.value(), actor, action, Utc::now())?;
        *entry.value_mut() = updated.clone();
        updated
    };

    if action == OrderAction::Complete {
        let purged = chat::purge(state, order_id);
        info!(order_id = %order_id, purged, "chat history deleted");
    }

    if matches!(action, OrderAction::Complete | OrderAction::Cancel) {
        state.metrics.open_orders.dec();
    }

    state
        .metrics
        .order_transitions_total
        .with_label_values(&[action.as_str()])
        .inc();
    let _ = state.order_events_tx.send(OrderEvent::from(&updated));

    info!(
        order_id = %order_id,
        actor_id = %actor.id,
        action = action.as_str(),
        status = updated.status.as_str(),
        "order status changed"
    );

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use chrono::Utc;
    use uuid::Uuid;

    use super::{apply, transition, OrderAction};
    use crate::config::Config;
    use crate::engine::chat;
    use crate::error::AppError;
    use crate::geo::City;
    use crate::models::order::{Order, OrderStatus};
    use crate::models::user::{Role, User};
    use crate::state::AppState;

    fn user(id_seed: u128, role: Role) -> User {
        User {
            id: Uuid::from_u128(id_seed),
            name: format!("user-{id_seed}"),
            email: format!("user{id_seed}@kwiigo.cm"),
            phone: "+237 690 000 000".to_string(),
            role,
            city: City::Yaounde,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(client: &User, status: OrderStatus, driver: Option<&User>) -> Order {
        Order {
            id: Uuid::new_v4(),
            client_id: client.id,
            client_name: client.name.clone(),
            client_phone: client.phone.clone(),
            driver_id: driver.map(|d| d.id),
            driver_name: driver.map(|d| d.name.clone()),
            status,
            from: City::Yaounde,
            to: City::Douala,
            pickup_address: "Mvog-Mbi".to_string(),
            delivery_address: "Akwa".to_string(),
            description: "documents".to_string(),
            weight_kg: 1.0,
            fragile: false,
            urgent: false,
            recipient_name: "Paul".to_string(),
            recipient_phone: "+237 677 123 456".to_string(),
            price: 6_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn driver_accepts_pending_order() {
        let client = user(1, Role::Client);
        let driver = user(2, Role::Driver);
        let pending = order(&client, OrderStatus::Pending, None);

        let accepted = transition(&pending, &driver, OrderAction::Accept, Utc::now()).unwrap();

        assert_eq!(accepted.status, OrderStatus::Accepted);
        assert_eq!(accepted.driver_id, Some(driver.id));
        assert_eq!(accepted.driver_name.as_deref(), Some("user-2"));
    }

    #[test]
    fn clients_cannot_accept_orders() {
        let client = user(1, Role::Client);
        let pending = order(&client, OrderStatus::Pending, None);

        let result = transition(&pending, &client, OrderAction::Accept, Utc::now());
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn accepted_order_cannot_be_accepted_again() {
        let client = user(1, Role::Client);
        let first = user(2, Role::Driver);
        let second = user(3, Role::Driver);
        let accepted = order(&client, OrderStatus::Accepted, Some(&first));

        let result = transition(&accepted, &second, OrderAction::Accept, Utc::now());
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn only_assigned_driver_can_start_or_complete() {
        let client = user(1, Role::Client);
        let assigned = user(2, Role::Driver);
        let other = user(3, Role::Driver);
        let accepted = order(&client, OrderStatus::Accepted, Some(&assigned));

        for action in [OrderAction::Start, OrderAction::Complete] {
            let result = transition(&accepted, &other, action, Utc::now());
            assert!(matches!(result, Err(AppError::Forbidden(_))));
        }

        let started = transition(&accepted, &assigned, OrderAction::Start, Utc::now()).unwrap();
        assert_eq!(started.status, OrderStatus::InProgress);

        let completed =
            transition(&started, &assigned, OrderAction::Complete, Utc::now()).unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(completed.driver_id, Some(assigned.id));
    }

    #[test]
    fn accepted_order_can_be_completed_without_starting() {
        let client = user(1, Role::Client);
        let driver = user(2, Role::Driver);
        let accepted = order(&client, OrderStatus::Accepted, Some(&driver));

        let completed = transition(&accepted, &driver, OrderAction::Complete, Utc::now()).unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
    }

    #[test]
    fn pending_order_cannot_be_started() {
        let client = user(1, Role::Client);
        let driver = user(2, Role::Driver);
        let mut pending = order(&client, OrderStatus::Pending, None);
        // Forge an assignment so the status check, not authorization, decides.
        pending.driver_id = Some(driver.id);

        let result = transition(&pending, &driver, OrderAction::Start, Utc::now());
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn owner_or_admin_cancels_pending_order() {
        let client = user(1, Role::Client);
        let stranger = user(2, Role::Client);
        let admin = user(3, Role::Admin);
        let pending = order(&client, OrderStatus::Pending, None);

        let result = transition(&pending, &stranger, OrderAction::Cancel, Utc::now());
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let by_owner = transition(&pending, &client, OrderAction::Cancel, Utc::now()).unwrap();
        assert_eq!(by_owner.status, OrderStatus::Cancelled);
        assert!(by_owner.driver_id.is_none());

        let by_admin = transition(&pending, &admin, OrderAction::Cancel, Utc::now()).unwrap();
        assert_eq!(by_admin.status, OrderStatus::Cancelled);
    }

    #[test]
    fn accepted_order_cannot_be_cancelled() {
        let client = user(1, Role::Client);
        let driver = user(2, Role::Driver);
        let accepted = order(&client, OrderStatus::Accepted, Some(&driver));

        let result = transition(&accepted, &client, OrderAction::Cancel, Utc::now());
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn terminal_states_reject_every_action() {
        let client = user(1, Role::Client);
        let driver = user(2, Role::Driver);
        let completed = order(&client, OrderStatus::Completed, Some(&driver));
        let cancelled = order(&client, OrderStatus::Cancelled, None);

        assert!(matches!(
            transition(&completed, &driver, OrderAction::Complete, Utc::now()),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            transition(&cancelled, &client, OrderAction::Cancel, Utc::now()),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            transition(&cancelled, &driver, OrderAction::Accept, Utc::now()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn driver_is_set_exactly_when_status_requires_it() {
        let client = user(1, Role::Client);
        let driver = user(2, Role::Driver);
        let pending = order(&client, OrderStatus::Pending, None);

        let accepted = transition(&pending, &driver, OrderAction::Accept, Utc::now()).unwrap();
        let started = transition(&accepted, &driver, OrderAction::Start, Utc::now()).unwrap();
        let completed = transition(&started, &driver, OrderAction::Complete, Utc::now()).unwrap();
        let cancelled = transition(&pending, &client, OrderAction::Cancel, Utc::now()).unwrap();

        for o in [&pending, &accepted, &started, &completed, &cancelled] {
            assert_eq!(o.driver_id.is_some(), o.status.has_driver());
        }
    }

    #[test]
    fn racing_accepts_have_a_single_winner() {
        let client = user(1, Role::Client);
        let drivers: Vec<User> = (10..18).map(|seed| user(seed, Role::Driver)).collect();

        for _ in 0..50 {
            let state = AppState::new(&Config::default());
            let pending = order(&client, OrderStatus::Pending, None);
            let order_id = pending.id;
            state.orders.insert(order_id, pending);
            let barrier = Barrier::new(drivers.len());

            let winners: Vec<Uuid> = thread::scope(|scope| {
                let handles: Vec<_> = drivers
                    .iter()
                    .map(|driver| {
                        let (state, barrier) = (&state, &barrier);
                        scope.spawn(move || {
                            barrier.wait();
                            apply(state, order_id, driver, OrderAction::Accept)
                                .ok()
                                .map(|_| driver.id)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .filter_map(|handle| handle.join().unwrap())
                    .collect()
            });

            assert_eq!(winners.len(), 1);
            let stored = state.order(order_id).unwrap();
            assert_eq!(stored.status, OrderStatus::Accepted);
            assert_eq!(stored.driver_id, Some(winners[0]));
        }
    }

    #[test]
    fn completion_leaves_no_message_behind() {
        let client = user(1, Role::Client);
        let driver = user(2, Role::Driver);

        for _ in 0..50 {
            let state = AppState::new(&Config::default());
            let accepted = order(&client, OrderStatus::Accepted, Some(&driver));
            let order_id = accepted.id;
            state.orders.insert(order_id, accepted);
            let barrier = Barrier::new(2);

            thread::scope(|scope| {
                scope.spawn(|| {
                    barrier.wait();
                    while chat::send_message(&state, order_id, &client, "toujours là ?").is_ok() {}
                });
                scope.spawn(|| {
                    barrier.wait();
                    apply(&state, order_id, &driver, OrderAction::Complete).unwrap();
                });
            });

            assert_eq!(state.order(order_id).unwrap().status, OrderStatus::Completed);
            assert!(state.chats.get(&order_id).is_none());
        }
    }
}
