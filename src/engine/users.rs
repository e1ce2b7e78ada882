use chrono::Utc;
use dashmap::mapref::entry::Entry;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{NewUser, Role, User};
use crate::state::AppState;

pub fn register(state: &AppState, new: NewUser) -> Result<User, AppError> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let email = new.email.trim().to_lowercase();
    if !looks_like_email(&email) {
        return Err(AppError::BadRequest(format!("invalid email: {email}")));
    }

    if new.phone.trim().is_empty() {
        return Err(AppError::BadRequest("phone cannot be empty".to_string()));
    }

    let role = if state.admin_emails.contains(&email) {
        Role::Admin
    } else if new.role == Role::Admin {
        return Err(AppError::Forbidden(
            "admin accounts cannot be self-registered".to_string(),
        ));
    } else {
        new.role
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email,
        phone: new.phone.trim().to_string(),
        role,
        city: new.city,
        created_at: now,
        updated_at: now,
    };

    match state.user_emails.entry(user.email.clone()) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!(
                "email {} is already in use",
                user.email
            )));
        }
        Entry::Vacant(slot) => {
            slot.insert(user.id);
        }
    }
    state.users.insert(user.id, user.clone());
    info!(user_id = %user.id, role = ?user.role, "user registered");

    Ok(user)
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

pub fn all_users(state: &AppState) -> Vec<User> {
    let mut users: Vec<User> = state
        .users
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    users
}
