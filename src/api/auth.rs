use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{Role, User};
use crate::state::AppState;

/// Header carrying the id of the calling user. Credentials are checked by the
/// identity provider in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The registered user making the request.
#[derive(Debug, Clone)]
pub struct Actor(pub User);

impl Actor {
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.0.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "this endpoint is reserved to {role:?} accounts"
            )))
        }
    }
}

pub fn resolve_user(state: &AppState, raw_id: &str) -> Result<User, AppError> {
    let id = Uuid::parse_str(raw_id.trim())
        .map_err(|_| AppError::Unauthorized("malformed user id".to_string()))?;

    state
        .user(id)
        .ok_or_else(|| AppError::Unauthorized(format!("unknown user {id}")))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("malformed user id".to_string()))?;

        resolve_user(state, raw).map(Actor)
    }
}
