//! The signed-in user's session context.
//!
//! Sign-in writes one [`SessionContext`] into the cookie session; every
//! guard and handler reads it back through [`SessionContext::from_session`].
//! Nothing else in the session carries identity or role.

use actix_session::Session;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::{Role, User};

const CONTEXT_KEY: &str = "ctx";
const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: i64,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl SessionContext {
    /// Build from a user row. Rows with an unknown role do not get a session.
    pub fn for_user(user: &User) -> Option<Self> {
        Some(Self {
            user_id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: Role::parse(&user.role)?,
        })
    }

    pub fn from_session(session: &Session) -> Option<Self> {
        session.get::<SessionContext>(CONTEXT_KEY).unwrap_or(None)
    }

    pub fn require(session: &Session) -> Result<Self, AppError> {
        Self::from_session(session).ok_or_else(|| AppError::Session("Not signed in".to_string()))
    }

    pub fn require_admin(session: &Session) -> Result<Self, AppError> {
        let ctx = Self::require(session)?;
        if !ctx.is_admin() {
            return Err(AppError::PermissionDenied("admin".to_string()));
        }
        Ok(ctx)
    }

    pub fn store(&self, session: &Session) -> Result<(), AppError> {
        session.renew();
        session
            .insert(CONTEXT_KEY, self)
            .map_err(|e| AppError::Session(e.to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may touch any record; engineers only their own.
    pub fn can_edit(&self, owner_id: i64) -> bool {
        self.is_admin() || self.user_id == owner_id
    }

    pub fn initial(&self) -> String {
        self.display_name
            .chars()
            .next()
            .unwrap_or('?')
            .to_uppercase()
            .to_string()
    }
}

pub fn set_flash(session: &Session, message: &str) {
    let _ = session.insert(FLASH_KEY, message);
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>(FLASH_KEY).unwrap_or(None);
    if flash.is_some() {
        session.remove(FLASH_KEY);
    }
    flash
}
