//! Askama template contexts for the server-rendered pages.

use actix_session::Session;
use askama::Template;

use crate::auth::csrf;
use crate::auth::session::{SessionContext, take_flash};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::allocation::{AllocationStatus, AllocationView, Site};
use crate::models::dashboard::{AdminDashboard, EngineerDashboard};
use crate::models::user::UserDisplay;

/// Common context shared by all signed-in pages.
pub struct PageContext {
    pub user: SessionContext,
    pub avatar_initial: String,
    pub org_name: String,
    pub csrf_token: String,
    pub flash: Option<String>,
    pub current_path: String,
}

impl PageContext {
    pub fn build(session: &Session, config: &AppConfig, current_path: &str) -> Result<Self, AppError> {
        let user = SessionContext::require(session)?;
        Ok(Self {
            avatar_initial: user.initial(),
            user,
            org_name: config.org_name.clone(),
            csrf_token: csrf::get_or_create_token(session),
            flash: take_flash(session),
            current_path: current_path.to_string(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub org_name: String,
    pub csrf_token: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub admin: AdminDashboard,
    pub engineer: EngineerDashboard,
}

#[derive(Template)]
#[template(path = "admin/allocations.html")]
pub struct AllocationsTemplate {
    pub ctx: PageContext,
    pub sites: Vec<Site>,
    pub engineers: Vec<UserDisplay>,
    pub allocations: Vec<AllocationView>,
}

impl AllocationsTemplate {
    pub fn next_status(&self, current: &str) -> Option<&'static str> {
        match AllocationStatus::parse(current)? {
            AllocationStatus::Allocated => Some(AllocationStatus::InProgress.as_str()),
            AllocationStatus::InProgress => Some(AllocationStatus::Completed.as_str()),
            AllocationStatus::Completed => None,
        }
    }
}
