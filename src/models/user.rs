use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Account role, fixed at provisioning time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Engineer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Engineer => "engineer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "engineer" => Some(Role::Engineer),
            _ => None,
        }
    }
}

/// Internal user row for authentication, includes the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: String,
}

/// Safe version for templates and JSON, no password hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserDisplay {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub created_at: String,
}

pub struct NewUser {
    pub email: String,
    pub display_name: String,
    /// Already hashed.
    pub password: String,
    pub role: Role,
}

/// Body of the admin "add engineer" request.
#[derive(Debug, Deserialize)]
pub struct EngineerForm {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, display_name, password, role FROM users WHERE LOWER(email) = LOWER($1)",
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await
}

pub async fn create(pool: &PgPool, new: &NewUser) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO users (email, display_name, password, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(new.email.trim())
    .bind(new.display_name.trim())
    .bind(&new.password)
    .bind(new.role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users").fetch_one(pool).await?;
    Ok(row.0)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
        .bind(email.trim())
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn find_engineers(pool: &PgPool) -> Result<Vec<UserDisplay>, sqlx::Error> {
    sqlx::query_as::<_, UserDisplay>(
        "SELECT id, email, display_name, role, created_at::TEXT AS created_at \
         FROM users WHERE role = 'engineer' ORDER BY display_name",
    )
    .fetch_all(pool)
    .await
}
