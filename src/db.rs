use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::password;
use crate::config::AppConfig;
use crate::models::user::{self, NewUser, Role};

pub const MIGRATIONS: &str = include_str!("schema.sql");

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(8)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(MIGRATIONS).execute(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Provision the configured administrator when no users exist yet.
pub async fn seed_admin(pool: &PgPool, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if user::count(pool).await? > 0 {
        return Ok(());
    }
    let (Some(email), Some(pass)) = (&config.admin_email, &config.admin_password) else {
        log::warn!("No users exist and ADMIN_EMAIL/ADMIN_PASSWORD are not set; nobody can sign in");
        return Ok(());
    };

    let hash = password::hash_password(pass).map_err(|e| e.to_string())?;
    let id = user::create(
        pool,
        &NewUser {
            email: email.clone(),
            display_name: "Administrator".to_string(),
            password: hash,
            role: Role::Admin,
        },
    )
    .await?;
    log::info!("Seeded administrator {email} (id {id})");
    Ok(())
}
