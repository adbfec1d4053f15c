use sqlx::PgPool;

use super::types::*;
use crate::errors::AppError;

const SELECT_ALLOCATION: &str = "\
    SELECT a.id, a.site_id, s.name AS site_name, s.region, \
           a.engineer_id, u.display_name AS engineer_name, \
           a.status, a.due_date, a.notes, a.updated_at::TEXT AS updated_at \
    FROM allocations a \
    JOIN sites s ON s.id = a.site_id \
    JOIN users u ON u.id = a.engineer_id";

pub async fn create_site(pool: &PgPool, site: &NewSite) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO sites (name, region, site_code, address, gps_coordinates) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(site.name.trim())
    .bind(site.region.trim())
    .bind(site.site_code.trim())
    .bind(site.address.trim())
    .bind(site.gps_coordinates.trim())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn site_name_exists(pool: &PgPool, name: &str) -> Result<bool, AppError> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM sites WHERE LOWER(name) = LOWER($1))")
        .bind(name.trim())
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn find_sites(pool: &PgPool) -> Result<Vec<Site>, AppError> {
    let sites = sqlx::query_as::<_, Site>(
        "SELECT id, name, region, site_code, address, gps_coordinates, created_at::TEXT AS created_at \
         FROM sites ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(sites)
}

/// Create an allocation. `NotFound` when the site does not exist or the
/// user is not an engineer.
pub async fn create(pool: &PgPool, new: &NewAllocation, allocated_by: i64) -> Result<i64, AppError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "INSERT INTO allocations (site_id, engineer_id, status, due_date, notes, allocated_by) \
         SELECT s.id, u.id, 'allocated', $3, $4, $5 \
         FROM sites s, users u \
         WHERE s.id = $1 AND u.id = $2 AND u.role = 'engineer' \
         RETURNING id",
    )
    .bind(new.site_id)
    .bind(new.engineer_id)
    .bind(new.due_date.trim())
    .bind(new.notes.trim())
    .bind(allocated_by)
    .fetch_optional(pool)
    .await?;
    row.map(|r| r.0).ok_or(AppError::NotFound)
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<AllocationView>, AppError> {
    let rows = sqlx::query_as::<_, AllocationView>(&format!(
        "{SELECT_ALLOCATION} ORDER BY a.updated_at DESC, a.id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_for_engineer(pool: &PgPool, engineer_id: i64) -> Result<Vec<AllocationView>, AppError> {
    let rows = sqlx::query_as::<_, AllocationView>(&format!(
        "{SELECT_ALLOCATION} WHERE a.engineer_id = $1 \
         ORDER BY CASE a.status WHEN 'in_progress' THEN 0 WHEN 'allocated' THEN 1 ELSE 2 END, \
                  a.due_date, a.id"
    ))
    .bind(engineer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<AllocationView>, AppError> {
    let row = sqlx::query_as::<_, AllocationView>(&format!("{SELECT_ALLOCATION} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Move an allocation to `next`, enforcing forward-only transitions.
pub async fn update_status(pool: &PgPool, id: i64, next: AllocationStatus) -> Result<(), AppError> {
    let current = find_by_id(pool, id).await?.ok_or(AppError::NotFound)?;
    let from = AllocationStatus::parse(&current.status).ok_or(AppError::NotFound)?;
    if !from.can_move_to(next) {
        return Err(AppError::Validation(vec![format!(
            "Cannot move allocation from {} to {}",
            from.label(),
            next.label()
        )]));
    }

    sqlx::query("UPDATE allocations SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(next.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM allocations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn count_by_status(pool: &PgPool, engineer_id: Option<i64>) -> Result<StatusCounts, AppError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM allocations \
         WHERE ($1::BIGINT IS NULL OR engineer_id = $1) \
         GROUP BY status",
    )
    .bind(engineer_id)
    .fetch_all(pool)
    .await?;

    let mut counts = StatusCounts::default();
    for (status, n) in rows {
        match AllocationStatus::parse(&status) {
            Some(AllocationStatus::Allocated) => counts.allocated = n,
            Some(AllocationStatus::InProgress) => counts.in_progress = n,
            Some(AllocationStatus::Completed) => counts.completed = n,
            None => log::warn!("Unknown allocation status '{status}'"),
        }
    }
    Ok(counts)
}
