use serde::Serialize;
use sqlx::PgPool;

use crate::models::allocation::{self, AllocationView, StatusCounts};
use crate::models::record::{RecordFilter, RecordStatus, RecordStore, RecordSummary};

// ---------- Types ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordCounts {
    pub draft: i64,
    pub submitted: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminDashboard {
    pub records: RecordCounts,
    pub allocations: StatusCounts,
    pub engineer_count: i64,
    pub recent_submissions: Vec<RecordSummary>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineerDashboard {
    pub allocations: Vec<AllocationView>,
    pub records: Vec<RecordSummary>,
}

// ---------- Queries ----------
// Dashboard panels degrade to empty rather than failing the whole page.

pub async fn record_counts(pool: &PgPool) -> RecordCounts {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM survey_records GROUP BY status")
            .fetch_all(pool)
            .await
            .unwrap_or_else(|e| {
                log::error!("Failed to count records: {e}");
                Vec::new()
            });

    let mut counts = RecordCounts::default();
    for (status, n) in rows {
        match RecordStatus::parse(&status) {
            Some(RecordStatus::Draft) => counts.draft = n,
            Some(RecordStatus::Submitted) => counts.submitted = n,
            None => {}
        }
    }
    counts
}

pub async fn engineer_count(pool: &PgPool) -> i64 {
    sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users WHERE role = 'engineer'")
        .fetch_one(pool)
        .await
        .map(|r| r.0)
        .unwrap_or(0)
}

pub async fn load_admin(pool: &PgPool, store: &impl RecordStore) -> AdminDashboard {
    let filter = RecordFilter {
        status: Some(RecordStatus::Submitted),
        limit: Some(10),
        ..RecordFilter::default()
    };
    AdminDashboard {
        records: record_counts(pool).await,
        allocations: allocation::count_by_status(pool, None).await.unwrap_or_default(),
        engineer_count: engineer_count(pool).await,
        recent_submissions: store.list(&filter).await.unwrap_or_default(),
    }
}

pub async fn load_engineer(pool: &PgPool, store: &impl RecordStore, user_id: i64) -> EngineerDashboard {
    let filter = RecordFilter {
        owner_id: Some(user_id),
        limit: Some(20),
        ..RecordFilter::default()
    };
    EngineerDashboard {
        allocations: allocation::find_for_engineer(pool, user_id).await.unwrap_or_default(),
        records: store.list(&filter).await.unwrap_or_default(),
    }
}
