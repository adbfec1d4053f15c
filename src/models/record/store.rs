use chrono::Local;
use sqlx::PgPool;
use sqlx::types::Json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::types::*;
use crate::errors::AppError;

/// Backend record store. Writes are last-writer-wins; `update` stamps
/// `updated_at` but performs no version check.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn insert(&self, record: &NewFormRecord) -> Result<i64, AppError>;

    /// Update in place. `AppError::NotFound` when no record of that form type
    /// has `id`.
    async fn update(&self, id: i64, record: &NewFormRecord) -> Result<(), AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<FormRecord>, AppError>;

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<RecordSummary>, AppError>;
}

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_RECORD: &str = "\
    SELECT id, form_type, status, owner_id, site_name, region, survey_date, \
           site_id, site_type, address, gps_coordinates, building_photo, data, \
           created_at::TEXT AS created_at, updated_at::TEXT AS updated_at \
    FROM survey_records";

impl RecordStore for PgRecordStore {
    async fn insert(&self, record: &NewFormRecord) -> Result<i64, AppError> {
        let c = &record.columns;
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO survey_records \
                (form_type, status, owner_id, site_name, region, survey_date, site_id, \
                 site_type, address, gps_coordinates, building_photo, data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING id",
        )
        .bind(record.form_type.as_str())
        .bind(record.status.as_str())
        .bind(record.owner_id)
        .bind(&c.site_name)
        .bind(&c.region)
        .bind(&c.survey_date)
        .bind(&c.site_id)
        .bind(&c.site_type)
        .bind(&c.address)
        .bind(&c.gps_coordinates)
        .bind(&c.building_photo)
        .bind(Json(&record.data))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn update(&self, id: i64, record: &NewFormRecord) -> Result<(), AppError> {
        let c = &record.columns;
        let result = sqlx::query(
            "UPDATE survey_records SET \
                status = $3, site_name = $4, region = $5, survey_date = $6, site_id = $7, \
                site_type = $8, address = $9, gps_coordinates = $10, building_photo = $11, \
                data = $12, updated_at = NOW() \
             WHERE id = $1 AND form_type = $2",
        )
        .bind(id)
        .bind(record.form_type.as_str())
        .bind(record.status.as_str())
        .bind(&c.site_name)
        .bind(&c.region)
        .bind(&c.survey_date)
        .bind(&c.site_id)
        .bind(&c.site_type)
        .bind(&c.address)
        .bind(&c.gps_coordinates)
        .bind(&c.building_photo)
        .bind(Json(&record.data))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FormRecord>, AppError> {
        let record = sqlx::query_as::<_, FormRecord>(&format!("{SELECT_RECORD} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<RecordSummary>, AppError> {
        let site_pattern = filter.site_pattern();
        let rows = sqlx::query_as::<_, RecordSummary>(
            "SELECT r.id, r.form_type, r.status, r.owner_id, \
                    COALESCE(u.display_name, '') AS owner_name, \
                    r.site_name, r.region, r.survey_date, r.updated_at::TEXT AS updated_at \
             FROM survey_records r \
             LEFT JOIN users u ON u.id = r.owner_id \
             WHERE ($1::TEXT IS NULL OR r.form_type = $1) \
               AND ($2::TEXT IS NULL OR r.status = $2) \
               AND ($3::TEXT IS NULL OR r.site_name ILIKE $3 ESCAPE '\\') \
               AND ($4::BIGINT IS NULL OR r.owner_id = $4) \
             ORDER BY r.updated_at DESC \
             LIMIT $5",
        )
        .bind(filter.form_type.map(|k| k.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(site_pattern)
        .bind(filter.owner_id)
        .bind(filter.limit.unwrap_or(200).clamp(1, 1000))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// In-process store used by tests. Counts write calls and can be switched
/// into a failing mode.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<FormRecord>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of insert/update calls that reached the store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn apply_write(target: &mut FormRecord, record: &NewFormRecord) {
    let c = &record.columns;
    target.status = record.status.as_str().to_string();
    target.site_name = c.site_name.clone();
    target.region = c.region.clone();
    target.survey_date = c.survey_date.clone();
    target.site_id = c.site_id.clone();
    target.site_type = c.site_type.clone();
    target.address = c.address.clone();
    target.gps_coordinates = c.gps_coordinates.clone();
    target.building_photo = c.building_photo.clone();
    target.data = Json(record.data.clone());
    target.updated_at = now();
}

impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: &NewFormRecord) -> Result<i64, AppError> {
        self.check()?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let stamp = now();
        let mut stored = FormRecord {
            id,
            form_type: record.form_type.as_str().to_string(),
            status: String::new(),
            owner_id: record.owner_id,
            site_name: String::new(),
            region: String::new(),
            survey_date: String::new(),
            site_id: String::new(),
            site_type: String::new(),
            address: String::new(),
            gps_coordinates: String::new(),
            building_photo: String::new(),
            data: Json(serde_json::Value::Null),
            created_at: stamp.clone(),
            updated_at: stamp,
        };
        apply_write(&mut stored, record);
        records.push(stored);
        Ok(id)
    }

    async fn update(&self, id: i64, record: &NewFormRecord) -> Result<(), AppError> {
        self.check()?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let target = records
            .iter_mut()
            .find(|r| r.id == id && r.form_type == record.form_type.as_str())
            .ok_or(AppError::NotFound)?;
        apply_write(target, record);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FormRecord>, AppError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<RecordSummary>, AppError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<RecordSummary> = records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| RecordSummary {
                id: r.id,
                form_type: r.form_type.clone(),
                status: r.status.clone(),
                owner_id: r.owner_id,
                owner_name: String::new(),
                site_name: r.site_name.clone(),
                region: r.region.clone(),
                survey_date: r.survey_date.clone(),
                updated_at: r.updated_at.clone(),
            })
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows)
    }
}
