//! Postgres-backed region store.
//!
//! ## Schema
//!
//! See `migrations/`. The `regions` table carries a partial unique index on
//! `code WHERE NOT is_deleted`, which is what actually guarantees one live
//! region per code when concurrent creates race past the service-side check.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any other | `Query` |
//! | PoolClosed / PoolTimedOut / Io / Tls | N/A | `Unavailable` |
//! | Other | N/A | `Query` |

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use regionhub_core::RegionId;
use regionhub_region::{Region, RegionStatus};

use super::r#trait::{page_offset, RegionStore, StoreError};

/// Embedded migrations for the `regions` schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Postgres-backed region store.
///
/// Uses the SQLx connection pool; every method is a single statement with no
/// transaction spanning calls.
#[derive(Debug, Clone)]
pub struct PostgresRegionStore {
    pool: PgPool,
}

impl PostgresRegionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RegionStore for PostgresRegionStore {
    #[instrument(skip(self), fields(region_id = %id), err)]
    async fn get_by_id(&self, id: RegionId) -> Result<Option<Region>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, is_deleted
            FROM regions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_by_id", e))?;

        row.map(|r| RegionRow::from_pg_row(&r).map(Region::from))
            .transpose()
            .map_err(|e| map_sqlx_error("get_by_id", e))
    }

    #[instrument(skip(self), err)]
    async fn get_by_code(&self, code: &str) -> Result<Option<Region>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, is_deleted
            FROM regions
            WHERE code = $1 AND NOT is_deleted
            LIMIT 1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_by_code", e))?;

        row.map(|r| RegionRow::from_pg_row(&r).map(Region::from))
            .transpose()
            .map_err(|e| map_sqlx_error("get_by_code", e))
    }

    #[instrument(skip(self), err)]
    async fn list_paged(&self, page_size: u32, page: u32) -> Result<Vec<Region>, StoreError> {
        let offset = i64::try_from(page_offset(page_size, page)).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT id, code, name, is_deleted
            FROM regions
            WHERE NOT is_deleted
            ORDER BY name ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_paged", e))?;

        let mut regions = Vec::with_capacity(rows.len());
        for row in rows {
            let parsed = RegionRow::from_pg_row(&row).map_err(|e| map_sqlx_error("list_paged", e))?;
            regions.push(parsed.into());
        }
        Ok(regions)
    }

    #[instrument(skip(self), err)]
    async fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM regions WHERE NOT is_deleted")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;

        Ok(u64::try_from(total).unwrap_or(0))
    }

    #[instrument(skip(self, region), fields(region_id = %region.id_typed(), code = region.code()), err)]
    async fn insert(&self, region: &Region) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO regions (id, code, name, is_deleted)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(region.id_typed().as_uuid())
        .bind(region.code())
        .bind(region.name())
        .bind(region.is_deleted())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(())
    }

    #[instrument(skip(self, region), fields(region_id = %region.id_typed()), err)]
    async fn update(&self, region: &Region) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE regions
            SET code = $2,
                name = $3,
                is_deleted = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(region.id_typed().as_uuid())
        .bind(region.code())
        .bind(region.name())
        .bind(region.is_deleted())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound(region.id_typed().to_string()));
        }
        Ok(())
    }
}

struct RegionRow {
    id: Uuid,
    code: String,
    name: String,
    is_deleted: bool,
}

impl RegionRow {
    fn from_pg_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            is_deleted: row.try_get("is_deleted")?,
        })
    }
}

impl From<RegionRow> for Region {
    fn from(row: RegionRow) -> Self {
        let status = if row.is_deleted {
            RegionStatus::Deleted
        } else {
            RegionStatus::Active
        };
        Region::rehydrate(RegionId::from_uuid(row.id), row.code, row.name, status)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Query(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {}: {}", operation, e)),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {}: {}", operation, e)),
        _ => StoreError::Query(format!("sqlx error in {}: {}", operation, err)),
    }
}
