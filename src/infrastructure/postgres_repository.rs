// Postgres repository implementation
//
// The pool connects lazily: an unreachable database degrades the service
// (reads come back empty, writes are dropped and logged upstream) instead
// of failing startup. The unique index on (scope_key, day) is what makes
// insert_if_absent a single atomic conditional write.
use crate::application::reading_repository::ReadingRepository;
use crate::domain::reading::{Pollutants, Reading, ReadingOrigin, Scope};
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

pub struct PostgresReadingRepository {
    pool: PgPool,
}

impl PostgresReadingRepository {
    pub fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)
            .context("invalid database URL")?;
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                id BIGSERIAL PRIMARY KEY,
                scope_key TEXT NOT NULL,
                day DATE NOT NULL,
                aqi INTEGER NOT NULL,
                pm25 DOUBLE PRECISION,
                pm10 DOUBLE PRECISION,
                o3 DOUBLE PRECISION,
                no2 DOUBLE PRECISION,
                co DOUBLE PRECISION,
                so2 DOUBLE PRECISION,
                origin TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create readings table")?;

        sqlx::query(
            r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_readings_scope_day
               ON readings (scope_key, day)"#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create scope/day index")?;

        info!("readings schema ready");
        Ok(())
    }
}

fn row_to_reading(row: &sqlx::postgres::PgRow) -> anyhow::Result<Reading> {
    let date: NaiveDate = row.try_get("day")?;
    let aqi: i32 = row.try_get("aqi")?;
    let origin: String = row.try_get("origin")?;

    let pollutants = Pollutants {
        pm25: row.try_get("pm25")?,
        pm10: row.try_get("pm10")?,
        o3: row.try_get("o3")?,
        no2: row.try_get("no2")?,
        co: row.try_get("co")?,
        so2: row.try_get("so2")?,
    };
    let pollutants = if pollutants == Pollutants::default() {
        None
    } else {
        Some(pollutants)
    };

    Ok(Reading::new(
        date,
        aqi,
        pollutants,
        ReadingOrigin::parse(&origin).unwrap_or(ReadingOrigin::StoredReal),
    ))
}

#[async_trait]
impl ReadingRepository for PostgresReadingRepository {
    async fn find(
        &self,
        scope: &Scope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<Reading>> {
        let rows = sqlx::query(
            r#"SELECT day, aqi, pm25, pm10, o3, no2, co, so2, origin
               FROM readings
               WHERE scope_key = $1 AND day BETWEEN $2 AND $3
               ORDER BY day"#,
        )
        .bind(scope.key())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .context("failed to query readings")?;

        rows.iter().map(row_to_reading).collect()
    }

    async fn insert_if_absent(&self, scope: &Scope, reading: &Reading) -> anyhow::Result<bool> {
        let p = reading.pollutants.clone().unwrap_or_default();
        let result = sqlx::query(
            r#"INSERT INTO readings (scope_key, day, aqi, pm25, pm10, o3, no2, co, so2, origin)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               ON CONFLICT (scope_key, day) DO NOTHING"#,
        )
        .bind(scope.key())
        .bind(reading.date)
        .bind(reading.aqi)
        .bind(p.pm25)
        .bind(p.pm10)
        .bind(p.o3)
        .bind(p.no2)
        .bind(p.co)
        .bind(p.so2)
        .bind(reading.origin.as_str())
        .execute(&self.pool)
        .await
        .context("failed to insert reading")?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_scope(&self, scope: &Scope) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"DELETE FROM readings WHERE scope_key = $1"#)
            .bind(scope.key())
            .execute(&self.pool)
            .await
            .context("failed to delete scope readings")?;
        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"DELETE FROM readings"#)
            .execute(&self.pool)
            .await
            .context("failed to clear readings")?;
        Ok(result.rows_affected())
    }
}
