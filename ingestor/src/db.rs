use crate::config::Config;
use crate::errors::Result;
use crate::model::{LogEntry, LogFilter, NewLogEntry};
use crate::store::LogStore;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

pub async fn make_pool(config: &Config) -> Result<PgPool> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(config.connect_options())
        .await?;

    info!("Database connection established");
    Ok(pool)
}

/// `LogStore` backed by the `logs` table in Postgres
#[derive(Debug, Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn insert_batch(&self, batch: &[NewLogEntry]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let robots: Vec<&str> = batch.iter().map(|l| l.robot.as_str()).collect();
        let generations: Vec<&str> = batch.iter().map(|l| l.device_generation.as_str()).collect();
        let start_times: Vec<chrono::DateTime<chrono::Utc>> =
            batch.iter().map(|l| l.start_time).collect();
        let end_times: Vec<chrono::DateTime<chrono::Utc>> =
            batch.iter().map(|l| l.end_time).collect();
        let durations: Vec<i64> = batch.iter().map(|l| l.duration).collect();
        let lats: Vec<f64> = batch.iter().map(|l| l.lat).collect();
        let lngs: Vec<f64> = batch.iter().map(|l| l.lng).collect();

        let query = r#"
            INSERT INTO logs (robot, "deviceGeneration", "startTime", "endTime", duration, lat, lng)
            SELECT * FROM UNNEST($1::text[], $2::text[], $3::timestamptz[], $4::timestamptz[], $5::int8[], $6::float8[], $7::float8[])
            "#;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(query)
            .bind(&robots)
            .bind(&generations)
            .bind(&start_times)
            .bind(&end_times)
            .bind(&durations)
            .bind(&lats)
            .bind(&lngs)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Inserted {} log rows", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn query(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let query = select_sql(filter);

        let mut query_builder = sqlx::query_as::<_, LogEntry>(&query);

        // Bind order must follow the placeholder order in select_sql
        if let Some(min_duration) = filter.min_duration {
            query_builder = query_builder.bind(min_duration);
        }
        if let Some(generation) = &filter.device_generation {
            query_builder = query_builder.bind(generation);
        }
        if let Some(from) = filter.from {
            query_builder = query_builder.bind(from);
        }
        if let Some(to) = filter.to {
            query_builder = query_builder.bind(to);
        }

        let logs = query_builder
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(logs)
    }
}

/// Builds the parameterized select for a filter; values are bound separately
pub fn select_sql(filter: &LogFilter) -> String {
    let mut conditions = Vec::new();
    let mut next = 1;
    let mut placeholder = || {
        let p = format!("${}", next);
        next += 1;
        p
    };

    if filter.min_duration.is_some() {
        conditions.push(format!("duration >= {}", placeholder()));
    }
    if filter.device_generation.is_some() {
        conditions.push(format!("\"deviceGeneration\" = {}", placeholder()));
    }
    if filter.from.is_some() {
        conditions.push(format!("\"startTime\" >= {}", placeholder()));
    }
    if filter.to.is_some() {
        conditions.push(format!("\"endTime\" <= {}", placeholder()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {} ", conditions.join(" AND "))
    };

    let limit = placeholder();
    let offset = placeholder();

    format!(
        "SELECT id, robot, \"deviceGeneration\", \"startTime\", \"endTime\", duration, lat, lng \
         FROM logs {}ORDER BY id ASC LIMIT {} OFFSET {}",
        where_clause, limit, offset
    )
}
