#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use robot_log_ingestor::errors::{Error, Result};
use robot_log_ingestor::model::{LogEntry, LogFilter, NewLogEntry};
use robot_log_ingestor::store::LogStore;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tower::ServiceExt;

/// In-memory stand-in for Postgres that can simulate an outage
#[derive(Default)]
pub struct MemoryLogStore {
    rows: Mutex<Vec<LogEntry>>,
    down: AtomicBool,
}

impl MemoryLogStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert_batch(&self, entries: &[NewLogEntry]) -> Result<u64> {
        self.check_up()?;

        let mut rows = self.rows.lock().unwrap();
        for entry in entries {
            let id = rows.len() as i64 + 1;
            rows.push(LogEntry {
                id,
                robot: entry.robot.clone(),
                device_generation: entry.device_generation.clone(),
                start_time: entry.start_time,
                end_time: entry.end_time,
                duration: entry.duration,
                lat: entry.lat,
                lng: entry.lng,
            });
        }
        Ok(entries.len() as u64)
    }

    async fn query(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        self.check_up()?;

        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|row| filter.matches(row))
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

pub async fn post_logs(app: &Router, body: &Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri("/logs")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get_logs(app: &Router, query: &str) -> (StatusCode, Vec<u8>) {
    let uri = if query.is_empty() {
        "/logs".to_string()
    } else {
        format!("/logs?{}", query)
    };
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub fn entry(robot: &str, generation: &str, start: &str, end: &str) -> Value {
    serde_json::json!({
        "robot": robot,
        "deviceGeneration": generation,
        "startTime": start,
        "endTime": end,
        "lat": 48.8566,
        "lng": 2.3522
    })
}
