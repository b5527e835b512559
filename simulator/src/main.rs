mod robot_log;

use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use rand::Rng;
use reqwest::Client;
use robot_log::RobotLog;
use std::time::Duration;
use tracing::{error, info, warn};

const GENERATIONS: [&str; 3] = ["gen1", "gen2", "gen3"];
const BASE_LAT: f64 = 52.52;
const BASE_LNG: f64 = 13.405;

/// Posts synthetic robot session logs to the ingestor
#[derive(Debug, Parser)]
struct Args {
    /// Base URL of the ingestor
    #[arg(long, env = "INGESTOR_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Number of distinct robots
    #[arg(long, env = "ROBOTS", default_value_t = 20)]
    robots: usize,

    /// Log entries per request
    #[arg(long, env = "BATCH_SIZE", default_value_t = 50)]
    batch_size: usize,

    /// Pause between requests
    #[arg(long, env = "INTERVAL_MS", default_value_t = 1000)]
    interval_ms: u64,

    /// Stop after this many batches; runs until interrupted when unset
    #[arg(long, env = "BATCHES")]
    batches: Option<u64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting robot log simulator");
    info!(
        "Target: {}, Robots: {}, Batch size: {}, Interval: {}ms",
        args.url, args.robots, args.batch_size, args.interval_ms
    );

    let client = match Client::builder().timeout(Duration::from_secs(30)).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let endpoint = format!("{}/logs", args.url.trim_end_matches('/'));
    let mut rng = rand::thread_rng();
    let mut sent_batches = 0u64;
    let mut sent_logs = 0u64;

    loop {
        if args.batches.is_some_and(|max| sent_batches >= max) {
            break;
        }

        let batch: Vec<RobotLog> = (0..args.batch_size)
            .map(|_| generate_log(&mut rng, args.robots.max(1)))
            .collect();

        match client.post(&endpoint).json(&batch).send().await {
            Ok(response) if response.status().is_success() => {
                sent_logs += batch.len() as u64;
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("Batch rejected with {}: {}", status, body);
            }
            Err(e) => {
                warn!("Failed to post batch: {}", e);
            }
        }

        sent_batches += 1;
        if sent_batches % 10 == 0 {
            info!("Posted {} batches, {} logs accepted", sent_batches, sent_logs);
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(args.interval_ms)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    info!("Done: {} batches, {} logs accepted", sent_batches, sent_logs);
}

fn generate_log(rng: &mut impl Rng, robots: usize) -> RobotLog {
    let robot_index = rng.gen_range(0..robots);
    let end_time = Utc::now();

    let duration_ms = if rng.gen_bool(0.01) {
        -rng.gen_range(1..5_000i64) // 1% clock skew
    } else {
        rng.gen_range(500..120_000)
    };

    RobotLog {
        robot: format!("robot-{}", robot_index),
        device_generation: GENERATIONS[robot_index % GENERATIONS.len()].to_string(),
        start_time: end_time - ChronoDuration::milliseconds(duration_ms),
        end_time,
        lat: BASE_LAT + rng.gen_range(-0.05..0.05),
        lng: BASE_LNG + rng.gen_range(-0.05..0.05),
    }
}
