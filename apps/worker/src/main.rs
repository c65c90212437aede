//! Tollgate anomaly scan worker.
//!
//! Runs the repeated-violation scan against the shared Redis state on a fixed
//! interval and logs an analytics summary after each pass.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tollgate_application::{
    AnalyticsAggregator, AnomalyDetector, DEFAULT_ANOMALY_THRESHOLD,
    DEFAULT_ANOMALY_WINDOW_SECONDS, SystemClock,
};
use tollgate_core::{AppError, AppResult};
use tollgate_infrastructure::{RedisAnalyticsStore, RedisEventBus, RedisViolationLog};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    redis_url: String,
    key_prefix: String,
    scan_interval_seconds: u64,
    anomaly_threshold: u64,
    anomaly_window_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;

    let violation_log = Arc::new(RedisViolationLog::new(
        client.clone(),
        config.key_prefix.clone(),
    ));
    let analytics_store = Arc::new(RedisAnalyticsStore::new(
        client.clone(),
        config.key_prefix.clone(),
    ));
    let event_bus = Arc::new(RedisEventBus::new(client, config.key_prefix.clone()));

    let detector = AnomalyDetector::new(violation_log.clone(), event_bus, Arc::new(SystemClock))
        .with_thresholds(config.anomaly_threshold, config.anomaly_window_seconds)?;
    let aggregator = AnalyticsAggregator::new(analytics_store, violation_log);

    info!(
        key_prefix = %config.key_prefix,
        scan_interval_seconds = config.scan_interval_seconds,
        anomaly_threshold = config.anomaly_threshold,
        anomaly_window_seconds = config.anomaly_window_seconds,
        "tollgate-worker started"
    );

    loop {
        run_scan(&detector, &aggregator).await;
        tokio::time::sleep(Duration::from_secs(config.scan_interval_seconds)).await;
    }
}

async fn run_scan(detector: &AnomalyDetector, aggregator: &AnalyticsAggregator) {
    match detector.detect_suspicious_activity().await {
        Ok(flagged) if flagged.is_empty() => {}
        Ok(flagged) => {
            warn!(
                flagged_count = flagged.len(),
                sources = ?flagged,
                "sources flagged for repeated violations"
            );
        }
        Err(scan_error) => log_failure(&scan_error, "anomaly scan failed"),
    }

    match aggregator.snapshot().await {
        Ok(snapshot) => {
            info!(
                total_requests = snapshot.total_requests,
                blocked_requests = snapshot.blocked_requests,
                unique_sources = snapshot.unique_sources,
                block_rate = snapshot.block_rate,
                "admission analytics"
            );
        }
        Err(snapshot_error) => log_failure(&snapshot_error, "analytics snapshot failed"),
    }
}

fn log_failure(failure: &AppError, message: &str) {
    if failure.is_store_failure() {
        warn!(error = %failure, "{message}; will retry next cycle");
    } else {
        error!(error = %failure, "{message}");
    }
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let redis_url = required_env("REDIS_URL")?;
        let key_prefix = env::var("REDIS_KEY_PREFIX")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "tollgate".to_owned());
        let scan_interval_seconds = parse_env_u64("ANOMALY_SCAN_INTERVAL_SECONDS", 60)?;
        let anomaly_threshold = parse_env_u64("ANOMALY_THRESHOLD", DEFAULT_ANOMALY_THRESHOLD)?;
        let anomaly_window_seconds =
            parse_env_u64("ANOMALY_WINDOW_SECONDS", DEFAULT_ANOMALY_WINDOW_SECONDS)?;

        if scan_interval_seconds == 0 {
            return Err(AppError::Validation(
                "ANOMALY_SCAN_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            redis_url,
            key_prefix,
            scan_interval_seconds,
            anomaly_threshold,
            anomaly_window_seconds,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
