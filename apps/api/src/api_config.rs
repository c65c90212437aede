use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use ipnet::IpNet;
use tollgate_application::{
    CategoryLimits, DEFAULT_ANOMALY_THRESHOLD, DEFAULT_ANOMALY_WINDOW_SECONDS,
    DEFAULT_STORE_TIMEOUT, PolicyTable, TierLimits,
};
use tollgate_core::AppError;
use tollgate_domain::EndpointCategory;
use tracing_subscriber::EnvFilter;

const DEFAULT_MONITORING_CHANNEL_CAPACITY: usize = 1024;

/// Backing store for counters, the violation log and analytics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionStoreConfig {
    Memory,
    Redis { url: String, key_prefix: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub upstream_base_url: String,
    pub admission_store: AdmissionStoreConfig,
    pub store_timeout: Duration,
    pub bypass_networks: Vec<IpNet>,
    pub identity_token_secret: String,
    pub admin_token: Option<String>,
    pub monitoring_channel_capacity: usize,
    pub trust_forwarded_for: bool,
    pub anomaly_threshold: u64,
    pub anomaly_window_seconds: u64,
    pub policy_table: PolicyTable,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let upstream_base_url = required_non_empty(&lookup, "UPSTREAM_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();

        let admission_store = match lookup("ADMISSION_STORE")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => AdmissionStoreConfig::Memory,
            "redis" => AdmissionStoreConfig::Redis {
                url: required_non_empty(&lookup, "REDIS_URL")?,
                key_prefix: lookup("REDIS_KEY_PREFIX")
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| "tollgate".to_owned()),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "ADMISSION_STORE must be either 'memory' or 'redis', got '{other}'"
                )));
            }
        };

        let store_timeout = optional_number::<u64>(&lookup, "ADMISSION_STORE_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_STORE_TIMEOUT);

        let bypass_networks = lookup("ADMISSION_BYPASS_CIDRS")
            .map(|value| parse_networks(&value))
            .transpose()?
            .unwrap_or_default();

        let identity_token_secret = required_non_empty(&lookup, "IDENTITY_TOKEN_SECRET")?;
        if identity_token_secret.len() < 32 {
            return Err(AppError::Validation(
                "IDENTITY_TOKEN_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let admin_token = lookup("ADMIN_TOKEN").filter(|value| !value.trim().is_empty());
        let monitoring_channel_capacity =
            optional_number::<usize>(&lookup, "MONITORING_CHANNEL_CAPACITY")?
                .unwrap_or(DEFAULT_MONITORING_CHANNEL_CAPACITY);
        let trust_forwarded_for = lookup("TRUST_FORWARDED_FOR")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");
        let anomaly_threshold = optional_number::<u64>(&lookup, "ANOMALY_THRESHOLD")?
            .unwrap_or(DEFAULT_ANOMALY_THRESHOLD);
        let anomaly_window_seconds = optional_number::<u64>(&lookup, "ANOMALY_WINDOW_SECONDS")?
            .unwrap_or(DEFAULT_ANOMALY_WINDOW_SECONDS);

        let policy_table = load_policy_table(&lookup)?;
        policy_table.validate()?;

        Ok(Self {
            api_host,
            api_port,
            upstream_base_url,
            admission_store,
            store_timeout,
            bypass_networks,
            identity_token_secret,
            admin_token,
            monitoring_channel_capacity,
            trust_forwarded_for,
            anomaly_threshold,
            anomaly_window_seconds,
            policy_table,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_policy_table(lookup: &impl Fn(&str) -> Option<String>) -> Result<PolicyTable, AppError> {
    let defaults = PolicyTable::default();
    let mut table = defaults.clone();

    for (category, prefix) in [
        (EndpointCategory::Search, "RATE_LIMIT_SEARCH"),
        (EndpointCategory::DetailRead, "RATE_LIMIT_DETAIL"),
        (EndpointCategory::WriteAction, "RATE_LIMIT_WRITE"),
    ] {
        let base = defaults.limits_for(category);
        let number = |suffix: &str| optional_number::<u32>(lookup, &format!("{prefix}_{suffix}"));

        let limits = CategoryLimits {
            window_seconds: optional_number::<u64>(lookup, &format!("{prefix}_WINDOW_SECONDS"))?
                .unwrap_or(base.window_seconds),
            tiers: TierLimits {
                anonymous: number("ANONYMOUS")?.unwrap_or(base.tiers.anonymous),
                authenticated: number("AUTHENTICATED")?.unwrap_or(base.tiers.authenticated),
                premium: number("PREMIUM")?.unwrap_or(base.tiers.premium),
            },
            counting_mode: base.counting_mode,
        };
        table = table.with_category(category, limits);
    }

    Ok(table)
}

fn parse_networks(value: &str) -> Result<Vec<IpNet>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<IpNet>()
                .or_else(|_| entry.parse::<IpAddr>().map(IpNet::from))
                .map_err(|error| {
                    AppError::Validation(format!(
                        "invalid ADMISSION_BYPASS_CIDRS entry '{entry}': {error}"
                    ))
                })
        })
        .collect()
}

fn optional_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
