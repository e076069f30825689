use std::env;
use std::str::FromStr;

use anyhow::{Context, bail};
use dotenvy::dotenv;
use strum_macros::{Display, EnumString};

use crate::core::attendance::{AttendancePolicy, DEFAULT_FULL_DAY_HOURS, DEFAULT_LATE_CUTOFF_HOUR};
use crate::core::leave::LeaveQuotas;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    Mysql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub store_backend: StoreBackend,
    /// Only read when the backend is MySQL.
    pub database_url: Option<String>,
    pub run_migrations: bool,

    pub api_prefix: String,
    pub rate_protected_per_min: u32,
    pub log_dir: String,

    pub attendance: AttendancePolicy,
    pub leave_quotas: LeaveQuotas,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => StoreBackend::from_str(raw.trim())
                .with_context(|| format!("STORE_BACKEND must be mysql or memory, got {raw:?}"))?,
            Err(_) => StoreBackend::Mysql,
        };
        let database_url = match store_backend {
            StoreBackend::Mysql => Some(required("DATABASE_URL")?),
            StoreBackend::Memory => env::var("DATABASE_URL").ok(),
        };

        let rate_protected_per_min = parsed_or("RATE_PROTECTED_PER_MIN", 1000u32)?;
        if rate_protected_per_min == 0 {
            bail!("RATE_PROTECTED_PER_MIN must be greater than 0");
        }

        let late_cutoff_hour = parsed_or("LATE_CUTOFF_HOUR", DEFAULT_LATE_CUTOFF_HOUR)?;
        if late_cutoff_hour > 23 {
            bail!("LATE_CUTOFF_HOUR must be between 0 and 23");
        }
        let full_day_hours = parsed_or("FULL_DAY_HOURS", DEFAULT_FULL_DAY_HOURS)?;
        if !(full_day_hours > 0.0 && full_day_hours <= 24.0) {
            bail!("FULL_DAY_HOURS must be within (0, 24]");
        }

        let defaults = LeaveQuotas::default();
        let leave_quotas = LeaveQuotas {
            sick: parsed_or("LEAVE_QUOTA_SICK", defaults.sick)?,
            casual: parsed_or("LEAVE_QUOTA_CASUAL", defaults.casual)?,
            vacation: parsed_or("LEAVE_QUOTA_VACATION", defaults.vacation)?,
            others: parsed_or("LEAVE_QUOTA_OTHERS", defaults.others)?,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            store_backend,
            database_url,
            run_migrations: parsed_or("RUN_MIGRATIONS", false)?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            rate_protected_per_min,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            attendance: AttendancePolicy {
                late_cutoff_hour,
                full_day_hours,
            },
            leave_quotas,
        })
    }

    /// Memory-backed config for tests and local runs.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            jwt_secret: jwt_secret.to_string(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            run_migrations: false,
            api_prefix: "/api".to_string(),
            rate_protected_per_min: 1000,
            log_dir: "logs".to_string(),
            attendance: AttendancePolicy::default(),
            leave_quotas: LeaveQuotas::default(),
        }
    }
}
