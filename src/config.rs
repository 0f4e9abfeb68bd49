//! Application configuration, read from the environment

use crate::{auth::SeedAccount, middleware::RateLimitConfig};
use anyhow::Context;
use std::time::Duration;
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub auth_db_path: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bind_addr: String,
    pub port: u16,
    pub default_admin: SeedAccount,
    /// Seeded as a STUDENT login when `SEED_DEMO_STUDENT` is true
    pub demo_student: Option<SeedAccount>,
    pub login_rate_limit: RateLimitConfig,
}

impl Config {
    /// Read the process environment. `.env` files are loaded by the binary
    /// before this runs.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset and empty values fall back
    /// to defaults; values that are set but unparsable are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = var("EDUTRACK_DB_PATH").unwrap_or_else(|| "edutrack.db".to_string());
        let auth_db_path =
            var("EDUTRACK_AUTH_DB_PATH").unwrap_or_else(|| "edutrack_auth.db".to_string());

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("⚠️  JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });

        let jwt_expiration_hours: i64 = parse_or(&var, "JWT_EXPIRATION_HOURS", 24)?;
        if jwt_expiration_hours <= 0 {
            anyhow::bail!("JWT_EXPIRATION_HOURS must be positive");
        }

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&var, "PORT", 8080)?;

        let defaults = SeedAccount::default_admin();
        let default_admin = SeedAccount {
            name: var("DEFAULT_ADMIN_NAME").unwrap_or(defaults.name),
            email: var("DEFAULT_ADMIN_EMAIL").unwrap_or(defaults.email),
            password: var("DEFAULT_ADMIN_PASSWORD").unwrap_or(defaults.password),
        };

        let demo_student = if parse_or(&var, "SEED_DEMO_STUDENT", false)? {
            let defaults = SeedAccount::demo_student();
            Some(SeedAccount {
                name: var("DEMO_STUDENT_NAME").unwrap_or(defaults.name),
                email: var("DEMO_STUDENT_EMAIL").unwrap_or(defaults.email),
                password: var("DEMO_STUDENT_PASSWORD").unwrap_or(defaults.password),
            })
        } else {
            None
        };

        let login_rate_limit = RateLimitConfig {
            max_requests: parse_or(&var, "LOGIN_RATE_LIMIT_PER_MINUTE", 20)?,
            window: Duration::from_secs(60),
            burst: parse_or(&var, "LOGIN_RATE_LIMIT_BURST", 5)?,
        };

        Ok(Self {
            db_path,
            auth_db_path,
            jwt_secret,
            jwt_expiration_hours,
            bind_addr,
            port,
            default_admin,
            demo_student,
            login_rate_limit,
        })
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
