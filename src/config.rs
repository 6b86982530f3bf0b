use std::env;

use crate::error::{AnalyticsError, AnalyticsResult};

pub struct EnvVars;

impl EnvVars {
    pub fn mongo_db_url() -> AnalyticsResult<String> {
        env::var("MONGO_DB_URL")
            .map_err(|_| AnalyticsError::Config("MONGO_DB_URL not set".to_string()))
    }

    pub fn mongo_db_name() -> String {
        env::var("MONGO_DB_NAME").unwrap_or_else(|_| Constants::DB_NAME.to_string())
    }

    pub fn jwt_secret() -> AnalyticsResult<String> {
        env::var("JWT_SECRET")
            .map_err(|_| AnalyticsError::Config("JWT_SECRET not set".to_string()))
    }

    pub fn port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Constants::DEFAULT_PORT)
    }
}

pub struct Constants;

impl Constants {
    pub const DB_NAME: &'static str = "complaint-management";

    pub const COMPLAINTS_COLLECTION: &'static str = "complaints";

    pub const USERS_COLLECTION: &'static str = "users";

    pub const DEFAULT_PORT: u16 = 5000;

    pub const DEFAULT_LOG_FILTER: &'static str = "info,tower_http=info";

    pub const ADMIN_ROLE: &'static str = "admin";

    pub const DEFAULT_FREQUENT_ISSUES_LIMIT: usize = 10;
    pub const MAX_FREQUENT_ISSUES_LIMIT: usize = 100;

    /// Minimum group size for a (category, title) pair to count as frequent.
    pub const FREQUENT_ISSUE_THRESHOLD: i64 = 2;

    pub const DEFAULT_WEEKS: i64 = 12;
    pub const MAX_WEEKS: i64 = 520;

    pub const MIN_YEAR: i32 = 1970;
    pub const MAX_YEAR: i32 = 9999;

    pub const TOP_REPORTERS: usize = 10;

    pub const MILLIS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;
}

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongo_db_url: String,
    pub mongo_db_name: String,
    pub jwt_secret: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> AnalyticsResult<Self> {
        Ok(Self {
            mongo_db_url: EnvVars::mongo_db_url()?,
            mongo_db_name: EnvVars::mongo_db_name(),
            jwt_secret: EnvVars::jwt_secret()?,
            port: EnvVars::port(),
        })
    }
}
