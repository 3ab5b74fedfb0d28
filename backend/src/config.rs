//! Runtime configuration.
//!
//! `AppConfig` is assembled once in `main` from the process environment (after
//! loading an optional `.env` file) and handed to the services through
//! `web::Data`. Nothing reads the environment after startup.

use crate::error::ServiceError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const REQUIRED_HEADER: &str = "Unique Code (*)";

/// What to do when an already verified code is scanned again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReverifyPolicy {
    /// Refuse with a conflict; the first verification stays untouched.
    #[default]
    Reject,
    /// Answer success with the original verification details, write nothing.
    Idempotent,
    /// Replace timestamp and location with the latest scan.
    Overwrite,
}

impl FromStr for ReverifyPolicy {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ReverifyPolicy::Reject),
            "idempotent" => Ok(ReverifyPolicy::Idempotent),
            "overwrite" => Ok(ReverifyPolicy::Overwrite),
            other => Err(ServiceError::Internal(format!(
                "unknown REVERIFY_POLICY '{}'",
                other
            ))),
        }
    }
}

/// Bounds applied to one bulk upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestLimits {
    pub max_rows: usize,
    pub max_code_len: usize,
    pub parse_timeout: Duration,
    /// Size cap on the uploaded file, checked while spooling.
    pub max_upload_bytes: u64,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            max_code_len: 50,
            parse_timeout: Duration::from_secs(30),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub geo_lookup_url: Option<String>,
    pub geo_lookup_timeout: Duration,
    pub reverify_policy: ReverifyPolicy,
    pub coupon_link_prefix: Option<String>,
    pub admin_user: Option<(String, String)>,
    pub ingest: IngestLimits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            database_path: PathBuf::from("coupons.sqlite"),
            upload_dir: PathBuf::from("uploads"),
            jwt_secret: "dev-secret-change-me".to_string(),
            jwt_expires_in: Duration::from_secs(86_400),
            geo_lookup_url: Some("http://ip-api.com/json/".to_string()),
            geo_lookup_timeout: Duration::from_millis(2_000),
            reverify_policy: ReverifyPolicy::default(),
            coupon_link_prefix: None,
            admin_user: None,
            ingest: IngestLimits::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(host) = get("APP_HOST") {
            config.host = host;
        }
        if let Some(port) = get("APP_PORT") {
            config.port = parse_number("APP_PORT", &port)?;
        }
        if let Some(path) = get("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(dir) = get("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(secret) = get("JWT_SECRET") {
            config.jwt_secret = secret;
        } else {
            log::warn!("JWT_SECRET not set, using the development secret");
        }
        if let Some(secs) = get("JWT_EXPIRES_IN") {
            config.jwt_expires_in = Duration::from_secs(parse_number("JWT_EXPIRES_IN", &secs)?);
        }
        // An explicitly empty GEO_LOOKUP_URL turns lookups off.
        match lookup("GEO_LOOKUP_URL") {
            Some(url) if url.trim().is_empty() => config.geo_lookup_url = None,
            Some(url) => config.geo_lookup_url = Some(url),
            None => {}
        }
        if let Some(ms) = get("GEO_LOOKUP_TIMEOUT_MS") {
            config.geo_lookup_timeout =
                Duration::from_millis(parse_number("GEO_LOOKUP_TIMEOUT_MS", &ms)?);
        }
        if let Some(policy) = get("REVERIFY_POLICY") {
            config.reverify_policy = policy.parse()?;
        }
        config.coupon_link_prefix = get("COUPON_LINK_PREFIX");
        if let (Some(user), Some(password)) = (get("ADMIN_USER_NAME"), get("ADMIN_PASSWORD")) {
            config.admin_user = Some((user, password));
        }
        if let Some(rows) = get("INGEST_MAX_ROWS") {
            config.ingest.max_rows = parse_number("INGEST_MAX_ROWS", &rows)?;
        }
        if let Some(secs) = get("INGEST_TIMEOUT_SECS") {
            config.ingest.parse_timeout =
                Duration::from_secs(parse_number("INGEST_TIMEOUT_SECS", &secs)?);
        }

        if let Some(bytes) = get("INGEST_MAX_UPLOAD_BYTES") {
            config.ingest.max_upload_bytes = parse_number("INGEST_MAX_UPLOAD_BYTES", &bytes)?;
        }

        Ok(config)
    }

    pub fn sample_dir(&self) -> PathBuf {
        self.upload_dir.join("sample")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.upload_dir.join("Download_excel")
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ServiceError> {
    value
        .trim()
        .parse()
        .map_err(|_| ServiceError::Internal(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ServiceError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.ingest, IngestLimits::default());
        assert_eq!(config.reverify_policy, ReverifyPolicy::Reject);
        assert!(config.geo_lookup_url.is_some());
        assert!(config.admin_user.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("APP_PORT", "8088"),
            ("REVERIFY_POLICY", "Overwrite"),
            ("INGEST_MAX_ROWS", "25"),
            ("INGEST_TIMEOUT_SECS", "5"),
            ("INGEST_MAX_UPLOAD_BYTES", "2048"),
            ("GEO_LOOKUP_URL", ""),
            ("COUPON_LINK_PREFIX", "https://c.example/?code="),
            ("ADMIN_USER_NAME", "admin"),
            ("ADMIN_PASSWORD", "secret"),
        ])
        .unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.reverify_policy, ReverifyPolicy::Overwrite);
        assert_eq!(config.ingest.max_rows, 25);
        assert_eq!(config.ingest.parse_timeout, Duration::from_secs(5));
        assert_eq!(config.ingest.max_upload_bytes, 2048);
        assert_eq!(config.geo_lookup_url, None);
        assert_eq!(
            config.coupon_link_prefix.as_deref(),
            Some("https://c.example/?code=")
        );
        assert_eq!(
            config.admin_user,
            Some(("admin".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(config_from(&[("APP_PORT", "eighty")]).is_err());
        assert!(config_from(&[("REVERIFY_POLICY", "sometimes")]).is_err());
    }
}
