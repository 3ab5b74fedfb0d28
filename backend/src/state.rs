//! Shared application state handed to every handler as `web::Data<AppState>`.

use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::geo::GeoLocator;
use crate::store::SqliteStore;
use std::sync::Arc;

/// Cheap to clone: the config sits behind an `Arc`, the store is just a path
/// and the HTTP client inside the locator is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: SqliteStore,
    pub tokens: TokenIssuer,
    pub geo: GeoLocator,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        let store = SqliteStore::new(&config.database_path);
        let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_expires_in);
        let geo = GeoLocator::new(config.geo_lookup_url.clone(), config.geo_lookup_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            geo,
        })
    }

    /// Creates the schema and applies the optional seeds from the config.
    pub fn bootstrap(&self) -> Result<(), ServiceError> {
        self.store.init()?;
        if let Some(prefix) = &self.config.coupon_link_prefix {
            self.store.set_link_prefix(prefix)?;
            log::info!("active coupon link prefix: {}", prefix);
        }
        if let Some((user, password)) = &self.config.admin_user {
            self.store.upsert_user(user, password)?;
            log::info!("seeded operator account '{}'", user);
        }
        Ok(())
    }
}

/// Runs blocking storage or file work off the async executor.
pub async fn run_blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Internal(format!("join error: {}", e)))?
}
