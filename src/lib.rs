//! Document-search gateway
//!
//! Fronts a document-search backend with a credential gateway:
//! - Bearer-token authentication (static list or database-backed)
//! - Tiered rate limiting across minute/hour/day windows
//! - Bounded-staleness credential caching
//! - Batched, non-blocking usage accounting

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use domain::CredentialStore;
use infrastructure::credential::{
    AuthMode, DatabaseAuthConfig, DatabaseAuthenticator, PostgresCredentialStore,
    StaticAuthenticator,
};
use infrastructure::search::UpstreamSearchService;

/// Create the application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let auth = build_auth_mode(config).await?;
    info!("Authentication mode: {}", auth.describe());

    let search = Arc::new(UpstreamSearchService::new(&config.upstream.base_url));

    Ok(AppState::new(auth, search))
}

/// Resolve the authentication mode once at startup. The two credential modes
/// are mutually exclusive; nothing re-dispatches on configuration after this.
pub async fn build_auth_mode(config: &AppConfig) -> anyhow::Result<AuthMode> {
    let auth = &config.auth;

    if !auth.enabled {
        info!("Authentication is disabled");
        return Ok(AuthMode::Disabled);
    }

    if auth.database_enabled {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            anyhow::anyhow!("DATABASE_URL environment variable is required for database mode")
        })?;

        info!("Connecting to PostgreSQL...");
        let pool = sqlx::PgPool::connect(&database_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;

        let store = PostgresCredentialStore::new(pool);
        store.migrate().await?;
        info!("PostgreSQL connection established");

        let store: Arc<dyn CredentialStore> = Arc::new(store);
        let authenticator = DatabaseAuthenticator::new(
            store,
            DatabaseAuthConfig {
                cache_validity_secs: auth.cache_validity_secs,
                cache_capacity: auth.cache_capacity,
                batch_update_threshold: auth.batch_update_threshold,
                default_rate_limits: auth.default_rate_limits,
            },
        );

        return Ok(AuthMode::Database(Arc::new(authenticator)));
    }

    // from_config downgrades to disabled (with a loud warning) when the
    // configured list is empty
    match StaticAuthenticator::from_config(auth.api_keys.clone(), auth.key_names.clone()) {
        Some(authenticator) => {
            info!(
                "Static authentication with {} API key(s)",
                authenticator.key_count()
            );
            Ok(AuthMode::Static(authenticator))
        }
        None => Ok(AuthMode::Disabled),
    }
}
