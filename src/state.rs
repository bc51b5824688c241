use std::sync::Arc;

use crate::config::Config;
use crate::crypto::token::TokenKeys;
use crate::error::{ErrorTranslator, Result};
use crate::repositories::user::{IdentityStore, MemoryIdentityStore, PgIdentityStore};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// Where identities and credentials live.
    pub store: Arc<dyn IdentityStore>,
    /// The application's configuration.
    pub config: Arc<Config>,
    /// Session token signer/verifier.
    pub tokens: TokenKeys,
}

impl AppState {
    /// Creates a new `AppState`, connecting to PostgreSQL when a database URL
    /// is configured and falling back to the in-memory store otherwise.
    pub async fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn IdentityStore> = match config.database_url.as_deref() {
            Some(url) => {
                let pool = crate::db::create_pool(url)?;
                crate::db::ensure_schema(&pool).await?;
                tracing::info!("✅ PostgreSQL pool initialized with deadpool-postgres");
                Arc::new(PgIdentityStore::new(pool))
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL not set, using the in-memory identity store");
                Arc::new(MemoryIdentityStore::new())
            }
        };

        Ok(Self::with_store(config.clone(), store))
    }

    /// Creates an `AppState` around an existing store.
    pub fn with_store(config: Config, store: Arc<dyn IdentityStore>) -> Self {
        let tokens = TokenKeys::from_config(&config);
        AppState {
            store,
            config: Arc::new(config),
            tokens,
        }
    }

    pub fn translator(&self) -> ErrorTranslator {
        ErrorTranslator::new(self.config.run_mode)
    }
}
