use deadpool_postgres::Pool;
use std::sync::Arc;

use crate::config::Config;
use crate::crypto::field::FieldCodec;
use crate::crypto::token::TokenService;
use crate::error::Result;

/// The application's state.
///
/// The field codec and token service hold the process-wide derived key and
/// signing secret. Both are built once here and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// Codec for sensitive at-rest fields.
    pub codec: Arc<FieldCodec>,
    /// Session token issuance and verification.
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Creates a new `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized (max 10 connections, queued waits)");

        let codec = Arc::new(FieldCodec::from_secret(&config.encryption_secret)?);
        tracing::info!("✅ Field encryption key derived");

        let tokens = Arc::new(TokenService::new(
            &config.token_secret,
            config.token_ttl_days,
        ));
        tracing::info!("✅ Token service initialized (TTL {} days)", config.token_ttl_days);

        Ok(AppState {
            db,
            config: config.clone(),
            codec,
            tokens,
        })
    }
}
