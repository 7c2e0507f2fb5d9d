use anyhow::{Context, Result};
use std::env;
use zeroize::Zeroizing;

/// Fallback field-encryption secret, matching the legacy deployment.
/// Production must set `ENCRYPTION_KEY`.
const DEFAULT_ENCRYPTION_SECRET: &str = "default-secret-key-change-in-production";

/// Fallback token-signing secret. Production must set `JWT_SECRET`.
const DEFAULT_TOKEN_SECRET: &str = "your-secret-key-change-in-production";

/// The application's configuration.
///
/// Built once at startup; the derived field key and token keys are
/// constructed from these secrets and never re-derived or rotated at runtime.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// Secret the field-encryption key is derived from. Either 64 hex chars
    /// (used directly as the 32-byte key) or an arbitrary string (stretched
    /// with scrypt).
    pub encryption_secret: Zeroizing<String>,
    /// Secret used to sign and verify session tokens.
    pub token_secret: Zeroizing<String>,
    /// Session token lifetime in days.
    pub token_ttl_days: i64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        let encryption_secret = match env::var("ENCRYPTION_KEY") {
            Ok(secret) => Zeroizing::new(secret),
            Err(_) => {
                tracing::warn!(
                    "⚠️  ENCRYPTION_KEY not set, using the built-in default (insecure, dev only)"
                );
                Zeroizing::new(DEFAULT_ENCRYPTION_SECRET.to_string())
            }
        };

        let token_secret = match env::var("JWT_SECRET") {
            Ok(secret) => Zeroizing::new(secret),
            Err(_) => {
                tracing::warn!(
                    "⚠️  JWT_SECRET not set, using the built-in default (insecure, dev only)"
                );
                Zeroizing::new(DEFAULT_TOKEN_SECRET.to_string())
            }
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            encryption_secret,
            token_secret,
            token_ttl_days: env::var("TOKEN_TTL_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid TOKEN_TTL_DAYS")?,
        })
    }
}
