//! # Application State
//!
//! Shared state for the Axum application: configuration, the database
//! pool, the payment provider, the optional mailer and the token issuer.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use secrecy::SecretString;
use sqlx::PgPool;
use tracing::{info, warn};

use shop_core::{BoxedPaymentProvider, Currency, ItemCatalog, DEFAULT_POINTS_PER_UNIT};
use shop_stripe::{StripeConfig, StripePaymentIntentProvider};

use crate::auth::{Claims, TokenIssuer};
use crate::db;
use crate::error::ApiError;
use crate::mail::{BoxedMailer, MailConfig, SmtpMailer};

/// Application configuration
#[derive(Debug)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    pub database_url: SecretString,
    pub database_max_connections: u32,
    /// HS256 signing key for session tokens
    pub jwt_key: SecretString,
    pub token_ttl_hours: i64,
    /// Store currency; all prices are in this currency
    pub currency: Currency,
    pub points_per_unit: i64,
    /// Whether `type: admin` is accepted at signup
    pub allow_admin_signup: bool,
    /// Seed catalog file
    pub catalog_path: String,
    /// Stripe publishable key handed to clients with the payment secret
    pub publishable_key: Option<String>,
    /// SMTP settings; mail is disabled when `None`
    pub mail: Option<MailConfig>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
        let jwt_key = std::env::var("JWT_KEY").context("JWT_KEY not set")?;

        let currency = std::env::var("SHOP_CURRENCY")
            .unwrap_or_else(|_| "bgn".to_string())
            .parse::<Currency>()
            .context("invalid SHOP_CURRENCY")?;

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080)?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: SecretString::from(database_url),
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_key: SecretString::from(jwt_key),
            token_ttl_hours: env_or("TOKEN_TTL_HOURS", 24)?,
            currency,
            points_per_unit: env_or("POINTS_PER_UNIT", DEFAULT_POINTS_PER_UNIT)?,
            allow_admin_signup: env_or("ALLOW_ADMIN_SIGNUP", true)?,
            catalog_path: std::env::var("CATALOG_PATH")
                .unwrap_or_else(|_| "config/items.toml".to_string()),
            publishable_key: std::env::var("STRIPE_PUBLISHABLE_KEY").ok(),
            mail: MailConfig::from_env()?,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Parse an optional environment variable, falling back to `default`
fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}={}: {}", name, value, e)),
        Err(_) => Ok(default),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    /// Payment provider used at checkout
    pub payments: BoxedPaymentProvider,
    pub mailer: Option<BoxedMailer>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Connect to the database, run migrations, seed the catalog and set up
    /// Stripe and SMTP from the environment.
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let pool = db::create_pool(&config.database_url, config.database_max_connections)
            .await
            .context("failed to connect to the database")?;
        db::migrate(&pool).await.context("failed to run migrations")?;

        let catalog = load_item_catalog(&config.catalog_path)?;
        let seed = catalog
            .to_new_items(config.currency)
            .map_err(|e| anyhow::anyhow!("invalid seed catalog: {}", e))?;
        db::seed_catalog(&pool, &seed).await?;

        let stripe = StripeConfig::from_env()
            .and_then(StripePaymentIntentProvider::new)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        let mailer = match &config.mail {
            Some(mail) => {
                info!("SMTP mailer enabled: {}:{}", mail.host, mail.port);
                Some(Arc::new(SmtpMailer::new(mail)?) as BoxedMailer)
            }
            None => {
                warn!("SMTP_HOST not set, email is disabled");
                None
            }
        };

        Ok(Self::from_parts(config, pool, Arc::new(stripe), mailer))
    }

    /// Assemble state from already-built collaborators
    pub fn from_parts(
        config: AppConfig,
        pool: PgPool,
        payments: BoxedPaymentProvider,
        mailer: Option<BoxedMailer>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_key, Duration::hours(config.token_ttl_hours));

        Self {
            config: Arc::new(config),
            pool,
            payments,
            mailer,
            tokens: Arc::new(tokens),
        }
    }

    /// Validate the token sent in a request body
    pub fn authenticate(&self, token: Option<&str>) -> Result<Claims, ApiError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(crate::auth::AuthError::MissingToken)?;
        Ok(self.tokens.verify(token)?)
    }
}

/// Load the seed catalog; a missing file means no seeding
fn load_item_catalog(path: &str) -> anyhow::Result<ItemCatalog> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let catalog = ItemCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            info!("Loaded {} catalog items from {}", catalog.items.len(), path);
            Ok(catalog)
        }
        Err(_) => {
            warn!("No item catalog at {}, skipping seed", path);
            Ok(ItemCatalog::new())
        }
    }
}
