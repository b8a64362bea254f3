//! Configuration management for the Procurement Fulfillment Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PFP_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Object storage configuration for proof documents
    pub storage: StorageConfig,

    /// Outbound notification configuration
    pub notification: NotificationConfig,

    /// Fulfillment policy parameters
    pub fulfillment: FulfillmentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Budget to acquire a connection before a mutating operation is
    /// rejected with a concurrency timeout
    pub acquire_timeout_secs: u64,

    /// Budget for one mutating transaction to run to completion
    pub txn_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying JWT tokens minted by the identity service
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Object storage service endpoint
    pub endpoint: String,

    /// Bucket for proof-of-dispatch and receipt attachments
    pub bucket: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Webhook endpoint of the notification dispatcher; empty disables
    /// outbound delivery
    pub webhook_url: String,

    /// Shared secret for signing webhook payloads
    pub webhook_secret: String,
}

/// Policy parameters for the fulfillment pipeline
#[derive(Debug, Deserialize, Clone)]
pub struct FulfillmentConfig {
    /// Buffer applied on top of the historical average when deriving the
    /// SLA benchmark
    pub sla_buffer_percent: Decimal,

    /// Historical window for SLA calculations, in days
    pub sla_lookback_days: i64,

    /// Discrepancy percentage at which a ticket escalates above a plain
    /// quantity mismatch
    pub ticket_escalation_percent: Decimal,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PFP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.txn_timeout_secs", 10)?
            .set_default("storage.bucket", "pfp-attachments")?
            .set_default("notification.webhook_url", "")?
            .set_default("notification.webhook_secret", "")?
            .set_default("fulfillment.sla_buffer_percent", "15")?
            .set_default("fulfillment.sla_lookback_days", 30)?
            .set_default("fulfillment.ticket_escalation_percent", "20")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PFP_ prefix)
            .add_source(
                Environment::with_prefix("PFP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
