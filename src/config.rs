//! Process-wide configuration, loaded once at startup from environment
//! variables and immutable thereafter.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub kafka: KafkaConfig,
    pub outbox: OutboxConfig,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub consumer_group: String,
    pub payment_request_topic: String,
    pub payment_response_topic: String,
    pub restaurant_approval_request_topic: String,
    pub restaurant_approval_response_topic: String,
    pub customer_topic: String,
}

#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Fixed delay between publish sweeps.
    pub sweep_interval: Duration,
    /// Rows fetched per sweep.
    pub sweep_batch_size: i64,
    /// Fixed delay between cleanup sweeps.
    pub cleanup_interval: Duration,
    /// Completed rows older than this are deleted by the cleanup sweeper.
    pub retention: Duration,
}

impl AppConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for everything except `DATABASE_URL`.
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is unset.
    pub fn from_env(default_group: &str) -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 8080),
            kafka: KafkaConfig {
                brokers: env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string()),
                consumer_group: env::var("KAFKA_CONSUMER_GROUP")
                    .unwrap_or_else(|_| default_group.to_string()),
                payment_request_topic: env::var("PAYMENT_REQUEST_TOPIC")
                    .unwrap_or_else(|_| "payment-request".to_string()),
                payment_response_topic: env::var("PAYMENT_RESPONSE_TOPIC")
                    .unwrap_or_else(|_| "payment-response".to_string()),
                restaurant_approval_request_topic: env::var("RESTAURANT_APPROVAL_REQUEST_TOPIC")
                    .unwrap_or_else(|_| "restaurant-approval-request".to_string()),
                restaurant_approval_response_topic: env::var("RESTAURANT_APPROVAL_RESPONSE_TOPIC")
                    .unwrap_or_else(|_| "restaurant-approval-response".to_string()),
                customer_topic: env::var("CUSTOMER_TOPIC")
                    .unwrap_or_else(|_| "customer".to_string()),
            },
            outbox: OutboxConfig {
                sweep_interval: Duration::from_millis(env_parse("OUTBOX_SWEEP_INTERVAL_MS", 500)),
                sweep_batch_size: env_parse("OUTBOX_SWEEP_BATCH_SIZE", 100),
                cleanup_interval: Duration::from_secs(env_parse(
                    "OUTBOX_CLEANUP_INTERVAL_SECS",
                    300,
                )),
                retention: Duration::from_secs(env_parse("OUTBOX_RETENTION_SECS", 86_400)),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
