//! Payment service entrypoint: the payment-request listener plus the
//! publish/cleanup sweepers over the response outbox.

use std::sync::Arc;

use dotenvy::dotenv;
use food_ordering::application::payment_service::PaymentRequestHandler;
use food_ordering::infrastructure::outbox_repo::PaymentResponseOutboxSweepStore;
use food_ordering::messaging::kafka::{create_consumer, KafkaPublisher};
use food_ordering::messaging::listeners;
use food_ordering::outbox::sweeper::{CleanupSweeper, OutboxSweeper};
use food_ordering::{create_pool, run_migrations, AppConfig};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env("payment-service");
    let pool = create_pool(&config.database_url, config.db_max_connections);
    run_migrations(&pool);

    let publisher = Arc::new(
        KafkaPublisher::new(&config.kafka.brokers).expect("Failed to create Kafka producer"),
    );

    let response_store = Arc::new(PaymentResponseOutboxSweepStore::new(pool.clone()));
    tokio::spawn(
        OutboxSweeper::new(
            Arc::clone(&response_store),
            Arc::clone(&publisher),
            config.kafka.payment_response_topic.clone(),
            config.outbox.sweep_batch_size,
        )
        .run(config.outbox.sweep_interval),
    );
    tokio::spawn(CleanupSweeper::new(response_store, config.outbox.retention)
        .run(config.outbox.cleanup_interval));

    let handler = Arc::new(PaymentRequestHandler::new(pool));
    let consumer = create_consumer(
        &config.kafka.brokers,
        &config.kafka.consumer_group,
        &config.kafka.payment_request_topic,
    )
    .expect("Failed to create payment-request consumer");

    log::info!("Starting payment service");
    tokio::select! {
        _ = listeners::payment_request_listener(consumer, handler) => {}
        _ = tokio::signal::ctrl_c() => log::info!("payment service shutting down"),
    }
}
