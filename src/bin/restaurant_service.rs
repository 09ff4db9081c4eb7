//! Restaurant service entrypoint: the approval-request listener plus the
//! publish/cleanup sweepers over the response outbox.

use std::sync::Arc;

use dotenvy::dotenv;
use food_ordering::application::restaurant_service::ApprovalRequestHandler;
use food_ordering::infrastructure::outbox_repo::ApprovalResponseOutboxSweepStore;
use food_ordering::messaging::kafka::{create_consumer, KafkaPublisher};
use food_ordering::messaging::listeners;
use food_ordering::outbox::sweeper::{CleanupSweeper, OutboxSweeper};
use food_ordering::{create_pool, run_migrations, AppConfig};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env("restaurant-service");
    let pool = create_pool(&config.database_url, config.db_max_connections);
    run_migrations(&pool);

    let publisher = Arc::new(
        KafkaPublisher::new(&config.kafka.brokers).expect("Failed to create Kafka producer"),
    );

    let response_store = Arc::new(ApprovalResponseOutboxSweepStore::new(pool.clone()));
    tokio::spawn(
        OutboxSweeper::new(
            Arc::clone(&response_store),
            Arc::clone(&publisher),
            config.kafka.restaurant_approval_response_topic.clone(),
            config.outbox.sweep_batch_size,
        )
        .run(config.outbox.sweep_interval),
    );
    tokio::spawn(CleanupSweeper::new(response_store, config.outbox.retention)
        .run(config.outbox.cleanup_interval));

    let handler = Arc::new(ApprovalRequestHandler::new(pool));
    let consumer = create_consumer(
        &config.kafka.brokers,
        &config.kafka.consumer_group,
        &config.kafka.restaurant_approval_request_topic,
    )
    .expect("Failed to create restaurant-approval-request consumer");

    log::info!("Starting restaurant service");
    tokio::select! {
        _ = listeners::approval_request_listener(consumer, handler) => {}
        _ = tokio::signal::ctrl_c() => log::info!("restaurant service shutting down"),
    }
}
