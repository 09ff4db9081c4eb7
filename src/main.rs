//! Order service entrypoint: the HTTP edge, the saga listeners on the two
//! response topics and the customer topic, and the publish/cleanup sweepers
//! over the two request outboxes.

use std::sync::Arc;

use dotenvy::dotenv;
use food_ordering::application::customer_service::CustomerEventHandler;
use food_ordering::infrastructure::outbox_repo::{
    ApprovalOutboxSweepStore, PaymentOutboxSweepStore,
};
use food_ordering::messaging::kafka::{create_consumer, KafkaPublisher};
use food_ordering::messaging::listeners;
use food_ordering::outbox::sweeper::{CleanupSweeper, OutboxSweeper};
use food_ordering::saga::approval_saga::OrderApprovalSaga;
use food_ordering::saga::payment_saga::OrderPaymentSaga;
use food_ordering::{build_server, create_pool, run_migrations, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env("order-service");
    let pool = create_pool(&config.database_url, config.db_max_connections);
    run_migrations(&pool);

    let publisher = Arc::new(
        KafkaPublisher::new(&config.kafka.brokers).expect("Failed to create Kafka producer"),
    );

    // Request outbox sweepers: payment-request and restaurant-approval-request.
    let payment_store = Arc::new(PaymentOutboxSweepStore::new(pool.clone()));
    tokio::spawn(
        OutboxSweeper::new(
            Arc::clone(&payment_store),
            Arc::clone(&publisher),
            config.kafka.payment_request_topic.clone(),
            config.outbox.sweep_batch_size,
        )
        .run(config.outbox.sweep_interval),
    );
    tokio::spawn(CleanupSweeper::new(payment_store, config.outbox.retention)
        .run(config.outbox.cleanup_interval));

    let approval_store = Arc::new(ApprovalOutboxSweepStore::new(pool.clone()));
    tokio::spawn(
        OutboxSweeper::new(
            Arc::clone(&approval_store),
            Arc::clone(&publisher),
            config.kafka.restaurant_approval_request_topic.clone(),
            config.outbox.sweep_batch_size,
        )
        .run(config.outbox.sweep_interval),
    );
    tokio::spawn(CleanupSweeper::new(approval_store, config.outbox.retention)
        .run(config.outbox.cleanup_interval));

    // Saga listeners on the response topics.
    let payment_saga = Arc::new(OrderPaymentSaga::new(pool.clone()));
    let payment_consumer = create_consumer(
        &config.kafka.brokers,
        &config.kafka.consumer_group,
        &config.kafka.payment_response_topic,
    )
    .expect("Failed to create payment-response consumer");
    tokio::spawn(listeners::payment_response_listener(
        payment_consumer,
        payment_saga,
    ));

    let approval_saga = Arc::new(OrderApprovalSaga::new(pool.clone()));
    let approval_consumer = create_consumer(
        &config.kafka.brokers,
        &config.kafka.consumer_group,
        &config.kafka.restaurant_approval_response_topic,
    )
    .expect("Failed to create restaurant-approval-response consumer");
    tokio::spawn(listeners::approval_response_listener(
        approval_consumer,
        approval_saga,
    ));

    // Customer replica listener.
    let customer_handler = Arc::new(CustomerEventHandler::new(pool.clone()));
    let customer_consumer = create_consumer(
        &config.kafka.brokers,
        &config.kafka.consumer_group,
        &config.kafka.customer_topic,
    )
    .expect("Failed to create customer consumer");
    tokio::spawn(listeners::customer_listener(
        customer_consumer,
        customer_handler,
    ));

    log::info!(
        "Starting order service at http://{}:{}",
        config.host,
        config.port
    );

    build_server(pool, &config.host, config.port)?.await
}
