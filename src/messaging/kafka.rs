//! Kafka adapters for the log port: a producer implementing
//! [`EventPublisher`] and a consumer factory with manual offset commits.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::outbox::{EventPublisher, PublishError};

pub struct KafkaPublisher {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(brokers: &str) -> Result<Self, KafkaError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("acks", "all")
            .set("message.timeout.ms", "5000")
            .create()?;
        Ok(Self {
            producer,
            timeout: Duration::from_secs(5),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.producer
            .send(
                FutureRecord::to(topic).key(key).payload(&payload),
                Timeout::After(self.timeout),
            )
            .await
            .map(|_| ())
            .map_err(|(e, _)| PublishError {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}

/// A consumer subscribed to one topic. Offsets are committed manually, after
/// a message was handled (or deliberately dropped), so unhandled messages
/// are redelivered.
pub fn create_consumer(
    brokers: &str,
    group_id: &str,
    topic: &str,
) -> Result<StreamConsumer, KafkaError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("group.id", group_id)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .set("session.timeout.ms", "6000")
        .create()?;
    consumer.subscribe(&[topic])?;
    Ok(consumer)
}
