//! Topic listeners: the consumption loop shared by every service, plus one
//! entry point per topic routing into the saga engine or an application
//! handler.
//!
//! Offset commit policy: a message is committed once handled, dropped as a
//! duplicate (optimistic-lock no-op), dropped as stale (illegal transition),
//! or dropped as poison (undecodable). Any other failure leaves the offset
//! uncommitted for redelivery.

use std::sync::Arc;

use futures::StreamExt;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use serde::de::DeserializeOwned;

use crate::application::customer_service::CustomerEventHandler;
use crate::application::payment_service::PaymentRequestHandler;
use crate::application::restaurant_service::ApprovalRequestHandler;
use crate::domain::errors::DomainError;
use crate::messaging::messages::{
    CustomerModel, PaymentRequest, PaymentResponse, PaymentStatus, RestaurantApprovalResponse,
};
use crate::saga::approval_saga::OrderApprovalSaga;
use crate::saga::payment_saga::OrderPaymentSaga;
use crate::saga::SagaStep;

pub async fn run_listener<T, H>(consumer: StreamConsumer, name: &'static str, handler: Arc<H>)
where
    T: DeserializeOwned + Send + 'static,
    H: Fn(T) -> Result<(), DomainError> + Send + Sync + 'static,
{
    log::info!("{name} listener started");
    let mut stream = consumer.stream();
    while let Some(delivery) = stream.next().await {
        match delivery {
            Err(e) => log::error!("{name}: consume error: {e}"),
            Ok(message) => {
                if handle_message::<T, H>(&message, name, Arc::clone(&handler)).await {
                    if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                        log::error!("{name}: offset commit failed: {e}");
                    }
                }
            }
        }
    }
    log::warn!("{name} listener stream ended");
}

/// Returns whether the message's offset should be committed.
async fn handle_message<T, H>(
    message: &BorrowedMessage<'_>,
    name: &'static str,
    handler: Arc<H>,
) -> bool
where
    T: DeserializeOwned + Send + 'static,
    H: Fn(T) -> Result<(), DomainError> + Send + Sync + 'static,
{
    let Some(payload) = message.payload() else {
        log::warn!("{name}: skipping message without payload");
        return true;
    };

    let parsed: T = match serde_json::from_slice(payload) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Poison message: never decodable, never retried.
            log::error!("{name}: dropping undecodable message: {e}");
            return true;
        }
    };

    match tokio::task::spawn_blocking(move || (*handler)(parsed)).await {
        Ok(Ok(())) => true,
        Ok(Err(DomainError::Conflict)) => {
            log::debug!("{name}: duplicate delivery dropped");
            true
        }
        Ok(Err(DomainError::IllegalTransition(msg))) => {
            log::warn!("{name}: stale event dropped: {msg}");
            true
        }
        Ok(Err(e)) => {
            log::error!("{name}: handling failed, leaving message for redelivery: {e}");
            false
        }
        Err(e) => {
            log::error!("{name}: handler panicked: {e}");
            false
        }
    }
}

// ── Order service listeners ───────────────────────────────────────────────────

pub async fn payment_response_listener(consumer: StreamConsumer, saga: Arc<OrderPaymentSaga>) {
    run_listener::<PaymentResponse, _>(
        consumer,
        "payment-response",
        Arc::new(move |response: PaymentResponse| match response.payment_status {
            PaymentStatus::Completed => saga.process(&response),
            PaymentStatus::Cancelled | PaymentStatus::Failed => saga.rollback(&response),
        }),
    )
    .await
}

pub async fn approval_response_listener(consumer: StreamConsumer, saga: Arc<OrderApprovalSaga>) {
    use crate::messaging::messages::OrderApprovalStatus;
    run_listener::<RestaurantApprovalResponse, _>(
        consumer,
        "restaurant-approval-response",
        Arc::new(
            move |response: RestaurantApprovalResponse| match response.order_approval_status {
                OrderApprovalStatus::Approved => saga.process(&response),
                OrderApprovalStatus::Rejected => saga.rollback(&response),
            },
        ),
    )
    .await
}

pub async fn customer_listener(consumer: StreamConsumer, handler: Arc<CustomerEventHandler>) {
    run_listener::<CustomerModel, _>(
        consumer,
        "customer",
        Arc::new(move |customer: CustomerModel| handler.handle(&customer)),
    )
    .await
}

// ── Payment service listener ──────────────────────────────────────────────────

pub async fn payment_request_listener(
    consumer: StreamConsumer,
    handler: Arc<PaymentRequestHandler>,
) {
    run_listener::<PaymentRequest, _>(
        consumer,
        "payment-request",
        Arc::new(move |request: PaymentRequest| handler.handle(&request)),
    )
    .await
}

// ── Restaurant service listener ───────────────────────────────────────────────

pub async fn approval_request_listener(
    consumer: StreamConsumer,
    handler: Arc<ApprovalRequestHandler>,
) {
    run_listener::<crate::messaging::messages::RestaurantApprovalRequest, _>(
        consumer,
        "restaurant-approval-request",
        Arc::new(move |request| handler.handle(&request)),
    )
    .await
}
