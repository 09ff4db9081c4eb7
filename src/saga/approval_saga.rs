//! Restaurant approval step of the order saga.
//!
//! `process` reacts to `Approved`: the order moves PAID → APPROVED and the
//! saga terminates. `rollback` reacts to `Rejected`: the order moves to
//! CANCELLING and a CANCEL payment request is enqueued to claw the credit
//! back from the Payment service.

use diesel::prelude::*;
use diesel::Connection;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::infrastructure::models::NewPaymentOutboxRow;
use crate::infrastructure::{order_repo, outbox_repo, retry_on_conflict};
use crate::messaging::mappers;
use crate::messaging::messages::{PaymentOrderStatus, RestaurantApprovalResponse};
use crate::outbox::{OutboxStatus, SagaStatus, TYPE_CANCEL};
use crate::saga::SagaStep;

pub struct OrderApprovalSaga {
    pool: DbPool,
}

impl OrderApprovalSaga {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn approve(&self, response: &RestaurantApprovalResponse) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let Some(outbox_row) = outbox_repo::find_approval_outbox(
                conn,
                response.saga_id,
                &[SagaStatus::Processing],
            )?
            else {
                log::debug!(
                    "approval response for saga {} already processed",
                    response.saga_id
                );
                return Ok(());
            };

            let mut stored = load_order(conn, response.order_id)?;
            stored.order.approve()?;
            if !order_repo::update_order_status(conn, &stored.order, stored.version)? {
                return Err(DomainError::Conflict);
            }
            if !outbox_repo::complete_approval_outbox(
                conn,
                outbox_row.id,
                outbox_row.version,
                SagaStatus::Succeeded,
            )? {
                return Err(DomainError::Conflict);
            }

            log::info!("Order {} is approved", stored.order.id);
            Ok(())
        })
    }

    fn reject(&self, response: &RestaurantApprovalResponse) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let Some(outbox_row) = outbox_repo::find_approval_outbox(
                conn,
                response.saga_id,
                &[SagaStatus::Processing],
            )?
            else {
                log::debug!(
                    "approval rejection for saga {} already processed",
                    response.saga_id
                );
                return Ok(());
            };

            let mut stored = load_order(conn, response.order_id)?;
            stored
                .order
                .init_cancel(response.failure_messages.clone())?;
            if !order_repo::update_order_status(conn, &stored.order, stored.version)? {
                return Err(DomainError::Conflict);
            }
            if !outbox_repo::complete_approval_outbox(
                conn,
                outbox_row.id,
                outbox_row.version,
                SagaStatus::Compensating,
            )? {
                return Err(DomainError::Conflict);
            }

            // Request the credit back; the payment saga finishes the
            // cancellation when PaymentCancelled arrives.
            let payload =
                mappers::payment_request_payload(&stored.order, PaymentOrderStatus::Cancelled)?;
            outbox_repo::insert_payment_outbox(
                conn,
                NewPaymentOutboxRow {
                    id: Uuid::new_v4(),
                    saga_id: response.saga_id,
                    message_type: TYPE_CANCEL.to_string(),
                    payload,
                    order_status: OrderStatus::Cancelling.as_str().to_string(),
                    saga_status: SagaStatus::Compensating.as_str().to_string(),
                    outbox_status: OutboxStatus::Started.as_str().to_string(),
                },
            )?;

            log::warn!(
                "Order {} rejected by restaurant, compensating payment: {:?}",
                stored.order.id,
                response.failure_messages
            );
            Ok(())
        })
    }
}

impl SagaStep<RestaurantApprovalResponse> for OrderApprovalSaga {
    fn process(&self, response: &RestaurantApprovalResponse) -> Result<(), DomainError> {
        retry_on_conflict(3, || self.approve(response))
    }

    fn rollback(&self, response: &RestaurantApprovalResponse) -> Result<(), DomainError> {
        retry_on_conflict(3, || self.reject(response))
    }
}

fn load_order(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<order_repo::StoredOrder, DomainError> {
    order_repo::find_by_id(conn, order_id)?
        .ok_or_else(|| DomainError::NotFound(format!("Order with id={order_id}")))
}
