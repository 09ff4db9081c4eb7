//! Payment step of the order saga.
//!
//! `process` reacts to `PaymentCompleted`: the order moves PENDING → PAID
//! and the restaurant approval request is enqueued. `rollback` reacts to
//! `PaymentFailed` (abort the saga) and `PaymentCancelled` (compensation
//! acknowledged): the order ends CANCELLED.

use diesel::prelude::*;
use diesel::Connection;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::infrastructure::models::NewApprovalOutboxRow;
use crate::infrastructure::{order_repo, outbox_repo, retry_on_conflict};
use crate::messaging::mappers;
use crate::messaging::messages::{PaymentResponse, PaymentStatus};
use crate::outbox::{OutboxStatus, SagaStatus, TYPE_APPROVE};
use crate::saga::SagaStep;

pub struct OrderPaymentSaga {
    pool: DbPool,
}

impl OrderPaymentSaga {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn complete(&self, response: &PaymentResponse) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let Some(outbox_row) =
                outbox_repo::find_payment_outbox(conn, response.saga_id, &[SagaStatus::Started])?
            else {
                log::debug!(
                    "payment response for saga {} already processed",
                    response.saga_id
                );
                return Ok(());
            };

            let mut stored = load_order(conn, response.order_id)?;
            stored.order.pay()?;
            if !order_repo::update_order_status(conn, &stored.order, stored.version)? {
                return Err(DomainError::Conflict);
            }
            if !outbox_repo::complete_payment_outbox(
                conn,
                outbox_row.id,
                outbox_row.version,
                SagaStatus::Processing,
            )? {
                return Err(DomainError::Conflict);
            }

            let payload = mappers::approval_request_payload(&stored.order)?;
            outbox_repo::insert_approval_outbox(
                conn,
                NewApprovalOutboxRow {
                    id: Uuid::new_v4(),
                    saga_id: response.saga_id,
                    message_type: TYPE_APPROVE.to_string(),
                    payload,
                    order_status: OrderStatus::Paid.as_str().to_string(),
                    saga_status: SagaStatus::Processing.as_str().to_string(),
                    outbox_status: OutboxStatus::Started.as_str().to_string(),
                },
            )?;

            log::info!("Order {} is paid", stored.order.id);
            Ok(())
        })
    }

    /// `PaymentFailed`: the saga aborts. From PENDING the order cancels
    /// directly; from CANCELLING (a failed compensation request) it also
    /// ends CANCELLED.
    fn fail(&self, response: &PaymentResponse) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let Some(outbox_row) = outbox_repo::find_payment_outbox(
                conn,
                response.saga_id,
                &[SagaStatus::Started, SagaStatus::Compensating],
            )?
            else {
                log::debug!(
                    "payment failure for saga {} already processed",
                    response.saga_id
                );
                return Ok(());
            };

            let mut stored = load_order(conn, response.order_id)?;
            stored.order.cancel(response.failure_messages.clone())?;
            if !order_repo::update_order_status(conn, &stored.order, stored.version)? {
                return Err(DomainError::Conflict);
            }
            if !outbox_repo::complete_payment_outbox(
                conn,
                outbox_row.id,
                outbox_row.version,
                SagaStatus::Failed,
            )? {
                return Err(DomainError::Conflict);
            }

            log::warn!(
                "Order {} is cancelled after payment failure: {:?}",
                stored.order.id,
                response.failure_messages
            );
            Ok(())
        })
    }

    /// `PaymentCancelled`: the credit was returned, the compensation is
    /// acknowledged and the order ends CANCELLED.
    fn confirm_cancellation(&self, response: &PaymentResponse) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let Some(outbox_row) = outbox_repo::find_payment_outbox(
                conn,
                response.saga_id,
                &[SagaStatus::Compensating],
            )?
            else {
                log::debug!(
                    "payment cancellation for saga {} already processed",
                    response.saga_id
                );
                return Ok(());
            };

            let mut stored = load_order(conn, response.order_id)?;
            stored.order.cancel(response.failure_messages.clone())?;
            if !order_repo::update_order_status(conn, &stored.order, stored.version)? {
                return Err(DomainError::Conflict);
            }
            if !outbox_repo::complete_payment_outbox(
                conn,
                outbox_row.id,
                outbox_row.version,
                SagaStatus::Compensated,
            )? {
                return Err(DomainError::Conflict);
            }

            log::info!("Order {} is cancelled", stored.order.id);
            Ok(())
        })
    }
}

impl SagaStep<PaymentResponse> for OrderPaymentSaga {
    fn process(&self, response: &PaymentResponse) -> Result<(), DomainError> {
        retry_on_conflict(3, || self.complete(response))
    }

    fn rollback(&self, response: &PaymentResponse) -> Result<(), DomainError> {
        retry_on_conflict(3, || match response.payment_status {
            PaymentStatus::Cancelled => self.confirm_cancellation(response),
            PaymentStatus::Failed => self.fail(response),
            PaymentStatus::Completed => Err(DomainError::Internal(
                "PaymentCompleted routed to rollback".to_string(),
            )),
        })
    }
}

fn load_order(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<order_repo::StoredOrder, DomainError> {
    order_repo::find_by_id(conn, order_id)?
        .ok_or_else(|| DomainError::NotFound(format!("Order with id={order_id}")))
}
