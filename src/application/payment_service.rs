//! Payment service: consumes payment requests, applies the credit rules,
//! and records the verdict in the response outbox — all in one transaction
//! per message. The `(saga_id, type)` unique key makes redelivery a no-op.

use diesel::prelude::*;
use diesel::Connection;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::payment::{self, Payment, PaymentStatus};
use crate::infrastructure::models::NewPaymentResponseOutboxRow;
use crate::infrastructure::{payment_repo, retry_on_conflict};
use crate::messaging::mappers;
use crate::messaging::messages::{PaymentOrderStatus, PaymentRequest};
use crate::outbox::{OutboxStatus, SagaStatus, TYPE_CANCEL, TYPE_PAY};

pub struct PaymentRequestHandler {
    pool: DbPool,
}

impl PaymentRequestHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn handle(&self, request: &PaymentRequest) -> Result<(), DomainError> {
        match request.payment_order_status {
            PaymentOrderStatus::Pending => {
                retry_on_conflict(3, || self.complete_payment(request))
            }
            PaymentOrderStatus::Cancelled => {
                retry_on_conflict(3, || self.cancel_payment(request))
            }
        }
    }

    /// PAY: debit the customer's credit and record a payment. Any rule
    /// violation (unknown customer, insufficient funds, drifted history)
    /// produces a FAILED verdict instead of an error.
    fn complete_payment(&self, request: &PaymentRequest) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            if payment_repo::response_outbox_exists(conn, request.saga_id, TYPE_PAY)? {
                log::debug!("payment request for saga {} already handled", request.saga_id);
                return Ok(());
            }

            let mut payment =
                Payment::new(request.order_id, request.customer_id, request.price.clone());
            let failures = self.debit(conn, &mut payment)?;

            payment_repo::insert_payment(conn, &payment)?;
            self.record_verdict(conn, request, &payment, TYPE_PAY, &failures)?;

            if failures.is_empty() {
                log::info!("Payment completed for order {}", request.order_id);
            } else {
                log::warn!(
                    "Payment failed for order {}: {:?}",
                    request.order_id,
                    failures
                );
            }
            Ok(())
        })
    }

    /// CANCEL: credit the price back (compensation).
    fn cancel_payment(&self, request: &PaymentRequest) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            if payment_repo::response_outbox_exists(conn, request.saga_id, TYPE_CANCEL)? {
                log::debug!(
                    "payment cancellation for saga {} already handled",
                    request.saga_id
                );
                return Ok(());
            }

            let (payment, failures) =
                match payment_repo::find_payment_by_order_id(conn, request.order_id)? {
                    None => {
                        let mut payment = Payment::new(
                            request.order_id,
                            request.customer_id,
                            request.price.clone(),
                        );
                        payment.status = Some(PaymentStatus::Failed);
                        (
                            payment,
                            vec![format!(
                                "Payment for order id={} could not be found",
                                request.order_id
                            )],
                        )
                    }
                    Some(mut payment) => {
                        let failures = self.credit(conn, &mut payment)?;
                        let status = payment.status.unwrap_or(PaymentStatus::Failed);
                        payment_repo::update_payment_status(conn, payment.id, status)?;
                        (payment, failures)
                    }
                };

            self.record_verdict(conn, request, &payment, TYPE_CANCEL, &failures)?;

            if failures.is_empty() {
                log::info!("Payment cancelled for order {}", request.order_id);
            } else {
                log::warn!(
                    "Payment cancellation failed for order {}: {:?}",
                    request.order_id,
                    failures
                );
            }
            Ok(())
        })
    }

    fn debit(
        &self,
        conn: &mut PgConnection,
        payment: &mut Payment,
    ) -> Result<Vec<String>, DomainError> {
        let Some(stored) = payment_repo::find_credit_entry(conn, payment.customer_id)? else {
            payment.status = Some(PaymentStatus::Failed);
            return Ok(vec![format!(
                "Customer with id={} could not be found",
                payment.customer_id
            )]);
        };

        let mut entry = stored.entry;
        let mut history = payment_repo::find_credit_history(conn, payment.customer_id)?;
        let history_before = history.len();
        let failures = payment::initiate_payment(payment, &mut entry, &mut history);

        if failures.is_empty() {
            if !payment_repo::update_credit_entry(conn, &entry, stored.version)? {
                return Err(DomainError::Conflict);
            }
            payment_repo::insert_credit_history(conn, &history[history_before..])?;
        }
        Ok(failures)
    }

    fn credit(
        &self,
        conn: &mut PgConnection,
        payment: &mut Payment,
    ) -> Result<Vec<String>, DomainError> {
        let Some(stored) = payment_repo::find_credit_entry(conn, payment.customer_id)? else {
            payment.status = Some(PaymentStatus::Failed);
            return Ok(vec![format!(
                "Customer with id={} could not be found",
                payment.customer_id
            )]);
        };

        let mut entry = stored.entry;
        let mut history = payment_repo::find_credit_history(conn, payment.customer_id)?;
        let history_before = history.len();
        let failures = payment::cancel_payment(payment, &mut entry, &mut history);

        if failures.is_empty() {
            if !payment_repo::update_credit_entry(conn, &entry, stored.version)? {
                return Err(DomainError::Conflict);
            }
            payment_repo::insert_credit_history(conn, &history[history_before..])?;
        }
        Ok(failures)
    }

    fn record_verdict(
        &self,
        conn: &mut PgConnection,
        request: &PaymentRequest,
        payment: &Payment,
        message_type: &str,
        failures: &[String],
    ) -> Result<(), DomainError> {
        let status = payment
            .status
            .ok_or_else(|| DomainError::Internal("Payment has no verdict".to_string()))?;
        let payload = mappers::payment_response_payload(request, status, failures)?;
        payment_repo::insert_response_outbox(
            conn,
            NewPaymentResponseOutboxRow {
                id: Uuid::new_v4(),
                saga_id: request.saga_id,
                message_type: message_type.to_string(),
                payload,
                payment_status: status.as_str().to_string(),
                saga_status: saga_status_for(status).as_str().to_string(),
                outbox_status: OutboxStatus::Started.as_str().to_string(),
            },
        )
    }
}

/// Mirrors the order-side saga lifecycle so both ends of the topic read the
/// same in the operator surface.
fn saga_status_for(status: PaymentStatus) -> SagaStatus {
    match status {
        PaymentStatus::Completed => SagaStatus::Processing,
        PaymentStatus::Cancelled => SagaStatus::Compensated,
        PaymentStatus::Failed => SagaStatus::Failed,
    }
}
