//! Restaurant service: consumes approval requests and records the verdict
//! in its response outbox, one transaction per message. The unique saga_id
//! key makes redelivery a no-op.

use diesel::Connection;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::restaurant::{self, OrderApprovalStatus, RequestedProduct};
use crate::infrastructure::models::NewApprovalResponseOutboxRow;
use crate::infrastructure::{restaurant_repo, retry_on_conflict};
use crate::messaging::mappers;
use crate::messaging::messages::RestaurantApprovalRequest;
use crate::outbox::{OutboxStatus, SagaStatus, TYPE_APPROVE};

pub struct ApprovalRequestHandler {
    pool: DbPool,
}

impl ApprovalRequestHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn handle(&self, request: &RestaurantApprovalRequest) -> Result<(), DomainError> {
        retry_on_conflict(3, || self.approve(request))
    }

    fn approve(&self, request: &RestaurantApprovalRequest) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            if restaurant_repo::response_outbox_exists(conn, request.saga_id)? {
                log::debug!(
                    "approval request for saga {} already handled",
                    request.saga_id
                );
                return Ok(());
            }

            let requested: Vec<RequestedProduct> = request
                .products
                .iter()
                .map(|p| RequestedProduct {
                    product_id: p.id,
                    quantity: p.quantity,
                })
                .collect();
            let product_ids: Vec<Uuid> = requested.iter().map(|p| p.product_id).collect();

            let (status, failures) = match restaurant_repo::find_restaurant_with_products(
                conn,
                request.restaurant_id,
                &product_ids,
            )? {
                None => (
                    OrderApprovalStatus::Rejected,
                    vec![format!(
                        "Restaurant with id={} could not be found",
                        request.restaurant_id
                    )],
                ),
                Some(snapshot) => restaurant::approve_order(&snapshot, &requested),
            };

            let payload = mappers::approval_response_payload(request, status, &failures)?;
            restaurant_repo::insert_response_outbox(
                conn,
                NewApprovalResponseOutboxRow {
                    id: Uuid::new_v4(),
                    saga_id: request.saga_id,
                    message_type: TYPE_APPROVE.to_string(),
                    payload,
                    approval_status: status.as_str().to_string(),
                    saga_status: saga_status_for(status).as_str().to_string(),
                    outbox_status: OutboxStatus::Started.as_str().to_string(),
                },
            )?;

            match status {
                OrderApprovalStatus::Approved => {
                    log::info!("Order {} approved", request.order_id);
                }
                OrderApprovalStatus::Rejected => {
                    log::warn!("Order {} rejected: {:?}", request.order_id, failures);
                }
            }
            Ok(())
        })
    }
}

fn saga_status_for(status: OrderApprovalStatus) -> SagaStatus {
    match status {
        OrderApprovalStatus::Approved => SagaStatus::Succeeded,
        OrderApprovalStatus::Rejected => SagaStatus::Compensating,
    }
}
