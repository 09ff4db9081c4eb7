//! Order service commands: create an order (the saga trigger) and track one.

use diesel::Connection;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{CreateOrder, Order, OrderStatus};
use crate::infrastructure::models::NewPaymentOutboxRow;
use crate::infrastructure::{customer_repo, order_repo, outbox_repo, restaurant_repo};
use crate::messaging::mappers;
use crate::messaging::messages::PaymentOrderStatus;
use crate::outbox::{OutboxStatus, SagaStatus, TYPE_PAY};

#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order_id: Uuid,
    pub tracking_id: Uuid,
    pub order_status: OrderStatus,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct TrackOrderResult {
    pub tracking_id: Uuid,
    pub order_status: OrderStatus,
    pub failure_messages: Vec<String>,
    pub saga_status: Option<SagaStatus>,
}

pub struct OrderApplicationService {
    pool: DbPool,
}

impl OrderApplicationService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Validates and persists a new order together with its PAY outbox row
    /// in one transaction: the aggregate is stored iff the payment request
    /// is enqueued.
    pub fn create_order(&self, command: CreateOrder) -> Result<CreateOrderResult, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            if customer_repo::find(conn, command.customer_id)?.is_none() {
                return Err(DomainError::NotFound(format!(
                    "Customer with id={}",
                    command.customer_id
                )));
            }

            let product_ids: Vec<Uuid> =
                command.items.iter().map(|item| item.product_id).collect();
            let restaurant = restaurant_repo::find_restaurant_with_products(
                conn,
                command.restaurant_id,
                &product_ids,
            )?
            .ok_or_else(|| {
                DomainError::NotFound(format!("Restaurant with id={}", command.restaurant_id))
            })?;

            let order = Order::initialize(command, &restaurant)?;
            order_repo::insert_order(conn, &order)?;

            let payload = mappers::payment_request_payload(&order, PaymentOrderStatus::Pending)?;
            outbox_repo::insert_payment_outbox(
                conn,
                NewPaymentOutboxRow {
                    id: Uuid::new_v4(),
                    saga_id: order.id,
                    message_type: TYPE_PAY.to_string(),
                    payload,
                    order_status: order.order_status.as_str().to_string(),
                    saga_status: SagaStatus::Started.as_str().to_string(),
                    outbox_status: OutboxStatus::Started.as_str().to_string(),
                },
            )?;

            log::info!(
                "Order {} created with tracking id {}",
                order.id,
                order.tracking_id
            );
            Ok(CreateOrderResult {
                order_id: order.id,
                tracking_id: order.tracking_id,
                order_status: order.order_status,
                message: "Order created successfully".to_string(),
            })
        })
    }

    /// Current order status plus the latest saga status observable from the
    /// outbox tables, so "still paying" and "rejected" are distinguishable.
    pub fn track_order(&self, tracking_id: Uuid) -> Result<TrackOrderResult, DomainError> {
        let mut conn = self.pool.get()?;
        let stored = order_repo::find_by_tracking_id(&mut conn, tracking_id)?.ok_or_else(|| {
            DomainError::NotFound(format!("Order with tracking id={tracking_id}"))
        })?;
        let saga_status = outbox_repo::latest_saga_status(&mut conn, stored.order.id)?;
        Ok(TrackOrderResult {
            tracking_id: stored.order.tracking_id,
            order_status: stored.order.order_status,
            failure_messages: stored.order.failure_messages,
            saga_status,
        })
    }
}
