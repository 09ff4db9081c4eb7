//! Builders for the JSON payloads written into outbox rows. Wire types are
//! assembled here, at the adapter boundary, from domain state.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::payment::PaymentStatus as DomainPaymentStatus;
use crate::domain::restaurant::OrderApprovalStatus as DomainApprovalStatus;

use super::messages::{
    OrderApprovalStatus, PaymentOrderStatus, PaymentRequest, PaymentResponse, PaymentStatus,
    ProductQuantity, RestaurantApprovalRequest, RestaurantApprovalResponse, RestaurantOrderStatus,
};

/// Payment request enqueued on order creation (PAY) or during compensation
/// (CANCEL).
pub fn payment_request_payload(
    order: &Order,
    status: PaymentOrderStatus,
) -> Result<Value, DomainError> {
    to_value(&PaymentRequest {
        id: Uuid::new_v4(),
        saga_id: order.id,
        customer_id: order.customer_id,
        order_id: order.id,
        price: order.price.clone(),
        created_at: Utc::now(),
        payment_order_status: status,
    })
}

/// Restaurant approval request enqueued once the order is paid.
pub fn approval_request_payload(order: &Order) -> Result<Value, DomainError> {
    to_value(&RestaurantApprovalRequest {
        id: Uuid::new_v4(),
        saga_id: order.id,
        order_id: order.id,
        restaurant_id: order.restaurant_id,
        created_at: Utc::now(),
        restaurant_order_status: RestaurantOrderStatus::Paid,
        products: order
            .items
            .iter()
            .map(|item| ProductQuantity {
                id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
    })
}

/// Payment service verdict for a request, echoing the request's identifiers.
pub fn payment_response_payload(
    request: &PaymentRequest,
    status: DomainPaymentStatus,
    failure_messages: &[String],
) -> Result<Value, DomainError> {
    to_value(&PaymentResponse {
        id: Uuid::new_v4(),
        saga_id: request.saga_id,
        customer_id: request.customer_id,
        order_id: request.order_id,
        price: request.price.clone(),
        created_at: Utc::now(),
        payment_status: wire_payment_status(status),
        failure_messages: failure_messages.to_vec(),
    })
}

/// Restaurant service verdict for an approval request.
pub fn approval_response_payload(
    request: &RestaurantApprovalRequest,
    status: DomainApprovalStatus,
    failure_messages: &[String],
) -> Result<Value, DomainError> {
    to_value(&RestaurantApprovalResponse {
        id: Uuid::new_v4(),
        saga_id: request.saga_id,
        order_id: request.order_id,
        created_at: Utc::now(),
        order_approval_status: wire_approval_status(status),
        failure_messages: failure_messages.to_vec(),
    })
}

pub fn wire_payment_status(status: DomainPaymentStatus) -> PaymentStatus {
    match status {
        DomainPaymentStatus::Completed => PaymentStatus::Completed,
        DomainPaymentStatus::Cancelled => PaymentStatus::Cancelled,
        DomainPaymentStatus::Failed => PaymentStatus::Failed,
    }
}

pub fn wire_approval_status(status: DomainApprovalStatus) -> OrderApprovalStatus {
    match status {
        DomainApprovalStatus::Approved => OrderApprovalStatus::Approved,
        DomainApprovalStatus::Rejected => OrderApprovalStatus::Rejected,
    }
}

fn to_value<T: serde::Serialize>(message: &T) -> Result<Value, DomainError> {
    serde_json::to_value(message).map_err(|e| DomainError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::order::{CreateOrder, OrderItemInput, StreetAddress};
    use crate::domain::restaurant::{Product, Restaurant};
    use std::str::FromStr;

    fn sample_order() -> Order {
        let product_id = Uuid::new_v4();
        let restaurant = Restaurant {
            id: Uuid::new_v4(),
            name: "diner".to_string(),
            active: true,
            products: vec![Product {
                id: product_id,
                name: "burger".to_string(),
                price: Money::from_str("50.00").unwrap(),
                available: true,
            }],
        };
        Order::initialize(
            CreateOrder {
                customer_id: Uuid::new_v4(),
                restaurant_id: restaurant.id,
                delivery_address: StreetAddress {
                    street: "street_1".to_string(),
                    postal_code: "1000AB".to_string(),
                    city: "Paris".to_string(),
                },
                price: Money::from_str("100.00").unwrap(),
                items: vec![OrderItemInput {
                    product_id,
                    quantity: 2,
                    price: Money::from_str("50.00").unwrap(),
                    sub_total: Money::from_str("100.00").unwrap(),
                }],
            },
            &restaurant,
        )
        .unwrap()
    }

    #[test]
    fn payment_request_payload_uses_order_id_as_saga_id() {
        let order = sample_order();
        let payload = payment_request_payload(&order, PaymentOrderStatus::Pending).unwrap();
        assert_eq!(payload["saga_id"], serde_json::json!(order.id));
        assert_eq!(payload["order_id"], serde_json::json!(order.id));
        assert_eq!(payload["payment_order_status"], serde_json::json!("PENDING"));
    }

    #[test]
    fn cancel_payment_request_payload_carries_cancelled_status() {
        let order = sample_order();
        let payload = payment_request_payload(&order, PaymentOrderStatus::Cancelled).unwrap();
        assert_eq!(
            payload["payment_order_status"],
            serde_json::json!("CANCELLED")
        );
    }

    #[test]
    fn approval_request_payload_lists_order_products() {
        let order = sample_order();
        let payload = approval_request_payload(&order).unwrap();
        assert_eq!(payload["restaurant_order_status"], serde_json::json!("PAID"));
        let products = payload["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["quantity"], serde_json::json!(2));
    }

    #[test]
    fn payment_response_payload_echoes_request_identity() {
        let request = PaymentRequest {
            id: Uuid::new_v4(),
            saga_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            price: Money::from_str("75.00").unwrap(),
            created_at: Utc::now(),
            payment_order_status: PaymentOrderStatus::Pending,
        };
        let failures = vec!["Customer with id=x has no enough credit for payment".to_string()];
        let payload =
            payment_response_payload(&request, DomainPaymentStatus::Failed, &failures).unwrap();
        assert_eq!(payload["saga_id"], serde_json::json!(request.saga_id));
        assert_eq!(payload["payment_status"], serde_json::json!("FAILED"));
        assert_eq!(payload["failure_messages"][0], serde_json::json!(failures[0]));
    }

    #[test]
    fn approval_response_payload_carries_verdict() {
        let request = RestaurantApprovalRequest {
            id: Uuid::new_v4(),
            saga_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            created_at: Utc::now(),
            restaurant_order_status: RestaurantOrderStatus::Paid,
            products: vec![],
        };
        let payload =
            approval_response_payload(&request, DomainApprovalStatus::Rejected, &[]).unwrap();
        assert_eq!(payload["order_approval_status"], serde_json::json!("REJECTED"));
    }
}
