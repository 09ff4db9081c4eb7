//! Wire message types for the five topics. JSON-encoded; these types stay at
//! the adapter boundary and never leak into domain code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOrderStatus {
    Pending,
    Cancelled,
}

/// Order → Payment, on the `payment-request` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Uuid,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub payment_order_status: PaymentOrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Cancelled,
    Failed,
}

/// Payment → Order, on the `payment-response` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Uuid,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub failure_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestaurantOrderStatus {
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub id: Uuid,
    pub quantity: i32,
}

/// Order → Restaurant, on the `restaurant-approval-request` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantApprovalRequest {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub order_id: Uuid,
    pub restaurant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub restaurant_order_status: RestaurantOrderStatus,
    pub products: Vec<ProductQuantity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderApprovalStatus {
    Approved,
    Rejected,
}

/// Restaurant → Order, on the `restaurant-approval-response` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantApprovalResponse {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub order_approval_status: OrderApprovalStatus,
    #[serde(default)]
    pub failure_messages: Vec<String>,
}

/// Customer → Order, on the `customer` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerModel {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn payment_request_round_trips_through_json() {
        let request = PaymentRequest {
            id: Uuid::new_v4(),
            saga_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            price: Money::from_str("200.00").unwrap(),
            created_at: Utc::now(),
            payment_order_status: PaymentOrderStatus::Pending,
        };
        let json = serde_json::to_string(&request).unwrap();
        let decoded: PaymentRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.saga_id, request.saga_id);
        assert_eq!(decoded.price, request.price);
        assert_eq!(decoded.payment_order_status, PaymentOrderStatus::Pending);
    }

    #[test]
    fn statuses_serialize_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(PaymentOrderStatus::Pending).unwrap(),
            serde_json::json!("PENDING")
        );
        assert_eq!(
            serde_json::to_value(PaymentStatus::Completed).unwrap(),
            serde_json::json!("COMPLETED")
        );
        assert_eq!(
            serde_json::to_value(RestaurantOrderStatus::Paid).unwrap(),
            serde_json::json!("PAID")
        );
        assert_eq!(
            serde_json::to_value(OrderApprovalStatus::Rejected).unwrap(),
            serde_json::json!("REJECTED")
        );
    }

    #[test]
    fn payment_response_missing_failure_messages_defaults_to_empty() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "saga_id": Uuid::new_v4(),
            "customer_id": Uuid::new_v4(),
            "order_id": Uuid::new_v4(),
            "price": "99.90",
            "created_at": Utc::now(),
            "payment_status": "FAILED",
        });
        let decoded: PaymentResponse = serde_json::from_value(json).unwrap();
        assert!(decoded.failure_messages.is_empty());
        assert_eq!(decoded.payment_status, PaymentStatus::Failed);
    }

    #[test]
    fn approval_request_carries_product_quantities() {
        let product = Uuid::new_v4();
        let request = RestaurantApprovalRequest {
            id: Uuid::new_v4(),
            saga_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            created_at: Utc::now(),
            restaurant_order_status: RestaurantOrderStatus::Paid,
            products: vec![ProductQuantity {
                id: product,
                quantity: 3,
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["products"][0]["id"], serde_json::json!(product));
        assert_eq!(value["products"][0]["quantity"], serde_json::json!(3));
        assert_eq!(value["restaurant_order_status"], serde_json::json!("PAID"));
    }

    #[test]
    fn customer_model_round_trips_through_json() {
        let customer = CustomerModel {
            id: Uuid::new_v4(),
            username: "user_1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        let json = serde_json::to_string(&customer).unwrap();
        let decoded: CustomerModel = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, customer.id);
        assert_eq!(decoded.username, "user_1");
    }
}
