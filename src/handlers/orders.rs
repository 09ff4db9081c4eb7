use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderApplicationService;
use crate::domain::money::Money;
use crate::domain::order::{CreateOrder, OrderItemInput, StreetAddress};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderAddressRequest {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "50.00"
    pub price: String,
    /// Must equal quantity × price
    pub sub_total: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub address: OrderAddressRequest,
    /// Declared total; must equal the sum of item sub totals
    pub price: String,
    pub items: Vec<CreateOrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_tracking_id: Uuid,
    pub order_status: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackOrderResponse {
    pub order_tracking_id: Uuid,
    pub order_status: String,
    pub saga_status: Option<String>,
    pub failure_messages: Vec<String>,
}

fn to_command(request: CreateOrderRequest) -> Result<CreateOrder, AppError> {
    let price = parse_money(&request.price)?;
    let items = request
        .items
        .into_iter()
        .map(|item| {
            Ok(OrderItemInput {
                product_id: item.product_id,
                quantity: item.quantity,
                price: parse_money(&item.price)?,
                sub_total: parse_money(&item.sub_total)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    Ok(CreateOrder {
        customer_id: request.customer_id,
        restaurant_id: request.restaurant_id,
        delivery_address: StreetAddress {
            street: request.address.street,
            postal_code: request.address.postal_code,
            city: request.address.city,
        },
        price,
        items,
    })
}

fn parse_money(value: &str) -> Result<Money, AppError> {
    Money::from_str(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid amount '{value}': {e}")))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates the order against the customer replica and the restaurant
/// snapshot, then persists the PENDING order together with its payment
/// request outbox row in a single transaction. The response carries the
/// tracking id for polling.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created, saga started", body = CreateOrderResponse),
        (status = 400, description = "Order validation failed"),
        (status = 404, description = "Unknown customer or restaurant"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<OrderApplicationService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let command = to_command(body.into_inner())?;
    let result = web::block(move || service.create_order(command))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CreateOrderResponse {
        order_tracking_id: result.tracking_id,
        order_status: result.order_status.as_str().to_string(),
        message: result.message,
    }))
}

/// GET /orders/track/{tracking_id}
///
/// Returns the order status, the accumulated failure messages, and the
/// latest saga status so a caller can tell "still paying" from "rejected".
#[utoipa::path(
    get,
    path = "/orders/track/{tracking_id}",
    params(
        ("tracking_id" = Uuid, Path, description = "Tracking id returned on creation")
    ),
    responses(
        (status = 200, description = "Order found", body = TrackOrderResponse),
        (status = 404, description = "Unknown tracking id"),
    ),
    tag = "orders"
)]
pub async fn track_order(
    service: web::Data<OrderApplicationService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let tracking_id = path.into_inner();
    let result = web::block(move || service.track_order(tracking_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TrackOrderResponse {
        order_tracking_id: result.tracking_id,
        order_status: result.order_status.as_str().to_string(),
        saga_status: result.saga_status.map(|s| s.as_str().to_string()),
        failure_messages: result.failure_messages,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── CreateOrderRequest deserialization ────────────────────────────────────

    #[test]
    fn create_order_request_deserializes() {
        let customer = Uuid::new_v4();
        let restaurant = Uuid::new_v4();
        let product = Uuid::new_v4();
        let json = serde_json::json!({
            "customer_id": customer,
            "restaurant_id": restaurant,
            "address": {"street": "street_1", "postal_code": "1000AB", "city": "Paris"},
            "price": "200.00",
            "items": [
                {"product_id": product, "quantity": 1, "price": "50.00", "sub_total": "50.00"},
                {"product_id": product, "quantity": 3, "price": "50.00", "sub_total": "150.00"}
            ]
        });
        let req: CreateOrderRequest =
            serde_json::from_value(json).expect("deserialize CreateOrderRequest");
        assert_eq!(req.customer_id, customer);
        assert_eq!(req.items.len(), 2);
        assert_eq!(req.items[1].sub_total, "150.00");
    }

    // ── to_command ────────────────────────────────────────────────────────────

    fn request_with_price(price: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            address: OrderAddressRequest {
                street: "street_1".to_string(),
                postal_code: "1000AB".to_string(),
                city: "Paris".to_string(),
            },
            price: price.to_string(),
            items: vec![CreateOrderItemRequest {
                product_id: Uuid::new_v4(),
                quantity: 2,
                price: "25.00".to_string(),
                sub_total: "50.00".to_string(),
            }],
        }
    }

    #[test]
    fn to_command_parses_decimal_strings() {
        let command = to_command(request_with_price("50.00")).expect("valid command");
        assert_eq!(command.price, Money::from_str("50.00").unwrap());
        assert_eq!(command.items[0].quantity, 2);
    }

    #[test]
    fn to_command_rejects_invalid_total() {
        let err = to_command(request_with_price("not-a-number")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn to_command_rejects_invalid_item_price() {
        let mut request = request_with_price("50.00");
        request.items[0].price = "9.9.9".to_string();
        assert!(to_command(request).is_err());
    }

    // ── Response serialization ────────────────────────────────────────────────

    #[test]
    fn create_order_response_serializes() {
        let id = Uuid::new_v4();
        let resp = CreateOrderResponse {
            order_tracking_id: id,
            order_status: "PENDING".to_string(),
            message: "Order created successfully".to_string(),
        };
        let json = serde_json::to_value(&resp).expect("serialize CreateOrderResponse");
        assert_eq!(
            json["order_tracking_id"].as_str(),
            Some(id.to_string().as_str())
        );
        assert_eq!(json["order_status"].as_str(), Some("PENDING"));
    }

    #[test]
    fn track_order_response_serializes_with_saga_status() {
        let resp = TrackOrderResponse {
            order_tracking_id: Uuid::new_v4(),
            order_status: "CANCELLED".to_string(),
            saga_status: Some("FAILED".to_string()),
            failure_messages: vec!["Customer has no enough credit".to_string()],
        };
        let json = serde_json::to_value(&resp).expect("serialize TrackOrderResponse");
        assert_eq!(json["saga_status"].as_str(), Some("FAILED"));
        assert_eq!(json["failure_messages"].as_array().map(|a| a.len()), Some(1));
    }

    #[test]
    fn track_order_response_serializes_null_saga_status() {
        let resp = TrackOrderResponse {
            order_tracking_id: Uuid::new_v4(),
            order_status: "PENDING".to_string(),
            saga_status: None,
            failure_messages: vec![],
        };
        let json = serde_json::to_value(&resp).expect("serialize TrackOrderResponse");
        assert!(json["saga_status"].is_null());
    }
}
