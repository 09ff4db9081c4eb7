//! Restaurant snapshot and the approval verdict rules.

use uuid::Uuid;

use super::errors::DomainError;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderApprovalStatus {
    Approved,
    Rejected,
}

impl OrderApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderApprovalStatus::Approved => "APPROVED",
            OrderApprovalStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "APPROVED" => Ok(OrderApprovalStatus::Approved),
            "REJECTED" => Ok(OrderApprovalStatus::Rejected),
            other => Err(DomainError::Internal(format!(
                "Unknown approval status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Money,
    pub available: bool,
}

#[derive(Debug, Clone)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone)]
pub struct RequestedProduct {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Decides the approval verdict for a set of requested products against the
/// restaurant's listing. Returns REJECTED with the collected failure
/// messages when the restaurant is inactive or any product is unlisted or
/// unavailable.
pub fn approve_order(
    restaurant: &Restaurant,
    requested: &[RequestedProduct],
) -> (OrderApprovalStatus, Vec<String>) {
    let mut failures = Vec::new();

    if !restaurant.active {
        failures.push(format!(
            "Restaurant with id={} is currently not active",
            restaurant.id
        ));
    }

    for request in requested {
        match restaurant.products.iter().find(|p| p.id == request.product_id) {
            None => failures.push(format!(
                "Product with id={} is not listed by restaurant",
                request.product_id
            )),
            Some(product) if !product.available => failures.push(format!(
                "Product with id={} is not available",
                request.product_id
            )),
            Some(_) => {}
        }
    }

    if failures.is_empty() {
        (OrderApprovalStatus::Approved, failures)
    } else {
        (OrderApprovalStatus::Rejected, failures)
    }
}
