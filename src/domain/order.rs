use uuid::Uuid;

use super::errors::DomainError;
use super::money::Money;
use super::restaurant::Restaurant;

pub const FAILURE_MESSAGE_DELIMITER: &str = ",";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Approved,
    Cancelling,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Cancelling => "CANCELLING",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "APPROVED" => Ok(OrderStatus::Approved),
            "CANCELLING" => Ok(OrderStatus::Cancelling),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Internal(format!(
                "Unknown order status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetAddress {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Money,
    pub sub_total: Money,
}

#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Money,
    pub sub_total: Money,
}

/// Input for [`Order::initialize`].
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub delivery_address: StreetAddress,
    pub price: Money,
    pub items: Vec<OrderItemInput>,
}

/// The order aggregate. All business mutations go through [`Order::pay`],
/// [`Order::approve`], [`Order::init_cancel`] and [`Order::cancel`];
/// `APPROVED` and `CANCELLED` are absorbing.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub tracking_id: Uuid,
    pub delivery_address: StreetAddress,
    pub price: Money,
    pub items: Vec<OrderItem>,
    pub order_status: OrderStatus,
    pub failure_messages: Vec<String>,
}

impl Order {
    /// Validates the creation command against the aggregate invariants and
    /// the restaurant snapshot, returning a new PENDING order.
    pub fn initialize(command: CreateOrder, restaurant: &Restaurant) -> Result<Order, DomainError> {
        if command.items.is_empty() {
            return Err(DomainError::InvalidInput(
                "Order must contain at least one item".to_string(),
            ));
        }
        if !restaurant.active {
            return Err(DomainError::InvalidInput(format!(
                "Restaurant with id={} is currently not active",
                restaurant.id
            )));
        }

        let mut items = Vec::with_capacity(command.items.len());
        let mut total = Money::zero();
        for input in &command.items {
            if input.quantity < 1 {
                return Err(DomainError::InvalidInput(format!(
                    "Quantity {} is not valid for product {}",
                    input.quantity, input.product_id
                )));
            }
            if !input.price.is_greater_than_zero() {
                return Err(DomainError::InvalidInput(format!(
                    "Price {} is not valid for product {}",
                    input.price, input.product_id
                )));
            }
            let listed = restaurant
                .products
                .iter()
                .find(|p| p.id == input.product_id)
                .ok_or_else(|| {
                    DomainError::InvalidInput(format!(
                        "Product with id={} is not listed by restaurant {}",
                        input.product_id, restaurant.id
                    ))
                })?;
            if listed.price != input.price {
                return Err(DomainError::InvalidInput(format!(
                    "Price {} does not match the listed price for product {}",
                    input.price, input.product_id
                )));
            }
            let expected_sub_total = input.price.multiply(input.quantity);
            if input.sub_total != expected_sub_total {
                return Err(DomainError::InvalidInput(format!(
                    "Sub total {} is not valid for product {}",
                    input.sub_total, input.product_id
                )));
            }
            total = total.add(&input.sub_total);
            items.push(OrderItem {
                id: Uuid::new_v4(),
                product_id: input.product_id,
                quantity: input.quantity,
                price: input.price.clone(),
                sub_total: input.sub_total.clone(),
            });
        }

        if command.price != total {
            return Err(DomainError::InvalidInput(format!(
                "Total price {} does not match the sum of order item sub totals {}",
                command.price, total
            )));
        }

        Ok(Order {
            id: Uuid::new_v4(),
            customer_id: command.customer_id,
            restaurant_id: command.restaurant_id,
            tracking_id: Uuid::new_v4(),
            delivery_address: command.delivery_address,
            price: command.price,
            items,
            order_status: OrderStatus::Pending,
            failure_messages: Vec::new(),
        })
    }

    /// PENDING → PAID.
    pub fn pay(&mut self) -> Result<(), DomainError> {
        if self.order_status != OrderStatus::Pending {
            return Err(DomainError::IllegalTransition(format!(
                "Order {} is not in correct state for pay operation: {}",
                self.id,
                self.order_status.as_str()
            )));
        }
        self.order_status = OrderStatus::Paid;
        Ok(())
    }

    /// PAID → APPROVED.
    pub fn approve(&mut self) -> Result<(), DomainError> {
        if self.order_status != OrderStatus::Paid {
            return Err(DomainError::IllegalTransition(format!(
                "Order {} is not in correct state for approve operation: {}",
                self.id,
                self.order_status.as_str()
            )));
        }
        self.order_status = OrderStatus::Approved;
        Ok(())
    }

    /// PAID → CANCELLING, collecting failure messages from the rejection.
    pub fn init_cancel(&mut self, failure_messages: Vec<String>) -> Result<(), DomainError> {
        if self.order_status != OrderStatus::Paid {
            return Err(DomainError::IllegalTransition(format!(
                "Order {} is not in correct state for initCancel operation: {}",
                self.id,
                self.order_status.as_str()
            )));
        }
        self.order_status = OrderStatus::Cancelling;
        self.append_failure_messages(failure_messages);
        Ok(())
    }

    /// CANCELLING → CANCELLED, or PENDING → CANCELLED on the payment-failed
    /// path.
    pub fn cancel(&mut self, failure_messages: Vec<String>) -> Result<(), DomainError> {
        if !matches!(
            self.order_status,
            OrderStatus::Cancelling | OrderStatus::Pending
        ) {
            return Err(DomainError::IllegalTransition(format!(
                "Order {} is not in correct state for cancel operation: {}",
                self.id,
                self.order_status.as_str()
            )));
        }
        self.order_status = OrderStatus::Cancelled;
        self.append_failure_messages(failure_messages);
        Ok(())
    }

    /// Additive with set semantics: blanks are dropped, duplicates collapse,
    /// and appending nothing changes nothing.
    fn append_failure_messages(&mut self, messages: Vec<String>) {
        for message in messages {
            let message = message.trim();
            if message.is_empty() {
                continue;
            }
            if !self.failure_messages.iter().any(|m| m == message) {
                self.failure_messages.push(message.to_string());
            }
        }
    }
}

/// Serialize failure messages into the delimited column representation.
pub fn join_failure_messages(messages: &[String]) -> Option<String> {
    if messages.is_empty() {
        None
    } else {
        Some(messages.join(FAILURE_MESSAGE_DELIMITER))
    }
}

/// Parse the delimited column representation back into messages, ignoring
/// empty segments.
pub fn split_failure_messages(column: Option<&str>) -> Vec<String> {
    column
        .unwrap_or_default()
        .split(FAILURE_MESSAGE_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::restaurant::Product;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn restaurant_with(products: Vec<Product>) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            name: "test restaurant".to_string(),
            active: true,
            products,
        }
    }

    fn product(id: Uuid, price: &str) -> Product {
        Product {
            id,
            name: "product".to_string(),
            price: money(price),
            available: true,
        }
    }

    fn valid_command(restaurant: &Restaurant, product_id: Uuid) -> CreateOrder {
        CreateOrder {
            customer_id: Uuid::new_v4(),
            restaurant_id: restaurant.id,
            delivery_address: StreetAddress {
                street: "street_1".to_string(),
                postal_code: "1000AB".to_string(),
                city: "Paris".to_string(),
            },
            price: money("200.00"),
            items: vec![
                OrderItemInput {
                    product_id,
                    quantity: 1,
                    price: money("50.00"),
                    sub_total: money("50.00"),
                },
                OrderItemInput {
                    product_id,
                    quantity: 3,
                    price: money("50.00"),
                    sub_total: money("150.00"),
                },
            ],
        }
    }

    fn pending_order() -> Order {
        let product_id = Uuid::new_v4();
        let restaurant = restaurant_with(vec![product(product_id, "50.00")]);
        Order::initialize(valid_command(&restaurant, product_id), &restaurant).unwrap()
    }

    // ── initialize ────────────────────────────────────────────────────────────

    #[test]
    fn initialize_creates_pending_order_with_tracking_id() {
        let order = pending_order();
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert!(order.failure_messages.is_empty());
        assert_ne!(order.tracking_id, Uuid::nil());
        assert_eq!(order.items.len(), 2);
    }

    #[test]
    fn initialize_rejects_empty_items() {
        let restaurant = restaurant_with(vec![]);
        let mut cmd = valid_command(&restaurant, Uuid::new_v4());
        cmd.items.clear();
        let err = Order::initialize(cmd, &restaurant).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn initialize_rejects_inactive_restaurant() {
        let product_id = Uuid::new_v4();
        let mut restaurant = restaurant_with(vec![product(product_id, "50.00")]);
        restaurant.active = false;
        let err = Order::initialize(valid_command(&restaurant, product_id), &restaurant)
            .unwrap_err();
        assert!(err.to_string().contains("not active"));
    }

    #[test]
    fn initialize_rejects_unlisted_product() {
        let restaurant = restaurant_with(vec![]);
        let err = Order::initialize(valid_command(&restaurant, Uuid::new_v4()), &restaurant)
            .unwrap_err();
        assert!(err.to_string().contains("not listed"));
    }

    #[test]
    fn initialize_rejects_price_disagreeing_with_listing() {
        let product_id = Uuid::new_v4();
        let restaurant = restaurant_with(vec![product(product_id, "60.00")]);
        let err = Order::initialize(valid_command(&restaurant, product_id), &restaurant)
            .unwrap_err();
        assert!(err.to_string().contains("listed price"));
    }

    #[test]
    fn initialize_rejects_zero_price_item() {
        let product_id = Uuid::new_v4();
        let restaurant = restaurant_with(vec![product(product_id, "50.00")]);
        let mut cmd = valid_command(&restaurant, product_id);
        cmd.items[0].price = Money::zero();
        assert!(Order::initialize(cmd, &restaurant).is_err());
    }

    #[test]
    fn initialize_rejects_zero_quantity() {
        let product_id = Uuid::new_v4();
        let restaurant = restaurant_with(vec![product(product_id, "50.00")]);
        let mut cmd = valid_command(&restaurant, product_id);
        cmd.items[0].quantity = 0;
        assert!(Order::initialize(cmd, &restaurant).is_err());
    }

    #[test]
    fn initialize_rejects_wrong_sub_total() {
        let product_id = Uuid::new_v4();
        let restaurant = restaurant_with(vec![product(product_id, "50.00")]);
        let mut cmd = valid_command(&restaurant, product_id);
        cmd.items[0].sub_total = money("60.00");
        let err = Order::initialize(cmd, &restaurant).unwrap_err();
        assert!(err.to_string().contains("Sub total"));
    }

    #[test]
    fn initialize_rejects_total_not_matching_sum() {
        let product_id = Uuid::new_v4();
        let restaurant = restaurant_with(vec![product(product_id, "50.00")]);
        let mut cmd = valid_command(&restaurant, product_id);
        cmd.price = money("250.00");
        let err = Order::initialize(cmd, &restaurant).unwrap_err();
        assert!(err.to_string().contains("Total price"));
    }

    // ── transitions ───────────────────────────────────────────────────────────

    #[test]
    fn pay_moves_pending_to_paid() {
        let mut order = pending_order();
        order.pay().unwrap();
        assert_eq!(order.order_status, OrderStatus::Paid);
    }

    #[test]
    fn approve_moves_paid_to_approved() {
        let mut order = pending_order();
        order.pay().unwrap();
        order.approve().unwrap();
        assert_eq!(order.order_status, OrderStatus::Approved);
    }

    #[test]
    fn init_cancel_moves_paid_to_cancelling() {
        let mut order = pending_order();
        order.pay().unwrap();
        order
            .init_cancel(vec!["Product not available".to_string()])
            .unwrap();
        assert_eq!(order.order_status, OrderStatus::Cancelling);
        assert_eq!(order.failure_messages.len(), 1);
    }

    #[test]
    fn cancel_moves_cancelling_to_cancelled() {
        let mut order = pending_order();
        order.pay().unwrap();
        order.init_cancel(vec![]).unwrap();
        order.cancel(vec!["Payment cancelled".to_string()]).unwrap();
        assert_eq!(order.order_status, OrderStatus::Cancelled);
    }

    #[test]
    fn cancel_moves_pending_directly_to_cancelled() {
        let mut order = pending_order();
        order
            .cancel(vec!["Customer has no enough credit".to_string()])
            .unwrap();
        assert_eq!(order.order_status, OrderStatus::Cancelled);
    }

    #[test]
    fn pay_requires_pending() {
        let mut order = pending_order();
        order.pay().unwrap();
        assert!(matches!(
            order.pay(),
            Err(DomainError::IllegalTransition(_))
        ));
    }

    #[test]
    fn approve_requires_paid() {
        let mut order = pending_order();
        assert!(order.approve().is_err());
    }

    #[test]
    fn init_cancel_requires_paid() {
        let mut order = pending_order();
        assert!(order.init_cancel(vec![]).is_err());
    }

    #[test]
    fn terminal_states_are_absorbing() {
        let mut approved = pending_order();
        approved.pay().unwrap();
        approved.approve().unwrap();
        assert!(approved.pay().is_err());
        assert!(approved.approve().is_err());
        assert!(approved.init_cancel(vec![]).is_err());
        assert!(approved.cancel(vec![]).is_err());

        let mut cancelled = pending_order();
        cancelled.cancel(vec![]).unwrap();
        assert!(cancelled.pay().is_err());
        assert!(cancelled.approve().is_err());
        assert!(cancelled.init_cancel(vec![]).is_err());
        assert!(cancelled.cancel(vec![]).is_err());
    }

    // ── failure messages ──────────────────────────────────────────────────────

    #[test]
    fn failure_messages_deduplicate() {
        let mut order = pending_order();
        order
            .cancel(vec![
                "no credit".to_string(),
                "no credit".to_string(),
                "timeout".to_string(),
            ])
            .unwrap();
        assert_eq!(order.failure_messages, vec!["no credit", "timeout"]);
    }

    #[test]
    fn failure_messages_ignore_blanks() {
        let mut order = pending_order();
        order
            .cancel(vec!["".to_string(), "  ".to_string()])
            .unwrap();
        assert!(order.failure_messages.is_empty());
    }

    #[test]
    fn failure_messages_accumulate_across_compensation_steps() {
        let mut order = pending_order();
        order.pay().unwrap();
        order.init_cancel(vec!["rejected".to_string()]).unwrap();
        order.cancel(vec!["payment cancelled".to_string()]).unwrap();
        assert_eq!(order.failure_messages, vec!["rejected", "payment cancelled"]);
    }

    // ── column serialization ──────────────────────────────────────────────────

    #[test]
    fn join_empty_messages_is_none() {
        assert_eq!(join_failure_messages(&[]), None);
    }

    #[test]
    fn join_and_split_round_trip() {
        let messages = vec!["a".to_string(), "b".to_string()];
        let column = join_failure_messages(&messages).unwrap();
        assert_eq!(split_failure_messages(Some(&column)), messages);
    }

    #[test]
    fn split_ignores_empty_segments() {
        assert_eq!(
            split_failure_messages(Some("a,,b,")),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(split_failure_messages(None).is_empty());
    }

    // ── status strings ────────────────────────────────────────────────────────

    #[test]
    fn order_status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Approved,
            OrderStatus::Cancelling,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::parse("UNKNOWN").is_err());
    }
}
