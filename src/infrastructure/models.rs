use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{
    credit_entries, credit_history, customers, order_items, orders, payment_outbox,
    payment_response_outbox, payments, products, restaurant_approval_outbox,
    restaurant_approval_response_outbox, restaurants,
};

// ── Order service ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub tracking_id: Uuid,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub price: BigDecimal,
    pub order_status: String,
    pub failure_messages: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub tracking_id: Uuid,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub price: BigDecimal,
    pub order_status: String,
    pub failure_messages: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: BigDecimal,
    pub sub_total: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: BigDecimal,
    pub sub_total: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

// ── Outbox rows (Order service) ───────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payment_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentOutboxRow {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub message_type: String,
    pub payload: Value,
    pub order_status: String,
    pub saga_status: String,
    pub outbox_status: String,
    pub version: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payment_outbox)]
pub struct NewPaymentOutboxRow {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub message_type: String,
    pub payload: Value,
    pub order_status: String,
    pub saga_status: String,
    pub outbox_status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = restaurant_approval_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApprovalOutboxRow {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub message_type: String,
    pub payload: Value,
    pub order_status: String,
    pub saga_status: String,
    pub outbox_status: String,
    pub version: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = restaurant_approval_outbox)]
pub struct NewApprovalOutboxRow {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub message_type: String,
    pub payload: Value,
    pub order_status: String,
    pub saga_status: String,
    pub outbox_status: String,
}

// ── Payment service ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub price: BigDecimal,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPaymentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub price: BigDecimal,
    pub payment_status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = credit_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreditEntryRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total_credit_amount: BigDecimal,
    pub version: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = credit_entries)]
pub struct NewCreditEntryRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total_credit_amount: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = credit_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreditHistoryRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
    pub transaction_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = credit_history)]
pub struct NewCreditHistoryRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
    pub transaction_type: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payment_response_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentResponseOutboxRow {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub message_type: String,
    pub payload: Value,
    pub payment_status: String,
    pub saga_status: String,
    pub outbox_status: String,
    pub version: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payment_response_outbox)]
pub struct NewPaymentResponseOutboxRow {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub message_type: String,
    pub payload: Value,
    pub payment_status: String,
    pub saga_status: String,
    pub outbox_status: String,
}

// ── Restaurant service ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RestaurantRow {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = products)]
#[diesel(belongs_to(RestaurantRow, foreign_key = restaurant_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub available: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = restaurant_approval_response_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApprovalResponseOutboxRow {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub message_type: String,
    pub payload: Value,
    pub approval_status: String,
    pub saga_status: String,
    pub outbox_status: String,
    pub version: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = restaurant_approval_response_outbox)]
pub struct NewApprovalResponseOutboxRow {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub message_type: String,
    pub payload: Value,
    pub approval_status: String,
    pub saga_status: String,
    pub outbox_status: String,
}
