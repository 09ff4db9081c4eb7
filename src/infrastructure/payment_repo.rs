//! Row operations for the Payment service: payment records, the customer's
//! credit bookkeeping, and the response outbox with its dedupe keys.

use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use crate::domain::payment::{
    CreditEntry, CreditHistoryEntry, Payment, PaymentStatus, TransactionType,
};
use crate::schema::{credit_entries, credit_history, payment_response_outbox, payments};

use super::models::{
    CreditEntryRow, CreditHistoryRow, NewCreditEntryRow, NewCreditHistoryRow,
    NewPaymentResponseOutboxRow, NewPaymentRow, PaymentRow,
};

#[derive(Debug, Clone)]
pub struct StoredCreditEntry {
    pub entry: CreditEntry,
    pub version: i32,
}

pub fn insert_payment(conn: &mut PgConnection, payment: &Payment) -> Result<(), DomainError> {
    let status = payment
        .status
        .ok_or_else(|| DomainError::Internal("Payment has no status to persist".to_string()))?;
    diesel::insert_into(payments::table)
        .values(&NewPaymentRow {
            id: payment.id,
            order_id: payment.order_id,
            customer_id: payment.customer_id,
            price: payment.price.amount().clone(),
            payment_status: status.as_str().to_string(),
        })
        .execute(conn)?;
    Ok(())
}

pub fn find_payment_by_order_id(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Option<Payment>, DomainError> {
    let row = payments::table
        .filter(payments::order_id.eq(order_id))
        .select(PaymentRow::as_select())
        .first(conn)
        .optional()?;
    row.map(|row| {
        Ok(Payment {
            id: row.id,
            order_id: row.order_id,
            customer_id: row.customer_id,
            price: Money::new(row.price),
            status: Some(PaymentStatus::parse(&row.payment_status)?),
            created_at: row.created_at,
        })
    })
    .transpose()
}

pub fn update_payment_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: PaymentStatus,
) -> Result<(), DomainError> {
    diesel::update(payments::table.filter(payments::id.eq(id)))
        .set(payments::payment_status.eq(status.as_str()))
        .execute(conn)?;
    Ok(())
}

pub fn find_credit_entry(
    conn: &mut PgConnection,
    customer_id: Uuid,
) -> Result<Option<StoredCreditEntry>, DomainError> {
    let row = credit_entries::table
        .filter(credit_entries::customer_id.eq(customer_id))
        .select(CreditEntryRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(|row| StoredCreditEntry {
        version: row.version,
        entry: CreditEntry {
            id: row.id,
            customer_id: row.customer_id,
            total_credit_amount: Money::new(row.total_credit_amount),
        },
    }))
}

pub fn insert_credit_entry(
    conn: &mut PgConnection,
    entry: &CreditEntry,
) -> Result<(), DomainError> {
    diesel::insert_into(credit_entries::table)
        .values(&NewCreditEntryRow {
            id: entry.id,
            customer_id: entry.customer_id,
            total_credit_amount: entry.total_credit_amount.amount().clone(),
        })
        .execute(conn)?;
    Ok(())
}

/// CAS on the credit entry's version; `false` means a concurrent payment for
/// the same customer committed first.
pub fn update_credit_entry(
    conn: &mut PgConnection,
    entry: &CreditEntry,
    expected_version: i32,
) -> Result<bool, DomainError> {
    let updated = diesel::update(
        credit_entries::table
            .filter(credit_entries::id.eq(entry.id))
            .filter(credit_entries::version.eq(expected_version)),
    )
    .set((
        credit_entries::total_credit_amount.eq(entry.total_credit_amount.amount().clone()),
        credit_entries::version.eq(expected_version + 1),
    ))
    .execute(conn)?;
    Ok(updated == 1)
}

pub fn find_credit_history(
    conn: &mut PgConnection,
    customer_id: Uuid,
) -> Result<Vec<CreditHistoryEntry>, DomainError> {
    let rows = credit_history::table
        .filter(credit_history::customer_id.eq(customer_id))
        .order(credit_history::created_at.asc())
        .select(CreditHistoryRow::as_select())
        .load(conn)?;
    rows.into_iter()
        .map(|row| {
            Ok(CreditHistoryEntry {
                id: row.id,
                customer_id: row.customer_id,
                amount: Money::new(row.amount),
                transaction_type: TransactionType::parse(&row.transaction_type)?,
            })
        })
        .collect()
}

pub fn insert_credit_history(
    conn: &mut PgConnection,
    entries: &[CreditHistoryEntry],
) -> Result<(), DomainError> {
    let rows: Vec<NewCreditHistoryRow> = entries
        .iter()
        .map(|entry| NewCreditHistoryRow {
            id: entry.id,
            customer_id: entry.customer_id,
            amount: entry.amount.amount().clone(),
            transaction_type: entry.transaction_type.as_str().to_string(),
        })
        .collect();
    diesel::insert_into(credit_history::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

/// True when a response for `(saga_id, type)` was already recorded — the
/// duplicate-delivery no-op path. Races that slip past this check are caught
/// by the unique index on insert.
pub fn response_outbox_exists(
    conn: &mut PgConnection,
    saga_id: Uuid,
    message_type: &str,
) -> Result<bool, DomainError> {
    let count: i64 = payment_response_outbox::table
        .filter(payment_response_outbox::saga_id.eq(saga_id))
        .filter(payment_response_outbox::message_type.eq(message_type))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

pub fn insert_response_outbox(
    conn: &mut PgConnection,
    row: NewPaymentResponseOutboxRow,
) -> Result<(), DomainError> {
    diesel::insert_into(payment_response_outbox::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}
