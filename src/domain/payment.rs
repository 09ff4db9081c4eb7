//! Payment-side domain rules: a payment record per order plus the customer's
//! credit bookkeeping. The invariant is that total credits never fall below
//! total debits, and the credit entry always equals their difference.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Completed,
    Cancelled,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "CANCELLED" => Ok(PaymentStatus::Cancelled),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(DomainError::Internal(format!(
                "Unknown payment status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "DEBIT",
            TransactionType::Credit => "CREDIT",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "DEBIT" => Ok(TransactionType::Debit),
            "CREDIT" => Ok(TransactionType::Credit),
            other => Err(DomainError::Internal(format!(
                "Unknown transaction type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub price: Money,
    pub status: Option<PaymentStatus>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(order_id: Uuid, customer_id: Uuid, price: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            customer_id,
            price,
            status: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreditEntry {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total_credit_amount: Money,
}

#[derive(Debug, Clone)]
pub struct CreditHistoryEntry {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: Money,
    pub transaction_type: TransactionType,
}

/// Debits the order price from the customer's credit. On success the payment
/// is COMPLETED, the credit entry is reduced, and a DEBIT history entry is
/// appended; on any rule violation the payment is FAILED and the returned
/// failure messages are non-empty (credit state untouched).
pub fn initiate_payment(
    payment: &mut Payment,
    credit_entry: &mut CreditEntry,
    credit_history: &mut Vec<CreditHistoryEntry>,
) -> Vec<String> {
    let mut failures = Vec::new();

    if !payment.price.is_greater_than_zero() {
        failures.push(format!(
            "Payment price {} must be greater than zero",
            payment.price
        ));
    }
    if payment.price.is_greater_than(&credit_entry.total_credit_amount) {
        failures.push(format!(
            "Customer with id={} has no enough credit for payment",
            payment.customer_id
        ));
    }

    if failures.is_empty() {
        credit_entry.total_credit_amount =
            credit_entry.total_credit_amount.subtract(&payment.price);
        credit_history.push(CreditHistoryEntry {
            id: Uuid::new_v4(),
            customer_id: payment.customer_id,
            amount: payment.price.clone(),
            transaction_type: TransactionType::Debit,
        });
        validate_credit_history(credit_entry, credit_history, &mut failures);
    }

    payment.status = Some(if failures.is_empty() {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Failed
    });
    failures
}

/// Credits the order price back to the customer (compensation). On success
/// the payment is CANCELLED and a CREDIT history entry is appended.
pub fn cancel_payment(
    payment: &mut Payment,
    credit_entry: &mut CreditEntry,
    credit_history: &mut Vec<CreditHistoryEntry>,
) -> Vec<String> {
    let mut failures = Vec::new();

    if !payment.price.is_greater_than_zero() {
        failures.push(format!(
            "Payment price {} must be greater than zero",
            payment.price
        ));
    }

    if failures.is_empty() {
        credit_entry.total_credit_amount = credit_entry.total_credit_amount.add(&payment.price);
        credit_history.push(CreditHistoryEntry {
            id: Uuid::new_v4(),
            customer_id: payment.customer_id,
            amount: payment.price.clone(),
            transaction_type: TransactionType::Credit,
        });
    }

    payment.status = Some(if failures.is_empty() {
        PaymentStatus::Cancelled
    } else {
        PaymentStatus::Failed
    });
    failures
}

fn validate_credit_history(
    credit_entry: &CreditEntry,
    credit_history: &[CreditHistoryEntry],
    failures: &mut Vec<String>,
) {
    let total_credit = total_of(credit_history, TransactionType::Credit);
    let total_debit = total_of(credit_history, TransactionType::Debit);

    if total_debit.is_greater_than(&total_credit) {
        failures.push(format!(
            "Customer with id={} has no enough credit according to credit history",
            credit_entry.customer_id
        ));
    }
    if credit_entry.total_credit_amount != total_credit.subtract(&total_debit) {
        failures.push(format!(
            "Credit history total is not equal to current credit for customer id={}",
            credit_entry.customer_id
        ));
    }
}

fn total_of(history: &[CreditHistoryEntry], transaction_type: TransactionType) -> Money {
    history
        .iter()
        .filter(|h| h.transaction_type == transaction_type)
        .fold(Money::zero(), |acc, h| acc.add(&h.amount))
}
