//! Outbox row operations.
//!
//! The first half serves the saga engine: locating and completing the Order
//! service's outbox rows inside the same transaction as the aggregate
//! update. The second half adapts each outbox table to the [`OutboxStore`]
//! port the sweepers run against.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::outbox::{OutboxMessage, OutboxStatus, OutboxStore, SagaStatus};
use crate::schema::{payment_outbox, restaurant_approval_outbox};

use super::models::{
    ApprovalOutboxRow, NewApprovalOutboxRow, NewPaymentOutboxRow, PaymentOutboxRow,
};

// ── Order-side payment outbox ─────────────────────────────────────────────────

pub fn insert_payment_outbox(
    conn: &mut PgConnection,
    row: NewPaymentOutboxRow,
) -> Result<(), DomainError> {
    diesel::insert_into(payment_outbox::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

/// The row for `saga_id` whose saga status is one of `statuses`. Absence
/// means the response was already acknowledged (the idempotent no-op path).
pub fn find_payment_outbox(
    conn: &mut PgConnection,
    saga_id: Uuid,
    statuses: &[SagaStatus],
) -> Result<Option<PaymentOutboxRow>, DomainError> {
    let status_strs: Vec<&str> = statuses.iter().map(SagaStatus::as_str).collect();
    Ok(payment_outbox::table
        .filter(payment_outbox::saga_id.eq(saga_id))
        .filter(payment_outbox::saga_status.eq_any(status_strs))
        .select(PaymentOutboxRow::as_select())
        .first(conn)
        .optional()?)
}

/// Acknowledges an inbound payment response on its outbox row. CAS on the
/// version column; `false` means a concurrent consumer already did it.
pub fn complete_payment_outbox(
    conn: &mut PgConnection,
    id: Uuid,
    expected_version: i32,
    saga_status: SagaStatus,
) -> Result<bool, DomainError> {
    let updated = diesel::update(
        payment_outbox::table
            .filter(payment_outbox::id.eq(id))
            .filter(payment_outbox::version.eq(expected_version)),
    )
    .set((
        payment_outbox::saga_status.eq(saga_status.as_str()),
        payment_outbox::outbox_status.eq(OutboxStatus::Completed.as_str()),
        payment_outbox::processed_at.eq(Some(Utc::now())),
        payment_outbox::version.eq(expected_version + 1),
    ))
    .execute(conn)?;
    Ok(updated == 1)
}

// ── Order-side restaurant approval outbox ─────────────────────────────────────

pub fn insert_approval_outbox(
    conn: &mut PgConnection,
    row: NewApprovalOutboxRow,
) -> Result<(), DomainError> {
    diesel::insert_into(restaurant_approval_outbox::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

pub fn find_approval_outbox(
    conn: &mut PgConnection,
    saga_id: Uuid,
    statuses: &[SagaStatus],
) -> Result<Option<ApprovalOutboxRow>, DomainError> {
    let status_strs: Vec<&str> = statuses.iter().map(SagaStatus::as_str).collect();
    Ok(restaurant_approval_outbox::table
        .filter(restaurant_approval_outbox::saga_id.eq(saga_id))
        .filter(restaurant_approval_outbox::saga_status.eq_any(status_strs))
        .select(ApprovalOutboxRow::as_select())
        .first(conn)
        .optional()?)
}

pub fn complete_approval_outbox(
    conn: &mut PgConnection,
    id: Uuid,
    expected_version: i32,
    saga_status: SagaStatus,
) -> Result<bool, DomainError> {
    let updated = diesel::update(
        restaurant_approval_outbox::table
            .filter(restaurant_approval_outbox::id.eq(id))
            .filter(restaurant_approval_outbox::version.eq(expected_version)),
    )
    .set((
        restaurant_approval_outbox::saga_status.eq(saga_status.as_str()),
        restaurant_approval_outbox::outbox_status.eq(OutboxStatus::Completed.as_str()),
        restaurant_approval_outbox::processed_at.eq(Some(Utc::now())),
        restaurant_approval_outbox::version.eq(expected_version + 1),
    ))
    .execute(conn)?;
    Ok(updated == 1)
}

/// Latest saga status recorded for a saga across the Order service's two
/// outbox tables (the tracking/operator surface).
pub fn latest_saga_status(
    conn: &mut PgConnection,
    saga_id: Uuid,
) -> Result<Option<SagaStatus>, DomainError> {
    let payment: Option<(DateTime<Utc>, String)> = payment_outbox::table
        .filter(payment_outbox::saga_id.eq(saga_id))
        .order(payment_outbox::created_at.desc())
        .select((payment_outbox::created_at, payment_outbox::saga_status))
        .first(conn)
        .optional()?;
    let approval: Option<(DateTime<Utc>, String)> = restaurant_approval_outbox::table
        .filter(restaurant_approval_outbox::saga_id.eq(saga_id))
        .order(restaurant_approval_outbox::created_at.desc())
        .select((
            restaurant_approval_outbox::created_at,
            restaurant_approval_outbox::saga_status,
        ))
        .first(conn)
        .optional()?;

    let latest = match (payment, approval) {
        (Some(p), Some(a)) => Some(if a.0 > p.0 { a } else { p }),
        (p, a) => p.or(a),
    };
    latest.map(|(_, status)| SagaStatus::parse(&status)).transpose()
}

// ── Sweeper stores ────────────────────────────────────────────────────────────

/// Adapts one outbox table to the sweeper port. The four tables share the
/// sweeper-relevant columns, so the adapter is stamped out per table.
macro_rules! diesel_outbox_store {
    ($(#[$doc:meta])* $name:ident, $table:ident) => {
        $(#[$doc])*
        pub struct $name {
            pool: DbPool,
        }

        impl $name {
            pub fn new(pool: DbPool) -> Self {
                Self { pool }
            }
        }

        impl OutboxStore for $name {
            fn fetch_unpublished(&self, limit: i64) -> Result<Vec<OutboxMessage>, DomainError> {
                use crate::schema::$table::dsl;
                let mut conn = self.pool.get()?;
                let rows: Vec<(
                    Uuid,
                    Uuid,
                    DateTime<Utc>,
                    String,
                    serde_json::Value,
                    String,
                    i32,
                )> = dsl::$table
                    .filter(dsl::outbox_status.eq_any([
                        OutboxStatus::Started.as_str(),
                        OutboxStatus::Failed.as_str(),
                    ]))
                    .order(dsl::created_at.asc())
                    .limit(limit)
                    .select((
                        dsl::id,
                        dsl::saga_id,
                        dsl::created_at,
                        dsl::message_type,
                        dsl::payload,
                        dsl::outbox_status,
                        dsl::version,
                    ))
                    .load(&mut conn)?;

                rows.into_iter()
                    .map(
                        |(id, saga_id, created_at, message_type, payload, outbox_status, version)| {
                            Ok(OutboxMessage {
                                id,
                                saga_id,
                                created_at,
                                message_type,
                                payload,
                                outbox_status: OutboxStatus::parse(&outbox_status)?,
                                version,
                            })
                        },
                    )
                    .collect()
            }

            fn mark_published(&self, id: Uuid, expected_version: i32) -> Result<bool, DomainError> {
                use crate::schema::$table::dsl;
                let mut conn = self.pool.get()?;
                let updated = diesel::update(
                    dsl::$table
                        .filter(dsl::id.eq(id))
                        .filter(dsl::version.eq(expected_version)),
                )
                .set((
                    dsl::outbox_status.eq(OutboxStatus::Completed.as_str()),
                    dsl::processed_at.eq(Some(Utc::now())),
                    dsl::version.eq(expected_version + 1),
                ))
                .execute(&mut conn)?;
                Ok(updated == 1)
            }

            fn mark_failed(&self, id: Uuid, expected_version: i32) -> Result<bool, DomainError> {
                use crate::schema::$table::dsl;
                let mut conn = self.pool.get()?;
                let updated = diesel::update(
                    dsl::$table
                        .filter(dsl::id.eq(id))
                        .filter(dsl::version.eq(expected_version)),
                )
                .set((
                    dsl::outbox_status.eq(OutboxStatus::Failed.as_str()),
                    dsl::version.eq(expected_version + 1),
                ))
                .execute(&mut conn)?;
                Ok(updated == 1)
            }

            fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
                use crate::schema::$table::dsl;
                let mut conn = self.pool.get()?;
                let deleted = diesel::delete(
                    dsl::$table
                        .filter(dsl::outbox_status.eq(OutboxStatus::Completed.as_str()))
                        .filter(dsl::created_at.lt(cutoff)),
                )
                .execute(&mut conn)?;
                Ok(deleted)
            }
        }
    };
}

diesel_outbox_store!(
    /// Sweeper store over the Order service's payment request outbox.
    PaymentOutboxSweepStore,
    payment_outbox
);
diesel_outbox_store!(
    /// Sweeper store over the Order service's restaurant approval outbox.
    ApprovalOutboxSweepStore,
    restaurant_approval_outbox
);
diesel_outbox_store!(
    /// Sweeper store over the Payment service's response outbox.
    PaymentResponseOutboxSweepStore,
    payment_response_outbox
);
diesel_outbox_store!(
    /// Sweeper store over the Restaurant service's response outbox.
    ApprovalResponseOutboxSweepStore,
    restaurant_approval_response_outbox
);
