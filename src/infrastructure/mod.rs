pub mod customer_repo;
pub mod models;
pub mod order_repo;
pub mod outbox_repo;
pub mod payment_repo;
pub mod restaurant_repo;

use diesel::result::DatabaseErrorKind;

use crate::domain::errors::DomainError;

/// Re-runs an optimistically-locked unit of work after a lost version race.
///
/// The closure must re-read everything it writes, so a re-run either applies
/// cleanly or discovers the work is already done. Conflicts still standing
/// after `attempts` tries surface to the caller.
pub fn retry_on_conflict<T, F>(attempts: u32, mut f: F) -> Result<T, DomainError>
where
    F: FnMut() -> Result<T, DomainError>,
{
    let mut remaining = attempts.max(1);
    loop {
        match f() {
            Err(DomainError::Conflict) if remaining > 1 => {
                remaining -= 1;
                log::debug!("optimistic lock conflict, retrying ({remaining} attempts left)");
            }
            other => return other,
        }
    }
}

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
            | diesel::result::Error::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                DomainError::Conflict
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}
