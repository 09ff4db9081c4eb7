//! The choreographed saga engine of the Order service.
//!
//! Each step reacts to a response event: `process` advances the saga on
//! success, `rollback` compensates on failure. Every handler runs its reads,
//! the aggregate transition, and all outbox writes in one database
//! transaction; a missing `(saga_id, saga_status)` outbox row means the
//! event was already applied and the handler is a silent no-op.

pub mod approval_saga;
pub mod payment_saga;

use crate::domain::errors::DomainError;

/// One step of a saga: a forward action and its compensation.
pub trait SagaStep<T> {
    fn process(&self, data: &T) -> Result<(), DomainError>;
    fn rollback(&self, data: &T) -> Result<(), DomainError>;
}
