//! Transactional outbox: status vocabulary shared by every outbox table,
//! plus the ports the sweepers run against.
//!
//! Rows are written inside the same database transaction as the domain
//! state they announce. The publish sweeper later pushes them onto the log
//! keyed by saga id; the cleanup sweeper removes completed rows after a
//! retention window.

pub mod sweeper;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Type discriminators carried in every outbox row (and the corresponding
/// request payloads).
pub const TYPE_PAY: &str = "PAY";
pub const TYPE_CANCEL: &str = "CANCEL";
pub const TYPE_APPROVE: &str = "APPROVE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Started,
    Completed,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Started => "STARTED",
            OutboxStatus::Completed => "COMPLETED",
            OutboxStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "STARTED" => Ok(OutboxStatus::Started),
            "COMPLETED" => Ok(OutboxStatus::Completed),
            "FAILED" => Ok(OutboxStatus::Failed),
            other => Err(DomainError::Internal(format!(
                "Unknown outbox status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStatus {
    Started,
    Processing,
    Succeeded,
    Compensating,
    Compensated,
    Failed,
}

impl SagaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Started => "STARTED",
            SagaStatus::Processing => "PROCESSING",
            SagaStatus::Succeeded => "SUCCEEDED",
            SagaStatus::Compensating => "COMPENSATING",
            SagaStatus::Compensated => "COMPENSATED",
            SagaStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "STARTED" => Ok(SagaStatus::Started),
            "PROCESSING" => Ok(SagaStatus::Processing),
            "SUCCEEDED" => Ok(SagaStatus::Succeeded),
            "COMPENSATING" => Ok(SagaStatus::Compensating),
            "COMPENSATED" => Ok(SagaStatus::Compensated),
            "FAILED" => Ok(SagaStatus::Failed),
            other => Err(DomainError::Internal(format!(
                "Unknown saga status '{other}'"
            ))),
        }
    }
}

/// An outbox row as seen by the publish sweeper.
#[derive(Debug, Clone)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub message_type: String,
    pub payload: Value,
    pub outbox_status: OutboxStatus,
    pub version: i32,
}

/// Row operations one outbox table exposes to its sweepers.
///
/// The `mark_*` updates are compare-and-set on `(id, version)`: `Ok(false)`
/// means a concurrent sweeper already moved the row, and the caller must
/// leave status management to the winner.
pub trait OutboxStore: Send + Sync {
    /// Rows awaiting publication (STARTED or FAILED), oldest first.
    fn fetch_unpublished(&self, limit: i64) -> Result<Vec<OutboxMessage>, DomainError>;

    fn mark_published(&self, id: Uuid, expected_version: i32) -> Result<bool, DomainError>;

    fn mark_failed(&self, id: Uuid, expected_version: i32) -> Result<bool, DomainError>;

    /// Deletes COMPLETED rows older than `cutoff`; FAILED rows are retained.
    fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError>;
}

#[derive(Debug, Error)]
#[error("publish to '{topic}' failed: {reason}")]
pub struct PublishError {
    pub topic: String,
    pub reason: String,
}

/// Log-port publisher keyed by saga id.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbox_status_round_trips_through_strings() {
        for status in [
            OutboxStatus::Started,
            OutboxStatus::Completed,
            OutboxStatus::Failed,
        ] {
            assert_eq!(OutboxStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(OutboxStatus::parse("DONE").is_err());
    }

    #[test]
    fn saga_status_round_trips_through_strings() {
        for status in [
            SagaStatus::Started,
            SagaStatus::Processing,
            SagaStatus::Succeeded,
            SagaStatus::Compensating,
            SagaStatus::Compensated,
            SagaStatus::Failed,
        ] {
            assert_eq!(SagaStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(SagaStatus::parse("RUNNING").is_err());
    }
}
