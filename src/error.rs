use std::fmt;

use thiserror::Error;

use crate::store::{EntityKind, StoreError};
use crate::validate::SequenceRule;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("schedule conflict at stop {stop_index}: {rule}")]
    Validation { stop_index: usize, rule: SequenceRule },

    #[error("job needs at least 2 stops with addresses, found {found}")]
    InsufficientStops { found: usize },

    #[error("driver and vehicle are required for dispatch")]
    MissingDriverOrVehicle,

    #[error("driver {driver_id} has no assigned vehicle")]
    NoVehicleForDriver { driver_id: String },

    #[error("{0}")]
    PartialAttach(PartialAttachFailure),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("job {job_id} is already staged on the board")]
    AlreadyStaged { job_id: String },

    #[error("new ordering does not match the board contents")]
    ReorderMismatch,

    #[error("record store error: {0}")]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// Shorthand for a missing-record error.
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Per-job detail for a dispatch where the manifest was created but one or
/// more job attachments failed. Surfaced in full so the caller can retry
/// just the failed subset; already-attached jobs are never rolled back.
#[derive(Debug, Clone)]
pub struct PartialAttachFailure {
    pub manifest_id: String,
    pub attached: Vec<String>,
    pub failed: Vec<AttachFailure>,
}

/// One failed job attachment and the reason it failed.
#[derive(Debug, Clone)]
pub struct AttachFailure {
    pub job_id: String,
    pub reason: String,
}

impl fmt::Display for PartialAttachFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "manifest {}: {} job(s) attached, {} failed",
            self.manifest_id,
            self.attached.len(),
            self.failed.len()
        )?;
        for failure in &self.failed {
            write!(f, "; {}: {}", failure.job_id, failure.reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_attach_lists_every_failure() {
        let err = PartialAttachFailure {
            manifest_id: "m1".into(),
            attached: vec!["j1".into()],
            failed: vec![
                AttachFailure {
                    job_id: "j2".into(),
                    reason: "already attached to manifest m0".into(),
                },
                AttachFailure {
                    job_id: "j3".into(),
                    reason: "job vanished".into(),
                },
            ],
        };

        let text = err.to_string();
        assert!(text.contains("1 job(s) attached"));
        assert!(text.contains("j2: already attached to manifest m0"));
        assert!(text.contains("j3: job vanished"));
    }

    #[test]
    fn validation_error_names_the_rule() {
        let err = DispatchError::Validation {
            stop_index: 2,
            rule: SequenceRule::TimeOrder,
        };
        assert_eq!(err.to_string(), "schedule conflict at stop 2: time-order");
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = DispatchError::not_found(EntityKind::Driver, "d-9");
        assert_eq!(err.to_string(), "driver not found: d-9");
    }
}
