use crate::error::DispatchError;
use crate::model::{Job, JobStatus, Manifest, ManifestStatus};

/// Status transition rules for jobs and manifests.
///
/// Jobs flow pending → assigned → in_progress → completed; manifests flow
/// draft → planning → scheduled → dispatched → in_transit → completed.
/// `cancelled` is reachable from any non-terminal state on both chains.
impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self == next {
            return false;
        }
        match (self, next) {
            (from, JobStatus::Cancelled) => !from.is_terminal(),
            (JobStatus::Pending, JobStatus::Assigned)
            | (JobStatus::Assigned, JobStatus::InProgress)
            | (JobStatus::InProgress, JobStatus::Completed) => true,
            _ => false,
        }
    }
}

impl ManifestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ManifestStatus::Completed | ManifestStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: ManifestStatus) -> bool {
        if self == next {
            return false;
        }
        match (self, next) {
            (from, ManifestStatus::Cancelled) => !from.is_terminal(),
            (ManifestStatus::Draft, ManifestStatus::Planning)
            | (ManifestStatus::Planning, ManifestStatus::Scheduled)
            | (ManifestStatus::Scheduled, ManifestStatus::Dispatched)
            | (ManifestStatus::Dispatched, ManifestStatus::InTransit)
            | (ManifestStatus::InTransit, ManifestStatus::Completed) => true,
            _ => false,
        }
    }
}

/// Apply a job status transition, rejecting anything outside the chain.
pub fn advance_job(job: &mut Job, next: JobStatus) -> Result<(), DispatchError> {
    if !job.status.can_transition_to(next) {
        return Err(DispatchError::InvalidTransition {
            from: job.status.to_string(),
            to: next.to_string(),
        });
    }
    job.status = next;
    Ok(())
}

/// Apply a manifest status transition. Entering `dispatched` or
/// `in_transit` additionally requires a driver and vehicle, the same
/// precondition dispatch itself enforces.
pub fn advance_manifest(manifest: &mut Manifest, next: ManifestStatus) -> Result<(), DispatchError> {
    if !manifest.status.can_transition_to(next) {
        return Err(DispatchError::InvalidTransition {
            from: manifest.status.to_string(),
            to: next.to_string(),
        });
    }
    if matches!(next, ManifestStatus::Dispatched | ManifestStatus::InTransit)
        && (manifest.driver_id.is_none() || manifest.vehicle_id.is_none())
    {
        return Err(DispatchError::MissingDriverOrVehicle);
    }
    manifest.status = next;
    Ok(())
}

/// Promote a job to `assigned` without reverting progress written by
/// execution collaborators. A pending job becomes assigned; a job already
/// in progress or further along keeps its status.
pub fn mark_assigned(job: &mut Job) {
    if job.status == JobStatus::Pending {
        job.status = JobStatus::Assigned;
    }
}
