//! Interactive placement: the drag/drop-driven workflow that moves jobs
//! between the unassigned pool and a manifest-in-progress, reorders them,
//! and reshifts calendar events onto new drivers or time slots.
//!
//! Board edits are pure staging; nothing is persisted until the resolver's
//! dispatch runs. The drag source is an explicit value handed to each
//! operation and consumed by it, so a job can never be considered dragged
//! from two places at once.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::error::DispatchError;
use crate::lifecycle::mark_assigned;
use crate::model::{Arrival, Job, Stop};
use crate::store::{ChangedEntity, EntityKind, RecordStore};
use crate::validate::sync_legacy_schedule;

/// Where a drag started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOrigin {
    Pool,
    Board,
}

/// The one in-flight dragged job. Consumed by the operation that completes
/// the drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSource {
    pub job_id: String,
    pub origin: DragOrigin,
}

impl DragSource {
    pub fn from_pool(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            origin: DragOrigin::Pool,
        }
    }

    pub fn from_board(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            origin: DragOrigin::Board,
        }
    }
}

/// Staging list for a manifest being assembled. Holds job ids only; the
/// jobs themselves stay in the pool until dispatch commits the board.
#[derive(Debug, Default)]
pub struct CandidateBoard {
    candidates: Vec<String>,
}

impl CandidateBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.candidates.iter().any(|id| id == job_id)
    }

    /// Complete a drop onto the board. A pool drag inserts the job (a
    /// retried drop of an already-staged job is rejected and changes
    /// nothing); a board drag moves it to the new position.
    pub fn place(&mut self, drag: DragSource, position: Option<usize>) -> Result<(), DispatchError> {
        match drag.origin {
            DragOrigin::Pool => {
                if self.contains(&drag.job_id) {
                    return Err(DispatchError::AlreadyStaged {
                        job_id: drag.job_id,
                    });
                }
            }
            DragOrigin::Board => {
                let Some(current) = self.candidates.iter().position(|id| *id == drag.job_id)
                else {
                    return Err(DispatchError::not_found(EntityKind::Job, &drag.job_id));
                };
                self.candidates.remove(current);
            }
        }

        let index = position
            .unwrap_or(self.candidates.len())
            .min(self.candidates.len());
        self.candidates.insert(index, drag.job_id);
        Ok(())
    }

    /// Return a job to the pool. Reports whether it was on the board.
    pub fn remove(&mut self, job_id: &str) -> bool {
        let before = self.candidates.len();
        self.candidates.retain(|id| id != job_id);
        self.candidates.len() != before
    }

    /// Replace the board order with `new_order` and return the recomputed
    /// 1-based sequence for every job. Ordering only: no driver/vehicle
    /// fields move and nothing is dispatched. The new order must be a
    /// permutation of the board.
    pub fn reorder(&mut self, new_order: &[String]) -> Result<Vec<(String, u32)>, DispatchError> {
        if !is_permutation(&self.candidates, new_order) {
            return Err(DispatchError::ReorderMismatch);
        }
        self.candidates = new_order.to_vec();
        Ok(self
            .candidates
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), (index + 1) as u32))
            .collect())
    }
}

fn is_permutation(current: &[String], incoming: &[String]) -> bool {
    if current.len() != incoming.len() {
        return false;
    }
    let incoming_set: HashSet<&str> = incoming.iter().map(String::as_str).collect();
    if incoming_set.len() != incoming.len() {
        return false;
    }
    current.iter().all(|id| incoming_set.contains(id.as_str()))
}

/// A calendar reschedule request: a new start instant, a new driver, or
/// both.
#[derive(Debug, Clone)]
pub struct ShiftRequest {
    pub job_id: String,
    pub new_start: Option<DateTime<Utc>>,
    pub new_driver_id: Option<String>,
}

/// Outcome of a reshift. The reassignment and reschedule sub-operations are
/// independent; each is reported on its own so a driver failure is never
/// conflated with a time failure.
#[derive(Debug, Default)]
pub struct ShiftOutcome {
    pub reassignment: Option<Result<(), DispatchError>>,
    pub reschedule: Option<Result<(), DispatchError>>,
    pub changed: Vec<ChangedEntity>,
}

impl ShiftOutcome {
    pub fn fully_applied(&self) -> bool {
        let step_ok = |step: &Option<Result<(), DispatchError>>| {
            step.as_ref().map(Result::is_ok).unwrap_or(true)
        };
        step_ok(&self.reassignment) && step_ok(&self.reschedule)
    }
}

/// Drives reorder persistence and calendar reshifts against a record store.
pub struct PlacementEngine<'a, S> {
    store: &'a S,
    default_window: Duration,
}

impl<'a, S: RecordStore> PlacementEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_default_window(store, 4)
    }

    /// `default_window_hours` is the window width applied when a window
    /// stop is shifted before its bounds were ever set.
    pub fn with_default_window(store: &'a S, default_window_hours: i64) -> Self {
        Self {
            store,
            default_window: Duration::hours(default_window_hours),
        }
    }

    /// Persist a new ordering for a manifest's jobs: `sequence_order`
    /// becomes 1..N in the given order. Jobs whose position did not change
    /// are left alone. The order must cover exactly the manifest's jobs,
    /// checked before anything is written.
    pub async fn apply_reorder(
        &self,
        manifest_id: &str,
        new_order: &[String],
    ) -> Result<Vec<ChangedEntity>, DispatchError> {
        let manifest = self
            .store
            .get_manifest(manifest_id)
            .await?
            .ok_or_else(|| DispatchError::not_found(EntityKind::Manifest, manifest_id))?;
        let jobs = self.store.jobs_for_manifest(manifest_id).await?;

        let current: Vec<String> = jobs.iter().map(|j| j.id.clone()).collect();
        if !is_permutation(&current, new_order) {
            return Err(DispatchError::ReorderMismatch);
        }

        let mut by_id: HashMap<String, Job> =
            jobs.into_iter().map(|j| (j.id.clone(), j)).collect();
        let mut changed = vec![ChangedEntity::manifest(&manifest.id)];

        for (index, id) in new_order.iter().enumerate() {
            let Some(mut job) = by_id.remove(id) else {
                continue;
            };
            let sequence = (index + 1) as u32;
            if job.sequence_order == Some(sequence) {
                continue;
            }
            job.sequence_order = Some(sequence);
            let saved = self.store.put_job(&job).await?;
            changed.push(ChangedEntity::job(&saved.id));
        }

        Ok(changed)
    }

    /// Move a calendar event: change the job's driver, its start time, or
    /// both. The job itself must exist; past that, the two sub-operations
    /// run independently and the outcome reports each one separately. The
    /// job is persisted once, only when at least one step applied.
    pub async fn reshift(&self, request: &ShiftRequest) -> Result<ShiftOutcome, DispatchError> {
        let mut job = self
            .store
            .get_job(&request.job_id)
            .await?
            .ok_or_else(|| DispatchError::not_found(EntityKind::Job, &request.job_id))?;

        let mut outcome = ShiftOutcome::default();
        let mut dirty = false;

        if let Some(driver_id) = &request.new_driver_id {
            match self.reassign(&mut job, driver_id).await {
                Ok(()) => {
                    outcome.reassignment = Some(Ok(()));
                    dirty = true;
                }
                Err(err) => outcome.reassignment = Some(Err(err)),
            }
        }

        if let Some(new_start) = request.new_start {
            match shift_first_stop(&mut job, new_start, self.default_window) {
                Ok(()) => {
                    outcome.reschedule = Some(Ok(()));
                    dirty = true;
                }
                Err(err) => outcome.reschedule = Some(Err(err)),
            }
        }

        if dirty {
            let saved = self.store.put_job(&job).await?;
            outcome.changed.push(ChangedEntity::job(&saved.id));
        }

        Ok(outcome)
    }

    /// Degraded drop path for a job created outside the current view, whose
    /// stop data is not locally available: reassign the driver/vehicle and
    /// move the legacy schedule fields only. Stop-level times are left
    /// untouched because the engine cannot see them here; the stop-aware
    /// reshift is the precise path.
    pub async fn external_drop(
        &self,
        job_id: &str,
        new_start: Option<DateTime<Utc>>,
        new_driver_id: Option<&str>,
    ) -> Result<ShiftOutcome, DispatchError> {
        let mut job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| DispatchError::not_found(EntityKind::Job, job_id))?;

        let mut outcome = ShiftOutcome::default();
        let mut dirty = false;

        if let Some(driver_id) = new_driver_id {
            match self.reassign(&mut job, driver_id).await {
                Ok(()) => {
                    outcome.reassignment = Some(Ok(()));
                    dirty = true;
                }
                Err(err) => outcome.reassignment = Some(Err(err)),
            }
        }

        if let Some(start) = new_start {
            job.scheduled_date = Some(start.date_naive());
            job.scheduled_time = Some(start.time());
            outcome.reschedule = Some(Ok(()));
            dirty = true;
        }

        if dirty {
            let saved = self.store.put_job(&job).await?;
            outcome.changed.push(ChangedEntity::job(&saved.id));
        }

        Ok(outcome)
    }

    /// Point the job at a new driver, taking the driver's own vehicle.
    /// Leaves the job untouched on failure.
    async fn reassign(&self, job: &mut Job, driver_id: &str) -> Result<(), DispatchError> {
        let driver = self
            .store
            .get_driver(driver_id)
            .await?
            .ok_or_else(|| DispatchError::not_found(EntityKind::Driver, driver_id))?;
        let vehicle_id =
            driver
                .assigned_vehicle_id
                .ok_or_else(|| DispatchError::NoVehicleForDriver {
                    driver_id: driver_id.to_string(),
                })?;

        job.driver_id = Some(driver_id.to_string());
        job.vehicle_id = Some(vehicle_id);
        mark_assigned(job);
        Ok(())
    }
}

/// Rewrite the first stop's arrival for a new start instant. Window stops
/// keep their original width; a window that never had bounds gets the
/// default width. Fixed stops move to the instant directly. The legacy
/// schedule fields are re-synced afterwards.
fn shift_first_stop(
    job: &mut Job,
    new_start: DateTime<Utc>,
    default_window: Duration,
) -> Result<(), DispatchError> {
    let width = job
        .first_stop()
        .and_then(Stop::window_duration)
        .filter(|w| *w >= Duration::zero());

    let Some(stop) = job.first_stop_mut() else {
        return Err(DispatchError::InsufficientStops { found: 0 });
    };

    match &mut stop.arrival {
        Arrival::Fixed { scheduled_arrival } => *scheduled_arrival = Some(new_start),
        Arrival::Window {
            window_start,
            window_end,
        } => {
            let width = width.unwrap_or(default_window);
            *window_start = Some(new_start);
            *window_end = Some(new_start + width);
        }
    }

    sync_legacy_schedule(job);
    Ok(())
}
