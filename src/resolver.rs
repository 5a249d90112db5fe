use chrono::NaiveDate;

use crate::error::{AttachFailure, DispatchError, PartialAttachFailure};
use crate::lifecycle::mark_assigned;
use crate::model::{Job, Manifest};
use crate::store::{ChangedEntity, EntityKind, RecordStore};
use crate::validate::{sync_legacy_schedule, validate_job};

/// What a dispatch changed: the manifest (for multi-job dispatches), the
/// jobs that were assigned, and the full invalidation list for the caller's
/// cache layer.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub manifest: Option<Manifest>,
    pub assigned: Vec<String>,
    pub changed: Vec<ChangedEntity>,
}

/// Commit a driver/vehicle assignment for the selected jobs.
///
/// Cardinality selects the mode: exactly one job becomes a direct
/// assignment with no manifest; more than one job is wrapped into a single
/// manifest with `sequence_order` following the input order. An empty
/// selection is a no-op.
///
/// Every job is loaded and validated before the first write, so validation
/// failures never leave partial state behind. The manifest is keyed on the
/// sorted job-id set: a caller that never saw the response can safely
/// re-invoke the same dispatch and the existing manifest is reused instead
/// of a second one being created. When individual attachments fail after
/// the manifest exists, the error reports exactly which jobs attached and
/// which did not; re-invoking with the same selection retries only the
/// missing attachments.
pub async fn dispatch(
    store: &impl RecordStore,
    job_ids: &[String],
    driver_id: &str,
    vehicle_id: Option<&str>,
    manifest_date: NaiveDate,
) -> Result<DispatchOutcome, DispatchError> {
    if job_ids.is_empty() {
        return Ok(DispatchOutcome::default());
    }
    if driver_id.trim().is_empty() {
        return Err(DispatchError::MissingDriverOrVehicle);
    }

    let driver = store
        .get_driver(driver_id)
        .await?
        .ok_or_else(|| DispatchError::not_found(EntityKind::Driver, driver_id))?;

    // Fall back to the driver's own vehicle when none is supplied.
    let vehicle_id = vehicle_id
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .or_else(|| driver.assigned_vehicle_id.clone())
        .ok_or_else(|| DispatchError::NoVehicleForDriver {
            driver_id: driver_id.to_string(),
        })?;
    store
        .get_vehicle(&vehicle_id)
        .await?
        .ok_or_else(|| DispatchError::not_found(EntityKind::Vehicle, &vehicle_id))?;

    // Load and validate the whole selection before writing anything.
    let mut jobs = Vec::with_capacity(job_ids.len());
    for id in job_ids {
        let job = store
            .get_job(id)
            .await?
            .ok_or_else(|| DispatchError::not_found(EntityKind::Job, id))?;
        validate_job(&job)?;
        jobs.push(job);
    }

    if jobs.len() == 1 {
        let mut job = jobs.remove(0);
        assign(&mut job, driver_id, &vehicle_id);
        let saved = store.put_job(&job).await?;
        return Ok(DispatchOutcome {
            manifest: None,
            assigned: vec![saved.id.clone()],
            changed: vec![ChangedEntity::job(&saved.id)],
        });
    }

    let key = Manifest::dispatch_key_for(job_ids);
    let manifest = match store.find_manifest_by_key(&key).await? {
        Some(existing) => existing,
        None => {
            store
                .create_manifest(&Manifest::scheduled(
                    driver_id,
                    &vehicle_id,
                    manifest_date,
                    &key,
                ))
                .await?
        }
    };

    let mut attached = Vec::new();
    let mut failed = Vec::new();
    let mut changed = vec![ChangedEntity::manifest(&manifest.id)];

    for (index, mut job) in jobs.into_iter().enumerate() {
        if let Some(other) = job.manifest_id.clone() {
            if other != manifest.id {
                failed.push(AttachFailure {
                    job_id: job.id.clone(),
                    reason: format!("already attached to manifest {other}"),
                });
                continue;
            }
        }

        job.manifest_id = Some(manifest.id.clone());
        job.sequence_order = Some((index + 1) as u32);
        assign(&mut job, driver_id, &vehicle_id);

        match store.put_job(&job).await {
            Ok(saved) => {
                changed.push(ChangedEntity::job(&saved.id));
                attached.push(saved.id);
            }
            Err(err) => failed.push(AttachFailure {
                job_id: job.id.clone(),
                reason: err.to_string(),
            }),
        }
    }

    if !failed.is_empty() {
        return Err(DispatchError::PartialAttach(PartialAttachFailure {
            manifest_id: manifest.id.clone(),
            attached,
            failed,
        }));
    }

    Ok(DispatchOutcome {
        manifest: Some(manifest),
        assigned: attached,
        changed,
    })
}

fn assign(job: &mut Job, driver_id: &str, vehicle_id: &str) {
    job.driver_id = Some(driver_id.to_string());
    job.vehicle_id = Some(vehicle_id.to_string());
    mark_assigned(job);
    sync_legacy_schedule(job);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Driver, JobStatus, ManifestStatus, Stop, StopType, Vehicle};
    use crate::store::MemoryStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn valid_job(name: &str) -> Job {
        Job::new(name)
            .with_stop(
                Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd")
                    .with_start(at(9, 0))
                    .with_service_duration(20),
            )
            .with_stop(Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(10, 0)))
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed_driver(Driver::new("d1", "Sam Torres").with_vehicle("v1"));
        store.seed_vehicle(Vehicle::new("v1", "Box truck 1"));
        store
    }

    #[tokio::test]
    async fn single_job_is_a_direct_assignment() {
        let store = seeded_store();
        let job = valid_job("Acme Freight");
        let id = job.id.clone();
        store.seed_job(job);

        let outcome = dispatch(&store, &[id.clone()], "d1", None, date())
            .await
            .unwrap();

        assert!(outcome.manifest.is_none());
        assert_eq!(store.manifest_count(), 0);
        assert_eq!(outcome.assigned, vec![id.clone()]);

        let saved = store.job(&id).unwrap();
        assert_eq!(saved.status, JobStatus::Assigned);
        assert_eq!(saved.driver_id.as_deref(), Some("d1"));
        assert_eq!(saved.vehicle_id.as_deref(), Some("v1"));
        assert!(saved.manifest_id.is_none());
        // Legacy projection follows the first stop.
        assert_eq!(saved.scheduled_date, Some(date()));
        assert_eq!(saved.scheduled_time, Some(at(9, 0).time()));
    }

    #[tokio::test]
    async fn multiple_jobs_become_one_manifest_in_input_order() {
        let store = seeded_store();
        let j1 = valid_job("First");
        let j2 = valid_job("Second");
        let ids = vec![j1.id.clone(), j2.id.clone()];
        store.seed_job(j1);
        store.seed_job(j2);

        let outcome = dispatch(&store, &ids, "d1", Some("v1"), date())
            .await
            .unwrap();

        let manifest = outcome.manifest.unwrap();
        assert_eq!(manifest.status, ManifestStatus::Scheduled);
        assert_eq!(manifest.driver_id.as_deref(), Some("d1"));
        assert_eq!(manifest.scheduled_date, Some(date()));
        assert_eq!(store.manifest_count(), 1);

        let first = store.job(&ids[0]).unwrap();
        let second = store.job(&ids[1]).unwrap();
        assert_eq!(first.manifest_id.as_deref(), Some(manifest.id.as_str()));
        assert_eq!(second.manifest_id.as_deref(), Some(manifest.id.as_str()));
        assert_eq!(first.sequence_order, Some(1));
        assert_eq!(second.sequence_order, Some(2));
        assert_eq!(first.status, JobStatus::Assigned);

        // The invalidation list names the manifest and both jobs.
        assert_eq!(outcome.changed.len(), 3);
        assert_eq!(outcome.changed[0], ChangedEntity::manifest(&manifest.id));
    }

    #[tokio::test]
    async fn redispatching_the_same_selection_reuses_the_manifest() {
        let store = seeded_store();
        let j1 = valid_job("First");
        let j2 = valid_job("Second");
        let ids = vec![j1.id.clone(), j2.id.clone()];
        store.seed_job(j1);
        store.seed_job(j2);

        let first = dispatch(&store, &ids, "d1", None, date()).await.unwrap();
        let retry = dispatch(&store, &ids, "d1", None, date()).await.unwrap();

        assert_eq!(store.manifest_count(), 1);
        assert_eq!(
            first.manifest.unwrap().id,
            retry.manifest.unwrap().id
        );

        let saved = store.job(&ids[1]).unwrap();
        assert_eq!(saved.sequence_order, Some(2));
    }

    #[tokio::test]
    async fn explicit_vehicle_overrides_the_drivers_assignment() {
        let store = seeded_store();
        store.seed_vehicle(Vehicle::new("v2", "Sprinter"));
        let job = valid_job("Acme Freight");
        let id = job.id.clone();
        store.seed_job(job);

        // Explicit vehicle wins over the driver's association.
        let outcome = dispatch(&store, &[id.clone()], "d1", Some("v2"), date())
            .await
            .unwrap();
        assert_eq!(outcome.assigned.len(), 1);
        assert_eq!(store.job(&id).unwrap().vehicle_id.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn driver_without_vehicle_fails_before_any_write() {
        let store = MemoryStore::new();
        store.seed_driver(Driver::new("d2", "Lena Ortiz"));
        let job = valid_job("Acme Freight");
        let id = job.id.clone();
        store.seed_job(job);

        let err = dispatch(&store, &[id.clone()], "d2", None, date())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoVehicleForDriver { .. }));

        let untouched = store.job(&id).unwrap();
        assert_eq!(untouched.status, JobStatus::Pending);
        assert!(untouched.driver_id.is_none());
    }

    #[tokio::test]
    async fn blank_driver_is_rejected() {
        let store = seeded_store();
        let err = dispatch(&store, &["j1".to_string()], "  ", None, date())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingDriverOrVehicle));
    }

    #[tokio::test]
    async fn validation_failure_blocks_the_whole_dispatch() {
        let store = seeded_store();
        let good = valid_job("Good");
        // Dropoff before the pickup's service time has elapsed.
        let bad = Job::new("Bad")
            .with_stop(
                Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd")
                    .with_start(at(9, 0))
                    .with_service_duration(30),
            )
            .with_stop(
                Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(9, 15)),
            );
        let ids = vec![good.id.clone(), bad.id.clone()];
        store.seed_job(good);
        store.seed_job(bad);

        let err = dispatch(&store, &ids, "d1", None, date()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation { stop_index: 2, .. }));

        // Nothing was written: no manifest, first job untouched.
        assert_eq!(store.manifest_count(), 0);
        assert_eq!(store.job(&ids[0]).unwrap().status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn missing_job_is_fatal() {
        let store = seeded_store();
        let err = dispatch(&store, &["ghost".to_string()], "d1", None, date())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn conflicting_attachment_reports_partial_success() {
        let store = seeded_store();
        let free = valid_job("Free");
        let mut taken = valid_job("Taken");
        taken.manifest_id = Some("other-manifest".into());
        let ids = vec![free.id.clone(), taken.id.clone()];
        store.seed_job(free);
        store.seed_job(taken.clone());

        let err = dispatch(&store, &ids, "d1", None, date()).await.unwrap_err();
        let failure = match err {
            DispatchError::PartialAttach(failure) => failure,
            other => panic!("expected partial attach, got {other:?}"),
        };

        assert_eq!(failure.attached, vec![ids[0].clone()]);
        assert_eq!(failure.failed.len(), 1);
        assert_eq!(failure.failed[0].job_id, ids[1]);
        assert!(failure.failed[0].reason.contains("other-manifest"));

        // The attached job is committed, not rolled back.
        let committed = store.job(&ids[0]).unwrap();
        assert_eq!(
            committed.manifest_id.as_deref(),
            Some(failure.manifest_id.as_str())
        );
        // The conflicting job keeps its original attachment.
        assert_eq!(
            store.job(&ids[1]).unwrap().manifest_id.as_deref(),
            Some("other-manifest")
        );
    }

    #[tokio::test]
    async fn retry_after_partial_failure_attaches_the_rest() {
        let store = seeded_store();
        let free = valid_job("Free");
        let mut taken = valid_job("Taken");
        taken.manifest_id = Some("other-manifest".into());
        let ids = vec![free.id.clone(), taken.id.clone()];
        store.seed_job(free);
        store.seed_job(taken.clone());

        let err = dispatch(&store, &ids, "d1", None, date()).await.unwrap_err();
        let manifest_id = match err {
            DispatchError::PartialAttach(failure) => failure.manifest_id,
            other => panic!("expected partial attach, got {other:?}"),
        };

        // Dispatcher releases the conflicting job, then retries the same
        // logical operation.
        taken.manifest_id = None;
        store.seed_job(taken);
        let outcome = dispatch(&store, &ids, "d1", None, date()).await.unwrap();

        assert_eq!(store.manifest_count(), 1);
        assert_eq!(outcome.manifest.unwrap().id, manifest_id);
        assert_eq!(store.job(&ids[1]).unwrap().sequence_order, Some(2));
    }

    #[tokio::test]
    async fn empty_selection_is_a_no_op() {
        let store = seeded_store();
        let outcome = dispatch(&store, &[], "d1", None, date()).await.unwrap();
        assert!(outcome.manifest.is_none());
        assert!(outcome.assigned.is_empty());
        assert!(outcome.changed.is_empty());
    }
}
