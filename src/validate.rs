//! Pure schedule validation for a job's stop sequence.
//!
//! Every function here is synchronous and free of I/O, so callers can run
//! them on each keystroke while a dispatcher edits a form. Absence of time
//! data means "not yet constrained" and always passes; only present,
//! contradictory data fails.

use crate::error::DispatchError;
use crate::model::{Arrival, Job, Stop};

/// Which scheduling rule a stop violated. The three rules are distinct
/// members of the error taxonomy so callers can surface a precise message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceRule {
    /// A later stop is scheduled on an earlier calendar date than its
    /// predecessor.
    DateOrder,
    /// A stop starts before its predecessor's work could have finished.
    TimeOrder,
    /// A window stop ends before it starts.
    WindowIntegrity,
}

impl std::fmt::Display for SequenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceRule::DateOrder => write!(f, "date-order"),
            SequenceRule::TimeOrder => write!(f, "time-order"),
            SequenceRule::WindowIntegrity => write!(f, "window-integrity"),
        }
    }
}

/// Check a stop against its predecessor in route order.
///
/// Rules apply only when both relevant timestamps are present:
/// 1. The stop's calendar date may not precede the predecessor's.
/// 2. The stop's start instant may not precede the predecessor's effective
///    end (arrival plus service time; window stops use their worst case).
pub fn validate_sequence(stop: &Stop, previous: &Stop) -> Result<(), SequenceRule> {
    if let (Some(date), Some(prev_date)) =
        (stop.effective_start_date(), previous.effective_start_date())
    {
        if date < prev_date {
            return Err(SequenceRule::DateOrder);
        }
    }

    if let (Some(start), Some(prev_end)) = (stop.start_instant(), previous.effective_end_time()) {
        if start < prev_end {
            return Err(SequenceRule::TimeOrder);
        }
    }

    Ok(())
}

/// Check that a window stop's bounds are coherent. Reported per stop,
/// independent of sequence validity of its neighbours. Fixed stops and
/// partially-set windows pass.
pub fn validate_window(stop: &Stop) -> Result<(), SequenceRule> {
    if let Arrival::Window {
        window_start: Some(start),
        window_end: Some(end),
    } = &stop.arrival
    {
        if end < start {
            return Err(SequenceRule::WindowIntegrity);
        }
    }
    Ok(())
}

/// Whole-job validation: a job is acceptable for creation or dispatch only
/// if it has at least two stops with non-empty addresses and every stop
/// passes the window check and the pairwise sequence checks in route order.
///
/// Failures carry the 1-based index of the offending stop and the rule that
/// failed.
pub fn validate_job(job: &Job) -> Result<(), DispatchError> {
    let ordered = job.stops_in_order();
    let with_address = ordered
        .iter()
        .filter(|s| !s.address.trim().is_empty())
        .count();
    if with_address < 2 {
        return Err(DispatchError::InsufficientStops {
            found: with_address,
        });
    }

    for (index, stop) in ordered.iter().enumerate() {
        validate_window(stop).map_err(|rule| DispatchError::Validation {
            stop_index: index + 1,
            rule,
        })?;

        if index > 0 {
            validate_sequence(stop, ordered[index - 1]).map_err(|rule| {
                DispatchError::Validation {
                    stop_index: index + 1,
                    rule,
                }
            })?;
        }
    }

    Ok(())
}

/// Project the first stop's start instant onto the job's legacy single-value
/// date/time fields, for readers that are not stop-aware. The projection is
/// recomputed on every stop change; an unconstrained first stop clears it.
pub fn sync_legacy_schedule(job: &mut Job) {
    match job.first_stop().and_then(Stop::start_instant) {
        Some(start) => {
            job.scheduled_date = Some(start.date_naive());
            job.scheduled_time = Some(start.time());
        }
        None => {
            job.scheduled_date = None;
            job.scheduled_time = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StopType;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    fn two_stop_job() -> Job {
        Job::new("Acme Freight")
            .with_stop(Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd"))
            .with_stop(Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St"))
    }

    // --- validate_job ---

    #[test]
    fn unconstrained_job_passes() {
        // No schedule fields set anywhere: absence of data is never an error.
        assert!(validate_job(&two_stop_job()).is_ok());
    }

    #[test]
    fn single_stop_is_insufficient() {
        let job = Job::new("Acme Freight").with_stop(Stop::fixed(
            "j",
            1,
            StopType::Pickup,
            "12 Dock Rd",
        ));
        let err = validate_job(&job).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InsufficientStops { found: 1 }
        ));
    }

    #[test]
    fn blank_addresses_do_not_count() {
        let job = Job::new("Acme Freight")
            .with_stop(Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd"))
            .with_stop(Stop::fixed("j", 2, StopType::Dropoff, "   "));
        let err = validate_job(&job).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InsufficientStops { found: 1 }
        ));
    }

    #[test]
    fn earlier_date_on_later_stop_fails_date_order() {
        let job = Job::new("Acme Freight")
            .with_stop(
                Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd").with_start(at(2, 9, 0)),
            )
            .with_stop(
                Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(1, 9, 0)),
            );

        match validate_job(&job).unwrap_err() {
            DispatchError::Validation { stop_index, rule } => {
                assert_eq!(stop_index, 2);
                assert_eq!(rule, SequenceRule::DateOrder);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn overlapping_service_time_fails_time_order() {
        // Pickup at 09:00 with 30 minutes of service; dropoff at 09:15 is
        // before 09:30 and must be rejected.
        let job = Job::new("Acme Freight")
            .with_stop(
                Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd")
                    .with_start(at(1, 9, 0))
                    .with_service_duration(30),
            )
            .with_stop(
                Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(1, 9, 15)),
            );

        match validate_job(&job).unwrap_err() {
            DispatchError::Validation { stop_index, rule } => {
                assert_eq!(stop_index, 2);
                assert_eq!(rule, SequenceRule::TimeOrder);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn back_to_back_exactly_at_effective_end_passes() {
        let job = Job::new("Acme Freight")
            .with_stop(
                Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd")
                    .with_start(at(1, 9, 0))
                    .with_service_duration(30),
            )
            .with_stop(
                Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(1, 9, 30)),
            );
        assert!(validate_job(&job).is_ok());
    }

    #[test]
    fn window_predecessor_uses_worst_case_end() {
        // Window closes at 12:00 + 15 min service; next stop at 11:00 could
        // collide with a late arrival inside the window.
        let job = Job::new("Acme Freight")
            .with_stop(
                Stop::window("j", 1, StopType::Pickup, "12 Dock Rd")
                    .with_start(at(1, 10, 0))
                    .with_window_end(at(1, 12, 0))
                    .with_service_duration(15),
            )
            .with_stop(
                Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(1, 11, 0)),
            );

        match validate_job(&job).unwrap_err() {
            DispatchError::Validation { rule, .. } => {
                assert_eq!(rule, SequenceRule::TimeOrder)
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn inverted_window_fails_integrity_regardless_of_neighbours() {
        let job = Job::new("Acme Freight")
            .with_stop(Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd"))
            .with_stop(
                Stop::window("j", 2, StopType::Dropoff, "9 Bay St")
                    .with_start(at(1, 14, 0))
                    .with_window_end(at(1, 12, 0)),
            );

        match validate_job(&job).unwrap_err() {
            DispatchError::Validation { stop_index, rule } => {
                assert_eq!(stop_index, 2);
                assert_eq!(rule, SequenceRule::WindowIntegrity);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn partially_set_window_passes_integrity() {
        let stop = Stop::window("j", 1, StopType::Pickup, "12 Dock Rd").with_start(at(1, 9, 0));
        assert!(validate_window(&stop).is_ok());
    }

    #[test]
    fn only_one_constrained_stop_passes_sequence() {
        let constrained =
            Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(1, 9, 0));
        let unconstrained = Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd");
        assert!(validate_sequence(&constrained, &unconstrained).is_ok());
        assert!(validate_sequence(&unconstrained, &constrained).is_ok());
    }

    #[test]
    fn validation_respects_sequence_order_not_vec_order() {
        // Stops pushed out of order; route order comes from sequence_order.
        let job = Job::new("Acme Freight")
            .with_stop(
                Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(1, 9, 15)),
            )
            .with_stop(
                Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd")
                    .with_start(at(1, 9, 0))
                    .with_service_duration(30),
            );

        match validate_job(&job).unwrap_err() {
            DispatchError::Validation { stop_index, rule } => {
                assert_eq!(stop_index, 2);
                assert_eq!(rule, SequenceRule::TimeOrder);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    // --- sync_legacy_schedule ---

    #[test]
    fn legacy_fields_mirror_the_first_stop() {
        let mut job = Job::new("Acme Freight")
            .with_stop(
                Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd").with_start(at(3, 8, 45)),
            )
            .with_stop(
                Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(at(3, 11, 0)),
            );

        sync_legacy_schedule(&mut job);
        assert_eq!(job.scheduled_date, Some(at(3, 8, 45).date_naive()));
        assert_eq!(job.scheduled_time, Some(at(3, 8, 45).time()));
    }

    #[test]
    fn legacy_fields_clear_when_first_stop_is_unconstrained() {
        let mut job = two_stop_job();
        job.scheduled_date = Some(at(1, 0, 0).date_naive());
        job.scheduled_time = Some(at(1, 9, 0).time());

        sync_legacy_schedule(&mut job);
        assert_eq!(job.scheduled_date, None);
        assert_eq!(job.scheduled_time, None);
    }

    #[test]
    fn rule_display_matches_taxonomy() {
        assert_eq!(SequenceRule::DateOrder.to_string(), "date-order");
        assert_eq!(SequenceRule::TimeOrder.to_string(), "time-order");
        assert_eq!(SequenceRule::WindowIntegrity.to_string(), "window-integrity");
    }
}
