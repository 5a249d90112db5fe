use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a stop's arrival is constrained.
///
/// A `fixed` stop is pinned to one scheduled instant; a `window` stop accepts
/// any arrival between its bounds. Unset instants mean the stop is not yet
/// constrained, which is a normal editing state and never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "arrival_mode", rename_all = "snake_case")]
pub enum Arrival {
    Fixed {
        scheduled_arrival: Option<DateTime<Utc>>,
    },
    Window {
        window_start: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
    },
}

/// What kind of visit the stop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopType {
    Pickup,
    Dropoff,
    Waypoint,
}

/// Operational progress of a stop, written by execution/tracking
/// collaborators. The engine preserves these values but never sets them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    #[default]
    Pending,
    Arrived,
    Completed,
    Skipped,
}

/// One physical location a job's vehicle must visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub job_id: String,
    /// 1-based route position. Strictly increasing within a job; gaps allowed.
    pub sequence_order: u32,
    pub stop_type: StopType,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub notes: String,
    /// Minutes required to complete work at the stop. Unset counts as zero.
    pub service_duration_min: Option<i64>,
    #[serde(flatten)]
    pub arrival: Arrival,

    // Outcome fields owned by execution collaborators; carried verbatim.
    #[serde(default)]
    pub status: StopStatus,
    pub actual_arrival_time: Option<DateTime<Utc>>,
    pub actual_latitude: Option<f64>,
    pub actual_longitude: Option<f64>,
    #[serde(default)]
    pub flagged_location: bool,
}

impl Stop {
    /// Create a fixed-arrival stop with no time set yet.
    pub fn fixed(job_id: &str, sequence_order: u32, stop_type: StopType, address: &str) -> Self {
        Self::with_arrival(
            job_id,
            sequence_order,
            stop_type,
            address,
            Arrival::Fixed {
                scheduled_arrival: None,
            },
        )
    }

    /// Create a window-arrival stop with no bounds set yet.
    pub fn window(job_id: &str, sequence_order: u32, stop_type: StopType, address: &str) -> Self {
        Self::with_arrival(
            job_id,
            sequence_order,
            stop_type,
            address,
            Arrival::Window {
                window_start: None,
                window_end: None,
            },
        )
    }

    fn with_arrival(
        job_id: &str,
        sequence_order: u32,
        stop_type: StopType,
        address: &str,
        arrival: Arrival,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            sequence_order,
            stop_type,
            address: address.to_string(),
            latitude: None,
            longitude: None,
            notes: String::new(),
            service_duration_min: None,
            arrival,
            status: StopStatus::Pending,
            actual_arrival_time: None,
            actual_latitude: None,
            actual_longitude: None,
            flagged_location: false,
        }
    }

    /// Sets the scheduled instant (fixed) or the window start (window).
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        match &mut self.arrival {
            Arrival::Fixed { scheduled_arrival } => *scheduled_arrival = Some(start),
            Arrival::Window { window_start, .. } => *window_start = Some(start),
        }
        self
    }

    /// Sets the window end. No effect on fixed stops.
    pub fn with_window_end(mut self, end: DateTime<Utc>) -> Self {
        if let Arrival::Window { window_end, .. } = &mut self.arrival {
            *window_end = Some(end);
        }
        self
    }

    pub fn with_service_duration(mut self, minutes: i64) -> Self {
        self.service_duration_min = Some(minutes);
        self
    }

    /// The stop's own start instant: `scheduled_arrival` for fixed stops,
    /// `window_start` for window stops.
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        match &self.arrival {
            Arrival::Fixed { scheduled_arrival } => *scheduled_arrival,
            Arrival::Window { window_start, .. } => *window_start,
        }
    }

    /// Worst-case instant at which work at this stop is done: the scheduled
    /// arrival (fixed) or the window end (window), plus the service duration.
    /// `None` while the relevant time field is unset.
    pub fn effective_end_time(&self) -> Option<DateTime<Utc>> {
        let base = match &self.arrival {
            Arrival::Fixed { scheduled_arrival } => *scheduled_arrival,
            Arrival::Window { window_end, .. } => *window_end,
        }?;
        Some(base + Duration::minutes(self.service_duration_min.unwrap_or(0)))
    }

    /// Calendar date of the stop's start instant, if set.
    pub fn effective_start_date(&self) -> Option<NaiveDate> {
        self.start_instant().map(|t| t.date_naive())
    }

    /// Signed width of the arrival window. `None` for fixed stops or when
    /// either bound is unset.
    pub fn window_duration(&self) -> Option<Duration> {
        match &self.arrival {
            Arrival::Window {
                window_start: Some(start),
                window_end: Some(end),
            } => Some(*end - *start),
            _ => None,
        }
    }
}
