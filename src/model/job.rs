use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stop::Stop;

/// Dispatcher-facing urgency of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

/// Lifecycle status of a job.
///
/// `Assigned` is set by the resolver or placement engine; `InProgress` and
/// `Completed` arrive from execution collaborators and are never reverted
/// by this engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Assigned => write!(f, "assigned"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A delivery job: customer details, lifecycle status, assignment
/// back-references, and an ordered list of stops.
///
/// `scheduled_date`/`scheduled_time` are a derived projection of the first
/// stop's start instant, kept for readers that are not stop-aware. They are
/// recomputed on every stop change and are never a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: JobStatus,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    /// Back-reference to the owning manifest; `None` while in the pool.
    pub manifest_id: Option<String>,
    /// Position within the owning manifest, 1-based.
    pub sequence_order: Option<u32>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    #[serde(default)]
    pub stops: Vec<Stop>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(customer_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            customer_name: customer_name.to_string(),
            customer_phone: String::new(),
            priority: Priority::Medium,
            notes: String::new(),
            status: JobStatus::Pending,
            driver_id: None,
            vehicle_id: None,
            manifest_id: None,
            sequence_order: None,
            scheduled_date: None,
            scheduled_time: None,
            stops: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_stop(mut self, mut stop: Stop) -> Self {
        stop.job_id = self.id.clone();
        self.stops.push(stop);
        self
    }

    /// Stops sorted by `sequence_order`, which defines the route order.
    pub fn stops_in_order(&self) -> Vec<&Stop> {
        let mut ordered: Vec<&Stop> = self.stops.iter().collect();
        ordered.sort_by_key(|s| s.sequence_order);
        ordered
    }

    pub fn first_stop(&self) -> Option<&Stop> {
        self.stops.iter().min_by_key(|s| s.sequence_order)
    }

    pub fn first_stop_mut(&mut self) -> Option<&mut Stop> {
        self.stops.iter_mut().min_by_key(|s| s.sequence_order)
    }
}
