use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStatus {
    #[default]
    Draft,
    Planning,
    Scheduled,
    Dispatched,
    InTransit,
    Completed,
    Cancelled,
}

impl std::fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestStatus::Draft => write!(f, "draft"),
            ManifestStatus::Planning => write!(f, "planning"),
            ManifestStatus::Scheduled => write!(f, "scheduled"),
            ManifestStatus::Dispatched => write!(f, "dispatched"),
            ManifestStatus::InTransit => write!(f, "in_transit"),
            ManifestStatus::Completed => write!(f, "completed"),
            ManifestStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An ordered bundle of jobs dispatched together to one driver/vehicle pair.
/// Jobs point back at the manifest via their `manifest_id`/`sequence_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    pub manifest_number: String,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ManifestStatus,
    /// Key derived from the attached job-id set. Dispatch retries look a
    /// manifest up by this key instead of creating a second one.
    pub dispatch_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Manifest {
    /// A manifest created by the resolver: already scheduled, carrying its
    /// driver/vehicle pair and route date.
    pub fn scheduled(
        driver_id: &str,
        vehicle_id: &str,
        scheduled_date: NaiveDate,
        dispatch_key: &str,
    ) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let suffix: String = id.chars().take(8).collect();
        Self {
            id,
            manifest_number: format!("MAN-{}-{}", scheduled_date.format("%Y%m%d"), suffix),
            driver_id: Some(driver_id.to_string()),
            vehicle_id: Some(vehicle_id.to_string()),
            scheduled_date: Some(scheduled_date),
            status: ManifestStatus::Scheduled,
            dispatch_key: Some(dispatch_key.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Dispatch key for a job selection: the sorted id set, joined. Two
    /// invocations over the same selection produce the same key regardless
    /// of input order.
    pub fn dispatch_key_for(job_ids: &[String]) -> String {
        let mut ids: Vec<&str> = job_ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_manifest_carries_assignment() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let manifest = Manifest::scheduled("d1", "v1", date, "a,b");

        assert_eq!(manifest.status, ManifestStatus::Scheduled);
        assert_eq!(manifest.driver_id.as_deref(), Some("d1"));
        assert_eq!(manifest.vehicle_id.as_deref(), Some("v1"));
        assert_eq!(manifest.scheduled_date, Some(date));
        assert!(manifest.manifest_number.starts_with("MAN-20240201-"));
        assert_eq!(manifest.dispatch_key.as_deref(), Some("a,b"));
    }

    #[test]
    fn dispatch_key_is_order_independent() {
        let forward = Manifest::dispatch_key_for(&["a".into(), "b".into(), "c".into()]);
        let shuffled = Manifest::dispatch_key_for(&["c".into(), "a".into(), "b".into()]);
        assert_eq!(forward, shuffled);
        assert_eq!(forward, "a,b,c");
    }

    #[test]
    fn dispatch_key_ignores_duplicate_ids() {
        let key = Manifest::dispatch_key_for(&["b".into(), "a".into(), "b".into()]);
        assert_eq!(key, "a,b");
    }

    #[test]
    fn status_display() {
        assert_eq!(ManifestStatus::InTransit.to_string(), "in_transit");
        assert_eq!(ManifestStatus::Scheduled.to_string(), "scheduled");
    }
}
