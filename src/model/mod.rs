mod job;
mod manifest;
mod resources;
mod stop;

pub use job::{Job, JobStatus, Priority};
pub use manifest::{Manifest, ManifestStatus};
pub use resources::{Driver, Vehicle};
pub use stop::{Arrival, Stop, StopStatus, StopType};
