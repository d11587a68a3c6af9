//! Read-only input snapshot contracts.
//!
//! The scheduler consumes point-in-time snapshots of courses, rooms, time
//! settings, and the day list. Persistence, ingestion, and editing of that
//! data live in the surrounding system; this module only defines the
//! read-side contract plus an in-memory implementation for tests and local
//! development.

pub mod memory;

pub use memory::MemorySnapshot;

use crate::api::{CourseRecord, RoomInventory, TimeSettings};
use async_trait::async_trait;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors surfaced by snapshot sources.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The source was reachable but its payload could not be decoded.
    #[error("snapshot decode error: {0}")]
    Decode(String),
    /// The source itself failed (connectivity, auth, missing collection).
    #[error("snapshot source error: {0}")]
    Source(String),
}

/// Read-only access to the input snapshots of one generation run.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; the generation service shares one
/// repository across async tasks.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// All offered courses for the department.
    async fn load_courses(&self) -> SnapshotResult<Vec<CourseRecord>>;

    /// Rooms grouped by type. Keys are matched case-insensitively; the
    /// `lecture` and `lab` kinds are expected to exist, possibly empty.
    async fn load_rooms(&self) -> SnapshotResult<RoomInventory>;

    /// Working-day bounds.
    async fn load_time_settings(&self) -> SnapshotResult<TimeSettings>;

    /// Ordered weekday names. Ordering is semantically significant: day
    /// restriction rules reference indices into this list.
    async fn load_days(&self) -> SnapshotResult<Vec<String>>;
}

/// Canonical six-day teaching week.
pub fn default_days() -> Vec<String> {
    [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}
