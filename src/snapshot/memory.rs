//! In-memory snapshot source for unit testing and local development.

use super::{default_days, SnapshotError, SnapshotRepository, SnapshotResult};
use crate::api::{CourseRecord, RoomInventory, TimeSettings};
use anyhow::Context;
use async_trait::async_trait;

/// Snapshot repository backed by owned data.
///
/// Starts from an empty course list, an inventory with empty `lecture` and
/// `lab` pools, default time settings, and the canonical six-day week.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    courses: Vec<CourseRecord>,
    rooms: RoomInventory,
    time_settings: TimeSettings,
    days: Vec<String>,
}

impl Default for MemorySnapshot {
    fn default() -> Self {
        let mut rooms = RoomInventory::new();
        rooms.insert("lecture".to_string(), Vec::new());
        rooms.insert("lab".to_string(), Vec::new());
        Self {
            courses: Vec::new(),
            rooms,
            time_settings: TimeSettings::default(),
            days: default_days(),
        }
    }
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_courses(mut self, courses: Vec<CourseRecord>) -> Self {
        self.courses = courses;
        self
    }

    pub fn with_rooms(mut self, rooms: RoomInventory) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_room_kind(mut self, kind: impl Into<String>, names: &[&str]) -> Self {
        self.rooms
            .insert(kind.into(), names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_time_settings(mut self, time_settings: TimeSettings) -> Self {
        self.time_settings = time_settings;
        self
    }

    pub fn with_days(mut self, days: Vec<String>) -> Self {
        self.days = days;
        self
    }

    /// Load the course list from a JSON array, with the lenient numeric
    /// coercion of [`CourseRecord`].
    pub fn with_courses_json(mut self, json: &str) -> anyhow::Result<Self> {
        self.courses = serde_json::from_str(json).context("parsing courses snapshot")?;
        Ok(self)
    }

    /// Load the room inventory from a JSON object of type -> name list.
    pub fn with_rooms_json(mut self, json: &str) -> anyhow::Result<Self> {
        self.rooms = serde_json::from_str(json).context("parsing rooms snapshot")?;
        Ok(self)
    }
}

#[async_trait]
impl SnapshotRepository for MemorySnapshot {
    async fn load_courses(&self) -> SnapshotResult<Vec<CourseRecord>> {
        Ok(self.courses.clone())
    }

    async fn load_rooms(&self) -> SnapshotResult<RoomInventory> {
        Ok(self.rooms.clone())
    }

    async fn load_time_settings(&self) -> SnapshotResult<TimeSettings> {
        Ok(self.time_settings)
    }

    async fn load_days(&self) -> SnapshotResult<Vec<String>> {
        if self.days.is_empty() {
            return Err(SnapshotError::Source("day list is empty".to_string()));
        }
        Ok(self.days.clone())
    }
}
