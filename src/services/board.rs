//! Published schedule lookup.
//!
//! Holds the schedule of the most recent successful run, keyed by schedule
//! id. Publication replaces the whole map atomically; readers between runs
//! see either the old schedule or the new one, never a mix.

use crate::api::ScheduleEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared `schedule_id -> event` map for the current published timetable.
#[derive(Clone, Default)]
pub struct ScheduleBoard {
    events: Arc<RwLock<HashMap<String, ScheduleEvent>>>,
}

impl ScheduleBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published schedule with a new event list.
    pub fn publish(&self, events: &[ScheduleEvent]) {
        let mut map = self.events.write();
        map.clear();
        for event in events {
            map.insert(event.schedule_id.value().to_string(), event.clone());
        }
    }

    pub fn get(&self, schedule_id: &str) -> Option<ScheduleEvent> {
        self.events.read().get(schedule_id).cloned()
    }

    /// Every published event, in no particular order.
    pub fn all(&self) -> Vec<ScheduleEvent> {
        self.events.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}
