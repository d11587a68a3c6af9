//! Discrete time grid over the working week.
//!
//! The working day is cut into half-hour slots. A *global slot* index spans
//! the whole week (`day * slots_per_day + offset`); an *offset* is the
//! position within a single day. Every session occupies a contiguous slot
//! range that never crosses a day boundary.

use crate::api::TimeSettings;
use serde::{Deserialize, Serialize};

/// Width of one grid slot, in hours.
pub const SLOT_HOURS: f64 = 0.5;

/// Wall-clock start of the protected lunch window, in hours.
const LUNCH_START_HOUR: f64 = 11.5;

/// Half-hour discretization of the working week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    start_t: f64,
    end_t: f64,
    slots_per_day: u32,
    num_days: u32,
    /// In-day offsets overlapping 11:30-12:30; empty when the grid starts
    /// after 11:30.
    lunch: Vec<u32>,
}

impl TimeGrid {
    /// Build a grid from working-day bounds and the number of weekdays.
    ///
    /// # Errors
    /// Returns an error when the window is empty or shorter than one slot,
    /// or when the day list is empty.
    pub fn new(settings: &TimeSettings, num_days: u32) -> Result<Self, String> {
        let span = settings.end_time - settings.start_time;
        if span <= 0.0 {
            return Err(format!(
                "end_time {} must be after start_time {}",
                settings.end_time, settings.start_time
            ));
        }
        let slots_per_day = (span / SLOT_HOURS) as u32;
        if slots_per_day == 0 {
            return Err("working day is shorter than one slot".to_string());
        }
        if num_days == 0 {
            return Err("day list is empty".to_string());
        }

        let lunch_offset_hrs = LUNCH_START_HOUR - settings.start_time;
        let lunch = if lunch_offset_hrs >= 0.0 {
            let first = (lunch_offset_hrs / SLOT_HOURS) as u32;
            vec![first, first + 1]
        } else {
            Vec::new()
        };

        Ok(Self {
            start_t: settings.start_time,
            end_t: settings.end_time,
            slots_per_day,
            num_days,
            lunch,
        })
    }

    pub fn start_hour(&self) -> f64 {
        self.start_t
    }

    pub fn end_hour(&self) -> f64 {
        self.end_t
    }

    pub fn slots_per_day(&self) -> u32 {
        self.slots_per_day
    }

    pub fn num_days(&self) -> u32 {
        self.num_days
    }

    /// Total slot count across the week.
    pub fn total_slots(&self) -> u32 {
        self.slots_per_day * self.num_days
    }

    /// In-day offsets covered by the lunch window.
    pub fn lunch_slots(&self) -> &[u32] {
        &self.lunch
    }

    pub fn day_of(&self, global_slot: u32) -> u32 {
        global_slot / self.slots_per_day
    }

    pub fn offset_of(&self, global_slot: u32) -> u32 {
        global_slot % self.slots_per_day
    }

    pub fn global_slot(&self, day: u32, offset: u32) -> u32 {
        day * self.slots_per_day + offset
    }

    /// True when `[offset, offset + duration)` touches the lunch window.
    pub fn overlaps_lunch(&self, offset: u32, duration: u32) -> bool {
        self.lunch
            .iter()
            .any(|&l| l >= offset && l < offset + duration)
    }

    /// Wall-clock hours of a slot's start and of the end of that slot.
    pub fn slot_to_time(&self, global_slot: u32) -> (f64, f64) {
        let start = self.start_t + self.offset_of(global_slot) as f64 * SLOT_HOURS;
        (start, start + SLOT_HOURS)
    }

    /// Global slot for a wall-clock time on a given day, when the time falls
    /// exactly on a slot boundary inside the working window.
    pub fn time_to_slot(&self, day: u32, wall_hour: f64) -> Option<u32> {
        if day >= self.num_days {
            return None;
        }
        let offset_hrs = wall_hour - self.start_t;
        if offset_hrs < 0.0 {
            return None;
        }
        let offset = (offset_hrs / SLOT_HOURS).round() as u32;
        if (self.start_t + offset as f64 * SLOT_HOURS - wall_hour).abs() > 1e-9 {
            return None;
        }
        if offset >= self.slots_per_day {
            return None;
        }
        Some(self.global_slot(day, offset))
    }

    /// Render a session's wall-clock span as `"h:MM AM/PM - h:MM AM/PM"`.
    pub fn format_period(&self, start_slot: u32, duration: u32) -> String {
        let (start, _) = self.slot_to_time(start_slot);
        let end = start + duration as f64 * SLOT_HOURS;
        format!("{} - {}", format_clock(start), format_clock(end))
    }
}

/// 12-hour clock rendering: no leading zero on the hour, two-digit minutes,
/// noon is 12:00 PM and midnight 12:00 AM.
pub fn format_clock(wall_hour: f64) -> String {
    let h24 = wall_hour.floor() as u32 % 24;
    let minutes = ((wall_hour - wall_hour.floor()) * 60.0).round() as u32;
    let (h12, meridiem) = match h24 {
        0 => (12, "AM"),
        12 => (12, "PM"),
        h if h < 12 => (h, "AM"),
        h => (h - 12, "PM"),
    };
    format!("{}:{:02} {}", h12, minutes, meridiem)
}
