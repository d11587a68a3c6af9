//! Property tests for the time grid.

use crate::api::TimeSettings;
use crate::models::time::{format_clock, TimeGrid};
use proptest::prelude::*;

proptest! {
    /// `time_to_slot` inverts `slot_to_time` for every valid slot.
    #[test]
    fn prop_slot_roundtrip(
        start in 5u32..11,
        span in 2u32..16,
        num_days in 1u32..7,
        pick in 0u32..10_000,
    ) {
        let settings = TimeSettings {
            start_time: start as f64,
            end_time: (start + span) as f64,
        };
        let grid = TimeGrid::new(&settings, num_days).unwrap();
        let slot = pick % grid.total_slots();
        let (wall, _) = grid.slot_to_time(slot);
        prop_assert_eq!(grid.time_to_slot(grid.day_of(slot), wall), Some(slot));
    }

    /// Formatted clocks always look like `h:MM AM/PM` with two-digit minutes.
    #[test]
    fn prop_clock_shape(half_hours in 0u32..48) {
        let rendered = format_clock(half_hours as f64 * 0.5);
        let (time, meridiem) = rendered.split_once(' ').unwrap();
        prop_assert!(meridiem == "AM" || meridiem == "PM");
        let (h, m) = time.split_once(':').unwrap();
        let h: u32 = h.parse().unwrap();
        prop_assert!((1..=12).contains(&h));
        prop_assert_eq!(m.len(), 2);
        prop_assert!(m == "00" || m == "30");
    }

    /// Sessions never cross a day boundary: the rendered period of any
    /// in-day placement stays within the working window.
    #[test]
    fn prop_period_within_window(offset in 0u32..28, duration in 1u32..6) {
        let grid = TimeGrid::new(&TimeSettings::default(), 6).unwrap();
        prop_assume!(offset + duration <= grid.slots_per_day());
        let period = grid.format_period(offset, duration);
        prop_assert!(period.contains(" - "));
    }
}
