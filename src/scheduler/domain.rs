//! Start-slot domain computation.
//!
//! For one session, the domain is every global start slot where the session
//! fits inside a day, respects the category's day and start-time rules, and
//! avoids slots the section already occupies. Candidates that overlap the
//! lunch window are kept but listed after the lunch-free ones; callers must
//! treat them as a last resort.

use crate::models::TimeGrid;
use std::collections::BTreeSet;

/// Fixed in-day start offsets for GEC/MAT lectures. On a 7:00 grid these are
/// 7:00, 8:30, 10:00, 12:30, 14:00, 15:30, 17:30, and 19:00.
pub const GEC_START_OFFSETS: [u32; 8] = [0, 3, 6, 11, 14, 17, 21, 24];

/// Fixed in-day start offsets for NSTP sessions: 9:00, 13:00, 15:00 on a
/// 7:00 grid.
pub const NSTP_START_OFFSETS: [u32; 3] = [4, 12, 16];

/// Category switches for one domain computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    pub gec: bool,
    pub nstp: bool,
    pub pe: bool,
    pub practicum: bool,
    /// Practicum day window: 0 for Monday-Wednesday, 1 for Thursday-Saturday.
    pub practicum_window: Option<u8>,
}

/// Legal start slots, lunch-free candidates first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartDomain {
    pub strict: Vec<u32>,
    pub relaxed: Vec<u32>,
}

impl StartDomain {
    pub fn is_empty(&self) -> bool {
        self.strict.is_empty() && self.relaxed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strict.len() + self.relaxed.len()
    }

    /// Candidates in preference order, flagged `true` when lunch-relaxed.
    pub fn iter(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.strict
            .iter()
            .map(|&s| (s, false))
            .chain(self.relaxed.iter().map(|&s| (s, true)))
    }
}

/// Compute the legal start slots for a session of `duration` slots given the
/// section's existing occupancy.
pub fn valid_starts(
    grid: &TimeGrid,
    duration: u32,
    occupied: &BTreeSet<u32>,
    flags: SessionFlags,
) -> StartDomain {
    let mut domain = StartDomain::default();
    if duration == 0 || duration > grid.slots_per_day() {
        return domain;
    }

    for day in 0..grid.num_days() {
        if flags.nstp && !(day == 4 || day == 5) {
            continue;
        }
        if flags.gec && day > 3 {
            continue;
        }
        if flags.practicum {
            match flags.practicum_window {
                Some(0) if day > 2 => continue,
                Some(1) if day < 3 => continue,
                _ => {}
            }
        }

        let base = grid.global_slot(day, 0);
        let offsets = allowed_offsets(grid, duration, occupied, flags, day);

        for offset in offsets {
            if offset + duration > grid.slots_per_day() {
                continue;
            }
            let start = base + offset;
            if (start..start + duration).any(|s| occupied.contains(&s)) {
                continue;
            }
            if grid.overlaps_lunch(offset, duration) {
                domain.relaxed.push(start);
            } else {
                domain.strict.push(start);
            }
        }
    }

    domain
}

/// In-day offsets a category may start at, before fit/collision filtering.
fn allowed_offsets(
    grid: &TimeGrid,
    duration: u32,
    occupied: &BTreeSet<u32>,
    flags: SessionFlags,
    day: u32,
) -> Vec<u32> {
    if flags.pe {
        // PE hugs the edges of whatever the section already has that day:
        // right before its first meeting or right after its last.
        let base = grid.global_slot(day, 0);
        let day_occupancy: Vec<u32> = occupied
            .range(base..base + grid.slots_per_day())
            .map(|&s| s - base)
            .collect();
        let Some((&min_used, &max_used)) = day_occupancy.first().zip(day_occupancy.last()) else {
            return vec![0];
        };
        let mut offsets = Vec::new();
        if min_used >= duration {
            offsets.push(min_used - duration);
        }
        if max_used + 1 + duration <= grid.slots_per_day() {
            offsets.push(max_used + 1);
        }
        offsets
    } else if flags.gec {
        GEC_START_OFFSETS.to_vec()
    } else if flags.nstp {
        NSTP_START_OFFSETS.to_vec()
    } else {
        (0..=grid.slots_per_day() - duration).collect()
    }
}
