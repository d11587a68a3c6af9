//! Cross-phase occupancy bookkeeping.
//!
//! Placements from earlier phases are immovable. The ledger records which
//! global slots each section and each physical room already use; later
//! phases consult it when computing start domains and when filtering room
//! candidates.

use crate::models::SectionKey;
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

/// Room identity inside the pool: kind plus index into the shuffled list.
pub type RoomKey = (String, usize);

static NO_SLOTS: BTreeSet<u32> = BTreeSet::new();

/// Accumulated slot usage across solved phases.
#[derive(Debug, Clone, Default)]
pub struct OccupancyLedger {
    section: HashMap<SectionKey, BTreeSet<u32>>,
    room: HashMap<RoomKey, BTreeSet<u32>>,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a slot range as taken for a section.
    pub fn block_section(&mut self, key: &SectionKey, slots: Range<u32>) {
        self.section.entry(key.clone()).or_default().extend(slots);
    }

    /// Mark a slot range as taken in a physical room.
    pub fn block_room(&mut self, kind: &str, index: usize, slots: Range<u32>) {
        self.room
            .entry((kind.to_string(), index))
            .or_default()
            .extend(slots);
    }

    /// Slots a section already occupies. Empty for unknown sections.
    pub fn section_slots(&self, key: &SectionKey) -> &BTreeSet<u32> {
        self.section.get(key).unwrap_or(&NO_SLOTS)
    }

    /// Slots a room already occupies. Empty for unknown rooms.
    pub fn room_slots(&self, kind: &str, index: usize) -> &BTreeSet<u32> {
        self.room
            .get(&(kind.to_string(), index))
            .unwrap_or(&NO_SLOTS)
    }

    /// Room occupancy coalesced into contiguous `(start, length)` runs,
    /// sorted by start. One run per maximal stretch, not one per slot.
    pub fn coalesced_room_runs(&self, kind: &str, index: usize) -> Vec<(u32, u32)> {
        coalesce(self.room_slots(kind, index))
    }
}

/// Walk a sorted slot set and emit maximal contiguous runs.
fn coalesce(slots: &BTreeSet<u32>) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut iter = slots.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };
    let mut start = first;
    let mut current = first;
    for slot in iter {
        if slot == current + 1 {
            current = slot;
        } else {
            runs.push((start, current - start + 1));
            start = slot;
            current = slot;
        }
    }
    runs.push((start, current - start + 1));
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SectionKey {
        SectionKey::new("BSCS", 1, 'A')
    }

    #[test]
    fn test_unknown_keys_are_empty() {
        let ledger = OccupancyLedger::new();
        assert!(ledger.section_slots(&key()).is_empty());
        assert!(ledger.room_slots("lecture", 0).is_empty());
        assert!(ledger.coalesced_room_runs("lab", 3).is_empty());
    }

    #[test]
    fn test_block_section_accumulates() {
        let mut ledger = OccupancyLedger::new();
        ledger.block_section(&key(), 4..7);
        ledger.block_section(&key(), 10..12);
        let slots: Vec<u32> = ledger.section_slots(&key()).iter().copied().collect();
        assert_eq!(slots, vec![4, 5, 6, 10, 11]);
    }

    #[test]
    fn test_coalesce_runs() {
        let mut ledger = OccupancyLedger::new();
        ledger.block_room("lecture", 0, 3..6);
        ledger.block_room("lecture", 0, 6..8);
        ledger.block_room("lecture", 0, 12..13);
        assert_eq!(
            ledger.coalesced_room_runs("lecture", 0),
            vec![(3, 5), (12, 1)]
        );
    }

    #[test]
    fn test_rooms_are_keyed_by_kind_and_index() {
        let mut ledger = OccupancyLedger::new();
        ledger.block_room("lecture", 0, 0..2);
        ledger.block_room("lab", 0, 5..6);
        assert_eq!(ledger.room_slots("lecture", 0).len(), 2);
        assert_eq!(ledger.room_slots("lab", 0).len(), 1);
        assert!(ledger.room_slots("lecture", 1).is_empty());
    }
}
