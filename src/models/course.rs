//! Course-side domain types: section keys, block letters, and the room pool.

use crate::api::RoomInventory;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cohort identity: one block of one program/year taking courses together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectionKey {
    pub program: String,
    pub year: u8,
    pub block: char,
}

impl SectionKey {
    pub fn new(program: impl Into<String>, year: u8, block: char) -> Self {
        Self {
            program: program.into(),
            year,
            block,
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}{}", self.program, self.year, self.block)
    }
}

/// Letter for a zero-based block index: 0 is `A`, 1 is `B`, and so on.
pub fn block_letter(index: u32) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Physical rooms grouped by kind.
///
/// Keys are normalized to lowercase and each list is shuffled once at
/// construction so repeated runs do not always favor the same rooms. Passing
/// a seed makes the shuffle reproducible.
#[derive(Debug, Clone)]
pub struct RoomPool {
    rooms: HashMap<String, Vec<String>>,
}

static NO_ROOMS: Vec<String> = Vec::new();

impl RoomPool {
    pub fn new(inventory: &RoomInventory, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        // Shuffle in sorted key order so a fixed seed always produces the
        // same pool regardless of map iteration order.
        let mut entries: Vec<(&String, &Vec<String>)> = inventory.iter().collect();
        entries.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));
        let mut rooms = HashMap::new();
        for (kind, names) in entries {
            let mut names = names.clone();
            names.shuffle(&mut rng);
            rooms.insert(kind.to_lowercase(), names);
        }
        Self { rooms }
    }

    /// Rooms of a kind, empty when the kind is unknown.
    pub fn of_kind(&self, kind: &str) -> &[String] {
        self.rooms
            .get(&kind.to_lowercase())
            .unwrap_or(&NO_ROOMS)
    }

    pub fn count(&self, kind: &str) -> usize {
        self.of_kind(kind).len()
    }

    /// Room name by pool index, `None` when the index is out of range.
    pub fn name(&self, kind: &str, index: usize) -> Option<&str> {
        self.of_kind(kind).get(index).map(String::as_str)
    }
}
