//! Public API surface for the timetabling core.
//!
//! This file consolidates the boundary types: input snapshot records as the
//! surrounding system provides them, and the schedule events the generator
//! emits. All types derive Serialize/Deserialize for JSON interchange.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Room name emitted for sessions that carry no physical room.
pub const ONLINE_ROOM: &str = "online";

/// Sentinel returned to callers when a phase has no feasible assignment.
pub const IMPOSSIBLE: &str = "impossible";

/// Identifier of an emitted schedule event.
///
/// Regular sessions get plain counter values (`"17"`); the two halves of a
/// shared session get suffixed ids (`"17-A"`, `"17-B"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(value: impl Into<String>) -> Self {
        EventId(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Meeting kind of a scheduled session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Lecture,
    Laboratory,
    Practicum,
}

impl SessionKind {
    /// Room-pool key this kind draws from. Practicum sessions never take a
    /// physical room.
    pub fn room_kind(&self) -> Option<&'static str> {
        match self {
            SessionKind::Lecture => Some("lecture"),
            SessionKind::Laboratory => Some("lab"),
            SessionKind::Practicum => None,
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionKind::Lecture => "Lecture",
            SessionKind::Laboratory => "Laboratory",
            SessionKind::Practicum => "Practicum",
        };
        write!(f, "{}", name)
    }
}

/// One offered course as provided by the surrounding system.
///
/// Numeric fields tolerate malformed input: non-numeric units coerce to 0,
/// a missing or unreadable year level falls back to 1, and `blocks` is
/// clamped to at least one section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub course_code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub program: String,
    #[serde(default = "default_year_level", deserialize_with = "lenient_year")]
    pub year_level: u8,
    #[serde(default, deserialize_with = "lenient_units")]
    pub units_lecture: f64,
    #[serde(default, deserialize_with = "lenient_units")]
    pub units_lab: f64,
    #[serde(default = "default_blocks", deserialize_with = "lenient_blocks")]
    pub blocks: u32,
}

impl CourseRecord {
    /// Convenience constructor used heavily by tests and fixtures.
    pub fn new(
        course_code: impl Into<String>,
        title: impl Into<String>,
        program: impl Into<String>,
        year_level: u8,
        units_lecture: f64,
        units_lab: f64,
        blocks: u32,
    ) -> Self {
        Self {
            course_code: course_code.into(),
            title: title.into(),
            program: program.into(),
            year_level,
            units_lecture,
            units_lab,
            blocks: blocks.max(1),
        }
    }
}

fn default_year_level() -> u8 {
    1
}

fn default_blocks() -> u32 {
    1
}

fn lenient_year<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_number(&value).map(|v| v as u8).unwrap_or(1))
}

fn lenient_units<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    // Negative units are treated as absent.
    Ok(coerce_number(&value).unwrap_or(0.0).max(0.0))
}

fn lenient_blocks<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_number(&value).map(|v| v as u32).unwrap_or(1).max(1))
}

fn coerce_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Working-day bounds in whole or fractional hours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeSettings {
    #[serde(default = "default_start_time")]
    pub start_time: f64,
    #[serde(default = "default_end_time")]
    pub end_time: f64,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            end_time: default_end_time(),
        }
    }
}

fn default_start_time() -> f64 {
    7.0
}

fn default_end_time() -> f64 {
    21.0
}

/// Room-type name to ordered room-name list, as loaded from the snapshot.
/// Keys are compared case-insensitively downstream.
pub type RoomInventory = HashMap<String, Vec<String>>;

/// One scheduled meeting in the generated timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub schedule_id: EventId,
    #[serde(rename = "courseCode")]
    pub course_code: String,
    #[serde(rename = "baseCourseCode")]
    pub base_course_code: String,
    pub title: String,
    pub program: String,
    pub year: u8,
    pub session: SessionKind,
    pub block: char,
    /// Day name from the configured day list.
    pub day: String,
    /// `"h:MM AM/PM - h:MM AM/PM"`.
    pub period: String,
    /// Room name, or [`ONLINE_ROOM`] when no physical room was assigned.
    pub room: String,
}

/// Result of a generation run: the full event list, or the infeasibility
/// sentinel. Serializes as either a JSON array or the string `"impossible"`.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Scheduled(Vec<ScheduleEvent>),
    Impossible,
}

impl GenerationOutcome {
    pub fn is_impossible(&self) -> bool {
        matches!(self, GenerationOutcome::Impossible)
    }

    pub fn events(&self) -> Option<&[ScheduleEvent]> {
        match self {
            GenerationOutcome::Scheduled(events) => Some(events),
            GenerationOutcome::Impossible => None,
        }
    }
}

impl Serialize for GenerationOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            GenerationOutcome::Scheduled(events) => events.serialize(serializer),
            GenerationOutcome::Impossible => serializer.serialize_str(IMPOSSIBLE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_record_lenient_units() {
        let record: CourseRecord = serde_json::from_str(
            r#"{"courseCode": "CS101", "unitsLecture": "three", "unitsLab": "2.0"}"#,
        )
        .unwrap();
        assert_eq!(record.units_lecture, 0.0);
        assert_eq!(record.units_lab, 2.0);
        assert_eq!(record.year_level, 1);
        assert_eq!(record.blocks, 1);
    }

    #[test]
    fn test_course_record_negative_units_coerced() {
        let record: CourseRecord =
            serde_json::from_str(r#"{"courseCode": "CS101", "unitsLecture": -3}"#).unwrap();
        assert_eq!(record.units_lecture, 0.0);
    }

    #[test]
    fn test_course_record_numeric_strings() {
        let record: CourseRecord = serde_json::from_str(
            r#"{"courseCode": "CS101", "yearLevel": "3", "blocks": "2"}"#,
        )
        .unwrap();
        assert_eq!(record.year_level, 3);
        assert_eq!(record.blocks, 2);
    }

    #[test]
    fn test_session_kind_room_key() {
        assert_eq!(SessionKind::Lecture.room_kind(), Some("lecture"));
        assert_eq!(SessionKind::Laboratory.room_kind(), Some("lab"));
        assert_eq!(SessionKind::Practicum.room_kind(), None);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = GenerationOutcome::Impossible;
        assert_eq!(serde_json::to_string(&outcome).unwrap(), r#""impossible""#);

        let outcome = GenerationOutcome::Scheduled(vec![]);
        assert_eq!(serde_json::to_string(&outcome).unwrap(), "[]");
    }

    #[test]
    fn test_time_settings_defaults() {
        let settings: TimeSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.start_time, 7.0);
        assert_eq!(settings.end_time, 21.0);
    }
}
