//! Scheduler configuration and environment variable handling.

use serde::{Deserialize, Serialize};
use std::env;

/// Substring rules that classify a course as a practicum.
///
/// Matching is case-insensitive on the course title for `title_markers` and
/// on the course code for `code_markers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticumRules {
    #[serde(default = "default_title_markers")]
    pub title_markers: Vec<String>,
    #[serde(default = "default_code_markers")]
    pub code_markers: Vec<String>,
}

impl Default for PracticumRules {
    fn default() -> Self {
        Self {
            title_markers: default_title_markers(),
            code_markers: default_code_markers(),
        }
    }
}

fn default_title_markers() -> Vec<String> {
    vec!["PRACTICUM".to_string()]
}

fn default_code_markers() -> Vec<String> {
    vec!["422".to_string(), "131".to_string()]
}

/// Scheduler configuration.
///
/// Loadable from environment variables or TOML; every field has a default so
/// partial configuration is always valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seed for all run-level randomness (room-list shuffling). When unset,
    /// each run draws fresh entropy and output is not reproducible.
    pub seed: Option<u64>,
    /// Weekly contact hours assumed for a practicum whose lecture and lab
    /// units are both zero.
    pub practicum_fallback_hours: f64,
    /// Sessions per course-block-kind that receive a physical room variable;
    /// the rest surface as online.
    pub physical_session_limit: usize,
    /// Upper bound on in-person sessions per section per day.
    pub max_physical_sessions_per_day: u32,
    pub practicum: PracticumRules,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            practicum_fallback_hours: 6.0,
            physical_session_limit: 6,
            max_physical_sessions_per_day: 2,
            practicum: PracticumRules::default(),
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DTS_SEED` (optional): u64 seed for reproducible runs
    /// - `DTS_PRACTICUM_FALLBACK_HOURS` (optional, default: 6)
    /// - `DTS_PHYSICAL_SESSION_LIMIT` (optional, default: 6)
    /// - `DTS_MAX_PHYSICAL_PER_DAY` (optional, default: 2)
    /// - `DTS_PRACTICUM_TITLE_MARKERS` (optional): comma-separated list
    /// - `DTS_PRACTICUM_CODE_MARKERS` (optional): comma-separated list
    ///
    /// # Errors
    /// Returns an error when a variable is present but unparseable.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("DTS_SEED") {
            let seed = raw
                .parse()
                .map_err(|_| format!("DTS_SEED must be an unsigned integer, got '{}'", raw))?;
            config.seed = Some(seed);
        }
        if let Ok(raw) = env::var("DTS_PRACTICUM_FALLBACK_HOURS") {
            config.practicum_fallback_hours = raw
                .parse()
                .map_err(|_| format!("DTS_PRACTICUM_FALLBACK_HOURS must be a number, got '{}'", raw))?;
        }
        if let Ok(raw) = env::var("DTS_PHYSICAL_SESSION_LIMIT") {
            config.physical_session_limit = raw
                .parse()
                .map_err(|_| format!("DTS_PHYSICAL_SESSION_LIMIT must be an integer, got '{}'", raw))?;
        }
        if let Ok(raw) = env::var("DTS_MAX_PHYSICAL_PER_DAY") {
            config.max_physical_sessions_per_day = raw
                .parse()
                .map_err(|_| format!("DTS_MAX_PHYSICAL_PER_DAY must be an integer, got '{}'", raw))?;
        }
        if let Ok(raw) = env::var("DTS_PRACTICUM_TITLE_MARKERS") {
            config.practicum.title_markers = split_markers(&raw);
        }
        if let Ok(raw) = env::var("DTS_PRACTICUM_CODE_MARKERS") {
            config.practicum.code_markers = split_markers(&raw);
        }

        Ok(config)
    }

    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(input)?;
        Ok(config)
    }
}

fn split_markers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|m| m.trim().to_uppercase())
        .filter(|m| !m.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.practicum_fallback_hours, 6.0);
        assert_eq!(config.physical_session_limit, 6);
        assert_eq!(config.max_physical_sessions_per_day, 2);
        assert!(config.seed.is_none());
        assert_eq!(config.practicum.title_markers, vec!["PRACTICUM"]);
        assert_eq!(config.practicum.code_markers, vec!["422", "131"]);
    }

    #[test]
    fn test_from_toml() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            seed = 42
            practicum_fallback_hours = 9.0

            [practicum]
            code_markers = ["500"]
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.practicum_fallback_hours, 9.0);
        assert_eq!(config.practicum.code_markers, vec!["500"]);
        // Unset sections keep their defaults.
        assert_eq!(config.physical_session_limit, 6);
        assert_eq!(config.practicum.title_markers, vec!["PRACTICUM"]);
    }

    #[test]
    fn test_split_markers() {
        assert_eq!(split_markers("422, 131 ,"), vec!["422", "131"]);
        assert_eq!(split_markers("practicum"), vec!["PRACTICUM"]);
    }
}
