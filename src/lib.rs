//! # DTS Rust Backend
//!
//! Scheduling core of the Department Timetabling System: generates a
//! feasible weekly academic timetable for a university department from
//! read-only snapshots of courses, rooms, and time settings.
//!
//! ## Features
//!
//! - **Phase-ordered solving**: NSTP, GEC/MAT, majors by year, then PE,
//!   each phase solved as its own constraint model
//! - **Hard constraints**: section and room non-overlap, category day and
//!   start-time restrictions, daily in-person caps, practicum day chains,
//!   lunch protection, paired general-education meetings
//! - **Cross-phase occupancy**: placements from earlier phases become
//!   immovable blockages for later ones
//! - **Progress side-channel**: per-run progress and status for polling
//!   endpoints, plus an atomically replaced publication board
//!
//! ## Architecture
//!
//! - [`api`]: boundary types for inputs and emitted schedule events
//! - [`config`]: run configuration (seed, practicum rules, limits)
//! - [`models`]: the half-hour time grid and course/room domain types
//! - [`scheduler`]: partitioning, domain building, session planning, the
//!   per-phase solver, and the orchestrator
//! - [`services`]: progress tracking, schedule publication, and the async
//!   generation service
//! - [`snapshot`]: input snapshot contracts and the in-memory source

pub mod api;
pub mod config;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod snapshot;
