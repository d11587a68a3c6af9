//! Hierarchical phase-ordered timetable generation.
//!
//! The generator splits the course catalog into phases (NSTP, GEC/MAT,
//! majors by year, PE), solves each phase as its own constraint model, and
//! carries every solved placement forward as immovable occupancy for the
//! phases that follow. One run is one pass:
//!
//! 1. Load input snapshots (courses, rooms, time settings, days).
//! 2. Partition and priority-sort the courses.
//! 3. For each phase in order: plan sessions, solve, record placements.
//! 4. Return the full event list, or fail the run on the first infeasible
//!    phase.

pub mod domain;
pub mod occupancy;
pub mod partition;

pub(crate) mod sessions;
pub(crate) mod solver;


pub use occupancy::OccupancyLedger;
pub use partition::Phase;

use crate::api::{CourseRecord, EventId, ScheduleEvent, SessionKind, ONLINE_ROOM};
use crate::config::SchedulerConfig;
use crate::models::{RoomPool, TimeGrid};
use crate::snapshot::{SnapshotError, SnapshotRepository};
use sessions::{CoursePlan, PracticumBalance, SessionFactory};
use solver::PlacedSession;
use thiserror::Error;
use tracing::info;

/// Sink for coarse progress percentages during a run.
///
/// The generator only writes monotonically increasing values; readers must
/// tolerate stale ones.
pub trait ProgressSink: Send + Sync {
    fn update(&self, value: i32);
}

/// Sink that discards all updates.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _value: i32) {}
}

/// Errors that end a generation run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A session has no legal start slot even after lunch relaxation.
    #[error("no feasible start slots for {course} block {block} ({kind})")]
    DomainEmpty {
        course: String,
        block: char,
        kind: SessionKind,
    },

    /// The solver proved a phase infeasible or hit its time limit.
    #[error("phase {0} has no feasible assignment")]
    PhaseInfeasible(Phase),

    /// The solver failed for a reason other than infeasibility.
    #[error("solver failure in phase {phase}: {message}")]
    Solver { phase: Phase, message: String },

    /// An input snapshot could not be loaded.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// The time settings or day list describe an unusable grid.
    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),
}

/// One-shot generator: load once, solve once.
pub struct HierarchicalScheduler {
    config: SchedulerConfig,
    grid: TimeGrid,
    days: Vec<String>,
    rooms: RoomPool,
    phases: Vec<(Phase, Vec<CourseRecord>)>,
    ledger: OccupancyLedger,
    balance: PracticumBalance,
    next_sid: u32,
}

impl HierarchicalScheduler {
    /// Load all input snapshots and prepare the run.
    ///
    /// Progress is reported at the fixed load stages 5/15/35/45/50.
    pub async fn load(
        repo: &dyn SnapshotRepository,
        config: SchedulerConfig,
        progress: &dyn ProgressSink,
    ) -> Result<Self, SchedulerError> {
        progress.update(5);
        let courses = repo.load_courses().await?;
        let phases = partition::partition(courses);

        progress.update(15);
        let inventory = repo.load_rooms().await?;
        let rooms = RoomPool::new(&inventory, config.seed);

        progress.update(35);
        let settings = repo.load_time_settings().await?;

        progress.update(45);
        let days = repo.load_days().await?;
        let grid = TimeGrid::new(&settings, days.len() as u32)
            .map_err(SchedulerError::InvalidTimeGrid)?;
        progress.update(50);

        Ok(Self {
            config,
            grid,
            days,
            rooms,
            phases,
            ledger: OccupancyLedger::new(),
            balance: PracticumBalance::default(),
            next_sid: 1,
        })
    }

    /// Solve every phase in order. The first infeasible phase fails the
    /// whole run; earlier phases are not rolled back, merely unpublished.
    pub fn solve(mut self, progress: &dyn ProgressSink) -> Result<Vec<ScheduleEvent>, SchedulerError> {
        progress.update(52);
        let phases = std::mem::take(&mut self.phases);
        let total = phases.len().max(1);
        let mut events = Vec::new();

        for (index, (phase, courses)) in phases.iter().enumerate() {
            info!(
                phase = phase.name(),
                courses = courses.len(),
                "starting phase"
            );
            let timeout = 30 + courses.len() as u64 * 2 + phase.timeout_boost_secs();
            let (plans, placed) = self.run_phase(*phase, courses, timeout)?;
            events.extend(self.record_placements(&plans, &placed));
            progress.update(50 + (((index + 1) * 45) / total) as i32);
        }

        info!(events = events.len(), "schedule generation complete");
        Ok(events)
    }

    fn run_phase(
        &mut self,
        phase: Phase,
        courses: &[CourseRecord],
        timeout: u64,
    ) -> Result<(Vec<CoursePlan>, Vec<PlacedSession>), SchedulerError> {
        let mut factory = SessionFactory {
            grid: &self.grid,
            ledger: &self.ledger,
            config: &self.config,
            balance: &mut self.balance,
            next_sid: &mut self.next_sid,
        };
        let mut plans = Vec::with_capacity(courses.len());
        for course in courses {
            plans.push(factory.plan_course(course)?);
        }

        let placed = solver::solve_phase(
            &self.grid,
            &self.rooms,
            &self.ledger,
            &self.config,
            phase,
            &plans,
            timeout,
        )?;
        Ok((plans, placed))
    }

    /// Emit events for a solved phase and mark its slots as immovable for
    /// every later phase.
    fn record_placements(
        &mut self,
        plans: &[CoursePlan],
        placed: &[PlacedSession],
    ) -> Vec<ScheduleEvent> {
        let mut events = Vec::with_capacity(placed.len());
        for placement in placed {
            let plan = &plans[placement.plan_index];
            let group = &plan.groups[placement.group_index];
            let slots = placement.start..placement.start + placement.duration;

            let room_name = placement
                .room
                .and_then(|index| {
                    group
                        .kind
                        .room_kind()
                        .and_then(|kind| self.rooms.name(kind, index))
                })
                .map(str::to_string)
                .unwrap_or_else(|| ONLINE_ROOM.to_string());
            let period = self.grid.format_period(placement.start, placement.duration);
            let day_name = self
                .days
                .get(placement.day as usize)
                .cloned()
                .unwrap_or_default();

            let shared = group.blocks.len() == 2;
            for (half, block) in group.blocks.iter().enumerate() {
                let schedule_id = if shared {
                    let suffix = if half == 0 { "A" } else { "B" };
                    EventId::new(format!("{}-{}", placement.sid, suffix))
                } else {
                    EventId::new(placement.sid.to_string())
                };
                events.push(ScheduleEvent {
                    schedule_id,
                    course_code: plan.course_code.clone(),
                    base_course_code: plan.course_code.clone(),
                    title: plan.title.clone(),
                    program: plan.program.clone(),
                    year: plan.year,
                    session: group.kind,
                    block: *block,
                    day: day_name.clone(),
                    period: period.clone(),
                    room: room_name.clone(),
                });
                self.ledger
                    .block_section(&plan.section_key(*block), slots.clone());
            }
            if let (Some(index), Some(kind)) = (placement.room, group.kind.room_kind()) {
                self.ledger.block_room(kind, index, slots);
            }
        }
        events
    }
}
