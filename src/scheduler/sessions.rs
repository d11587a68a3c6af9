//! Session planning: course to solver-ready session groups.
//!
//! A course expands into one or more *session groups*. Each group is the set
//! of meetings created together for one block (or one merged block pair) and
//! one kind, and carries the structural constraints the solver must enforce
//! within it: distinct days, GEC day pairing, practicum day chaining, and
//! room consistency.

use super::domain::{self, SessionFlags, StartDomain};
use super::occupancy::OccupancyLedger;
use super::partition::{categorize, is_practicum, CourseCategory};
use super::SchedulerError;
use crate::api::{CourseRecord, SessionKind};
use crate::config::SchedulerConfig;
use crate::models::time::SLOT_HOURS;
use crate::models::{block_letter, SectionKey, TimeGrid};
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

/// One meeting to place: duration, legal starts, and whether it may take a
/// physical room.
#[derive(Debug, Clone)]
pub(crate) struct SessionPlan {
    pub sid: u32,
    pub duration: u32,
    pub domain: StartDomain,
    pub physical: bool,
}

/// Meetings created together for one block (or merged pair) and one kind.
#[derive(Debug, Clone)]
pub(crate) struct SessionGroup {
    pub kind: SessionKind,
    /// Sections attending every session of the group; two entries for a
    /// shared (merged) session.
    pub blocks: Vec<char>,
    /// Two lecture meetings on a Mon/Tue or Wed/Thu pair at the same offset.
    pub gec_paired: bool,
    /// Practicum: session `i` falls on the day after session `i - 1`.
    pub consecutive_days: bool,
    pub sessions: Vec<SessionPlan>,
}

/// All session groups of one course, plus the identity fields every emitted
/// event repeats.
#[derive(Debug, Clone)]
pub(crate) struct CoursePlan {
    pub course_code: String,
    pub title: String,
    pub program: String,
    pub year: u8,
    pub groups: Vec<SessionGroup>,
}

impl CoursePlan {
    pub fn section_key(&self, block: char) -> SectionKey {
        SectionKey::new(self.program.clone(), self.year, block)
    }
}

/// Running practicum load per half-week, used to spread practicum blocks
/// between the Monday-Wednesday and Thursday-Saturday windows.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PracticumBalance {
    pub early_week: u32,
    pub late_week: u32,
}

impl PracticumBalance {
    pub fn preferred_window(&self) -> u8 {
        if self.early_week <= self.late_week {
            0
        } else {
            1
        }
    }

    pub fn record(&mut self, window: u8) {
        if window == 0 {
            self.early_week += 1;
        } else {
            self.late_week += 1;
        }
    }
}

/// Builds session plans for the courses of one phase. Domains are computed
/// against the ledger state frozen at phase entry; conflicts between courses
/// of the same phase are left to the solver model.
pub(crate) struct SessionFactory<'a> {
    pub grid: &'a TimeGrid,
    pub ledger: &'a OccupancyLedger,
    pub config: &'a SchedulerConfig,
    pub balance: &'a mut PracticumBalance,
    pub next_sid: &'a mut u32,
}

impl SessionFactory<'_> {
    pub fn plan_course(&mut self, course: &CourseRecord) -> Result<CoursePlan, SchedulerError> {
        if is_practicum(course, &self.config.practicum) {
            return self.plan_practicum(course);
        }

        let category = categorize(&course.course_code.to_uppercase());
        let mut plan = CoursePlan {
            course_code: course.course_code.clone(),
            title: course.title.clone(),
            program: course.program.clone(),
            year: course.year_level,
            groups: Vec::new(),
        };

        if course.units_lecture > 0.0 {
            self.plan_lectures(course, category, &mut plan)?;
        }
        if course.units_lab > 0.0 {
            self.plan_labs(course, &mut plan)?;
        }

        Ok(plan)
    }

    fn plan_lectures(
        &mut self,
        course: &CourseRecord,
        category: CourseCategory,
        plan: &mut CoursePlan,
    ) -> Result<(), SchedulerError> {
        let total_slots = (course.units_lecture * 2.0) as u32;
        if total_slots == 0 {
            warn!(course = %course.course_code, "lecture units too small for one slot, skipping");
            return Ok(());
        }

        let (count, duration) = if category.pe {
            if total_slots > 8 {
                (2, total_slots / 2)
            } else {
                (1, total_slots)
            }
        } else if total_slots > 3 && !category.nstp {
            (2, total_slots / 2)
        } else {
            (1, total_slots)
        };

        let year = course.year_level;
        let should_merge = (year == 1 || year == 2 || category.nstp) && !category.pe;
        let flags = SessionFlags {
            gec: category.gec,
            nstp: category.nstp,
            pe: category.pe,
            ..Default::default()
        };

        let mut processed: HashSet<u32> = HashSet::new();
        for i in 0..course.blocks {
            if processed.contains(&i) {
                continue;
            }
            let block = block_letter(i);

            if should_merge && i + 1 < course.blocks {
                let next = block_letter(i + 1);
                if let Some(group) =
                    self.plan_shared(plan, block, next, count, duration, flags, category)
                {
                    plan.groups.push(group);
                    processed.insert(i);
                    processed.insert(i + 1);
                    continue;
                }
                // No joint domain for the pair; fall back to a solo session
                // and let the next block try merging with its successor.
            }

            let group = self.plan_single(
                plan,
                block,
                SessionKind::Lecture,
                count,
                duration,
                flags,
                category.gec,
            )?;
            plan.groups.push(group);
            processed.insert(i);
        }
        Ok(())
    }

    fn plan_labs(
        &mut self,
        course: &CourseRecord,
        plan: &mut CoursePlan,
    ) -> Result<(), SchedulerError> {
        let (count, duration) = if course.units_lab == 1.0 {
            (2, 3)
        } else {
            let total_slots = (course.units_lab * 6.0) as u32;
            (2, total_slots / 2)
        };
        if duration == 0 {
            warn!(course = %course.course_code, "lab units too small for one slot, skipping");
            return Ok(());
        }

        for i in 0..course.blocks {
            let group = self.plan_single(
                plan,
                block_letter(i),
                SessionKind::Laboratory,
                count,
                duration,
                SessionFlags::default(),
                false,
            )?;
            plan.groups.push(group);
        }
        Ok(())
    }

    /// Sessions for one block. Fails the phase when no start fits.
    fn plan_single(
        &mut self,
        plan: &CoursePlan,
        block: char,
        kind: SessionKind,
        count: u32,
        duration: u32,
        flags: SessionFlags,
        gec: bool,
    ) -> Result<SessionGroup, SchedulerError> {
        let occupied = self.ledger.section_slots(&plan.section_key(block));
        let domain = domain::valid_starts(self.grid, duration, occupied, flags);
        if domain.is_empty() {
            return Err(SchedulerError::DomainEmpty {
                course: plan.course_code.clone(),
                block,
                kind,
            });
        }
        Ok(self.build_group(kind, vec![block], count, duration, domain, gec))
    }

    /// Shared session both blocks attend. Returns `None` when the combined
    /// occupancy leaves no start, so the caller can fall back to per-block
    /// sessions.
    fn plan_shared(
        &mut self,
        plan: &CoursePlan,
        block_a: char,
        block_b: char,
        count: u32,
        duration: u32,
        flags: SessionFlags,
        category: CourseCategory,
    ) -> Option<SessionGroup> {
        let combined: BTreeSet<u32> = self
            .ledger
            .section_slots(&plan.section_key(block_a))
            .union(self.ledger.section_slots(&plan.section_key(block_b)))
            .copied()
            .collect();
        let domain = domain::valid_starts(self.grid, duration, &combined, flags);
        if domain.is_empty() {
            return None;
        }
        Some(self.build_group(
            SessionKind::Lecture,
            vec![block_a, block_b],
            count,
            duration,
            domain,
            category.gec,
        ))
    }

    fn build_group(
        &mut self,
        kind: SessionKind,
        blocks: Vec<char>,
        count: u32,
        duration: u32,
        domain: StartDomain,
        gec: bool,
    ) -> SessionGroup {
        let sessions = (0..count)
            .map(|i| SessionPlan {
                sid: self.alloc_sid(),
                duration,
                domain: domain.clone(),
                physical: (i as usize) < self.config.physical_session_limit,
            })
            .collect();
        SessionGroup {
            kind,
            blocks,
            gec_paired: gec && count == 2,
            consecutive_days: false,
            sessions,
        }
    }

    fn plan_practicum(&mut self, course: &CourseRecord) -> Result<CoursePlan, SchedulerError> {
        let mut total_hours = course.units_lab * 3.0 + course.units_lecture;
        if total_hours == 0.0 {
            total_hours = self.config.practicum_fallback_hours;
        }
        let num_days = if total_hours > 18.0 { 3 } else { 2 };
        let slots_per_session = ((total_hours / num_days as f64) / SLOT_HOURS).ceil() as u32;

        let mut plan = CoursePlan {
            course_code: course.course_code.clone(),
            title: course.title.clone(),
            program: course.program.clone(),
            year: course.year_level,
            groups: Vec::new(),
        };

        for i in 0..course.blocks {
            let block = block_letter(i);
            let occupied = self.ledger.section_slots(&plan.section_key(block));

            let mut window = self.balance.preferred_window();
            let mut domain = self.practicum_domain(slots_per_session, occupied, window);
            if domain.is_empty() {
                window = 1 - window;
                domain = self.practicum_domain(slots_per_session, occupied, window);
            }
            if domain.is_empty() {
                return Err(SchedulerError::DomainEmpty {
                    course: plan.course_code.clone(),
                    block,
                    kind: SessionKind::Practicum,
                });
            }
            // The window counter moves when the block is scheduled, not when
            // the solution is extracted.
            self.balance.record(window);

            let sessions = (0..num_days)
                .map(|_| SessionPlan {
                    sid: self.alloc_sid(),
                    duration: slots_per_session,
                    domain: domain.clone(),
                    physical: false,
                })
                .collect();
            plan.groups.push(SessionGroup {
                kind: SessionKind::Practicum,
                blocks: vec![block],
                gec_paired: false,
                consecutive_days: true,
                sessions,
            });
        }

        Ok(plan)
    }

    fn practicum_domain(
        &self,
        duration: u32,
        occupied: &BTreeSet<u32>,
        window: u8,
    ) -> StartDomain {
        let flags = SessionFlags {
            practicum: true,
            practicum_window: Some(window),
            ..Default::default()
        };
        domain::valid_starts(self.grid, duration, occupied, flags)
    }

    fn alloc_sid(&mut self) -> u32 {
        let sid = *self.next_sid;
        *self.next_sid += 1;
        sid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TimeSettings;

    struct Fixture {
        grid: TimeGrid,
        ledger: OccupancyLedger,
        config: SchedulerConfig,
        balance: PracticumBalance,
        next_sid: u32,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                grid: TimeGrid::new(&TimeSettings::default(), 6).unwrap(),
                ledger: OccupancyLedger::new(),
                config: SchedulerConfig::default(),
                balance: PracticumBalance::default(),
                next_sid: 1,
            }
        }

        fn factory(&mut self) -> SessionFactory<'_> {
            SessionFactory {
                grid: &self.grid,
                ledger: &self.ledger,
                config: &self.config,
                balance: &mut self.balance,
                next_sid: &mut self.next_sid,
            }
        }
    }

    #[test]
    fn test_lecture_split_over_three_slots() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS301", "Algorithms", "BSCS", 3, 3.0, 0.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        assert_eq!(plan.groups.len(), 1);
        let group = &plan.groups[0];
        assert_eq!(group.kind, SessionKind::Lecture);
        assert_eq!(group.sessions.len(), 2);
        assert!(group.sessions.iter().all(|s| s.duration == 3));
        assert!(group.sessions.iter().all(|s| s.physical));
        assert!(!group.gec_paired);
    }

    #[test]
    fn test_short_lecture_stays_single() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS310", "Seminar", "BSCS", 3, 1.5, 0.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        assert_eq!(plan.groups[0].sessions.len(), 1);
        assert_eq!(plan.groups[0].sessions[0].duration, 3);
    }

    #[test]
    fn test_nstp_collapses_to_single_session() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("NSTP11", "Civic Welfare", "BSCS", 1, 3.0, 0.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        assert_eq!(plan.groups[0].sessions.len(), 1);
        assert_eq!(plan.groups[0].sessions[0].duration, 6);
    }

    #[test]
    fn test_gec_pairing_flag() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("GEC101", "Purposive Comm", "BSCS", 1, 3.0, 0.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        let group = &plan.groups[0];
        assert!(group.gec_paired);
        assert_eq!(group.sessions.len(), 2);
    }

    #[test]
    fn test_year_one_blocks_merge_in_pairs() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS101", "Intro", "BSCS", 1, 3.0, 0.0, 2);
        let plan = fx.factory().plan_course(&course).unwrap();
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].blocks, vec!['A', 'B']);
    }

    #[test]
    fn test_odd_block_left_solo() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS101", "Intro", "BSCS", 1, 3.0, 0.0, 3);
        let plan = fx.factory().plan_course(&course).unwrap();
        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.groups[0].blocks, vec!['A', 'B']);
        assert_eq!(plan.groups[1].blocks, vec!['C']);
    }

    #[test]
    fn test_upper_years_never_merge() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS301", "Algorithms", "BSCS", 3, 3.0, 0.0, 2);
        let plan = fx.factory().plan_course(&course).unwrap();
        assert_eq!(plan.groups.len(), 2);
        assert!(plan.groups.iter().all(|g| g.blocks.len() == 1));
    }

    #[test]
    fn test_single_unit_lab_gets_two_short_sessions() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS205", "Data Structures", "BSCS", 2, 2.0, 1.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        let lab = plan
            .groups
            .iter()
            .find(|g| g.kind == SessionKind::Laboratory)
            .unwrap();
        assert_eq!(lab.sessions.len(), 2);
        assert!(lab.sessions.iter().all(|s| s.duration == 3));
    }

    #[test]
    fn test_two_unit_lab_duration() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS206", "Networks", "BSCS", 2, 0.0, 2.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        let lab = &plan.groups[0];
        assert_eq!(lab.sessions.len(), 2);
        assert!(lab.sessions.iter().all(|s| s.duration == 6));
    }

    #[test]
    fn test_practicum_day_count_scales_with_hours() {
        let mut fx = Fixture::new();
        // 2 lab units + 0 lecture: 6 hours, 2 days, 3h per day.
        let light = CourseRecord::new("CS422", "Practicum", "BSCS", 4, 0.0, 2.0, 1);
        let plan = fx.factory().plan_course(&light).unwrap();
        let group = &plan.groups[0];
        assert!(group.consecutive_days);
        assert_eq!(group.sessions.len(), 2);
        assert_eq!(group.sessions[0].duration, 6);

        // 7 lab units: 21 hours, 3 days, 7h per day.
        let mut fx = Fixture::new();
        let heavy = CourseRecord::new("CS422", "Practicum", "BSCS", 4, 0.0, 7.0, 1);
        let plan = fx.factory().plan_course(&heavy).unwrap();
        assert_eq!(plan.groups[0].sessions.len(), 3);
        assert_eq!(plan.groups[0].sessions[0].duration, 14);
    }

    #[test]
    fn test_practicum_fallback_hours() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS422", "Practicum", "BSCS", 4, 0.0, 0.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        // 6 fallback hours over 2 days is 3h, six slots each.
        assert_eq!(plan.groups[0].sessions.len(), 2);
        assert_eq!(plan.groups[0].sessions[0].duration, 6);
    }

    #[test]
    fn test_practicum_windows_alternate() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS422", "Practicum", "BSCS", 4, 0.0, 2.0, 2);
        fx.factory().plan_course(&course).unwrap();
        // First block takes the early window, second the late one.
        assert_eq!(fx.balance.early_week, 1);
        assert_eq!(fx.balance.late_week, 1);
    }

    #[test]
    fn test_practicum_window_flips_when_blocked() {
        let mut fx = Fixture::new();
        // Fill days 0..3 for the section so the early window has no room.
        let key = SectionKey::new("BSCS", 4, 'A');
        let spd = fx.grid.slots_per_day();
        fx.ledger.block_section(&key, 0..3 * spd);

        let course = CourseRecord::new("CS422", "Practicum", "BSCS", 4, 0.0, 2.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        assert_eq!(fx.balance.late_week, 1);
        assert_eq!(fx.balance.early_week, 0);
        // Every candidate start sits in the late window.
        for (slot, _) in plan.groups[0].sessions[0].domain.iter() {
            assert!(fx.grid.day_of(slot) >= 3);
        }
    }

    #[test]
    fn test_practicum_fails_when_both_windows_blocked() {
        let mut fx = Fixture::new();
        let key = SectionKey::new("BSCS", 4, 'A');
        fx.ledger.block_section(&key, 0..fx.grid.total_slots());

        let course = CourseRecord::new("CS422", "Practicum", "BSCS", 4, 0.0, 2.0, 1);
        let err = fx.factory().plan_course(&course).unwrap_err();
        assert!(matches!(err, SchedulerError::DomainEmpty { .. }));
    }

    #[test]
    fn test_domain_empty_is_fatal_for_single_block() {
        let mut fx = Fixture::new();
        let key = SectionKey::new("BSCS", 3, 'A');
        fx.ledger.block_section(&key, 0..fx.grid.total_slots());

        let course = CourseRecord::new("CS301", "Algorithms", "BSCS", 3, 3.0, 0.0, 1);
        let err = fx.factory().plan_course(&course).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::DomainEmpty {
                kind: SessionKind::Lecture,
                ..
            }
        ));
    }

    #[test]
    fn test_merge_falls_back_when_pair_domain_empty() {
        let mut fx = Fixture::new();
        // Block B is fully occupied: A+B have no joint start, so block A is
        // planned solo and B fails on its own empty domain later.
        let key_b = SectionKey::new("BSCS", 1, 'B');
        fx.ledger.block_section(&key_b, 0..fx.grid.total_slots());

        let course = CourseRecord::new("CS101", "Intro", "BSCS", 1, 3.0, 0.0, 2);
        let err = fx.factory().plan_course(&course).unwrap_err();
        assert!(matches!(err, SchedulerError::DomainEmpty { block: 'B', .. }));
    }

    #[test]
    fn test_session_ids_are_sequential() {
        let mut fx = Fixture::new();
        let course = CourseRecord::new("CS301", "Algorithms", "BSCS", 3, 3.0, 1.0, 1);
        let plan = fx.factory().plan_course(&course).unwrap();
        let sids: Vec<u32> = plan
            .groups
            .iter()
            .flat_map(|g| g.sessions.iter().map(|s| s.sid))
            .collect();
        assert_eq!(sids, vec![1, 2, 3, 4]);
        assert_eq!(fx.next_sid, 5);
    }
}
