//! Phase classification and priority ordering of courses.
//!
//! Every course lands in exactly one scheduling phase; phases are solved
//! strictly in `order()` sequence so that the most constrained categories
//! claim the grid first. Within a phase, courses are sorted by a priority
//! score favoring lab-bearing, many-block, high-unit courses.

use crate::api::CourseRecord;
use crate::config::PracticumRules;
use serde::Serialize;

/// Coarse grouping that serializes the week into smaller solver problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// Friday/Saturday civic-training courses.
    Nstp,
    /// General-education and mathematics courses with strict day patterns.
    GecMat,
    MajorsY4,
    MajorsY3,
    MajorsY2,
    MajorsY1,
    /// Physical education, placed last to fill the edges of each day.
    Pe,
}

impl Phase {
    /// All phases in solve order.
    pub const ALL: [Phase; 7] = [
        Phase::Nstp,
        Phase::GecMat,
        Phase::MajorsY4,
        Phase::MajorsY3,
        Phase::MajorsY2,
        Phase::MajorsY1,
        Phase::Pe,
    ];

    /// Explicit solve rank; do not rely on declaration order.
    pub fn order(&self) -> u8 {
        match self {
            Phase::Nstp => 1,
            Phase::GecMat => 2,
            Phase::MajorsY4 => 3,
            Phase::MajorsY3 => 4,
            Phase::MajorsY2 => 5,
            Phase::MajorsY1 => 6,
            Phase::Pe => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Nstp => "NSTP",
            Phase::GecMat => "GEC_MAT",
            Phase::MajorsY4 => "MAJORS_Y4",
            Phase::MajorsY3 => "MAJORS_Y3",
            Phase::MajorsY2 => "MAJORS_Y2",
            Phase::MajorsY1 => "MAJORS_Y1",
            Phase::Pe => "PE",
        }
    }

    /// Extra solver seconds granted on top of the per-phase base timeout.
    pub fn timeout_boost_secs(&self) -> u64 {
        match self {
            Phase::GecMat | Phase::Pe => 60,
            Phase::MajorsY3 => 90,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Category flags derived from the course code; these drive start-domain
/// restrictions independently of the phase assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseCategory {
    pub nstp: bool,
    pub gec: bool,
    pub pe: bool,
}

/// Flags for an uppercased course code.
pub fn categorize(code_upper: &str) -> CourseCategory {
    CourseCategory {
        nstp: code_upper.contains("NSTP"),
        gec: code_upper.starts_with("GEC") || code_upper.starts_with("MAT"),
        pe: code_upper.contains("PE") || code_upper.contains("PATHFIT"),
    }
}

/// Phase for a course: a priority cascade on the uppercased code, falling
/// back to the year level for majors. Unknown years map to first year.
pub fn classify(course: &CourseRecord) -> Phase {
    let code = course.course_code.to_uppercase();
    if code.contains("NSTP") {
        return Phase::Nstp;
    }
    if code.starts_with("GEC") || code.starts_with("MAT") {
        return Phase::GecMat;
    }
    if code.contains("PE") || code.contains("PATHFIT") {
        return Phase::Pe;
    }
    match course.year_level {
        4 => Phase::MajorsY4,
        3 => Phase::MajorsY3,
        2 => Phase::MajorsY2,
        _ => Phase::MajorsY1,
    }
}

/// True when the course is a multi-day practicum under the configured rules.
pub fn is_practicum(course: &CourseRecord, rules: &PracticumRules) -> bool {
    let title = course.title.to_uppercase();
    let code = course.course_code.to_uppercase();
    rules
        .title_markers
        .iter()
        .any(|m| title.contains(&m.to_uppercase()))
        || rules
            .code_markers
            .iter()
            .any(|m| code.contains(&m.to_uppercase()))
}

/// In-phase priority: lab-bearing courses first, then by block count, then
/// by total units.
pub fn priority_score(course: &CourseRecord) -> f64 {
    let lab_weight = if course.units_lab == 0.0 { 0.0 } else { 1000.0 };
    lab_weight + course.blocks as f64 * 100.0 + (course.units_lecture + course.units_lab) * 10.0
}

/// Split courses into phases in solve order, each phase sorted by priority
/// descending. Empty phases are omitted.
pub fn partition(courses: Vec<CourseRecord>) -> Vec<(Phase, Vec<CourseRecord>)> {
    let mut by_phase: Vec<(Phase, Vec<CourseRecord>)> =
        Phase::ALL.iter().map(|p| (*p, Vec::new())).collect();
    for course in courses {
        let phase = classify(&course);
        let bucket = by_phase
            .iter_mut()
            .find(|(p, _)| *p == phase)
            .expect("every phase is present");
        bucket.1.push(course);
    }
    by_phase.sort_by_key(|(phase, _)| phase.order());
    for (_, bucket) in &mut by_phase {
        bucket.sort_by(|a, b| {
            priority_score(b)
                .partial_cmp(&priority_score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    by_phase.retain(|(_, bucket)| !bucket.is_empty());
    by_phase
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str, year: u8) -> CourseRecord {
        CourseRecord::new(code, "Title", "BSCS", year, 3.0, 0.0, 1)
    }

    #[test]
    fn test_classification_cascade() {
        assert_eq!(classify(&course("NSTP11", 1)), Phase::Nstp);
        assert_eq!(classify(&course("GEC101", 3)), Phase::GecMat);
        assert_eq!(classify(&course("MAT201", 2)), Phase::GecMat);
        assert_eq!(classify(&course("PE1", 1)), Phase::Pe);
        assert_eq!(classify(&course("PATHFIT2", 1)), Phase::Pe);
        assert_eq!(classify(&course("CS401", 4)), Phase::MajorsY4);
        assert_eq!(classify(&course("CS301", 3)), Phase::MajorsY3);
        assert_eq!(classify(&course("CS201", 2)), Phase::MajorsY2);
        assert_eq!(classify(&course("CS101", 1)), Phase::MajorsY1);
        // Unknown years fall back to first-year majors.
        assert_eq!(classify(&course("CS999", 9)), Phase::MajorsY1);
    }

    #[test]
    fn test_nstp_beats_pe_substring() {
        // "NSTP" contains "P"; make sure a code matching several rules takes
        // the first branch of the cascade.
        assert_eq!(classify(&course("NSTPE1", 1)), Phase::Nstp);
    }

    #[test]
    fn test_lowercase_codes_classify() {
        assert_eq!(classify(&course("gec5", 1)), Phase::GecMat);
        assert_eq!(classify(&course("nstp12", 1)), Phase::Nstp);
    }

    #[test]
    fn test_phase_order() {
        let orders: Vec<u8> = Phase::ALL.iter().map(Phase::order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_timeout_boosts() {
        assert_eq!(Phase::GecMat.timeout_boost_secs(), 60);
        assert_eq!(Phase::Pe.timeout_boost_secs(), 60);
        assert_eq!(Phase::MajorsY3.timeout_boost_secs(), 90);
        assert_eq!(Phase::Nstp.timeout_boost_secs(), 0);
        assert_eq!(Phase::MajorsY1.timeout_boost_secs(), 0);
    }

    #[test]
    fn test_priority_score() {
        let plain = CourseRecord::new("CS101", "", "BSCS", 1, 3.0, 0.0, 1);
        let with_lab = CourseRecord::new("CS102", "", "BSCS", 1, 2.0, 1.0, 1);
        let many_blocks = CourseRecord::new("CS103", "", "BSCS", 1, 3.0, 0.0, 4);
        assert_eq!(priority_score(&plain), 130.0);
        assert_eq!(priority_score(&with_lab), 1130.0);
        assert_eq!(priority_score(&many_blocks), 430.0);
    }

    #[test]
    fn test_partition_orders_phases_and_priorities() {
        let courses = vec![
            course("CS101", 1),
            CourseRecord::new("CS105", "", "BSCS", 1, 2.0, 1.0, 2),
            course("GEC1", 1),
            course("NSTP11", 1),
            course("PE1", 1),
        ];
        let phases = partition(courses);
        let names: Vec<&str> = phases.iter().map(|(p, _)| p.name()).collect();
        assert_eq!(names, vec!["NSTP", "GEC_MAT", "MAJORS_Y1", "PE"]);

        // Lab-bearing CS105 outranks CS101 within the majors phase.
        let majors = &phases.iter().find(|(p, _)| *p == Phase::MajorsY1).unwrap().1;
        assert_eq!(majors[0].course_code, "CS105");
        assert_eq!(majors[1].course_code, "CS101");
    }

    #[test]
    fn test_practicum_rules() {
        let rules = crate::config::PracticumRules::default();
        let by_title = CourseRecord::new("CS410", "Practicum in Industry", "BSCS", 4, 0.0, 2.0, 1);
        let by_code = course("CS422", 4);
        let by_other_code = course("IT131", 1);
        let plain = course("CS301", 3);
        assert!(is_practicum(&by_title, &rules));
        assert!(is_practicum(&by_code, &rules));
        assert!(is_practicum(&by_other_code, &rules));
        assert!(!is_practicum(&plain, &rules));
    }

    #[test]
    fn test_categorize_flags() {
        let cat = categorize("GEC101");
        assert!(cat.gec && !cat.nstp && !cat.pe);
        let cat = categorize("PATHFIT1");
        assert!(cat.pe && !cat.gec);
        let cat = categorize("NSTP11");
        assert!(cat.nstp);
    }
}
