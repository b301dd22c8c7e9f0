//! Qualification Evaluator
//!
//! Pure rule evaluation mapping a submission's answers to a status and an
//! ordered tag set. No I/O, no failure modes: the same input always yields
//! the same result.

use lg_common::{tags, AttendanceMode};

use crate::domain::application::ApplicationSubmission;

/// The answers the qualification rules look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationInput {
    pub nationality: String,
    pub uae_resident: bool,
    pub willing_to_work: bool,
    pub willing_to_drive: bool,
    pub accepts_timeframe: bool,
    pub accepts_financial_costs: bool,
    pub attendance_mode: AttendanceMode,
}

impl From<&ApplicationSubmission> for QualificationInput {
    fn from(s: &ApplicationSubmission) -> Self {
        Self {
            nationality: s.nationality.clone(),
            uae_resident: s.uae_resident,
            willing_to_work: s.willing_to_work,
            willing_to_drive: s.willing_to_drive,
            accepts_timeframe: s.accepts_timeframe,
            accepts_financial_costs: s.accepts_financial_costs,
            attendance_mode: s.attendance_mode,
        }
    }
}

/// Outcome of the automated evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationResult {
    /// The qualified sentinel, or the first disqualifying tag in rule order
    pub status: String,
    /// All tags in first-seen order; always ends with exactly one attendance tag
    pub tags: Vec<String>,
}

/// Ordered tag collection with insert-if-absent semantics. Consumers display
/// tags in rule-evaluation order, so a hash set will not do.
#[derive(Debug, Default)]
struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    fn insert(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }
}

/// Evaluate the fixed qualification rules against a submission.
///
/// Rules run in a fixed order and are independent: every failing rule
/// contributes its tag (deduplicated), and the attendance tag is always
/// appended last. The status is the first disqualifying tag, or the
/// qualified sentinel when none fired.
pub fn evaluate(input: &QualificationInput) -> QualificationResult {
    let mut disqualifying = TagSet::default();

    if !input.nationality.eq_ignore_ascii_case(tags::REFERENCE_NATIONALITY) {
        disqualifying.insert(tags::NOT_SUITABLE_CRITERIA);
    }
    if !input.uae_resident {
        disqualifying.insert(tags::NOT_SUITABLE_CRITERIA);
    }
    if !input.willing_to_work {
        disqualifying.insert(tags::NOT_SUITABLE_CRITERIA);
    }
    if !input.willing_to_drive {
        disqualifying.insert(tags::NOT_SUITABLE_DRIVING);
    }
    if !input.accepts_timeframe {
        disqualifying.insert(tags::NOT_SUITABLE_EXPECTATIONS);
    }
    if !input.accepts_financial_costs {
        disqualifying.insert(tags::NOT_SUITABLE_FINANCIAL);
    }

    let status = disqualifying
        .tags
        .first()
        .cloned()
        .unwrap_or_else(|| tags::QUALIFIED.to_string());

    // Attendance tag is informational and never affects the status
    let mut all = disqualifying;
    all.insert(match input.attendance_mode {
        AttendanceMode::InPerson => tags::ATTENDANCE_IN_PERSON,
        AttendanceMode::Online => tags::ATTENDANCE_ONLINE,
    });

    QualificationResult { status, tags: all.tags }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing_input() -> QualificationInput {
        QualificationInput {
            nationality: "Filipino".to_string(),
            uae_resident: true,
            willing_to_work: true,
            willing_to_drive: true,
            accepts_timeframe: true,
            accepts_financial_costs: true,
            attendance_mode: AttendanceMode::InPerson,
        }
    }

    #[test]
    fn test_all_rules_passing_qualifies() {
        let result = evaluate(&passing_input());

        assert_eq!(result.status, tags::QUALIFIED);
        assert_eq!(result.tags, vec![tags::ATTENDANCE_IN_PERSON.to_string()]);
    }

    #[test]
    fn test_nationality_is_case_insensitive() {
        let mut input = passing_input();
        input.nationality = "FILIPINO".to_string();

        assert_eq!(evaluate(&input).status, tags::QUALIFIED);
    }

    #[test]
    fn test_single_failing_rule_sets_status() {
        let cases: Vec<(fn(&mut QualificationInput), &str)> = vec![
            (|i| i.nationality = "other".to_string(), tags::NOT_SUITABLE_CRITERIA),
            (|i| i.uae_resident = false, tags::NOT_SUITABLE_CRITERIA),
            (|i| i.willing_to_work = false, tags::NOT_SUITABLE_CRITERIA),
            (|i| i.willing_to_drive = false, tags::NOT_SUITABLE_DRIVING),
            (|i| i.accepts_timeframe = false, tags::NOT_SUITABLE_EXPECTATIONS),
            (|i| i.accepts_financial_costs = false, tags::NOT_SUITABLE_FINANCIAL),
        ];

        for (mutate, expected_tag) in cases {
            let mut input = passing_input();
            mutate(&mut input);
            let result = evaluate(&input);

            assert_eq!(result.status, expected_tag);
            assert_eq!(
                result.tags,
                vec![expected_tag.to_string(), tags::ATTENDANCE_IN_PERSON.to_string()]
            );
        }
    }

    #[test]
    fn test_shared_criteria_tag_deduplicated() {
        let mut input = passing_input();
        input.nationality = "other".to_string();
        input.uae_resident = false;
        input.willing_to_work = false;

        let result = evaluate(&input);

        assert_eq!(result.status, tags::NOT_SUITABLE_CRITERIA);
        assert_eq!(
            result.tags,
            vec![
                tags::NOT_SUITABLE_CRITERIA.to_string(),
                tags::ATTENDANCE_IN_PERSON.to_string()
            ]
        );
    }

    #[test]
    fn test_status_is_first_disqualifying_tag_in_rule_order() {
        let mut input = passing_input();
        input.willing_to_drive = false;
        input.accepts_financial_costs = false;

        let result = evaluate(&input);

        assert_eq!(result.status, tags::NOT_SUITABLE_DRIVING);
        assert_eq!(
            result.tags,
            vec![
                tags::NOT_SUITABLE_DRIVING.to_string(),
                tags::NOT_SUITABLE_FINANCIAL.to_string(),
                tags::ATTENDANCE_IN_PERSON.to_string()
            ]
        );
    }

    #[test]
    fn test_online_attendance_tag() {
        let mut input = passing_input();
        input.attendance_mode = AttendanceMode::Online;

        let result = evaluate(&input);

        assert_eq!(result.tags, vec![tags::ATTENDANCE_ONLINE.to_string()]);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let mut input = passing_input();
        input.willing_to_drive = false;

        assert_eq!(evaluate(&input), evaluate(&input));
    }
}
