use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Enrollment;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompletionOutcome {
    pub already_completed: bool,
    pub course_newly_completed: bool,
}

// Idempotent by design: retries from an unreliable client are safe because a
// repeated lecture id is a no-op. Course completion is recomputed from the
// full set each time rather than trusted incrementally, so drift from course
// content changes cannot stick.
//
// The caller (the db layer, which knows the course roster) has already
// validated that lecture_id belongs to the course.
pub fn complete_lecture(
    enrollment: &mut Enrollment,
    lecture_id: i64,
    total_lectures: usize,
    now: DateTime<Utc>,
) -> CompletionOutcome {
    if enrollment.completed_lectures.contains(&lecture_id) {
        return CompletionOutcome {
            already_completed: true,
            course_newly_completed: false,
        };
    }

    enrollment.completed_lectures.push(lecture_id);

    let all_done = total_lectures > 0 && enrollment.completed_lectures.len() == total_lectures;
    let newly_completed = all_done && !enrollment.completed;
    if newly_completed {
        enrollment.completed = true;
        enrollment.completed_at = Some(now.to_rfc3339());
    }

    CompletionOutcome {
        already_completed: false,
        course_newly_completed: newly_completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_enrollment(completed: Vec<i64>) -> Enrollment {
        Enrollment {
            id: 1,
            learner_id: 1,
            course_id: 1,
            completed_lectures: completed,
            completed: false,
            completed_at: None,
            enrolled_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn first_completion_inserts() {
        let mut e = make_enrollment(vec![]);
        let out = complete_lecture(&mut e, 10, 5, Utc::now());
        assert!(!out.already_completed);
        assert!(!out.course_newly_completed);
        assert_eq!(e.completed_lectures, vec![10]);
    }

    #[test]
    fn repeat_completion_is_a_no_op() {
        let mut e = make_enrollment(vec![10]);
        let before = e.clone();
        let out = complete_lecture(&mut e, 10, 5, Utc::now());
        assert!(out.already_completed);
        assert!(!out.course_newly_completed);
        assert_eq!(e.completed_lectures, before.completed_lectures);
        assert_eq!(e.completed, before.completed);
    }

    #[test]
    fn twice_equals_once() {
        let mut once = make_enrollment(vec![]);
        complete_lecture(&mut once, 10, 5, Utc::now());

        let mut twice = make_enrollment(vec![]);
        complete_lecture(&mut twice, 10, 5, Utc::now());
        complete_lecture(&mut twice, 10, 5, Utc::now());

        assert_eq!(once.completed_lectures, twice.completed_lectures);
        assert_eq!(once.completed, twice.completed);
    }

    #[test]
    fn last_lecture_completes_the_course() {
        let mut e = make_enrollment(vec![1, 2, 3, 4]);
        let out = complete_lecture(&mut e, 5, 5, Utc::now());
        assert!(!out.already_completed);
        assert!(out.course_newly_completed);
        assert!(e.completed);
        assert!(e.completed_at.is_some());
    }

    #[test]
    fn completion_fires_only_once() {
        let mut e = make_enrollment(vec![1, 2, 3, 4]);
        let out = complete_lecture(&mut e, 5, 5, Utc::now());
        assert!(out.course_newly_completed);
        let stamp = e.completed_at.clone();

        // Completing the same last lecture again must not re-fire or move
        // the completion date.
        let out = complete_lecture(&mut e, 5, 5, Utc::now());
        assert!(out.already_completed);
        assert!(!out.course_newly_completed);
        assert_eq!(e.completed_at, stamp);
    }

    #[test]
    fn partial_progress_does_not_complete() {
        let mut e = make_enrollment(vec![1]);
        let out = complete_lecture(&mut e, 2, 5, Utc::now());
        assert!(!out.course_newly_completed);
        assert!(!e.completed);
        assert!(e.completed_at.is_none());
    }

    #[test]
    fn empty_course_never_completes() {
        let mut e = make_enrollment(vec![]);
        let out = complete_lecture(&mut e, 1, 0, Utc::now());
        assert!(!out.course_newly_completed);
        assert!(!e.completed);
    }

    #[test]
    fn flag_stays_true_when_roster_grows() {
        // Course gained a lecture after completion: the flag does not flip
        // back, and the new lecture does not re-fire completion.
        let mut e = make_enrollment(vec![1, 2, 3, 4]);
        complete_lecture(&mut e, 5, 5, Utc::now());
        assert!(e.completed);

        let out = complete_lecture(&mut e, 6, 6, Utc::now());
        assert!(!out.course_newly_completed);
        assert!(e.completed);
    }
}
