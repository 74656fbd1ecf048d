use crate::models::{AchievementDef, Condition};

// Counters the unlock predicates are evaluated against. Lecture and course
// counts are totals across all of a learner's enrollments.
#[derive(Debug, Clone, Copy, Default)]
pub struct LearnerCounters {
    pub lectures_completed: u32,
    pub courses_completed: u32,
    pub streak: u32,
}

fn condition_met(condition: Condition, counters: &LearnerCounters) -> bool {
    match condition {
        Condition::LecturesCompleted(n) => counters.lectures_completed >= n,
        Condition::CoursesCompleted(n) => counters.courses_completed >= n,
        Condition::StreakDays(n) => counters.streak >= n,
    }
}

// First crossing only: an id already in `unlocked` is skipped, so repeated
// evaluations never re-emit. Results come back in catalog order so UI
// presentation is reproducible.
pub fn evaluate(
    counters: &LearnerCounters,
    unlocked: &[String],
    catalog: &[AchievementDef],
) -> Vec<AchievementDef> {
    catalog
        .iter()
        .filter(|def| !unlocked.iter().any(|id| id == &def.id))
        .filter(|def| condition_met(def.condition, counters))
        .cloned()
        .collect()
}
