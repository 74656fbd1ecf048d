pub mod achievements;
pub mod catalog;
pub mod progress;
pub mod streak;
pub mod xp;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Enrollment, Event, GameState, Rarity};

use achievements::LearnerCounters;
use catalog::EngineConfig;
use progress::CompletionOutcome;
use streak::StreakOutcome;
use xp::XpAward;

#[derive(Debug, Clone, Serialize)]
pub struct UnlockedAchievement {
    pub id: String,
    pub title: String,
    pub rarity: Rarity,
    pub xp: XpAward,
}

// Everything one event changed, bundled so the caller can drive UI
// notifications from a single payload. Fields stay None/empty when the
// corresponding sub-step did not trigger.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GamificationResult {
    pub progress: Option<CompletionOutcome>,
    pub lecture_xp: Option<XpAward>,
    pub course_xp: Option<XpAward>,
    pub streak: Option<StreakOutcome>,
    pub streak_xp: Option<XpAward>,
    pub achievements: Vec<UnlockedAchievement>,
}

// Snapshot of one learner's rows, loaded and persisted by the db layer. The
// aggregator mutates it in memory; the surrounding transaction makes the
// whole event atomic.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub enrollment: Option<Enrollment>,
    pub total_lectures: usize,
    pub state: GameState,
    pub counters: LearnerCounters,
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

fn apply_award(state: &mut GameState, amount: u32) -> XpAward {
    let award = xp::award(state.xp, amount);
    state.xp = award.new_xp;
    state.level = award.new_level;
    award
}

// At most one streak evaluation per calendar day, no matter how many events
// arrive. A last_active at or past today means the check-in already
// happened (or the clock is skewed) and the streak is left alone.
fn run_streak(state: &mut GameState, today: NaiveDate) -> Option<StreakOutcome> {
    if state.last_active.is_some_and(|last| last >= today) {
        return None;
    }
    let outcome = streak::evaluate(state.last_active, today, state.streak, state.best_streak);
    state.streak = outcome.streak;
    state.best_streak = outcome.best;
    state.last_active = Some(today);
    Some(outcome)
}

fn run_achievements(ctx: &mut EventContext, config: &EngineConfig) -> Vec<UnlockedAchievement> {
    ctx.counters.streak = ctx.state.streak;
    let newly = achievements::evaluate(&ctx.counters, &ctx.state.unlocked, &config.achievements);

    newly
        .into_iter()
        .map(|def| {
            ctx.state.unlocked.push(def.id.clone());
            // Achievement XP goes through the same award path so level-up
            // consequences land in this evaluation pass.
            let award = apply_award(&mut ctx.state, def.xp_reward);
            UnlockedAchievement {
                id: def.id,
                title: def.title,
                rarity: def.rarity,
                xp: award,
            }
        })
        .collect()
}

pub fn handle_event(
    event: &Event,
    ctx: &mut EventContext,
    config: &EngineConfig,
) -> Result<GamificationResult> {
    let mut result = GamificationResult::default();

    match *event {
        Event::LectureCompleted {
            learner_id,
            course_id,
            lecture_id,
        } => {
            let enrollment = ctx.enrollment.as_mut().ok_or(Error::NotEnrolled {
                learner_id,
                course_id,
            })?;

            let outcome =
                progress::complete_lecture(enrollment, lecture_id, ctx.total_lectures, ctx.now);
            result.progress = Some(outcome);

            if !outcome.already_completed {
                ctx.counters.lectures_completed += 1;
                result.lecture_xp = Some(apply_award(&mut ctx.state, config.lecture_xp));
            }
            if outcome.course_newly_completed {
                ctx.counters.courses_completed += 1;
                result.course_xp = Some(apply_award(&mut ctx.state, config.course_xp));
            }
        }

        Event::CourseCompleted {
            learner_id,
            course_id,
        } => {
            let enrollment = ctx.enrollment.as_mut().ok_or(Error::NotEnrolled {
                learner_id,
                course_id,
            })?;

            let fully_done = ctx.total_lectures > 0
                && enrollment.completed_lectures.len() == ctx.total_lectures;
            if !fully_done {
                return Err(Error::InvalidEventSequence(format!(
                    "course {} is not fully completed by learner {}",
                    course_id, learner_id
                )));
            }

            // Completion normally happens through the progress tracker; this
            // event only closes the gap when the flag was never set, and
            // never re-awards.
            if !enrollment.completed {
                enrollment.completed = true;
                enrollment.completed_at = Some(ctx.now.to_rfc3339());
                ctx.counters.courses_completed += 1;
                result.course_xp = Some(apply_award(&mut ctx.state, config.course_xp));
            }
        }

        Event::DailyCheckIn { .. } => {}
    }

    result.streak = run_streak(&mut ctx.state, ctx.today);
    if result.streak.is_some_and(|s| s.continued) {
        result.streak_xp = Some(apply_award(&mut ctx.state, config.streak_xp));
    }

    result.achievements = run_achievements(ctx, config);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AchievementDef, Condition};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

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

    fn make_ctx(enrollment: Option<Enrollment>, total_lectures: usize) -> EventContext {
        EventContext {
            enrollment,
            total_lectures,
            state: GameState {
                learner_id: 1,
                xp: 0,
                level: 1,
                streak: 0,
                best_streak: 0,
                last_active: None,
                unlocked: vec![],
            },
            counters: LearnerCounters::default(),
            now: Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap(),
            today: date(2026, 8, 25),
        }
    }

    fn lecture_event(lecture_id: i64) -> Event {
        Event::LectureCompleted {
            learner_id: 1,
            course_id: 1,
            lecture_id,
        }
    }

    #[test]
    fn lecture_event_awards_xp_and_streak_and_achievement() {
        let mut ctx = make_ctx(Some(make_enrollment(vec![])), 5);
        let config = EngineConfig::default();

        let result = handle_event(&lecture_event(10), &mut ctx, &config).unwrap();

        let lecture_xp = result.lecture_xp.unwrap();
        assert_eq!(lecture_xp.amount, config.lecture_xp);
        assert!(result.course_xp.is_none());

        // First ever activity starts the streak without a continuation bonus
        let streak = result.streak.unwrap();
        assert_eq!(streak.streak, 1);
        assert!(!streak.continued);
        assert!(result.streak_xp.is_none());

        // "First Steps" fires on the first lecture
        assert!(result.achievements.iter().any(|a| a.id == "first-steps"));
        assert!(ctx.state.unlocked.contains(&"first-steps".to_string()));
    }

    #[test]
    fn repeat_lecture_awards_nothing() {
        let mut ctx = make_ctx(Some(make_enrollment(vec![])), 5);
        let config = EngineConfig::default();

        handle_event(&lecture_event(10), &mut ctx, &config).unwrap();
        let xp_after_first = ctx.state.xp;

        let result = handle_event(&lecture_event(10), &mut ctx, &config).unwrap();
        assert!(result.progress.unwrap().already_completed);
        assert!(result.lecture_xp.is_none());
        assert!(result.course_xp.is_none());
        assert!(result.achievements.is_empty());
        assert_eq!(ctx.state.xp, xp_after_first);
    }

    #[test]
    fn last_lecture_triggers_course_completion_chain() {
        let mut ctx = make_ctx(Some(make_enrollment(vec![1, 2, 3, 4])), 5);
        ctx.counters.lectures_completed = 4;
        let config = EngineConfig::default();

        let result = handle_event(&lecture_event(5), &mut ctx, &config).unwrap();

        assert!(result.progress.unwrap().course_newly_completed);
        assert!(result.lecture_xp.is_some());
        assert_eq!(result.course_xp.unwrap().amount, config.course_xp);
        assert!(ctx.enrollment.as_ref().unwrap().completed);
        // "Graduate" unlocks alongside lecture achievements
        assert!(result.achievements.iter().any(|a| a.id == "graduate"));
    }

    #[test]
    fn streak_evaluated_once_per_day() {
        let mut ctx = make_ctx(Some(make_enrollment(vec![])), 5);
        let config = EngineConfig::default();

        let first = handle_event(&lecture_event(1), &mut ctx, &config).unwrap();
        assert!(first.streak.is_some());

        let second = handle_event(&lecture_event(2), &mut ctx, &config).unwrap();
        assert!(second.streak.is_none());
        assert!(second.streak_xp.is_none());
        assert_eq!(ctx.state.streak, 1);
    }

    #[test]
    fn continuation_grants_streak_xp_and_updates_best() {
        let mut ctx = make_ctx(Some(make_enrollment(vec![])), 5);
        ctx.state.streak = 3;
        ctx.state.best_streak = 3;
        ctx.state.last_active = Some(date(2026, 8, 24));
        let config = EngineConfig::default();

        let result = handle_event(&lecture_event(1), &mut ctx, &config).unwrap();

        let streak = result.streak.unwrap();
        assert!(streak.continued);
        assert_eq!(streak.streak, 4);
        assert_eq!(streak.best, 4);
        assert_eq!(result.streak_xp.unwrap().amount, config.streak_xp);
    }

    #[test]
    fn check_in_runs_streak_and_achievements_only() {
        let mut ctx = make_ctx(None, 0);
        ctx.state.streak = 2;
        ctx.state.best_streak = 2;
        ctx.state.last_active = Some(date(2026, 8, 24));
        let config = EngineConfig::default();

        let result =
            handle_event(&Event::DailyCheckIn { learner_id: 1 }, &mut ctx, &config).unwrap();

        assert!(result.progress.is_none());
        assert!(result.lecture_xp.is_none());
        assert!(result.streak.unwrap().continued);
        // Streak hit 3: "Warming Up" unlocks
        assert!(result.achievements.iter().any(|a| a.id == "warming-up"));
    }

    #[test]
    fn course_completed_event_rejected_when_incomplete() {
        let mut ctx = make_ctx(Some(make_enrollment(vec![1, 2])), 5);
        let config = EngineConfig::default();

        let err = handle_event(
            &Event::CourseCompleted {
                learner_id: 1,
                course_id: 1,
            },
            &mut ctx,
            &config,
        )
        .unwrap_err();

        assert!(matches!(err, Error::InvalidEventSequence(_)));
        assert!(!ctx.enrollment.as_ref().unwrap().completed);
        assert_eq!(ctx.state.xp, 0);
    }

    #[test]
    fn course_completed_event_closes_unset_flag_once() {
        let mut ctx = make_ctx(Some(make_enrollment(vec![1, 2, 3, 4, 5])), 5);
        let config = EngineConfig::default();
        let event = Event::CourseCompleted {
            learner_id: 1,
            course_id: 1,
        };

        let first = handle_event(&event, &mut ctx, &config).unwrap();
        assert!(first.course_xp.is_some());
        assert!(ctx.enrollment.as_ref().unwrap().completed);

        let second = handle_event(&event, &mut ctx, &config).unwrap();
        assert!(second.course_xp.is_none());
    }

    #[test]
    fn lecture_event_without_enrollment_fails() {
        let mut ctx = make_ctx(None, 5);
        let config = EngineConfig::default();
        let err = handle_event(&lecture_event(1), &mut ctx, &config).unwrap_err();
        assert!(matches!(err, Error::NotEnrolled { .. }));
    }

    #[test]
    fn achievement_xp_can_level_up_in_same_pass() {
        let mut ctx = make_ctx(Some(make_enrollment(vec![])), 5);
        let config = EngineConfig {
            lecture_xp: 10,
            course_xp: 0,
            streak_xp: 0,
            achievements: vec![AchievementDef {
                id: "big-one".to_string(),
                title: "Big One".to_string(),
                xp_reward: 200,
                rarity: Rarity::Epic,
                condition: Condition::LecturesCompleted(1),
            }],
        };

        let result = handle_event(&lecture_event(1), &mut ctx, &config).unwrap();

        let unlock = &result.achievements[0];
        assert!(unlock.xp.leveled_up);
        assert_eq!(unlock.xp.new_level, 2);
        assert_eq!(ctx.state.level, 2);
        assert_eq!(ctx.state.xp, 210);
    }
}
