use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StreakOutcome {
    pub streak: u32,
    pub best: u32,
    pub continued: bool,
    pub reset: bool,
}

// Calendar-date granularity, not timestamps: two completions within one day
// must not double-count. Triggered by activity events only, never a timer.
pub fn evaluate(
    last_active: Option<NaiveDate>,
    today: NaiveDate,
    current: u32,
    best: u32,
) -> StreakOutcome {
    let days_since = match last_active {
        Some(last) => (today - last).num_days(),
        // First ever activity: the streak starts at 1 but nothing continued
        // or reset.
        None => {
            return StreakOutcome {
                streak: 1,
                best: best.max(1),
                continued: false,
                reset: false,
            }
        }
    };

    match days_since {
        // Negative means clock skew or bad data; treat like "already checked
        // in today" rather than regressing the streak.
        d if d <= 0 => StreakOutcome {
            streak: current,
            best: best.max(current),
            continued: false,
            reset: false,
        },
        1 => {
            let streak = current + 1;
            StreakOutcome {
                streak,
                best: best.max(streak),
                continued: true,
                reset: false,
            }
        }
        _ => StreakOutcome {
            streak: 1,
            best: best.max(1),
            continued: false,
            reset: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_day_is_unchanged() {
        let today = date(2026, 8, 25);
        let out = evaluate(Some(today), today, 4, 6);
        assert_eq!(out.streak, 4);
        assert_eq!(out.best, 6);
        assert!(!out.continued);
        assert!(!out.reset);
    }

    #[test]
    fn next_day_continues() {
        let out = evaluate(Some(date(2026, 8, 24)), date(2026, 8, 25), 4, 6);
        assert_eq!(out.streak, 5);
        assert_eq!(out.best, 6);
        assert!(out.continued);
        assert!(!out.reset);
    }

    #[test]
    fn continuation_updates_best_when_exceeded() {
        let out = evaluate(Some(date(2026, 8, 24)), date(2026, 8, 25), 6, 6);
        assert_eq!(out.streak, 7);
        assert_eq!(out.best, 7);
        assert!(out.continued);
    }

    #[test]
    fn gap_of_five_days_resets_to_one() {
        let out = evaluate(Some(date(2026, 8, 20)), date(2026, 8, 25), 9, 9);
        assert_eq!(out.streak, 1);
        assert_eq!(out.best, 9);
        assert!(!out.continued);
        assert!(out.reset);
    }

    #[test]
    fn gap_of_two_days_resets() {
        let out = evaluate(Some(date(2026, 8, 23)), date(2026, 8, 25), 3, 3);
        assert_eq!(out.streak, 1);
        assert!(out.reset);
    }

    #[test]
    fn clock_skew_does_not_regress() {
        // last_active in the future: no change, no reset
        let out = evaluate(Some(date(2026, 8, 26)), date(2026, 8, 25), 5, 5);
        assert_eq!(out.streak, 5);
        assert_eq!(out.best, 5);
        assert!(!out.continued);
        assert!(!out.reset);
    }

    #[test]
    fn first_activity_starts_a_streak() {
        let out = evaluate(None, date(2026, 8, 25), 0, 0);
        assert_eq!(out.streak, 1);
        assert_eq!(out.best, 1);
        assert!(!out.continued);
        assert!(!out.reset);
    }

    #[test]
    fn continuation_across_month_boundary() {
        let out = evaluate(Some(date(2026, 7, 31)), date(2026, 8, 1), 2, 2);
        assert_eq!(out.streak, 3);
        assert!(out.continued);
    }

    #[test]
    fn best_is_never_below_current() {
        // Bad stored data where best < current gets repaired on evaluation.
        let today = date(2026, 8, 25);
        let out = evaluate(Some(today), today, 8, 3);
        assert!(out.best >= out.streak);
    }
}
