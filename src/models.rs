use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learner {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecture {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub position: i64,
}

// One learner enrolled in one course. The completed set never shrinks;
// un-completion is not a thing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub learner_id: i64,
    pub course_id: i64,
    pub completed_lectures: Vec<i64>,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub enrolled_at: String,
}

impl Enrollment {
    pub fn percent_complete(&self, total_lectures: usize) -> f64 {
        if total_lectures == 0 {
            0.0
        } else {
            (self.completed_lectures.len() as f64 / total_lectures as f64) * 100.0
        }
    }
}

// Per-learner gamification state. Level is always recomputed from xp,
// never trusted incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub learner_id: i64,
    pub xp: u32,
    pub level: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub last_active: Option<NaiveDate>,
    pub unlocked: Vec<String>,
}

// Rarity tiers for achievements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "common" => Some(Rarity::Common),
            "rare" => Some(Rarity::Rare),
            "epic" => Some(Rarity::Epic),
            "legendary" => Some(Rarity::Legendary),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }
}

// Unlock predicate over a learner's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    LecturesCompleted(u32),
    CoursesCompleted(u32),
    StreakDays(u32),
}

// Static catalog entry. Read-only at runtime; the engine receives the
// catalog as an explicit input, never as a global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub title: String,
    pub xp_reward: u32,
    pub rarity: Rarity,
    pub condition: Condition,
}

// Ephemeral input to the aggregator, one case per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    LectureCompleted {
        learner_id: i64,
        course_id: i64,
        lecture_id: i64,
    },
    CourseCompleted {
        learner_id: i64,
        course_id: i64,
    },
    DailyCheckIn {
        learner_id: i64,
    },
}

impl Event {
    pub fn learner_id(&self) -> i64 {
        match self {
            Event::LectureCompleted { learner_id, .. } => *learner_id,
            Event::CourseCompleted { learner_id, .. } => *learner_id,
            Event::DailyCheckIn { learner_id } => *learner_id,
        }
    }
}

// What kind of row an activity_log entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    LectureCompleted,
    CourseCompleted,
    StreakContinued,
    AchievementUnlocked,
    CheckIn,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::LectureCompleted => "lecture_completed",
            ActivityKind::CourseCompleted => "course_completed",
            ActivityKind::StreakContinued => "streak_continued",
            ActivityKind::AchievementUnlocked => "achievement_unlocked",
            ActivityKind::CheckIn => "check_in",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lecture_completed" => Some(ActivityKind::LectureCompleted),
            "course_completed" => Some(ActivityKind::CourseCompleted),
            "streak_continued" => Some(ActivityKind::StreakContinued),
            "achievement_unlocked" => Some(ActivityKind::AchievementUnlocked),
            "check_in" => Some(ActivityKind::CheckIn),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::LectureCompleted => "Lecture",
            ActivityKind::CourseCompleted => "Course",
            ActivityKind::StreakContinued => "Streak",
            ActivityKind::AchievementUnlocked => "Achievement",
            ActivityKind::CheckIn => "Check-in",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub learner_id: i64,
    pub kind: ActivityKind,
    pub xp: u32,
    pub detail: Option<String>,
    pub created_at: String,
}

// Read-only stats view consumed by the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerStats {
    pub username: String,
    pub xp: u32,
    pub level: u32,
    pub xp_to_next_level: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub lectures_completed: u32,
    pub courses_completed: u32,
    pub achievements_unlocked: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub xp: u32,
    pub level: u32,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseWithProgress {
    pub course: Course,
    pub total_lectures: usize,
    pub enrollment: Option<Enrollment>,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod enrollment_tests {
        use super::*;

        fn make_enrollment(completed_lectures: Vec<i64>) -> Enrollment {
            Enrollment {
                id: 1,
                learner_id: 1,
                course_id: 1,
                completed_lectures,
                completed: false,
                completed_at: None,
                enrolled_at: "2026-01-01T00:00:00Z".to_string(),
            }
        }

        #[test]
        fn percent_complete_empty_course() {
            let e = make_enrollment(vec![]);
            assert_eq!(e.percent_complete(0), 0.0);
        }

        #[test]
        fn percent_complete_none_done() {
            let e = make_enrollment(vec![]);
            assert_eq!(e.percent_complete(4), 0.0);
        }

        #[test]
        fn percent_complete_half_done() {
            let e = make_enrollment(vec![1, 2]);
            assert_eq!(e.percent_complete(4), 50.0);
        }

        #[test]
        fn percent_complete_all_done() {
            let e = make_enrollment(vec![1, 2, 3, 4]);
            assert_eq!(e.percent_complete(4), 100.0);
        }
    }

    mod rarity_tests {
        use super::*;

        #[test]
        fn as_str_returns_correct_values() {
            assert_eq!(Rarity::Common.as_str(), "common");
            assert_eq!(Rarity::Rare.as_str(), "rare");
            assert_eq!(Rarity::Epic.as_str(), "epic");
            assert_eq!(Rarity::Legendary.as_str(), "legendary");
        }

        #[test]
        fn from_str_valid_inputs() {
            assert_eq!(Rarity::from_str("common"), Some(Rarity::Common));
            assert_eq!(Rarity::from_str("RARE"), Some(Rarity::Rare));
            assert_eq!(Rarity::from_str("Epic"), Some(Rarity::Epic));
            assert_eq!(Rarity::from_str("legendary"), Some(Rarity::Legendary));
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(Rarity::from_str("mythic"), None);
            assert_eq!(Rarity::from_str(""), None);
        }

        #[test]
        fn label_returns_human_readable() {
            assert_eq!(Rarity::Common.label(), "Common");
            assert_eq!(Rarity::Legendary.label(), "Legendary");
        }
    }

    mod activity_kind_tests {
        use super::*;

        #[test]
        fn as_str_from_str_round_trip() {
            let kinds = [
                ActivityKind::LectureCompleted,
                ActivityKind::CourseCompleted,
                ActivityKind::StreakContinued,
                ActivityKind::AchievementUnlocked,
                ActivityKind::CheckIn,
            ];
            for kind in kinds {
                assert_eq!(ActivityKind::from_str(kind.as_str()), Some(kind));
            }
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(ActivityKind::from_str("invalid"), None);
            assert_eq!(ActivityKind::from_str(""), None);
        }
    }

    mod event_tests {
        use super::*;

        #[test]
        fn learner_id_extracted_from_all_variants() {
            let events = [
                Event::LectureCompleted {
                    learner_id: 7,
                    course_id: 1,
                    lecture_id: 2,
                },
                Event::CourseCompleted {
                    learner_id: 7,
                    course_id: 1,
                },
                Event::DailyCheckIn { learner_id: 7 },
            ];
            for event in events {
                assert_eq!(event.learner_id(), 7);
            }
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn ok_with_string() {
            let output = JsonOutput::ok("test data");
            assert!(output.success);
            assert_eq!(output.data, Some("test data"));
            assert!(output.error.is_none());
        }

        #[test]
        fn err_with_string() {
            let output = JsonOutput::<()>::err("something went wrong");
            assert!(!output.success);
            assert!(output.data.is_none());
            assert_eq!(output.error, Some("something went wrong".to_string()));
        }

        #[test]
        fn serializes_ok_correctly() {
            let output = JsonOutput::ok("test");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":true"));
            assert!(json.contains("\"data\":\"test\""));
            assert!(json.contains("\"error\":null"));
        }

        #[test]
        fn serializes_err_correctly() {
            let output = JsonOutput::<()>::err("error");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":false"));
            assert!(json.contains("\"data\":null"));
            assert!(json.contains("\"error\":\"error\""));
        }
    }
}
