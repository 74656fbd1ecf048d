use crate::models::{AchievementDef, Condition, Rarity};

// Tuning values are configuration, not contract: tests elsewhere exercise the
// engine against explicit amounts, not these defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub lecture_xp: u32,
    pub course_xp: u32,
    pub streak_xp: u32,
    pub achievements: Vec<AchievementDef>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lecture_xp: 50,
            course_xp: 250,
            streak_xp: 25,
            achievements: default_catalog(),
        }
    }
}

fn achievement(
    id: &str,
    title: &str,
    xp_reward: u32,
    rarity: Rarity,
    condition: Condition,
) -> AchievementDef {
    AchievementDef {
        id: id.to_string(),
        title: title.to_string(),
        xp_reward,
        rarity,
        condition,
    }
}

// Catalog order is presentation order for simultaneous unlocks, so keep the
// cheap ones first.
pub fn default_catalog() -> Vec<AchievementDef> {
    vec![
        achievement(
            "first-steps",
            "First Steps",
            25,
            Rarity::Common,
            Condition::LecturesCompleted(1),
        ),
        achievement(
            "getting-serious",
            "Getting Serious",
            50,
            Rarity::Common,
            Condition::LecturesCompleted(10),
        ),
        achievement(
            "lecture-marathon",
            "Lecture Marathon",
            150,
            Rarity::Rare,
            Condition::LecturesCompleted(50),
        ),
        achievement(
            "century-club",
            "Century Club",
            400,
            Rarity::Epic,
            Condition::LecturesCompleted(100),
        ),
        achievement(
            "graduate",
            "Graduate",
            100,
            Rarity::Rare,
            Condition::CoursesCompleted(1),
        ),
        achievement(
            "scholar",
            "Scholar",
            300,
            Rarity::Epic,
            Condition::CoursesCompleted(5),
        ),
        achievement(
            "polymath",
            "Polymath",
            750,
            Rarity::Legendary,
            Condition::CoursesCompleted(10),
        ),
        achievement(
            "warming-up",
            "Warming Up",
            25,
            Rarity::Common,
            Condition::StreakDays(3),
        ),
        achievement(
            "week-one",
            "Week One",
            100,
            Rarity::Rare,
            Condition::StreakDays(7),
        ),
        achievement(
            "unstoppable",
            "Unstoppable",
            500,
            Rarity::Legendary,
            Condition::StreakDays(30),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = default_catalog();
        let mut ids: Vec<&str> = catalog.iter().map(|d| d.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn catalog_is_non_empty_and_covers_all_condition_kinds() {
        let catalog = default_catalog();
        assert!(!catalog.is_empty());
        assert!(catalog
            .iter()
            .any(|d| matches!(d.condition, Condition::LecturesCompleted(_))));
        assert!(catalog
            .iter()
            .any(|d| matches!(d.condition, Condition::CoursesCompleted(_))));
        assert!(catalog
            .iter()
            .any(|d| matches!(d.condition, Condition::StreakDays(_))));
    }

    #[test]
    fn default_config_amounts_are_positive() {
        let config = EngineConfig::default();
        assert!(config.lecture_xp > 0);
        assert!(config.course_xp > config.lecture_xp);
        assert!(config.streak_xp > 0);
    }
}
