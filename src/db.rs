use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::engine::achievements::LearnerCounters;
use crate::engine::catalog::EngineConfig;
use crate::engine::{self, xp, EventContext, GamificationResult};
use crate::error::{Error, Result};
use crate::models::{
    AchievementDef, ActivityEntry, ActivityKind, Course, CourseWithProgress, Enrollment, Event,
    GameState, Learner, LeaderboardEntry, LearnerStats, Lecture,
};

const DATE_FMT: &str = "%Y-%m-%d";

pub struct Database {
    conn: Connection,
    config: EngineConfig,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            config: EngineConfig::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS learners (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS game_state (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                learner_id INTEGER NOT NULL UNIQUE,
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                streak INTEGER NOT NULL DEFAULT 0,
                best_streak INTEGER NOT NULL DEFAULT 0,
                last_active TEXT,
                FOREIGN KEY (learner_id) REFERENCES learners(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS courses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS lectures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                position INTEGER NOT NULL,
                UNIQUE (course_id, position),
                FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS enrollments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                learner_id INTEGER NOT NULL,
                course_id INTEGER NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                enrolled_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (learner_id, course_id),
                FOREIGN KEY (learner_id) REFERENCES learners(id) ON DELETE CASCADE,
                FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS enrollment_lectures (
                enrollment_id INTEGER NOT NULL,
                lecture_id INTEGER NOT NULL,
                completed_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (enrollment_id, lecture_id),
                FOREIGN KEY (enrollment_id) REFERENCES enrollments(id) ON DELETE CASCADE,
                FOREIGN KEY (lecture_id) REFERENCES lectures(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS achievement_unlocks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                learner_id INTEGER NOT NULL,
                achievement_id TEXT NOT NULL,
                unlocked_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (learner_id, achievement_id),
                FOREIGN KEY (learner_id) REFERENCES learners(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                learner_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                xp INTEGER NOT NULL DEFAULT 0,
                detail TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (learner_id) REFERENCES learners(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_lectures_course ON lectures(course_id);
            CREATE INDEX IF NOT EXISTS idx_enrollments_learner ON enrollments(learner_id);
            CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_id);
            CREATE INDEX IF NOT EXISTS idx_el_enrollment ON enrollment_lectures(enrollment_id);
            CREATE INDEX IF NOT EXISTS idx_unlocks_learner ON achievement_unlocks(learner_id);
            CREATE INDEX IF NOT EXISTS idx_activity_learner ON activity_log(learner_id);
            CREATE INDEX IF NOT EXISTS idx_game_state_xp ON game_state(xp);
            "#,
        )?;

        self.migrate()?;

        Ok(())
    }

    // Handle schema migrations for existing databases
    fn migrate(&self) -> Result<()> {
        // best_streak arrived after the first schema version
        let has_best_streak: bool = self
            .conn
            .prepare("SELECT best_streak FROM game_state LIMIT 1")
            .is_ok();

        if !has_best_streak {
            self.conn.execute_batch(
                "ALTER TABLE game_state ADD COLUMN best_streak INTEGER NOT NULL DEFAULT 0;",
            )?;
        }

        Ok(())
    }

    // Learner operations
    pub fn add_learner(&self, username: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO learners (username) VALUES (?1)",
            params![username],
        )?;
        let learner_id = self.conn.last_insert_rowid();

        // Game state starts alongside the learner
        self.conn.execute(
            "INSERT INTO game_state (learner_id) VALUES (?1)",
            params![learner_id],
        )?;

        Ok(learner_id)
    }

    pub fn get_learner(&self, username: &str) -> Result<Option<Learner>> {
        let learner = self
            .conn
            .query_row(
                "SELECT id, username, created_at FROM learners WHERE username = ?1",
                params![username],
                |row| {
                    Ok(Learner {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(learner)
    }

    pub fn require_learner(&self, username: &str) -> Result<Learner> {
        self.get_learner(username)?
            .ok_or_else(|| Error::LearnerNotFound(username.to_string()))
    }

    pub fn list_learners(&self) -> Result<Vec<Learner>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username, created_at FROM learners ORDER BY username")?;
        let rows = stmt.query_map([], |row| {
            Ok(Learner {
                id: row.get(0)?,
                username: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // Course operations
    pub fn add_course(
        &self,
        title: &str,
        description: Option<&str>,
        lectures: &[String],
    ) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO courses (title, description) VALUES (?1, ?2)",
            params![title, description],
        )?;
        let course_id = self.conn.last_insert_rowid();

        for (position, lecture_title) in lectures.iter().enumerate() {
            self.conn.execute(
                "INSERT INTO lectures (course_id, title, position) VALUES (?1, ?2, ?3)",
                params![course_id, lecture_title, position as i64 + 1],
            )?;
        }
        tx.commit()?;

        Ok(course_id)
    }

    pub fn get_course(&self, id: i64) -> Result<Option<Course>> {
        let course = self
            .conn
            .query_row(
                "SELECT id, title, description, created_at FROM courses WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Course {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(course)
    }

    pub fn require_course(&self, id: i64) -> Result<Course> {
        self.get_course(id)?.ok_or(Error::CourseNotFound(id))
    }

    pub fn list_courses(&self) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, created_at FROM courses ORDER BY title",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Course {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_lectures(&self, course_id: i64) -> Result<Vec<Lecture>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, title, position FROM lectures WHERE course_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![course_id], |row| {
            Ok(Lecture {
                id: row.get(0)?,
                course_id: row.get(1)?,
                title: row.get(2)?,
                position: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn lecture_in_course(&self, course_id: i64, lecture_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lectures WHERE id = ?1 AND course_id = ?2",
            params![lecture_id, course_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Enrollment operations
    pub fn enroll(&self, learner_id: i64, course_id: i64) -> Result<i64> {
        self.require_course(course_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO enrollments (learner_id, course_id) VALUES (?1, ?2)",
            params![learner_id, course_id],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM enrollments WHERE learner_id = ?1 AND course_id = ?2",
            params![learner_id, course_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_enrollment(&self, learner_id: i64, course_id: i64) -> Result<Option<Enrollment>> {
        let enrollment = self
            .conn
            .query_row(
                r#"
                SELECT id, learner_id, course_id, completed, completed_at, enrolled_at
                FROM enrollments
                WHERE learner_id = ?1 AND course_id = ?2
                "#,
                params![learner_id, course_id],
                |row| {
                    Ok(Enrollment {
                        id: row.get(0)?,
                        learner_id: row.get(1)?,
                        course_id: row.get(2)?,
                        completed_lectures: vec![],
                        completed: row.get::<_, i64>(3)? != 0,
                        completed_at: row.get(4)?,
                        enrolled_at: row.get(5)?,
                    })
                },
            )
            .optional()?;

        match enrollment {
            Some(mut e) => {
                e.completed_lectures = self.completed_lecture_ids(e.id)?;
                Ok(Some(e))
            }
            None => Ok(None),
        }
    }

    fn completed_lecture_ids(&self, enrollment_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT el.lecture_id
            FROM enrollment_lectures el
            JOIN lectures l ON el.lecture_id = l.id
            WHERE el.enrollment_id = ?1
            ORDER BY l.position
            "#,
        )?;
        let rows = stmt.query_map(params![enrollment_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<i64>>>()?)
    }

    // Game state operations
    pub fn get_game_state(&self, learner_id: i64) -> Result<Option<GameState>> {
        let state = self
            .conn
            .query_row(
                r#"
                SELECT learner_id, xp, level, streak, best_streak, last_active
                FROM game_state
                WHERE learner_id = ?1
                "#,
                params![learner_id],
                |row| {
                    let last_active: Option<String> = row.get(5)?;
                    Ok(GameState {
                        learner_id: row.get(0)?,
                        xp: row.get(1)?,
                        level: row.get(2)?,
                        streak: row.get(3)?,
                        best_streak: row.get(4)?,
                        last_active: last_active
                            .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()),
                        unlocked: vec![],
                    })
                },
            )
            .optional()?;

        match state {
            Some(mut s) => {
                s.unlocked = self.unlocked_ids(learner_id)?;
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    fn unlocked_ids(&self, learner_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT achievement_id FROM achievement_unlocks WHERE learner_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![learner_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    fn counters(&self, learner_id: i64) -> Result<LearnerCounters> {
        let lectures_completed: u32 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM enrollment_lectures el
            JOIN enrollments e ON el.enrollment_id = e.id
            WHERE e.learner_id = ?1
            "#,
            params![learner_id],
            |row| row.get(0),
        )?;

        let courses_completed: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM enrollments WHERE learner_id = ?1 AND completed = 1",
            params![learner_id],
            |row| row.get(0),
        )?;

        Ok(LearnerCounters {
            lectures_completed,
            courses_completed,
            streak: 0, // filled from game state during aggregation
        })
    }

    // Event aggregation. Validates references, snapshots the learner's rows,
    // runs the engine, and persists everything inside one transaction so a
    // failed sub-step leaves no partial state behind.
    pub fn handle_event(&self, event: &Event) -> Result<GamificationResult> {
        let learner_id = event.learner_id();

        let enrollment = match *event {
            Event::LectureCompleted {
                course_id,
                lecture_id,
                ..
            } => {
                self.require_course(course_id)?;
                if !self.lecture_in_course(course_id, lecture_id)? {
                    return Err(Error::InvalidLectureReference {
                        course_id,
                        lecture_id,
                    });
                }
                self.get_enrollment(learner_id, course_id)?
            }
            Event::CourseCompleted { course_id, .. } => {
                self.require_course(course_id)?;
                self.get_enrollment(learner_id, course_id)?
            }
            Event::DailyCheckIn { .. } => None,
        };

        let state = self
            .get_game_state(learner_id)?
            .ok_or_else(|| Error::LearnerNotFound(learner_id.to_string()))?;

        let total_lectures = match enrollment {
            Some(ref e) => self.get_lectures(e.course_id)?.len(),
            None => 0,
        };

        let now = Utc::now();
        let mut ctx = EventContext {
            enrollment,
            total_lectures,
            state,
            counters: self.counters(learner_id)?,
            now,
            today: now.date_naive(),
        };

        let tx = self.conn.unchecked_transaction()?;
        let result = engine::handle_event(event, &mut ctx, &self.config)?;
        self.persist(event, &ctx, &result)?;
        tx.commit()?;

        Ok(result)
    }

    fn persist(
        &self,
        event: &Event,
        ctx: &EventContext,
        result: &GamificationResult,
    ) -> Result<()> {
        let learner_id = ctx.state.learner_id;

        if let Some(ref enrollment) = ctx.enrollment {
            if let Event::LectureCompleted { lecture_id, .. } = *event {
                self.conn.execute(
                    r#"
                    INSERT OR IGNORE INTO enrollment_lectures (enrollment_id, lecture_id, completed_at)
                    VALUES (?1, ?2, ?3)
                    "#,
                    params![enrollment.id, lecture_id, ctx.now.to_rfc3339()],
                )?;
            }
            self.conn.execute(
                "UPDATE enrollments SET completed = ?1, completed_at = ?2 WHERE id = ?3",
                params![
                    enrollment.completed as i64,
                    enrollment.completed_at,
                    enrollment.id
                ],
            )?;
        }

        self.conn.execute(
            r#"
            UPDATE game_state
            SET xp = ?1, level = ?2, streak = ?3, best_streak = ?4, last_active = ?5
            WHERE learner_id = ?6
            "#,
            params![
                ctx.state.xp,
                ctx.state.level,
                ctx.state.streak,
                ctx.state.best_streak,
                ctx.state.last_active.map(|d| d.format(DATE_FMT).to_string()),
                learner_id
            ],
        )?;

        for unlock in &result.achievements {
            self.conn.execute(
                r#"
                INSERT OR IGNORE INTO achievement_unlocks (learner_id, achievement_id, unlocked_at)
                VALUES (?1, ?2, ?3)
                "#,
                params![learner_id, unlock.id, ctx.now.to_rfc3339()],
            )?;
        }

        self.log_activity(event, ctx, result)?;

        Ok(())
    }

    fn log_activity(
        &self,
        event: &Event,
        ctx: &EventContext,
        result: &GamificationResult,
    ) -> Result<()> {
        let learner_id = ctx.state.learner_id;

        let log = |kind: ActivityKind, xp: u32, detail: Option<String>| -> Result<()> {
            self.conn.execute(
                r#"
                INSERT INTO activity_log (learner_id, kind, xp, detail, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![learner_id, kind.as_str(), xp, detail, ctx.now.to_rfc3339()],
            )?;
            Ok(())
        };

        if let Some(award) = result.lecture_xp {
            if let Event::LectureCompleted {
                course_id,
                lecture_id,
                ..
            } = *event
            {
                log(
                    ActivityKind::LectureCompleted,
                    award.amount,
                    Some(format!("course {} lecture {}", course_id, lecture_id)),
                )?;
            }
        }
        if let Some(award) = result.course_xp {
            if let Some(ref e) = ctx.enrollment {
                log(
                    ActivityKind::CourseCompleted,
                    award.amount,
                    Some(format!("course {}", e.course_id)),
                )?;
            }
        }
        if let Some(award) = result.streak_xp {
            log(
                ActivityKind::StreakContinued,
                award.amount,
                Some(format!("{} days", ctx.state.streak)),
            )?;
        }
        for unlock in &result.achievements {
            log(
                ActivityKind::AchievementUnlocked,
                unlock.xp.amount,
                Some(unlock.title.clone()),
            )?;
        }
        if matches!(event, Event::DailyCheckIn { .. }) {
            log(ActivityKind::CheckIn, 0, None)?;
        }

        Ok(())
    }

    // Read-only queries
    pub fn stats(&self, username: &str) -> Result<LearnerStats> {
        let learner = self.require_learner(username)?;
        let state = self
            .get_game_state(learner.id)?
            .ok_or_else(|| Error::LearnerNotFound(username.to_string()))?;
        let counters = self.counters(learner.id)?;

        Ok(LearnerStats {
            username: learner.username,
            xp: state.xp,
            // Level stays a pure function of XP; never trust the stored copy
            // over a recomputation.
            level: xp::level_for_xp(state.xp),
            xp_to_next_level: xp::xp_to_next_level(state.xp),
            streak: state.streak,
            best_streak: state.best_streak,
            lectures_completed: counters.lectures_completed,
            courses_completed: counters.courses_completed,
            achievements_unlocked: state.unlocked.len() as u32,
        })
    }

    // XP descending; ties break by earliest registration, then id, so the
    // ordering is stable and documented.
    pub fn leaderboard(
        &self,
        current_user: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT l.username, g.xp
            FROM game_state g
            JOIN learners l ON g.learner_id = l.id
            ORDER BY g.xp DESC, l.created_at ASC, l.id ASC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let username: String = row.get(0)?;
            let xp: u32 = row.get(1)?;
            Ok((username, xp))
        })?;

        let entries = rows
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .enumerate()
            .map(|(i, (username, xp))| LeaderboardEntry {
                rank: i as u32 + 1,
                is_current_user: current_user == Some(username.as_str()),
                level: xp::level_for_xp(xp),
                username,
                xp,
            })
            .collect();

        Ok(entries)
    }

    pub fn recent_activity(&self, learner_id: i64, limit: usize) -> Result<Vec<ActivityEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, learner_id, kind, xp, detail, created_at
            FROM activity_log
            WHERE learner_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![learner_id, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, learner_id, kind_str, xp, detail, created_at) = row?;
            // Rows with kinds this build does not know are skipped, not
            // relabeled.
            let Some(kind) = ActivityKind::from_str(&kind_str) else {
                continue;
            };
            entries.push(ActivityEntry {
                id,
                learner_id,
                kind,
                xp,
                detail,
                created_at,
            });
        }
        Ok(entries)
    }

    pub fn achievement_status(&self, learner_id: i64) -> Result<Vec<(AchievementDef, bool)>> {
        let unlocked = self.unlocked_ids(learner_id)?;
        Ok(self
            .config
            .achievements
            .iter()
            .map(|def| {
                let is_unlocked = unlocked.iter().any(|id| id == &def.id);
                (def.clone(), is_unlocked)
            })
            .collect())
    }

    pub fn courses_with_progress(&self, learner_id: i64) -> Result<Vec<CourseWithProgress>> {
        let courses = self.list_courses()?;
        let mut result = Vec::with_capacity(courses.len());
        for course in courses {
            let total_lectures = self.get_lectures(course.id)?.len();
            let enrollment = self.get_enrollment(learner_id, course.id)?;
            result.push(CourseWithProgress {
                course,
                total_lectures,
                enrollment,
            });
        }
        Ok(result)
    }

    pub fn lectures_with_status(
        &self,
        learner_id: i64,
        course_id: i64,
    ) -> Result<Vec<(Lecture, bool)>> {
        let lectures = self.get_lectures(course_id)?;
        let completed = match self.get_enrollment(learner_id, course_id)? {
            Some(e) => e.completed_lectures,
            None => vec![],
        };
        Ok(lectures
            .into_iter()
            .map(|l| {
                let done = completed.contains(&l.id);
                (l, done)
            })
            .collect())
    }
}
