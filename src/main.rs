mod db;
mod engine;
mod error;
mod models;
mod tui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use db::Database;
use engine::GamificationResult;
use models::{Enrollment, Event, JsonOutput};

const DEFAULT_DB_NAME: &str = "scholar.db";

#[derive(Parser)]
#[command(name = "scholar")]
#[command(about = "Progress, streak, and XP accounting for self-paced learning")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage learners
    #[command(subcommand)]
    Learner(LearnerCommands),

    /// Manage courses
    #[command(subcommand)]
    Course(CourseCommands),

    /// Enroll a learner in a course
    Enroll {
        /// Learner username
        learner: String,

        /// Course ID
        course: i64,
    },

    /// Record a completed lecture
    Complete {
        /// Learner username
        learner: String,

        /// Course ID
        course: i64,

        /// Lecture ID
        lecture: i64,
    },

    /// Record a daily check-in (keeps the streak alive without a lecture)
    Checkin {
        /// Learner username
        learner: String,
    },

    /// Show a learner's statistics
    Stats {
        /// Learner username
        learner: String,
    },

    /// Show the XP leaderboard
    Leaderboard {
        /// Highlight this username
        #[arg(long, short)]
        user: Option<String>,

        /// Number of entries to show
        #[arg(long, short, default_value_t = 10)]
        limit: usize,
    },

    /// Show a learner's achievements
    Achievements {
        /// Learner username
        learner: String,
    },

    /// Show a learner's recent activity
    History {
        /// Learner username
        learner: String,

        /// Number of entries to show
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },

    /// Launch interactive terminal UI
    Tui {
        /// Learner username
        learner: String,
    },
}

#[derive(Subcommand)]
enum LearnerCommands {
    /// Register a new learner
    Add {
        /// Username
        username: String,
    },

    /// List all learners
    List,
}

#[derive(Subcommand)]
enum CourseCommands {
    /// Add a new course
    Add {
        /// Course title
        title: String,

        /// Course description
        #[arg(long, short)]
        description: Option<String>,

        /// Comma-separated lecture titles
        #[arg(long, short)]
        lectures: Option<String>,
    },

    /// List all courses
    List,

    /// Show course details
    Show {
        /// Course ID
        id: i64,
    },
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("SCHOLAR_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scholar");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Learner(learner_cmd) => match learner_cmd {
            LearnerCommands::Add { username } => {
                let id = db.add_learner(&username)?;
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "username": username
                        })))?
                    );
                } else {
                    println!("Registered learner '{}' with ID: {}", username, id);
                }
            }

            LearnerCommands::List => {
                let learners = db.list_learners()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&learners))?);
                } else if learners.is_empty() {
                    println!("No learners registered.");
                } else {
                    println!("{:<5} {:<25} REGISTERED", "ID", "USERNAME");
                    println!("{}", "-".repeat(60));
                    for learner in learners {
                        println!(
                            "{:<5} {:<25} {}",
                            learner.id, learner.username, learner.created_at
                        );
                    }
                }
            }
        },

        Commands::Course(course_cmd) => match course_cmd {
            CourseCommands::Add {
                title,
                description,
                lectures,
            } => {
                let lecture_list: Vec<String> = lectures
                    .map(|l| l.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default();

                let id = db.add_course(&title, description.as_deref(), &lecture_list)?;

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "title": title,
                            "lectures": lecture_list.len()
                        })))?
                    );
                } else {
                    println!(
                        "Added course '{}' with ID: {} ({} lectures)",
                        title,
                        id,
                        lecture_list.len()
                    );
                }
            }

            CourseCommands::List => {
                let courses = db.list_courses()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&courses))?);
                } else if courses.is_empty() {
                    println!("No courses found.");
                } else {
                    println!("{:<5} {:<40} DESCRIPTION", "ID", "TITLE");
                    println!("{}", "-".repeat(70));
                    for course in courses {
                        println!(
                            "{:<5} {:<40} {}",
                            course.id,
                            truncate(&course.title, 38),
                            course.description.as_deref().unwrap_or("-")
                        );
                    }
                }
            }

            CourseCommands::Show { id } => {
                if let Some(course) = db.get_course(id)? {
                    let lectures = db.get_lectures(id)?;

                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "course": course,
                                "lectures": lectures
                            })))?
                        );
                    } else {
                        println!("Course: {}", course.title);
                        println!("ID: {}", course.id);
                        if let Some(desc) = &course.description {
                            println!("Description: {}", desc);
                        }
                        println!("Created: {}", course.created_at);
                        println!();
                        println!("--- Lectures ({}) ---", lectures.len());
                        for lecture in lectures {
                            println!("{:>3}. {} (ID: {})", lecture.position, lecture.title, lecture.id);
                        }
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Course not found"))?
                    );
                } else {
                    println!("Course not found.");
                }
            }
        },

        Commands::Enroll { learner, course } => {
            let l = db.require_learner(&learner)?;
            db.enroll(l.id, course)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Enrolled '{}' in course {}.", learner, course);
            }
        }

        Commands::Complete {
            learner,
            course,
            lecture,
        } => {
            let l = db.require_learner(&learner)?;
            let result = db.handle_event(&Event::LectureCompleted {
                learner_id: l.id,
                course_id: course,
                lecture_id: lecture,
            })?;
            let enrollment =
                db.get_enrollment(l.id, course)?
                    .ok_or_else(|| error::Error::NotEnrolled {
                        learner_id: l.id,
                        course_id: course,
                    })?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(complete_payload(&enrollment, &result)))?
                );
            } else {
                print_result(&result);
                println!(
                    "Course progress: {}/{} lectures",
                    enrollment.completed_lectures.len(),
                    db.get_lectures(course)?.len()
                );
            }
        }

        Commands::Checkin { learner } => {
            let l = db.require_learner(&learner)?;
            let result = db.handle_event(&Event::DailyCheckIn { learner_id: l.id })?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&result))?);
            } else if result.streak.is_none() {
                println!("Already checked in today.");
            } else {
                print_result(&result);
            }
        }

        Commands::Stats { learner } => {
            let stats = db.stats(&learner)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
            } else {
                println!("=== {} ===", stats.username);
                println!("Level {} ({} XP, {} to next)", stats.level, stats.xp, stats.xp_to_next_level);
                println!("Streak: {} days (best: {})", stats.streak, stats.best_streak);
                println!("Lectures completed: {}", stats.lectures_completed);
                println!("Courses completed: {}", stats.courses_completed);
                println!("Achievements: {}", stats.achievements_unlocked);
            }
        }

        Commands::Leaderboard { user, limit } => {
            let board = db.leaderboard(user.as_deref(), limit)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&board))?);
            } else if board.is_empty() {
                println!("No learners registered.");
            } else {
                println!("{:<5} {:<25} {:<8} LEVEL", "RANK", "USERNAME", "XP");
                println!("{}", "-".repeat(50));
                for entry in board {
                    let marker = if entry.is_current_user { " *" } else { "" };
                    println!(
                        "{:<5} {:<25} {:<8} {}{}",
                        entry.rank, entry.username, entry.xp, entry.level, marker
                    );
                }
            }
        }

        Commands::Achievements { learner } => {
            let l = db.require_learner(&learner)?;
            let achievements = db.achievement_status(l.id)?;

            if cli.json {
                let rows: Vec<serde_json::Value> = achievements
                    .iter()
                    .map(|(def, unlocked)| {
                        serde_json::json!({
                            "id": def.id,
                            "title": def.title,
                            "rarity": def.rarity.as_str(),
                            "xp_reward": def.xp_reward,
                            "unlocked": unlocked
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(&rows))?);
            } else {
                println!("{:<4} {:<25} {:<12} XP", "", "TITLE", "RARITY");
                println!("{}", "-".repeat(50));
                for (def, unlocked) in achievements {
                    let mark = if unlocked { "[x]" } else { "[ ]" };
                    println!(
                        "{:<4} {:<25} {:<12} {}",
                        mark,
                        def.title,
                        def.rarity.label(),
                        def.xp_reward
                    );
                }
            }
        }

        Commands::History { learner, limit } => {
            let l = db.require_learner(&learner)?;
            let entries = db.recent_activity(l.id, limit)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&entries))?);
            } else if entries.is_empty() {
                println!("No activity yet.");
            } else {
                println!("{:<12} {:<6} {:<30} WHEN", "KIND", "XP", "DETAIL");
                println!("{}", "-".repeat(75));
                for entry in entries {
                    println!(
                        "{:<12} {:<6} {:<30} {}",
                        entry.kind.label(),
                        entry.xp,
                        truncate(entry.detail.as_deref().unwrap_or("-"), 28),
                        entry.created_at
                    );
                }
            }
        }

        Commands::Tui { learner } => {
            let l = db.require_learner(&learner)?;
            tui::run(db, l)?;
        }
    }

    Ok(())
}

// Response payload for the complete operation: updated progress state
// alongside what the event changed.
fn complete_payload(enrollment: &Enrollment, result: &GamificationResult) -> serde_json::Value {
    serde_json::json!({
        "completed_lectures": enrollment.completed_lectures,
        "completed": enrollment.completed,
        "result": result,
    })
}

// Cumulative XP/level after one event. The last award carries the running
// totals, but a level-up anywhere in the chain counts.
fn xp_summary(result: &GamificationResult) -> Option<(u32, u32, bool)> {
    let awards: Vec<_> = [result.lecture_xp, result.course_xp, result.streak_xp]
        .into_iter()
        .flatten()
        .chain(result.achievements.iter().map(|a| a.xp))
        .collect();
    let last = awards.last()?;
    Some((
        last.new_xp,
        last.new_level,
        awards.iter().any(|a| a.leveled_up),
    ))
}

// Human-readable rendering of one event's outcome
fn print_result(result: &GamificationResult) {
    if let Some(progress) = result.progress {
        if progress.already_completed {
            println!("Already completed; nothing changed.");
            return;
        }
    }

    if let Some(award) = result.lecture_xp {
        println!("Lecture complete: +{} XP", award.amount);
    }
    if let Some(award) = result.course_xp {
        println!("Course complete! +{} XP", award.amount);
    }
    if let Some(streak) = result.streak {
        if streak.reset {
            println!("Streak reset; back to day 1.");
        } else if streak.continued {
            let bonus = result
                .streak_xp
                .map(|a| format!(" (+{} XP)", a.amount))
                .unwrap_or_default();
            println!("Streak: {} days{}", streak.streak, bonus);
        } else {
            println!("Streak started: day 1.");
        }
    }
    for unlock in &result.achievements {
        println!(
            "Achievement unlocked: {} [{}] +{} XP",
            unlock.title,
            unlock.rarity.label(),
            unlock.xp.amount
        );
    }

    if let Some((new_xp, new_level, leveled_up)) = xp_summary(result) {
        if leveled_up {
            println!("Level up! Now level {}.", new_level);
        }
        println!("Total XP: {}", new_xp);
    }
}

// Char-based so multibyte titles never split mid-character
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
