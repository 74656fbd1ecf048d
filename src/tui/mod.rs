mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::db::Database;
use crate::models::{
    AchievementDef, ActivityEntry, CourseWithProgress, Learner, LeaderboardEntry, LearnerStats,
    Lecture,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Courses,
    CourseDetail,
    Leaderboard,
    Achievements,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Courses,
            View::Courses => View::Leaderboard,
            View::CourseDetail => View::Courses,
            View::Leaderboard => View::Achievements,
            View::Achievements => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Achievements,
            View::Courses => View::Dashboard,
            View::CourseDetail => View::Courses,
            View::Leaderboard => View::Courses,
            View::Achievements => View::Leaderboard,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App {
    db: Database,
    pub learner: Learner,
    pub view: View,
    pub stats: LearnerStats,
    pub courses: StatefulList<CourseWithProgress>,
    pub selected_course: Option<CourseWithProgress>,
    pub selected_course_lectures: Vec<(Lecture, bool)>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub achievements: Vec<(AchievementDef, bool)>,
    pub recent_activity: Vec<ActivityEntry>,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database, learner: Learner) -> Result<Self, Box<dyn std::error::Error>> {
        let stats = db.stats(&learner.username)?;
        let courses = db.courses_with_progress(learner.id)?;
        let leaderboard = db.leaderboard(Some(&learner.username), 10)?;
        let achievements = db.achievement_status(learner.id)?;
        let recent_activity = db.recent_activity(learner.id, 8)?;

        Ok(Self {
            db,
            learner,
            view: View::Dashboard,
            stats,
            courses: StatefulList::with_items(courses),
            selected_course: None,
            selected_course_lectures: Vec::new(),
            leaderboard,
            achievements,
            recent_activity,
            should_quit: false,
        })
    }

    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stats = self.db.stats(&self.learner.username)?;
        self.courses =
            StatefulList::with_items(self.db.courses_with_progress(self.learner.id)?);
        self.leaderboard = self.db.leaderboard(Some(&self.learner.username), 10)?;
        self.achievements = self.db.achievement_status(self.learner.id)?;
        self.recent_activity = self.db.recent_activity(self.learner.id, 8)?;

        if let Some(ref selected) = self.selected_course {
            self.selected_course_lectures = self
                .db
                .lectures_with_status(self.learner.id, selected.course.id)?;
        }
        Ok(())
    }

    fn select_course(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(cwp) = self.courses.selected_item() {
            self.selected_course = Some(cwp.clone());
            self.selected_course_lectures = self
                .db
                .lectures_with_status(self.learner.id, cwp.course.id)?;
            self.view = View::CourseDetail;
        }
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Char('q') => self.should_quit = true,

            // Refresh: Ctrl+r
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Esc => {
                if self.view == View::CourseDetail {
                    self.view = View::Courses;
                    self.selected_course = None;
                }
            }

            // Navigation between views: h/l (left/right like vim)
            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::CourseDetail => {
                    self.view = View::Courses;
                    self.selected_course = None;
                }
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Courses => self.select_course()?,
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => {
                self.view = self.view.prev();
            }

            // List navigation: j/k (vim up/down)
            KeyCode::Char('j') | KeyCode::Down => {
                if self.view == View::Courses {
                    self.courses.next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.view == View::Courses {
                    self.courses.previous();
                }
            }

            // Jump to top/bottom: g/G
            KeyCode::Char('g') => {
                if self.view == View::Courses && !self.courses.items.is_empty() {
                    self.courses.selected = Some(0);
                }
            }
            KeyCode::Char('G') => {
                if self.view == View::Courses && !self.courses.items.is_empty() {
                    self.courses.selected = Some(self.courses.items.len() - 1);
                }
            }

            KeyCode::Enter => {
                if self.view == View::Courses {
                    self.select_course()?;
                }
            }

            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database, learner: Learner) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(db, learner)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
