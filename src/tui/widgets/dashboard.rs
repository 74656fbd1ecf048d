use chrono::DateTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};

use crate::engine::xp;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Stats + Streak row
            Constraint::Length(3), // Level progress bar
            Constraint::Min(0),    // Recent activity
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_streak(f, app, top_chunks[1]);
    draw_level_bar(f, app, chunks[1]);
    draw_recent_activity(f, app, chunks[2]);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;

    let text = vec![
        Line::from(vec![
            Span::styled("Learner: ", Style::default().fg(Color::Gray)),
            Span::styled(
                stats.username.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Level: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.level),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({} XP)", stats.xp),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Lectures: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.lectures_completed),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Courses: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.courses_completed),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled("Achievements: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.achievements_unlocked),
                Style::default().fg(Color::Magenta),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_streak(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;
    let flame = if stats.streak > 0 { "ACTIVE" } else { "COLD" };
    let flame_color = if stats.streak > 0 {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Streak: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} days", stats.streak),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Best: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} days", stats.best_streak),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Gray)),
            Span::styled(flame, Style::default().fg(flame_color)),
        ]),
        Line::from(vec![Span::styled(
            "One lecture or check-in a day keeps it alive.",
            Style::default().fg(Color::DarkGray),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Streak ")
        .title_style(Style::default().fg(Color::Yellow));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_level_bar(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;
    let progress = xp::level_progress(stats.xp);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Level {} ", stats.level)),
        )
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(progress.clamp(0.0, 1.0))
        .label(format!("{} XP to next level", stats.xp_to_next_level));

    f.render_widget(gauge, area);
}

fn draw_recent_activity(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .recent_activity
        .iter()
        .map(|entry| {
            let date = format_date(&entry.created_at);
            let kind_color = match entry.kind {
                crate::models::ActivityKind::LectureCompleted => Color::White,
                crate::models::ActivityKind::CourseCompleted => Color::Green,
                crate::models::ActivityKind::StreakContinued => Color::Yellow,
                crate::models::ActivityKind::AchievementUnlocked => Color::Magenta,
                crate::models::ActivityKind::CheckIn => Color::Cyan,
            };
            let xp = if entry.xp > 0 {
                format!("+{} XP", entry.xp)
            } else {
                String::new()
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<10}", date),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<14}", entry.kind.label()),
                    Style::default().fg(kind_color),
                ),
                Span::styled(
                    format!("{:<30}", truncate(entry.detail.as_deref().unwrap_or("-"), 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(xp, Style::default().fg(Color::Cyan)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent Activity ")
        .title_style(Style::default().fg(Color::Magenta));

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn format_date(date_str: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        dt.format("%b %d").to_string()
    } else {
        date_str.chars().take(10).collect()
    }
}
