use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{achievements, course_detail, courses, dashboard, leaderboard};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Courses", "Leaderboard", "Achievements"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Courses | View::CourseDetail => 1,
        View::Leaderboard => 2,
        View::Achievements => 3,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" Scholar "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Courses => courses::draw(f, app, area),
        View::CourseDetail => course_detail::draw(f, app, area),
        View::Leaderboard => leaderboard::draw(f, app, area),
        View::Achievements => achievements::draw(f, app, area),
    }
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled("h/l", Style::default().fg(Color::Cyan)),
        Span::raw(" Views  "),
    ];

    match app.view {
        View::Dashboard => {
            spans.extend(vec![
                Span::styled("^r", Style::default().fg(Color::Cyan)),
                Span::raw(" Refresh  "),
            ]);
        }
        View::Courses => {
            spans.extend(vec![
                Span::styled("j/k", Style::default().fg(Color::Cyan)),
                Span::raw(" Nav  "),
                Span::styled("g/G", Style::default().fg(Color::Cyan)),
                Span::raw(" Top/Bot  "),
                Span::styled("l/<CR>", Style::default().fg(Color::Cyan)),
                Span::raw(" Open  "),
            ]);
        }
        View::CourseDetail => {
            spans.extend(vec![
                Span::styled("h/<Esc>", Style::default().fg(Color::Cyan)),
                Span::raw(" Back  "),
                Span::styled("^r", Style::default().fg(Color::Cyan)),
                Span::raw(" Refresh  "),
            ]);
        }
        View::Leaderboard | View::Achievements => {
            spans.extend(vec![
                Span::styled("^r", Style::default().fg(Color::Cyan)),
                Span::raw(" Refresh  "),
            ]);
        }
    }

    spans.extend(vec![
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::raw(" Quit"),
    ]);

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
