use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .courses
        .items
        .iter()
        .map(|cwp| {
            let (progress_bar, percent, status, status_color) = match &cwp.enrollment {
                Some(e) if e.completed => (
                    create_progress_bar(100.0),
                    100.0,
                    "Completed",
                    Color::Green,
                ),
                Some(e) => {
                    let pct = e.percent_complete(cwp.total_lectures);
                    (create_progress_bar(pct), pct, "In progress", Color::Yellow)
                }
                None => (create_progress_bar(0.0), 0.0, "Not enrolled", Color::DarkGray),
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<32}", truncate(&cwp.course.title, 30)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(progress_bar, Style::default().fg(Color::Green)),
                Span::styled(
                    format!(" {:>3.0}% ", percent),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:<4}", format!("{}", cwp.total_lectures)),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(status, Style::default().fg(status_color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Courses ")
        .title_style(Style::default().fg(Color::Cyan));

    // Header
    let header = Line::from(vec![
        Span::styled(
            format!("{:<32}", "Title"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Progress         ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<4}", "Lec"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Status",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.courses.selected);

    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(ratatui::widgets::Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}

fn create_progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * 10.0).round() as usize;
    let filled = filled.min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
