use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(cwp) = &app.selected_course else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Course summary
            Constraint::Min(0),    // Lecture list
        ])
        .split(area);

    draw_summary(f, app, cwp, chunks[0]);
    draw_lectures(f, app, chunks[1]);
}

fn draw_summary(
    f: &mut Frame,
    app: &App,
    cwp: &crate::models::CourseWithProgress,
    area: Rect,
) {
    let done = app
        .selected_course_lectures
        .iter()
        .filter(|(_, completed)| *completed)
        .count();
    let total = app.selected_course_lectures.len();

    let status_line = match &cwp.enrollment {
        Some(e) if e.completed => Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Gray)),
            Span::styled(
                "Completed",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                e.completed_at
                    .as_deref()
                    .map(|d| format!("  ({})", &d[..10.min(d.len())]))
                    .unwrap_or_default(),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Some(_) => Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Gray)),
            Span::styled("In progress", Style::default().fg(Color::Yellow)),
        ]),
        None => Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Gray)),
            Span::styled("Not enrolled", Style::default().fg(Color::DarkGray)),
        ]),
    };

    let mut text = vec![
        Line::from(vec![
            Span::styled("Course: ", Style::default().fg(Color::Gray)),
            Span::styled(
                cwp.course.title.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        status_line,
        Line::from(vec![
            Span::styled("Lectures: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/{}", done, total),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    if let Some(desc) = &cwp.course.description {
        text.push(Line::from(vec![Span::styled(
            desc.clone(),
            Style::default().fg(Color::DarkGray),
        )]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Course ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_lectures(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .selected_course_lectures
        .iter()
        .map(|(lecture, completed)| {
            let (mark, style) = if *completed {
                ("[x]", Style::default().fg(Color::Green))
            } else {
                ("[ ]", Style::default().fg(Color::White))
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", mark), style),
                Span::styled(
                    format!("{:>3}. ", lecture.position),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(lecture.title.clone(), style),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Lectures ")
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(List::new(items).block(block), area);
}
