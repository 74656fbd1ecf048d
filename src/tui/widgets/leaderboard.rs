use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .leaderboard
        .iter()
        .map(|entry| {
            let rank_color = match entry.rank {
                1 => Color::Yellow,
                2 => Color::White,
                3 => Color::Rgb(205, 127, 50),
                _ => Color::DarkGray,
            };
            let name_style = if entry.is_current_user {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if entry.is_current_user { " (you)" } else { "" };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>3}. ", entry.rank),
                    Style::default().fg(rank_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{:<25}", entry.username), name_style),
                Span::styled(
                    format!("{:>8} XP  ", entry.xp),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("Lv {}", entry.level),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(marker, Style::default().fg(Color::Cyan)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Leaderboard ")
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(List::new(items).block(block), area);
}
