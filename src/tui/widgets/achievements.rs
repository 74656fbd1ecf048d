use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::models::Rarity;
use crate::tui::App;

fn rarity_color(rarity: Rarity) -> Color {
    match rarity {
        Rarity::Common => Color::White,
        Rarity::Rare => Color::Cyan,
        Rarity::Epic => Color::Magenta,
        Rarity::Legendary => Color::Yellow,
    }
}

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let unlocked_count = app.achievements.iter().filter(|(_, u)| *u).count();

    let items: Vec<ListItem> = app
        .achievements
        .iter()
        .map(|(def, unlocked)| {
            let (mark, title_style) = if *unlocked {
                (
                    "[x]",
                    Style::default()
                        .fg(rarity_color(def.rarity))
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("[ ]", Style::default().fg(Color::DarkGray))
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", mark), title_style),
                Span::styled(format!("{:<25}", def.title), title_style),
                Span::styled(
                    format!("{:<12}", def.rarity.label()),
                    Style::default().fg(rarity_color(def.rarity)),
                ),
                Span::styled(
                    format!("+{} XP", def.xp_reward),
                    Style::default().fg(Color::Cyan),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            " Achievements ({}/{}) ",
            unlocked_count,
            app.achievements.len()
        ))
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}
