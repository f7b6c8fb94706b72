//! Select step rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use super::SetupScreen;
use crate::flows::setup::Badge;
use crate::flows::SOURCE_CATALOG;

fn badge_style(badge: Badge) -> Style {
    match badge {
        Badge::Sample => Style::default().fg(Color::Green),
        Badge::PrivatePreview => Style::default().fg(Color::Magenta),
    }
}

impl SetupScreen {
    pub(crate) fn render_select_step(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Description
                Constraint::Min(5),    // Catalog
            ])
            .split(area);

        frame.render_widget(
            Paragraph::new(Line::from(
                "Pick a sample dataset to explore, or connect one of your own data systems.",
            )),
            chunks[0],
        );

        let items: Vec<ListItem> = SOURCE_CATALOG
            .iter()
            .map(|kind| {
                let mut spans = vec![Span::styled(
                    kind.name,
                    Style::default().add_modifier(Modifier::BOLD),
                )];
                if let Some(badge) = kind.badge {
                    spans.push(Span::raw("  "));
                    spans.push(Span::styled(format!("[{}]", badge.label()), badge_style(badge)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::REVERSED),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[1], &mut self.catalog_state);
    }
}
