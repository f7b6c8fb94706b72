//! Popups drawn over a screen: success modal, confirmation, error banner.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Rect of `percent_x` by `percent_y` centered in `r`
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(rows[1])[1]
}

/// `[Enter] Continue  [Esc] Back` style footer
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("[{key}]"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {action}"),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

/// One-line red banner; draws nothing without a message
pub(crate) fn render_error_banner(frame: &mut Frame, area: Rect, message: Option<&str>) {
    let Some(message) = message else {
        return;
    };
    let banner = Paragraph::new(Line::from(vec![
        Span::styled("✗ ", Style::default().fg(Color::Red)),
        Span::styled(message.to_string(), Style::default().fg(Color::Red)),
    ]))
    .wrap(Wrap { trim: true });
    frame.render_widget(banner, area);
}

/// Completion popup with a primary and an optional secondary action
pub struct SuccessModal<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub primary: &'a str,
    pub secondary: Option<&'a str>,
}

impl SuccessModal<'_> {
    pub fn render(&self, frame: &mut Frame) {
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(" ✓ ", Style::default().fg(Color::Green)),
                Span::styled(
                    self.title.to_string(),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
            ]))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(inner);

        let lines: Vec<Line> = self.message.lines().map(Line::from).collect();
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let mut hints = vec![("Enter", self.primary)];
        if let Some(secondary) = self.secondary {
            hints.push(("Esc", secondary));
        }
        frame.render_widget(
            Paragraph::new(key_hints(&hints)).alignment(Alignment::Center),
            chunks[1],
        );
    }
}

/// Yes/No confirmation; No is focused first
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    yes_selected: bool,
}

impl ConfirmDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            yes_selected: false,
        }
    }

    pub fn toggle(&mut self) {
        self.yes_selected = !self.yes_selected;
    }

    pub fn is_yes(&self) -> bool {
        self.yes_selected
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(Line::from(vec![Span::styled(
                format!(" {} ", self.title),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )]))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .split(inner);

        frame.render_widget(
            Paragraph::new(self.message.as_str())
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let button = |label: &'static str, selected: bool| {
            if selected {
                Span::styled(
                    format!(" {label} "),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" {label} "), Style::default().fg(Color::Gray))
            }
        };
        let buttons = Line::from(vec![
            button("Yes", self.yes_selected),
            Span::raw("    "),
            button("No", !self.yes_selected),
        ]);
        frame.render_widget(
            Paragraph::new(buttons).alignment(Alignment::Center),
            chunks[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::render_to_string;

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert_eq!(inner.x, 20);
        assert_eq!(inner.y, 15);
    }

    #[test]
    fn test_key_hints_text() {
        let line = key_hints(&[("Enter", "Continue"), ("Esc", "Back")]);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "[Enter] Continue  [Esc] Back");
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let mut dialog = ConfirmDialog::new("Delete source", "Delete Orders?");
        assert!(!dialog.is_yes());
        dialog.toggle();
        assert!(dialog.is_yes());
    }

    #[test]
    fn test_success_modal_renders_message() {
        let modal = SuccessModal {
            title: "Success",
            message: "PostgreSQL has been connected.",
            primary: "View sources",
            secondary: Some("Close"),
        };
        let screen = render_to_string(100, 30, |frame| modal.render(frame));
        assert!(screen.contains("PostgreSQL has been connected."));
        assert!(screen.contains("[Enter] View sources"));
    }
}
