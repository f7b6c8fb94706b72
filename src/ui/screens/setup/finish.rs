//! Finish step rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::SetupScreen;
use crate::flows::setup::NAME;
use crate::ui::form_field::{InputView, INPUT_HEIGHT};

impl SetupScreen {
    pub(crate) fn render_finish_step(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(INPUT_HEIGHT), // Name
                Constraint::Length(1),            // Spacer
                Constraint::Length(1),            // Slug
                Constraint::Length(1),            // Spacer
                Constraint::Length(1),            // Submitting
                Constraint::Min(0),
            ])
            .split(area);

        let wizard = self.flow.wizard();
        InputView::new(NAME, wizard.draft().get(NAME.name))
            .focused(!wizard.is_submitting())
            .error(wizard.field_error(NAME.name).map(ToString::to_string))
            .render(frame, chunks[0]);

        let slug = self.flow.slug().unwrap_or_default();
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Slug: ", Style::default().fg(Color::DarkGray)),
                Span::raw(slug),
            ])),
            chunks[2],
        );

        if wizard.is_submitting() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "Saving source…",
                    Style::default().fg(Color::Yellow),
                )),
                chunks[4],
            );
        }
    }
}
