//! Connect step rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::SetupScreen;
use crate::flows::setup::CONNECT_FIELDS;
use crate::ui::form_field::{InputView, INPUT_HEIGHT};

impl SetupScreen {
    pub(crate) fn render_connect_step(&self, frame: &mut Frame, area: Rect) {
        let mut constraints = vec![Constraint::Length(2)];
        constraints.extend(CONNECT_FIELDS.iter().map(|_| Constraint::Length(INPUT_HEIGHT)));
        constraints.push(Constraint::Min(0));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let name = self.flow.selected().map_or("your source", |k| k.name);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw("Connection details for "),
                Span::styled(
                    name,
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ])),
            chunks[0],
        );

        let wizard = self.flow.wizard();
        for (i, field) in CONNECT_FIELDS.iter().enumerate() {
            InputView::new(*field, wizard.draft().get(field.name))
                .focused(self.focus.is(i))
                .error(wizard.field_error(field.name).map(ToString::to_string))
                .render(frame, chunks[i + 1]);
        }
    }
}
