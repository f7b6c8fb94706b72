//! Horizontal progress indicator for the wizard screens.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::wizard::{StepStatus, StepView};

fn step_style(status: StepStatus) -> Style {
    match status {
        StepStatus::Completed => Style::default().fg(Color::Green),
        StepStatus::Active => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        StepStatus::Upcoming => Style::default().fg(Color::DarkGray),
    }
}

/// `✓ 1 Select ── ● 2 Connect ── ○ 3 Finish`
pub(crate) fn stepper_line(views: &[StepView<'_>]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, view) in views.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" ── ", Style::default().fg(Color::DarkGray)));
        }
        let marker = match view.status {
            StepStatus::Completed => "✓",
            StepStatus::Active => "●",
            StepStatus::Upcoming => "○",
        };
        spans.push(Span::styled(
            format!("{marker} {} {}", view.number, view.label),
            step_style(view.status),
        ));
    }
    Line::from(spans)
}

pub(crate) fn render_stepper(frame: &mut Frame, area: Rect, views: &[StepView<'_>]) {
    frame.render_widget(Paragraph::new(stepper_line(views)), area);
}
