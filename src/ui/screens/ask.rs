use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{render_chrome, Route, Transition};
use crate::app::AppContext;
use crate::flows::AskForm;
use crate::ui::form_field::QueryEditor;
use crate::ui::modal::render_error_banner;

pub struct AskScreen {
    form: AskForm,
    editor: QueryEditor,
    scroll: u16,
}

impl AskScreen {
    pub fn new() -> Self {
        Self {
            form: AskForm::new(),
            editor: QueryEditor::new("How many customers spent more than $500 last month?"),
            scroll: 0,
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        match key.code {
            KeyCode::Esc => return Transition::Go(Route::Menu),
            KeyCode::Enter => {
                self.form.question = self.editor.text();
                self.scroll = 0;
                self.form.submit(ctx.gateway.as_ref()).await;
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(5),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(5),
            _ => {
                self.editor.input(key);
            }
        }
        Transition::Stay
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chrome = render_chrome(
            frame,
            "Ask your data",
            &[("Enter", "Ask"), ("PgUp/PgDn", "Scroll"), ("Esc", "Home")],
        );

        frame.render_widget(
            Paragraph::new(Span::styled(
                "Ask a question in plain English; the answer comes back as SQL and rows.",
                Style::default().fg(Color::Gray),
            )),
            chrome.header,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Question
                Constraint::Length(5), // Generated SQL
                Constraint::Min(3),    // Results
            ])
            .split(chrome.body);

        self.editor.render(frame, chunks[0], "Question", true);

        let sql_lines: Vec<Line> = if self.form.is_loading() {
            vec![Line::from(Span::styled(
                "Thinking…",
                Style::default().fg(Color::Yellow),
            ))]
        } else {
            self.form
                .answer()
                .map(|a| a.query.lines().map(|l| Line::from(l.to_string())).collect())
                .unwrap_or_default()
        };
        frame.render_widget(
            Paragraph::new(sql_lines)
                .block(
                    Block::default()
                        .title(Span::styled(
                            " Generated SQL ",
                            Style::default().add_modifier(Modifier::BOLD),
                        ))
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                )
                .style(Style::default().fg(Color::Green))
                .wrap(Wrap { trim: false }),
            chunks[1],
        );

        let results = self.form.results_text().unwrap_or_default();
        frame.render_widget(
            Paragraph::new(results)
                .block(
                    Block::default()
                        .title(Span::styled(
                            " Results ",
                            Style::default().add_modifier(Modifier::BOLD),
                        ))
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                )
                .scroll((self.scroll, 0)),
            chunks[2],
        );

        render_error_banner(frame, chrome.status, self.form.error());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::flows::tests::FakeGateway;
    use crate::ui::render_to_string;

    #[tokio::test]
    async fn test_question_shows_sql_and_rows() {
        let mut ctx = AppContext::with_gateway(Arc::new(FakeGateway::default()));
        let mut screen = AskScreen::new();
        for c in "how many".chars() {
            screen
                .handle_key(KeyEvent::from(KeyCode::Char(c)), &mut ctx)
                .await;
        }
        screen.handle_key(KeyEvent::from(KeyCode::Enter), &mut ctx).await;

        let text = render_to_string(120, 40, |frame| screen.render(frame));
        assert!(text.contains("SELECT count(*) FROM customers"));
        assert!(text.contains("\"count\": 42"));
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let mut ctx = AppContext::offline();
        let mut screen = AskScreen::new();
        screen.handle_key(KeyEvent::from(KeyCode::Enter), &mut ctx).await;

        let text = render_to_string(120, 40, |frame| screen.render(frame));
        assert!(text.contains("Please enter a question."));
    }
}
