use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Constraint,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use tracing::warn;

use super::{render_chrome, step_index, Route, Transition};
use crate::api::display_date;
use crate::app::AppContext;
use crate::flows::activation::group_thousands;
use crate::flows::HistoryView;
use crate::store::SessionStore;
use crate::ui::modal::{render_error_banner, ConfirmDialog};

pub struct HistoryScreen {
    view: HistoryView,
    state: TableState,
    confirm: Option<ConfirmDialog>,
    notice: Option<String>,
}

impl HistoryScreen {
    pub fn new(store: &SessionStore) -> Self {
        let view = HistoryView::load(store);
        let mut state = TableState::default();
        state.select((!view.is_empty()).then_some(0));
        Self {
            view,
            state,
            confirm: None,
            notice: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        if let Some(dialog) = self.confirm.as_mut() {
            let confirmed = match key.code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    dialog.toggle();
                    return Transition::Stay;
                }
                KeyCode::Char('y') => true,
                KeyCode::Enter => dialog.is_yes(),
                KeyCode::Char('n') | KeyCode::Esc => false,
                _ => return Transition::Stay,
            };
            self.confirm = None;
            if confirmed {
                self.clear(&mut ctx.store);
            }
            return Transition::Stay;
        }

        let len = self.view.records().len();
        match key.code {
            KeyCode::Esc => return Transition::Go(Route::Menu),
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.select(step_index(self.state.selected(), len, true));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.select(step_index(self.state.selected(), len, false));
            }
            KeyCode::Char('r') => self.view.reload(&ctx.store),
            KeyCode::Char('c') if !self.view.is_empty() => {
                self.confirm = Some(ConfirmDialog::new(
                    "Clear history",
                    format!("Remove all {len} activation records?"),
                ));
            }
            _ => {}
        }
        Transition::Stay
    }

    fn clear(&mut self, store: &mut SessionStore) {
        match self.view.clear(store) {
            Ok(()) => {
                self.state.select(None);
                self.notice = None;
            }
            Err(e) => {
                warn!(error = %e, "failed to clear activation history");
                self.notice = Some(format!("Failed to clear history: {e}"));
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chrome = render_chrome(
            frame,
            "Activation history",
            &[
                ("↑/↓", "Move"),
                ("c", "Clear"),
                ("r", "Reload"),
                ("Esc", "Home"),
            ],
        );

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{} activations, newest first", self.view.records().len()),
                Style::default().fg(Color::Gray),
            )),
            chrome.header,
        );

        if self.view.is_empty() {
            frame.render_widget(
                Paragraph::new("No activations yet. Finalize one from the Activation screen."),
                chrome.body,
            );
        } else {
            let rows: Vec<Row> = self
                .view
                .records()
                .iter()
                .map(|record| {
                    Row::new(vec![
                        Cell::from(record.audience.clone()),
                        Cell::from(record.channel.clone()),
                        Cell::from(group_thousands(record.count)),
                        Cell::from(record.scheduled_for.clone()),
                        Cell::from(display_date(&record.created_at)),
                    ])
                })
                .collect();

            let table = Table::new(
                rows,
                [
                    Constraint::Percentage(30),
                    Constraint::Percentage(15),
                    Constraint::Percentage(10),
                    Constraint::Percentage(25),
                    Constraint::Percentage(20),
                ],
            )
            .header(
                Row::new(vec!["Audience", "Channel", "Count", "Schedule", "Created"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .row_highlight_style(Style::default().fg(Color::Cyan))
            .highlight_symbol("> ");
            frame.render_stateful_widget(table, chrome.body, &mut self.state);
        }

        render_error_banner(frame, chrome.status, self.notice.as_deref());

        if let Some(dialog) = &self.confirm {
            dialog.render(frame);
        }
    }
}
