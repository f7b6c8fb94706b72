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
use crate::api::{display_date, RecordId};
use crate::app::AppContext;
use crate::store::CacheEntry;
use crate::ui::modal::{render_error_banner, ConfirmDialog};

pub struct SourcesScreen {
    state: TableState,
    confirm: Option<(ConfirmDialog, RecordId)>,
    notice: Option<String>,
}

impl SourcesScreen {
    pub fn new() -> Self {
        let mut state = TableState::default();
        state.select(Some(0));
        Self {
            state,
            confirm: None,
            notice: None,
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        if self.confirm.is_some() {
            self.confirm_key(key.code, ctx).await;
            return Transition::Stay;
        }

        match key.code {
            KeyCode::Esc => return Transition::Go(Route::Menu),
            KeyCode::Char('a') => return Transition::Go(Route::Setup),
            KeyCode::Down | KeyCode::Char('j') => {
                self.state
                    .select(step_index(self.state.selected(), ctx.sources.len(), true));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state
                    .select(step_index(self.state.selected(), ctx.sources.len(), false));
            }
            KeyCode::Char('r') => {
                self.notice = None;
                let _ = ctx
                    .sources
                    .refresh(ctx.gateway.as_ref(), &mut ctx.store)
                    .await;
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let Some(CacheEntry::Confirmed(source)) =
                    self.state.selected().and_then(|i| ctx.sources.get(i))
                else {
                    return Transition::Stay;
                };
                let dialog = ConfirmDialog::new(
                    "Delete source",
                    format!("Delete \"{}\"? This cannot be undone.", source.name),
                );
                self.confirm = Some((dialog, source.id.clone()));
            }
            _ => {}
        }
        Transition::Stay
    }

    async fn confirm_key(&mut self, code: KeyCode, ctx: &mut AppContext) {
        let Some((dialog, _)) = self.confirm.as_mut() else {
            return;
        };
        let confirmed = match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                dialog.toggle();
                return;
            }
            KeyCode::Char('y') => true,
            KeyCode::Enter => dialog.is_yes(),
            KeyCode::Char('n') | KeyCode::Esc => false,
            _ => return,
        };

        let Some((_, id)) = self.confirm.take() else {
            return;
        };
        if !confirmed {
            return;
        }
        match ctx
            .sources
            .delete(ctx.gateway.as_ref(), &mut ctx.store, &id)
            .await
        {
            Ok(()) => {
                self.notice = None;
                let len = ctx.sources.len();
                if self.state.selected().is_some_and(|i| i >= len) {
                    self.state.select(len.checked_sub(1));
                }
            }
            Err(e) => {
                warn!(%id, error = %e, "delete failed");
                self.notice = Some(format!("Failed to delete source: {e}"));
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame, ctx: &AppContext) {
        let chrome = render_chrome(
            frame,
            "Sources",
            &[
                ("↑/↓", "Move"),
                ("a", "Add"),
                ("d", "Delete"),
                ("r", "Refresh"),
                ("Esc", "Home"),
            ],
        );

        let summary = if ctx.sources.is_loading() {
            "Loading sources…".to_string()
        } else {
            format!("{} connected", ctx.sources.len())
        };
        frame.render_widget(
            Paragraph::new(Span::styled(summary, Style::default().fg(Color::Gray))),
            chrome.header,
        );

        if ctx.sources.is_empty() && !ctx.sources.is_loading() {
            frame.render_widget(
                Paragraph::new("No sources connected yet. Press [a] to add one."),
                chrome.body,
            );
        } else {
            let rows: Vec<Row> = ctx
                .sources
                .entries()
                .iter()
                .map(|entry| {
                    let source = entry.record();
                    let (id, style) = if entry.is_pending() {
                        (
                            "saving…".to_string(),
                            Style::default()
                                .fg(Color::DarkGray)
                                .add_modifier(Modifier::ITALIC),
                        )
                    } else {
                        (source.id.to_string(), Style::default())
                    };
                    Row::new(vec![
                        Cell::from(source.name.clone()),
                        Cell::from(source.source_type.clone()),
                        Cell::from(display_date(&source.created_at)),
                        Cell::from(id),
                    ])
                    .style(style)
                })
                .collect();

            let table = Table::new(
                rows,
                [
                    Constraint::Percentage(35),
                    Constraint::Percentage(20),
                    Constraint::Percentage(25),
                    Constraint::Percentage(20),
                ],
            )
            .header(
                Row::new(vec!["Name", "Type", "Created", "ID"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .row_highlight_style(Style::default().fg(Color::Cyan))
            .highlight_symbol("> ");
            frame.render_stateful_widget(table, chrome.body, &mut self.state);
        }

        let status = self.notice.as_deref().or(ctx.sources.error());
        render_error_banner(frame, chrome.status, status);

        if let Some((dialog, _)) = &self.confirm {
            dialog.render(frame);
        }
    }
}
