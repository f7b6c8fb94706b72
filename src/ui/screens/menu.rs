use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::warn;

use super::{render_chrome, step_index, Route, Transition};
use crate::app::AppContext;
use crate::flows::login::sign_out;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Open(Route),
    SignOut,
}

const ENTRIES: [(&str, &str, MenuAction); 7] = [
    (
        "Connect a source",
        "Add a warehouse, database or sample dataset",
        MenuAction::Open(Route::Setup),
    ),
    (
        "Sources",
        "Connected data sources",
        MenuAction::Open(Route::Sources),
    ),
    (
        "Audience",
        "Build segments and pick who to target",
        MenuAction::Open(Route::Audience),
    ),
    (
        "Activation",
        "Send an audience to a destination on a schedule",
        MenuAction::Open(Route::Activation),
    ),
    (
        "Activation history",
        "Campaigns started from this machine",
        MenuAction::Open(Route::History),
    ),
    (
        "Ask",
        "Ask a question about your data in plain English",
        MenuAction::Open(Route::Ask),
    ),
    ("Sign out", "Forget the saved login", MenuAction::SignOut),
];

pub struct MenuScreen {
    state: ListState,
}

impl MenuScreen {
    pub fn new() -> Self {
        let mut state = ListState::default();
        state.select(Some(0));
        Self { state }
    }

    pub fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Transition::Quit,
            KeyCode::Down | KeyCode::Char('j') => {
                self.state
                    .select(step_index(self.state.selected(), ENTRIES.len(), true));
                Transition::Stay
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state
                    .select(step_index(self.state.selected(), ENTRIES.len(), false));
                Transition::Stay
            }
            KeyCode::Enter => {
                let Some((_, _, action)) = self.state.selected().and_then(|i| ENTRIES.get(i))
                else {
                    return Transition::Stay;
                };
                match action {
                    MenuAction::Open(route) => Transition::Go(*route),
                    MenuAction::SignOut => {
                        if let Err(e) = sign_out(&mut ctx.store) {
                            warn!(error = %e, "failed to clear saved login");
                        }
                        Transition::Go(Route::Login)
                    }
                }
            }
            _ => Transition::Stay,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, ctx: &AppContext) {
        let chrome = render_chrome(
            frame,
            "Home",
            &[("↑/↓", "Move"), ("Enter", "Open"), ("q", "Quit")],
        );

        let greeting = ctx.store.auth().map_or_else(
            || "Signed in".to_string(),
            |auth| format!("Signed in as {}", auth.email),
        );
        frame.render_widget(
            Paragraph::new(Span::styled(greeting, Style::default().fg(Color::Gray))),
            chrome.header,
        );

        let items: Vec<ListItem> = ENTRIES
            .iter()
            .map(|(label, description, _)| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        (*label).to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!("  {description}"),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Cyan))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chrome.body, &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AuthSession;

    #[test]
    fn test_enter_opens_highlighted_entry() {
        let mut ctx = AppContext::offline();
        let mut menu = MenuScreen::new();
        menu.handle_key(KeyEvent::from(KeyCode::Down), &mut ctx);
        assert_eq!(
            menu.handle_key(KeyEvent::from(KeyCode::Enter), &mut ctx),
            Transition::Go(Route::Sources)
        );
    }

    #[test]
    fn test_sign_out_clears_auth() {
        let mut ctx = AppContext::offline();
        ctx.store
            .sign_in(&AuthSession {
                email: "a@b.co".to_string(),
                remember_me: true,
            })
            .unwrap();
        let mut menu = MenuScreen::new();
        for _ in 0..ENTRIES.len() {
            menu.handle_key(KeyEvent::from(KeyCode::Down), &mut ctx);
        }
        assert_eq!(
            menu.handle_key(KeyEvent::from(KeyCode::Enter), &mut ctx),
            Transition::Go(Route::Login)
        );
        assert!(!ctx.store.is_authenticated());
    }
}
