//! Source setup wizard: Select → Connect → Finish

mod connect;
mod finish;
mod select;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{widgets::ListState, Frame};

use super::{blocked_notice, render_chrome, step_index, Route, Transition};
use crate::app::AppContext;
use crate::flows::setup::{CONNECT_FIELDS, NAME};
use crate::flows::{SetupFlow, SOURCE_CATALOG};
use crate::ui::form_field::{edit_field, FocusRing};
use crate::ui::modal::SuccessModal;
use crate::ui::stepper::render_stepper;

pub struct SetupScreen {
    pub(crate) flow: SetupFlow,
    /// Highlighted catalog entry on step 1
    pub(crate) catalog_state: ListState,
    /// Focused input on step 2
    pub(crate) focus: FocusRing,
    pub(crate) notice: Option<String>,
}

impl SetupScreen {
    pub fn new() -> Self {
        Self::with_flow(SetupFlow::new())
    }

    pub(crate) fn with_flow(flow: SetupFlow) -> Self {
        let mut catalog_state = ListState::default();
        catalog_state.select(Some(0));
        Self {
            flow,
            catalog_state,
            focus: FocusRing::new(CONNECT_FIELDS.len()),
            notice: None,
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        if self.flow.wizard().is_complete() {
            return match key.code {
                KeyCode::Enter => Transition::Go(Route::Sources),
                KeyCode::Esc => Transition::Go(Route::Menu),
                _ => Transition::Stay,
            };
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('x') {
            self.flow.cancel();
            self.focus.reset();
            self.notice = None;
            return Transition::Stay;
        }

        match key.code {
            KeyCode::Esc => {
                self.notice = None;
                if !self.flow.back() {
                    return Transition::Go(Route::Menu);
                }
            }
            KeyCode::Enter => self.continue_step(ctx).await,
            code => match self.flow.wizard().step() {
                1 => self.select_key(code),
                2 => self.connect_key(code),
                _ => {
                    edit_field(self.flow.wizard_mut(), NAME.name, code);
                }
            },
        }
        Transition::Stay
    }

    async fn continue_step(&mut self, ctx: &mut AppContext) {
        let advance = if self.flow.wizard().step() == 1 {
            let Some(kind) = self
                .catalog_state
                .selected()
                .and_then(|i| SOURCE_CATALOG.get(i))
            else {
                return;
            };
            self.flow.select_source(kind)
        } else {
            self.flow
                .proceed(ctx.gateway.as_ref(), &mut ctx.sources, &mut ctx.store)
                .await
        };
        self.notice = blocked_notice(&advance);
        self.focus.reset();
    }

    fn select_key(&mut self, code: KeyCode) {
        let forward = match code {
            KeyCode::Down | KeyCode::Char('j') => true,
            KeyCode::Up | KeyCode::Char('k') => false,
            _ => return,
        };
        self.catalog_state.select(step_index(
            self.catalog_state.selected(),
            SOURCE_CATALOG.len(),
            forward,
        ));
    }

    fn connect_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Tab | KeyCode::Down => self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus.prev(),
            code => {
                let field = CONNECT_FIELDS[self.focus.index()];
                edit_field(self.flow.wizard_mut(), field.name, code);
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let hints: &[(&str, &str)] = match self.flow.wizard().step() {
            1 => &[("↑/↓", "Move"), ("Enter", "Select"), ("Esc", "Back")],
            2 => &[
                ("Tab", "Next field"),
                ("Enter", "Continue"),
                ("Esc", "Back"),
                ("Ctrl+X", "Cancel"),
            ],
            _ => &[("Enter", "Finish"), ("Esc", "Back"), ("Ctrl+X", "Cancel")],
        };
        let chrome = render_chrome(frame, "Connect a source", hints);
        render_stepper(frame, chrome.header, &self.flow.wizard().step_views());

        match self.flow.wizard().step() {
            1 => self.render_select_step(frame, chrome.body),
            2 => self.render_connect_step(frame, chrome.body),
            _ => self.render_finish_step(frame, chrome.body),
        }

        let status = self
            .flow
            .wizard()
            .error()
            .map(str::to_string)
            .or_else(|| self.notice.clone());
        crate::ui::modal::render_error_banner(frame, chrome.status, status.as_deref());

        if let Some(message) = self.flow.success_message() {
            SuccessModal {
                title: "Source connected",
                message: &message,
                primary: "View sources",
                secondary: Some("Home"),
            }
            .render(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::ApiError;
    use crate::flows::tests::FakeGateway;
    use crate::ui::render_to_string;

    async fn press(screen: &mut SetupScreen, ctx: &mut AppContext, code: KeyCode) -> Transition {
        screen.handle_key(KeyEvent::from(code), ctx).await
    }

    async fn type_text(screen: &mut SetupScreen, ctx: &mut AppContext, text: &str) {
        for c in text.chars() {
            press(screen, ctx, KeyCode::Char(c)).await;
        }
    }

    async fn walk_to_finish(screen: &mut SetupScreen, ctx: &mut AppContext) {
        let postgres = SOURCE_CATALOG
            .iter()
            .position(|k| k.id == "postgres")
            .unwrap();
        for _ in 0..postgres {
            press(screen, ctx, KeyCode::Down).await;
        }
        press(screen, ctx, KeyCode::Enter).await;
        assert_eq!(screen.flow.wizard().step(), 2);

        for value in ["acme", "COMPUTE_WH", "ANALYTICS", "loader"] {
            type_text(screen, ctx, value).await;
            press(screen, ctx, KeyCode::Tab).await;
        }
        press(screen, ctx, KeyCode::Enter).await;
        assert_eq!(screen.flow.wizard().step(), 3);
    }

    #[tokio::test]
    async fn test_keyboard_walkthrough_connects_source() {
        let gateway = Arc::new(FakeGateway::default());
        let mut ctx = AppContext::with_gateway(gateway.clone());
        let mut screen = SetupScreen::with_flow(SetupFlow::with_slug_suffix("u3fcd"));

        walk_to_finish(&mut screen, &mut ctx).await;
        let text = render_to_string(120, 40, |frame| screen.render(frame));
        assert!(text.contains("postgres-u3fcd"));

        press(&mut screen, &mut ctx, KeyCode::Enter).await;
        assert!(screen.flow.wizard().is_complete());
        assert_eq!(ctx.sources.len(), 1);

        let text = render_to_string(120, 40, |frame| screen.render(frame));
        assert!(text.contains("Source connected"));

        assert_eq!(
            press(&mut screen, &mut ctx, KeyCode::Enter).await,
            Transition::Go(Route::Sources)
        );
        assert_eq!(gateway.state.lock().unwrap().creates[0].credentials.account, "acme");
    }

    #[tokio::test]
    async fn test_connect_step_blocks_on_empty_fields() {
        let mut ctx = AppContext::offline();
        let mut screen = SetupScreen::new();
        press(&mut screen, &mut ctx, KeyCode::Enter).await;
        press(&mut screen, &mut ctx, KeyCode::Enter).await;

        assert_eq!(screen.flow.wizard().step(), 2);
        assert_eq!(
            screen.notice.as_deref(),
            Some("Fill in the required fields: account, warehouse, database, username")
        );
    }

    #[tokio::test]
    async fn test_failed_create_keeps_finish_step() {
        let gateway = Arc::new(FakeGateway::failing_create(ApiError::server(500, "boom")));
        let mut ctx = AppContext::with_gateway(gateway);
        let mut screen = SetupScreen::new();

        walk_to_finish(&mut screen, &mut ctx).await;
        press(&mut screen, &mut ctx, KeyCode::Enter).await;

        assert_eq!(screen.flow.wizard().step(), 3);
        assert!(!screen.flow.wizard().is_complete());
        assert!(screen.flow.wizard().error().unwrap().starts_with("Failed to save source"));
        assert!(ctx.sources.is_empty());
    }

    #[tokio::test]
    async fn test_escape_on_first_step_returns_home() {
        let mut ctx = AppContext::offline();
        let mut screen = SetupScreen::new();
        assert_eq!(
            press(&mut screen, &mut ctx, KeyCode::Esc).await,
            Transition::Go(Route::Menu)
        );
    }

    #[tokio::test]
    async fn test_cancel_resets_to_first_step() {
        let mut ctx = AppContext::offline();
        let mut screen = SetupScreen::new();
        press(&mut screen, &mut ctx, KeyCode::Enter).await;
        type_text(&mut screen, &mut ctx, "acme").await;

        screen
            .handle_key(
                KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL),
                &mut ctx,
            )
            .await;
        assert_eq!(screen.flow.wizard().step(), 1);
        assert!(screen.flow.selected().is_none());
        assert!(screen.flow.wizard().draft().is_empty());
    }
}
