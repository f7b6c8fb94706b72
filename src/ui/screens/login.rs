use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{Route, Transition};
use crate::app::AppContext;
use crate::flows::login::{EMAIL, PASSWORD};
use crate::flows::LoginForm;
use crate::ui::form_field::{edit_field, FocusRing, InputView, INPUT_HEIGHT};
use crate::ui::modal::{centered_rect, key_hints, render_error_banner};

const REMEMBER: usize = 2;

pub struct LoginScreen {
    form: LoginForm,
    focus: FocusRing,
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            form: LoginForm::new(),
            focus: FocusRing::new(3),
        }
    }

    fn focused_field(&self) -> Option<&'static str> {
        match self.focus.index() {
            0 => Some(EMAIL.name),
            1 => Some(PASSWORD.name),
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        match key.code {
            KeyCode::Esc => return Transition::Quit,
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Transition::Go(Route::Signup);
            }
            KeyCode::Tab | KeyCode::Down => self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus.prev(),
            KeyCode::Enter => {
                if self.form.submit(&mut ctx.store) {
                    return Transition::Go(Route::Menu);
                }
            }
            KeyCode::Char(' ') if self.focus.is(REMEMBER) => self.form.toggle_remember_me(),
            code => {
                if let Some(name) = self.focused_field() {
                    edit_field(self.form.wizard_mut(), name, code);
                }
            }
        }
        Transition::Stay
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = centered_rect(50, 60, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(" iNitro ", Style::default().fg(Color::Cyan)),
                Span::styled("Sign in ", Style::default().add_modifier(Modifier::BOLD)),
            ]))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(INPUT_HEIGHT), // email
                Constraint::Length(INPUT_HEIGHT), // password
                Constraint::Length(1),            // remember me
                Constraint::Length(1),            // spacer
                Constraint::Length(2),            // error
                Constraint::Min(0),
                Constraint::Length(1), // hints
            ])
            .split(inner);

        let wizard = self.form.wizard();
        let error_text = |name: &str| wizard.field_error(name).map(ToString::to_string);

        InputView::new(EMAIL, wizard.draft().get(EMAIL.name))
            .focused(self.focus.is(0))
            .error(error_text(EMAIL.name))
            .placeholder("you@company.com")
            .render(frame, chunks[0]);
        InputView::new(PASSWORD, wizard.draft().get(PASSWORD.name))
            .focused(self.focus.is(1))
            .error(error_text(PASSWORD.name))
            .masked()
            .render(frame, chunks[1]);

        let check = if self.form.remember_me() { "[x]" } else { "[ ]" };
        let remember_style = if self.focus.is(REMEMBER) {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!("{check} Remember me"), remember_style)),
            chunks[2],
        );

        render_error_banner(frame, chunks[4], wizard.error());

        frame.render_widget(
            Paragraph::new(key_hints(&[
                ("Tab", "Next field"),
                ("Enter", "Sign in"),
                ("Ctrl+N", "Create account"),
                ("Esc", "Quit"),
            ]))
            .alignment(Alignment::Center),
            chunks[6],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::render_to_string;

    fn type_text(screen: &mut LoginScreen, ctx: &mut AppContext, text: &str) {
        for c in text.chars() {
            screen.handle_key(KeyEvent::from(KeyCode::Char(c)), ctx);
        }
    }

    #[test]
    fn test_sign_in_goes_to_menu() {
        let mut ctx = AppContext::offline();
        let mut screen = LoginScreen::new();

        type_text(&mut screen, &mut ctx, "krish@initro.ai");
        screen.handle_key(KeyEvent::from(KeyCode::Tab), &mut ctx);
        type_text(&mut screen, &mut ctx, "hunter2");

        let transition = screen.handle_key(KeyEvent::from(KeyCode::Enter), &mut ctx);
        assert_eq!(transition, Transition::Go(Route::Menu));
        assert!(ctx.store.is_authenticated());
    }

    #[test]
    fn test_invalid_email_stays_and_shows_error() {
        let mut ctx = AppContext::offline();
        let mut screen = LoginScreen::new();
        type_text(&mut screen, &mut ctx, "krish");

        let transition = screen.handle_key(KeyEvent::from(KeyCode::Enter), &mut ctx);
        assert_eq!(transition, Transition::Stay);
        assert!(!ctx.store.is_authenticated());

        let text = render_to_string(120, 40, |frame| screen.render(frame));
        assert!(text.contains("Please enter a valid email"));
    }

    #[test]
    fn test_ctrl_n_opens_signup() {
        let mut ctx = AppContext::offline();
        let mut screen = LoginScreen::new();
        let transition = screen.handle_key(
            KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL),
            &mut ctx,
        );
        assert_eq!(transition, Transition::Go(Route::Signup));
        assert_eq!(screen.form.wizard().draft().get(EMAIL.name), "");
    }

    #[test]
    fn test_space_toggles_remember_only_when_focused() {
        let mut ctx = AppContext::offline();
        let mut screen = LoginScreen::new();
        screen.handle_key(KeyEvent::from(KeyCode::Char(' ')), &mut ctx);
        assert!(!screen.form.remember_me());
        assert_eq!(screen.form.wizard().draft().get(EMAIL.name), " ");

        screen.handle_key(KeyEvent::from(KeyCode::BackTab), &mut ctx);
        screen.handle_key(KeyEvent::from(KeyCode::Char(' ')), &mut ctx);
        assert!(screen.form.remember_me());
    }
}
