use crossterm::event::{KeyCode, KeyEvent};
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
use crate::flows::signup::CONFIRM_PASSWORD;
use crate::flows::SignupForm;
use crate::ui::form_field::{edit_field, FocusRing, InputView, INPUT_HEIGHT};
use crate::ui::modal::{centered_rect, key_hints, render_error_banner};
use crate::wizard::Field;

const FIELDS: [Field; 3] = [EMAIL, PASSWORD, CONFIRM_PASSWORD];

pub struct SignupScreen {
    form: SignupForm,
    focus: FocusRing,
}

impl SignupScreen {
    pub fn new() -> Self {
        Self {
            form: SignupForm::new(),
            focus: FocusRing::new(FIELDS.len()),
        }
    }

    /// New accounts go straight to connecting a first source
    pub fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        match key.code {
            KeyCode::Esc => return Transition::Go(Route::Login),
            KeyCode::Tab | KeyCode::Down => self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus.prev(),
            KeyCode::Enter => {
                if self.form.submit(&mut ctx.store) {
                    return Transition::Go(Route::Setup);
                }
            }
            code => {
                let name = FIELDS[self.focus.index()].name;
                edit_field(self.form.wizard_mut(), name, code);
            }
        }
        Transition::Stay
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = centered_rect(50, 70, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(" iNitro ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    "Create your account ",
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let wizard = self.form.wizard();
        for (index, field) in FIELDS.iter().enumerate() {
            let mut input = InputView::new(*field, wizard.draft().get(field.name))
                .focused(self.focus.is(index))
                .error(wizard.field_error(field.name).map(ToString::to_string));
            if index == 0 {
                input = input.placeholder("you@company.com");
            } else {
                input = input.masked();
            }
            input.render(frame, chunks[index]);
        }

        render_error_banner(frame, chunks[3], wizard.error());

        frame.render_widget(
            Paragraph::new(key_hints(&[
                ("Tab", "Next field"),
                ("Enter", "Create account"),
                ("Esc", "Back to sign in"),
            ]))
            .alignment(Alignment::Center),
            chunks[5],
        );
    }
}
