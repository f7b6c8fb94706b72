//! One screen per page of the client, and the routing between them.

mod activation;
mod ask;
mod audience;
mod history;
mod login;
mod menu;
mod setup;
mod signup;
mod sources;

pub use activation::ActivationScreen;
pub use ask::AskScreen;
pub use audience::AudienceScreen;
pub use history::HistoryScreen;
pub use login::LoginScreen;
pub use menu::MenuScreen;
pub use setup::SetupScreen;
pub use signup::SignupScreen;
pub use sources::SourcesScreen;

use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::AppContext;
use crate::ui::modal::key_hints;
use crate::wizard::{Advance, Blocked};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Menu,
    Setup,
    Sources,
    Audience,
    Activation,
    History,
    Ask,
}

impl Route {
    /// Everything but the login and signup pages sits behind the auth flag
    pub fn is_protected(self) -> bool {
        !matches!(self, Route::Login | Route::Signup)
    }
}

/// What a key press asks the app to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Go(Route),
    Quit,
}

pub enum Screen {
    Login(LoginScreen),
    Signup(SignupScreen),
    Menu(MenuScreen),
    Setup(SetupScreen),
    Sources(SourcesScreen),
    Audience(AudienceScreen),
    Activation(ActivationScreen),
    History(HistoryScreen),
    Ask(AskScreen),
}

impl Screen {
    /// Build the screen for `route` and load what it shows
    pub async fn open(route: Route, ctx: &mut AppContext) -> Self {
        match route {
            Route::Login => Screen::Login(LoginScreen::new()),
            Route::Signup => Screen::Signup(SignupScreen::new()),
            Route::Menu => Screen::Menu(MenuScreen::new()),
            Route::Setup => Screen::Setup(SetupScreen::new()),
            Route::Sources => {
                let _ = ctx
                    .sources
                    .refresh(ctx.gateway.as_ref(), &mut ctx.store)
                    .await;
                Screen::Sources(SourcesScreen::new())
            }
            Route::Audience => {
                let mut screen = AudienceScreen::new();
                screen.load(ctx).await;
                Screen::Audience(screen)
            }
            Route::Activation => Screen::Activation(ActivationScreen::new()),
            Route::History => Screen::History(HistoryScreen::new(&ctx.store)),
            Route::Ask => Screen::Ask(AskScreen::new()),
        }
    }

    pub fn route(&self) -> Route {
        match self {
            Screen::Login(_) => Route::Login,
            Screen::Signup(_) => Route::Signup,
            Screen::Menu(_) => Route::Menu,
            Screen::Setup(_) => Route::Setup,
            Screen::Sources(_) => Route::Sources,
            Screen::Audience(_) => Route::Audience,
            Screen::Activation(_) => Route::Activation,
            Screen::History(_) => Route::History,
            Screen::Ask(_) => Route::Ask,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, ctx: &AppContext) {
        match self {
            Screen::Login(s) => s.render(frame),
            Screen::Signup(s) => s.render(frame),
            Screen::Menu(s) => s.render(frame, ctx),
            Screen::Setup(s) => s.render(frame),
            Screen::Sources(s) => s.render(frame, ctx),
            Screen::Audience(s) => s.render(frame),
            Screen::Activation(s) => s.render(frame),
            Screen::History(s) => s.render(frame),
            Screen::Ask(s) => s.render(frame),
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        match self {
            Screen::Login(s) => s.handle_key(key, ctx),
            Screen::Signup(s) => s.handle_key(key, ctx),
            Screen::Menu(s) => s.handle_key(key, ctx),
            Screen::Setup(s) => s.handle_key(key, ctx).await,
            Screen::Sources(s) => s.handle_key(key, ctx).await,
            Screen::Audience(s) => s.handle_key(key, ctx).await,
            Screen::Activation(s) => s.handle_key(key, ctx),
            Screen::History(s) => s.handle_key(key, ctx),
            Screen::Ask(s) => s.handle_key(key, ctx).await,
        }
    }
}

/// Areas inside the outer frame every screen shares
pub(crate) struct Chrome {
    pub header: Rect,
    pub body: Rect,
    pub status: Rect,
}

/// Outer block titled `title`, a one-line header, the body, a status line
/// and the key hints along the bottom
pub(crate) fn render_chrome(frame: &mut Frame, title: &str, hints: &[(&str, &str)]) -> Chrome {
    let block = Block::default()
        .title(Line::from(vec![
            Span::styled(" iNitro ", Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{title} "),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(frame.area());
    frame.render_widget(block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // header / stepper
            Constraint::Length(1), // spacer
            Constraint::Min(5),    // body
            Constraint::Length(2), // status
            Constraint::Length(1), // key hints
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(key_hints(hints)), chunks[4]);

    Chrome {
        header: chunks[0],
        body: chunks[2],
        status: chunks[3],
    }
}

/// Status-line text for an advance that did not move
pub(crate) fn blocked_notice(advance: &Advance) -> Option<String> {
    let Advance::Blocked(blocked) = advance else {
        return None;
    };
    Some(match blocked {
        Blocked::NoSelection => "Make a selection to continue.".to_string(),
        Blocked::MissingFields(names) => format!("Fill in the required fields: {}", names.join(", ")),
        Blocked::Submitting => "Still working, please wait.".to_string(),
        Blocked::Complete => "Already finished.".to_string(),
    })
}

/// Move a list highlight by one, clamped to `len`
pub(crate) fn step_index(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match current {
        None => 0,
        Some(i) if forward => (i + 1).min(len - 1),
        Some(i) => i.saturating_sub(1),
    };
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_login_is_public() {
        assert!(!Route::Login.is_protected());
        assert!(!Route::Signup.is_protected());
        assert!(Route::Menu.is_protected());
        assert!(Route::Activation.is_protected());
    }

    #[test]
    fn test_blocked_notice_lists_fields() {
        let notice = blocked_notice(&Advance::Blocked(Blocked::MissingFields(vec![
            "account", "database",
        ])));
        assert_eq!(
            notice.as_deref(),
            Some("Fill in the required fields: account, database")
        );
        assert_eq!(blocked_notice(&Advance::Moved(2)), None);
    }

    #[test]
    fn test_step_index_clamps() {
        assert_eq!(step_index(None, 3, true), Some(0));
        assert_eq!(step_index(Some(2), 3, true), Some(2));
        assert_eq!(step_index(Some(0), 3, false), Some(0));
        assert_eq!(step_index(Some(1), 0, true), None);
    }
}
