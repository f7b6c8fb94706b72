use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::{Gateway, HttpGateway};
use crate::config::Config;
use crate::flows::SourceDirectory;
use crate::store::SessionStore;
use crate::ui::{install_panic_hook, Route, Screen, TerminalGuard, Transition};

/// What every screen reads and writes: the backend, the local store and the
/// source list shared between Setup and Sources
pub struct AppContext {
    pub gateway: Arc<dyn Gateway>,
    pub store: SessionStore,
    pub sources: SourceDirectory,
}

impl AppContext {
    pub fn new(gateway: Arc<dyn Gateway>, store: SessionStore) -> Self {
        let sources = SourceDirectory::from_store(&store);
        Self {
            gateway,
            store,
            sources,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let gateway = HttpGateway::from_config(&config.api).context("Failed to build HTTP client")?;
        let store = SessionStore::open(&config.state_path());
        Ok(Self::new(Arc::new(gateway), store))
    }

    /// In-memory store and an unreachable backend
    #[cfg(test)]
    pub(crate) fn offline() -> Self {
        Self::with_gateway(Arc::new(HttpGateway::new("http://127.0.0.1:9")))
    }

    #[cfg(test)]
    pub(crate) fn with_gateway(gateway: Arc<dyn Gateway>) -> Self {
        Self::new(gateway, SessionStore::in_memory())
    }
}

pub struct App {
    config: Config,
    ctx: AppContext,
    screen: Screen,
    should_quit: bool,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let mut ctx = AppContext::from_config(&config)?;
        let start = if ctx.store.is_authenticated() {
            Route::Menu
        } else {
            Route::Login
        };
        let screen = Screen::open(start, &mut ctx).await;
        Ok(Self {
            config,
            ctx,
            screen,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        install_panic_hook();
        let guard = TerminalGuard::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(self.config.ui.refresh_rate_ms);
        let result = self.event_loop(&mut terminal, tick_rate).await;

        guard.release();
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.screen.render(frame, &self.ctx))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key).await;
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.screen.handle_key(key, &mut self.ctx).await {
            Transition::Stay => {}
            Transition::Quit => self.should_quit = true,
            Transition::Go(route) => self.navigate(route).await,
        }
    }

    /// Open `route`, or the login page when the auth flag is missing
    pub(crate) async fn navigate(&mut self, route: Route) {
        let route = if route.is_protected() && !self.ctx.store.is_authenticated() {
            info!(requested = ?route, "not signed in, showing login");
            Route::Login
        } else {
            route
        };
        debug!(from = ?self.screen.route(), to = ?route, "navigate");
        self.screen = Screen::open(route, &mut self.ctx).await;
    }

    pub fn route(&self) -> Route {
        self.screen.route()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
