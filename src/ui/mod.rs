//! Terminal UI: screens, popups and input widgets.

pub(crate) mod form_field;
pub(crate) mod modal;
pub mod screens;
pub(crate) mod stepper;
pub mod terminal_guard;

pub use screens::{Route, Screen, Transition};
pub use terminal_guard::{install_panic_hook, TerminalGuard};

/// Draw into an in-memory terminal and return the screen text, one line per row
#[cfg(test)]
pub(crate) fn render_to_string(
    width: u16,
    height: u16,
    draw: impl FnOnce(&mut ratatui::Frame),
) -> String {
    use ratatui::{backend::TestBackend, Terminal};

    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(draw).unwrap();
    let buffer = terminal.backend().buffer();
    buffer
        .content
        .chunks(usize::from(buffer.area.width))
        .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
