//! Form inputs backed by a wizard's `FormDraft`.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::wizard::{Field, Wizard};

/// Rows an input occupies, borders included
pub(crate) const INPUT_HEIGHT: u16 = 3;

/// Apply a typing key to a draft field. Goes through `set_field` so the
/// field's validation error clears as soon as the user edits it.
pub(crate) fn edit_field<S, R>(wizard: &mut Wizard<S, R>, name: &str, code: KeyCode) -> bool {
    let mut value = wizard.draft().get(name).to_string();
    match code {
        KeyCode::Char(c) => value.push(c),
        KeyCode::Backspace => {
            if value.pop().is_none() {
                return false;
            }
        }
        _ => return false,
    }
    wizard.set_field(name, value);
    true
}

/// Single-line input drawn from a draft value
pub(crate) struct InputView<'a> {
    pub field: Field,
    pub value: &'a str,
    pub focused: bool,
    pub error: Option<String>,
    pub masked: bool,
    pub placeholder: Option<&'a str>,
}

impl<'a> InputView<'a> {
    pub fn new(field: Field, value: &'a str) -> Self {
        Self {
            field,
            value,
            focused: false,
            error: None,
            masked: false,
            placeholder: None,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let border_color = if self.error.is_some() {
            Color::Red
        } else if self.focused {
            Color::Yellow
        } else {
            Color::DarkGray
        };

        let mut block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.field.label),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color));
        if let Some(error) = &self.error {
            block = block.title_bottom(Span::styled(
                format!(" {error} "),
                Style::default().fg(Color::Red),
            ));
        }

        let mut text = if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.to_string()
        };

        let content = match self.placeholder {
            Some(placeholder) if text.is_empty() && !self.focused => Line::from(Span::styled(
                placeholder.to_string(),
                Style::default().fg(Color::DarkGray),
            )),
            _ => {
                if self.focused {
                    text.push('|');
                }
                Line::from(text)
            }
        };

        let para = Paragraph::new(content)
            .block(block)
            .style(Style::default().fg(if self.focused {
                Color::White
            } else {
                Color::Gray
            }));
        frame.render_widget(para, area);
    }
}

/// Which of `len` focusable items is active; wraps both ways
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FocusRing {
    index: usize,
    len: usize,
}

impl FocusRing {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is(&self, index: usize) -> bool {
        self.index == index
    }

    pub fn next(&mut self) {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
    }

    pub fn prev(&mut self) {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
    }

    /// Change the item count, clamping the focus
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if self.index >= len {
            self.index = len.saturating_sub(1);
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// Multi-line editor for free-text criteria and questions
pub(crate) struct QueryEditor {
    textarea: TextArea<'static>,
    placeholder: String,
}

impl QueryEditor {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            textarea: TextArea::default(),
            placeholder: placeholder.into(),
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.textarea.lines().iter().all(|l| l.trim().is_empty())
    }

    pub fn input(&mut self, key: KeyEvent) -> bool {
        self.textarea.input(key)
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, title: &str, focused: bool) {
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea.set_cursor_style(if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        });
        self.textarea.set_block(
            Block::default()
                .title(Span::styled(
                    format!(" {title} "),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if focused {
                    Color::Yellow
                } else {
                    Color::DarkGray
                })),
        );
        self.textarea.set_placeholder_text(self.placeholder.clone());
        self.textarea
            .set_placeholder_style(Style::default().fg(Color::DarkGray));

        frame.render_widget(&self.textarea, area);
    }
}
