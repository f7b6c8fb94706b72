use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::{render_chrome, step_index, Route, Transition};
use crate::app::AppContext;
use crate::flows::activation::group_thousands;
use crate::flows::audience::{QUERY, SEGMENT_NAME, AUDIENCE_STEPS};
use crate::flows::{AudienceFlow, SegmentBuilder};
use crate::store::CacheEntry;
use crate::ui::form_field::{edit_field, FocusRing, InputView, QueryEditor, INPUT_HEIGHT};
use crate::ui::modal::{centered_rect, key_hints, render_error_banner};
use crate::ui::stepper::render_stepper;
use crate::wizard::step_views;

const CRITERIA_PLACEHOLDER: &str = "Customers with $500+ in sales over the last year";

/// Editor state of the open builder popup
struct BuilderPane {
    editor: QueryEditor,
    /// 0 = criteria, 1 = name
    focus: FocusRing,
}

impl BuilderPane {
    fn new() -> Self {
        Self {
            editor: QueryEditor::new(CRITERIA_PLACEHOLDER),
            focus: FocusRing::new(2),
        }
    }
}

pub struct AudienceScreen {
    flow: AudienceFlow,
    state: TableState,
    pane: Option<BuilderPane>,
}

impl AudienceScreen {
    pub fn new() -> Self {
        let mut state = TableState::default();
        state.select(Some(0));
        Self {
            flow: AudienceFlow::new(),
            state,
            pane: None,
        }
    }

    pub async fn load(&mut self, ctx: &mut AppContext) {
        let _ = self.flow.refresh(ctx.gateway.as_ref()).await;
    }

    pub async fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        if self.pane.is_some() {
            self.builder_key(key, ctx).await;
            return Transition::Stay;
        }

        let len = self.flow.entries().len();
        match key.code {
            KeyCode::Esc => return Transition::Go(Route::Menu),
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.select(step_index(self.state.selected(), len, true));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.select(step_index(self.state.selected(), len, false));
            }
            KeyCode::Char(' ') => {
                if let Some(index) = self.state.selected() {
                    self.flow.toggle(index);
                }
            }
            KeyCode::Char('n') => {
                self.flow.open_builder();
                self.pane = Some(BuilderPane::new());
            }
            KeyCode::Char('r') => self.load(ctx).await,
            KeyCode::Enter if self.flow.can_activate() => return Transition::Go(Route::Activation),
            _ => {}
        }
        Transition::Stay
    }

    async fn builder_key(&mut self, key: KeyEvent, ctx: &mut AppContext) {
        let (Some(pane), Some(builder)) = (self.pane.as_mut(), self.flow.builder_mut()) else {
            self.pane = None;
            return;
        };

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.flow.close_builder();
                self.pane = None;
            }
            KeyCode::Tab | KeyCode::BackTab => pane.focus.next(),
            KeyCode::Char('p') if ctrl => {
                builder.wizard_mut().set_field(QUERY.name, pane.editor.text());
                builder.run_preview(ctx.gateway.as_ref()).await;
            }
            KeyCode::Char('s') if ctrl => {
                if self.flow.save_segment(ctx.gateway.as_ref()).await {
                    self.pane = None;
                    self.state.select(Some(0));
                }
            }
            code if pane.focus.is(1) => {
                edit_field(builder.wizard_mut(), SEGMENT_NAME.name, code);
            }
            _ => {
                pane.editor.input(key);
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chrome = render_chrome(
            frame,
            "Audience",
            &[
                ("Space", "Select"),
                ("n", "New segment"),
                ("Enter", "Go to activation"),
                ("r", "Refresh"),
                ("Esc", "Home"),
            ],
        );
        render_stepper(frame, chrome.header, &step_views(&AUDIENCE_STEPS, 1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(chrome.body);

        if self.flow.entries().is_empty() {
            frame.render_widget(
                Paragraph::new("No segments yet. Press [n] to build one."),
                chunks[0],
            );
        } else {
            self.render_table(frame, chunks[0]);
        }

        let selected = self.flow.selected_segments().len();
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    format!("{selected} selected"),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(" • "),
                Span::styled(
                    format!("Total audience: {}", group_thousands(self.flow.total_count())),
                    Style::default().fg(Color::Cyan),
                ),
            ])),
            chunks[1],
        );

        render_error_banner(frame, chrome.status, self.flow.error());

        if let (Some(pane), Some(builder)) = (self.pane.as_mut(), self.flow.builder()) {
            render_builder(frame, pane, builder);
        }
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .flow
            .entries()
            .iter()
            .map(|entry| {
                let segment = entry.record();
                let (mark, style) = match entry {
                    CacheEntry::Pending { .. } => (
                        "…",
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    ),
                    CacheEntry::Confirmed(s) if self.flow.is_selected(&s.id) => {
                        ("[x]", Style::default().fg(Color::Green))
                    }
                    CacheEntry::Confirmed(_) => ("[ ]", Style::default()),
                };
                Row::new(vec![
                    Cell::from(mark),
                    Cell::from(segment.name.clone()),
                    Cell::from(group_thousands(segment.count)),
                    Cell::from(segment.description.clone()),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Percentage(30),
                Constraint::Length(10),
                Constraint::Min(10),
            ],
        )
        .header(
            Row::new(vec!["", "Segment", "Count", "Description"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .row_highlight_style(Style::default().fg(Color::Cyan))
        .highlight_symbol("> ");
        frame.render_stateful_widget(table, area, &mut self.state);
    }
}

fn render_builder(frame: &mut Frame, pane: &mut BuilderPane, builder: &SegmentBuilder) {
    let area = centered_rect(80, 80, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(
            " Build a segment ",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(6),            // Criteria
            Constraint::Length(INPUT_HEIGHT), // Name
            Constraint::Min(4),               // Insights
            Constraint::Length(2),            // Error
            Constraint::Length(1),            // Hints
        ])
        .split(inner);

    let wizard = builder.wizard();
    pane.editor
        .render(frame, chunks[0], QUERY.label, pane.focus.is(0));
    InputView::new(SEGMENT_NAME, wizard.draft().get(SEGMENT_NAME.name))
        .focused(pane.focus.is(1))
        .placeholder("Generated from the criteria when left empty")
        .render(frame, chunks[1]);

    let insights: Vec<Line> = if builder.is_previewing() {
        vec![Line::from(Span::styled(
            "Creating segment…",
            Style::default().fg(Color::Yellow),
        ))]
    } else if let Some(preview) = builder.preview() {
        vec![
            Line::from(vec![
                Span::styled("Audience size: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    group_thousands(preview.count),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Description: ", Style::default().fg(Color::Gray)),
                Span::raw(preview.description.clone()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                preview.generated_sql.clone(),
                Style::default().fg(Color::Green),
            )),
        ]
    } else {
        vec![Line::from(Span::styled(
            "Describe who you want to reach, then press Ctrl+P to preview.",
            Style::default().fg(Color::DarkGray),
        ))]
    };
    frame.render_widget(
        Paragraph::new(insights)
            .block(
                Block::default()
                    .title(" Insights ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .wrap(Wrap { trim: false }),
        chunks[2],
    );

    let error = wizard
        .error()
        .map(str::to_string)
        .or_else(|| wizard.field_error(QUERY.name).map(ToString::to_string));
    render_error_banner(frame, chunks[3], error.as_deref());

    let save = if builder.can_save() {
        "Save segment"
    } else {
        "Save (preview first)"
    };
    frame.render_widget(
        Paragraph::new(key_hints(&[
            ("Tab", "Switch field"),
            ("Ctrl+P", "Create my segment"),
            ("Ctrl+S", save),
            ("Esc", "Close"),
        ])),
        chunks[4],
    );
}
