//! Activation wizard: audience → destination → schedule → finalize

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{blocked_notice, render_chrome, step_index, Route, Transition};
use crate::app::AppContext;
use crate::flows::activation::{group_thousands, AUDIENCES};
use crate::flows::{ActivationFlow, Destination, ScheduleKind};
use crate::ui::form_field::{edit_field, FocusRing, InputView, INPUT_HEIGHT};
use crate::ui::modal::{render_error_banner, SuccessModal};
use crate::ui::stepper::render_stepper;

/// Rows of the schedule step, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduleRow {
    Kind,
    EveryDays,
    Hour,
    Minute,
    Meridiem,
    ExcludePrevious,
}

const SCHEDULE_ROWS: [ScheduleRow; 6] = [
    ScheduleRow::Kind,
    ScheduleRow::EveryDays,
    ScheduleRow::Hour,
    ScheduleRow::Minute,
    ScheduleRow::Meridiem,
    ScheduleRow::ExcludePrevious,
];

pub struct ActivationScreen {
    flow: ActivationFlow,
    audience_state: ListState,
    destination_state: ListState,
    /// Step 2: 0 is the destination list, then its config fields
    field_focus: FocusRing,
    /// Step 3: index into `SCHEDULE_ROWS`
    schedule_focus: FocusRing,
    notice: Option<String>,
}

impl ActivationScreen {
    pub fn new() -> Self {
        let flow = ActivationFlow::new();
        let mut audience_state = ListState::default();
        audience_state.select(flow.wizard().selection().copied());
        let mut destination_state = ListState::default();
        destination_state.select(Some(0));
        Self {
            flow,
            audience_state,
            destination_state,
            field_focus: FocusRing::new(1),
            schedule_focus: FocusRing::new(SCHEDULE_ROWS.len()),
            notice: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Transition {
        if self.flow.wizard().is_complete() {
            return match key.code {
                KeyCode::Enter => Transition::Go(Route::History),
                KeyCode::Esc => Transition::Go(Route::Menu),
                _ => Transition::Stay,
            };
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('x') {
            self.flow.cancel();
            self.audience_state.select(Some(0));
            self.destination_state.select(Some(0));
            self.field_focus = FocusRing::new(1);
            self.schedule_focus.reset();
            self.notice = None;
            return Transition::Stay;
        }

        match key.code {
            KeyCode::Esc => {
                self.notice = None;
                if !self.flow.back() {
                    return Transition::Go(Route::Audience);
                }
            }
            KeyCode::Enter => {
                if self.flow.wizard().step() == 1 {
                    if let Some(index) = self.audience_state.selected() {
                        self.flow.select_audience(index);
                    }
                }
                let advance = self.flow.proceed(&mut ctx.store);
                self.notice = blocked_notice(&advance);
            }
            code => match self.flow.wizard().step() {
                1 => self.audience_key(code),
                2 => self.destination_key(code),
                3 => self.schedule_key(code),
                _ => {}
            },
        }
        Transition::Stay
    }

    fn audience_key(&mut self, code: KeyCode) {
        let forward = match code {
            KeyCode::Down | KeyCode::Char('j') => true,
            KeyCode::Up | KeyCode::Char('k') => false,
            _ => return,
        };
        let next = step_index(self.audience_state.selected(), AUDIENCES.len(), forward);
        self.audience_state.select(next);
        if let Some(index) = next {
            self.flow.select_audience(index);
        }
    }

    fn destination_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Tab => return self.field_focus.next(),
            KeyCode::BackTab => return self.field_focus.prev(),
            _ => {}
        }

        if self.field_focus.index() > 0 {
            let Some(destination) = self.flow.destination() else {
                return;
            };
            let field = destination.config_fields()[self.field_focus.index() - 1];
            edit_field(self.flow.wizard_mut(), field.name, code);
            return;
        }

        let next = match code {
            KeyCode::Down | KeyCode::Char('j') => {
                step_index(self.destination_state.selected(), Destination::ALL.len(), true)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                step_index(self.destination_state.selected(), Destination::ALL.len(), false)
            }
            KeyCode::Char(' ') => self.destination_state.selected(),
            _ => return,
        };
        self.destination_state.select(next);
        if let Some(destination) = next.and_then(|i| Destination::ALL.get(i)) {
            self.flow.select_destination(*destination);
            self.field_focus.resize(1 + destination.config_fields().len());
        }
    }

    fn schedule_key(&mut self, code: KeyCode) {
        let forward = match code {
            KeyCode::Down | KeyCode::Tab => return self.schedule_focus.next(),
            KeyCode::Up | KeyCode::BackTab => return self.schedule_focus.prev(),
            KeyCode::Right | KeyCode::Char('+' | 'l') => true,
            KeyCode::Left | KeyCode::Char('-' | 'h') => false,
            KeyCode::Char(' ') => true,
            _ => return,
        };

        let row = SCHEDULE_ROWS[self.schedule_focus.index()];
        if row == ScheduleRow::ExcludePrevious {
            self.flow.toggle_exclude_previous();
            return;
        }
        let schedule = self.flow.schedule_mut();
        match row {
            ScheduleRow::Kind => {
                schedule.kind = if forward {
                    schedule.kind.next()
                } else {
                    schedule.kind.next().next()
                };
            }
            ScheduleRow::EveryDays if schedule.kind == ScheduleKind::Every => {
                let days = schedule.every_days();
                schedule.set_every_days(if forward { days + 1 } else { days - 1 });
            }
            ScheduleRow::Hour => schedule.time.shift_hour(forward),
            ScheduleRow::Minute => schedule.time.shift_minute(forward),
            ScheduleRow::Meridiem => schedule.time.toggle_meridiem(),
            _ => {}
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let hints: &[(&str, &str)] = match self.flow.wizard().step() {
            1 => &[("↑/↓", "Choose"), ("Enter", "Next"), ("Esc", "Back")],
            2 => &[
                ("↑/↓", "Choose"),
                ("Tab", "Settings"),
                ("Enter", "Next"),
                ("Esc", "Back"),
                ("Ctrl+X", "Cancel"),
            ],
            3 => &[
                ("↑/↓", "Row"),
                ("←/→", "Change"),
                ("Enter", "Next"),
                ("Esc", "Back"),
                ("Ctrl+X", "Cancel"),
            ],
            _ => &[
                ("Enter", "Start Campaign"),
                ("Esc", "Back"),
                ("Ctrl+X", "Cancel"),
            ],
        };
        let chrome = render_chrome(frame, "Activation", hints);
        render_stepper(frame, chrome.header, &self.flow.wizard().step_views());

        match self.flow.wizard().step() {
            1 => self.render_audience_step(frame, chrome.body),
            2 => self.render_destination_step(frame, chrome.body),
            3 => self.render_schedule_step(frame, chrome.body),
            _ => self.render_finalize_step(frame, chrome.body),
        }

        let status = self
            .flow
            .wizard()
            .error()
            .map(str::to_string)
            .or_else(|| self.notice.clone());
        render_error_banner(frame, chrome.status, status.as_deref());

        if let Some(message) = self.flow.completion_message() {
            SuccessModal {
                title: "Activation finalized",
                message: &message,
                primary: "View history",
                secondary: Some("Home"),
            }
            .render(frame);
        }
    }

    // ─── Step rendering ─────────────────────────────────────────────────────

    fn render_audience_step(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = AUDIENCES
            .iter()
            .map(|option| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        option.audience,
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!("  {} • {} people", option.segment, group_thousands(option.count)),
                        Style::default().fg(Color::Gray),
                    )),
                ])
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().title(" Target audience ").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Cyan))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut self.audience_state);
    }

    fn render_destination_step(&mut self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let chosen = self.flow.destination();
        let items: Vec<ListItem> = Destination::ALL
            .iter()
            .map(|d| {
                let mark = if chosen == Some(*d) { "(•)" } else { "( )" };
                ListItem::new(format!("{mark} {}", d.name()))
            })
            .collect();
        let list_border = if self.field_focus.is(0) {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Destination ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(list_border)),
            )
            .highlight_style(Style::default().fg(Color::Cyan))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, columns[0], &mut self.destination_state);

        let Some(destination) = chosen else {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "Pick where this audience should be sent.",
                    Style::default().fg(Color::DarkGray),
                )),
                columns[1],
            );
            return;
        };

        let fields = destination.config_fields();
        if fields.is_empty() {
            frame.render_widget(
                Paragraph::new(format!("{destination} needs no extra settings.")),
                columns[1],
            );
            return;
        }
        let mut constraints: Vec<Constraint> = fields
            .iter()
            .map(|_| Constraint::Length(INPUT_HEIGHT))
            .collect();
        constraints.push(Constraint::Min(0));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(columns[1]);
        let draft = self.flow.wizard().draft();
        for (i, field) in fields.iter().enumerate() {
            InputView::new(*field, draft.get(field.name))
                .focused(self.field_focus.is(i + 1))
                .render(frame, rows[i]);
        }
    }

    fn render_schedule_step(&self, frame: &mut Frame, area: Rect) {
        let schedule = self.flow.schedule();
        let every = if schedule.kind == ScheduleKind::Every {
            format!("{} day(s)", schedule.every_days())
        } else {
            "n/a".to_string()
        };
        let exclude = if self.flow.exclude_previous() { "[x]" } else { "[ ]" };
        let time = schedule.time.to_string();
        let (clock, meridiem) = time.split_at(5);

        let values = [
            schedule.kind.label().to_string(),
            every,
            clock[..2].to_string(),
            clock[3..].to_string(),
            meridiem.trim().to_string(),
            format!("{exclude} Exclude previous recipients"),
        ];
        let labels = ["Frequency", "Every", "Hour", "Minute", "AM/PM", "Recipients"];

        let mut lines: Vec<Line> = labels
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (label, value))| {
                let focused = self.schedule_focus.is(i);
                let marker = if focused { "> " } else { "  " };
                let value_style = if focused {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(format!("{label:<12}"), Style::default().fg(Color::Gray)),
                    Span::styled(value, value_style),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Runs: ", Style::default().fg(Color::Gray)),
            Span::styled(
                schedule.describe(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));

        frame.render_widget(
            Paragraph::new(lines).block(Block::default().title(" Schedule ").borders(Borders::ALL)),
            area,
        );
    }

    fn render_finalize_step(&self, frame: &mut Frame, area: Rect) {
        let Some(summary) = self.flow.summary() else {
            return;
        };
        let row = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{label:<14}"), Style::default().fg(Color::Gray)),
                Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
            ])
        };
        let lines = vec![
            row("Audience", format!("{} • {}", summary.audience, summary.segment)),
            row("Size", group_thousands(summary.count)),
            row("Destination", summary.destination),
            row("Schedule", summary.schedule),
            row(
                "Recipients",
                if summary.exclude_previous {
                    "Excluding previous recipients".to_string()
                } else {
                    "Everyone in the audience".to_string()
                },
            ),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().title(" Summary ").borders(Borders::ALL)),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::render_to_string;

    fn press(screen: &mut ActivationScreen, ctx: &mut AppContext, code: KeyCode) -> Transition {
        screen.handle_key(KeyEvent::from(code), ctx)
    }

    #[test]
    fn test_walkthrough_writes_history() {
        let mut ctx = AppContext::offline();
        let mut screen = ActivationScreen::new();

        press(&mut screen, &mut ctx, KeyCode::Enter);
        assert_eq!(screen.flow.wizard().step(), 2);

        // Destination is required
        press(&mut screen, &mut ctx, KeyCode::Enter);
        assert_eq!(screen.flow.wizard().step(), 2);
        assert!(screen.notice.is_some());

        press(&mut screen, &mut ctx, KeyCode::Char(' '));
        assert_eq!(screen.flow.destination(), Some(Destination::SendGrid));
        press(&mut screen, &mut ctx, KeyCode::Enter);
        assert_eq!(screen.flow.wizard().step(), 3);

        // Frequency → Every, then bump the interval to 2
        press(&mut screen, &mut ctx, KeyCode::Right);
        press(&mut screen, &mut ctx, KeyCode::Down);
        press(&mut screen, &mut ctx, KeyCode::Right);
        assert_eq!(screen.flow.schedule().describe(), "Every 2 day(s) at 03:00 AM");
        press(&mut screen, &mut ctx, KeyCode::Enter);

        let text = render_to_string(120, 40, |frame| screen.render(frame));
        assert!(text.contains("SendGrid"));
        assert!(text.contains("Every 2 day(s) at 03:00 AM"));

        press(&mut screen, &mut ctx, KeyCode::Enter);
        assert!(screen.flow.wizard().is_complete());
        let history = ctx.store.activation_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].channel, "SendGrid");

        let text = render_to_string(120, 40, |frame| screen.render(frame));
        assert!(text.contains("Your activation has been finalized."));
        assert_eq!(
            press(&mut screen, &mut ctx, KeyCode::Enter),
            Transition::Go(Route::History)
        );
    }

    #[test]
    fn test_config_fields_follow_destination() {
        let mut ctx = AppContext::offline();
        let mut screen = ActivationScreen::new();
        press(&mut screen, &mut ctx, KeyCode::Enter);

        press(&mut screen, &mut ctx, KeyCode::Char(' '));
        press(&mut screen, &mut ctx, KeyCode::Tab);
        for c in "mail.acme.io".chars() {
            press(&mut screen, &mut ctx, KeyCode::Char(c));
        }
        assert_eq!(screen.flow.wizard().draft().get("sg_domain"), "mail.acme.io");

        // Braze has no settings, so Tab stays on the list
        press(&mut screen, &mut ctx, KeyCode::BackTab);
        for _ in 0..4 {
            press(&mut screen, &mut ctx, KeyCode::Down);
        }
        assert_eq!(screen.flow.destination(), Some(Destination::Braze));
        press(&mut screen, &mut ctx, KeyCode::Tab);
        assert!(screen.field_focus.is(0));
    }

    #[test]
    fn test_escape_walks_back_then_leaves() {
        let mut ctx = AppContext::offline();
        let mut screen = ActivationScreen::new();
        press(&mut screen, &mut ctx, KeyCode::Enter);
        assert_eq!(press(&mut screen, &mut ctx, KeyCode::Esc), Transition::Stay);
        assert_eq!(screen.flow.wizard().step(), 1);
        assert_eq!(
            press(&mut screen, &mut ctx, KeyCode::Esc),
            Transition::Go(Route::Audience)
        );
    }
}
