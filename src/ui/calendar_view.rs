use crate::calc::dates::{format_date, parse_date};
use crate::calc::{CycleMetrics, DayCell, DayOverlay, MonthView, Preset};
use crate::data::{AppSettings, CycleEdit, CycleRecord, Mutation, NewEvent, NewPeriod};
use crate::error::{TrackerError, TrackerResult};
use crate::ui::controller::{Completion, LoadStatus, Mode, ViewController};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyModifiers};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};
use std::future::Future;
use std::io::Stdout;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration as StdDuration;
use tokio::runtime::Handle;
use tracing::debug;

const PERIOD_BG: Color = Color::Red;
const PREDICTED_COLOR: Color = Color::LightRed;
const FERTILE_COLOR: Color = Color::Green;
const EVENT_COLOR: Color = Color::Magenta;
const SECTION_BG: Color = Color::Rgb(40, 44, 52);

/// Width of one day column: day number, gap, markers, gap.
const CELL_WIDTH: usize = 9;
const MARKER_WIDTH: usize = 5;
const GRID_WIDTH: u16 = (CELL_WIDTH * 7) as u16 + 2;

const FORM_LABELS: [&str; 3] = ["Start (YYYY-MM-DD)", "End (YYYY-MM-DD, blank = open)", "Notes"];

pub struct App {
    controller: ViewController,
    settings: AppSettings,
    runtime: Handle,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    today: NaiveDate,
    /// Selected row in the editor table.
    cursor: usize,
    /// 0 = browsing; 1-3 = entering form field N.
    form_stage: u8,
    field_bufs: Vec<String>,
    input_buffer: String,
    /// When Some, the form edits this cycle instead of adding one.
    edit_id: Option<String>,
    /// Cycle waiting for a `y` to confirm deletion.
    pending_delete: Option<String>,
    /// Last status line (message, color). Cleared on the next keypress.
    message: Option<(String, Color)>,
}

impl App {
    /// Builds the app and kicks off the first load.
    pub fn new(controller: ViewController, settings: AppSettings, runtime: Handle, today: NaiveDate) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut app = App {
            controller,
            settings,
            runtime,
            tx,
            rx,
            today,
            cursor: 0,
            form_stage: 0,
            field_bufs: Vec::new(),
            input_buffer: String::new(),
            edit_id: None,
            pending_delete: None,
            message: None,
        };
        app.request_refresh();
        app
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    fn spawn(&self, task: impl Future<Output = Completion> + Send + 'static) {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let completion = task.await;
            if tx.send(completion).is_err() {
                debug!("ui closed before service task finished");
            }
        });
    }

    fn request_refresh(&mut self) {
        if let Some(ticket) = self.controller.begin_refresh() {
            self.spawn(self.controller.refresh_task(ticket));
        }
    }

    fn submit(&mut self, plan: Mutation) {
        match self.controller.begin_submit(&plan) {
            Some(ticket) => {
                self.message = Some((format!("Saving: {}", plan.describe()), Color::Yellow));
                self.spawn(self.controller.submit_task(ticket));
            }
            None => {
                self.message = Some(("Busy; try again once loading finishes".to_string(), Color::Yellow));
            }
        }
    }

    fn submit_preset(&mut self, preset: Preset) {
        match self.controller.plan_preset(preset, self.today) {
            Ok(plan) => self.submit(plan),
            Err(e) => self.message = Some((e.to_string(), Color::Red)),
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        if let Completion::Submitted(ticket, Ok(())) = &completion {
            self.message = Some((format!("Saved: {}", ticket.plan().describe()), Color::Green));
        }
        if let Some(ticket) = self.controller.apply(completion) {
            self.spawn(self.controller.refresh_task(ticket));
        }
        let len = self.controller.cycles().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    /// Applies every finished service call. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply_completion(completion);
            applied += 1;
        }
        applied
    }

    fn quit(&mut self) {
        self.controller.dispose();
    }

    fn selected_cycle(&self) -> Option<&CycleRecord> {
        self.controller.cycles().get(self.cursor)
    }

    /// Returns true when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return true;
        }

        if self.form_stage > 0 {
            self.handle_form_key(code);
            return false;
        }

        if let Some(cycle_id) = self.pending_delete.take() {
            if code == KeyCode::Char('y') {
                self.submit(Mutation::DeleteCycle { cycle_id });
            } else {
                self.message = Some(("Delete cancelled".to_string(), Color::DarkGray));
            }
            return false;
        }

        self.message = None;

        match code {
            KeyCode::Char('q') => {
                self.quit();
                return true;
            }
            KeyCode::Tab => {
                let next = self.controller.mode().toggled();
                self.controller.set_mode(next);
            }
            KeyCode::Char('r') => self.request_refresh(),
            _ => match self.controller.mode() {
                Mode::Calendar => self.handle_calendar_key(code),
                Mode::Editor => self.handle_editor_key(code),
            },
        }
        false
    }

    fn handle_calendar_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('p') => self.controller.set_month_offset(-1),
            KeyCode::Right | KeyCode::Char('n') => self.controller.set_month_offset(1),
            KeyCode::Char('t') => self.controller.set_month_offset(0),
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.cursor + 1 < self.controller.cycles().len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let days = c.to_digit(10).map(i64::from).unwrap_or(0);
                if self.settings.preset_lengths.contains(&days) {
                    self.submit_preset(Preset::FixedLength(days));
                }
            }
            KeyCode::Char('s') => self.submit_preset(Preset::StartToday),
            KeyCode::Char('e') => self.submit_preset(Preset::EndLastToday),
            KeyCode::Char('[') => self.submit_preset(Preset::ShiftLastStart(-1)),
            KeyCode::Char(']') => self.submit_preset(Preset::ShiftLastStart(1)),
            KeyCode::Char('u') => self.submit(Mutation::LogEvent(NewEvent { protected: false, notes: None })),
            KeyCode::Char('U') => self.submit(Mutation::LogEvent(NewEvent { protected: true, notes: None })),
            KeyCode::Char('a') => {
                self.edit_id = None;
                self.field_bufs.clear();
                self.input_buffer.clear();
                self.form_stage = 1;
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_cycle().map(|c| c.id.clone()) {
                    self.edit_id = Some(id);
                    self.field_bufs.clear();
                    self.form_stage = 1;
                    self.input_buffer = self.prefill(1);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some((id, start)) = self.selected_cycle().map(|c| (c.id.clone(), c.start)) {
                    let prompt = format!("Delete period starting {}? (y to confirm)", format_date(start));
                    self.pending_delete = Some(id);
                    self.message = Some((prompt, Color::Yellow));
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.input_buffer.push(c),
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Esc => self.close_form(),
            KeyCode::Enter => {
                if let Err(e) = validate_field(self.form_stage, &self.input_buffer) {
                    self.message = Some((e.to_string(), Color::Red));
                    return;
                }
                self.message = None;
                self.field_bufs.push(std::mem::take(&mut self.input_buffer));

                if self.form_stage as usize == FORM_LABELS.len() {
                    let plan = self.form_plan();
                    self.close_form();
                    match plan {
                        Ok(plan) => self.submit(plan),
                        Err(e) => self.message = Some((e.to_string(), Color::Red)),
                    }
                } else {
                    self.form_stage += 1;
                    self.input_buffer = self.prefill(self.form_stage);
                }
            }
            _ => {}
        }
    }

    /// Existing value of a form field when editing.
    fn prefill(&self, stage: u8) -> String {
        let Some(cycle) = self
            .edit_id
            .as_ref()
            .and_then(|id| self.controller.cycles().iter().find(|c| &c.id == id))
        else {
            return String::new();
        };
        match stage {
            1 => format_date(cycle.start),
            2 => cycle.end.map(format_date).unwrap_or_default(),
            3 => cycle.notes.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn close_form(&mut self) {
        self.form_stage = 0;
        self.edit_id = None;
        self.field_bufs.clear();
        self.input_buffer.clear();
    }

    fn form_plan(&self) -> TrackerResult<Mutation> {
        let field = |i: usize| self.field_bufs.get(i).map(|s| s.trim()).unwrap_or("");
        let start_raw = field(0);
        if start_raw.is_empty() {
            return Err(TrackerError::MissingStart);
        }
        let start = parse_date(start_raw)?;
        let end = match field(1) {
            "" => None,
            raw => Some(parse_date(raw)?),
        };
        let notes_raw = self.field_bufs.get(2).cloned().unwrap_or_default();

        match &self.edit_id {
            None => Ok(NewPeriod {
                start,
                end,
                notes: (!notes_raw.is_empty()).then_some(notes_raw),
            }
            .into()),
            Some(id) => {
                let had_notes = self
                    .controller
                    .cycles()
                    .iter()
                    .any(|c| &c.id == id && c.notes.is_some());
                let notes = (had_notes || !notes_raw.is_empty()).then_some(notes_raw);
                Ok(CycleEdit {
                    cycle_id: id.clone(),
                    start: Some(start),
                    end,
                    notes,
                }
                .into())
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    pub fn render(&self, f: &mut Frame) {
        let footer_height = if self.form_stage > 0 { 6 } else { 3 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(10),
                Constraint::Length(footer_height),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        match self.controller.mode() {
            Mode::Calendar => self.render_calendar(f, chunks[1]),
            Mode::Editor => self.render_editor(f, chunks[1]),
        }
        if self.form_stage > 0 {
            self.render_form(f, chunks[2]);
        } else {
            self.render_help(f, chunks[2]);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let mode = match self.controller.mode() {
            Mode::Calendar => "Calendar",
            Mode::Editor => "Editor",
        };
        let title = Line::from(vec![
            Span::styled(self.settings.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  entry: {}  view: {}", self.controller.entry_id(), mode)),
        ]);
        let status = match (self.controller.status(), &self.message) {
            (LoadStatus::Error(e), _) => Line::from(Span::styled(
                format!("Error: {e}  (r to retry)"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            (_, Some((msg, color))) => Line::from(Span::styled(msg.clone(), Style::default().fg(*color))),
            (LoadStatus::Loading, None) => Line::from(Span::styled("Loading...", Style::default().fg(Color::Yellow))),
            (LoadStatus::Idle, None) => Line::from(""),
        };
        let p = Paragraph::new(vec![title, status]).block(Block::default().borders(Borders::BOTTOM));
        f.render_widget(p, area);
    }

    fn render_calendar(&self, f: &mut Frame, area: Rect) {
        let grid = match self.controller.month_grid(self.today) {
            Ok(grid) => grid,
            Err(e) => {
                f.render_widget(Paragraph::new(format!("Cannot build calendar: {e}")), area);
                return;
            }
        };
        let metrics = self.controller.metrics(self.today);
        let events = self.controller.events_by_day();
        let view = MonthView::assemble(&grid, self.controller.cycles(), &events, Some(&metrics), self.today);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(GRID_WIDTH), Constraint::Min(30)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(15), Constraint::Min(0)])
            .split(columns[0]);

        f.render_widget(month_grid_widget(&view), left[0]);
        f.render_widget(legend_widget(), left[1]);
        self.render_metrics(f, columns[1], &metrics);
    }

    fn render_metrics(&self, f: &mut Frame, area: Rect, m: &CycleMetrics) {
        let date = |d: Option<NaiveDate>| d.map(format_date).unwrap_or_else(|| "-".to_string());
        let window = |w: Option<(NaiveDate, NaiveDate)>| {
            w.map(|(a, b)| format!("{} .. {}", format_date(a), format_date(b)))
                .unwrap_or_else(|| "-".to_string())
        };
        let days = |v: Option<f64>| v.map(|x| format!("{x:.1} days")).unwrap_or_else(|| "-".to_string());

        let risk_cell = match m.risk {
            Some(level) => {
                let color = match level {
                    crate::calc::RiskLevel::High => Color::Red,
                    crate::calc::RiskLevel::Medium => Color::Yellow,
                    crate::calc::RiskLevel::Low => Color::Green,
                };
                colored(m.risk_label.unwrap_or(level.as_str()), color)
            }
            None => plain("-"),
        };

        let rows = vec![
            section_header("Current cycle"),
            data_row("Cycle day", plain(m.cycle_day.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()))),
            data_row("Last period", plain(date(m.last_period_start))),
            data_row("Period ended", plain(date(m.last_period_end))),
            spacer(),
            section_header("Prediction"),
            data_row("Average length", plain(days(m.cycle_length_avg))),
            data_row("Std deviation", plain(days(m.cycle_length_std))),
            data_row("Next period", plain(date(m.next_period))),
            data_row("Ovulation", plain(date(m.ovulation))),
            data_row("Fertile window", plain(window(m.fertile_window))),
            data_row("Implantation", plain(window(m.implantation_window))),
            data_row("Risk today", risk_cell),
        ];
        let table = Table::new(rows, [Constraint::Length(18), Constraint::Min(12)])
            .block(Block::default().borders(Borders::ALL).title(" Metrics "));
        f.render_widget(table, area);
    }

    fn render_editor(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let header = Row::new(vec![
            Cell::from("#").style(bold),
            Cell::from("Start").style(bold),
            Cell::from("End").style(bold),
            Cell::from("Days").style(bold),
            Cell::from("Notes").style(bold),
        ]);

        let rows: Vec<Row> = self
            .controller
            .cycles()
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let length = c
                    .end
                    .map(|end| ((end - c.start).num_days() + 1).to_string())
                    .unwrap_or_else(|| "open".to_string());
                Row::new(vec![
                    Cell::from(format!("{}", i + 1)),
                    Cell::from(format_date(c.start)),
                    Cell::from(c.end.map(format_date).unwrap_or_default()),
                    Cell::from(length),
                    Cell::from(c.notes.clone().unwrap_or_default()),
                ])
            })
            .collect();

        let mut table_state = TableState::default();
        if !self.controller.cycles().is_empty() {
            table_state.select(Some(self.cursor));
        }

        let events = self.controller.snapshot().sex_events.len();
        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(6),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Cycles  ({events} events logged) ")),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_form(&self, f: &mut Frame, area: Rect) {
        let title = if self.edit_id.is_some() { "── Edit Period ──" } else { "── Add Period ──" };
        let mut lines = vec![Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))];
        for (i, label) in FORM_LABELS.iter().enumerate() {
            let stage = (i + 1) as u8;
            let value = if stage < self.form_stage {
                self.field_bufs.get(i).cloned().unwrap_or_default()
            } else if stage == self.form_stage {
                format!("{}_", self.input_buffer)
            } else {
                String::new()
            };
            lines.push(Line::from(format!("{label}: {value}")));
        }
        lines.push(Line::from(Span::styled(
            "Enter=confirm  Esc=cancel",
            Style::default().fg(Color::DarkGray),
        )));
        f.render_widget(Paragraph::new(lines), area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let hint = match self.controller.mode() {
            Mode::Calendar => "←/p prev  →/n next  t today  Tab editor  r refresh  q quit".to_string(),
            Mode::Editor => {
                let presets: Vec<String> = self.settings.preset_lengths.iter().map(|d| d.to_string()).collect();
                format!(
                    "{} preset  s start  e end  [/] shift  u/U log  a add  Enter edit  d delete  Tab calendar  q quit",
                    presets.join("/")
                )
            }
        };
        let p = Paragraph::new(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))))
            .block(Block::default().borders(Borders::TOP));
        f.render_widget(p, area);
    }
}

fn validate_field(stage: u8, raw: &str) -> TrackerResult<()> {
    let raw = raw.trim();
    match stage {
        1 if raw.is_empty() => Err(TrackerError::MissingStart),
        1 => parse_date(raw).map(|_| ()),
        2 if raw.is_empty() => Ok(()),
        2 => parse_date(raw).map(|_| ()),
        _ => Ok(()),
    }
}

// ── Calendar helpers ──────────────────────────────────────────────────────────

fn month_grid_widget<'a>(view: &MonthView<'_>) -> Paragraph<'a> {
    let mut lines: Vec<Line> = Vec::new();
    let header: String = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
        .iter()
        .map(|d| format!("{d:<width$}", width = CELL_WIDTH))
        .collect();
    lines.push(Line::from(Span::styled(header, Style::default().add_modifier(Modifier::BOLD))));

    for week in view.weeks() {
        let mut spans = Vec::new();
        for cell in week {
            let markers = event_markers(&cell.events);
            spans.push(Span::styled(format!("{:>2}", cell.date.day()), day_cell_style(cell)));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!("{markers:<width$}", width = MARKER_WIDTH),
                Style::default().fg(EVENT_COLOR),
            ));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }

    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", view.title))
            .title_style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)),
    )
}

fn legend_widget() -> Paragraph<'static> {
    Paragraph::new(vec![Line::from(vec![
        Span::styled(" 1 ", Style::default().fg(Color::White).bg(PERIOD_BG)),
        Span::raw(" period  "),
        Span::styled(" 1 ", Style::default().fg(PREDICTED_COLOR)),
        Span::raw(" predicted  "),
        Span::styled(" 1 ", Style::default().fg(FERTILE_COLOR)),
        Span::raw(" fertile  "),
        Span::styled("•", Style::default().fg(EVENT_COLOR)),
        Span::raw(" event  "),
        Span::styled(" 1 ", Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(" today"),
    ])])
}

/// Style for one day number in the month grid.
pub(crate) fn day_cell_style(cell: &DayCell) -> Style {
    let mut style = if cell.is_period {
        Style::default().fg(Color::White).bg(PERIOD_BG)
    } else if cell.is_ovulation {
        Style::default()
            .fg(FERTILE_COLOR)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else if cell.is_fertile {
        Style::default().fg(FERTILE_COLOR)
    } else if cell.is_predicted_period {
        Style::default().fg(PREDICTED_COLOR)
    } else {
        Style::default()
    };
    if !cell.in_month {
        style = style.add_modifier(Modifier::DIM);
    }
    if cell.is_today {
        style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
    }
    style
}

/// One dot per visible event plus the "+N" overflow label.
pub(crate) fn event_markers(overlay: &DayOverlay) -> String {
    let mut out = "•".repeat(overlay.shown.len());
    if let Some(label) = overlay.overflow_label() {
        out.push_str(&label);
    }
    out
}

// ── Row construction helpers ──────────────────────────────────────────────────

fn section_header(title: &str) -> Row<'static> {
    Row::new(vec![
        Cell::from(title.to_string()).style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Cell::from(""),
    ])
    .style(Style::default().bg(SECTION_BG))
}

fn spacer() -> Row<'static> {
    Row::new(vec![Cell::from(""), Cell::from("")])
}

fn data_row(metric: impl Into<String>, value: Cell<'static>) -> Row<'static> {
    Row::new(vec![Cell::from(format!("  {}", metric.into())), value])
}

fn plain(s: impl Into<String>) -> Cell<'static> {
    Cell::from(s.into())
}

fn colored(s: impl Into<String>, color: Color) -> Cell<'static> {
    Cell::from(s.into()).style(Style::default().fg(color))
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.pump();
        app.set_today(crate::calc::dates::today());
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(50))? {
            if let CEvent::Key(key) = event::read()? {
                if app.handle_key(key.code, key.modifiers) {
                    break;
                }
            }
        }
    }
    app.quit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PointEvent;
    use crate::service::{DataService, LocalService};
    use chrono::DateTime;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::runtime::Runtime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn key(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code, KeyModifiers::empty())
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            key(app, KeyCode::Char(c));
        }
    }

    /// Waits for in-flight service calls and applies them.
    fn settle(app: &mut App) {
        while app.controller.is_loading() {
            let completion = app
                .rx
                .recv_timeout(StdDuration::from_secs(5))
                .expect("service task did not finish");
            app.apply_completion(completion);
        }
    }

    fn make_test_app(periods: &[(NaiveDate, Option<NaiveDate>)]) -> (TempDir, Runtime, App) {
        let tmp = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let service = LocalService::open(tmp.path()).unwrap();
        rt.block_on(async {
            service.create_entry("e", "Test").await.unwrap();
            for (start, end) in periods {
                service
                    .add_period("e", NewPeriod { start: *start, end: *end, notes: None })
                    .await
                    .unwrap();
            }
        });
        let service: Arc<dyn DataService> = Arc::new(service);
        let controller = ViewController::new(service, "e");
        let mut app = App::new(controller, AppSettings::default(), rt.handle().clone(), d(2025, 9, 10));
        settle(&mut app);
        (tmp, rt, app)
    }

    fn cell(date: NaiveDate) -> DayCell<'static> {
        DayCell {
            date,
            in_month: true,
            is_today: false,
            is_period: false,
            is_fertile: false,
            is_ovulation: false,
            is_predicted_period: false,
            events: DayOverlay::default(),
        }
    }

    // ── day_cell_style / event_markers ────────────────────────────────────────

    #[test]
    fn test_style_period_day() {
        let c = DayCell { is_period: true, ..cell(d(2025, 9, 1)) };
        assert_eq!(day_cell_style(&c), Style::default().fg(Color::White).bg(PERIOD_BG));
    }

    #[test]
    fn test_style_out_of_month_is_dim() {
        let c = DayCell { in_month: false, ..cell(d(2025, 8, 31)) };
        assert_eq!(day_cell_style(&c), Style::default().add_modifier(Modifier::DIM));
    }

    #[test]
    fn test_style_today_reversed_over_fertile() {
        let c = DayCell { is_today: true, is_fertile: true, ..cell(d(2025, 9, 10)) };
        assert_eq!(
            day_cell_style(&c),
            Style::default()
                .fg(FERTILE_COLOR)
                .add_modifier(Modifier::REVERSED | Modifier::BOLD)
        );
    }

    #[test]
    fn test_event_markers_truncate_with_overflow() {
        let ts = DateTime::parse_from_rfc3339("2025-09-01T10:00:00+00:00").unwrap();
        let events: Vec<PointEvent> = (0..5).map(|_| PointEvent::new(ts, false, None)).collect();
        let refs: Vec<&PointEvent> = events.iter().collect();
        assert_eq!(event_markers(&DayOverlay::from_events(&refs)), "•••+2");
        assert_eq!(event_markers(&DayOverlay::from_events(&refs[..2])), "••");
        assert_eq!(event_markers(&DayOverlay::default()), "");
    }

    #[test]
    fn test_validate_field() {
        assert_eq!(validate_field(1, "  "), Err(TrackerError::MissingStart));
        assert!(validate_field(1, "2025-09-01").is_ok());
        assert!(matches!(validate_field(1, "2025-9-1"), Err(TrackerError::InvalidDate(_))));
        assert!(validate_field(2, "").is_ok());
        assert!(validate_field(2, "nope").is_err());
        assert!(validate_field(3, "anything").is_ok());
    }

    // ── handle_key ────────────────────────────────────────────────────────────

    #[test]
    fn test_q_returns_true_and_disposes() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        assert!(key(&mut app, KeyCode::Char('q')));
        assert!(app.controller.is_disposed());
    }

    #[test]
    fn test_ctrl_c_returns_true() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_tab_toggles_mode() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Tab);
        assert_eq!(app.controller.mode(), Mode::Editor);
        key(&mut app, KeyCode::Tab);
        assert_eq!(app.controller.mode(), Mode::Calendar);
    }

    #[test]
    fn test_month_navigation_keys() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Right);
        key(&mut app, KeyCode::Char('n'));
        assert_eq!(app.controller.month_offset(), 2);
        key(&mut app, KeyCode::Left);
        key(&mut app, KeyCode::Char('p'));
        key(&mut app, KeyCode::Char('p'));
        assert_eq!(app.controller.month_offset(), -1);
        key(&mut app, KeyCode::Char('t'));
        assert_eq!(app.controller.month_offset(), 0);
    }

    #[test]
    fn test_initial_load_fills_snapshot() {
        let (_tmp, _rt, app) = make_test_app(&[(d(2025, 8, 12), Some(d(2025, 8, 16)))]);
        assert_eq!(app.controller.cycles().len(), 1);
        assert_eq!(app.controller.status(), &LoadStatus::Idle);
    }

    #[test]
    fn test_fixed_length_preset_key() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('5'));
        settle(&mut app);
        let cycles = app.controller.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].start, d(2025, 9, 10));
        assert_eq!(cycles[0].end, Some(d(2025, 9, 14)));
        assert_eq!(cycles[0].notes.as_deref(), Some("Preset 5d"));
    }

    #[test]
    fn test_unconfigured_digit_does_nothing() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('7'));
        assert!(!app.controller.is_loading());
        assert!(app.controller.cycles().is_empty());
    }

    #[test]
    fn test_end_last_today_without_cycles_shows_message() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('e'));
        assert!(!app.controller.is_loading());
        let (msg, color) = app.message.clone().unwrap();
        assert_eq!(msg, TrackerError::NoActiveCycle.to_string());
        assert_eq!(color, Color::Red);
    }

    #[test]
    fn test_start_then_end_today() {
        let (_tmp, _rt, mut app) = make_test_app(&[(d(2025, 8, 12), Some(d(2025, 8, 16)))]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('s'));
        settle(&mut app);
        key(&mut app, KeyCode::Char('e'));
        settle(&mut app);
        let last = app.controller.cycles().last().unwrap();
        assert_eq!(last.start, d(2025, 9, 10));
        assert_eq!(last.end, Some(d(2025, 9, 10)));
        assert_eq!(last.notes.as_deref(), Some("Started today"));
    }

    #[test]
    fn test_shift_last_start_keys() {
        let (_tmp, _rt, mut app) = make_test_app(&[(d(2025, 9, 1), None)]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('['));
        settle(&mut app);
        assert_eq!(app.controller.cycles()[0].start, d(2025, 8, 31));
        key(&mut app, KeyCode::Char(']'));
        settle(&mut app);
        key(&mut app, KeyCode::Char(']'));
        settle(&mut app);
        assert_eq!(app.controller.cycles()[0].start, d(2025, 9, 2));
    }

    #[test]
    fn test_log_event_keys() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('u'));
        settle(&mut app);
        key(&mut app, KeyCode::Char('U'));
        settle(&mut app);
        let events = &app.controller.snapshot().sex_events;
        assert_eq!(events.len(), 2);
        assert!(!events[0].protected);
        assert!(events[1].protected);
    }

    #[test]
    fn test_add_form_rejects_empty_start() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('a'));
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.form_stage, 1);
        assert_eq!(app.message.as_ref().map(|(m, _)| m.clone()), Some(TrackerError::MissingStart.to_string()));
        assert!(!app.controller.is_loading());
    }

    #[test]
    fn test_add_form_creates_period() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "2025-09-01");
        key(&mut app, KeyCode::Enter);
        type_str(&mut app, "2025-09-04");
        key(&mut app, KeyCode::Enter);
        type_str(&mut app, "light");
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.form_stage, 0);
        settle(&mut app);
        let c = &app.controller.cycles()[0];
        assert_eq!(c.start, d(2025, 9, 1));
        assert_eq!(c.end, Some(d(2025, 9, 4)));
        assert_eq!(c.notes.as_deref(), Some("light"));
    }

    #[test]
    fn test_add_form_esc_discards() {
        let (_tmp, _rt, mut app) = make_test_app(&[]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "2025-09-01");
        key(&mut app, KeyCode::Esc);
        assert_eq!(app.form_stage, 0);
        assert!(app.input_buffer.is_empty());
        assert!(!app.controller.is_loading());
    }

    #[test]
    fn test_edit_form_prefills_and_updates() {
        let (_tmp, _rt, mut app) = make_test_app(&[(d(2025, 9, 1), None)]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.input_buffer, "2025-09-01");
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.input_buffer, "");
        type_str(&mut app, "2025-09-05");
        key(&mut app, KeyCode::Enter);
        key(&mut app, KeyCode::Enter);
        settle(&mut app);
        let c = &app.controller.cycles()[0];
        assert_eq!(c.start, d(2025, 9, 1));
        assert_eq!(c.end, Some(d(2025, 9, 5)));
        assert_eq!(c.notes, None);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let (_tmp, _rt, mut app) = make_test_app(&[(d(2025, 8, 1), None), (d(2025, 9, 1), None)]);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('d'));
        key(&mut app, KeyCode::Char('n'));
        assert!(!app.controller.is_loading());
        assert_eq!(app.controller.cycles().len(), 2);

        key(&mut app, KeyCode::Down);
        key(&mut app, KeyCode::Char('d'));
        key(&mut app, KeyCode::Char('y'));
        settle(&mut app);
        let cycles = app.controller.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].start, d(2025, 8, 1));
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_render_both_modes() {
        let (_tmp, _rt, mut app) =
            make_test_app(&[(d(2025, 7, 14), Some(d(2025, 7, 18))), (d(2025, 8, 12), Some(d(2025, 8, 16)))]);
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Char('a'));
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
