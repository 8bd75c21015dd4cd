use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row as TableRow, Table, TableState, Wrap},
};
use std::io::stdout;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::adapter::GridAdapter;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::export::{self, ExportFormat, ExportOptions};
use crate::grid::{GridEvent, GridWidget};
use crate::models::{Application, ColumnFilter};
use crate::store::RecordStore;
use crate::url_state::MemoryLocation;
use crate::view_model::{ColumnSpec, column_definitions, project, summarize, visible_rows};
use crate::view_state::{ViewState, ViewStatePatch, ViewStateStore};

const IDLE_POLL: Duration = Duration::from_millis(250);
const PAGE_SIZES: [usize; 4] = [10, 20, 50, 100];
const RESIZE_STEP: u16 = 2;
const ALL_HIDDEN: &str = "All columns are hidden. Press U to show them.";

enum Mode {
    Normal,
    Search,
    Filter { col_id: String, input: String },
}

enum Flow {
    Continue,
    Quit,
}

struct AppState {
    records: RecordStore,
    store: ViewStateStore<MemoryLocation>,
    grid: GridWidget,
    adapter: GridAdapter,
    search: Debouncer<String>,
    search_input: String,
    mode: Mode,
    cursor: usize,
    focus: usize,
    scroll_offset: u16,
    status: Option<String>,
    last_export: Option<ExportFormat>,
    export_options: ExportOptions,
    export_dir: PathBuf,
    render_failed: bool,
}

impl AppState {
    fn new(records: RecordStore, store: ViewStateStore<MemoryLocation>, config: &Config) -> Self {
        let search_input = store.get_state().search_query.clone();
        let mut state = Self {
            records,
            store,
            grid: GridWidget::new(Vec::new()),
            adapter: GridAdapter::new(config.resize_debounce()),
            search: Debouncer::new(config.search_debounce()),
            search_input,
            mode: Mode::Normal,
            cursor: 0,
            focus: 0,
            scroll_offset: 0,
            status: None,
            last_export: None,
            export_options: ExportOptions {
                report_rows_per_page: config.report_rows_per_page,
                ..ExportOptions::default()
            },
            export_dir: config.export_dir.clone(),
            render_failed: false,
        };
        state.rebuild_grid();
        state
    }

    fn rebuild_grid(&mut self) {
        self.grid = GridWidget::new(column_definitions(self.records.records()));
        self.grid
            .set_rows(project(&visible_rows(self.records.records(), self.store.get_state())));
        self.adapter.mount(self.store.get_state(), &mut self.grid);
        self.adapter.settle_page(&self.grid, &mut self.store);
        self.clamp_cursor();
    }

    /// Pass a widget event to the adapter. A filter change re-derives the
    /// rows first so a page clamp lands in the same write.
    fn emit(&mut self, event: GridEvent, now: Instant) {
        if event == GridEvent::FilterChanged {
            let next = ViewStatePatch::default()
                .filters(self.grid.filter_model().clone())
                .apply(self.store.get_state());
            let rows = project(&visible_rows(self.records.records(), &next));
            let mut events = vec![event];
            events.extend(self.grid.set_rows(rows));
            self.adapter.handle_events(&events, &self.grid, &mut self.store, now);
        } else {
            self.adapter.handle_event(event, &self.grid, &mut self.store, now);
        }
        self.clamp_cursor();
    }

    /// Apply a change that did not come from the widget. The widget is
    /// brought in line before the write so a clamped page is part of it.
    fn update_view<F>(&mut self, f: F)
    where
        F: FnOnce(&ViewState) -> ViewStatePatch,
    {
        let records = self.records.records();
        let grid = &mut self.grid;
        self.store.update_with(|prev| {
            let patch = f(prev);
            let next = patch.clone().apply(prev);
            grid.set_rows(project(&visible_rows(records, &next)));
            grid.apply_filter_model(&next.filters);
            grid.apply_pagination(next.pagination);
            let page_index = grid.pagination().page_index;
            if page_index == next.pagination.page_index {
                patch
            } else {
                patch.page(page_index)
            }
        });
        self.clamp_cursor();
    }

    fn tick(&mut self, now: Instant) {
        if let Some(query) = self.search.poll(now) {
            self.commit_search(query);
        }
        self.adapter.tick(&mut self.store, now);
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.search.deadline(), self.adapter.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn commit_search(&mut self, query: String) {
        if query == self.store.get_state().search_query {
            return;
        }
        self.update_view(|_| ViewStatePatch::default().search(query).page(0));
    }

    fn clamp_cursor(&mut self) {
        let rows = self.grid.page_rows().len();
        self.cursor = self.cursor.min(rows.saturating_sub(1));
        let columns = self.grid.visible_columns().len();
        self.focus = self.focus.min(columns.saturating_sub(1));
    }

    fn focused_column(&self) -> Option<&ColumnSpec> {
        self.grid.visible_columns().get(self.focus).copied()
    }

    fn current_record(&self) -> Option<&Application> {
        let rows = self.grid.page_rows();
        let row = rows.get(self.cursor)?;
        self.records.get(&row.id)
    }

    fn next(&mut self) {
        if self.cursor + 1 < self.grid.page_rows().len() {
            self.cursor += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        match &mut self.mode {
            Mode::Search => {
                match key.code {
                    KeyCode::Enter => {
                        self.mode = Mode::Normal;
                        if let Some(query) = self.search.flush() {
                            self.commit_search(query);
                        }
                    }
                    KeyCode::Esc => {
                        self.mode = Mode::Normal;
                        self.search.cancel();
                        self.search_input = self.store.get_state().search_query.clone();
                    }
                    KeyCode::Backspace => {
                        self.search_input.pop();
                        self.search.push(self.search_input.clone(), now);
                    }
                    KeyCode::Char(c) => {
                        self.search_input.push(c);
                        self.search.push(self.search_input.clone(), now);
                    }
                    _ => {}
                }
                return Flow::Continue;
            }
            Mode::Filter { col_id, input } => {
                match key.code {
                    KeyCode::Enter => {
                        let col_id = std::mem::take(col_id);
                        let input = std::mem::take(input);
                        self.mode = Mode::Normal;
                        self.apply_filter_input(&col_id, &input, now);
                    }
                    KeyCode::Esc => self.mode = Mode::Normal,
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Char(c) => input.push(c),
                    _ => {}
                }
                return Flow::Continue;
            }
            Mode::Normal => {}
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('r') => {
                if self.records.failure().is_some() {
                    self.records.reload();
                    self.rebuild_grid();
                } else if self.render_failed {
                    self.render_failed = false;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.prev(),
            KeyCode::Char('J') | KeyCode::PageDown => self.scroll_down(),
            KeyCode::Char('K') | KeyCode::PageUp => self.scroll_up(),
            KeyCode::Left | KeyCode::Char('h') => self.focus = self.focus.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => {
                self.focus += 1;
                self.clamp_cursor();
            }
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('s') | KeyCode::Char('S') => {
                if let Some(col_id) = self.focused_column().map(|c| c.id.clone()) {
                    let event = self.grid.sort_column(&col_id, key.code == KeyCode::Char('S'));
                    self.emit(event, now);
                }
            }
            KeyCode::Char('H') => {
                if let Some(col_id) = self.focused_column().map(|c| c.id.clone()) {
                    if let Some(event) = self.grid.toggle_column(&col_id) {
                        self.emit(event, now);
                    }
                }
            }
            KeyCode::Char('U') => {
                let event = self.grid.show_all_columns();
                self.emit(event, now);
            }
            KeyCode::Char('<') | KeyCode::Char('>') => self.move_focused(key.code == KeyCode::Char('>'), now),
            KeyCode::Char('+') | KeyCode::Char('-') => {
                if let Some(col_id) = self.focused_column().map(|c| c.id.clone()) {
                    let width = self.grid.width_of(&col_id);
                    let width = if key.code == KeyCode::Char('+') {
                        width.saturating_add(RESIZE_STEP)
                    } else {
                        width.saturating_sub(RESIZE_STEP)
                    };
                    if let Some(event) = self.grid.resize_column(&col_id, width) {
                        self.emit(event, now);
                    }
                }
            }
            KeyCode::Char('n') => {
                let page = self.grid.pagination().page_index + 1;
                let event = self.grid.go_to_page(page);
                self.emit(event, now);
            }
            KeyCode::Char('p') => {
                let page = self.grid.pagination().page_index.saturating_sub(1);
                let event = self.grid.go_to_page(page);
                self.emit(event, now);
            }
            KeyCode::Char('z') => {
                let current = self.grid.pagination().page_size;
                let size = PAGE_SIZES
                    .iter()
                    .copied()
                    .find(|&s| s > current)
                    .unwrap_or(PAGE_SIZES[0]);
                let event = self.grid.set_page_size(size);
                self.emit(event, now);
            }
            KeyCode::Char('f') => {
                if let Some(col_id) = self.focused_column().map(|c| c.id.clone()) {
                    self.mode = Mode::Filter {
                        col_id,
                        input: String::new(),
                    };
                }
            }
            KeyCode::Char('F') => {
                let event = self.grid.clear_filters();
                self.emit(event, now);
            }
            KeyCode::Char('t') => self.toggle_focused_skill(),
            KeyCode::Char('c') => {
                self.search.cancel();
                self.search_input.clear();
                self.update_view(|_| {
                    ViewStatePatch::default()
                        .search("")
                        .skills(Vec::<String>::new())
                        .filters(Default::default())
                        .page(0)
                });
            }
            KeyCode::Char(' ') => {
                let id = self.grid.page_rows().get(self.cursor).map(|r| r.id.clone());
                if let Some(id) = id {
                    let event = self.grid.toggle_selection(&id);
                    self.emit(event, now);
                }
            }
            KeyCode::Char('E') => self.export(ExportFormat::Csv),
            KeyCode::Char('X') => self.export(ExportFormat::Xlsx),
            KeyCode::Char('P') => self.export(ExportFormat::Report),
            KeyCode::Char('R') => {
                if let Some(format) = self.last_export {
                    self.export(format);
                }
            }
            KeyCode::Char('y') => {
                let link = self.store.link();
                self.status = Some(if link.is_empty() {
                    "View link: (default view)".to_string()
                } else {
                    format!("View link: {}", link)
                });
            }
            _ => {}
        }
        Flow::Continue
    }

    fn move_focused(&mut self, right: bool, now: Instant) {
        let Some(col_id) = self.focused_column().map(|c| c.id.clone()) else {
            return;
        };
        let Some(from) = self.grid.columns().iter().position(|c| c.id == col_id) else {
            return;
        };
        let to = if right { from + 1 } else { from.saturating_sub(1) };
        if let Some(event) = self.grid.move_column(&col_id, to) {
            self.emit(event, now);
            if let Some(pos) = self
                .grid
                .visible_columns()
                .iter()
                .position(|c| c.id == col_id)
            {
                self.focus = pos;
            }
        }
    }

    fn apply_filter_input(&mut self, col_id: &str, input: &str, now: Instant) {
        let Some(kind) = self.grid.column(col_id).map(|c| c.kind) else {
            return;
        };
        match ColumnFilter::parse_expression(kind, input) {
            Ok(filter) => {
                let event = self.grid.set_column_filter(col_id, filter);
                self.emit(event, now);
            }
            Err(e) => self.status = Some(format!("Filter not applied: {}", e)),
        }
    }

    fn toggle_focused_skill(&mut self) {
        let Some(skill) = self
            .focused_column()
            .and_then(|c| c.skill_name())
            .map(ToString::to_string)
        else {
            self.status = Some("Focus a skill column to toggle that skill".to_string());
            return;
        };
        self.update_view(|prev| {
            let mut skills = prev.skills.clone();
            if !skills.remove(&skill) {
                skills.insert(skill);
            }
            ViewStatePatch::default().skills(skills).page(0)
        });
    }

    /// Export the selected rows, or every visible row, in grid order.
    fn export(&mut self, format: ExportFormat) {
        self.last_export = Some(format);
        let selected = self.grid.selected_ids();
        let records: Vec<&Application> = self
            .grid
            .sorted_rows()
            .filter(|row| selected.is_empty() || selected.contains(&row.id))
            .filter_map(|row| self.records.get(&row.id))
            .collect();
        let count = records.len();
        let result = export::export_records(
            &records,
            format,
            &self.export_options,
            &self.export_dir,
            Local::now().naive_local(),
        );
        self.status = Some(match result {
            Ok(path) => format!("Exported {} rows to {}", count, path.display()),
            Err(e) => format!("Export to {} failed: {}. Press R to retry", format.label(), e),
        });
    }
}

/// Run the terminal UI. Returns the view link at exit.
pub fn run_browse(
    records: RecordStore,
    store: ViewStateStore<MemoryLocation>,
    config: &Config,
) -> Result<String> {
    let mut state = AppState::new(records, store, config);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|info| error!("panic: {}", info)));

    let result = run_loop(&mut terminal, &mut state);

    panic::set_hook(default_hook);
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result?;
    Ok(state.store.navigator().href())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, state))?;

        let timeout = state
            .next_deadline()
            .map_or(IDLE_POLL, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            });
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Flow::Quit = state.handle_key(key, Instant::now()) {
                        break;
                    }
                }
            }
        }
        state.tick(Instant::now());
    }
    info!(link = %state.store.link(), "leaving browser");
    Ok(())
}

fn draw(frame: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(build_stats(state), chunks[0]);
    frame.render_widget(build_toolbar(state), chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(chunks[2]);

    if let Some(message) = state.records.failure() {
        let text = format!("Could not load applications\n\n{}\n\nPress r to reload.", message);
        let widget = Paragraph::new(text)
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(" Applications "))
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, chunks[2]);
    } else {
        draw_table(frame, state, body[0]);
        let detail = Paragraph::new(build_detail(state))
            .block(Block::default().borders(Borders::ALL).title(" Detail "))
            .wrap(Wrap { trim: false })
            .scroll((state.scroll_offset, 0));
        frame.render_widget(detail, body[1]);
    }

    let status = state.status.clone().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::Yellow)),
        chunks[3],
    );

    let help = match state.mode {
        Mode::Search => " type to search  Enter:apply  Esc:cancel",
        Mode::Filter { .. } => {
            " text: abc =abc !abc ^abc $abc  number: >5 <=3 2..8  set: a,b  date: >2024-01-01 a..b  Enter:apply"
        }
        Mode::Normal => {
            " j/k:row h/l:column s/S:sort f/F:filter t:skill c:clear H/U:hide <>:move +-:width n/p:page z:size /:search E/X/P:export y:link q:quit"
        }
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );
}

fn draw_table(frame: &mut Frame, state: &mut AppState, area: Rect) {
    if state.render_failed {
        render_table_fallback(frame, area);
        return;
    }
    if state.grid.visible_columns().is_empty() {
        let widget = Paragraph::new(ALL_HIDDEN)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Applications "));
        frame.render_widget(widget, area);
        return;
    }

    let built = panic::catch_unwind(AssertUnwindSafe(|| build_table(state, area.width)));
    match built {
        Ok(table) => {
            let mut table_state = TableState::default().with_selected(Some(state.cursor));
            frame.render_stateful_widget(table, area, &mut table_state);
        }
        Err(_) => {
            error!("table rendering failed");
            state.render_failed = true;
            render_table_fallback(frame, area);
        }
    }
}

fn render_table_fallback(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("Something went wrong while displaying the table.\n\nPress r to try again.")
        .style(Style::default().fg(Color::Red))
        .block(Block::default().borders(Borders::ALL).title(" Applications "));
    frame.render_widget(widget, area);
}

/// First visible column index such that the focused column fits in `width`.
fn first_column(widths: &[u16], focus: usize, width: u16) -> usize {
    if widths.is_empty() {
        return 0;
    }
    let mut used = 0u16;
    let mut start = focus;
    for i in (0..=focus.min(widths.len().saturating_sub(1))).rev() {
        used = used.saturating_add(widths[i] + 1);
        if used > width {
            break;
        }
        start = i;
    }
    start
}

fn build_table(state: &AppState, area_width: u16) -> Table<'static> {
    let grid = &state.grid;
    let sort_model = grid.sort_model();
    let filters = grid.filter_model();
    let columns = grid.visible_columns();
    let widths: Vec<u16> = columns.iter().map(|c| grid.width_of(&c.id)).collect();
    let start = first_column(&widths, state.focus, area_width.saturating_sub(4));

    let header_cells: Vec<Cell> = columns
        .iter()
        .enumerate()
        .skip(start)
        .map(|(i, column)| {
            let mut label = column.header.clone();
            if let Some(pos) = sort_model.iter().position(|s| s.col_id == column.id) {
                label.push_str(sort_model[pos].sort.arrow());
                if sort_model.len() > 1 {
                    label.push_str(&(pos + 1).to_string());
                }
            }
            if filters.contains_key(&column.id) {
                label.push('*');
            }
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if i == state.focus {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Cell::from(label).style(style)
        })
        .collect();
    let header = TableRow::new(std::iter::once(Cell::from(" ")).chain(header_cells));

    let rows: Vec<TableRow> = grid
        .page_rows()
        .into_iter()
        .map(|row| {
            let marker = if grid.is_selected(&row.id) { "+" } else { " " };
            let cells = columns
                .iter()
                .skip(start)
                .map(|column| Cell::from(row.get(&column.id).to_string()));
            TableRow::new(std::iter::once(Cell::from(marker)).chain(cells))
        })
        .collect();

    let constraints: Vec<Constraint> = std::iter::once(Constraint::Length(1))
        .chain(widths.iter().skip(start).map(|&w| Constraint::Length(w)))
        .collect();

    let pagination = grid.pagination();
    let title = format!(
        " Applications ({}) page {}/{} ",
        grid.row_count(),
        pagination.page_index + 1,
        grid.page_count()
    );

    Table::new(rows, constraints)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
}

fn build_stats(state: &AppState) -> Paragraph<'static> {
    let visible = visible_rows(state.records.records(), state.store.get_state());
    let summary = summarize(&visible);

    let average = summary
        .average_match
        .map_or("-".to_string(), |m| format!("{:.1}%", m));
    let range = match (summary.earliest, summary.latest) {
        (Some(a), Some(b)) => format!("{} to {}", a, b),
        _ => "-".to_string(),
    };
    let statuses: Vec<String> = summary
        .by_status
        .iter()
        .map(|(status, count)| format!("{} {}", status, count))
        .collect();

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} of {} applications", summary.total, state.records.len()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  avg match {}  relocate {}  skills {}  applied {}",
                average, summary.willing_to_relocate, summary.distinct_skills, range
            )),
        ]),
        Line::from(Span::styled(
            format!(" {}", statuses.join("  ")),
            Style::default().fg(Color::Cyan),
        )),
    ];
    Paragraph::new(lines)
}

fn build_toolbar(state: &AppState) -> Paragraph<'static> {
    let view = state.store.get_state();
    let mut spans = Vec::new();

    let (prompt, input) = match &state.mode {
        Mode::Filter { col_id, input } => (format!("filter {}: ", col_id), input.clone()),
        _ => ("search: ".to_string(), state.search_input.clone()),
    };
    let input_style = match state.mode {
        Mode::Normal => Style::default(),
        _ => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    };
    spans.push(Span::styled(prompt, Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(format!("{}_", input), input_style));

    if !view.skills.is_empty() {
        let skills: Vec<&str> = view.skills.iter().map(String::as_str).collect();
        spans.push(Span::styled("  skills: ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(skills.join(" + "), Style::default().fg(Color::Green)));
    }
    if !view.filters.is_empty() {
        let filters: Vec<String> = view
            .filters
            .iter()
            .map(|(col, f)| format!("{} {}", col, f))
            .collect();
        spans.push(Span::styled("  filters: ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(filters.join("; ")));
    }

    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(" Filters "))
}

fn build_detail(state: &AppState) -> Text<'static> {
    let Some(app) = state.current_record() else {
        return Text::raw("No application selected");
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        app.name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if !app.employer.is_empty() {
        lines.push(Line::from(format!("at {}", app.employer)));
    }

    let status_style = match app.application_status.as_str() {
        "applied" => Style::default().fg(Color::Cyan),
        "shortlisted" => Style::default().fg(Color::Yellow),
        "interview" => Style::default().fg(Color::Magenta),
        "offered" => Style::default().fg(Color::Green),
        "rejected" => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    lines.push(Line::from(Span::styled(
        format!("Status: {}", app.application_status),
        status_style,
    )));
    lines.push(Line::from(format!("Match: {}%", app.match_percentage)));
    lines.push(Line::from(""));

    let fields = [
        ("ID", app.id.as_str()),
        ("Email", app.email.as_str()),
        ("Phone", app.phone.as_str()),
        ("Location", app.location.as_str()),
        ("Experience", app.overall_experience.as_str()),
        ("CTC", app.ctc.as_str()),
        ("Expected CTC", app.expected_ctc.as_str()),
        ("Offer CTC", app.offer_ctc.as_str()),
        ("Notice (days)", app.notice_period.as_str()),
        ("Offers in hand", app.offers_in_hand.as_str()),
        ("Current work", app.current_work_type.as_deref().unwrap_or_default()),
        ("Preferred work", app.preferred_work_type.as_str()),
        ("Contract", app.current_contract_type.as_deref().unwrap_or_default()),
        ("Applied", app.created_at.as_str()),
    ];
    for (label, value) in fields.iter().filter(|(_, v)| !v.is_empty()) {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<15}", label), Style::default().fg(Color::DarkGray)),
            Span::raw(value.to_string()),
        ]));
    }
    lines.push(Line::from(format!(
        "{:<15}{}",
        "Relocate",
        if app.willing_to_relocate { "Yes" } else { "No" }
    )));
    lines.push(Line::from(""));

    if app.skills.is_empty() {
        lines.push(Line::from(Span::styled(
            "(No skills listed)",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "SKILLS",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        let skills: Vec<String> = app
            .skills
            .iter()
            .map(|s| format!("{} ({}y)", s.name, s.years))
            .collect();
        for line in textwrap::fill(&skills.join(", "), 36).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
    }

    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_model::fixtures::app;

    fn state(link: &str) -> AppState {
        let records = RecordStore::from_records(vec![
            app("1", "Alice Smith", &[("Go", "3")]),
            app("2", "Bob Jones", &[("Go", "1"), ("Rust", "2")]),
            app("3", "Carol Smith", &[]),
        ]);
        AppState::new(records, ViewStateStore::new(MemoryLocation::new(link)), &Config::default())
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::from(KeyCode::Char(c))
    }

    fn page_ids(state: &AppState) -> Vec<String> {
        state.grid.page_rows().iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn restores_view_from_link() {
        let state = state("?search=smith");
        assert_eq!(state.search_input, "smith");
        assert_eq!(page_ids(&state), vec!["1", "3"]);
    }

    #[test]
    fn search_is_debounced() {
        let mut state = state("");
        let start = Instant::now();
        state.handle_key(key('/'), start);
        for (i, c) in "jones".chars().enumerate() {
            state.handle_key(key(c), start + Duration::from_millis(i as u64 * 50));
            state.tick(start + Duration::from_millis(i as u64 * 50));
        }
        assert_eq!(state.store.navigator().replacements(), 0);

        state.tick(start + Duration::from_millis(200 + 300));
        assert_eq!(state.store.link(), "?search=jones");
        assert_eq!(page_ids(&state), vec!["2"]);
        assert_eq!(state.store.navigator().replacements(), 1);
    }

    #[test]
    fn clear_resets_search_skills_and_filters_in_one_write() {
        let mut state = state("?search=smith&skills=Go&keep=1");
        assert_eq!(page_ids(&state), vec!["1"]);
        state.handle_key(key('c'), Instant::now());
        assert_eq!(state.store.navigator().replacements(), 1);
        assert_eq!(state.store.link(), "?keep=1");
        assert_eq!(page_ids(&state).len(), 3);
    }

    #[test]
    fn sort_key_writes_sort_param() {
        let mut state = state("");
        state.focus = 1; // name
        state.handle_key(key('s'), Instant::now());
        state.handle_key(key('s'), Instant::now());
        assert_eq!(page_ids(&state), vec!["3", "2", "1"]);
        assert!(state.store.link().starts_with("?sort="));
    }

    #[test]
    fn filter_prompt_applies_expression() {
        let mut state = state("");
        state.focus = 1;
        state.handle_key(key('f'), Instant::now());
        for c in "^bob".chars() {
            state.handle_key(key(c), Instant::now());
        }
        state.handle_key(KeyEvent::from(KeyCode::Enter), Instant::now());
        assert_eq!(page_ids(&state), vec!["2"]);
        assert!(state.store.get_state().filters.contains_key("name"));
    }

    #[test]
    fn skill_toggle_requires_skill_column() {
        let mut state = state("");
        state.focus = 0;
        state.handle_key(key('t'), Instant::now());
        assert!(state.status.is_some());

        let rust = state
            .grid
            .visible_columns()
            .iter()
            .position(|c| c.id == "skill_Rust")
            .unwrap();
        state.focus = rust;
        state.handle_key(key('t'), Instant::now());
        assert_eq!(page_ids(&state), vec!["2"]);
        assert_eq!(state.store.link(), "?skills=Rust");
    }

    #[test]
    fn first_column_keeps_focus_in_view() {
        assert_eq!(first_column(&[10, 10, 10], 0, 15), 0);
        assert_eq!(first_column(&[10, 10, 10], 2, 25), 1);
        assert_eq!(first_column(&[10, 10, 10], 2, 5), 2);
        assert_eq!(first_column(&[], 0, 80), 0);
    }

    #[test]
    fn hiding_every_column_still_renders() {
        let mut browser = state("");
        while !browser.grid.visible_columns().is_empty() {
            browser.focus = 0;
            browser.handle_key(key('H'), Instant::now());
        }
        assert!(browser.focused_column().is_none());
        let _table = build_table(&browser, 80);

        let link = browser.store.link();
        assert!(link.starts_with("?hidden="));
        let mut restored = state(&link);
        assert!(restored.grid.visible_columns().is_empty());
        let _table = build_table(&restored, 80);

        restored.handle_key(key('U'), Instant::now());
        assert!(!restored.grid.visible_columns().is_empty());
    }

    #[test]
    fn narrowing_filter_on_a_later_page_writes_once() {
        let mut state = state("?pageSize=1&page=3");
        assert_eq!(page_ids(&state), vec!["3"]);
        state.focus = 1;
        state.handle_key(key('f'), Instant::now());
        for c in "^bob".chars() {
            state.handle_key(key(c), Instant::now());
        }
        state.handle_key(KeyEvent::from(KeyCode::Enter), Instant::now());

        assert_eq!(state.store.navigator().replacements(), 1);
        assert_eq!(page_ids(&state), vec!["2"]);
        assert_eq!(state.store.get_state().pagination.page_index, 0);
        let link = state.store.link();
        assert!(link.starts_with("?pageSize=1&filter="));
        assert!(!link.contains("page=3"));
    }

    #[test]
    fn search_on_a_later_page_writes_once() {
        let mut state = state("?pageSize=1&page=3");
        state.handle_key(key('/'), Instant::now());
        for c in "smith".chars() {
            state.handle_key(key(c), Instant::now());
        }
        state.handle_key(KeyEvent::from(KeyCode::Enter), Instant::now());
        assert_eq!(state.store.navigator().replacements(), 1);
        assert_eq!(state.store.link(), "?pageSize=1&search=smith");
        assert_eq!(page_ids(&state), vec!["1"]);
    }

    #[test]
    fn stale_page_in_link_is_clamped_on_open() {
        let state = state("?pageSize=1&page=99");
        assert_eq!(page_ids(&state), vec!["3"]);
        assert_eq!(state.store.link(), "?pageSize=1&page=3");
        assert_eq!(state.store.navigator().replacements(), 1);
    }
}
