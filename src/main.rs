mod adapter;
mod config;
mod debounce;
mod error;
mod export;
mod grid;
mod logging;
mod models;
mod store;
mod tui;
mod url_state;
mod view_model;
mod view_state;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use adapter::GridAdapter;
use config::Config;
use export::{DateFormat, ExportFormat, ExportOptions};
use grid::GridWidget;
use logging::LogConfig;
use models::{Application, ColumnFilter, SortDirection, SortItem};
use store::{DataSource, RecordStore};
use url_state::MemoryLocation;
use view_model::{ColumnSpec, column_definitions, project, skill_counts, summarize, visible_rows};
use view_state::{ViewState, ViewStatePatch, ViewStateStore};

#[derive(Parser)]
#[command(name = "appgrid")]
#[command(about = "Browse, filter and export job applications with shareable view links")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Application data file (JSON array); the bundled sample when omitted
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive table (default)
    Browse {
        /// View link to open (e.g. "?search=smith&page=2")
        #[arg(long)]
        view: Option<String>,
    },

    /// Print the current page of applications and the view link
    List {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Print the canonical view link
    Link {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Export the visible applications
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Output format
        #[arg(short, long, value_enum)]
        format: ExportFormat,

        /// Output directory (defaults to the configured export_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Date format for the Applied Date column
        #[arg(long, value_enum, default_value = "short")]
        date_format: DateFormat,

        /// Leave out the per-skill columns
        #[arg(long)]
        no_skills: bool,
    },

    /// Show column definitions and their visibility
    Columns {
        /// View link to read sort, filter and visibility from
        #[arg(long)]
        view: Option<String>,
    },

    /// List distinct skills with application counts
    Skills,

    /// Summary figures for the visible applications
    Stats {
        #[command(flatten)]
        view: ViewArgs,
    },
}

/// View link plus overrides, applied as one update.
#[derive(Args, Default)]
struct ViewArgs {
    /// View link to start from (e.g. "?search=smith&page=2")
    #[arg(long)]
    view: Option<String>,

    /// Free-text search
    #[arg(short, long)]
    search: Option<String>,

    /// Required skill (repeatable; rows must have all of them)
    #[arg(long = "skill")]
    skills: Vec<String>,

    /// Sort key COL[:asc|desc] (repeatable, first is primary)
    #[arg(long = "sort")]
    sort: Vec<String>,

    /// Column filter COL=EXPR, e.g. matchPercentage=>80 (repeatable)
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Hide a column (repeatable)
    #[arg(long = "hide")]
    hide: Vec<String>,

    /// Page number, starting at 1
    #[arg(short, long)]
    page: Option<usize>,

    /// Rows per page
    #[arg(long)]
    page_size: Option<usize>,
}

impl ViewArgs {
    fn from_link(view: Option<String>) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    let command = cli.command.unwrap_or(Commands::Browse { view: None });

    let log_file = cli.log_file.or_else(|| config.log_file.clone());
    let log_file = match &command {
        Commands::Browse { .. } => log_file.or_else(config::default_log_path),
        _ => log_file,
    };
    logging::init_logging(&LogConfig::from_verbosity(cli.verbose).with_log_file(log_file))
        .context("Failed to initialize logging")?;

    let source = DataSource::from_path(cli.data.or_else(|| config.data_path.clone()));
    let records = RecordStore::open(source);

    match command {
        Commands::Browse { view } => {
            let store = open_view(&records, &ViewArgs::from_link(view), &config)?;
            let link = tui::run_browse(records, store, &config)?;
            if link.is_empty() {
                println!("View link: (default view)");
            } else {
                println!("View link: {}", link);
            }
        }

        Commands::List { view } => {
            ensure_loaded(&records)?;
            let store = open_view(&records, &view, &config)?;
            let grid = build_grid(records.records(), store.get_state(), &config);
            let rows = grid.page_rows();
            if rows.is_empty() {
                println!("No applications found.");
            } else {
                let columns = grid.visible_columns();
                let header: Vec<String> = columns
                    .iter()
                    .map(|c| pad(&c.header.to_uppercase(), list_width(&grid, c)))
                    .collect();
                println!("{}", header.join(" ").trim_end());
                println!("{}", "-".repeat(header.iter().map(|h| h.len() + 1).sum::<usize>()));
                for row in rows {
                    let cells: Vec<String> = columns
                        .iter()
                        .map(|c| pad(&row.get(&c.id).to_string(), list_width(&grid, c)))
                        .collect();
                    println!("{}", cells.join(" ").trim_end());
                }
            }
            let pagination = grid.pagination();
            println!(
                "\nPage {} of {} ({} applications)",
                pagination.page_index + 1,
                grid.page_count(),
                grid.row_count()
            );
            println!("View link: {}", display_link(&store.link()));
        }

        Commands::Link { view } => {
            ensure_loaded(&records)?;
            let store = open_view(&records, &view, &config)?;
            println!("{}", store.canonical_link());
        }

        Commands::Export {
            view,
            format,
            out,
            date_format,
            no_skills,
        } => {
            ensure_loaded(&records)?;
            let store = open_view(&records, &view, &config)?;
            let grid = build_grid(records.records(), store.get_state(), &config);
            let rows: Vec<&Application> = grid
                .sorted_rows()
                .filter_map(|row| records.get(&row.id))
                .collect();

            let options = ExportOptions {
                include_skills: !no_skills,
                date_format,
                report_rows_per_page: config.report_rows_per_page,
            };
            let dir = out.unwrap_or_else(|| config.export_dir.clone());
            let path = export::export_records(&rows, format, &options, &dir, Local::now().naive_local())
                .with_context(|| format!("Failed to export to {}", format.label()))?;
            println!("Exported {} applications to {}", rows.len(), path.display());
        }

        Commands::Columns { view } => {
            ensure_loaded(&records)?;
            let store = open_view(&records, &ViewArgs::from_link(view), &config)?;
            let state = store.get_state();
            let grid = build_grid(records.records(), state, &config);
            println!(
                "{:<26} {:<22} {:<7} {:>5} {:<7} {:<6} {:<20}",
                "ID", "HEADER", "KIND", "WIDTH", "VISIBLE", "SORT", "FILTER"
            );
            println!("{}", "-".repeat(99));
            for column in grid.columns() {
                let sort = state
                    .sort_for(&column.id)
                    .map(|(i, item)| format!("{}{}", i + 1, item.sort.arrow()))
                    .unwrap_or_default();
                let filter = state
                    .filters
                    .get(&column.id)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!(
                    "{:<26} {:<22} {:<7} {:>5} {:<7} {:<6} {:<20}",
                    truncate(&column.id, 24),
                    truncate(&column.header, 20),
                    column.kind,
                    grid.width_of(&column.id),
                    if grid.is_visible(&column.id) { "yes" } else { "no" },
                    sort,
                    truncate(&filter, 20)
                );
            }
        }

        Commands::Skills => {
            ensure_loaded(&records)?;
            let counts = skill_counts(records.records());
            if counts.is_empty() {
                println!("No skills found.");
            } else {
                println!("{:<30} {:>12}", "SKILL", "APPLICATIONS");
                println!("{}", "-".repeat(43));
                for (skill, count) in counts {
                    println!("{:<30} {:>12}", truncate(&skill, 28), count);
                }
            }
        }

        Commands::Stats { view } => {
            ensure_loaded(&records)?;
            let store = open_view(&records, &view, &config)?;
            let visible = visible_rows(records.records(), store.get_state());
            let summary = summarize(&visible);

            println!("Applications: {} of {}", summary.total, records.len());
            match summary.average_match {
                Some(avg) => println!("Average match: {:.1}%", avg),
                None => println!("Average match: -"),
            }
            println!("Willing to relocate: {}", summary.willing_to_relocate);
            println!("Distinct skills: {}", summary.distinct_skills);
            if let (Some(earliest), Some(latest)) = (summary.earliest, summary.latest) {
                println!("Applied between: {} and {}", earliest, latest);
            }
            if !summary.by_status.is_empty() {
                println!("\nBy status:");
                for (status, count) in &summary.by_status {
                    println!("  {:<14} {:>5}", status, count);
                }
            }
            println!("\nView link: {}", display_link(&store.link()));
        }
    }

    Ok(())
}

fn ensure_loaded(records: &RecordStore) -> Result<()> {
    match records.failure() {
        Some(message) => bail!("Could not load applications from {}: {}", records.source(), message),
        None => Ok(()),
    }
}

/// Restore the view from `--view`, then apply the flag overrides in one update.
/// Restore the view from the link and apply the flags as one update. A page
/// past the end is clamped in the same update.
fn open_view(
    records: &RecordStore,
    args: &ViewArgs,
    config: &Config,
) -> Result<ViewStateStore<MemoryLocation>> {
    let mut store = ViewStateStore::new(MemoryLocation::new(args.view.as_deref().unwrap_or_default()));
    let columns = column_definitions(records.records());
    let mut patch = view_patch(args, store.get_state(), &columns)?;

    let next = patch.clone().apply(store.get_state());
    let page_index = build_grid(records.records(), &next, config).pagination().page_index;
    if page_index != next.pagination.page_index {
        debug!(requested = next.pagination.page_index + 1, page = page_index + 1, "page clamped");
        patch = patch.page(page_index);
    }

    debug!(?patch, "applying view flags");
    store.update_state(patch);
    Ok(store)
}

fn view_patch(args: &ViewArgs, current: &ViewState, columns: &[ColumnSpec]) -> Result<ViewStatePatch> {
    let mut patch = ViewStatePatch::default();

    if let Some(search) = &args.search {
        patch = patch.search(search.clone());
    }
    if !args.skills.is_empty() {
        patch = patch.skills(args.skills.iter().cloned());
    }
    if !args.sort.is_empty() {
        let mut sort_model = Vec::with_capacity(args.sort.len());
        for arg in &args.sort {
            let (col_id, direction) = match arg.split_once(':') {
                Some((col_id, direction)) => {
                    let direction = SortDirection::parse(direction)
                        .ok_or_else(|| anyhow!("Invalid sort direction '{}' (use asc or desc)", direction))?;
                    (col_id, direction)
                }
                None => (arg.as_str(), SortDirection::Asc),
            };
            let column = find_column(columns, col_id)?;
            sort_model.push(SortItem::new(column.id.clone(), direction));
        }
        patch = patch.sort(sort_model);
    }
    if !args.filters.is_empty() {
        let mut filters = current.filters.clone();
        for arg in &args.filters {
            let (col_id, expr) = arg
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid filter '{}' (expected COL=EXPR)", arg))?;
            let column = find_column(columns, col_id.trim())?;
            match ColumnFilter::parse_expression(column.kind, expr)
                .with_context(|| format!("Invalid filter for column '{}'", column.id))?
            {
                Some(filter) => {
                    filters.insert(column.id.clone(), filter);
                }
                None => {
                    filters.remove(&column.id);
                }
            }
        }
        patch = patch.filters(filters);
    }
    if !args.hide.is_empty() {
        let hidden = args
            .hide
            .iter()
            .map(|col_id| find_column(columns, col_id).map(|c| c.id.clone()))
            .collect::<Result<Vec<_>>>()?;
        patch = patch.hidden(hidden);
    }
    if let Some(page) = args.page {
        if page == 0 {
            bail!("Page numbers start at 1");
        }
        patch = patch.page(page - 1);
    }
    if let Some(page_size) = args.page_size {
        patch = patch.page_size(page_size);
    }
    Ok(patch)
}

fn find_column<'a>(columns: &'a [ColumnSpec], col_id: &str) -> Result<&'a ColumnSpec> {
    if let Some(column) = columns.iter().find(|c| c.id == col_id) {
        return Ok(column);
    }
    match suggest_column(columns, col_id) {
        Some(near) => bail!("Unknown column '{}'. Did you mean '{}'?", col_id, near),
        None => bail!("Unknown column '{}'. Run `appgrid columns` to list them.", col_id),
    }
}

fn suggest_column<'a>(columns: &'a [ColumnSpec], col_id: &str) -> Option<&'a str> {
    let wanted = col_id.to_lowercase();
    columns
        .iter()
        .map(|c| (c.id.as_str(), strsim::jaro_winkler(&wanted, &c.id.to_lowercase())))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Sort and paginate the visible rows the way the interactive table does.
fn build_grid(records: &[Application], state: &ViewState, config: &Config) -> GridWidget {
    let mut grid = GridWidget::new(column_definitions(records));
    grid.set_rows(project(&visible_rows(records, state)));
    GridAdapter::new(config.resize_debounce()).mount(state, &mut grid);
    grid
}

fn list_width(grid: &GridWidget, column: &ColumnSpec) -> usize {
    usize::from(grid.width_of(&column.id)).min(24)
}

fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", truncate(s, width), width = width)
}

fn display_link(link: &str) -> &str {
    if link.is_empty() { "(default view)" } else { link }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
