//! Pure projections from the record store and view state: the visible rows,
//! the column set (base columns plus one per skill) and summary figures.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;

use crate::models::{Application, ColumnFilter, DateOp, FilterKind, NumberOp, TextOp, parse_day};
use crate::view_state::ViewState;

pub const SKILL_PREFIX: &str = "skill_";

/// Base columns: (id, header, filter kind, default width).
const BASE_COLUMNS: &[(&str, &str, FilterKind, u16)] = &[
    ("id", "ID", FilterKind::Text, 9),
    ("name", "Name", FilterKind::Text, 22),
    ("email", "Email", FilterKind::Text, 28),
    ("phone", "Phone", FilterKind::Text, 16),
    ("location", "Location", FilterKind::Text, 16),
    ("employer", "Employer", FilterKind::Text, 14),
    ("overallExperience", "Experience (Years)", FilterKind::Number, 10),
    ("currentWorkType", "Current Work", FilterKind::Set, 12),
    ("preferredWorkType", "Preferred Work", FilterKind::Set, 12),
    ("ctc", "Current CTC (LPA)", FilterKind::Number, 10),
    ("expectedCTC", "Expected CTC (LPA)", FilterKind::Number, 10),
    ("noticePeriod", "Notice (Days)", FilterKind::Number, 8),
    ("applicationStatus", "Status", FilterKind::Set, 12),
    ("matchPercentage", "Match %", FilterKind::Number, 8),
    ("willingToRelocate", "Relocate", FilterKind::Set, 8),
    ("createdAt", "Applied", FilterKind::Date, 10),
];

const SKILL_COLUMN_WIDTH: u16 = 8;

/// Free-text search looks at these fields only (never the id).
const SEARCH_FIELDS: &[fn(&Application) -> &str] = &[
    |app| app.name.as_str(),
    |app| app.email.as_str(),
    |app| app.phone.as_str(),
    |app| app.location.as_str(),
    |app| app.employer.as_str(),
    |app| app.current_work_type.as_deref().unwrap_or_default(),
    |app| app.preferred_work_type.as_str(),
    |app| app.application_status.as_str(),
];

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    /// Numbers stored as text in the data file become numeric cells.
    fn numeric(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Empty;
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }

    fn text(raw: &str) -> Self {
        if raw.is_empty() {
            Self::Empty
        } else {
            Self::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => parse_day(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(true) => f.write_str("Yes"),
            Self::Bool(false) => f.write_str("No"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A flat grid row: column id to cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: String,
    cells: BTreeMap<String, CellValue>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl Row {
    pub fn get(&self, col_id: &str) -> &CellValue {
        self.cells.get(col_id).unwrap_or(&EMPTY_CELL)
    }

    #[cfg(test)]
    pub fn contains(&self, col_id: &str) -> bool {
        self.cells.contains_key(col_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub id: String,
    pub header: String,
    pub kind: FilterKind,
    pub width: u16,
}

impl ColumnSpec {
    pub fn skill_name(&self) -> Option<&str> {
        self.id.strip_prefix(SKILL_PREFIX)
    }
}

pub fn skill_column_id(skill: &str) -> String {
    format!("{}{}", SKILL_PREFIX, skill)
}

/// Project a record into a flat row; skills become `skill_<name>` cells.
pub fn flatten(app: &Application) -> Row {
    let mut cells = BTreeMap::new();
    cells.insert("id".to_string(), CellValue::text(&app.id));
    cells.insert("name".to_string(), CellValue::text(&app.name));
    cells.insert("email".to_string(), CellValue::text(&app.email));
    cells.insert("phone".to_string(), CellValue::text(&app.phone));
    cells.insert("location".to_string(), CellValue::text(&app.location));
    cells.insert("employer".to_string(), CellValue::text(&app.employer));
    cells.insert(
        "overallExperience".to_string(),
        CellValue::numeric(&app.overall_experience),
    );
    cells.insert(
        "currentWorkType".to_string(),
        CellValue::text(app.current_work_type.as_deref().unwrap_or_default()),
    );
    cells.insert(
        "preferredWorkType".to_string(),
        CellValue::text(&app.preferred_work_type),
    );
    cells.insert("ctc".to_string(), CellValue::numeric(&app.ctc));
    cells.insert("expectedCTC".to_string(), CellValue::numeric(&app.expected_ctc));
    cells.insert("noticePeriod".to_string(), CellValue::numeric(&app.notice_period));
    cells.insert(
        "applicationStatus".to_string(),
        CellValue::text(&app.application_status),
    );
    cells.insert(
        "matchPercentage".to_string(),
        CellValue::Number(app.match_percentage),
    );
    cells.insert(
        "willingToRelocate".to_string(),
        CellValue::Bool(app.willing_to_relocate),
    );
    cells.insert(
        "createdAt".to_string(),
        app.created_date()
            .map_or_else(|| CellValue::text(&app.created_at), CellValue::Date),
    );
    for skill in &app.skills {
        cells.insert(skill_column_id(&skill.name), CellValue::numeric(&skill.years));
    }
    Row {
        id: app.id.clone(),
        cells,
    }
}

pub fn project(records: &[&Application]) -> Vec<Row> {
    records.iter().map(|app| flatten(app)).collect()
}

/// Sorted distinct skill names across `records`.
pub fn unique_skills<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Application>,
{
    let names: BTreeSet<&str> = records
        .into_iter()
        .flat_map(|app| app.skills.iter())
        .map(|skill| skill.name.as_str())
        .filter(|name| !name.is_empty())
        .collect();
    names.into_iter().map(ToString::to_string).collect()
}

/// How many records list each skill.
pub fn skill_counts(records: &[Application]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for app in records {
        let names: BTreeSet<&str> = app.skills.iter().map(|s| s.name.as_str()).collect();
        for name in names.into_iter().filter(|n| !n.is_empty()) {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn column_definitions(records: &[Application]) -> Vec<ColumnSpec> {
    let mut columns: Vec<ColumnSpec> = BASE_COLUMNS
        .iter()
        .map(|&(id, header, kind, width)| ColumnSpec {
            id: id.to_string(),
            header: header.to_string(),
            kind,
            width,
        })
        .collect();
    columns.extend(unique_skills(records).into_iter().map(|name| ColumnSpec {
        id: skill_column_id(&name),
        header: name,
        kind: FilterKind::Number,
        width: SKILL_COLUMN_WIDTH,
    }));
    columns
}

pub fn matches_search(app: &Application, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    SEARCH_FIELDS
        .iter()
        .any(|field| field(app).to_lowercase().contains(&needle))
}

/// Blank cells fail every positive predicate and pass the negated ones.
pub fn matches_filter(cell: &CellValue, filter: &ColumnFilter) -> bool {
    match filter {
        ColumnFilter::Text { op, filter } => {
            let value = cell.to_string().to_lowercase();
            let needle = filter.to_lowercase();
            match op {
                TextOp::Contains => !cell.is_empty() && value.contains(&needle),
                TextOp::NotContains => cell.is_empty() || !value.contains(&needle),
                TextOp::Equals => !cell.is_empty() && value == needle,
                TextOp::NotEqual => cell.is_empty() || value != needle,
                TextOp::StartsWith => !cell.is_empty() && value.starts_with(&needle),
                TextOp::EndsWith => !cell.is_empty() && value.ends_with(&needle),
            }
        }
        ColumnFilter::Number {
            op,
            filter,
            filter_to,
        } => {
            let Some(value) = cell.as_number() else {
                return *op == NumberOp::NotEqual;
            };
            match op {
                NumberOp::Equals => value == *filter,
                NumberOp::NotEqual => value != *filter,
                NumberOp::LessThan => value < *filter,
                NumberOp::LessThanOrEqual => value <= *filter,
                NumberOp::GreaterThan => value > *filter,
                NumberOp::GreaterThanOrEqual => value >= *filter,
                NumberOp::InRange => {
                    let to = filter_to.unwrap_or(*filter);
                    let (lo, hi) = if *filter <= to { (*filter, to) } else { (to, *filter) };
                    value >= lo && value <= hi
                }
            }
        }
        ColumnFilter::Set { values } => {
            let value = cell.to_string();
            values.iter().any(|v| v.eq_ignore_ascii_case(&value))
        }
        ColumnFilter::Date {
            op,
            date_from,
            date_to,
        } => {
            let Some(value) = cell.as_date() else {
                return *op == DateOp::NotEqual;
            };
            match op {
                DateOp::Equals => value == *date_from,
                DateOp::NotEqual => value != *date_from,
                DateOp::LessThan => value < *date_from,
                DateOp::GreaterThan => value > *date_from,
                DateOp::InRange => {
                    let to = date_to.unwrap_or(*date_from);
                    let (lo, hi) = if *date_from <= to { (*date_from, to) } else { (to, *date_from) };
                    value >= lo && value <= hi
                }
            }
        }
    }
}

/// Search, then column filters, then skill selection, in record order.
///
/// Search and column filters combine with AND. Skills combine with AND as
/// well: a record must list every selected skill. Sorting is the grid's job.
pub fn visible_rows<'a>(records: &'a [Application], state: &ViewState) -> Vec<&'a Application> {
    records
        .iter()
        .filter(|app| matches_search(app, &state.search_query))
        .filter(|app| {
            if state.filters.is_empty() {
                return true;
            }
            let row = flatten(app);
            state
                .filters
                .iter()
                .all(|(col_id, filter)| matches_filter(row.get(col_id), filter))
        })
        .filter(|app| state.skills.iter().all(|skill| app.has_skill(skill)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub average_match: Option<f64>,
    pub willing_to_relocate: usize,
    pub by_status: BTreeMap<String, usize>,
    pub distinct_skills: usize,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

pub fn summarize(rows: &[&Application]) -> Summary {
    let total = rows.len();
    let average_match = (total > 0)
        .then(|| rows.iter().map(|app| app.match_percentage).sum::<f64>() / total as f64);
    let mut by_status = BTreeMap::new();
    for app in rows {
        let status = if app.application_status.is_empty() {
            "unknown"
        } else {
            app.application_status.as_str()
        };
        *by_status.entry(status.to_string()).or_insert(0) += 1;
    }
    let dates: Vec<NaiveDate> = rows.iter().filter_map(|app| app.created_date()).collect();
    Summary {
        total,
        average_match,
        willing_to_relocate: rows.iter().filter(|app| app.willing_to_relocate).count(),
        by_status,
        distinct_skills: unique_skills(rows.iter().copied()).len(),
        earliest: dates.iter().min().copied(),
        latest: dates.iter().max().copied(),
    }
}
