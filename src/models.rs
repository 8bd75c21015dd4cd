use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FilterExprError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "experience", deserialize_with = "string_or_number")]
    pub years: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub job_id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub employer: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub ctc: String, // LPA
    #[serde(default, rename = "expectedCTC", deserialize_with = "string_or_number")]
    pub expected_ctc: String, // LPA
    #[serde(default, rename = "offerCTC", deserialize_with = "string_or_number")]
    pub offer_ctc: String,
    #[serde(default)]
    pub current_contract_type: Option<String>,
    #[serde(default)]
    pub current_work_type: Option<String>,
    #[serde(default)]
    pub preferred_work_type: String,
    #[serde(default)]
    pub match_percentage: f64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub offers_in_hand: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub overall_experience: String, // years
    #[serde(default)]
    pub willing_to_relocate: bool,
    #[serde(default, deserialize_with = "string_or_number")]
    pub notice_period: String, // days
    #[serde(default)]
    pub application_status: String, // "applied", "shortlisted", "interview", "offered", "rejected"
    #[serde(default)]
    pub attachment_file_extension: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl Application {
    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s.name == name)
    }

    pub fn skill_years(&self, name: &str) -> Option<&str> {
        self.skills
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.years.as_str())
    }

    /// Calendar day the application was created, if `created_at` parses.
    pub fn created_date(&self) -> Option<NaiveDate> {
        parse_day(&self.created_at)
    }
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` days.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        })
}

// The data file is loose about numbers: "5", 5 and 5.5 all show up.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        Some(Raw::Flag(b)) => b.to_string(),
        None => String::new(),
    })
}

// --- View state value types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "▲",
            Self::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortItem {
    #[serde(rename = "colId")]
    pub col_id: String,
    pub sort: SortDirection,
}

impl SortItem {
    pub fn new(col_id: impl Into<String>, sort: SortDirection) -> Self {
        Self {
            col_id: col_id.into(),
            sort,
        }
    }
}

/// Display order and optional width of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    #[serde(rename = "colId")]
    pub col_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Text,
    Number,
    Set,
    Date,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Set => "set",
            Self::Date => "date",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextOp {
    Contains,
    NotContains,
    Equals,
    NotEqual,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberOp {
    Equals,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    InRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateOp {
    Equals,
    NotEqual,
    LessThan,
    GreaterThan,
    InRange,
}

/// One column's filter predicate, serialized the way grid filter models are
/// (`{"filterType":"text","type":"contains","filter":"..."}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filterType", rename_all = "lowercase")]
pub enum ColumnFilter {
    Text {
        #[serde(rename = "type")]
        op: TextOp,
        filter: String,
    },
    Number {
        #[serde(rename = "type")]
        op: NumberOp,
        filter: f64,
        #[serde(rename = "filterTo", default, skip_serializing_if = "Option::is_none")]
        filter_to: Option<f64>,
    },
    Set {
        values: Vec<String>,
    },
    Date {
        #[serde(rename = "type")]
        op: DateOp,
        #[serde(rename = "dateFrom")]
        date_from: NaiveDate,
        #[serde(rename = "dateTo", default, skip_serializing_if = "Option::is_none")]
        date_to: Option<NaiveDate>,
    },
}

static COMPARISON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(>=|<=|!=|>|<|=)?\s*(.+)$").expect("valid regex"));
static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\.\.\s*(.+)$").expect("valid regex"));

impl ColumnFilter {
    /// Parse the compact prompt syntax used by the filter box and `--filter`.
    ///
    /// An empty expression means "no filter" and yields `Ok(None)`.
    pub fn parse_expression(kind: FilterKind, expr: &str) -> Result<Option<Self>, FilterExprError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(None);
        }

        let filter = match kind {
            FilterKind::Text => {
                let (op, rest) = match expr.chars().next() {
                    Some('=') => (TextOp::Equals, &expr[1..]),
                    Some('!') => (TextOp::NotContains, &expr[1..]),
                    Some('^') => (TextOp::StartsWith, &expr[1..]),
                    Some('$') => (TextOp::EndsWith, &expr[1..]),
                    _ => (TextOp::Contains, expr),
                };
                Self::Text {
                    op,
                    filter: rest.trim().to_string(),
                }
            }
            FilterKind::Number => {
                if let Some(caps) = RANGE.captures(expr) {
                    Self::Number {
                        op: NumberOp::InRange,
                        filter: parse_number(&caps[1])?,
                        filter_to: Some(parse_number(&caps[2])?),
                    }
                } else {
                    let (op, value) = split_comparison(expr)?;
                    let op = match op {
                        "" | "=" => NumberOp::Equals,
                        "!=" => NumberOp::NotEqual,
                        "<" => NumberOp::LessThan,
                        "<=" => NumberOp::LessThanOrEqual,
                        ">" => NumberOp::GreaterThan,
                        _ => NumberOp::GreaterThanOrEqual,
                    };
                    Self::Number {
                        op,
                        filter: parse_number(value)?,
                        filter_to: None,
                    }
                }
            }
            FilterKind::Set => {
                let values: Vec<String> = expr
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(ToString::to_string)
                    .collect();
                if values.is_empty() {
                    return Ok(None);
                }
                Self::Set { values }
            }
            FilterKind::Date => {
                if let Some(caps) = RANGE.captures(expr) {
                    Self::Date {
                        op: DateOp::InRange,
                        date_from: parse_date(&caps[1])?,
                        date_to: Some(parse_date(&caps[2])?),
                    }
                } else {
                    let (op, value) = split_comparison(expr)?;
                    let op = match op {
                        "" | "=" => DateOp::Equals,
                        "!=" => DateOp::NotEqual,
                        "<" => DateOp::LessThan,
                        ">" => DateOp::GreaterThan,
                        other => {
                            return Err(FilterExprError::UnsupportedOperator {
                                op: other.to_string(),
                                kind,
                            });
                        }
                    };
                    Self::Date {
                        op,
                        date_from: parse_date(value)?,
                        date_to: None,
                    }
                }
            }
        };
        Ok(Some(filter))
    }
}

impl fmt::Display for ColumnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { op, filter } => {
                let op = match op {
                    TextOp::Contains => "contains",
                    TextOp::NotContains => "not contains",
                    TextOp::Equals => "=",
                    TextOp::NotEqual => "!=",
                    TextOp::StartsWith => "starts with",
                    TextOp::EndsWith => "ends with",
                };
                write!(f, "{} \"{}\"", op, filter)
            }
            Self::Number {
                op: NumberOp::InRange,
                filter,
                filter_to,
            } => write!(f, "{}..{}", filter, filter_to.unwrap_or(*filter)),
            Self::Number { op, filter, .. } => {
                let op = match op {
                    NumberOp::Equals | NumberOp::InRange => "=",
                    NumberOp::NotEqual => "!=",
                    NumberOp::LessThan => "<",
                    NumberOp::LessThanOrEqual => "<=",
                    NumberOp::GreaterThan => ">",
                    NumberOp::GreaterThanOrEqual => ">=",
                };
                write!(f, "{} {}", op, filter)
            }
            Self::Set { values } => write!(f, "in [{}]", values.join(", ")),
            Self::Date {
                op: DateOp::InRange,
                date_from,
                date_to,
            } => write!(f, "{}..{}", date_from, date_to.unwrap_or(*date_from)),
            Self::Date { op, date_from, .. } => {
                let op = match op {
                    DateOp::Equals | DateOp::InRange => "=",
                    DateOp::NotEqual => "!=",
                    DateOp::LessThan => "before",
                    DateOp::GreaterThan => "after",
                };
                write!(f, "{} {}", op, date_from)
            }
        }
    }
}

fn split_comparison(expr: &str) -> Result<(&str, &str), FilterExprError> {
    let caps = COMPARISON
        .captures(expr)
        .ok_or_else(|| FilterExprError::Malformed(expr.to_string()))?;
    let op = caps.get(1).map_or("", |m| m.as_str());
    let value = caps.get(2).map_or("", |m| m.as_str());
    Ok((op, value))
}

fn parse_number(raw: &str) -> Result<f64, FilterExprError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FilterExprError::NotANumber(raw.trim().to_string()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, FilterExprError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| FilterExprError::NotADate(raw.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_accepts_loose_numbers() {
        let json = r#"{
            "id": "a1",
            "name": "Alice Smith",
            "ctc": 12.5,
            "expectedCTC": "18",
            "offerCTC": null,
            "overallExperience": 6,
            "matchPercentage": 82,
            "skills": [{"name": "Go", "years": 3}, {"name": "Rust", "experience": "2"}]
        }"#;
        let app: Application = serde_json::from_str(json).unwrap();
        assert_eq!(app.ctc, "12.5");
        assert_eq!(app.expected_ctc, "18");
        assert_eq!(app.offer_ctc, "");
        assert_eq!(app.overall_experience, "6");
        assert_eq!(app.skill_years("Go"), Some("3"));
        assert_eq!(app.skill_years("Rust"), Some("2"));
        assert!(app.has_skill("Rust"));
        assert!(!app.has_skill("rust"));
    }

    #[test]
    fn parse_day_handles_timestamps_and_days() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_day("2024-03-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_day("2024-03-15T10:30:00.000"), Some(expected));
        assert_eq!(parse_day("2024-03-15"), Some(expected));
        assert_eq!(parse_day("yesterday"), None);
        assert_eq!(parse_day(""), None);
    }

    #[test]
    fn column_filter_json_shape() {
        let filter = ColumnFilter::Number {
            op: NumberOp::GreaterThanOrEqual,
            filter: 5.0,
            filter_to: None,
        };
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(json, r#"{"filterType":"number","type":"greaterThanOrEqual","filter":5.0}"#);

        let text: ColumnFilter =
            serde_json::from_str(r#"{"filterType":"text","type":"startsWith","filter":"Ban"}"#).unwrap();
        assert_eq!(
            text,
            ColumnFilter::Text {
                op: TextOp::StartsWith,
                filter: "Ban".to_string()
            }
        );
    }

    #[test]
    fn parse_expression_per_kind() {
        assert_eq!(
            ColumnFilter::parse_expression(FilterKind::Text, "^ban").unwrap(),
            Some(ColumnFilter::Text {
                op: TextOp::StartsWith,
                filter: "ban".to_string()
            })
        );
        assert_eq!(
            ColumnFilter::parse_expression(FilterKind::Number, ">= 5").unwrap(),
            Some(ColumnFilter::Number {
                op: NumberOp::GreaterThanOrEqual,
                filter: 5.0,
                filter_to: None
            })
        );
        assert_eq!(
            ColumnFilter::parse_expression(FilterKind::Number, "3..7").unwrap(),
            Some(ColumnFilter::Number {
                op: NumberOp::InRange,
                filter: 3.0,
                filter_to: Some(7.0)
            })
        );
        assert_eq!(
            ColumnFilter::parse_expression(FilterKind::Set, "Remote, Hybrid").unwrap(),
            Some(ColumnFilter::Set {
                values: vec!["Remote".to_string(), "Hybrid".to_string()]
            })
        );
        assert_eq!(
            ColumnFilter::parse_expression(FilterKind::Date, ">2024-01-01").unwrap(),
            Some(ColumnFilter::Date {
                op: DateOp::GreaterThan,
                date_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                date_to: None
            })
        );
        assert_eq!(ColumnFilter::parse_expression(FilterKind::Text, "   ").unwrap(), None);
    }

    #[test]
    fn parse_expression_rejects_garbage() {
        assert!(matches!(
            ColumnFilter::parse_expression(FilterKind::Number, ">abc"),
            Err(FilterExprError::NotANumber(_))
        ));
        assert!(matches!(
            ColumnFilter::parse_expression(FilterKind::Date, "31/01/2024"),
            Err(FilterExprError::NotADate(_))
        ));
        assert!(matches!(
            ColumnFilter::parse_expression(FilterKind::Date, ">=2024-01-01"),
            Err(FilterExprError::UnsupportedOperator { .. })
        ));
    }
}
