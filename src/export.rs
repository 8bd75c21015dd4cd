//! Export of application rows to CSV, XLSX and a paginated text report.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use comfy_table::presets::ASCII_FULL_CONDENSED;
use comfy_table::{Cell, ContentArrangement, Table};
use rust_xlsxwriter::{Format, Workbook};
use tracing::{error, info};

use crate::error::ExportError;
use crate::models::{Application, parse_day};
use crate::view_model::unique_skills;

pub const REPORT_TITLE: &str = "Job Applications Report";
pub const SHEET_NAME: &str = "Applications";
pub const DEFAULT_REPORT_ROWS_PER_PAGE: usize = 40;
const MIN_XLSX_WIDTH: usize = 12;

const HEADERS: &[&str] = &[
    "ID",
    "Name",
    "Email",
    "Phone",
    "Location",
    "Employer",
    "Experience (Years)",
    "Current Work Type",
    "Preferred Work Type",
    "Current CTC (LPA)",
    "Expected CTC (LPA)",
    "Status",
    "Match %",
    "Applied Date",
    "Willing to Relocate",
    "Notice Period (Days)",
    "Offers in Hand",
    "Current Contract Type",
    "Attachment Extension",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Report,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Report => "txt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xlsx => "Excel",
            Self::Report => "report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DateFormat {
    /// 15/03/2024
    #[default]
    Short,
    /// 15 March 2024
    Long,
    /// 2024-03-15
    Iso,
}

impl DateFormat {
    /// Unparsable dates pass through unchanged.
    pub fn format(self, raw: &str) -> String {
        let Some(day) = parse_day(raw) else {
            return raw.to_string();
        };
        let pattern = match self {
            Self::Short => "%d/%m/%Y",
            Self::Long => "%-d %B %Y",
            Self::Iso => "%Y-%m-%d",
        };
        day.format(pattern).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_skills: bool,
    pub date_format: DateFormat,
    pub report_rows_per_page: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_skills: true,
            date_format: DateFormat::default(),
            report_rows_per_page: DEFAULT_REPORT_ROWS_PER_PAGE,
        }
    }
}

/// Flat, all-text table handed to the serializers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Worksheet width per column: header length, at least 12.
    pub fn column_width_hints(&self) -> Vec<usize> {
        self.headers
            .iter()
            .map(|h| h.chars().count().max(MIN_XLSX_WIDTH))
            .collect()
    }
}

pub fn transform_for_export(records: &[&Application], options: &ExportOptions) -> ExportTable {
    let skills = if options.include_skills {
        unique_skills(records.iter().copied())
    } else {
        Vec::new()
    };

    let mut headers: Vec<String> = HEADERS.iter().map(ToString::to_string).collect();
    headers.extend(skills.iter().map(|name| format!("{} (Years)", name)));

    let rows = records
        .iter()
        .map(|app| {
            let mut row = vec![
                app.id.clone(),
                app.name.clone(),
                app.email.clone(),
                app.phone.clone(),
                app.location.clone(),
                app.employer.clone(),
                app.overall_experience.clone(),
                app.current_work_type.clone().unwrap_or_default(),
                app.preferred_work_type.clone(),
                app.ctc.clone(),
                app.expected_ctc.clone(),
                app.application_status.clone(),
                app.match_percentage.to_string(),
                options.date_format.format(&app.created_at),
                if app.willing_to_relocate { "Yes" } else { "No" }.to_string(),
                app.notice_period.clone(),
                app.offers_in_hand.clone(),
                app.current_contract_type.clone().unwrap_or_default(),
                app.attachment_file_extension.clone(),
            ];
            row.extend(
                skills
                    .iter()
                    .map(|name| app.skill_years(name).unwrap_or_default().to_string()),
            );
            row
        })
        .collect();

    ExportTable { headers, rows }
}

pub fn to_csv(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

pub fn to_xlsx(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    let bold = Format::new().set_bold();

    let widths = table.column_width_hints();
    for (col, header) in table.headers.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| ExportError::TooManyColumns(table.headers.len()))?;
        worksheet.write_string_with_format(0, col, header, &bold)?;
        worksheet.set_column_width(col, widths[usize::from(col)] as f64)?;
    }
    for (row_index, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(row_index + 1).unwrap_or(u32::MAX);
        for (col, value) in row.iter().enumerate() {
            let col =
                u16::try_from(col).map_err(|_| ExportError::TooManyColumns(table.headers.len()))?;
            worksheet.write_string(row_num, col, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Plain-text report: title block, table and `Page i of n` footer per page,
/// pages separated by form feeds.
pub fn to_report(table: &ExportTable, generated: NaiveDateTime, rows_per_page: usize) -> String {
    let rows_per_page = rows_per_page.max(1);
    let chunks: Vec<&[Vec<String>]> = if table.rows.is_empty() {
        vec![&table.rows[..]]
    } else {
        table.rows.chunks(rows_per_page).collect()
    };
    let page_count = chunks.len();

    let pages: Vec<String> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut body = Table::new();
            body.load_preset(ASCII_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Disabled)
                .set_header(table.headers.iter().map(Cell::new));
            for row in chunk.iter() {
                body.add_row(row.iter().map(Cell::new));
            }
            format!(
                "{}\nGenerated on {}\nTotal Applications: {}\n\n{}\n\nPage {} of {}\n",
                REPORT_TITLE,
                generated.format("%Y-%m-%d %H:%M"),
                table.rows.len(),
                body,
                i + 1,
                page_count
            )
        })
        .collect();

    pages.join("\x0c")
}

pub fn export_filename(format: ExportFormat, day: NaiveDate) -> String {
    format!("applications-{}.{}", day.format("%Y-%m-%d"), format.extension())
}

pub fn render(
    table: &ExportTable,
    format: ExportFormat,
    generated: NaiveDateTime,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(table),
        ExportFormat::Xlsx => to_xlsx(table),
        ExportFormat::Report => {
            Ok(to_report(table, generated, options.report_rows_per_page).into_bytes())
        }
    }
}

/// Transform, serialize and write `records` into `dir`. Returns the path written.
pub fn export_records(
    records: &[&Application],
    format: ExportFormat,
    options: &ExportOptions,
    dir: &Path,
    generated: NaiveDateTime,
) -> Result<PathBuf, ExportError> {
    let result = write_export(records, format, options, dir, generated);
    match &result {
        Ok(path) => info!(
            format = format.label(),
            rows = records.len(),
            path = %path.display(),
            "export written"
        ),
        Err(e) => error!(format = format.label(), "export failed: {}", e),
    }
    result
}

fn write_export(
    records: &[&Application],
    format: ExportFormat,
    options: &ExportOptions,
    dir: &Path,
    generated: NaiveDateTime,
) -> Result<PathBuf, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }
    let table = transform_for_export(records, options);
    let bytes = render(&table, format, generated, options)?;

    let path = dir.join(export_filename(format, generated.date()));
    fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    fs::write(&path, bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_model::fixtures::app;

    fn generated() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn csv_has_header_plus_rows_and_quotes_commas() {
        let mut records: Vec<Application> = (0..10)
            .map(|i| app(&format!("app-{}", i), &format!("Person {}", i), &[]))
            .collect();
        records[3].location = "Bengaluru, KA".to_string();
        let chosen = vec![&records[3], &records[7]];

        let table = transform_for_export(&chosen, &ExportOptions::default());
        let csv = String::from_utf8(to_csv(&table).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID,Name,Email,Phone,Location"));
        assert!(lines[1].contains("\"Bengaluru, KA\""));
        assert!(csv.ends_with('\n'));
        assert!(!csv.contains('\r'));
    }

    #[test]
    fn quotes_are_doubled() {
        let record = app("1", "Siddharth \"Sid\" Rao", &[]);
        let table = transform_for_export(&[&record], &ExportOptions::default());
        let csv = String::from_utf8(to_csv(&table).unwrap()).unwrap();
        assert!(csv.contains("\"Siddharth \"\"Sid\"\" Rao\""));
    }

    #[test]
    fn skill_columns_follow_options() {
        let a = app("1", "A", &[("Rust", "4")]);
        let b = app("2", "B", &[("Go", "2")]);
        let table = transform_for_export(&[&a, &b], &ExportOptions::default());
        let go = table.headers.iter().position(|h| h == "Go (Years)").unwrap();
        let rust = table.headers.iter().position(|h| h == "Rust (Years)").unwrap();
        assert!(go < rust);
        assert_eq!(table.rows[0][rust], "4");
        assert_eq!(table.rows[0][go], "");

        let options = ExportOptions {
            include_skills: false,
            ..ExportOptions::default()
        };
        let table = transform_for_export(&[&a, &b], &options);
        assert_eq!(table.headers.len(), HEADERS.len());
    }

    #[test]
    fn dates_follow_format() {
        let raw = "2024-03-15T10:00:00Z";
        assert_eq!(DateFormat::Short.format(raw), "15/03/2024");
        assert_eq!(DateFormat::Long.format(raw), "15 March 2024");
        assert_eq!(DateFormat::Iso.format(raw), "2024-03-15");
        assert_eq!(DateFormat::Short.format("soon"), "soon");
    }

    #[test]
    fn width_hints_have_a_floor() {
        let a = app("1", "A", &[]);
        let table = transform_for_export(&[&a], &ExportOptions::default());
        let hints = table.column_width_hints();
        assert_eq!(hints[0], 12);
        assert_eq!(hints[15], "Notice Period (Days)".len());
    }

    #[test]
    fn report_paginates() {
        let records: Vec<Application> = (0..5)
            .map(|i| app(&format!("app-{}", i), "Name", &[]))
            .collect();
        let refs: Vec<&Application> = records.iter().collect();
        let table = transform_for_export(&refs, &ExportOptions::default());
        let report = to_report(&table, generated(), 2);
        let pages: Vec<&str> = report.split('\x0c').collect();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].starts_with(REPORT_TITLE));
        assert!(pages[0].contains("Total Applications: 5"));
        assert!(pages[2].contains("Page 3 of 3"));
        assert!(pages[2].contains("app-4"));
    }

    #[test]
    fn empty_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_records(&[], ExportFormat::Csv, &ExportOptions::default(), dir.path(), generated())
            .unwrap_err();
        assert!(matches!(err, ExportError::Empty));
        assert_eq!(err.to_string(), "no data to export");
    }

    #[test]
    fn writes_dated_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = app("1", "A", &[("Rust", "4")]);
        let path = export_records(&[&a], ExportFormat::Xlsx, &ExportOptions::default(), dir.path(), generated())
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "applications-2024-03-20.xlsx");
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let path = export_records(&[&a], ExportFormat::Report, &ExportOptions::default(), dir.path(), generated())
            .unwrap();
        assert_eq!(path.extension().unwrap(), "txt");
    }
}
