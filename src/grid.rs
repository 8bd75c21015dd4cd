//! The table widget model: column layout, sorting, pagination and selection
//! over a set of already-filtered rows.
//!
//! Programmatic `apply_*` calls configure the widget silently. User
//! interactions return the [`GridEvent`] they cause, which the adapter turns
//! into view-state updates.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ColumnFilter, ColumnLayout, SortDirection, SortItem};
use crate::view_model::{CellValue, ColumnSpec, Row};
use crate::view_state::{FilterModel, Pagination};

pub const MIN_COLUMN_WIDTH: u16 = 3;
pub const MAX_COLUMN_WIDTH: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    SortChanged,
    FilterChanged,
    ColumnVisibilityChanged,
    ColumnMoved,
    ColumnResized,
    PaginationChanged,
    SelectionChanged,
}

pub struct GridWidget {
    /// Display order.
    columns: Vec<ColumnSpec>,
    default_order: Vec<String>,
    widths: BTreeMap<String, u16>,
    hidden: BTreeSet<String>,
    rows: Vec<Row>,
    order: Vec<usize>,
    sort_model: Vec<SortItem>,
    filter_model: FilterModel,
    pagination: Pagination,
    selected: BTreeSet<String>,
}

impl GridWidget {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        let default_order = columns.iter().map(|c| c.id.clone()).collect();
        Self {
            columns,
            default_order,
            widths: BTreeMap::new(),
            hidden: BTreeSet::new(),
            rows: Vec::new(),
            order: Vec::new(),
            sort_model: Vec::new(),
            filter_model: FilterModel::new(),
            pagination: Pagination::default(),
            selected: BTreeSet::new(),
        }
    }

    // --- Programmatic configuration (no events) ---

    /// Replace the row set. Returns `PaginationChanged` when the current
    /// page no longer exists and had to be clamped.
    pub fn set_rows(&mut self, rows: Vec<Row>) -> Option<GridEvent> {
        let ids: BTreeSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        self.selected.retain(|id| ids.contains(id.as_str()));
        self.rows = rows;
        self.resort();
        self.clamp_page().then_some(GridEvent::PaginationChanged)
    }

    pub fn apply_sort_model(&mut self, sort_model: &[SortItem]) {
        self.sort_model = sort_model.to_vec();
        self.resort();
    }

    pub fn apply_filter_model(&mut self, filter_model: &FilterModel) {
        self.filter_model = filter_model.clone();
    }

    pub fn apply_hidden(&mut self, hidden: &BTreeSet<String>) {
        self.hidden = hidden.clone();
    }

    /// Listed columns first in the given order, the rest in default order.
    pub fn apply_layout(&mut self, layout: &[ColumnLayout]) {
        let mut remaining: Vec<ColumnSpec> = std::mem::take(&mut self.columns);
        remaining.sort_by_key(|c| self.default_position(&c.id));
        let mut ordered = Vec::with_capacity(remaining.len());
        self.widths.clear();
        for entry in layout {
            let Some(pos) = remaining.iter().position(|c| c.id == entry.col_id) else {
                continue;
            };
            ordered.push(remaining.remove(pos));
            if let Some(width) = entry.width {
                self.widths
                    .insert(entry.col_id.clone(), width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH));
            }
        }
        ordered.extend(remaining);
        self.columns = ordered;
    }

    pub fn apply_pagination(&mut self, pagination: Pagination) {
        self.pagination = Pagination {
            page_index: pagination.page_index,
            page_size: pagination.page_size.max(1),
        };
        self.clamp_page();
    }

    // --- Reads ---

    pub fn sort_model(&self) -> &[SortItem] {
        &self.sort_model
    }

    pub fn filter_model(&self) -> &FilterModel {
        &self.filter_model
    }

    pub fn hidden_columns(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    /// Empty while the layout is the default one.
    pub fn column_layout(&self) -> Vec<ColumnLayout> {
        let reordered = self
            .columns
            .iter()
            .map(|c| &c.id)
            .ne(self.default_order.iter());
        if !reordered && self.widths.is_empty() {
            return Vec::new();
        }
        self.columns
            .iter()
            .map(|c| ColumnLayout {
                col_id: c.id.clone(),
                width: self.widths.get(&c.id).copied(),
            })
            .collect()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.pagination.page_size).max(1)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, col_id: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.id == col_id)
    }

    pub fn is_visible(&self, col_id: &str) -> bool {
        !self.hidden.contains(col_id)
    }

    pub fn visible_columns(&self) -> Vec<&ColumnSpec> {
        self.columns.iter().filter(|c| self.is_visible(&c.id)).collect()
    }

    pub fn width_of(&self, col_id: &str) -> u16 {
        self.widths
            .get(col_id)
            .copied()
            .or_else(|| self.column(col_id).map(|c| c.width))
            .unwrap_or(MIN_COLUMN_WIDTH)
    }

    /// Every row in sorted order.
    pub fn sorted_rows(&self) -> impl Iterator<Item = &Row> {
        self.order.iter().map(|&i| &self.rows[i])
    }

    pub fn page_rows(&self) -> Vec<&Row> {
        let Pagination {
            page_index,
            page_size,
        } = self.pagination;
        self.sorted_rows()
            .skip(page_index * page_size)
            .take(page_size)
            .collect()
    }

    pub fn selected_ids(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn is_selected(&self, row_id: &str) -> bool {
        self.selected.contains(row_id)
    }

    // --- User interactions ---

    /// Cycle a column through ascending, descending and unsorted. With
    /// `multi` the other sort keys are kept.
    pub fn sort_column(&mut self, col_id: &str, multi: bool) -> GridEvent {
        let current = self
            .sort_model
            .iter()
            .position(|item| item.col_id == col_id);
        let next = match current.map(|pos| self.sort_model[pos].sort) {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        };

        if !multi {
            self.sort_model.clear();
            if let Some(sort) = next {
                self.sort_model.push(SortItem::new(col_id, sort));
            }
        } else {
            match (current, next) {
                (Some(pos), Some(sort)) => self.sort_model[pos].sort = sort,
                (Some(pos), None) => {
                    self.sort_model.remove(pos);
                }
                (None, Some(sort)) => self.sort_model.push(SortItem::new(col_id, sort)),
                (None, None) => {}
            }
        }
        self.resort();
        GridEvent::SortChanged
    }

    pub fn set_column_filter(&mut self, col_id: &str, filter: Option<ColumnFilter>) -> GridEvent {
        match filter {
            Some(filter) => {
                self.filter_model.insert(col_id.to_string(), filter);
            }
            None => {
                self.filter_model.remove(col_id);
            }
        }
        GridEvent::FilterChanged
    }

    pub fn clear_filters(&mut self) -> GridEvent {
        self.filter_model.clear();
        GridEvent::FilterChanged
    }

    pub fn toggle_column(&mut self, col_id: &str) -> Option<GridEvent> {
        self.column(col_id)?;
        if !self.hidden.remove(col_id) {
            self.hidden.insert(col_id.to_string());
        }
        Some(GridEvent::ColumnVisibilityChanged)
    }

    pub fn show_all_columns(&mut self) -> GridEvent {
        self.hidden.clear();
        GridEvent::ColumnVisibilityChanged
    }

    pub fn move_column(&mut self, col_id: &str, to: usize) -> Option<GridEvent> {
        let from = self.columns.iter().position(|c| c.id == col_id)?;
        let to = to.min(self.columns.len() - 1);
        if from == to {
            return None;
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        Some(GridEvent::ColumnMoved)
    }

    pub fn resize_column(&mut self, col_id: &str, width: u16) -> Option<GridEvent> {
        self.column(col_id)?;
        let width = width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        if self.width_of(col_id) == width {
            return None;
        }
        self.widths.insert(col_id.to_string(), width);
        Some(GridEvent::ColumnResized)
    }

    pub fn go_to_page(&mut self, page_index: usize) -> GridEvent {
        self.pagination.page_index = page_index.min(self.page_count() - 1);
        GridEvent::PaginationChanged
    }

    pub fn set_page_size(&mut self, page_size: usize) -> GridEvent {
        self.pagination = Pagination {
            page_index: 0,
            page_size: page_size.max(1),
        };
        GridEvent::PaginationChanged
    }

    pub fn toggle_selection(&mut self, row_id: &str) -> GridEvent {
        if !self.selected.remove(row_id) {
            self.selected.insert(row_id.to_string());
        }
        GridEvent::SelectionChanged
    }

    // --- Internals ---

    fn default_position(&self, col_id: &str) -> usize {
        self.default_order
            .iter()
            .position(|id| id == col_id)
            .unwrap_or(usize::MAX)
    }

    fn clamp_page(&mut self) -> bool {
        let last = self.page_count() - 1;
        if self.pagination.page_index > last {
            self.pagination.page_index = last;
            true
        } else {
            false
        }
    }

    fn resort(&mut self) {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        if !self.sort_model.is_empty() {
            let rows = &self.rows;
            let sort_model = &self.sort_model;
            order.sort_by(|&a, &b| {
                for item in sort_model {
                    let ord = compare_cells(rows[a].get(&item.col_id), rows[b].get(&item.col_id));
                    let ord = match item.sort {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        self.order = order;
    }
}

/// Blank cells sort first; mixed kinds fall back to their text.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
        (CellValue::Empty, _) => Ordering::Less,
        (_, CellValue::Empty) => Ordering::Greater,
        (CellValue::Number(x), CellValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (CellValue::Date(x), CellValue::Date(y)) => x.cmp(y),
        (CellValue::Bool(x), CellValue::Bool(y)) => x.cmp(y),
        _ => a.to_string().to_lowercase().cmp(&b.to_string().to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_model::fixtures::app;
    use crate::view_model::{column_definitions, flatten};

    fn grid_with(names: &[(&str, &str, &str)]) -> GridWidget {
        let records: Vec<_> = names
            .iter()
            .map(|(id, name, exp)| {
                let mut a = app(id, name, &[]);
                a.overall_experience = exp.to_string();
                a
            })
            .collect();
        let mut grid = GridWidget::new(column_definitions(&records));
        grid.set_rows(records.iter().map(flatten).collect());
        grid
    }

    fn page_ids(grid: &GridWidget) -> Vec<String> {
        grid.page_rows().iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn sort_cycles_and_orders_rows() {
        let mut grid = grid_with(&[("1", "Carol", "5"), ("2", "alice", "10"), ("3", "Bob", "")]);
        assert_eq!(grid.sort_column("name", false), GridEvent::SortChanged);
        assert_eq!(page_ids(&grid), vec!["2", "3", "1"]);

        grid.sort_column("name", false);
        assert_eq!(page_ids(&grid), vec!["1", "3", "2"]);

        grid.sort_column("name", false);
        assert!(grid.sort_model().is_empty());
        assert_eq!(page_ids(&grid), vec!["1", "2", "3"]);
    }

    #[test]
    fn numbers_sort_numerically_with_blanks_first() {
        let mut grid = grid_with(&[("1", "A", "5"), ("2", "B", "10"), ("3", "C", "")]);
        grid.sort_column("overallExperience", false);
        assert_eq!(page_ids(&grid), vec!["3", "1", "2"]);
    }

    #[test]
    fn multi_sort_keeps_priority() {
        let mut grid = grid_with(&[("1", "A", "5"), ("2", "B", "5"), ("3", "C", "1")]);
        grid.sort_column("overallExperience", false);
        grid.sort_column("overallExperience", false); // desc
        grid.sort_column("name", true);
        grid.sort_column("name", true); // desc
        assert_eq!(
            grid.sort_model(),
            &[
                SortItem::new("overallExperience", SortDirection::Desc),
                SortItem::new("name", SortDirection::Desc),
            ]
        );
        assert_eq!(page_ids(&grid), vec!["2", "1", "3"]);
    }

    #[test]
    fn pagination_clamps() {
        let mut grid = grid_with(&[("1", "A", "1"), ("2", "B", "2"), ("3", "C", "3")]);
        grid.set_page_size(2);
        assert_eq!(grid.page_count(), 2);
        grid.go_to_page(7);
        assert_eq!(grid.pagination().page_index, 1);
        assert_eq!(page_ids(&grid), vec!["3"]);

        let event = grid.set_rows(Vec::new());
        assert_eq!(event, Some(GridEvent::PaginationChanged));
        assert_eq!(grid.pagination().page_index, 0);
        assert_eq!(grid.page_count(), 1);
    }

    #[test]
    fn layout_is_empty_until_changed() {
        let mut grid = grid_with(&[("1", "A", "1")]);
        assert!(grid.column_layout().is_empty());

        assert_eq!(grid.move_column("email", 0), Some(GridEvent::ColumnMoved));
        assert_eq!(grid.columns()[0].id, "email");
        assert_eq!(grid.resize_column("name", 40), Some(GridEvent::ColumnResized));
        let layout = grid.column_layout();
        assert_eq!(layout[0].col_id, "email");
        assert_eq!(layout.iter().find(|l| l.col_id == "name").unwrap().width, Some(40));

        let mut other = grid_with(&[("1", "A", "1")]);
        other.apply_layout(&layout);
        assert_eq!(other.column_layout(), layout);
        assert_eq!(other.width_of("name"), 40);

        other.apply_layout(&[]);
        assert!(other.column_layout().is_empty());
    }

    #[test]
    fn visibility_toggles() {
        let mut grid = grid_with(&[("1", "A", "1")]);
        assert_eq!(grid.toggle_column("email"), Some(GridEvent::ColumnVisibilityChanged));
        assert!(!grid.is_visible("email"));
        assert!(grid.visible_columns().iter().all(|c| c.id != "email"));
        assert_eq!(grid.toggle_column("nope"), None);
        grid.show_all_columns();
        assert!(grid.hidden_columns().is_empty());
    }

    #[test]
    fn selection_survives_only_for_present_rows() {
        let mut grid = grid_with(&[("1", "A", "1"), ("2", "B", "2")]);
        grid.toggle_selection("1");
        grid.toggle_selection("2");
        grid.toggle_selection("2");
        assert!(grid.is_selected("1"));
        assert!(!grid.is_selected("2"));

        grid.set_rows(Vec::new());
        assert!(grid.selected_ids().is_empty());
    }
}
