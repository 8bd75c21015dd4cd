//! The single owned view state and its update contract.
//!
//! Everything the dashboard shows is a function of [`ViewState`] plus the
//! static record store. The store holds nothing that cannot be written to
//! the view link, and every accepted update is mirrored through
//! [`UrlSync`] before `update_state` returns.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::models::{ColumnFilter, ColumnLayout, SortItem};
use crate::url_state::{Navigator, QueryString, UrlSync, ViewField, encode_view_state};

pub const DEFAULT_PAGE_SIZE: usize = 20;

pub type FilterModel = BTreeMap<String, ColumnFilter>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based in memory; the link carries it one-based.
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub search_query: String,
    /// Selected skills; a row must have all of them.
    pub skills: BTreeSet<String>,
    pub filters: FilterModel,
    /// Priority order: first item is the primary sort key.
    pub sort_model: Vec<SortItem>,
    pub hidden_columns: BTreeSet<String>,
    pub column_layout: Vec<ColumnLayout>,
    pub pagination: Pagination,
}

impl ViewState {
    pub fn sort_for(&self, col_id: &str) -> Option<(usize, &SortItem)> {
        self.sort_model
            .iter()
            .enumerate()
            .find(|(_, item)| item.col_id == col_id)
    }
}

/// A shallow partial update. `Some` fields replace the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewStatePatch {
    pub search_query: Option<String>,
    pub skills: Option<BTreeSet<String>>,
    pub filters: Option<FilterModel>,
    pub sort_model: Option<Vec<SortItem>>,
    pub hidden_columns: Option<BTreeSet<String>>,
    pub column_layout: Option<Vec<ColumnLayout>>,
    pub page_index: Option<usize>,
    pub page_size: Option<usize>,
}

impl ViewStatePatch {
    #[must_use]
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    #[must_use]
    pub fn skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = Some(skills.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn filters(mut self, filters: FilterModel) -> Self {
        self.filters = Some(filters);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort_model: Vec<SortItem>) -> Self {
        self.sort_model = Some(sort_model);
        self
    }

    #[must_use]
    pub fn hidden<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: Vec<ColumnLayout>) -> Self {
        self.column_layout = Some(layout);
        self
    }

    #[must_use]
    pub fn page(mut self, page_index: usize) -> Self {
        self.page_index = Some(page_index);
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge onto `state`, producing the next state.
    pub fn apply(self, state: &ViewState) -> ViewState {
        let mut next = state.clone();
        if let Some(search_query) = self.search_query {
            next.search_query = search_query;
        }
        if let Some(skills) = self.skills {
            next.skills = skills;
        }
        if let Some(filters) = self.filters {
            next.filters = filters;
        }
        if let Some(sort_model) = self.sort_model {
            next.sort_model = sort_model;
        }
        if let Some(hidden_columns) = self.hidden_columns {
            next.hidden_columns = hidden_columns;
        }
        if let Some(column_layout) = self.column_layout {
            next.column_layout = column_layout;
        }
        if let Some(page_index) = self.page_index {
            next.pagination.page_index = page_index;
        }
        if let Some(page_size) = self.page_size {
            next.pagination.page_size = if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            };
        }
        next
    }
}

pub struct ViewStateStore<N: Navigator> {
    state: ViewState,
    sync: UrlSync<N>,
}

impl<N: Navigator> ViewStateStore<N> {
    /// Restore state from whatever the navigator currently points at.
    pub fn new(navigator: N) -> Self {
        let sync = UrlSync::new(navigator);
        let state = sync.read();
        Self { state, sync }
    }

    pub fn get_state(&self) -> &ViewState {
        &self.state
    }

    pub fn update_state(&mut self, patch: ViewStatePatch) {
        if patch.is_empty() {
            return;
        }
        let next = patch.apply(&self.state);
        if next == self.state {
            return;
        }
        let changed: Vec<&str> = ViewField::ALL
            .iter()
            .filter(|field| field.changed(&self.state, &next))
            .map(|field| field.key())
            .collect();
        debug!(?changed, "view state updated");

        self.sync.write(&self.state, &next);
        self.state = next;
    }

    /// Functional form: compute the patch from the latest state.
    pub fn update_with<F>(&mut self, f: F)
    where
        F: FnOnce(&ViewState) -> ViewStatePatch,
    {
        let patch = f(&self.state);
        self.update_state(patch);
    }

    /// Shareable `?query` for the current view, including foreign params.
    pub fn link(&self) -> String {
        let query = self.sync.navigator().current_query();
        if query.is_empty() {
            String::new()
        } else {
            format!("?{}", query)
        }
    }

    /// Like [`link`](Self::link), with every owned field re-encoded canonically.
    pub fn canonical_link(&self) -> String {
        let current = QueryString::parse(&self.sync.navigator().current_query());
        let query = encode_view_state(&self.state, &current).to_string();
        if query.is_empty() {
            String::new()
        } else {
            format!("?{}", query)
        }
    }

    pub fn navigator(&self) -> &N {
        self.sync.navigator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortDirection;
    use crate::url_state::MemoryLocation;

    #[test]
    fn store_restores_from_location() {
        let store = ViewStateStore::new(MemoryLocation::new("?search=smith&page=3&pageSize=50"));
        let state = store.get_state();
        assert_eq!(state.search_query, "smith");
        assert_eq!(state.pagination.page_index, 2);
        assert_eq!(state.pagination.page_size, 50);
    }

    #[test]
    fn identical_updates_write_once() {
        let mut store = ViewStateStore::new(MemoryLocation::new(""));
        store.update_state(ViewStatePatch::default().search("smith"));
        store.update_state(ViewStatePatch::default().search("smith"));
        assert_eq!(store.navigator().replacements(), 1);
        assert_eq!(store.link(), "?search=smith");
    }

    #[test]
    fn clearing_search_and_skills_is_one_write() {
        let mut store = ViewStateStore::new(MemoryLocation::new("?search=go&skills=Go%2CRust&view=compact"));
        assert_eq!(store.get_state().skills.len(), 2);

        store.update_state(ViewStatePatch::default().search("").skills(Vec::<String>::new()));

        let location = store.navigator();
        assert_eq!(location.replacements(), 1);
        let query = location.current_query();
        assert!(!query.contains("search"));
        assert!(!query.contains("skills"));
        assert_eq!(query, "view=compact");
    }

    #[test]
    fn update_with_sees_latest_state() {
        let mut store = ViewStateStore::new(MemoryLocation::new("?page=2"));
        store.update_with(|prev| ViewStatePatch::default().page(prev.pagination.page_index + 1));
        store.update_with(|prev| ViewStatePatch::default().page(prev.pagination.page_index + 1));
        assert_eq!(store.get_state().pagination.page_index, 3);
        assert_eq!(store.link(), "?page=4");
        assert_eq!(store.navigator().replacements(), 2);
    }

    #[test]
    fn returning_to_defaults_removes_params() {
        let mut store = ViewStateStore::new(MemoryLocation::new(""));
        store.update_state(
            ViewStatePatch::default()
                .sort(vec![SortItem::new("name", SortDirection::Asc)])
                .page(4)
                .page_size(50),
        );
        assert_eq!(store.navigator().replacements(), 1);

        store.update_state(ViewStatePatch::default().sort(Vec::new()).page(0).page_size(DEFAULT_PAGE_SIZE));
        assert_eq!(store.link(), "");
        assert_eq!(store.get_state(), &ViewState::default());
    }

    #[test]
    fn canonical_link_reencodes_owned_params() {
        let store = ViewStateStore::new(MemoryLocation::new("?skills=Rust,,Go&page=1&ref=mail"));
        assert_eq!(store.canonical_link(), "?skills=Go%2CRust&ref=mail");
        assert_eq!(store.navigator().replacements(), 0);
    }

    #[test]
    fn zero_page_size_falls_back_to_default() {
        let state = ViewStatePatch::default().page_size(0).apply(&ViewState::default());
        assert_eq!(state.pagination.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn empty_patch_is_noop() {
        let mut store = ViewStateStore::new(MemoryLocation::new("?search=x"));
        store.update_state(ViewStatePatch::default());
        assert_eq!(store.navigator().replacements(), 0);
    }
}
