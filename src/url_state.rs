//! Query-string mirror of [`ViewState`].
//!
//! Each view-state field owns exactly one query parameter:
//!
//! | field            | param      | encoding                         |
//! |------------------|------------|----------------------------------|
//! | search query     | `search`   | verbatim                         |
//! | selected skills  | `skills`   | comma-joined, sorted             |
//! | column filters   | `filter`   | JSON object keyed by column id   |
//! | sort model       | `sort`     | JSON array of `{colId, sort}`    |
//! | hidden columns   | `hidden`   | comma-joined, sorted             |
//! | column layout    | `columns`  | JSON array of `{colId, width}`   |
//! | page             | `page`     | one-based decimal                |
//! | page size        | `pageSize` | decimal                          |
//!
//! Defaults are never written: an empty value removes the parameter.
//! Decoding never fails; a malformed parameter falls back to that field's
//! default and leaves every other field alone. Parameters this module does
//! not own are carried through untouched.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{ColumnFilter, ColumnLayout, SortItem};
use crate::view_state::{DEFAULT_PAGE_SIZE, FilterModel, Pagination, ViewState};

pub const PARAM_SEARCH: &str = "search";
pub const PARAM_SKILLS: &str = "skills";
pub const PARAM_FILTER: &str = "filter";
pub const PARAM_SORT: &str = "sort";
pub const PARAM_HIDDEN: &str = "hidden";
pub const PARAM_COLUMNS: &str = "columns";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_PAGE_SIZE: &str = "pageSize";

const LIST_DELIMITER: &str = ",";

/// Ordered `key=value` pairs of a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value for `key`. Present-but-empty counts as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Replace `key` in place (keeping its position), append it, or remove
    /// it when `value` is `None`.
    pub fn set(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(value) => {
                if let Some(pos) = self.pairs.iter().position(|(k, _)| k == key) {
                    self.pairs[pos].1 = value;
                    let mut index = 0;
                    self.pairs.retain(|(k, _)| {
                        let keep = k != key || index == pos;
                        index += 1;
                        keep
                    });
                } else {
                    self.pairs.push((key.to_string(), value));
                }
            }
            None => self.remove(key),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            serializer.append_pair(k, v);
        }
        f.write_str(&serializer.finish())
    }
}

// --- Per-field codecs ---

/// Converts one typed value to and from its parameter text.
pub trait ParamCodec {
    type Value;

    /// `None` means "remove the parameter".
    fn encode(&self, value: &Self::Value) -> Option<String>;

    fn decode(&self, key: &str, raw: Option<&str>) -> Self::Value;
}

pub struct TextParam;

impl ParamCodec for TextParam {
    type Value = String;

    fn encode(&self, value: &String) -> Option<String> {
        (!value.is_empty()).then(|| value.clone())
    }

    fn decode(&self, _key: &str, raw: Option<&str>) -> String {
        raw.unwrap_or_default().to_string()
    }
}

/// Comma-joined set of strings.
pub struct ListParam;

impl ParamCodec for ListParam {
    type Value = BTreeSet<String>;

    fn encode(&self, value: &BTreeSet<String>) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        let items: Vec<&str> = value.iter().map(String::as_str).collect();
        Some(items.join(LIST_DELIMITER))
    }

    fn decode(&self, _key: &str, raw: Option<&str>) -> BTreeSet<String> {
        raw.map(|raw| {
            raw.split(LIST_DELIMITER)
                .filter(|item| !item.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
    }
}

/// One-based page number in the link, zero-based index in memory.
pub struct PageParam;

impl ParamCodec for PageParam {
    type Value = usize;

    fn encode(&self, value: &usize) -> Option<String> {
        (*value != 0).then(|| (value + 1).to_string())
    }

    fn decode(&self, key: &str, raw: Option<&str>) -> usize {
        let Some(raw) = raw else { return 0 };
        match raw.trim().parse::<usize>() {
            Ok(page) if page >= 1 => page - 1,
            _ => {
                warn!(param = key, value = raw, "ignoring invalid page number");
                0
            }
        }
    }
}

pub struct PageSizeParam;

impl ParamCodec for PageSizeParam {
    type Value = usize;

    fn encode(&self, value: &usize) -> Option<String> {
        (*value != DEFAULT_PAGE_SIZE).then(|| value.to_string())
    }

    fn decode(&self, key: &str, raw: Option<&str>) -> usize {
        let Some(raw) = raw else {
            return DEFAULT_PAGE_SIZE;
        };
        match raw.trim().parse::<usize>() {
            Ok(size) if size > 0 => size,
            _ => {
                warn!(param = key, value = raw, "ignoring invalid page size");
                DEFAULT_PAGE_SIZE
            }
        }
    }
}

/// JSON array whose items are decoded one by one; bad items are dropped.
pub struct JsonListParam<T>(std::marker::PhantomData<T>);

impl<T> JsonListParam<T> {
    pub const fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<T: Serialize + DeserializeOwned> ParamCodec for JsonListParam<T> {
    type Value = Vec<T>;

    fn encode(&self, value: &Vec<T>) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        serde_json::to_string(value).ok()
    }

    fn decode(&self, key: &str, raw: Option<&str>) -> Vec<T> {
        let Some(raw) = raw else { return Vec::new() };
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Array(items)) => {
                let total = items.len();
                let decoded: Vec<T> = items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect();
                if decoded.len() < total {
                    warn!(param = key, dropped = total - decoded.len(), "dropped malformed items");
                }
                decoded
            }
            Ok(_) => {
                warn!(param = key, "expected a JSON array, ignoring");
                Vec::new()
            }
            Err(e) => {
                warn!(param = key, error = %e, "ignoring malformed JSON");
                Vec::new()
            }
        }
    }
}

/// JSON object of column filters; bad entries are dropped.
pub struct FilterParam;

impl ParamCodec for FilterParam {
    type Value = FilterModel;

    fn encode(&self, value: &FilterModel) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        serde_json::to_string(value).ok()
    }

    fn decode(&self, key: &str, raw: Option<&str>) -> FilterModel {
        let Some(raw) = raw else {
            return FilterModel::new();
        };
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(entries)) => {
                let mut model = FilterModel::new();
                for (col_id, entry) in entries {
                    match serde_json::from_value::<ColumnFilter>(entry) {
                        Ok(filter) if !col_id.is_empty() => {
                            model.insert(col_id, filter);
                        }
                        _ => warn!(param = key, column = %col_id, "dropped malformed filter"),
                    }
                }
                model
            }
            Ok(_) => {
                warn!(param = key, "expected a JSON object, ignoring");
                FilterModel::new()
            }
            Err(e) => {
                warn!(param = key, error = %e, "ignoring malformed JSON");
                FilterModel::new()
            }
        }
    }
}

/// The view-state fields, each bound to its parameter and codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewField {
    Search,
    Skills,
    Filters,
    Sort,
    Hidden,
    Columns,
    Page,
    PageSize,
}

impl ViewField {
    pub const ALL: [ViewField; 8] = [
        Self::Search,
        Self::Skills,
        Self::Filters,
        Self::Sort,
        Self::Hidden,
        Self::Columns,
        Self::Page,
        Self::PageSize,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Search => PARAM_SEARCH,
            Self::Skills => PARAM_SKILLS,
            Self::Filters => PARAM_FILTER,
            Self::Sort => PARAM_SORT,
            Self::Hidden => PARAM_HIDDEN,
            Self::Columns => PARAM_COLUMNS,
            Self::Page => PARAM_PAGE,
            Self::PageSize => PARAM_PAGE_SIZE,
        }
    }

    pub fn changed(self, prev: &ViewState, next: &ViewState) -> bool {
        match self {
            Self::Search => prev.search_query != next.search_query,
            Self::Skills => prev.skills != next.skills,
            Self::Filters => prev.filters != next.filters,
            Self::Sort => prev.sort_model != next.sort_model,
            Self::Hidden => prev.hidden_columns != next.hidden_columns,
            Self::Columns => prev.column_layout != next.column_layout,
            Self::Page => prev.pagination.page_index != next.pagination.page_index,
            Self::PageSize => prev.pagination.page_size != next.pagination.page_size,
        }
    }

    pub fn encode(self, state: &ViewState) -> Option<String> {
        match self {
            Self::Search => TextParam.encode(&state.search_query),
            Self::Skills => ListParam.encode(&state.skills),
            Self::Filters => FilterParam.encode(&state.filters),
            Self::Sort => JsonListParam::<SortItem>::new().encode(&state.sort_model),
            Self::Hidden => ListParam.encode(&state.hidden_columns),
            Self::Columns => JsonListParam::<ColumnLayout>::new().encode(&state.column_layout),
            Self::Page => PageParam.encode(&state.pagination.page_index),
            Self::PageSize => PageSizeParam.encode(&state.pagination.page_size),
        }
    }
}

pub fn decode_view_state(query: &QueryString) -> ViewState {
    ViewState {
        search_query: TextParam.decode(PARAM_SEARCH, query.get(PARAM_SEARCH)),
        skills: ListParam.decode(PARAM_SKILLS, query.get(PARAM_SKILLS)),
        filters: FilterParam.decode(PARAM_FILTER, query.get(PARAM_FILTER)),
        sort_model: JsonListParam::<SortItem>::new()
            .decode(PARAM_SORT, query.get(PARAM_SORT))
            .into_iter()
            .filter(|item| !item.col_id.is_empty())
            .collect(),
        hidden_columns: ListParam.decode(PARAM_HIDDEN, query.get(PARAM_HIDDEN)),
        column_layout: JsonListParam::<ColumnLayout>::new()
            .decode(PARAM_COLUMNS, query.get(PARAM_COLUMNS))
            .into_iter()
            .filter(|item| !item.col_id.is_empty())
            .collect(),
        pagination: Pagination {
            page_index: PageParam.decode(PARAM_PAGE, query.get(PARAM_PAGE)),
            page_size: PageSizeParam.decode(PARAM_PAGE_SIZE, query.get(PARAM_PAGE_SIZE)),
        },
    }
}

/// Encode every field of `state` onto `base`.
pub fn encode_view_state(state: &ViewState, base: &QueryString) -> QueryString {
    let mut query = base.clone();
    for field in ViewField::ALL {
        query.set(field.key(), field.encode(state));
    }
    query
}

// --- Navigation ---

/// The location the view link lives in.
pub trait Navigator {
    /// Current query string, without the leading `?`.
    fn current_query(&self) -> String;

    /// Replace the current history entry's query. Must not add history.
    fn replace(&mut self, query: &str);
}

/// In-process location: a path plus query string with a replacement log.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    path: String,
    query: String,
    replacements: Vec<String>,
}

impl MemoryLocation {
    /// Accepts `path?query`, `?query` or a bare query.
    pub fn new(link: &str) -> Self {
        let (path, query) = match link.split_once('?') {
            Some((path, query)) => (path, query),
            None if link.contains('=') => ("", link),
            None => (link, ""),
        };
        Self {
            path: path.to_string(),
            query: query.to_string(),
            replacements: Vec::new(),
        }
    }

    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    #[cfg(test)]
    pub fn replacements(&self) -> usize {
        self.replacements.len()
    }
}

impl Navigator for MemoryLocation {
    fn current_query(&self) -> String {
        self.query.clone()
    }

    fn replace(&mut self, query: &str) {
        self.query = query.to_string();
        self.replacements.push(query.to_string());
    }
}

/// Writes view-state changes back to a [`Navigator`].
pub struct UrlSync<N: Navigator> {
    navigator: N,
}

impl<N: Navigator> UrlSync<N> {
    pub fn new(navigator: N) -> Self {
        Self { navigator }
    }

    pub fn read(&self) -> ViewState {
        decode_view_state(&QueryString::parse(&self.navigator.current_query()))
    }

    /// Write the fields that differ between `prev` and `next` in a single
    /// navigation. Returns whether a navigation happened.
    pub fn write(&mut self, prev: &ViewState, next: &ViewState) -> bool {
        let changed: Vec<ViewField> = ViewField::ALL
            .into_iter()
            .filter(|field| field.changed(prev, next))
            .collect();
        if changed.is_empty() {
            return false;
        }

        let current = QueryString::parse(&self.navigator.current_query());
        let mut updated = current.clone();
        for field in &changed {
            updated.set(field.key(), field.encode(next));
        }

        let current = current.to_string();
        let updated = updated.to_string();
        if updated == current {
            debug!("query string unchanged, skipping navigation");
            return false;
        }
        debug!(query = %updated, "replacing location");
        self.navigator.replace(&updated);
        true
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateOp, NumberOp, SortDirection, TextOp};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn roundtrip(state: &ViewState) -> ViewState {
        let encoded = encode_view_state(state, &QueryString::default()).to_string();
        decode_view_state(&QueryString::parse(&encoded))
    }

    #[test]
    fn defaults_encode_to_nothing() {
        let query = encode_view_state(&ViewState::default(), &QueryString::default());
        assert!(query.is_empty());
        for field in ViewField::ALL {
            assert_eq!(field.encode(&ViewState::default()), None, "{}", field.key());
        }
    }

    #[test]
    fn empty_and_missing_params_decode_the_same() {
        let empty = decode_view_state(&QueryString::parse("?search=&skills=&sort=&page=&pageSize="));
        assert_eq!(empty, ViewState::default());
    }

    #[test]
    fn non_numeric_page_falls_back_to_default() {
        let state = decode_view_state(&QueryString::parse("?page=abc&pageSize=-3"));
        assert_eq!(state.pagination.page_index, 0);
        assert_eq!(state.pagination.page_size, DEFAULT_PAGE_SIZE);

        let state = decode_view_state(&QueryString::parse("?page=0&pageSize=0"));
        assert_eq!(state.pagination, Pagination::default());
    }

    #[test]
    fn one_bad_param_does_not_spoil_the_rest() {
        let state = decode_view_state(&QueryString::parse(
            "?search=smith&sort=%5B%7Bbroken&filter=42&page=2&hidden=email",
        ));
        assert_eq!(state.search_query, "smith");
        assert!(state.sort_model.is_empty());
        assert!(state.filters.is_empty());
        assert_eq!(state.pagination.page_index, 1);
        assert!(state.hidden_columns.contains("email"));
    }

    #[test]
    fn invalid_sort_items_are_dropped() {
        let raw = r#"[{"colId":"name","sort":"asc"},{"colId":"ctc","sort":"sideways"},{"sort":"desc"}]"#;
        let mut query = QueryString::default();
        query.set(PARAM_SORT, Some(raw.to_string()));
        let state = decode_view_state(&query);
        assert_eq!(state.sort_model, vec![SortItem::new("name", SortDirection::Asc)]);
    }

    #[test]
    fn invalid_filter_entries_are_dropped() {
        let raw = r#"{"name":{"filterType":"text","type":"contains","filter":"ali"},"ctc":{"filterType":"number","type":"bogus","filter":1}}"#;
        let mut query = QueryString::default();
        query.set(PARAM_FILTER, Some(raw.to_string()));
        let state = decode_view_state(&query);
        assert_eq!(state.filters.len(), 1);
        assert!(state.filters.contains_key("name"));
    }

    #[test]
    fn page_is_one_based_in_the_link() {
        let state = ViewState {
            pagination: Pagination {
                page_index: 2,
                page_size: 50,
            },
            ..ViewState::default()
        };
        let query = encode_view_state(&state, &QueryString::default());
        assert_eq!(query.to_string(), "page=3&pageSize=50");
    }

    #[test]
    fn set_keeps_position_and_foreign_params() {
        let mut query = QueryString::parse("?utm=mail&search=a&tab=2&search=b");
        query.set(PARAM_SEARCH, Some("c".to_string()));
        assert_eq!(query.to_string(), "utm=mail&search=c&tab=2");
        query.set(PARAM_SEARCH, None);
        assert_eq!(query.to_string(), "utm=mail&tab=2");
    }

    #[test]
    fn write_preserves_unknown_params() {
        let mut sync = UrlSync::new(MemoryLocation::new("/applications?utm=mail&search=old"));
        let prev = sync.read();
        let next = ViewState {
            search_query: "new".to_string(),
            ..prev.clone()
        };
        assert!(sync.write(&prev, &next));
        assert_eq!(sync.navigator().href(), "/applications?utm=mail&search=new");
    }

    #[test]
    fn write_skips_when_string_is_unchanged() {
        // The state says "x" changed, but the location already shows it.
        let mut sync = UrlSync::new(MemoryLocation::new("?search=x"));
        let prev = ViewState::default();
        let next = ViewState {
            search_query: "x".to_string(),
            ..ViewState::default()
        };
        assert!(!sync.write(&prev, &next));
        assert_eq!(sync.navigator().replacements(), 0);
    }

    #[test]
    fn unchanged_state_never_navigates() {
        let mut sync = UrlSync::new(MemoryLocation::new("?search=x"));
        let state = sync.read();
        assert!(!sync.write(&state, &state.clone()));
    }

    #[test]
    fn memory_location_parses_links() {
        let loc = MemoryLocation::new("/apps?search=a");
        assert_eq!(loc.current_query(), "search=a");
        assert_eq!(MemoryLocation::new("search=a").current_query(), "search=a");
        assert_eq!(MemoryLocation::new("?").current_query(), "");
        assert_eq!(MemoryLocation::new("/apps").href(), "/apps");
    }

    #[test]
    fn structured_values_roundtrip() {
        let mut filters = FilterModel::new();
        filters.insert(
            "name".to_string(),
            ColumnFilter::Text {
                op: TextOp::Contains,
                filter: "a&b=c, \"d\"".to_string(),
            },
        );
        filters.insert(
            "createdAt".to_string(),
            ColumnFilter::Date {
                op: DateOp::InRange,
                date_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                date_to: NaiveDate::from_ymd_opt(2024, 2, 1),
            },
        );
        let state = ViewState {
            search_query: "smith & co?".to_string(),
            skills: ["Go", "C++"].into_iter().map(String::from).collect(),
            filters,
            sort_model: vec![
                SortItem::new("matchPercentage", SortDirection::Desc),
                SortItem::new("name", SortDirection::Asc),
            ],
            hidden_columns: ["email", "phone"].into_iter().map(String::from).collect(),
            column_layout: vec![ColumnLayout {
                col_id: "name".to_string(),
                width: Some(30),
            }],
            pagination: Pagination {
                page_index: 1,
                page_size: 10,
            },
        };
        assert_eq!(roundtrip(&state), state);
    }

    fn column_id() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_]{0,12}"
    }

    fn list_item() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 .+#_-]{1,12}"
    }

    fn date() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2035, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    // Halves are exact in binary, so JSON round-trips them bit for bit.
    fn number() -> impl Strategy<Value = f64> {
        (-20_000i32..20_000).prop_map(|n| f64::from(n) / 2.0)
    }

    fn column_filter() -> impl Strategy<Value = ColumnFilter> {
        prop_oneof![
            (
                prop_oneof![
                    Just(TextOp::Contains),
                    Just(TextOp::NotContains),
                    Just(TextOp::Equals),
                    Just(TextOp::StartsWith),
                ],
                ".*"
            )
                .prop_map(|(op, filter)| ColumnFilter::Text { op, filter }),
            (
                prop_oneof![
                    Just(NumberOp::Equals),
                    Just(NumberOp::LessThan),
                    Just(NumberOp::GreaterThanOrEqual),
                    Just(NumberOp::InRange),
                ],
                number(),
                proptest::option::of(number())
            )
                .prop_map(|(op, filter, filter_to)| ColumnFilter::Number { op, filter, filter_to }),
            proptest::collection::vec(".*", 0..4).prop_map(|values| ColumnFilter::Set { values }),
            (
                prop_oneof![Just(DateOp::Equals), Just(DateOp::GreaterThan), Just(DateOp::InRange)],
                date(),
                proptest::option::of(date())
            )
                .prop_map(|(op, date_from, date_to)| ColumnFilter::Date { op, date_from, date_to }),
        ]
    }

    fn sort_item() -> impl Strategy<Value = SortItem> {
        (column_id(), prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)])
            .prop_map(|(col_id, sort)| SortItem { col_id, sort })
    }

    fn view_state() -> impl Strategy<Value = ViewState> {
        (
            ".*",
            proptest::collection::btree_set(list_item(), 0..4),
            proptest::collection::btree_map(column_id(), column_filter(), 0..3),
            proptest::collection::vec(sort_item(), 0..3),
            proptest::collection::btree_set(column_id(), 0..4),
            proptest::collection::vec(
                (column_id(), proptest::option::of(1u16..200))
                    .prop_map(|(col_id, width)| ColumnLayout { col_id, width }),
                0..3,
            ),
            0usize..1000,
            1usize..500,
        )
            .prop_map(
                |(search_query, skills, filters, sort_model, hidden_columns, column_layout, page_index, page_size)| {
                    ViewState {
                        search_query,
                        skills,
                        filters,
                        sort_model,
                        hidden_columns,
                        column_layout,
                        pagination: Pagination {
                            page_index,
                            page_size,
                        },
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(state in view_state()) {
            prop_assert_eq!(roundtrip(&state), state);
        }

        #[test]
        fn decode_never_panics(raw in ".*") {
            let _ = decode_view_state(&QueryString::parse(&raw));
        }

        #[test]
        fn foreign_params_survive_writes(state in view_state(), foreign in "[a-z]{1,6}") {
            prop_assume!(ViewField::ALL.iter().all(|f| f.key() != foreign));
            let link = format!("?{}=keep", foreign);
            let mut sync = UrlSync::new(MemoryLocation::new(&link));
            let prev = sync.read();
            sync.write(&prev, &state);
            let query = QueryString::parse(&sync.navigator().current_query());
            prop_assert_eq!(query.get(&foreign), Some("keep"));
        }
    }
}
