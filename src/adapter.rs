//! Glue between the table widget and the view state store.
//!
//! State flows one way at mount (store to widget) and one way afterwards
//! (widget event to store). Each event writes only the slice it concerns.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::debounce::Debouncer;
use crate::grid::{GridEvent, GridWidget};
use crate::models::ColumnLayout;
use crate::url_state::Navigator;
use crate::view_state::{ViewState, ViewStatePatch, ViewStateStore};

pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

pub struct GridAdapter {
    resize: Debouncer<Vec<ColumnLayout>>,
}

impl Default for GridAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DEBOUNCE)
    }
}

impl GridAdapter {
    pub fn new(resize_delay: Duration) -> Self {
        Self {
            resize: Debouncer::new(resize_delay),
        }
    }

    /// Push the persisted configuration into the widget. Emits nothing.
    pub fn mount(&mut self, state: &ViewState, grid: &mut GridWidget) {
        self.resize.cancel();
        grid.apply_layout(&state.column_layout);
        grid.apply_hidden(&state.hidden_columns);
        grid.apply_filter_model(&state.filters);
        grid.apply_sort_model(&state.sort_model);
        grid.apply_pagination(state.pagination);
    }

    pub fn handle_event<N: Navigator>(
        &mut self,
        event: GridEvent,
        grid: &GridWidget,
        store: &mut ViewStateStore<N>,
        now: Instant,
    ) {
        self.handle_events(&[event], grid, store, now);
    }

    /// Write every slice the events touch as a single update.
    pub fn handle_events<N: Navigator>(
        &mut self,
        events: &[GridEvent],
        grid: &GridWidget,
        store: &mut ViewStateStore<N>,
        now: Instant,
    ) {
        let mut patch = ViewStatePatch::default();
        let mut settles_resize = false;
        for &event in events {
            trace!(?event, "grid event");
            match event {
                GridEvent::SelectionChanged => continue,
                GridEvent::ColumnResized => {
                    self.resize.push(grid.column_layout(), now);
                    continue;
                }
                GridEvent::ColumnMoved => {
                    self.resize.cancel();
                    patch = patch.layout(grid.column_layout());
                }
                GridEvent::SortChanged => patch = patch.sort(grid.sort_model().to_vec()),
                GridEvent::FilterChanged => patch = patch.filters(grid.filter_model().clone()),
                GridEvent::ColumnVisibilityChanged => {
                    patch = patch.hidden(grid.hidden_columns().iter().cloned())
                }
                GridEvent::PaginationChanged => {
                    let pagination = grid.pagination();
                    patch = patch.page(pagination.page_index).page_size(pagination.page_size);
                }
            }
            settles_resize = true;
        }
        if settles_resize {
            if let Some(layout) = self.resize.flush() {
                patch = patch.layout(layout);
            }
        }
        store.update_state(patch);
    }

    /// Write the page the widget clamped to when the stored one is out of range.
    pub fn settle_page<N: Navigator>(&self, grid: &GridWidget, store: &mut ViewStateStore<N>) {
        let page_index = grid.pagination().page_index;
        if page_index != store.get_state().pagination.page_index {
            store.update_state(ViewStatePatch::default().page(page_index));
        }
    }

    /// Write a settled resize. Returns true when something was flushed.
    pub fn tick<N: Navigator>(&mut self, store: &mut ViewStateStore<N>, now: Instant) -> bool {
        match self.resize.poll(now) {
            Some(layout) => {
                store.update_state(ViewStatePatch::default().layout(layout));
                true
            }
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.resize.deadline()
    }
}
