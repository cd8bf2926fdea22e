//! Table view state for the two polled collections
//!
//! Each view owns the last applied snapshot plus a monotonically increasing
//! sequence counter. The two views refresh on independent timers, so two
//! in-flight fetches for the same view have no inherent ordering guarantee:
//! a response is applied only while its token is still the newest issued,
//! anything older is discarded. A refresh that began before a later one can
//! therefore never overwrite the later one's result.

use fleetdash_core::{Server, Task};
use ratatui::widgets::TableState;

/// Snapshot-owning state for one polled table
#[derive(Debug)]
pub struct TableView<T> {
    rows: Vec<T>,
    issued: u64,
    pub table_state: TableState,
}

pub type ServersView = TableView<Server>;
pub type TasksView = TableView<Task>;

impl<T> TableView<T> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            issued: 0,
            table_state: TableState::default(),
        }
    }

    /// Issue the sequence token for a refresh that is about to start
    pub fn begin_refresh(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Apply a completed refresh as a full snapshot replace. Returns false
    /// when the response is stale (its token is no longer the newest issued)
    /// and was discarded.
    pub fn apply(&mut self, seq: u64, rows: Vec<T>) -> bool {
        if seq != self.issued {
            return false;
        }
        self.rows = rows;
        self.clamp_selection();
        true
    }

    /// Rows of the applied snapshot, in the order received
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Record under the cursor, resolved against the applied snapshot
    pub fn selected(&self) -> Option<&T> {
        self.table_state.selected().and_then(|i| self.rows.get(i))
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => (i + 1).min(self.rows.len() - 1),
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn select_prev(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.table_state.select(Some(i));
    }

    /// Keep the cursor inside the new snapshot after a replace
    fn clamp_selection(&mut self) {
        let len = self.rows.len();
        match self.table_state.selected() {
            Some(_) if len == 0 => self.table_state.select(None),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            _ => {}
        }
    }
}

impl<T> Default for TableView<T> {
    fn default() -> Self {
        Self::new()
    }
}
