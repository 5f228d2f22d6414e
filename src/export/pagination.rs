//! Offset pagination over one table.
//!
//! The cursor is a small state machine: `Idle -> Fetching(offset) -> ... -> Done`.
//! A page shorter than the page size (including an empty page) ends the table.
//! The offset advances by the number of rows actually returned, so a backend
//! that returns short pages never makes us skip rows.

/// Cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Nothing fetched yet
    Idle,
    /// Next fetch starts at `offset`
    Fetching { offset: u64 },
    /// Table exhausted after `rows` rows
    Done { rows: u64 },
}

/// Drives offset pagination for a single table.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page_size: u64,
    state: PageState,
    fetched: u64,
    pages: u64,
}

impl PageCursor {
    /// A cursor over pages of `page_size` rows (at least one).
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
            state: PageState::Idle,
            fetched: 0,
            pages: 0,
        }
    }

    /// Offset of the next page to fetch, or `None` once the table is exhausted.
    pub fn next_offset(&mut self) -> Option<u64> {
        match self.state {
            PageState::Idle => {
                self.state = PageState::Fetching { offset: 0 };
                Some(0)
            }
            PageState::Fetching { offset } => Some(offset),
            PageState::Done { .. } => None,
        }
    }

    /// Records how many rows the last fetch returned.
    pub fn record(&mut self, returned: usize) {
        let PageState::Fetching { offset } = self.state else {
            return;
        };
        let returned = returned as u64;
        self.pages += 1;
        self.fetched += returned;
        self.state = if returned < self.page_size {
            PageState::Done {
                rows: self.fetched,
            }
        } else {
            PageState::Fetching {
                offset: offset + returned,
            }
        };
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// Rows seen so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    /// Fetches recorded so far.
    pub fn pages(&self) -> u64 {
        self.pages
    }
}
