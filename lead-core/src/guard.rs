//! Last-issued-wins guard for overlapping fetches
//!
//! Every fetch takes a [`Ticket`] before it starts. When it finishes, its
//! result is applied only if no newer ticket was issued in the meantime;
//! otherwise it is dropped. In-flight requests are never cancelled.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Proof of which request a response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Monotonic ticket counter
#[derive(Debug, Default)]
pub struct Generation {
    latest: AtomicU64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the latest issued
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Outcome of completing a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

/// Fetched data plus request status for one view
#[derive(Debug, Serialize)]
pub struct ViewState<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub loading: bool,
    pub refreshing: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    #[serde(skip)]
    generation: Generation,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
            refreshing: false,
            last_refresh: None,
            generation: Generation::new(),
        }
    }
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch: `loading` on first load, `refreshing` once data exists
    pub fn begin(&mut self) -> Ticket {
        if self.data.is_some() {
            self.refreshing = true;
        } else {
            self.loading = true;
        }
        self.generation.issue()
    }

    /// Apply a finished fetch if `ticket` is still the latest
    pub fn complete<E: ToString>(
        &mut self,
        ticket: Ticket,
        result: std::result::Result<T, E>,
        now: DateTime<Utc>,
    ) -> Applied {
        if !self.generation.is_current(ticket) {
            return Applied::Stale;
        }
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.last_refresh = Some(now);
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
        self.refreshing = false;
        Applied::Current
    }

    /// Whether a fetch is outstanding
    pub fn is_busy(&self) -> bool {
        self.loading || self.refreshing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_issued_wins() {
        let now = Utc::now();
        let mut view: ViewState<&str> = ViewState::new();

        let a = view.begin();
        let b = view.begin();

        // B resolves first, then A arrives late
        assert_eq!(view.complete::<String>(b, Ok("B"), now), Applied::Current);
        assert_eq!(view.complete::<String>(a, Ok("A"), now), Applied::Stale);

        assert_eq!(view.data, Some("B"));
        assert!(!view.is_busy());
    }

    #[test]
    fn test_stale_error_does_not_clobber() {
        let now = Utc::now();
        let mut view: ViewState<u32> = ViewState::new();

        let a = view.begin();
        let b = view.begin();
        assert_eq!(view.complete(a, Err("timeout"), now), Applied::Stale);
        assert!(view.loading);
        assert_eq!(view.complete::<&str>(b, Ok(3), now), Applied::Current);
        assert_eq!(view.error, None);
        assert_eq!(view.last_refresh, Some(now));
    }

    #[test]
    fn test_refreshing_once_data_exists() {
        let now = Utc::now();
        let mut view: ViewState<u32> = ViewState::new();
        let first = view.begin();
        assert!(view.loading);
        view.complete::<&str>(first, Ok(1), now);

        let second = view.begin();
        assert!(view.refreshing && !view.loading);
        view.complete(second, Err("HTTP 502"), now);
        assert_eq!(view.data, Some(1));
        assert_eq!(view.error.as_deref(), Some("HTTP 502"));
    }
}
