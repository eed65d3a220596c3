//! Reservation store: the insertion-ordered collection of seat grids.
//!
//! Every lookup pays the configured [`AccessDelay`] before touching the
//! collection, including the existence probe done by `create`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::error::{EmsError, EmsResult};
use super::grid::SeatGrid;
use crate::util::AccessDelay;

/// Result of enumerating the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// The store holds no events.
    NoEvents,
    /// Event ids in creation order.
    Events(Vec<u32>),
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEvents => writeln!(f, "No events"),
            Self::Events(ids) => {
                for id in ids {
                    writeln!(f, "Event: {id}")?;
                }
                Ok(())
            }
        }
    }
}

/// Collection of seat grids shared by every worker thread of one process.
///
/// Grids are handed out as `Arc<SeatGrid>` so that a reservation in flight
/// never holds the collection lock while it waits on seat locks.
#[derive(Debug)]
pub struct ReservationStore {
    events: RwLock<Vec<Arc<SeatGrid>>>,
    delay: AccessDelay,
    destroyed: AtomicBool,
}

impl ReservationStore {
    /// Create an empty store with the given access latency.
    #[must_use]
    pub fn new(delay: AccessDelay) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            delay,
            destroyed: AtomicBool::new(false),
        }
    }

    /// Latency paid per store access.
    #[must_use]
    pub const fn delay(&self) -> AccessDelay {
        self.delay
    }

    fn ensure_live(&self) -> EmsResult<()> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(EmsError::NotInitialized);
        }
        Ok(())
    }

    /// Find an event by id. Always sleeps the access delay first.
    ///
    /// # Errors
    ///
    /// Returns `EmsError::NotInitialized` after `destroy_all`.
    pub fn lookup(&self, id: u32) -> EmsResult<Option<Arc<SeatGrid>>> {
        self.delay.pause();
        self.ensure_live()?;
        Ok(self.events.read().iter().find(|grid| grid.id() == id).cloned())
    }

    /// Create an event with every seat free and append it to the store.
    ///
    /// The grid is fully built before it is published, so no other operation
    /// can observe it half-constructed.
    ///
    /// # Errors
    ///
    /// - `EmsError::AlreadyExists` if `id` is taken
    /// - `EmsError::InvalidSize` / `EmsError::AllocFailure` from grid construction
    /// - `EmsError::NotInitialized` after `destroy_all`
    pub fn create(&self, id: u32, rows: usize, cols: usize) -> EmsResult<()> {
        if self.lookup(id)?.is_some() {
            return Err(EmsError::AlreadyExists(id));
        }

        let grid = Arc::new(SeatGrid::try_new(id, rows, cols)?);

        let mut events = self.events.write();
        // A racing create may have published the same id since the probe.
        if events.iter().any(|existing| existing.id() == id) {
            return Err(EmsError::AlreadyExists(id));
        }
        self.ensure_live()?;
        events.push(grid);
        debug!(event_id = id, rows, cols, "Event created");
        Ok(())
    }

    /// Ids of every event, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `EmsError::NotInitialized` after `destroy_all`.
    pub fn list(&self) -> EmsResult<Listing> {
        self.ensure_live()?;
        let events = self.events.read();
        if events.is_empty() {
            return Ok(Listing::NoEvents);
        }
        Ok(Listing::Events(events.iter().map(|grid| grid.id()).collect()))
    }

    /// Number of events currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether the store holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Release every grid. The store rejects all operations afterwards.
    pub fn destroy_all(&self) {
        self.destroyed.store(true, Ordering::Release);
        let released = std::mem::take(&mut *self.events.write());
        debug!(events = released.len(), "Reservation store destroyed");
    }
}
