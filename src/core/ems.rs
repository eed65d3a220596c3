//! Lifetime bracket around one reservation store.
//!
//! `Ems` is constructed empty, brought up with [`Ems::init`] and torn down with
//! [`Ems::terminate`]. Every store operation outside that bracket fails with
//! `EmsError::NotInitialized`. One `Ems` lives in each worker process and is
//! shared by reference between that process's threads.

use std::io::Write;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::error::{EmsError, EmsResult};
use super::reservation::Coordinate;
use super::store::{Listing, ReservationStore};
use crate::util::{self, AccessDelay};

/// Event management system: the process-wide reservation store handle.
#[derive(Debug, Default)]
pub struct Ems {
    state: RwLock<Option<Arc<ReservationStore>>>,
}

impl Ems {
    /// Create an uninitialized system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(None),
        }
    }

    /// Create and initialize in one step.
    ///
    /// # Errors
    ///
    /// Never fails for a fresh instance; kept fallible to mirror `init`.
    pub fn with_delay(delay_ms: u32) -> EmsResult<Self> {
        let ems = Self::new();
        ems.init(delay_ms)?;
        Ok(ems)
    }

    /// Bring up an empty store whose every access sleeps `delay_ms`.
    ///
    /// # Errors
    ///
    /// Returns `EmsError::AlreadyInitialized` if the store is already up.
    pub fn init(&self, delay_ms: u32) -> EmsResult<()> {
        let mut state = self.state.write();
        if state.is_some() {
            return Err(EmsError::AlreadyInitialized);
        }
        *state = Some(Arc::new(ReservationStore::new(AccessDelay::from_millis(
            delay_ms,
        ))));
        info!(delay_ms, "EMS initialized");
        Ok(())
    }

    /// Release every event and take the store down.
    ///
    /// # Errors
    ///
    /// Returns `EmsError::NotInitialized` if the store was never brought up.
    pub fn terminate(&self) -> EmsResult<()> {
        let store = self.state.write().take().ok_or(EmsError::NotInitialized)?;
        store.destroy_all();
        info!("EMS terminated");
        Ok(())
    }

    /// Whether the store is currently up.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.read().is_some()
    }

    fn store(&self) -> EmsResult<Arc<ReservationStore>> {
        self.state.read().clone().ok_or(EmsError::NotInitialized)
    }

    /// Create an event with `rows * cols` free seats.
    ///
    /// # Errors
    ///
    /// See [`ReservationStore::create`].
    pub fn create(&self, event_id: u32, rows: usize, cols: usize) -> EmsResult<()> {
        self.store()?.create(event_id, rows, cols)
    }

    /// Reserve a set of seats atomically, returning the reservation id.
    ///
    /// # Errors
    ///
    /// See [`ReservationStore::reserve`].
    pub fn reserve(&self, event_id: u32, seats: &[Coordinate]) -> EmsResult<u32> {
        self.store()?.reserve(event_id, seats)
    }

    /// Write a consistent view of an event's seats.
    ///
    /// # Errors
    ///
    /// See [`ReservationStore::show`].
    pub fn show<W: Write + ?Sized>(&self, event_id: u32, out: &mut W) -> EmsResult<()> {
        self.store()?.show(event_id, out)
    }

    /// Consistent copy of an event's seats.
    ///
    /// # Errors
    ///
    /// See [`ReservationStore::snapshot`].
    pub fn snapshot(&self, event_id: u32) -> EmsResult<Vec<Vec<u32>>> {
        self.store()?.snapshot(event_id)
    }

    /// Enumerate events in creation order.
    ///
    /// # Errors
    ///
    /// Returns `EmsError::NotInitialized` outside the init/terminate bracket.
    pub fn list(&self) -> EmsResult<Listing> {
        self.store()?.list()
    }

    /// Write the event listing to `out`.
    ///
    /// # Errors
    ///
    /// - `EmsError::NotInitialized` outside the init/terminate bracket
    /// - `EmsError::Io` if writing fails
    pub fn list_events<W: Write + ?Sized>(&self, out: &mut W) -> EmsResult<()> {
        let listing = self.list()?;
        out.write_all(listing.to_string().as_bytes())?;
        Ok(())
    }

    /// Sleep for `delay_ms` milliseconds.
    pub fn wait(&self, delay_ms: u32) {
        util::wait(delay_ms);
    }
}
