//! Seat grid: a fixed-size block of independently lockable seats.
//!
//! Each seat is its own `parking_lot::Mutex<u32>`, so the lock and the value it
//! guards can never be separated. Seats are addressed by 1-based `(row, col)`
//! and stored row-major.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Mutex, MutexGuard};

use super::error::{EmsError, EmsResult};

/// Guard over a single seat. Holding it means holding that seat's lock.
pub type SeatGuard<'a> = MutexGuard<'a, u32>;

/// A named grid of seats (an "event").
#[derive(Debug)]
pub struct SeatGrid {
    id: u32,
    rows: usize,
    cols: usize,
    /// Row-major seat cells. 0 is free, anything else is a reservation id.
    seats: Box<[Mutex<u32>]>,
    /// Highest reservation id handed out so far.
    reservations: AtomicU32,
}

impl SeatGrid {
    /// Allocate a grid with every seat free.
    ///
    /// # Errors
    ///
    /// - `EmsError::InvalidSize` if either dimension is zero or the seat count overflows
    /// - `EmsError::AllocFailure` if seat storage cannot be allocated
    pub fn try_new(id: u32, rows: usize, cols: usize) -> EmsResult<Self> {
        let count = match rows.checked_mul(cols) {
            Some(count) if count > 0 => count,
            _ => return Err(EmsError::InvalidSize { rows, cols }),
        };

        let mut seats = Vec::new();
        seats
            .try_reserve_exact(count)
            .map_err(|_| EmsError::AllocFailure(id))?;
        seats.resize_with(count, || Mutex::new(0));

        Ok(Self {
            id,
            rows,
            cols,
            seats: seats.into_boxed_slice(),
            reservations: AtomicU32::new(0),
        })
    }

    /// Event id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total seat count.
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    /// Highest reservation id issued so far.
    #[must_use]
    pub fn reservations(&self) -> u32 {
        self.reservations.load(Ordering::Acquire)
    }

    /// Row-major index of a 1-based seat, or `None` when it is off the grid.
    #[must_use]
    pub const fn seat_index(&self, row: usize, col: usize) -> Option<usize> {
        if row == 0 || row > self.rows || col == 0 || col > self.cols {
            return None;
        }
        Some((row - 1) * self.cols + (col - 1))
    }

    /// Lock one seat by row-major index.
    ///
    /// Callers that lock several seats must do so in ascending index order.
    pub(crate) fn lock_seat(&self, index: usize) -> SeatGuard<'_> {
        self.seats[index].lock()
    }

    /// Allocate the next reservation id.
    pub(crate) fn next_reservation(&self) -> u32 {
        self.reservations.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Give back a reservation id that was never stamped.
    ///
    /// The counter only moves back if nothing was allocated after `id`;
    /// otherwise the id is left as a gap so it can never be handed out twice.
    pub(crate) fn release_reservation(&self, id: u32) {
        let _ = self.reservations.compare_exchange(
            id,
            id - 1,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}
