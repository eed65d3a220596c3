//! Atomic multi-seat reservation and consistent grid snapshots.
//!
//! Lock order is global: seats are always locked in ascending `(row, col)`
//! order, which for a row-major grid is ascending index order. Both `reserve`
//! and `show` follow it, so no two operations can wait on each other in a
//! cycle.

use std::fmt::Write as _;
use std::io::Write;

use tracing::debug;

use super::error::{EmsError, EmsResult};
use super::grid::{SeatGrid, SeatGuard};
use super::store::ReservationStore;

/// Maximum number of seats a single reservation may carry.
pub const MAX_RESERVATION_SIZE: usize = 256;

/// A seat position as submitted by a request: `x` is the row, `y` the column.
///
/// Ordering is lexicographic on `(x, y)`, which is the lock acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    /// 1-based row.
    pub x: usize,
    /// 1-based column.
    pub y: usize,
}

impl Coordinate {
    /// Build a coordinate from a 1-based row and column.
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for Coordinate {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl ReservationStore {
    /// Reserve every seat in `seats` on one event, or none of them.
    ///
    /// Returns the reservation id stamped into the seats.
    ///
    /// # Errors
    ///
    /// - `EmsError::NotFound` if the event does not exist
    /// - `EmsError::EmptyReservation` / `EmsError::DuplicateSeat` for malformed requests
    /// - `EmsError::InvalidSeat` if a coordinate is off the grid
    /// - `EmsError::SeatTaken` if any seat already belongs to a reservation
    ///
    /// On any error no seat is modified.
    pub fn reserve(&self, event_id: u32, seats: &[Coordinate]) -> EmsResult<u32> {
        let grid = self.lookup(event_id)?.ok_or(EmsError::NotFound(event_id))?;

        if seats.is_empty() {
            return Err(EmsError::EmptyReservation);
        }

        let mut sorted = seats.to_vec();
        sorted.sort_unstable();
        // Locking the same seat twice from one request would self-deadlock.
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(EmsError::DuplicateSeat {
                row: pair[0].x,
                col: pair[0].y,
            });
        }

        let reservation = grid.next_reservation();

        let mut held = match self.acquire_free_seats(&grid, &sorted) {
            Ok(held) => held,
            Err(err) => {
                grid.release_reservation(reservation);
                return Err(err);
            }
        };

        for seat in &mut held {
            self.delay().pause();
            **seat = reservation;
        }
        drop(held);

        debug!(event_id, reservation, seats = sorted.len(), "Seats reserved");
        Ok(reservation)
    }

    /// Lock each seat in order, checking bounds and that it is free.
    ///
    /// On failure every guard taken so far is dropped before returning.
    fn acquire_free_seats<'g>(
        &self,
        grid: &'g SeatGrid,
        sorted: &[Coordinate],
    ) -> EmsResult<Vec<SeatGuard<'g>>> {
        let mut held = Vec::with_capacity(sorted.len());
        for seat in sorted {
            let Some(index) = grid.seat_index(seat.x, seat.y) else {
                return Err(EmsError::InvalidSeat {
                    row: seat.x,
                    col: seat.y,
                });
            };

            let guard = grid.lock_seat(index);
            self.delay().pause();
            if *guard != 0 {
                return Err(EmsError::SeatTaken {
                    row: seat.x,
                    col: seat.y,
                });
            }
            held.push(guard);
        }
        Ok(held)
    }

    /// Consistent copy of an event's seats, row by row.
    ///
    /// # Errors
    ///
    /// Returns `EmsError::NotFound` if the event does not exist.
    pub fn snapshot(&self, event_id: u32) -> EmsResult<Vec<Vec<u32>>> {
        let grid = self.lookup(event_id)?.ok_or(EmsError::NotFound(event_id))?;
        let guards = lock_all(&grid);
        let values = self.read_all(&guards);
        drop(guards);
        Ok(values.chunks(grid.cols()).map(<[u32]>::to_vec).collect())
    }

    /// Write an event's seats to `out` as rows of space-separated values.
    ///
    /// Every seat stays locked until the write finishes, so the output never
    /// shows a reservation that is only partly stamped. The locks are dropped
    /// on every return path.
    ///
    /// # Errors
    ///
    /// - `EmsError::NotFound` if the event does not exist
    /// - `EmsError::Io` if writing fails
    pub fn show<W: Write + ?Sized>(&self, event_id: u32, out: &mut W) -> EmsResult<()> {
        let grid = self.lookup(event_id)?.ok_or(EmsError::NotFound(event_id))?;
        let guards = lock_all(&grid);
        let values = self.read_all(&guards);

        let mut text = String::with_capacity(values.len() * 2);
        for row in values.chunks(grid.cols()) {
            for (col, seat) in row.iter().enumerate() {
                if col > 0 {
                    text.push(' ');
                }
                let _ = write!(text, "{seat}");
            }
            text.push('\n');
        }
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn read_all(&self, guards: &[SeatGuard<'_>]) -> Vec<u32> {
        guards
            .iter()
            .map(|seat| {
                self.delay().pause();
                **seat
            })
            .collect()
    }
}

/// Lock every seat of a grid in row-major order.
fn lock_all(grid: &SeatGrid) -> Vec<SeatGuard<'_>> {
    (0..grid.seat_count()).map(|index| grid.lock_seat(index)).collect()
}
