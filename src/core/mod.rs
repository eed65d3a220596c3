//! Reservation store, seat grids and the reservation engine.

pub mod ems;
pub mod error;
pub mod grid;
pub mod reservation;
pub mod store;

pub use ems::Ems;
pub use error::{AppResult, EmsError, EmsResult};
pub use grid::{SeatGrid, SeatGuard};
pub use reservation::{Coordinate, MAX_RESERVATION_SIZE};
pub use store::{Listing, ReservationStore};
