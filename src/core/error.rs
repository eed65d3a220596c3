//! Error types for store and reservation operations.

use thiserror::Error;

/// Errors produced by the reservation store and the command layer.
#[derive(Debug, Error)]
pub enum EmsError {
    /// The store has not been initialized (or was already terminated).
    #[error("EMS state must be initialized")]
    NotInitialized,
    /// `init` was called on a store that is already running.
    #[error("EMS state has already been initialized")]
    AlreadyInitialized,
    /// Seat storage for a new event could not be allocated.
    #[error("error allocating memory for event {0}")]
    AllocFailure(u32),
    /// No event with this id exists.
    #[error("event {0} not found")]
    NotFound(u32),
    /// An event with this id already exists.
    #[error("event {0} already exists")]
    AlreadyExists(u32),
    /// Row or column count is zero, or the seat count overflows.
    #[error("invalid event size: {rows}x{cols}")]
    InvalidSize {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },
    /// A coordinate lies outside the event's grid.
    #[error("invalid seat ({row},{col})")]
    InvalidSeat {
        /// 1-based row.
        row: usize,
        /// 1-based column.
        col: usize,
    },
    /// A seat in the request is already owned by another reservation.
    #[error("seat ({row},{col}) already reserved")]
    SeatTaken {
        /// 1-based row.
        row: usize,
        /// 1-based column.
        col: usize,
    },
    /// The same seat appears more than once in a single request.
    #[error("seat ({row},{col}) requested twice")]
    DuplicateSeat {
        /// 1-based row.
        row: usize,
        /// 1-based column.
        col: usize,
    },
    /// A reservation request carried no coordinates.
    #[error("reservation request has no seats")]
    EmptyReservation,
    /// A job line could not be decoded.
    #[error("invalid command. See HELP for usage")]
    InvalidCommand,
    /// Reading a job or writing output failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmsError {
    /// Whether the error invalidates the store itself rather than one command.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized | Self::AlreadyInitialized | Self::AllocFailure(_)
        )
    }

    /// Whether the error is a reservation rejected because a seat was taken.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::SeatTaken { .. })
    }

    /// Whether the error is a request rejected for bad seat coordinates.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(
            self,
            Self::InvalidSeat { .. } | Self::DuplicateSeat { .. } | Self::EmptyReservation
        )
    }
}

/// Result alias for store operations.
pub type EmsResult<T> = Result<T, EmsError>;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
