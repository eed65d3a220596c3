//! Job commands: the typed form of a job-file line, its parser, and the
//! dispatcher that applies it to the store.

pub mod dispatcher;
pub mod parser;
pub mod sink;

pub use dispatcher::Dispatcher;
pub use parser::{CommandReader, JobLine};
pub use sink::OutputSink;

use crate::core::Coordinate;

/// Usage text written by `HELP`.
pub const HELP_TEXT: &str = "Available commands:\n  \
CREATE <event_id> <num_rows> <num_columns>\n  \
RESERVE <event_id> [(<x1>,<y1>) (<x2>,<y2>) ...]\n  \
SHOW <event_id>\n  \
LIST\n  \
WAIT <delay_ms> [thread_id]\n  \
BARRIER\n  \
HELP\n";

/// One decoded job-file command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create an event with `rows * cols` seats.
    Create {
        /// Event id.
        event_id: u32,
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },
    /// Reserve a set of seats atomically.
    Reserve {
        /// Event id.
        event_id: u32,
        /// Requested seats, in submission order.
        seats: Vec<Coordinate>,
    },
    /// Print an event's seats.
    Show {
        /// Event id.
        event_id: u32,
    },
    /// Print every event id.
    List,
    /// Sleep, optionally only on one worker thread.
    Wait {
        /// Sleep length in milliseconds.
        delay_ms: u32,
        /// 1-based worker thread the wait applies to; `None` for the thread
        /// that owns the line.
        thread_id: Option<u32>,
    },
    /// Synchronize every worker thread before continuing.
    Barrier,
    /// Print usage.
    Help,
    /// Blank or comment line.
    Empty,
    /// A line that could not be decoded.
    Invalid,
}

impl Command {
    /// Short uppercase keyword, for logs.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Create { .. } => "CREATE",
            Self::Reserve { .. } => "RESERVE",
            Self::Show { .. } => "SHOW",
            Self::List => "LIST",
            Self::Wait { .. } => "WAIT",
            Self::Barrier => "BARRIER",
            Self::Help => "HELP",
            Self::Empty => "EMPTY",
            Self::Invalid => "INVALID",
        }
    }
}
