//! Routes decoded commands to the store.

use std::io::Write;

use tracing::{debug, info};

use super::{Command, OutputSink, HELP_TEXT};
use crate::core::{Ems, EmsError, EmsResult};

/// Applies commands to one store, writing results to one sink.
///
/// The dispatcher does no seat math; it only picks the store operation and,
/// for commands that produce output, holds the sink for the whole
/// format-and-write step.
#[derive(Debug)]
pub struct Dispatcher<'a, W> {
    ems: &'a Ems,
    sink: &'a OutputSink<W>,
}

impl<W> Clone for Dispatcher<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Dispatcher<'_, W> {}

impl<'a, W: Write> Dispatcher<'a, W> {
    /// Dispatch against `ems`, writing to `sink`.
    pub const fn new(ems: &'a Ems, sink: &'a OutputSink<W>) -> Self {
        Self { ems, sink }
    }

    /// Execute one command.
    ///
    /// `Barrier` and `Empty` are no-ops here; barriers are handled by the
    /// scheduler before dispatch.
    ///
    /// # Errors
    ///
    /// Returns the store error for a failed `CREATE`/`RESERVE`/`SHOW`/`LIST`,
    /// `EmsError::InvalidCommand` for an undecodable line, and `EmsError::Io`
    /// if the sink rejects a write. None of these are fatal to the job.
    pub fn dispatch(&self, command: &Command) -> EmsResult<()> {
        match command {
            Command::Create {
                event_id,
                rows,
                cols,
            } => self.ems.create(*event_id, *rows, *cols),
            Command::Reserve { event_id, seats } => {
                let reservation = self.ems.reserve(*event_id, seats)?;
                debug!(event_id, reservation, "Reservation committed");
                Ok(())
            }
            Command::Show { event_id } => self.sink.with(|out| self.ems.show(*event_id, out)),
            Command::List => self.sink.with(|out| self.ems.list_events(out)),
            Command::Wait { delay_ms, .. } => {
                if *delay_ms > 0 {
                    info!(delay_ms, "Waiting...");
                    self.ems.wait(*delay_ms);
                }
                Ok(())
            }
            Command::Help => self.sink.write_str(HELP_TEXT).map_err(EmsError::from),
            Command::Barrier | Command::Empty => Ok(()),
            Command::Invalid => Err(EmsError::InvalidCommand),
        }
    }
}
