//! Pull-style decoder for job files.
//!
//! Grammar, one command per line:
//!
//! ```text
//! CREATE <event_id> <num_rows> <num_cols>
//! RESERVE <event_id> [(<x1>,<y1>) (<x2>,<y2>) ...]
//! SHOW <event_id>
//! LIST
//! WAIT <delay_ms> [thread_id]
//! BARRIER
//! HELP
//! # comment
//! ```
//!
//! Blank and comment lines decode to `Command::Empty` and do not consume a
//! line index. Every other line, including undecodable ones, consumes exactly
//! one index; that index is what worker threads partition on.

use std::io::BufRead;

use super::Command;
use crate::core::{Coordinate, EmsResult, MAX_RESERVATION_SIZE};

/// A decoded command together with its line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLine {
    /// 0-based ordinal among non-empty, non-comment lines. For
    /// `Command::Empty` this is the index the next real command will get.
    pub index: usize,
    /// The decoded command.
    pub command: Command,
}

/// Reads commands one at a time from a job source.
#[derive(Debug)]
pub struct CommandReader<R> {
    input: R,
    buf: String,
    next_index: usize,
}

impl<R: BufRead> CommandReader<R> {
    /// Wrap a buffered reader positioned at the start of a job.
    pub fn new(input: R) -> Self {
        Self {
            input,
            buf: String::new(),
            next_index: 0,
        }
    }

    /// Decode the next line; `Ok(None)` marks the end of the commands.
    ///
    /// # Errors
    ///
    /// Returns `EmsError::Io` if the underlying reader fails.
    pub fn next_command(&mut self) -> EmsResult<Option<JobLine>> {
        self.buf.clear();
        if self.input.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }

        let command = parse_line(&self.buf);
        let index = self.next_index;
        if command != Command::Empty {
            self.next_index += 1;
        }
        Ok(Some(JobLine { index, command }))
    }
}

impl<R: BufRead> Iterator for CommandReader<R> {
    type Item = EmsResult<JobLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_command().transpose()
    }
}

/// Decode a single job-file line.
#[must_use]
pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Command::Empty;
    }

    let (keyword, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(keyword, rest)| (keyword, rest.trim()));

    let parsed = match keyword {
        "CREATE" => parse_create(rest),
        "RESERVE" => parse_reserve(rest),
        "SHOW" => parse_show(rest),
        "LIST" => rest.is_empty().then_some(Command::List),
        "WAIT" => parse_wait(rest),
        "BARRIER" => rest.is_empty().then_some(Command::Barrier),
        "HELP" => rest.is_empty().then_some(Command::Help),
        _ => None,
    };
    parsed.unwrap_or(Command::Invalid)
}

fn parse_numbers<const N: usize>(text: &str) -> Option<[u64; N]> {
    let mut values = [0; N];
    let mut tokens = text.split_whitespace();
    for value in &mut values {
        *value = tokens.next()?.parse().ok()?;
    }
    tokens.next().is_none().then_some(values)
}

fn parse_create(rest: &str) -> Option<Command> {
    let [event_id, rows, cols] = parse_numbers::<3>(rest)?;
    Some(Command::Create {
        event_id: event_id.try_into().ok()?,
        rows: rows.try_into().ok()?,
        cols: cols.try_into().ok()?,
    })
}

fn parse_show(rest: &str) -> Option<Command> {
    let [event_id] = parse_numbers::<1>(rest)?;
    Some(Command::Show {
        event_id: event_id.try_into().ok()?,
    })
}

fn parse_wait(rest: &str) -> Option<Command> {
    let mut tokens = rest.split_whitespace();
    let delay_ms = tokens.next()?.parse().ok()?;
    let thread_id = match tokens.next() {
        Some(token) => Some(token.parse().ok()?),
        None => None,
    };
    if tokens.next().is_some() {
        return None;
    }
    Some(Command::Wait {
        delay_ms,
        thread_id,
    })
}

/// `RESERVE <id> [(x,y) (x,y) ...]`; the brackets are optional.
fn parse_reserve(rest: &str) -> Option<Command> {
    let (id, seats) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(id, seats)| (id, seats.trim()));
    let event_id = id.parse().ok()?;

    let seats = match seats.strip_prefix('[') {
        Some(inner) => inner.strip_suffix(']')?,
        None => seats,
    };

    let mut coordinates = Vec::new();
    let mut remaining = seats.trim_start();
    while !remaining.is_empty() {
        let body = remaining.strip_prefix('(')?;
        let (pair, tail) = body.split_once(')')?;
        let (x, y) = pair.split_once(',')?;
        coordinates.push(Coordinate::new(x.trim().parse().ok()?, y.trim().parse().ok()?));
        if coordinates.len() > MAX_RESERVATION_SIZE {
            return None;
        }
        remaining = tail.trim_start();
    }

    if coordinates.is_empty() {
        return None;
    }
    Some(Command::Reserve {
        event_id,
        seats: coordinates,
    })
}
