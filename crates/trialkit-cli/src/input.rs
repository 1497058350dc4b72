//! Line input raced against feedback timers.

use anyhow::Result;
use tokio::io::{AsyncBufRead, Lines};
use tokio::time::Instant;

use trialkit_core::advance::Pending;

/// What happened while waiting for the user.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    /// A line was entered (trimmed).
    Line(String),
    /// The pending timer fired first.
    Elapsed,
    /// Input closed.
    Closed,
}

/// Pair a pending transition with the instant it falls due.
pub fn schedule<K>(pending: Pending<K>) -> (Pending<K>, Instant) {
    let deadline = Instant::now() + pending.delay;
    (pending, deadline)
}

/// Wait for the next line, or until `deadline` if a transition is pending.
///
/// A line that arrives first is returned and the deadline stays where it
/// was, so the caller can wait on it again.
pub async fn next_input<R>(lines: &mut Lines<R>, deadline: Option<Instant>) -> Result<Input>
where
    R: AsyncBufRead + Unpin,
{
    let line = match deadline {
        Some(deadline) => {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return Ok(Input::Elapsed),
                line = lines.next_line() => line?,
            }
        }
        None => lines.next_line().await?,
    };
    Ok(line.map_or(Input::Closed, |l| Input::Line(l.trim().to_string())))
}
