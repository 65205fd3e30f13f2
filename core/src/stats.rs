use crate::clock::SimTime;
use crate::queue::EventId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    NoMoreEvents,
    ReachedRealTimeLimit,
    ReachedSimTimeLimit,
    ReachedEventLimit,
    Stopped,
    /// Debug mode suspended the run before the next handler.
    Interrupted,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::NoMoreEvents => "no more events",
            ExitReason::ReachedRealTimeLimit => "reached real time limit",
            ExitReason::ReachedSimTimeLimit => "reached sim time limit",
            ExitReason::ReachedEventLimit => "reached event limit",
            ExitReason::Stopped => "stopped",
            ExitReason::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// A handler together with the arguments it was (or will be) invoked with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerRecord {
    /// `None` for the initializer, which is not a queued event.
    pub event_id: Option<EventId>,
    pub name: String,
    pub args: String,
    pub label: Option<String>,
    pub time: SimTime,
}

impl fmt::Display for HandlerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} @ {}", self.name, self.args, self.time)?;
        if let Some(label) = &self.label {
            write!(f, " ({})", label)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub num_events_processed: u64,
    pub sim_time: SimTime,
    pub time_elapsed: Duration,
    pub exit_reason: ExitReason,
    pub stop_message: Option<String>,
    pub last_handler: Option<HandlerRecord>,
    /// Only set for [`ExitReason::Interrupted`].
    pub next_handler: Option<HandlerRecord>,
    /// Sim time of the previously executed event.
    pub last_sim_time: SimTime,
}

impl fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} events, sim time {}, {:.3}s elapsed, {}",
            self.num_events_processed,
            self.sim_time,
            self.time_elapsed.as_secs_f64(),
            self.exit_reason
        )?;
        if let Some(msg) = &self.stop_message {
            write!(f, ": {}", msg)?;
        }
        Ok(())
    }
}

/// Everything a completed run hands back.
#[derive(Debug)]
pub struct ExecResult<C, R> {
    pub stats: ExecutionStats,
    pub context: C,
    pub finalized: Option<R>,
}

impl<C, R> ExecResult<C, R> {
    pub fn into_parts(self) -> (ExecutionStats, C, Option<R>) {
        (self.stats, self.context, self.finalized)
    }
}
