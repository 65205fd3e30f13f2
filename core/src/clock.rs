use crate::stats::ExitReason;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Logical simulation time, in model units.
pub type SimTime = f64;

/// The simulation clock.
///
/// Cloning shares the same underlying cell, which is how the logger reads
/// the current time without holding on to the kernel.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<SimTime>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> SimTime {
        self.now.get()
    }

    /// Only the run loop moves the clock, and only forward.
    pub(crate) fn advance_to(&self, time: SimTime) {
        debug_assert!(time >= self.now.get(), "clock moved backwards");
        self.now.set(time);
    }

    /// A detached clock-read callback.
    pub fn reader(&self) -> impl Fn() -> SimTime + 'static {
        let now = Rc::clone(&self.now);
        move || now.get()
    }
}

/// Stop thresholds of a run. `None` disables a threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopLimits {
    pub max_sim_time: Option<SimTime>,
    pub max_real_time: Option<Duration>,
    pub max_num_events: Option<u64>,
}

/// What the run loop knows right before it dequeues the next event.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub now: SimTime,
    /// Due time of the next live event, `None` if the queue is drained.
    pub next_due: Option<SimTime>,
    pub elapsed: Duration,
    pub user_stop: bool,
    pub served: u64,
}

impl StopLimits {
    /// First matching stop condition, in priority order.
    ///
    /// The sim-time ceiling also trips when the next event is due past it,
    /// so that event stays queued and the clock never crosses the ceiling.
    pub fn check(&self, probe: &Probe) -> Option<ExitReason> {
        if let Some(max) = self.max_sim_time {
            let next_past = probe.next_due.map_or(false, |t| t > max);
            if probe.now > max || next_past {
                return Some(ExitReason::ReachedSimTimeLimit);
            }
        }
        if let Some(max) = self.max_real_time {
            if probe.elapsed > max {
                return Some(ExitReason::ReachedRealTimeLimit);
            }
        }
        if probe.user_stop {
            return Some(ExitReason::Stopped);
        }
        if let Some(max) = self.max_num_events {
            if probe.served >= max {
                return Some(ExitReason::ReachedEventLimit);
            }
        }
        if probe.next_due.is_none() {
            return Some(ExitReason::NoMoreEvents);
        }
        None
    }
}
