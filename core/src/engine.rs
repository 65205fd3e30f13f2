use crate::clock::{Probe, SimTime, StopLimits};
use crate::error::{Result, SimError};
use crate::handler::{BoxedHandler, Finalizer, Scheduled};
use crate::queue::EventId;
use crate::simulator::{Context, Simulator};
use crate::stats::{ExecResult, ExecutionStats, ExitReason, HandlerRecord};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Ready,
    Running,
    /// Debug mode popped an event and is waiting for `resume()`.
    Suspended,
    Done,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Ready => "ready",
            RunState::Running => "running",
            RunState::Suspended => "suspended",
            RunState::Done => "done",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one `run()` or `resume()` call.
#[derive(Debug)]
pub enum Progress<R> {
    Interrupted(ExecutionStats),
    Completed {
        stats: ExecutionStats,
        finalized: Option<R>,
    },
}

impl<R> Progress<R> {
    pub fn stats(&self) -> &ExecutionStats {
        match self {
            Progress::Interrupted(stats) => stats,
            Progress::Completed { stats, .. } => stats,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Progress::Interrupted(_))
    }
}

struct PendingHandler<C> {
    record: HandlerRecord,
    call: BoxedHandler<C>,
}

/// The simulation kernel: owns the queue and the clock and runs the loop.
///
/// Built with [`SimulationBuilder`](crate::SimulationBuilder). A kernel runs
/// once; in debug mode it stops after every dequeue and waits for
/// [`resume`](Kernel::resume).
pub struct Kernel<C = Context, R = ()> {
    model_name: String,
    sim: Simulator<C>,
    initializer: Option<Scheduled<C>>,
    finalizer: Option<Finalizer<C, R>>,
    limits: StopLimits,
    debug: bool,
    state: RunState,
    pending: Option<PendingHandler<C>>,
    started_at: Option<Instant>,
    served: u64,
    last_handler: Option<HandlerRecord>,
    last_sim_time: SimTime,
}

impl<C: 'static, R> Kernel<C, R> {
    pub(crate) fn new(
        model_name: String,
        sim: Simulator<C>,
        initializer: Scheduled<C>,
        finalizer: Option<Finalizer<C, R>>,
        limits: StopLimits,
    ) -> Self {
        Self {
            model_name,
            sim,
            initializer: Some(initializer),
            finalizer,
            limits,
            debug: false,
            state: RunState::Ready,
            pending: None,
            started_at: None,
            served: 0,
            last_handler: None,
            last_sim_time: 0.0,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn time(&self) -> SimTime {
        self.sim.time()
    }

    pub fn limits(&self) -> &StopLimits {
        &self.limits
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Turns single-step mode on or off. Allowed while suspended, so a
    /// debugging session can let the rest of the run go.
    pub fn set_debug(&mut self, value: bool) {
        if value != self.debug {
            if value {
                self.sim.logger().info("Enter debugger mode");
            } else {
                self.sim.logger().info("Exit debugger mode");
            }
            self.debug = value;
        }
    }

    pub fn simulator(&self) -> &Simulator<C> {
        &self.sim
    }

    pub fn simulator_mut(&mut self) -> &mut Simulator<C> {
        &mut self.sim
    }

    pub fn context(&self) -> &C {
        self.sim.context()
    }

    pub fn into_context(self) -> C {
        self.sim.into_context()
    }

    pub fn cancel(&mut self, event_id: EventId) -> usize {
        self.sim.cancel(event_id)
    }

    /// Drops every queued event, live or cancelled.
    pub fn clear_events(&mut self) {
        self.sim.queue.clear();
    }

    pub fn num_events_processed(&self) -> u64 {
        self.served
    }

    /// Last handler that ran, the initializer included.
    pub fn last_handler(&self) -> Option<&HandlerRecord> {
        self.last_handler.as_ref()
    }

    /// Handler a suspended kernel will run on `resume()`.
    pub fn next_handler(&self) -> Option<&HandlerRecord> {
        self.pending.as_ref().map(|p| &p.record)
    }

    /// Live queued events in delivery order.
    pub fn future_events(&self) -> Vec<HandlerRecord> {
        self.sim
            .queue
            .entries()
            .into_iter()
            .map(|(time, id, event)| event.record(Some(id), time))
            .collect()
    }

    /// Runs the initializer, then the event loop.
    pub fn run(&mut self) -> Result<Progress<R>> {
        match self.state {
            RunState::Ready => {}
            RunState::Done => return Err(SimError::NoResult),
            other => {
                return Err(SimError::InvalidState {
                    operation: "run",
                    state: other.as_str(),
                })
            }
        }
        self.state = RunState::Running;
        self.started_at = Some(Instant::now());
        self.sim
            .logger()
            .info(format_args!("Starting model '{}'", self.model_name));

        let init = match self.initializer.take() {
            Some(init) => init,
            None => {
                let err = SimError::InvalidHandler("no initializer configured".to_string());
                return Err(self.fail("initializer", err));
            }
        };
        let record = init.record(None, self.sim.time());
        if let Err(err) = (init.call)(&mut self.sim) {
            return Err(self.fail(&record.name, err));
        }
        self.last_handler = Some(record);

        // Nothing seeded: the run is over whatever else the initializer did.
        if self.sim.queue.is_empty() {
            return self.finish(ExitReason::NoMoreEvents);
        }
        self.drive()
    }

    /// Runs the handler the kernel was suspended on, then continues the loop.
    pub fn resume(&mut self) -> Result<Progress<R>> {
        if self.state != RunState::Suspended {
            return Err(SimError::InvalidState {
                operation: "resume",
                state: self.state.as_str(),
            });
        }
        self.state = RunState::Running;
        if let Some(pending) = self.pending.take() {
            self.execute(pending.record, pending.call)?;
        }
        self.drive()
    }

    fn drive(&mut self) -> Result<Progress<R>> {
        loop {
            let probe = Probe {
                now: self.sim.time(),
                next_due: self.sim.queue.peek_time(),
                elapsed: self.elapsed(),
                user_stop: self.sim.stop_requested,
                served: self.served,
            };
            if let Some(reason) = self.limits.check(&probe) {
                return self.finish(reason);
            }

            let (time, id, event) = match self.sim.queue.pop() {
                Ok(entry) => entry,
                Err(err) => return Err(self.fail("event queue", err)),
            };
            self.last_sim_time = self.sim.time();
            self.sim.clock.advance_to(time);
            let record = event.record(Some(id), time);

            if self.debug {
                self.sim.logger().debug(format_args!("Suspended before {}", record));
                self.pending = Some(PendingHandler {
                    record,
                    call: event.call,
                });
                self.state = RunState::Suspended;
                return Ok(Progress::Interrupted(self.stats(ExitReason::Interrupted)));
            }

            self.execute(record, event.call)?;
        }
    }

    fn execute(&mut self, record: HandlerRecord, call: BoxedHandler<C>) -> Result<()> {
        if let Err(err) = call(&mut self.sim) {
            return Err(self.fail(&record.name, err));
        }
        self.last_handler = Some(record);
        self.served += 1;
        Ok(())
    }

    fn finish(&mut self, reason: ExitReason) -> Result<Progress<R>> {
        match &self.sim.stop_message {
            Some(msg) => self
                .sim
                .logger()
                .info(format_args!("Simulation finished: {} ({})", reason, msg)),
            None => self
                .sim
                .logger()
                .info(format_args!("Simulation finished: {}", reason)),
        }
        let finalized = match self.finalizer.take() {
            Some(fin) => match fin(&mut self.sim) {
                Ok(value) => Some(value),
                Err(err) => return Err(self.fail("finalizer", err)),
            },
            None => None,
        };
        self.state = RunState::Done;
        Ok(Progress::Completed {
            stats: self.stats(reason),
            finalized,
        })
    }

    fn stats(&self, reason: ExitReason) -> ExecutionStats {
        ExecutionStats {
            num_events_processed: self.served,
            sim_time: self.sim.time(),
            time_elapsed: self.elapsed(),
            exit_reason: reason,
            stop_message: self.sim.stop_message.clone(),
            last_handler: self.last_handler.clone(),
            next_handler: self.next_handler().cloned(),
            last_sim_time: self.last_sim_time,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    /// Handler errors end the run; they are logged and handed back untouched.
    fn fail(&mut self, origin: &str, err: SimError) -> SimError {
        self.state = RunState::Done;
        self.pending = None;
        self.sim
            .logger()
            .error(format_args!("{} failed: {}", origin, err));
        err
    }
}

impl<C, R> fmt::Debug for Kernel<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("model_name", &self.model_name)
            .field("state", &self.state)
            .field("time", &self.sim.clock.now())
            .field("pending_events", &self.sim.queue.len())
            .field("served", &self.served)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Drives `kernel` to completion and collects the result.
///
/// A kernel that suspends (debug mode) or has already completed yields
/// [`SimError::NoResult`].
pub fn run_simulation<C: 'static, R>(mut kernel: Kernel<C, R>) -> Result<ExecResult<C, R>> {
    match kernel.run()? {
        Progress::Completed { stats, finalized } => Ok(ExecResult {
            stats,
            context: kernel.into_context(),
            finalized,
        }),
        Progress::Interrupted(stats) => {
            kernel
                .simulator()
                .logger()
                .warning(format_args!("Run interrupted before completion: {}", stats));
            Err(SimError::NoResult)
        }
    }
}
