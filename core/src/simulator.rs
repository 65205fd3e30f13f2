use crate::clock::{SimClock, SimTime};
use crate::error::{Result, SimError};
use crate::handler::{HandlerRegistry, HandlerResult, Scheduled};
use crate::logger::ModelLogger;
use crate::queue::{EventId, EventQueue};
use serde_json::Value;
use std::fmt::Debug;

/// Default run-wide context: an empty JSON object.
pub type Context = serde_json::Map<String, Value>;

/// The view of a running simulation handed to handler code.
///
/// Everything a model needs lives here: scheduling, cancellation, stopping,
/// the clock, the logger and the shared context. The run loop itself stays
/// in [`Kernel`](crate::Kernel).
pub struct Simulator<C = Context> {
    pub(crate) queue: EventQueue<Scheduled<C>>,
    pub(crate) clock: SimClock,
    pub(crate) stop_requested: bool,
    pub(crate) stop_message: Option<String>,
    logger: ModelLogger,
    registry: HandlerRegistry<C>,
    context: C,
}

impl<C: 'static> Simulator<C> {
    pub(crate) fn new(context: C, mut logger: ModelLogger, registry: HandlerRegistry<C>) -> Self {
        let clock = SimClock::new();
        logger.set_time_getter(clock.reader());
        Self {
            queue: EventQueue::new(),
            clock,
            stop_requested: false,
            stop_message: None,
            logger,
            registry,
            context,
        }
    }

    /// Schedules `handler(sim, args)` to run `delay` time units from now.
    ///
    /// Fails with [`SimError::SchedulingInPast`] for a negative delay and
    /// [`SimError::InvalidDelay`] for NaN or infinity; nothing is queued then.
    pub fn schedule<A, F>(&mut self, delay: SimTime, handler: F, args: A) -> Result<EventId>
    where
        F: FnOnce(&mut Simulator<C>, A) -> HandlerResult + 'static,
        A: Debug + 'static,
    {
        let due = self.due_time(delay)?;
        Ok(self.queue.push(due, Scheduled::typed(handler, args, None)))
    }

    /// Same as [`schedule`](Self::schedule), with a label shown in debug output.
    pub fn schedule_with_label<A, F>(
        &mut self,
        delay: SimTime,
        handler: F,
        args: A,
        label: &str,
    ) -> Result<EventId>
    where
        F: FnOnce(&mut Simulator<C>, A) -> HandlerResult + 'static,
        A: Debug + 'static,
    {
        let due = self.due_time(delay)?;
        Ok(self.queue.push(due, Scheduled::typed(handler, args, Some(label))))
    }

    /// Schedules at the current time, after everything already due now.
    pub fn call<A, F>(&mut self, handler: F, args: A) -> Result<EventId>
    where
        F: FnOnce(&mut Simulator<C>, A) -> HandlerResult + 'static,
        A: Debug + 'static,
    {
        self.schedule(0.0, handler, args)
    }

    pub fn call_with_label<A, F>(&mut self, handler: F, args: A, label: &str) -> Result<EventId>
    where
        F: FnOnce(&mut Simulator<C>, A) -> HandlerResult + 'static,
        A: Debug + 'static,
    {
        self.schedule_with_label(0.0, handler, args, label)
    }

    /// Schedules a registered handler by name. `args` must be a JSON array.
    pub fn schedule_named(&mut self, delay: SimTime, name: &str, args: Value) -> Result<EventId> {
        let due = self.due_time(delay)?;
        let event = self.registry.bind(name, args, None)?;
        Ok(self.queue.push(due, event))
    }

    pub fn schedule_named_with_label(
        &mut self,
        delay: SimTime,
        name: &str,
        args: Value,
        label: &str,
    ) -> Result<EventId> {
        let due = self.due_time(delay)?;
        let event = self.registry.bind(name, args, Some(label))?;
        Ok(self.queue.push(due, event))
    }

    /// Returns the number of events cancelled: 1, or 0 if the id is unknown,
    /// already executed or already cancelled.
    pub fn cancel(&mut self, event_id: EventId) -> usize {
        usize::from(self.queue.cancel(event_id))
    }

    /// Requests a stop. The current handler runs to completion and the run
    /// ends at the next stop check.
    pub fn stop(&mut self, message: &str) {
        self.stop_requested = true;
        self.stop_message = if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        };
    }

    pub fn time(&self) -> SimTime {
        self.clock.now()
    }

    pub fn is_scheduled(&self, event_id: EventId) -> bool {
        self.queue.contains(event_id)
    }

    /// Live events still waiting in the queue.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn logger(&self) -> &ModelLogger {
        &self.logger
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Replaces the context, returning the previous one.
    pub fn set_context(&mut self, context: C) -> C {
        std::mem::replace(&mut self.context, context)
    }

    pub(crate) fn into_context(self) -> C {
        self.context
    }

    fn due_time(&self, delay: SimTime) -> Result<SimTime> {
        if !delay.is_finite() {
            return Err(SimError::InvalidDelay { delay });
        }
        if delay < 0.0 {
            return Err(SimError::SchedulingInPast { delay });
        }
        let due = self.clock.now() + delay;
        if !due.is_finite() {
            return Err(SimError::InvalidDelay { delay });
        }
        Ok(due)
    }
}
