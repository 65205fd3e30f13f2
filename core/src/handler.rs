use crate::clock::SimTime;
use crate::error::{Result, SimError};
use crate::queue::EventId;
use crate::simulator::Simulator;
use crate::stats::HandlerRecord;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::Rc;

pub type HandlerResult = Result<()>;

pub(crate) type BoxedHandler<C> = Box<dyn FnOnce(&mut Simulator<C>) -> HandlerResult>;

pub(crate) type Finalizer<C, R> = Box<dyn FnOnce(&mut Simulator<C>) -> Result<R>>;

/// Handler looked up by name and fed JSON arguments.
pub type DynHandler<C> = Rc<dyn Fn(&mut Simulator<C>, &[Value]) -> HandlerResult>;

/// A handler with its arguments already bound, waiting in the queue.
pub(crate) struct Scheduled<C> {
    pub name: String,
    pub args: String,
    pub label: Option<String>,
    pub call: BoxedHandler<C>,
}

impl<C: 'static> Scheduled<C> {
    pub fn typed<A, F>(handler: F, args: A, label: Option<&str>) -> Self
    where
        F: FnOnce(&mut Simulator<C>, A) -> HandlerResult + 'static,
        A: Debug + 'static,
    {
        Self {
            name: handler_name::<F>(),
            args: format!("{:?}", args),
            label: label.map(str::to_string),
            call: Box::new(move |sim: &mut Simulator<C>| handler(sim, args)),
        }
    }

    pub fn record(&self, event_id: Option<EventId>, time: SimTime) -> HandlerRecord {
        HandlerRecord {
            event_id,
            name: self.name.clone(),
            args: self.args.clone(),
            label: self.label.clone(),
            time,
        }
    }
}

/// Short, readable name of a handler type: `model::arrive` becomes `arrive`,
/// a closure keeps the name of the function it was written in.
pub(crate) fn handler_name<F>() -> String {
    let full = std::any::type_name::<F>();
    let trimmed = full.trim_end_matches("::{{closure}}");
    let base = trimmed.rsplit("::").next().unwrap_or(trimmed);
    if trimmed.len() == full.len() {
        base.to_string()
    } else {
        format!("{}::{{closure}}", base)
    }
}

/// Named handlers for runs described by data rather than code.
pub struct HandlerRegistry<C> {
    handlers: HashMap<String, DynHandler<C>>,
}

impl<C: 'static> HandlerRegistry<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&mut Simulator<C>, &[Value]) -> HandlerResult + 'static,
    {
        self.handlers.insert(name.to_string(), Rc::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolves `name` and checks `args` is an argument list.
    pub(crate) fn bind(&self, name: &str, args: Value, label: Option<&str>) -> Result<Scheduled<C>> {
        let handler = self
            .handlers
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::InvalidHandler(format!("no handler registered as '{}'", name)))?;
        let rendered = args.to_string();
        let items = match args {
            Value::Array(items) => items,
            other => {
                return Err(SimError::InvalidArguments {
                    handler: name.to_string(),
                    reason: format!("expected a JSON array, got {}", other),
                })
            }
        };
        Ok(Scheduled {
            name: name.to_string(),
            args: rendered,
            label: label.map(str::to_string),
            call: Box::new(move |sim: &mut Simulator<C>| handler(sim, &items)),
        })
    }
}

impl<C: 'static> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for HandlerRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}
