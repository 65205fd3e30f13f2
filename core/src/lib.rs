//! Deterministic discrete-event simulation kernel.
//!
//! Handlers are scheduled at points of a logical clock; the [`Kernel`] pops
//! them in `(time, sequence)` order and runs each to completion until the
//! queue drains or a stop condition fires.

pub mod builder;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod logger;
pub mod queue;
pub mod simulator;
pub mod stats;

pub use builder::{build_simulation, SimulationBuilder};
pub use clock::{SimClock, SimTime, StopLimits};
pub use config::{KernelConfig, LoggerConfig};
pub use engine::{run_simulation, Kernel, Progress, RunState};
pub use error::{Result, SimError};
pub use handler::{DynHandler, HandlerRegistry, HandlerResult};
pub use logger::ModelLogger;
pub use queue::{EventId, EventQueue};
pub use simulator::{Context, Simulator};
pub use stats::{ExecResult, ExecutionStats, ExitReason, HandlerRecord};
