use crate::clock::{SimTime, StopLimits};
use crate::config::{KernelConfig, LoggerConfig};
use crate::engine::Kernel;
use crate::error::{Result, SimError};
use crate::handler::{Finalizer, HandlerRegistry, HandlerResult, Scheduled};
use crate::logger::ModelLogger;
use crate::simulator::Simulator;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

enum InitSpec<C> {
    Typed(Scheduled<C>),
    Named { name: String, args: Value },
}

/// Assembles a [`Kernel`].
///
/// ```
/// use desk_core::{run_simulation, ExitReason, HandlerResult, SimulationBuilder, Simulator};
///
/// fn tick(sim: &mut Simulator<u32>, left: u32) -> HandlerResult {
///     *sim.context_mut() += 1;
///     if left > 1 {
///         sim.schedule(1.0, tick, left - 1)?;
///     }
///     Ok(())
/// }
///
/// fn init(sim: &mut Simulator<u32>, n: u32) -> HandlerResult {
///     sim.schedule(1.0, tick, n)?;
///     Ok(())
/// }
///
/// let kernel = SimulationBuilder::new("ticker").initializer(init, 3).build().unwrap();
/// let result = run_simulation(kernel).unwrap();
/// assert_eq!(result.context, 3);
/// assert_eq!(result.stats.exit_reason, ExitReason::NoMoreEvents);
/// assert_eq!(result.stats.sim_time, 3.0);
/// ```
pub struct SimulationBuilder<C, R = ()> {
    model_name: String,
    initializer: Option<InitSpec<C>>,
    finalizer: Option<Finalizer<C, R>>,
    context: C,
    limits: StopLimits,
    logger: LoggerConfig,
    debug: bool,
    registry: HandlerRegistry<C>,
}

impl<C: Default + 'static> SimulationBuilder<C, ()> {
    /// Starts from `C::default()` as the context.
    pub fn new(model_name: &str) -> Self {
        Self::with_context(model_name, C::default())
    }
}

impl<C: 'static> SimulationBuilder<C, ()> {
    pub fn with_context(model_name: &str, context: C) -> Self {
        Self {
            model_name: model_name.to_string(),
            initializer: None,
            finalizer: None,
            context,
            limits: StopLimits::default(),
            logger: LoggerConfig::default(),
            debug: false,
            registry: HandlerRegistry::new(),
        }
    }
}

impl<C: 'static, R> SimulationBuilder<C, R> {
    /// The handler run once at start; it seeds the queue.
    pub fn initializer<A, F>(mut self, handler: F, args: A) -> Self
    where
        F: FnOnce(&mut Simulator<C>, A) -> HandlerResult + 'static,
        A: Debug + 'static,
    {
        self.initializer = Some(InitSpec::Typed(Scheduled::typed(handler, args, None)));
        self
    }

    /// Uses a registered handler as the initializer; resolved in `build()`.
    pub fn named_initializer(mut self, name: &str, args: Value) -> Self {
        self.initializer = Some(InitSpec::Named {
            name: name.to_string(),
            args,
        });
        self
    }

    /// Run after the loop ends; its value comes back in the result.
    pub fn finalizer<R2, F>(self, finalizer: F) -> SimulationBuilder<C, R2>
    where
        F: FnOnce(&mut Simulator<C>) -> Result<R2> + 'static,
    {
        SimulationBuilder {
            model_name: self.model_name,
            initializer: self.initializer,
            finalizer: Some(Box::new(finalizer)),
            context: self.context,
            limits: self.limits,
            logger: self.logger,
            debug: self.debug,
            registry: self.registry,
        }
    }

    pub fn context(mut self, context: C) -> Self {
        self.context = context;
        self
    }

    pub fn max_sim_time(mut self, value: SimTime) -> Self {
        self.limits.max_sim_time = Some(value);
        self
    }

    pub fn max_real_time(mut self, value: Duration) -> Self {
        self.limits.max_real_time = Some(value);
        self
    }

    pub fn max_num_events(mut self, value: u64) -> Self {
        self.limits.max_num_events = Some(value);
        self
    }

    pub fn logger_config(mut self, config: LoggerConfig) -> Self {
        self.logger = config;
        self
    }

    pub fn debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    pub fn register<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Simulator<C>, &[Value]) -> HandlerResult + 'static,
    {
        self.registry.register(name, handler);
        self
    }

    pub fn registry(mut self, registry: HandlerRegistry<C>) -> Self {
        self.registry = registry;
        self
    }

    /// Takes name, limits, logger, debug flag and (if set) the named
    /// initializer from `config`. Fails with `InvalidConfig` on bad limits.
    pub fn apply_config(mut self, config: &KernelConfig) -> Result<Self> {
        self.limits = config.limits()?;
        self.model_name = config.model_name.clone();
        self.logger = config.logger;
        self.debug = config.debug;
        if let Some(name) = &config.initializer {
            self.initializer = Some(InitSpec::Named {
                name: name.clone(),
                args: config.initializer_args.clone(),
            });
        }
        Ok(self)
    }

    pub fn build(self) -> Result<Kernel<C, R>> {
        let initializer = match self.initializer {
            Some(InitSpec::Typed(init)) => init,
            Some(InitSpec::Named { name, args }) => self.registry.bind(&name, args, None)?,
            None => {
                return Err(SimError::InvalidHandler(
                    "an initializer is required".to_string(),
                ))
            }
        };
        let mut logger = ModelLogger::new(&self.model_name);
        logger.setup(self.logger);

        let sim = Simulator::new(self.context, logger, self.registry);
        let mut kernel = Kernel::new(
            self.model_name,
            sim,
            initializer,
            self.finalizer,
            self.limits,
        );
        kernel.set_debug(self.debug);
        Ok(kernel)
    }
}

/// One-call construction from a configuration document and a typed
/// initializer. A named initializer in `config` takes precedence.
pub fn build_simulation<C, A, F>(config: &KernelConfig, init: F, args: A) -> Result<Kernel<C>>
where
    C: Default + 'static,
    F: FnOnce(&mut Simulator<C>, A) -> HandlerResult + 'static,
    A: Debug + 'static,
{
    SimulationBuilder::new(&config.model_name)
        .initializer(init, args)
        .apply_config(config)?
        .build()
}
