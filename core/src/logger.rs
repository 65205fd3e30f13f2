use crate::clock::SimTime;
use crate::config::LoggerConfig;
use log::Level;
use std::fmt;

/// Logger handed to model code.
///
/// Forwards to the `log` facade using the model name as target, and stamps
/// each line with simulation time read through the time getter.
pub struct ModelLogger {
    name: String,
    config: LoggerConfig,
    time_getter: Option<Box<dyn Fn() -> SimTime>>,
}

impl ModelLogger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            config: LoggerConfig::default(),
            time_getter: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn setup(&mut self, config: LoggerConfig) {
        self.config = config;
    }

    pub fn set_time_getter(&mut self, getter: impl Fn() -> SimTime + 'static) {
        self.time_getter = Some(Box::new(getter));
    }

    pub fn time(&self) -> SimTime {
        self.time_getter.as_ref().map_or(0.0, |get| get())
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.config.level
    }

    pub fn debug(&self, msg: impl fmt::Display) {
        self.emit(Level::Debug, "", msg);
    }

    pub fn info(&self, msg: impl fmt::Display) {
        self.emit(Level::Info, "", msg);
    }

    pub fn warning(&self, msg: impl fmt::Display) {
        self.emit(Level::Warn, "", msg);
    }

    pub fn error(&self, msg: impl fmt::Display) {
        self.emit(Level::Error, "", msg);
    }

    /// `log` tops out at `Error`, so critical lines carry a marker instead.
    pub fn critical(&self, msg: impl fmt::Display) {
        self.emit(Level::Error, "CRITICAL ", msg);
    }

    /// Renders the line exactly as it is sent to `log`.
    pub fn format_line(&self, marker: &str, msg: impl fmt::Display) -> String {
        format!(
            "[{:>10.prec$}] {}{}",
            self.time(),
            marker,
            msg,
            prec = self.config.time_precision
        )
    }

    fn emit(&self, level: Level, marker: &str, msg: impl fmt::Display) {
        if !self.enabled(level) {
            return;
        }
        let line = self.format_line(marker, msg);
        log::log!(target: self.name.as_str(), level, "{}", line);
    }
}

impl fmt::Debug for ModelLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLogger")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
