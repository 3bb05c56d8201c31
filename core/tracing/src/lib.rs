// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

pub mod propagation;
pub mod sampler;
pub mod span_context;

pub use propagation::{TRACE_CONTEXT_KEY, TRACEPARENT_KEY};
pub use sampler::Sampler;
pub use span_context::SpanContext;

#[derive(Error, Debug)]
pub enum TracingError {
    #[error("sampling rate must be within [0, 1], got {0}")]
    InvalidSamplingRate(f64),
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TracingConfiguration {
    #[serde(default = "default_log_level")]
    log_level: String,

    #[serde(default = "default_display_thread_names")]
    display_thread_names: bool,

    #[serde(default = "default_display_thread_ids")]
    display_thread_ids: bool,

    #[serde(default = "default_filter")]
    filter: String,

    /// Probability of starting a sampled root span when a call carries no
    /// parent trace context.
    #[serde(default = "default_sampling_rate")]
    sampling_rate: f64,
}

// default implementation for TracingConfiguration
impl Default for TracingConfiguration {
    fn default() -> Self {
        TracingConfiguration {
            log_level: default_log_level(),
            display_thread_names: default_display_thread_names(),
            display_thread_ids: default_display_thread_ids(),
            filter: default_filter(),
            sampling_rate: default_sampling_rate(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_display_thread_names() -> bool {
    true
}

fn default_display_thread_ids() -> bool {
    false
}

fn default_filter() -> String {
    "info".to_string()
}

fn default_sampling_rate() -> f64 {
    0.0
}

// function to convert string tracing level to tracing::Level
fn resolve_level(level: &str) -> tracing::Level {
    let level = level.to_lowercase();
    match level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // default level
    }
}

impl TracingConfiguration {
    pub fn with_log_level(self, log_level: String) -> Self {
        TracingConfiguration { log_level, ..self }
    }

    pub fn with_display_thread_names(self, display_thread_names: bool) -> Self {
        TracingConfiguration {
            display_thread_names,
            ..self
        }
    }

    pub fn with_display_thread_ids(self, display_thread_ids: bool) -> Self {
        TracingConfiguration {
            display_thread_ids,
            ..self
        }
    }

    pub fn with_filter(self, filter: String) -> Self {
        TracingConfiguration { filter, ..self }
    }

    pub fn with_sampling_rate(self, sampling_rate: f64) -> Self {
        TracingConfiguration {
            sampling_rate,
            ..self
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn display_thread_names(&self) -> bool {
        self.display_thread_names
    }

    pub fn display_thread_ids(&self) -> bool {
        self.display_thread_ids
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Check the values that cannot be corrected silently.
    pub fn validate(&self) -> Result<(), TracingError> {
        if !(0.0..=1.0).contains(&self.sampling_rate) {
            return Err(TracingError::InvalidSamplingRate(self.sampling_rate));
        }
        Ok(())
    }

    /// Build the sampler used by the trace propagation middleware.
    pub fn sampler(&self) -> Sampler {
        Sampler::new(self.sampling_rate)
    }

    /// Set up a subscriber that logs to stdout
    pub fn setup_tracing_subscriber(&self) -> Result<(), TracingError> {
        // the log level is the fallback for targets the filter does not mention
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(resolve_level(&self.log_level)).into())
            .parse(&self.filter)
            .map_err(|e| TracingError::InvalidFilter(e.to_string()))?;

        tracing_subscriber::fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_thread_names(self.display_thread_names)
            .with_thread_ids(self.display_thread_ids)
            .try_init()
            .map_err(|e| TracingError::SubscriberInit(e.to_string()))
    }
}
