//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, batch sizes, timeouts)
//! - Check that addresses and the collector endpoint parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{
    AppConfig, DownstreamConfig, EdgeConfig, ObservabilityConfig, TracerConfig, WorkConfig,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must not be zero")]
    Zero { field: &'static str },

    #[error("{field} '{value}' is not a valid socket address")]
    Address { field: &'static str, value: String },

    #[error("tracer.collector_endpoint '{value}' is not an http(s) URL")]
    Endpoint { value: String },
}

/// Configs that can check themselves.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

impl Validate for EdgeConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_app(&self.app, &mut errors);
        check_downstream(&self.downstream, &mut errors);
        check_tracer(&self.tracer, &mut errors);
        check_observability(&self.observability, &mut errors);
        if self.timeouts.request_ms == Some(0) {
            errors.push(ValidationError::Zero {
                field: "timeouts.request_ms",
            });
        }
        finish(errors)
    }
}

impl Validate for WorkConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_app(&self.app, &mut errors);
        check_tracer(&self.tracer, &mut errors);
        check_observability(&self.observability, &mut errors);
        finish(errors)
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_app(app: &AppConfig, errors: &mut Vec<ValidationError>) {
    if app.name.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "app.name" });
    }
    if app.host.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "app.host" });
    }
}

fn check_downstream(downstream: &DownstreamConfig, errors: &mut Vec<ValidationError>) {
    if downstream.name.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: "downstream.name",
        });
    }
    if downstream.host.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: "downstream.host",
        });
    }
    if downstream.port == 0 {
        errors.push(ValidationError::Zero {
            field: "downstream.port",
        });
    }
    if downstream.timeout_ms == Some(0) {
        errors.push(ValidationError::Zero {
            field: "downstream.timeout_ms",
        });
    }
}

fn check_tracer(tracer: &TracerConfig, errors: &mut Vec<ValidationError>) {
    if tracer.name.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: "tracer.name",
        });
    }
    if tracer.batch_size == 0 {
        errors.push(ValidationError::Zero {
            field: "tracer.batch_size",
        });
    }
    if tracer.flush_interval_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "tracer.flush_interval_ms",
        });
    }
    if tracer.export_timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "tracer.export_timeout_ms",
        });
    }
    if tracer.queue_capacity == 0 {
        errors.push(ValidationError::Zero {
            field: "tracer.queue_capacity",
        });
    }
    if let Some(endpoint) = &tracer.collector_endpoint {
        let valid = url::Url::parse(endpoint)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::Endpoint {
                value: endpoint.clone(),
            });
        }
    }
}

fn check_observability(observability: &ObservabilityConfig, errors: &mut Vec<ValidationError>) {
    if observability.log_level.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: "observability.log_level",
        });
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }
}
