// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Service-level objective configuration attached to an instrumented function.
//!
//! The same type is used by the code generator (to emit `WithSloName`,
//! `WithAlertLatency` and `WithAlertSuccess` directives) and by the runtime
//! (to fill the objective labels).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Latency objective: `objective` percent of calls complete within `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyObjective {
    pub target: Duration,
    pub objective: f64,
}

/// Success-rate objective, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuccessObjective {
    pub objective: f64,
}

/// A named SLO with optional latency and success thresholds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfiguration {
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencyObjective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<SuccessObjective>,
}

impl AlertConfiguration {
    /// Create an SLO with no thresholds yet.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            latency: None,
            success: None,
        }
    }

    /// Attach a latency threshold.
    pub fn with_latency(mut self, target: Duration, objective: f64) -> Self {
        self.latency = Some(LatencyObjective { target, objective });
        self
    }

    /// Attach a success-rate threshold.
    pub fn with_success(mut self, objective: f64) -> Self {
        self.success = Some(SuccessObjective { objective });
        self
    }

    /// Check names and objectives before they end up in generated code or labels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::invalid("sloName", "must not be empty"));
        }
        if let Some(latency) = &self.latency {
            check_objective("latencyTarget", latency.objective)?;
            if latency.target.is_zero() {
                return Err(ConfigError::invalid("latencyMs", "must be greater than zero"));
            }
        }
        if let Some(success) = &self.success {
            check_objective("successTarget", success.objective)?;
        }
        Ok(())
    }
}

fn check_objective(field: &str, objective: f64) -> Result<(), ConfigError> {
    if objective.is_finite() && objective > 0.0 && objective <= 100.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("objective must be in (0, 100], got {}", objective),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let slo = AlertConfiguration::new("api")
            .with_latency(Duration::from_millis(250), 99.9)
            .with_success(99.0);

        assert_eq!(slo.service_name, "api");
        assert_eq!(slo.latency.unwrap().target, Duration::from_millis(250));
        assert_eq!(slo.success.unwrap().objective, 99.0);
        assert!(slo.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_objective() {
        let slo = AlertConfiguration::new("api").with_success(120.0);
        assert!(slo.validate().is_err());

        let slo = AlertConfiguration::new("api").with_latency(Duration::ZERO, 99.0);
        assert!(slo.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        assert!(AlertConfiguration::new("  ").validate().is_err());
    }
}
