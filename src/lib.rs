// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! autometer - function-level metrics for Go code.
//!
//! Two halves that share one label contract:
//!
//! - a **generator** that rewrites a Go function so its first statement is a
//!   deferred call into the autometrics runtime package
//! - a **runtime** that records call counts, durations and concurrency with
//!   exemplars and pushes them to a push gateway
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`generate`] - Signature detection, option synthesis and wrapper injection
//! - [`runtime`] - Metrics recorder, exemplars and push dispatcher
//! - [`slo`] - Service-level objective types shared by both halves
//! - [`config`] - Runtime configuration loading and merging
//! - [`telemetry`] - Logging initialization
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```rust,ignore
//! use autometer::generate::{Generator, GeneratorOptions};
//!
//! let mut generator = Generator::new()?;
//! let rewritten = generator.instrument(&source, "Handle", &GeneratorOptions::default())?;
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod runtime;
pub mod slo;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use error::{ConfigError, GenerateError, IdError, PushError, Result};
pub use generate::{Generator, GeneratorOptions};
pub use runtime::{Autometrics, CallInfo, Context, InstrumentGuard, Outcome};
pub use slo::AlertConfiguration;

/// autometer version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        let _options = GeneratorOptions::default();
        let _ctx = Context::new(crate::call_info!("test_public_exports"));
        assert_eq!(Outcome::default(), Outcome::Ok);
    }
}
