// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging for the generator and the metrics runtime.
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber:
//!
//! ```rust,ignore
//! use autometer::telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! ```
//!
//! Levels in use: `warn` for dropped pushes that failed and for detector
//! fallbacks, `debug` for wrapper replacement and cancellation, `trace` for
//! per-call recording and single-flight drops.

mod init;

pub use init::{init_logging, LogConfig};
