// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Best-effort, single-flight push of metric snapshots to a push gateway.
//!
//! At most one push is in flight per dispatcher. A push attempted while
//! another is running is dropped, not queued: the next call sends fresher
//! data anyway.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use super::metrics::{MetricFamilies, Scope};
use crate::error::PushError;

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Where snapshots are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEndpoint {
    pub url: String,
    pub job: String,
}

impl PushEndpoint {
    pub fn new(url: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            job: job.into(),
        }
    }

    /// `<url>/metrics/job/<job>`
    pub fn job_url(&self) -> String {
        format!("{}/metrics/job/{}", self.url.trim_end_matches('/'), self.job)
    }
}

/// What happened to a push request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAttempt {
    /// No endpoint configured.
    Disabled,
    /// Another push holds the flag; this one was dropped.
    InFlight,
    /// No tokio runtime to run the push on; dropped.
    Unscheduled,
    /// A task now owns the flag and is sending the snapshot.
    Dispatched,
}

/// Sends snapshots of [`MetricFamilies`] to a push gateway.
#[derive(Debug, Clone)]
pub struct PushDispatcher {
    endpoint: Option<PushEndpoint>,
    client: Client,
    in_flight: Arc<Mutex<()>>,
    timeout: Duration,
    runtime: Option<Handle>,
}

impl PushDispatcher {
    pub fn new(endpoint: Option<PushEndpoint>, timeout: Duration) -> Self {
        Self {
            endpoint,
            client: Client::new(),
            in_flight: Arc::new(Mutex::new(())),
            timeout,
            runtime: None,
        }
    }

    /// A dispatcher that never pushes.
    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }

    /// Runtime used when a push is requested outside of any tokio context.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn endpoint(&self) -> Option<&PushEndpoint> {
        self.endpoint.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Whether a push task currently holds the flag.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Start a push of `scope` unless one is already running.
    ///
    /// Never blocks. The spawned task stops at the timeout or when `parent`
    /// is cancelled, and releases the flag either way.
    pub fn try_push(
        &self,
        families: &Arc<MetricFamilies>,
        scope: Scope,
        parent: &CancellationToken,
    ) -> PushAttempt {
        let Some(endpoint) = &self.endpoint else {
            return PushAttempt::Disabled;
        };

        let Ok(guard) = self.in_flight.clone().try_lock_owned() else {
            tracing::trace!(?scope, "push already in flight, dropping");
            return PushAttempt::InFlight;
        };

        let Some(handle) = Handle::try_current().ok().or_else(|| self.runtime.clone()) else {
            tracing::trace!(?scope, "no runtime for push, dropping");
            return PushAttempt::Unscheduled;
        };

        let task = PushTask {
            guard,
            client: self.client.clone(),
            url: endpoint.job_url(),
            families: Arc::clone(families),
            scope,
            timeout: self.timeout,
            cancel: parent.child_token(),
        };
        handle.spawn(task.run());
        PushAttempt::Dispatched
    }
}

struct PushTask {
    guard: OwnedMutexGuard<()>,
    client: Client,
    url: String,
    families: Arc<MetricFamilies>,
    scope: Scope,
    timeout: Duration,
    cancel: CancellationToken,
}

impl PushTask {
    async fn run(self) {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => Err(PushError::Cancelled),
            sent = tokio::time::timeout(self.timeout, self.send()) => match sent {
                Ok(result) => result,
                Err(_) => Err(PushError::Timeout(self.timeout.as_millis() as u64)),
            },
        };

        match result {
            Ok(()) => tracing::trace!(url = %self.url, scope = ?self.scope, "pushed metrics"),
            Err(PushError::Cancelled) => tracing::debug!(url = %self.url, "push cancelled"),
            Err(e) => tracing::warn!(url = %self.url, error = %e, "failed to push metrics to gateway"),
        }
        drop(self.guard);
    }

    async fn send(&self) -> Result<(), PushError> {
        let body = self.families.encode(self.scope)?;
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PushError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_url() {
        let endpoint = PushEndpoint::new("http://localhost:9091/", "batch");
        assert_eq!(endpoint.job_url(), "http://localhost:9091/metrics/job/batch");
    }

    #[test]
    fn test_disabled_without_endpoint() {
        let dispatcher = PushDispatcher::disabled();
        let families = Arc::new(MetricFamilies::default());
        let attempt = dispatcher.try_push(&families, Scope::All, &CancellationToken::new());
        assert_eq!(attempt, PushAttempt::Disabled);
        assert!(!dispatcher.is_in_flight());
    }

    #[test]
    fn test_unscheduled_without_runtime() {
        let dispatcher = PushDispatcher::new(
            Some(PushEndpoint::new("http://127.0.0.1:9", "job")),
            Duration::from_secs(1),
        );
        let families = Arc::new(MetricFamilies::default());
        let attempt = dispatcher.try_push(&families, Scope::All, &CancellationToken::new());
        assert_eq!(attempt, PushAttempt::Unscheduled);
        assert!(!dispatcher.is_in_flight());
    }
}
