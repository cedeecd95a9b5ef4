// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Entry and exit hooks of instrumented calls.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use super::context::{BuildInfo, Context, Outcome};
use super::exemplars::exemplars;
use super::labels::{counter_labels, gauge_labels, histogram_labels, LabelSet};
use super::metrics::{MetricFamilies, Scope};
use super::push::{PushAttempt, PushDispatcher};
use crate::config::ResolvedRuntimeConfig;

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// One instrumented call active on the current thread.
struct Frame {
    id: u64,
    function: String,
    module: String,
    /// Cleared when the call ends anywhere, including on another thread.
    live: Arc<AtomicBool>,
}

thread_local! {
    static CALL_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Innermost live call on this thread. Frames of calls that ended elsewhere
/// are pruned on the way.
fn current_caller() -> Option<(String, String)> {
    CALL_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.retain(|frame| frame.live.load(Ordering::Acquire));
        stack
            .last()
            .map(|frame| (frame.function.clone(), frame.module.clone()))
    })
}

fn push_frame(function: &str, module: &str) -> FrameHandle {
    let id = NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed);
    let live = Arc::new(AtomicBool::new(true));
    CALL_STACK.with(|stack| {
        stack.borrow_mut().push(Frame {
            id,
            function: function.to_string(),
            module: module.to_string(),
            live: Arc::clone(&live),
        })
    });
    FrameHandle {
        id,
        thread: thread::current().id(),
        live,
    }
}

/// Ties a [`CallMarker`] to the stack frame pushed for it.
#[derive(Debug)]
struct FrameHandle {
    id: u64,
    thread: ThreadId,
    live: Arc<AtomicBool>,
}

impl FrameHandle {
    /// End the frame. Off the owning thread the frame is only marked dead;
    /// the owning thread prunes it on its next lookup.
    fn release(self) {
        self.live.store(false, Ordering::Release);
        if thread::current().id() != self.thread {
            return;
        }
        // Already gone when the thread-local was torn down.
        let _ = CALL_STACK.try_with(|stack| {
            if let Ok(mut stack) = stack.try_borrow_mut() {
                stack.retain(|frame| frame.id != self.id);
            }
        });
    }
}

/// Returned by [`Autometrics::on_enter`]; hand it back to [`Autometrics::on_exit`].
///
/// A marker dropped without reaching the exit hook records nothing but still
/// leaves the caller stack.
#[derive(Debug)]
pub struct CallMarker {
    context: Context,
    started: Instant,
    frame: Option<FrameHandle>,
}

impl Drop for CallMarker {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.release();
        }
    }
}

impl CallMarker {
    /// The completed context of the call.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn started(&self) -> Instant {
        self.started
    }
}

/// Records call counts, durations and concurrency of instrumented functions.
#[derive(Debug, Clone)]
pub struct Autometrics {
    families: Arc<MetricFamilies>,
    dispatcher: PushDispatcher,
    build: BuildInfo,
    shutdown: CancellationToken,
}

impl Autometrics {
    pub fn new(config: &ResolvedRuntimeConfig) -> Self {
        Self::with_parts(
            MetricFamilies::new(config.buckets.clone()),
            PushDispatcher::new(config.push_endpoint.clone(), config.push_timeout),
            config.build.clone(),
        )
    }

    pub fn with_parts(families: MetricFamilies, dispatcher: PushDispatcher, build: BuildInfo) -> Self {
        Self {
            families: Arc::new(families),
            dispatcher,
            build,
            shutdown: CancellationToken::new(),
        }
    }

    /// Start recording a call.
    ///
    /// Fills caller, build and tracing information into `ctx`, bumps the
    /// concurrency gauge and requests a gauge-only push. Returns `None` once
    /// the recorder has been shut down.
    pub fn on_enter(&self, mut ctx: Context) -> Option<CallMarker> {
        if self.is_shut_down() {
            return None;
        }

        if ctx.track_caller_name && !ctx.call.has_caller() {
            if let Some((function, module)) = current_caller() {
                ctx.call.caller_function = function;
                ctx.call.caller_module = module;
            }
        }
        let frame = push_frame(&ctx.call.function, &ctx.call.module);

        ctx.build = self.build.clone();
        ctx.fill_tracing_info();

        if ctx.track_concurrent_calls {
            self.families.add_concurrent(&gauge_labels(&ctx), 1);
        }
        self.push(Scope::Concurrency);

        Some(CallMarker {
            context: ctx,
            started: Instant::now(),
            frame: Some(frame),
        })
    }

    /// Finish recording a call. `error` decides the `result` label.
    pub fn on_exit(&self, marker: CallMarker, error: Option<&dyn std::error::Error>) {
        self.finish(marker, Outcome::from_error(error));
    }

    /// [`on_exit`](Self::on_exit) with the outcome given directly.
    pub fn finish(&self, mut marker: CallMarker, outcome: Outcome) {
        if let Some(frame) = marker.frame.take() {
            frame.release();
        }
        let ctx = &marker.context;

        if self.is_shut_down() {
            return;
        }

        let exemplar = Some(exemplars(ctx)).filter(|labels| !labels.is_empty());
        let elapsed = marker.started.elapsed().as_secs_f64();

        self.families
            .record_call(&counter_labels(ctx, outcome), exemplar.clone());
        self.families
            .observe_duration(&histogram_labels(ctx), elapsed, exemplar);
        if ctx.track_concurrent_calls {
            self.families.add_concurrent(&gauge_labels(ctx), -1);
        }

        tracing::trace!(
            function = %ctx.call.function,
            result = %outcome,
            elapsed_secs = elapsed,
            "recorded call"
        );
        self.push(Scope::All);
    }

    /// Record the call for the lifetime of the returned guard.
    pub fn instrument(&self, ctx: Context) -> InstrumentGuard<'_> {
        InstrumentGuard {
            recorder: self,
            marker: self.on_enter(ctx),
            outcome: Outcome::Ok,
        }
    }

    fn push(&self, scope: Scope) -> PushAttempt {
        self.dispatcher
            .try_push(&self.families, scope, &self.shutdown)
    }

    /// Stop recording. Cancels in-flight pushes; later calls to the entry
    /// points do nothing.
    pub fn shutdown(&self) {
        tracing::debug!("autometrics recorder shutting down");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn families(&self) -> &MetricFamilies {
        &self.families
    }

    pub fn dispatcher(&self) -> &PushDispatcher {
        &self.dispatcher
    }

    /// All families in OpenMetrics text.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        self.families.encode(Scope::All)
    }

    /// Counter value for a completed-call label set.
    pub fn call_count(&self, labels: &LabelSet) -> u64 {
        self.families.call_count(labels)
    }
}

impl Default for Autometrics {
    fn default() -> Self {
        Self::with_parts(
            MetricFamilies::default(),
            PushDispatcher::disabled(),
            BuildInfo::default(),
        )
    }
}

/// Scoped recording of one call; the exit hook runs on drop.
///
/// The call is reported as an error if [`fail`](Self::fail) was called, if
/// [`record_result`](Self::record_result) saw an `Err`, or if the guard is
/// dropped while unwinding.
#[must_use = "the call is recorded when the guard is dropped"]
pub struct InstrumentGuard<'a> {
    recorder: &'a Autometrics,
    marker: Option<CallMarker>,
    outcome: Outcome,
}

impl InstrumentGuard<'_> {
    pub fn fail(&mut self) {
        self.outcome = Outcome::Error;
    }

    /// Pass a result through, noting whether it failed.
    pub fn record_result<T, E>(&mut self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            self.outcome = Outcome::Error;
        }
        result
    }

    /// `None` when the recorder was shut down before the call started.
    pub fn context(&self) -> Option<&Context> {
        self.marker.as_ref().map(CallMarker::context)
    }
}

impl Drop for InstrumentGuard<'_> {
    fn drop(&mut self) {
        let Some(marker) = self.marker.take() else {
            return;
        };
        let outcome = if std::thread::panicking() {
            Outcome::Error
        } else {
            self.outcome
        };
        self.recorder.finish(marker, outcome);
    }
}
