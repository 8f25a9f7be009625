// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{Context, PauseGate, SpanContext};
use crate::registry::TraceRegistry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// The seam to the host context-propagation mechanism. Every context
/// switch on a thread passes through [ContextStorage::attach]; the
/// returned scope restores the previous context when dropped.
pub trait ContextStorage {
    type Scope;

    fn attach(&self, context: Context) -> Self::Scope;

    fn current(&self) -> Context;
}

/// Per-thread mapping from thread identity to the currently-active trace
/// context. Writers are the attaching threads, the reader is the sampling
/// driver; a context is always published as a whole value, so lookups
/// never observe a torn entry.
#[derive(Default)]
pub struct ActiveContextTable {
    entries: RwLock<HashMap<ThreadId, SpanContext>>,
}

impl ActiveContextTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, thread: ThreadId) -> Option<SpanContext> {
        self.entries.read().get(&thread).copied()
    }

    /// Publishes the span as the thread's active context. `None` or an
    /// invalid span removes the entry.
    pub fn publish(&self, thread: ThreadId, span: Option<SpanContext>) {
        let mut entries = self.entries.write();
        match span {
            Some(span) if span.is_valid() => {
                entries.insert(thread, span);
            }
            _ => {
                entries.remove(&thread);
            }
        }
    }

    pub fn snapshot(&self) -> Vec<(ThreadId, SpanContext)> {
        self.entries
            .read()
            .iter()
            .map(|(thread, span)| (*thread, *span))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Wraps the host [ContextStorage] and keeps an [ActiveContextTable]
/// current with minimal hot-path overhead.
///
/// Only sampled spans belonging to registered traces are published;
/// unsampled activity is invisible to the profiler by design, keeping data
/// volume proportional to the trace sampling rate. Re-attaching the
/// thread's current span is a true no-op for the table.
pub struct ActiveSpanTracker<C> {
    delegate: C,
    table: Arc<ActiveContextTable>,
    registry: Arc<dyn TraceRegistry>,
    gate: Arc<PauseGate>,
}

impl<C> ActiveSpanTracker<C> {
    pub fn new(delegate: C, registry: Arc<dyn TraceRegistry>) -> Self {
        Self {
            delegate,
            table: Arc::new(ActiveContextTable::new()),
            registry,
            gate: Arc::new(PauseGate::new()),
        }
    }

    /// The span currently active on the given thread, if any.
    pub fn active_span(&self, thread: ThreadId) -> Option<SpanContext> {
        self.table.get(thread)
    }

    /// Takes a consistent snapshot of the active context table. Publishers
    /// are paused for the duration of the read and released afterwards,
    /// including when the read unwinds.
    pub fn snapshot(&self) -> Vec<(ThreadId, SpanContext)> {
        let _pause = self.gate.pause();
        self.table.snapshot()
    }

    pub fn table(&self) -> &Arc<ActiveContextTable> {
        &self.table
    }

    pub fn pause_gate(&self) -> &Arc<PauseGate> {
        &self.gate
    }

    fn do_not_track(&self, span: &SpanContext) -> bool {
        !span.is_sampled() || !self.registry.is_registered(span)
    }
}

impl<C: ContextStorage> ContextStorage for ActiveSpanTracker<C> {
    type Scope = TrackedScope<C::Scope>;

    fn attach(&self, context: Context) -> Self::Scope {
        let scope = self.delegate.attach(context);
        let span = context.span_context();
        if self.do_not_track(&span) {
            return TrackedScope {
                restore: None,
                _inner: scope,
            };
        }

        let thread = thread::current().id();
        let previous = self.table.get(thread);
        if previous == Some(span) {
            return TrackedScope {
                restore: None,
                _inner: scope,
            };
        }

        self.gate.wait_until_active();
        self.table.publish(thread, Some(span));
        TrackedScope {
            restore: Some(RestorePrevious {
                table: Arc::clone(&self.table),
                gate: Arc::clone(&self.gate),
                thread,
                previous,
            }),
            _inner: scope,
        }
    }

    fn current(&self) -> Context {
        self.delegate.current()
    }
}

/// Scope returned by [ActiveSpanTracker::attach]. Dropping it restores
/// exactly the span that was active before the matching attach, then drops
/// the delegate scope. Nested scopes on one thread unwind in stack order.
pub struct TrackedScope<S> {
    // Declared before the delegate scope so the table is restored first.
    restore: Option<RestorePrevious>,
    _inner: S,
}

struct RestorePrevious {
    table: Arc<ActiveContextTable>,
    gate: Arc<PauseGate>,
    thread: ThreadId,
    previous: Option<SpanContext>,
}

impl Drop for RestorePrevious {
    fn drop(&mut self) {
        self.gate.wait_until_active();
        self.table.publish(self.thread, self.previous);
    }
}
