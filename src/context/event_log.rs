// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{Context, ContextStorage, SpanContext, SpanId, TraceFlags, TraceId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;

/// Direction of a context switch: the span became active on the thread
/// (`In`) or stopped being active (`Out`).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    In,
    Out,
}

/// Lightweight timestamped record of a context switch, for after-the-fact
/// correlation by timestamp-nearest-preceding matching against stack
/// samples.
#[derive(Copy, Clone, Debug)]
pub struct ContextAttached {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub trace_flags: TraceFlags,
    pub direction: Direction,
    pub timestamp: SystemTime,
}

impl ContextAttached {
    fn new(span: &SpanContext, direction: Direction) -> Self {
        Self {
            trace_id: span.trace_id,
            span_id: span.span_id,
            trace_flags: span.trace_flags,
            direction,
            timestamp: SystemTime::now(),
        }
    }
}

/// Receives context-switch records. Implementations must be cheap; emit is
/// called inline on every traced context switch.
pub trait ContextEventSink: Send + Sync {
    fn emit(&self, event: ContextAttached);
}

/// Bounded in-memory event buffer. When full, the oldest record is
/// dropped; correlation quality degrades but the hot path never blocks on
/// a full buffer.
pub struct ContextEventLog {
    capacity: usize,
    events: Mutex<VecDeque<ContextAttached>>,
}

impl ContextEventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Removes and returns all buffered records in emission order.
    pub fn drain(&self) -> Vec<ContextAttached> {
        self.events.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl ContextEventSink for ContextEventLog {
    fn emit(&self, event: ContextAttached) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// The event-log flavor of context tracking: instead of maintaining a
/// lookup table, every attach/detach of a valid span emits a timestamped
/// record into the sink. Used when the recording medium already
/// timestamps emitted records and direct table lookups are too costly.
pub struct EventLogStorage<C> {
    delegate: C,
    sink: Arc<dyn ContextEventSink>,
}

impl<C> EventLogStorage<C> {
    pub fn new(delegate: C, sink: Arc<dyn ContextEventSink>) -> Self {
        Self { delegate, sink }
    }
}

impl<C: ContextStorage> ContextStorage for EventLogStorage<C> {
    type Scope = EventLogScope<C::Scope>;

    fn attach(&self, context: Context) -> Self::Scope {
        let scope = self.delegate.attach(context);
        let span = context.span_context();
        if span.is_valid() {
            self.sink.emit(ContextAttached::new(&span, Direction::In));
        }
        EventLogScope {
            span,
            sink: Arc::clone(&self.sink),
            _inner: scope,
        }
    }

    fn current(&self) -> Context {
        self.delegate.current()
    }
}

/// Emits the matching `Out` record when dropped, before the delegate
/// scope closes.
pub struct EventLogScope<S> {
    span: SpanContext,
    sink: Arc<dyn ContextEventSink>,
    _inner: S,
}

impl<S> Drop for EventLogScope<S> {
    fn drop(&mut self) {
        if self.span.is_valid() {
            self.sink.emit(ContextAttached::new(&self.span, Direction::Out));
        }
    }
}
