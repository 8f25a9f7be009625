// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::context::{SpanContext, TraceId};
use parking_lot::RwLock;
use std::collections::HashSet;

/// Membership set of traces opted into detailed profiling. Collaborators
/// consult it before attaching per-trace profiling data to an export
/// payload.
///
/// This layer specifies no eviction or capacity bound; a production
/// deployment is expected to wrap an implementation with its own expiry
/// strategy (time-windowed set, LRU with a cap).
pub trait TraceRegistry: Send + Sync {
    /// Idempotently adds the trace to the registry.
    fn register(&self, span_context: &SpanContext);

    fn unregister(&self, span_context: &SpanContext);

    fn is_registered(&self, span_context: &SpanContext) -> bool;
}

/// Unbounded in-memory registry keyed by trace id.
#[derive(Default)]
pub struct InMemoryTraceRegistry {
    traces: RwLock<HashSet<TraceId>>,
}

impl InMemoryTraceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.traces.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.read().is_empty()
    }
}

impl TraceRegistry for InMemoryTraceRegistry {
    fn register(&self, span_context: &SpanContext) {
        self.traces.write().insert(span_context.trace_id);
    }

    fn unregister(&self, span_context: &SpanContext) {
        self.traces.write().remove(&span_context.trace_id);
    }

    fn is_registered(&self, span_context: &SpanContext) -> bool {
        self.traces.read().contains(&span_context.trace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{SpanId, TraceFlags};

    fn span(trace_id: u128, span_id: u64) -> SpanContext {
        SpanContext::new(TraceId(trace_id), SpanId(span_id), TraceFlags::SAMPLED)
    }

    #[test]
    fn register_is_idempotent() {
        let registry = InMemoryTraceRegistry::new();
        registry.register(&span(1, 1));
        registry.register(&span(1, 2));
        assert_eq!(1, registry.len());
        assert!(registry.is_registered(&span(1, 3)));
    }

    #[test]
    fn membership_is_keyed_by_trace_id() {
        let registry = InMemoryTraceRegistry::new();
        registry.register(&span(1, 1));
        assert!(registry.is_registered(&span(1, 99)));
        assert!(!registry.is_registered(&span(2, 1)));
    }

    #[test]
    fn unregister_removes_the_trace() {
        let registry = InMemoryTraceRegistry::new();
        registry.register(&span(1, 1));
        registry.unregister(&span(1, 7));
        assert!(!registry.is_registered(&span(1, 1)));
        assert!(registry.is_empty());
    }
}
