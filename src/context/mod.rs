// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod event_log;
mod pause_gate;
mod tracker;

pub use event_log::*;
pub use pause_gate::*;
pub use tracker::*;

use std::fmt;

/// 128-bit trace identifier. All zeroes is invalid.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TraceId(pub u128);

impl TraceId {
    pub const INVALID: TraceId = TraceId(0);

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// 64-bit span identifier. All zeroes is invalid.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SpanId(pub u64);

impl SpanId {
    pub const INVALID: SpanId = SpanId(0);

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// 8-bit trace flags; bit 0 is the sampled bit.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TraceFlags(pub u8);

impl TraceFlags {
    pub const DEFAULT: TraceFlags = TraceFlags(0x00);
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    #[inline]
    pub fn is_sampled(&self) -> bool {
        self.0 & Self::SAMPLED.0 != 0
    }
}

/// An immutable (trace id, span id, flags) triple identifying one unit of
/// traced work and its sampling decision. Published into the active
/// context table atomically as a whole value.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub trace_flags: TraceFlags,
}

impl SpanContext {
    /// The distinguished "no active span" value.
    pub const INVALID: SpanContext = SpanContext {
        trace_id: TraceId::INVALID,
        span_id: SpanId::INVALID,
        trace_flags: TraceFlags::DEFAULT,
    };

    pub fn new(trace_id: TraceId, span_id: SpanId, trace_flags: TraceFlags) -> Self {
        Self {
            trace_id,
            span_id,
            trace_flags,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id.is_valid()
    }

    #[inline]
    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }
}

/// The minimal view of a host propagation context consumed by this crate:
/// the span that the context carries, if any.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Context {
    span: SpanContext,
}

impl Context {
    /// A context carrying no span.
    pub fn root() -> Self {
        Self {
            span: SpanContext::INVALID,
        }
    }

    pub fn with_span(span: SpanContext) -> Self {
        Self { span }
    }

    pub fn span_context(&self) -> SpanContext {
        self.span
    }
}
