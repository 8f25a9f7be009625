// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace-correlated continuous profiling core.
//!
//! The crate covers three responsibilities that sit between a tracing
//! runtime and a profile exporter:
//!
//!  - Tracking which sampled span is active on each operating-system
//!    thread, with a cooperative pause protocol so a snapshot reader can
//!    observe a consistent view ([`context`]).
//!  - Admission control for high-frequency event sources such as
//!    allocation events ([`sampling`]), and memoized lookup of recurring
//!    event periods ([`event_periods`]).
//!  - Encoding correlated (stack, labels) samples into a deduplicated
//!    pprof document, gzipped and base64-encoded for transport
//!    ([`internal::ProfileBuilder`]).
//!
//! Stack capture, span creation, and transport are collaborator seams:
//! they feed contexts and frames in, and take serialized payloads out.

pub mod collections;
pub mod context;
pub mod error;
pub mod event_periods;
pub mod internal;
pub mod payload;
pub mod pprof;
pub mod registry;
pub mod sampling;

pub use error::{ConfigError, ProfileError};
