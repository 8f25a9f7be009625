// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::pprof::DataFormat;

/// Construction-time configuration errors. These are surfaced to the
/// caller before any sampling overhead is incurred; silently defaulting a
/// malformed rate would violate operator expectations about overhead.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid rate limit '{spec}', valid rate limit is '100/s' or '10/m'")]
    InvalidRateLimit { spec: String },
}

/// Errors from building or serializing a pprof profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Requesting a format the builder does not implement is a logic bug
    /// in the caller, not a recoverable condition.
    #[error("unsupported data format {0:?}")]
    UnsupportedFormat(DataFormat),
    #[error("failed to encode pprof: {0}")]
    Encode(#[from] prost::EncodeError),
    #[error("failed to compress pprof: {0}")]
    Io(#[from] std::io::Error),
}
