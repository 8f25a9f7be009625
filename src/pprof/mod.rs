// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod proto;

/// Serialization formats understood by the profile builder. Exactly one
/// binary transport encoding is implemented; the downstream collector
/// expects gzipped, base64-encoded pprof inside a generic record envelope.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum DataFormat {
    PprofGzipBase64,
    Text,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::PprofGzipBase64 => "pprof-gzip-base64",
            DataFormat::Text => "text",
        }
    }
}
