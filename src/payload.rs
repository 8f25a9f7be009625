// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ProfileError;
use crate::internal::ProfileBuilder;
use crate::pprof::DataFormat;
use tracing::debug;

/// Attribute key identifying the kind of profiling data in a record.
pub const DATA_TYPE: &str = "profiling.data.type";
/// Attribute key identifying the transport encoding of a record's body.
pub const DATA_FORMAT: &str = "profiling.data.format";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProfilingDataType {
    Cpu,
    Allocation,
}

impl ProfilingDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfilingDataType::Cpu => "cpu",
            ProfilingDataType::Allocation => "allocation",
        }
    }
}

/// Serialized profile bytes plus the small metadata envelope the
/// downstream exporter attaches to its generic record.
pub struct ProfilePayload {
    pub data_type: ProfilingDataType,
    pub body: Vec<u8>,
}

impl ProfilePayload {
    /// Serializes the builder's accumulated samples. Returns `None` for a
    /// builder without samples so callers don't export empty profiles.
    pub fn from_builder(
        data_type: ProfilingDataType,
        builder: &ProfileBuilder,
    ) -> Result<Option<Self>, ProfileError> {
        if !builder.has_samples() {
            return Ok(None);
        }
        let body = builder.serialize(DataFormat::PprofGzipBase64)?;
        debug!(
            data_type = data_type.as_str(),
            samples = builder.sample_count(),
            frames = builder.frame_count(),
            bytes = body.len(),
            "serialized profiling batch"
        );
        Ok(Some(Self { data_type, body }))
    }

    /// The `{data_type, data_format}` attribute pairs for the transport
    /// envelope.
    pub fn attributes(&self) -> [(&'static str, &'static str); 2] {
        [
            (DATA_TYPE, self.data_type.as_str()),
            (DATA_FORMAT, DataFormat::PprofGzipBase64.as_str()),
        ]
    }
}
