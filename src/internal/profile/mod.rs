// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::error::ProfileError;
use crate::pprof::{proto, DataFormat};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;
use prost::Message;
use std::io::Write;

/// Accumulates correlated samples into a deduplicated pprof document.
///
/// All three interning tables follow the same pattern: a distinct value is
/// assigned exactly one index for the lifetime of the builder, and
/// re-inserting an equal value returns the previously assigned index.
/// Insertion order is the serialization order.
///
/// The builder is intended to be owned and mutated by one thread per
/// export cycle; it carries no internal locking.
pub struct ProfileBuilder {
    strings: FxIndexSet<Box<str>>,
    functions: FxIndexSet<Function>,
    locations: FxIndexSet<Location>,
    samples: Vec<SampleRecord>,
    frame_count: usize,
}

struct SampleRecord {
    location_ids: Vec<LocationId>,
    labels: Vec<InternalLabel>,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileBuilder {
    pub fn new() -> Self {
        let mut strings = FxIndexSet::<Box<str>>::default();
        // Index 0 is reserved for the empty string.
        strings.insert("".into());
        Self {
            strings,
            functions: Default::default(),
            locations: Default::default(),
            samples: Vec::new(),
            frame_count: 0,
        }
    }

    /// Interns the str, returning its index in the string table. Equality
    /// is byte-for-byte, not object identity.
    pub fn intern_string(&mut self, str: &str) -> StringId {
        match self.strings.get_index_of(str) {
            Some(offset) => StringId::from_offset(offset),
            None => {
                let id = StringId::from_offset(self.strings.len());
                self.strings.insert(str.into());
                id
            }
        }
    }

    /// Interns the (file, function name) pair. Ids start at 1; id 0 is
    /// reserved by the pprof format.
    pub fn intern_function(&mut self, filename: &str, name: &str) -> FunctionId {
        let function = Function {
            name: self.intern_string(name),
            filename: self.intern_string(filename),
        };
        self.functions.dedup(function)
    }

    /// Interns the (file, function name, line) triple, interning the
    /// function on first sight. Ids start at 1; id 0 is reserved.
    pub fn intern_location(&mut self, filename: &str, function: &str, line: i64) -> LocationId {
        let location = Location {
            function: self.intern_function(filename, function),
            line,
        };
        self.locations.dedup(location)
    }

    /// Appends one sample referencing already-interned location ids. Label
    /// keys and string values are interned through the string table;
    /// numeric values are stored inline.
    pub fn add_sample(&mut self, location_ids: &[LocationId], labels: &[Label<'_>]) {
        let labels = labels
            .iter()
            .map(|label| {
                let key = self.intern_string(label.key);
                match label.value {
                    LabelValue::Str(value) => {
                        let value = self.intern_string(value);
                        InternalLabel::str(key, value)
                    }
                    LabelValue::Num(num) => InternalLabel::num(key, num),
                }
            })
            .collect();
        self.samples.push(SampleRecord {
            location_ids: location_ids.to_vec(),
            labels,
        });
    }

    /// True iff at least one sample has been added. Callers use this to
    /// avoid exporting empty profiles.
    pub fn has_samples(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn inc_frame_count(&mut self) {
        self.frame_count += 1;
    }

    /// Non-unique stack frames fed into this batch.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Builds the tabular document, encodes it with prost, gzips the byte
    /// stream, and base64-encodes the compressed bytes.
    pub fn serialize(&self, format: DataFormat) -> Result<Vec<u8>, ProfileError> {
        if format != DataFormat::PprofGzipBase64 {
            return Err(ProfileError::UnsupportedFormat(format));
        }

        let profile = self.build_pprof();
        let mut encoded = Vec::with_capacity(profile.encoded_len());
        profile.encode(&mut encoded)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encoded)?;
        let compressed = encoder.finish()?;
        Ok(BASE64.encode(compressed).into_bytes())
    }

    fn build_pprof(&self) -> proto::Profile {
        proto::Profile {
            string_table: self.strings.iter().map(|s| s.to_string()).collect(),
            functions: self
                .functions
                .iter()
                .enumerate()
                .map(|(offset, function)| function.to_pprof(FunctionId::from_offset(offset)))
                .collect(),
            locations: self
                .locations
                .iter()
                .enumerate()
                .map(|(offset, location)| location.to_pprof(LocationId::from_offset(offset)))
                .collect(),
            samples: self
                .samples
                .iter()
                .map(|sample| proto::Sample {
                    location_ids: sample.location_ids.iter().map(|id| id.to_raw_id()).collect(),
                    values: Vec::new(),
                    labels: sample.labels.iter().map(proto::Label::from).collect(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn decode(serialized: &[u8]) -> proto::Profile {
        let compressed = BASE64.decode(serialized).expect("valid base64");
        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut encoded = Vec::new();
        decoder.read_to_end(&mut encoded).expect("valid gzip");
        proto::Profile::decode(encoded.as_slice()).expect("valid pprof")
    }

    #[test]
    fn empty_builder_has_no_samples() {
        let builder = ProfileBuilder::new();
        assert!(!builder.has_samples());
        assert_eq!(0, builder.sample_count());
    }

    #[test]
    fn string_table_reserves_empty_string() {
        let mut builder = ProfileBuilder::new();
        assert_eq!(StringId::ZERO, builder.intern_string(""));
        let first = builder.intern_string("main");
        assert_eq!(StringId::from_offset(1), first);
        // Re-interning returns the original index.
        assert_eq!(first, builder.intern_string("main"));
    }

    #[test]
    fn function_dedup_is_structural() {
        let mut builder = ProfileBuilder::new();
        let a = builder.intern_function("App.java", "handle");
        let b = builder.intern_function("App.java", "handle");
        let c = builder.intern_function("App.java", "accept");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // Ids start at 1.
        assert_eq!(1u64, a.to_raw_id());
        assert_eq!(2u64, c.to_raw_id());
    }

    #[test]
    fn location_dedup_includes_line() {
        let mut builder = ProfileBuilder::new();
        let a = builder.intern_location("App.java", "handle", 42);
        let b = builder.intern_location("App.java", "handle", 42);
        let c = builder.intern_location("App.java", "handle", 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(1u64, a.to_raw_id());
        // Both locations share one function record.
        assert_eq!(2, builder.locations.len());
        assert_eq!(1, builder.functions.len());
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let builder = ProfileBuilder::new();
        match builder.serialize(DataFormat::Text) {
            Err(ProfileError::UnsupportedFormat(DataFormat::Text)) => {}
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn serialized_string_table_has_no_duplicates() {
        let mut builder = ProfileBuilder::new();
        let loc = builder.intern_location("App.java", "handle", 42);
        builder.add_sample(
            &[loc],
            &[
                Label::str("thread.name", "worker-1"),
                Label::str("source.event.name", "worker-1"),
            ],
        );
        let profile = decode(&builder.serialize(DataFormat::PprofGzipBase64).unwrap());

        let mut seen = std::collections::HashSet::new();
        for s in &profile.string_table {
            assert!(seen.insert(s.clone()), "duplicate string table entry {s:?}");
        }
        assert_eq!("", profile.string_table[0]);
    }

    #[test]
    fn sample_resolves_through_tables() {
        let mut builder = ProfileBuilder::new();
        let leaf = builder.intern_location("App.java", "handle", 42);
        let root = builder.intern_location("Server.java", "run", 7);
        builder.add_sample(&[leaf, root], &[Label::num("thread.id", 7)]);

        let profile = decode(&builder.serialize(DataFormat::PprofGzipBase64).unwrap());
        assert_eq!(1, profile.samples.len());

        let sample = &profile.samples[0];
        assert_eq!(vec![leaf.to_raw_id(), root.to_raw_id()], sample.location_ids);

        let location = profile
            .locations
            .iter()
            .find(|l| l.id == sample.location_ids[0])
            .expect("location");
        let function = profile
            .functions
            .iter()
            .find(|f| f.id == location.lines[0].function_id)
            .expect("function");
        assert_eq!(42, location.lines[0].line);
        assert_eq!("handle", profile.string_table[function.name as usize]);
        assert_eq!("App.java", profile.string_table[function.filename as usize]);
    }
}
