// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::pprof::proto;

/// Represents a [proto::Location] with a single line entry. The dedup key
/// is the (function, line) pair, which together with [Function]'s key makes
/// the triple (filename, function name, line) unique per id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub function: FunctionId,
    pub line: i64,
}

impl Item for Location {
    type Id = LocationId;
}

impl Location {
    pub fn to_pprof(&self, id: LocationId) -> proto::Location {
        proto::Location {
            id: id.to_raw_id(),
            mapping_id: 0,
            address: 0,
            lines: vec![proto::Line {
                function_id: self.function.to_raw_id(),
                line: self.line,
            }],
            is_folded: false,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(C)]
pub struct LocationId(NonZeroU32);

impl Id for LocationId {
    type RawId = u64;

    fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(small_non_zero_pprof_id(offset).expect("LocationId to fit into a u32"))
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0.get().into()
    }
}
