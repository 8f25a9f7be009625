// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::pprof::proto;

/// A label as supplied by callers of [super::ProfileBuilder::add_sample].
/// String values are interned through the profile's string table; numeric
/// values are stored inline as signed 64-bit integers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Label<'a> {
    pub key: &'a str,
    pub value: LabelValue<'a>,
}

impl<'a> Label<'a> {
    pub fn str(key: &'a str, value: &'a str) -> Self {
        Self {
            key,
            value: LabelValue::Str(value),
        }
    }

    pub fn num(key: &'a str, value: i64) -> Self {
        Self {
            key,
            value: LabelValue::Num(value),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LabelValue<'a> {
    Str(&'a str),
    Num(i64),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum InternalLabelValue {
    Str(StringId),
    Num(i64),
}

/// The interned form of a [Label], held by sample records.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct InternalLabel {
    key: StringId,
    value: InternalLabelValue,
}

impl InternalLabel {
    pub fn str(key: StringId, v: StringId) -> Self {
        Self {
            key,
            value: InternalLabelValue::Str(v),
        }
    }

    pub fn num(key: StringId, num: i64) -> Self {
        Self {
            key,
            value: InternalLabelValue::Num(num),
        }
    }

    pub fn get_key(&self) -> StringId {
        self.key
    }

    pub fn get_value(&self) -> &InternalLabelValue {
        &self.value
    }
}

impl From<&InternalLabel> for proto::Label {
    fn from(l: &InternalLabel) -> proto::Label {
        let key = l.key.to_raw_id();
        match l.value {
            InternalLabelValue::Str(str) => Self {
                key,
                str: str.to_raw_id(),
                num: 0,
                num_unit: 0,
            },
            InternalLabelValue::Num(num) => Self {
                key,
                str: 0,
                num,
                num_unit: 0,
            },
        }
    }
}
