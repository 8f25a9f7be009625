// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod function;
mod label;
mod location;
mod profile;

pub use function::*;
pub use label::*;
pub use location::*;
pub use profile::*;

use crate::collections::identifiable::*;
use std::num::NonZeroU32;
