// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::hash::{BuildHasherDefault, Hash};
use std::num::NonZeroU32;

pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<rustc_hash::FxHasher>>;
pub type FxIndexSet<K> = indexmap::IndexSet<K, BuildHasherDefault<rustc_hash::FxHasher>>;

pub trait Id: Copy + Eq + Hash {
    type RawId;

    /// Convert from a usize offset into an Id.
    /// # Panics
    /// Panics if the offset cannot be represented in the Id's underlying
    /// integer type. More than u32::MAX-1 distinct items would have to be
    /// interned in one profile for that to happen.
    fn from_offset(offset: usize) -> Self;

    fn to_raw_id(&self) -> Self::RawId;
}

pub trait Item: Eq + Hash {
    /// The Id associated with this Item, e.g. Function -> FunctionId.
    type Id: Id;
}

/// Creates a non-zero, 32-bit unsigned id from the offset. It's guaranteed
/// to be the offset + 1, with guards to not overflow the size of u32.
///
/// This is useful because pprof reserves id 0 in the function and location
/// tables, even for the first item in the collection.
#[inline]
pub fn small_non_zero_pprof_id(offset: usize) -> Option<NonZeroU32> {
    let small: u32 = offset.try_into().ok()?;
    let non_zero = small.checked_add(1)?;
    // Safety: the `checked_add(1)?` guards this from ever being zero.
    Some(unsafe { NonZeroU32::new_unchecked(non_zero) })
}

pub trait Dedup<T: Item> {
    /// Deduplicate the Item and return its associated Id. Inserting an
    /// equal item again returns the previously assigned Id.
    /// # Panics
    /// Panics if the number of items overflows the storage capabilities of
    /// the associated Id type.
    fn dedup(&mut self, item: T) -> <T as Item>::Id;
}

impl<T: Item> Dedup<T> for FxIndexSet<T> {
    fn dedup(&mut self, item: T) -> <T as Item>::Id {
        let (id, _) = self.insert_full(item);
        <T as Item>::Id::from_offset(id)
    }
}

/// Index into a profile's string table. Unlike function and location ids,
/// offset 0 is a real entry: the empty string.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(C)]
pub struct StringId(u32);

impl StringId {
    pub const ZERO: StringId = StringId(0);

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Id for StringId {
    type RawId = i64;

    fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        let index: u32 = offset.try_into().expect("StringId to fit into a u32");
        Self(index)
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0.into()
    }
}

impl From<StringId> for i64 {
    fn from(id: StringId) -> i64 {
        id.to_raw_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_non_zero_pprof_id() {
        assert_eq!(NonZeroU32::new(1), small_non_zero_pprof_id(0));
        assert_eq!(NonZeroU32::new(2), small_non_zero_pprof_id(1));
        assert_eq!(
            NonZeroU32::new(u32::MAX),
            small_non_zero_pprof_id((u32::MAX - 1) as usize)
        );

        assert_eq!(None, small_non_zero_pprof_id(u32::MAX as usize));
        assert_eq!(None, small_non_zero_pprof_id(usize::MAX));
    }

    #[test]
    fn test_string_id_round_trip() {
        assert_eq!(StringId::ZERO, StringId::from_offset(0));
        assert!(StringId::ZERO.is_zero());
        assert_eq!(7i64, StringId::from_offset(7).to_raw_id());
    }
}
