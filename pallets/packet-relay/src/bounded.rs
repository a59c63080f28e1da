//! Capacity-checked helpers shared by every bounded store in the pallet.
//!
//! Each helper checks the limit and performs the write in the same call, so a
//! caller can never act on a count it read earlier.

use alloc::vec::Vec;
use frame_support::{pallet_prelude::*, BoundedVec};

/// Why an insert into a bounded set was refused.
#[derive(Clone, Copy, Eq, PartialEq, RuntimeDebug)]
pub enum InsertError {
    Duplicate,
    Full,
}

/// Bound raw bytes, mapping overflow to `err`.
pub fn bound_bytes<S: Get<u32>, E>(raw: Vec<u8>, err: E) -> Result<BoundedVec<u8, S>, E> {
    BoundedVec::try_from(raw).map_err(|_| err)
}

/// Insert `value` into a bounded vec used as a set.
pub fn try_insert_unique<V: PartialEq, S: Get<u32>>(
    set: &mut BoundedVec<V, S>,
    value: V,
) -> Result<(), InsertError> {
    if set.contains(&value) {
        return Err(InsertError::Duplicate);
    }
    set.try_push(value).map_err(|_| InsertError::Full)
}

/// Remove `value` from a bounded vec used as a set. Returns whether it was present.
pub fn remove_item<V: PartialEq, S: Get<u32>>(set: &mut BoundedVec<V, S>, value: &V) -> bool {
    match set.iter().position(|v| v == value) {
        Some(idx) => {
            set.remove(idx);
            true
        }
        None => false,
    }
}

/// Increment `count` if it is below `max`. Leaves `count` untouched otherwise.
pub fn try_increment(count: &mut u32, max: u32) -> bool {
    if *count >= max {
        return false;
    }
    *count = count.saturating_add(1);
    true
}

/// Append to a bounded FIFO, evicting and returning the oldest entry when full.
///
/// With a zero bound nothing is retained and `value` itself is returned.
pub fn push_evicting<V, S: Get<u32>>(queue: &mut BoundedVec<V, S>, value: V) -> Option<V> {
    if S::get() == 0 {
        return Some(value);
    }
    let evicted = if queue.len() >= S::get() as usize {
        Some(queue.remove(0))
    } else {
        None
    };
    match queue.try_push(value) {
        Ok(()) => evicted,
        // Unreachable: a slot was freed above.
        Err(value) => Some(value),
    }
}
