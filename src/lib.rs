//! # `bucket-deque` - Bucketed Double-Ended Queue
//!
//! A generic double-ended, random-access sequence built on a two-level
//! layout: a growable array of bucket pointers, each bucket holding
//! [`BASE_SIZE`] contiguous slots for elements.
//!
//! ## Guarantees
//!
//! ### Memory Safety
//! - **Unsafe confined to storage**: slot construction and destruction happen
//!   in one module; every other operation goes through checked positions.
//! - **Checked by default**: `at` returns a [`DequeError`], `get` an `Option`,
//!   indexing panics. Only the `unsafe fn` accessors skip the bounds check.
//! - **Borrowed cursors**: [`Cursor`] and [`CursorMut`] borrow the deque, so
//!   stale cursors after a structural change are rejected at compile time.
//!
//! ### Panic Safety
//! - **Construction rollback**: a panicking `Clone`/`Default`/closure during
//!   sized construction or cloning drops exactly the elements built so far,
//!   last first, and frees every bucket before unwinding continues.
//! - **Strong shifts**: insert and remove move elements bitwise, which cannot
//!   fail.
//!
//! ## Performance Characteristics
//!
//! - **Push/Pop at both ends**: O(1) amortized, elements never move on growth
//! - **Random access**: O(1)
//! - **Insert/Remove in the middle**: O(n)
//!
//! ## Features
//!
//! - `tracing`: emit `tracing` events on growth, bucket allocation and
//!   construction rollback
//! - `serde`: `Serialize`/`Deserialize` as a sequence
//!
//! ## Example
//!
//! ```rust
//! use bucket_deque::BucketDeque;
//!
//! let mut deque = BucketDeque::new();
//! deque.push_back(1);
//! deque.push_back(2);
//! deque.push_front(0);
//! assert_eq!(deque, [0, 1, 2]);
//!
//! assert_eq!(deque.at(1), Ok(&1));
//! assert!(deque.at(3).is_err());
//!
//! let mid = deque.begin() + 1;
//! assert_eq!(mid.get(), Some(&1));
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[macro_use]
mod macros;

pub mod collections;
pub mod error;

pub use collections::{BucketDeque, Cursor, CursorMut, IntoIter, Iter, IterMut, BASE_SIZE};
pub use error::{DequeError, Result};

// Compile-time assertions for the storage layout.
const _: () = {
    use crate::collections::deque::bucket::{Bucket, BucketPtr};
    use core::mem;

    // Index translation uses shifts and masks.
    assert!(BASE_SIZE.is_power_of_two());

    // Null buckets cost nothing beyond the pointer.
    assert!(mem::size_of::<BucketPtr<u64>>() == mem::size_of::<usize>());

    // A bucket is exactly its slots.
    assert!(mem::size_of::<Bucket<u64>>() == mem::size_of::<u64>() * BASE_SIZE);

    // Bucket array + length + first position.
    assert!(mem::size_of::<BucketDeque<u64>>() <= mem::size_of::<usize>() * 6);
    assert!(mem::size_of::<Cursor<'static, u64>>() <= mem::size_of::<usize>() * 4);
};
