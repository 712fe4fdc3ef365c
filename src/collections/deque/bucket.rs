//! Bucket storage and `(bucket, offset)` arithmetic.
//!
//! A bucket is a heap block of [`BASE_SIZE`] uninitialized slots. The deque
//! keeps buckets behind raw owning pointers so that slot pointers can be
//! produced without creating intermediate references to the whole block;
//! which slots are live is tracked by the deque, never by the bucket.

use core::mem::MaybeUninit;
use core::ptr::NonNull;

/// Number of element slots in every bucket.
pub const BASE_SIZE: usize = 16;

const SHIFT: u32 = BASE_SIZE.trailing_zeros();
const MASK: usize = BASE_SIZE - 1;

/// Raw storage for one bucket.
pub(crate) type Bucket<T> = [MaybeUninit<T>; BASE_SIZE];

/// Nullable owning bucket pointer, one per bucket-array slot.
pub(crate) type BucketPtr<T> = Option<NonNull<Bucket<T>>>;

/// A slot address inside the bucket array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    pub(crate) bucket: usize,
    pub(crate) offset: usize,
}

impl Position {
    #[inline(always)]
    pub(crate) const fn new(bucket: usize, offset: usize) -> Self {
        Self { bucket, offset }
    }

    /// `bucket * BASE_SIZE + offset`.
    #[inline(always)]
    pub(crate) const fn linear(self) -> usize {
        (self.bucket << SHIFT) + self.offset
    }

    /// The position `diff` slots after `self`.
    #[inline(always)]
    pub(crate) const fn add(self, diff: usize) -> Self {
        let (carry, offset) = index_split(self.offset + diff);
        Self {
            bucket: self.bucket + carry,
            offset,
        }
    }

    /// The position one slot before `self`.
    ///
    /// Must not be called on `(0, 0)`.
    #[inline(always)]
    pub(crate) const fn prev(self) -> Self {
        if self.offset > 0 {
            Self::new(self.bucket, self.offset - 1)
        } else {
            Self::new(self.bucket - 1, BASE_SIZE - 1)
        }
    }
}

/// Splits a non-negative linear slot index into `(bucket, offset)`.
#[inline(always)]
pub(crate) const fn index_split(idx: usize) -> (usize, usize) {
    (idx >> SHIFT, idx & MASK)
}

/// Splits a signed linear slot index with floored division, so that
/// `offset` is always in `0..BASE_SIZE` even for negative input.
#[inline(always)]
pub(crate) const fn index_split_signed(idx: isize) -> (isize, usize) {
    let base = BASE_SIZE as isize;
    (idx.div_euclid(base), idx.rem_euclid(base) as usize)
}

/// Allocates one bucket of uninitialized slots and leaks it into a raw pointer.
pub(crate) fn alloc_bucket<T>() -> NonNull<Bucket<T>> {
    // Avoid building the array on the stack first.
    //
    // SAFETY: an uninitialized `[MaybeUninit<T>; BASE_SIZE]` is valid; slots
    // are written individually and only live slots are ever dropped.
    let bucket = unsafe { Box::<Bucket<T>>::new_uninit().assume_init() };
    NonNull::from(Box::leak(bucket))
}

/// Releases a bucket obtained from [`alloc_bucket`].
///
/// # Safety
/// `bucket` must come from [`alloc_bucket`], must not have been freed, and
/// every live slot in it must already have been dropped or moved out.
pub(crate) unsafe fn free_bucket<T>(bucket: NonNull<Bucket<T>>) {
    // Dropping a `Box<[MaybeUninit<T>; _]>` frees memory without touching slots.
    drop(Box::from_raw(bucket.as_ptr()));
}

/// Pointer to slot `offset` of `bucket`.
///
/// # Safety
/// `bucket` must be a live allocation and `offset < BASE_SIZE`.
#[inline(always)]
pub(crate) unsafe fn slot<T>(bucket: NonNull<Bucket<T>>, offset: usize) -> *mut T {
    debug_assert!(offset < BASE_SIZE);
    // The bucket pointer points at the array; cast to the element type before offsetting.
    bucket.as_ptr().cast::<T>().add(offset)
}
