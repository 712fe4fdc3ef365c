//! `BucketDeque`: a double-ended, random-access queue over fixed-size buckets.
//!
//! ## Layout
//!
//! The deque owns a growable array of bucket pointers. Each pointer is either
//! null or owns a block of [`BASE_SIZE`] uninitialized slots. The live
//! elements occupy `len` consecutive slots starting at the first position
//! `(bucket, offset)`, possibly spanning several buckets:
//!
//! ```text
//! buckets:  [ null | b1 | b2 | b3 | null | null ]
//!                    ^first          ^end
//! ```
//!
//! Buckets are allocated lazily the first time the live range reaches them
//! and are only released when the deque is dropped, so repeated push/pop at
//! the same end reuses memory.
//!
//! ## Performance Characteristics
//! - **Push/Pop at either end**: O(1) amortized
//! - **Index**: O(1), one shift and one pointer load
//! - **Insert/Remove in the middle**: O(n) in the number of elements after the position
//! - **Growth**: the bucket array triples; elements never move, only bucket pointers
//!
//! ## Usage
//! ```rust
//! use bucket_deque::BucketDeque;
//!
//! let mut deque = BucketDeque::new();
//! deque.push_back(1);
//! deque.push_back(2);
//! deque.push_front(0);
//! assert_eq!(deque, [0, 1, 2]);
//!
//! deque.pop_front();
//! deque.insert(1, 9);
//! assert_eq!(deque, [1, 9, 2]);
//!
//! deque.remove(0);
//! assert_eq!(deque, [9, 2]);
//! ```

pub(crate) mod bucket;
mod cursor;
mod iter;
#[cfg(feature = "serde")]
mod serde;

use core::cmp::Ordering;
use core::convert::Infallible;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem;
use core::ops::{Index, IndexMut};
use core::ptr::{self, NonNull};

use crate::error::{DequeError, Result};
use bucket::{Bucket, BucketPtr, Position};

pub use bucket::BASE_SIZE;
pub use cursor::{Cursor, CursorMut};
pub use iter::{IntoIter, Iter, IterMut};

/// Bucket-array length of a default-constructed deque.
const MIN_BUCKETS: usize = 4;

/// Growth factor applied to the bucket array on re-memory.
const GROWTH_FACTOR: usize = 3;

/// A double-ended queue with O(1) random access, stored in lazily allocated
/// fixed-size buckets.
///
/// Unlike a ring buffer, growing never moves elements: only the array of
/// bucket pointers is reallocated. References obtained from the deque are
/// invalidated by any mutation as usual; [`Cursor`]s borrow the deque and
/// therefore cannot outlive a structural change.
pub struct BucketDeque<T> {
    buckets: Vec<BucketPtr<T>>,
    len: usize,
    first: Position,
    marker: PhantomData<T>,
}

// SAFETY: the deque uniquely owns its buckets and the `T`s inside them.
unsafe impl<T: Send> Send for BucketDeque<T> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync> Sync for BucketDeque<T> {}

impl<T> BucketDeque<T> {
    /// Creates an empty deque with a minimal bucket array and no buckets allocated.
    pub fn new() -> Self {
        Self::with_storage(MIN_BUCKETS)
    }

    /// Empty deque with `storage` null bucket slots and the first position a
    /// quarter of the way in, leaving room to push at the front.
    fn with_storage(storage: usize) -> Self {
        Self {
            buckets: vec![None; storage],
            len: 0,
            first: Position::new(storage / 4, 0),
            marker: PhantomData,
        }
    }

    /// Empty deque whose bucket array is sized to hold `len` elements
    /// without growing.
    fn sized_for(len: usize) -> Self {
        Self::with_storage(MIN_BUCKETS * (len / BASE_SIZE + 1))
    }

    /// Creates a deque of `len` elements produced by `f(index)`, in order.
    ///
    /// If `f` panics, the elements built so far are dropped in reverse order
    /// and all allocated buckets are freed before the panic propagates.
    pub fn from_fn<F>(len: usize, mut f: F) -> Self
    where
        F: FnMut(usize) -> T,
    {
        match Self::try_from_fn(len, |i| Ok::<T, Infallible>(f(i))) {
            Ok(deque) => deque,
            Err(never) => match never {},
        }
    }

    /// Creates a deque of `len` elements produced by the fallible `f(index)`.
    ///
    /// # Errors
    /// Returns the first error produced by `f`. Before it is returned, every
    /// element already constructed is dropped (last constructed first) and
    /// every bucket allocated for them is freed.
    ///
    /// ```rust
    /// use bucket_deque::BucketDeque;
    ///
    /// let ok = BucketDeque::try_from_fn(3, |i| Ok::<_, ()>(i * 10)).unwrap();
    /// assert_eq!(ok, [0, 10, 20]);
    ///
    /// let err = BucketDeque::try_from_fn(40, |i| if i < 20 { Ok(i) } else { Err(i) });
    /// assert_eq!(err.unwrap_err(), 20);
    /// ```
    pub fn try_from_fn<E, F>(len: usize, mut f: F) -> Result<Self, E>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        // `deque.len` only counts successfully written slots, so dropping the
        // partial deque (on `Err` or unwind) releases exactly what was built.
        let mut filling = Filling {
            deque: Self::sized_for(len),
            requested: len,
        };
        for i in 0..len {
            let value = f(i)?;
            filling.deque.push_back(value);
        }
        filling.requested = 0;
        Ok(mem::take(&mut filling.deque))
    }

    /// Number of live elements.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the deque holds no elements.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the bucket array (allocated or not).
    #[inline(always)]
    pub fn storage_size(&self) -> usize {
        self.buckets.len()
    }

    /// Number of buckets currently backed by memory.
    pub fn allocated_buckets(&self) -> usize {
        self.buckets.iter().filter(|b| b.is_some()).count()
    }

    /// Translates a logical index into its slot position.
    #[inline(always)]
    fn translate(&self, diff: usize) -> Position {
        self.first.add(diff)
    }

    /// The bucket at a possibly out-of-array index, for cursors.
    #[inline]
    pub(crate) fn bucket_at(&self, bucket: isize) -> BucketPtr<T> {
        usize::try_from(bucket)
            .ok()
            .and_then(|b| self.buckets.get(b).copied())
            .flatten()
    }

    /// Linear slot index of the first element.
    #[inline(always)]
    pub(crate) fn first_linear(&self) -> isize {
        self.first.linear() as isize
    }

    /// Pointer to the slot at `pos`.
    ///
    /// # Safety
    /// The bucket holding `pos` must be allocated.
    #[inline(always)]
    unsafe fn slot_ptr(&self, pos: Position) -> *mut T {
        let bucket = *self.buckets.get_unchecked(pos.bucket);
        debug_assert!(bucket.is_some(), "slot in an unallocated bucket");
        bucket::slot(bucket.unwrap_unchecked(), pos.offset)
    }

    /// Returns bucket `index`, allocating it if it is still null.
    fn ensure_bucket(&mut self, index: usize) -> NonNull<Bucket<T>> {
        let entry = &mut self.buckets[index];
        if let Some(bucket) = *entry {
            return bucket;
        }
        let bucket = bucket::alloc_bucket();
        *entry = Some(bucket);
        _trace!(bucket = index, "allocated bucket");
        bucket
    }

    /// `true` when the next back slot is past the bucket array or is the
    /// array's final slot; the end position must stay addressable.
    #[inline]
    fn back_exhausted(&self) -> bool {
        let next = self.translate(self.len);
        let size = self.buckets.len();
        next.bucket >= size || (next.bucket + 1 == size && next.offset + 1 == BASE_SIZE)
    }

    #[inline]
    fn front_exhausted(&self) -> bool {
        self.first.bucket == 0 && self.first.offset == 0
    }

    /// Re-memory: makes room at both ends of the bucket array.
    ///
    /// When the occupied buckets fill more than a third of the array, the
    /// array triples and the old one lands in the middle third. Otherwise the
    /// array keeps its size and the occupied range is rotated back to the
    /// centre, carrying retained buckets along. Only bucket pointers move.
    fn grow(&mut self) {
        let old_size = self.buckets.len();
        let end = self.translate(self.len);
        let occupied = end.bucket.min(old_size - 1) + 1 - self.first.bucket;

        if occupied * GROWTH_FACTOR <= old_size {
            let target = (old_size - occupied) / 2;
            if target < self.first.bucket {
                self.buckets.rotate_left(self.first.bucket - target);
            } else {
                self.buckets.rotate_right(target - self.first.bucket);
            }
            _debug!(storage = old_size, from = self.first.bucket, to = target, "recentred bucket array");
            self.first.bucket = target;
            return;
        }

        let new_size = old_size * GROWTH_FACTOR;
        let shift = old_size;
        let mut grown: Vec<BucketPtr<T>> = vec![None; new_size];
        grown[shift..shift + old_size].copy_from_slice(&self.buckets);
        self.buckets = grown;
        self.first.bucket += shift;
        _debug!(old_size, new_size, first_bucket = self.first.bucket, "grew bucket array");
    }

    /// Appends an element to the back.
    pub fn push_back(&mut self, value: T) {
        if self.back_exhausted() {
            self.grow();
        }
        let pos = self.translate(self.len);
        let bucket = self.ensure_bucket(pos.bucket);
        // SAFETY: `pos` is the first slot past the live range, inside an allocated bucket.
        unsafe { bucket::slot(bucket, pos.offset).write(value) };
        self.len += 1;
    }

    /// Prepends an element to the front.
    pub fn push_front(&mut self, value: T) {
        if self.front_exhausted() {
            self.grow();
        }
        let pos = self.first.prev();
        let bucket = self.ensure_bucket(pos.bucket);
        // SAFETY: `pos` is the slot just before the live range, inside an allocated bucket.
        unsafe { bucket::slot(bucket, pos.offset).write(value) };
        self.first = pos;
        self.len += 1;
    }

    /// Removes and returns the last element. The bucket stays allocated.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let pos = self.translate(self.len);
        // SAFETY: `pos` was the last live slot; it is now outside the range.
        Some(unsafe { self.slot_ptr(pos).read() })
    }

    /// Removes and returns the first element. The bucket stays allocated.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let pos = self.first;
        // SAFETY: `pos` is the first live slot; the range moves past it below.
        let value = unsafe { self.slot_ptr(pos).read() };
        self.first = pos.add(1);
        self.len -= 1;
        Some(value)
    }

    /// Inserts `value` so that it ends up at `index`, shifting every element
    /// from `index` onwards one slot towards the back. Returns `index`.
    ///
    /// Inserting at `0` or at `len()` is O(1).
    ///
    /// # Panics
    /// Panics if `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        assert!(
            index <= self.len,
            "insertion index (is {index}) should be <= len (is {})",
            self.len
        );
        if index == self.len {
            self.push_back(value);
            return index;
        }
        if index == 0 {
            self.push_front(value);
            return 0;
        }
        if self.back_exhausted() {
            self.grow();
        }
        let end = self.translate(self.len);
        self.ensure_bucket(end.bucket);
        // SAFETY: every slot in `index..=len` lies in an allocated bucket.
        // Moves are bitwise and cannot fail, so no slot is ever left
        // duplicated or missing if `T` panics elsewhere.
        unsafe {
            for i in (index..self.len).rev() {
                let src = self.slot_ptr(self.translate(i));
                let dst = self.slot_ptr(self.translate(i + 1));
                ptr::copy_nonoverlapping(src, dst, 1);
            }
            self.slot_ptr(self.translate(index)).write(value);
        }
        self.len += 1;
        index
    }

    /// Removes and returns the element at `index`, shifting every later
    /// element one slot towards the front. Returns `None` if out of bounds.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        if index == 0 {
            return self.pop_front();
        }
        // SAFETY: `index < len`; slots `index..len` are live and allocated.
        let value = unsafe {
            let value = self.slot_ptr(self.translate(index)).read();
            for i in index + 1..self.len {
                let src = self.slot_ptr(self.translate(i));
                let dst = self.slot_ptr(self.translate(i - 1));
                ptr::copy_nonoverlapping(src, dst, 1);
            }
            value
        };
        self.len -= 1;
        Some(value)
    }

    /// Swaps the elements at `i` and `j`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn swap(&mut self, i: usize, j: usize) {
        assert!(i < self.len, "swap index (is {i}) should be < len (is {})", self.len);
        assert!(j < self.len, "swap index (is {j}) should be < len (is {})", self.len);
        // SAFETY: both slots are live; `ptr::swap` tolerates `i == j`.
        unsafe {
            ptr::swap(self.slot_ptr(self.translate(i)), self.slot_ptr(self.translate(j)));
        }
    }

    /// Drops elements from the back until at most `len` remain.
    ///
    /// Elements are dropped last-first. Buckets stay allocated.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            // Shrink first so a panicking destructor cannot cause a double drop.
            self.len -= 1;
            let pos = self.translate(self.len);
            // SAFETY: `pos` was live and is now outside the range.
            unsafe { ptr::drop_in_place(self.slot_ptr(pos)) };
        }
    }

    /// Drops every element, keeping the buckets for reuse.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Returns a reference to the element at `index`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            // SAFETY: bounds checked above.
            Some(unsafe { self.get_unchecked(index) })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `index`, or `None` if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            // SAFETY: bounds checked above.
            Some(unsafe { self.get_unchecked_mut(index) })
        } else {
            None
        }
    }

    /// Returns a reference to the element at `index` without bounds checks.
    ///
    /// # Safety
    /// Caller must ensure `index < self.len()`.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        &*self.slot_ptr(self.translate(index))
    }

    /// Returns a mutable reference to the element at `index` without bounds checks.
    ///
    /// # Safety
    /// Caller must ensure `index < self.len()`.
    #[inline(always)]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        &mut *self.slot_ptr(self.translate(index))
    }

    /// Checked access.
    ///
    /// # Errors
    /// Returns [`DequeError::OutOfRange`] if `index >= len()`; the deque is
    /// left untouched.
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;
        self.get(index).ok_or(DequeError::OutOfRange { index, len })
    }

    /// Checked mutable access.
    ///
    /// # Errors
    /// Returns [`DequeError::OutOfRange`] if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.get_mut(index).ok_or(DequeError::OutOfRange { index, len })
    }

    /// First element, if any.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Mutable first element, if any.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Last element, if any.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Mutable last element, if any.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        match self.len.checked_sub(1) {
            Some(i) => self.get_mut(i),
            None => None,
        }
    }

    /// Returns `true` if the deque contains an element equal to `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|x| x == value)
    }

    /// Read-only cursor at the first element.
    #[inline]
    pub fn begin(&self) -> Cursor<'_, T> {
        Cursor::at_linear(self, self.first_linear())
    }

    /// Read-only cursor one past the last element.
    #[inline]
    pub fn end(&self) -> Cursor<'_, T> {
        Cursor::at_linear(self, self.translate(self.len).linear() as isize)
    }

    /// Read-only cursor at logical `index` (which may be `len()` for the end).
    #[inline]
    pub fn cursor_at(&self, index: usize) -> Cursor<'_, T> {
        Cursor::at_linear(self, self.first_linear() + index as isize)
    }

    /// Mutable cursor at the first element.
    #[inline]
    pub fn begin_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::at_index(self, 0)
    }

    /// Mutable cursor one past the last element.
    #[inline]
    pub fn end_mut(&mut self) -> CursorMut<'_, T> {
        let len = self.len as isize;
        CursorMut::at_index(self, len)
    }

    /// Mutable cursor at logical `index`.
    #[inline]
    pub fn cursor_mut_at(&mut self, index: usize) -> CursorMut<'_, T> {
        CursorMut::at_index(self, index as isize)
    }

    /// Front-to-back iterator over `&T`. Use `.rev()` for back-to-front.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.begin(), self.end(), self.len)
    }

    /// Front-to-back iterator over `&mut T`.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(&self.buckets, self.first, self.len)
    }
}

/// A deque under sized construction. Logs the rollback when construction
/// stops early, whether by `Err` or by unwinding.
struct Filling<T> {
    deque: BucketDeque<T>,
    requested: usize,
}

impl<T> Drop for Filling<T> {
    fn drop(&mut self) {
        if self.deque.len() < self.requested {
            _debug!(
                constructed = self.deque.len(),
                requested = self.requested,
                "rolling back sized construction"
            );
        }
    }
}

impl<T> Drop for BucketDeque<T> {
    fn drop(&mut self) {
        /// Finishes the teardown when an element destructor unwinds: the
        /// remaining elements are still dropped and every bucket is freed.
        struct Teardown<'a, T>(&'a mut BucketDeque<T>);

        impl<T> Drop for Teardown<'_, T> {
            fn drop(&mut self) {
                self.0.clear();
                for bucket in self.0.buckets.drain(..).flatten() {
                    // SAFETY: every live slot was dropped by `clear`.
                    unsafe { bucket::free_bucket(bucket) };
                }
            }
        }

        let mut teardown = Teardown(self);
        // `truncate` shrinks `len` before each drop, so after a panic the
        // guard resumes with the next element.
        teardown.0.clear();
    }
}

impl<T> Default for BucketDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> BucketDeque<T> {
    /// Creates a deque of `len` default values.
    pub fn with_len(len: usize) -> Self {
        Self::from_fn(len, |_| T::default())
    }
}

impl<T: Clone> BucketDeque<T> {
    /// Creates a deque of `len` clones of `value`.
    pub fn from_elem(len: usize, value: T) -> Self {
        Self::from_fn(len, |_| value.clone())
    }
}

impl<T: Clone> Clone for BucketDeque<T> {
    /// Deep-copies the live range into a deque with the same bucket geometry.
    fn clone(&self) -> Self {
        let mut copy = Self {
            buckets: vec![None; self.buckets.len()],
            len: 0,
            first: self.first,
            marker: PhantomData,
        };
        for value in self {
            copy.push_back(value.clone());
        }
        copy
    }

    /// Copy-and-swap: `self` is only replaced once the copy is complete.
    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.clone();
        mem::swap(self, &mut copy);
    }
}

impl<T> Index<usize> for BucketDeque<T> {
    type Output = T;

    /// # Panics
    /// Panics if `index >= len()`.
    #[inline]
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("index {index} out of bounds for deque of length {}", self.len),
        }
    }
}

impl<T> IndexMut<usize> for BucketDeque<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index {index} out of bounds for deque of length {len}"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BucketDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U> PartialEq<BucketDeque<U>> for BucketDeque<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &BucketDeque<U>) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for BucketDeque<T> {}

impl<T, U> PartialEq<[U]> for BucketDeque<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.len == other.len() && self.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl<T, U> PartialEq<&[U]> for BucketDeque<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        *self == **other
    }
}

impl<T, U> PartialEq<Vec<U>> for BucketDeque<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Vec<U>) -> bool {
        *self == **other
    }
}

impl<T, U, const N: usize> PartialEq<[U; N]> for BucketDeque<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        *self == other[..]
    }
}

impl<T: PartialOrd> PartialOrd for BucketDeque<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord> Ord for BucketDeque<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash> Hash for BucketDeque<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for value in self {
            value.hash(state);
        }
    }
}

impl<T> Extend<T> for BucketDeque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for BucketDeque<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for BucketDeque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut deque = Self::sized_for(iter.size_hint().0);
        deque.extend(iter);
        deque
    }
}

impl<T> From<Vec<T>> for BucketDeque<T> {
    fn from(vec: Vec<T>) -> Self {
        vec.into_iter().collect()
    }
}

impl<T, const N: usize> From<[T; N]> for BucketDeque<T> {
    fn from(array: [T; N]) -> Self {
        array.into_iter().collect()
    }
}

impl<T> From<BucketDeque<T>> for Vec<T> {
    fn from(deque: BucketDeque<T>) -> Self {
        deque.into_iter().collect()
    }
}

impl<T> IntoIterator for BucketDeque<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self)
    }
}

impl<'a, T> IntoIterator for &'a BucketDeque<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut BucketDeque<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    /// Counts drops into a shared counter and optionally panics on clone.
    struct Tracked {
        value: usize,
        drops: Rc<Cell<usize>>,
        clones_left: Rc<Cell<usize>>,
    }

    impl Tracked {
        fn new(value: usize, drops: &Rc<Cell<usize>>, clones_left: &Rc<Cell<usize>>) -> Self {
            Self {
                value,
                drops: Rc::clone(drops),
                clones_left: Rc::clone(clones_left),
            }
        }
    }

    impl Clone for Tracked {
        fn clone(&self) -> Self {
            let left = self.clones_left.get();
            if left == 0 {
                panic!("clone budget exhausted");
            }
            self.clones_left.set(left - 1);
            Self::new(self.value, &self.drops, &self.clones_left)
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn counters(clone_budget: usize) -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
        (Rc::new(Cell::new(0)), Rc::new(Cell::new(clone_budget)))
    }

    #[test]
    fn new_deque_has_minimal_unallocated_storage() {
        let d: BucketDeque<u8> = BucketDeque::new();
        assert_eq!(d.storage_size(), MIN_BUCKETS);
        assert_eq!(d.allocated_buckets(), 0);
        assert_eq!(d.first, Position::new(1, 0));
        assert!(d.is_empty());
    }

    #[test]
    fn translate_spans_buckets_from_first_position() {
        let mut d = BucketDeque::new();
        for i in 0..3 {
            d.push_front(i);
        }
        // Three pushes to the front of (1, 0) land in bucket 0.
        assert_eq!(d.first, Position::new(0, BASE_SIZE - 3));
        assert_eq!(d.translate(0), d.first);
        assert_eq!(d.translate(3), Position::new(1, 0));
        assert_eq!(d.translate(3 + BASE_SIZE), Position::new(2, 0));
    }

    #[test]
    fn buckets_are_allocated_lazily() {
        let mut d = BucketDeque::new();
        d.push_back(1u32);
        assert_eq!(d.allocated_buckets(), 1);
        for i in 0..(BASE_SIZE as u32 - 1) {
            d.push_back(i);
        }
        assert_eq!(d.allocated_buckets(), 1);
        d.push_back(99);
        assert_eq!(d.allocated_buckets(), 2);
    }

    #[test]
    fn pops_retain_buckets_for_reuse() {
        let mut d: BucketDeque<usize> = (0..BASE_SIZE * 2).collect();
        let allocated = d.allocated_buckets();
        while d.pop_back().is_some() {}
        assert!(d.is_empty());
        assert_eq!(d.allocated_buckets(), allocated);
        d.extend(0..BASE_SIZE * 2);
        assert_eq!(d.allocated_buckets(), allocated);
    }

    #[test]
    fn growth_triples_and_centres_the_old_array() {
        let mut d = BucketDeque::new();
        let mut sizes = vec![d.storage_size()];
        for i in 0..(BASE_SIZE * 40) {
            d.push_back(i);
            if d.storage_size() != *sizes.last().unwrap() {
                sizes.push(d.storage_size());
                // Room on both sides after growth is at least the previous size.
                let old = sizes[sizes.len() - 2];
                let end = d.translate(d.len);
                let left = d.first.bucket;
                let right = d.storage_size() - end.bucket;
                assert!(left >= old);
                assert!(right >= old);
                assert!(left.abs_diff(right) <= old);
            }
        }
        assert!(sizes.len() >= 3);
        for pair in sizes.windows(2) {
            assert_eq!(pair[1], pair[0] * GROWTH_FACTOR);
        }
        assert!(d.iter().copied().eq(0..BASE_SIZE * 40));
    }

    #[test]
    fn growth_at_the_front_is_symmetric() {
        let mut d = BucketDeque::new();
        let mut sizes = vec![d.storage_size()];
        for i in 0..(BASE_SIZE * 20) {
            d.push_front(i);
            let end = d.translate(d.len);
            assert!(end.bucket < d.storage_size());
            if d.storage_size() != *sizes.last().unwrap() {
                sizes.push(d.storage_size());
                let old = sizes[sizes.len() - 2];
                // The push that grew the array already stepped one bucket
                // below the old range.
                let left = d.first.bucket + 1;
                let right = d.storage_size() - end.bucket;
                assert!(left >= old);
                assert!(right >= old);
                assert!(left.abs_diff(right) <= old);
            }
        }
        assert!(sizes.len() >= 3);
        for pair in sizes.windows(2) {
            assert_eq!(pair[1], pair[0] * GROWTH_FACTOR);
        }
        assert!(d.iter().copied().eq((0..BASE_SIZE * 20).rev()));
    }

    #[test]
    fn recentring_balances_headroom_on_both_sides() {
        let mut d = BucketDeque::new();
        for i in 0..BASE_SIZE {
            d.push_back(i);
        }
        let mut recentred = 0;
        for i in BASE_SIZE..BASE_SIZE * 200 {
            let (size, first) = (d.storage_size(), d.first.bucket);
            d.push_back(i);
            if d.storage_size() == size && d.first.bucket < first {
                recentred += 1;
                let left = d.first.bucket;
                let right = d.storage_size() - d.translate(d.len).bucket;
                assert!(left.abs_diff(right) <= 1, "left {left}, right {right}");
            }
            assert_eq!(d.pop_front(), Some(i - BASE_SIZE));
        }
        assert!(recentred > 0);
        assert!(d.iter().copied().eq(BASE_SIZE * 199..BASE_SIZE * 200));
    }

    #[test]
    fn fifo_traffic_recentres_instead_of_growing_forever() {
        let mut d = BucketDeque::new();
        for i in 0..BASE_SIZE {
            d.push_back(i);
        }
        for i in BASE_SIZE..BASE_SIZE * 1000 {
            d.push_back(i);
            assert_eq!(d.pop_front(), Some(i - BASE_SIZE));
        }
        assert_eq!(d.len(), BASE_SIZE);
        assert!(d.storage_size() <= MIN_BUCKETS * GROWTH_FACTOR * GROWTH_FACTOR);
        assert!(d.allocated_buckets() <= d.storage_size());
        assert!(d.iter().copied().eq(BASE_SIZE * 999..BASE_SIZE * 1000));
    }

    #[test]
    fn sized_construction_geometry() {
        let d = BucketDeque::<u8>::with_len(40);
        assert_eq!(d.len(), 40);
        assert_eq!(d.storage_size(), MIN_BUCKETS * (40 / BASE_SIZE + 1));
        assert_eq!(d.first, Position::new(d.storage_size() / 4, 0));
        assert_eq!(d.allocated_buckets(), 3);
        assert!(d.iter().all(|&x| x == 0));
    }

    #[test]
    fn from_elem_clones_fill_value() {
        let d = BucketDeque::from_elem(5, String::from("x"));
        assert_eq!(d, ["x", "x", "x", "x", "x"]);
    }

    #[test]
    fn panicking_fill_rolls_back_every_constructed_element() {
        let (drops, clones_left) = counters(20);
        let seed = Tracked::new(7, &drops, &clones_left);
        let result = catch_unwind(AssertUnwindSafe(|| BucketDeque::from_elem(50, seed)));
        assert!(result.is_err());
        // 20 successful clones plus the seed captured by the closure.
        assert_eq!(drops.get(), 21);
    }

    #[test]
    fn failing_try_from_fn_drops_in_reverse_order() {
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        struct Logged(usize, Rc<std::cell::RefCell<Vec<usize>>>);
        impl Drop for Logged {
            fn drop(&mut self) {
                self.1.borrow_mut().push(self.0);
            }
        }

        let result = BucketDeque::try_from_fn(40, |i| {
            if i == 35 {
                Err("boom")
            } else {
                Ok(Logged(i, Rc::clone(&order)))
            }
        });
        assert_eq!(result.err(), Some("boom"));
        let dropped = order.borrow();
        assert_eq!(*dropped, (0..35).rev().collect::<Vec<_>>());
    }

    #[test]
    fn panicking_clone_leaves_source_intact_and_leaks_nothing() {
        let (drops, clones_left) = counters(0);
        let source: BucketDeque<Tracked> =
            (0..30).map(|i| Tracked::new(i, &drops, &clones_left)).collect();
        clones_left.set(17);

        let result = catch_unwind(AssertUnwindSafe(|| source.clone()));
        assert!(result.is_err());
        assert_eq!(drops.get(), 17);
        assert_eq!(source.len(), 30);
        assert!(source.iter().map(|t| t.value).eq(0..30));

        drop(source);
        assert_eq!(drops.get(), 47);
    }

    #[test]
    fn clone_from_keeps_target_on_failure() {
        let (drops, clones_left) = counters(0);
        let source: BucketDeque<Tracked> =
            (0..10).map(|i| Tracked::new(i, &drops, &clones_left)).collect();
        let mut target: BucketDeque<Tracked> =
            (100..103).map(|i| Tracked::new(i, &drops, &clones_left)).collect();

        clones_left.set(4);
        let result = catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
        assert!(result.is_err());
        assert!(target.iter().map(|t| t.value).eq(100..103));

        clones_left.set(10);
        target.clone_from(&source);
        assert!(target.iter().map(|t| t.value).eq(0..10));
    }

    #[test]
    fn clone_keeps_geometry_and_copies_only_live_range() {
        let mut d: BucketDeque<u32> = (0..100).collect();
        for _ in 0..40 {
            d.pop_front();
        }
        let copy = d.clone();
        assert_eq!(copy, d);
        assert_eq!(copy.first, d.first);
        assert_eq!(copy.storage_size(), d.storage_size());
        assert!(copy.allocated_buckets() < d.allocated_buckets());
    }

    #[test]
    fn drop_and_truncate_drop_each_element_once() {
        let (drops, clones_left) = counters(0);
        let mut d = BucketDeque::new();
        for i in 0..(BASE_SIZE * 3 + 5) {
            if i % 2 == 0 {
                d.push_back(Tracked::new(i, &drops, &clones_left));
            } else {
                d.push_front(Tracked::new(i, &drops, &clones_left));
            }
        }
        d.truncate(10);
        assert_eq!(drops.get(), BASE_SIZE * 3 + 5 - 10);
        let popped = d.pop_front();
        drop(popped);
        assert_eq!(drops.get(), BASE_SIZE * 3 + 5 - 9);
        drop(d);
        assert_eq!(drops.get(), BASE_SIZE * 3 + 5);
    }

    /// Counts its drop and panics in it when `id` matches `panic_on`.
    struct PanicOnDrop {
        id: usize,
        panic_on: usize,
        drops: Rc<Cell<usize>>,
    }

    impl Drop for PanicOnDrop {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
            if self.id == self.panic_on {
                panic!("drop of element {}", self.id);
            }
        }
    }

    #[test]
    fn panicking_destructor_still_drops_every_element() {
        let drops = Rc::new(Cell::new(0));
        let d: BucketDeque<PanicOnDrop> = (0..40)
            .map(|id| PanicOnDrop {
                id,
                panic_on: 5,
                drops: Rc::clone(&drops),
            })
            .collect();
        assert_eq!(d.allocated_buckets(), 3);

        let result = catch_unwind(AssertUnwindSafe(|| drop(d)));
        assert!(result.is_err());
        assert_eq!(drops.get(), 40);
    }

    #[test]
    fn panicking_destructor_in_truncate_keeps_the_rest_live() {
        let drops = Rc::new(Cell::new(0));
        let mut d: BucketDeque<PanicOnDrop> = (0..20)
            .map(|id| PanicOnDrop {
                id,
                panic_on: 12,
                drops: Rc::clone(&drops),
            })
            .collect();

        let result = catch_unwind(AssertUnwindSafe(|| d.truncate(4)));
        assert!(result.is_err());
        // 19..=12 were dropped; the panicking element is out of the range.
        assert_eq!(drops.get(), 8);
        assert_eq!(d.len(), 12);
        assert!(d.iter().map(|e| e.id).eq(0..12));

        drop(d);
        assert_eq!(drops.get(), 20);
    }

    #[test]
    fn insert_and_remove_shift_across_buckets() {
        let mut d: BucketDeque<usize> = (0..BASE_SIZE * 3).collect();
        d.insert(5, 1000);
        assert_eq!(d.len(), BASE_SIZE * 3 + 1);
        assert_eq!(d[5], 1000);
        assert_eq!(d[6], 5);
        assert_eq!(d[BASE_SIZE * 3], BASE_SIZE * 3 - 1);
        assert_eq!(d.remove(5), Some(1000));
        assert!(d.iter().copied().eq(0..BASE_SIZE * 3));
    }

    #[test]
    fn insert_grows_when_back_is_full() {
        let mut d = BucketDeque::new();
        let mut pushed = 0;
        while !d.back_exhausted() {
            d.push_back(pushed);
            pushed += 1;
        }
        let before = d.storage_size();
        d.insert(1, usize::MAX);
        assert!(d.storage_size() > before);
        assert_eq!(d[1], usize::MAX);
        assert_eq!(d.len(), pushed + 1);
    }

    #[test]
    #[should_panic(expected = "insertion index")]
    fn insert_past_end_panics() {
        let mut d: BucketDeque<i32> = BucketDeque::new();
        d.insert(1, 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn index_past_end_panics() {
        let d: BucketDeque<i32> = [1, 2].into();
        let _ = d[2];
    }

    #[test]
    fn zero_sized_elements() {
        let mut d = BucketDeque::new();
        for _ in 0..100 {
            d.push_back(());
            d.push_front(());
        }
        assert_eq!(d.len(), 200);
        assert_eq!(d.iter().count(), 200);
        d.insert(50, ());
        assert_eq!(d.remove(0), Some(()));
        assert_eq!(d.len(), 200);
    }
}
