//! Random-access cursors over a [`BucketDeque`].
//!
//! A cursor is a `(bucket, offset)` pair plus a cached pointer to the bucket
//! it currently names. Stepping by one only touches the cache when it
//! crosses a bucket boundary; jumps recompute the pair from the linear slot
//! index `bucket * BASE_SIZE + offset` with floored division, so negative
//! jumps work. The logical index is never stored, it is derived from the
//! pair and the deque's first position on demand.
//!
//! Two kinds exist: [`Cursor`] (shared, `Copy`) and [`CursorMut`] (unique,
//! can mutate and restructure). A `CursorMut` widens into a `Cursor` through
//! [`From`]; there is no conversion the other way.
//!
//! Cursors borrow the deque, so no cursor can survive a push, pop, insert or
//! remove performed through another path. A `CursorMut` that restructures
//! the deque itself re-derives its own position afterwards.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};
use core::ptr;

use super::bucket::{self, index_split_signed, BucketPtr};
use super::{BucketDeque, BASE_SIZE};

/// Navigation state shared by both cursor kinds.
struct RawCursor<T> {
    bucket: isize,
    offset: usize,
    current: BucketPtr<T>,
}

impl<T> Clone for RawCursor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawCursor<T> {}

impl<T> RawCursor<T> {
    #[inline]
    fn at_linear(deque: &BucketDeque<T>, linear: isize) -> Self {
        let (bucket, offset) = index_split_signed(linear);
        Self {
            bucket,
            offset,
            current: deque.bucket_at(bucket),
        }
    }

    #[inline(always)]
    fn linear(&self) -> isize {
        self.bucket * BASE_SIZE as isize + self.offset as isize
    }

    #[inline(always)]
    fn index(&self, deque: &BucketDeque<T>) -> isize {
        self.linear() - deque.first_linear()
    }

    #[inline]
    fn is_live(&self, deque: &BucketDeque<T>) -> bool {
        usize::try_from(self.index(deque)).is_ok_and(|i| i < deque.len())
    }

    #[inline]
    fn move_next(&mut self, deque: &BucketDeque<T>) {
        if self.offset + 1 < BASE_SIZE {
            self.offset += 1;
        } else {
            self.bucket += 1;
            self.offset = 0;
            self.current = deque.bucket_at(self.bucket);
        }
    }

    #[inline]
    fn move_prev(&mut self, deque: &BucketDeque<T>) {
        if self.offset > 0 {
            self.offset -= 1;
        } else {
            self.bucket -= 1;
            self.offset = BASE_SIZE - 1;
            self.current = deque.bucket_at(self.bucket);
        }
    }

    /// # Panics
    /// Panics if the target slot index overflows `isize`.
    #[inline]
    fn seek(&mut self, deque: &BucketDeque<T>, delta: isize) {
        let Some(target) = self.linear().checked_add(delta) else {
            panic!("cursor offset overflow: {} + {delta}", self.linear());
        };
        let (bucket, offset) = index_split_signed(target);
        if bucket != self.bucket {
            self.bucket = bucket;
            self.current = deque.bucket_at(bucket);
        }
        self.offset = offset;
    }

    /// # Safety
    /// The cursor must be on a live element.
    #[inline(always)]
    unsafe fn slot(&self) -> *mut T {
        bucket::slot(self.current.unwrap_unchecked(), self.offset)
    }
}

/// A read-only random-access cursor into a [`BucketDeque`].
///
/// Cursors may be moved anywhere, including before [`BucketDeque::begin`]
/// and past [`BucketDeque::end`]; [`get`](Self::get) returns `None` off the
/// live range.
///
/// Two cursors are equal when they point into the same deque at the same
/// position. Cursors of different deques are never equal and are unordered
/// (`partial_cmp` returns `None`); their difference is meaningless.
///
/// ```rust
/// use bucket_deque::BucketDeque;
///
/// let deque: BucketDeque<u32> = (0..100).collect();
/// let it = deque.begin() + 40;
/// assert_eq!(it.get(), Some(&40));
/// assert_eq!((it - 25).get(), Some(&15));
/// assert_eq!(deque.end() - it, 60);
/// assert!(it < deque.end());
/// ```
pub struct Cursor<'a, T> {
    deque: &'a BucketDeque<T>,
    raw: RawCursor<T>,
}

// SAFETY: a `Cursor` only hands out `&T`, like `&BucketDeque<T>`.
unsafe impl<T: Sync> Send for Cursor<'_, T> {}
// SAFETY: as above.
unsafe impl<T: Sync> Sync for Cursor<'_, T> {}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<'a, T> Cursor<'a, T> {
    #[inline]
    pub(crate) fn at_linear(deque: &'a BucketDeque<T>, linear: isize) -> Self {
        Self {
            deque,
            raw: RawCursor::at_linear(deque, linear),
        }
    }

    /// Logical index relative to the deque's first element.
    #[inline]
    pub fn index(&self) -> isize {
        self.raw.index(self.deque)
    }

    /// Linear slot index `bucket * BASE_SIZE + offset`.
    #[inline]
    pub fn linear(&self) -> isize {
        self.raw.linear()
    }

    /// The element under the cursor, or `None` off the live range.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        if self.raw.is_live(self.deque) {
            // SAFETY: liveness checked above.
            Some(unsafe { self.get_unchecked() })
        } else {
            None
        }
    }

    /// The element under the cursor without a range check.
    ///
    /// # Safety
    /// The cursor must point at a live element (`0 <= index() < len()`).
    #[inline(always)]
    pub unsafe fn get_unchecked(&self) -> &'a T {
        &*self.raw.slot()
    }

    /// The element `delta` positions away, if live.
    #[inline]
    pub fn peek(&self, delta: isize) -> Option<&'a T> {
        (*self + delta).get()
    }

    /// Advances one position.
    #[inline]
    pub fn move_next(&mut self) {
        self.raw.move_next(self.deque);
    }

    /// Steps back one position.
    #[inline]
    pub fn move_prev(&mut self) {
        self.raw.move_prev(self.deque);
    }

    /// Moves by `delta` positions (negative moves towards the front).
    ///
    /// # Panics
    /// Panics if the resulting slot index does not fit in an `isize`.
    #[inline]
    pub fn seek(&mut self, delta: isize) {
        self.raw.seek(self.deque, delta);
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.deque, other.deque) && self.linear() == other.linear()
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T> PartialOrd for Cursor<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if ptr::eq(self.deque, other.deque) {
            Some(self.linear().cmp(&other.linear()))
        } else {
            None
        }
    }
}

impl<T> AddAssign<isize> for Cursor<'_, T> {
    #[inline]
    fn add_assign(&mut self, delta: isize) {
        self.seek(delta);
    }
}

impl<T> SubAssign<isize> for Cursor<'_, T> {
    #[inline]
    fn sub_assign(&mut self, delta: isize) {
        self.seek(-delta);
    }
}

impl<'a, T> Add<isize> for Cursor<'a, T> {
    type Output = Cursor<'a, T>;

    #[inline]
    fn add(mut self, delta: isize) -> Self::Output {
        self += delta;
        self
    }
}

impl<'a, T> Add<Cursor<'a, T>> for isize {
    type Output = Cursor<'a, T>;

    #[inline]
    fn add(self, cursor: Cursor<'a, T>) -> Self::Output {
        cursor + self
    }
}

impl<'a, T> Sub<isize> for Cursor<'a, T> {
    type Output = Cursor<'a, T>;

    #[inline]
    fn sub(mut self, delta: isize) -> Self::Output {
        self -= delta;
        self
    }
}

impl<'a, T> Sub for Cursor<'a, T> {
    type Output = isize;

    /// Signed distance in positions from `other` to `self`.
    #[inline]
    fn sub(self, other: Self) -> isize {
        self.linear() - other.linear()
    }
}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index())
            .field("bucket", &self.raw.bucket)
            .field("offset", &self.raw.offset)
            .finish()
    }
}

/// A mutable cursor into a [`BucketDeque`].
///
/// Besides navigation and element mutation, a `CursorMut` can insert and
/// remove at its position; it re-derives its `(bucket, offset)` afterwards
/// since either may reallocate the bucket array.
///
/// ```rust
/// use bucket_deque::BucketDeque;
///
/// let mut deque: BucketDeque<i32> = [1, 2, 4].into();
/// let mut cursor = deque.cursor_mut_at(2);
/// cursor.insert_before(3);
/// assert_eq!(cursor.get(), Some(&3));
/// cursor += 1;
/// *cursor.get_mut().unwrap() *= 10;
/// assert_eq!(deque, [1, 2, 3, 40]);
/// ```
pub struct CursorMut<'a, T> {
    deque: &'a mut BucketDeque<T>,
    raw: RawCursor<T>,
}

// SAFETY: a `CursorMut` behaves like `&mut BucketDeque<T>`.
unsafe impl<T: Send> Send for CursorMut<'_, T> {}
// SAFETY: shared access to a `CursorMut` only hands out `&T`.
unsafe impl<T: Sync> Sync for CursorMut<'_, T> {}

impl<'a, T> CursorMut<'a, T> {
    #[inline]
    pub(crate) fn at_index(deque: &'a mut BucketDeque<T>, index: isize) -> Self {
        let raw = RawCursor::at_linear(deque, deque.first_linear() + index);
        Self { deque, raw }
    }

    /// Logical index relative to the deque's first element.
    #[inline]
    pub fn index(&self) -> isize {
        self.raw.index(self.deque)
    }

    /// Linear slot index `bucket * BASE_SIZE + offset`.
    #[inline]
    pub fn linear(&self) -> isize {
        self.raw.linear()
    }

    /// The element under the cursor, or `None` off the live range.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.raw.is_live(self.deque) {
            // SAFETY: liveness checked above.
            Some(unsafe { &*self.raw.slot() })
        } else {
            None
        }
    }

    /// Mutable access to the element under the cursor.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.raw.is_live(self.deque) {
            // SAFETY: liveness checked above; `self` holds the deque uniquely.
            Some(unsafe { &mut *self.raw.slot() })
        } else {
            None
        }
    }

    /// Advances one position.
    #[inline]
    pub fn move_next(&mut self) {
        self.raw.move_next(self.deque);
    }

    /// Steps back one position.
    #[inline]
    pub fn move_prev(&mut self) {
        self.raw.move_prev(self.deque);
    }

    /// Moves by `delta` positions (negative moves towards the front).
    ///
    /// # Panics
    /// Panics if the resulting slot index does not fit in an `isize`.
    #[inline]
    pub fn seek(&mut self, delta: isize) {
        self.raw.seek(self.deque, delta);
    }

    /// A read-only view of this cursor, borrowing it.
    #[inline]
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor {
            deque: &*self.deque,
            raw: self.raw,
        }
    }

    /// Inserts `value` at the cursor position, shifting the element under
    /// the cursor and everything after it towards the back. The cursor ends
    /// up on the inserted element.
    ///
    /// # Panics
    /// Panics if the cursor is outside `0..=len()`.
    pub fn insert_before(&mut self, value: T) {
        let len = self.deque.len();
        let index = match usize::try_from(self.index()) {
            Ok(index) if index <= len => index,
            _ => panic!("cursor index (is {}) should be within 0..={len}", self.index()),
        };
        self.deque.insert(index, value);
        self.reposition(index);
    }

    /// Removes the element under the cursor and returns it. The cursor ends
    /// up on the element that followed it. Returns `None` off the live range.
    pub fn remove_current(&mut self) -> Option<T> {
        let index = usize::try_from(self.index()).ok()?;
        let value = self.deque.remove(index)?;
        self.reposition(index);
        Some(value)
    }

    fn reposition(&mut self, index: usize) {
        let linear = self.deque.first_linear() + index as isize;
        self.raw = RawCursor::at_linear(self.deque, linear);
    }
}

impl<'a, T> From<CursorMut<'a, T>> for Cursor<'a, T> {
    fn from(cursor: CursorMut<'a, T>) -> Self {
        let deque: &'a BucketDeque<T> = cursor.deque;
        Cursor {
            deque,
            raw: cursor.raw,
        }
    }
}

impl<T> AddAssign<isize> for CursorMut<'_, T> {
    #[inline]
    fn add_assign(&mut self, delta: isize) {
        self.seek(delta);
    }
}

impl<T> SubAssign<isize> for CursorMut<'_, T> {
    #[inline]
    fn sub_assign(&mut self, delta: isize) {
        self.seek(-delta);
    }
}

impl<T> fmt::Debug for CursorMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("index", &self.index())
            .field("bucket", &self.raw.bucket)
            .field("offset", &self.raw.offset)
            .finish()
    }
}
