//! Borrowing and owning iterators for [`BucketDeque`].

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use super::bucket::{self, BucketPtr, Position};
use super::{BucketDeque, Cursor};

/// Iterator over `&T`, created by [`BucketDeque::iter`].
///
/// Walks a `[begin, end)` cursor pair from both sides.
pub struct Iter<'a, T> {
    head: Cursor<'a, T>,
    tail: Cursor<'a, T>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(head: Cursor<'a, T>, tail: Cursor<'a, T>, remaining: usize) -> Self {
        Self {
            head,
            tail,
            remaining,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head,
            tail: self.tail,
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.clone().collect::<Vec<_>>()).finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: `remaining > 0`, so `head` is on a live element.
        let item = unsafe { self.head.get_unchecked() };
        self.head.move_next();
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.remaining {
            self.head = self.tail;
            self.remaining = 0;
            return None;
        }
        self.head.seek(n as isize);
        self.remaining -= n;
        self.next()
    }

    #[inline]
    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }

    #[inline]
    fn count(self) -> usize {
        self.remaining
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.tail.move_prev();
        self.remaining -= 1;
        // SAFETY: the element before `tail` is live while `remaining` was > 0.
        Some(unsafe { self.tail.get_unchecked() })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Iterator over `&mut T`, created by [`BucketDeque::iter_mut`].
pub struct IterMut<'a, T> {
    buckets: &'a [BucketPtr<T>],
    head: Position,
    remaining: usize,
    marker: PhantomData<&'a mut T>,
}

// SAFETY: `IterMut` behaves like `&mut [T]`.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
// SAFETY: as above.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<'a, T> IterMut<'a, T> {
    pub(super) fn new(buckets: &'a [BucketPtr<T>], head: Position, remaining: usize) -> Self {
        Self {
            buckets,
            head,
            remaining,
            marker: PhantomData,
        }
    }

    /// # Safety
    /// `pos` must be a live slot not yet yielded.
    #[inline(always)]
    unsafe fn yield_slot(&self, pos: Position) -> &'a mut T {
        let bucket = self.buckets.get_unchecked(pos.bucket).unwrap_unchecked();
        &mut *bucket::slot(bucket, pos.offset)
    }
}

impl<T: fmt::Debug> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut").field("remaining", &self.remaining).finish()
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.head;
        self.head = pos.add(1);
        self.remaining -= 1;
        // SAFETY: `pos` is live and each slot is yielded at most once.
        Some(unsafe { self.yield_slot(pos) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let pos = self.head.add(self.remaining);
        // SAFETY: as in `next`, from the other end.
        Some(unsafe { self.yield_slot(pos) })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator, created by [`BucketDeque::into_iter`].
pub struct IntoIter<T> {
    deque: BucketDeque<T>,
}

impl<T> IntoIter<T> {
    pub(super) fn new(deque: BucketDeque<T>) -> Self {
        Self { deque }
    }
}

impl<T: Clone> Clone for IntoIter<T> {
    fn clone(&self) -> Self {
        Self {
            deque: self.deque.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.deque.len();
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}
