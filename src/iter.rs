//! Forward iterators over the live elements of a [`crate::DynArray`].
//!
//! Both iterators borrow the array, so the array cannot grow (and move its
//! storage) while one of them is alive. Two iterators compare equal when
//! they are at the same position of the same storage.

use std::{fmt, iter::FusedIterator, marker::PhantomData, ptr::NonNull, slice};

/// Read-only iterator, see [`crate::DynArray::iter`].
pub struct Iter<'a, T> {
    ptr: NonNull<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(slice: &'a [T]) -> Self {
        Self {
            ptr: NonNull::from(slice).cast(),
            remaining: slice.len(),
            _marker: PhantomData,
        }
    }

    /// Elements not yet yielded.
    pub fn as_slice(&self) -> &'a [T] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.remaining) }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        unsafe {
            let item = &*self.ptr.as_ptr();
            self.ptr = NonNull::new_unchecked(self.ptr.as_ptr().add(1));
            self.remaining -= 1;
            Some(item)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

// Same auto traits as `&[T]`.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Iter<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr && self.remaining == other.remaining
    }
}

impl<T> Eq for Iter<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.as_slice()).finish()
    }
}

/// Iterator yielding mutable references, see [`crate::DynArray::iter_mut`].
/// Converts into an [`Iter`] at the same position, never the other way
/// around.
pub struct IterMut<'a, T> {
    ptr: NonNull<T>,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(slice: &'a mut [T]) -> Self {
        let remaining = slice.len();
        Self {
            ptr: NonNull::from(slice).cast(),
            remaining,
            _marker: PhantomData,
        }
    }

    /// Elements not yet yielded.
    pub fn into_slice(self) -> &'a mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.remaining) }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        unsafe {
            let item = &mut *self.ptr.as_ptr();
            self.ptr = NonNull::new_unchecked(self.ptr.as_ptr().add(1));
            self.remaining -= 1;
            Some(item)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

// Same auto traits as `&mut [T]`.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> PartialEq for IterMut<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr && self.remaining == other.remaining
    }
}

impl<T> Eq for IterMut<'_, T> {}

impl<'a, T> From<IterMut<'a, T>> for Iter<'a, T> {
    fn from(iter: IterMut<'a, T>) -> Self {
        Self {
            ptr: iter.ptr,
            remaining: iter.remaining,
            _marker: PhantomData,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest = unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.remaining) };
        f.debug_tuple("IterMut").field(&rest).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_in_order_then_stops() {
        let data = [1, 2, 3];
        let mut iter = Iter::new(&data);
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.as_slice(), &[2, 3]);
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn equality_tracks_position() {
        let data = [10, 20];
        let start = Iter::new(&data);
        let mut moved = start.clone();
        assert_eq!(start, moved);

        // Post-increment: `next` yields the old position and advances.
        assert_eq!(moved.next(), Some(&10));
        assert_ne!(start, moved);
        assert_eq!(moved.next(), Some(&20));

        let mut end = Iter::new(&data);
        assert_eq!(end.by_ref().count(), 2);
        assert_eq!(moved, end);
    }

    #[test]
    fn empty_iterator_is_already_at_end() {
        let data: [u8; 0] = [];
        let mut begin = Iter::new(&data);
        let end = begin.clone();
        assert_eq!(begin.next(), None);
        assert_eq!(begin, end);
    }

    #[test]
    fn mutable_iterator_narrows_to_read_only() {
        let mut data = [1, 2, 3];
        let mut iter = IterMut::new(&mut data);
        if let Some(first) = iter.next() {
            *first = 100;
        }

        let read_only: Iter<'_, i32> = iter.into();
        assert_eq!(read_only.as_slice(), &[2, 3]);
        assert_eq!(data, [100, 2, 3]);
    }

    #[test]
    fn mutable_iterator_reads_and_writes_in_place() {
        let mut data = [1, 2, 3];
        let mut iter = IterMut::new(&mut data);
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next().map(|v| *v), Some(1));

        let rest = iter.into_slice();
        assert_eq!(rest, &[2, 3]);
        rest[0] = 20;
        assert_eq!(data, [1, 20, 3]);
    }

    #[test]
    fn iterators_cross_threads_like_slices() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Iter<'static, String>>();
        assert_send_sync::<IterMut<'static, String>>();
    }

    #[test]
    fn zero_sized_elements_are_counted() {
        let data = [(), (), ()];
        assert_eq!(Iter::new(&data).count(), 3);
    }
}
