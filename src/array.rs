use std::{
    alloc::Layout,
    fmt,
    marker::PhantomData,
    mem,
    ops::{Index, IndexMut},
    ptr::{self, NonNull},
    slice,
};

use allocator_api2::alloc::Allocator;

use crate::{
    error::{ArrayError, Result},
    iter::{Iter, IterMut},
    FreeListAllocator,
};

/// A growable array whose storage always comes from a borrowed allocator.
///
/// Capacity starts at zero and doubles whenever a push finds the array full
/// (1, 2, 4, 8, ...). Only [`DynArray::push`] follows that sequence;
/// `reserve`, `extend` and the sized constructors may leave it.
///
/// Growing requests a new block, moves the elements over one index at a
/// time and hands the old block back to the allocator, so with a
/// [`FreeListAllocator`] the old block becomes available to the next request
/// that fits in it.
///
/// The array borrows its allocator for `'a` and therefore can never outlive
/// it. It is not `Clone`.
///
/// ```
/// use blockpool::{DynArray, FreeListAllocator};
///
/// let alloc = FreeListAllocator::new();
/// let mut numbers = DynArray::new_in(&alloc);
/// for i in 0..10 {
///     numbers.push(i);
/// }
/// assert_eq!(numbers.len(), 10);
/// assert_eq!(numbers.capacity(), 16);
/// assert_eq!(numbers[5], 5);
/// ```
pub struct DynArray<'a, T, R: Allocator + ?Sized = FreeListAllocator> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: &'a R,
    _marker: PhantomData<T>,
}

impl<'a, T, R: Allocator + ?Sized> DynArray<'a, T, R> {
    /// Creates an empty array. No storage is requested until the first push.
    pub fn new_in(alloc: &'a R) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Creates an empty array with room for exactly `capacity` elements.
    pub fn with_capacity_in(capacity: usize, alloc: &'a R) -> Self {
        Self::try_with_capacity_in(capacity, alloc).unwrap_or_else(|err| err.fail())
    }

    pub fn try_with_capacity_in(capacity: usize, alloc: &'a R) -> Result<Self> {
        let mut array = Self::new_in(alloc);
        array.try_grow(capacity)?;
        Ok(array)
    }

    /// Creates an array of `len` default values, with capacity `len`.
    pub fn with_len_in(len: usize, alloc: &'a R) -> Self
    where
        T: Default,
    {
        Self::try_with_len_in(len, alloc).unwrap_or_else(|err| err.fail())
    }

    pub fn try_with_len_in(len: usize, alloc: &'a R) -> Result<Self>
    where
        T: Default,
    {
        let mut array = Self::try_with_capacity_in(len, alloc)?;
        for index in 0..len {
            unsafe { ptr::write(array.ptr.as_ptr().add(index), T::default()) };
            array.len += 1;
        }
        Ok(array)
    }

    /// The allocator this array takes its storage from.
    pub fn allocator(&self) -> &'a R {
        self.alloc
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `value`, doubling the capacity first if the array is full.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow. Allocation failure is reported through
    /// [`std::alloc::handle_alloc_error`].
    pub fn push(&mut self, value: T) {
        if self.len == self.cap {
            if let Err(err) = self.grow_for_push() {
                err.fail();
            }
        }
        unsafe { ptr::write(self.ptr.as_ptr().add(self.len), value) };
        self.len += 1;
    }

    /// Makes sure at least `additional` more elements fit without growing.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve(additional) {
            err.fail();
        }
    }

    /// Fallible [`DynArray::reserve`]. On error the array is unchanged.
    ///
    /// Grows to at least twice the current capacity, or exactly to
    /// `len + additional` if that is larger, so the result need not be a
    /// power of two.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(ArrayError::CapacityOverflow)?;
        if required <= self.cap {
            return Ok(());
        }
        self.try_grow(required.max(self.cap.saturating_mul(2)))
    }

    /// Appends clones of every element of `items`.
    pub fn extend_from_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        self.reserve(items.len());
        for item in items {
            self.push(item.clone());
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Reference to the element at `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`DynArray::len`].
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        &*self.ptr.as_ptr().add(index)
    }

    /// Mutable reference to the element at `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`DynArray::len`].
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        &mut *self.ptr.as_ptr().add(index)
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.as_slice())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.as_mut_slice())
    }

    fn grow_for_push(&mut self) -> Result<()> {
        let doubled = self
            .cap
            .checked_mul(2)
            .ok_or(ArrayError::CapacityOverflow)?;
        self.try_grow(doubled.max(1))
    }

    /// Moves the elements into a new block of `new_cap` elements. The new
    /// block is obtained before anything moves, so on error the array is
    /// left untouched.
    fn try_grow(&mut self, new_cap: usize) -> Result<()> {
        if new_cap <= self.cap {
            return Ok(());
        }

        let new_layout = Layout::array::<T>(new_cap).map_err(|_| ArrayError::CapacityOverflow)?;
        let new_ptr = self
            .alloc
            .allocate(new_layout)
            .map_err(|_| ArrayError::alloc_failed(new_layout))?
            .cast::<T>();

        tracing::trace!(
            len = self.len,
            from = self.cap,
            to = new_cap,
            "growing array"
        );

        // One element at a time: after the read the source slot is raw
        // storage and must not be dropped.
        for index in 0..self.len {
            unsafe {
                let moved = ptr::read(self.ptr.as_ptr().add(index));
                ptr::write(new_ptr.as_ptr().add(index), moved);
            }
        }

        self.release_storage();
        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }

    /// Gives the current block back to the allocator. Live elements must
    /// have been moved out or dropped already.
    fn release_storage(&mut self) {
        if self.cap == 0 {
            return;
        }
        // SAFETY: the same layout was successfully built when the block was
        // allocated.
        let layout = unsafe {
            Layout::from_size_align_unchecked(mem::size_of::<T>() * self.cap, mem::align_of::<T>())
        };
        unsafe { self.alloc.deallocate(self.ptr.cast(), layout) };
    }
}

impl<T, R: Allocator + ?Sized> Drop for DynArray<'_, T, R> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
        }
        self.release_storage();
    }
}

// Owns its elements and shares `&R`, like `Vec<T>` next to a `&R`.
unsafe impl<T: Send, R: Allocator + Sync + ?Sized> Send for DynArray<'_, T, R> {}
unsafe impl<T: Sync, R: Allocator + Sync + ?Sized> Sync for DynArray<'_, T, R> {}

impl<T, R: Allocator + ?Sized> Index<usize> for DynArray<'_, T, R> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T, R: Allocator + ?Sized> IndexMut<usize> for DynArray<'_, T, R> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<'s, T, R: Allocator + ?Sized> IntoIterator for &'s DynArray<'_, T, R> {
    type Item = &'s T;
    type IntoIter = Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, T, R: Allocator + ?Sized> IntoIterator for &'s mut DynArray<'_, T, R> {
    type Item = &'s mut T;
    type IntoIter = IterMut<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, R: Allocator + ?Sized> Extend<T> for DynArray<'_, T, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: fmt::Debug, R: Allocator + ?Sized> fmt::Debug for DynArray<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
