use std::{
    alloc::Layout,
    cell::{Cell, RefCell},
    fmt,
    ptr::{self, NonNull},
};

use allocator_api2::alloc::{AllocError, Allocator, Global};

use crate::block::{Block, BlockList};

/// Snapshot of the allocator bookkeeping, see [`FreeListAllocator::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Blocks currently handed out.
    pub outstanding_blocks: usize,
    /// Reserved bytes of the blocks currently handed out.
    pub outstanding_bytes: usize,
    /// Blocks returned and waiting to be reused.
    pub retired_blocks: usize,
    /// Reserved bytes of the retired blocks.
    pub retired_bytes: usize,
    /// Requests that had to go to the backing allocator.
    pub fresh_allocations: usize,
    /// Requests served from a retired block.
    pub reuses: usize,
    /// Deallocations of pointers that were not outstanding. These are
    /// ignored.
    pub unknown_deallocations: usize,
}

/// Allocator that never gives memory back to its backing allocator while it
/// is alive. Returned blocks are filed as "retired" and handed out again to
/// the first later request they can satisfy (first-fit, no splitting, no
/// coalescing). Everything is released at once when the allocator is
/// dropped.
///
/// Bookkeeping is two append-ordered lists scanned linearly, so allocation
/// and deallocation are O(n) in the number of tracked blocks.
///
/// The allocator is single-threaded: it uses `RefCell` internally and is
/// neither `Send` nor `Sync`. Any number of containers on the same thread may
/// share it by reference.
///
/// # Dropping
///
/// Dropping the allocator frees every block it ever handed out, outstanding
/// or retired. Anything still pointing into those blocks dangles afterwards.
/// Containers that borrow the allocator (like [`crate::DynArray`]) cannot
/// outlive it, so this only matters for raw pointers obtained through
/// [`FreeListAllocator::allocate_bytes`] or the [`Allocator`] impl.
pub struct FreeListAllocator<A: Allocator = Global> {
    outstanding: RefCell<BlockList>,
    retired: RefCell<BlockList>,
    backing: A,
    fresh_allocations: Cell<usize>,
    reuses: Cell<usize>,
    unknown_deallocations: Cell<usize>,
}

impl FreeListAllocator {
    /// Creates an empty allocator backed by the global allocator.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Like [`FreeListAllocator::new`], with room for `capacity` block records
    /// in each list before the bookkeeping itself reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }
}

impl Default for FreeListAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator> FreeListAllocator<A> {
    /// Creates an empty allocator that obtains fresh blocks from `backing`.
    pub fn new_in(backing: A) -> Self {
        Self::with_capacity_in(0, backing)
    }

    pub fn with_capacity_in(capacity: usize, backing: A) -> Self {
        Self {
            outstanding: RefCell::new(BlockList::with_capacity(capacity)),
            retired: RefCell::new(BlockList::with_capacity(capacity)),
            backing,
            fresh_allocations: Cell::new(0),
            reuses: Cell::new(0),
            unknown_deallocations: Cell::new(0),
        }
    }

    /// The allocator fresh blocks come from.
    pub fn backing(&self) -> &A {
        &self.backing
    }

    /// Allocates at least `bytes` bytes with no alignment requirement. A
    /// request for zero bytes still gets its own one-byte block.
    pub fn allocate_bytes(&self, bytes: usize) -> Result<NonNull<u8>, AllocError> {
        let layout = Layout::from_size_align(bytes, 1).map_err(|_| AllocError)?;
        self.grant(layout).map(|block| block.ptr)
    }

    /// Returns a block obtained from this allocator so it can be reused.
    ///
    /// `bytes` is ignored, the recorded size of the block is used instead.
    /// Pointers that are not currently outstanding are silently ignored.
    /// Nothing is freed here, so this is safe to call with any pointer, but
    /// the caller must not touch the block again.
    pub fn deallocate_bytes(&self, ptr: NonNull<u8>, _bytes: usize) {
        self.retire(ptr);
    }

    /// Two allocators are equal only if they are the same instance. Memory
    /// from one can never be returned to another.
    pub fn is_equal(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }

    /// Whether `ptr` is the start of a block currently handed out.
    pub fn is_outstanding(&self, ptr: NonNull<u8>) -> bool {
        self.outstanding.borrow().contains(ptr)
    }

    /// Whether `ptr` is the start of a block waiting to be reused.
    pub fn is_retired(&self, ptr: NonNull<u8>) -> bool {
        self.retired.borrow().contains(ptr)
    }

    pub fn outstanding_blocks(&self) -> usize {
        self.outstanding.borrow().len()
    }

    pub fn retired_blocks(&self) -> usize {
        self.retired.borrow().len()
    }

    pub fn stats(&self) -> AllocatorStats {
        let outstanding = self.outstanding.borrow();
        let retired = self.retired.borrow();

        AllocatorStats {
            outstanding_blocks: outstanding.len(),
            outstanding_bytes: outstanding.total_bytes(),
            retired_blocks: retired.len(),
            retired_bytes: retired.total_bytes(),
            fresh_allocations: self.fresh_allocations.get(),
            reuses: self.reuses.get(),
            unknown_deallocations: self.unknown_deallocations.get(),
        }
    }

    /// First-fit over the retired blocks, falling back to the backing
    /// allocator.
    fn grant(&self, layout: Layout) -> Result<Block, AllocError> {
        // Zero sized requests get a real block so every outstanding pointer
        // is distinct and can be deallocated on its own.
        let layout = if layout.size() == 0 {
            Layout::from_size_align(1, layout.align()).map_err(|_| AllocError)?
        } else {
            layout
        };

        let reused = self.retired.borrow_mut().take_first_fit(layout);
        if let Some(block) = reused {
            tracing::trace!(
                ptr = ?block.ptr,
                requested = layout.size(),
                size = block.size(),
                "reused block"
            );
            self.outstanding.borrow_mut().push(block);
            self.reuses.set(self.reuses.get() + 1);
            return Ok(block);
        }

        let ptr = self.backing.allocate(layout)?;
        let block = Block {
            ptr: ptr.cast(),
            layout,
        };

        tracing::debug!(ptr = ?block.ptr, size = block.size(), "allocated new block");
        self.outstanding.borrow_mut().push(block);
        self.fresh_allocations.set(self.fresh_allocations.get() + 1);

        Ok(block)
    }

    /// Moves the block at `ptr` from the outstanding list to the retired list.
    fn retire(&self, ptr: NonNull<u8>) {
        let block = self.outstanding.borrow_mut().take_by_ptr(ptr);
        match block {
            Some(block) => {
                tracing::debug!(ptr = ?block.ptr, size = block.size(), "retired block");
                self.retired.borrow_mut().push(block);
            }
            None => {
                // Lenient on purpose: the pointer is neither moved nor freed.
                tracing::warn!(ptr = ?ptr, "deallocation of unknown pointer ignored");
                self.unknown_deallocations
                    .set(self.unknown_deallocations.get() + 1);
            }
        }
    }
}

unsafe impl<A: Allocator> Allocator for FreeListAllocator<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.grant(layout).map(|block| block.as_slice_ptr())
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, _layout: Layout) {
        self.retire(ptr);
    }
}

impl<A: Allocator> PartialEq for FreeListAllocator<A> {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl<A: Allocator> Eq for FreeListAllocator<A> {}

impl<A: Allocator> fmt::Debug for FreeListAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeListAllocator")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl<A: Allocator> Drop for FreeListAllocator<A> {
    fn drop(&mut self) {
        let outstanding = self.outstanding.get_mut();
        let retired = self.retired.get_mut();

        tracing::debug!(
            outstanding = outstanding.len(),
            retired = retired.len(),
            "releasing all blocks"
        );

        for block in outstanding.drain().chain(retired.drain()) {
            unsafe { self.backing.deallocate(block.ptr, block.layout) }
        }
    }
}
