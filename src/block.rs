use std::{alloc::Layout, ptr::NonNull};

/// A block of memory obtained from the backing allocator. The layout is the
/// one the block was originally reserved with, which is what we must give
/// back to the backing allocator when the block is finally released. It is
/// never shrunk when the block is reused for a smaller request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Block {
    pub ptr: NonNull<u8>,
    pub layout: Layout,
}

impl Block {
    /// Reserved size in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Whether this block can serve `layout`: large enough, and its address
    /// happens to be aligned for the request.
    pub fn fits(&self, layout: Layout) -> bool {
        self.size() >= layout.size() && self.ptr.as_ptr().align_offset(layout.align()) == 0
    }

    /// The whole reserved range, which is what we hand out.
    pub fn as_slice_ptr(&self) -> NonNull<[u8]> {
        NonNull::slice_from_raw_parts(self.ptr, self.size())
    }
}

/// Append-ordered sequence of block records. Order only matters for the
/// first-fit scan in [`BlockList::take_first_fit`].
#[derive(Debug, Default)]
pub(crate) struct BlockList {
    blocks: Vec<Block>,
}

impl BlockList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            blocks: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Removes and returns the first block, in insertion order, that fits
    /// `layout`. Remaining blocks keep their relative order.
    pub fn take_first_fit(&mut self, layout: Layout) -> Option<Block> {
        let index = self.blocks.iter().position(|block| block.fits(layout))?;
        Some(self.blocks.remove(index))
    }

    /// Removes and returns the block starting at `ptr`, if any.
    pub fn take_by_ptr(&mut self, ptr: NonNull<u8>) -> Option<Block> {
        let index = self.blocks.iter().position(|block| block.ptr == ptr)?;
        Some(self.blocks.remove(index))
    }

    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.blocks.iter().any(|block| block.ptr == ptr)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Block> {
        self.blocks.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(addr: usize, size: usize) -> Block {
        Block {
            ptr: NonNull::new(addr as *mut u8).unwrap(),
            layout: Layout::from_size_align(size, 1).unwrap(),
        }
    }

    #[test]
    fn first_fit_takes_earliest_large_enough_block() {
        let mut list = BlockList::default();
        list.push(block(0x1000, 16));
        list.push(block(0x2000, 64));
        list.push(block(0x3000, 128));

        let taken = list.take_first_fit(Layout::from_size_align(32, 1).unwrap());
        assert_eq!(taken, Some(block(0x2000, 64)));
        assert_eq!(list.len(), 2);
        assert!(list.contains(NonNull::new(0x3000 as *mut u8).unwrap()));
    }

    #[test]
    fn first_fit_skips_misaligned_blocks() {
        let mut list = BlockList::default();
        list.push(block(0x1001, 64));
        list.push(block(0x2000, 64));

        let taken = list.take_first_fit(Layout::from_size_align(8, 8).unwrap());
        assert_eq!(taken, Some(block(0x2000, 64)));
    }

    #[test]
    fn take_by_ptr_misses_unknown_address() {
        let mut list = BlockList::default();
        list.push(block(0x1000, 16));

        assert_eq!(list.take_by_ptr(NonNull::new(0x1008 as *mut u8).unwrap()), None);
        assert_eq!(list.len(), 1);
        assert_eq!(list.total_bytes(), 16);
    }
}
