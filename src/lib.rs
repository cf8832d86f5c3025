//! A block-reusing allocator and a growable array that takes all of its
//! storage from it.
//!
//! [`FreeListAllocator`] keeps every block it hands out. Deallocated blocks
//! are filed in a free list and the next request that fits is served from
//! there (first-fit) instead of from the backing allocator. Nothing is given
//! back to the system until the allocator itself is dropped.
//!
//! [`DynArray`] borrows an allocator, doubles its capacity when full and
//! returns the old block on every growth, which is exactly the pattern the
//! free list is good at.
//!
//! The allocator also implements the [`allocator_api2`] `Allocator` trait,
//! so the collections from that crate can use it too:
//!
//! ```
//! use allocator_api2::vec::Vec;
//! use blockpool::FreeListAllocator;
//!
//! let alloc = FreeListAllocator::new();
//! let mut v = Vec::new_in(&alloc);
//! v.push(42);
//! assert_eq!(alloc.outstanding_blocks(), 1);
//! ```

mod allocator;
mod array;
mod block;
pub mod error;
pub mod iter;

pub use allocator::{AllocatorStats, FreeListAllocator};
pub use array::DynArray;
pub use error::ArrayError;
pub use iter::{Iter, IterMut};
