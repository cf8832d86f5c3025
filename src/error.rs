//! Errors reported by the fallible array operations.

use std::alloc::Layout;

/// Errors that can occur while growing a [`crate::DynArray`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArrayError {
    /// The requested element count does not fit in a valid `Layout`.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator could not provide a block for the new storage.
    #[error("memory allocation of {size} bytes (align {align}) failed")]
    AllocFailed {
        /// Size of the block that was requested.
        size: usize,
        /// Alignment of the block that was requested.
        align: usize,
    },
}

impl ArrayError {
    pub(crate) fn alloc_failed(layout: Layout) -> Self {
        Self::AllocFailed {
            size: layout.size(),
            align: layout.align(),
        }
    }

    /// Turns the error into the fatal outcome used by the infallible
    /// operations.
    pub(crate) fn fail(self) -> ! {
        match self {
            Self::CapacityOverflow => panic!("capacity overflow"),
            Self::AllocFailed { size, align } => match Layout::from_size_align(size, align) {
                Ok(layout) => std::alloc::handle_alloc_error(layout),
                Err(_) => panic!("{self}"),
            },
        }
    }
}

/// Result alias for fallible array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_failed_reports_layout() {
        let layout = Layout::from_size_align(64, 8).unwrap();
        let err = ArrayError::alloc_failed(layout);
        assert_eq!(err, ArrayError::AllocFailed { size: 64, align: 8 });
        assert_eq!(err.to_string(), "memory allocation of 64 bytes (align 8) failed");
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn capacity_overflow_is_fatal() {
        ArrayError::CapacityOverflow.fail();
    }
}
