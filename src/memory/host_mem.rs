//! CPU-side shadow memory of a memory object.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::{self, NonNull};
use crate::error::ClResult;
use crate::Status;

/// Alignment of runtime-owned host allocations.
const HOST_ALIGN: usize = 256;


enum HostStorage {
    /// Memory supplied by the caller (`USE_HOST_PTR`).
    Borrowed,
    /// Memory allocated by the runtime (`ALLOC_HOST_PTR`).
    Owned(Layout),
}


/// A reference to the host copy of a memory object.
///
/// Owned if and only if the caller did not supply the memory.
pub struct HostMemoryReference {
    ptr: NonNull<u8>,
    size: usize,
    storage: HostStorage,
}

unsafe impl Send for HostMemoryReference {}
unsafe impl Sync for HostMemoryReference {}

impl HostMemoryReference {
    /// References caller memory.
    ///
    /// ### Safety
    ///
    /// `ptr` must stay valid for reads and writes of `size` bytes for the
    /// lifetime of the memory object.
    pub(crate) unsafe fn borrowed(ptr: *mut u8, size: usize) -> ClResult<HostMemoryReference> {
        let ptr = NonNull::new(ptr).ok_or(Status::CL_INVALID_HOST_PTR)?;
        Ok(HostMemoryReference { ptr, size, storage: HostStorage::Borrowed })
    }

    /// Allocates `size` zeroed bytes, optionally initialised from `init`.
    pub(crate) fn allocate(size: usize, init: Option<&[u8]>) -> ClResult<HostMemoryReference> {
        let layout = Layout::from_size_align(::std::cmp::max(size, 1), HOST_ALIGN)
            .map_err(|_| Status::CL_OUT_OF_HOST_MEMORY)?;
        let ptr = NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
            .ok_or(Status::CL_OUT_OF_HOST_MEMORY)?;

        if let Some(init) = init {
            let len = ::std::cmp::min(init.len(), size);
            unsafe { ptr::copy_nonoverlapping(init.as_ptr(), ptr.as_ptr(), len); }
        }

        Ok(HostMemoryReference { ptr, size, storage: HostStorage::Owned(layout) })
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if the memory was supplied by the caller.
    pub fn is_user_memory(&self) -> bool {
        match self.storage {
            HostStorage::Borrowed => true,
            HostStorage::Owned(_) => false,
        }
    }
}

impl Drop for HostMemoryReference {
    fn drop(&mut self) {
        if let HostStorage::Owned(layout) = self.storage {
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) }
        }
    }
}

impl fmt::Debug for HostMemoryReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HostMemoryReference")
            .field("ptr", &self.ptr)
            .field("size", &self.size)
            .field("user_memory", &self.is_user_memory())
            .finish()
    }
}
