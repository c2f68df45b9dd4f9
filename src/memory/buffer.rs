//! Buffers and sub-buffers.

use std::sync::Arc;
use crate::error::ClResult;
use crate::memory::{MemKind, Memory, MemoryInit};
use crate::util;
use crate::validate;
use crate::{BufferRegion, BusAddress, MemFlags, MemObjectType, Status};


/// Buffer-specific state.
#[derive(Clone, Debug, Default)]
pub struct BufferDesc {
    /// Bus addresses of external physical or bus addressable memory.
    pub(crate) bus_address: Option<BusAddress>,
}

impl BufferDesc {
    pub(crate) fn with_bus_address(bus_address: BusAddress) -> BufferDesc {
        BufferDesc { bus_address: Some(bus_address) }
    }
}


/// A buffer view of a memory object.
#[derive(Clone, Copy, Debug)]
pub struct Buffer<'a> {
    mem: &'a Memory,
    desc: &'a BufferDesc,
}

impl<'a> Buffer<'a> {
    pub(crate) fn new(mem: &'a Memory, desc: &'a BufferDesc) -> Buffer<'a> {
        Buffer { mem, desc }
    }

    pub fn memory(&self) -> &'a Memory {
        self.mem
    }

    pub fn size(&self) -> usize {
        self.mem.size()
    }

    /// Bus addresses of an external physical buffer, or of the device
    /// allocation of a bus addressable one.
    pub fn bus_address(&self) -> Option<BusAddress> {
        if self.desc.bus_address.is_some() {
            return self.desc.bus_address;
        }
        if !self.mem.mem_flags().contains(MemFlags::BUS_ADDRESSABLE_AMD) {
            return None;
        }

        let size = self.mem.size();
        let device = self.mem.context().devices().iter().find(|d| d.can_allocate(size))?;
        let (dev_mem, base) = self.mem.get_device_memory(device, false).ok()??;
        let surface = dev_mem.as_ptr() as u64 + base as u64;
        Some(BusAddress {
            surface_bus_address: surface,
            marker_bus_address: surface + size as u64,
        })
    }

    /// Checks a byte region against the buffer bounds.
    ///
    /// Only the first coordinate is meaningful: its extent must be non-zero
    /// and end inside the buffer. The other two must have origin 0 and
    /// extent 1. Bounds are relative to this object, not to a parent.
    pub fn validate_region(&self, origin: [usize; 3], region: [usize; 3]) -> ClResult<()> {
        let end = origin[0].checked_add(region[0]).ok_or(Status::CL_INVALID_VALUE)?;

        if region[0] == 0 || end > self.mem.size()
            || origin[1] != 0 || origin[2] != 0 || region[1] != 1 || region[2] != 1
        {
            return Err(Status::CL_INVALID_VALUE);
        }
        Ok(())
    }

    /// Returns true if the region is valid and covers the whole buffer.
    pub fn is_entirely_covered(&self, origin: [usize; 3], region: [usize; 3]) -> bool {
        self.validate_region(origin, region).is_ok()
            && origin[0] == 0 && region[0] == self.mem.size()
    }
}


/// Creates a sub-buffer of `parent` covering `region`.
///
/// The region origin must be aligned to the base address alignment of at
/// least one device in the context.
pub(crate) fn create_sub_buffer(parent: &Arc<Memory>, flags: MemFlags, region: BufferRegion)
        -> ClResult<Arc<Memory>> {
    if parent.mem_type() != MemObjectType::Buffer || parent.parent().is_some() {
        return Err(Status::CL_INVALID_MEM_OBJECT);
    }

    validate::validate_flags(flags, true)?;
    validate::validate_matching_buffer_flags(parent.mem_flags(), flags)?;

    if region.size == 0 {
        return Err(Status::CL_INVALID_BUFFER_SIZE);
    }
    match region.origin.checked_add(region.size) {
        Some(end) if end <= parent.size() => (),
        _ => return Err(Status::CL_INVALID_VALUE),
    }

    let aligned = parent.context().devices().iter()
        .any(|d| util::is_aligned(region.origin, d.mem_base_addr_align_bytes()));
    if !aligned {
        return Err(Status::CL_MISALIGNED_SUB_BUFFER_OFFSET);
    }

    let flags = validate::inherit_mem_flags(flags, parent.mem_flags());
    let sub = Arc::new(Memory::new(MemoryInit::view(parent, region.origin,
        MemObjectType::Buffer, flags, region.size, MemKind::Buffer(BufferDesc::default()))));
    sub.create(None, true)?;
    parent.add_sub_buffer(&sub);

    debug!("Memory {}: sub-buffer {} at [{}, {}).", parent.id(), sub.id(), region.origin,
        region.origin + region.size);
    Ok(sub)
}
