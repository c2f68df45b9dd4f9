//! AMD memory extensions: persistent memory, external physical memory and
//! bus-addressable memory.

#![allow(non_camel_case_types, dead_code, non_upper_case_globals)]

use crate::cl_h::{cl_bitfield, cl_ulong};

// cl_mem_flags - vendor bits
pub const CL_MEM_USE_PERSISTENT_MEM_AMD: cl_bitfield = 1 << 6;
pub const CL_MEM_EXTERNAL_PHYSICAL_AMD: cl_bitfield = 1 << 14;
pub const CL_MEM_BUS_ADDRESSABLE_AMD: cl_bitfield = 1 << 30;

/// Bus address pair describing an externally visible physical allocation.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct cl_bus_address_amd {
    pub surface_bus_address: cl_ulong,
    pub marker_bus_address: cl_ulong,
}
