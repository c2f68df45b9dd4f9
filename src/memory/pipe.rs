//! Pipes.
//!
//! A pipe is a buffer holding a small header followed by `max_packets`
//! packet slots. The header is three native-endian `u64`s: read index,
//! write index and packet capacity.

use std::mem;
use crate::device::Device;
use crate::error::ClResult;
use crate::memory::{BufferDesc, Memory};
use crate::Status;

/// Size of the pipe header in bytes.
pub const PIPE_HEADER_SIZE: usize = 3 * mem::size_of::<u64>();


/// Pipe-specific state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipeDesc {
    pub(crate) packet_size: u32,
    pub(crate) max_packets: u32,
}

impl PipeDesc {
    /// Validates the packet geometry and returns the descriptor with the
    /// total byte size of the pipe.
    pub(crate) fn new(devices: &[Device], packet_size: u32, max_packets: u32)
            -> ClResult<(PipeDesc, usize)> {
        if packet_size == 0 || max_packets == 0
            || !devices.iter().any(|d| packet_size <= d.info().pipe_max_packet_size)
        {
            return Err(Status::CL_INVALID_PIPE_SIZE);
        }

        let size = (packet_size as usize).checked_mul(max_packets as usize)
            .and_then(|s| s.checked_add(PIPE_HEADER_SIZE))
            .ok_or(Status::CL_INVALID_PIPE_SIZE)?;

        Ok((PipeDesc { packet_size, max_packets }, size))
    }
}


/// A pipe view of a memory object.
#[derive(Clone, Copy, Debug)]
pub struct Pipe<'a> {
    mem: &'a Memory,
    buffer: &'a BufferDesc,
    desc: &'a PipeDesc,
}

impl<'a> Pipe<'a> {
    pub(crate) fn new(mem: &'a Memory, buffer: &'a BufferDesc, desc: &'a PipeDesc) -> Pipe<'a> {
        Pipe { mem, buffer, desc }
    }

    pub fn memory(&self) -> &'a Memory {
        self.mem
    }

    pub fn packet_size(&self) -> u32 {
        self.desc.packet_size
    }

    pub fn max_packets(&self) -> u32 {
        self.desc.max_packets
    }

    /// Bytes available for packets.
    pub fn capacity(&self) -> usize {
        self.desc.packet_size as usize * self.desc.max_packets as usize
    }

    pub fn buffer_desc(&self) -> &'a BufferDesc {
        self.buffer
    }
}


/// Initial header bytes of an empty pipe.
pub(crate) fn pipe_header(desc: &PipeDesc) -> [u8; PIPE_HEADER_SIZE] {
    let mut header = [0u8; PIPE_HEADER_SIZE];
    let capacity = (desc.max_packets as u64).to_ne_bytes();
    header[2 * mem::size_of::<u64>()..].copy_from_slice(&capacity);
    header
}
