//! Host-side OpenCL runtime: the memory-object model.
//!
//! This crate implements the part of an OpenCL implementation which sits
//! behind `clCreateBuffer`, `clCreateImage`, `clEnqueueMapBuffer` and
//! friends: reference-counted memory objects (buffers, sub-buffers, images,
//! image views, pipes), their per-device backing store, the map/unmap
//! protocol, and the bridges which wrap Direct3D 9/10/11 and OpenGL resources
//! as memory objects.
//!
//! Commands are executed by a small in-order host queue (one worker thread
//! per queue) against host-resident device allocations, which makes the whole
//! object model usable and testable without a GPU driver.
//!
//! ## Layout
//!
//! * [`functions`]: the `cl*`-shaped entry points. Every function validates its
//!   arguments, builds the right memory object or command and returns an
//!   [`Error`] carrying the OpenCL [`Status`] on failure.
//! * [`validate`]: stateless flag, pitch, region and overlap rules.
//! * [`memory`]: `Memory` and its `Buffer` / `Image` / `Pipe` shapes.
//! * [`interop`]: native resource bridges and the dedup registry.
//!
//! ### Official Documentation
//!
//! [OpenCL 2.0 Reference Pages](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/)
//!

#[macro_use] extern crate enum_primitive;
#[macro_use] extern crate bitflags;
#[macro_use] extern crate log;
pub extern crate ocl_runtime_sys as ffi;

mod error;
pub mod functions;
pub mod util;
pub mod types;
pub mod validate;
pub mod device;
mod platform;
mod context;
pub mod memory;
mod event;
mod queue;
mod command;
pub mod interop;
#[cfg(test)] mod tests;

pub use self::error::{Error, Result, ClResult, ErrorKind};
pub use self::functions::*;
pub use self::types::enums::*;
pub use self::types::structs::*;
pub use self::types::OclPrm;
pub use self::device::{Device, DeviceId, DeviceInfo, DeviceMemory, MapTarget, VirtualDevice};
pub use self::platform::Platform;
pub use self::context::{Context, ContextProperties};
pub use self::memory::{Mem, Memory, MemMap, AllocState};
pub use self::event::Event;
pub use self::queue::CommandQueue;
