//! Memory objects: buffers, sub-buffers, images, image views and pipes.
//!
//! A `Memory` is shared through `Arc`. The API reference count is tracked
//! separately and moved by `Mem` handles (clone retains, drop releases).
//! Commands and child objects hold plain `Arc<Memory>`s, so an object whose
//! API count reached zero lives on until in-flight commands and views let go
//! of it. Teardown runs in `Drop`: destructor callbacks first (newest
//! first), then the backing store.
//!
//! Bytes live in exactly one of three places, given by `Storage`:
//!
//! * `Owned`: per-device allocations owned by this object, created lazily
//!   and kept coherent through a version counter and the last writer.
//! * `View`: a window into the parent's storage at `origin`.
//! * `Svm`: a window into a shared virtual memory allocation.
//!
//! Coherency state only exists on `Owned` objects. Views and SVM wrappers
//! forward to their root.

mod host_mem;
mod buffer;
mod image;
mod pipe;

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use parking_lot::Mutex;
use crate::context::Context;
use crate::device::{Device, DeviceId, DeviceMemory, MapTarget, VirtualDevice};
use crate::error::ClResult;
use crate::event::Event;
use crate::interop::InteropBinding;
use crate::util::Rect;
use crate::{MapFlags, MemFlags, MemObjectType, OclPrm, Status};

pub use self::host_mem::HostMemoryReference;
pub use self::buffer::{Buffer, BufferDesc};
pub use self::image::{Image, ImageDesc};
pub use self::pipe::{Pipe, PipeDesc, PIPE_HEADER_SIZE};
pub(crate) use self::buffer::create_sub_buffer;
pub(crate) use self::image::{create_image_view, fill_pattern, resolve_mip_level};
pub(crate) use self::pipe::pipe_header;

static NEXT_MEM_ID: AtomicU64 = AtomicU64::new(1);


/// Allocation state of a memory object on one device.
///
/// `Init -> Created -> Complete`, and `Complete -> Realloced` when the
/// allocation is replaced. No transition skips `Created`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocState {
    /// Nothing allocated yet.
    Init,
    /// Allocation requested but not (yet successfully) initialised.
    Created,
    /// Allocated and initialised.
    Complete,
    /// Replaced by a fresh allocation after being complete.
    Realloced,
}


struct DeviceBacking {
    state: AllocState,
    mem: Option<Arc<DeviceMemory>>,
    /// Version of the contents this allocation holds.
    version: u64,
}

impl DeviceBacking {
    fn new() -> DeviceBacking {
        DeviceBacking { state: AllocState::Init, mem: None, version: 0 }
    }
}


/// Per-device allocations and cross-device coherency state of a root
/// object.
struct Residency {
    backings: HashMap<DeviceId, DeviceBacking>,
    last_writer: Option<DeviceId>,
    /// Bumped by every device write.
    version: u64,
}

impl Residency {
    fn current_source(&self, except: DeviceId) -> Option<Arc<DeviceMemory>> {
        let writer = self.last_writer.filter(|&w| w != except)?;
        self.backings.get(&writer).and_then(|b| b.mem.clone())
    }
}


/// Where the bytes of a memory object live.
pub(crate) enum Storage {
    Owned(Mutex<Residency>),
    View,
    Svm { mem: Arc<DeviceMemory>, offset: usize },
}

impl Storage {
    pub(crate) fn owned() -> Storage {
        Storage::Owned(Mutex::new(Residency {
            backings: HashMap::new(),
            last_writer: None,
            version: 0,
        }))
    }
}


/// Shape-specific part of a memory object.
#[derive(Debug)]
pub(crate) enum MemKind {
    Buffer(BufferDesc),
    Image(ImageDesc),
    Pipe(BufferDesc, PipeDesc),
}


/// An outstanding mapping.
#[derive(Clone)]
pub(crate) struct MapEntry {
    /// Byte rect inside the object, relative to its own origin.
    pub rect: Rect,
    pub flags: MapFlags,
    pub target: MapTarget,
    /// The target points into host memory rather than device memory.
    pub host_backed: bool,
    pub dev_mem: Arc<DeviceMemory>,
    /// Offset of the object's first byte in `dev_mem`.
    pub dev_base: usize,
}

impl MapEntry {
    /// Returns true if the target is not the device allocation itself and
    /// must be copied on map and unmap.
    pub fn needs_copy(&self) -> bool {
        self.host_backed || self.target.staged
    }
}


type DestructorCallback = Box<dyn FnOnce(&Memory) + Send>;

/// State guarded by the per-object operations lock.
struct MemoryOps {
    sub_buffers: Vec<Weak<Memory>>,
    destructors: Vec<DestructorCallback>,
}


/// Construction parameters of a `Memory`.
pub(crate) struct MemoryInit {
    pub context: Context,
    pub mem_type: MemObjectType,
    pub flags: MemFlags,
    pub size: usize,
    pub kind: MemKind,
    pub host_mem: Option<HostMemoryReference>,
    pub storage: Storage,
    /// Parent object and byte origin inside it.
    pub parent: Option<(Arc<Memory>, usize)>,
    pub interop: Option<InteropBinding>,
}

impl MemoryInit {
    /// Parameters of a root object with its own storage.
    pub fn root(context: &Context, mem_type: MemObjectType, flags: MemFlags, size: usize,
            kind: MemKind) -> MemoryInit {
        MemoryInit {
            context: context.clone(),
            mem_type,
            flags,
            size,
            kind,
            host_mem: None,
            storage: Storage::owned(),
            parent: None,
            interop: None,
        }
    }

    /// Parameters of a view at `origin` into `parent`.
    pub fn view(parent: &Arc<Memory>, origin: usize, mem_type: MemObjectType, flags: MemFlags,
            size: usize, kind: MemKind) -> MemoryInit {
        MemoryInit {
            context: parent.context().clone(),
            mem_type,
            flags,
            size,
            kind,
            host_mem: None,
            storage: Storage::View,
            parent: Some((parent.clone(), origin)),
            interop: None,
        }
    }
}


/// A memory object.
pub struct Memory {
    id: u64,
    context: Context,
    mem_type: MemObjectType,
    flags: MemFlags,
    size: usize,
    origin: usize,
    parent: Option<Arc<Memory>>,
    host_mem: Option<HostMemoryReference>,
    storage: Storage,
    kind: MemKind,
    interop: Option<InteropBinding>,
    ref_count: AtomicU32,
    map_count: AtomicU32,
    maps: Mutex<Vec<MapEntry>>,
    ops: Mutex<MemoryOps>,
    virtual_device: Mutex<Option<VirtualDevice>>,
}

impl Memory {
    pub(crate) fn new(init: MemoryInit) -> Memory {
        let (parent, origin) = match init.parent {
            Some((parent, origin)) => (Some(parent), origin),
            None => (None, 0),
        };
        debug_assert!(parent.is_some() == match init.storage { Storage::View => true, _ => false });

        Memory {
            id: NEXT_MEM_ID.fetch_add(1, Ordering::Relaxed),
            context: init.context,
            mem_type: init.mem_type,
            flags: init.flags,
            size: init.size,
            origin,
            parent,
            host_mem: init.host_mem,
            storage: init.storage,
            kind: init.kind,
            interop: init.interop,
            ref_count: AtomicU32::new(0),
            map_count: AtomicU32::new(0),
            maps: Mutex::new(Vec::new()),
            ops: Mutex::new(MemoryOps { sub_buffers: Vec::new(), destructors: Vec::new() }),
            virtual_device: Mutex::new(None),
        }
    }

    /// Establishes the backing store strategy.
    ///
    /// Fails with `CL_MEM_OBJECT_ALLOCATION_FAILURE` if no device of the
    /// context can hold the object. `init_from` bytes are written to the
    /// first such device right away; without them allocation is deferred to
    /// first use unless `skip_alloc` is false. A failed call leaves the
    /// object safe to drop.
    pub(crate) fn create(&self, init_from: Option<&[u8]>, skip_alloc: bool) -> ClResult<()> {
        if let Storage::Owned(_) = self.storage {
            let device = self.context.devices().iter()
                .find(|d| d.can_allocate(self.size))
                .ok_or(Status::CL_MEM_OBJECT_ALLOCATION_FAILURE)?;

            if init_from.is_some() || !skip_alloc {
                let (dev_mem, base) = self.get_device_memory(device, true)?
                    .ok_or(Status::CL_MEM_OBJECT_ALLOCATION_FAILURE)?;

                if let Some(init) = init_from {
                    let len = ::std::cmp::min(init.len(), self.size);
                    unsafe {
                        ptr::copy_nonoverlapping(init.as_ptr(), dev_mem.as_ptr().add(base), len);
                    }
                    self.signal_write(device.id());
                }
            }
        }

        debug!("Memory {}: created {:?} of {} bytes (flags: {:?}).", self.id, self.mem_type,
            self.size, self.flags);
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn mem_type(&self) -> MemObjectType {
        self.mem_type
    }

    pub fn mem_flags(&self) -> MemFlags {
        self.flags
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte offset into the parent; zero for root objects.
    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn parent(&self) -> Option<&Arc<Memory>> {
        self.parent.as_ref()
    }

    pub fn interop(&self) -> Option<&InteropBinding> {
        self.interop.as_ref()
    }

    pub fn host_mem(&self) -> Option<&HostMemoryReference> {
        self.host_mem.as_ref()
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Acquire)
    }

    pub fn map_count(&self) -> u32 {
        self.map_count.load(Ordering::Acquire)
    }

    pub fn as_buffer(&self) -> Option<Buffer> {
        match self.kind {
            MemKind::Buffer(ref desc) | MemKind::Pipe(ref desc, _) => Some(Buffer::new(self, desc)),
            MemKind::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<Image> {
        match self.kind {
            MemKind::Image(ref desc) => Some(Image::new(self, desc)),
            _ => None,
        }
    }

    pub fn as_pipe(&self) -> Option<Pipe> {
        match self.kind {
            MemKind::Pipe(ref buffer, ref desc) => Some(Pipe::new(self, buffer, desc)),
            _ => None,
        }
    }

    /// Returns true if the bytes live in an SVM allocation.
    pub fn uses_svm_pointer(&self) -> bool {
        match self.storage {
            Storage::Svm { .. } => true,
            Storage::View => self.parent.as_ref().map_or(false, |p| p.uses_svm_pointer()),
            Storage::Owned(_) => false,
        }
    }

    /// Identity of the underlying storage and this object's byte offset in
    /// it. Objects sharing bytes report the same identity.
    pub fn storage_key(&self) -> (usize, usize) {
        match self.storage {
            Storage::Owned(_) => (self as *const Memory as usize, 0),
            Storage::Svm { ref mem, offset } => (mem.as_ptr() as usize, offset),
            Storage::View => match self.parent {
                Some(ref parent) => {
                    let (key, base) = parent.storage_key();
                    (key, base + self.origin)
                },
                None => (self as *const Memory as usize, 0),
            },
        }
    }

    /// Host memory address of this object's first byte, for objects backed
    /// by host memory directly or through their parent.
    pub(crate) fn host_target(&self) -> Option<*mut u8> {
        if let Some(ref host) = self.host_mem {
            return Some(host.as_ptr());
        }
        match self.storage {
            Storage::View => self.parent.as_ref()
                .and_then(|p| p.host_target())
                .map(|ptr| unsafe { ptr.add(self.origin) }),
            _ => None,
        }
    }

    fn view_parent(&self) -> ClResult<&Arc<Memory>> {
        self.parent.as_ref().ok_or(Status::CL_INVALID_MEM_OBJECT)
    }

    //=========================================================================
    //========================= REFERENCE COUNTING ============================
    //=========================================================================

    /// Increments the API reference count, returning the new count.
    pub(crate) fn retain(&self) -> u32 {
        self.ref_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the API reference count, returning the new count. Fails
    /// with `CL_INVALID_MEM_OBJECT` if it already is zero.
    pub(crate) fn release(&self) -> ClResult<u32> {
        let mut count = self.ref_count.load(Ordering::Acquire);
        loop {
            if count == 0 {
                return Err(Status::CL_INVALID_MEM_OBJECT);
            }
            match self.ref_count.compare_exchange_weak(count, count - 1, Ordering::AcqRel,
                    Ordering::Acquire) {
                Ok(_) => return Ok(count - 1),
                Err(actual) => count = actual,
            }
        }
    }

    /// Registers a callback run right before the backing store is released.
    /// Callbacks run newest first.
    pub fn set_destructor_callback<F>(&self, callback: F)
            where F: FnOnce(&Memory) + Send + 'static {
        self.ops.lock().destructors.push(Box::new(callback));
    }

    //=========================================================================
    //============================ SUB-BUFFERS ================================
    //=========================================================================

    pub(crate) fn add_sub_buffer(&self, child: &Arc<Memory>) {
        self.ops.lock().sub_buffers.push(Arc::downgrade(child));
    }

    /// Number of live sub-buffers and views.
    pub fn sub_buffer_count(&self) -> usize {
        self.ops.lock().sub_buffers.iter().filter(|w| w.strong_count() > 0).count()
    }

    /// Returns true if this object or any live descendant is mapped.
    pub(crate) fn is_mapped_tree(&self) -> bool {
        if self.map_count() > 0 {
            return true;
        }
        let children: Vec<Arc<Memory>> = self.ops.lock().sub_buffers.iter()
            .filter_map(|w| w.upgrade())
            .collect();
        children.iter().any(|c| c.is_mapped_tree())
    }

    //=========================================================================
    //============================== MAPPING ==================================
    //=========================================================================

    pub(crate) fn inc_map_count(&self) -> u32 {
        self.map_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn dec_map_count(&self) -> u32 {
        let prev = self.map_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0);
        prev.saturating_sub(1)
    }

    pub(crate) fn add_map_entry(&self, entry: MapEntry) {
        self.maps.lock().push(entry);
    }

    /// Removes and returns the mapping whose host address is `ptr`.
    pub(crate) fn take_map_entry(&self, ptr: *const u8) -> Option<MapEntry> {
        let mut maps = self.maps.lock();
        let idx = maps.iter().position(|m| m.target.ptr.as_ptr() as *const u8 == ptr)?;
        Some(maps.swap_remove(idx))
    }

    pub fn virtual_device(&self) -> Option<VirtualDevice> {
        *self.virtual_device.lock()
    }

    pub(crate) fn set_virtual_device(&self, vdev: VirtualDevice) {
        *self.virtual_device.lock() = Some(vdev);
    }

    //=========================================================================
    //======================== DEVICE BACKING STORE ===========================
    //=========================================================================

    /// Returns the allocation holding this object on `device` and the
    /// object's byte offset inside it.
    ///
    /// With `alloc` the allocation is created (and initialised from the last
    /// writing device or the host copy) on first use; without it nothing is
    /// allocated and `None` is returned if there is no allocation yet.
    pub fn get_device_memory(&self, device: &Device, alloc: bool)
            -> ClResult<Option<(Arc<DeviceMemory>, usize)>> {
        match self.storage {
            Storage::Owned(ref residency) => {
                let mut res = residency.lock();
                if let Some(mem) = res.backings.get(&device.id()).and_then(|b| b.mem.clone()) {
                    return Ok(Some((mem, 0)));
                }
                if !alloc {
                    return Ok(None);
                }
                self.materialize(&mut res, device).map(|mem| Some((mem, 0)))
            },
            Storage::View => {
                let origin = self.origin;
                Ok(self.view_parent()?.get_device_memory(device, alloc)?
                    .map(|(mem, base)| (mem, base + origin)))
            },
            Storage::Svm { ref mem, offset } => Ok(Some((mem.clone(), offset))),
        }
    }

    /// Allocation state on `device`. Views report their root's state; SVM
    /// wrappers are always complete.
    pub fn alloc_state(&self, device: DeviceId) -> AllocState {
        match self.storage {
            Storage::Owned(ref residency) => residency.lock().backings.get(&device)
                .map_or(AllocState::Init, |b| b.state),
            Storage::View => self.parent.as_ref()
                .map_or(AllocState::Init, |p| p.alloc_state(device)),
            Storage::Svm { .. } => AllocState::Complete,
        }
    }

    fn materialize(&self, res: &mut Residency, device: &Device) -> ClResult<Arc<DeviceMemory>> {
        let source = res.current_source(device.id());
        let version = res.version;

        let backing = res.backings.entry(device.id()).or_insert_with(DeviceBacking::new);
        backing.state = AllocState::Created;

        let mem = DeviceMemory::allocate(device, self.size)?;
        unsafe {
            match (source, self.host_mem.as_ref()) {
                (Some(src), _) => {
                    ptr::copy_nonoverlapping(src.as_ptr(), mem.as_ptr(), self.size);
                },
                (None, Some(host)) => {
                    let len = ::std::cmp::min(host.size(), self.size);
                    ptr::copy_nonoverlapping(host.as_ptr(), mem.as_ptr(), len);
                },
                (None, None) => (),
            }
        }

        backing.mem = Some(mem.clone());
        backing.state = AllocState::Complete;
        backing.version = version;
        debug!("Memory {}: materialised {} bytes on device {}.", self.id, self.size,
            device.id().as_usize());
        Ok(mem)
    }

    /// Brings the allocation on `device` up to date with the last writer,
    /// allocating it if necessary.
    pub(crate) fn sync_for_device(&self, device: &Device) -> ClResult<()> {
        match self.storage {
            Storage::Owned(ref residency) => {
                let mut guard = residency.lock();
                let res = &mut *guard;
                let version = res.version;

                match res.backings.get(&device.id()).map(|b| (b.mem.is_some(), b.version)) {
                    Some((true, synced)) if synced >= version => return Ok(()),
                    Some((true, _)) => (),
                    _ => {
                        self.materialize(res, device)?;
                        return Ok(());
                    },
                }

                if let Some(src) = res.current_source(device.id()) {
                    if let Some(backing) = res.backings.get_mut(&device.id()) {
                        if let Some(ref dst) = backing.mem {
                            unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), self.size); }
                        }
                        backing.version = version;
                        trace!("Memory {}: synced device {} from device {:?}.", self.id,
                            device.id().as_usize(), res.last_writer);
                    }
                }
                Ok(())
            },
            Storage::View => self.view_parent()?.sync_for_device(device),
            Storage::Svm { .. } => Ok(()),
        }
    }

    /// Marks `device` as holding the newest contents.
    pub(crate) fn signal_write(&self, device: DeviceId) {
        match self.storage {
            Storage::Owned(ref residency) => {
                let mut guard = residency.lock();
                let res = &mut *guard;
                res.version += 1;
                res.last_writer = Some(device);
                if let Some(backing) = res.backings.get_mut(&device) {
                    backing.version = res.version;
                }
            },
            Storage::View => {
                if let Some(ref parent) = self.parent {
                    parent.signal_write(device);
                }
            },
            Storage::Svm { .. } => (),
        }
    }

    /// The device which wrote the contents last.
    pub fn last_writer(&self) -> Option<DeviceId> {
        match self.storage {
            Storage::Owned(ref residency) => residency.lock().last_writer,
            Storage::View => self.parent.as_ref().and_then(|p| p.last_writer()),
            Storage::Svm { .. } => None,
        }
    }

    /// Replaces the allocation on `device` by a fresh host-visible one,
    /// carrying the contents over unless `discard` is set.
    ///
    /// Returns `false` without doing anything while the object or one of
    /// its views is mapped, and after allocating instead when nothing was
    /// allocated yet.
    pub(crate) fn reallocate(&self, device: &Device, discard: bool) -> ClResult<bool> {
        let residency = match self.storage {
            Storage::Owned(ref residency) => residency,
            Storage::View => return self.view_parent()?.reallocate(device, discard),
            Storage::Svm { .. } => return Ok(false),
        };

        if self.is_mapped_tree() {
            debug!("Memory {}: mapped, reallocation skipped.", self.id);
            return Ok(false);
        }
        if !device.can_allocate(self.size) {
            return Err(Status::CL_MEM_OBJECT_ALLOCATION_FAILURE);
        }

        let mut guard = residency.lock();
        let res = &mut *guard;
        let version = res.version;
        let source = res.current_source(device.id());

        match res.backings.get(&device.id()).map(|b| b.state) {
            Some(AllocState::Complete) | Some(AllocState::Realloced) => (),
            _ => {
                self.materialize(res, device)?;
                return Ok(false);
            },
        }

        let fresh = DeviceMemory::with_visibility(device.id(), self.size, true)?;
        if let Some(backing) = res.backings.get_mut(&device.id()) {
            if !discard {
                let src = match (backing.version < version, source) {
                    (true, Some(src)) => Some(src),
                    _ => backing.mem.clone(),
                };
                if let Some(src) = src {
                    unsafe { ptr::copy_nonoverlapping(src.as_ptr(), fresh.as_ptr(), self.size); }
                }
            }
            backing.mem = Some(fresh);
            backing.state = AllocState::Realloced;
            backing.version = version;
        }
        debug!("Memory {}: reallocated on device {}.", self.id, device.id().as_usize());
        Ok(true)
    }

    /// Marks the allocation on `device` as current without copying.
    pub(crate) fn discard_for_device(&self, device: &Device) -> ClResult<()> {
        match self.storage {
            Storage::Owned(ref residency) => {
                let mut guard = residency.lock();
                let res = &mut *guard;
                let version = res.version;
                if res.backings.get(&device.id()).and_then(|b| b.mem.as_ref()).is_none() {
                    self.materialize(res, device)?;
                }
                if let Some(backing) = res.backings.get_mut(&device.id()) {
                    backing.version = version;
                }
                Ok(())
            },
            Storage::View => self.view_parent()?.discard_for_device(device),
            Storage::Svm { .. } => Ok(()),
        }
    }
}

impl Drop for Memory {
    fn drop(&mut self) {
        let callbacks = mem::replace(&mut self.ops.get_mut().destructors, Vec::new());
        for callback in callbacks.into_iter().rev() {
            callback(self);
        }

        if let Some(ref parent) = self.parent {
            parent.ops.lock().sub_buffers.retain(|w| w.strong_count() > 0);
        }

        debug!("Memory {}: destroyed ({:?}, {} bytes).", self.id, self.mem_type, self.size);
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Memory")
            .field("id", &self.id)
            .field("type", &self.mem_type)
            .field("flags", &self.flags)
            .field("size", &self.size)
            .field("origin", &self.origin)
            .field("parent", &self.parent.as_ref().map(|p| p.id))
            .field("kind", &self.kind)
            .field("interop", &self.interop.as_ref().map(|i| i.api()))
            .finish()
    }
}


/// A memory object handle.
///
/// Cloning retains the object and dropping releases it.
pub struct Mem(Arc<Memory>);

impl Mem {
    /// Wraps `mem`, taking one API reference.
    pub(crate) fn from_arc(mem: Arc<Memory>) -> Mem {
        mem.retain();
        Mem(mem)
    }

    pub fn as_arc(&self) -> &Arc<Memory> {
        &self.0
    }

    pub fn as_memory(&self) -> &Memory {
        &self.0
    }
}

impl Clone for Mem {
    fn clone(&self) -> Mem {
        Mem::from_arc(self.0.clone())
    }
}

impl Drop for Mem {
    fn drop(&mut self) {
        if self.0.release().is_err() {
            warn!("Mem: handle to memory object {} dropped after its reference count \
                reached zero.", self.0.id);
        }
    }
}

impl Deref for Mem {
    type Target = Memory;

    fn deref(&self) -> &Memory {
        &self.0
    }
}

impl PartialEq for Mem {
    fn eq(&self, other: &Mem) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Mem {}

impl fmt::Debug for Mem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Mem").field(&self.0.id).finish()
    }
}


/// A host view of memory mapped by `enqueue_map_buffer` or
/// `enqueue_map_image`.
///
/// The pointer must not be touched before `event` completes. Pass the map to
/// `enqueue_unmap_mem_object` when done.
//
// [NOTE]: Do not derive/impl `Clone`; unmapping consumes the mapping.
#[derive(Debug)]
pub struct MemMap<T: OclPrm> {
    ptr: NonNull<T>,
    len: usize,
    row_pitch: usize,
    slice_pitch: usize,
    event: Event,
}

impl<T: OclPrm> MemMap<T> {
    pub(crate) fn new(ptr: NonNull<u8>, len: usize, row_pitch: usize, slice_pitch: usize,
            event: Event) -> MemMap<T> {
        MemMap { ptr: ptr.cast(), len, row_pitch, slice_pitch, event }
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Number of `T` elements spanned by the mapping.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Row pitch in bytes (image mappings).
    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    /// Slice pitch in bytes (image mappings).
    pub fn slice_pitch(&self) -> usize {
        self.slice_pitch
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    /// ### Safety
    ///
    /// The map command must have completed and the mapping must not have
    /// been unmapped.
    pub unsafe fn as_slice(&self) -> &[T] {
        ::std::slice::from_raw_parts(self.ptr.as_ptr(), self.len)
    }

    /// ### Safety
    ///
    /// See `as_slice`.
    pub unsafe fn as_slice_mut(&mut self) -> &mut [T] {
        ::std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len)
    }
}
