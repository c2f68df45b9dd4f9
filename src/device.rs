//! Devices and the per-device memory back-end.
//!
//! A `DeviceMemory` is one materialisation of a memory object on one device.
//! The host back-end keeps it in a zeroed host allocation; devices without
//! host-unified memory hand out staging copies for mappings instead of
//! pointers into the allocation itself.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use crate::error::ClResult;
use crate::util::Rect;
use crate::{ImageFormat, ImageChannelOrder as Order, ImageChannelDataType as DataType,
    MapFlags, MemObjectType, Status};

static NEXT_DEVICE_ID: AtomicUsize = AtomicUsize::new(1);

/// Alignment of every device allocation in bytes.
const ALLOC_ALIGN: usize = 4096;


/// A device identifier, unique within the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(usize);

impl DeviceId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}


/// Device limits and capabilities consulted by the memory subsystem.
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    pub name: String,
    /// `CL_DEVICE_MAX_MEM_ALLOC_SIZE` in bytes.
    pub max_mem_alloc_size: u64,
    /// `CL_DEVICE_MEM_BASE_ADDR_ALIGN` in bits.
    pub mem_base_addr_align: u32,
    pub image_support: bool,
    pub image2d_max_width: usize,
    pub image2d_max_height: usize,
    pub image3d_max_width: usize,
    pub image3d_max_height: usize,
    pub image3d_max_depth: usize,
    pub image_max_array_size: usize,
    /// Maximum number of pixels of a 1D image buffer.
    pub image_max_buffer_size: usize,
    /// Largest supported mip chain; 0 means no mipmap support.
    pub max_mip_levels: u32,
    /// Largest supported multisample count; 1 means no multisampling.
    pub max_samples: u32,
    pub pipe_max_packet_size: u32,
    /// Device allocations are directly addressable by the host.
    pub host_unified_memory: bool,
    /// Formats usable for every image type on this device.
    pub image_formats: Vec<ImageFormat>,
}

impl DeviceInfo {
    /// The default format table: the formats every full-profile device must
    /// support, plus a handful of common extras.
    pub fn default_image_formats() -> Vec<ImageFormat> {
        let mut formats = Vec::with_capacity(32);

        for &dt in &[DataType::UnormInt8, DataType::UnormInt16, DataType::SnormInt8,
                DataType::SnormInt16, DataType::SignedInt8, DataType::SignedInt16,
                DataType::SignedInt32, DataType::UnsignedInt8, DataType::UnsignedInt16,
                DataType::UnsignedInt32, DataType::HalfFloat, DataType::Float] {
            formats.push(ImageFormat::new(Order::R, dt));
            formats.push(ImageFormat::new(Order::Rg, dt));
            formats.push(ImageFormat::new(Order::Rgba, dt));
        }

        formats.push(ImageFormat::new(Order::Bgra, DataType::UnormInt8));
        formats.push(ImageFormat::new(Order::Srgba, DataType::UnormInt8));
        formats.push(ImageFormat::new(Order::Sbgra, DataType::UnormInt8));
        formats.push(ImageFormat::new(Order::Depth, DataType::Float));
        formats.push(ImageFormat::new(Order::Depth, DataType::UnormInt16));
        formats
    }
}

impl Default for DeviceInfo {
    fn default() -> DeviceInfo {
        DeviceInfo {
            name: String::from("Host Device"),
            max_mem_alloc_size: 256 << 20,
            mem_base_addr_align: 1024,
            image_support: true,
            image2d_max_width: 16384,
            image2d_max_height: 16384,
            image3d_max_width: 2048,
            image3d_max_height: 2048,
            image3d_max_depth: 2048,
            image_max_array_size: 2048,
            image_max_buffer_size: 1 << 27,
            max_mip_levels: 15,
            max_samples: 1,
            pipe_max_packet_size: 1024,
            host_unified_memory: true,
            image_formats: DeviceInfo::default_image_formats(),
        }
    }
}


struct DeviceInner {
    id: DeviceId,
    info: DeviceInfo,
}

/// A device.
#[derive(Clone)]
pub struct Device(Arc<DeviceInner>);

impl Device {
    pub(crate) fn new(info: DeviceInfo) -> Device {
        let id = DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed));
        Device(Arc::new(DeviceInner { id, info }))
    }

    pub fn id(&self) -> DeviceId {
        self.0.id
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.0.info
    }

    /// Base address alignment in bytes.
    pub fn mem_base_addr_align_bytes(&self) -> usize {
        ::std::cmp::max(1, self.0.info.mem_base_addr_align as usize / 8)
    }

    /// Returns true if the device can hold an allocation of `size` bytes.
    pub fn can_allocate(&self, size: usize) -> bool {
        size as u64 <= self.0.info.max_mem_alloc_size
    }

    pub fn supports_image_format(&self, format: &ImageFormat) -> bool {
        self.0.info.image_support && self.0.info.image_formats.contains(format)
    }

    /// Maximum `[width, height, depth]` for an image type; the array size
    /// limit is reported separately by `info().image_max_array_size`.
    pub fn max_image_dims(&self, image_type: MemObjectType) -> [usize; 3] {
        let info = &self.0.info;
        match image_type {
            MemObjectType::Image3d => {
                [info.image3d_max_width, info.image3d_max_height, info.image3d_max_depth]
            },
            MemObjectType::Image1dBuffer => [info.image_max_buffer_size, 1, 1],
            _ => [info.image2d_max_width, info.image2d_max_height, 1],
        }
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Device) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Device {}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.0.id.0)
            .field("name", &self.0.info.name)
            .finish()
    }
}


/// Opaque per-queue execution context. Stored on memory objects mapped with
/// persistent-memory semantics so later maps reuse the same context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VirtualDevice {
    pub(crate) queue: u64,
    pub(crate) device: DeviceId,
}

impl VirtualDevice {
    pub fn device(&self) -> DeviceId {
        self.device
    }
}


/// A raw, zeroed, page-aligned host allocation.
struct RawAlloc {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl RawAlloc {
    fn new(size: usize) -> Option<RawAlloc> {
        let layout = Layout::from_size_align(::std::cmp::max(size, 1), ALLOC_ALIGN).ok()?;
        let ptr = NonNull::new(unsafe { alloc::alloc_zeroed(layout) })?;
        Some(RawAlloc { ptr, layout })
    }
}

impl Drop for RawAlloc {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}


/// A CPU-visible address reserved for a mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapTarget {
    pub ptr: NonNull<u8>,
    pub row_pitch: usize,
    pub slice_pitch: usize,
    /// The pointer is a staging copy which must be synchronised with the
    /// allocation on map and unmap.
    pub staged: bool,
}

unsafe impl Send for MapTarget {}
unsafe impl Sync for MapTarget {}


/// Device-side storage of one memory object on one device.
pub struct DeviceMemory {
    device: DeviceId,
    alloc: RawAlloc,
    size: usize,
    host_visible: bool,
    staging: Mutex<Vec<RawAlloc>>,
}

unsafe impl Send for DeviceMemory {}
unsafe impl Sync for DeviceMemory {}

impl DeviceMemory {
    /// Allocates `size` zeroed bytes for `device`.
    pub(crate) fn allocate(device: &Device, size: usize) -> ClResult<Arc<DeviceMemory>> {
        if !device.can_allocate(size) {
            return Err(Status::CL_MEM_OBJECT_ALLOCATION_FAILURE);
        }
        DeviceMemory::with_visibility(device.id(), size, device.info().host_unified_memory)
    }

    pub(crate) fn with_visibility(device: DeviceId, size: usize, host_visible: bool)
            -> ClResult<Arc<DeviceMemory>> {
        let alloc = RawAlloc::new(size).ok_or(Status::CL_MEM_OBJECT_ALLOCATION_FAILURE)?;
        trace!("DeviceMemory: allocated {} bytes on device {}.", size, device.0);

        Ok(Arc::new(DeviceMemory {
            device,
            alloc,
            size,
            host_visible,
            staging: Mutex::new(Vec::new()),
        }))
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn host_visible(&self) -> bool {
        self.host_visible
    }

    /// Base pointer of the allocation.
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.alloc.ptr.as_ptr()
    }

    /// Returns `CL_INVALID_VALUE` if `rect`, shifted by `base`, leaves the
    /// allocation.
    pub(crate) fn check_rect(&self, base: usize, rect: &Rect) -> ClResult<()> {
        if base + rect.end() > self.size {
            Err(Status::CL_INVALID_VALUE)
        } else {
            Ok(())
        }
    }

    /// Reserves a CPU-visible address for `[offset, offset + size)`.
    ///
    /// Host-visible allocations return a pointer into themselves. Others
    /// return a zeroed staging block which the caller fills and drains.
    /// `pitches` are passed through for image mappings. Returns `None` if
    /// the range is out of bounds or staging memory is unavailable.
    pub fn alloc_map_target(&self, offset: usize, size: usize, _flags: MapFlags,
            pitches: Option<[usize; 2]>) -> Option<MapTarget> {
        if offset.checked_add(size)? > self.size {
            return None;
        }
        let [row_pitch, slice_pitch] = pitches.unwrap_or([size, size]);

        if self.host_visible {
            let ptr = NonNull::new(unsafe { self.as_ptr().add(offset) })?;
            return Some(MapTarget { ptr, row_pitch, slice_pitch, staged: false });
        }

        let staging = RawAlloc::new(size)?;
        let ptr = staging.ptr;
        self.staging.lock().push(staging);
        Some(MapTarget { ptr, row_pitch, slice_pitch, staged: true })
    }

    /// Frees a staging block returned by `alloc_map_target`. Pointers into
    /// the allocation itself are ignored.
    pub fn release_map_target(&self, target: &MapTarget) {
        if target.staged {
            self.staging.lock().retain(|s| s.ptr != target.ptr);
        }
    }
}

impl fmt::Debug for DeviceMemory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DeviceMemory")
            .field("device", &self.device.0)
            .field("size", &self.size)
            .field("host_visible", &self.host_visible)
            .finish()
    }
}
