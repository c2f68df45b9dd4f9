//! Flag sets and plain structures passed through the entry points.

use std::fmt;
use crate::ffi;
use crate::{ImageChannelOrder, ImageChannelDataType, MemObjectType, Mem};


bitflags! {
    /// cl_mem_flags - bitfield
    ///
    /// Includes the three AMD vendor bits (persistent memory, external
    /// physical memory, bus addressable memory).
    pub struct MemFlags: u64 {
        const READ_WRITE = ffi::CL_MEM_READ_WRITE;
        const WRITE_ONLY = ffi::CL_MEM_WRITE_ONLY;
        const READ_ONLY = ffi::CL_MEM_READ_ONLY;
        const USE_HOST_PTR = ffi::CL_MEM_USE_HOST_PTR;
        const ALLOC_HOST_PTR = ffi::CL_MEM_ALLOC_HOST_PTR;
        const COPY_HOST_PTR = ffi::CL_MEM_COPY_HOST_PTR;
        const USE_PERSISTENT_MEM_AMD = ffi::CL_MEM_USE_PERSISTENT_MEM_AMD;
        const HOST_WRITE_ONLY = ffi::CL_MEM_HOST_WRITE_ONLY;
        const HOST_READ_ONLY = ffi::CL_MEM_HOST_READ_ONLY;
        const HOST_NO_ACCESS = ffi::CL_MEM_HOST_NO_ACCESS;
        const SVM_FINE_GRAIN_BUFFER = ffi::CL_MEM_SVM_FINE_GRAIN_BUFFER;
        const SVM_ATOMICS = ffi::CL_MEM_SVM_ATOMICS;
        const KERNEL_READ_AND_WRITE = ffi::CL_MEM_KERNEL_READ_AND_WRITE;
        const EXTERNAL_PHYSICAL_AMD = ffi::CL_MEM_EXTERNAL_PHYSICAL_AMD;
        const BUS_ADDRESSABLE_AMD = ffi::CL_MEM_BUS_ADDRESSABLE_AMD;

        /// Device access mode bits.
        const DEVICE_ACCESS = Self::READ_WRITE.bits | Self::WRITE_ONLY.bits
            | Self::READ_ONLY.bits | Self::KERNEL_READ_AND_WRITE.bits;
        /// Host pointer mode bits.
        const HOST_PTR_MODE = Self::USE_HOST_PTR.bits | Self::ALLOC_HOST_PTR.bits
            | Self::COPY_HOST_PTR.bits;
        /// Host access restriction bits.
        const HOST_ACCESS = Self::HOST_WRITE_ONLY.bits | Self::HOST_READ_ONLY.bits
            | Self::HOST_NO_ACCESS.bits;
    }
}

impl MemFlags {
    #[inline] pub fn new() -> MemFlags { MemFlags::empty() }
    #[inline] pub fn read_write(self) -> MemFlags { self | MemFlags::READ_WRITE }
    #[inline] pub fn write_only(self) -> MemFlags { self | MemFlags::WRITE_ONLY }
    #[inline] pub fn read_only(self) -> MemFlags { self | MemFlags::READ_ONLY }
    #[inline] pub fn use_host_ptr(self) -> MemFlags { self | MemFlags::USE_HOST_PTR }
    #[inline] pub fn alloc_host_ptr(self) -> MemFlags { self | MemFlags::ALLOC_HOST_PTR }
    #[inline] pub fn copy_host_ptr(self) -> MemFlags { self | MemFlags::COPY_HOST_PTR }
    #[inline] pub fn host_write_only(self) -> MemFlags { self | MemFlags::HOST_WRITE_ONLY }
    #[inline] pub fn host_read_only(self) -> MemFlags { self | MemFlags::HOST_READ_ONLY }
    #[inline] pub fn host_no_access(self) -> MemFlags { self | MemFlags::HOST_NO_ACCESS }
}

impl Default for MemFlags {
    #[inline]
    fn default() -> MemFlags {
        MemFlags::READ_WRITE
    }
}


bitflags! {
    /// cl_map_flags - bitfield
    pub struct MapFlags: u64 {
        const READ = ffi::CL_MAP_READ;
        const WRITE = ffi::CL_MAP_WRITE;
        const WRITE_INVALIDATE_REGION = ffi::CL_MAP_WRITE_INVALIDATE_REGION;
    }
}

impl MapFlags {
    #[inline] pub fn new() -> MapFlags { MapFlags::empty() }
    #[inline] pub fn read(self) -> MapFlags { self | MapFlags::READ }
    #[inline] pub fn write(self) -> MapFlags { self | MapFlags::WRITE }
    #[inline] pub fn write_invalidate_region(self) -> MapFlags {
        self | MapFlags::WRITE_INVALIDATE_REGION
    }

    /// Returns true if the mapping may carry host writes back to the device.
    #[inline]
    pub fn is_write(&self) -> bool {
        self.intersects(MapFlags::WRITE | MapFlags::WRITE_INVALIDATE_REGION)
    }
}


bitflags! {
    /// cl_mem_migration_flags - bitfield
    pub struct MemMigrationFlags: u64 {
        const OBJECT_HOST = ffi::CL_MIGRATE_MEM_OBJECT_HOST;
        const OBJECT_CONTENT_UNDEFINED = ffi::CL_MIGRATE_MEM_OBJECT_CONTENT_UNDEFINED;
    }
}


/// A sub-buffer region in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferRegion {
    pub origin: usize,
    pub size: usize,
}

impl BufferRegion {
    pub fn new(origin: usize, size: usize) -> BufferRegion {
        BufferRegion { origin, size }
    }
}


/// Image format properties used by `Image`.
///
/// A structure that describes format properties of the image to be allocated. (from SDK)
///
/// # Examples (from SDK)
///
/// To specify a normalized unsigned 8-bit / channel RGBA image:
///    image_channel_order = CL_RGBA
///    image_channel_data_type = CL_UNORM_INT8
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageFormat {
    pub channel_order: ImageChannelOrder,
    pub channel_data_type: ImageChannelDataType,
}

impl ImageFormat {
    pub fn new(order: ImageChannelOrder, data_type: ImageChannelDataType) -> ImageFormat {
        ImageFormat {
            channel_order: order,
            channel_data_type: data_type,
        }
    }

    pub fn new_rgba() -> ImageFormat {
        ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::UnormInt8)
    }

    /// Returns the size in bytes of a pixel using the format specified by this
    /// `ImageFormat`, or zero if the channel order and data type cannot be
    /// combined.
    pub fn pixel_bytes(&self) -> usize {
        use crate::ImageChannelOrder::*;
        use crate::ImageChannelDataType::*;

        let dt = self.channel_data_type;
        let is_8bit = dt.channel_size() == Some(1);
        let is_norm_or_float = match dt {
            UnormInt8 | UnormInt16 | SnormInt8 | SnormInt16 | HalfFloat | Float => true,
            _ => false,
        };

        match (self.channel_order, dt) {
            (Rgb, UnormShort565) | (Rgbx, UnormShort565)
                | (Rgb, UnormShort555) | (Rgbx, UnormShort555) => 2,
            (Rgb, UnormInt101010) | (Rgbx, UnormInt101010) => 4,
            (Rgba, UnormInt101010_2) => 4,
            (Depth, UnormInt24) | (DepthStencil, UnormInt24) => 4,
            (DepthStencil, Float) => 8,
            (Depth, UnormInt16) => 2,
            (Depth, Float) => 4,
            (Depth, _) | (DepthStencil, _) => 0,
            (_, _) if dt.is_packed() => 0,
            (Rgb, _) | (Rgbx, _) => 0,
            (Srgb, UnormInt8) => 3,
            (Srgbx, UnormInt8) | (Srgba, UnormInt8) | (Sbgra, UnormInt8) => 4,
            (Srgb, _) | (Srgbx, _) | (Srgba, _) | (Sbgra, _) => 0,
            (Bgra, _) | (Argb, _) | (Abgr, _) => if is_8bit { 4 } else { 0 },
            (Intensity, _) | (Luminance, _) => {
                if is_norm_or_float { dt.channel_size().unwrap_or(0) } else { 0 }
            },
            (Rx, _) | (Rgx, _) | (R, _) | (A, _) | (Rg, _) | (Ra, _) | (Rgba, _) => {
                let count = match self.channel_order {
                    Rx => 2,
                    Rgx => 4,
                    order => order.channel_count(),
                };
                count * dt.channel_size().unwrap_or(0)
            },
        }
    }

    /// Returns true if the channel order and data type form a valid format.
    pub fn is_valid(&self) -> bool {
        self.pixel_bytes() != 0
    }
}

impl fmt::Debug for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ImageFormat({:?}, {:?})", self.channel_order, self.channel_data_type)
    }
}


/// An image descriptor use in the creation of `Image`.
///
/// `image_row_pitch` / `image_slice_pitch` must be 0 if no host pointer is
/// supplied; otherwise 0 means tightly packed. `buffer` refers to a buffer
/// memory object for `Image1dBuffer` and buffer-backed `Image2d` images and
/// must be `None` otherwise.
///
/// `num_mip_levels` of 0 or 1 both mean a single level.
#[derive(Debug, Clone)]
pub struct ImageDescriptor {
    pub image_type: MemObjectType,
    pub image_width: usize,
    pub image_height: usize,
    pub image_depth: usize,
    pub image_array_size: usize,
    pub image_row_pitch: usize,
    pub image_slice_pitch: usize,
    pub num_mip_levels: u32,
    pub num_samples: u32,
    pub buffer: Option<Mem>,
}

impl ImageDescriptor {
    pub fn new(image_type: MemObjectType, width: usize, height: usize, depth: usize,
                array_size: usize, row_pitch: usize, slc_pitch: usize, buffer: Option<Mem>,
                ) -> ImageDescriptor {
        ImageDescriptor {
            image_type: image_type,
            image_width: width,
            image_height: height,
            image_depth: depth,
            image_array_size: array_size,
            image_row_pitch: row_pitch,
            image_slice_pitch: slc_pitch,
            num_mip_levels: 0,
            num_samples: 0,
            buffer: buffer,
        }
    }

    /// Sets the number of mip levels.
    pub fn mip_levels(mut self, num_mip_levels: u32) -> ImageDescriptor {
        self.num_mip_levels = num_mip_levels;
        self
    }

    /// Sets the multisample count.
    pub fn samples(mut self, num_samples: u32) -> ImageDescriptor {
        self.num_samples = num_samples;
        self
    }
}


/// The fill color passed to `enqueue_fill_image`. The variant must match the
/// image channel data type class (normalized/float, signed or unsigned
/// integer).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFillColor {
    Float([f32; 4]),
    Int([i32; 4]),
    Uint([u32; 4]),
}


/// Bus addresses of an externally visible physical allocation.
pub type BusAddress = ffi::cl_bus_address_amd;
