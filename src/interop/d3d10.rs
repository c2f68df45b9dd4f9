//! Direct3D 10 buffers and textures.
//!
//! Resources are keyed by `(resource, subresource)`. A resource created
//! without `D3D10_RESOURCE_MISC_SHARED` cannot be opened by the device and
//! is mirrored into a shared copy.

use std::sync::Arc;
use crate::context::Context;
use crate::error::ClResult;
use crate::ffi;
use crate::interop::{self, BindParams, InteropApi, InteropBinding, InteropObject, NativeRef};
use crate::memory::{BufferDesc, ImageDesc, MemKind, Memory};
use crate::util;
use crate::{ImageChannelDataType as DataType, ImageChannelOrder as Order, ImageFormat, MemFlags,
    MemObjectType, Status};

/// `D3D10_RESOURCE_MISC_SHARED`
pub const D3D10_RESOURCE_MISC_SHARED: u32 = 0x2;


/// `D3D10_RESOURCE_DIMENSION`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum D3D10ResourceDimension {
    Buffer,
    Texture1d,
    Texture2d,
    Texture3d,
}


/// The parts of a D3D10 buffer or texture description the bridge uses.
///
/// For buffers `width` is the byte size and the remaining geometry is 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct D3D10ResourceDesc {
    pub dimension: D3D10ResourceDimension,
    /// A `DXGI_FORMAT` value.
    pub format: u32,
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub array_size: u32,
    pub mip_levels: u32,
    pub misc_flags: u32,
}

impl D3D10ResourceDesc {
    pub fn buffer(size: usize, misc_flags: u32) -> D3D10ResourceDesc {
        D3D10ResourceDesc {
            dimension: D3D10ResourceDimension::Buffer,
            format: 0,
            width: size,
            height: 1,
            depth: 1,
            array_size: 1,
            mip_levels: 1,
            misc_flags,
        }
    }

    pub fn texture_2d(format: u32, width: usize, height: usize, mip_levels: u32,
            array_size: u32, misc_flags: u32) -> D3D10ResourceDesc {
        D3D10ResourceDesc {
            dimension: D3D10ResourceDimension::Texture2d,
            format,
            width,
            height,
            depth: 1,
            array_size,
            mip_levels,
            misc_flags,
        }
    }

    pub fn texture_3d(format: u32, width: usize, height: usize, depth: usize, mip_levels: u32,
            misc_flags: u32) -> D3D10ResourceDesc {
        D3D10ResourceDesc {
            dimension: D3D10ResourceDimension::Texture3d,
            format,
            width,
            height,
            depth,
            array_size: 1,
            mip_levels,
            misc_flags,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.misc_flags & D3D10_RESOURCE_MISC_SHARED != 0
    }
}


pub type D3D10Object = InteropObject<D3D10ResourceDesc>;


const fn fmt(order: Order, data_type: DataType) -> ImageFormat {
    ImageFormat { channel_order: order, channel_data_type: data_type }
}

/// `DXGI_FORMAT` to image format translations shared by D3D10 and D3D11.
static DXGI_FORMATS: &[(u32, ImageFormat)] = &[
    (ffi::DXGI_FORMAT_R32G32B32A32_FLOAT, fmt(Order::Rgba, DataType::Float)),
    (ffi::DXGI_FORMAT_R32G32B32A32_UINT, fmt(Order::Rgba, DataType::UnsignedInt32)),
    (ffi::DXGI_FORMAT_R16G16B16A16_FLOAT, fmt(Order::Rgba, DataType::HalfFloat)),
    (ffi::DXGI_FORMAT_R16G16B16A16_UNORM, fmt(Order::Rgba, DataType::UnormInt16)),
    (ffi::DXGI_FORMAT_R32G32_FLOAT, fmt(Order::Rg, DataType::Float)),
    (ffi::DXGI_FORMAT_R8G8B8A8_UNORM, fmt(Order::Rgba, DataType::UnormInt8)),
    (ffi::DXGI_FORMAT_R8G8B8A8_UINT, fmt(Order::Rgba, DataType::UnsignedInt8)),
    (ffi::DXGI_FORMAT_R16G16_FLOAT, fmt(Order::Rg, DataType::HalfFloat)),
    (ffi::DXGI_FORMAT_R32_FLOAT, fmt(Order::R, DataType::Float)),
    (ffi::DXGI_FORMAT_R32_UINT, fmt(Order::R, DataType::UnsignedInt32)),
    (ffi::DXGI_FORMAT_R8G8_UNORM, fmt(Order::Rg, DataType::UnormInt8)),
    (ffi::DXGI_FORMAT_R16_FLOAT, fmt(Order::R, DataType::HalfFloat)),
    (ffi::DXGI_FORMAT_R8_UNORM, fmt(Order::R, DataType::UnormInt8)),
    (ffi::DXGI_FORMAT_B8G8R8A8_UNORM, fmt(Order::Bgra, DataType::UnormInt8)),
];

/// Image format of a single-plane `DXGI_FORMAT`.
pub fn dxgi_image_format(format: u32) -> Option<ImageFormat> {
    DXGI_FORMATS.iter().find(|&&(f, _)| f == format).map(|&(_, image_format)| image_format)
}

/// Bytes per pixel of a single-plane `DXGI_FORMAT`, 0 if it has no image
/// format equivalent.
pub fn dxgi_element_size(format: u32) -> usize {
    dxgi_image_format(format).map_or(0, |f| f.pixel_bytes())
}


/// Geometry of one subresource of a texture: `(format, width, height,
/// depth)`.
///
/// Subresources are numbered mip-major within each array slice.
pub(crate) fn subresource_geometry(api: InteropApi, format: Option<ImageFormat>,
        desc_dims: [usize; 3], mip_levels: u32, array_size: u32, subresource: u32)
        -> ClResult<(ImageFormat, usize, usize, usize)> {
    let mip_levels = ::std::cmp::max(1, mip_levels);
    if subresource >= mip_levels * ::std::cmp::max(1, array_size) {
        return Err(Status::CL_INVALID_VALUE);
    }
    let format = format.ok_or(api.invalid_resource())?;
    let level = subresource % mip_levels;

    Ok((format, util::mip_dim(desc_dims[0], level), util::mip_dim(desc_dims[1], level),
        util::mip_dim(desc_dims[2], level)))
}

fn bind(context: &Context, api: InteropApi, resource: NativeRef<D3D10ResourceDesc>,
        subresource: u32, dimension: D3D10ResourceDimension) -> ClResult<D3D10Object> {
    let params = BindParams {
        api,
        resource,
        subresource,
        plane: None,
        plane_in_key: false,
        dedup: true,
    };

    InteropObject::bind(context, params,
        |desc: &D3D10ResourceDesc| {
            if desc.dimension != dimension {
                return Err(api.invalid_resource());
            }
            if dimension != D3D10ResourceDimension::Buffer {
                subresource_geometry(api, dxgi_image_format(desc.format),
                    [desc.width, desc.height, desc.depth], desc.mip_levels, desc.array_size,
                    subresource)?;
            }
            Ok(())
        },
        |desc: &D3D10ResourceDesc| !desc.is_shared())
}


/// Wraps a D3D10 buffer.
pub(crate) fn create_from_d3d10_buffer(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D10ResourceDesc>) -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    let obj = bind(context, InteropApi::D3D10, resource, 0, D3D10ResourceDimension::Buffer)?;
    let size = obj.desc().width;
    if size == 0 {
        return Err(Status::CL_INVALID_D3D10_RESOURCE_KHR);
    }

    interop::create_bound_memory(context, flags, MemObjectType::Buffer, size,
        MemKind::Buffer(BufferDesc::default()), InteropBinding::D3D10(Arc::new(obj)))
}

/// Wraps one subresource of a D3D10 2D texture as a 2D image.
pub(crate) fn create_from_d3d10_texture_2d(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D10ResourceDesc>, subresource: u32) -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    let obj = bind(context, InteropApi::D3D10, resource, subresource,
        D3D10ResourceDimension::Texture2d)?;

    let d = obj.desc();
    let (format, width, height, _) = subresource_geometry(InteropApi::D3D10,
        dxgi_image_format(d.format), [d.width, d.height, 1], d.mip_levels, d.array_size,
        subresource)?;
    let image = interop::image_2d_desc(format, width, height);
    let size = image.storage_size();

    interop::create_bound_memory(context, flags, MemObjectType::Image2d, size,
        MemKind::Image(image), InteropBinding::D3D10(Arc::new(obj)))
}

/// Wraps one mip level of a D3D10 3D texture as a 3D image.
pub(crate) fn create_from_d3d10_texture_3d(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D10ResourceDesc>, subresource: u32) -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    let obj = bind(context, InteropApi::D3D10, resource, subresource,
        D3D10ResourceDimension::Texture3d)?;

    let d = obj.desc();
    let (format, width, height, depth) = subresource_geometry(InteropApi::D3D10,
        dxgi_image_format(d.format), [d.width, d.height, d.depth], d.mip_levels, 1,
        subresource)?;
    let row_pitch = width * format.pixel_bytes();
    let image = ImageDesc::new(MemObjectType::Image3d, format, [width, height, depth, 1],
        row_pitch, row_pitch * height, 1, 1);
    let size = image.storage_size();

    interop::create_bound_memory(context, flags, MemObjectType::Image3d, size,
        MemKind::Image(image), InteropBinding::D3D10(Arc::new(obj)))
}
