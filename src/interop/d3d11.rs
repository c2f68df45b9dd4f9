//! Direct3D 11 buffers and textures.
//!
//! Keys are `(resource, subresource)` like D3D10. Planar video textures
//! (`NV12`, `P010`) are wrapped as their luma plane; the object's storage is
//! sized for every plane and `get_plane_from_image_amd` exposes the chroma
//! plane as a second image over the same storage. The plane is geometry
//! only and never part of the dedup key.

use std::sync::Arc;
use crate::context::Context;
use crate::error::ClResult;
use crate::ffi;
use crate::interop::{self, d3d10, BindParams, InteropApi, InteropBinding, InteropObject, NativeRef};
use crate::memory::{BufferDesc, ImageDesc, MemKind, Memory, MemoryInit};
use crate::util;
use crate::{ImageChannelDataType as DataType, ImageChannelOrder as Order, ImageFormat, MemFlags,
    MemObjectType, Status};

/// `D3D11_RESOURCE_MISC_SHARED`
pub const D3D11_RESOURCE_MISC_SHARED: u32 = 0x2;
/// `D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX`
pub const D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX: u32 = 0x100;


/// `D3D11_RESOURCE_DIMENSION`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum D3D11ResourceDimension {
    Buffer,
    Texture1d,
    Texture2d,
    Texture3d,
}


/// The parts of a D3D11 buffer or texture description the bridge uses.
///
/// For buffers `width` is the byte size and the remaining geometry is 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct D3D11ResourceDesc {
    pub dimension: D3D11ResourceDimension,
    /// A `DXGI_FORMAT` value.
    pub format: u32,
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub array_size: u32,
    pub mip_levels: u32,
    pub misc_flags: u32,
}

impl D3D11ResourceDesc {
    pub fn buffer(size: usize, misc_flags: u32) -> D3D11ResourceDesc {
        D3D11ResourceDesc {
            dimension: D3D11ResourceDimension::Buffer,
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
            array_size: u32, misc_flags: u32) -> D3D11ResourceDesc {
        D3D11ResourceDesc {
            dimension: D3D11ResourceDimension::Texture2d,
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
            misc_flags: u32) -> D3D11ResourceDesc {
        D3D11ResourceDesc {
            dimension: D3D11ResourceDimension::Texture3d,
            format,
            width,
            height,
            depth,
            array_size: 1,
            mip_levels,
            misc_flags,
        }
    }

    /// The device can open the resource without a shared copy.
    pub fn is_shared(&self) -> bool {
        self.misc_flags & (D3D11_RESOURCE_MISC_SHARED | D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX) != 0
    }
}


pub type D3D11Object = InteropObject<D3D11ResourceDesc>;


/// Number of planes of a `DXGI_FORMAT`.
pub fn plane_count(format: u32) -> u32 {
    match format {
        ffi::DXGI_FORMAT_NV12 | ffi::DXGI_FORMAT_P010 => 2,
        _ => 1,
    }
}

/// Image format of `plane` of a `DXGI_FORMAT`.
pub fn plane_format(format: u32, plane: u32) -> Option<ImageFormat> {
    let data_type = match format {
        ffi::DXGI_FORMAT_NV12 => DataType::UnormInt8,
        ffi::DXGI_FORMAT_P010 => DataType::UnormInt16,
        _ if plane == 0 => return d3d10::dxgi_image_format(format),
        _ => return None,
    };
    match plane {
        0 => Some(ImageFormat::new(Order::R, data_type)),
        1 => Some(ImageFormat::new(Order::Rg, data_type)),
        _ => None,
    }
}

/// Bytes per pixel of `plane` of a `DXGI_FORMAT`, 0 if it has no image
/// format equivalent.
pub fn element_size(format: u32, plane: u32) -> usize {
    plane_format(format, plane).map_or(0, |f| f.pixel_bytes())
}

/// `(width, height)` of `plane` of a `width` x `height` surface. Chroma
/// planes are subsampled in both directions.
pub fn plane_dims(plane: u32, width: usize, height: usize) -> (usize, usize) {
    match plane {
        0 => (width, height),
        _ => (::std::cmp::max(1, width / 2), ::std::cmp::max(1, height / 2)),
    }
}

fn plane_image(format: u32, plane: u32, width: usize, height: usize) -> ClResult<ImageDesc> {
    let image_format = plane_format(format, plane).ok_or(Status::CL_INVALID_D3D11_RESOURCE_KHR)?;
    let (w, h) = plane_dims(plane, width, height);
    Ok(interop::image_2d_desc(image_format, w, h).with_plane(plane))
}

fn bind(context: &Context, resource: NativeRef<D3D11ResourceDesc>, subresource: u32,
        dimension: D3D11ResourceDimension) -> ClResult<D3D11Object> {
    let api = InteropApi::D3D11;
    let params = BindParams {
        api,
        resource,
        subresource,
        plane: None,
        plane_in_key: false,
        dedup: true,
    };

    InteropObject::bind(context, params,
        |desc: &D3D11ResourceDesc| {
            if desc.dimension != dimension {
                return Err(api.invalid_resource());
            }
            if dimension != D3D11ResourceDimension::Buffer {
                d3d10::subresource_geometry(api, plane_format(desc.format, 0),
                    [desc.width, desc.height, desc.depth], desc.mip_levels, desc.array_size,
                    subresource)?;
            }
            Ok(())
        },
        |desc: &D3D11ResourceDesc| !desc.is_shared())
}


/// Wraps a D3D11 buffer.
pub(crate) fn create_from_d3d11_buffer(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D11ResourceDesc>) -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    let obj = bind(context, resource, 0, D3D11ResourceDimension::Buffer)?;
    let size = obj.desc().width;
    if size == 0 {
        return Err(Status::CL_INVALID_D3D11_RESOURCE_KHR);
    }

    interop::create_bound_memory(context, flags, MemObjectType::Buffer, size,
        MemKind::Buffer(BufferDesc::default()), InteropBinding::D3D11(Arc::new(obj)))
}

/// Wraps one subresource of a D3D11 2D texture as a 2D image.
///
/// Planar textures yield their luma plane, backed by storage for every
/// plane.
pub(crate) fn create_from_d3d11_texture_2d(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D11ResourceDesc>, subresource: u32) -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    let obj = bind(context, resource, subresource, D3D11ResourceDimension::Texture2d)?;

    let d = obj.desc();
    let level = subresource % ::std::cmp::max(1, d.mip_levels);
    let (width, height) = (util::mip_dim(d.width, level), util::mip_dim(d.height, level));

    let image = plane_image(d.format, 0, width, height)?;
    let mut size = 0;
    for plane in 0..plane_count(d.format) {
        size += plane_image(d.format, plane, width, height)?.storage_size();
    }

    interop::create_bound_memory(context, flags, MemObjectType::Image2d, size,
        MemKind::Image(image), InteropBinding::D3D11(Arc::new(obj)))
}

/// Wraps one mip level of a D3D11 3D texture as a 3D image.
pub(crate) fn create_from_d3d11_texture_3d(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D11ResourceDesc>, subresource: u32) -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    let obj = bind(context, resource, subresource, D3D11ResourceDimension::Texture3d)?;

    let d = obj.desc();
    let (format, width, height, depth) = d3d10::subresource_geometry(InteropApi::D3D11,
        d3d10::dxgi_image_format(d.format), [d.width, d.height, d.depth], d.mip_levels, 1,
        subresource)?;
    let row_pitch = width * format.pixel_bytes();
    let image = ImageDesc::new(MemObjectType::Image3d, format, [width, height, depth, 1],
        row_pitch, row_pitch * height, 1, 1);
    let size = image.storage_size();

    interop::create_bound_memory(context, flags, MemObjectType::Image3d, size,
        MemKind::Image(image), InteropBinding::D3D11(Arc::new(obj)))
}

/// Creates a 2D image over `plane` of a planar D3D11 image.
///
/// The new image shares storage and the interop binding of `mem` and takes
/// no registry entry of its own.
pub(crate) fn get_plane_from_image(context: &Context, mem: &Arc<Memory>, plane: u32)
        -> ClResult<Arc<Memory>> {
    if mem.context() != context {
        return Err(Status::CL_INVALID_CONTEXT);
    }
    let binding = match mem.interop() {
        Some(binding @ InteropBinding::D3D11(_)) if mem.parent().is_none() => binding.clone(),
        _ => return Err(Status::CL_INVALID_MEM_OBJECT),
    };
    let format = match binding.as_d3d11() {
        Some(obj) => obj.desc().format,
        None => return Err(Status::CL_INVALID_MEM_OBJECT),
    };
    if plane >= plane_count(format) {
        return Err(Status::CL_INVALID_VALUE);
    }

    let (width, height) = match mem.as_image() {
        Some(image) => (image.width(), image.height()),
        None => return Err(Status::CL_INVALID_MEM_OBJECT),
    };
    let mut origin = 0;
    for p in 0..plane {
        origin += plane_image(format, p, width, height)?.storage_size();
    }
    let image = plane_image(format, plane, width, height)?;
    let size = image.storage_size();

    let mut init = MemoryInit::view(mem, origin, MemObjectType::Image2d, mem.mem_flags(), size,
        MemKind::Image(image));
    init.interop = Some(binding);

    let view = Arc::new(Memory::new(init));
    view.create(None, true)?;
    mem.add_sub_buffer(&view);
    debug!("Memory {}: plane {} image {} at offset {}.", mem.id(), plane, view.id(), origin);
    Ok(view)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_formats() {
        assert_eq!(plane_count(ffi::DXGI_FORMAT_NV12), 2);
        assert_eq!(plane_count(ffi::DXGI_FORMAT_R8_UNORM), 1);
        assert_eq!(element_size(ffi::DXGI_FORMAT_NV12, 0), 1);
        assert_eq!(element_size(ffi::DXGI_FORMAT_NV12, 1), 2);
        assert_eq!(element_size(ffi::DXGI_FORMAT_P010, 1), 4);
        assert_eq!(element_size(ffi::DXGI_FORMAT_NV12, 2), 0);
        assert_eq!(element_size(ffi::DXGI_FORMAT_R8G8B8A8_UNORM, 1), 0);
        assert_eq!(plane_dims(1, 1920, 1080), (960, 540));
        assert_eq!(plane_dims(1, 1, 1), (1, 1));
    }
}
