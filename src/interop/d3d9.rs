//! Direct3D 9 media surfaces.
//!
//! A surface is wrapped one plane at a time and keyed by
//! `(surface, 0, plane)`, so every plane of a planar surface can be wrapped
//! once.

use std::sync::Arc;
use crate::context::Context;
use crate::error::ClResult;
use crate::ffi;
use crate::interop::{self, BindParams, InteropApi, InteropBinding, InteropObject, NativeRef};
use crate::memory::{MemKind, Memory};
use crate::{ImageChannelDataType as DataType, ImageChannelOrder as Order, ImageFormat, MemFlags,
    MemObjectType, Status};


/// The parts of a `D3DSURFACE_DESC` the bridge uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct D3D9SurfaceDesc {
    /// A `D3DFORMAT` value.
    pub format: u32,
    pub width: usize,
    pub height: usize,
    /// The surface was created with a shared handle the device can open.
    pub shared_handle: bool,
}

impl D3D9SurfaceDesc {
    pub fn new(format: u32, width: usize, height: usize, shared_handle: bool) -> D3D9SurfaceDesc {
        D3D9SurfaceDesc { format, width, height, shared_handle }
    }
}


pub type D3D9Object = InteropObject<D3D9SurfaceDesc>;


/// Number of planes of a `D3DFORMAT`.
pub fn plane_count(format: u32) -> u32 {
    match format {
        ffi::D3DFMT_NV12 => 2,
        ffi::D3DFMT_YV12 => 3,
        _ => 1,
    }
}

/// Image format of `plane` of a `D3DFORMAT`.
pub fn plane_format(format: u32, plane: u32) -> Option<ImageFormat> {
    if plane >= plane_count(format) {
        return None;
    }
    let (order, data_type) = match (format, plane) {
        (ffi::D3DFMT_NV12, 0) => (Order::R, DataType::UnormInt8),
        (ffi::D3DFMT_NV12, _) => (Order::Rg, DataType::UnormInt8),
        (ffi::D3DFMT_YV12, _) => (Order::R, DataType::UnormInt8),
        (ffi::D3DFMT_A8R8G8B8, _) | (ffi::D3DFMT_X8R8G8B8, _) => (Order::Bgra, DataType::UnormInt8),
        (ffi::D3DFMT_L8, _) => (Order::R, DataType::UnormInt8),
        (ffi::D3DFMT_R32F, _) => (Order::R, DataType::Float),
        (ffi::D3DFMT_A32B32G32R32F, _) => (Order::Rgba, DataType::Float),
        _ => return None,
    };
    Some(ImageFormat::new(order, data_type))
}

/// Bytes per pixel of `plane` of a `D3DFORMAT`, 0 if it has no image format
/// equivalent.
pub fn element_size(format: u32, plane: u32) -> usize {
    plane_format(format, plane).map_or(0, |f| f.pixel_bytes())
}

/// `(width, height)` of `plane` of a `width` x `height` surface.
pub fn plane_dims(format: u32, plane: u32, width: usize, height: usize) -> (usize, usize) {
    match (format, plane) {
        (ffi::D3DFMT_NV12, 1) | (ffi::D3DFMT_YV12, 1) | (ffi::D3DFMT_YV12, 2) => {
            (::std::cmp::max(1, width / 2), ::std::cmp::max(1, height / 2))
        },
        _ => (width, height),
    }
}


/// Wraps `plane` of a D3D9 media surface as a 2D image.
pub(crate) fn create_from_dx9_media_surface(context: &Context, flags: MemFlags,
        surface: NativeRef<D3D9SurfaceDesc>, plane: u32) -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    let api = InteropApi::D3D9;
    let params = BindParams {
        api,
        resource: surface,
        subresource: 0,
        plane: Some(plane),
        plane_in_key: true,
        dedup: true,
    };

    let obj = InteropObject::bind(context, params,
        |desc: &D3D9SurfaceDesc| {
            if plane >= plane_count(desc.format) {
                return Err(Status::CL_INVALID_VALUE);
            }
            if element_size(desc.format, plane) == 0 {
                return Err(Status::CL_INVALID_IMAGE_FORMAT_DESCRIPTOR);
            }
            Ok(())
        },
        |desc: &D3D9SurfaceDesc| !desc.shared_handle)?;

    let d = obj.desc();
    let format = plane_format(d.format, plane).ok_or(api.invalid_resource())?;
    let (width, height) = plane_dims(d.format, plane, d.width, d.height);
    let image = interop::image_2d_desc(format, width, height).with_plane(plane);
    let size = image.storage_size();

    interop::create_bound_memory(context, flags, MemObjectType::Image2d, size,
        MemKind::Image(image), InteropBinding::D3D9(Arc::new(obj)))
}
