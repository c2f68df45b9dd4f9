//! OpenGL buffers and 2D textures.
//!
//! GL objects are used by the device directly, so no shared copy is ever
//! made, and they are not entered in the dedup registry: the same GL object
//! may back several memory objects.

use std::sync::Arc;
use crate::context::Context;
use crate::error::ClResult;
use crate::ffi;
use crate::interop::{self, BindParams, InteropApi, InteropBinding, InteropObject, NativeRef};
use crate::memory::{BufferDesc, MemKind, Memory};
use crate::util;
use crate::{ImageChannelDataType as DataType, ImageChannelOrder as Order, ImageFormat, MemFlags,
    MemObjectType, Status};


/// `cl_gl_object_type` of a wrapped object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlObjectType {
    Buffer,
    Texture2d,
}

impl GlObjectType {
    pub fn to_raw(&self) -> ffi::cl_gl_object_type {
        match *self {
            GlObjectType::Buffer => ffi::CL_GL_OBJECT_BUFFER,
            GlObjectType::Texture2d => ffi::CL_GL_OBJECT_TEXTURE2D,
        }
    }
}


/// What the GL driver reports about a buffer or texture.
///
/// Buffers use `size`; textures use the remaining fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlObjectDesc {
    pub object_type: GlObjectType,
    pub size: usize,
    /// Texture target (`GL_TEXTURE_2D`, `GL_TEXTURE_RECTANGLE`).
    pub target: ffi::cl_GLenum,
    pub internal_format: ffi::cl_GLenum,
    pub width: usize,
    pub height: usize,
    pub mip_levels: u32,
}

impl GlObjectDesc {
    pub fn buffer(size: usize) -> GlObjectDesc {
        GlObjectDesc {
            object_type: GlObjectType::Buffer,
            size,
            target: 0,
            internal_format: 0,
            width: 0,
            height: 0,
            mip_levels: 0,
        }
    }

    pub fn texture_2d(target: ffi::cl_GLenum, internal_format: ffi::cl_GLenum, width: usize,
            height: usize, mip_levels: u32) -> GlObjectDesc {
        GlObjectDesc {
            object_type: GlObjectType::Texture2d,
            size: 0,
            target,
            internal_format,
            width,
            height,
            mip_levels,
        }
    }
}


pub type GlObject = InteropObject<GlObjectDesc>;


/// Image format of a GL internal format.
pub fn gl_image_format(internal_format: ffi::cl_GLenum) -> Option<ImageFormat> {
    let (order, data_type) = match internal_format {
        ffi::GL_RGBA8 => (Order::Rgba, DataType::UnormInt8),
        ffi::GL_RGBA16 => (Order::Rgba, DataType::UnormInt16),
        ffi::GL_RGBA32F => (Order::Rgba, DataType::Float),
        ffi::GL_RGBA16F => (Order::Rgba, DataType::HalfFloat),
        ffi::GL_R8 => (Order::R, DataType::UnormInt8),
        ffi::GL_R32F => (Order::R, DataType::Float),
        ffi::GL_RG8 => (Order::Rg, DataType::UnormInt8),
        ffi::GL_BGRA => (Order::Bgra, DataType::UnormInt8),
        _ => return None,
    };
    Some(ImageFormat::new(order, data_type))
}

/// Bytes per pixel of a GL internal format, 0 if it has no image format
/// equivalent.
pub fn gl_element_size(internal_format: ffi::cl_GLenum) -> usize {
    gl_image_format(internal_format).map_or(0, |f| f.pixel_bytes())
}

fn bind<C>(context: &Context, resource: NativeRef<GlObjectDesc>, subresource: u32,
        check_shape: C) -> ClResult<GlObject>
        where C: FnOnce(&GlObjectDesc) -> ClResult<()> {
    let params = BindParams {
        api: InteropApi::Gl,
        resource,
        subresource,
        plane: None,
        plane_in_key: false,
        dedup: false,
    };
    InteropObject::bind(context, params, check_shape, |_| false)
}


/// Wraps a GL buffer object.
pub(crate) fn create_from_gl_buffer(context: &Context, flags: MemFlags,
        resource: NativeRef<GlObjectDesc>) -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    let obj = bind(context, resource, 0, |desc| {
        if desc.object_type != GlObjectType::Buffer || desc.size == 0 {
            Err(Status::CL_INVALID_GL_OBJECT)
        } else {
            Ok(())
        }
    })?;
    let size = obj.desc().size;

    interop::create_bound_memory(context, flags, MemObjectType::Buffer, size,
        MemKind::Buffer(BufferDesc::default()), InteropBinding::Gl(Arc::new(obj)))
}

/// Wraps mip level `mip_level` of a GL 2D texture as a 2D image.
pub(crate) fn create_from_gl_texture(context: &Context, flags: MemFlags,
        target: ffi::cl_GLenum, mip_level: u32, resource: NativeRef<GlObjectDesc>)
        -> ClResult<Arc<Memory>> {
    let flags = interop::check_interop_flags(flags)?;
    if target != ffi::GL_TEXTURE_2D && target != ffi::GL_TEXTURE_RECTANGLE {
        return Err(Status::CL_INVALID_VALUE);
    }

    let obj = bind(context, resource, mip_level, |desc| {
        if desc.object_type != GlObjectType::Texture2d || desc.target != target {
            return Err(Status::CL_INVALID_GL_OBJECT);
        }
        if mip_level >= ::std::cmp::max(1, desc.mip_levels) {
            return Err(Status::CL_INVALID_MIP_LEVEL);
        }
        if gl_element_size(desc.internal_format) == 0 {
            return Err(Status::CL_INVALID_IMAGE_FORMAT_DESCRIPTOR);
        }
        Ok(())
    })?;

    let d = obj.desc();
    let format = gl_image_format(d.internal_format).ok_or(Status::CL_INVALID_GL_OBJECT)?;
    let image = interop::image_2d_desc(format, util::mip_dim(d.width, mip_level),
        util::mip_dim(d.height, mip_level));
    let size = image.storage_size();

    interop::create_bound_memory(context, flags, MemObjectType::Image2d, size,
        MemKind::Image(image), InteropBinding::Gl(Arc::new(obj)))
}
