//! Images, mip-level views and format views.
//!
//! Device layout: level 0 uses the image's row and slice pitch (which are
//! also the host layout), higher levels follow it tightly packed. A view of
//! level `k` is a window at the byte offset of level `k` in the parent's
//! storage, so it shares every device allocation of the parent.

use std::sync::Arc;
use half::f16;
use crate::error::ClResult;
use crate::memory::{MemKind, Memory, MemoryInit};
use crate::util::{self, Rect};
use crate::validate;
use crate::{ImageChannelDataType, ImageChannelOrder, ImageFillColor, ImageFormat, MemFlags,
    MemObjectType, Status};


/// Image-specific state.
#[derive(Clone, Debug)]
pub struct ImageDesc {
    pub(crate) image_type: MemObjectType,
    pub(crate) format: ImageFormat,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) depth: usize,
    pub(crate) array_size: usize,
    pub(crate) row_pitch: usize,
    pub(crate) slice_pitch: usize,
    pub(crate) num_mip_levels: u32,
    pub(crate) base_mip_level: u32,
    pub(crate) num_samples: u32,
    /// Plane of a planar interop surface.
    pub(crate) plane: u32,
}

impl ImageDesc {
    /// `dims` is `[width, height, depth, array_size]`; unused entries are 1.
    pub(crate) fn new(image_type: MemObjectType, format: ImageFormat, dims: [usize; 4],
            row_pitch: usize, slice_pitch: usize, num_mip_levels: u32, num_samples: u32)
            -> ImageDesc {
        ImageDesc {
            image_type,
            format,
            width: dims[0],
            height: dims[1],
            depth: dims[2],
            array_size: dims[3],
            row_pitch,
            slice_pitch,
            num_mip_levels: ::std::cmp::max(1, num_mip_levels),
            base_mip_level: 0,
            num_samples: ::std::cmp::max(1, num_samples),
            plane: 0,
        }
    }

    pub(crate) fn with_plane(mut self, plane: u32) -> ImageDesc {
        self.plane = plane;
        self
    }

    pub fn elem_size(&self) -> usize {
        self.format.pixel_bytes()
    }

    /// `[width, height, depth, array_size]` at `level`.
    pub fn level_dims(&self, level: u32) -> [usize; 4] {
        let (h, d) = match self.image_type {
            MemObjectType::Image2d | MemObjectType::Image2dArray => {
                (util::mip_dim(self.height, level), 1)
            },
            MemObjectType::Image3d => {
                (util::mip_dim(self.height, level), util::mip_dim(self.depth, level))
            },
            _ => (1, 1),
        };
        [util::mip_dim(self.width, level), h, d, self.array_size]
    }

    /// `(row_pitch, slice_pitch)` at `level`.
    pub fn level_pitches(&self, level: u32) -> (usize, usize) {
        if level == 0 {
            return (self.row_pitch, self.slice_pitch);
        }
        let dims = self.level_dims(level);
        let row = dims[0] * self.elem_size();
        let slice = match self.image_type {
            MemObjectType::Image1dArray => row,
            _ => row * dims[1],
        };
        (row, slice)
    }

    /// Bytes occupied by `level`.
    pub fn level_size(&self, level: u32) -> usize {
        let dims = self.level_dims(level);
        let (row, slice) = self.level_pitches(level);
        match self.image_type {
            MemObjectType::Image2d => row * dims[1],
            MemObjectType::Image1dArray | MemObjectType::Image2dArray => slice * dims[3],
            MemObjectType::Image3d => slice * dims[2],
            _ => row,
        }
    }

    /// Byte offset of `level` from the start of level 0.
    pub fn level_offset(&self, level: u32) -> usize {
        (0..level).map(|l| self.level_size(l)).sum()
    }

    /// Bytes occupied by the whole mip chain.
    pub fn storage_size(&self) -> usize {
        self.level_offset(self.num_mip_levels)
    }

    /// Level `level` of this image seen as its own image, with `format`.
    fn level_view(&self, level: u32, format: ImageFormat) -> ImageDesc {
        let dims = self.level_dims(level);
        let (row_pitch, slice_pitch) = self.level_pitches(level);
        ImageDesc {
            image_type: self.image_type,
            format,
            width: dims[0],
            height: dims[1],
            depth: dims[2],
            array_size: dims[3],
            row_pitch,
            slice_pitch,
            num_mip_levels: self.num_mip_levels - level,
            base_mip_level: self.base_mip_level + level,
            num_samples: self.num_samples,
            plane: self.plane,
        }
    }

    /// Per-coordinate extent, counting the array index as a coordinate.
    fn coord_extent(&self) -> [usize; 3] {
        match self.image_type {
            MemObjectType::Image1dArray => [self.width, self.array_size, 1],
            MemObjectType::Image2d => [self.width, self.height, 1],
            MemObjectType::Image2dArray => [self.width, self.height, self.array_size],
            MemObjectType::Image3d => [self.width, self.height, self.depth],
            _ => [self.width, 1, 1],
        }
    }
}


/// An image view of a memory object.
#[derive(Clone, Copy, Debug)]
pub struct Image<'a> {
    mem: &'a Memory,
    desc: &'a ImageDesc,
}

impl<'a> Image<'a> {
    pub(crate) fn new(mem: &'a Memory, desc: &'a ImageDesc) -> Image<'a> {
        Image { mem, desc }
    }

    pub fn memory(&self) -> &'a Memory {
        self.mem
    }

    pub fn desc(&self) -> &'a ImageDesc {
        self.desc
    }

    pub fn image_type(&self) -> MemObjectType { self.desc.image_type }
    pub fn format(&self) -> ImageFormat { self.desc.format }
    pub fn elem_size(&self) -> usize { self.desc.elem_size() }
    pub fn width(&self) -> usize { self.desc.width }
    pub fn height(&self) -> usize { self.desc.height }
    pub fn depth(&self) -> usize { self.desc.depth }
    pub fn array_size(&self) -> usize { self.desc.array_size }
    pub fn row_pitch(&self) -> usize { self.desc.row_pitch }
    pub fn slice_pitch(&self) -> usize { self.desc.slice_pitch }
    pub fn num_mip_levels(&self) -> u32 { self.desc.num_mip_levels }
    pub fn base_mip_level(&self) -> u32 { self.desc.base_mip_level }
    pub fn num_samples(&self) -> u32 { self.desc.num_samples }
    pub fn plane(&self) -> u32 { self.desc.plane }

    /// Checks a pixel region of level 0 against the image bounds.
    ///
    /// Coordinates the image type uses (the array index counts as one) must
    /// have a non-zero extent ending inside the image; the others must have
    /// origin 0 and extent 1.
    pub fn validate_region(&self, origin: [usize; 3], region: [usize; 3]) -> ClResult<()> {
        let dims = self.desc.image_type.coord_dims();
        let extent = self.desc.coord_extent();

        for i in 0..3 {
            if i < dims {
                let end = origin[i].checked_add(region[i]).ok_or(Status::CL_INVALID_VALUE)?;
                if region[i] == 0 || end > extent[i] {
                    return Err(Status::CL_INVALID_VALUE);
                }
            } else if origin[i] != 0 || region[i] != 1 {
                return Err(Status::CL_INVALID_VALUE);
            }
        }
        Ok(())
    }

    /// Returns true if the region is valid and covers all of level 0.
    pub fn is_entirely_covered(&self, origin: [usize; 3], region: [usize; 3]) -> bool {
        let dims = self.desc.image_type.coord_dims();
        let extent = self.desc.coord_extent();

        self.validate_region(origin, region).is_ok()
            && (0..dims).all(|i| origin[i] == 0 && region[i] == extent[i])
    }

    /// Byte rect of a pixel region in the level 0 layout.
    pub fn rect(&self, origin: [usize; 3], region: [usize; 3]) -> Rect {
        let e = self.elem_size();
        match self.desc.image_type {
            // The array index of a 1D array strides by the slice pitch.
            MemObjectType::Image1dArray => Rect::new([origin[0] * e, 0, origin[1]],
                [region[0] * e, 1, region[1]], self.desc.row_pitch, self.desc.slice_pitch),
            _ => Rect::from_elements(origin, region, e, self.desc.row_pitch,
                self.desc.slice_pitch),
        }
    }

    /// Byte rect of a pixel region in a linear host layout with the given
    /// pitches (zero for tightly packed).
    pub fn host_rect(&self, region: [usize; 3], row_pitch: usize, slice_pitch: usize)
            -> ClResult<Rect> {
        let width = region[0].checked_mul(self.elem_size()).ok_or(Status::CL_INVALID_VALUE)?;
        let row = match row_pitch {
            0 => width,
            p if p < width => return Err(Status::CL_INVALID_VALUE),
            p => p,
        };

        let rows_per_slice = match self.desc.image_type {
            MemObjectType::Image1dArray => 1,
            _ => region[1],
        };
        let min_slice = row.checked_mul(rows_per_slice).ok_or(Status::CL_INVALID_VALUE)?;
        let slice = match slice_pitch {
            0 => min_slice,
            p if p < min_slice => return Err(Status::CL_INVALID_VALUE),
            p => p,
        };

        let rect = match self.desc.image_type {
            MemObjectType::Image1dArray => {
                Rect::new([0, 0, 0], [width, 1, region[1]], row, slice)
            },
            _ => Rect::new([0, 0, 0], [width, region[1], region[2]], row, slice),
        };
        rect.checked_end().map(|_| rect).ok_or(Status::CL_INVALID_VALUE)
    }
}


/// Creates a view of mip level `base_mip_level` of `parent`, optionally
/// reinterpreted as `format`.
///
/// The view shares the parent's storage and keeps the parent alive. Its
/// geometry is the parent's halved per level (never below 1); array sizes
/// are unchanged.
pub(crate) fn create_image_view(parent: &Arc<Memory>, format: Option<ImageFormat>,
        base_mip_level: u32, flags: MemFlags) -> ClResult<Arc<Memory>> {
    let desc = match parent.as_image() {
        Some(image) => image.desc().clone(),
        None => return Err(Status::CL_INVALID_MEM_OBJECT),
    };

    if base_mip_level >= desc.num_mip_levels {
        return Err(Status::CL_INVALID_MIP_LEVEL);
    }

    let format = format.unwrap_or(desc.format);
    if format != desc.format && !validate::formats_view_compatible(&desc.format, &format) {
        return Err(Status::CL_INVALID_IMAGE_FORMAT_DESCRIPTOR);
    }

    validate::validate_matching_buffer_flags(parent.mem_flags(), flags)?;
    let flags = validate::inherit_mem_flags(flags, parent.mem_flags());

    let origin = desc.level_offset(base_mip_level);
    let view_desc = desc.level_view(base_mip_level, format);
    let size = view_desc.storage_size();

    let mut init = MemoryInit::view(parent, origin, desc.image_type, flags, size,
        MemKind::Image(view_desc));
    init.interop = parent.interop().cloned();

    let view = Arc::new(Memory::new(init));
    view.create(None, true)?;
    parent.add_sub_buffer(&view);

    trace!("Memory {}: view {} of mip level {} ({:?}).", parent.id(), view.id(),
        base_mip_level, format);
    Ok(view)
}

/// Selects the mip level addressed by `origin`.
///
/// The level sits in the coordinate following the ones the image type uses.
/// For mipmapped images it is consumed (reset to 0) and a view of that level
/// is returned, so the remaining coordinates are validated in the view's
/// space. 2D arrays and 3D images have no free coordinate and always
/// address level 0.
pub(crate) fn resolve_mip_level(mem: &Arc<Memory>, origin: &mut [usize; 3])
        -> ClResult<Arc<Memory>> {
    let (slot, levels) = match mem.as_image() {
        Some(image) => (image.image_type().coord_dims(), image.num_mip_levels()),
        None => return Err(Status::CL_INVALID_MEM_OBJECT),
    };

    if levels <= 1 || slot >= 3 {
        return Ok(mem.clone());
    }

    let level = origin[slot];
    if level >= levels as usize {
        return Err(Status::CL_INVALID_MIP_LEVEL);
    }
    origin[slot] = 0;

    if level == 0 {
        Ok(mem.clone())
    } else {
        create_image_view(mem, None, level as u32, MemFlags::empty())
    }
}


//=============================================================================
//================================ FILL COLORS ================================
//=============================================================================

/// Linear to sRGB transfer function.
fn srgb_encode(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Encodes `color` as one pixel of `format`.
///
/// The color variant must match the channel data type class. Packed and
/// depth-stencil formats cannot be filled.
pub(crate) fn fill_pattern(format: &ImageFormat, color: &ImageFillColor) -> ClResult<Vec<u8>> {
    use self::ImageChannelOrder::*;
    use self::ImageChannelDataType as Dt;

    // Source color channel of each stored channel; `None` is padding.
    let channels: &[Option<usize>] = match format.channel_order {
        R | Depth | Luminance | Intensity => &[Some(0)],
        A => &[Some(3)],
        Rx => &[Some(0), None],
        Rg => &[Some(0), Some(1)],
        Ra => &[Some(0), Some(3)],
        Rgx => &[Some(0), Some(1), None, None],
        Srgb => &[Some(0), Some(1), Some(2)],
        Srgbx => &[Some(0), Some(1), Some(2), None],
        Rgba | Srgba => &[Some(0), Some(1), Some(2), Some(3)],
        Bgra | Sbgra => &[Some(2), Some(1), Some(0), Some(3)],
        Argb => &[Some(3), Some(0), Some(1), Some(2)],
        Abgr => &[Some(3), Some(2), Some(1), Some(0)],
        Rgb | Rgbx | DepthStencil => return Err(Status::CL_INVALID_VALUE),
    };
    if format.channel_data_type.is_packed() || format.pixel_bytes() == 0 {
        return Err(Status::CL_INVALID_VALUE);
    }

    let srgb = format.channel_order.is_srgb();
    let mut pattern = Vec::with_capacity(format.pixel_bytes());

    for &ch in channels {
        match (*color, format.channel_data_type) {
            (ImageFillColor::Float(c), dt) => {
                let mut v = ch.map_or(0.0, |i| c[i]);
                if srgb && ch != Some(3) {
                    v = srgb_encode(v.max(0.0).min(1.0));
                }
                let unorm = |max: f32| (v.max(0.0).min(1.0) * max).round();
                let snorm = |max: f32| (v.max(-1.0).min(1.0) * max).round();
                match dt {
                    Dt::UnormInt8 => pattern.push(unorm(255.0) as u8),
                    Dt::UnormInt16 => pattern.extend_from_slice(&(unorm(65535.0) as u16).to_ne_bytes()),
                    Dt::SnormInt8 => pattern.push(snorm(127.0) as i8 as u8),
                    Dt::SnormInt16 => pattern.extend_from_slice(&(snorm(32767.0) as i16).to_ne_bytes()),
                    Dt::HalfFloat => pattern.extend_from_slice(&f16::from_f32(v).to_ne_bytes()),
                    Dt::Float => pattern.extend_from_slice(&v.to_ne_bytes()),
                    _ => return Err(Status::CL_INVALID_VALUE),
                }
            },
            (ImageFillColor::Int(c), dt) => {
                let v = ch.map_or(0, |i| c[i]);
                match dt {
                    Dt::SignedInt8 => pattern.push(v.max(-128).min(127) as i8 as u8),
                    Dt::SignedInt16 => {
                        pattern.extend_from_slice(&(v.max(-32768).min(32767) as i16).to_ne_bytes())
                    },
                    Dt::SignedInt32 => pattern.extend_from_slice(&v.to_ne_bytes()),
                    _ => return Err(Status::CL_INVALID_VALUE),
                }
            },
            (ImageFillColor::Uint(c), dt) => {
                let v = ch.map_or(0, |i| c[i]);
                match dt {
                    Dt::UnsignedInt8 => pattern.push(v.min(0xff) as u8),
                    Dt::UnsignedInt16 => pattern.extend_from_slice(&(v.min(0xffff) as u16).to_ne_bytes()),
                    Dt::UnsignedInt32 => pattern.extend_from_slice(&v.to_ne_bytes()),
                    _ => return Err(Status::CL_INVALID_VALUE),
                }
            },
        }
    }

    if pattern.len() != format.pixel_bytes() {
        return Err(Status::CL_INVALID_IMAGE_FORMAT_DESCRIPTOR);
    }
    Ok(pattern)
}
