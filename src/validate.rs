//! Stateless argument validation shared by every memory entry point.
//!
//! Nothing here touches device state. Functions return the raw `Status` an
//! entry point reports on failure.

use crate::device::Device;
use crate::error::ClResult;
use crate::memory::Memory;
use crate::util::{self, Rect};
use crate::{ImageDescriptor, ImageFormat, MapFlags, MemFlags, MemObjectType, Status};

//=============================================================================
//=================================== FLAGS ===================================
//=============================================================================

/// Checks a memory flag set for forbidden combinations.
///
/// At most one device access mode may be set (`KERNEL_READ_AND_WRITE`
/// counts as one when `check_read_write` is true), `USE_HOST_PTR` excludes
/// the other two host pointer modes and at most one host access restriction
/// may be set. The vendor external-physical flag excludes every host pointer
/// mode, the read-only and write-only modes and bus addressable memory; the
/// bus addressable flag excludes every host pointer mode.
pub fn validate_flags(flags: MemFlags, check_read_write: bool) -> ClResult<()> {
    let mut access_group = MemFlags::READ_WRITE | MemFlags::WRITE_ONLY | MemFlags::READ_ONLY;
    if check_read_write {
        access_group |= MemFlags::KERNEL_READ_AND_WRITE;
    }

    if (flags & access_group).bits().count_ones() > 1
        || (flags.contains(MemFlags::USE_HOST_PTR)
            && flags.intersects(MemFlags::ALLOC_HOST_PTR | MemFlags::COPY_HOST_PTR))
        || (flags & MemFlags::HOST_ACCESS).bits().count_ones() > 1
    {
        return Err(Status::CL_INVALID_VALUE);
    }

    if flags.contains(MemFlags::EXTERNAL_PHYSICAL_AMD)
        && flags.intersects(MemFlags::HOST_PTR_MODE | MemFlags::READ_ONLY | MemFlags::WRITE_ONLY
            | MemFlags::BUS_ADDRESSABLE_AMD)
    {
        return Err(Status::CL_INVALID_VALUE);
    }

    if flags.contains(MemFlags::BUS_ADDRESSABLE_AMD) && flags.intersects(MemFlags::HOST_PTR_MODE) {
        return Err(Status::CL_INVALID_VALUE);
    }

    Ok(())
}

/// Checks a host pointer against the host pointer mode.
///
/// A pointer is required by `USE_HOST_PTR` and `COPY_HOST_PTR` and refused
/// otherwise, except that external physical buffers carry their bus address
/// in it.
pub fn validate_host_ptr(flags: MemFlags, has_host_ptr: bool) -> ClResult<()> {
    let wants_ptr = flags.intersects(MemFlags::USE_HOST_PTR | MemFlags::COPY_HOST_PTR)
        || flags.contains(MemFlags::EXTERNAL_PHYSICAL_AMD);

    if wants_ptr != has_host_ptr {
        Err(Status::CL_INVALID_HOST_PTR)
    } else {
        Ok(())
    }
}

/// Checks a map flag set on its own: `WRITE_INVALIDATE_REGION` cannot be
/// combined with `READ` or `WRITE`.
pub fn validate_map_flags(map_flags: MapFlags) -> ClResult<()> {
    if map_flags.contains(MapFlags::WRITE_INVALIDATE_REGION)
        && map_flags.intersects(MapFlags::READ | MapFlags::WRITE)
    {
        return Err(Status::CL_INVALID_VALUE);
    }
    Ok(())
}

/// Checks a map direction against the object's host access restriction.
pub fn check_map_access(mem_flags: MemFlags, map_flags: MapFlags) -> ClResult<()> {
    if map_flags.contains(MapFlags::READ) {
        check_host_read(mem_flags)?;
    }
    if map_flags.is_write() {
        check_host_write(mem_flags)?;
    }
    Ok(())
}

/// `HOST_WRITE_ONLY` and `HOST_NO_ACCESS` forbid host reads.
pub fn check_host_read(mem_flags: MemFlags) -> ClResult<()> {
    if mem_flags.intersects(MemFlags::HOST_WRITE_ONLY | MemFlags::HOST_NO_ACCESS) {
        Err(Status::CL_INVALID_OPERATION)
    } else {
        Ok(())
    }
}

/// `HOST_READ_ONLY` and `HOST_NO_ACCESS` forbid host writes.
pub fn check_host_write(mem_flags: MemFlags) -> ClResult<()> {
    if mem_flags.intersects(MemFlags::HOST_READ_ONLY | MemFlags::HOST_NO_ACCESS) {
        Err(Status::CL_INVALID_OPERATION)
    } else {
        Ok(())
    }
}

/// Completes the flags of an object created from another one (sub-buffer,
/// image from buffer, image view).
///
/// Access mode and host access are inherited when not given. The host
/// pointer mode is always the parent's.
pub fn inherit_mem_flags(mut flags: MemFlags, parent_flags: MemFlags) -> MemFlags {
    if !flags.intersects(MemFlags::DEVICE_ACCESS) {
        flags |= parent_flags & MemFlags::DEVICE_ACCESS;
    }

    flags.remove(MemFlags::HOST_PTR_MODE);
    flags |= parent_flags & MemFlags::HOST_PTR_MODE;

    if !flags.intersects(MemFlags::HOST_ACCESS) {
        flags |= parent_flags & MemFlags::HOST_ACCESS;
    }

    flags
}

/// Checks the flags requested for an object created from another one
/// against the parent's flags. Requested flags are the caller's, before
/// inheritance.
pub fn validate_matching_buffer_flags(parent_flags: MemFlags, flags: MemFlags) -> ClResult<()> {
    let p = parent_flags;

    if (p.contains(MemFlags::WRITE_ONLY)
            && flags.intersects(MemFlags::READ_WRITE | MemFlags::READ_ONLY))
        || (p.contains(MemFlags::READ_ONLY)
            && flags.intersects(MemFlags::READ_WRITE | MemFlags::WRITE_ONLY))
        || flags.intersects(MemFlags::HOST_PTR_MODE)
        || (p.contains(MemFlags::HOST_WRITE_ONLY) && flags.contains(MemFlags::HOST_READ_ONLY))
        || (p.contains(MemFlags::HOST_READ_ONLY) && flags.contains(MemFlags::HOST_WRITE_ONLY))
        || (p.contains(MemFlags::HOST_NO_ACCESS)
            && flags.intersects(MemFlags::HOST_READ_ONLY | MemFlags::HOST_WRITE_ONLY))
    {
        return Err(Status::CL_INVALID_VALUE);
    }

    Ok(())
}

//=============================================================================
//================================== IMAGES ===================================
//=============================================================================

/// Returns the element size of `format`, or
/// `CL_INVALID_IMAGE_FORMAT_DESCRIPTOR` if order and type do not combine.
pub fn validate_image_format(format: &ImageFormat) -> ClResult<usize> {
    match format.pixel_bytes() {
        0 => Err(Status::CL_INVALID_IMAGE_FORMAT_DESCRIPTOR),
        size => Ok(size),
    }
}

/// Returns true if `a` and `b` may be viewed as each other: equal element
/// size and either the same channel order or an sRGB/linear or depth/red
/// pairing.
pub fn formats_view_compatible(a: &ImageFormat, b: &ImageFormat) -> bool {
    use crate::ImageChannelOrder::*;

    if a.pixel_bytes() == 0 || a.pixel_bytes() != b.pixel_bytes() {
        return false;
    }

    match (a.channel_order, b.channel_order) {
        (x, y) if x == y => true,
        (Rgba, Srgba) | (Srgba, Rgba) | (Bgra, Sbgra) | (Sbgra, Bgra) | (Rgb, Srgb)
            | (Srgb, Rgb) | (Rgbx, Srgbx) | (Srgbx, Rgbx) => true,
        (Depth, R) | (R, Depth) => true,
        _ => false,
    }
}

/// Geometry dimensions of a descriptor as `[width, height, depth, array]`,
/// each at least 1 where unused.
fn descriptor_dims(desc: &ImageDescriptor) -> ClResult<[usize; 4]> {
    let required = |v: usize| if v == 0 { Err(Status::CL_INVALID_IMAGE_DESCRIPTOR) } else { Ok(v) };

    let width = required(desc.image_width)?;
    Ok(match desc.image_type {
        MemObjectType::Image1d | MemObjectType::Image1dBuffer => [width, 1, 1, 1],
        MemObjectType::Image1dArray => [width, 1, 1, required(desc.image_array_size)?],
        MemObjectType::Image2d => [width, required(desc.image_height)?, 1, 1],
        MemObjectType::Image2dArray => {
            [width, required(desc.image_height)?, 1, required(desc.image_array_size)?]
        },
        MemObjectType::Image3d => {
            [width, required(desc.image_height)?, required(desc.image_depth)?, 1]
        },
        MemObjectType::Buffer | MemObjectType::Pipe => {
            return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR)
        },
    })
}

/// Returns true if some device holds an image of these dimensions.
fn dims_supported(devices: &[Device], image_type: MemObjectType, dims: &[usize; 4]) -> bool {
    devices.iter().any(|d| {
        let max = d.max_image_dims(image_type);
        d.info().image_support
            && dims[0] <= max[0] && dims[1] <= max[1] && dims[2] <= max[2]
            && (!image_type.is_array() || dims[3] <= d.info().image_max_array_size)
    })
}

/// Validates an image descriptor and returns its `(row_pitch, slice_pitch)`.
///
/// A zero pitch is computed (`width * elem` for rows; `row_pitch` for 1D
/// arrays, `row_pitch * height` for everything else, a height of 1 for 1D
/// images). Supplied pitches are only allowed with a host pointer or for 2D
/// images created from a buffer, and must be large enough and a multiple of
/// the element size (rows) or the row pitch (slices).
///
/// Returned pitches, fed back as explicit pitches with a host pointer,
/// validate unchanged.
pub fn validate_image_descriptor(devices: &[Device], format: &ImageFormat,
        desc: &ImageDescriptor, has_host_ptr: bool) -> ClResult<(usize, usize)> {
    let elem = validate_image_format(format)?;

    if !devices.iter().any(|d| d.info().image_support) {
        return Err(Status::CL_INVALID_OPERATION);
    }

    let dims = descriptor_dims(desc)?;
    if !dims_supported(devices, desc.image_type, &dims) {
        return Err(Status::CL_INVALID_IMAGE_SIZE);
    }

    // Buffer-backed images.
    let buffer_size = match desc.image_type {
        MemObjectType::Image1dBuffer => {
            let buffer = desc.buffer.as_ref().ok_or(Status::CL_INVALID_IMAGE_DESCRIPTOR)?;
            if buffer.mem_type() != MemObjectType::Buffer {
                return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR);
            }
            Some(buffer.size())
        },
        MemObjectType::Image2d => match desc.buffer {
            Some(ref buffer) if buffer.mem_type() == MemObjectType::Buffer => Some(buffer.size()),
            Some(_) => return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR),
            None => None,
        },
        _ => {
            if desc.buffer.is_some() {
                return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR);
            }
            None
        },
    };

    let pitch_allowed = has_host_ptr
        || (desc.image_type == MemObjectType::Image2d && buffer_size.is_some());
    if !pitch_allowed && (desc.image_row_pitch != 0 || desc.image_slice_pitch != 0) {
        return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR);
    }

    let min_row = dims[0] * elem;
    let row_pitch = match desc.image_row_pitch {
        0 => min_row,
        p if p < min_row || p % elem != 0 => return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR),
        p => p,
    };

    let min_slice = match desc.image_type {
        MemObjectType::Image1dArray => row_pitch,
        _ => row_pitch * dims[1],
    };
    let slice_pitch = match desc.image_slice_pitch {
        0 => min_slice,
        p if p < min_slice || p % row_pitch != 0 => {
            return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR)
        },
        p => p,
    };

    if let Some(buffer_size) = buffer_size {
        let needed = match desc.image_type {
            MemObjectType::Image1dBuffer => dims[0] * elem,
            _ => row_pitch * dims[1],
        };
        if needed > buffer_size {
            return Err(Status::CL_INVALID_IMAGE_SIZE);
        }
    }

    let levels = ::std::cmp::max(1, desc.num_mip_levels);
    if levels > 1 {
        let max_dim = match desc.image_type {
            MemObjectType::Image3d => dims[0].max(dims[1]).max(dims[2]),
            _ => dims[0].max(dims[1]),
        };
        if buffer_size.is_some() || levels > util::full_mip_chain_len(max_dim)
            || !devices.iter().any(|d| d.info().max_mip_levels >= levels)
        {
            return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR);
        }
        if has_host_ptr {
            return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR);
        }
    }

    let samples = ::std::cmp::max(1, desc.num_samples);
    if samples > 1 && !devices.iter().any(|d| d.info().max_samples >= samples) {
        return Err(Status::CL_INVALID_IMAGE_DESCRIPTOR);
    }

    if !devices.iter().any(|d| d.supports_image_format(format)) {
        return Err(Status::CL_IMAGE_FORMAT_NOT_SUPPORTED);
    }

    Ok((row_pitch, slice_pitch))
}

/// Returns every format supported by at least one device, sorted.
pub fn supported_image_formats(devices: &[Device]) -> Vec<ImageFormat> {
    let mut formats: Vec<ImageFormat> = devices.iter()
        .filter(|d| d.info().image_support)
        .flat_map(|d| d.info().image_formats.iter().cloned())
        .collect();
    formats.sort();
    formats.dedup();
    formats
}

//=============================================================================
//================================== REGIONS ==================================
//=============================================================================

/// Validates a rectangular access into a linear allocation of `size` bytes
/// and returns the resulting byte rect.
///
/// Zero pitches default to `region[0]` and `row_pitch * region[1]`. A
/// supplied row pitch must cover the region width; a supplied slice pitch
/// must cover a full slice and be a multiple of the row pitch.
pub fn validate_buffer_rect(size: usize, origin: [usize; 3], region: [usize; 3],
        row_pitch: usize, slice_pitch: usize) -> ClResult<Rect> {
    if region.iter().any(|&r| r == 0) {
        return Err(Status::CL_INVALID_VALUE);
    }

    let row_pitch = match row_pitch {
        0 => region[0],
        p if p < region[0] => return Err(Status::CL_INVALID_VALUE),
        p => p,
    };
    let min_slice = row_pitch.checked_mul(region[1]).ok_or(Status::CL_INVALID_VALUE)?;
    let slice_pitch = match slice_pitch {
        0 => min_slice,
        p if p < min_slice || p % row_pitch != 0 => return Err(Status::CL_INVALID_VALUE),
        p => p,
    };

    let rect = Rect::new(origin, region, row_pitch, slice_pitch);
    match rect.checked_end() {
        Some(end) if end <= size => Ok(rect),
        _ => Err(Status::CL_INVALID_VALUE),
    }
}

//=============================================================================
//================================== OVERLAP ==================================
//=============================================================================

/// Fails with `CL_MEM_COPY_OVERLAP` if two byte ranges of buffers sharing
/// storage intersect. Buffers on distinct storage never overlap.
pub fn check_buffer_copy_overlap(src: &Memory, src_offset: usize, dst: &Memory,
        dst_offset: usize, size: usize) -> ClResult<()> {
    let (src_key, src_base) = src.storage_key();
    let (dst_key, dst_base) = dst.storage_key();

    if src_key == dst_key && util::intervals_overlap(src_base + src_offset,
            dst_base + dst_offset, size) {
        return Err(Status::CL_MEM_COPY_OVERLAP);
    }
    Ok(())
}

/// Fails with `CL_MEM_COPY_OVERLAP` if two byte rects in memory objects
/// sharing storage touch a common byte span.
pub fn check_rect_copy_overlap(src: &Memory, src_rect: &Rect, dst: &Memory, dst_rect: &Rect)
        -> ClResult<()> {
    let (src_key, src_base) = src.storage_key();
    let (dst_key, dst_base) = dst.storage_key();
    if src_key != dst_key {
        return Ok(());
    }

    // Identical layouts compare box against box; anything else falls back
    // to the spanned byte ranges.
    let overlap = if src_base == dst_base && src_rect.row_pitch == dst_rect.row_pitch
            && src_rect.slice_pitch == dst_rect.slice_pitch {
        util::boxes_overlap(src_rect.origin, dst_rect.origin, src_rect.region)
    } else {
        let (a0, a1) = (src_base + src_rect.offset(), src_base + src_rect.end());
        let (b0, b1) = (dst_base + dst_rect.offset(), dst_base + dst_rect.end());
        a0 < b1 && b0 < a1
    };

    if overlap {
        Err(Status::CL_MEM_COPY_OVERLAP)
    } else {
        Ok(())
    }
}

/// Fails with `CL_MEM_COPY_OVERLAP` if two pixel boxes in the same image
/// intersect on every axis.
pub fn check_image_copy_overlap(src: &Memory, src_origin: [usize; 3], dst: &Memory,
        dst_origin: [usize; 3], region: [usize; 3]) -> ClResult<()> {
    if src.storage_key() == dst.storage_key()
            && util::boxes_overlap(src_origin, dst_origin, region) {
        return Err(Status::CL_MEM_COPY_OVERLAP);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_rect_defaults_pitches() {
        let rect = validate_buffer_rect(1024, [0, 0, 0], [16, 4, 2], 0, 0).unwrap();
        assert_eq!(rect.row_pitch, 16);
        assert_eq!(rect.slice_pitch, 64);
        assert_eq!(rect.end(), 128);

        assert_eq!(validate_buffer_rect(1024, [0, 0, 0], [16, 4, 2], 8, 0).unwrap_err(),
            Status::CL_INVALID_VALUE);
        assert_eq!(validate_buffer_rect(1024, [0, 0, 0], [16, 4, 2], 32, 96).unwrap_err(),
            Status::CL_INVALID_VALUE);
        assert_eq!(validate_buffer_rect(100, [0, 0, 0], [16, 4, 2], 0, 0).unwrap_err(),
            Status::CL_INVALID_VALUE);
        assert_eq!(validate_buffer_rect(1024, [0, 0, 0], [16, 0, 2], 0, 0).unwrap_err(),
            Status::CL_INVALID_VALUE);

        // Host-side rects are checked against the whole address space.
        let max = usize::max_value();
        assert_eq!(validate_buffer_rect(max, [0, 0, 0], [16, 4, 2], max / 2, 0).unwrap_err(),
            Status::CL_INVALID_VALUE);
        assert_eq!(validate_buffer_rect(max, [0, 0, max / 2], [16, 4, 2], 0, 0).unwrap_err(),
            Status::CL_INVALID_VALUE);
    }

    #[test]
    fn map_flag_combinations() {
        assert!(validate_map_flags(MapFlags::READ | MapFlags::WRITE).is_ok());
        assert!(validate_map_flags(MapFlags::WRITE_INVALIDATE_REGION).is_ok());
        assert_eq!(validate_map_flags(MapFlags::READ | MapFlags::WRITE_INVALIDATE_REGION)
            .unwrap_err(), Status::CL_INVALID_VALUE);

        assert_eq!(check_map_access(MemFlags::HOST_WRITE_ONLY, MapFlags::READ).unwrap_err(),
            Status::CL_INVALID_OPERATION);
        assert!(check_map_access(MemFlags::HOST_WRITE_ONLY, MapFlags::WRITE).is_ok());
        assert_eq!(check_map_access(MemFlags::HOST_READ_ONLY,
            MapFlags::WRITE_INVALIDATE_REGION).unwrap_err(), Status::CL_INVALID_OPERATION);
        assert!(check_map_access(MemFlags::HOST_NO_ACCESS, MapFlags::empty()).is_ok());
    }

    #[test]
    fn inherited_flags() {
        let parent = MemFlags::READ_ONLY | MemFlags::USE_HOST_PTR | MemFlags::HOST_READ_ONLY;
        assert_eq!(inherit_mem_flags(MemFlags::empty(), parent), parent);
        assert_eq!(inherit_mem_flags(MemFlags::HOST_NO_ACCESS, parent),
            MemFlags::READ_ONLY | MemFlags::USE_HOST_PTR | MemFlags::HOST_NO_ACCESS);

        assert!(validate_matching_buffer_flags(parent, MemFlags::READ_ONLY).is_ok());
        assert!(validate_matching_buffer_flags(parent, MemFlags::WRITE_ONLY).is_err());
        assert!(validate_matching_buffer_flags(parent, MemFlags::COPY_HOST_PTR).is_err());
        assert!(validate_matching_buffer_flags(parent, MemFlags::HOST_WRITE_ONLY).is_err());
    }

    #[test]
    fn view_compatible_formats() {
        use crate::{ImageChannelOrder as O, ImageChannelDataType as T};
        let rgba = ImageFormat::new(O::Rgba, T::UnormInt8);
        let srgba = ImageFormat::new(O::Srgba, T::UnormInt8);
        let r32 = ImageFormat::new(O::R, T::Float);
        let rgba16 = ImageFormat::new(O::Rgba, T::UnormInt16);
        assert!(formats_view_compatible(&rgba, &srgba));
        assert!(!formats_view_compatible(&rgba, &rgba16));
        assert!(!formats_view_compatible(&rgba, &r32));

        // Same size and channel count, but a different channel order.
        let bgra = ImageFormat::new(O::Bgra, T::UnormInt8);
        let argb = ImageFormat::new(O::Argb, T::UnormInt8);
        assert!(!formats_view_compatible(&rgba, &bgra));
        assert!(!formats_view_compatible(&bgra, &rgba));
        assert!(!formats_view_compatible(&rgba, &argb));
        assert!(!formats_view_compatible(&ImageFormat::new(O::Rg, T::UnormInt16),
            &ImageFormat::new(O::Ra, T::UnormInt16)));
        assert!(formats_view_compatible(&ImageFormat::new(O::Depth, T::Float), &r32));
    }
}
