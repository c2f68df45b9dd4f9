//! Utility functions: alignment, mip geometry, rectangle copies.
//!
//! Everything here is pure arithmetic except the `unsafe` rectangle copy and
//! fill helpers, which operate on raw pointers into allocations whose bounds
//! the caller has already validated.

use std::mem;
use std::ptr;
use std::slice;
use num_traits::PrimInt;
use crate::OclPrm;

//=============================================================================
//================================ ALIGNMENT ==================================
//=============================================================================

/// Pads `len` to the next multiple of `incr`.
///
/// An `incr` of zero returns `len` unchanged.
pub fn padded_len<T: PrimInt>(len: T, incr: T) -> T {
    if incr == T::zero() {
        return len;
    }
    let rem = len % incr;
    if rem == T::zero() { len } else { len + (incr - rem) }
}

/// Returns true if `val` is a multiple of `align`. Zero alignment always
/// passes.
pub fn is_aligned<T: PrimInt>(val: T, align: T) -> bool {
    align == T::zero() || val % align == T::zero()
}

//=============================================================================
//================================ MIP LEVELS =================================
//=============================================================================

/// Size of a dimension at mip level `level`: halves per level, never below 1.
#[inline]
pub fn mip_dim(dim: usize, level: u32) -> usize {
    if level as usize >= mem::size_of::<usize>() * 8 {
        return 1;
    }
    ::std::cmp::max(1, dim >> level)
}

/// Number of mip levels a full chain of an image with the given largest
/// dimension has (`floor(log2(max_dim)) + 1`).
pub fn full_mip_chain_len(max_dim: usize) -> u32 {
    if max_dim == 0 {
        return 0;
    }
    (mem::size_of::<usize>() * 8) as u32 - max_dim.leading_zeros()
}

//=============================================================================
//================================= OVERLAP ===================================
//=============================================================================

/// Returns true if the half-open intervals `[a, a + len)` and `[b, b + len)`
/// intersect.
#[inline]
pub fn intervals_overlap(a: usize, b: usize, len: usize) -> bool {
    len != 0 && a < b.saturating_add(len) && b < a.saturating_add(len)
}

/// Returns true if two equally sized boxes intersect on every axis.
pub fn boxes_overlap(a_origin: [usize; 3], b_origin: [usize; 3], region: [usize; 3]) -> bool {
    (0..3).all(|i| intervals_overlap(a_origin[i], b_origin[i], region[i]))
}

//=============================================================================
//================================== RECTS ====================================
//=============================================================================

/// A box inside a linear allocation. `origin[0]` and `region[0]` are in
/// bytes, the other two axes are in rows and slices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub origin: [usize; 3],
    pub region: [usize; 3],
    pub row_pitch: usize,
    pub slice_pitch: usize,
}

impl Rect {
    pub fn new(origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize)
            -> Rect {
        Rect { origin, region, row_pitch, slice_pitch }
    }

    /// A flat `[offset, offset + size)` range.
    pub fn linear(offset: usize, size: usize) -> Rect {
        Rect::new([offset, 0, 0], [size, 1, 1], size, size)
    }

    /// Converts element coordinates (x in pixels) to a byte rect.
    pub fn from_elements(origin: [usize; 3], region: [usize; 3], elem_size: usize,
            row_pitch: usize, slice_pitch: usize) -> Rect {
        Rect::new([origin[0] * elem_size, origin[1], origin[2]],
            [region[0] * elem_size, region[1], region[2]], row_pitch, slice_pitch)
    }

    /// Byte offset of `origin`. Only meaningful for a rect that has passed
    /// `checked_end`.
    pub fn offset(&self) -> usize {
        self.origin[2] * self.slice_pitch + self.origin[1] * self.row_pitch + self.origin[0]
    }

    /// One past the last byte touched by the rect, or `offset()` for an empty
    /// rect. Only meaningful for a rect that has passed `checked_end`.
    pub fn end(&self) -> usize {
        if self.is_empty() {
            return self.offset();
        }
        (self.origin[2] + self.region[2] - 1) * self.slice_pitch
            + (self.origin[1] + self.region[1] - 1) * self.row_pitch
            + self.origin[0] + self.region[0]
    }

    /// `offset()`, or `None` if it does not fit in a `usize`.
    pub fn checked_offset(&self) -> Option<usize> {
        self.origin[2].checked_mul(self.slice_pitch)?
            .checked_add(self.origin[1].checked_mul(self.row_pitch)?)?
            .checked_add(self.origin[0])
    }

    /// `end()`, or `None` if any step of it overflows.
    pub fn checked_end(&self) -> Option<usize> {
        if self.is_empty() {
            return self.checked_offset();
        }
        let last = |o: usize, r: usize| o.checked_add(r - 1);
        let slices = last(self.origin[2], self.region[2])?.checked_mul(self.slice_pitch)?;
        let rows = last(self.origin[1], self.region[1])?.checked_mul(self.row_pitch)?;
        slices.checked_add(rows)?
            .checked_add(self.origin[0])?
            .checked_add(self.region[0])
    }

    /// Number of bytes in the region proper (gaps excluded).
    pub fn bytes(&self) -> usize {
        self.region[0] * self.region[1] * self.region[2]
    }

    pub fn is_empty(&self) -> bool {
        self.region.iter().any(|&r| r == 0)
    }

    /// The same rect shifted so its first byte sits at offset 0.
    pub fn rebased(&self) -> Rect {
        Rect::new([0, 0, 0], self.region, self.row_pitch, self.slice_pitch)
    }
}

/// Copies the bytes of `src_rect` in `src` into `dst_rect` in `dst`, row by
/// row. Only `src_rect.region` is used as the extent.
///
/// ### Safety
///
/// Both rects must lie inside their allocations. Overlapping ranges are
/// permitted (`ptr::copy` semantics per row).
pub unsafe fn copy_rect(src: *const u8, src_rect: &Rect, dst: *mut u8, dst_rect: &Rect) {
    let region = src_rect.region;

    for z in 0..region[2] {
        for y in 0..region[1] {
            let src_ofs = (src_rect.origin[2] + z) * src_rect.slice_pitch
                + (src_rect.origin[1] + y) * src_rect.row_pitch + src_rect.origin[0];
            let dst_ofs = (dst_rect.origin[2] + z) * dst_rect.slice_pitch
                + (dst_rect.origin[1] + y) * dst_rect.row_pitch + dst_rect.origin[0];
            ptr::copy(src.add(src_ofs), dst.add(dst_ofs), region[0]);
        }
    }
}

/// Repeats `pattern` across every row of `rect` in `dst`.
///
/// ### Safety
///
/// `rect` must lie inside the allocation and `rect.region[0]` must be a
/// multiple of `pattern.len()`.
pub unsafe fn fill_rect(dst: *mut u8, rect: &Rect, pattern: &[u8]) {
    debug_assert!(!pattern.is_empty() && rect.region[0] % pattern.len() == 0);

    for z in 0..rect.region[2] {
        for y in 0..rect.region[1] {
            let row = dst.add((rect.origin[2] + z) * rect.slice_pitch
                + (rect.origin[1] + y) * rect.row_pitch + rect.origin[0]);
            for i in 0..(rect.region[0] / pattern.len()) {
                ptr::copy_nonoverlapping(pattern.as_ptr(), row.add(i * pattern.len()),
                    pattern.len());
            }
        }
    }
}

//=============================================================================
//================================ BYTE VIEWS =================================
//=============================================================================

/// Views a slice of primitives as raw bytes.
pub fn as_bytes<T: OclPrm>(data: &[T]) -> &[u8] {
    unsafe { slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * mem::size_of::<T>()) }
}
