//! OpenCL-facing enums, flag sets and plain structures.

pub mod enums;
pub mod structs;

use std::fmt::Debug;


/// A primitive type usable as the element type of host-side slices handed to
/// buffer and image entry points.
///
/// ### Safety
///
/// Implementors must be plain old data: no padding, no pointers and valid for
/// every bit pattern, since device bytes are copied straight into them.
pub unsafe trait OclPrm: Copy + Clone + Default + PartialEq + Debug + Send + Sync + 'static {}

macro_rules! impl_ocl_prm {
    ( $( $t:ty ),* ) => {
        $( unsafe impl OclPrm for $t {} )*
    }
}

impl_ocl_prm!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize, f32, f64);
