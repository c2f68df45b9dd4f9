//! OpenCL C type aliases and constants.
//!
//! Unlike a binding crate this one declares no `extern` functions: the
//! numbers here are the ones an OpenCL *implementation* hands back through
//! its entry points (status codes, object type tags, info enums and flag
//! bits), together with the Khronos sharing extensions (D3D9 media, D3D10,
//! D3D11, GL) and the AMD memory extensions.
//!
//! ### Official Documentation
//!
//! [OpenCL 2.0 Reference Pages](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/)

mod cl_h;
mod cl_gl_h;
mod cl_d3d10_h;
mod cl_d3d11_h;
mod cl_dx9_media_sharing_h;
mod cl_ext_amd;

pub use libc::{c_void, size_t};

pub use self::cl_h::*;
pub use self::cl_gl_h::*;
pub use self::cl_d3d10_h::*;
pub use self::cl_d3d11_h::*;
pub use self::cl_dx9_media_sharing_h::*;
pub use self::cl_ext_amd::*;
