//! OpenCL / DirectX 9 media surface sharing.

#![allow(non_camel_case_types, dead_code, non_upper_case_globals)]

use crate::cl_h::{cl_command_type, cl_context_info, cl_image_info, cl_int, cl_mem_info, cl_uint};

pub type cl_dx9_media_adapter_type_khr = cl_uint;

// Error Codes
pub const CL_INVALID_DX9_MEDIA_ADAPTER_KHR: cl_int = -1010;
pub const CL_INVALID_DX9_MEDIA_SURFACE_KHR: cl_int = -1011;
pub const CL_DX9_MEDIA_SURFACE_ALREADY_ACQUIRED_KHR: cl_int = -1012;
pub const CL_DX9_MEDIA_SURFACE_NOT_ACQUIRED_KHR: cl_int = -1013;

// cl_media_adapter_type_khr
pub const CL_ADAPTER_D3D9_KHR: cl_dx9_media_adapter_type_khr = 0x2020;
pub const CL_ADAPTER_D3D9EX_KHR: cl_dx9_media_adapter_type_khr = 0x2021;
pub const CL_ADAPTER_DXVA_KHR: cl_dx9_media_adapter_type_khr = 0x2022;

// cl_context_info
pub const CL_CONTEXT_ADAPTER_D3D9_KHR: cl_context_info = 0x2025;

// cl_mem_info
pub const CL_MEM_DX9_MEDIA_ADAPTER_TYPE_KHR: cl_mem_info = 0x2028;
pub const CL_MEM_DX9_MEDIA_SURFACE_INFO_KHR: cl_mem_info = 0x2029;

// cl_image_info
pub const CL_IMAGE_DX9_MEDIA_PLANE_KHR: cl_image_info = 0x202A;

// cl_command_type
pub const CL_COMMAND_ACQUIRE_DX9_MEDIA_SURFACES_KHR: cl_command_type = 0x202B;
pub const CL_COMMAND_RELEASE_DX9_MEDIA_SURFACES_KHR: cl_command_type = 0x202C;

// D3DFORMAT FourCC / enum values with an OpenCL image format equivalent.
pub const D3DFMT_A8R8G8B8: cl_uint = 21;
pub const D3DFMT_X8R8G8B8: cl_uint = 22;
pub const D3DFMT_L8: cl_uint = 50;
pub const D3DFMT_R32F: cl_uint = 114;
pub const D3DFMT_A32B32G32R32F: cl_uint = 116;
pub const D3DFMT_NV12: cl_uint = 0x3231_564E;
pub const D3DFMT_YV12: cl_uint = 0x3231_5659;
