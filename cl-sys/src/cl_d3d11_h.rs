//! OpenCL / DirectX 11 sharing.

#![allow(non_camel_case_types, dead_code, non_upper_case_globals)]

use crate::cl_h::{cl_command_type, cl_context_info, cl_image_info, cl_int, cl_mem_info, cl_uint};

pub type cl_d3d11_device_source = cl_uint;
pub type cl_d3d11_device_set = cl_uint;

// Error Codes
pub const CL_INVALID_D3D11_DEVICE_KHR: cl_int = -1006;
pub const CL_INVALID_D3D11_RESOURCE_KHR: cl_int = -1007;
pub const CL_D3D11_RESOURCE_ALREADY_ACQUIRED_KHR: cl_int = -1008;
pub const CL_D3D11_RESOURCE_NOT_ACQUIRED_KHR: cl_int = -1009;

// cl_d3d11_device_source
pub const CL_D3D11_DEVICE_KHR: cl_d3d11_device_source = 0x4019;
pub const CL_D3D11_DXGI_ADAPTER_KHR: cl_d3d11_device_source = 0x401A;

// cl_context_info
pub const CL_CONTEXT_D3D11_DEVICE_KHR: cl_context_info = 0x401D;
pub const CL_CONTEXT_D3D11_PREFER_SHARED_RESOURCES_KHR: cl_context_info = 0x402D;

// cl_mem_info
pub const CL_MEM_D3D11_RESOURCE_KHR: cl_mem_info = 0x401E;

// cl_image_info
pub const CL_IMAGE_D3D11_SUBRESOURCE_KHR: cl_image_info = 0x401F;

// cl_command_type
pub const CL_COMMAND_ACQUIRE_D3D11_OBJECTS_KHR: cl_command_type = 0x4020;
pub const CL_COMMAND_RELEASE_D3D11_OBJECTS_KHR: cl_command_type = 0x4021;

// DXGI_FORMAT values with an OpenCL image format equivalent.
pub const DXGI_FORMAT_R32G32B32A32_FLOAT: cl_uint = 2;
pub const DXGI_FORMAT_R32G32B32A32_UINT: cl_uint = 3;
pub const DXGI_FORMAT_R16G16B16A16_FLOAT: cl_uint = 10;
pub const DXGI_FORMAT_R16G16B16A16_UNORM: cl_uint = 11;
pub const DXGI_FORMAT_R32G32_FLOAT: cl_uint = 16;
pub const DXGI_FORMAT_R8G8B8A8_UNORM: cl_uint = 28;
pub const DXGI_FORMAT_R8G8B8A8_UINT: cl_uint = 30;
pub const DXGI_FORMAT_R16G16_FLOAT: cl_uint = 34;
pub const DXGI_FORMAT_R32_FLOAT: cl_uint = 41;
pub const DXGI_FORMAT_R32_UINT: cl_uint = 42;
pub const DXGI_FORMAT_R8G8_UNORM: cl_uint = 49;
pub const DXGI_FORMAT_R16_FLOAT: cl_uint = 54;
pub const DXGI_FORMAT_R8_UNORM: cl_uint = 61;
pub const DXGI_FORMAT_B8G8R8A8_UNORM: cl_uint = 87;
pub const DXGI_FORMAT_NV12: cl_uint = 103;
pub const DXGI_FORMAT_P010: cl_uint = 104;
