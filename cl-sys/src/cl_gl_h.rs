//! OpenCL / OpenGL sharing (`cl_gl.h`).

#![allow(non_camel_case_types, dead_code, non_upper_case_globals)]

use crate::cl_h::{cl_command_type, cl_context_info, cl_int, cl_uint};

pub type cl_GLuint = u32;
pub type cl_GLint = i32;
pub type cl_GLenum = u32;

pub type cl_gl_object_type = cl_uint;
pub type cl_gl_texture_info = cl_uint;

// Error Codes
pub const CL_INVALID_GL_SHAREGROUP_REFERENCE_KHR: cl_int = -1000;

// cl_gl_object_type
pub const CL_GL_OBJECT_BUFFER: cl_gl_object_type = 0x2000;
pub const CL_GL_OBJECT_TEXTURE2D: cl_gl_object_type = 0x2001;
pub const CL_GL_OBJECT_TEXTURE3D: cl_gl_object_type = 0x2002;
pub const CL_GL_OBJECT_RENDERBUFFER: cl_gl_object_type = 0x2003;

// cl_gl_texture_info
pub const CL_GL_TEXTURE_TARGET: cl_gl_texture_info = 0x2004;
pub const CL_GL_MIPMAP_LEVEL: cl_gl_texture_info = 0x2005;

// cl_command_type
pub const CL_COMMAND_ACQUIRE_GL_OBJECTS: cl_command_type = 0x11FF;
pub const CL_COMMAND_RELEASE_GL_OBJECTS: cl_command_type = 0x1200;

// cl_context_properties
pub const CL_GL_CONTEXT_KHR: cl_context_info = 0x2008;

// GL texture targets accepted for 2D sharing.
pub const GL_TEXTURE_2D: cl_GLenum = 0x0DE1;
pub const GL_TEXTURE_RECTANGLE: cl_GLenum = 0x84F5;

// GL internal formats with an OpenCL image format equivalent.
pub const GL_RGBA8: cl_GLenum = 0x8058;
pub const GL_RGBA16: cl_GLenum = 0x805B;
pub const GL_RGBA32F: cl_GLenum = 0x8814;
pub const GL_RGBA16F: cl_GLenum = 0x881A;
pub const GL_R8: cl_GLenum = 0x8229;
pub const GL_R32F: cl_GLenum = 0x822E;
pub const GL_RG8: cl_GLenum = 0x822B;
pub const GL_BGRA: cl_GLenum = 0x80E1;
