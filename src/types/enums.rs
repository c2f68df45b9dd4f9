//! OpenCL C-style enums and the info-query result enums built on them.
//!
//! [NOTE]: Variant discriminants come straight from `ocl-runtime-sys` so a
//! value may be cast back to its raw `cl_*` type with `as`.
//

#![allow(non_camel_case_types)]

use std::fmt;
use crate::ffi;
use crate::error::ErrorKind;
use crate::{Context, Mem, MemFlags, ImageFormat};


enum_from_primitive! {
    /// The status of an OpenCL API call. Used for returning success/error codes.
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum Status {
        CL_SUCCESS = ffi::CL_SUCCESS as isize,
        CL_DEVICE_NOT_FOUND = ffi::CL_DEVICE_NOT_FOUND as isize,
        CL_DEVICE_NOT_AVAILABLE = ffi::CL_DEVICE_NOT_AVAILABLE as isize,
        CL_MEM_OBJECT_ALLOCATION_FAILURE = ffi::CL_MEM_OBJECT_ALLOCATION_FAILURE as isize,
        CL_OUT_OF_RESOURCES = ffi::CL_OUT_OF_RESOURCES as isize,
        CL_OUT_OF_HOST_MEMORY = ffi::CL_OUT_OF_HOST_MEMORY as isize,
        CL_MEM_COPY_OVERLAP = ffi::CL_MEM_COPY_OVERLAP as isize,
        CL_IMAGE_FORMAT_MISMATCH = ffi::CL_IMAGE_FORMAT_MISMATCH as isize,
        CL_IMAGE_FORMAT_NOT_SUPPORTED = ffi::CL_IMAGE_FORMAT_NOT_SUPPORTED as isize,
        CL_MAP_FAILURE = ffi::CL_MAP_FAILURE as isize,
        CL_MISALIGNED_SUB_BUFFER_OFFSET = ffi::CL_MISALIGNED_SUB_BUFFER_OFFSET as isize,
        CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST = ffi::CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST as isize,
        CL_INVALID_VALUE = ffi::CL_INVALID_VALUE as isize,
        CL_INVALID_DEVICE = ffi::CL_INVALID_DEVICE as isize,
        CL_INVALID_CONTEXT = ffi::CL_INVALID_CONTEXT as isize,
        CL_INVALID_COMMAND_QUEUE = ffi::CL_INVALID_COMMAND_QUEUE as isize,
        CL_INVALID_HOST_PTR = ffi::CL_INVALID_HOST_PTR as isize,
        CL_INVALID_MEM_OBJECT = ffi::CL_INVALID_MEM_OBJECT as isize,
        CL_INVALID_IMAGE_FORMAT_DESCRIPTOR = ffi::CL_INVALID_IMAGE_FORMAT_DESCRIPTOR as isize,
        CL_INVALID_IMAGE_SIZE = ffi::CL_INVALID_IMAGE_SIZE as isize,
        CL_INVALID_EVENT_WAIT_LIST = ffi::CL_INVALID_EVENT_WAIT_LIST as isize,
        CL_INVALID_EVENT = ffi::CL_INVALID_EVENT as isize,
        CL_INVALID_OPERATION = ffi::CL_INVALID_OPERATION as isize,
        CL_INVALID_GL_OBJECT = ffi::CL_INVALID_GL_OBJECT as isize,
        CL_INVALID_BUFFER_SIZE = ffi::CL_INVALID_BUFFER_SIZE as isize,
        CL_INVALID_MIP_LEVEL = ffi::CL_INVALID_MIP_LEVEL as isize,
        CL_INVALID_PROPERTY = ffi::CL_INVALID_PROPERTY as isize,
        CL_INVALID_IMAGE_DESCRIPTOR = ffi::CL_INVALID_IMAGE_DESCRIPTOR as isize,
        CL_INVALID_PIPE_SIZE = ffi::CL_INVALID_PIPE_SIZE as isize,
        CL_INVALID_GL_SHAREGROUP_REFERENCE_KHR = ffi::CL_INVALID_GL_SHAREGROUP_REFERENCE_KHR as isize,
        CL_INVALID_D3D10_DEVICE_KHR = ffi::CL_INVALID_D3D10_DEVICE_KHR as isize,
        CL_INVALID_D3D10_RESOURCE_KHR = ffi::CL_INVALID_D3D10_RESOURCE_KHR as isize,
        CL_D3D10_RESOURCE_ALREADY_ACQUIRED_KHR = ffi::CL_D3D10_RESOURCE_ALREADY_ACQUIRED_KHR as isize,
        CL_D3D10_RESOURCE_NOT_ACQUIRED_KHR = ffi::CL_D3D10_RESOURCE_NOT_ACQUIRED_KHR as isize,
        CL_INVALID_D3D11_DEVICE_KHR = ffi::CL_INVALID_D3D11_DEVICE_KHR as isize,
        CL_INVALID_D3D11_RESOURCE_KHR = ffi::CL_INVALID_D3D11_RESOURCE_KHR as isize,
        CL_D3D11_RESOURCE_ALREADY_ACQUIRED_KHR = ffi::CL_D3D11_RESOURCE_ALREADY_ACQUIRED_KHR as isize,
        CL_D3D11_RESOURCE_NOT_ACQUIRED_KHR = ffi::CL_D3D11_RESOURCE_NOT_ACQUIRED_KHR as isize,
        CL_INVALID_DX9_MEDIA_ADAPTER_KHR = ffi::CL_INVALID_DX9_MEDIA_ADAPTER_KHR as isize,
        CL_INVALID_DX9_MEDIA_SURFACE_KHR = ffi::CL_INVALID_DX9_MEDIA_SURFACE_KHR as isize,
        CL_DX9_MEDIA_SURFACE_ALREADY_ACQUIRED_KHR = ffi::CL_DX9_MEDIA_SURFACE_ALREADY_ACQUIRED_KHR as isize,
        CL_DX9_MEDIA_SURFACE_NOT_ACQUIRED_KHR = ffi::CL_DX9_MEDIA_SURFACE_NOT_ACQUIRED_KHR as isize,
    }
}

impl Status {
    /// Returns the error kind this status belongs to.
    ///
    /// `CL_SUCCESS` has no meaningful kind and maps to `InvalidArgument`;
    /// callers only ask for the kind of a failure.
    pub fn kind(&self) -> ErrorKind {
        use self::Status::*;

        match *self {
            CL_INVALID_CONTEXT | CL_INVALID_COMMAND_QUEUE | CL_INVALID_MEM_OBJECT
                | CL_INVALID_EVENT | CL_INVALID_DEVICE | CL_DEVICE_NOT_FOUND
                | CL_DEVICE_NOT_AVAILABLE | CL_INVALID_D3D10_DEVICE_KHR
                | CL_INVALID_D3D11_DEVICE_KHR | CL_INVALID_DX9_MEDIA_ADAPTER_KHR
                | CL_INVALID_GL_SHAREGROUP_REFERENCE_KHR => ErrorKind::InvalidHandle,
            CL_INVALID_IMAGE_SIZE | CL_MISALIGNED_SUB_BUFFER_OFFSET | CL_INVALID_BUFFER_SIZE
                | CL_INVALID_PIPE_SIZE => ErrorKind::InvalidGeometry,
            CL_IMAGE_FORMAT_MISMATCH | CL_IMAGE_FORMAT_NOT_SUPPORTED
                | CL_INVALID_IMAGE_FORMAT_DESCRIPTOR => ErrorKind::UnsupportedFormat,
            CL_MEM_COPY_OVERLAP | CL_INVALID_D3D10_RESOURCE_KHR | CL_INVALID_D3D11_RESOURCE_KHR
                | CL_INVALID_DX9_MEDIA_SURFACE_KHR | CL_INVALID_GL_OBJECT
                | CL_D3D10_RESOURCE_ALREADY_ACQUIRED_KHR | CL_D3D11_RESOURCE_ALREADY_ACQUIRED_KHR
                | CL_DX9_MEDIA_SURFACE_ALREADY_ACQUIRED_KHR | CL_D3D10_RESOURCE_NOT_ACQUIRED_KHR
                | CL_D3D11_RESOURCE_NOT_ACQUIRED_KHR
                | CL_DX9_MEDIA_SURFACE_NOT_ACQUIRED_KHR => ErrorKind::ResourceConflict,
            CL_MEM_OBJECT_ALLOCATION_FAILURE | CL_OUT_OF_RESOURCES | CL_OUT_OF_HOST_MEMORY
                | CL_MAP_FAILURE => ErrorKind::AllocationFailure,
            CL_INVALID_OPERATION => ErrorKind::OperationNotPermitted,
            CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST => ErrorKind::ExecutionFailure,
            CL_SUCCESS | CL_INVALID_VALUE | CL_INVALID_HOST_PTR | CL_INVALID_EVENT_WAIT_LIST
                | CL_INVALID_MIP_LEVEL | CL_INVALID_PROPERTY
                | CL_INVALID_IMAGE_DESCRIPTOR => ErrorKind::InvalidArgument,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}


enum_from_primitive! {
    /// cl_mem_object_type
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum MemObjectType {
        Buffer = ffi::CL_MEM_OBJECT_BUFFER as isize,
        Image2d = ffi::CL_MEM_OBJECT_IMAGE2D as isize,
        Image3d = ffi::CL_MEM_OBJECT_IMAGE3D as isize,
        Image2dArray = ffi::CL_MEM_OBJECT_IMAGE2D_ARRAY as isize,
        Image1d = ffi::CL_MEM_OBJECT_IMAGE1D as isize,
        Image1dArray = ffi::CL_MEM_OBJECT_IMAGE1D_ARRAY as isize,
        Image1dBuffer = ffi::CL_MEM_OBJECT_IMAGE1D_BUFFER as isize,
        Pipe = ffi::CL_MEM_OBJECT_PIPE as isize,
    }
}

impl MemObjectType {
    /// Returns true for every image type.
    pub fn is_image(&self) -> bool {
        match *self {
            MemObjectType::Buffer | MemObjectType::Pipe => false,
            _ => true,
        }
    }

    /// Returns true for the two array image types.
    pub fn is_array(&self) -> bool {
        match *self {
            MemObjectType::Image1dArray | MemObjectType::Image2dArray => true,
            _ => false,
        }
    }

    /// Number of coordinates an `origin`/`region` triple uses for this type,
    /// counting the array index as a coordinate. Also the index of the mip
    /// level slot in an image origin.
    pub fn coord_dims(&self) -> usize {
        match *self {
            MemObjectType::Buffer | MemObjectType::Pipe | MemObjectType::Image1d
                | MemObjectType::Image1dBuffer => 1,
            MemObjectType::Image1dArray | MemObjectType::Image2d => 2,
            MemObjectType::Image2dArray | MemObjectType::Image3d => 3,
        }
    }
}


enum_from_primitive! {
    /// Specifies the number of channels and the channel layout i.e. the memory
    /// layout in which channels are stored in the image.
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum ImageChannelOrder {
        R = ffi::CL_R as isize,
        A = ffi::CL_A as isize,
        Rg = ffi::CL_RG as isize,
        Ra = ffi::CL_RA as isize,
        Rgb = ffi::CL_RGB as isize,
        Rgba = ffi::CL_RGBA as isize,
        Bgra = ffi::CL_BGRA as isize,
        Argb = ffi::CL_ARGB as isize,
        Intensity = ffi::CL_INTENSITY as isize,
        Luminance = ffi::CL_LUMINANCE as isize,
        Rx = ffi::CL_Rx as isize,
        Rgx = ffi::CL_RGx as isize,
        Rgbx = ffi::CL_RGBx as isize,
        Depth = ffi::CL_DEPTH as isize,
        DepthStencil = ffi::CL_DEPTH_STENCIL as isize,
        Srgb = ffi::CL_sRGB as isize,
        Srgbx = ffi::CL_sRGBx as isize,
        Srgba = ffi::CL_sRGBA as isize,
        Sbgra = ffi::CL_sBGRA as isize,
        Abgr = ffi::CL_ABGR as isize,
    }
}

impl ImageChannelOrder {
    /// Number of channels stored per pixel.
    pub fn channel_count(&self) -> usize {
        use self::ImageChannelOrder::*;

        match *self {
            R | A | Intensity | Luminance | Rx | Depth => 1,
            Rg | Ra | Rgx | DepthStencil => 2,
            Rgb | Rgbx | Srgb | Srgbx => 3,
            Rgba | Bgra | Argb | Srgba | Sbgra | Abgr => 4,
        }
    }

    /// Returns true for the sRGB orders.
    pub fn is_srgb(&self) -> bool {
        use self::ImageChannelOrder::*;
        match *self {
            Srgb | Srgbx | Srgba | Sbgra => true,
            _ => false,
        }
    }
}


enum_from_primitive! {
    /// Describes the size of the channel data type.
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum ImageChannelDataType {
        SnormInt8 = ffi::CL_SNORM_INT8 as isize,
        SnormInt16 = ffi::CL_SNORM_INT16 as isize,
        UnormInt8 = ffi::CL_UNORM_INT8 as isize,
        UnormInt16 = ffi::CL_UNORM_INT16 as isize,
        UnormShort565 = ffi::CL_UNORM_SHORT_565 as isize,
        UnormShort555 = ffi::CL_UNORM_SHORT_555 as isize,
        UnormInt101010 = ffi::CL_UNORM_INT_101010 as isize,
        SignedInt8 = ffi::CL_SIGNED_INT8 as isize,
        SignedInt16 = ffi::CL_SIGNED_INT16 as isize,
        SignedInt32 = ffi::CL_SIGNED_INT32 as isize,
        UnsignedInt8 = ffi::CL_UNSIGNED_INT8 as isize,
        UnsignedInt16 = ffi::CL_UNSIGNED_INT16 as isize,
        UnsignedInt32 = ffi::CL_UNSIGNED_INT32 as isize,
        HalfFloat = ffi::CL_HALF_FLOAT as isize,
        Float = ffi::CL_FLOAT as isize,
        UnormInt24 = ffi::CL_UNORM_INT24 as isize,
        UnormInt101010_2 = ffi::CL_UNORM_INT_101010_2 as isize,
    }
}

impl ImageChannelDataType {
    /// Bytes per channel, or `None` for the packed types whose channels share
    /// one storage word.
    pub fn channel_size(&self) -> Option<usize> {
        use self::ImageChannelDataType::*;

        match *self {
            SnormInt8 | UnormInt8 | SignedInt8 | UnsignedInt8 => Some(1),
            SnormInt16 | UnormInt16 | SignedInt16 | UnsignedInt16 | HalfFloat => Some(2),
            SignedInt32 | UnsignedInt32 | Float => Some(4),
            UnormShort565 | UnormShort555 | UnormInt101010 | UnormInt24
                | UnormInt101010_2 => None,
        }
    }

    /// Returns true for the packed types (565, 555, 101010, 101010_2, 24).
    pub fn is_packed(&self) -> bool {
        self.channel_size().is_none()
    }
}


enum_from_primitive! {
    /// Command execution status.
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum CommandExecutionStatus {
        Complete = ffi::CL_COMPLETE as isize,
        Running = ffi::CL_RUNNING as isize,
        Submitted = ffi::CL_SUBMITTED as isize,
        Queued = ffi::CL_QUEUED as isize,
    }
}


enum_from_primitive! {
    /// cl_command_type
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum CommandType {
        ReadBuffer = ffi::CL_COMMAND_READ_BUFFER as isize,
        WriteBuffer = ffi::CL_COMMAND_WRITE_BUFFER as isize,
        CopyBuffer = ffi::CL_COMMAND_COPY_BUFFER as isize,
        ReadImage = ffi::CL_COMMAND_READ_IMAGE as isize,
        WriteImage = ffi::CL_COMMAND_WRITE_IMAGE as isize,
        CopyImage = ffi::CL_COMMAND_COPY_IMAGE as isize,
        CopyImageToBuffer = ffi::CL_COMMAND_COPY_IMAGE_TO_BUFFER as isize,
        CopyBufferToImage = ffi::CL_COMMAND_COPY_BUFFER_TO_IMAGE as isize,
        MapBuffer = ffi::CL_COMMAND_MAP_BUFFER as isize,
        MapImage = ffi::CL_COMMAND_MAP_IMAGE as isize,
        UnmapMemObject = ffi::CL_COMMAND_UNMAP_MEM_OBJECT as isize,
        Marker = ffi::CL_COMMAND_MARKER as isize,
        AcquireGlObjects = ffi::CL_COMMAND_ACQUIRE_GL_OBJECTS as isize,
        ReleaseGlObjects = ffi::CL_COMMAND_RELEASE_GL_OBJECTS as isize,
        ReadBufferRect = ffi::CL_COMMAND_READ_BUFFER_RECT as isize,
        WriteBufferRect = ffi::CL_COMMAND_WRITE_BUFFER_RECT as isize,
        CopyBufferRect = ffi::CL_COMMAND_COPY_BUFFER_RECT as isize,
        User = ffi::CL_COMMAND_USER as isize,
        MigrateMemObjects = ffi::CL_COMMAND_MIGRATE_MEM_OBJECTS as isize,
        FillBuffer = ffi::CL_COMMAND_FILL_BUFFER as isize,
        FillImage = ffi::CL_COMMAND_FILL_IMAGE as isize,
        AcquireDx9MediaSurfaces = ffi::CL_COMMAND_ACQUIRE_DX9_MEDIA_SURFACES_KHR as isize,
        ReleaseDx9MediaSurfaces = ffi::CL_COMMAND_RELEASE_DX9_MEDIA_SURFACES_KHR as isize,
        AcquireD3d10Objects = ffi::CL_COMMAND_ACQUIRE_D3D10_OBJECTS_KHR as isize,
        ReleaseD3d10Objects = ffi::CL_COMMAND_RELEASE_D3D10_OBJECTS_KHR as isize,
        AcquireD3d11Objects = ffi::CL_COMMAND_ACQUIRE_D3D11_OBJECTS_KHR as isize,
        ReleaseD3d11Objects = ffi::CL_COMMAND_RELEASE_D3D11_OBJECTS_KHR as isize,
    }
}


enum_from_primitive! {
    /// cl_mem_info
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum MemInfo {
        Type = ffi::CL_MEM_TYPE as isize,
        Flags = ffi::CL_MEM_FLAGS as isize,
        Size = ffi::CL_MEM_SIZE as isize,
        HostPtr = ffi::CL_MEM_HOST_PTR as isize,
        MapCount = ffi::CL_MEM_MAP_COUNT as isize,
        ReferenceCount = ffi::CL_MEM_REFERENCE_COUNT as isize,
        Context = ffi::CL_MEM_CONTEXT as isize,
        AssociatedMemobject = ffi::CL_MEM_ASSOCIATED_MEMOBJECT as isize,
        Offset = ffi::CL_MEM_OFFSET as isize,
        UsesSvmPointer = ffi::CL_MEM_USES_SVM_POINTER as isize,
    }
}


enum_from_primitive! {
    /// cl_image_info
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum ImageInfo {
        Format = ffi::CL_IMAGE_FORMAT as isize,
        ElementSize = ffi::CL_IMAGE_ELEMENT_SIZE as isize,
        RowPitch = ffi::CL_IMAGE_ROW_PITCH as isize,
        SlicePitch = ffi::CL_IMAGE_SLICE_PITCH as isize,
        Width = ffi::CL_IMAGE_WIDTH as isize,
        Height = ffi::CL_IMAGE_HEIGHT as isize,
        Depth = ffi::CL_IMAGE_DEPTH as isize,
        ArraySize = ffi::CL_IMAGE_ARRAY_SIZE as isize,
        Buffer = ffi::CL_IMAGE_BUFFER as isize,
        NumMipLevels = ffi::CL_IMAGE_NUM_MIP_LEVELS as isize,
        NumSamples = ffi::CL_IMAGE_NUM_SAMPLES as isize,
    }
}


enum_from_primitive! {
    /// cl_pipe_info
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum PipeInfo {
        PacketSize = ffi::CL_PIPE_PACKET_SIZE as isize,
        MaxPackets = ffi::CL_PIPE_MAX_PACKETS as isize,
    }
}


/// A mem info result.
#[derive(Debug)]
pub enum MemInfoResult {
    Type(MemObjectType),
    Flags(MemFlags),
    Size(usize),
    /// The user pointer and the object size for `USE_HOST_PTR` objects.
    HostPtr(Option<(usize, usize)>),
    MapCount(u32),
    ReferenceCount(u32),
    Context(Context),
    /// The parent of a sub-buffer or view. The handle holds its own
    /// reference.
    AssociatedMemobject(Option<Mem>),
    Offset(usize),
    UsesSvmPointer(bool),
}

impl fmt::Display for MemInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MemInfoResult::Type(ref s) => write!(f, "{:?}", s),
            MemInfoResult::Flags(ref s) => write!(f, "{:?}", s),
            MemInfoResult::Size(s) => write!(f, "{}", s),
            MemInfoResult::HostPtr(ref s) => write!(f, "{:?}", s),
            MemInfoResult::MapCount(s) => write!(f, "{}", s),
            MemInfoResult::ReferenceCount(s) => write!(f, "{}", s),
            MemInfoResult::Context(ref s) => write!(f, "{:?}", s),
            MemInfoResult::AssociatedMemobject(ref s) => write!(f, "{:?}", s),
            MemInfoResult::Offset(s) => write!(f, "{}", s),
            MemInfoResult::UsesSvmPointer(s) => write!(f, "{}", s),
        }
    }
}


/// An image info result.
#[derive(Debug)]
pub enum ImageInfoResult {
    Format(ImageFormat),
    ElementSize(usize),
    RowPitch(usize),
    SlicePitch(usize),
    Width(usize),
    Height(usize),
    Depth(usize),
    ArraySize(usize),
    Buffer(Option<Mem>),
    NumMipLevels(u32),
    NumSamples(u32),
}

impl fmt::Display for ImageInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ImageInfoResult::Format(ref s) => write!(f, "{:?}", s),
            ImageInfoResult::ElementSize(s) => write!(f, "{}", s),
            ImageInfoResult::RowPitch(s) => write!(f, "{}", s),
            ImageInfoResult::SlicePitch(s) => write!(f, "{}", s),
            ImageInfoResult::Width(s) => write!(f, "{}", s),
            ImageInfoResult::Height(s) => write!(f, "{}", s),
            ImageInfoResult::Depth(s) => write!(f, "{}", s),
            ImageInfoResult::ArraySize(s) => write!(f, "{}", s),
            ImageInfoResult::Buffer(ref s) => write!(f, "{:?}", s),
            ImageInfoResult::NumMipLevels(s) => write!(f, "{}", s),
            ImageInfoResult::NumSamples(s) => write!(f, "{}", s),
        }
    }
}


/// A pipe info result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipeInfoResult {
    PacketSize(u32),
    MaxPackets(u32),
}
