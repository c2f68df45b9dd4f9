//! Entry points shaped after the OpenCL memory object, event and enqueue
//! APIs.
//!
//! Every function validates its arguments against the runtime's object
//! model, creates the object or builds and submits the command, and reports
//! failure as an [`Error`] carrying the status the equivalent `cl*` call
//! would return.
//!
//! Buffer offsets and lengths are in elements of `T` unless stated
//! otherwise, as are the x coordinates and pitches of the `*_rect` family.
//!
//! [`Error`]: enum.Error.html

use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;
use std::sync::Arc;

use crate::command::{Command, CommandKind, HostPtr};
use crate::context::{Context, ContextProperties};
use crate::device::{Device, MapTarget};
use crate::error::{ClResult, Result as OclResult};
use crate::event::{self, Event};
use crate::interop::{d3d9, d3d10, d3d11, gl, D3D10ResourceDesc, D3D11ResourceDesc,
    D3D9SurfaceDesc, GlObjectDesc, InteropApi, InteropBinding, NativeRef};
use crate::memory::{self, BufferDesc, HostMemoryReference, ImageDesc, MapEntry, Mem, MemKind,
    MemMap, Memory, MemoryInit, PipeDesc, Storage};
use crate::platform::Platform;
use crate::queue::CommandQueue;
use crate::util::{self, Rect};
use crate::validate;
use crate::{ffi, BufferRegion, BusAddress, CommandType, ImageDescriptor, ImageFillColor,
    ImageFormat, ImageInfo, ImageInfoResult, MapFlags, MemFlags, MemInfo, MemInfoResult,
    MemMigrationFlags, MemObjectType, OclPrm, PipeInfo, PipeInfoResult, Status};

//============================================================================
//============================================================================
//============================ ERROR HANDLING ================================
//============================================================================
//============================================================================

static SDK_DOCS_URL_PRE: &'static str = "https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/";
static SDK_DOCS_URL_SUF: &'static str = ".html#errors";


/// An OpenCL API error.
pub struct ApiError {
    status: Status,
    fn_name: &'static str,
    fn_info: Option<String>,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: Status, fn_name: &'static str, fn_info: Option<S>)
            -> ApiError {
        ApiError {
            status,
            fn_name,
            fn_info: fn_info.map(|s| s.into()),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn fn_name(&self) -> &'static str {
        self.fn_name
    }
}

impl ::std::error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fn_info_string = if let Some(ref fn_info) = self.fn_info {
            format!("(\"{}\")", fn_info)
        } else {
            String::with_capacity(0)
        };

        let status_int = self.status as i32;

        write!(f, "\n\n\
            ################################ OPENCL ERROR ############################### \
            \n\nError executing function: {}{}  \
            \n\nStatus error code: {:?} ({})  \
            \n\nPlease visit the following url for more information: \n\n{}{}{}  \n\n\
            ############################################################################# \n",
            self.fn_name, fn_info_string, self.status, status_int,
            SDK_DOCS_URL_PRE, self.fn_name, SDK_DOCS_URL_SUF)
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}


/// An error detected by the safe wrappers before any status is produced.
#[derive(Debug, thiserror::Error)]
pub enum ApiWrapperError {
    #[error("The length of the data slice ({data_len}) does not equal the buffer \
        length ({len}).")]
    CreateBufferDataLengthMismatch { len: usize, data_len: usize },
    #[error("The host slice holds {len} bytes but the transfer touches {needed}.")]
    HostSliceTooSmall { needed: usize, len: usize },
}


/// Evaluates `result` and returns an `Err` naming `fn_name` if it carries a
/// failure status.
#[inline(always)]
fn eval_status<T, S>(result: ClResult<T>, fn_name: &'static str, fn_info: Option<S>)
        -> OclResult<T>
        where S: Into<String> {
    result.map_err(|status| ApiError::new(status, fn_name, fn_info).into())
}

//============================================================================
//============================================================================
//=========================== SUPPORT FUNCTIONS ==============================
//============================================================================
//============================================================================

fn check_queue_mem(queue: &CommandQueue, mem: &Memory) -> ClResult<()> {
    if mem.context() != queue.context() {
        Err(Status::CL_INVALID_CONTEXT)
    } else {
        Ok(())
    }
}

/// Returns `mem` as a plain buffer (pipes excluded).
fn buffer_of(mem: &Memory) -> ClResult<memory::Buffer<'_>> {
    match mem.mem_type() {
        MemObjectType::Buffer => mem.as_buffer().ok_or(Status::CL_INVALID_MEM_OBJECT),
        _ => Err(Status::CL_INVALID_MEM_OBJECT),
    }
}

/// Builds, validates and submits a command, blocking on it if requested.
fn submit(queue: &CommandQueue, command_type: CommandType, wait_list: Option<&[Event]>,
        kind: CommandKind, block: bool) -> ClResult<Event> {
    let command = Command::new(queue, command_type, wait_list, kind)?;
    command.validate_memory()?;
    command.enqueue()?;
    if block {
        command.await_completion()?;
    }
    Ok(command.event())
}

fn check_host_len(needed: usize, len: usize) -> OclResult<()> {
    if needed > len {
        Err(ApiWrapperError::HostSliceTooSmall { needed, len }.into())
    } else {
        Ok(())
    }
}

/// `count` elements of `T` in bytes. Fails with `CL_INVALID_VALUE` if that
/// does not fit in a `usize`.
fn elem_bytes<T>(count: usize) -> ClResult<usize> {
    count.checked_mul(mem::size_of::<T>()).ok_or(Status::CL_INVALID_VALUE)
}

/// Byte versions of an element-based rect argument set: `origin[0]`,
/// `region[0]` and both pitches are scaled by `size_of::<T>()`.
fn rect_bytes<T>(origin: [usize; 3], region: [usize; 3], row_pitch: usize, slc_pitch: usize)
        -> ClResult<([usize; 3], [usize; 3], usize, usize)> {
    Ok(([elem_bytes::<T>(origin[0])?, origin[1], origin[2]],
        [elem_bytes::<T>(region[0])?, region[1], region[2]],
        elem_bytes::<T>(row_pitch)?, elem_bytes::<T>(slc_pitch)?))
}

//============================================================================
//============================================================================
//======================= OPENCL FUNCTION WRAPPERS ===========================
//============================================================================
//============================================================================

//============================================================================
//============================= Context APIs =================================
//============================================================================

/// Creates a context for `devices`, all of which must belong to `platform`.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clCreateContext.html)
pub fn create_context(platform: &Platform, properties: Option<&ContextProperties>,
        devices: &[Device]) -> OclResult<Context> {
    let properties = properties.cloned().unwrap_or_default();
    eval_status(Context::new(platform, properties, devices), "clCreateContext", None::<String>)
}

/// Returns the image formats supported by at least one device of `context`.
pub fn get_supported_image_formats(context: &Context, flags: MemFlags,
        image_type: MemObjectType) -> OclResult<Vec<ImageFormat>> {
    let result = validate::validate_flags(flags, true).and_then(|_| {
        if image_type.is_image() {
            Ok(validate::supported_image_formats(context.devices()))
        } else {
            Err(Status::CL_INVALID_VALUE)
        }
    });
    eval_status(result, "clGetSupportedImageFormats", None::<String>)
}

//============================================================================
//=========================== Command Queue APIs =============================
//============================================================================

/// Creates an in-order command queue on `device`.
pub fn create_command_queue(context: &Context, device: &Device) -> OclResult<CommandQueue> {
    eval_status(CommandQueue::new(context, device), "clCreateCommandQueue", None::<String>)
}

/// Issues all queued commands. The host queue hands commands to its worker
/// as they are enqueued, so this only checks the queue.
pub fn flush(command_queue: &CommandQueue) -> OclResult<()> {
    eval_status(command_queue.flush(), "clFlush", None::<String>)
}

/// Blocks until every previously enqueued command on `command_queue` has
/// completed.
pub fn finish(command_queue: &CommandQueue) -> OclResult<()> {
    eval_status(command_queue.finish(), "clFinish", None::<String>)
}

//============================================================================
//=========================== Memory Object APIs =============================
//============================================================================

/// Resolves the host pointer mode of a new root object.
///
/// Returns the host copy the object keeps (`USE_HOST_PTR`, `ALLOC_HOST_PTR`)
/// and whether the host bytes still have to be copied to a device
/// (`COPY_HOST_PTR` alone).
unsafe fn host_memory(flags: MemFlags, size: usize, host_ptr: *mut u8)
        -> ClResult<(Option<HostMemoryReference>, bool)> {
    if flags.contains(MemFlags::USE_HOST_PTR) {
        Ok((Some(HostMemoryReference::borrowed(host_ptr, size)?), false))
    } else if flags.contains(MemFlags::ALLOC_HOST_PTR) {
        let init = if flags.contains(MemFlags::COPY_HOST_PTR) {
            Some(slice::from_raw_parts(host_ptr as *const u8, size))
        } else {
            None
        };
        Ok((Some(HostMemoryReference::allocate(size, init)?), false))
    } else {
        Ok((None, flags.contains(MemFlags::COPY_HOST_PTR)))
    }
}

/// Sets `READ_WRITE` if no device access mode is given.
fn default_access(flags: MemFlags) -> MemFlags {
    if flags.intersects(MemFlags::READ_WRITE | MemFlags::WRITE_ONLY | MemFlags::READ_ONLY
            | MemFlags::KERNEL_READ_AND_WRITE) {
        flags
    } else {
        flags | MemFlags::READ_WRITE
    }
}

unsafe fn _create_buffer(context: &Context, flags: MemFlags, size: usize, host_ptr: *mut u8)
        -> ClResult<Arc<Memory>> {
    validate::validate_flags(flags, false)?;
    validate::validate_host_ptr(flags, !host_ptr.is_null())?;

    if size == 0 || !context.devices().iter().any(|d| d.can_allocate(size)) {
        return Err(Status::CL_INVALID_BUFFER_SIZE);
    }
    let flags = default_access(flags);

    if flags.contains(MemFlags::EXTERNAL_PHYSICAL_AMD) {
        let bus_address = ptr::read_unaligned(host_ptr as *const BusAddress);
        let mem = Arc::new(Memory::new(MemoryInit::root(context, MemObjectType::Buffer, flags,
            size, MemKind::Buffer(BufferDesc::with_bus_address(bus_address)))));
        mem.create(None, true)?;
        return Ok(mem);
    }

    let mut init = MemoryInit::root(context, MemObjectType::Buffer, flags, size,
        MemKind::Buffer(BufferDesc::default()));

    // Host memory inside an SVM allocation is wrapped, not copied.
    if flags.contains(MemFlags::USE_HOST_PTR) {
        if let Some((svm, offset, _)) = context.find_svm(host_ptr) {
            if offset + size > svm.size() {
                return Err(Status::CL_INVALID_BUFFER_SIZE);
            }
            init.storage = Storage::Svm { mem: svm, offset };
            let mem = Arc::new(Memory::new(init));
            mem.create(None, true)?;
            return Ok(mem);
        }
    }

    let (host_mem, copy) = host_memory(flags, size, host_ptr)?;
    init.host_mem = host_mem;
    let mem = Arc::new(Memory::new(init));

    let init_from = if copy { Some(slice::from_raw_parts(host_ptr as *const u8, size)) } else { None };
    mem.create(init_from, !flags.contains(MemFlags::BUS_ADDRESSABLE_AMD))?;
    Ok(mem)
}

/// Creates a buffer object of `len` elements of `T`.
///
/// `data` is required by `USE_HOST_PTR` and `COPY_HOST_PTR` and must hold
/// exactly `len` elements. External physical buffers are created with
/// [`create_external_physical_buffer`].
///
/// ## Safety
///
/// With `USE_HOST_PTR` the memory behind `data` is used as the buffer's
/// host copy for the whole lifetime of the buffer.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clCreateBuffer.html)
///
/// [`create_external_physical_buffer`]: fn.create_external_physical_buffer.html
pub unsafe fn create_buffer<T: OclPrm>(context: &Context, flags: MemFlags, len: usize,
        data: Option<&[T]>) -> OclResult<Mem> {
    if let Some(d) = data {
        if d.len() != len {
            return Err(ApiWrapperError::CreateBufferDataLengthMismatch {
                len,
                data_len: d.len(),
            }.into());
        }
    }
    if flags.contains(MemFlags::EXTERNAL_PHYSICAL_AMD) {
        return eval_status(Err(Status::CL_INVALID_VALUE), "clCreateBuffer",
            Some("external physical memory"));
    }

    let host_ptr = match data {
        Some(d) => d.as_ptr() as *mut u8,
        None => ptr::null_mut(),
    };
    let result = _create_buffer(context, flags, len * mem::size_of::<T>(), host_ptr);
    eval_status(result, "clCreateBuffer", None::<String>).map(Mem::from_arc)
}

/// Creates a buffer over externally visible physical memory at
/// `bus_address`. No host pointer mode and no read/write-only mode may be
/// requested.
pub fn create_external_physical_buffer(context: &Context, flags: MemFlags, size: usize,
        bus_address: &BusAddress) -> OclResult<Mem> {
    let result = unsafe {
        _create_buffer(context, flags | MemFlags::EXTERNAL_PHYSICAL_AMD, size,
            bus_address as *const BusAddress as *mut u8)
    };
    eval_status(result, "clCreateBuffer", Some("external physical memory")).map(Mem::from_arc)
}

/// Returns the bus addresses of an external physical or bus addressable
/// buffer.
pub fn get_buffer_bus_address(buffer: &Mem) -> OclResult<BusAddress> {
    let result = buffer.as_buffer()
        .ok_or(Status::CL_INVALID_MEM_OBJECT)
        .and_then(|b| b.bus_address().ok_or(Status::CL_INVALID_MEM_OBJECT));
    eval_status(result, "clEnqueueMakeBuffersResidentAMD", None::<String>)
}

/// Creates a sub-buffer of `buffer` covering `region` (in bytes).
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clCreateSubBuffer.html)
pub fn create_sub_buffer(buffer: &Mem, flags: MemFlags, region: &BufferRegion) -> OclResult<Mem> {
    let result = memory::create_sub_buffer(buffer.as_arc(), flags, *region);
    eval_status(result, "clCreateSubBuffer", None::<String>).map(Mem::from_arc)
}

fn descriptor_dims(desc: &ImageDescriptor) -> [usize; 4] {
    let w = desc.image_width;
    match desc.image_type {
        MemObjectType::Image1dArray => [w, 1, 1, desc.image_array_size],
        MemObjectType::Image2d => [w, desc.image_height, 1, 1],
        MemObjectType::Image2dArray => [w, desc.image_height, 1, desc.image_array_size],
        MemObjectType::Image3d => [w, desc.image_height, desc.image_depth, 1],
        _ => [w, 1, 1, 1],
    }
}

unsafe fn _create_image(context: &Context, flags: MemFlags, format: &ImageFormat,
        desc: &ImageDescriptor, host_ptr: *mut u8, host_len: usize) -> ClResult<Arc<Memory>> {
    validate::validate_flags(flags, true)?;
    validate::validate_host_ptr(flags, !host_ptr.is_null())?;

    let (row_pitch, slice_pitch) = validate::validate_image_descriptor(context.devices(), format,
        desc, !host_ptr.is_null())?;
    let dims = descriptor_dims(desc);

    // Images over a buffer share its storage.
    if let Some(ref buffer) = desc.buffer {
        if buffer.context() != context {
            return Err(Status::CL_INVALID_CONTEXT);
        }
        validate::validate_matching_buffer_flags(buffer.mem_flags(), flags)?;
        let flags = validate::inherit_mem_flags(flags, buffer.mem_flags());

        let image = ImageDesc::new(desc.image_type, *format, dims, row_pitch, slice_pitch, 1, 1);
        let size = image.storage_size();
        let mem = Arc::new(Memory::new(MemoryInit::view(buffer.as_arc(), 0, desc.image_type,
            flags, size, MemKind::Image(image))));
        mem.create(None, true)?;
        buffer.add_sub_buffer(&mem);
        return Ok(mem);
    }

    let image = ImageDesc::new(desc.image_type, *format, dims, row_pitch, slice_pitch,
        desc.num_mip_levels, desc.num_samples);
    let size = image.storage_size();
    if !host_ptr.is_null() && host_len < size {
        return Err(Status::CL_INVALID_HOST_PTR);
    }

    let flags = default_access(flags);
    let mut init = MemoryInit::root(context, desc.image_type, flags, size, MemKind::Image(image));
    let (host_mem, copy) = host_memory(flags, size, host_ptr)?;
    init.host_mem = host_mem;
    let mem = Arc::new(Memory::new(init));

    let init_from = if copy { Some(slice::from_raw_parts(host_ptr as *const u8, size)) } else { None };
    mem.create(init_from, true)?;
    Ok(mem)
}

/// Creates an image.
///
/// `data`, laid out with the descriptor's pitches (tightly packed when they
/// are zero), is required by `USE_HOST_PTR` and `COPY_HOST_PTR`. Images with
/// `desc.buffer` set share the buffer's storage.
///
/// ## Safety
///
/// With `USE_HOST_PTR` the memory behind `data` is used as the image's host
/// copy for the whole lifetime of the image.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clCreateImage.html)
pub unsafe fn create_image<T: OclPrm>(context: &Context, flags: MemFlags, format: &ImageFormat,
        desc: &ImageDescriptor, data: Option<&[T]>) -> OclResult<Mem> {
    let (host_ptr, host_len) = match data {
        Some(d) => (d.as_ptr() as *mut u8, d.len() * mem::size_of::<T>()),
        None => (ptr::null_mut(), 0),
    };
    let result = _create_image(context, flags, format, desc, host_ptr, host_len);
    eval_status(result, "clCreateImage", None::<String>).map(Mem::from_arc)
}

/// Creates a view of mip level `base_mip_level` of `image`, optionally with
/// a different but compatible format.
pub fn create_image_view(image: &Mem, format: Option<&ImageFormat>, base_mip_level: u32,
        flags: MemFlags) -> OclResult<Mem> {
    let result = memory::create_image_view(image.as_arc(), format.cloned(), base_mip_level,
        flags);
    eval_status(result, "clCreateImage", Some("image view")).map(Mem::from_arc)
}

/// Creates a pipe of `max_packets` packets of `packet_size` bytes.
///
/// Only an access mode may be given; host access is always
/// `HOST_NO_ACCESS`.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clCreatePipe.html)
pub fn create_pipe(context: &Context, flags: MemFlags, packet_size: u32, max_packets: u32)
        -> OclResult<Mem> {
    let result = validate::validate_flags(flags, false).and_then(|_| {
        if flags.intersects(MemFlags::HOST_PTR_MODE | MemFlags::HOST_ACCESS) {
            return Err(Status::CL_INVALID_VALUE);
        }
        let (desc, size) = PipeDesc::new(context.devices(), packet_size, max_packets)?;
        let flags = default_access(flags) | MemFlags::HOST_NO_ACCESS;
        let header = memory::pipe_header(&desc);

        let mem = Arc::new(Memory::new(MemoryInit::root(context, MemObjectType::Pipe, flags,
            size, MemKind::Pipe(BufferDesc::default(), desc))));
        mem.create(Some(&header), true)?;
        Ok(mem)
    });
    eval_status(result, "clCreatePipe", None::<String>).map(Mem::from_arc)
}

/// Increments the reference count of a memory object.
///
/// ## Safety
///
/// Every call must be balanced by `release_mem_object`; `Mem` handles
/// retain and release on their own.
pub unsafe fn retain_mem_object(mem: &Mem) -> OclResult<()> {
    mem.as_memory().retain();
    Ok(())
}

/// Decrements the reference count of a memory object.
///
/// ## Safety
///
/// Must balance an earlier `retain_mem_object`. Releasing a reference held
/// by a live `Mem` makes that handle's drop report a double release.
pub unsafe fn release_mem_object(mem: &Mem) -> OclResult<()> {
    eval_status(mem.as_memory().release().map(|_| ()), "clReleaseMemObject", None::<String>)
}

/// Registers `callback` to run when the object is destroyed. Callbacks run
/// newest first, before the backing store is released.
pub fn set_mem_object_destructor_callback<F>(mem: &Mem, callback: F) -> OclResult<()>
        where F: FnOnce(&Memory) + Send + 'static {
    mem.set_destructor_callback(callback);
    Ok(())
}

/// Returns information about a memory object.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clGetMemObjectInfo.html)
pub fn get_mem_object_info(mem: &Mem, request: MemInfo) -> OclResult<MemInfoResult> {
    Ok(match request {
        MemInfo::Type => MemInfoResult::Type(mem.mem_type()),
        MemInfo::Flags => MemInfoResult::Flags(mem.mem_flags()),
        MemInfo::Size => MemInfoResult::Size(mem.size()),
        MemInfo::HostPtr => {
            let ptr = if mem.uses_svm_pointer() {
                let (key, offset) = mem.storage_key();
                Some(key + offset)
            } else if mem.mem_flags().contains(MemFlags::USE_HOST_PTR) {
                mem.host_target().map(|p| p as usize)
            } else {
                None
            };
            MemInfoResult::HostPtr(ptr.map(|p| (p, mem.size())))
        },
        MemInfo::MapCount => MemInfoResult::MapCount(mem.map_count()),
        MemInfo::ReferenceCount => MemInfoResult::ReferenceCount(mem.ref_count()),
        MemInfo::Context => MemInfoResult::Context(mem.context().clone()),
        MemInfo::AssociatedMemobject => {
            MemInfoResult::AssociatedMemobject(mem.parent().map(|p| Mem::from_arc(p.clone())))
        },
        MemInfo::Offset => match mem.mem_type() {
            MemObjectType::Buffer => MemInfoResult::Offset(mem.origin()),
            _ => MemInfoResult::Offset(0),
        },
        MemInfo::UsesSvmPointer => MemInfoResult::UsesSvmPointer(mem.uses_svm_pointer()),
    })
}

/// Returns information about an image. Dimensions the image type does not
/// use are reported as 0.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clGetImageInfo.html)
pub fn get_image_info(image: &Mem, request: ImageInfo) -> OclResult<ImageInfoResult> {
    let img = match image.as_image() {
        Some(img) => img,
        None => return eval_status(Err(Status::CL_INVALID_MEM_OBJECT), "clGetImageInfo",
            None::<String>),
    };
    let image_type = img.image_type();

    Ok(match request {
        ImageInfo::Format => ImageInfoResult::Format(img.format()),
        ImageInfo::ElementSize => ImageInfoResult::ElementSize(img.elem_size()),
        ImageInfo::RowPitch => ImageInfoResult::RowPitch(img.row_pitch()),
        ImageInfo::SlicePitch => ImageInfoResult::SlicePitch(img.slice_pitch()),
        ImageInfo::Width => ImageInfoResult::Width(img.width()),
        ImageInfo::Height => match image_type {
            MemObjectType::Image2d | MemObjectType::Image2dArray | MemObjectType::Image3d => {
                ImageInfoResult::Height(img.height())
            },
            _ => ImageInfoResult::Height(0),
        },
        ImageInfo::Depth => match image_type {
            MemObjectType::Image3d => ImageInfoResult::Depth(img.depth()),
            _ => ImageInfoResult::Depth(0),
        },
        ImageInfo::ArraySize => match image_type.is_array() {
            true => ImageInfoResult::ArraySize(img.array_size()),
            false => ImageInfoResult::ArraySize(0),
        },
        ImageInfo::Buffer => ImageInfoResult::Buffer(image.parent()
            .filter(|p| p.mem_type() == MemObjectType::Buffer)
            .map(|p| Mem::from_arc(p.clone()))),
        ImageInfo::NumMipLevels => ImageInfoResult::NumMipLevels(img.num_mip_levels()),
        ImageInfo::NumSamples => ImageInfoResult::NumSamples(img.num_samples()),
    })
}

/// Returns information about a pipe.
pub fn get_pipe_info(pipe: &Mem, request: PipeInfo) -> OclResult<PipeInfoResult> {
    let p = match pipe.as_pipe() {
        Some(p) => p,
        None => return eval_status(Err(Status::CL_INVALID_MEM_OBJECT), "clGetPipeInfo",
            None::<String>),
    };
    Ok(match request {
        PipeInfo::PacketSize => PipeInfoResult::PacketSize(p.packet_size()),
        PipeInfo::MaxPackets => PipeInfoResult::MaxPackets(p.max_packets()),
    })
}

//============================================================================
//============================ Shared Virtual Memory =========================
//============================================================================

/// Allocates `size` bytes of shared virtual memory. An `alignment` of 0
/// selects the default.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clSVMAlloc.html)
pub fn svm_alloc(context: &Context, flags: MemFlags, size: usize, alignment: usize)
        -> OclResult<*mut u8> {
    let result = validate::validate_flags(flags, false)
        .and_then(|_| context.svm_alloc(flags, size, alignment));
    eval_status(result, "clSVMAlloc", None::<String>)
}

/// Frees an allocation made by `svm_alloc`.
///
/// ## Safety
///
/// `ptr` must not be dereferenced afterwards. Buffers wrapping the
/// allocation keep the storage alive until they are released.
pub unsafe fn svm_free(context: &Context, ptr: *mut u8) -> OclResult<()> {
    eval_status(context.svm_free(ptr), "clSVMFree", None::<String>)
}

//============================================================================
//=========================== Event Object APIs ==============================
//============================================================================

/// Blocks until every event in `events` completes.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clWaitForEvents.html)
pub fn wait_for_events(events: &[Event]) -> OclResult<()> {
    let result = match events.first() {
        None => Err(Status::CL_INVALID_VALUE),
        Some(first) if events.iter().any(|e| e.context() != first.context()) => {
            Err(Status::CL_INVALID_CONTEXT)
        },
        Some(_) => event::wait_for_events(events),
    };
    eval_status(result, "clWaitForEvents", None::<String>)
}

/// Creates a user event.
pub fn create_user_event(context: &Context) -> OclResult<Event> {
    Ok(Event::user(context))
}

/// Completes a user event. `CL_SUCCESS` (`CL_COMPLETE`) completes it
/// normally; any other status fails it, which also fails every command
/// waiting on it.
pub fn set_user_event_status(event: &Event, execution_status: Status) -> OclResult<()> {
    let status = match execution_status {
        Status::CL_SUCCESS => Ok(()),
        s => Err(s),
    };
    eval_status(event.set_user_status(status), "clSetUserEventStatus", None::<String>)
}

/// Registers a callback run once when `event` completes, with the failure
/// status of a failed command.
pub fn set_event_callback<F>(event: &Event, callback: F) -> OclResult<()>
        where F: FnOnce(ClResult<()>) + Send + 'static {
    event.set_callback(callback);
    Ok(())
}

//============================================================================
//======================= Enqueued Commands APIs =============================
//============================================================================

/// Enqueues a read from `buffer` into `data`, starting `offset` elements
/// into the buffer.
///
/// ## Safety
///
/// `data` must live, and must not be touched, until the returned event
/// completes. Blocking reads complete before returning.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueReadBuffer.html)
pub unsafe fn enqueue_read_buffer<T: OclPrm>(command_queue: &CommandQueue, buffer: &Mem,
        block: bool, offset: usize, data: &mut [T], wait_list: Option<&[Event]>)
        -> OclResult<Event> {
    let size_bytes = data.len() * mem::size_of::<T>();
    let host = HostPtr(data.as_mut_ptr() as *mut u8);

    let result = check_queue_mem(command_queue, buffer)
        .and_then(|_| buffer_of(buffer))
        .and_then(|b| {
            validate::check_host_read(buffer.mem_flags())?;
            let offset_bytes = elem_bytes::<T>(offset)?;
            b.validate_region([offset_bytes, 0, 0], [size_bytes, 1, 1])?;
            Ok(offset_bytes)
        })
        .and_then(|offset_bytes| {
            let kind = CommandKind::Read {
                mem: buffer.as_arc().clone(),
                rect: Rect::linear(offset_bytes, size_bytes),
                host,
                host_rect: Rect::linear(0, size_bytes),
            };
            submit(command_queue, CommandType::ReadBuffer, wait_list, kind, block)
        });

    eval_status(result, "clEnqueueReadBuffer", None::<String>)
}

/// Enqueues a write of `data` into `buffer`, starting `offset` elements
/// into the buffer.
///
/// ## Safety
///
/// `data` must live until the returned event completes.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueWriteBuffer.html)
pub unsafe fn enqueue_write_buffer<T: OclPrm>(command_queue: &CommandQueue, buffer: &Mem,
        block: bool, offset: usize, data: &[T], wait_list: Option<&[Event]>)
        -> OclResult<Event> {
    let size_bytes = data.len() * mem::size_of::<T>();
    let host = HostPtr(data.as_ptr() as *mut u8);

    let result = check_queue_mem(command_queue, buffer)
        .and_then(|_| buffer_of(buffer))
        .and_then(|b| {
            validate::check_host_write(buffer.mem_flags())?;
            let offset_bytes = elem_bytes::<T>(offset)?;
            let (origin, region) = ([offset_bytes, 0, 0], [size_bytes, 1, 1]);
            b.validate_region(origin, region)?;
            Ok((offset_bytes, buffer.parent().is_none() && b.is_entirely_covered(origin, region)))
        })
        .and_then(|(offset_bytes, covers_all)| {
            let kind = CommandKind::Write {
                mem: buffer.as_arc().clone(),
                rect: Rect::linear(offset_bytes, size_bytes),
                host,
                host_rect: Rect::linear(0, size_bytes),
                covers_all,
            };
            submit(command_queue, CommandType::WriteBuffer, wait_list, kind, block)
        });

    eval_status(result, "clEnqueueWriteBuffer", None::<String>)
}

/// Validates both sides of a rect transfer between `buffer` and host
/// memory, returning byte rects. Arguments are in elements of `T`.
fn buffer_host_rects<T>(command_queue: &CommandQueue, buffer: &Mem, buffer_origin: [usize; 3],
        host_origin: [usize; 3], region: [usize; 3], buffer_row_pitch: usize,
        buffer_slc_pitch: usize, host_row_pitch: usize, host_slc_pitch: usize, read: bool,
        fn_name: &'static str) -> OclResult<(Rect, Rect)> {
    let result = check_queue_mem(command_queue, buffer)
        .and_then(|_| buffer_of(buffer))
        .and_then(|b| {
            if read {
                validate::check_host_read(buffer.mem_flags())?;
            } else {
                validate::check_host_write(buffer.mem_flags())?;
            }
            let (bo, rgn, brp, bsp) = rect_bytes::<T>(buffer_origin, region,
                buffer_row_pitch, buffer_slc_pitch)?;
            let (ho, _, hrp, hsp) = rect_bytes::<T>(host_origin, region, host_row_pitch,
                host_slc_pitch)?;
            let rect = validate::validate_buffer_rect(b.size(), bo, rgn, brp, bsp)?;
            let host_rect = validate::validate_buffer_rect(usize::max_value(), ho, rgn, hrp,
                hsp)?;
            Ok((rect, host_rect))
        });
    eval_status(result, fn_name, None::<String>)
}

/// Enqueues a read of a rectangular region of `buffer` into a rectangular
/// region of `data`.
///
/// Zero pitches default to tightly packed rows and slices.
///
/// ## Safety
///
/// `data` must live, and must not be touched, until the returned event
/// completes.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueReadBufferRect.html)
pub unsafe fn enqueue_read_buffer_rect<T: OclPrm>(command_queue: &CommandQueue, buffer: &Mem,
        block: bool, buffer_origin: [usize; 3], host_origin: [usize; 3], region: [usize; 3],
        buffer_row_pitch: usize, buffer_slc_pitch: usize, host_row_pitch: usize,
        host_slc_pitch: usize, data: &mut [T], wait_list: Option<&[Event]>)
        -> OclResult<Event> {
    let (rect, host_rect) = buffer_host_rects::<T>(command_queue, buffer, buffer_origin,
        host_origin, region, buffer_row_pitch, buffer_slc_pitch, host_row_pitch,
        host_slc_pitch, true, "clEnqueueReadBufferRect")?;
    check_host_len(host_rect.end(), data.len() * mem::size_of::<T>())?;

    let kind = CommandKind::Read {
        mem: buffer.as_arc().clone(),
        rect,
        host: HostPtr(data.as_mut_ptr() as *mut u8),
        host_rect,
    };
    eval_status(submit(command_queue, CommandType::ReadBufferRect, wait_list, kind, block),
        "clEnqueueReadBufferRect", None::<String>)
}

/// Enqueues a write of a rectangular region of `data` into a rectangular
/// region of `buffer`.
///
/// ## Safety
///
/// `data` must live until the returned event completes.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueWriteBufferRect.html)
pub unsafe fn enqueue_write_buffer_rect<T: OclPrm>(command_queue: &CommandQueue, buffer: &Mem,
        block: bool, buffer_origin: [usize; 3], host_origin: [usize; 3], region: [usize; 3],
        buffer_row_pitch: usize, buffer_slc_pitch: usize, host_row_pitch: usize,
        host_slc_pitch: usize, data: &[T], wait_list: Option<&[Event]>) -> OclResult<Event> {
    let (rect, host_rect) = buffer_host_rects::<T>(command_queue, buffer, buffer_origin,
        host_origin, region, buffer_row_pitch, buffer_slc_pitch, host_row_pitch,
        host_slc_pitch, false, "clEnqueueWriteBufferRect")?;
    check_host_len(host_rect.end(), data.len() * mem::size_of::<T>())?;

    let kind = CommandKind::Write {
        mem: buffer.as_arc().clone(),
        rect,
        host: HostPtr(data.as_ptr() as *mut u8),
        host_rect,
        covers_all: false,
    };
    eval_status(submit(command_queue, CommandType::WriteBufferRect, wait_list, kind, block),
        "clEnqueueWriteBufferRect", None::<String>)
}

/// Copies `len` elements from `src_buffer` to `dst_buffer`.
///
/// Overlapping ranges within the same storage (including a sub-buffer and
/// its parent) fail with `CL_MEM_COPY_OVERLAP`; adjacent ranges do not
/// overlap.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueCopyBuffer.html)
pub fn enqueue_copy_buffer<T: OclPrm>(command_queue: &CommandQueue, src_buffer: &Mem,
        dst_buffer: &Mem, src_offset: usize, dst_offset: usize, len: usize,
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    let result = (|| {
        check_queue_mem(command_queue, src_buffer)?;
        check_queue_mem(command_queue, dst_buffer)?;
        let (so, dof) = (elem_bytes::<T>(src_offset)?, elem_bytes::<T>(dst_offset)?);
        let size = elem_bytes::<T>(len)?;
        buffer_of(src_buffer)?.validate_region([so, 0, 0], [size, 1, 1])?;
        buffer_of(dst_buffer)?.validate_region([dof, 0, 0], [size, 1, 1])?;
        validate::check_buffer_copy_overlap(src_buffer, so, dst_buffer, dof, size)?;

        let kind = CommandKind::Copy {
            src: src_buffer.as_arc().clone(),
            src_rect: Rect::linear(so, size),
            dst: dst_buffer.as_arc().clone(),
            dst_rect: Rect::linear(dof, size),
        };
        submit(command_queue, CommandType::CopyBuffer, wait_list, kind, false)
    })();

    eval_status(result, "clEnqueueCopyBuffer", None::<String>)
}

/// Copies a rectangular region between two buffers.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueCopyBufferRect.html)
pub fn enqueue_copy_buffer_rect<T: OclPrm>(command_queue: &CommandQueue, src_buffer: &Mem,
        dst_buffer: &Mem, src_origin: [usize; 3], dst_origin: [usize; 3], region: [usize; 3],
        src_row_pitch: usize, src_slc_pitch: usize, dst_row_pitch: usize, dst_slc_pitch: usize,
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    let result = (|| {
        check_queue_mem(command_queue, src_buffer)?;
        check_queue_mem(command_queue, dst_buffer)?;
        let (so, rgn, srp, ssp) = rect_bytes::<T>(src_origin, region, src_row_pitch,
            src_slc_pitch)?;
        let (dof, _, drp, dsp) = rect_bytes::<T>(dst_origin, region, dst_row_pitch,
            dst_slc_pitch)?;
        let src_rect = validate::validate_buffer_rect(buffer_of(src_buffer)?.size(), so, rgn,
            srp, ssp)?;
        let dst_rect = validate::validate_buffer_rect(buffer_of(dst_buffer)?.size(), dof, rgn,
            drp, dsp)?;
        validate::check_rect_copy_overlap(src_buffer, &src_rect, dst_buffer, &dst_rect)?;

        let kind = CommandKind::Copy {
            src: src_buffer.as_arc().clone(),
            src_rect,
            dst: dst_buffer.as_arc().clone(),
            dst_rect,
        };
        submit(command_queue, CommandType::CopyBufferRect, wait_list, kind, false)
    })();

    eval_status(result, "clEnqueueCopyBufferRect", None::<String>)
}

/// Fills `len` elements of `buffer`, starting at `offset`, with `pattern`.
///
/// The size of `T` must be a power of two no larger than 128 bytes.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueFillBuffer.html)
pub fn enqueue_fill_buffer<T: OclPrm>(command_queue: &CommandQueue, buffer: &Mem, pattern: T,
        offset: usize, len: usize, wait_list: Option<&[Event]>) -> OclResult<Event> {
    let e = mem::size_of::<T>();

    let result = (|| {
        if !e.is_power_of_two() || e > 128 {
            return Err(Status::CL_INVALID_VALUE);
        }
        check_queue_mem(command_queue, buffer)?;
        let (offset_bytes, size_bytes) = (elem_bytes::<T>(offset)?, elem_bytes::<T>(len)?);
        buffer_of(buffer)?.validate_region([offset_bytes, 0, 0], [size_bytes, 1, 1])?;

        let kind = CommandKind::Fill {
            mem: buffer.as_arc().clone(),
            rect: Rect::linear(offset_bytes, size_bytes),
            pattern: util::as_bytes(&[pattern]).to_vec(),
        };
        submit(command_queue, CommandType::FillBuffer, wait_list, kind, false)
    })();

    eval_status(result, "clEnqueueFillBuffer", None::<String>)
}

/// A validated image access: the object addressed (a level view for mip
/// levels above 0), the device rect, and whether it covers all storage.
struct ImageAccess {
    mem: Arc<Memory>,
    origin: [usize; 3],
    rect: Rect,
    covers_all: bool,
}

fn image_access(command_queue: &CommandQueue, image: &Mem, origin: [usize; 3],
        region: [usize; 3]) -> ClResult<ImageAccess> {
    check_queue_mem(command_queue, image)?;
    if !image.mem_type().is_image() {
        return Err(Status::CL_INVALID_MEM_OBJECT);
    }

    let mut origin = origin;
    let view = memory::resolve_mip_level(image.as_arc(), &mut origin)?;
    let (rect, covers_all) = {
        let img = view.as_image().ok_or(Status::CL_INVALID_MEM_OBJECT)?;
        img.validate_region(origin, region)?;
        let covers_all = view.parent().is_none() && img.num_mip_levels() == 1
            && img.desc().storage_size() == view.size()
            && img.is_entirely_covered(origin, region);
        (img.rect(origin, region), covers_all)
    };

    Ok(ImageAccess { mem: view, origin, rect, covers_all })
}

fn image_host_rect(access: &ImageAccess, region: [usize; 3], row_pitch: usize,
        slc_pitch: usize) -> ClResult<Rect> {
    access.mem.as_image().ok_or(Status::CL_INVALID_MEM_OBJECT)?
        .host_rect(region, row_pitch, slc_pitch)
}

/// Enqueues a read of a region of `image` into `data`.
///
/// For mipmapped images the coordinate after the ones the image type uses
/// selects the mip level. Zero pitches describe tightly packed host data.
///
/// ## Safety
///
/// `data` must live, and must not be touched, until the returned event
/// completes.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueReadImage.html)
pub unsafe fn enqueue_read_image<T: OclPrm>(command_queue: &CommandQueue, image: &Mem,
        block: bool, origin: [usize; 3], region: [usize; 3], row_pitch: usize,
        slc_pitch: usize, data: &mut [T], wait_list: Option<&[Event]>) -> OclResult<Event> {
    let fn_name = "clEnqueueReadImage";
    let (access, host_rect) = eval_status((|| {
        validate::check_host_read(image.mem_flags())?;
        let access = image_access(command_queue, image, origin, region)?;
        let host_rect = image_host_rect(&access, region, row_pitch, slc_pitch)?;
        Ok((access, host_rect))
    })(), fn_name, None::<String>)?;
    check_host_len(host_rect.end(), data.len() * mem::size_of::<T>())?;

    let kind = CommandKind::Read {
        mem: access.mem,
        rect: access.rect,
        host: HostPtr(data.as_mut_ptr() as *mut u8),
        host_rect,
    };
    eval_status(submit(command_queue, CommandType::ReadImage, wait_list, kind, block), fn_name,
        None::<String>)
}

/// Enqueues a write of `data` into a region of `image`.
///
/// ## Safety
///
/// `data` must live until the returned event completes.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueWriteImage.html)
pub unsafe fn enqueue_write_image<T: OclPrm>(command_queue: &CommandQueue, image: &Mem,
        block: bool, origin: [usize; 3], region: [usize; 3], input_row_pitch: usize,
        input_slc_pitch: usize, data: &[T], wait_list: Option<&[Event]>) -> OclResult<Event> {
    let fn_name = "clEnqueueWriteImage";
    let (access, host_rect) = eval_status((|| {
        validate::check_host_write(image.mem_flags())?;
        let access = image_access(command_queue, image, origin, region)?;
        let host_rect = image_host_rect(&access, region, input_row_pitch, input_slc_pitch)?;
        Ok((access, host_rect))
    })(), fn_name, None::<String>)?;
    check_host_len(host_rect.end(), data.len() * mem::size_of::<T>())?;

    let kind = CommandKind::Write {
        mem: access.mem,
        rect: access.rect,
        host: HostPtr(data.as_ptr() as *mut u8),
        host_rect,
        covers_all: access.covers_all,
    };
    eval_status(submit(command_queue, CommandType::WriteImage, wait_list, kind, block), fn_name,
        None::<String>)
}

/// Copies a region between two images of the same format.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueCopyImage.html)
pub fn enqueue_copy_image(command_queue: &CommandQueue, src_image: &Mem, dst_image: &Mem,
        src_origin: [usize; 3], dst_origin: [usize; 3], region: [usize; 3],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    let result = (|| {
        let src = image_access(command_queue, src_image, src_origin, region)?;
        let dst = image_access(command_queue, dst_image, dst_origin, region)?;

        let src_format = src.mem.as_image().map(|i| i.format());
        let dst_format = dst.mem.as_image().map(|i| i.format());
        if src_format != dst_format {
            return Err(Status::CL_IMAGE_FORMAT_MISMATCH);
        }
        validate::check_image_copy_overlap(&src.mem, src.origin, &dst.mem, dst.origin, region)?;

        let kind = CommandKind::Copy {
            src: src.mem,
            src_rect: src.rect,
            dst: dst.mem,
            dst_rect: dst.rect,
        };
        submit(command_queue, CommandType::CopyImage, wait_list, kind, false)
    })();

    eval_status(result, "clEnqueueCopyImage", None::<String>)
}

/// Fills a region of `image` with `color`, converted to the image format.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueFillImage.html)
pub fn enqueue_fill_image(command_queue: &CommandQueue, image: &Mem, color: &ImageFillColor,
        origin: [usize; 3], region: [usize; 3], wait_list: Option<&[Event]>)
        -> OclResult<Event> {
    let result = (|| {
        let access = image_access(command_queue, image, origin, region)?;
        let format = access.mem.as_image().ok_or(Status::CL_INVALID_MEM_OBJECT)?.format();
        let pattern = memory::fill_pattern(&format, color)?;

        let kind = CommandKind::Fill { mem: access.mem, rect: access.rect, pattern };
        submit(command_queue, CommandType::FillImage, wait_list, kind, false)
    })();

    eval_status(result, "clEnqueueFillImage", None::<String>)
}

/// The tightly packed linear rect of an image region placed `offset` bytes
/// into `buffer`.
fn packed_buffer_rect(access: &ImageAccess, buffer: &Mem, region: [usize; 3], offset: usize)
        -> ClResult<Rect> {
    let size = buffer_of(buffer)?.size();
    let mut rect = image_host_rect(access, region, 0, 0)?;
    rect.origin[0] = rect.origin[0].checked_add(offset).ok_or(Status::CL_INVALID_VALUE)?;
    match rect.checked_end() {
        Some(end) if end <= size => Ok(rect),
        _ => Err(Status::CL_INVALID_VALUE),
    }
}

/// Copies a region of `src_image` into `dst_buffer`, tightly packed,
/// starting `dst_offset` bytes into the buffer.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueCopyImageToBuffer.html)
pub fn enqueue_copy_image_to_buffer(command_queue: &CommandQueue, src_image: &Mem,
        dst_buffer: &Mem, src_origin: [usize; 3], region: [usize; 3], dst_offset: usize,
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    let result = (|| {
        check_queue_mem(command_queue, dst_buffer)?;
        let src = image_access(command_queue, src_image, src_origin, region)?;
        let dst_rect = packed_buffer_rect(&src, dst_buffer, region, dst_offset)?;
        validate::check_rect_copy_overlap(&src.mem, &src.rect, dst_buffer, &dst_rect)?;

        let kind = CommandKind::Copy {
            src: src.mem,
            src_rect: src.rect,
            dst: dst_buffer.as_arc().clone(),
            dst_rect,
        };
        submit(command_queue, CommandType::CopyImageToBuffer, wait_list, kind, false)
    })();

    eval_status(result, "clEnqueueCopyImageToBuffer", None::<String>)
}

/// Copies tightly packed pixels starting `src_offset` bytes into
/// `src_buffer` into a region of `dst_image`.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueCopyBufferToImage.html)
pub fn enqueue_copy_buffer_to_image(command_queue: &CommandQueue, src_buffer: &Mem,
        dst_image: &Mem, src_offset: usize, dst_origin: [usize; 3], region: [usize; 3],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    let result = (|| {
        check_queue_mem(command_queue, src_buffer)?;
        let dst = image_access(command_queue, dst_image, dst_origin, region)?;
        let src_rect = packed_buffer_rect(&dst, src_buffer, region, src_offset)?;
        validate::check_rect_copy_overlap(src_buffer, &src_rect, &dst.mem, &dst.rect)?;

        let kind = CommandKind::Copy {
            src: src_buffer.as_arc().clone(),
            src_rect,
            dst: dst.mem,
            dst_rect: dst.rect,
        };
        submit(command_queue, CommandType::CopyBufferToImage, wait_list, kind, false)
    })();

    eval_status(result, "clEnqueueCopyBufferToImage", None::<String>)
}

/// Frees the staging block of an entry which never reached the queue.
fn release_map_entry(entry: &MapEntry) {
    if entry.target.staged && !entry.host_backed {
        entry.dev_mem.release_map_target(&entry.target);
    }
}

/// Drops a registered mapping whose command failed.
fn roll_back_map(mem: &Memory, entry: &MapEntry) {
    if let Some(entry) = mem.take_map_entry(entry.target.ptr.as_ptr()) {
        mem.dec_map_count();
        release_map_entry(&entry);
    }
}

/// Maps `rect` (bytes, relative to `mem`) for the host.
///
/// Host-backed objects map their host copy; others map the device
/// allocation directly when it is host visible and a staging block
/// otherwise.
fn _enqueue_map(command_queue: &CommandQueue, mem: &Arc<Memory>, block: bool,
        map_flags: MapFlags, rect: Rect, pitches: Option<[usize; 2]>, command_type: CommandType,
        wait_list: Option<&[Event]>) -> ClResult<(MapTarget, Event)> {
    validate::validate_map_flags(map_flags)?;
    validate::check_map_access(mem.mem_flags(), map_flags)?;

    if mem.mem_flags().contains(MemFlags::USE_PERSISTENT_MEM_AMD) {
        command_queue.finish()?;
        mem.set_virtual_device(command_queue.virtual_device());
    }

    let (dev_mem, dev_base) = mem.get_device_memory(command_queue.device(), true)?
        .ok_or(Status::CL_MEM_OBJECT_ALLOCATION_FAILURE)?;
    let span = rect.end() - rect.offset();

    let (target, host_backed) = match mem.host_target() {
        Some(host) => {
            let ptr = NonNull::new(unsafe { host.add(rect.offset()) })
                .ok_or(Status::CL_MAP_FAILURE)?;
            let [row_pitch, slice_pitch] = pitches.unwrap_or([span, span]);
            (MapTarget { ptr, row_pitch, slice_pitch, staged: false }, true)
        },
        None => {
            let target = dev_mem.alloc_map_target(dev_base + rect.offset(), span, map_flags,
                pitches).ok_or(Status::CL_MAP_FAILURE)?;
            (target, false)
        },
    };
    let entry = MapEntry { rect, flags: map_flags, target, host_backed, dev_mem, dev_base };

    let command = match Command::new(command_queue, command_type, wait_list,
            CommandKind::Map { mem: mem.clone(), entry: entry.clone() }) {
        Ok(command) => command,
        Err(status) => {
            release_map_entry(&entry);
            return Err(status);
        },
    };
    if let Err(status) = command.validate_memory() {
        release_map_entry(&entry);
        return Err(status);
    }

    mem.inc_map_count();
    mem.add_map_entry(entry.clone());

    if let Err(status) = command.enqueue() {
        roll_back_map(mem, &entry);
        return Err(status);
    }
    if block {
        if let Err(status) = command.await_completion() {
            roll_back_map(mem, &entry);
            return Err(status);
        }
    }

    trace!("Memory {}: mapped {} bytes at {:p} ({:?}).", mem.id(), span, target.ptr, map_flags);
    Ok((target, command.event()))
}

/// Maps `len` elements of `buffer`, starting at `offset`, into host memory.
///
/// ## Safety
///
/// The mapping must not be accessed before its event completes and must be
/// passed to `enqueue_unmap_mem_object` when done. Writes through a read
/// mapping are lost.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueMapBuffer.html)
pub unsafe fn enqueue_map_buffer<T: OclPrm>(command_queue: &CommandQueue, buffer: &Mem,
        block: bool, map_flags: MapFlags, offset: usize, len: usize,
        wait_list: Option<&[Event]>) -> OclResult<MemMap<T>> {
    let result = check_queue_mem(command_queue, buffer)
        .and_then(|_| buffer_of(buffer))
        .and_then(|b| {
            let rect = Rect::linear(elem_bytes::<T>(offset)?, elem_bytes::<T>(len)?);
            b.validate_region(rect.origin, rect.region)?;
            Ok(rect)
        })
        .and_then(|rect| _enqueue_map(command_queue, buffer.as_arc(), block, map_flags, rect,
            None, CommandType::MapBuffer, wait_list));

    eval_status(result, "clEnqueueMapBuffer", None::<String>)
        .map(|(target, event)| MemMap::new(target.ptr, len, 0, 0, event))
}

/// Maps a region of `image` into host memory.
///
/// The mapping keeps the image's row and slice pitch, reported by the
/// returned `MemMap`.
///
/// ## Safety
///
/// See `enqueue_map_buffer`.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueMapImage.html)
pub unsafe fn enqueue_map_image<T: OclPrm>(command_queue: &CommandQueue, image: &Mem,
        block: bool, map_flags: MapFlags, origin: [usize; 3], region: [usize; 3],
        wait_list: Option<&[Event]>) -> OclResult<MemMap<T>> {
    let result = image_access(command_queue, image, origin, region).and_then(|access| {
        // Map entries live on the caller's object. A level view is a window
        // at a fixed offset into it.
        let mut rect = access.rect;
        if !Arc::ptr_eq(&access.mem, image.as_arc()) {
            rect.origin[0] += access.mem.origin();
        }
        _enqueue_map(command_queue, image.as_arc(), block, map_flags, rect,
            Some([rect.row_pitch, rect.slice_pitch]), CommandType::MapImage, wait_list)
            .map(|(target, event)| (target, event, rect))
    });

    eval_status(result, "clEnqueueMapImage", None::<String>).map(|(target, event, rect)| {
        let len = (rect.end() - rect.offset()) / mem::size_of::<T>();
        MemMap::new(target.ptr, len, target.row_pitch, target.slice_pitch, event)
    })
}

/// Unmaps a mapping returned by `enqueue_map_buffer` or `enqueue_map_image`
/// for `memobj`, writing host changes back for write mappings.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueUnmapMemObject.html)
pub fn enqueue_unmap_mem_object<T: OclPrm>(command_queue: &CommandQueue, memobj: &Mem,
        mapped_mem: MemMap<T>, wait_list: Option<&[Event]>) -> OclResult<Event> {
    let result = (|| {
        check_queue_mem(command_queue, memobj)?;
        // Checked up front so that a bad wait list leaves the mapping intact.
        event::validate_wait_list(command_queue.context(), wait_list)?;

        let entry = memobj.take_map_entry(mapped_mem.as_ptr() as *const u8)
            .ok_or(Status::CL_INVALID_VALUE)?;
        let command = match Command::new(command_queue, CommandType::UnmapMemObject, wait_list,
                CommandKind::Unmap { mem: memobj.as_arc().clone(), entry: entry.clone() }) {
            Ok(command) => command,
            Err(status) => {
                memobj.add_map_entry(entry);
                return Err(status);
            },
        };

        if let Err(status) = command.enqueue() {
            memobj.add_map_entry(entry);
            return Err(status);
        }
        Ok(command.event())
    })();

    eval_status(result, "clEnqueueUnmapMemObject", None::<String>)
}

/// Moves memory objects to the queue's device.
///
/// `OBJECT_HOST` replaces the device allocation by a fresh host-visible one
/// (skipped while the object is mapped); `OBJECT_CONTENT_UNDEFINED` skips
/// bringing the contents over.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueMigrateMemObjects.html)
pub fn enqueue_migrate_mem_objects(command_queue: &CommandQueue, mem_objects: &[Mem],
        flags: MemMigrationFlags, wait_list: Option<&[Event]>) -> OclResult<Event> {
    let result = (|| {
        if mem_objects.is_empty() {
            return Err(Status::CL_INVALID_VALUE);
        }
        for mem in mem_objects {
            check_queue_mem(command_queue, mem)?;
        }
        let kind = CommandKind::Migrate {
            mems: mem_objects.iter().map(|m| m.as_arc().clone()).collect(),
            flags,
        };
        submit(command_queue, CommandType::MigrateMemObjects, wait_list, kind, false)
    })();

    eval_status(result, "clEnqueueMigrateMemObjects", None::<String>)
}

//============================================================================
//============================ Interop APIs ==================================
//============================================================================

/// Wraps a Direct3D 10 buffer.
pub fn create_from_d3d10_buffer(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D10ResourceDesc>) -> OclResult<Mem> {
    eval_status(d3d10::create_from_d3d10_buffer(context, flags, resource),
        "clCreateFromD3D10BufferKHR", None::<String>).map(Mem::from_arc)
}

/// Wraps one subresource of a Direct3D 10 2D texture.
pub fn create_from_d3d10_texture_2d(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D10ResourceDesc>, subresource: u32) -> OclResult<Mem> {
    eval_status(d3d10::create_from_d3d10_texture_2d(context, flags, resource, subresource),
        "clCreateFromD3D10Texture2DKHR", None::<String>).map(Mem::from_arc)
}

/// Wraps one mip level of a Direct3D 10 3D texture.
pub fn create_from_d3d10_texture_3d(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D10ResourceDesc>, subresource: u32) -> OclResult<Mem> {
    eval_status(d3d10::create_from_d3d10_texture_3d(context, flags, resource, subresource),
        "clCreateFromD3D10Texture3DKHR", None::<String>).map(Mem::from_arc)
}

/// Wraps a Direct3D 11 buffer.
pub fn create_from_d3d11_buffer(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D11ResourceDesc>) -> OclResult<Mem> {
    eval_status(d3d11::create_from_d3d11_buffer(context, flags, resource),
        "clCreateFromD3D11BufferKHR", None::<String>).map(Mem::from_arc)
}

/// Wraps one subresource of a Direct3D 11 2D texture. Planar textures yield
/// their first plane; see `get_plane_from_image_amd`.
pub fn create_from_d3d11_texture_2d(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D11ResourceDesc>, subresource: u32) -> OclResult<Mem> {
    eval_status(d3d11::create_from_d3d11_texture_2d(context, flags, resource, subresource),
        "clCreateFromD3D11Texture2DKHR", None::<String>).map(Mem::from_arc)
}

/// Wraps one mip level of a Direct3D 11 3D texture.
pub fn create_from_d3d11_texture_3d(context: &Context, flags: MemFlags,
        resource: NativeRef<D3D11ResourceDesc>, subresource: u32) -> OclResult<Mem> {
    eval_status(d3d11::create_from_d3d11_texture_3d(context, flags, resource, subresource),
        "clCreateFromD3D11Texture3DKHR", None::<String>).map(Mem::from_arc)
}

/// Returns a 2D image over `plane` of a planar Direct3D 11 image.
pub fn get_plane_from_image_amd(context: &Context, image: &Mem, plane: u32) -> OclResult<Mem> {
    eval_status(d3d11::get_plane_from_image(context, image.as_arc(), plane),
        "clGetPlaneFromImageAMD", None::<String>).map(Mem::from_arc)
}

/// Wraps one plane of a Direct3D 9 media surface.
pub fn create_from_dx9_media_surface(context: &Context, flags: MemFlags,
        surface: NativeRef<D3D9SurfaceDesc>, plane: u32) -> OclResult<Mem> {
    eval_status(d3d9::create_from_dx9_media_surface(context, flags, surface, plane),
        "clCreateFromDX9MediaSurfaceKHR", None::<String>).map(Mem::from_arc)
}

/// Wraps an OpenGL buffer object.
pub fn create_from_gl_buffer(context: &Context, flags: MemFlags,
        resource: NativeRef<GlObjectDesc>) -> OclResult<Mem> {
    eval_status(gl::create_from_gl_buffer(context, flags, resource), "clCreateFromGLBuffer",
        None::<String>).map(Mem::from_arc)
}

/// Wraps mip level `mip_level` of an OpenGL 2D or rectangle texture.
pub fn create_from_gl_texture(context: &Context, flags: MemFlags, texture_target: ffi::cl_GLenum,
        mip_level: u32, resource: NativeRef<GlObjectDesc>) -> OclResult<Mem> {
    eval_status(gl::create_from_gl_texture(context, flags, texture_target, mip_level, resource),
        "clCreateFromGLTexture", None::<String>).map(Mem::from_arc)
}

/// Moves the acquire state of the native resources behind `mem_objects` and
/// enqueues the matching synchronisation command.
///
/// Objects sharing one binding (a planar image and its planes) count once.
/// On failure no acquire state is left changed.
fn _enqueue_interop(command_queue: &CommandQueue, api: InteropApi, mem_objects: &[Mem],
        wait_list: Option<&[Event]>, acquire: bool) -> ClResult<Event> {
    if mem_objects.is_empty() {
        return Err(Status::CL_INVALID_VALUE);
    }

    let mut bindings: Vec<InteropBinding> = Vec::with_capacity(mem_objects.len());
    for mem in mem_objects {
        check_queue_mem(command_queue, mem)?;
        match mem.interop() {
            Some(binding) if binding.api() == api => {
                let key = binding.sync_key();
                if !bindings.iter().any(|b| b.sync_key() == key) {
                    bindings.push(binding.clone());
                }
            },
            _ => return Err(api.invalid_resource()),
        }
    }

    let (command_type, kind) = if acquire {
        (api.acquire_command(), CommandKind::AcquireInterop {
            mems: mem_objects.iter().map(|m| m.as_arc().clone()).collect(),
        })
    } else {
        (api.release_command(), CommandKind::ReleaseInterop {
            mems: mem_objects.iter().map(|m| m.as_arc().clone()).collect(),
        })
    };
    let command = Command::new(command_queue, command_type, wait_list, kind)?;
    command.validate_memory()?;

    let flip = |binding: &InteropBinding, acquire: bool| if acquire {
        binding.as_sync().try_acquire()
    } else {
        binding.as_sync().try_release()
    };

    for (i, binding) in bindings.iter().enumerate() {
        if let Err(status) = flip(binding, acquire) {
            for done in &bindings[..i] {
                let _ = flip(done, !acquire);
            }
            return Err(status);
        }
    }

    if let Err(status) = command.enqueue() {
        for binding in &bindings {
            let _ = flip(binding, !acquire);
        }
        return Err(status);
    }
    Ok(command.event())
}

/// Acquires Direct3D 10 objects for use by commands on `command_queue`.
pub fn enqueue_acquire_d3d10_objects(command_queue: &CommandQueue, mem_objects: &[Mem],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    eval_status(_enqueue_interop(command_queue, InteropApi::D3D10, mem_objects, wait_list, true),
        "clEnqueueAcquireD3D10ObjectsKHR", None::<String>)
}

/// Releases Direct3D 10 objects back to Direct3D.
pub fn enqueue_release_d3d10_objects(command_queue: &CommandQueue, mem_objects: &[Mem],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    eval_status(_enqueue_interop(command_queue, InteropApi::D3D10, mem_objects, wait_list, false),
        "clEnqueueReleaseD3D10ObjectsKHR", None::<String>)
}

pub fn enqueue_acquire_d3d11_objects(command_queue: &CommandQueue, mem_objects: &[Mem],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    eval_status(_enqueue_interop(command_queue, InteropApi::D3D11, mem_objects, wait_list, true),
        "clEnqueueAcquireD3D11ObjectsKHR", None::<String>)
}

pub fn enqueue_release_d3d11_objects(command_queue: &CommandQueue, mem_objects: &[Mem],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    eval_status(_enqueue_interop(command_queue, InteropApi::D3D11, mem_objects, wait_list, false),
        "clEnqueueReleaseD3D11ObjectsKHR", None::<String>)
}

pub fn enqueue_acquire_dx9_media_surfaces(command_queue: &CommandQueue, mem_objects: &[Mem],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    eval_status(_enqueue_interop(command_queue, InteropApi::D3D9, mem_objects, wait_list, true),
        "clEnqueueAcquireDX9MediaSurfacesKHR", None::<String>)
}

pub fn enqueue_release_dx9_media_surfaces(command_queue: &CommandQueue, mem_objects: &[Mem],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    eval_status(_enqueue_interop(command_queue, InteropApi::D3D9, mem_objects, wait_list, false),
        "clEnqueueReleaseDX9MediaSurfacesKHR", None::<String>)
}

/// Acquires OpenGL objects for use by commands on `command_queue`.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueAcquireGLObjects.html)
pub fn enqueue_acquire_gl_objects(command_queue: &CommandQueue, mem_objects: &[Mem],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    eval_status(_enqueue_interop(command_queue, InteropApi::Gl, mem_objects, wait_list, true),
        "clEnqueueAcquireGLObjects", None::<String>)
}

/// Releases OpenGL objects back to OpenGL.
///
/// [SDK Docs](https://www.khronos.org/registry/OpenCL/sdk/2.0/docs/man/xhtml/clEnqueueReleaseGLObjects.html)
pub fn enqueue_release_gl_objects(command_queue: &CommandQueue, mem_objects: &[Mem],
        wait_list: Option<&[Event]>) -> OclResult<Event> {
    eval_status(_enqueue_interop(command_queue, InteropApi::Gl, mem_objects, wait_list, false),
        "clEnqueueReleaseGLObjects", None::<String>)
}
