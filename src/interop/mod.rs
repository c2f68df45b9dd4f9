//! Bridges between native graphics resources and memory objects.
//!
//! Every bridge follows the same lifecycle:
//!
//! * **Bound**: the native resource is checked against the requested object
//!   shape, its description is cached, a native reference is taken and, when
//!   the device cannot use the resource directly, a shared copy is created.
//! * **Registered**: the `(resource, subresource, plane)` key is inserted into
//!   the platform's [`InteropRegistry`]. A key already present fails the
//!   construction with the API's invalid-resource status.
//! * **Released**: native references are dropped and the key erased, both
//!   under the registry lock.
//!
//! Acquire and release commands keep the original resource and the shared
//! copy coherent with a blocking native copy followed by a fence spin-wait.
//!
//! The native graphics APIs themselves are reached through the
//! [`NativeResource`] trait, implemented by the embedder.

mod registry;
pub mod d3d9;
pub mod d3d10;
pub mod d3d11;
pub mod gl;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use crate::context::Context;
use crate::error::ClResult;
use crate::memory::{ImageDesc, MemKind, Memory, MemoryInit};
use crate::validate;
use crate::{CommandType, ImageFormat, MemFlags, MemObjectType, Status};

pub use self::registry::{InteropRegistry, Registration, ResourceKey};
pub use self::d3d9::{D3D9Object, D3D9SurfaceDesc};
pub use self::d3d10::{D3D10Object, D3D10ResourceDesc};
pub use self::d3d11::{D3D11Object, D3D11ResourceDesc};
pub use self::gl::{GlObject, GlObjectDesc};


/// An opaque native pointer (resource, device or context) used for identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub usize);


/// The native API a bridge talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteropApi {
    D3D9,
    D3D10,
    D3D11,
    Gl,
}

impl InteropApi {
    /// Status reported for a resource which cannot be wrapped.
    pub fn invalid_resource(&self) -> Status {
        match *self {
            InteropApi::D3D9 => Status::CL_INVALID_DX9_MEDIA_SURFACE_KHR,
            InteropApi::D3D10 => Status::CL_INVALID_D3D10_RESOURCE_KHR,
            InteropApi::D3D11 => Status::CL_INVALID_D3D11_RESOURCE_KHR,
            InteropApi::Gl => Status::CL_INVALID_GL_OBJECT,
        }
    }

    /// Status reported when no native device can be obtained.
    pub fn invalid_device(&self) -> Status {
        match *self {
            InteropApi::D3D9 => Status::CL_INVALID_DX9_MEDIA_ADAPTER_KHR,
            InteropApi::D3D10 => Status::CL_INVALID_D3D10_DEVICE_KHR,
            InteropApi::D3D11 => Status::CL_INVALID_D3D11_DEVICE_KHR,
            InteropApi::Gl => Status::CL_INVALID_GL_SHAREGROUP_REFERENCE_KHR,
        }
    }

    pub fn already_acquired(&self) -> Status {
        match *self {
            InteropApi::D3D9 => Status::CL_DX9_MEDIA_SURFACE_ALREADY_ACQUIRED_KHR,
            InteropApi::D3D10 => Status::CL_D3D10_RESOURCE_ALREADY_ACQUIRED_KHR,
            InteropApi::D3D11 => Status::CL_D3D11_RESOURCE_ALREADY_ACQUIRED_KHR,
            InteropApi::Gl => Status::CL_INVALID_OPERATION,
        }
    }

    pub fn not_acquired(&self) -> Status {
        match *self {
            InteropApi::D3D9 => Status::CL_DX9_MEDIA_SURFACE_NOT_ACQUIRED_KHR,
            InteropApi::D3D10 => Status::CL_D3D10_RESOURCE_NOT_ACQUIRED_KHR,
            InteropApi::D3D11 => Status::CL_D3D11_RESOURCE_NOT_ACQUIRED_KHR,
            InteropApi::Gl => Status::CL_INVALID_OPERATION,
        }
    }

    pub fn acquire_command(&self) -> CommandType {
        match *self {
            InteropApi::D3D9 => CommandType::AcquireDx9MediaSurfaces,
            InteropApi::D3D10 => CommandType::AcquireD3d10Objects,
            InteropApi::D3D11 => CommandType::AcquireD3d11Objects,
            InteropApi::Gl => CommandType::AcquireGlObjects,
        }
    }

    pub fn release_command(&self) -> CommandType {
        match *self {
            InteropApi::D3D9 => CommandType::ReleaseDx9MediaSurfaces,
            InteropApi::D3D10 => CommandType::ReleaseD3d10Objects,
            InteropApi::D3D11 => CommandType::ReleaseD3d11Objects,
            InteropApi::Gl => CommandType::ReleaseGlObjects,
        }
    }
}


/// A native query or fence object.
pub trait NativeFence: Send {
    fn is_signaled(&self) -> bool;
}


/// The native API surface a bridge needs from one resource.
///
/// `Desc` is the API generation's fixed-size resource description.
pub trait NativeResource: Send + Sync + fmt::Debug {
    type Desc: Clone + fmt::Debug + Send + Sync + 'static;

    /// Identity of the resource (its interface pointer).
    fn handle(&self) -> NativeHandle;

    /// The native device owning the resource, if it can be obtained.
    fn native_device(&self) -> Option<NativeHandle>;

    /// Fills the description, or `None` if the native call failed.
    fn describe(&self) -> Option<Self::Desc>;

    fn add_ref(&self);

    fn release(&self);

    /// Creates a device-accessible copy with the same description.
    fn create_shared(&self, desc: &Self::Desc) -> Option<NativeRef<Self::Desc>>;

    /// Blocking native copy of the whole resource into `dst`.
    fn copy_to(&self, dst: &dyn NativeResource<Desc = Self::Desc>);

    /// Issues a fence behind all work submitted so far.
    fn issue_fence(&self) -> Box<dyn NativeFence>;
}

/// A shared reference to a native resource of description type `D`.
pub type NativeRef<D> = Arc<dyn NativeResource<Desc = D>>;


/// The bound state of one native resource.
pub struct InteropObject<D: Clone + fmt::Debug + Send + Sync + 'static> {
    api: InteropApi,
    resource: NativeRef<D>,
    shared: Option<NativeRef<D>>,
    desc: D,
    subresource: u32,
    plane: Option<u32>,
    acquired: AtomicBool,
    registration: Option<Registration>,
}

/// Parameters of `InteropObject::bind`.
pub(crate) struct BindParams<D> {
    pub api: InteropApi,
    pub resource: NativeRef<D>,
    pub subresource: u32,
    /// Plane of a planar surface, if any.
    pub plane: Option<u32>,
    /// Whether the plane is part of the dedup key.
    pub plane_in_key: bool,
    /// GL objects are not deduplicated.
    pub dedup: bool,
}

impl<D: Clone + fmt::Debug + Send + Sync + 'static> InteropObject<D> {
    /// Binds and registers a native resource.
    ///
    /// `check_shape` validates the description against the object shape
    /// being created and `needs_shared` decides whether a shared copy is
    /// required.
    pub(crate) fn bind<C, S>(context: &Context, params: BindParams<D>, check_shape: C,
            needs_shared: S) -> ClResult<InteropObject<D>>
            where C: FnOnce(&D) -> ClResult<()>, S: FnOnce(&D) -> bool {
        let BindParams { api, resource, subresource, plane, plane_in_key, dedup } = params;

        let native_device = resource.native_device().ok_or(api.invalid_device())?;
        match context.properties().interop_device(api) {
            Some(dev) if dev == native_device => (),
            _ => return Err(Status::CL_INVALID_CONTEXT),
        }

        let desc = resource.describe().ok_or(api.invalid_resource())?;
        check_shape(&desc)?;

        resource.add_ref();
        let mut obj = InteropObject {
            api,
            resource: resource.clone(),
            shared: None,
            desc,
            subresource,
            plane,
            acquired: AtomicBool::new(false),
            registration: None,
        };

        if needs_shared(&obj.desc) {
            // Dropping `obj` on failure releases the reference taken above.
            let shared = resource.create_shared(&obj.desc).ok_or(api.invalid_resource())?;
            obj.shared = Some(shared);
        }

        if dedup {
            let key = ResourceKey {
                resource: resource.handle().0,
                subresource,
                plane: if plane_in_key { plane } else { None },
            };
            let registration = context.interop_registry().register(key)
                .ok_or(api.invalid_resource())?;
            obj.registration = Some(registration);
        }

        debug!("InteropObject: bound {:?} resource {:?} (subresource: {}, plane: {:?}, \
            shared: {}).", api, resource.handle(), subresource, plane, obj.shared.is_some());
        Ok(obj)
    }

    pub fn api(&self) -> InteropApi {
        self.api
    }

    pub fn resource(&self) -> &NativeRef<D> {
        &self.resource
    }

    pub fn shared_resource(&self) -> Option<&NativeRef<D>> {
        self.shared.as_ref()
    }

    pub fn desc(&self) -> &D {
        &self.desc
    }

    pub fn subresource(&self) -> u32 {
        self.subresource
    }

    pub fn plane(&self) -> Option<u32> {
        self.plane
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    /// Copies the original into the shared copy and waits for the copy.
    pub fn copy_orig_to_shared(&self) {
        if let Some(ref shared) = self.shared {
            sync_copy(&*self.resource, &**shared);
        }
    }

    /// Copies the shared copy back into the original and waits for the copy.
    pub fn copy_shared_to_orig(&self) {
        if let Some(ref shared) = self.shared {
            sync_copy(&**shared, &*self.resource);
        }
    }

    fn release_native(&self) {
        if let Some(ref shared) = self.shared {
            shared.release();
        }
        self.resource.release();
    }
}

impl<D: Clone + fmt::Debug + Send + Sync + 'static> Drop for InteropObject<D> {
    fn drop(&mut self) {
        match self.registration.take() {
            Some(registration) => registration.erase_with(|| self.release_native()),
            None => self.release_native(),
        }
        debug!("InteropObject: released {:?} resource {:?}.", self.api, self.resource.handle());
    }
}

impl<D: Clone + fmt::Debug + Send + Sync + 'static> fmt::Debug for InteropObject<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InteropObject")
            .field("api", &self.api)
            .field("resource", &self.resource.handle())
            .field("subresource", &self.subresource)
            .field("plane", &self.plane)
            .field("shared", &self.shared.is_some())
            .field("desc", &self.desc)
            .finish()
    }
}

fn sync_copy<D>(src: &dyn NativeResource<Desc = D>, dst: &dyn NativeResource<Desc = D>)
        where D: Clone + fmt::Debug + Send + Sync + 'static {
    src.copy_to(dst);
    let fence = dst.issue_fence();
    while !fence.is_signaled() {
        ::std::hint::spin_loop();
    }
}


/// Acquire-state bookkeeping shared by every bridge.
pub trait InteropSync: Send + Sync {
    fn api(&self) -> InteropApi;
    fn try_acquire(&self) -> ClResult<()>;
    fn try_release(&self) -> ClResult<()>;
    fn is_acquired(&self) -> bool;
    fn copy_orig_to_shared(&self);
    fn copy_shared_to_orig(&self);
}

impl<D: Clone + fmt::Debug + Send + Sync + 'static> InteropSync for InteropObject<D> {
    fn api(&self) -> InteropApi {
        self.api
    }

    fn try_acquire(&self) -> ClResult<()> {
        if self.acquired.swap(true, Ordering::AcqRel) {
            Err(self.api.already_acquired())
        } else {
            Ok(())
        }
    }

    fn try_release(&self) -> ClResult<()> {
        if self.acquired.swap(false, Ordering::AcqRel) {
            Ok(())
        } else {
            Err(self.api.not_acquired())
        }
    }

    fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::Acquire)
    }

    fn copy_orig_to_shared(&self) {
        InteropObject::copy_orig_to_shared(self)
    }

    fn copy_shared_to_orig(&self) {
        InteropObject::copy_shared_to_orig(self)
    }
}


/// The interop binding of a memory object.
#[derive(Clone, Debug)]
pub enum InteropBinding {
    D3D9(Arc<D3D9Object>),
    D3D10(Arc<D3D10Object>),
    D3D11(Arc<D3D11Object>),
    Gl(Arc<GlObject>),
}

impl InteropBinding {
    pub fn api(&self) -> InteropApi {
        self.as_sync().api()
    }

    pub fn as_sync(&self) -> &dyn InteropSync {
        match *self {
            InteropBinding::D3D9(ref o) => &**o,
            InteropBinding::D3D10(ref o) => &**o,
            InteropBinding::D3D11(ref o) => &**o,
            InteropBinding::Gl(ref o) => &**o,
        }
    }

    /// Identity of the bound native object. Planes split from one image
    /// share it.
    pub(crate) fn sync_key(&self) -> usize {
        self.as_sync() as *const dyn InteropSync as *const () as usize
    }

    pub fn as_d3d9(&self) -> Option<&Arc<D3D9Object>> {
        match *self { InteropBinding::D3D9(ref o) => Some(o), _ => None }
    }

    pub fn as_d3d10(&self) -> Option<&Arc<D3D10Object>> {
        match *self { InteropBinding::D3D10(ref o) => Some(o), _ => None }
    }

    pub fn as_d3d11(&self) -> Option<&Arc<D3D11Object>> {
        match *self { InteropBinding::D3D11(ref o) => Some(o), _ => None }
    }

    pub fn as_gl(&self) -> Option<&Arc<GlObject>> {
        match *self { InteropBinding::Gl(ref o) => Some(o), _ => None }
    }
}


//=============================================================================
//========================== MEMORY OBJECT HELPERS ============================
//=============================================================================

/// Checks the flags of an interop memory object. Only an access mode is
/// accepted; none means `READ_WRITE`.
pub(crate) fn check_interop_flags(flags: MemFlags) -> ClResult<MemFlags> {
    validate::validate_flags(flags, true)?;
    if !(flags - MemFlags::DEVICE_ACCESS).is_empty() {
        return Err(Status::CL_INVALID_VALUE);
    }
    if flags.is_empty() {
        Ok(MemFlags::READ_WRITE)
    } else {
        Ok(flags)
    }
}

/// Describes a tightly packed 2D image (or one mip level of a 2D texture).
pub(crate) fn image_2d_desc(format: ImageFormat, width: usize, height: usize) -> ImageDesc {
    let row_pitch = width * format.pixel_bytes();
    ImageDesc::new(MemObjectType::Image2d, format, [width, height, 1, 1], row_pitch,
        row_pitch * height, 1, 1)
}

/// Creates the memory object carrying `binding`.
///
/// `size` may exceed the image's own storage when the native resource packs
/// further planes behind it.
pub(crate) fn create_bound_memory(context: &Context, flags: MemFlags, mem_type: MemObjectType,
        size: usize, kind: MemKind, binding: InteropBinding) -> ClResult<Arc<Memory>> {
    let api = binding.api();
    let mut init = MemoryInit::root(context, mem_type, flags, size, kind);
    init.interop = Some(binding);

    let mem = Arc::new(Memory::new(init));
    mem.create(None, true)?;
    debug!("Memory {}: wraps a {:?} resource.", mem.id(), api);
    Ok(mem)
}
