//! Contexts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use crate::device::{Device, DeviceMemory};
use crate::error::ClResult;
use crate::interop::{InteropApi, InteropRegistry, NativeHandle};
use crate::{MemFlags, Platform, Status};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Largest alignment `svm_alloc` honours; every allocation is page aligned.
const SVM_MAX_ALIGN: usize = 4096;


/// Context creation properties.
///
/// Carries the native device (or GL context) a context is bound to for each
/// interop API. A memory object wrapping a native resource must come from
/// the same native device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextProperties {
    d3d9_device: Option<NativeHandle>,
    d3d10_device: Option<NativeHandle>,
    d3d11_device: Option<NativeHandle>,
    gl_context: Option<NativeHandle>,
}

impl ContextProperties {
    pub fn new() -> ContextProperties {
        ContextProperties::default()
    }

    /// `CL_CONTEXT_ADAPTER_D3D9_KHR`
    pub fn d3d9_device(mut self, device: NativeHandle) -> ContextProperties {
        self.d3d9_device = Some(device);
        self
    }

    /// `CL_CONTEXT_D3D10_DEVICE_KHR`
    pub fn d3d10_device(mut self, device: NativeHandle) -> ContextProperties {
        self.d3d10_device = Some(device);
        self
    }

    /// `CL_CONTEXT_D3D11_DEVICE_KHR`
    pub fn d3d11_device(mut self, device: NativeHandle) -> ContextProperties {
        self.d3d11_device = Some(device);
        self
    }

    /// `CL_GL_CONTEXT_KHR`
    pub fn gl_context(mut self, context: NativeHandle) -> ContextProperties {
        self.gl_context = Some(context);
        self
    }

    /// The native device bound for `api`, if any.
    pub fn interop_device(&self, api: InteropApi) -> Option<NativeHandle> {
        match api {
            InteropApi::D3D9 => self.d3d9_device,
            InteropApi::D3D10 => self.d3d10_device,
            InteropApi::D3D11 => self.d3d11_device,
            InteropApi::Gl => self.gl_context,
        }
    }
}


/// A shared virtual memory allocation.
pub(crate) struct SvmAllocation {
    pub mem: Arc<DeviceMemory>,
    pub flags: MemFlags,
}


struct ContextInner {
    id: u64,
    devices: Vec<Device>,
    properties: ContextProperties,
    registry: Arc<InteropRegistry>,
    svm: Mutex<BTreeMap<usize, SvmAllocation>>,
}

/// A context.
#[derive(Clone)]
pub struct Context(Arc<ContextInner>);

impl Context {
    pub(crate) fn new(platform: &Platform, properties: ContextProperties, devices: &[Device])
            -> ClResult<Context> {
        if devices.is_empty() {
            return Err(Status::CL_INVALID_VALUE);
        }
        if devices.iter().any(|d| !platform.devices().contains(d)) {
            return Err(Status::CL_INVALID_DEVICE);
        }

        let mut devices = devices.to_vec();
        devices.dedup();
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        debug!("Context {}: created with {} device(s).", id, devices.len());

        Ok(Context(Arc::new(ContextInner {
            id,
            devices,
            properties,
            registry: platform.interop_registry().clone(),
            svm: Mutex::new(BTreeMap::new()),
        })))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn devices(&self) -> &[Device] {
        &self.0.devices
    }

    pub fn properties(&self) -> &ContextProperties {
        &self.0.properties
    }

    pub fn contains_device(&self, device: &Device) -> bool {
        self.0.devices.contains(device)
    }

    pub(crate) fn interop_registry(&self) -> &Arc<InteropRegistry> {
        &self.0.registry
    }

    /// Allocates `size` bytes of SVM visible to every device in the context.
    pub(crate) fn svm_alloc(&self, flags: MemFlags, size: usize, alignment: usize)
            -> ClResult<*mut u8> {
        if size == 0 || !self.0.devices.iter().any(|d| d.can_allocate(size)) {
            return Err(Status::CL_INVALID_VALUE);
        }
        if alignment > SVM_MAX_ALIGN || (alignment != 0 && !alignment.is_power_of_two()) {
            return Err(Status::CL_INVALID_VALUE);
        }

        let mem = DeviceMemory::with_visibility(self.0.devices[0].id(), size, true)?;
        let ptr = mem.as_ptr();
        self.0.svm.lock().insert(ptr as usize, SvmAllocation { mem, flags });
        debug!("Context {}: svm allocation of {} bytes at {:p}.", self.0.id, size, ptr);
        Ok(ptr)
    }

    /// Frees an SVM allocation. Memory objects wrapping it keep the storage
    /// alive until they are released.
    pub(crate) fn svm_free(&self, ptr: *mut u8) -> ClResult<()> {
        match self.0.svm.lock().remove(&(ptr as usize)) {
            Some(_) => Ok(()),
            None => Err(Status::CL_INVALID_VALUE),
        }
    }

    /// Finds the SVM allocation containing `ptr`, returning its storage, the
    /// offset of `ptr` inside it and the allocation flags.
    pub(crate) fn find_svm(&self, ptr: *const u8) -> Option<(Arc<DeviceMemory>, usize, MemFlags)> {
        let addr = ptr as usize;
        let svm = self.0.svm.lock();
        let (&base, alloc) = svm.range(..=addr).next_back()?;

        if addr < base + alloc.mem.size() {
            Some((alloc.mem.clone(), addr - base, alloc.flags))
        } else {
            None
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.0.id)
            .field("devices", &self.0.devices)
            .finish()
    }
}
