//! The platform: device list plus process-wide interop state.

use std::sync::Arc;
use crate::device::{Device, DeviceInfo};
use crate::interop::InteropRegistry;


/// The runtime's composition root.
///
/// Owns the devices and the interop dedup registry. Contexts created from a
/// platform share its registry, so one platform per process gives the
/// process-wide "one memory object per native resource" guarantee.
#[derive(Debug)]
pub struct Platform {
    devices: Vec<Device>,
    registry: Arc<InteropRegistry>,
}

impl Platform {
    /// Creates a platform exposing one device per `DeviceInfo`.
    pub fn new<I>(device_infos: I) -> Platform
            where I: IntoIterator<Item = DeviceInfo> {
        let devices: Vec<Device> = device_infos.into_iter().map(Device::new).collect();
        debug!("Platform: created with {} device(s).", devices.len());

        Platform {
            devices,
            registry: Arc::new(InteropRegistry::new()),
        }
    }

    /// A platform with a single default host device.
    pub fn host() -> Platform {
        Platform::new(vec![DeviceInfo::default()])
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn interop_registry(&self) -> &Arc<InteropRegistry> {
        &self.registry
    }
}
