//! Entry-point level tests, run against the host device backend.
//!
//! Leaf modules carry their own unit tests; everything here goes through
//! `functions` the way a caller would.

mod buffer_ops;
mod image_ops;
mod map;
mod refcount;
mod objects;
mod interop;

use std::fmt::Debug;
use rand::Rng;
use crate::error::Result as OclResult;
use crate::{Context, ContextProperties, CommandQueue, DeviceInfo, Mem, MemFlags, OclPrm,
    Platform, Status};

const PRINT_ITERS_MAX: i32 = 0;


/// A platform with one context and one queue on its first device.
pub struct TestEnv {
    pub platform: Platform,
    pub context: Context,
    pub queue: CommandQueue,
}

impl TestEnv {
    pub fn new() -> TestEnv {
        TestEnv::with_devices(vec![DeviceInfo::default()], ContextProperties::new())
    }

    pub fn with_device(info: DeviceInfo) -> TestEnv {
        TestEnv::with_devices(vec![info], ContextProperties::new())
    }

    pub fn with_properties(properties: ContextProperties) -> TestEnv {
        TestEnv::with_devices(vec![DeviceInfo::default()], properties)
    }

    pub fn with_devices(infos: Vec<DeviceInfo>, properties: ContextProperties) -> TestEnv {
        let platform = Platform::new(infos);
        let devices = platform.devices().to_vec();
        let context = crate::create_context(&platform, Some(&properties), &devices).unwrap();
        let queue = crate::create_command_queue(&context, &devices[0]).unwrap();
        TestEnv { platform, context, queue }
    }

    /// A second context on the same platform.
    pub fn other_context(&self) -> Context {
        crate::create_context(&self.platform, None, self.platform.devices()).unwrap()
    }
}


/// A device whose allocations are not host addressable, so that every
/// mapping goes through a staging block.
pub fn discrete_device() -> DeviceInfo {
    DeviceInfo { host_unified_memory: false, ..DeviceInfo::default() }
}

/// Returns the status of a failed entry point call.
pub fn status<T: Debug>(result: OclResult<T>) -> Status {
    let err = result.unwrap_err();
    err.api_status().unwrap_or_else(|| panic!("not an api error: {}", err))
}

/// Creates a `READ_WRITE` buffer initialised from `data`.
pub fn buffer_from<T: OclPrm>(context: &Context, data: &[T]) -> Mem {
    unsafe {
        crate::create_buffer(context, MemFlags::READ_WRITE | MemFlags::COPY_HOST_PTR,
            data.len(), Some(data)).unwrap()
    }
}

/// Reads a whole buffer of `len` elements.
pub fn read_all<T: OclPrm>(env: &TestEnv, buffer: &Mem, len: usize) -> Vec<T> {
    let mut vec = vec![T::default(); len];
    unsafe {
        crate::enqueue_read_buffer(&env.queue, buffer, true, 0, &mut vec, None).unwrap();
    }
    vec
}

pub fn gen_region_origin(dims: &[usize; 3]) -> ([usize; 3], [usize; 3]) {
    let mut rng = rand::thread_rng();

    let region = [
        rng.gen_range(1..=dims[0]),
        rng.gen_range(1..=dims[1]),
        rng.gen_range(1..=dims[2]),
    ];

    let origin = [
        rng.gen_range(0..=(dims[0] - region[0])),
        rng.gen_range(0..=(dims[1] - region[1])),
        rng.gen_range(0..=(dims[2] - region[2])),
    ];

    (origin, region)
}

pub fn within_region(coords: [usize; 3], region_ofs: [usize; 3], region_size: [usize; 3]) -> bool {
    let mut within: bool = true;
    for i in 0..3 {
        within &= coords[i] >= region_ofs[i] && coords[i] < (region_ofs[i] + region_size[i]);
    }
    within
}

/// Checks that every element of `vec` (laid out as `vec_dims` coordinates of
/// `ele_per_coord` elements) holds `in_region_val` inside the region and
/// `out_region_val` outside it.
pub fn verify_vec_rect<T: OclPrm>(origin: [usize; 3], region: [usize; 3], in_region_val: T,
        out_region_val: T, vec_dims: [usize; 3], ele_per_coord: usize, vec: &[T], ttl_runs: i32)
        -> Result<(), String> {
    let print = ttl_runs <= PRINT_ITERS_MAX;

    if print {
        println!("Verifying run: '{}', origin: {:?}, region: {:?}, vec_dims: {:?}", ttl_runs,
            origin, region, vec_dims);
    }

    for z in 0..vec_dims[2] {
        for y in 0..vec_dims[1] {
            for x in 0..vec_dims[0] {
                let idx = ((z * vec_dims[1] * vec_dims[0]) + (y * vec_dims[0]) + x)
                    * ele_per_coord;
                let expected = if within_region([x, y, z], origin, region) {
                    in_region_val
                } else {
                    out_region_val
                };

                for e in 0..ele_per_coord {
                    if vec[idx + e] != expected {
                        return Err(format!("run {}: value {:?} at [{}, {}, {}] (element {}), \
                            expected {:?} (origin: {:?}, region: {:?})", ttl_runs, vec[idx + e],
                            x, y, z, e, expected, origin, region));
                    }
                }
            }
        }
    }

    Ok(())
}
