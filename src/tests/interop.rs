//! Native resource bridges, driven through a mock graphics API.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use crate::ffi;
use crate::interop::{D3D10ResourceDesc, D3D11ResourceDesc, D3D9SurfaceDesc, GlObjectDesc,
    NativeFence, NativeHandle, NativeRef, NativeResource};
use crate::tests::{self, TestEnv};
use crate::{ContextProperties, ImageChannelDataType, ImageChannelOrder, ImageFormat, ImageInfo,
    ImageInfoResult, Mem, MemFlags, MemInfo, MemInfoResult, MemObjectType, Status};

const DEVICE: NativeHandle = NativeHandle(0xd3d0);
const OTHER_DEVICE: NativeHandle = NativeHandle(0xd3d1);


struct Signaled;

impl NativeFence for Signaled {
    fn is_signaled(&self) -> bool {
        true
    }
}


/// A native resource which records what the bridge does to it.
#[derive(Debug)]
struct MockResource<D> {
    handle: NativeHandle,
    device: Option<NativeHandle>,
    desc: Option<D>,
    refs: AtomicIsize,
    copies: Arc<AtomicUsize>,
}

impl<D> MockResource<D> {
    fn new(handle: usize, device: Option<NativeHandle>, desc: Option<D>) -> Arc<MockResource<D>> {
        Arc::new(MockResource {
            handle: NativeHandle(handle),
            device,
            desc,
            refs: AtomicIsize::new(0),
            copies: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn refs(&self) -> isize {
        self.refs.load(Ordering::SeqCst)
    }

    fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }
}

impl<D: Clone + fmt::Debug + Send + Sync + 'static> NativeResource for MockResource<D> {
    type Desc = D;

    fn handle(&self) -> NativeHandle {
        self.handle
    }

    fn native_device(&self) -> Option<NativeHandle> {
        self.device
    }

    fn describe(&self) -> Option<D> {
        self.desc.clone()
    }

    fn add_ref(&self) {
        self.refs.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.refs.fetch_sub(1, Ordering::SeqCst);
    }

    fn create_shared(&self, desc: &D) -> Option<NativeRef<D>> {
        let shared = MockResource {
            handle: NativeHandle(self.handle.0 | 0x8000_0000),
            device: self.device,
            desc: Some(desc.clone()),
            refs: AtomicIsize::new(0),
            copies: self.copies.clone(),
        };
        Some(Arc::new(shared))
    }

    fn copy_to(&self, _dst: &dyn NativeResource<Desc = D>) {
        self.copies.fetch_add(1, Ordering::SeqCst);
    }

    fn issue_fence(&self) -> Box<dyn NativeFence> {
        Box::new(Signaled)
    }
}

fn as_ref<D: Clone + fmt::Debug + Send + Sync + 'static>(res: &Arc<MockResource<D>>)
        -> NativeRef<D> {
    res.clone()
}

fn dims(img: &Mem) -> (usize, usize) {
    let width = match crate::get_image_info(img, ImageInfo::Width).unwrap() {
        ImageInfoResult::Width(w) => w,
        r => panic!("unexpected: {}", r),
    };
    let height = match crate::get_image_info(img, ImageInfo::Height).unwrap() {
        ImageInfoResult::Height(h) => h,
        r => panic!("unexpected: {}", r),
    };
    (width, height)
}

fn format(img: &Mem) -> ImageFormat {
    match crate::get_image_info(img, ImageInfo::Format).unwrap() {
        ImageInfoResult::Format(f) => f,
        r => panic!("unexpected: {}", r),
    }
}

fn size(mem: &Mem) -> usize {
    match crate::get_mem_object_info(mem, MemInfo::Size).unwrap() {
        MemInfoResult::Size(s) => s,
        r => panic!("unexpected: {}", r),
    }
}

fn is_acquired(mem: &Mem) -> bool {
    mem.interop().unwrap().as_sync().is_acquired()
}


#[test]
fn d3d10_resources_wrapped_once() {
    let env = TestEnv::with_properties(ContextProperties::new().d3d10_device(DEVICE));
    let res = MockResource::new(0x100, Some(DEVICE), Some(D3D10ResourceDesc::buffer(256, 0)));

    let buffer = crate::create_from_d3d10_buffer(&env.context, MemFlags::new(), as_ref(&res))
        .unwrap();
    assert_eq!(buffer.mem_type(), MemObjectType::Buffer);
    assert_eq!(size(&buffer), 256);
    assert!(buffer.mem_flags().contains(MemFlags::READ_WRITE));
    assert_eq!(res.refs(), 1);
    // Not created shared, so the device works on a copy.
    assert!(buffer.interop().unwrap().as_d3d10().unwrap().shared_resource().is_some());
    assert_eq!(env.platform.interop_registry().len(), 1);

    let dup = crate::create_from_d3d10_buffer(&env.context, MemFlags::new(), as_ref(&res));
    assert_eq!(tests::status(dup), Status::CL_INVALID_D3D10_RESOURCE_KHR);
    assert_eq!(res.refs(), 1);

    drop(buffer);
    assert_eq!(res.refs(), 0);
    assert!(env.platform.interop_registry().is_empty());
    let again = crate::create_from_d3d10_buffer(&env.context, MemFlags::READ_ONLY, as_ref(&res))
        .unwrap();
    assert_eq!(res.refs(), 1);
    drop(again);

    // Buffers are not textures, and host pointer flags do not apply.
    let res = crate::create_from_d3d10_texture_2d(&env.context, MemFlags::new(), as_ref(&res), 0);
    assert_eq!(tests::status(res), Status::CL_INVALID_D3D10_RESOURCE_KHR);
    let other = MockResource::new(0x101, Some(DEVICE), Some(D3D10ResourceDesc::buffer(64, 0)));
    let res = crate::create_from_d3d10_buffer(&env.context, MemFlags::USE_HOST_PTR,
        as_ref(&other));
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    assert_eq!(other.refs(), 0);
}

#[test]
fn d3d10_texture_subresources() {
    let env = TestEnv::with_properties(ContextProperties::new().d3d10_device(DEVICE));
    let desc = D3D10ResourceDesc::texture_2d(ffi::DXGI_FORMAT_R8G8B8A8_UNORM, 64, 32, 2, 1,
        crate::interop::d3d10::D3D10_RESOURCE_MISC_SHARED);
    let res = MockResource::new(0x200, Some(DEVICE), Some(desc));

    let level_0 = crate::create_from_d3d10_texture_2d(&env.context, MemFlags::new(),
        as_ref(&res), 0).unwrap();
    let level_1 = crate::create_from_d3d10_texture_2d(&env.context, MemFlags::new(),
        as_ref(&res), 1).unwrap();
    assert_eq!(dims(&level_0), (64, 32));
    assert_eq!(dims(&level_1), (32, 16));
    assert!(format(&level_1) == ImageFormat::new(ImageChannelOrder::Rgba,
        ImageChannelDataType::UnormInt8));
    // Created shared: no copy needed.
    assert!(level_0.interop().unwrap().as_d3d10().unwrap().shared_resource().is_none());
    assert_eq!(res.refs(), 2);

    let dup = crate::create_from_d3d10_texture_2d(&env.context, MemFlags::new(), as_ref(&res), 1);
    assert_eq!(tests::status(dup), Status::CL_INVALID_D3D10_RESOURCE_KHR);
    let past = crate::create_from_d3d10_texture_2d(&env.context, MemFlags::new(), as_ref(&res), 2);
    assert_eq!(tests::status(past), Status::CL_INVALID_VALUE);
    assert_eq!(res.refs(), 2);
}

#[test]
fn native_device_must_match_context() {
    let desc = D3D10ResourceDesc::buffer(64, 0);

    let env = TestEnv::with_properties(ContextProperties::new().d3d10_device(DEVICE));
    let foreign = MockResource::new(0x300, Some(OTHER_DEVICE), Some(desc.clone()));
    let res = crate::create_from_d3d10_buffer(&env.context, MemFlags::new(), as_ref(&foreign));
    assert_eq!(tests::status(res), Status::CL_INVALID_CONTEXT);

    let orphan = MockResource::new(0x301, None, Some(desc.clone()));
    let res = crate::create_from_d3d10_buffer(&env.context, MemFlags::new(), as_ref(&orphan));
    assert_eq!(tests::status(res), Status::CL_INVALID_D3D10_DEVICE_KHR);

    let opaque = MockResource::<D3D10ResourceDesc>::new(0x302, Some(DEVICE), None);
    let res = crate::create_from_d3d10_buffer(&env.context, MemFlags::new(), as_ref(&opaque));
    assert_eq!(tests::status(res), Status::CL_INVALID_D3D10_RESOURCE_KHR);

    // A context without a D3D10 device accepts no D3D10 resources.
    let plain = TestEnv::new();
    let ok = MockResource::new(0x303, Some(DEVICE), Some(desc));
    let res = crate::create_from_d3d10_buffer(&plain.context, MemFlags::new(), as_ref(&ok));
    assert_eq!(tests::status(res), Status::CL_INVALID_CONTEXT);

    for r in &[&foreign, &orphan, &ok] {
        assert_eq!(r.refs(), 0);
    }
    assert!(env.platform.interop_registry().is_empty());
}

#[test]
fn d3d9_surface_planes() {
    let env = TestEnv::with_properties(ContextProperties::new().d3d9_device(DEVICE));
    let surface = MockResource::new(0x400, Some(DEVICE),
        Some(D3D9SurfaceDesc::new(ffi::D3DFMT_NV12, 64, 48, true)));

    let luma = crate::create_from_dx9_media_surface(&env.context, MemFlags::new(),
        as_ref(&surface), 0).unwrap();
    let chroma = crate::create_from_dx9_media_surface(&env.context, MemFlags::new(),
        as_ref(&surface), 1).unwrap();
    assert_eq!(dims(&luma), (64, 48));
    assert_eq!(dims(&chroma), (32, 24));
    assert!(format(&chroma) == ImageFormat::new(ImageChannelOrder::Rg,
        ImageChannelDataType::UnormInt8));
    assert_eq!(env.platform.interop_registry().len(), 2);

    // Each plane is its own registry entry.
    let dup = crate::create_from_dx9_media_surface(&env.context, MemFlags::new(),
        as_ref(&surface), 1);
    assert_eq!(tests::status(dup), Status::CL_INVALID_DX9_MEDIA_SURFACE_KHR);
    let res = crate::create_from_dx9_media_surface(&env.context, MemFlags::new(),
        as_ref(&surface), 2);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    let ev = crate::enqueue_acquire_dx9_media_surfaces(&env.queue, &[luma.clone()], None)
        .unwrap();
    crate::wait_for_events(&[ev]).unwrap();
    assert!(is_acquired(&luma));
    assert!(!is_acquired(&chroma));
    let res = crate::enqueue_acquire_dx9_media_surfaces(&env.queue, &[chroma.clone(),
        luma.clone()], None);
    assert_eq!(tests::status(res), Status::CL_DX9_MEDIA_SURFACE_ALREADY_ACQUIRED_KHR);
    assert!(!is_acquired(&chroma));

    crate::enqueue_release_dx9_media_surfaces(&env.queue, &[luma.clone()], None).unwrap();
    crate::finish(&env.queue).unwrap();
    // A shared handle means no copies either way.
    assert_eq!(surface.copies(), 0);
}

#[test]
fn d3d11_planar_textures() {
    let env = TestEnv::with_properties(ContextProperties::new().d3d11_device(DEVICE));
    let desc = D3D11ResourceDesc::texture_2d(ffi::DXGI_FORMAT_NV12, 64, 48, 1, 1,
        crate::interop::d3d11::D3D11_RESOURCE_MISC_SHARED);
    let res = MockResource::new(0x500, Some(DEVICE), Some(desc));

    let tex = crate::create_from_d3d11_texture_2d(&env.context, MemFlags::new(), as_ref(&res), 0)
        .unwrap();
    assert_eq!(dims(&tex), (64, 48));
    assert!(format(&tex) == ImageFormat::new(ImageChannelOrder::R,
        ImageChannelDataType::UnormInt8));
    // Luma plus both chroma channels at half resolution.
    assert_eq!(size(&tex), 64 * 48 + 32 * 24 * 2);

    let chroma = crate::get_plane_from_image_amd(&env.context, &tex, 1).unwrap();
    assert_eq!(dims(&chroma), (32, 24));
    assert!(format(&chroma) == ImageFormat::new(ImageChannelOrder::Rg,
        ImageChannelDataType::UnormInt8));
    assert_eq!(size(&chroma), 32 * 24 * 2);
    assert_eq!(env.platform.interop_registry().len(), 1);

    let res_2 = crate::get_plane_from_image_amd(&env.context, &tex, 2);
    assert_eq!(tests::status(res_2), Status::CL_INVALID_VALUE);
    let plain = tests::buffer_from(&env.context, &[0u8; 16]);
    let res_2 = crate::get_plane_from_image_amd(&env.context, &plain, 0);
    assert_eq!(tests::status(res_2), Status::CL_INVALID_MEM_OBJECT);
    let other = env.other_context();
    let res_2 = crate::get_plane_from_image_amd(&other, &tex, 1);
    assert_eq!(tests::status(res_2), Status::CL_INVALID_CONTEXT);

    // The plane shares its parent's binding: one acquire covers both.
    crate::enqueue_acquire_d3d11_objects(&env.queue, &[tex.clone(), chroma.clone()], None)
        .unwrap();
    assert!(is_acquired(&tex) && is_acquired(&chroma));
    crate::enqueue_release_d3d11_objects(&env.queue, &[chroma.clone()], None).unwrap();
    assert!(!is_acquired(&tex));
    crate::finish(&env.queue).unwrap();
}

#[test]
fn acquire_release_state() {
    let env = TestEnv::with_properties(ContextProperties::new().d3d10_device(DEVICE));
    let res_a = MockResource::new(0x600, Some(DEVICE), Some(D3D10ResourceDesc::buffer(128, 0)));
    let res_b = MockResource::new(0x601, Some(DEVICE), Some(D3D10ResourceDesc::buffer(128, 0)));
    let a = crate::create_from_d3d10_buffer(&env.context, MemFlags::new(), as_ref(&res_a))
        .unwrap();
    let b = crate::create_from_d3d10_buffer(&env.context, MemFlags::new(), as_ref(&res_b))
        .unwrap();

    let ev = crate::enqueue_acquire_d3d10_objects(&env.queue, &[a.clone()], None).unwrap();
    crate::wait_for_events(&[ev]).unwrap();
    assert_eq!(res_a.copies(), 1);

    let res = crate::enqueue_acquire_d3d10_objects(&env.queue, &[a.clone()], None);
    assert_eq!(tests::status(res), Status::CL_D3D10_RESOURCE_ALREADY_ACQUIRED_KHR);
    // A failing batch leaves nothing acquired.
    let res = crate::enqueue_acquire_d3d10_objects(&env.queue, &[b.clone(), a.clone()], None);
    assert_eq!(tests::status(res), Status::CL_D3D10_RESOURCE_ALREADY_ACQUIRED_KHR);
    assert!(!is_acquired(&b));

    let ev = crate::enqueue_release_d3d10_objects(&env.queue, &[a.clone()], None).unwrap();
    crate::wait_for_events(&[ev]).unwrap();
    assert_eq!(res_a.copies(), 2);
    let res = crate::enqueue_release_d3d10_objects(&env.queue, &[a.clone()], None);
    assert_eq!(tests::status(res), Status::CL_D3D10_RESOURCE_NOT_ACQUIRED_KHR);
    assert_eq!(res_b.copies(), 0);

    let res = crate::enqueue_acquire_d3d10_objects(&env.queue, &[], None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    let res = crate::enqueue_acquire_d3d11_objects(&env.queue, &[a.clone()], None);
    assert_eq!(tests::status(res), Status::CL_INVALID_D3D11_RESOURCE_KHR);
    let plain = tests::buffer_from(&env.context, &[0u8; 16]);
    let res = crate::enqueue_acquire_d3d10_objects(&env.queue, &[plain], None);
    assert_eq!(tests::status(res), Status::CL_INVALID_D3D10_RESOURCE_KHR);
    crate::finish(&env.queue).unwrap();
}

#[test]
fn gl_objects_not_deduplicated() {
    let env = TestEnv::with_properties(ContextProperties::new().gl_context(DEVICE));
    let res = MockResource::new(0x700, Some(DEVICE), Some(GlObjectDesc::buffer(128)));

    let a = crate::create_from_gl_buffer(&env.context, MemFlags::new(), as_ref(&res)).unwrap();
    let b = crate::create_from_gl_buffer(&env.context, MemFlags::WRITE_ONLY, as_ref(&res))
        .unwrap();
    assert_eq!(res.refs(), 2);
    assert!(env.platform.interop_registry().is_empty());
    assert!(!a.interop().unwrap().as_gl().unwrap().is_registered());

    crate::enqueue_acquire_gl_objects(&env.queue, &[a.clone()], None).unwrap();
    let res_2 = crate::enqueue_acquire_gl_objects(&env.queue, &[a.clone()], None);
    assert_eq!(tests::status(res_2), Status::CL_INVALID_OPERATION);
    let res_2 = crate::enqueue_release_gl_objects(&env.queue, &[b.clone()], None);
    assert_eq!(tests::status(res_2), Status::CL_INVALID_OPERATION);
    crate::enqueue_release_gl_objects(&env.queue, &[a.clone()], None).unwrap();
    crate::finish(&env.queue).unwrap();
    assert_eq!(res.copies(), 0);

    let tex = MockResource::new(0x701, Some(DEVICE),
        Some(GlObjectDesc::texture_2d(ffi::GL_TEXTURE_2D, ffi::GL_RGBA8, 64, 64, 3)));
    let level_1 = crate::create_from_gl_texture(&env.context, MemFlags::new(), ffi::GL_TEXTURE_2D,
        1, as_ref(&tex)).unwrap();
    assert_eq!(dims(&level_1), (32, 32));

    let res_2 = crate::create_from_gl_texture(&env.context, MemFlags::new(), ffi::GL_TEXTURE_2D,
        3, as_ref(&tex));
    assert_eq!(tests::status(res_2), Status::CL_INVALID_MIP_LEVEL);
    let res_2 = crate::create_from_gl_texture(&env.context, MemFlags::new(),
        ffi::GL_TEXTURE_RECTANGLE, 0, as_ref(&tex));
    assert_eq!(tests::status(res_2), Status::CL_INVALID_GL_OBJECT);
    let res_2 = crate::create_from_gl_texture(&env.context, MemFlags::new(), 0, 0, as_ref(&tex));
    assert_eq!(tests::status(res_2), Status::CL_INVALID_VALUE);
    let res_2 = crate::create_from_gl_texture(&env.context, MemFlags::new(), ffi::GL_TEXTURE_2D,
        0, as_ref(&res));
    assert_eq!(tests::status(res_2), Status::CL_INVALID_GL_OBJECT);
    assert_eq!(tex.refs(), 1);
}
