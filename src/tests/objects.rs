//! Pipes, shared virtual memory, migration and the vendor buffer kinds.

use std::slice;
use crate::tests::{self, TestEnv};
use crate::{AllocState, BusAddress, ContextProperties, DeviceInfo, MapFlags, MemFlags, MemInfo,
    MemInfoResult, MemMigrationFlags, MemObjectType, PipeInfo, PipeInfoResult, Status};

#[test]
fn pipes() {
    let env = TestEnv::new();
    let pipe = crate::create_pipe(&env.context, MemFlags::new(), 16, 8).unwrap();

    assert_eq!(pipe.mem_type(), MemObjectType::Pipe);
    assert!(pipe.mem_flags().contains(MemFlags::READ_WRITE | MemFlags::HOST_NO_ACCESS));
    match crate::get_pipe_info(&pipe, PipeInfo::PacketSize).unwrap() {
        PipeInfoResult::PacketSize(s) => assert_eq!(s, 16),
        r => panic!("unexpected: {:?}", r),
    }
    match crate::get_pipe_info(&pipe, PipeInfo::MaxPackets).unwrap() {
        PipeInfoResult::MaxPackets(n) => assert_eq!(n, 8),
        r => panic!("unexpected: {:?}", r),
    }
    assert_eq!(pipe.as_pipe().unwrap().capacity(), 16 * 8);

    // Not a buffer as far as transfers go.
    let mut vec = vec![0u8; 16];
    let res = unsafe { crate::enqueue_read_buffer(&env.queue, &pipe, true, 0, &mut vec, None) };
    assert_eq!(tests::status(res), Status::CL_INVALID_MEM_OBJECT);

    for &(packet_size, max_packets) in &[(0, 8), (16, 0), (4096, 1)] {
        let res = crate::create_pipe(&env.context, MemFlags::new(), packet_size, max_packets);
        assert_eq!(tests::status(res), Status::CL_INVALID_PIPE_SIZE);
    }
    for &flags in &[MemFlags::HOST_READ_ONLY, MemFlags::COPY_HOST_PTR,
            MemFlags::READ_WRITE | MemFlags::READ_ONLY] {
        let res = crate::create_pipe(&env.context, flags, 16, 8);
        assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    }

    let buffer = tests::buffer_from(&env.context, &[0u8; 16]);
    let res = crate::get_pipe_info(&buffer, PipeInfo::PacketSize);
    assert_eq!(tests::status(res), Status::CL_INVALID_MEM_OBJECT);
}

#[test]
fn svm_backed_buffers() {
    let env = TestEnv::new();
    let svm = crate::svm_alloc(&env.context, MemFlags::READ_WRITE, 4096, 0).unwrap();
    let words = unsafe { slice::from_raw_parts_mut(svm as *mut u32, 1024) };
    for (i, w) in words.iter_mut().enumerate() {
        *w = i as u32;
    }

    // Elements 64..320 of the allocation.
    let buffer = unsafe {
        crate::create_buffer(&env.context, MemFlags::USE_HOST_PTR, 256, Some(&words[64..320]))
            .unwrap()
    };
    match crate::get_mem_object_info(&buffer, MemInfo::UsesSvmPointer).unwrap() {
        MemInfoResult::UsesSvmPointer(b) => assert!(b),
        r => panic!("unexpected: {}", r),
    }
    match crate::get_mem_object_info(&buffer, MemInfo::HostPtr).unwrap() {
        MemInfoResult::HostPtr(Some((ptr, _))) => assert_eq!(ptr, svm as usize + 256),
        r => panic!("unexpected: {}", r),
    }
    assert_eq!(buffer.alloc_state(env.queue.device().id()), AllocState::Complete);

    let expected: Vec<u32> = (64..320).collect();
    assert_eq!(tests::read_all::<u32>(&env, &buffer, 256), expected);

    // Device writes land in the allocation itself.
    crate::enqueue_fill_buffer(&env.queue, &buffer, 0xffu32, 0, 4, None).unwrap();
    crate::finish(&env.queue).unwrap();
    assert_eq!(&words[64..68], &[0xff; 4]);
    assert_eq!(words[68], 68);

    // A sub-buffer of an SVM buffer is SVM backed too.
    let sub = crate::create_sub_buffer(&buffer, MemFlags::new(),
        &crate::BufferRegion::new(512, 128)).unwrap();
    assert!(sub.uses_svm_pointer());

    // Past the end of the allocation.
    let tail = unsafe { slice::from_raw_parts(svm.add(4000) as *const u8, 200) };
    let res = unsafe { crate::create_buffer(&env.context, MemFlags::USE_HOST_PTR, 200,
        Some(tail)) };
    assert_eq!(tests::status(res), Status::CL_INVALID_BUFFER_SIZE);

    // Freeing leaves existing wrappers usable.
    unsafe { crate::svm_free(&env.context, svm).unwrap(); }
    assert_eq!(tests::read_all::<u32>(&env, &buffer, 4), vec![0xffu32; 4]);
    let res = unsafe { crate::svm_free(&env.context, svm) };
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    for &(size, align) in &[(0, 0), (64, 3), (64, 1 << 20)] {
        let res = crate::svm_alloc(&env.context, MemFlags::READ_WRITE, size, align);
        assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    }
}

#[test]
fn info_queries() {
    let env = TestEnv::new();
    let buffer = unsafe {
        crate::create_buffer::<u64>(&env.context, MemFlags::HOST_WRITE_ONLY, 32, None).unwrap()
    };

    match crate::get_mem_object_info(&buffer, MemInfo::Type).unwrap() {
        MemInfoResult::Type(t) => assert_eq!(t, MemObjectType::Buffer),
        r => panic!("unexpected: {}", r),
    }
    match crate::get_mem_object_info(&buffer, MemInfo::Flags).unwrap() {
        MemInfoResult::Flags(f) => {
            assert_eq!(f, MemFlags::HOST_WRITE_ONLY | MemFlags::READ_WRITE)
        },
        r => panic!("unexpected: {}", r),
    }
    match crate::get_mem_object_info(&buffer, MemInfo::Size).unwrap() {
        MemInfoResult::Size(s) => assert_eq!(s, 256),
        r => panic!("unexpected: {}", r),
    }
    match crate::get_mem_object_info(&buffer, MemInfo::HostPtr).unwrap() {
        MemInfoResult::HostPtr(p) => assert!(p.is_none()),
        r => panic!("unexpected: {}", r),
    }
    match crate::get_mem_object_info(&buffer, MemInfo::Context).unwrap() {
        MemInfoResult::Context(c) => assert!(c == env.context),
        r => panic!("unexpected: {}", r),
    }
    match crate::get_mem_object_info(&buffer, MemInfo::AssociatedMemobject).unwrap() {
        MemInfoResult::AssociatedMemobject(p) => assert!(p.is_none()),
        r => panic!("unexpected: {}", r),
    }

    let res = crate::get_image_info(&buffer, crate::ImageInfo::Width);
    assert_eq!(tests::status(res), Status::CL_INVALID_MEM_OBJECT);
}

#[test]
fn migrate_between_devices() {
    let env = TestEnv::with_devices(vec![DeviceInfo::default(), tests::discrete_device()],
        ContextProperties::new());
    let devices = env.context.devices().to_vec();
    let second = crate::create_command_queue(&env.context, &devices[1]).unwrap();

    let buffer = unsafe {
        crate::create_buffer::<u32>(&env.context, MemFlags::READ_WRITE, 512, None).unwrap()
    };
    assert_eq!(buffer.alloc_state(devices[0].id()), AllocState::Init);
    assert_eq!(buffer.alloc_state(devices[1].id()), AllocState::Init);

    let data: Vec<u32> = (0..512).map(|i| i * 7).collect();
    unsafe { crate::enqueue_write_buffer(&env.queue, &buffer, true, 0, &data, None).unwrap(); }
    assert_eq!(buffer.alloc_state(devices[0].id()), AllocState::Complete);
    assert_eq!(buffer.last_writer(), Some(devices[0].id()));

    let ev = crate::enqueue_migrate_mem_objects(&second, &[buffer.clone()],
        MemMigrationFlags::empty(), None).unwrap();
    crate::wait_for_events(&[ev]).unwrap();
    assert_eq!(buffer.alloc_state(devices[1].id()), AllocState::Complete);

    let mut out = vec![0u32; 512];
    unsafe { crate::enqueue_read_buffer(&second, &buffer, true, 0, &mut out, None).unwrap(); }
    assert_eq!(out, data);

    let res = crate::enqueue_migrate_mem_objects(&second, &[], MemMigrationFlags::empty(), None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
}

#[test]
fn migrate_to_host_reallocates() {
    let env = TestEnv::with_device(tests::discrete_device());
    let device = env.queue.device().id();
    let data: Vec<u16> = (0..300).collect();
    let buffer = tests::buffer_from(&env.context, &data);
    assert_eq!(buffer.alloc_state(device), AllocState::Complete);

    // Skipped while a mapping is outstanding.
    let map = unsafe {
        crate::enqueue_map_buffer::<u16>(&env.queue, &buffer, true, MapFlags::READ, 0, 300, None)
            .unwrap()
    };
    crate::enqueue_migrate_mem_objects(&env.queue, &[buffer.clone()],
        MemMigrationFlags::OBJECT_HOST, None).unwrap();
    crate::finish(&env.queue).unwrap();
    assert_eq!(buffer.alloc_state(device), AllocState::Complete);
    crate::enqueue_unmap_mem_object(&env.queue, &buffer, map, None).unwrap();

    crate::enqueue_migrate_mem_objects(&env.queue, &[buffer.clone()],
        MemMigrationFlags::OBJECT_HOST, None).unwrap();
    crate::finish(&env.queue).unwrap();
    assert_eq!(buffer.alloc_state(device), AllocState::Realloced);
    assert_eq!(tests::read_all::<u16>(&env, &buffer, 300), data);

    let other = env.other_context();
    let foreign = tests::buffer_from(&other, &[0u8; 4]);
    let res = crate::enqueue_migrate_mem_objects(&env.queue, &[buffer.clone(), foreign],
        MemMigrationFlags::empty(), None);
    assert_eq!(tests::status(res), Status::CL_INVALID_CONTEXT);
}

#[test]
fn bus_addresses() {
    let env = TestEnv::new();
    let addr = BusAddress { surface_bus_address: 0x1000_0000, marker_bus_address: 0x1000_4000 };

    let external = crate::create_external_physical_buffer(&env.context, MemFlags::new(), 4096,
        &addr).unwrap();
    assert_eq!(crate::get_buffer_bus_address(&external).unwrap(), addr);
    let res = crate::create_external_physical_buffer(&env.context, MemFlags::READ_ONLY, 4096,
        &addr);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    // External physical memory cannot be requested through the plain entry point.
    let res = unsafe {
        crate::create_buffer::<u8>(&env.context, MemFlags::EXTERNAL_PHYSICAL_AMD, 64, None)
    };
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    let addressable = unsafe {
        crate::create_buffer::<u8>(&env.context, MemFlags::BUS_ADDRESSABLE_AMD, 4096, None)
            .unwrap()
    };
    assert_eq!(addressable.alloc_state(env.queue.device().id()), AllocState::Complete);
    let bus = crate::get_buffer_bus_address(&addressable).unwrap();
    assert_eq!(bus.marker_bus_address - bus.surface_bus_address, 4096);

    let plain = tests::buffer_from(&env.context, &[0u8; 64]);
    let res = crate::get_buffer_bus_address(&plain);
    assert_eq!(tests::status(res), Status::CL_INVALID_MEM_OBJECT);
}
