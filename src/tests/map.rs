use crate::tests::{self, TestEnv};
use crate::{ImageChannelDataType, ImageChannelOrder, ImageDescriptor, ImageFormat, MapFlags,
    Mem, MemFlags, MemInfo, MemInfoResult, MemObjectType, Status};

fn map_count(mem: &Mem) -> u32 {
    match crate::get_mem_object_info(mem, MemInfo::MapCount).unwrap() {
        MemInfoResult::MapCount(c) => c,
        r => panic!("unexpected: {}", r),
    }
}

fn map_write_read(env: &TestEnv) {
    let buffer = tests::buffer_from(&env.context, &[0u32; 1024]);

    let mut map = unsafe {
        crate::enqueue_map_buffer::<u32>(&env.queue, &buffer, true, MapFlags::WRITE, 0, 1024,
            None).unwrap()
    };
    assert_eq!(map.len(), 1024);
    assert_eq!(map_count(&buffer), 1);
    for (i, v) in unsafe { map.as_slice_mut() }.iter_mut().enumerate() {
        *v = i as u32 * 3;
    }
    let unmap = crate::enqueue_unmap_mem_object(&env.queue, &buffer, map, None).unwrap();
    crate::wait_for_events(&[unmap]).unwrap();
    assert_eq!(map_count(&buffer), 0);

    let expected: Vec<u32> = (0..1024).map(|i| i * 3).collect();
    assert_eq!(tests::read_all::<u32>(env, &buffer, 1024), expected);

    // A read mapping sees device writes.
    crate::enqueue_fill_buffer(&env.queue, &buffer, 5u32, 100, 10, None).unwrap();
    let map = unsafe {
        crate::enqueue_map_buffer::<u32>(&env.queue, &buffer, true, MapFlags::READ, 96, 16, None)
            .unwrap()
    };
    let slice = unsafe { map.as_slice() };
    assert_eq!(slice[3], 99 * 3);
    assert_eq!(&slice[4..14], &[5u32; 10][..]);
    assert_eq!(slice[14], 110 * 3);
    crate::enqueue_unmap_mem_object(&env.queue, &buffer, map, None).unwrap();
    crate::finish(&env.queue).unwrap();
}

#[test]
fn map_write_read_unified() {
    map_write_read(&TestEnv::new());
}

#[test]
fn map_write_read_staged() {
    map_write_read(&TestEnv::with_device(tests::discrete_device()));
}

#[test]
fn staged_read_mapping_discards_host_writes() {
    let env = TestEnv::with_device(tests::discrete_device());
    let buffer = tests::buffer_from(&env.context, &[1u8; 64]);

    let mut map = unsafe {
        crate::enqueue_map_buffer::<u8>(&env.queue, &buffer, true, MapFlags::READ, 0, 64, None)
            .unwrap()
    };
    for v in unsafe { map.as_slice_mut() }.iter_mut() {
        *v = 2;
    }
    crate::enqueue_unmap_mem_object(&env.queue, &buffer, map, None).unwrap();
    assert_eq!(tests::read_all::<u8>(&env, &buffer, 64), vec![1u8; 64]);
}

#[test]
fn overlapping_mappings_counted() {
    let env = TestEnv::new();
    let buffer = tests::buffer_from(&env.context, &[0u16; 256]);

    let a = unsafe {
        crate::enqueue_map_buffer::<u16>(&env.queue, &buffer, true, MapFlags::READ, 0, 128, None)
            .unwrap()
    };
    let b = unsafe {
        crate::enqueue_map_buffer::<u16>(&env.queue, &buffer, true, MapFlags::READ, 64, 128, None)
            .unwrap()
    };
    assert_eq!(map_count(&buffer), 2);

    crate::enqueue_unmap_mem_object(&env.queue, &buffer, b, None).unwrap();
    crate::enqueue_unmap_mem_object(&env.queue, &buffer, a, None).unwrap();
    crate::finish(&env.queue).unwrap();
    assert_eq!(map_count(&buffer), 0);
}

#[test]
fn map_access_checks() {
    let env = TestEnv::new();
    let read_only = unsafe {
        crate::create_buffer::<u8>(&env.context, MemFlags::HOST_READ_ONLY, 64, None).unwrap()
    };
    let no_access = unsafe {
        crate::create_buffer::<u8>(&env.context, MemFlags::HOST_NO_ACCESS, 64, None).unwrap()
    };

    unsafe {
        let res = crate::enqueue_map_buffer::<u8>(&env.queue, &read_only, true, MapFlags::WRITE,
            0, 64, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_OPERATION);
        let res = crate::enqueue_map_buffer::<u8>(&env.queue, &read_only, true,
            MapFlags::WRITE_INVALIDATE_REGION, 0, 64, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_OPERATION);
        let res = crate::enqueue_map_buffer::<u8>(&env.queue, &no_access, true, MapFlags::READ,
            0, 64, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_OPERATION);

        let res = crate::enqueue_map_buffer::<u8>(&env.queue, &read_only, true,
            MapFlags::READ | MapFlags::WRITE_INVALIDATE_REGION, 0, 64, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
        let res = crate::enqueue_map_buffer::<u8>(&env.queue, &read_only, true, MapFlags::READ,
            32, 64, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

        let map = crate::enqueue_map_buffer::<u8>(&env.queue, &read_only, true, MapFlags::READ,
            0, 64, None).unwrap();
        crate::enqueue_unmap_mem_object(&env.queue, &read_only, map, None).unwrap();
    }
    assert_eq!(map_count(&no_access), 0);
    crate::finish(&env.queue).unwrap();
}

#[test]
fn unmap_unknown_pointer() {
    let env = TestEnv::new();
    let a = tests::buffer_from(&env.context, &[0u32; 16]);
    let b = tests::buffer_from(&env.context, &[0u32; 16]);

    let map = unsafe {
        crate::enqueue_map_buffer::<u32>(&env.queue, &a, true, MapFlags::READ, 0, 16, None)
            .unwrap()
    };
    let res = crate::enqueue_unmap_mem_object(&env.queue, &b, map, None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    assert_eq!(map_count(&a), 1);
}

#[test]
fn map_waits_for_gate() {
    let env = TestEnv::new();
    let buffer = tests::buffer_from(&env.context, &[4i64; 32]);
    let gate = crate::create_user_event(&env.context).unwrap();
    let wait_list = [gate.clone()];

    let map = unsafe {
        crate::enqueue_map_buffer::<i64>(&env.queue, &buffer, false, MapFlags::READ, 0, 32,
            Some(&wait_list[..])).unwrap()
    };
    assert!(!map.event().is_complete());
    crate::set_user_event_status(&gate, crate::Status::CL_SUCCESS).unwrap();
    crate::wait_for_events(&[map.event().clone()]).unwrap();
    assert_eq!(unsafe { map.as_slice() }, &[4i64; 32][..]);
    crate::enqueue_unmap_mem_object(&env.queue, &buffer, map, None).unwrap();
    crate::finish(&env.queue).unwrap();
}

#[test]
fn use_host_ptr_maps_user_memory() {
    let env = TestEnv::new();
    let data: Vec<f32> = (0..64).map(|i| i as f32).collect();
    let buffer = unsafe {
        crate::create_buffer(&env.context, MemFlags::USE_HOST_PTR | MemFlags::READ_ONLY, 64,
            Some(&data)).unwrap()
    };

    let map = unsafe {
        crate::enqueue_map_buffer::<f32>(&env.queue, &buffer, true, MapFlags::READ, 8, 16, None)
            .unwrap()
    };
    assert_eq!(map.as_ptr() as *const f32, unsafe { data.as_ptr().add(8) });
    assert_eq!(unsafe { map.as_slice() }, &data[8..24]);
    crate::enqueue_unmap_mem_object(&env.queue, &buffer, map, None).unwrap();
    crate::finish(&env.queue).unwrap();

    match crate::get_mem_object_info(&buffer, MemInfo::HostPtr).unwrap() {
        MemInfoResult::HostPtr(Some((ptr, size))) => {
            assert_eq!(ptr, data.as_ptr() as usize);
            assert_eq!(size, 64 * 4);
        },
        r => panic!("unexpected: {}", r),
    }
}

#[test]
fn image_mapping_keeps_pitches() {
    let env = TestEnv::with_device(tests::discrete_device());
    let format = ImageFormat::new(ImageChannelOrder::R, ImageChannelDataType::UnsignedInt32);
    let desc = ImageDescriptor::new(MemObjectType::Image2d, 16, 8, 1, 1, 0, 0, None);
    let img = unsafe {
        crate::create_image::<u32>(&env.context, MemFlags::new(), &format, &desc, None).unwrap()
    };
    crate::enqueue_fill_image(&env.queue, &img, &crate::ImageFillColor::Uint([0; 4]),
        [0, 0, 0], [16, 8, 1], None).unwrap();

    let mut map = unsafe {
        crate::enqueue_map_image::<u32>(&env.queue, &img, true, MapFlags::WRITE, [2, 1, 0],
            [4, 3, 1], None).unwrap()
    };
    assert_eq!(map.row_pitch(), 64);
    // Two full rows and the last partial one.
    assert_eq!(map.len(), 16 * 2 + 4);

    let row = map.row_pitch() / 4;
    {
        let slice = unsafe { map.as_slice_mut() };
        for y in 0..3 {
            for x in 0..4 {
                slice[y * row + x] = (10 * y + x + 1) as u32;
            }
        }
    }
    crate::enqueue_unmap_mem_object(&env.queue, &img, map, None).unwrap();

    let mut out = vec![0u32; 128];
    unsafe {
        crate::enqueue_read_image(&env.queue, &img, true, [0, 0, 0], [16, 8, 1], 0, 0, &mut out,
            None).unwrap();
    }
    for y in 0..8 {
        for x in 0..16 {
            let expected = if y >= 1 && y < 4 && x >= 2 && x < 6 {
                (10 * (y - 1) + (x - 2) + 1) as u32
            } else {
                0
            };
            assert_eq!(out[y * 16 + x], expected, "[{}, {}]", x, y);
        }
    }
}

#[test]
fn persistent_mapping_binds_virtual_device() {
    let env = TestEnv::new();
    let buffer = unsafe {
        crate::create_buffer::<u32>(&env.context,
            MemFlags::USE_PERSISTENT_MEM_AMD | MemFlags::READ_WRITE, 64, None).unwrap()
    };
    assert!(buffer.virtual_device().is_none());

    let map = unsafe {
        crate::enqueue_map_buffer::<u32>(&env.queue, &buffer, true, MapFlags::WRITE, 0, 64, None)
            .unwrap()
    };
    assert!(buffer.virtual_device().is_some());
    crate::enqueue_unmap_mem_object(&env.queue, &buffer, map, None).unwrap();
    crate::finish(&env.queue).unwrap();
}
