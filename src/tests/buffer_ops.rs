use crate::tests::{self, TestEnv};
use crate::{ErrorKind, MapFlags, MemFlags, Status};

const DATASET_SIZE: usize = 1 << 14;

#[test]
fn write_read_round_trip() {
    let env = TestEnv::new();
    let buffer = unsafe {
        crate::create_buffer::<f32>(&env.context, MemFlags::READ_WRITE, DATASET_SIZE, None)
            .unwrap()
    };

    let src: Vec<f32> = (0..DATASET_SIZE).map(|i| i as f32 * 0.5).collect();
    unsafe { crate::enqueue_write_buffer(&env.queue, &buffer, true, 0, &src, None).unwrap(); }

    let mut partial = vec![0.0f32; 100];
    unsafe {
        crate::enqueue_read_buffer(&env.queue, &buffer, false, 300, &mut partial, None).unwrap();
    }
    crate::finish(&env.queue).unwrap();
    for (i, &v) in partial.iter().enumerate() {
        assert_eq!(v, (300 + i) as f32 * 0.5);
    }

    assert_eq!(tests::read_all::<f32>(&env, &buffer, DATASET_SIZE), src);
}

#[test]
fn copy_host_ptr_initialises() {
    let env = TestEnv::new();
    let data: Vec<u32> = (0..1000).collect();
    let buffer = tests::buffer_from(&env.context, &data);
    assert_eq!(tests::read_all::<u32>(&env, &buffer, 1000), data);
}

#[test]
fn out_of_bounds_access_fails() {
    let env = TestEnv::new();
    let buffer = tests::buffer_from(&env.context, &[0u8; 256]);

    let mut vec = vec![0u8; 100];
    let res = unsafe { crate::enqueue_read_buffer(&env.queue, &buffer, true, 200, &mut vec, None) };
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    let res = unsafe {
        crate::enqueue_write_buffer::<u8>(&env.queue, &buffer, true, 0, &[], None)
    };
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
}

#[test]
fn element_offsets_past_address_space_fail() {
    let env = TestEnv::new();
    let data = [7u32; 16];
    let buffer = tests::buffer_from(&env.context, &data);
    // Wraps to 4 bytes if scaled without overflow checks.
    let huge = usize::max_value() / 4 + 1;
    let mut vec = vec![0u32; 4];

    unsafe {
        let res = crate::enqueue_read_buffer(&env.queue, &buffer, true, huge, &mut vec, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
        assert_eq!(vec, [0u32; 4]);

        let res = crate::enqueue_write_buffer(&env.queue, &buffer, true, huge, &[1u32; 4], None);
        assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

        let res = crate::enqueue_map_buffer::<u32>(&env.queue, &buffer, true, MapFlags::READ,
            huge, 4, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
        let res = crate::enqueue_map_buffer::<u32>(&env.queue, &buffer, true, MapFlags::READ,
            0, huge, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    }

    let dst = tests::buffer_from(&env.context, &[0u32; 16]);
    let res = crate::enqueue_copy_buffer::<u32>(&env.queue, &buffer, &dst, huge, 0, 4, None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    let res = crate::enqueue_copy_buffer::<u32>(&env.queue, &buffer, &dst, 0, 0, huge, None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    let res = crate::enqueue_fill_buffer(&env.queue, &buffer, 1u32, huge, 4, None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    assert_eq!(tests::read_all::<u32>(&env, &buffer, 16), data);
}

#[test]
fn host_access_flags_enforced() {
    let env = TestEnv::new();
    let write_only = unsafe {
        crate::create_buffer::<u8>(&env.context, MemFlags::HOST_WRITE_ONLY, 64, None).unwrap()
    };
    let read_only = unsafe {
        crate::create_buffer::<u8>(&env.context, MemFlags::HOST_READ_ONLY, 64, None).unwrap()
    };
    let mut vec = vec![0u8; 64];

    unsafe {
        crate::enqueue_write_buffer(&env.queue, &write_only, true, 0, &vec, None).unwrap();
        let res = crate::enqueue_read_buffer(&env.queue, &write_only, true, 0, &mut vec, None);
        assert_eq!(res.unwrap_err().kind(), Some(ErrorKind::OperationNotPermitted));

        crate::enqueue_read_buffer(&env.queue, &read_only, true, 0, &mut vec, None).unwrap();
        let res = crate::enqueue_write_buffer(&env.queue, &read_only, true, 0, &vec, None);
        assert_eq!(tests::status(res), Status::CL_INVALID_OPERATION);
    }
}

#[test]
fn copy_between_buffers() {
    let env = TestEnv::new();
    let src_data: Vec<i32> = (0..4096).collect();
    let src = tests::buffer_from(&env.context, &src_data);
    let dst = tests::buffer_from(&env.context, &vec![-1i32; 4096]);

    let copy_range = (153, 3000);
    crate::enqueue_copy_buffer::<i32>(&env.queue, &src, &dst, copy_range.0, copy_range.0,
        copy_range.1 - copy_range.0, None).unwrap();

    let dst_vec = tests::read_all::<i32>(&env, &dst, 4096);
    for i in 0..4096 {
        if i >= copy_range.0 && i < copy_range.1 {
            assert_eq!(dst_vec[i], i as i32);
        } else {
            assert!(dst_vec[i] == -1, "dst_vec: {}, idx: {}", dst_vec[i], i);
        }
    }
}

#[test]
fn same_buffer_copy_overlap() {
    let env = TestEnv::new();
    let data: Vec<u8> = (0..=255).collect();
    let a = tests::buffer_from(&env.context, &data);

    let res = crate::enqueue_copy_buffer::<u8>(&env.queue, &a, &a, 0, 50, 100, None);
    let err = res.unwrap_err();
    assert_eq!(err.api_status(), Some(Status::CL_MEM_COPY_OVERLAP));
    assert_eq!(err.kind(), Some(ErrorKind::ResourceConflict));

    // Adjacent ranges do not overlap.
    crate::enqueue_copy_buffer::<u8>(&env.queue, &a, &a, 0, 100, 100, None).unwrap();
    let result = tests::read_all::<u8>(&env, &a, 256);
    assert_eq!(&result[100..200], &data[0..100]);
    assert_eq!(&result[..100], &data[..100]);
    assert_eq!(&result[200..], &data[200..]);
}

#[test]
fn copy_overlap_randomised() {
    use rand::Rng;
    let env = TestEnv::new();
    let a = tests::buffer_from(&env.context, &[0u8; 512]);
    let mut rng = rand::thread_rng();

    for _ in 0..200 {
        let size = rng.gen_range(1..=128);
        let src = rng.gen_range(0..=(512 - size));
        let dst = rng.gen_range(0..=(512 - size));
        let overlaps = src < dst + size && dst < src + size;

        let res = crate::enqueue_copy_buffer::<u8>(&env.queue, &a, &a, src, dst, size, None);
        if overlaps {
            assert_eq!(tests::status(res), Status::CL_MEM_COPY_OVERLAP);
        } else {
            res.unwrap();
        }
    }
    crate::finish(&env.queue).unwrap();
}

#[test]
fn fill_buffer_pattern() {
    let env = TestEnv::new();
    let buffer = tests::buffer_from(&env.context, &[0u32; 1024]);

    crate::enqueue_fill_buffer(&env.queue, &buffer, 0xdead_beefu32, 100, 500, None).unwrap();
    let vec = tests::read_all::<u32>(&env, &buffer, 1024);
    for (i, &v) in vec.iter().enumerate() {
        let expected = if i >= 100 && i < 600 { 0xdead_beef } else { 0 };
        assert_eq!(v, expected, "idx: {}", i);
    }

    let res = crate::enqueue_fill_buffer(&env.queue, &buffer, 7u32, 1000, 100, None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
}

#[test]
fn wait_list_orders_commands() {
    let env = TestEnv::new();
    let buffer = tests::buffer_from(&env.context, &[0u16; 64]);
    let gate = crate::create_user_event(&env.context).unwrap();
    let wait_list = [gate.clone()];

    let fill = crate::enqueue_fill_buffer(&env.queue, &buffer, 9u16, 0, 64, Some(&wait_list[..]))
        .unwrap();
    assert!(!fill.is_complete());

    crate::set_user_event_status(&gate, Status::CL_SUCCESS).unwrap();
    crate::wait_for_events(&[fill]).unwrap();
    assert_eq!(tests::read_all::<u16>(&env, &buffer, 64), vec![9u16; 64]);

    let res = crate::enqueue_fill_buffer(&env.queue, &buffer, 1u16, 0, 64, Some(&[][..]));
    assert_eq!(tests::status(res), Status::CL_INVALID_EVENT_WAIT_LIST);
}

#[test]
fn failed_user_event_fails_dependents() {
    let env = TestEnv::new();
    let buffer = tests::buffer_from(&env.context, &[0u8; 16]);
    let gate = crate::create_user_event(&env.context).unwrap();
    let wait_list = [gate.clone()];

    let fill = crate::enqueue_fill_buffer(&env.queue, &buffer, 1u8, 0, 16, Some(&wait_list[..]))
        .unwrap();
    crate::set_user_event_status(&gate, Status::CL_INVALID_OPERATION).unwrap();

    let res = crate::wait_for_events(&[fill]);
    assert_eq!(tests::status(res), Status::CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST);
    assert_eq!(tests::read_all::<u8>(&env, &buffer, 16), vec![0u8; 16]);
}

#[test]
fn context_mismatch_rejected() {
    let env = TestEnv::new();
    let other = env.other_context();
    let foreign = tests::buffer_from(&other, &[1u8; 8]);
    let mut vec = vec![0u8; 8];

    let res = unsafe { crate::enqueue_read_buffer(&env.queue, &foreign, true, 0, &mut vec, None) };
    assert_eq!(tests::status(res), Status::CL_INVALID_CONTEXT);
}
