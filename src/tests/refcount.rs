use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use parking_lot::Mutex;
use crate::tests::{self, TestEnv};
use crate::{BufferRegion, Mem, MemFlags, MemInfo, MemInfoResult, Status};

fn ref_count(mem: &Mem) -> u32 {
    match crate::get_mem_object_info(mem, MemInfo::ReferenceCount).unwrap() {
        MemInfoResult::ReferenceCount(c) => c,
        r => panic!("unexpected: {}", r),
    }
}

#[test]
fn retain_release() {
    let env = TestEnv::new();
    let buffer = tests::buffer_from(&env.context, &[0u8; 16]);
    assert_eq!(ref_count(&buffer), 1);

    unsafe { crate::retain_mem_object(&buffer).unwrap(); }
    assert_eq!(ref_count(&buffer), 2);
    unsafe { crate::release_mem_object(&buffer).unwrap(); }
    assert_eq!(ref_count(&buffer), 1);

    let copy = buffer.clone();
    assert_eq!(ref_count(&buffer), 2);
    assert!(copy == buffer);
    drop(copy);
    assert_eq!(ref_count(&buffer), 1);

    // Info results holding a handle count as a reference.
    let sub = crate::create_sub_buffer(&buffer, MemFlags::new(), &BufferRegion::new(0, 8))
        .unwrap();
    assert_eq!(ref_count(&buffer), 1);
    let parent = match crate::get_mem_object_info(&sub, MemInfo::AssociatedMemobject).unwrap() {
        MemInfoResult::AssociatedMemobject(Some(p)) => p,
        r => panic!("unexpected: {}", r),
    };
    assert_eq!(ref_count(&buffer), 2);
    drop(parent);
    assert_eq!(ref_count(&buffer), 1);
}

#[test]
fn destructor_callbacks_run_newest_first() {
    let env = TestEnv::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    let buffer = tests::buffer_from(&env.context, &[0u32; 8]);

    for i in 0..3 {
        let order = order.clone();
        crate::set_mem_object_destructor_callback(&buffer, move |mem| {
            assert_eq!(mem.size(), 32);
            order.lock().push(i);
        }).unwrap();
    }
    assert!(order.lock().is_empty());

    drop(buffer);
    assert_eq!(*order.lock(), vec![2, 1, 0]);
}

#[test]
fn sub_buffer_keeps_parent_alive() {
    let env = TestEnv::new();
    let destroyed = Arc::new(AtomicBool::new(false));
    let data: Vec<u32> = (0..256).collect();
    let parent = tests::buffer_from(&env.context, &data);
    {
        let destroyed = destroyed.clone();
        crate::set_mem_object_destructor_callback(&parent, move |_| {
            destroyed.store(true, Ordering::SeqCst);
        }).unwrap();
    }

    let sub = crate::create_sub_buffer(&parent, MemFlags::new(), &BufferRegion::new(128, 128))
        .unwrap();
    drop(parent);
    assert!(!destroyed.load(Ordering::SeqCst));

    // Still readable through the sub-buffer.
    assert_eq!(tests::read_all::<u32>(&env, &sub, 32), &data[32..64]);

    drop(sub);
    assert!(destroyed.load(Ordering::SeqCst));
}

#[test]
fn pending_command_keeps_object_alive() {
    let env = TestEnv::new();
    let destroyed = Arc::new(AtomicBool::new(false));
    let buffer = tests::buffer_from(&env.context, &[0u8; 64]);
    {
        let destroyed = destroyed.clone();
        crate::set_mem_object_destructor_callback(&buffer, move |_| {
            destroyed.store(true, Ordering::SeqCst);
        }).unwrap();
    }

    let gate = crate::create_user_event(&env.context).unwrap();
    let wait_list = [gate.clone()];
    crate::enqueue_fill_buffer(&env.queue, &buffer, 1u8, 0, 64, Some(&wait_list[..])).unwrap();
    drop(buffer);
    assert!(!destroyed.load(Ordering::SeqCst));

    crate::set_user_event_status(&gate, Status::CL_SUCCESS).unwrap();
    crate::finish(&env.queue).unwrap();

    // The worker lets go of the command right after completing it.
    for _ in 0..200 {
        if destroyed.load(Ordering::SeqCst) {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(destroyed.load(Ordering::SeqCst));
}
