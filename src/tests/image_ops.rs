//! Tests various image operations.
//!
//! Images are reset with `enqueue_fill_image` between runs, then written,
//! copied or filled over a random region and read back whole.

use crate::tests::{self, TestEnv};
use crate::{ImageChannelDataType, ImageChannelOrder, ImageDescriptor, ImageFillColor,
    ImageFormat, ImageInfo, ImageInfoResult, Mem, MemFlags, MemObjectType, Status};

const DIMS: [usize; 3] = [32, 16, 4];
const TEST_ITERS: i32 = 20;
const PIXEL_ELEMENT_LEN: usize = 4;

fn rgba_i32() -> ImageFormat {
    ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::SignedInt32)
}

fn image_3d(env: &TestEnv, vec: &[i32]) -> Mem {
    let desc = ImageDescriptor::new(MemObjectType::Image3d, DIMS[0], DIMS[1], DIMS[2], 1, 0, 0,
        None);
    unsafe {
        crate::create_image(&env.context, MemFlags::READ_WRITE | MemFlags::COPY_HOST_PTR,
            &rgba_i32(), &desc, Some(vec)).unwrap()
    }
}

fn fill(env: &TestEnv, img: &Mem, val: i32, origin: [usize; 3], region: [usize; 3]) {
    crate::enqueue_fill_image(&env.queue, img, &ImageFillColor::Int([val; 4]), origin, region,
        None).unwrap();
}

fn read_image(env: &TestEnv, img: &Mem, vec: &mut [i32]) {
    unsafe {
        crate::enqueue_read_image(&env.queue, img, true, [0, 0, 0], DIMS, 0, 0, vec, None)
            .unwrap();
    }
}

#[test]
fn image_ops() {
    let env = TestEnv::new();
    let len = DIMS[0] * DIMS[1] * DIMS[2];
    let mut vec = vec![0i32; len * PIXEL_ELEMENT_LEN];
    let img_src = image_3d(&env, &vec);
    let img_dst = image_3d(&env, &vec);

    // Make sure the initial contents came from the host data:
    read_image(&env, &img_dst, &mut vec);
    tests::verify_vec_rect([0, 0, 0], DIMS, 0, 0, DIMS, PIXEL_ELEMENT_LEN, &vec, 0).unwrap();

    let mut ttl_runs = 0i32;

    //========================================================================
    //========================================================================
    //======================= Read / Write / Copy ============================
    //========================================================================
    //========================================================================
    for _ in 0..TEST_ITERS {
        // Write:
        let (origin, region) = tests::gen_region_origin(&DIMS);
        ttl_runs += 1;
        let (cur_val, old_val) = (ttl_runs, ttl_runs - 1);
        fill(&env, &img_src, old_val, [0, 0, 0], DIMS);

        let region_data = vec![cur_val; region.iter().product::<usize>() * PIXEL_ELEMENT_LEN];
        unsafe {
            crate::enqueue_write_image(&env.queue, &img_src, false, origin, region, 0, 0,
                &region_data, None).unwrap();
        }
        read_image(&env, &img_src, &mut vec);
        tests::verify_vec_rect(origin, region, cur_val, old_val, DIMS, PIXEL_ELEMENT_LEN, &vec,
            ttl_runs).unwrap();

        // Copy:
        let (origin, region) = tests::gen_region_origin(&DIMS);
        ttl_runs += 1;
        let (cur_val, old_val) = (ttl_runs, ttl_runs - 1);
        fill(&env, &img_src, cur_val, [0, 0, 0], DIMS);
        fill(&env, &img_dst, old_val, [0, 0, 0], DIMS);

        crate::enqueue_copy_image(&env.queue, &img_src, &img_dst, origin, origin, region, None)
            .unwrap();
        read_image(&env, &img_dst, &mut vec);
        tests::verify_vec_rect(origin, region, cur_val, old_val, DIMS, PIXEL_ELEMENT_LEN, &vec,
            ttl_runs).unwrap();

        // Fill:
        let (origin, region) = tests::gen_region_origin(&DIMS);
        ttl_runs += 1;
        let (cur_val, old_val) = (ttl_runs, ttl_runs - 1);
        fill(&env, &img_dst, old_val, [0, 0, 0], DIMS);
        fill(&env, &img_dst, cur_val, origin, region);

        read_image(&env, &img_dst, &mut vec);
        tests::verify_vec_rect(origin, region, cur_val, old_val, DIMS, PIXEL_ELEMENT_LEN, &vec,
            ttl_runs).unwrap();
    }
}

#[test]
fn copy_host_ptr_reports_pitch() {
    let env = TestEnv::new();
    let format = ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::UnormInt8);
    let desc = ImageDescriptor::new(MemObjectType::Image2d, 256, 256, 1, 1, 0, 0, None);
    let data: Vec<u8> = (0..256 * 256 * 4).map(|i| (i % 251) as u8).collect();

    let img = unsafe {
        crate::create_image(&env.context, MemFlags::COPY_HOST_PTR, &format, &desc, Some(&data))
            .unwrap()
    };

    match crate::get_image_info(&img, ImageInfo::RowPitch).unwrap() {
        ImageInfoResult::RowPitch(p) => assert_eq!(p, 256 * 4),
        r => panic!("unexpected: {}", r),
    }
    match crate::get_image_info(&img, ImageInfo::SlicePitch).unwrap() {
        ImageInfoResult::SlicePitch(p) => assert_eq!(p, 256 * 256 * 4),
        r => panic!("unexpected: {}", r),
    }
    match crate::get_image_info(&img, ImageInfo::Depth).unwrap() {
        ImageInfoResult::Depth(d) => assert_eq!(d, 0),
        r => panic!("unexpected: {}", r),
    }

    let mut out = vec![0u8; data.len()];
    unsafe {
        crate::enqueue_read_image(&env.queue, &img, true, [0, 0, 0], [256, 256, 1], 0, 0,
            &mut out, None).unwrap();
    }
    assert!(out == data);

    // Too little host data for the image.
    let res = unsafe {
        crate::create_image(&env.context, MemFlags::COPY_HOST_PTR, &format, &desc,
            Some(&data[..1000]))
    };
    assert_eq!(tests::status(res), Status::CL_INVALID_HOST_PTR);
}

#[test]
fn unsupported_and_invalid_formats() {
    let env = TestEnv::new();
    let desc = ImageDescriptor::new(MemObjectType::Image2d, 16, 16, 1, 1, 0, 0, None);

    let argb = ImageFormat::new(ImageChannelOrder::Argb, ImageChannelDataType::UnormInt8);
    let res = unsafe { crate::create_image::<u8>(&env.context, MemFlags::new(), &argb, &desc,
        None) };
    assert_eq!(tests::status(res), Status::CL_IMAGE_FORMAT_NOT_SUPPORTED);

    let rgb = ImageFormat::new(ImageChannelOrder::Rgb, ImageChannelDataType::UnormInt8);
    let res = unsafe { crate::create_image::<u8>(&env.context, MemFlags::new(), &rgb, &desc,
        None) };
    assert_eq!(tests::status(res), Status::CL_INVALID_IMAGE_FORMAT_DESCRIPTOR);

    let formats = crate::get_supported_image_formats(&env.context, MemFlags::READ_WRITE,
        MemObjectType::Image2d).unwrap();
    assert!(formats.contains(&rgba_i32()));
    assert!(!formats.contains(&argb));
    let res = crate::get_supported_image_formats(&env.context, MemFlags::READ_WRITE,
        MemObjectType::Buffer);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
}

#[test]
fn region_and_format_checks() {
    let env = TestEnv::new();
    let vec = vec![0i32; DIMS.iter().product::<usize>() * PIXEL_ELEMENT_LEN];
    let img = image_3d(&env, &vec);

    let r32 = ImageFormat::new(ImageChannelOrder::R, ImageChannelDataType::UnsignedInt32);
    let desc = ImageDescriptor::new(MemObjectType::Image2d, 16, 16, 1, 1, 0, 0, None);
    let img_2d = unsafe {
        crate::create_image::<u32>(&env.context, MemFlags::new(), &r32, &desc, None).unwrap()
    };

    // Past the end, then a zero extent.
    let res = crate::enqueue_fill_image(&env.queue, &img, &ImageFillColor::Int([0; 4]),
        [30, 0, 0], [4, 1, 1], None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    let res = crate::enqueue_fill_image(&env.queue, &img, &ImageFillColor::Int([0; 4]),
        [0, 0, 0], [4, 0, 1], None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);
    // A 2D image without mip levels has no use for the third coordinate.
    let res = crate::enqueue_fill_image(&env.queue, &img_2d, &ImageFillColor::Uint([0; 4]),
        [0, 0, 0], [4, 4, 2], None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    // The color class must match the channel type.
    let res = crate::enqueue_fill_image(&env.queue, &img_2d, &ImageFillColor::Float([0.0; 4]),
        [0, 0, 0], [4, 4, 1], None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    let res = crate::enqueue_copy_image(&env.queue, &img, &img_2d, [0, 0, 0], [0, 0, 0],
        [4, 4, 1], None);
    assert_eq!(tests::status(res), Status::CL_IMAGE_FORMAT_MISMATCH);

    let res = crate::enqueue_copy_image(&env.queue, &img, &img, [0, 0, 0], [2, 2, 0],
        [4, 4, 1], None);
    assert_eq!(tests::status(res), Status::CL_MEM_COPY_OVERLAP);
    crate::enqueue_copy_image(&env.queue, &img, &img, [0, 0, 0], [4, 0, 0], [4, 4, 1], None)
        .unwrap();

    // Buffers are not images.
    let buffer = tests::buffer_from(&env.context, &[0u32; 256]);
    let res = crate::enqueue_fill_image(&env.queue, &buffer, &ImageFillColor::Uint([0; 4]),
        [0, 0, 0], [4, 4, 1], None);
    assert_eq!(tests::status(res), Status::CL_INVALID_MEM_OBJECT);
    crate::finish(&env.queue).unwrap();
}

#[test]
fn image_buffer_copies() {
    let env = TestEnv::new();
    let r32 = ImageFormat::new(ImageChannelOrder::R, ImageChannelDataType::UnsignedInt32);
    let desc = ImageDescriptor::new(MemObjectType::Image2d, 16, 16, 1, 1, 0, 0, None);
    let pixels: Vec<u32> = (0..256).collect();
    let img = unsafe {
        crate::create_image(&env.context, MemFlags::READ_WRITE | MemFlags::COPY_HOST_PTR, &r32,
            &desc, Some(&pixels)).unwrap()
    };
    let buffer = tests::buffer_from(&env.context, &[0u32; 64]);

    // Image [2..6, 3..8] packed into the buffer two elements in.
    crate::enqueue_copy_image_to_buffer(&env.queue, &img, &buffer, [2, 3, 0], [4, 5, 1], 8, None)
        .unwrap();
    let out = tests::read_all::<u32>(&env, &buffer, 64);
    for y in 0..5 {
        for x in 0..4 {
            assert_eq!(out[2 + y * 4 + x], ((3 + y) * 16 + 2 + x) as u32);
        }
    }
    assert_eq!(out[0], 0);
    assert_eq!(out[22], 0);

    let res = crate::enqueue_copy_image_to_buffer(&env.queue, &img, &buffer, [0, 0, 0],
        [16, 16, 1], 0, None);
    assert_eq!(tests::status(res), Status::CL_INVALID_VALUE);

    // And back in at the origin.
    crate::enqueue_copy_buffer_to_image(&env.queue, &buffer, &img, 8, [0, 0, 0], [4, 5, 1], None)
        .unwrap();
    let mut image_data = vec![0u32; 256];
    unsafe {
        crate::enqueue_read_image(&env.queue, &img, true, [0, 0, 0], [16, 16, 1], 0, 0,
            &mut image_data, None).unwrap();
    }
    for y in 0..5 {
        for x in 0..4 {
            assert_eq!(image_data[y * 16 + x], ((3 + y) * 16 + 2 + x) as u32);
        }
    }
    assert_eq!(image_data[4], 4);
    assert_eq!(image_data[255], 255);
}

#[test]
fn image_from_buffer_shares_storage() {
    let env = TestEnv::new();
    let r32 = ImageFormat::new(ImageChannelOrder::R, ImageChannelDataType::UnsignedInt32);
    let data: Vec<u32> = (0..128).collect();
    let buffer = tests::buffer_from(&env.context, &data);

    // Eight rows of 16 pixels, with a 64-byte row pitch.
    let desc = ImageDescriptor::new(MemObjectType::Image2d, 16, 8, 1, 1, 64, 0,
        Some(buffer.clone()));
    let img = unsafe {
        crate::create_image::<u32>(&env.context, MemFlags::new(), &r32, &desc, None).unwrap()
    };
    match crate::get_image_info(&img, ImageInfo::Buffer).unwrap() {
        ImageInfoResult::Buffer(Some(b)) => assert!(b == buffer),
        r => panic!("unexpected: {}", r),
    }

    let mut out = vec![0u32; 128];
    unsafe {
        crate::enqueue_read_image(&env.queue, &img, true, [0, 0, 0], [16, 8, 1], 0, 0,
            &mut out, None).unwrap();
    }
    assert_eq!(out, data);

    crate::enqueue_fill_image(&env.queue, &img, &ImageFillColor::Uint([9, 0, 0, 0]), [0, 1, 0],
        [16, 1, 1], None).unwrap();
    let through_buffer = tests::read_all::<u32>(&env, &buffer, 128);
    assert_eq!(&through_buffer[16..32], &[9u32; 16][..]);
    assert_eq!(&through_buffer[..16], &data[..16]);

    // Too few bytes behind the image.
    let desc = ImageDescriptor::new(MemObjectType::Image2d, 16, 9, 1, 1, 0, 0,
        Some(buffer.clone()));
    let res = unsafe { crate::create_image::<u32>(&env.context, MemFlags::new(), &r32, &desc,
        None) };
    assert_eq!(tests::status(res), Status::CL_INVALID_IMAGE_SIZE);
}
