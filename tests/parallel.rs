use rayon::prelude::*;
use xcbimage::{Conversion, Image, ImageOrder, ImageParams, convert};

fn frame(index: u16) -> Image<'static> {
    let params = ImageParams::packed(33, 7, 24, 32);
    let mut image = Image::new(params).unwrap();
    for y in 0..image.height() {
        for x in 0..image.width() {
            let v = (u32::from(index) << 16) | (u32::from(y) << 8) | u32::from(x);
            image.put_pixel(x, y, v);
        }
    }
    image
}

#[test]
fn independent_images_convert_in_parallel() {
    let frames: Vec<Image<'static>> = (0..32).map(frame).collect();
    let target = ImageParams::packed(33, 7, 24, 32).with_byte_order(ImageOrder::MsbFirst);

    let converted: Vec<Image<'static>> = frames
        .par_iter()
        .map(|src| src.converted(target).unwrap())
        .collect();

    for (src, dst) in frames.iter().zip(&converted) {
        assert_eq!(dst.byte_order(), ImageOrder::MsbFirst);
        for y in 0..src.height() {
            for x in 0..src.width() {
                assert_eq!(src.get_pixel(x, y), dst.get_pixel(x, y));
            }
        }
    }
}

#[test]
fn parallel_matches_sequential() {
    let target = ImageParams::planar(33, 7, 24).with_unit(32).with_scanline_pad(32);
    let sequential: Vec<Vec<u8>> = (0..8)
        .map(|i| frame(i).converted(target).unwrap().data().to_vec())
        .collect();
    let parallel: Vec<Vec<u8>> = (0..8u16)
        .into_par_iter()
        .map(|i| {
            let src = frame(i);
            let mut dst = Image::new(target).unwrap();
            assert_eq!(convert(&src, &mut dst), Ok(Conversion::PerPixel));
            dst.data().to_vec()
        })
        .collect();
    assert_eq!(sequential, parallel);
}
