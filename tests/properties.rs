use proptest::prelude::*;
use xcbimage::swap::{UnitClass, pixel_permutation, swap_scanline, unit_permutation};
use xcbimage::{Image, ImageOrder, ImageParams, PixelFamily, convert};

fn order(msb: bool) -> ImageOrder {
    if msb {
        ImageOrder::MsbFirst
    } else {
        ImageOrder::LsbFirst
    }
}

/// Smallest of 8/16/32 that is at least `bpp`, or `bits` if already enough.
fn fit(bits: u8, bpp: u8) -> u8 {
    if bits >= bpp {
        bits
    } else if bpp <= 8 {
        8
    } else if bpp <= 16 {
        16
    } else {
        32
    }
}

/// (family, bpp) combinations legal at `depth`.
fn shapes(depth: u8) -> Vec<(PixelFamily, u8)> {
    let mut shapes = vec![(PixelFamily::PIXMAP, depth)];
    shapes.extend_from_slice(match depth {
        1 => &[(PixelFamily::BITMAP, 1), (PixelFamily::Packed, 1), (PixelFamily::Packed, 8)][..],
        4 => &[(PixelFamily::Packed, 4), (PixelFamily::Packed, 8)][..],
        8 => &[(PixelFamily::Packed, 8), (PixelFamily::Packed, 16)][..],
        16 => &[(PixelFamily::Packed, 16), (PixelFamily::Packed, 32)][..],
        _ => &[(PixelFamily::Packed, 24), (PixelFamily::Packed, 32)][..],
    });
    shapes
}

fn params_for(depth: u8, width: u16, height: u16) -> impl Strategy<Value = ImageParams> {
    let shapes = shapes(depth);
    let sizes = || prop::sample::select(vec![8u8, 16, 32]);
    (0..shapes.len(), sizes(), sizes(), any::<bool>(), any::<bool>()).prop_map(
        move |(i, pad, unit, msb_bytes, msb_bits)| {
            let (family, bpp) = shapes[i];
            let params = ImageParams::new(width, height, family, depth, bpp)
                .with_byte_order(order(msb_bytes))
                .with_bit_order(order(msb_bits));
            if family.is_planar_at(bpp) {
                params.with_scanline_pad(fit(pad, bpp)).with_unit(fit(unit, bpp))
            } else {
                params.with_scanline_pad(pad)
            }
        },
    )
}

fn depth() -> impl Strategy<Value = u8> {
    prop::sample::select(vec![1u8, 4, 8, 16, 24])
}

fn layout() -> impl Strategy<Value = ImageParams> {
    (depth(), 1u16..40, 1u16..6).prop_flat_map(|(d, w, h)| params_for(d, w, h))
}

fn layout_pair() -> impl Strategy<Value = (ImageParams, ImageParams)> {
    (depth(), 1u16..40, 1u16..5).prop_flat_map(|(d, w, h)| (params_for(d, w, h), params_for(d, w, h)))
}

fn value_bits(image: &Image<'_>) -> u32 {
    let bits = if image.layout().is_planar() {
        image.depth()
    } else {
        image.bpp()
    };
    if bits >= 32 { u32::MAX } else { (1 << bits) - 1 }
}

fn paint(image: &mut Image<'_>, seed: u32) {
    let mask = if image.depth() >= 32 {
        u32::MAX
    } else {
        (1u32 << image.depth()) - 1
    };
    for y in 0..image.height() {
        for x in 0..image.width() {
            let v = seed ^ u32::from(x).wrapping_mul(0x9E37_79B9) ^ u32::from(y).wrapping_mul(0x85EB_CA6B);
            image.put_pixel(x, y, v.rotate_left(u32::from(x) % 13) & mask);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn generated_layouts_are_valid(params in layout()) {
        prop_assert!(params.validate(), "{:?}", params);
        let image = Image::geometry_only(params).unwrap();
        let planes = if image.layout().is_planar() { image.depth() as usize } else { 1 };
        prop_assert_eq!(image.size(), image.stride() * image.height() as usize * planes);
        prop_assert_eq!(image.stride() % (image.scanline_pad() as usize / 8), 0);
    }

    #[test]
    fn put_then_get(params in layout(), x in 0u16..40, y in 0u16..6, value in any::<u32>()) {
        let mut image = Image::new(params).unwrap();
        let (x, y) = (x % image.width(), y % image.height());
        image.put_pixel(x, y, value);
        prop_assert_eq!(image.get_pixel(x, y), value & value_bits(&image));
    }

    #[test]
    fn put_touches_only_its_pixel(params in layout(), x in 0u16..40, y in 0u16..6) {
        let mut image = Image::new(params).unwrap();
        let (x, y) = (x % image.width(), y % image.height());
        image.put_pixel(x, y, u32::MAX);
        for py in 0..image.height() {
            for px in 0..image.width() {
                if (px, py) != (x, y) {
                    prop_assert_eq!(image.get_pixel(px, py), 0);
                }
            }
        }
    }

    #[test]
    fn conversion_preserves_pixels((a, b) in layout_pair(), seed in any::<u32>()) {
        let mut src = Image::new(a).unwrap();
        paint(&mut src, seed);
        let mut dst = Image::new(b).unwrap();
        convert(&src, &mut dst).unwrap();
        for y in 0..src.height() {
            for x in 0..src.width() {
                prop_assert_eq!(src.get_pixel(x, y), dst.get_pixel(x, y));
            }
        }
        let mut back = Image::new(a).unwrap();
        convert(&dst, &mut back).unwrap();
        prop_assert_eq!(back.data(), src.data());
    }

    #[test]
    fn unit_swap_is_self_inverse(
        src in 0usize..3,
        dst in 0usize..3,
        msb_src in any::<bool>(),
        msb_dst in any::<bool>(),
        row in prop::collection::vec(any::<u8>(), 0..16).prop_map(|mut r| { r.truncate(r.len() & !3); r }),
    ) {
        let classes = [UnitClass::U8, UnitClass::U16, UnitClass::U32];
        let perm = unit_permutation(classes[src], order(msb_src), classes[dst], order(msb_dst));
        let mut once = vec![0u8; row.len()];
        let mut twice = vec![0u8; row.len()];
        swap_scanline(&row, &mut once, perm, true, false);
        swap_scanline(&once, &mut twice, perm, true, false);
        prop_assert_eq!(twice, row);
    }

    #[test]
    fn pixel_swap_is_self_inverse(n in 1usize..=4, pixels in 0usize..6, seed in any::<u64>()) {
        let row: Vec<u8> = (0..n * pixels).map(|i| (seed >> (i % 8 * 8)) as u8 ^ i as u8).collect();
        let perm = pixel_permutation(n, ImageOrder::LsbFirst, ImageOrder::MsbFirst);
        let mut once = vec![0u8; row.len()];
        let mut twice = vec![0u8; row.len()];
        swap_scanline(&row, &mut once, perm, false, n == 1);
        swap_scanline(&once, &mut twice, perm, false, n == 1);
        prop_assert_eq!(twice, row);
    }
}
