//! Conversion between two image layouts of equal geometry.
//!
//! [`plan`] picks the cheapest strategy that preserves every pixel value as
//! seen through [`Image::get_pixel`]; [`convert`] runs it. Bulk strategies
//! move whole planes, so a planar image with a partial plane mask on
//! either side is always converted pixel by pixel.

use crate::error::ImageError;
use crate::format::{ImageParams, low_mask};
use crate::image::{Image, Layout};
use crate::swap::{pixel_permutation, swap_scanline, unit_permutation};

/// Strategy used to convert one image into another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Identical layouts: whole-buffer copy.
    Copy,
    /// Single-plane images: permuted copy with optional bit reversal.
    Bitmap,
    /// Same family and bits per pixel: permuted copy with optional bit
    /// reversal (planar) or nibble swap (4-bit packed).
    Swap,
    /// Anything else: pixel-by-pixel transfer.
    PerPixel,
}

/// Whether every plane of a planar layout carries data.
fn all_planes(layout: &Layout) -> bool {
    !layout.is_planar() || layout.plane_mask() == low_mask(layout.params().depth)
}

/// Choose the conversion strategy for `src` into `dst`.
pub fn plan(src: &Layout, dst: &Layout) -> Conversion {
    let (s, d) = (src.params(), dst.params());
    if !all_planes(src) || !all_planes(dst) {
        Conversion::PerPixel
    } else if s.family == d.family
        && s.bpp == d.bpp
        && s.unit == d.unit
        && s.scanline_pad == d.scanline_pad
        && s.byte_order == d.byte_order
        && s.bit_order == d.bit_order
    {
        Conversion::Copy
    } else if src.is_planar() && dst.is_planar() && s.depth == 1 && d.depth == 1 {
        Conversion::Bitmap
    } else if src.is_planar() == dst.is_planar() && s.bpp == d.bpp {
        Conversion::Swap
    } else {
        Conversion::PerPixel
    }
}

/// Convert the pixels of `src` into `dst`, returning the strategy used.
///
/// # Errors
///
/// - [`ImageError::IncompatibleGeometry`] if width, height or depth differ.
/// - [`ImageError::Unallocated`] if either image has no storage.
///
/// `dst` is untouched on error.
pub fn convert(src: &Image<'_>, dst: &mut Image<'_>) -> Result<Conversion, ImageError> {
    if (src.width(), src.height(), src.depth()) != (dst.width(), dst.height(), dst.depth()) {
        return Err(ImageError::IncompatibleGeometry {
            src: (src.width(), src.height(), src.depth()),
            dst: (dst.width(), dst.height(), dst.depth()),
        });
    }
    if !src.is_allocated() || !dst.is_allocated() {
        return Err(ImageError::Unallocated);
    }

    let conversion = plan(src.layout(), dst.layout());
    log::debug!(
        "converting {}x{} depth {}: {:?} -> {:?} via {conversion:?}",
        src.width(),
        src.height(),
        src.depth(),
        src.params(),
        dst.params()
    );
    match conversion {
        Conversion::Copy => dst.data_mut().copy_from_slice(src.data()),
        Conversion::Bitmap | Conversion::Swap if src.layout().is_planar() => {
            swap_planes(src, dst)
        }
        Conversion::Bitmap | Conversion::Swap => swap_packed(src, dst),
        Conversion::PerPixel => {
            for y in 0..src.height() {
                for x in 0..src.width() {
                    dst.put_pixel(x, y, src.get_pixel(x, y));
                }
            }
        }
    }
    Ok(conversion)
}

/// Bit-plane scanlines, re-permuted between unit layouts.
///
/// When bit orders differ every byte is bit-reversed and the plane order
/// flips, since the first plane holds the opposite end of the value.
fn swap_planes(src: &Image<'_>, dst: &mut Image<'_>) {
    let (s, d) = (*src.params(), *dst.params());
    let perm = unit_permutation(
        src.layout().swap_class(),
        s.byte_order,
        dst.layout().swap_class(),
        d.byte_order,
    );
    let bitswap = s.bit_order != d.bit_order;
    let height = s.height as usize;
    let depth = s.depth as usize;
    let (src_stride, dst_stride) = (src.stride(), dst.stride());
    let src_data = src.data();
    let dst_data = dst.data_mut();

    for plane in 0..depth {
        let dst_plane = if bitswap { depth - 1 - plane } else { plane };
        for y in 0..height {
            let from = (plane * height + y) * src_stride;
            let to = (dst_plane * height + y) * dst_stride;
            swap_scanline(
                &src_data[from..from + src_stride],
                &mut dst_data[to..to + dst_stride],
                perm,
                bitswap,
                false,
            );
        }
    }
}

/// Packed scanlines, with each pixel's bytes reversed when byte orders
/// differ.
fn swap_packed(src: &Image<'_>, dst: &mut Image<'_>) {
    let (s, d) = (*src.params(), *dst.params());
    let perm = pixel_permutation((s.bpp as usize / 8).max(1), s.byte_order, d.byte_order);
    let nibbleswap = s.bpp == 4 && s.byte_order != d.byte_order;
    let (src_stride, dst_stride) = (src.stride(), dst.stride());
    let src_data = src.data();
    let dst_data = dst.data_mut();

    for y in 0..s.height as usize {
        swap_scanline(
            &src_data[y * src_stride..(y + 1) * src_stride],
            &mut dst_data[y * dst_stride..(y + 1) * dst_stride],
            perm,
            false,
            nibbleswap,
        );
    }
}

impl Image<'_> {
    /// Convert this image's pixels into `dst`. See [`convert`].
    ///
    /// # Errors
    ///
    /// As [`convert`].
    pub fn convert_into(&self, dst: &mut Image<'_>) -> Result<Conversion, ImageError> {
        convert(self, dst)
    }

    /// Convert into a freshly allocated image laid out as `params`.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidFormat`] for bad `params`, plus the errors of
    /// [`convert`].
    pub fn converted(&self, params: ImageParams) -> Result<Image<'static>, ImageError> {
        let mut out = Image::new(params)?;
        convert(self, &mut out)?;
        Ok(out)
    }
}
