//! Server-native layouts.
//!
//! A display server announces one image byte order, one bitmap layout
//! (unit, pad, bit order) shared by every planar image, and a pixmap format
//! per supported depth for packed images. [`ServerSetup`] answers which
//! layout an image must have to be sent without conversion.

use alloc::vec::Vec;
use core::ops::Deref;

use crate::error::ImageError;
use crate::format::{ImageOrder, ImageParams, PixelFamily, PlanarKind};
use crate::image::{Backing, Image};

/// Packed layout the server uses for one depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixmapFormat {
    /// Depth this format applies to.
    pub depth: u8,
    /// Bits per pixel slot.
    pub bits_per_pixel: u8,
    /// Scanline pad in bits.
    pub scanline_pad: u8,
}

impl PixmapFormat {
    /// A pixmap format.
    pub const fn new(depth: u8, bits_per_pixel: u8, scanline_pad: u8) -> Self {
        Self {
            depth,
            bits_per_pixel,
            scanline_pad,
        }
    }
}

/// Image layout announced by a display server at connection setup.
///
/// # Example
///
/// ```
/// use xcbimage::{ImageOrder, PixelFamily, PixmapFormat, ServerSetup};
///
/// let setup = ServerSetup::new(ImageOrder::LsbFirst, 32, 32, ImageOrder::LsbFirst)
///     .with_pixmap_format(PixmapFormat::new(1, 1, 32))
///     .with_pixmap_format(PixmapFormat::new(24, 32, 32));
/// let params = setup.native_params(640, 480, PixelFamily::Packed, 24).unwrap();
/// assert_eq!(params.bpp, 32);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ServerSetup {
    /// Byte order of every image.
    pub image_byte_order: ImageOrder,
    /// Storage unit of planar images, in bits.
    pub bitmap_unit: u8,
    /// Scanline pad of planar images, in bits.
    pub bitmap_pad: u8,
    /// Bit order of planar images.
    pub bitmap_bit_order: ImageOrder,
    /// Packed layouts, one per supported depth.
    pub pixmap_formats: Vec<PixmapFormat>,
}

impl ServerSetup {
    /// Setup with no pixmap formats.
    pub fn new(
        image_byte_order: ImageOrder,
        bitmap_unit: u8,
        bitmap_pad: u8,
        bitmap_bit_order: ImageOrder,
    ) -> Self {
        Self {
            image_byte_order,
            bitmap_unit,
            bitmap_pad,
            bitmap_bit_order,
            pixmap_formats: Vec::new(),
        }
    }

    /// Add a pixmap format.
    pub fn with_pixmap_format(mut self, format: PixmapFormat) -> Self {
        self.pixmap_formats.push(format);
        self
    }

    /// First pixmap format for `depth`.
    pub fn find_format(&self, depth: u8) -> Option<&PixmapFormat> {
        self.pixmap_formats.iter().find(|f| f.depth == depth)
    }

    /// Layout of a `family` image of `depth` in the server's native format.
    ///
    /// Planar images use the bitmap layout with `bpp == depth`; packed
    /// images use the pixmap format for `depth` with MSB-first bit order.
    /// A packed request at depth 1 is laid out as planar.
    ///
    /// # Errors
    ///
    /// - [`ImageError::InvalidFormat`] for an XY bitmap with `depth != 1`.
    /// - [`ImageError::NoNativeFormat`] if the server has no pixmap format
    ///   for `depth` (not needed for single-plane images).
    pub fn native_params(
        &self,
        width: u16,
        height: u16,
        family: PixelFamily,
        depth: u8,
    ) -> Result<ImageParams, ImageError> {
        let params = ImageParams::new(width, height, family, depth, depth)
            .with_byte_order(self.image_byte_order);
        let planar = match family {
            PixelFamily::Planar(PlanarKind::Bitmap) if depth != 1 => {
                return Err(params.invalid());
            }
            PixelFamily::Planar(_) => true,
            PixelFamily::Packed => depth == 1,
        };
        if planar {
            if depth > 1 && self.find_format(depth).is_none() {
                return Err(ImageError::NoNativeFormat { depth });
            }
            return Ok(params
                .with_scanline_pad(self.bitmap_pad)
                .with_unit(self.bitmap_unit)
                .with_bit_order(self.bitmap_bit_order));
        }
        let format = self
            .find_format(depth)
            .ok_or(ImageError::NoNativeFormat { depth })?;
        let mut params = params
            .with_scanline_pad(format.scanline_pad)
            .with_bit_order(ImageOrder::MsbFirst);
        params.bpp = format.bits_per_pixel;
        Ok(params)
    }

    /// Create an image in the server's native layout.
    ///
    /// # Errors
    ///
    /// As [`native_params`](Self::native_params) and [`Image::create`].
    pub fn create_native<'a>(
        &self,
        width: u16,
        height: u16,
        family: PixelFamily,
        depth: u8,
        backing: Backing<'a>,
    ) -> Result<Image<'a>, ImageError> {
        Image::create(self.native_params(width, height, family, depth)?, backing)
    }

    /// Whether `image` can be sent without conversion.
    ///
    /// # Errors
    ///
    /// As [`native_params`](Self::native_params).
    pub fn is_native(&self, image: &Image<'_>) -> Result<bool, ImageError> {
        let native = self
            .native_params(image.width(), image.height(), image.family(), image.depth())?
            .resolved();
        let have = image.params();
        let shared = native.scanline_pad == have.scanline_pad
            && native.byte_order == have.byte_order
            && native.bpp == have.bpp;
        Ok(if native.is_planar() {
            shared && native.unit == have.unit && native.bit_order == have.bit_order
        } else {
            shared
        })
    }

    /// `image` in the server's native layout.
    ///
    /// Returns the image itself when it is already native. Otherwise, with
    /// `convert` set, returns a converted copy; without it, fails.
    ///
    /// # Errors
    ///
    /// - [`ImageError::NotNative`] if conversion is needed but not allowed.
    /// - As [`native_params`](Self::native_params) and
    ///   [`convert`](crate::convert()).
    pub fn native<'i, 'a>(
        &self,
        image: &'i Image<'a>,
        convert: bool,
    ) -> Result<Native<'i, 'a>, ImageError> {
        if self.is_native(image)? {
            return Ok(Native::Already(image));
        }
        if !convert {
            return Err(ImageError::NotNative);
        }
        let params =
            self.native_params(image.width(), image.height(), image.family(), image.depth())?;
        log::debug!(
            "converting {}x{} depth {} image to native layout",
            image.width(),
            image.height(),
            image.depth()
        );
        Ok(Native::Converted(image.converted(params)?))
    }
}

/// An image in native layout: either the original or a converted copy.
pub enum Native<'i, 'a> {
    /// The image was already native.
    Already(&'i Image<'a>),
    /// A converted copy owning its storage.
    Converted(Image<'static>),
}

impl Native<'_, '_> {
    /// Whether a conversion was needed.
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted(_))
    }
}

impl<'a> Deref for Native<'_, 'a> {
    type Target = Image<'a>;

    fn deref(&self) -> &Image<'a> {
        match self {
            Self::Already(image) => *image,
            Self::Converted(image) => image,
        }
    }
}
