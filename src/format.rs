//! Pixel layout families, orders and format validation.
//!
//! [`ImageParams`] carries everything that determines how pixels are laid
//! out in memory. [`validate`] decides whether a combination is one the
//! display protocol can express.

use crate::error::ImageError;

/// Byte or bit significance order.
///
/// Used both for the byte order of multi-byte storage units and for the
/// order of bits within a byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ImageOrder {
    /// Least significant first.
    #[default]
    LsbFirst = 0,
    /// Most significant first.
    MsbFirst = 1,
}

impl ImageOrder {
    /// Parse a protocol order code (0 = LSB first, 1 = MSB first).
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::UnsupportedFormat`] for any other code.
    pub const fn from_wire(code: u8) -> Result<Self, ImageError> {
        match code {
            0 => Ok(Self::LsbFirst),
            1 => Ok(Self::MsbFirst),
            _ => Err(ImageError::UnsupportedFormat { code }),
        }
    }

    /// Protocol order code.
    #[inline]
    pub const fn wire(self) -> u8 {
        self as u8
    }

    #[inline]
    pub(crate) const fn is_msb(self) -> bool {
        matches!(self, Self::MsbFirst)
    }
}

/// Sub-case of the planar family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanarKind {
    /// Single bit-plane drawn with foreground/background colors.
    Bitmap,
    /// One bit-plane per bit of depth.
    Pixmap,
}

/// Pixel layout family.
///
/// Planar images store `depth` separate one-bit planes; packed images
/// store each pixel's bits together in a `bpp`-bit slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFamily {
    /// Bit-plane layout (XY bitmap / XY pixmap).
    Planar(PlanarKind),
    /// Per-pixel layout (Z pixmap).
    Packed,
}

impl PixelFamily {
    /// XY bitmap.
    pub const BITMAP: Self = Self::Planar(PlanarKind::Bitmap);
    /// XY pixmap.
    pub const PIXMAP: Self = Self::Planar(PlanarKind::Pixmap);

    /// Parse a protocol image format code (0 = XY bitmap, 1 = XY pixmap,
    /// 2 = Z pixmap).
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::UnsupportedFormat`] for any other code.
    pub const fn from_wire(code: u8) -> Result<Self, ImageError> {
        match code {
            0 => Ok(Self::BITMAP),
            1 => Ok(Self::PIXMAP),
            2 => Ok(Self::Packed),
            _ => Err(ImageError::UnsupportedFormat { code }),
        }
    }

    /// Protocol image format code.
    pub const fn wire(self) -> u8 {
        match self {
            Self::Planar(PlanarKind::Bitmap) => 0,
            Self::Planar(PlanarKind::Pixmap) => 1,
            Self::Packed => 2,
        }
    }

    /// Whether pixels of this family at `bpp` are stored as bit-planes.
    ///
    /// A packed format with one bit per pixel is indistinguishable from a
    /// single bit-plane, so it is laid out as one.
    #[inline]
    pub const fn is_planar_at(self, bpp: u8) -> bool {
        match self {
            Self::Planar(_) => true,
            Self::Packed => bpp == 1,
        }
    }
}

/// Check that a format combination is legal.
///
/// Rules, with `depth <= bpp <= unit` always required:
///
/// - planar: `unit` and `scanline_pad` in {8, 16, 32}, `scanline_pad >= bpp`
/// - packed: `bpp` in {4, 8, 16, 24, 32}; `unit == bpp`, except `bpp == 4`
///   which requires `unit == 8`
///
/// A packed format with `bpp == 1` is checked against the planar rules.
pub const fn validate(depth: u8, bpp: u8, unit: u8, family: PixelFamily, scanline_pad: u8) -> bool {
    if depth > bpp || bpp > unit {
        return false;
    }
    if family.is_planar_at(bpp) {
        matches!(unit, 8 | 16 | 32) && matches!(scanline_pad, 8 | 16 | 32) && scanline_pad >= bpp
    } else {
        match bpp {
            4 => unit == 8,
            8 | 16 | 24 | 32 => unit == bpp,
            _ => false,
        }
    }
}

/// Storage unit used when a caller leaves it unspecified (0).
pub const fn default_unit(family: PixelFamily, bpp: u8) -> u8 {
    match family {
        PixelFamily::Planar(_) => 32,
        PixelFamily::Packed if bpp == 1 => 32,
        PixelFamily::Packed if bpp < 8 => 8,
        PixelFamily::Packed => bpp,
    }
}

#[inline]
pub(crate) const fn round_up(value: usize, pad: usize) -> usize {
    if pad == 0 {
        return value;
    }
    value.div_ceil(pad) * pad
}

/// Low `bits` bits set.
#[inline]
pub(crate) const fn low_mask(bits: u8) -> u32 {
    if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 }
}

/// Parameters that fully describe an image's memory layout.
///
/// # Example
///
/// ```
/// use xcbimage::{ImageOrder, ImageParams};
///
/// let params = ImageParams::packed(640, 480, 24, 32)
///     .with_scanline_pad(32)
///     .with_byte_order(ImageOrder::MsbFirst);
/// assert!(params.validate());
/// assert_eq!(params.stride(), 640 * 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct ImageParams {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Layout family.
    pub family: PixelFamily,
    /// Scanline alignment in bits.
    pub scanline_pad: u8,
    /// Meaningful bits per pixel.
    pub depth: u8,
    /// Bits occupied per pixel slot.
    pub bpp: u8,
    /// Storage unit in bits; 0 selects [`default_unit`].
    pub unit: u8,
    /// Byte order of storage units.
    pub byte_order: ImageOrder,
    /// Bit order within bytes.
    pub bit_order: ImageOrder,
}

impl ImageParams {
    /// Parameters with 32-bit scanline pad, default unit and LSB-first
    /// byte and bit order.
    pub const fn new(width: u16, height: u16, family: PixelFamily, depth: u8, bpp: u8) -> Self {
        Self {
            width,
            height,
            family,
            scanline_pad: 32,
            depth,
            bpp,
            unit: 0,
            byte_order: ImageOrder::LsbFirst,
            bit_order: ImageOrder::LsbFirst,
        }
    }

    /// Single-plane XY bitmap.
    pub const fn bitmap(width: u16, height: u16) -> Self {
        Self::new(width, height, PixelFamily::BITMAP, 1, 1)
    }

    /// XY pixmap with one plane per bit of `depth`.
    pub const fn planar(width: u16, height: u16, depth: u8) -> Self {
        Self::new(width, height, PixelFamily::PIXMAP, depth, depth)
    }

    /// Z pixmap.
    pub const fn packed(width: u16, height: u16, depth: u8, bpp: u8) -> Self {
        Self::new(width, height, PixelFamily::Packed, depth, bpp)
    }

    /// Set the scanline pad in bits.
    pub const fn with_scanline_pad(mut self, bits: u8) -> Self {
        self.scanline_pad = bits;
        self
    }

    /// Set the storage unit in bits (0 for the default).
    pub const fn with_unit(mut self, bits: u8) -> Self {
        self.unit = bits;
        self
    }

    /// Set the byte order.
    pub const fn with_byte_order(mut self, order: ImageOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Set the bit order.
    pub const fn with_bit_order(mut self, order: ImageOrder) -> Self {
        self.bit_order = order;
        self
    }

    /// Set the dimensions.
    pub const fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Storage unit after applying the default.
    #[inline]
    pub const fn resolved_unit(&self) -> u8 {
        if self.unit == 0 {
            default_unit(self.family, self.bpp)
        } else {
            self.unit
        }
    }

    /// Copy with the storage unit default applied.
    pub const fn resolved(mut self) -> Self {
        self.unit = self.resolved_unit();
        self
    }

    /// Whether pixels are stored as bit-planes.
    #[inline]
    pub const fn is_planar(&self) -> bool {
        self.family.is_planar_at(self.bpp)
    }

    /// Whether this combination passes [`validate`].
    pub const fn validate(&self) -> bool {
        validate(
            self.depth,
            self.bpp,
            self.resolved_unit(),
            self.family,
            self.scanline_pad,
        )
    }

    pub(crate) const fn invalid(&self) -> ImageError {
        ImageError::InvalidFormat {
            family: self.family,
            depth: self.depth,
            bpp: self.bpp,
            unit: self.resolved_unit(),
            scanline_pad: self.scanline_pad,
        }
    }

    /// Bytes per scanline (per plane for planar images).
    pub const fn stride(&self) -> usize {
        let bits = if self.is_planar() {
            self.width as usize
        } else {
            self.width as usize * self.bpp as usize
        };
        round_up(bits, self.scanline_pad as usize) >> 3
    }

    /// Total bytes of pixel storage.
    pub const fn size(&self) -> usize {
        let plane = self.height as usize * self.stride();
        if self.is_planar() {
            plane * self.depth as usize
        } else {
            plane
        }
    }

    /// Initial plane mask: every plane for planar images, 0 for packed.
    pub const fn plane_mask(&self) -> u32 {
        if self.is_planar() {
            low_mask(self.depth)
        } else {
            0
        }
    }
}
