//! Error type shared by descriptor, conversion and transport operations.

use core::fmt;

use crate::format::PixelFamily;
use crate::limits::LimitExceeded;

/// Errors from image descriptor operations.
///
/// Every failing operation leaves no partially built descriptor behind and
/// never retries; choosing a fallback format is the caller's business.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImageError {
    /// The depth / bpp / unit / scanline pad combination is not legal for
    /// the family.
    InvalidFormat {
        /// Requested family.
        family: PixelFamily,
        /// Requested depth.
        depth: u8,
        /// Requested bits per pixel.
        bpp: u8,
        /// Storage unit after defaulting.
        unit: u8,
        /// Requested scanline pad.
        scanline_pad: u8,
    },
    /// Allocating pixel storage failed.
    AllocationFailure {
        /// Bytes requested.
        bytes: usize,
    },
    /// Caller-provided storage is smaller than the image needs.
    BufferTooSmall {
        /// Bytes provided.
        actual: usize,
        /// Bytes required.
        required: usize,
    },
    /// Source and destination differ in width, height or depth.
    IncompatibleGeometry {
        /// Source `(width, height, depth)`.
        src: (u16, u16, u8),
        /// Destination `(width, height, depth)`.
        dst: (u16, u16, u8),
    },
    /// A family or order code outside the supported set.
    UnsupportedFormat {
        /// The offending protocol code.
        code: u8,
    },
    /// The server has no pixmap format for this depth.
    NoNativeFormat {
        /// Requested depth.
        depth: u8,
    },
    /// The image is not in the server's native layout and conversion was
    /// not allowed.
    NotNative,
    /// The operation needs pixel storage but the descriptor is
    /// geometry-only.
    Unallocated,
    /// The image data does not lie inside the shared memory segment.
    OutsideSegment,
    /// A configured resource limit was exceeded.
    LimitExceeded(LimitExceeded),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat {
                family,
                depth,
                bpp,
                unit,
                scanline_pad,
            } => write!(
                f,
                "invalid {family:?} format: depth {depth}, bpp {bpp}, unit {unit}, scanline pad {scanline_pad}"
            ),
            Self::AllocationFailure { bytes } => {
                write!(f, "failed to allocate {bytes} bytes of pixel storage")
            }
            Self::BufferTooSmall { actual, required } => {
                write!(f, "buffer holds {actual} bytes but the image needs {required}")
            }
            Self::IncompatibleGeometry { src, dst } => write!(
                f,
                "cannot convert {}x{} depth {} image into {}x{} depth {}",
                src.0, src.1, src.2, dst.0, dst.1, dst.2
            ),
            Self::UnsupportedFormat { code } => write!(f, "unsupported image format code {code}"),
            Self::NoNativeFormat { depth } => {
                write!(f, "server has no pixmap format for depth {depth}")
            }
            Self::NotNative => write!(f, "image is not in the server's native format"),
            Self::Unallocated => write!(f, "image has no pixel storage"),
            Self::OutsideSegment => write!(f, "image data lies outside the shared memory segment"),
            Self::LimitExceeded(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::LimitExceeded(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LimitExceeded> for ImageError {
    fn from(e: LimitExceeded) -> Self {
        Self::LimitExceeded(e)
    }
}
