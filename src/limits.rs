//! Caps on the images a caller is willing to build.
//!
//! Checked by [`Image::create_limited`](crate::Image::create_limited)
//! against the annotated layout, so a request is refused before any pixel
//! storage exists.

use crate::format::ImageParams;

/// Upper bounds on image geometry and storage.
///
/// `None` leaves that dimension unbounded.
///
/// # Example
///
/// ```
/// use xcbimage::{ImageParams, ResourceLimits};
///
/// let limits = ResourceLimits::none()
///     .with_max_pixels(4096 * 4096)
///     .with_max_bytes(64 * 1024 * 1024);
/// assert!(limits.check(&ImageParams::packed(640, 480, 24, 32)).is_ok());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ResourceLimits {
    /// Widest image in pixels.
    pub max_width: Option<u16>,
    /// Tallest image in pixels.
    pub max_height: Option<u16>,
    /// Largest `width * height`.
    pub max_pixels: Option<u64>,
    /// Largest pixel storage, counting every plane and all scanline padding.
    pub max_bytes: Option<usize>,
}

impl ResourceLimits {
    /// Nothing bounded.
    pub fn none() -> Self {
        Self::default()
    }

    /// Bound the width in pixels.
    pub fn with_max_width(mut self, width: u16) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Bound the height in pixels.
    pub fn with_max_height(mut self, height: u16) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Bound `width * height`.
    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    /// Bound the pixel storage in bytes, all planes and padding included.
    pub fn with_max_bytes(mut self, bytes: usize) -> Self {
        self.max_bytes = Some(bytes);
        self
    }

    /// Whether anything is bounded.
    pub fn has_any(&self) -> bool {
        *self != Self::none()
    }

    /// Check `params` against every bound, geometry first.
    ///
    /// # Errors
    ///
    /// The first bound exceeded.
    pub fn check(&self, params: &ImageParams) -> Result<(), LimitExceeded> {
        let (width, height) = (params.width, params.height);
        if let Some(max) = self.max_width
            && width > max
        {
            return Err(LimitExceeded::Width { actual: width, max });
        }
        if let Some(max) = self.max_height
            && height > max
        {
            return Err(LimitExceeded::Height {
                actual: height,
                max,
            });
        }
        let pixels = u64::from(width) * u64::from(height);
        if let Some(max) = self.max_pixels
            && pixels > max
        {
            return Err(LimitExceeded::Pixels {
                actual: pixels,
                max,
            });
        }
        let bytes = params.size();
        if let Some(max) = self.max_bytes
            && bytes > max
        {
            return Err(LimitExceeded::Bytes { actual: bytes, max });
        }
        Ok(())
    }
}

/// Which bound an image exceeded, with the offending value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitExceeded {
    /// Width over [`ResourceLimits::max_width`].
    Width {
        /// Requested width.
        actual: u16,
        /// Configured bound.
        max: u16,
    },
    /// Height over [`ResourceLimits::max_height`].
    Height {
        /// Requested height.
        actual: u16,
        /// Configured bound.
        max: u16,
    },
    /// Pixel count over [`ResourceLimits::max_pixels`].
    Pixels {
        /// `width * height`.
        actual: u64,
        /// Configured bound.
        max: u64,
    },
    /// Storage over [`ResourceLimits::max_bytes`].
    Bytes {
        /// Annotated image size.
        actual: usize,
        /// Configured bound.
        max: usize,
    },
}

impl core::fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Width { actual, max } => write!(f, "width {actual} exceeds limit {max}"),
            Self::Height { actual, max } => write!(f, "height {actual} exceeds limit {max}"),
            Self::Pixels { actual, max } => write!(f, "{actual} pixels exceed limit {max}"),
            Self::Bytes { actual, max } => {
                write!(f, "{actual} bytes of pixel storage exceed limit {max}")
            }
        }
    }
}

impl core::error::Error for LimitExceeded {}
