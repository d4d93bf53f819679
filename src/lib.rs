//! Pixel-buffer descriptors and wire pixel format conversion for X11-style
//! display servers.
//!
//! This crate moves raster images between an application's pixel layout
//! and the encodings a display server speaks on the wire:
//!
//! - [`ImageParams`] / [`validate`]: layout parameters and the rules that
//!   decide which combinations are legal
//! - [`Image`]: a validated descriptor owning, borrowing, or deferring its
//!   pixel storage
//! - [`Image::get_pixel`] / [`Image::put_pixel`]: single-pixel access for
//!   every family, depth and order
//! - [`convert()`]: bulk conversion between layouts, with byte-permutation
//!   fast paths and a per-pixel fallback
//! - [`ServerSetup`]: the server's native layouts
//! - [`Transport`] and [`get_image`] / [`put_image`]: requests against a
//!   connection implemented elsewhere
//! - [`ResourceLimits`]: caps on image size
//!
//! ```
//! use xcbimage::{Image, ImageOrder, ImageParams};
//!
//! let params = ImageParams::packed(4, 1, 16, 16).with_scanline_pad(16);
//! let mut little = Image::new(params).unwrap();
//! little.put_pixel(0, 0, 0x1234);
//! assert_eq!(&little.data()[..2], &[0x34, 0x12]);
//!
//! let big = little
//!     .converted(params.with_byte_order(ImageOrder::MsbFirst))
//!     .unwrap();
//! assert_eq!(&big.data()[..2], &[0x12, 0x34]);
//! assert_eq!(big.get_pixel(0, 0), 0x1234);
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod convert;
mod error;
mod format;
mod image;
mod limits;
mod native;
mod pixel;
pub mod swap;
mod transport;

pub use convert::{Conversion, convert, plan};
pub use error::ImageError;
pub use format::{ImageOrder, ImageParams, PixelFamily, PlanarKind, default_unit, validate};
pub use image::{Backing, Image, Layout, Ownership};
pub use limits::{LimitExceeded, ResourceLimits};
pub use native::{Native, PixmapFormat, ServerSetup};
pub use transport::{
    Drawable, GContext, ImageReply, PutImageRequest, Region, RequestError, ShmGetImageRequest,
    ShmPutImageRequest, ShmSeg, ShmSegment, Transport, get_image, put_image, shm_get_image,
    shm_put_image,
};
