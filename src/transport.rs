//! Image requests against a display server connection.
//!
//! The connection itself lives outside this crate behind [`Transport`].
//! The functions here shape descriptors into requests and replies into
//! descriptors: [`get_image`], [`put_image`], and the shared-memory
//! variants [`shm_put_image`] and [`shm_get_image`].

use alloc::vec::Vec;
use core::fmt;

use crate::error::ImageError;
use crate::format::{PixelFamily, PlanarKind, low_mask};
use crate::image::Image;
use crate::native::ServerSetup;

/// Drawable (window or pixmap) id.
pub type Drawable = u32;
/// Graphics context id.
pub type GContext = u32;
/// Shared memory segment id.
pub type ShmSeg = u32;

/// Rectangle of a drawable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    /// Left edge.
    pub x: i16,
    /// Top edge.
    pub y: i16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl Region {
    /// Rectangle at `(x, y)` of `width` by `height`.
    pub const fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Pixels returned by the server for a get-image request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReply {
    /// Depth of the drawable.
    pub depth: u8,
    /// Pixel bytes in the server's native layout. For planar requests only
    /// the requested planes are present.
    pub data: Vec<u8>,
}

/// A put-image request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PutImageRequest<'d> {
    /// Layout family of `data`.
    pub family: PixelFamily,
    /// Image width in pixels.
    pub width: u16,
    /// Image height in pixels.
    pub height: u16,
    /// Destination x in the drawable.
    pub dst_x: i16,
    /// Destination y in the drawable.
    pub dst_y: i16,
    /// Leading pixels of each scanline to skip (planar images only).
    pub left_pad: u8,
    /// Image depth.
    pub depth: u8,
    /// Pixel bytes in the image's layout.
    pub data: &'d [u8],
}

/// A shared-memory put-image request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShmPutImageRequest {
    /// Full image width in the segment.
    pub total_width: u16,
    /// Full image height in the segment.
    pub total_height: u16,
    /// Part of the image to draw.
    pub src: Region,
    /// Destination x in the drawable.
    pub dst_x: i16,
    /// Destination y in the drawable.
    pub dst_y: i16,
    /// Image depth.
    pub depth: u8,
    /// Layout family of the segment data.
    pub family: PixelFamily,
    /// Ask the server for a completion event.
    pub send_event: bool,
    /// Segment holding the image.
    pub segment: ShmSeg,
    /// Byte offset of the image data in the segment.
    pub offset: usize,
}

/// A shared-memory get-image request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShmGetImageRequest {
    /// Drawable area to read.
    pub region: Region,
    /// Planes to return.
    pub plane_mask: u32,
    /// Layout family to write.
    pub family: PixelFamily,
    /// Segment the server writes into.
    pub segment: ShmSeg,
    /// Byte offset the server writes to.
    pub offset: usize,
}

/// A display server connection.
///
/// Implementations send each request and, where one exists, wait for its
/// reply.
pub trait Transport {
    /// Connection-level failure.
    type Error: core::error::Error;

    /// Layout information announced at connection setup.
    fn setup(&self) -> &ServerSetup;

    /// Fetch a region of a drawable.
    fn get_image(
        &mut self,
        drawable: Drawable,
        region: Region,
        family: PixelFamily,
        plane_mask: u32,
    ) -> Result<ImageReply, Self::Error>;

    /// Draw pixels into a drawable.
    fn put_image(
        &mut self,
        drawable: Drawable,
        gc: GContext,
        request: PutImageRequest<'_>,
    ) -> Result<(), Self::Error>;

    /// Draw pixels from a shared memory segment.
    fn shm_put_image(
        &mut self,
        drawable: Drawable,
        gc: GContext,
        request: ShmPutImageRequest,
    ) -> Result<(), Self::Error>;

    /// Have the server write a drawable region into a shared memory segment.
    fn shm_get_image(
        &mut self,
        drawable: Drawable,
        request: ShmGetImageRequest,
    ) -> Result<(), Self::Error>;
}

/// Error from a request: either the image or the connection.
#[derive(Debug)]
pub enum RequestError<E> {
    /// The image could not be built, shaped or sent.
    Image(ImageError),
    /// The transport failed.
    Transport(E),
}

impl<E: fmt::Display> fmt::Display for RequestError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(e) => write!(f, "image error: {e}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl<E: core::error::Error + 'static> core::error::Error for RequestError<E> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Image(e) => Some(e),
            Self::Transport(e) => Some(e),
        }
    }
}

impl<E> From<ImageError> for RequestError<E> {
    fn from(e: ImageError) -> Self {
        Self::Image(e)
    }
}

/// Fetch a region of `drawable` as an image in the server's native layout.
///
/// For planar requests with a partial `plane_mask`, the reply carries only
/// the selected planes; they are placed into a full image whose other
/// planes are zero and whose plane mask records the selection.
///
/// # Errors
///
/// - [`ImageError::UnsupportedFormat`] for XY bitmap requests.
/// - [`ImageError::NoNativeFormat`] if the server has no format for the
///   reply depth.
/// - [`ImageError::BufferTooSmall`] if the reply is shorter than the image.
pub fn get_image<T: Transport>(
    transport: &mut T,
    drawable: Drawable,
    region: Region,
    family: PixelFamily,
    plane_mask: u32,
) -> Result<Image<'static>, RequestError<T::Error>> {
    if family == PixelFamily::Planar(PlanarKind::Bitmap) {
        return Err(ImageError::UnsupportedFormat { code: family.wire() }.into());
    }
    let reply = transport
        .get_image(drawable, region, family, plane_mask)
        .map_err(RequestError::Transport)?;
    let len = reply.data.len();
    image_from_reply(transport.setup(), region, family, plane_mask, reply).map_err(|e| {
        log::warn!("dropping {len} byte get-image reply: {e}");
        RequestError::Image(e)
    })
}

fn image_from_reply(
    setup: &ServerSetup,
    region: Region,
    family: PixelFamily,
    plane_mask: u32,
    reply: ImageReply,
) -> Result<Image<'static>, ImageError> {
    let params = setup.native_params(region.width, region.height, family, reply.depth)?;
    let full = low_mask(reply.depth);
    let plane_mask = plane_mask & full;
    let mut image = Image::geometry_only(params)?;

    if !image.layout().is_planar() || plane_mask == full || image.size() == 0 {
        if reply.data.len() < image.size() {
            return Err(ImageError::BufferTooSmall {
                actual: reply.data.len(),
                required: image.size(),
            });
        }
        return Image::from_vec(params, reply.data);
    }

    let plane_size = image.layout().plane_size();
    let required = plane_mask.count_ones() as usize * plane_size;
    if reply.data.len() < required {
        return Err(ImageError::BufferTooSmall {
            actual: reply.data.len(),
            required,
        });
    }
    image.allocate()?;
    let layout = *image.layout();
    let mut chunks = reply.data.chunks_exact(plane_size);
    for plane in 0..reply.depth {
        if plane_mask & (1 << layout.plane_value_bit(plane)) == 0 {
            continue;
        }
        if let Some(chunk) = chunks.next() {
            let start = plane as usize * plane_size;
            image.data_mut()[start..start + plane_size].copy_from_slice(chunk);
        }
    }
    image.set_plane_mask(plane_mask);
    Ok(image)
}

/// Draw `image` into `drawable` at `(x, y)`.
///
/// # Errors
///
/// [`ImageError::Unallocated`] for geometry-only images, or the transport
/// failure.
pub fn put_image<T: Transport>(
    transport: &mut T,
    drawable: Drawable,
    gc: GContext,
    image: &Image<'_>,
    x: i16,
    y: i16,
    left_pad: u8,
) -> Result<(), RequestError<T::Error>> {
    if !image.is_allocated() {
        return Err(ImageError::Unallocated.into());
    }
    let request = PutImageRequest {
        family: image.family(),
        width: image.width(),
        height: image.height(),
        dst_x: x,
        dst_y: y,
        left_pad,
        depth: image.depth(),
        data: image.data(),
    };
    transport
        .put_image(drawable, gc, request)
        .map_err(RequestError::Transport)
}

/// A shared memory segment attached by both client and server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShmSegment {
    /// Server-side segment id.
    pub id: ShmSeg,
    base: usize,
    len: usize,
}

impl ShmSegment {
    /// Segment `id` mapped at `memory` in this process.
    pub fn new(id: ShmSeg, memory: &[u8]) -> Self {
        Self {
            id,
            base: memory.as_ptr() as usize,
            len: memory.len(),
        }
    }

    /// Segment length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the segment is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of `image`'s pixel data from the start of the segment.
    ///
    /// # Errors
    ///
    /// - [`ImageError::Unallocated`] for geometry-only images.
    /// - [`ImageError::OutsideSegment`] unless all `size()` bytes lie inside
    ///   the segment.
    pub fn offset_of(&self, image: &Image<'_>) -> Result<usize, ImageError> {
        if !image.is_allocated() {
            return Err(ImageError::Unallocated);
        }
        let offset = (image.data().as_ptr() as usize)
            .checked_sub(self.base)
            .ok_or(ImageError::OutsideSegment)?;
        match offset.checked_add(image.size()) {
            Some(end) if end <= self.len => Ok(offset),
            _ => Err(ImageError::OutsideSegment),
        }
    }
}

/// Draw part of `image` from shared memory.
///
/// The image must already be in the server's native layout; it is never
/// converted here.
///
/// # Errors
///
/// - [`ImageError::NotNative`] / [`ImageError::NoNativeFormat`] if the
///   image is not native.
/// - [`ImageError::OutsideSegment`] if the image data is not in `segment`.
#[allow(clippy::too_many_arguments)]
pub fn shm_put_image<T: Transport>(
    transport: &mut T,
    drawable: Drawable,
    gc: GContext,
    image: &Image<'_>,
    segment: &ShmSegment,
    src: Region,
    dst_x: i16,
    dst_y: i16,
    send_event: bool,
) -> Result<(), RequestError<T::Error>> {
    if !transport.setup().is_native(image)? {
        return Err(ImageError::NotNative.into());
    }
    let request = ShmPutImageRequest {
        total_width: image.width(),
        total_height: image.height(),
        src,
        dst_x,
        dst_y,
        depth: image.depth(),
        family: image.family(),
        send_event,
        segment: segment.id,
        offset: segment.offset_of(image)?,
    };
    transport
        .shm_put_image(drawable, gc, request)
        .map_err(RequestError::Transport)
}

/// Have the server write the region of `drawable` at `(x, y)`, sized like
/// `image`, into the image's shared memory.
///
/// # Errors
///
/// - [`ImageError::OutsideSegment`] if the image data is not in `segment`.
/// - The transport failure.
pub fn shm_get_image<T: Transport>(
    transport: &mut T,
    drawable: Drawable,
    image: &mut Image<'_>,
    segment: &ShmSegment,
    x: i16,
    y: i16,
    plane_mask: u32,
) -> Result<(), RequestError<T::Error>> {
    let request = ShmGetImageRequest {
        region: Region::new(x, y, image.width(), image.height()),
        plane_mask,
        family: image.family(),
        segment: segment.id,
        offset: segment.offset_of(image)?,
    };
    transport
        .shm_get_image(drawable, request)
        .map_err(RequestError::Transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ImageParams;
    use crate::image::Backing;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn segment_offsets() {
        let mut memory = vec![0u8; 64];
        let segment = ShmSegment::new(7, &memory);
        assert_eq!(segment.len(), 64);
        let params = ImageParams::packed(4, 2, 8, 8);
        let image = Image::create(params, Backing::Borrowed(&mut memory[16..24])).unwrap();
        assert_eq!(segment.offset_of(&image), Ok(16));
    }

    #[test]
    fn data_outside_segment() {
        let mut memory = vec![0u8; 64];
        let segment = ShmSegment::new(7, &memory[..20]);
        let params = ImageParams::packed(4, 2, 8, 8);
        let image = Image::from_slice(params, &mut memory[16..24]).unwrap();
        assert_eq!(segment.offset_of(&image), Err(ImageError::OutsideSegment));

        let elsewhere = Image::new(params).unwrap();
        assert_eq!(segment.offset_of(&elsewhere), Err(ImageError::OutsideSegment));

        let bare = Image::geometry_only(params).unwrap();
        assert_eq!(segment.offset_of(&bare), Err(ImageError::Unallocated));
    }

    #[test]
    fn request_error_display() {
        let e: RequestError<ImageError> = ImageError::NotNative.into();
        assert_eq!(
            e.to_string(),
            "image error: image is not in the server's native format"
        );
        let e = RequestError::Transport(ImageError::Unallocated);
        assert_eq!(e.to_string(), "transport error: image has no pixel storage");
    }
}
