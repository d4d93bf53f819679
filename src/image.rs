//! Image descriptors and their storage.
//!
//! An [`Image`] pairs validated [`ImageParams`] with the values derived
//! from them (stride, size, plane mask) and exactly one storage state.

use alloc::vec::Vec;
use core::fmt;

use crate::error::ImageError;
use crate::format::{ImageOrder, ImageParams, PixelFamily, low_mask};
use crate::limits::ResourceLimits;
use crate::swap::UnitClass;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Validated parameters plus the values derived from them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    params: ImageParams,
    stride: usize,
    size: usize,
    plane_mask: u32,
}

impl Layout {
    /// Validate `params` and derive stride, size and plane mask.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidFormat`] if the combination is illegal.
    pub fn new(params: ImageParams) -> Result<Self, ImageError> {
        let params = params.resolved();
        if !params.validate() {
            return Err(params.invalid());
        }
        let mut layout = Self {
            params,
            stride: 0,
            size: 0,
            plane_mask: 0,
        };
        layout.annotate();
        Ok(layout)
    }

    /// Recompute stride, size and plane mask from the parameters.
    pub fn annotate(&mut self) {
        self.stride = self.params.stride();
        self.size = self.params.size();
        self.plane_mask = self.params.plane_mask();
    }

    /// Layout parameters, with the storage unit resolved.
    #[inline]
    pub fn params(&self) -> &ImageParams {
        &self.params
    }

    /// Bytes per scanline (per plane for planar images).
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total bytes of pixel storage.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Planes that carry data.
    #[inline]
    pub fn plane_mask(&self) -> u32 {
        self.plane_mask
    }

    /// Bytes occupied by one plane of a planar image.
    #[inline]
    pub fn plane_size(&self) -> usize {
        self.stride * self.params.height as usize
    }

    /// Whether pixels are stored as bit-planes.
    #[inline]
    pub fn is_planar(&self) -> bool {
        self.params.is_planar()
    }

    /// Number of plane blocks in storage.
    #[inline]
    pub(crate) fn planes(&self) -> usize {
        if self.is_planar() {
            self.params.depth as usize
        } else {
            1
        }
    }

    /// Unit class bytes are swapped in within a bit-plane scanline.
    ///
    /// Clamped to the scanline pad so a unit never straddles two scanlines.
    #[inline]
    pub(crate) fn swap_class(&self) -> UnitClass {
        UnitClass::fitting(self.params.unit.min(self.params.scanline_pad))
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Who owns an image's pixel bytes.
pub(crate) enum Storage<'a> {
    /// Geometry-only descriptor; the caller allocates later.
    Unallocated,
    /// Caller-owned bytes, never freed by the image.
    Borrowed(&'a mut [u8]),
    /// Bytes allocated by or handed over to the image.
    Owned(Vec<u8>),
}

impl Storage<'_> {
    fn bytes(&self) -> &[u8] {
        match self {
            Self::Unallocated => &[],
            Self::Borrowed(data) => &data[..],
            Self::Owned(data) => data.as_slice(),
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Unallocated => &mut [],
            Self::Borrowed(data) => &mut data[..],
            Self::Owned(data) => data.as_mut_slice(),
        }
    }

    /// Ownership state.
    pub fn ownership(&self) -> Ownership {
        match self {
            Self::Unallocated => Ownership::Unallocated,
            Self::Borrowed(_) => Ownership::BorrowedView,
            Self::Owned(_) => Ownership::OwnedAllocation,
        }
    }
}

/// Ownership state of an image's storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// No storage yet.
    Unallocated,
    /// Caller-owned storage.
    BorrowedView,
    /// Storage released when the image is destroyed.
    OwnedAllocation,
}

/// Where a new image's pixel bytes come from.
pub enum Backing<'a> {
    /// No storage; build a geometry-only descriptor.
    Deferred,
    /// Use caller-owned bytes as-is.
    Borrowed(&'a mut [u8]),
    /// Take ownership of a vector. An empty vector is grown to the image
    /// size.
    Owned(Vec<u8>),
    /// Allocate zeroed storage.
    Allocate,
}

fn alloc_zeroed(mut data: Vec<u8>, size: usize) -> Result<Vec<u8>, ImageError> {
    data.try_reserve_exact(size.saturating_sub(data.len()))
        .map_err(|_| ImageError::AllocationFailure { bytes: size })?;
    data.resize(size, 0);
    Ok(data)
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// Image descriptor: layout plus pixel storage.
///
/// Built only through the validated constructors. Dropping the image (or
/// calling [`destroy`](Self::destroy)) releases owned storage and leaves
/// borrowed storage untouched.
pub struct Image<'a> {
    pub(crate) layout: Layout,
    pub(crate) storage: Storage<'a>,
}

impl<'a> Image<'a> {
    /// Create an image, validating the format and resolving its storage.
    ///
    /// # Errors
    ///
    /// - [`ImageError::InvalidFormat`] if the format combination is illegal.
    /// - [`ImageError::BufferTooSmall`] if provided storage is below the
    ///   computed size.
    /// - [`ImageError::AllocationFailure`] if storage cannot be allocated.
    pub fn create(params: ImageParams, backing: Backing<'a>) -> Result<Self, ImageError> {
        Self::with_layout(Layout::new(params)?, backing)
    }

    /// Resolve storage for an already validated layout.
    fn with_layout(layout: Layout, backing: Backing<'a>) -> Result<Self, ImageError> {
        let size = layout.size;
        let storage = match backing {
            Backing::Deferred => Storage::Unallocated,
            Backing::Borrowed(data) => {
                if data.len() < size {
                    return Err(ImageError::BufferTooSmall {
                        actual: data.len(),
                        required: size,
                    });
                }
                Storage::Borrowed(data)
            }
            Backing::Owned(data) if data.is_empty() => Storage::Owned(alloc_zeroed(data, size)?),
            Backing::Owned(data) => {
                if data.len() < size {
                    return Err(ImageError::BufferTooSmall {
                        actual: data.len(),
                        required: size,
                    });
                }
                Storage::Owned(data)
            }
            Backing::Allocate => Storage::Owned(alloc_zeroed(Vec::new(), size)?),
        };
        log::trace!(
            "created {}x{} {:?} image: depth {}, bpp {}, {} bytes, {:?}",
            layout.params.width,
            layout.params.height,
            layout.params.family,
            layout.params.depth,
            layout.params.bpp,
            size,
            storage.ownership()
        );
        Ok(Self { layout, storage })
    }

    /// [`create`](Self::create), rejecting images that exceed `limits`
    /// before any storage is touched.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create), plus [`ImageError::LimitExceeded`].
    pub fn create_limited(
        params: ImageParams,
        backing: Backing<'a>,
        limits: &ResourceLimits,
    ) -> Result<Self, ImageError> {
        let layout = Layout::new(params)?;
        limits.check(layout.params())?;
        Self::with_layout(layout, backing)
    }

    /// Wrap caller-owned bytes.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create).
    pub fn from_slice(params: ImageParams, data: &'a mut [u8]) -> Result<Self, ImageError> {
        Self::create(params, Backing::Borrowed(data))
    }

    /// Wrap application bitmap bytes: XY bitmap, unit 8, pad 8, LSB-first
    /// byte and bit order.
    ///
    /// # Errors
    ///
    /// [`ImageError::BufferTooSmall`] if `data` is shorter than
    /// `ceil(width / 8) * height`.
    pub fn from_bitmap_data(width: u16, height: u16, data: &'a mut [u8]) -> Result<Self, ImageError> {
        let params = ImageParams::bitmap(width, height)
            .with_unit(8)
            .with_scanline_pad(8)
            .with_byte_order(ImageOrder::LsbFirst)
            .with_bit_order(ImageOrder::LsbFirst);
        Self::from_slice(params, data)
    }

    /// Layout of this image.
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Layout parameters, with the storage unit resolved.
    #[inline]
    pub fn params(&self) -> &ImageParams {
        &self.layout.params
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u16 {
        self.layout.params.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u16 {
        self.layout.params.height
    }

    /// Layout family.
    #[inline]
    pub fn family(&self) -> PixelFamily {
        self.layout.params.family
    }

    /// Meaningful bits per pixel.
    #[inline]
    pub fn depth(&self) -> u8 {
        self.layout.params.depth
    }

    /// Bits per pixel slot.
    #[inline]
    pub fn bpp(&self) -> u8 {
        self.layout.params.bpp
    }

    /// Storage unit in bits.
    #[inline]
    pub fn unit(&self) -> u8 {
        self.layout.params.unit
    }

    /// Scanline pad in bits.
    #[inline]
    pub fn scanline_pad(&self) -> u8 {
        self.layout.params.scanline_pad
    }

    /// Byte order.
    #[inline]
    pub fn byte_order(&self) -> ImageOrder {
        self.layout.params.byte_order
    }

    /// Bit order.
    #[inline]
    pub fn bit_order(&self) -> ImageOrder {
        self.layout.params.bit_order
    }

    /// Bytes per scanline (per plane for planar images).
    #[inline]
    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    /// Total bytes of pixel storage.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size
    }

    /// Planes that carry data (0 for packed images).
    #[inline]
    pub fn plane_mask(&self) -> u32 {
        self.layout.plane_mask
    }

    /// Restrict which planes carry data. Bits above `depth` are dropped;
    /// packed images ignore the mask.
    pub fn set_plane_mask(&mut self, mask: u32) {
        if self.layout.is_planar() {
            self.layout.plane_mask = mask & low_mask(self.depth());
        }
    }

    /// Recompute stride, size and plane mask. Idempotent.
    pub fn annotate(&mut self) {
        self.layout.annotate();
    }

    /// Replace the layout parameters, keeping the storage.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidFormat`] or [`ImageError::BufferTooSmall`];
    /// the image is unchanged on error.
    pub fn reshape(&mut self, params: ImageParams) -> Result<(), ImageError> {
        let layout = Layout::new(params)?;
        if self.is_allocated() && self.storage.bytes().len() < layout.size {
            return Err(ImageError::BufferTooSmall {
                actual: self.storage.bytes().len(),
                required: layout.size,
            });
        }
        self.layout = layout;
        Ok(())
    }

    /// Ownership state of the storage.
    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.storage.ownership()
    }

    /// Whether the image has pixel storage.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        !matches!(self.storage, Storage::Unallocated)
    }

    /// Pixel bytes (`size()` long; empty when unallocated).
    pub fn data(&self) -> &[u8] {
        let bytes = self.storage.bytes();
        &bytes[..self.layout.size.min(bytes.len())]
    }

    /// Mutable pixel bytes (`size()` long; empty when unallocated).
    pub fn data_mut(&mut self) -> &mut [u8] {
        let size = self.layout.size;
        let bytes = self.storage.bytes_mut();
        let len = size.min(bytes.len());
        &mut bytes[..len]
    }

    /// Bytes of scanline `y` in `plane` (always plane 0 for packed images).
    ///
    /// # Panics
    ///
    /// Panics if `plane` or `y` is out of range, or the image is
    /// unallocated.
    pub fn row(&self, plane: usize, y: u16) -> &[u8] {
        assert!(
            plane < self.layout.planes() && y < self.height(),
            "row {y} of plane {plane} out of bounds ({} rows, {} planes)",
            self.height(),
            self.layout.planes()
        );
        let start = plane * self.layout.plane_size() + y as usize * self.layout.stride;
        &self.data()[start..start + self.layout.stride]
    }

    /// Release storage and the descriptor.
    ///
    /// Owned storage is freed; borrowed storage is left untouched.
    pub fn destroy(self) {
        log::trace!(
            "destroying {}x{} image ({:?})",
            self.width(),
            self.height(),
            self.ownership()
        );
        drop(self);
    }

    /// Consume the image, returning owned storage instead of freeing it.
    pub fn into_storage(self) -> Option<Vec<u8>> {
        match self.storage {
            Storage::Owned(data) => Some(data),
            Storage::Unallocated | Storage::Borrowed(_) => None,
        }
    }
}

impl Image<'static> {
    /// Create an image with freshly allocated, zeroed storage.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidFormat`] or [`ImageError::AllocationFailure`].
    pub fn new(params: ImageParams) -> Result<Self, ImageError> {
        Self::create(params, Backing::Allocate)
    }

    /// Geometry-only descriptor; storage is attached later with
    /// [`allocate`](Self::allocate) or managed by the caller.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidFormat`].
    pub fn geometry_only(params: ImageParams) -> Result<Self, ImageError> {
        Self::create(params, Backing::Deferred)
    }

    /// Take ownership of `data`. An empty vector is grown to the image size.
    ///
    /// # Errors
    ///
    /// As [`create`](Image::create).
    pub fn from_vec(params: ImageParams, data: Vec<u8>) -> Result<Self, ImageError> {
        Self::create(params, Backing::Owned(data))
    }

    /// Give a geometry-only image zeroed owned storage. No-op if storage
    /// is already present.
    ///
    /// # Errors
    ///
    /// [`ImageError::AllocationFailure`].
    pub fn allocate(&mut self) -> Result<(), ImageError> {
        if matches!(self.storage, Storage::Unallocated) {
            self.storage = Storage::Owned(alloc_zeroed(Vec::new(), self.layout.size)?);
        }
        Ok(())
    }
}

impl fmt::Debug for Image<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image({}x{}, {:?} depth {}/bpp {}, {:?})",
            self.width(),
            self.height(),
            self.family(),
            self.depth(),
            self.bpp(),
            self.ownership()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;

    #[test]
    fn packed_example() {
        let params = ImageParams::packed(8, 1, 8, 8).with_unit(8).with_scanline_pad(8);
        let image = Image::new(params).unwrap();
        assert_eq!(image.size(), 8);
        assert_eq!(image.stride(), 8);
        assert_eq!(image.plane_mask(), 0);
        assert_eq!(image.ownership(), Ownership::OwnedAllocation);
        assert_eq!(image.data(), &[0u8; 8]);
    }

    #[test]
    fn planar_example() {
        let params = ImageParams::bitmap(16, 1).with_unit(32).with_scanline_pad(32);
        let image = Image::new(params).unwrap();
        assert_eq!(image.stride(), 4);
        assert_eq!(image.size(), 4);
        assert_eq!(image.plane_mask(), 1);
    }

    #[test]
    fn unit_default_is_applied() {
        let image = Image::geometry_only(ImageParams::planar(4, 4, 4).with_scanline_pad(8)).unwrap();
        assert_eq!(image.unit(), 32);
        let image = Image::geometry_only(ImageParams::packed(4, 4, 4, 4).with_scanline_pad(8)).unwrap();
        assert_eq!(image.unit(), 8);
    }

    #[test]
    fn invalid_format_is_rejected() {
        let params = ImageParams::packed(4, 4, 12, 12).with_scanline_pad(8);
        let err = Image::new(params).unwrap_err();
        assert_eq!(
            err,
            ImageError::InvalidFormat {
                family: PixelFamily::Packed,
                depth: 12,
                bpp: 12,
                unit: 12,
                scanline_pad: 8,
            }
        );
    }

    #[test]
    fn geometry_only_has_no_storage() {
        let mut image = Image::geometry_only(ImageParams::packed(4, 2, 8, 8)).unwrap();
        assert_eq!(image.ownership(), Ownership::Unallocated);
        assert!(!image.is_allocated());
        assert!(image.data().is_empty());
        assert_eq!(image.size(), 8);

        image.allocate().unwrap();
        assert_eq!(image.ownership(), Ownership::OwnedAllocation);
        assert_eq!(image.data().len(), 8);
    }

    #[test]
    fn borrowed_too_small() {
        let mut data = [0u8; 7];
        let params = ImageParams::packed(8, 1, 8, 8).with_scanline_pad(8);
        let err = Image::from_slice(params, &mut data).unwrap_err();
        assert_eq!(
            err,
            ImageError::BufferTooSmall {
                actual: 7,
                required: 8
            }
        );
    }

    #[test]
    fn owned_too_small() {
        let params = ImageParams::packed(8, 1, 8, 8).with_scanline_pad(8);
        let err = Image::from_vec(params, vec![0u8; 3]).unwrap_err();
        assert_eq!(
            err,
            ImageError::BufferTooSmall {
                actual: 3,
                required: 8
            }
        );
    }

    #[test]
    fn empty_vec_defaults_to_size() {
        let params = ImageParams::packed(8, 2, 16, 16).with_scanline_pad(16);
        let image = Image::from_vec(params, Vec::with_capacity(4)).unwrap();
        assert_eq!(image.ownership(), Ownership::OwnedAllocation);
        assert_eq!(image.data().len(), 32);
    }

    #[test]
    fn larger_storage_is_accepted() {
        let params = ImageParams::packed(2, 1, 8, 8).with_scanline_pad(8);
        let image = Image::from_vec(params, vec![7u8; 16]).unwrap();
        assert_eq!(image.data(), &[7, 7]);
        assert_eq!(image.into_storage().map(|v| v.len()), Some(16));
    }

    #[test]
    fn destroy_leaves_borrowed_bytes_untouched() {
        let mut sentinel = [0xA5u8; 12];
        {
            let params = ImageParams::packed(4, 1, 8, 8).with_scanline_pad(32);
            let image = Image::from_slice(params, &mut sentinel).unwrap();
            assert_eq!(image.ownership(), Ownership::BorrowedView);
            assert!(image.into_storage().is_none());
        }
        let params = ImageParams::packed(4, 1, 8, 8).with_scanline_pad(32);
        Image::from_slice(params, &mut sentinel).unwrap().destroy();
        assert_eq!(sentinel, [0xA5u8; 12]);
    }

    #[test]
    fn owned_storage_is_returned() {
        let params = ImageParams::packed(4, 1, 8, 8).with_scanline_pad(8);
        let data = vec![1, 2, 3, 4];
        let ptr = data.as_ptr();
        let image = Image::from_vec(params, data).unwrap();
        let data = image.into_storage().unwrap();
        assert_eq!(data.as_ptr(), ptr);
        assert_eq!(data, [1, 2, 3, 4]);
    }

    #[test]
    fn limits_reject_before_allocation() {
        let limits = ResourceLimits::none().with_max_width(100);
        let params = ImageParams::packed(101, 1, 8, 8);
        let err = Image::create_limited(params, Backing::Allocate, &limits).unwrap_err();
        assert!(matches!(err, ImageError::LimitExceeded(_)));
        assert!(Image::create_limited(params.with_size(100, 1), Backing::Allocate, &limits).is_ok());
    }

    #[test]
    fn limited_create_resolves_storage_like_create() {
        let limits = ResourceLimits::none().with_max_bytes(64);
        let params = ImageParams::planar(10, 2, 4).with_scanline_pad(16);

        let limited = Image::create_limited(params, Backing::Allocate, &limits).unwrap();
        let plain = Image::new(params).unwrap();
        assert_eq!(*limited.layout(), *plain.layout());
        assert_eq!(limited.unit(), 32);
        assert_eq!(limited.data().len(), 16);

        let mut short = [0u8; 15];
        let err = Image::create_limited(params, Backing::Borrowed(&mut short), &limits).unwrap_err();
        assert_eq!(
            err,
            ImageError::BufferTooSmall {
                actual: 15,
                required: 16
            }
        );

        let bad = ImageParams::packed(4, 4, 12, 12);
        assert!(matches!(
            Image::create_limited(bad, Backing::Deferred, &limits),
            Err(ImageError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn plane_blocks_tile_the_buffer() {
        let image = Image::new(ImageParams::planar(13, 5, 6).with_scanline_pad(16)).unwrap();
        assert_eq!(image.layout().plane_size() * image.depth() as usize, image.size());
        assert_eq!(image.row(5, 4).len(), image.stride());
    }

    #[test]
    fn plane_mask_is_clamped_to_depth() {
        let mut image = Image::new(ImageParams::planar(4, 4, 4).with_scanline_pad(8)).unwrap();
        image.set_plane_mask(0xff);
        assert_eq!(image.plane_mask(), 0xf);
        image.set_plane_mask(0b0101);
        assert_eq!(image.plane_mask(), 0b0101);
        image.annotate();
        assert_eq!(image.plane_mask(), 0xf);

        let mut packed = Image::new(ImageParams::packed(4, 4, 8, 8)).unwrap();
        packed.set_plane_mask(0xff);
        assert_eq!(packed.plane_mask(), 0);
    }

    #[test]
    fn annotate_is_idempotent() {
        let mut image = Image::new(ImageParams::packed(7, 3, 24, 24)).unwrap();
        let before = *image.layout();
        image.annotate();
        image.annotate();
        assert_eq!(*image.layout(), before);
    }

    #[test]
    fn reshape_checks_storage() {
        let mut image = Image::new(ImageParams::packed(4, 4, 8, 8).with_scanline_pad(8)).unwrap();
        image.reshape(ImageParams::packed(2, 8, 8, 8).with_scanline_pad(8)).unwrap();
        assert_eq!(image.stride(), 2);
        let err = image
            .reshape(ImageParams::packed(4, 4, 16, 16).with_scanline_pad(8))
            .unwrap_err();
        assert!(matches!(err, ImageError::BufferTooSmall { .. }));
        assert_eq!(image.width(), 2);
    }

    #[test]
    fn bitmap_data_layout() {
        let mut bits = [0u8; 4];
        let image = Image::from_bitmap_data(9, 2, &mut bits).unwrap();
        assert_eq!(image.unit(), 8);
        assert_eq!(image.scanline_pad(), 8);
        assert_eq!(image.stride(), 2);
        assert!(Image::from_bitmap_data(9, 2, &mut [0u8; 3]).is_err());
    }

    #[test]
    fn debug_format() {
        let image = Image::geometry_only(ImageParams::packed(3, 2, 24, 32)).unwrap();
        assert_eq!(
            format!("{image:?}"),
            "Image(3x2, Packed depth 24/bpp 32, Unallocated)"
        );
    }
}
