//! Single-pixel access.
//!
//! Reads and writes share one addressing routine, [`Layout::walk_pixel`],
//! which enumerates the bit fields ("lanes") a pixel occupies. A
//! [`Reader`] gathers lanes into a value; a [`Writer`] scatters a value
//! into them. Get and put are exact inverses because both see the same
//! lanes.

use crate::image::{Image, Layout};

/// One bit field of a pixel: `mask` bits at `shift` in byte `offset` hold
/// the value bits starting at `value_shift`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Lane {
    pub offset: usize,
    pub shift: u8,
    pub mask: u8,
    pub value_shift: u8,
}

/// Direction applied to each lane of a pixel.
pub(crate) trait LaneAccess {
    fn lane(&mut self, lane: Lane);
}

pub(crate) struct Reader<'d> {
    data: &'d [u8],
    value: u32,
}

impl LaneAccess for Reader<'_> {
    #[inline]
    fn lane(&mut self, lane: Lane) {
        let bits = (self.data[lane.offset] >> lane.shift) & lane.mask;
        self.value |= u32::from(bits) << lane.value_shift;
    }
}

pub(crate) struct Writer<'d> {
    data: &'d mut [u8],
    value: u32,
}

impl LaneAccess for Writer<'_> {
    #[inline]
    fn lane(&mut self, lane: Lane) {
        let bits = (self.value >> lane.value_shift) as u8 & lane.mask;
        let byte = &mut self.data[lane.offset];
        *byte = (*byte & !(lane.mask << lane.shift)) | (bits << lane.shift);
    }
}

impl Layout {
    /// Value bit carried by bit-plane `plane`.
    ///
    /// MSB-first images store the most significant plane first.
    #[inline]
    pub(crate) fn plane_value_bit(&self, plane: u8) -> u8 {
        if self.params().bit_order.is_msb() {
            self.params().depth - 1 - plane
        } else {
            plane
        }
    }

    /// Enumerate the lanes of pixel `(x, y)`. Masked-out planes are skipped.
    pub(crate) fn walk_pixel(&self, x: u16, y: u16, access: &mut impl LaneAccess) {
        let params = self.params();
        let x = x as usize;
        let row = y as usize * self.stride();
        let msb_bytes = params.byte_order.is_msb();

        if self.is_planar() {
            let swap = self.swap_class().swap_mask(params.byte_order);
            let byte = row + ((x >> 3) ^ swap);
            let shift = if params.bit_order.is_msb() {
                7 - (x & 7) as u8
            } else {
                (x & 7) as u8
            };
            for plane in 0..params.depth {
                let bit = self.plane_value_bit(plane);
                if self.plane_mask() & (1 << bit) == 0 {
                    continue;
                }
                access.lane(Lane {
                    offset: plane as usize * self.plane_size() + byte,
                    shift,
                    mask: 1,
                    value_shift: bit,
                });
            }
            return;
        }

        if params.bpp == 4 {
            let high = (x & 1 == 1) != msb_bytes;
            access.lane(Lane {
                offset: row + (x >> 1),
                shift: if high { 4 } else { 0 },
                mask: 0xf,
                value_shift: 0,
            });
            return;
        }

        let n = (params.bpp >> 3) as usize;
        let base = row + x * n;
        for i in 0..n {
            let significance = if msb_bytes { n - 1 - i } else { i };
            access.lane(Lane {
                offset: base + i,
                shift: 0,
                mask: 0xff,
                value_shift: (significance * 8) as u8,
            });
        }
    }
}

impl Image<'_> {
    #[inline]
    fn check_bounds(&self, x: u16, y: u16) {
        assert!(
            x < self.width() && y < self.height(),
            "pixel ({x}, {y}) out of bounds for {}x{} image",
            self.width(),
            self.height()
        );
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// Planes excluded by the plane mask read as 0.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width`, `y >= height`, or the image is unallocated.
    pub fn get_pixel(&self, x: u16, y: u16) -> u32 {
        self.check_bounds(x, y);
        let mut reader = Reader {
            data: self.data(),
            value: 0,
        };
        self.layout.walk_pixel(x, y, &mut reader);
        reader.value
    }

    /// Write the pixel at `(x, y)`.
    ///
    /// Packed images store `value mod 2^bpp`; planar images store the low
    /// `depth` bits, skipping planes excluded by the plane mask.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width`, `y >= height`, or the image is unallocated.
    pub fn put_pixel(&mut self, x: u16, y: u16, value: u32) {
        self.check_bounds(x, y);
        let layout = self.layout;
        let mut writer = Writer {
            data: self.data_mut(),
            value,
        };
        layout.walk_pixel(x, y, &mut writer);
    }

    /// Write the pixel at `(x, y)` if it lies inside the image.
    ///
    /// Returns whether anything was written.
    pub fn try_put_pixel(&mut self, x: u16, y: u16, value: u32) -> bool {
        if x >= self.width() || y >= self.height() || !self.is_allocated() {
            return false;
        }
        self.put_pixel(x, y, value);
        true
    }

    /// Set every pixel to `value`.
    pub fn fill(&mut self, value: u32) {
        if !self.is_allocated() {
            return;
        }
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.put_pixel(x, y, value);
            }
        }
    }
}
