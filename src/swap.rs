//! Byte permutation tables and the scanline swap primitive.
//!
//! Every permutation here is self-inverse: applying it twice yields the
//! identity. Converting A to B and B back to A therefore uses the same
//! table in both directions.

use crate::format::ImageOrder;

/// Storage unit size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UnitClass {
    /// 8-bit units.
    U8 = 0,
    /// 16-bit units.
    U16 = 1,
    /// 32-bit units.
    U32 = 2,
}

impl UnitClass {
    /// Class for an exact unit size in bits.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(Self::U8),
            16 => Some(Self::U16),
            32 => Some(Self::U32),
            _ => None,
        }
    }

    /// Largest class that fits in `bits`.
    pub const fn fitting(bits: u8) -> Self {
        match bits {
            0..=15 => Self::U8,
            16..=31 => Self::U16,
            _ => Self::U32,
        }
    }

    /// Bytes per unit.
    #[inline]
    pub const fn bytes(self) -> usize {
        1 << self as usize
    }

    /// Class whose byte positions match this unit stored in `order`.
    ///
    /// LSB-first units keep bytes in address order, exactly like 8-bit
    /// units, so only MSB-first units keep their size.
    #[inline]
    pub const fn ordered(self, order: ImageOrder) -> Self {
        match order {
            ImageOrder::LsbFirst => Self::U8,
            ImageOrder::MsbFirst => self,
        }
    }

    /// XOR applied to a logical byte index to find its address inside a
    /// unit stored in `order`.
    #[inline]
    pub const fn swap_mask(self, order: ImageOrder) -> usize {
        self.ordered(order).bytes() - 1
    }
}

/// Byte permutation over a group of bytes.
pub type Permutation = [u8; 4];

const FORWARD: Permutation = [0, 1, 2, 3];
const PAIR_SWAP: Permutation = [1, 0, 3, 2];
const WORD_SWAP: Permutation = [2, 3, 0, 1];
const REVERSE: Permutation = [3, 2, 1, 0];

/// Permutation from a source unit to a destination unit, indexed by the
/// [`UnitClass::ordered`] class of each side.
///
/// ```text
///            dst 8      dst 16     dst 32
/// src 8    FORWARD    PAIR_SWAP  REVERSE
/// src 16   PAIR_SWAP  FORWARD    WORD_SWAP
/// src 32   REVERSE    WORD_SWAP  FORWARD
/// ```
pub static UNIT_PERMUTATIONS: [[&Permutation; 3]; 3] = [
    [&FORWARD, &PAIR_SWAP, &REVERSE],
    [&PAIR_SWAP, &FORWARD, &WORD_SWAP],
    [&REVERSE, &WORD_SWAP, &FORWARD],
];

/// Permutation for moving bit-plane scanlines between two unit layouts.
pub fn unit_permutation(
    src: UnitClass,
    src_order: ImageOrder,
    dst: UnitClass,
    dst_order: ImageOrder,
) -> &'static Permutation {
    UNIT_PERMUTATIONS[src.ordered(src_order) as usize][dst.ordered(dst_order) as usize]
}

/// Permutation for `unit_bytes`-wide pixels, reversed iff the orders differ.
///
/// The returned slice has `unit_bytes` entries.
pub fn pixel_permutation(unit_bytes: usize, src: ImageOrder, dst: ImageOrder) -> &'static [u8] {
    let unit_bytes = unit_bytes.clamp(1, 4);
    if src == dst {
        &FORWARD[..unit_bytes]
    } else {
        &REVERSE[4 - unit_bytes..]
    }
}

/// Reverse the low `bits` bits of `value`.
#[inline]
pub const fn bit_reverse(value: u32, bits: u8) -> u32 {
    if bits == 0 {
        0
    } else {
        value.reverse_bits() >> (32 - bits as u32)
    }
}

/// Copy one scanline through `perm`.
///
/// Source bytes are walked in groups of `perm.len()`; byte `i` of a group
/// lands at `perm[i]` of the same group in `dst`. Destinations at or past
/// the end of `dst` are dropped.
pub fn swap_scanline(src: &[u8], dst: &mut [u8], perm: &[u8], bitswap: bool, nibbleswap: bool) {
    let group = perm.len().max(1);
    for (s, &byte) in src.iter().enumerate() {
        let minor = s % group;
        let d = s - minor + perm.get(minor).map_or(minor, |&p| p as usize);
        let Some(slot) = dst.get_mut(d) else {
            continue;
        };
        let mut b = byte;
        if bitswap {
            b = b.reverse_bits();
        }
        if nibbleswap {
            b = b.rotate_left(4);
        }
        *slot = b;
    }
}
