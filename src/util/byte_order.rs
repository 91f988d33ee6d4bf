//! Byte order normalization for binary payloads.
//!
//! Binary mesh payloads are stored in a fixed wire order. The functions here
//! swap contiguous runs of [`Component`] values between host order and a
//! given wire order, which is passed around as a plain [`Endianness`] value.

use std::io::{Read, Write};

use super::Component;

/// Byte order of binary data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Least significant byte first
    Little,
    /// Most significant byte first (VTK legacy wire order)
    #[default]
    Big,
}

impl Endianness {
    /// Byte order of the host.
    #[inline]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Returns true if data in this order can be used without swapping.
    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

/// Reverse the bytes of every element in `data`.
pub fn swap_range<T: Component>(data: &mut [T]) {
    if T::SIZE == 1 {
        return;
    }
    let bytes: &mut [u8] = bytemuck::cast_slice_mut(data);
    for chunk in bytes.chunks_exact_mut(T::SIZE) {
        chunk.reverse();
    }
}

/// Convert values between host order and `order`, in place.
///
/// The conversion is its own inverse, so the same call is used in both
/// directions.
#[inline]
pub fn normalize_range<T: Component>(data: &mut [T], order: Endianness) {
    if !order.is_native() {
        swap_range(data);
    }
}

/// Write `data` to `writer` in `order` without touching the caller's slice.
pub fn write_range<T: Component, W: Write>(
    writer: &mut W,
    data: &[T],
    order: Endianness,
) -> std::io::Result<()> {
    if order.is_native() || T::SIZE == 1 {
        return writer.write_all(bytemuck::cast_slice(data));
    }
    let mut scratch = data.to_vec();
    swap_range(&mut scratch);
    writer.write_all(bytemuck::cast_slice(&scratch))
}

/// Fill `out` with values read from `reader` that are stored in `order`.
pub fn read_range<T: Component, R: Read>(
    reader: &mut R,
    out: &mut [T],
    order: Endianness,
) -> std::io::Result<()> {
    reader.read_exact(bytemuck::cast_slice_mut(out))?;
    normalize_range(out, order);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_range() {
        let mut data = [0x0102_0304u32, 0xAABB_CCDD];
        swap_range(&mut data);
        assert_eq!(data, [0x0403_0201, 0xDDCC_BBAA]);

        let mut bytes = [1u8, 2, 3];
        swap_range(&mut bytes);
        assert_eq!(bytes, [1, 2, 3]);
    }

    #[test]
    fn test_write_big_endian() {
        let mut out = Vec::new();
        write_range(&mut out, &[0x0102u16, 0x0304], Endianness::Big).unwrap();
        assert_eq!(out, [0x01, 0x02, 0x03, 0x04]);

        let mut out = Vec::new();
        write_range(&mut out, &[0x0102u16], Endianness::Little).unwrap();
        assert_eq!(out, [0x02, 0x01]);
    }

    #[test]
    fn test_float_roundtrip_bit_exact() {
        let values = [1.5f64, -0.1, f64::MIN_POSITIVE, 12345.678];
        for order in [Endianness::Big, Endianness::Little] {
            let mut out = Vec::new();
            write_range(&mut out, &values, order).unwrap();
            assert_eq!(out.len(), values.len() * 8);

            let mut back = [0f64; 4];
            read_range(&mut out.as_slice(), &mut back, order).unwrap();
            for (a, b) in values.iter().zip(back.iter()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn test_wire_bytes_differ_from_host_order() {
        let value = 0x1122_3344i32;
        let mut wire = Vec::new();
        let foreign = match Endianness::native() {
            Endianness::Little => Endianness::Big,
            Endianness::Big => Endianness::Little,
        };
        write_range(&mut wire, &[value], foreign).unwrap();
        assert_ne!(wire.as_slice(), value.to_ne_bytes().as_slice());
        let mut reversed = value.to_ne_bytes();
        reversed.reverse();
        assert_eq!(wire.as_slice(), reversed.as_slice());
    }

    #[test]
    fn test_read_short_input_fails() {
        let mut out = [0u32; 2];
        let data = [0u8; 6];
        assert!(read_range(&mut data.as_slice(), &mut out, Endianness::Big).is_err());
    }
}
