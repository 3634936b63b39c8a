//! Bounds-checked little-endian access at arbitrary byte offsets.
//!
//! All multi-byte access is unaligned and independent of host byte order, so
//! the package and bitmap headers are never overlaid with packed structs.

use crate::error::Error;

pub fn get_u8(buf: &[u8], offset: usize) -> Result<u8, Error> {
    buf.get(offset).copied().ok_or(Error::OutOfBounds {
        offset,
        need: 1,
        len: buf.len(),
    })
}

pub fn get_u16(buf: &[u8], offset: usize) -> Result<u16, Error> {
    buf.get(offset..offset + 2)
        .and_then(|s| s.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or(Error::OutOfBounds {
            offset,
            need: 2,
            len: buf.len(),
        })
}

pub fn get_u32(buf: &[u8], offset: usize) -> Result<u32, Error> {
    buf.get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(Error::OutOfBounds {
            offset,
            need: 4,
            len: buf.len(),
        })
}

pub fn put_u8(buf: &mut [u8], offset: usize, value: u8) -> Result<(), Error> {
    let len = buf.len();
    *buf.get_mut(offset).ok_or(Error::OutOfBounds {
        offset,
        need: 1,
        len,
    })? = value;
    Ok(())
}

pub fn put_u16(buf: &mut [u8], offset: usize, value: u16) -> Result<(), Error> {
    let len = buf.len();
    buf.get_mut(offset..offset + 2)
        .ok_or(Error::OutOfBounds {
            offset,
            need: 2,
            len,
        })?
        .copy_from_slice(&value.to_le_bytes());
    Ok(())
}

pub fn put_u32(buf: &mut [u8], offset: usize, value: u32) -> Result<(), Error> {
    let len = buf.len();
    buf.get_mut(offset..offset + 4)
        .ok_or(Error::OutOfBounds {
            offset,
            need: 4,
            len,
        })?
        .copy_from_slice(&value.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_little_endian() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05];
        assert_eq!(get_u8(&buf, 4).unwrap(), 0x05);
        assert_eq!(get_u16(&buf, 1).unwrap(), 0x0302);
        assert_eq!(get_u32(&buf, 0).unwrap(), 0x04030201);
        assert_eq!(get_u32(&buf, 1).unwrap(), 0x05040302);
    }

    #[test]
    fn writes_round_trip() {
        let mut buf = [0u8; 8];
        put_u16(&mut buf, 1, 0xABCD).unwrap();
        put_u32(&mut buf, 3, 0x11223344).unwrap();
        assert_eq!(get_u16(&buf, 1).unwrap(), 0xABCD);
        assert_eq!(get_u32(&buf, 3).unwrap(), 0x11223344);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let buf = [0u8; 4];
        assert!(get_u32(&buf, 1).is_err());
        assert!(get_u16(&buf, 3).is_err());
        assert!(get_u8(&buf, 4).is_err());

        let mut buf = [0u8; 4];
        assert!(put_u32(&mut buf, 1, 0).is_err());
        assert!(put_u16(&mut buf, 4, 0).is_err());
    }
}
