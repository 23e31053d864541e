//! Endianness and hex utilities shared by the wire formats.

use crate::{Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Endianness flag carried in the first byte of every wkb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    /// Big endian, aka XDR. Wire code 0.
    Big,
    /// Little endian, aka NDR. Wire code 1.
    Little,
}

impl Endian {
    /// Returns the endianness of this machine.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::Endian;
    /// let endian = Endian::native();
    /// ```
    pub fn native() -> Endian {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    /// Reads an endian flag from the leading byte of a wkb.
    ///
    /// Anything non-zero is treated as little endian, as the original C
    /// library did.
    pub fn from_flag(byte: u8) -> Endian {
        if byte == 0 {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    /// Returns this endianness as a wkb flag byte.
    pub fn to_flag(self) -> u8 {
        match self {
            Endian::Big => 0,
            Endian::Little => 1,
        }
    }

    /// Reads a u16 from the front of `buf` in this endianness.
    pub fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Big => BigEndian::read_u16(buf),
            Endian::Little => LittleEndian::read_u16(buf),
        }
    }

    /// Reads a u32 from the front of `buf` in this endianness.
    pub fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Big => BigEndian::read_u32(buf),
            Endian::Little => LittleEndian::read_u32(buf),
        }
    }

    /// Writes a u32 into the front of `buf` in this endianness.
    pub fn write_u32(self, buf: &mut [u8], n: u32) {
        match self {
            Endian::Big => BigEndian::write_u32(buf, n),
            Endian::Little => LittleEndian::write_u32(buf, n),
        }
    }
}

/// Reverses each `word_size`-wide word of `buf` in place.
///
/// One-byte words are left untouched.
pub(crate) fn flip_words(buf: &mut [u8], word_size: usize) {
    if word_size < 2 {
        return;
    }
    for word in buf.chunks_exact_mut(word_size) {
        word.reverse();
    }
}

/// Reads the pcid out of a point or patch wkb without parsing the rest.
///
/// Callers use this to resolve the schema before deserializing the blob.
///
/// # Examples
///
/// ```
/// use pointcloud::utils::{bytes_from_hex, wkb_pcid};
/// let wkb = bytes_from_hex("0000000007").unwrap();
/// assert_eq!(7, wkb_pcid(&wkb).unwrap());
/// ```
pub fn wkb_pcid(wkb: &[u8]) -> Result<u32> {
    if wkb.len() < 5 {
        return Err(Error::WkbTruncated(wkb.len()));
    }
    Ok(Endian::from_flag(wkb[0]).read_u32(&wkb[1..]))
}

/// Converts a hex string into bytes.
///
/// # Examples
///
/// ```
/// use pointcloud::utils::bytes_from_hex;
/// assert_eq!(vec![0x01, 0xAB], bytes_from_hex("01AB").unwrap());
/// ```
pub fn bytes_from_hex(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(Error::InvalidHex(format!(
            "length ({}) is not a multiple of two",
            hex.len()
        )));
    }
    let digit = |c: u8| -> Result<u8> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(Error::InvalidHex(format!(
                "invalid character '{}'",
                char::from(c)
            ))),
        }
    };
    let bytes = hex.as_bytes();
    let mut buf = Vec::with_capacity(hex.len() / 2);
    for pair in bytes.chunks_exact(2) {
        buf.push((digit(pair[0])? << 4) | digit(pair[1])?);
    }
    Ok(buf)
}

/// Converts bytes into an uppercase hex string.
///
/// # Examples
///
/// ```
/// use pointcloud::utils::hex_from_bytes;
/// assert_eq!("01AB", hex_from_bytes(&[0x01, 0xAB]));
/// ```
pub fn hex_from_bytes(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut hex = String::with_capacity(2 * bytes.len());
    for byte in bytes {
        hex.push(char::from(DIGITS[usize::from(byte >> 4)]));
        hex.push(char::from(DIGITS[usize::from(byte & 0x0F)]));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endian_flag() {
        assert_eq!(Endian::Big, Endian::from_flag(0));
        assert_eq!(Endian::Little, Endian::from_flag(1));
        assert_eq!(0, Endian::Big.to_flag());
        assert_eq!(1, Endian::Little.to_flag());
    }

    #[test]
    fn read_u32_both_ways() {
        let buf = [0, 0, 0, 2];
        assert_eq!(2, Endian::Big.read_u32(&buf));
        assert_eq!(0x0200_0000, Endian::Little.read_u32(&buf));
    }

    #[test]
    fn hex_round_trip() {
        let bytes = bytes_from_hex("00FF10ab").unwrap();
        assert_eq!(vec![0x00, 0xFF, 0x10, 0xAB], bytes);
        assert_eq!("00FF10AB", hex_from_bytes(&bytes));
    }

    #[test]
    fn hex_rejects_odd_length() {
        assert!(bytes_from_hex("ABC").is_err());
        assert!(bytes_from_hex("zz").is_err());
    }

    #[test]
    fn flip() {
        let mut buf = [1, 2, 3, 4];
        flip_words(&mut buf, 2);
        assert_eq!([2, 1, 4, 3], buf);
        let mut buf = [1, 2, 3, 4];
        flip_words(&mut buf, 4);
        assert_eq!([4, 3, 2, 1], buf);
        let mut buf = [1, 2];
        flip_words(&mut buf, 1);
        assert_eq!([1, 2], buf);
    }
}
