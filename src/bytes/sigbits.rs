//! Significant-bits encoding of byte columns.
//!
//! Every value in a column shares some number of leading bits; this codec
//! strips the shared prefix and packs the remaining suffix bits tightly.
//! The encoded layout, in words of the column's width (8, 16, 32, or 64
//! bits), is:
//!
//! - one header word holding the unique (suffix) bit count `u`,
//! - one header word holding the common prefix value,
//! - `u` bits per value, concatenated MSB-first, padded out to a whole word.
//!
//! When every value is identical (`u = 0`) the packed tail is omitted.

use super::{Bytes, DimCompression};
use crate::{utils, Error, Result};
use num_traits::PrimInt;

/// One machine word of the column's width.
trait Word: PrimInt {
    const BITS: u32;
    const BYTES: usize;

    fn read_ne(buf: &[u8]) -> Self;
    fn write_ne(self, buf: &mut [u8]);
    fn of_u32(n: u32) -> Self;
    fn low_u32(self) -> u32;
}

macro_rules! impl_word {
    ($t:ty) => {
        impl Word for $t {
            const BITS: u32 = <$t>::BITS;
            const BYTES: usize = (<$t>::BITS / 8) as usize;

            fn read_ne(buf: &[u8]) -> Self {
                let mut bytes = [0; Self::BYTES];
                bytes.copy_from_slice(&buf[..Self::BYTES]);
                <$t>::from_ne_bytes(bytes)
            }

            fn write_ne(self, buf: &mut [u8]) {
                buf[..Self::BYTES].copy_from_slice(&self.to_ne_bytes());
            }

            fn of_u32(n: u32) -> Self {
                // The only values that travel this way are bit counts, which
                // fit the narrowest word.
                num_traits::cast(n).unwrap_or(0)
            }

            fn low_u32(self) -> u32 {
                num_traits::cast(self & Self::of_u32(0xFF)).unwrap_or(0)
            }
        }
    };
}

impl_word!(u8);
impl_word!(u16);
impl_word!(u32);
impl_word!(u64);

/// Finds the common prefix of a column: the prefix value (with the suffix
/// bits zeroed) and how many leading bits it spans.
fn count_words<W: Word>(bytes: &[u8], npoints: u32) -> (W, u32) {
    if npoints == 0 {
        return (W::zero(), W::BITS);
    }
    let mut all_and = W::read_ne(bytes);
    let mut all_or = all_and;
    for index in 1..npoints as usize {
        let value = W::read_ne(&bytes[index * W::BYTES..]);
        all_and = all_and & value;
        all_or = all_or | value;
    }
    let mut common = W::BITS;
    while all_and != all_or {
        all_and = all_and >> 1;
        all_or = all_or >> 1;
        common -= 1;
    }
    let prefix = if common == 0 {
        W::zero()
    } else {
        all_and << (W::BITS - common) as usize
    };
    (prefix, common)
}

fn encode_words<W: Word>(raw: &Bytes) -> Bytes {
    let npoints = raw.npoints as usize;
    let (prefix, common) = count_words::<W>(&raw.bytes, raw.npoints);
    let unique = W::BITS - common;

    let tail_bits = unique as usize * npoints;
    let tail_words = tail_bits.div_ceil(W::BITS as usize);
    let mut words: Vec<W> = vec![W::zero(); 2 + tail_words];
    words[0] = W::of_u32(unique);
    words[1] = prefix;

    if unique > 0 {
        let mask = W::max_value() >> common as usize;
        for index in 0..npoints {
            let value = W::read_ne(&raw.bytes[index * W::BYTES..]) & mask;
            pack(&mut words[2..], index * unique as usize, unique, value);
        }
    }

    let mut bytes = vec![0; words.len() * W::BYTES];
    for (word, chunk) in words.iter().zip(bytes.chunks_exact_mut(W::BYTES)) {
        word.write_ne(chunk);
    }
    Bytes {
        interpretation: raw.interpretation,
        compression: DimCompression::SigBits,
        npoints: raw.npoints,
        bytes,
    }
}

/// Writes the low `unique` bits of `value` at `offset` bits into the tail,
/// MSB-first.
fn pack<W: Word>(tail: &mut [W], offset: usize, unique: u32, value: W) {
    let bits = W::BITS as usize;
    let word = offset / bits;
    let in_word = offset % bits;
    if in_word + unique as usize <= bits {
        tail[word] = tail[word] | (value << (bits - in_word - unique as usize));
    } else {
        let first = bits - in_word;
        let rest = unique as usize - first;
        tail[word] = tail[word] | (value >> rest);
        tail[word + 1] = tail[word + 1] | (value << (bits - rest));
    }
}

/// Reads `unique` bits at `offset` bits into the tail, MSB-first.
fn unpack<W: Word>(tail: &[W], offset: usize, unique: u32, mask: W) -> W {
    let bits = W::BITS as usize;
    let word = offset / bits;
    let in_word = offset % bits;
    if in_word + unique as usize <= bits {
        (tail[word] >> (bits - in_word - unique as usize)) & mask
    } else {
        let first = bits - in_word;
        let rest = unique as usize - first;
        let high = (tail[word] << rest) & mask;
        let low = tail[word + 1] >> (bits - rest);
        high | low
    }
}

fn decode_words<W: Word>(encoded: &Bytes) -> Result<Bytes> {
    let npoints = encoded.npoints as usize;
    if encoded.bytes.len() < 2 * W::BYTES {
        return Err(Error::WkbTruncated(encoded.bytes.len()));
    }
    let unique = W::read_ne(&encoded.bytes).low_u32().min(W::BITS);
    let prefix = W::read_ne(&encoded.bytes[W::BYTES..]);

    let mut bytes = vec![0; npoints * W::BYTES];
    if unique == 0 {
        for chunk in bytes.chunks_exact_mut(W::BYTES) {
            prefix.write_ne(chunk);
        }
    } else {
        let tail: Vec<W> = encoded.bytes[2 * W::BYTES..]
            .chunks_exact(W::BYTES)
            .map(W::read_ne)
            .collect();
        let needed = (npoints * unique as usize).div_ceil(W::BITS as usize);
        if tail.len() < needed {
            return Err(Error::WkbTruncated(encoded.bytes.len()));
        }
        let mask = W::max_value() >> (W::BITS - unique) as usize;
        for (index, chunk) in bytes.chunks_exact_mut(W::BYTES).enumerate() {
            let value = unpack(&tail, index * unique as usize, unique, mask) | prefix;
            value.write_ne(chunk);
        }
    }
    Ok(Bytes {
        interpretation: encoded.interpretation,
        compression: DimCompression::None,
        npoints: encoded.npoints,
        bytes,
    })
}

/// Counts the leading bits shared by every value of a raw column.
pub fn common_bits(raw: &Bytes) -> u32 {
    match raw.interpretation.size() {
        1 => count_words::<u8>(&raw.bytes, raw.npoints).1,
        2 => count_words::<u16>(&raw.bytes, raw.npoints).1,
        4 => count_words::<u32>(&raw.bytes, raw.npoints).1,
        _ => count_words::<u64>(&raw.bytes, raw.npoints).1,
    }
}

/// Encodes a raw column by stripping the common prefix and bit-packing the
/// suffixes.
pub fn encode(raw: &Bytes) -> Bytes {
    match raw.interpretation.size() {
        1 => encode_words::<u8>(raw),
        2 => encode_words::<u16>(raw),
        4 => encode_words::<u32>(raw),
        _ => encode_words::<u64>(raw),
    }
}

/// Decodes a significant-bits column back to raw values.
pub fn decode(encoded: &Bytes) -> Result<Bytes> {
    match encoded.interpretation.size() {
        1 => decode_words::<u8>(encoded),
        2 => decode_words::<u16>(encoded),
        4 => decode_words::<u32>(encoded),
        _ => decode_words::<u64>(encoded),
    }
}

/// Flips the two header words in place. The packed suffix bits are
/// endian-agnostic and travel unchanged.
pub fn flip_endian(column: &mut Bytes) {
    let size = column.interpretation.size();
    if size < 2 || column.bytes.len() < 2 * size {
        return;
    }
    utils::flip_words(&mut column.bytes[..2 * size], size);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Interpretation;

    fn raw_u16(values: &[u16]) -> Bytes {
        let mut bytes = Vec::new();
        for value in values {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
        Bytes::from_raw(Interpretation::Int16, bytes)
    }

    fn raw_u32(values: &[u32]) -> Bytes {
        let mut bytes = Vec::new();
        for value in values {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
        Bytes::from_raw(Interpretation::Int32, bytes)
    }

    fn raw_u64(values: &[u64]) -> Bytes {
        let mut bytes = Vec::new();
        for value in values {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
        Bytes::from_raw(Interpretation::Int64, bytes)
    }

    #[test]
    fn count_8() {
        // 'a' = 01100001, 'b' = 01100010, 'c' = 01100011 share 01100 -> '`'
        let raw = Bytes::from_raw(Interpretation::UInt8, b"abc".to_vec());
        let (prefix, common) = count_words::<u8>(&raw.bytes, raw.npoints);
        assert_eq!(6, common);
        assert_eq!(b'`', prefix);

        let raw = Bytes::from_raw(Interpretation::UInt8, b"abcdef".to_vec());
        let (prefix, common) = count_words::<u8>(&raw.bytes, raw.npoints);
        assert_eq!(5, common);
        assert_eq!(b'`', prefix);
    }

    #[test]
    fn count_16() {
        let raw = raw_u16(&[0x6161, 0x6262, 0x6363]); // "aabbcc"
        let (_, common) = count_words::<u16>(&raw.bytes, raw.npoints);
        assert_eq!(6, common);
    }

    #[test]
    fn encode_two_unique_bits() {
        // "abca" packs as base 01100000 with suffixes 01 10 11 01
        let raw = Bytes::from_raw(Interpretation::Int8, b"abcaabcaabcbabcc".to_vec());
        let encoded = encode(&raw);
        assert_eq!(2, encoded.bytes[0]); // unique bit count
        assert_eq!(96, encoded.bytes[1]); // common prefix
        assert_eq!(109, encoded.bytes[2]);
        assert_eq!(109, encoded.bytes[3]);
        assert_eq!(110, encoded.bytes[4]);
        assert_eq!(111, encoded.bytes[5]);
    }

    #[test]
    fn encode_decode_three_unique_bits() {
        // "abcdab": suffixes 001 010 011 100 001 010 pack to 0x29 0xC2 0x80
        let raw = Bytes::from_raw(Interpretation::Int8, b"abcdab".to_vec());
        let encoded = encode(&raw);
        assert_eq!(3, encoded.bytes[0]);
        assert_eq!(96, encoded.bytes[1]);
        assert_eq!(41, encoded.bytes[2]);
        assert_eq!(194, encoded.bytes[3]);

        let decoded = decode(&encoded).unwrap();
        assert_eq!(b"abcdab".to_vec(), decoded.bytes);
        assert_eq!(DimCompression::None, decoded.compression);
    }

    #[test]
    fn encode_decode_16() {
        let values = [24929u16, 24930, 24931, 24932, 24933, 24934];
        let raw = raw_u16(&values);
        let (prefix, common) = count_words::<u16>(&raw.bytes, raw.npoints);
        assert_eq!(24928, prefix);
        assert_eq!(13, common);

        let encoded = encode(&raw);
        let words: Vec<u16> = encoded
            .bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_ne_bytes([chunk[0], chunk[1]]))
            .collect();
        assert_eq!(3, words[0]);
        assert_eq!(24928, words[1]);
        assert_eq!(10699, words[2]);

        let decoded = decode(&encoded).unwrap();
        assert_eq!(raw.bytes, decoded.bytes);
    }

    #[test]
    fn encode_decode_32() {
        let values = [103241u32, 103251, 103261, 103271, 103281, 103291];
        let raw = raw_u32(&values);
        let (prefix, common) = count_words::<u32>(&raw.bytes, raw.npoints);
        assert_eq!(26, common);
        assert_eq!(103232, prefix);

        let encoded = encode(&raw);
        let words: Vec<u32> = encoded
            .bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        assert_eq!(6, words[0]);
        assert_eq!(103232, words[1]);
        assert_eq!(624388039, words[2]);

        let decoded = decode(&encoded).unwrap();
        assert_eq!(raw.bytes, decoded.bytes);
    }

    #[test]
    fn encode_decode_64() {
        let values = [103241u64, 103251, 103261, 103271, 103281, 103291];
        let raw = raw_u64(&values);
        let (prefix, common) = count_words::<u64>(&raw.bytes, raw.npoints);
        assert_eq!(58, common);
        assert_eq!(103232, prefix);

        let encoded = encode(&raw);
        let words: Vec<u64> = encoded
            .bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                u64::from_ne_bytes(buf)
            })
            .collect();
        assert_eq!(6, words[0]);
        assert_eq!(103232, words[1]);
        assert_eq!(2681726210471362560, words[2]);

        let decoded = decode(&encoded).unwrap();
        assert_eq!(raw.bytes, decoded.bytes);
    }

    #[test]
    fn all_equal_column_has_no_tail() {
        let raw = raw_u16(&[24929; 6]);
        let encoded = encode(&raw);
        // unique count 0, prefix word, nothing else
        assert_eq!(4, encoded.bytes.len());
        let decoded = decode(&encoded).unwrap();
        assert_eq!(raw.bytes, decoded.bytes);
    }

    #[test]
    fn no_common_bits_still_round_trips() {
        let raw = Bytes::from_raw(Interpretation::UInt8, vec![0x00, 0xFF, 0x55, 0xAA]);
        let encoded = encode(&raw);
        assert_eq!(8, encoded.bytes[0]);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(raw.bytes, decoded.bytes);
    }

    #[test]
    fn flip_touches_only_headers() {
        let raw = raw_u16(&[24929, 24930, 24931]);
        let mut encoded = encode(&raw);
        let original = encoded.bytes.clone();
        flip_endian(&mut encoded);
        assert_eq!(original[1], encoded.bytes[0]);
        assert_eq!(original[0], encoded.bytes[1]);
        assert_eq!(original[4..], encoded.bytes[4..]);
        flip_endian(&mut encoded);
        assert_eq!(original, encoded.bytes);
    }
}
