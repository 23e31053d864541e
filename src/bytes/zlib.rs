//! Zlib (deflate) encoding of byte columns.

use super::{Bytes, DimCompression};
use crate::Result;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Deflates a raw column at maximum compression.
pub fn encode(raw: &Bytes) -> Result<Bytes> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(9));
    encoder.write_all(&raw.bytes)?;
    let bytes = encoder.finish()?;
    Ok(Bytes {
        interpretation: raw.interpretation,
        compression: DimCompression::Zlib,
        npoints: raw.npoints,
        bytes,
    })
}

/// Inflates a zlib column back to raw values.
///
/// The output size is known up front: one value of the column's
/// interpretation per point.
pub fn decode(encoded: &Bytes) -> Result<Bytes> {
    let size = encoded.interpretation.size() * encoded.npoints as usize;
    let mut bytes = vec![0; size];
    let mut decoder = ZlibDecoder::new(encoded.bytes.as_slice());
    decoder.read_exact(&mut bytes)?;
    Ok(Bytes {
        interpretation: encoded.interpretation,
        compression: DimCompression::None,
        npoints: encoded.npoints,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Interpretation;

    #[test]
    fn round_trip() {
        let raw = Bytes::from_raw(Interpretation::Int8, b"abcaabcaabcbabcc".to_vec());
        let encoded = encode(&raw).unwrap();
        assert_eq!(DimCompression::Zlib, encoded.compression);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(DimCompression::None, decoded.compression);
        assert_eq!(raw.bytes, decoded.bytes);
    }

    #[test]
    fn compresses_repetitive_data() {
        let raw = Bytes::from_raw(Interpretation::UInt8, vec![7; 4096]);
        let encoded = encode(&raw).unwrap();
        assert!(encoded.bytes.len() < raw.bytes.len() / 10);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let raw = Bytes::from_raw(Interpretation::UInt8, b"some bytes to pack".to_vec());
        let mut encoded = encode(&raw).unwrap();
        encoded.bytes.truncate(2);
        assert!(decode(&encoded).is_err());
    }
}
