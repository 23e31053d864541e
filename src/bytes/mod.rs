//! The byte-column primitive behind dimensional patches.
//!
//! A [Bytes] is a length-tagged column of same-type values in one of four
//! states: raw, run-length encoded, significant-bits packed, or
//! zlib-deflated. Columns encode and decode between states, scan their own
//! min/max/avg, build and apply filter bitmaps, and serialize to the
//! dimensional patch wire format.

mod rle;
mod sigbits;
mod zlib;

use crate::stats::DoubleStat;
use crate::{Bitmap, Dimension, Endian, Error, Filter, Interpretation, Result};

/// The compression state of one dimension's column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DimCompression {
    /// Raw values, tightly packed.
    #[default]
    None,
    /// Run-length encoded `{count, value}` pairs.
    Rle,
    /// Common-prefix stripped, suffix bits packed.
    SigBits,
    /// Deflated with zlib.
    Zlib,
}

impl DimCompression {
    /// Returns this compression's wire code.
    pub fn code(self) -> u8 {
        match self {
            DimCompression::None => 0,
            DimCompression::Rle => 1,
            DimCompression::SigBits => 2,
            DimCompression::Zlib => 3,
        }
    }

    /// Looks a compression up by its wire code.
    pub fn from_code(code: u8) -> Result<DimCompression> {
        match code {
            0 => Ok(DimCompression::None),
            1 => Ok(DimCompression::Rle),
            2 => Ok(DimCompression::SigBits),
            3 => Ok(DimCompression::Zlib),
            _ => Err(Error::UnknownDimCompression(code)),
        }
    }
}

/// A column of `npoints` same-type values in one of four compression states.
#[derive(Clone, Debug, PartialEq)]
pub struct Bytes {
    /// The numeric type of the stored values.
    pub interpretation: Interpretation,
    /// The compression state of `bytes`.
    pub compression: DimCompression,
    /// How many values this column holds when decoded.
    pub npoints: u32,
    /// The (possibly compressed) column data.
    pub bytes: Vec<u8>,
}

impl Bytes {
    /// Creates a zeroed raw column for `npoints` values of a dimension.
    pub fn new(dimension: &Dimension, npoints: u32) -> Bytes {
        Bytes {
            interpretation: dimension.interpretation,
            compression: DimCompression::None,
            npoints,
            bytes: vec![0; dimension.size * npoints as usize],
        }
    }

    /// Wraps raw value bytes as an uncompressed column.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::{Bytes, Interpretation};
    /// let column = Bytes::from_raw(Interpretation::UInt8, b"aaaabbbbccdde".to_vec());
    /// assert_eq!(13, column.npoints);
    /// ```
    pub fn from_raw(interpretation: Interpretation, bytes: Vec<u8>) -> Bytes {
        let npoints = (bytes.len() / interpretation.size()) as u32;
        Bytes {
            interpretation,
            compression: DimCompression::None,
            npoints,
            bytes,
        }
    }

    /// Returns the byte length of the column in its current state.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Is this column empty?
    pub fn is_empty(&self) -> bool {
        self.npoints == 0 || self.bytes.is_empty()
    }

    /// Re-encodes this column into the target compression.
    ///
    /// Any state can be reached from any other; compressed input is decoded
    /// first.
    pub fn encode(&self, compression: DimCompression) -> Result<Bytes> {
        let raw = self.decode()?;
        Ok(match compression {
            DimCompression::None => raw,
            DimCompression::Rle => rle::encode(&raw),
            DimCompression::SigBits => sigbits::encode(&raw),
            DimCompression::Zlib => zlib::encode(&raw)?,
        })
    }

    /// Decodes this column to its raw state.
    pub fn decode(&self) -> Result<Bytes> {
        match self.compression {
            DimCompression::None => Ok(self.clone()),
            DimCompression::Rle => rle::decode(self),
            DimCompression::SigBits => sigbits::decode(self),
            DimCompression::Zlib => zlib::decode(self),
        }
    }

    /// Counts the distinct-adjacent runs in this column.
    ///
    /// Compressed columns are decoded first.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::{Bytes, Interpretation};
    /// let column = Bytes::from_raw(Interpretation::UInt8, b"aaaabbbbccdde".to_vec());
    /// assert_eq!(5, column.run_count().unwrap());
    /// ```
    pub fn run_count(&self) -> Result<u32> {
        if self.compression != DimCompression::None {
            return self.decode()?.run_count();
        }
        let size = self.interpretation.size();
        let mut runs = 1;
        let mut values = self.bytes.chunks_exact(size);
        if let Some(first) = values.next() {
            let mut previous = first;
            for value in values {
                if value != previous {
                    runs += 1;
                }
                previous = value;
            }
        }
        Ok(runs)
    }

    /// Counts the leading bits shared by every value in this column.
    ///
    /// Compressed columns are decoded first.
    pub fn sigbits_count(&self) -> Result<u32> {
        if self.compression != DimCompression::None {
            return self.decode()?.sigbits_count();
        }
        Ok(sigbits::common_bits(self))
    }

    /// Scans the minimum, maximum, and average of this column, in raw
    /// (unscaled) units.
    ///
    /// Raw columns scan directly, run-length columns walk the runs weighting
    /// the average by count, and the other states decode first.
    pub fn minmax(&self) -> Result<(f64, f64, f64)> {
        match self.compression {
            DimCompression::None => Ok(self.raw_minmax()),
            DimCompression::Rle => Ok(rle::minmax(self)),
            DimCompression::SigBits | DimCompression::Zlib => self.decode()?.minmax(),
        }
    }

    fn raw_minmax(&self) -> (f64, f64, f64) {
        let size = self.interpretation.size();
        let mut stat = DoubleStat::new();
        for value in self.bytes.chunks_exact(size) {
            stat.update(self.interpretation.read(value));
        }
        (stat.min, stat.max, stat.sum / f64::from(self.npoints.max(1)))
    }

    /// Builds a selection bitmap by applying a comparator to every value.
    ///
    /// The comparator operates in raw units; callers remove scale and offset
    /// from their operands first. Run-length columns are scanned run by run
    /// without decoding; significant-bits and zlib columns decode first.
    pub fn bitmap(&self, filter: Filter) -> Result<Bitmap> {
        match self.compression {
            DimCompression::None => {
                let size = self.interpretation.size();
                let mut map = Bitmap::new(self.npoints);
                for (index, value) in self.bytes.chunks_exact(size).enumerate() {
                    map.filter(filter, index, self.interpretation.read(value));
                }
                Ok(map)
            }
            DimCompression::Rle => rle::bitmap(self, filter),
            DimCompression::SigBits | DimCompression::Zlib => self.decode()?.bitmap(filter),
        }
    }

    /// Copies the selected values into a new column, updating `stats` with
    /// the selected values in the same pass.
    ///
    /// Run-length columns filter run by run and emit run-length output;
    /// significant-bits and zlib columns decode, filter raw, and re-encode.
    pub fn filter(&self, map: &Bitmap, stats: Option<&mut DoubleStat>) -> Result<Bytes> {
        match self.compression {
            DimCompression::None => Ok(self.raw_filter(map, stats)),
            DimCompression::Rle => Ok(rle::filter(self, map, stats)),
            DimCompression::SigBits | DimCompression::Zlib => {
                let filtered = self.decode()?.raw_filter(map, stats);
                filtered.encode(self.compression)
            }
        }
    }

    fn raw_filter(&self, map: &Bitmap, mut stats: Option<&mut DoubleStat>) -> Bytes {
        let size = self.interpretation.size();
        let mut bytes = Vec::with_capacity(map.nset() as usize * size);
        let mut npoints = 0;
        for (index, value) in self.bytes.chunks_exact(size).enumerate() {
            if map.get(index) {
                if let Some(stats) = stats.as_deref_mut() {
                    stats.update(self.interpretation.read(value));
                }
                bytes.extend_from_slice(value);
                npoints += 1;
            }
        }
        Bytes {
            interpretation: self.interpretation,
            compression: DimCompression::None,
            npoints,
            bytes,
        }
    }

    /// Flips the endianness of this column in place.
    ///
    /// Raw columns flip every word; run-length columns flip the value words
    /// and skip the counts; significant-bits columns flip only the two
    /// header words; zlib data travels unchanged.
    pub fn flip_endian(&mut self) {
        match self.compression {
            DimCompression::None => {
                crate::utils::flip_words(&mut self.bytes, self.interpretation.size())
            }
            DimCompression::Rle => rle::flip_endian(self),
            DimCompression::SigBits => sigbits::flip_endian(self),
            DimCompression::Zlib => {}
        }
    }

    /// Returns the size of this column's wire form.
    pub fn serialized_size(&self) -> usize {
        // compression (1) + data size (4) + data
        1 + 4 + self.bytes.len()
    }

    /// Appends this column's wire form to `wkb`, in machine endianness.
    pub fn serialize(&self, wkb: &mut Vec<u8>) {
        wkb.push(self.compression.code());
        wkb.extend_from_slice(&(self.bytes.len() as u32).to_ne_bytes());
        wkb.extend_from_slice(&self.bytes);
    }

    /// Reads one column from the front of `buf`.
    ///
    /// `npoints` comes from the patch header; `endian` is the patch's wire
    /// endianness, and the column is flipped into machine order when they
    /// differ. Returns the column and the number of bytes consumed.
    pub fn deserialize(
        buf: &[u8],
        dimension: &Dimension,
        npoints: u32,
        endian: Endian,
    ) -> Result<(Bytes, usize)> {
        const HEADER: usize = 5;
        if buf.len() < HEADER {
            return Err(Error::WkbTruncated(buf.len()));
        }
        let compression = DimCompression::from_code(buf[0])?;
        let size = endian.read_u32(&buf[1..]) as usize;
        if buf.len() < HEADER + size {
            return Err(Error::WkbTruncated(buf.len()));
        }
        let mut column = Bytes {
            interpretation: dimension.interpretation,
            compression,
            npoints,
            bytes: buf[HEADER..HEADER + size].to_vec(),
        };
        if endian != Endian::native() {
            column.flip_endian();
        }
        Ok((column, HEADER + size))
    }
}
