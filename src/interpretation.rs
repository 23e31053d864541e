//! The numeric type behind a dimension's stored bytes.

use crate::{Error, Result};
use byteorder::{ByteOrder, NativeEndian};

/// The numeric type of one dimension of a point record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpretation {
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 64-bit float.
    Double,
    /// 32-bit float.
    Float,
}

impl Interpretation {
    /// Parses an interpretation from a schema document token.
    ///
    /// Matching is case-insensitive and tolerates the `_t` suffix of the C
    /// type names, e.g. both `int32` and `Int32_t` are accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::Interpretation;
    /// assert_eq!(Interpretation::Int32, Interpretation::from_string("int32_t").unwrap());
    /// assert!(Interpretation::from_string("galaxy").is_err());
    /// ```
    pub fn from_string(s: &str) -> Result<Interpretation> {
        let lower = s.to_ascii_lowercase();
        let token = lower.strip_suffix("_t").unwrap_or(&lower);
        match token {
            "int8" => Ok(Interpretation::Int8),
            "uint8" => Ok(Interpretation::UInt8),
            "int16" => Ok(Interpretation::Int16),
            "uint16" => Ok(Interpretation::UInt16),
            "int32" => Ok(Interpretation::Int32),
            "uint32" => Ok(Interpretation::UInt32),
            "int64" => Ok(Interpretation::Int64),
            "uint64" => Ok(Interpretation::UInt64),
            "double" => Ok(Interpretation::Double),
            "float" => Ok(Interpretation::Float),
            _ => Err(Error::UnknownInterpretation(s.to_string())),
        }
    }

    /// Returns this interpretation's wire code.
    pub fn code(self) -> u32 {
        match self {
            Interpretation::Int8 => 1,
            Interpretation::UInt8 => 2,
            Interpretation::Int16 => 3,
            Interpretation::UInt16 => 4,
            Interpretation::Int32 => 5,
            Interpretation::UInt32 => 6,
            Interpretation::Int64 => 7,
            Interpretation::UInt64 => 8,
            Interpretation::Double => 9,
            Interpretation::Float => 10,
        }
    }

    /// Looks an interpretation up by its wire code.
    pub fn from_code(code: u32) -> Result<Interpretation> {
        match code {
            1 => Ok(Interpretation::Int8),
            2 => Ok(Interpretation::UInt8),
            3 => Ok(Interpretation::Int16),
            4 => Ok(Interpretation::UInt16),
            5 => Ok(Interpretation::Int32),
            6 => Ok(Interpretation::UInt32),
            7 => Ok(Interpretation::Int64),
            8 => Ok(Interpretation::UInt64),
            9 => Ok(Interpretation::Double),
            10 => Ok(Interpretation::Float),
            _ => Err(Error::UnknownInterpretationCode(code)),
        }
    }

    /// Returns the width in bytes of one stored value.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::Interpretation;
    /// assert_eq!(2, Interpretation::Int16.size());
    /// assert_eq!(8, Interpretation::Double.size());
    /// ```
    pub fn size(self) -> usize {
        match self {
            Interpretation::Int8 | Interpretation::UInt8 => 1,
            Interpretation::Int16 | Interpretation::UInt16 => 2,
            Interpretation::Int32 | Interpretation::UInt32 | Interpretation::Float => 4,
            Interpretation::Int64 | Interpretation::UInt64 | Interpretation::Double => 8,
        }
    }

    /// Is this a float interpretation?
    ///
    /// Float dimensions are excluded from the run-length and significant-bits
    /// codecs by the compression chooser.
    pub fn is_float(self) -> bool {
        matches!(self, Interpretation::Float | Interpretation::Double)
    }

    /// Returns the C-style name of this interpretation, as used in schema
    /// documents and json output.
    pub fn name(self) -> &'static str {
        match self {
            Interpretation::Int8 => "int8_t",
            Interpretation::UInt8 => "uint8_t",
            Interpretation::Int16 => "int16_t",
            Interpretation::UInt16 => "uint16_t",
            Interpretation::Int32 => "int32_t",
            Interpretation::UInt32 => "uint32_t",
            Interpretation::Int64 => "int64_t",
            Interpretation::UInt64 => "uint64_t",
            Interpretation::Double => "double",
            Interpretation::Float => "float",
        }
    }

    /// Reads one value of this interpretation from the front of `buf`,
    /// widened to an f64.
    ///
    /// The bytes are taken in machine order; wire-format readers flip buffers
    /// before values are read.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::Interpretation;
    /// let buf = 257u16.to_ne_bytes();
    /// assert_eq!(257., Interpretation::UInt16.read(&buf));
    /// ```
    pub fn read(self, buf: &[u8]) -> f64 {
        match self {
            Interpretation::Int8 => f64::from(i8::from_ne_bytes([buf[0]])),
            Interpretation::UInt8 => f64::from(buf[0]),
            Interpretation::Int16 => f64::from(NativeEndian::read_i16(buf)),
            Interpretation::UInt16 => f64::from(NativeEndian::read_u16(buf)),
            Interpretation::Int32 => f64::from(NativeEndian::read_i32(buf)),
            Interpretation::UInt32 => f64::from(NativeEndian::read_u32(buf)),
            Interpretation::Int64 => NativeEndian::read_i64(buf) as f64,
            Interpretation::UInt64 => NativeEndian::read_u64(buf) as f64,
            Interpretation::Double => NativeEndian::read_f64(buf),
            Interpretation::Float => f64::from(NativeEndian::read_f32(buf)),
        }
    }

    /// Writes `value` into the front of `buf` in this interpretation.
    ///
    /// Integer targets round half away from zero (the behaviour of C's
    /// `lround`, which [f64::round] shares); float targets truncate precision.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::Interpretation;
    /// let mut buf = [0u8; 2];
    /// Interpretation::Int16.write(&mut buf, 2.5);
    /// assert_eq!(3., Interpretation::Int16.read(&buf));
    /// ```
    pub fn write(self, buf: &mut [u8], value: f64) {
        match self {
            Interpretation::Int8 => buf[0] = (value.round() as i8).to_ne_bytes()[0],
            Interpretation::UInt8 => buf[0] = value.round() as u8,
            Interpretation::Int16 => NativeEndian::write_i16(buf, value.round() as i16),
            Interpretation::UInt16 => NativeEndian::write_u16(buf, value.round() as u16),
            Interpretation::Int32 => NativeEndian::write_i32(buf, value.round() as i32),
            Interpretation::UInt32 => NativeEndian::write_u32(buf, value.round() as u32),
            Interpretation::Int64 => NativeEndian::write_i64(buf, value.round() as i64),
            Interpretation::UInt64 => NativeEndian::write_u64(buf, value.round() as u64),
            Interpretation::Double => NativeEndian::write_f64(buf, value),
            Interpretation::Float => NativeEndian::write_f32(buf, value as f32),
        }
    }
}
