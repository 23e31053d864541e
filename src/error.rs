//! Crate-specific errors.

use thiserror::Error;

/// Crate-specific errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The schema XML document could not be parsed.
    #[error("unable to parse schema xml: {0}")]
    SchemaXml(String),

    /// Two dimensions in a schema document claimed the same position.
    #[error("schema dimension at position {0} is declared twice")]
    DuplicatePosition(u32),

    /// A dimension position was outside the dense [1, ndims] range.
    #[error("schema dimension states position {position}, but the schema has {ndims} dimensions")]
    PositionOutOfRange {
        /// The 1-based position from the document.
        position: u32,
        /// The number of dimensions in the document.
        ndims: usize,
    },

    /// The schema has no X or Y dimension but the operation needs coordinates.
    #[error("schema does not include {0} coordinate dimension")]
    MissingCoordinate(&'static str),

    /// An interpretation string was not recognized.
    #[error("unknown interpretation: {0}")]
    UnknownInterpretation(String),

    /// An interpretation wire code was not recognized.
    #[error("unknown interpretation code: {0}")]
    UnknownInterpretationCode(u32),

    /// No dimension with the given name.
    #[error("no dimension named \"{0}\"")]
    UnknownDimension(String),

    /// A dimension index was past the end of the schema.
    #[error("dimension index {index} out of range for schema with {ndims} dimensions")]
    DimensionOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of dimensions in the schema.
        ndims: usize,
    },

    /// The number of values did not match the number of schema dimensions.
    #[error("number of values ({nvalues}) does not match number of dimensions ({ndims})")]
    ValueCountMismatch {
        /// The number of values provided.
        nvalues: usize,
        /// The number of dimensions in the schema.
        ndims: usize,
    },

    /// A wkb buffer disagreed with the size the schema implies.
    #[error("wkb size {actual} does not match expected size {expected}")]
    WkbSize {
        /// The size implied by the schema and point count.
        expected: usize,
        /// The size of the buffer.
        actual: usize,
    },

    /// A wkb buffer was too short to hold its own header.
    #[error("wkb buffer of {0} bytes is truncated")]
    WkbTruncated(usize),

    /// The pcid baked into a wkb did not match the schema handed in.
    #[error("wkb pcid ({wkb}) is not consistent with schema pcid ({schema})")]
    PcidMismatch {
        /// The pcid from the wkb header.
        wkb: u32,
        /// The pcid of the schema.
        schema: u32,
    },

    /// Patches with different schemas cannot be merged.
    #[error("inconsistent pcids in patch list ({0} vs {1})")]
    PatchListPcidMismatch(u32, u32),

    /// An unknown patch compression code.
    #[error("unknown patch compression code: {0}")]
    UnknownCompression(u32),

    /// An unknown per-dimension compression code.
    #[error("unknown dimensional compression code: {0}")]
    UnknownDimCompression(u8),

    /// Run-length decoding produced a different number of points than stored.
    #[error("run-length decode produced {decoded} points, expected {expected}")]
    RunLengthMismatch {
        /// The sum of the run counts.
        decoded: u32,
        /// The point count stored on the column.
        expected: u32,
    },

    /// The target schema is not similar and reinterpretation was not requested.
    #[error("schema {0} has a different layout and reinterpretation was not requested")]
    SchemaNotSimilar(u32),

    /// An empty point list cannot become a patch.
    #[error("cannot build a patch from an empty point list")]
    EmptyPointList,

    /// An empty patch list cannot be merged.
    #[error("cannot merge an empty patch list")]
    EmptyPatchList,

    /// A point index was past the end of a patch.
    #[error("point index {index} out of range for patch with {npoints} points")]
    PointOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of points in the patch.
        npoints: u32,
    },

    /// A required compression codec is not compiled in.
    #[error("{0} support is not enabled")]
    NotImplemented(&'static str),

    /// The requested patch conversion is not part of the compression lattice.
    #[error("cannot convert patch compression {from:?} to {to:?}")]
    CannotConvert {
        /// The compression of the input patch.
        from: crate::PatchCompression,
        /// The compression requested by the schema.
        to: crate::PatchCompression,
    },

    /// A hex string had a bad length or bad characters.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Wraps [std::io::Error].
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wraps [laz::LasZipError].
    #[cfg(feature = "laz")]
    #[error("laszip error: {0}")]
    Laz(#[from] laz::LasZipError),
}
