//! GHT (geohash tree) codec adapter.
//!
//! There is no GHT implementation to link against, so this adapter only
//! carries opaque tree blobs through the wire format. Every operation that
//! must look inside a tree reports that the codec is unavailable, the same
//! behaviour as the original library built without its GHT dependency.

use crate::{Error, Result, Schema};

/// Encodes row-major point data as a geohash tree.
pub(crate) fn compress(_schema: &Schema, _data: &[u8]) -> Result<Vec<u8>> {
    Err(Error::NotImplemented("ght"))
}

/// Decodes a geohash tree blob back to row-major point data.
pub(crate) fn decompress(_schema: &Schema, _blob: &[u8], _npoints: u32) -> Result<Vec<u8>> {
    Err(Error::NotImplemented("ght"))
}
