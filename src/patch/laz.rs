//! LAZ codec adapter, bridging to the laz crate.
//!
//! Patch schemas are arbitrary, so whole point records are compressed as
//! laszip extra-bytes items: a record layout of one `Byte(record_size)` item,
//! rebuilt deterministically from the schema on both sides. The stored blob
//! is the bare laszip stream (chunk table offset plus chunks).

use crate::{Error, Result, Schema};
use laz::{LasZipCompressor, LasZipDecompressor, LazItemRecordBuilder, LazItemType, LazVlr};
use std::io::Cursor;

/// Builds the laszip record layout for a schema: one extra-bytes item
/// spanning the whole record.
fn laz_vlr(schema: &Schema) -> Result<LazVlr> {
    let record_size = u16::try_from(schema.size())
        .map_err(|_| Error::NotImplemented("laz for records wider than 65535 bytes"))?;
    let mut items = LazItemRecordBuilder::new();
    items.add_item(LazItemType::Byte(record_size));
    Ok(LazVlr::from_laz_items(items.build()))
}

/// Compresses row-major point data into a laszip stream.
pub(crate) fn compress(schema: &Schema, data: &[u8]) -> Result<Vec<u8>> {
    let vlr = laz_vlr(schema)?;
    let mut compressor = LasZipCompressor::new(Cursor::new(Vec::new()), vlr)?;
    for record in data.chunks_exact(schema.size()) {
        compressor.compress_one(record)?;
    }
    compressor.done()?;
    Ok(compressor.into_inner().into_inner())
}

/// Decompresses a laszip stream back to `npoints` row-major records.
pub(crate) fn decompress(schema: &Schema, blob: &[u8], npoints: u32) -> Result<Vec<u8>> {
    let vlr = laz_vlr(schema)?;
    let mut decompressor = LasZipDecompressor::new(Cursor::new(blob), vlr)?;
    let mut data = vec![0; schema.size() * npoints as usize];
    for record in data.chunks_exact_mut(schema.size()) {
        decompressor.decompress_one(record)?;
    }
    Ok(data)
}
