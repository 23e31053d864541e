//! Patches: collections of points sharing one schema, stored and transmitted
//! as a single blob.
//!
//! A patch is a common header (schema, point count, X/Y bounds, stats) over
//! one of four bodies. Uncompressed row-major storage is the pivot of the
//! conversion lattice: every body can be materialized to it, and it can be
//! re-encoded into any other.

mod dimensional;
mod ght;
#[cfg(feature = "laz")]
mod laz;
mod uncompressed;

pub(crate) use uncompressed::filter_rows;

use crate::dimstats::DimStats;
use crate::point::flip_records;
use crate::{Bounds, Bytes, Endian, Error, Point, PointList, Result, Schema, Stats};
use log::warn;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Initial point capacity of a growable patch.
const DEFAULT_MAXPOINTS: usize = 64;

/// Size of the common wkb header: endian flag, pcid, compression, npoints.
const WKB_HEADER: usize = 1 + 4 + 4 + 4;

/// The in-patch encoding of a patch body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PatchCompression {
    /// Row-major uncompressed bytes.
    #[default]
    None,
    /// An opaque geohash tree.
    Ght,
    /// Column-major storage with a codec per dimension.
    Dimensional,
    /// An opaque laszip stream.
    Laz,
}

impl PatchCompression {
    /// Returns this compression's wire code.
    pub fn code(self) -> u32 {
        match self {
            PatchCompression::None => 0,
            PatchCompression::Ght => 1,
            PatchCompression::Dimensional => 2,
            PatchCompression::Laz => 3,
        }
    }

    /// Looks a compression up by its wire code.
    pub fn from_code(code: u32) -> Result<PatchCompression> {
        match code {
            0 => Ok(PatchCompression::None),
            1 => Ok(PatchCompression::Ght),
            2 => Ok(PatchCompression::Dimensional),
            3 => Ok(PatchCompression::Laz),
            _ => Err(Error::UnknownCompression(code)),
        }
    }

    /// Parses a schema metadata value ("none", "dimensional", "ght", "laz").
    ///
    /// Unrecognized values fall back to `None`, as the original library did.
    pub fn from_metadata(value: &str) -> PatchCompression {
        if value.eq_ignore_ascii_case("dimensional") {
            PatchCompression::Dimensional
        } else if value.eq_ignore_ascii_case("ght") {
            PatchCompression::Ght
        } else if value.eq_ignore_ascii_case("laz") {
            PatchCompression::Laz
        } else {
            if !value.is_empty() && !value.eq_ignore_ascii_case("none") {
                warn!("unrecognized compression metadata \"{}\"", value);
            }
            PatchCompression::None
        }
    }
}

/// The body of a patch, one case per codec.
#[derive(Clone, Debug)]
pub(crate) enum PatchData {
    /// Row-major records, point `i` at byte offset `i * schema.size()`.
    Uncompressed(Vec<u8>),
    /// One column per schema dimension.
    Dimensional(Vec<Bytes>),
    /// Opaque serialized geohash tree.
    Ght(Vec<u8>),
    /// Opaque laszip stream.
    Laz(Vec<u8>),
}

/// A collection of points sharing one schema.
///
/// # Examples
///
/// ```
/// use pointcloud::{Dimension, Interpretation, Patch, Point, PointList, Schema};
/// use std::sync::Arc;
///
/// let schema = Arc::new(Schema::new(1, 0, vec![
///     Dimension::new("X", Interpretation::Int32),
///     Dimension::new("Y", Interpretation::Int32),
/// ]));
/// let mut points = PointList::new();
/// points.push(Point::from_double_array(schema.clone(), &[1., 2.]).unwrap());
/// let patch = Patch::from_pointlist(&points).unwrap();
/// assert_eq!(1, patch.npoints());
/// assert_eq!(1., patch.bounds().xmin);
/// ```
#[derive(Clone, Debug)]
pub struct Patch {
    pub(crate) schema: Arc<Schema>,
    pub(crate) npoints: u32,
    pub(crate) bounds: Bounds,
    pub(crate) stats: Option<Stats>,
    pub(crate) data: PatchData,
}

impl Patch {
    /// Creates an empty, growable, uncompressed patch.
    ///
    /// The data buffer starts with room for 64 points and doubles as points
    /// are appended.
    pub fn new(schema: Arc<Schema>) -> Patch {
        let capacity = DEFAULT_MAXPOINTS * schema.size();
        Patch {
            schema: schema.clone(),
            npoints: 0,
            bounds: Bounds::default(),
            stats: Some(Stats::new(schema)),
            data: PatchData::Uncompressed(Vec::with_capacity(capacity)),
        }
    }

    /// Builds an uncompressed patch from a point list.
    ///
    /// All points must share the schema of the first; an empty list is an
    /// error. Bounds and stats are computed in the same pass.
    pub fn from_pointlist(points: &PointList) -> Result<Patch> {
        let (schema, data) = uncompressed::data_from_pointlist(points)?;
        Patch::from_uncompressed_data(schema, data)
    }

    /// Builds an uncompressed patch directly from row-major bytes.
    pub(crate) fn from_uncompressed_data(schema: Arc<Schema>, data: Vec<u8>) -> Result<Patch> {
        let npoints = (data.len() / schema.size().max(1)) as u32;
        let bounds = uncompressed::compute_bounds(&schema, &data)?;
        let stats = Stats::calculate(&schema, &data);
        Ok(Patch {
            schema,
            npoints,
            bounds,
            stats: Some(stats),
            data: PatchData::Uncompressed(data),
        })
    }

    /// Appends a point to a growable uncompressed patch.
    ///
    /// Bounds grow incrementally; stats are dropped and can be rebuilt with
    /// [Patch::compute_stats].
    pub fn push_point(&mut self, point: &Point) -> Result<()> {
        if point.schema().pcid() != self.schema.pcid() {
            return Err(Error::PcidMismatch {
                wkb: point.schema().pcid(),
                schema: self.schema.pcid(),
            });
        }
        let (x, y) = (point.x()?, point.y()?);
        match &mut self.data {
            PatchData::Uncompressed(data) => data.extend_from_slice(point.data()),
            _ => {
                return Err(Error::CannotConvert {
                    from: self.compression(),
                    to: PatchCompression::None,
                })
            }
        }
        self.npoints += 1;
        self.bounds.grow(x, y);
        self.stats = None;
        Ok(())
    }

    /// Returns this patch's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the number of points in this patch.
    pub fn npoints(&self) -> u32 {
        self.npoints
    }

    /// Is this patch empty?
    pub fn is_empty(&self) -> bool {
        self.npoints == 0
    }

    /// Returns this patch's X/Y extent.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Returns this patch's per-dimension stats, if they are known.
    ///
    /// Stats are absent after appending points and on patches deserialized
    /// from codecs that cannot be materialized.
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    /// Returns the encoding of this patch's body.
    pub fn compression(&self) -> PatchCompression {
        match self.data {
            PatchData::Uncompressed(_) => PatchCompression::None,
            PatchData::Dimensional(_) => PatchCompression::Dimensional,
            PatchData::Ght(_) => PatchCompression::Ght,
            PatchData::Laz(_) => PatchCompression::Laz,
        }
    }

    /// Returns this patch's row-major point bytes, materializing compressed
    /// bodies as needed.
    pub(crate) fn uncompressed_data(&self) -> Result<Cow<'_, [u8]>> {
        match &self.data {
            PatchData::Uncompressed(data) => Ok(Cow::Borrowed(data.as_slice())),
            PatchData::Dimensional(columns) => Ok(Cow::Owned(dimensional::data_from_columns(
                &self.schema,
                columns,
            )?)),
            PatchData::Ght(blob) => Ok(Cow::Owned(ght::decompress(
                &self.schema,
                blob,
                self.npoints,
            )?)),
            PatchData::Laz(blob) => {
                #[cfg(feature = "laz")]
                {
                    return Ok(Cow::Owned(laz::decompress(
                        &self.schema,
                        blob,
                        self.npoints,
                    )?));
                }
                #[cfg(not(feature = "laz"))]
                {
                    let _ = blob;
                    return Err(Error::NotImplemented("laz"));
                }
            }
        }
    }

    /// Returns this patch's dimensional columns, if that is how it is stored.
    pub(crate) fn columns(&self) -> Option<&[Bytes]> {
        match &self.data {
            PatchData::Dimensional(columns) => Some(columns),
            _ => None,
        }
    }

    /// Extracts every point of this patch into a point list.
    pub fn to_pointlist(&self) -> Result<PointList> {
        let data = self.uncompressed_data()?;
        uncompressed::to_pointlist(&self.schema, &data)
    }

    /// Copies the point at `index` out of this patch.
    pub fn point(&self, index: usize) -> Result<Point> {
        if index >= self.npoints as usize {
            return Err(Error::PointOutOfRange {
                index,
                npoints: self.npoints,
            });
        }
        let data = self.uncompressed_data()?;
        let size = self.schema.size();
        Point::from_data(self.schema.clone(), &data[index * size..(index + 1) * size])
    }

    /// Materializes this patch as an uncompressed patch.
    pub fn to_uncompressed(&self) -> Result<Patch> {
        if let PatchData::Uncompressed(_) = self.data {
            return Ok(self.clone());
        }
        let data = self.uncompressed_data()?.into_owned();
        Ok(Patch {
            schema: self.schema.clone(),
            npoints: self.npoints,
            bounds: self.bounds,
            stats: self.stats.clone(),
            data: PatchData::Uncompressed(data),
        })
    }

    /// Re-encodes this patch as a dimensional patch, choosing per-dimension
    /// codecs with `dimstats` (or a throwaway sampler when none is given).
    pub fn to_dimensional(&self, dimstats: Option<&mut DimStats>) -> Result<Patch> {
        let data = self.uncompressed_data()?;
        let columns = dimensional::columns_from_data(&self.schema, &data);
        let mut local = DimStats::new(&self.schema);
        let dimstats = dimstats.unwrap_or(&mut local);
        let compressed = dimensional::compress_columns(&columns, &self.schema, dimstats)?;
        Ok(Patch {
            schema: self.schema.clone(),
            npoints: self.npoints,
            bounds: self.bounds,
            stats: self.stats.clone(),
            data: PatchData::Dimensional(compressed),
        })
    }

    /// Re-encodes this patch as a GHT patch.
    ///
    /// No GHT codec is available in this build, so this returns the
    /// not-implemented error.
    pub fn to_ght(&self) -> Result<Patch> {
        let data = self.uncompressed_data()?;
        let blob = ght::compress(&self.schema, &data)?;
        Ok(Patch {
            schema: self.schema.clone(),
            npoints: self.npoints,
            bounds: self.bounds,
            stats: self.stats.clone(),
            data: PatchData::Ght(blob),
        })
    }

    /// Re-encodes this patch as a LAZ patch. Requires the `laz` feature.
    pub fn to_laz(&self) -> Result<Patch> {
        #[cfg(feature = "laz")]
        {
            let data = self.uncompressed_data()?;
            let blob = laz::compress(&self.schema, &data)?;
            return Ok(Patch {
                schema: self.schema.clone(),
                npoints: self.npoints,
                bounds: self.bounds,
                stats: self.stats.clone(),
                data: PatchData::Laz(blob),
            });
        }
        #[cfg(not(feature = "laz"))]
        {
            return Err(Error::NotImplemented("laz"));
        }
    }

    /// Compresses this patch according to its schema's preferred encoding.
    ///
    /// Supported moves: uncompressed to uncompressed (identity), uncompressed
    /// to dimensional, and dimensional to dimensional (a recompression that
    /// refines the per-dimension codec choice). Anything else is an error;
    /// the explicit converters reach the opaque codecs.
    pub fn compress(&self, dimstats: Option<&mut DimStats>) -> Result<Patch> {
        match (self.schema.compression(), self.compression()) {
            (PatchCompression::None, PatchCompression::None) => Ok(self.clone()),
            (PatchCompression::Dimensional, PatchCompression::None) => {
                self.to_dimensional(dimstats)
            }
            (PatchCompression::Dimensional, PatchCompression::Dimensional) => {
                let columns = self
                    .columns()
                    .map(dimensional::decompress_columns)
                    .transpose()?
                    .unwrap_or_default();
                let mut local = DimStats::new(&self.schema);
                let dimstats = dimstats.unwrap_or(&mut local);
                let compressed =
                    dimensional::compress_columns(&columns, &self.schema, dimstats)?;
                Ok(Patch {
                    schema: self.schema.clone(),
                    npoints: self.npoints,
                    bounds: self.bounds,
                    stats: self.stats.clone(),
                    data: PatchData::Dimensional(compressed),
                })
            }
            (to, from) => Err(Error::CannotConvert { from, to }),
        }
    }

    /// Merges a list of patches into one uncompressed patch.
    ///
    /// Every input must carry the same schema pcid. Bounds are unioned from
    /// the inputs and stats recomputed over the merged data.
    pub fn from_patchlist(patches: &[Patch]) -> Result<Patch> {
        let first = patches.first().ok_or(Error::EmptyPatchList)?;
        let schema = first.schema.clone();
        let total: usize = patches.iter().map(|patch| patch.npoints as usize).sum();
        let mut data = Vec::with_capacity(total * schema.size());
        let mut bounds = Bounds::default();
        for patch in patches {
            if patch.schema.pcid() != schema.pcid() {
                return Err(Error::PatchListPcidMismatch(
                    schema.pcid(),
                    patch.schema.pcid(),
                ));
            }
            bounds.merge(&patch.bounds);
            data.extend_from_slice(&patch.uncompressed_data()?);
        }
        let stats = Stats::calculate(&schema, &data);
        Ok(Patch {
            schema,
            npoints: total as u32,
            bounds,
            stats: Some(stats),
            data: PatchData::Uncompressed(data),
        })
    }

    /// Returns a new patch holding points `[first, first + count)`.
    ///
    /// Out-of-bounds indices clamp to the valid sub-range; an empty result is
    /// a valid zero-point patch. The result is always uncompressed.
    pub fn range(&self, first: usize, count: usize) -> Result<Patch> {
        let data = self.uncompressed_data()?;
        let size = self.schema.size();
        let npoints = self.npoints as usize;
        let start = first.min(npoints);
        let end = first.saturating_add(count).min(npoints);
        Patch::from_uncompressed_data(self.schema.clone(), data[start * size..end * size].to_vec())
    }

    /// Rewrites this patch under a new schema.
    ///
    /// When the new schema is byte-compatible ("similar": same dimension
    /// count and interpretations at the same positions) the body is reused as
    /// is. Otherwise, when `default_value` is given, the patch is rebuilt
    /// dimension by dimension: values copy across by dimension name through
    /// the value codec, and output dimensions with no same-named input are
    /// filled with the default. With no `default_value` a dissimilar schema
    /// is an error.
    pub fn set_schema(&self, schema: Arc<Schema>, default_value: Option<f64>) -> Result<Patch> {
        if self.schema.is_similar(&schema) {
            // Clone the body, swap the schema; no data transformation.
            return Ok(Patch {
                schema,
                npoints: self.npoints,
                bounds: self.bounds,
                stats: self.stats.clone(),
                data: self.data.clone(),
            });
        }

        let default_value = match default_value {
            Some(value) => value,
            None => return Err(Error::SchemaNotSimilar(schema.pcid())),
        };

        let data = self.uncompressed_data()?;
        let old_size = self.schema.size();
        let mut new_data = vec![0; schema.size() * self.npoints as usize];
        for (record, new_record) in data
            .chunks_exact(old_size)
            .zip(new_data.chunks_exact_mut(schema.size()))
        {
            for dimension in schema.dims() {
                let value = match self.schema.dimension_by_name(&dimension.name) {
                    Ok(source) => source.value_from_record(record),
                    Err(_) => default_value,
                };
                dimension.value_into_record(new_record, value);
            }
        }
        Patch::from_uncompressed_data(schema, new_data)
    }

    /// Recomputes this patch's X/Y bounds from its data.
    pub fn compute_extent(&mut self) -> Result<()> {
        self.bounds = match &self.data {
            PatchData::Uncompressed(data) => uncompressed::compute_bounds(&self.schema, data)?,
            PatchData::Dimensional(columns) => {
                dimensional::compute_bounds(&self.schema, columns)?
            }
            _ => uncompressed::compute_bounds(&self.schema, &self.uncompressed_data()?)?,
        };
        Ok(())
    }

    /// Recomputes this patch's per-dimension stats from its data.
    pub fn compute_stats(&mut self) -> Result<()> {
        self.stats = Some(match &self.data {
            PatchData::Dimensional(columns) => {
                dimensional::compute_stats(&self.schema, columns, self.npoints)?
            }
            _ => Stats::calculate(&self.schema, &self.uncompressed_data()?),
        });
        Ok(())
    }

    /// Parses a patch from its wkb form.
    ///
    /// The caller resolves the schema (by the pcid in the header) before
    /// handing it in; a pcid mismatch is an error. Bounds and stats are
    /// recomputed where the body permits.
    pub fn from_wkb(schema: Arc<Schema>, wkb: &[u8]) -> Result<Patch> {
        if wkb.len() < WKB_HEADER {
            return Err(Error::WkbTruncated(wkb.len()));
        }
        let endian = Endian::from_flag(wkb[0]);
        let pcid = endian.read_u32(&wkb[1..]);
        if pcid != schema.pcid() {
            return Err(Error::PcidMismatch {
                wkb: pcid,
                schema: schema.pcid(),
            });
        }
        let compression = PatchCompression::from_code(endian.read_u32(&wkb[5..]))?;
        let npoints = endian.read_u32(&wkb[9..]);
        let body = &wkb[WKB_HEADER..];

        match compression {
            PatchCompression::None => {
                let expected = schema.size() * npoints as usize;
                if body.len() != expected {
                    return Err(Error::WkbSize {
                        expected,
                        actual: body.len(),
                    });
                }
                let mut data = body.to_vec();
                if endian != Endian::native() {
                    flip_records(&mut data, &schema);
                }
                Patch::from_uncompressed_data(schema, data)
            }
            PatchCompression::Dimensional => {
                let mut columns = Vec::with_capacity(schema.ndims());
                let mut offset = 0;
                for dimension in schema.dims() {
                    let slice = body
                        .get(offset..)
                        .ok_or(Error::WkbTruncated(wkb.len()))?;
                    let (column, consumed) =
                        Bytes::deserialize(slice, dimension, npoints, endian)?;
                    columns.push(column);
                    offset += consumed;
                }
                let bounds = dimensional::compute_bounds(&schema, &columns)?;
                let stats = dimensional::compute_stats(&schema, &columns, npoints)?;
                Ok(Patch {
                    schema,
                    npoints,
                    bounds,
                    stats: Some(stats),
                    data: PatchData::Dimensional(columns),
                })
            }
            PatchCompression::Ght => {
                let blob = read_blob_body(body, endian)?;
                warn!("ght patch carried as an opaque blob, bounds and stats unavailable");
                Ok(Patch {
                    schema,
                    npoints,
                    bounds: Bounds::default(),
                    stats: None,
                    data: PatchData::Ght(blob),
                })
            }
            PatchCompression::Laz => {
                #[cfg(feature = "laz")]
                {
                    let blob = read_blob_body(body, endian)?;
                    let mut patch = Patch {
                        schema,
                        npoints,
                        bounds: Bounds::default(),
                        stats: None,
                        data: PatchData::Laz(blob),
                    };
                    patch.compute_extent()?;
                    patch.compute_stats()?;
                    return Ok(patch);
                }
                #[cfg(not(feature = "laz"))]
                {
                    return Err(Error::NotImplemented("laz"));
                }
            }
        }
    }

    /// Serializes this patch to its wkb form, in machine endianness.
    pub fn to_wkb(&self) -> Vec<u8> {
        let mut wkb = Vec::with_capacity(WKB_HEADER);
        wkb.push(Endian::native().to_flag());
        wkb.extend_from_slice(&self.schema.pcid().to_ne_bytes());
        wkb.extend_from_slice(&self.compression().code().to_ne_bytes());
        wkb.extend_from_slice(&self.npoints.to_ne_bytes());
        match &self.data {
            PatchData::Uncompressed(data) => wkb.extend_from_slice(data),
            PatchData::Dimensional(columns) => {
                for column in columns {
                    column.serialize(&mut wkb);
                }
            }
            PatchData::Ght(blob) | PatchData::Laz(blob) => {
                wkb.extend_from_slice(&(blob.len() as u32).to_ne_bytes());
                wkb.extend_from_slice(blob);
            }
        }
        wkb
    }

    /// Returns the OGC WKB POLYGON of this patch's envelope: the five-corner
    /// closed ring of its bounds, with an embedded SRID when the schema has
    /// one.
    pub fn to_geometry_wkb_envelope(&self) -> Vec<u8> {
        const SRID_MASK: u32 = 0x2000_0000;
        let mut wkb_type: u32 = 3;
        let srid = (self.schema.srid() > 0).then(|| self.schema.srid());
        if srid.is_some() {
            wkb_type |= SRID_MASK;
        }
        let bounds = &self.bounds;
        let ring = [
            (bounds.xmin, bounds.ymin),
            (bounds.xmin, bounds.ymax),
            (bounds.xmax, bounds.ymax),
            (bounds.xmax, bounds.ymin),
            (bounds.xmin, bounds.ymin),
        ];

        let mut wkb = Vec::with_capacity(1 + 4 + 4 + 4 + 4 + ring.len() * 16);
        wkb.push(Endian::native().to_flag());
        wkb.extend_from_slice(&wkb_type.to_ne_bytes());
        if let Some(srid) = srid {
            wkb.extend_from_slice(&srid.to_ne_bytes());
        }
        wkb.extend_from_slice(&1u32.to_ne_bytes()); // one ring
        wkb.extend_from_slice(&(ring.len() as u32).to_ne_bytes());
        for (x, y) in ring {
            wkb.extend_from_slice(&x.to_ne_bytes());
            wkb.extend_from_slice(&y.to_ne_bytes());
        }
        wkb
    }
}

/// Reads a `u32 size + bytes` blob body (the GHT and LAZ wire layout).
fn read_blob_body(body: &[u8], endian: Endian) -> Result<Vec<u8>> {
    if body.len() < 4 {
        return Err(Error::WkbTruncated(body.len()));
    }
    let size = endian.read_u32(body) as usize;
    if body.len() < 4 + size {
        return Err(Error::WkbTruncated(body.len()));
    }
    Ok(body[4..4 + size].to_vec())
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {} : ", self.schema.pcid())?;
        match self.to_pointlist() {
            Ok(points) => {
                for (index, point) in points.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "(")?;
                    for (position, dimension) in self.schema.dims().iter().enumerate() {
                        if position > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", point.value(dimension))?;
                    }
                    write!(f, ")")?;
                }
            }
            Err(_) => write!(f, "<{} opaque points>", self.npoints)?,
        }
        write!(f, " ]")
    }
}
