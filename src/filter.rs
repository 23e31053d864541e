//! Comparator-driven patch filtering.

use crate::patch::PatchData;
use crate::stats::DoubleStat;
use crate::{Bitmap, Bytes, Dimension, Patch, Result, Stats};

/// A comparator over one dimension's values.
///
/// All comparisons are strict: `Gt` is `x > v`, `Lt` is `x < v`, `Equal` is
/// `x == v`, and `Between` is `v1 < x < v2` (exclusive on both sides).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Filter {
    /// Selects values greater than the operand.
    Gt(f64),
    /// Selects values less than the operand.
    Lt(f64),
    /// Selects values equal to the operand.
    Equal(f64),
    /// Selects values strictly between the two operands.
    Between(f64, f64),
}

impl Filter {
    /// Does `value` satisfy this comparator?
    pub fn matches(self, value: f64) -> bool {
        match self {
            Filter::Gt(operand) => value > operand,
            Filter::Lt(operand) => value < operand,
            Filter::Equal(operand) => value == operand,
            Filter::Between(low, high) => low < value && value < high,
        }
    }

    /// Puts `Between` operands in ascending order.
    fn normalized(self) -> Filter {
        match self {
            Filter::Between(low, high) if low > high => Filter::Between(high, low),
            other => other,
        }
    }

    /// Maps the operands from scaled to raw units for a dimension.
    ///
    /// Scales are positive, so the comparison is order-preserving.
    fn unscaled(self, dimension: &Dimension) -> Filter {
        match self {
            Filter::Gt(operand) => Filter::Gt(dimension.unscale_unoffset(operand)),
            Filter::Lt(operand) => Filter::Lt(dimension.unscale_unoffset(operand)),
            Filter::Equal(operand) => Filter::Equal(dimension.unscale_unoffset(operand)),
            Filter::Between(low, high) => Filter::Between(
                dimension.unscale_unoffset(low),
                dimension.unscale_unoffset(high),
            ),
        }
    }

    /// Can any value inside `[min, max]` satisfy this comparator?
    fn can_match(self, min: f64, max: f64) -> bool {
        match self {
            Filter::Gt(operand) => max > operand,
            Filter::Lt(operand) => min < operand,
            Filter::Equal(operand) => min <= operand && operand <= max,
            Filter::Between(low, high) => min < high && max > low,
        }
    }
}

impl Patch {
    /// Filters this patch on the dimension at `position`.
    ///
    /// Operands are in scaled units. The result preserves point order and has
    /// consistent bounds and stats; when the patch stats prove that nothing
    /// can match, an empty patch is returned without touching the data.
    /// Uncompressed and dimensional patches filter in their own
    /// representation; opaque codecs materialize first and return an
    /// uncompressed result.
    pub fn filter(&self, position: usize, filter: Filter) -> Result<Patch> {
        let filter = filter.normalized();
        let dimension = self.schema.dimension(position)?.clone();

        if let Some(stats) = &self.stats {
            let min = stats.minimum(position)?;
            let max = stats.maximum(position)?;
            if !filter.can_match(min, max) {
                return Ok(Patch::new(self.schema.clone()));
            }
        }

        match &self.data {
            PatchData::Uncompressed(data) => {
                let map = bitmap_over_rows(self, &dimension, filter, data);
                if map.nset() == 0 {
                    return Ok(Patch::new(self.schema.clone()));
                }
                let filtered = crate::patch::filter_rows(&self.schema, data, &map);
                Patch::from_uncompressed_data(self.schema.clone(), filtered)
            }
            PatchData::Dimensional(columns) => {
                let map = columns[position].bitmap(filter.unscaled(&dimension))?;
                if map.nset() == 0 {
                    return Ok(Patch::new(self.schema.clone()));
                }
                self.filter_columns(columns, &map)
            }
            PatchData::Ght(_) | PatchData::Laz(_) => {
                self.to_uncompressed()?.filter(position, filter)
            }
        }
    }

    /// Filters this patch on a named dimension.
    pub fn filter_by_name(&self, name: &str, filter: Filter) -> Result<Patch> {
        let position = self.schema.dimension_by_name(name)?.position;
        self.filter(position, filter)
    }

    /// Applies a bitmap to every column, rebuilding bounds and stats from
    /// the per-column scans done during the copy.
    fn filter_columns(&self, columns: &[Bytes], map: &Bitmap) -> Result<Patch> {
        let npoints = map.nset();
        let mut stats = Stats::new(self.schema.clone());
        let mut bounds = crate::Bounds::default();
        let mut filtered = Vec::with_capacity(columns.len());
        for (dimension, column) in self.schema.dims().iter().zip(columns.iter()) {
            let mut stat = DoubleStat::new();
            filtered.push(column.filter(map, Some(&mut stat))?);

            let min = dimension.scale_offset(stat.min);
            let max = dimension.scale_offset(stat.max);
            let avg = dimension.scale_offset(stat.sum / f64::from(npoints));
            if Some(dimension.position) == self.schema.x_position() {
                bounds.xmin = min;
                bounds.xmax = max;
            }
            if Some(dimension.position) == self.schema.y_position() {
                bounds.ymin = min;
                bounds.ymax = max;
            }
            stats.set_dimension(dimension.position, min, max, avg)?;
        }
        Ok(Patch {
            schema: self.schema.clone(),
            npoints,
            bounds,
            stats: Some(stats),
            data: PatchData::Dimensional(filtered),
        })
    }
}

/// Builds a bitmap by scanning one dimension of row-major data.
///
/// The values compared are scaled, matching the operands.
fn bitmap_over_rows(patch: &Patch, dimension: &Dimension, filter: Filter, data: &[u8]) -> Bitmap {
    let mut map = Bitmap::new(patch.npoints());
    for (index, record) in data.chunks_exact(patch.schema().size()).enumerate() {
        map.filter(filter, index, dimension.value_from_record(record));
    }
    map
}
