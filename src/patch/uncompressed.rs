//! Row-major storage helpers for uncompressed patches.

use crate::{Bitmap, Bounds, Error, Point, PointList, Result, Schema};
use std::sync::Arc;

/// Packs a point list into row-major bytes, checking that every point shares
/// the schema of the first.
pub(crate) fn data_from_pointlist(points: &PointList) -> Result<(Arc<Schema>, Vec<u8>)> {
    let first = points.get(0).ok_or(Error::EmptyPointList)?;
    let schema = first.schema().clone();
    let mut data = Vec::with_capacity(schema.size() * points.len());
    for point in points {
        if point.schema().pcid() != schema.pcid() {
            return Err(Error::PcidMismatch {
                wkb: point.schema().pcid(),
                schema: schema.pcid(),
            });
        }
        data.extend_from_slice(point.data());
    }
    Ok((schema, data))
}

/// Unpacks row-major bytes into a point list.
pub(crate) fn to_pointlist(schema: &Arc<Schema>, data: &[u8]) -> Result<PointList> {
    let size = schema.size();
    let mut points = PointList::with_capacity(data.len() / size.max(1));
    for record in data.chunks_exact(size) {
        points.push(Point::from_data(schema.clone(), record)?);
    }
    Ok(points)
}

/// Scans the X and Y columns of row-major data for the patch extent.
pub(crate) fn compute_bounds(schema: &Schema, data: &[u8]) -> Result<Bounds> {
    let x = schema.x_dimension()?;
    let y = schema.y_dimension()?;
    let mut bounds = Bounds::default();
    for record in data.chunks_exact(schema.size()) {
        bounds.grow(x.value_from_record(record), y.value_from_record(record));
    }
    Ok(bounds)
}

/// Copies the selected rows of row-major data into a new buffer.
pub(crate) fn filter_rows(schema: &Schema, data: &[u8], map: &Bitmap) -> Vec<u8> {
    let size = schema.size();
    let mut filtered = Vec::with_capacity(map.nset() as usize * size);
    for (index, record) in data.chunks_exact(size).enumerate() {
        if map.get(index) {
            filtered.extend_from_slice(record);
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dimension, Interpretation};

    fn schema() -> Arc<Schema> {
        let mut x = Dimension::new("X", Interpretation::Int32);
        x.scale = 0.01;
        let mut y = Dimension::new("Y", Interpretation::Int32);
        y.scale = 0.01;
        Arc::new(Schema::new(0, 0, vec![x, y]))
    }

    fn pointlist(schema: &Arc<Schema>, values: &[[f64; 2]]) -> PointList {
        values
            .iter()
            .map(|pair| Point::from_double_array(schema.clone(), pair).unwrap())
            .collect()
    }

    #[test]
    fn pointlist_round_trip() {
        let schema = schema();
        let points = pointlist(&schema, &[[0.02, 0.03], [0.08, 0.01]]);
        let (schema, data) = data_from_pointlist(&points).unwrap();
        assert_eq!(16, data.len());
        let back = to_pointlist(&schema, &data).unwrap();
        assert_eq!(2, back.len());
        assert_eq!(0.08, back.get(1).unwrap().x().unwrap());
    }

    #[test]
    fn empty_pointlist_is_an_error() {
        assert!(matches!(
            data_from_pointlist(&PointList::new()),
            Err(Error::EmptyPointList)
        ));
    }

    #[test]
    fn bounds_scan() {
        let schema = schema();
        let points = pointlist(&schema, &[[0.02, 0.03], [0.08, 0.01]]);
        let (schema, data) = data_from_pointlist(&points).unwrap();
        let bounds = compute_bounds(&schema, &data).unwrap();
        assert_eq!(0.02, bounds.xmin);
        assert_eq!(0.08, bounds.xmax);
        assert_eq!(0.01, bounds.ymin);
        assert_eq!(0.03, bounds.ymax);
    }

    #[test]
    fn row_filter() {
        let schema = schema();
        let points = pointlist(&schema, &[[0.02, 0.03], [0.08, 0.01], [0.05, 0.05]]);
        let (schema, data) = data_from_pointlist(&points).unwrap();
        let mut map = Bitmap::new(3);
        map.set(0, true);
        map.set(2, true);
        let filtered = filter_rows(&schema, &data, &map);
        let back = to_pointlist(&schema, &filtered).unwrap();
        assert_eq!(2, back.len());
        assert_eq!(0.02, back.get(0).unwrap().x().unwrap());
        assert_eq!(0.05, back.get(1).unwrap().x().unwrap());
    }
}
