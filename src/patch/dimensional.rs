//! Column-major storage helpers for dimensional patches.

use crate::dimstats::DimStats;
use crate::stats::DoubleStat;
use crate::{Bounds, Bytes, Result, Schema, Stats};
use std::sync::Arc;

/// Pivots row-major point data into one raw column per dimension.
pub(crate) fn columns_from_data(schema: &Schema, data: &[u8]) -> Vec<Bytes> {
    let npoints = (data.len() / schema.size().max(1)) as u32;
    schema
        .dims()
        .iter()
        .map(|dimension| {
            let mut column = Bytes::new(dimension, npoints);
            for (record, target) in data
                .chunks_exact(schema.size())
                .zip(column.bytes.chunks_exact_mut(dimension.size))
            {
                target.copy_from_slice(
                    &record[dimension.byte_offset..dimension.byte_offset + dimension.size],
                );
            }
            column
        })
        .collect()
}

/// Pivots columns back into row-major point data, decoding as needed.
pub(crate) fn data_from_columns(schema: &Schema, columns: &[Bytes]) -> Result<Vec<u8>> {
    let npoints = columns.first().map(|column| column.npoints).unwrap_or(0) as usize;
    let mut data = vec![0; schema.size() * npoints];
    for (dimension, column) in schema.dims().iter().zip(columns.iter()) {
        let raw = column.decode()?;
        for (value, record) in raw
            .bytes
            .chunks_exact(dimension.size)
            .zip(data.chunks_exact_mut(schema.size()))
        {
            record[dimension.byte_offset..dimension.byte_offset + dimension.size]
                .copy_from_slice(value);
        }
    }
    Ok(data)
}

/// Encodes every column with the codec the stats recommend.
///
/// Fresh raw columns are sampled into `stats` first, so early patches teach
/// the chooser while being compressed by it.
pub(crate) fn compress_columns(
    columns: &[Bytes],
    schema: &Schema,
    stats: &mut DimStats,
) -> Result<Vec<Bytes>> {
    if !stats.is_complete() {
        stats.update(columns, schema)?;
    }
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| column.encode(stats.recommendation(index)))
        .collect()
}

/// Decodes every column to its raw state.
pub(crate) fn decompress_columns(columns: &[Bytes]) -> Result<Vec<Bytes>> {
    columns.iter().map(|column| column.decode()).collect()
}

/// Computes the patch extent from the X and Y columns alone.
pub(crate) fn compute_bounds(schema: &Schema, columns: &[Bytes]) -> Result<Bounds> {
    let x = schema.x_dimension()?;
    let y = schema.y_dimension()?;
    let (xmin, xmax, _) = columns[x.position].minmax()?;
    let (ymin, ymax, _) = columns[y.position].minmax()?;
    Ok(Bounds {
        xmin: x.scale_offset(xmin),
        ymin: y.scale_offset(ymin),
        xmax: x.scale_offset(xmax),
        ymax: y.scale_offset(ymax),
    })
}

/// Computes full patch stats from per-column scans, without pivoting the
/// columns back into rows.
pub(crate) fn compute_stats(
    schema: &Arc<Schema>,
    columns: &[Bytes],
    npoints: u32,
) -> Result<Stats> {
    let mut accumulators = Vec::with_capacity(schema.ndims());
    for (dimension, column) in schema.dims().iter().zip(columns.iter()) {
        let (min, max, avg) = column.minmax()?;
        accumulators.push(DoubleStat {
            min: dimension.scale_offset(min),
            max: dimension.scale_offset(max),
            sum: dimension.scale_offset(avg) * f64::from(npoints),
        });
    }
    Ok(Stats::from_double_stats(schema, &accumulators, npoints))
}
