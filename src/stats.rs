//! Per-patch minimum, maximum, and average points.

use crate::{Point, Result, Schema};
use std::sync::Arc;

/// Running min/max/sum for a single dimension, in scaled units.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DoubleStat {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

impl DoubleStat {
    pub fn new() -> DoubleStat {
        DoubleStat {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.,
        }
    }

    pub fn update(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.sum += value;
    }
}

/// The per-dimension minimum, maximum, and average of a patch.
///
/// Stats are stored as three points sharing the patch schema, so every value
/// is in scaled units and carries the precision of its dimension's
/// interpretation. They are computed when a patch is built from point data
/// and kept consistent by every operation that changes point membership.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    min: Point,
    max: Point,
    avg: Point,
}

impl Stats {
    /// Creates zeroed stats for a schema.
    pub fn new(schema: Arc<Schema>) -> Stats {
        Stats {
            min: Point::new(schema.clone()),
            max: Point::new(schema.clone()),
            avg: Point::new(schema),
        }
    }

    /// Computes stats with one pass over row-major point data.
    pub(crate) fn calculate(schema: &Arc<Schema>, data: &[u8]) -> Stats {
        let size = schema.size();
        let npoints = if size > 0 { data.len() / size } else { 0 };
        let mut accumulators = vec![DoubleStat::new(); schema.ndims()];
        for record in data.chunks_exact(size) {
            for (dimension, accumulator) in schema.dims().iter().zip(accumulators.iter_mut()) {
                accumulator.update(dimension.value_from_record(record));
            }
        }
        Stats::from_double_stats(schema, &accumulators, npoints as u32)
    }

    /// Builds stats points from per-dimension accumulators.
    pub(crate) fn from_double_stats(
        schema: &Arc<Schema>,
        accumulators: &[DoubleStat],
        npoints: u32,
    ) -> Stats {
        let mut stats = Stats::new(schema.clone());
        if npoints == 0 {
            return stats;
        }
        for (dimension, accumulator) in schema.dims().iter().zip(accumulators.iter()) {
            stats.min.set_value(dimension, accumulator.min);
            stats.max.set_value(dimension, accumulator.max);
            stats.avg.set_value(dimension, accumulator.sum / f64::from(npoints));
        }
        stats
    }

    /// Returns the per-dimension minimum point.
    pub fn min(&self) -> &Point {
        &self.min
    }

    /// Returns the per-dimension maximum point.
    pub fn max(&self) -> &Point {
        &self.max
    }

    /// Returns the per-dimension average point.
    pub fn avg(&self) -> &Point {
        &self.avg
    }

    /// Returns the minimum of the dimension at `index`, in scaled units.
    pub fn minimum(&self, index: usize) -> Result<f64> {
        self.min.value_by_index(index)
    }

    /// Returns the maximum of the dimension at `index`, in scaled units.
    pub fn maximum(&self, index: usize) -> Result<f64> {
        self.max.value_by_index(index)
    }

    /// Returns the average of the dimension at `index`, in scaled units.
    pub fn average(&self, index: usize) -> Result<f64> {
        self.avg.value_by_index(index)
    }

    /// Overwrites one dimension's stats.
    pub(crate) fn set_dimension(
        &mut self,
        index: usize,
        min: f64,
        max: f64,
        avg: f64,
    ) -> Result<()> {
        self.min.set_value_by_index(index, min)?;
        self.max.set_value_by_index(index, max)?;
        self.avg.set_value_by_index(index, avg)?;
        Ok(())
    }
}
