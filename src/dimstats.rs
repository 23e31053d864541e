//! Sampling-based chooser for per-dimension compression.

use crate::{Bytes, DimCompression, Result, Schema};

/// How many points to sample before a [DimStats] stops updating.
pub const MIN_SAMPLE: u32 = 10_000;

/// Accumulated statistics for one dimension.
#[derive(Clone, Copy, Debug, Default)]
pub struct DimStat {
    /// Total distinct-adjacent runs seen across sampled patches.
    pub total_runs: u32,
    /// Total common leading bits seen across sampled patches.
    pub total_commonbits: u32,
    /// The codec this dimension should use in future dimensional patches.
    pub recommended_compression: DimCompression,
}

/// Samples early patches and recommends a codec per dimension.
///
/// Runs and shared-high-bit counts are accumulated until [MIN_SAMPLE] points
/// have been seen; after that the stats freeze and keep returning the same
/// recommendations.
#[derive(Clone, Debug)]
pub struct DimStats {
    total_points: u32,
    total_patches: u32,
    stats: Vec<DimStat>,
}

impl DimStats {
    /// Creates zeroed stats for a schema.
    pub fn new(schema: &Schema) -> DimStats {
        DimStats {
            total_points: 0,
            total_patches: 0,
            stats: vec![DimStat::default(); schema.ndims()],
        }
    }

    /// Returns the number of points sampled so far.
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    /// Returns the number of patches sampled so far.
    pub fn total_patches(&self) -> u32 {
        self.total_patches
    }

    /// Has this sampler seen enough points to freeze?
    pub fn is_complete(&self) -> bool {
        self.total_points >= MIN_SAMPLE
    }

    /// Returns the per-dimension stats.
    pub fn stats(&self) -> &[DimStat] {
        &self.stats
    }

    /// Returns the recommended codec for the dimension at `index`.
    pub fn recommendation(&self, index: usize) -> DimCompression {
        self.stats
            .get(index)
            .map(|stat| stat.recommended_compression)
            .unwrap_or_default()
    }

    /// Accumulates one patch's columns and refreshes the recommendations.
    ///
    /// Once [MIN_SAMPLE] points have been seen this is a no-op.
    pub fn update(&mut self, columns: &[Bytes], schema: &Schema) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        let npoints = columns.first().map(|column| column.npoints).unwrap_or(0);
        self.total_points += npoints;
        self.total_patches += 1;

        for (stat, column) in self.stats.iter_mut().zip(columns.iter()) {
            stat.total_runs += column.run_count()?;
            stat.total_commonbits += column.sigbits_count()?;
        }

        for (stat, dimension) in self.stats.iter_mut().zip(schema.dims().iter()) {
            // For each point, one value entry.
            let raw_size = f64::from(self.total_points) * dimension.size as f64;
            // For each run, one count byte and one value entry.
            let rle_size = f64::from(stat.total_runs) * (dimension.size as f64 + 1.);
            // For each patch, two header words, then the unique bits of every
            // point packed in.
            let avg_commonbits =
                f64::from(stat.total_commonbits) / f64::from(self.total_patches);
            let avg_uniquebits = 8. * dimension.size as f64 - avg_commonbits;
            let sigbits_size = f64::from(self.total_patches) * 2. * dimension.size as f64
                + f64::from(self.total_points) * avg_uniquebits / 8.;

            stat.recommended_compression = DimCompression::Zlib;
            // Run-length and significant-bits only pay off on integers, and
            // only when they can beat 4:1.
            if !dimension.interpretation.is_float() {
                if raw_size / sigbits_size > 4.0 {
                    stat.recommended_compression = DimCompression::SigBits;
                } else if raw_size / rle_size > 4.0 {
                    stat.recommended_compression = DimCompression::Rle;
                }
            }
        }
        Ok(())
    }
}
