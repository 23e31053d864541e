//! Library for storing, querying, and filtering patches of multidimensional
//! point data, such as [LiDAR](https://en.wikipedia.org/wiki/Lidar) returns.
//!
//! Points are described by a [Schema]: an ordered list of named, typed
//! dimensions (X, Y, Z, Intensity, ...), each with a scale and offset that map
//! the stored integer or float onto a physical value. Groups of points that
//! share a schema are held in a [Patch], which can be stored in one of four
//! in-memory representations:
//!
//! - row-major uncompressed bytes,
//! - "dimensional" column-major storage with an independent codec per
//!   dimension (run-length, significant-bits, or zlib),
//! - an opaque GHT (geohash tree) blob, and
//! - an opaque LAZ stream (behind the `laz` feature).
//!
//! Patches and points serialize to an endian-tagged wire format, and patches
//! carry their X/Y bounds and per-dimension statistics so that filters can
//! short-circuit without decompressing anything.
//!
//! # Examples
//!
//! Build a patch from points and filter it:
//!
//! ```
//! use pointcloud::{Dimension, Filter, Interpretation, Patch, Point, PointList, Schema};
//! use std::sync::Arc;
//!
//! let mut x = Dimension::new("X", Interpretation::Int32);
//! x.scale = 0.01;
//! let mut y = Dimension::new("Y", Interpretation::Int32);
//! y.scale = 0.01;
//! let schema = Arc::new(Schema::new(1, 0, vec![x, y]));
//!
//! let mut points = PointList::new();
//! points.push(Point::from_double_array(schema.clone(), &[0.02, 0.03]).unwrap());
//! points.push(Point::from_double_array(schema.clone(), &[0.08, 0.03]).unwrap());
//! let patch = Patch::from_pointlist(&points).unwrap();
//! let filtered = patch.filter_by_name("X", Filter::Gt(0.05)).unwrap();
//! assert_eq!(1, filtered.npoints());
//! ```
//!
//! Round-trip through the wire format:
//!
//! ```
//! # use pointcloud::{Dimension, Interpretation, Patch, Point, PointList, Schema};
//! # use std::sync::Arc;
//! # let schema = Arc::new(Schema::new(1, 0, vec![
//! #     Dimension::new("X", Interpretation::Int32),
//! #     Dimension::new("Y", Interpretation::Int32),
//! # ]));
//! # let mut points = PointList::new();
//! # points.push(Point::from_double_array(schema.clone(), &[2., 3.]).unwrap());
//! # let patch = Patch::from_pointlist(&points).unwrap();
//! let wkb = patch.to_wkb();
//! let read = Patch::from_wkb(schema.clone(), &wkb).unwrap();
//! assert_eq!(patch.npoints(), read.npoints());
//! ```

#![deny(
    missing_debug_implementations,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

pub mod bytes;
pub mod dimstats;
pub mod patch;
pub mod schema;
pub mod utils;

mod bitmap;
mod bounds;
mod dimension;
mod error;
mod filter;
mod interpretation;
mod point;
mod sort;
mod stats;

pub use crate::bitmap::Bitmap;
pub use crate::bounds::Bounds;
pub use crate::bytes::{Bytes, DimCompression};
pub use crate::dimension::Dimension;
pub use crate::dimstats::DimStats;
pub use crate::error::Error;
pub use crate::filter::Filter;
pub use crate::interpretation::Interpretation;
pub use crate::patch::{Patch, PatchCompression};
pub use crate::point::{Point, PointList};
pub use crate::schema::Schema;
pub use crate::stats::Stats;
pub use crate::utils::Endian;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
