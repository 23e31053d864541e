//! Single point records and ordered lists of them.

use crate::{utils, Dimension, Endian, Error, Result, Schema};
use std::fmt;
use std::sync::Arc;

/// One point record: a schema and a packed byte buffer of its dimensions.
///
/// # Examples
///
/// ```
/// use pointcloud::{Dimension, Interpretation, Point, Schema};
/// use std::sync::Arc;
///
/// let schema = Arc::new(Schema::new(1, 0, vec![
///     Dimension::new("X", Interpretation::Int32),
///     Dimension::new("Y", Interpretation::Int32),
/// ]));
/// let mut point = Point::new(schema);
/// point.set_x(1.).unwrap();
/// point.set_y(2.).unwrap();
/// assert_eq!(1., point.x().unwrap());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    schema: Arc<Schema>,
    data: Vec<u8>,
}

impl Point {
    /// Creates a new zeroed point.
    pub fn new(schema: Arc<Schema>) -> Point {
        let size = schema.size();
        Point {
            schema,
            data: vec![0; size],
        }
    }

    /// Creates a point from a packed record buffer.
    ///
    /// The buffer is copied. Returns an error when the buffer length does not
    /// match the schema's record size.
    pub fn from_data(schema: Arc<Schema>, data: &[u8]) -> Result<Point> {
        if data.len() != schema.size() {
            return Err(Error::WkbSize {
                expected: schema.size(),
                actual: data.len(),
            });
        }
        Ok(Point {
            schema,
            data: data.to_vec(),
        })
    }

    /// Creates a point from one scaled value per dimension.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pointcloud::{Dimension, Interpretation, Point, Schema};
    /// # use std::sync::Arc;
    /// let schema = Arc::new(Schema::new(1, 0, vec![
    ///     Dimension::new("X", Interpretation::Int32),
    ///     Dimension::new("Y", Interpretation::Int32),
    /// ]));
    /// let point = Point::from_double_array(schema, &[1., 2.]).unwrap();
    /// assert_eq!(2., point.y().unwrap());
    /// ```
    pub fn from_double_array(schema: Arc<Schema>, values: &[f64]) -> Result<Point> {
        if values.len() != schema.ndims() {
            return Err(Error::ValueCountMismatch {
                nvalues: values.len(),
                ndims: schema.ndims(),
            });
        }
        let mut point = Point::new(schema);
        for (index, &value) in values.iter().enumerate() {
            point.set_value_by_index(index, value)?;
        }
        Ok(point)
    }

    /// Parses a point from its wkb form.
    ///
    /// The layout is one endian flag byte, a u32 pcid, and the packed record.
    /// Multi-byte fields are flipped when the wkb endianness differs from the
    /// machine's.
    pub fn from_wkb(schema: Arc<Schema>, wkb: &[u8]) -> Result<Point> {
        const HEADER: usize = 5;
        if wkb.len() < HEADER {
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
        if wkb.len() - HEADER != schema.size() {
            return Err(Error::WkbSize {
                expected: schema.size(),
                actual: wkb.len() - HEADER,
            });
        }
        let mut data = wkb[HEADER..].to_vec();
        if endian != Endian::native() {
            flip_records(&mut data, &schema);
        }
        Ok(Point { schema, data })
    }

    /// Serializes this point to its wkb form, in machine endianness.
    pub fn to_wkb(&self) -> Vec<u8> {
        let mut wkb = Vec::with_capacity(5 + self.data.len());
        wkb.push(Endian::native().to_flag());
        wkb.extend_from_slice(&self.schema.pcid().to_ne_bytes());
        wkb.extend_from_slice(&self.data);
        wkb
    }

    /// Returns the OGC WKB geometry of this point.
    ///
    /// The geometry is a POINT, or POINT Z when the schema has a Z dimension,
    /// with an embedded SRID when the schema's srid is nonzero (EWKB style).
    pub fn to_geometry_wkb(&self) -> Result<Vec<u8>> {
        const SRID_MASK: u32 = 0x2000_0000;
        const Z_MASK: u32 = 0x8000_0000;
        let mut wkb_type: u32 = 1;
        let x = self.x()?;
        let y = self.y()?;
        let z = self
            .schema
            .has_dimension("Z")
            .then(|| self.value_by_name("Z"))
            .transpose()?;
        let srid = (self.schema.srid() > 0).then(|| self.schema.srid());
        if z.is_some() {
            wkb_type |= Z_MASK;
        }
        if srid.is_some() {
            wkb_type |= SRID_MASK;
        }

        let mut wkb = Vec::with_capacity(1 + 4 + 4 + 3 * 8);
        wkb.push(Endian::native().to_flag());
        wkb.extend_from_slice(&wkb_type.to_ne_bytes());
        if let Some(srid) = srid {
            wkb.extend_from_slice(&srid.to_ne_bytes());
        }
        wkb.extend_from_slice(&x.to_ne_bytes());
        wkb.extend_from_slice(&y.to_ne_bytes());
        if let Some(z) = z {
            wkb.extend_from_slice(&z.to_ne_bytes());
        }
        Ok(wkb)
    }

    /// Returns this point's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns this point's packed record bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reads the scaled value of a dimension.
    pub fn value(&self, dimension: &Dimension) -> f64 {
        dimension.value_from_record(&self.data)
    }

    /// Reads the scaled value of the dimension at `index`.
    pub fn value_by_index(&self, index: usize) -> Result<f64> {
        Ok(self.value(self.schema.dimension(index)?))
    }

    /// Reads the scaled value of the named dimension.
    pub fn value_by_name(&self, name: &str) -> Result<f64> {
        Ok(self.value(self.schema.dimension_by_name(name)?))
    }

    /// Writes a scaled value into a dimension.
    pub fn set_value(&mut self, dimension: &Dimension, value: f64) {
        dimension.value_into_record(&mut self.data, value);
    }

    /// Writes a scaled value into the dimension at `index`.
    pub fn set_value_by_index(&mut self, index: usize, value: f64) -> Result<()> {
        let dimension = self.schema.dimension(index)?.clone();
        self.set_value(&dimension, value);
        Ok(())
    }

    /// Writes a scaled value into the named dimension.
    pub fn set_value_by_name(&mut self, name: &str, value: f64) -> Result<()> {
        let dimension = self.schema.dimension_by_name(name)?.clone();
        self.set_value(&dimension, value);
        Ok(())
    }

    /// Returns the X coordinate.
    pub fn x(&self) -> Result<f64> {
        Ok(self.value(self.schema.x_dimension()?))
    }

    /// Returns the Y coordinate.
    pub fn y(&self) -> Result<f64> {
        Ok(self.value(self.schema.y_dimension()?))
    }

    /// Sets the X coordinate.
    pub fn set_x(&mut self, value: f64) -> Result<()> {
        let dimension = self.schema.x_dimension()?.clone();
        self.set_value(&dimension, value);
        Ok(())
    }

    /// Sets the Y coordinate.
    pub fn set_y(&mut self, value: f64) -> Result<()> {
        let dimension = self.schema.y_dimension()?.clone();
        self.set_value(&dimension, value);
        Ok(())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"pcid\":{},\"pt\":[", self.schema.pcid())?;
        for (index, dimension) in self.schema.dims().iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", self.value(dimension))?;
        }
        write!(f, "]}}")
    }
}

/// Flips every multi-byte dimension of every record in `data`, in place.
pub(crate) fn flip_records(data: &mut [u8], schema: &Schema) {
    let size = schema.size();
    for record in data.chunks_exact_mut(size) {
        for dimension in schema.dims() {
            let field = &mut record[dimension.byte_offset..dimension.byte_offset + dimension.size];
            utils::flip_words(field, dimension.size);
        }
    }
}

/// An ordered, growable sequence of points.
///
/// Point lists are the universal intermediate between patch representations:
/// every patch can be flattened to a point list, and a patch can be built
/// from one.
#[derive(Clone, Debug, Default)]
pub struct PointList {
    points: Vec<Point>,
}

impl PointList {
    /// Creates an empty point list.
    pub fn new() -> PointList {
        PointList { points: Vec::new() }
    }

    /// Creates an empty point list with room for `npoints` points.
    pub fn with_capacity(npoints: usize) -> PointList {
        PointList {
            points: Vec::with_capacity(npoints),
        }
    }

    /// Appends a point.
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Returns the point at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Returns the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Is this list empty?
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a PointList {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<Point> for PointList {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> PointList {
        PointList {
            points: iter.into_iter().collect(),
        }
    }
}
