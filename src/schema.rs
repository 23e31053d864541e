//! The typed, ordered description of a point's bytes.

use crate::{Dimension, Error, Interpretation, PatchCompression, Result};
use log::{info, warn};
use std::collections::HashMap;

/// Names that mark a dimension as the X coordinate.
const X_NAMES: [&str; 3] = ["x", "longitude", "lon"];
/// Names that mark a dimension as the Y coordinate.
const Y_NAMES: [&str; 3] = ["y", "latitude", "lat"];

/// An immutable description of a point's byte layout.
///
/// Schemas are built either programmatically from a list of [Dimension]s or
/// from a `PointCloudSchema` XML document. Dimensions are tightly packed in
/// position order; each dimension's byte offset is derived from the sizes of
/// the dimensions before it.
///
/// # Examples
///
/// ```
/// use pointcloud::{Dimension, Interpretation, Schema};
///
/// let mut x = Dimension::new("X", Interpretation::Int32);
/// x.scale = 0.01;
/// let intensity = Dimension::new("Intensity", Interpretation::UInt16);
/// let schema = Schema::new(1, 4326, vec![x, intensity]);
/// assert_eq!(6, schema.size());
/// assert_eq!(Some(0), schema.x_position());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    pcid: u32,
    srid: u32,
    dims: Vec<Dimension>,
    size: usize,
    x_position: Option<usize>,
    y_position: Option<usize>,
    compression: PatchCompression,
    name_index: HashMap<String, usize>,
}

impl Schema {
    /// Creates a schema from an ordered list of dimensions.
    ///
    /// Positions and byte offsets are assigned from the order of `dims`;
    /// whatever those fields held before is overwritten. X and Y dimensions
    /// are detected by name ("X"/"Longitude"/"Lon" and "Y"/"Latitude"/"Lat",
    /// case-insensitively).
    pub fn new(pcid: u32, srid: u32, dims: Vec<Dimension>) -> Schema {
        let mut schema = Schema {
            pcid,
            srid,
            dims,
            size: 0,
            x_position: None,
            y_position: None,
            compression: PatchCompression::None,
            name_index: HashMap::new(),
        };
        schema.finish_layout();
        schema
    }

    /// Parses a schema from a `PointCloudSchema` XML document.
    ///
    /// The document holds one `dimension` element per dimension, with `name`,
    /// `interpretation`, and optional `description`, `scale`, `offset`, and
    /// `active` children, plus a 1-based `position` that must be dense and
    /// unique. An optional `metadata/Metadata[@name="compression"]` element
    /// selects the preferred patch compression (`none`, `dimensional`,
    /// `ght`, or `laz`).
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::Schema;
    ///
    /// let xml = r#"<?xml version="1.0"?>
    /// <pc:PointCloudSchema xmlns:pc="http://pointcloud.org/schemas/PC/1.1">
    ///   <pc:dimension>
    ///     <pc:position>1</pc:position>
    ///     <pc:name>X</pc:name>
    ///     <pc:interpretation>int32_t</pc:interpretation>
    ///     <pc:scale>0.01</pc:scale>
    ///   </pc:dimension>
    ///   <pc:dimension>
    ///     <pc:position>2</pc:position>
    ///     <pc:name>Y</pc:name>
    ///     <pc:interpretation>int32_t</pc:interpretation>
    ///     <pc:scale>0.01</pc:scale>
    ///   </pc:dimension>
    /// </pc:PointCloudSchema>"#;
    /// let schema = Schema::from_xml(xml).unwrap();
    /// assert_eq!(2, schema.ndims());
    /// ```
    pub fn from_xml(xml: &str) -> Result<Schema> {
        // Roll forward to the start of the document, some producers prepend
        // whitespace or a byte-order mark.
        let xml = match xml.find('<') {
            Some(start) => &xml[start..],
            None => return Err(Error::SchemaXml("no markup found".to_string())),
        };
        let document =
            roxmltree::Document::parse(xml).map_err(|err| Error::SchemaXml(err.to_string()))?;
        let root = document.root_element();

        let dimension_nodes: Vec<_> = root
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "dimension")
            .collect();
        let ndims = dimension_nodes.len();
        let mut slots: Vec<Option<Dimension>> = vec![None; ndims];

        for node in dimension_nodes {
            let mut name = String::new();
            let mut description = String::new();
            let mut interpretation = None;
            let mut position = None;
            let mut scale = 1.;
            let mut offset = 0.;
            let mut active = true;

            for child in node.children().filter(|child| child.is_element()) {
                let text = child.text().unwrap_or("").trim();
                match child.tag_name().name() {
                    "name" => name = text.to_string(),
                    "description" => description = text.to_string(),
                    "interpretation" => interpretation = Some(Interpretation::from_string(text)?),
                    "position" => {
                        position = Some(text.parse::<u32>().map_err(|_| {
                            Error::SchemaXml(format!("invalid position \"{}\"", text))
                        })?)
                    }
                    "scale" => {
                        scale = text.parse().map_err(|_| {
                            Error::SchemaXml(format!("invalid scale \"{}\"", text))
                        })?
                    }
                    "offset" => {
                        offset = text.parse().map_err(|_| {
                            Error::SchemaXml(format!("invalid offset \"{}\"", text))
                        })?
                    }
                    "active" => active = text == "1" || text.eq_ignore_ascii_case("true"),
                    "size" | "uuid" | "parent_uuid" => {} // size is derived, uuids are ignored
                    other => info!("unhandled schema element \"{}\" encountered", other),
                }
            }

            let interpretation = interpretation.ok_or_else(|| {
                Error::SchemaXml(format!("dimension \"{}\" has no interpretation", name))
            })?;
            let position = position
                .ok_or_else(|| Error::SchemaXml(format!("dimension \"{}\" has no position", name)))?;
            if position < 1 || position as usize > ndims {
                return Err(Error::PositionOutOfRange { position, ndims });
            }
            let index = position as usize - 1;
            if slots[index].is_some() {
                return Err(Error::DuplicatePosition(position));
            }

            let mut dimension = Dimension::new(&name, interpretation);
            dimension.description = description;
            dimension.scale = scale;
            dimension.offset = offset;
            dimension.active = active;
            slots[index] = Some(dimension);
        }

        let mut dims = Vec::with_capacity(ndims);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(dimension) => dims.push(dimension),
                None => {
                    return Err(Error::SchemaXml(format!(
                        "no dimension declared at position {}",
                        index + 1
                    )))
                }
            }
        }

        let mut schema = Schema::new(0, 0, dims);
        if schema.x_position.is_none() {
            warn!("schema does not include an X coordinate");
        }
        if schema.y_position.is_none() {
            warn!("schema does not include a Y coordinate");
        }

        // Metadata entries ride along under metadata/Metadata; only the
        // compression entry is meaningful to us.
        for node in root
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "Metadata")
        {
            if node.attribute("name") == Some("compression") {
                let value = node.text().unwrap_or("").trim();
                schema.compression = PatchCompression::from_metadata(value);
            }
        }

        Ok(schema)
    }

    /// Returns this schema's external identifier.
    pub fn pcid(&self) -> u32 {
        self.pcid
    }

    /// Sets this schema's external identifier.
    pub fn set_pcid(&mut self, pcid: u32) {
        self.pcid = pcid;
    }

    /// Returns this schema's spatial reference identifier.
    pub fn srid(&self) -> u32 {
        self.srid
    }

    /// Sets this schema's spatial reference identifier.
    pub fn set_srid(&mut self, srid: u32) {
        self.srid = srid;
    }

    /// Returns the preferred patch compression of this schema.
    pub fn compression(&self) -> PatchCompression {
        self.compression
    }

    /// Sets the preferred patch compression.
    pub fn set_compression(&mut self, compression: PatchCompression) {
        self.compression = compression;
    }

    /// Returns the number of dimensions.
    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    /// Returns the width in bytes of one packed point record.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the dimensions in position order.
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    /// Returns the position of the X dimension, if the schema has one.
    pub fn x_position(&self) -> Option<usize> {
        self.x_position
    }

    /// Returns the position of the Y dimension, if the schema has one.
    pub fn y_position(&self) -> Option<usize> {
        self.y_position
    }

    /// Returns the X dimension, or an error if the schema lacks one.
    pub fn x_dimension(&self) -> Result<&Dimension> {
        self.x_position
            .map(|position| &self.dims[position])
            .ok_or(Error::MissingCoordinate("an X"))
    }

    /// Returns the Y dimension, or an error if the schema lacks one.
    pub fn y_dimension(&self) -> Result<&Dimension> {
        self.y_position
            .map(|position| &self.dims[position])
            .ok_or(Error::MissingCoordinate("a Y"))
    }

    /// Returns the dimension at `index`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pointcloud::{Dimension, Interpretation, Schema};
    /// let schema = Schema::new(1, 0, vec![Dimension::new("X", Interpretation::Int32)]);
    /// assert_eq!("X", schema.dimension(0).unwrap().name);
    /// assert!(schema.dimension(1).is_err());
    /// ```
    pub fn dimension(&self, index: usize) -> Result<&Dimension> {
        self.dims.get(index).ok_or(Error::DimensionOutOfRange {
            index,
            ndims: self.dims.len(),
        })
    }

    /// Returns the dimension with the given name, case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pointcloud::{Dimension, Interpretation, Schema};
    /// let schema = Schema::new(1, 0, vec![Dimension::new("Intensity", Interpretation::UInt16)]);
    /// assert!(schema.dimension_by_name("intensity").is_ok());
    /// assert!(schema.dimension_by_name("Classification").is_err());
    /// ```
    pub fn dimension_by_name(&self, name: &str) -> Result<&Dimension> {
        self.name_index
            .get(&name.to_ascii_lowercase())
            .map(|&index| &self.dims[index])
            .ok_or_else(|| Error::UnknownDimension(name.to_string()))
    }

    /// Does a dimension with this name exist?
    pub fn has_dimension(&self, name: &str) -> bool {
        self.name_index.contains_key(&name.to_ascii_lowercase())
    }

    /// Does this schema have everything needed to work with point data?
    ///
    /// A schema is valid when it has at least one dimension and both X and Y
    /// coordinate dimensions.
    pub fn is_valid(&self) -> bool {
        if self.x_position.is_none() {
            warn!("schema does not include an X coordinate");
            return false;
        }
        if self.y_position.is_none() {
            warn!("schema does not include a Y coordinate");
            return false;
        }
        if self.dims.is_empty() {
            warn!("schema has no dimensions");
            return false;
        }
        true
    }

    /// Is `other` byte-compatible with this schema?
    ///
    /// Two schemas are similar when they have the same number of dimensions
    /// with the same interpretations at the same positions. Names, scales and
    /// offsets are not compared; similarity is about reusing packed bytes.
    pub fn is_similar(&self, other: &Schema) -> bool {
        self.dims.len() == other.dims.len()
            && self
                .dims
                .iter()
                .zip(other.dims.iter())
                .all(|(a, b)| a.interpretation == b.interpretation)
    }

    /// Serializes this schema as a json string, for debugging.
    pub fn to_json(&self) -> String {
        let mut json = String::from("{");
        json.push_str(&format!("\"pcid\":{},", self.pcid));
        if self.srid != 0 {
            json.push_str(&format!("\"srid\":{},", self.srid));
        }
        if self.compression != PatchCompression::None {
            json.push_str(&format!("\"compression\":{},", self.compression.code()));
        }
        json.push_str("\"dims\":[");
        for (index, dimension) in self.dims.iter().enumerate() {
            if index > 0 {
                json.push(',');
            }
            json.push('{');
            json.push_str(&format!("\"name\":\"{}\",", dimension.name));
            if !dimension.description.is_empty() {
                json.push_str(&format!("\"description\":\"{}\",", dimension.description));
            }
            json.push_str(&format!("\"size\":{},", dimension.size));
            json.push_str(&format!("\"byteoffset\":{},", dimension.byte_offset));
            json.push_str(&format!(
                "\"interpretation\":\"{}\",",
                dimension.interpretation.name()
            ));
            json.push_str(&format!("\"scale\":{},", dimension.scale));
            json.push_str(&format!("\"offset\":{},", dimension.offset));
            json.push_str(&format!("\"active\":{}", u8::from(dimension.active)));
            json.push('}');
        }
        json.push_str("]}");
        json
    }

    /// Recomputes positions, byte offsets, record size, coordinate
    /// dimensions, and the name lookup from the dimension order.
    fn finish_layout(&mut self) {
        let mut byte_offset = 0;
        self.name_index.clear();
        self.x_position = None;
        self.y_position = None;
        for (position, dimension) in self.dims.iter_mut().enumerate() {
            dimension.position = position;
            dimension.size = dimension.interpretation.size();
            dimension.byte_offset = byte_offset;
            byte_offset += dimension.size;

            let lower = dimension.name.to_ascii_lowercase();
            if X_NAMES.contains(&lower.as_str()) {
                self.x_position = Some(position);
            }
            if Y_NAMES.contains(&lower.as_str()) {
                self.y_position = Some(position);
            }
            self.name_index.insert(lower, position);
        }
        self.size = byte_offset;
    }
}
