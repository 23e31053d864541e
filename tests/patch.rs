//! Whole-patch scenarios: wire format fixtures, conversion lattice, merge,
//! range, and set-schema.

use pointcloud::utils::{bytes_from_hex, hex_from_bytes};
use pointcloud::{
    Dimension, Interpretation, Patch, PatchCompression, Point, PointList, Schema,
};
use std::sync::Arc;

fn simple_schema() -> Arc<Schema> {
    let mut schema = Schema::from_xml(include_str!("../data/simple-schema.xml")).unwrap();
    schema.set_compression(PatchCompression::None);
    Arc::new(schema)
}

fn patch_of(schema: &Arc<Schema>, rows: &[[f64; 4]]) -> Patch {
    let points: PointList = rows
        .iter()
        .map(|row| Point::from_double_array(schema.clone(), row).unwrap())
        .collect();
    Patch::from_pointlist(&points).unwrap()
}

#[test]
fn schema_fixture_parses() {
    let schema = Schema::from_xml(include_str!("../data/simple-schema.xml")).unwrap();
    assert_eq!(4, schema.ndims());
    assert_eq!(14, schema.size());
    assert_eq!(PatchCompression::Dimensional, schema.compression());
    assert!(schema.is_valid());
}

#[test]
fn patch_hex_in() {
    // 00 endian (xdr)
    // 00000000 pcid
    // 00000000 compression
    // 00000002 npoints
    // 0000000200000003000000050006 pt1 (XYZi)
    // 0000000200000003000000050008 pt2 (XYZi)
    let hexbuf =
        "0000000000000000000000000200000002000000030000000500060000000200000003000000050008";
    let wkb = bytes_from_hex(hexbuf).unwrap();
    let patch = Patch::from_wkb(simple_schema(), &wkb).unwrap();

    assert_eq!(2, patch.npoints());
    assert_eq!(PatchCompression::None, patch.compression());

    let points = patch.to_pointlist().unwrap();
    assert!((points.get(0).unwrap().value_by_name("X").unwrap() - 0.02).abs() < 1e-6);
    assert!((points.get(1).unwrap().value_by_name("Intensity").unwrap() - 8.).abs() < 1e-6);

    assert_eq!(
        "[ 0 : (0.02, 0.03, 0.05, 6), (0.02, 0.03, 0.05, 8) ]",
        patch.to_string()
    );
}

#[test]
fn patch_hex_out() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.], [0.02, 0.03, 0.05, 8.]]);
    let wkb = patch.to_wkb();
    let hexwkb = hex_from_bytes(&wkb);

    #[cfg(target_endian = "little")]
    assert_eq!(
        "0100000000000000000200000002000000030000000500000006000200000003000000050000000800",
        hexwkb
    );
    #[cfg(target_endian = "big")]
    assert_eq!(
        "0000000000000000000000000200000002000000030000000500060000000200000003000000050008",
        hexwkb
    );

    assert_eq!(
        "[ 0 : (0.02, 0.03, 0.05, 6), (0.02, 0.03, 0.05, 8) ]",
        patch.to_string()
    );
}

#[test]
fn wkb_round_trip_same_endian() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.], [0.08, 0.01, 0.05, 8.]]);
    let read = Patch::from_wkb(schema, &patch.to_wkb()).unwrap();
    assert_eq!(patch.npoints(), read.npoints());
    assert_eq!(patch.bounds(), read.bounds());
    assert_eq!(patch.to_string(), read.to_string());
}

#[test]
fn wkb_round_trip_opposite_endian() {
    // The fixture above is big-endian; reading it on a little-endian machine
    // exercises the flip, and vice versa.
    let hexbuf =
        "0000000000000000000000000200000002000000030000000500060000000200000003000000050008";
    let wkb = bytes_from_hex(hexbuf).unwrap();
    let patch = Patch::from_wkb(simple_schema(), &wkb).unwrap();
    // Write back out in machine endianness and re-read.
    let read = Patch::from_wkb(simple_schema(), &patch.to_wkb()).unwrap();
    assert_eq!(patch.to_string(), read.to_string());
}

#[test]
fn wkb_rejects_pcid_mismatch() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.]]);
    let mut other = (*schema).clone();
    other.set_pcid(9);
    assert!(Patch::from_wkb(Arc::new(other), &patch.to_wkb()).is_err());
}

#[test]
fn wkb_rejects_size_mismatch() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.]]);
    let mut wkb = patch.to_wkb();
    wkb.pop();
    assert!(Patch::from_wkb(schema, &wkb).is_err());
}

#[test]
fn dimensional_wkb_round_trip() {
    let schema = simple_schema();
    let patch = patch_of(
        &schema,
        &[
            [0.02, 0.03, 0.05, 6.],
            [0.02, 0.03, 0.05, 6.],
            [0.08, 0.01, 0.06, 8.],
            [0.08, 0.01, 0.06, 8.],
        ],
    );
    let dimensional = patch.to_dimensional(None).unwrap();
    let wkb = dimensional.to_wkb();
    let read = Patch::from_wkb(schema, &wkb).unwrap();
    assert_eq!(PatchCompression::Dimensional, read.compression());
    assert_eq!(4, read.npoints());
    assert_eq!(patch.to_string(), read.to_string());
    assert_eq!(patch.bounds(), read.bounds());
}

#[test]
fn compression_lattice_round_trips() {
    let schema = simple_schema();
    let patch = patch_of(
        &schema,
        &[
            [0.02, 0.03, 0.05, 6.],
            [0.04, 0.02, 0.05, 6.],
            [0.08, 0.01, 0.06, 8.],
        ],
    );
    let dimensional = patch.to_dimensional(None).unwrap();
    let back = dimensional.to_uncompressed().unwrap();
    assert_eq!(patch.to_string(), back.to_string());
    assert_eq!(patch.bounds(), back.bounds());
}

#[test]
fn zero_point_patch_round_trips() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.]]);
    let empty = patch.range(5, 1).unwrap();
    assert_eq!(0, empty.npoints());
    let wkb = empty.to_wkb();
    let read = Patch::from_wkb(schema, &wkb).unwrap();
    assert_eq!(0, read.npoints());
    assert_eq!(PatchCompression::None, read.compression());
}

#[test]
fn merge_unions_bounds_and_recomputes_stats() {
    let schema = simple_schema();
    let a = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.]]);
    let b = patch_of(&schema, &[[0.08, 0.01, 0.05, 8.]])
        .to_dimensional(None)
        .unwrap();
    let merged = Patch::from_patchlist(&[a, b]).unwrap();
    assert_eq!(2, merged.npoints());
    assert_eq!(0.02, merged.bounds().xmin);
    assert_eq!(0.08, merged.bounds().xmax);
    assert_eq!(0.01, merged.bounds().ymin);
    assert_eq!(0.03, merged.bounds().ymax);
    let stats = merged.stats().unwrap();
    assert_eq!(6., stats.minimum(3).unwrap());
    assert_eq!(8., stats.maximum(3).unwrap());
    assert_eq!(7., stats.average(3).unwrap());
}

#[test]
fn range_slices_points() {
    let schema = simple_schema();
    let patch = patch_of(
        &schema,
        &[
            [0.01, 0.03, 0.05, 1.],
            [0.02, 0.03, 0.05, 2.],
            [0.03, 0.03, 0.05, 3.],
            [0.04, 0.03, 0.05, 4.],
        ],
    );
    let middle = patch.range(1, 2).unwrap();
    assert_eq!(2, middle.npoints());
    assert_eq!("[ 0 : (0.02, 0.03, 0.05, 2), (0.03, 0.03, 0.05, 3) ]", middle.to_string());
    assert_eq!(0.02, middle.bounds().xmin);
    assert_eq!(0.03, middle.bounds().xmax);

    // A dimensional input materializes.
    let from_dimensional = patch.to_dimensional(None).unwrap().range(3, 10).unwrap();
    assert_eq!(1, from_dimensional.npoints());
    assert_eq!(PatchCompression::None, from_dimensional.compression());
    assert_eq!(4., from_dimensional.point(0).unwrap().value_by_index(3).unwrap());
}

#[test]
fn set_schema_similar_keeps_bytes() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.]]);
    let mut renamed = (*schema).clone();
    renamed.set_pcid(42);
    let result = patch.set_schema(Arc::new(renamed), None).unwrap();
    assert_eq!(42, result.schema().pcid());
    assert_eq!("[ 42 : (0.02, 0.03, 0.05, 6) ]", result.to_string());
}

#[test]
fn set_schema_reinterprets() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.], [0.08, 0.01, 0.04, 8.]]);

    let mut x = Dimension::new("X", Interpretation::Double);
    x.scale = 1.;
    let y = Dimension::new("Y", Interpretation::Double);
    let intensity = Dimension::new("Intensity", Interpretation::UInt8);
    let classification = Dimension::new("Classification", Interpretation::UInt8);
    let target = Arc::new(Schema::new(7, 0, vec![x, y, intensity, classification]));

    let result = patch.set_schema(target, Some(2.)).unwrap();
    assert_eq!(2, result.npoints());
    let point = result.point(1).unwrap();
    assert!((point.value_by_name("X").unwrap() - 0.08).abs() < 1e-9);
    assert_eq!(8., point.value_by_name("Intensity").unwrap());
    assert_eq!(2., point.value_by_name("Classification").unwrap());
    // Z is gone.
    assert!(point.value_by_name("Z").is_err());
}

#[test]
fn point_wkb_round_trip() {
    let schema = simple_schema();
    let point = Point::from_double_array(schema.clone(), &[0.02, 0.03, 0.05, 6.]).unwrap();
    let wkb = point.to_wkb();
    let read = Point::from_wkb(schema, &wkb).unwrap();
    assert_eq!(point, read);
    assert_eq!("{\"pcid\":0,\"pt\":[0.02,0.03,0.05,6]}", read.to_string());
}

#[test]
fn envelope_wkb_is_a_polygon() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.], [0.08, 0.01, 0.05, 8.]]);
    let wkb = patch.to_geometry_wkb_envelope();
    assert_eq!(1 + 4 + 4 + 4 + 80, wkb.len());
    let wkb_type = u32::from_ne_bytes([wkb[1], wkb[2], wkb[3], wkb[4]]);
    assert_eq!(3, wkb_type); // POLYGON, no srid on this schema
}

#[test]
fn ght_wkb_is_carried_opaquely() {
    // endian 01, pcid 0, compression 1 (ght), npoints 2, blob size 4, blob
    let schema = simple_schema();
    let mut wkb = vec![1u8];
    wkb.extend_from_slice(&0u32.to_le_bytes());
    wkb.extend_from_slice(&1u32.to_le_bytes());
    wkb.extend_from_slice(&2u32.to_le_bytes());
    wkb.extend_from_slice(&4u32.to_le_bytes());
    wkb.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

    #[cfg(target_endian = "little")]
    {
        let patch = Patch::from_wkb(schema, &wkb).unwrap();
        assert_eq!(PatchCompression::Ght, patch.compression());
        assert_eq!(2, patch.npoints());
        assert!(patch.stats().is_none());
        // The tree cannot be decoded without the adapter.
        assert!(patch.to_pointlist().is_err());
        // But the blob survives a round trip untouched.
        assert_eq!(wkb, patch.to_wkb());
    }
}

#[test]
fn ght_conversion_is_not_implemented() {
    let schema = simple_schema();
    let patch = patch_of(&schema, &[[0.02, 0.03, 0.05, 6.]]);
    assert!(patch.to_ght().is_err());
}
