//! Patch sorting scenarios, driven by the same wkb fixtures the original
//! suite used.

use pointcloud::utils::bytes_from_hex;
use pointcloud::{Patch, PatchCompression, Schema};
use std::sync::Arc;

fn simple_schema() -> Arc<Schema> {
    let mut schema = Schema::from_xml(include_str!("../data/simple-schema.xml")).unwrap();
    schema.set_compression(PatchCompression::None);
    Arc::new(schema)
}

/// Two points, X descending: (0.08, 0.03, 0.05, 6), (0.02, 0.01, 0.04, 8).
const TWO_POINTS_XDR: &str =
    "0000000000000000000000000200000008000000030000000500060000000200000001000000040008";

#[test]
fn sort_simple() {
    let schema = simple_schema();
    let wkb = bytes_from_hex(TWO_POINTS_XDR).unwrap();
    let patch = Patch::from_wkb(schema, &wkb).unwrap();

    let points = patch.to_pointlist().unwrap();
    assert!((points.get(0).unwrap().x().unwrap() - 0.08).abs() < 1e-6);
    assert!((points.get(1).unwrap().x().unwrap() - 0.02).abs() < 1e-6);

    let sorted = patch.sort(&["X"]).unwrap();
    let points = sorted.to_pointlist().unwrap();
    assert!((points.get(0).unwrap().x().unwrap() - 0.02).abs() < 1e-6);
    assert!((points.get(1).unwrap().x().unwrap() - 0.08).abs() < 1e-6);
}

#[test]
fn sort_consistency() {
    let schema = simple_schema();
    let wkb = bytes_from_hex(TWO_POINTS_XDR).unwrap();
    let patch = Patch::from_wkb(schema.clone(), &wkb).unwrap();
    let sorted = patch.sort(&["X"]).unwrap();

    // The sorted patch serializes with the same header fields.
    let sorted_wkb = sorted.to_wkb();
    let reread = Patch::from_wkb(schema, &sorted_wkb).unwrap();
    assert_eq!(patch.npoints(), reread.npoints());
    assert_eq!(patch.compression(), reread.compression());
    assert_eq!(patch.schema().pcid(), reread.schema().pcid());

    assert_eq!(
        "[ 0 : (0.08, 0.03, 0.05, 6), (0.02, 0.01, 0.04, 8) ]",
        patch.to_string()
    );
    assert_eq!(
        "[ 0 : (0.02, 0.01, 0.04, 8), (0.08, 0.03, 0.05, 6) ]",
        sorted.to_string()
    );
}

#[test]
fn sort_one_point() {
    let schema = simple_schema();
    let hexbuf = "000000000000000000000000010000000200000003000000050006";
    let wkb = bytes_from_hex(hexbuf).unwrap();
    let patch = Patch::from_wkb(schema, &wkb).unwrap();
    let sorted = patch.sort(&["X"]).unwrap();
    assert_eq!(1, sorted.npoints());
    assert_eq!(patch.to_string(), sorted.to_string());
    assert!(sorted.is_sorted(&["X"], true).unwrap());
}

#[test]
fn sort_stable_on_equal_keys() {
    // Three points whose Y values are all equal: sorting by Y must keep the
    // input order.
    let schema = simple_schema();
    let patch = {
        use pointcloud::{Point, PointList};
        let rows = [
            [0.08, 0.03, 0.05, 6.],
            [0.02, 0.03, 0.04, 8.],
            [0.02, 0.03, 0.04, 9.],
        ];
        let points: PointList = rows
            .iter()
            .map(|row| Point::from_double_array(schema.clone(), row).unwrap())
            .collect();
        Patch::from_pointlist(&points).unwrap()
    };

    let sorted = patch.sort(&["Y"]).unwrap();
    assert_eq!(patch.to_string(), sorted.to_string());
    assert!(sorted.is_sorted(&["Y"], false).unwrap());
    assert!(!sorted.is_sorted(&["Y"], true).unwrap());
}

#[test]
fn sort_from_dimensional() {
    let schema = simple_schema();
    let wkb = bytes_from_hex(TWO_POINTS_XDR).unwrap();
    let patch = Patch::from_wkb(schema, &wkb).unwrap();
    let dimensional = patch.to_dimensional(None).unwrap();
    let sorted = dimensional.sort(&["X"]).unwrap();
    assert_eq!(PatchCompression::None, sorted.compression());
    assert_eq!(
        "[ 0 : (0.02, 0.01, 0.04, 8), (0.08, 0.03, 0.05, 6) ]",
        sorted.to_string()
    );
}
