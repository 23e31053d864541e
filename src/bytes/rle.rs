//! Run-length encoding of byte columns.
//!
//! The encoded stream is a repeated `{count: u8, value}` pattern. A run is
//! cut whenever the value changes or the count reaches 255.

use super::{Bytes, DimCompression};
use crate::stats::DoubleStat;
use crate::{utils, Bitmap, Error, Filter, Result};

/// The longest run one count byte can describe.
const MAX_RUN: u8 = u8::MAX;

/// Run-length encodes a raw column.
pub fn encode(raw: &Bytes) -> Bytes {
    let size = raw.interpretation.size();
    let mut bytes = Vec::new();
    let mut values = raw.bytes.chunks_exact(size);
    if let Some(first) = values.next() {
        let mut run_value = first;
        let mut run_length: u8 = 1;
        for value in values {
            if value == run_value && run_length < MAX_RUN {
                run_length += 1;
            } else {
                bytes.push(run_length);
                bytes.extend_from_slice(run_value);
                run_value = value;
                run_length = 1;
            }
        }
        bytes.push(run_length);
        bytes.extend_from_slice(run_value);
    }
    Bytes {
        interpretation: raw.interpretation,
        compression: DimCompression::Rle,
        npoints: raw.npoints,
        bytes,
    }
}

/// Decodes a run-length column back to raw values.
///
/// The sum of the run counts must equal the column's stored point count.
pub fn decode(encoded: &Bytes) -> Result<Bytes> {
    let size = encoded.interpretation.size();
    let mut bytes = Vec::with_capacity(encoded.npoints as usize * size);
    let mut npoints: u32 = 0;
    for entry in encoded.bytes.chunks_exact(1 + size) {
        let count = entry[0];
        let value = &entry[1..];
        for _ in 0..count {
            bytes.extend_from_slice(value);
        }
        npoints += u32::from(count);
    }
    if npoints != encoded.npoints {
        return Err(Error::RunLengthMismatch {
            decoded: npoints,
            expected: encoded.npoints,
        });
    }
    Ok(Bytes {
        interpretation: encoded.interpretation,
        compression: DimCompression::None,
        npoints,
        bytes,
    })
}

/// Flips the value word of every run in place, skipping the count bytes.
pub fn flip_endian(column: &mut Bytes) {
    let size = column.interpretation.size();
    if size < 2 {
        return;
    }
    for entry in column.bytes.chunks_exact_mut(1 + size) {
        utils::flip_words(&mut entry[1..], size);
    }
}

/// Scans min/max/avg by walking the runs, weighting the average by count.
pub fn minmax(column: &Bytes) -> (f64, f64, f64) {
    let size = column.interpretation.size();
    let mut stat = DoubleStat::new();
    for entry in column.bytes.chunks_exact(1 + size) {
        let count = entry[0];
        let value = column.interpretation.read(&entry[1..]);
        if value < stat.min {
            stat.min = value;
        }
        if value > stat.max {
            stat.max = value;
        }
        stat.sum += f64::from(count) * value;
    }
    (
        stat.min,
        stat.max,
        stat.sum / f64::from(column.npoints.max(1)),
    )
}

/// Builds a selection bitmap by applying the comparator once per run.
pub fn bitmap(column: &Bytes, filter: Filter) -> Result<Bitmap> {
    let size = column.interpretation.size();
    let mut map = Bitmap::new(column.npoints);
    let mut index = 0;
    for entry in column.bytes.chunks_exact(1 + size) {
        let count = usize::from(entry[0]);
        let value = column.interpretation.read(&entry[1..]);
        let matches = filter.matches(value);
        for i in index..index + count {
            map.set(i, matches);
        }
        index += count;
    }
    Ok(map)
}

/// Filters a run-length column directly, emitting run-length output.
///
/// For each run the selected entries are counted and a `{count, value}` pair
/// is written when any survive. The running stats are weighted by the number
/// of selected entries so filtered averages stay exact.
pub fn filter(column: &Bytes, map: &Bitmap, mut stats: Option<&mut DoubleStat>) -> Bytes {
    let size = column.interpretation.size();
    let mut bytes = Vec::new();
    let mut npoints: u32 = 0;
    let mut index = 0;
    for entry in column.bytes.chunks_exact(1 + size) {
        let count = usize::from(entry[0]);
        let selected = (index..index + count).filter(|&i| map.get(i)).count();
        if selected > 0 {
            bytes.push(selected as u8);
            bytes.extend_from_slice(&entry[1..]);
            npoints += selected as u32;
            if let Some(stats) = stats.as_deref_mut() {
                let value = column.interpretation.read(&entry[1..]);
                if value < stats.min {
                    stats.min = value;
                }
                if value > stats.max {
                    stats.max = value;
                }
                stats.sum += selected as f64 * value;
            }
        }
        index += count;
    }
    Bytes {
        interpretation: column.interpretation,
        compression: DimCompression::Rle,
        npoints,
        bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Interpretation;

    #[test]
    fn encode_layout() {
        let raw = Bytes::from_raw(Interpretation::UInt8, b"aaaabbbbccdde".to_vec());
        let encoded = encode(&raw);
        assert_eq!(DimCompression::Rle, encoded.compression);
        assert_eq!(
            vec![4, b'a', 4, b'b', 2, b'c', 2, b'd', 1, b'e'],
            encoded.bytes
        );
        let decoded = decode(&encoded).unwrap();
        assert_eq!(raw, decoded);
    }

    #[test]
    fn round_trip_u32() {
        let mut bytes = Vec::new();
        for value in [10u32, 10, 10, 20, 20, 30, 20, 20] {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
        let raw = Bytes::from_raw(Interpretation::UInt32, bytes);
        let decoded = decode(&encode(&raw)).unwrap();
        assert_eq!(raw, decoded);
    }

    #[test]
    fn long_runs_split_at_255() {
        let raw = Bytes::from_raw(Interpretation::UInt8, vec![b'c'; 300]);
        let encoded = encode(&raw);
        assert_eq!(vec![255, b'c', 45, b'c'], encoded.bytes);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(raw, decoded);
    }

    #[test]
    fn run_of_exactly_255() {
        let raw = Bytes::from_raw(Interpretation::UInt8, vec![b'x'; 255]);
        let encoded = encode(&raw);
        assert_eq!(vec![255, b'x'], encoded.bytes);
        assert_eq!(raw, decode(&encoded).unwrap());
    }

    #[test]
    fn decode_validates_npoints() {
        let mut encoded = encode(&Bytes::from_raw(Interpretation::UInt8, b"aabb".to_vec()));
        encoded.npoints = 5;
        assert!(matches!(
            decode(&encoded),
            Err(Error::RunLengthMismatch {
                decoded: 4,
                expected: 5
            })
        ));
    }

    #[test]
    fn minmax_weights_by_count() {
        let raw = Bytes::from_raw(Interpretation::UInt8, b"aaab".to_vec());
        let encoded = encode(&raw);
        let (min, max, avg) = minmax(&encoded);
        assert_eq!(f64::from(b'a'), min);
        assert_eq!(f64::from(b'b'), max);
        assert_eq!((3. * f64::from(b'a') + f64::from(b'b')) / 4., avg);
    }

    #[test]
    fn rle_filter_emits_rle() {
        let raw = Bytes::from_raw(Interpretation::UInt8, b"aaaabbbbccdd".to_vec());
        let encoded = encode(&raw);
        assert_eq!(4, encoded.bytes[0]);

        let gt_b = bitmap(&encoded, Filter::Gt(f64::from(b'b'))).unwrap();
        assert_eq!(4, gt_b.nset());
        let gt_a = bitmap(&encoded, Filter::Gt(f64::from(b'a'))).unwrap();
        assert_eq!(8, gt_a.nset());

        let filtered = filter(&encoded, &gt_b, None);
        assert_eq!(vec![2, b'c', 2, b'd'], filtered.bytes);
        assert_eq!(4, filtered.npoints);

        let filtered = filter(&encoded, &gt_a, None);
        assert_eq!(vec![4, b'b', 2, b'c', 2, b'd'], filtered.bytes);
        assert_eq!(8, filtered.npoints);
    }

    #[test]
    fn filter_stats_weight_by_selected_count() {
        let raw = Bytes::from_raw(Interpretation::UInt8, b"aaaabbbbccdd".to_vec());
        let encoded = encode(&raw);
        let map = bitmap(&encoded, Filter::Gt(f64::from(b'b'))).unwrap();
        let mut stats = DoubleStat::new();
        let filtered = filter(&encoded, &map, Some(&mut stats));
        assert_eq!(4, filtered.npoints);
        assert_eq!(2. * f64::from(b'c') + 2. * f64::from(b'd'), stats.sum);
    }

    #[test]
    fn flip_skips_counts() {
        let mut bytes = Vec::new();
        for value in [0x0102u16, 0x0102, 0x0304] {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
        let raw = Bytes::from_raw(Interpretation::UInt16, bytes);
        let mut encoded = encode(&raw);
        let original = encoded.bytes.clone();
        flip_endian(&mut encoded);
        assert_eq!(original[0], encoded.bytes[0]); // count untouched
        assert_ne!(original[1..3], encoded.bytes[1..3]);
        flip_endian(&mut encoded);
        assert_eq!(original, encoded.bytes);
    }
}
