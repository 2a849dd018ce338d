//! COCO run-length encoding of binary masks.
//!
//! Runs are counted in column-major (Fortran) order, alternating
//! background/foreground and always starting with background. The packed
//! `counts` byte form is the LEB128-like scheme from pycocotools: 5-bit
//! groups, bit 0x20 as continuation flag, ASCII offset 48, and counts
//! after the third delta-coded against the value two runs back. Area and
//! bounding box are derived from run boundaries without materializing a
//! dense mask.

use crate::error::{Error, Result};
use crate::mask::Mask;

/// Run-length encoded mask, held in the packed COCO byte form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rle {
    pub height: u32,
    pub width: u32,
    /// Packed run counts (`rleToString` representation).
    pub counts: String,
}

impl Rle {
    /// Build an RLE from raw alternating run lengths, background first.
    pub fn from_run_lengths(height: u32, width: u32, runs: &[u32]) -> Rle {
        Rle {
            height,
            width,
            counts: pack_counts(runs),
        }
    }

    /// Unpack the counts string back into raw run lengths.
    pub fn run_lengths(&self) -> Vec<u32> {
        unpack_counts(&self.counts)
    }
}

/// Run-length encode a mask, checking it against the declared image size.
pub fn encode(mask: &Mask, height: u32, width: u32) -> Result<Rle> {
    let n = height as usize * width as usize;
    if mask.height() != height || mask.width() != width || mask.data().len() != n {
        return Err(Error::ShapeMismatch {
            len: mask.data().len(),
            height,
            width,
        });
    }

    let mut runs = Vec::new();
    let mut prev: u8 = 0;
    let mut run: u32 = 0;
    for x in 0..width {
        for y in 0..height {
            let v = mask.get(x, y) as u8;
            if v != prev {
                runs.push(run);
                run = 0;
                prev = v;
            }
            run += 1;
        }
    }
    runs.push(run);

    Ok(Rle::from_run_lengths(height, width, &runs))
}

/// Decode an RLE back into a dense mask. Exact inverse of [`encode`].
pub fn decode(rle: &Rle) -> Mask {
    let mut mask = Mask::new(rle.height, rle.width);
    let n = rle.height as u64 * rle.width as u64;
    let mut idx = 0u64;
    let mut v = false;
    for c in rle.run_lengths() {
        for _ in 0..c {
            if idx >= n {
                break;
            }
            if v {
                let x = (idx / rle.height as u64) as u32;
                let y = (idx % rle.height as u64) as u32;
                mask.set(x, y, true);
            }
            idx += 1;
        }
        v = !v;
    }
    mask
}

/// Foreground pixel count.
pub fn area(rle: &Rle) -> u64 {
    area_of_runs(&rle.run_lengths())
}

/// Tight axis-aligned bounding box `[x, y, w, h]`.
///
/// An entirely empty mask yields `[0, 0, 0, 0]`.
pub fn to_bbox(rle: &Rle) -> [f64; 4] {
    bbox_of_runs(&rle.run_lengths(), rle.height, rle.width)
}

/// Area and bounding box with a single unpacking of the counts.
pub fn area_and_bbox(rle: &Rle) -> (f64, [f64; 4]) {
    let runs = rle.run_lengths();
    (
        area_of_runs(&runs) as f64,
        bbox_of_runs(&runs, rle.height, rle.width),
    )
}

/// Sum of the odd-indexed (foreground) runs.
fn area_of_runs(runs: &[u32]) -> u64 {
    runs.iter()
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, &c)| c as u64)
        .sum()
}

fn bbox_of_runs(runs: &[u32], height: u32, width: u32) -> [f64; 4] {
    let h = height as usize;
    if h == 0 || width == 0 || runs.is_empty() {
        return [0.0, 0.0, 0.0, 0.0];
    }

    let mut xs = width as usize;
    let mut xe = 0usize;
    let mut ys = h;
    let mut ye = 0usize;
    let mut has_any = false;

    let mut cc = 0usize;
    for (i, &c) in runs.iter().enumerate() {
        let c = c as usize;
        if i % 2 == 1 && c > 0 {
            has_any = true;
            let x1 = cc / h;
            let y1 = cc % h;
            let end = cc + c - 1;
            let x2 = end / h;
            let y2 = end % h;

            xs = xs.min(x1);
            xe = xe.max(x2 + 1);
            ys = ys.min(y1);
            // A run spanning several columns covers every row in between.
            if x1 != x2 {
                ys = 0;
                ye = h;
            }
            ye = ye.max(y2 + 1);
        }
        cc += c;
    }

    if !has_any {
        return [0.0, 0.0, 0.0, 0.0];
    }

    [xs as f64, ys as f64, (xe - xs) as f64, (ye - ys) as f64]
}

/// Pack run lengths into the COCO counts string.
///
/// Matches pycocotools `rleToString` bit-for-bit, including the delta
/// against `runs[i-2]` applied from the fourth count on.
fn pack_counts(runs: &[u32]) -> String {
    let mut s = String::with_capacity(runs.len() * 2);
    for i in 0..runs.len() {
        let mut x = runs[i] as i64;
        if i > 2 {
            x -= runs[i - 2] as i64;
        }
        loop {
            let mut c = (x & 0x1f) as u8;
            x >>= 5;
            let more = if c & 0x10 != 0 { x != -1 } else { x != 0 };
            if more {
                c |= 0x20;
            }
            s.push((c + 48) as char);
            if !more {
                break;
            }
        }
    }
    s
}

/// Unpack a COCO counts string. Matches pycocotools `rleFrString`.
fn unpack_counts(s: &str) -> Vec<u32> {
    let bytes = s.as_bytes();
    let mut runs: Vec<u32> = Vec::new();
    let mut p = 0;
    while p < bytes.len() {
        let mut x: i64 = 0;
        let mut k = 0u32;
        loop {
            let c = bytes[p] as i64 - 48;
            x |= (c & 0x1f) << (5 * k);
            p += 1;
            k += 1;
            if c & 0x20 == 0 {
                if c & 0x10 != 0 {
                    x |= -1i64 << (5 * k);
                }
                break;
            }
        }
        if runs.len() > 2 {
            x += runs[runs.len() - 2] as i64;
        }
        runs.push(x as u32);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::rasterize;

    fn mask_from_rows(height: u32, width: u32, rows: &[&[u8]]) -> Mask {
        let mut mask = Mask::new(height, width);
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                mask.set(x as u32, y as u32, v != 0);
            }
        }
        mask
    }

    #[test]
    fn encode_decode_roundtrip() {
        let mask = mask_from_rows(3, 4, &[&[0, 1, 0, 1], &[0, 1, 0, 1], &[0, 1, 1, 0]]);
        let rle = encode(&mask, 3, 4).unwrap();
        assert_eq!(decode(&rle), mask);
    }

    #[test]
    fn encode_all_zeros() {
        let mask = Mask::new(3, 4);
        let rle = encode(&mask, 3, 4).unwrap();
        assert_eq!(rle.run_lengths(), vec![12]);
        assert_eq!(area(&rle), 0);
        assert_eq!(to_bbox(&rle), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn encode_all_ones() {
        let mut mask = Mask::new(3, 4);
        for x in 0..4 {
            for y in 0..3 {
                mask.set(x, y, true);
            }
        }
        let rle = encode(&mask, 3, 4).unwrap();
        assert_eq!(rle.run_lengths(), vec![0, 12]);
        assert_eq!(area(&rle), 12);
        assert_eq!(to_bbox(&rle), [0.0, 0.0, 4.0, 3.0]);
    }

    #[test]
    fn runs_are_column_major() {
        // Only pixel (x=2, y=0) set in a 3x4 mask: column-major offset is
        // x * h + y = 6.
        let mut mask = Mask::new(3, 4);
        mask.set(2, 0, true);
        let rle = encode(&mask, 3, 4).unwrap();
        assert_eq!(rle.run_lengths(), vec![6, 1, 5]);
    }

    #[test]
    fn area_and_bbox_of_block() {
        // 2x2 block at (1, 1) in a 5x5 mask.
        let mut mask = Mask::new(5, 5);
        for x in 1..3 {
            for y in 1..3 {
                mask.set(x, y, true);
            }
        }
        let rle = encode(&mask, 5, 5).unwrap();
        let (a, bbox) = area_and_bbox(&rle);
        assert_eq!(a, 4.0);
        assert_eq!(bbox, [1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn bbox_of_column_spanning_run() {
        // A run crossing a column boundary covers every row in between.
        let mut mask = Mask::new(3, 4);
        for y in 0..3 {
            mask.set(1, y, true);
            mask.set(2, y, true);
        }
        let rle = encode(&mask, 3, 4).unwrap();
        assert_eq!(rle.run_lengths(), vec![3, 6, 3]);
        assert_eq!(to_bbox(&rle), [1.0, 0.0, 2.0, 3.0]);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let mask = Mask::new(3, 4);
        let err = encode(&mask, 4, 4).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::ShapeMismatch {
                len: 12,
                height: 4,
                width: 4
            }
        ));
    }

    #[test]
    fn counts_string_known_vectors() {
        // Hand-checked against pycocotools: a single count of 6 packs to
        // '6' (6 + 48), and [0, 12] packs to '0<'.
        assert_eq!(Rle::from_run_lengths(2, 3, &[6]).counts, "6");
        assert_eq!(Rle::from_run_lengths(3, 4, &[0, 12]).counts, "0<");
    }

    #[test]
    fn counts_string_roundtrip_with_delta() {
        // More than three runs exercises the delta coding, including a
        // negative delta.
        let runs = vec![5, 3, 17, 1, 40, 2, 32];
        let rle = Rle::from_run_lengths(10, 10, &runs);
        assert_eq!(rle.run_lengths(), runs);
    }

    #[test]
    fn counts_string_roundtrip_multigroup() {
        // Counts above 2^5 need several 5-bit groups.
        let runs = vec![100_000, 50_000, 7, 150_000, 13, 7080];
        let rle = Rle::from_run_lengths(480, 640, &runs);
        assert_eq!(rle.run_lengths(), runs);
    }

    #[test]
    fn rasterized_square_measures_exactly() {
        let poly = vec![(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)];
        let mask = rasterize(16, 16, &poly);
        let rle = encode(&mask, 16, 16).unwrap();
        let (a, bbox) = area_and_bbox(&rle);
        assert_eq!(a, 36.0);
        assert_eq!(bbox, [2.0, 2.0, 6.0, 6.0]);
    }

    #[test]
    fn rasterize_encode_decode_roundtrip() {
        let poly = vec![(1.0, 1.5), (11.0, 2.0), (9.5, 10.0), (2.0, 8.0)];
        let mask = rasterize(12, 12, &poly);
        let rle = encode(&mask, 12, 12).unwrap();
        assert_eq!(decode(&rle), mask);
    }
}
