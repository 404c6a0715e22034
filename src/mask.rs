//! Probability thresholding with an optional border band.
//!
//! Candidate centers are pixels whose probability strictly exceeds the
//! threshold. Predictions close to the image edge are unreliable, so a band of
//! `b` pixels along every edge can be excluded from candidate generation.
use crate::image::{ImageF32, ImageView};
use serde::{Deserialize, Serialize};

/// Border band excluded from candidate generation.
///
/// Deserializes from either a scalar (`2`) or per-axis `[before, after]` pairs
/// (`[[2, 2], [0, 3]]`). A zero on one side disables the band on that side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Border {
    Uniform(usize),
    PerAxis([(usize, usize); 2]),
}

impl Border {
    /// `(before, after)` widths for the row and column axis.
    pub fn per_axis(&self) -> [(usize, usize); 2] {
        match *self {
            Border::Uniform(b) => [(b, b), (b, b)],
            Border::PerAxis(axes) => axes,
        }
    }
}

/// Boolean raster of candidate locations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub w: usize,
    pub h: usize,
    pub data: Vec<bool>,
}

impl Mask {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.data[row * self.w + col]
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Coordinates `[row, col]` of all set pixels in row-major order.
    pub fn argwhere(&self) -> Vec<[usize; 2]> {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, &v)| v)
            .map(|(i, _)| [i / self.w, i % self.w])
            .collect()
    }
}

/// Half-open index range kept on one axis of length `len`.
fn kept_range(len: usize, (before, after): (usize, usize)) -> (usize, usize) {
    let start = before.min(len);
    let end = len.saturating_sub(after).max(start);
    (start, end)
}

/// Marks pixels with `prob > prob_thresh` that lie outside the border band.
///
/// `border = None` or a zero width disables border suppression entirely.
pub fn prob_threshold_mask(prob: &ImageF32, prob_thresh: f32, border: Option<Border>) -> Mask {
    let (h, w) = prob.shape();
    let axes = border.map(|b| b.per_axis()).unwrap_or([(0, 0), (0, 0)]);
    let (r0, r1) = kept_range(h, axes[0]);
    let (c0, c1) = kept_range(w, axes[1]);

    let mut data = vec![false; w * h];
    for r in r0..r1 {
        let row = prob.row(r);
        let out = &mut data[r * w..(r + 1) * w];
        for c in c0..c1 {
            out[c] = row[c] > prob_thresh;
        }
    }
    Mask { w, h, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(h: usize, w: usize, v: f32) -> ImageF32 {
        ImageF32::from_vec(w, h, vec![v; w * h]).unwrap()
    }

    #[test]
    fn threshold_is_strict() {
        let mut prob = constant(4, 4, 0.5);
        prob.set(1, 2, 0.51);
        let mask = prob_threshold_mask(&prob, 0.5, None);
        assert_eq!(mask.argwhere(), vec![[2, 1]]);
    }

    #[test]
    fn uniform_border_removes_edge_band() {
        let prob = constant(6, 6, 0.9);
        let mask = prob_threshold_mask(&prob, 0.5, Some(Border::Uniform(2)));
        assert_eq!(mask.count(), 4);
        assert!(!mask.get(0, 0));
        assert!(!mask.get(1, 3));
        assert!(mask.get(2, 2) && mask.get(3, 3));
    }

    #[test]
    fn zero_border_disables_suppression() {
        let prob = constant(3, 3, 0.9);
        assert_eq!(prob_threshold_mask(&prob, 0.5, Some(Border::Uniform(0))).count(), 9);
        assert_eq!(prob_threshold_mask(&prob, 0.5, None).count(), 9);
    }

    #[test]
    fn per_axis_border_is_asymmetric() {
        let prob = constant(5, 5, 0.9);
        let mask = prob_threshold_mask(&prob, 0.5, Some(Border::PerAxis([(1, 0), (0, 2)])));
        // rows 1..5, cols 0..3
        assert_eq!(mask.count(), 12);
        assert!(mask.get(4, 0));
        assert!(!mask.get(0, 0));
        assert!(!mask.get(2, 3));
    }

    #[test]
    fn border_wider_than_image_yields_empty_mask() {
        let prob = constant(3, 3, 0.9);
        assert_eq!(prob_threshold_mask(&prob, 0.5, Some(Border::Uniform(2))).count(), 0);
    }

    #[test]
    fn border_deserializes_from_scalar_or_pairs() {
        let b: Border = serde_json::from_str("3").unwrap();
        assert_eq!(b, Border::Uniform(3));
        let b: Border = serde_json::from_str("[[1, 2], [0, 4]]").unwrap();
        assert_eq!(b.per_axis(), [(1, 2), (0, 4)]);
    }
}
