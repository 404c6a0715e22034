//! Integer instance raster: 0 is background, positive values are instance ids.
use super::traits::{ImageView, ImageViewMut};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelImage {
    pub w: usize,
    pub h: usize,
    pub data: Vec<i32>,
}

impl LabelImage {
    /// All-background raster of shape `(h, w)`.
    pub fn new(h: usize, w: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0; w * h],
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.data[row * self.w + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, label: i32) {
        self.data[row * self.w + col] = label;
    }

    /// Distinct non-zero labels present in the raster, ascending.
    pub fn instance_ids(&self) -> BTreeSet<i32> {
        self.data.iter().copied().filter(|&v| v != 0).collect()
    }

    /// Number of pixels carrying `label`.
    pub fn area(&self, label: i32) -> usize {
        self.data.iter().filter(|&&v| v == label).count()
    }

    pub fn max_label(&self) -> i32 {
        self.data.iter().copied().max().unwrap_or(0)
    }
}

impl ImageView for LabelImage {
    type Pixel = i32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[i32] {
        &self.data[y * self.w..(y + 1) * self.w]
    }
}

impl ImageViewMut for LabelImage {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [i32] {
        &mut self.data[y * self.w..(y + 1) * self.w]
    }
}
