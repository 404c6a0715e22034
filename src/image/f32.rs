//! Owned single-channel f32 raster in row-major layout.
//!
//! Used for per-pixel object probabilities. Rows are contiguous, so the whole
//! buffer can be borrowed as one slice.
use crate::error::{PostprocessError, Result};
use crate::image::traits::{ImageView, ImageViewMut};

#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing row-major buffer, checking its length against `w × h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != w * h {
            return Err(PostprocessError::ShapeMismatch(format!(
                "image buffer of length {} does not match {}x{}",
                data.len(),
                h,
                w
            )));
        }
        Ok(Self { w, h, data })
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(ImageF32::from_vec(3, 2, vec![0.0; 6]).is_ok());
        assert!(matches!(
            ImageF32::from_vec(3, 2, vec![0.0; 5]),
            Err(PostprocessError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn rows_follow_row_major_layout() {
        let img = ImageF32::from_vec(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let rows: Vec<&[f32]> = img.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], &[4.0, 5.0]);
        assert_eq!(img.get(1, 1), 3.0);
        assert_eq!(img.shape(), (3, 2));
    }
}
