//! Channel-last `height × width × channels` f32 tensor.
//!
//! Raw network outputs arrive in this layout: channel 0 holds the object
//! probability and the following channels hold the ray distances.
use super::f32::ImageF32;
use super::traits::{ImageView, ImageViewMut};
use crate::error::{PostprocessError, Result};
use std::ops::Range;

#[derive(Clone, Debug, PartialEq)]
pub struct TensorF32 {
    pub h: usize,
    pub w: usize,
    pub c: usize,
    pub data: Vec<f32>,
}

impl TensorF32 {
    pub fn new(h: usize, w: usize, c: usize) -> Self {
        Self {
            h,
            w,
            c,
            data: vec![0.0; h * w * c],
        }
    }

    pub fn from_vec(h: usize, w: usize, c: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != h * w * c {
            return Err(PostprocessError::ShapeMismatch(format!(
                "tensor buffer of length {} does not match {}x{}x{}",
                data.len(),
                h,
                w,
                c
            )));
        }
        Ok(Self { h, w, c, data })
    }

    #[inline]
    pub fn idx(&self, y: usize, x: usize, ch: usize) -> usize {
        (y * self.w + x) * self.c + ch
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize, ch: usize) -> f32 {
        self.data[self.idx(y, x, ch)]
    }

    #[inline]
    pub fn set(&mut self, y: usize, x: usize, ch: usize, v: f32) {
        let i = self.idx(y, x, ch);
        self.data[i] = v;
    }

    /// Extract a single channel as a scalar image.
    pub fn channel(&self, ch: usize) -> Result<ImageF32> {
        if ch >= self.c {
            return Err(PostprocessError::ShapeMismatch(format!(
                "channel {ch} out of range for tensor with {} channels",
                self.c
            )));
        }
        let data = self.data.iter().skip(ch).step_by(self.c).copied().collect();
        ImageF32::from_vec(self.w, self.h, data)
    }

    /// Copy a contiguous channel range into a new tensor.
    pub fn channels_range(&self, range: Range<usize>) -> Result<TensorF32> {
        if range.start > range.end || range.end > self.c {
            return Err(PostprocessError::ShapeMismatch(format!(
                "channel range {:?} out of range for tensor with {} channels",
                range, self.c
            )));
        }
        let c = range.len();
        let mut data = Vec::with_capacity(self.h * self.w * c);
        for px in self.data.chunks_exact(self.c.max(1)) {
            data.extend_from_slice(&px[range.clone()]);
        }
        TensorF32::from_vec(self.h, self.w, c, data)
    }

    /// Apply `f` to every value in place.
    pub fn map_inplace(&mut self, f: impl Fn(f32) -> f32) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }
}

impl ImageView for TensorF32 {
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
    fn channels(&self) -> usize {
        self.c
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let len = self.w * self.c;
        &self.data[y * len..(y + 1) * len]
    }
}

impl ImageViewMut for TensorF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let len = self.w * self.c;
        &mut self.data[y * len..(y + 1) * len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(h: usize, w: usize, c: usize) -> TensorF32 {
        let data = (0..h * w * c).map(|v| v as f32).collect();
        TensorF32::from_vec(h, w, c, data).unwrap()
    }

    #[test]
    fn channel_extraction_strides_over_pixels() {
        let t = ramp(2, 2, 3);
        let ch1 = t.channel(1).unwrap();
        assert_eq!(ch1.data, vec![1.0, 4.0, 7.0, 10.0]);
        assert!(t.channel(3).is_err());
    }

    #[test]
    fn channel_range_keeps_pixel_order() {
        let t = ramp(1, 2, 4);
        let rest = t.channels_range(1..4).unwrap();
        assert_eq!(rest.c, 3);
        assert_eq!(rest.data, vec![1.0, 2.0, 3.0, 5.0, 6.0, 7.0]);
        assert_eq!(rest.pixel(0, 1), &[5.0, 6.0, 7.0]);
    }
}
