//! Grid strides and the pad/crop resizer around network inference.
//!
//! Networks that subsample their output by an integer stride per axis (the
//! *grid*) require inputs whose spatial size is divisible by that stride. The
//! resizer pads the input at the end of each axis with reflected values,
//! remembers the padding, and afterwards crops outputs and filters candidate
//! points that landed in the padded region.
use crate::error::{PostprocessError, Result};
use crate::image::{ImageView, TensorF32};
use log::debug;
use serde::{Deserialize, Serialize};

const AXES: [char; 2] = ['Y', 'X'];

/// Per-axis subsampling stride `(y, x)`; both values are powers of two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Grid {
    y: usize,
    x: usize,
}

impl Grid {
    pub fn new(y: usize, x: usize) -> Result<Self> {
        Self::from_slice(&[y, x])
    }

    /// Validates a grid given as a list; it must have exactly two entries.
    pub fn from_slice(values: &[usize]) -> Result<Self> {
        let valid = values.len() == 2 && values.iter().all(|v| v.is_power_of_two());
        if !valid {
            return Err(PostprocessError::InvalidGrid {
                grid: values.to_vec(),
                expected: 2,
            });
        }
        Ok(Self {
            y: values[0],
            x: values[1],
        })
    }

    pub fn unit() -> Self {
        Self { y: 1, x: 1 }
    }

    #[inline]
    pub fn as_array(&self) -> [usize; 2] {
        [self.y, self.x]
    }

    pub fn is_unit(&self) -> bool {
        self.y == 1 && self.x == 1
    }

    /// Fails when an axis length of `shape = (h, w)` is not a multiple of its stride.
    pub fn check_divisible(&self, shape: (usize, usize)) -> Result<()> {
        for ((axis, len), div) in AXES.iter().zip([shape.0, shape.1]).zip(self.as_array()) {
            if len % div != 0 {
                return Err(PostprocessError::NotDivisible {
                    axis: *axis,
                    len,
                    div,
                });
            }
        }
        Ok(())
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::unit()
    }
}

impl TryFrom<Vec<usize>> for Grid {
    type Error = PostprocessError;

    fn try_from(values: Vec<usize>) -> Result<Self> {
        Self::from_slice(&values)
    }
}

impl From<Grid> for Vec<usize> {
    fn from(grid: Grid) -> Self {
        grid.as_array().to_vec()
    }
}

/// Index into an axis of length `n` after `numpy`-style reflect padding.
fn reflect_index(i: usize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let m = i % period;
    if m < n {
        m
    } else {
        period - m
    }
}

/// Pads inputs to grid-compatible sizes and undoes the padding afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct PadAndCropResizer {
    grid: Grid,
    pad: [(usize, usize); 2],
    padded_shape: Option<(usize, usize)>,
}

impl PadAndCropResizer {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            pad: [(0, 0); 2],
            padded_shape: None,
        }
    }

    /// Resizer with known padding metadata, e.g. recorded by a previous `before` call.
    pub fn with_padding(grid: Grid, pad: [(usize, usize); 2], padded_shape: (usize, usize)) -> Self {
        Self {
            grid,
            pad,
            padded_shape: Some(padded_shape),
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn pad(&self) -> [(usize, usize); 2] {
        self.pad
    }

    pub fn padded_shape(&self) -> Option<(usize, usize)> {
        self.padded_shape
    }

    /// Shape of the region that was not padded, `padded_shape - pad_after`.
    pub fn valid_shape(&self) -> Result<(usize, usize)> {
        let (h, w) = self.require_padded_shape()?;
        Ok((
            h.saturating_sub(self.pad[0].1),
            w.saturating_sub(self.pad[1].1),
        ))
    }

    fn require_padded_shape(&self) -> Result<(usize, usize)> {
        let padded = self.padded_shape.ok_or_else(|| {
            PostprocessError::ShapeMismatch("resizer has no padding metadata".to_string())
        })?;
        self.grid.check_divisible(padded)?;
        Ok(padded)
    }

    /// Pads `x` at the end of each spatial axis so its length is divisible by
    /// `div_by`, reflecting values. Each `div_by` must be a multiple of the grid.
    pub fn before(&mut self, x: &TensorF32, div_by: [usize; 2]) -> Result<TensorF32> {
        for ((axis, div), g) in AXES.iter().zip(div_by).zip(self.grid.as_array()) {
            if div == 0 || div % g != 0 {
                return Err(PostprocessError::NotDivisible {
                    axis: *axis,
                    len: div,
                    div: g,
                });
            }
        }
        let (h, w) = x.shape();
        let pad_y = (div_by[0] - h % div_by[0]) % div_by[0];
        let pad_x = (div_by[1] - w % div_by[1]) % div_by[1];
        let (ph, pw) = (h + pad_y, w + pad_x);

        let mut out = TensorF32::new(ph, pw, x.c);
        if h > 0 && w > 0 {
            for r in 0..ph {
                let src = x.row(reflect_index(r, h));
                let dst = &mut out.data[r * pw * x.c..(r + 1) * pw * x.c];
                for c in 0..pw {
                    let sc = reflect_index(c, w);
                    dst[c * x.c..(c + 1) * x.c].copy_from_slice(&src[sc * x.c..(sc + 1) * x.c]);
                }
            }
        }
        self.pad = [(0, pad_y), (0, pad_x)];
        self.padded_shape = Some((ph, pw));
        debug!(
            "resizer: padded {}x{} -> {}x{} (grid {:?})",
            h,
            w,
            ph,
            pw,
            self.grid.as_array()
        );
        Ok(out)
    }

    /// Crops a (subsampled) network output back to the unpadded region.
    ///
    /// Drops `floor(pad_after / grid)` trailing rows/cols when `pad_after >= grid`.
    pub fn after(&self, x: &TensorF32) -> Result<TensorF32> {
        let padded = self.require_padded_shape()?;
        let (h, w) = x.shape();
        let [gy, gx] = self.grid.as_array();
        if padded != (h * gy, w * gx) {
            return Err(PostprocessError::ShapeMismatch(format!(
                "output {}x{} with grid {:?} does not match padded shape {:?}",
                h,
                w,
                self.grid.as_array(),
                padded
            )));
        }
        let crop = |pad_after: usize, g: usize| if pad_after >= g { pad_after / g } else { 0 };
        let oh = h - crop(self.pad[0].1, gy);
        let ow = w - crop(self.pad[1].1, gx);
        let mut out = TensorF32::new(oh, ow, x.c);
        for r in 0..oh {
            let src = &x.row(r)[..ow * x.c];
            out.data[r * ow * x.c..(r + 1) * ow * x.c].copy_from_slice(src);
        }
        Ok(out)
    }

    /// Indices of `points` (full-resolution `[row, col]`) inside the unpadded
    /// region, in input order.
    pub fn filter_points(&self, points: &[[i32; 2]]) -> Result<Vec<usize>> {
        let (bh, bw) = self.valid_shape()?;
        let bounds = [bh as i64, bw as i64];
        Ok(points
            .iter()
            .enumerate()
            .filter(|(_, p)| (p[0] as i64) < bounds[0] && (p[1] as i64) < bounds[1])
            .map(|(i, _)| i)
            .collect())
    }
}
