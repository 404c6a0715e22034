//! Ray angles shared by every polygon with the same `n_rays`.

use std::f64::consts::PI;

/// `n_rays` angles uniformly spaced over `[0, 2π)`; angle `i` is `i · 2π / n_rays`.
pub fn ray_angles(n_rays: usize) -> Vec<f32> {
    (0..n_rays)
        .map(|i| (i as f64 * 2.0 * PI / n_rays as f64) as f32)
        .collect()
}

/// Precomputed `(sin, cos)` direction of every ray.
///
/// Built once per call and shared by all candidates; the `sin` component moves
/// along rows, the `cos` component along columns.
#[derive(Clone, Debug, PartialEq)]
pub struct RayGeometry {
    angles: Vec<f32>,
    sin: Vec<f32>,
    cos: Vec<f32>,
}

impl RayGeometry {
    pub fn new(n_rays: usize) -> Self {
        let mut sin = Vec::with_capacity(n_rays);
        let mut cos = Vec::with_capacity(n_rays);
        for i in 0..n_rays {
            let phi = i as f64 * 2.0 * PI / n_rays as f64;
            sin.push(phi.sin() as f32);
            cos.push(phi.cos() as f32);
        }
        Self {
            angles: ray_angles(n_rays),
            sin,
            cos,
        }
    }

    #[inline]
    pub fn n_rays(&self) -> usize {
        self.angles.len()
    }

    pub fn angles(&self) -> &[f32] {
        &self.angles
    }

    /// Unit direction `(sin φ, cos φ)` of ray `k` in `(row, col)` order.
    #[inline]
    pub fn direction(&self, k: usize) -> [f32; 2] {
        [self.sin[k], self.cos[k]]
    }
}
