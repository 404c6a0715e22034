//! Explicit star-convex polygons derived from a center and radial distances.
use super::rays::RayGeometry;
use crate::error::{ensure_len, PostprocessError, Result};
use nalgebra::{Point2, Vector2};
use serde::Serialize;

/// Axis-aligned bounds in `(row, col)` coordinates (inclusive).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl BoundingBox {
    /// Bounds of a point cloud; `None` when empty.
    pub fn from_points(points: &[Point2<f32>]) -> Option<Self> {
        let first = points.first()?;
        let mut bb = BoundingBox {
            min: [first.x, first.y],
            max: [first.x, first.y],
        };
        for p in &points[1..] {
            bb.min[0] = bb.min[0].min(p.x);
            bb.min[1] = bb.min[1].min(p.y);
            bb.max[0] = bb.max[0].max(p.x);
            bb.max[1] = bb.max[1].max(p.y);
        }
        Some(bb)
    }

    /// True when the two boxes share a region of positive area.
    #[inline]
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min[0] < other.max[0]
            && other.min[0] < self.max[0]
            && self.min[1] < other.max[1]
            && other.min[1] < self.max[1]
    }
}

/// Polygon with `n_rays` vertices, star-convex around `center`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StarPolygon {
    pub center: Point2<f32>,
    pub vertices: Vec<Point2<f32>>,
}

impl StarPolygon {
    /// Vertex `k` is `center + scale ⊙ dists[k] · (sin φ_k, cos φ_k)`.
    pub fn from_rays(
        center: Point2<f32>,
        dists: &[f32],
        rays: &RayGeometry,
        scale: Vector2<f32>,
    ) -> Self {
        debug_assert_eq!(dists.len(), rays.n_rays());
        let vertices = dists
            .iter()
            .enumerate()
            .map(|(k, &d)| {
                let [s, c] = rays.direction(k);
                Point2::new(center.x + scale.x * d * s, center.y + scale.y * d * c)
            })
            .collect();
        Self { center, vertices }
    }

    /// Signed shoelace area; positive for counter-clockwise `(row, col)` order.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }

    /// Largest vertex distance from the center.
    pub fn radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| (v - self.center).norm())
            .fold(0.0, f32::max)
    }
}

pub(crate) fn signed_area(vertices: &[Point2<f32>]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        acc += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    0.5 * acc
}

/// Dense `n_polys × 2 × n_rays` coordinate array: for polygon `i`, the first
/// `n_rays` values are vertex rows and the next `n_rays` are vertex columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonCoords {
    pub n_rays: usize,
    pub data: Vec<f32>,
}

impl PolygonCoords {
    pub fn with_rays(n_rays: usize) -> Self {
        Self {
            n_rays,
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        if self.n_rays == 0 {
            0
        } else {
            self.data.len() / (2 * self.n_rays)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self, i: usize) -> &[f32] {
        let start = i * 2 * self.n_rays;
        &self.data[start..start + self.n_rays]
    }

    pub fn cols(&self, i: usize) -> &[f32] {
        let start = i * 2 * self.n_rays + self.n_rays;
        &self.data[start..start + self.n_rays]
    }

    /// Vertices of polygon `i`.
    pub fn vertices(&self, i: usize) -> Vec<Point2<f32>> {
        self.rows(i)
            .iter()
            .zip(self.cols(i))
            .map(|(&r, &c)| Point2::new(r, c))
            .collect()
    }

    pub fn push(&mut self, polygon: &StarPolygon) {
        debug_assert_eq!(polygon.vertices.len(), self.n_rays);
        self.data.extend(polygon.vertices.iter().map(|v| v.x));
        self.data.extend(polygon.vertices.iter().map(|v| v.y));
    }
}

/// Convert per-polygon distances to Cartesian vertex coordinates.
///
/// `dists` holds `points.len() × n_rays` values. `scale_dist` multiplies the
/// ray offsets per axis before the (already rescaled) center is added.
pub fn dist_to_coord(
    dists: &[f32],
    n_rays: usize,
    points: &[[f32; 2]],
    scale_dist: Vector2<f32>,
) -> Result<PolygonCoords> {
    if n_rays == 0 {
        return Err(PostprocessError::InvalidParameter {
            name: "n_rays",
            reason: "must be positive".to_string(),
        });
    }
    ensure_len("dists", points.len() * n_rays, dists.len())?;
    let rays = RayGeometry::new(n_rays);
    let mut coords = PolygonCoords::with_rays(n_rays);
    coords.data.reserve(points.len() * 2 * n_rays);
    for (p, d) in points.iter().zip(dists.chunks_exact(n_rays)) {
        let polygon = StarPolygon::from_rays(Point2::new(p[0], p[1]), d, &rays, scale_dist);
        coords.push(&polygon);
    }
    Ok(coords)
}
