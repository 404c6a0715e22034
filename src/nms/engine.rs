//! Greedy suppression loop over star-convex polygons.
use super::kdtree::KdTree;
use super::NmsOptions;
use crate::candidates::descending_order;
use crate::error::{ensure_len, PostprocessError, Result};
use crate::geometry::intersection::overlap_with_areas;
use crate::geometry::{BoundingBox, RayGeometry, StarPolygon};
use log::debug;
use nalgebra::{Point2, Vector2};
use serde::Serialize;
use std::time::Instant;

/// Below this many overlap tests per accepted polygon the parallel path is not used.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_TARGETS: usize = 64;

/// Counters describing one suppression run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NmsStats {
    pub candidates: usize,
    pub kept: usize,
    /// Pairs that reached the exact polygon intersection.
    pub overlap_tests: usize,
    pub elapsed_ms: f64,
}

/// Per-candidate geometry computed once per run.
struct PolygonTable {
    polygons: Vec<StarPolygon>,
    areas: Vec<f64>,
    bboxes: Vec<Option<BoundingBox>>,
    radii: Vec<f32>,
}

impl PolygonTable {
    fn new(points: &[[i32; 2]], dists: &[f32], n_rays: usize) -> Self {
        let rays = RayGeometry::new(n_rays);
        let unit = Vector2::new(1.0, 1.0);
        let polygons: Vec<StarPolygon> = points
            .iter()
            .zip(dists.chunks_exact(n_rays))
            .map(|(p, d)| {
                StarPolygon::from_rays(Point2::new(p[0] as f32, p[1] as f32), d, &rays, unit)
            })
            .collect();
        let areas = polygons.iter().map(StarPolygon::area).collect();
        let bboxes = polygons.iter().map(StarPolygon::bbox).collect();
        let radii = polygons.iter().map(StarPolygon::radius).collect();
        Self {
            polygons,
            areas,
            bboxes,
            radii,
        }
    }

    /// Whether candidate `j` must be suppressed by accepted candidate `i`.
    fn suppresses(&self, i: usize, j: usize, options: &NmsOptions) -> bool {
        if options.use_bbox {
            match (&self.bboxes[i], &self.bboxes[j]) {
                (Some(a), Some(b)) if a.overlaps(b) => {}
                _ => return false,
            }
        }
        let overlap = overlap_with_areas(
            &self.polygons[i],
            self.areas[i],
            &self.polygons[j],
            self.areas[j],
        );
        overlap > options.thresh
    }
}

#[cfg(feature = "parallel")]
fn suppressed_by(table: &PolygonTable, i: usize, targets: &[usize], options: &NmsOptions) -> Vec<usize> {
    use rayon::prelude::*;

    if targets.len() < PARALLEL_MIN_TARGETS {
        return targets
            .iter()
            .copied()
            .filter(|&j| table.suppresses(i, j, options))
            .collect();
    }
    targets
        .par_iter()
        .copied()
        .filter(|&j| table.suppresses(i, j, options))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn suppressed_by(table: &PolygonTable, i: usize, targets: &[usize], options: &NmsOptions) -> Vec<usize> {
    targets
        .iter()
        .copied()
        .filter(|&j| table.suppresses(i, j, options))
        .collect()
}

/// Keep-mask for polygons given by centers, distances and scores.
///
/// `dists` holds `points.len() × n_rays` values. Candidates are visited by
/// descending score (equal scores by ascending index); each visited candidate
/// that is not yet suppressed is kept and suppresses every later candidate
/// whose intersection-over-smaller-area with it exceeds `options.thresh`.
/// Without `scores` all candidates rank equally, i.e. in input order.
///
/// The returned mask is in input order.
pub fn non_maximum_suppression_inds(
    points: &[[i32; 2]],
    dists: &[f32],
    n_rays: usize,
    scores: Option<&[f32]>,
    options: &NmsOptions,
) -> Result<Vec<bool>> {
    run(points, dists, n_rays, scores, options).map(|(keep, _)| keep)
}

pub(crate) fn run(
    points: &[[i32; 2]],
    dists: &[f32],
    n_rays: usize,
    scores: Option<&[f32]>,
    options: &NmsOptions,
) -> Result<(Vec<bool>, NmsStats)> {
    options.validate()?;
    let n = points.len();
    if let Some(scores) = scores {
        ensure_len("scores", n, scores.len())?;
    }
    if n == 0 {
        return Ok((Vec::new(), NmsStats::default()));
    }
    if n_rays == 0 {
        return Err(PostprocessError::InvalidParameter {
            name: "n_rays",
            reason: "must be positive".to_string(),
        });
    }
    ensure_len("dists", n * n_rays, dists.len())?;

    let t0 = Instant::now();
    let table = PolygonTable::new(points, dists, n_rays);
    let order = match scores {
        Some(scores) => descending_order(scores),
        None => (0..n).collect(),
    };
    let mut rank = vec![0usize; n];
    for (r, &i) in order.iter().enumerate() {
        rank[i] = r;
    }

    let centers: Vec<[f32; 2]> = points.iter().map(|p| [p[0] as f32, p[1] as f32]).collect();
    let tree = if options.use_kdtree {
        KdTree::build(&centers)
    } else {
        None
    };
    let max_radius = table.radii.iter().copied().fold(0.0, f32::max);

    let mut suppressed = vec![false; n];
    let mut keep = vec![false; n];
    let mut overlap_tests = 0usize;
    let mut targets = Vec::new();
    for &i in &order {
        if suppressed[i] {
            continue;
        }
        keep[i] = true;

        targets.clear();
        match &tree {
            Some(tree) => {
                // polygons can only meet if their centers are closer than r_i + r_j
                let reach = (table.radii[i] + max_radius) * (1.0 + 1e-4) + 1e-3;
                targets.extend(
                    tree.within_radius(centers[i], reach)
                        .into_iter()
                        .filter(|&j| rank[j] > rank[i] && !suppressed[j]),
                );
            }
            None => targets.extend(order[rank[i] + 1..].iter().copied().filter(|&j| !suppressed[j])),
        }
        overlap_tests += targets.len();
        for j in suppressed_by(&table, i, &targets, options) {
            suppressed[j] = true;
        }
    }

    let kept = keep.iter().filter(|&&k| k).count();
    let stats = NmsStats {
        candidates: n,
        kept,
        overlap_tests,
        elapsed_ms: t0.elapsed().as_secs_f64() * 1000.0,
    };
    debug!(
        "NMS: keeping {}/{} polygons ({} pair tests, thresh={:.3}) in {:.3} ms",
        kept, n, overlap_tests, options.thresh, stats.elapsed_ms
    );
    Ok((keep, stats))
}
