//! Rasterization of star-convex polygons into an instance label image.
//!
//! Polygons are drawn in ascending score order, so where two polygons share
//! pixels the higher-scoring one wins. Label ids follow the order in which the
//! polygons were passed in (position `i` gets id `i + 1`), not the draw order.
use crate::error::{ensure_len, PostprocessError, Result};
use crate::geometry::{dist_to_coord, PolygonCoords, PolygonFill, ScanlineFill};
use crate::image::LabelImage;
use log::debug;
use nalgebra::Vector2;
use std::cmp::Ordering;

/// Rasterizes polygons given as centers plus ray distances.
///
/// Polygons with `prob <= thr` are skipped. Without `prob` every polygon
/// scores `+∞`; without `thr` nothing is filtered. Remaining polygons are drawn
/// with a stable ascending sort on score and receive label `i + 1`, where `i`
/// is the position among the polygons that passed the filter.
pub fn polygons_to_label(
    dists: &[f32],
    n_rays: usize,
    points: &[[f32; 2]],
    shape: (usize, usize),
    prob: Option<&[f32]>,
    thr: Option<f32>,
    scale_dist: Vector2<f32>,
) -> Result<LabelImage> {
    polygons_to_label_with(dists, n_rays, points, shape, prob, thr, scale_dist, &ScanlineFill)
}

/// [`polygons_to_label`] with a caller-supplied fill primitive.
#[allow(clippy::too_many_arguments)]
pub fn polygons_to_label_with(
    dists: &[f32],
    n_rays: usize,
    points: &[[f32; 2]],
    shape: (usize, usize),
    prob: Option<&[f32]>,
    thr: Option<f32>,
    scale_dist: Vector2<f32>,
    fill: &dyn PolygonFill,
) -> Result<LabelImage> {
    let n = points.len();
    if n_rays == 0 {
        return Err(PostprocessError::InvalidParameter {
            name: "n_rays",
            reason: "must be positive".to_string(),
        });
    }
    ensure_len("dists", n * n_rays, dists.len())?;
    if let Some(prob) = prob {
        ensure_len("prob", n, prob.len())?;
    }
    let score = |i: usize| prob.map_or(f32::INFINITY, |p| p[i]);
    let thr = thr.unwrap_or(f32::NEG_INFINITY);

    let kept: Vec<usize> = (0..n).filter(|&i| score(i) > thr).collect();
    let mut draw: Vec<usize> = (0..kept.len()).collect();
    draw.sort_by(|&a, &b| {
        score(kept[a])
            .partial_cmp(&score(kept[b]))
            .unwrap_or(Ordering::Equal)
    });

    let mut ordered_points = Vec::with_capacity(draw.len());
    let mut ordered_dists = Vec::with_capacity(draw.len() * n_rays);
    for &k in &draw {
        let i = kept[k];
        ordered_points.push(points[i]);
        ordered_dists.extend_from_slice(&dists[i * n_rays..(i + 1) * n_rays]);
    }
    let labels: Vec<i64> = draw.iter().map(|&k| k as i64 + 1).collect();
    let coords = dist_to_coord(&ordered_dists, n_rays, &ordered_points, scale_dist)?;
    polygons_to_label_coord(&coords, shape, Some(&labels), fill)
}

/// Draws pre-computed polygon coordinates in the given order.
///
/// `labels` defaults to `1..=n`; every label must be a non-negative integer
/// that fits the raster type. Later polygons overwrite earlier ones.
pub fn polygons_to_label_coord(
    coords: &PolygonCoords,
    shape: (usize, usize),
    labels: Option<&[i64]>,
    fill: &dyn PolygonFill,
) -> Result<LabelImage> {
    let n = coords.len();
    let labels: Vec<i32> = match labels {
        Some(labels) => {
            ensure_len("labels", n, labels.len())?;
            labels
                .iter()
                .map(|&l| i32::try_from(l).ok().filter(|&l| l >= 0))
                .collect::<Option<Vec<_>>>()
                .ok_or(PostprocessError::InvalidLabels { name: "labels" })?
        }
        None => (1..=n as i32).collect(),
    };

    let mut image = LabelImage::new(shape.0, shape.1);
    let mut painted = 0usize;
    for (i, &label) in labels.iter().enumerate() {
        for (r, c) in fill.fill(coords.rows(i), coords.cols(i), shape) {
            image.set(r, c, label);
            painted += 1;
        }
    }
    debug!(
        "labels: drew {} polygons onto {}x{} ({} pixel writes)",
        n, shape.0, shape.1, painted
    );
    Ok(image)
}
