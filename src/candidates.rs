//! Candidate polygons assembled from dense maps or from sparse point lists.
//!
//! Both sources produce the same [`CandidateSet`]: parallel arrays of centers,
//! scores, ray distances and (optionally) per-candidate class probabilities.
//! Every selection or reordering goes through [`CandidateSet::select`], which
//! keeps all arrays aligned.
use crate::error::{ensure_len, PostprocessError, Result};
use crate::image::{ImageF32, ImageView, TensorF32};
use crate::mask::{prob_threshold_mask, Border};
use crate::resize::Grid;
use std::cmp::Ordering;

/// Smallest ray distance kept; predicted distances are clamped to it.
pub const MIN_DIST: f32 = 1e-3;

/// Borrowed view of one candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate<'a> {
    pub point: [i32; 2],
    pub score: f32,
    pub dist: &'a [f32],
    pub class_prob: Option<&'a [f32]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CandidateSet {
    points: Vec<[i32; 2]>,
    scores: Vec<f32>,
    dists: Vec<f32>,
    n_rays: usize,
    class_prob: Option<Vec<f32>>,
    n_class_channels: usize,
}

fn check_spatial(name: &str, expected: (usize, usize), got: (usize, usize)) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(PostprocessError::ShapeMismatch(format!(
            "{name} has spatial shape {got:?}, expected {expected:?}"
        )))
    }
}

/// Flattens equally long rows, failing on ragged input.
fn flatten_rows(name: &str, rows: Vec<Vec<f32>>) -> Result<(Vec<f32>, usize)> {
    let width = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(rows.len() * width);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != width {
            return Err(PostprocessError::ShapeMismatch(format!(
                "{name}[{i}] has {} values, expected {width}",
                row.len()
            )));
        }
        flat.extend(row);
    }
    Ok((flat, width))
}

impl CandidateSet {
    /// Empty set for polygons with `n_rays` rays.
    pub fn empty(n_rays: usize) -> Self {
        Self {
            points: Vec::new(),
            scores: Vec::new(),
            dists: Vec::new(),
            n_rays,
            class_prob: None,
            n_class_channels: 0,
        }
    }

    /// Candidates from dense per-pixel predictions.
    ///
    /// Selects pixels with `prob > prob_thresh` outside the `border` band in
    /// row-major order. Centers are multiplied by the grid stride to land in
    /// full-resolution coordinates; distances are clamped to [`MIN_DIST`].
    pub fn dense(
        prob: &ImageF32,
        dist: &TensorF32,
        class_prob: Option<&TensorF32>,
        prob_thresh: f32,
        border: Option<Border>,
        grid: Grid,
    ) -> Result<Self> {
        check_spatial("dist", prob.shape(), dist.shape())?;
        if dist.c == 0 {
            return Err(PostprocessError::ShapeMismatch(
                "dist must have at least one ray channel".to_string(),
            ));
        }
        if let Some(cp) = class_prob {
            check_spatial("class_prob", prob.shape(), cp.shape())?;
        }

        let mask = prob_threshold_mask(prob, prob_thresh, border);
        let locations = mask.argwhere();
        let [gy, gx] = grid.as_array();
        let n_rays = dist.c;

        let mut set = Self::empty(n_rays);
        set.points.reserve(locations.len());
        set.scores.reserve(locations.len());
        set.dists.reserve(locations.len() * n_rays);
        let mut classes = class_prob.map(|cp| (cp.c, Vec::with_capacity(locations.len() * cp.c)));

        for &[r, c] in &locations {
            set.points.push([(r * gy) as i32, (c * gx) as i32]);
            set.scores.push(prob.get(c, r));
            set.dists
                .extend(dist.pixel(r, c).iter().map(|&d| d.max(MIN_DIST)));
            if let (Some(cp), Some((_, values))) = (class_prob, classes.as_mut()) {
                values.extend_from_slice(cp.pixel(r, c));
            }
        }
        if let Some((n_channels, values)) = classes {
            set.n_class_channels = n_channels;
            set.class_prob = Some(values);
        }
        Ok(set)
    }

    /// Candidates supplied directly as parallel arrays.
    ///
    /// No masking is applied. All arrays must have one entry per point and
    /// every distance/class row must have the same length.
    pub fn sparse(
        points: Vec<[i32; 2]>,
        scores: Vec<f32>,
        dists: Vec<Vec<f32>>,
        class_prob: Option<Vec<Vec<f32>>>,
    ) -> Result<Self> {
        let n = points.len();
        ensure_len("scores", n, scores.len())?;
        ensure_len("dists", n, dists.len())?;
        let (mut flat, n_rays) = flatten_rows("dists", dists)?;
        if n > 0 && n_rays == 0 {
            return Err(PostprocessError::ShapeMismatch(
                "dists rows must contain at least one ray".to_string(),
            ));
        }
        for d in &mut flat {
            *d = d.max(MIN_DIST);
        }
        let (class_prob, n_class_channels) = match class_prob {
            Some(rows) => {
                ensure_len("class_prob", n, rows.len())?;
                let (values, channels) = flatten_rows("class_prob", rows)?;
                (Some(values), channels)
            }
            None => (None, 0),
        };
        Ok(Self {
            points,
            scores,
            dists: flat,
            n_rays,
            class_prob,
            n_class_channels,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn n_rays(&self) -> usize {
        self.n_rays
    }

    pub fn points(&self) -> &[[i32; 2]] {
        &self.points
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// All distances, `len() × n_rays` values.
    pub fn dists(&self) -> &[f32] {
        &self.dists
    }

    pub fn dist(&self, i: usize) -> &[f32] {
        &self.dists[i * self.n_rays..(i + 1) * self.n_rays]
    }

    pub fn has_classes(&self) -> bool {
        self.class_prob.is_some()
    }

    /// Class channels per candidate (`n_classes + 1`), 0 without classes.
    pub fn n_class_channels(&self) -> usize {
        self.n_class_channels
    }

    pub fn class_prob(&self, i: usize) -> Option<&[f32]> {
        let k = self.n_class_channels;
        self.class_prob.as_ref().map(|v| &v[i * k..(i + 1) * k])
    }

    /// Arg-max class per candidate; first maximum wins on ties.
    pub fn class_ids(&self) -> Option<Vec<usize>> {
        self.class_prob.as_ref()?;
        Some(
            (0..self.len())
                .map(|i| self.class_prob(i).map_or(0, argmax))
                .collect(),
        )
    }

    pub fn get(&self, i: usize) -> Candidate<'_> {
        Candidate {
            point: self.points[i],
            score: self.scores[i],
            dist: self.dist(i),
            class_prob: self.class_prob(i),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Candidate<'_>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// New set holding the candidates at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut out = Self::empty(self.n_rays);
        out.n_class_channels = self.n_class_channels;
        out.points = indices.iter().map(|&i| self.points[i]).collect();
        out.scores = indices.iter().map(|&i| self.scores[i]).collect();
        out.dists = Vec::with_capacity(indices.len() * self.n_rays);
        for &i in indices {
            out.dists.extend_from_slice(self.dist(i));
        }
        if self.class_prob.is_some() {
            let mut values = Vec::with_capacity(indices.len() * self.n_class_channels);
            for &i in indices {
                values.extend_from_slice(self.class_prob(i).unwrap_or_default());
            }
            out.class_prob = Some(values);
        }
        out
    }

    /// Indices sorted by descending score; equal scores keep ascending index order.
    pub fn score_order(&self) -> Vec<usize> {
        descending_order(&self.scores)
    }
}

/// Stable descending order of `scores`; NaN sorts last.
pub(crate) fn descending_order(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| match (scores[a].is_nan(), scores[b].is_nan()) {
        (false, false) => scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
    order
}

fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
