//! Greedy non-maximum suppression for star-convex polygons.
//!
//! Candidates are ranked by score and accepted one at a time; an accepted
//! polygon suppresses every lower-ranked candidate whose overlap with it
//! (intersection area divided by the smaller of the two areas) exceeds the
//! threshold. Two optional accelerations prune the pairs that reach the exact
//! intersection test without changing the result:
//!
//! - a bounding-box prefilter (`use_bbox`),
//! - a k-d tree over centers queried with radius `r_i + r_max` (`use_kdtree`).
//!
//! With the `parallel` feature the overlap tests issued by one accepted polygon
//! run on the rayon pool. The accept loop itself is sequential.

mod engine;
pub mod kdtree;

pub use engine::{non_maximum_suppression_inds, NmsStats};
pub use kdtree::KdTree;

use crate::candidates::CandidateSet;
use crate::error::{PostprocessError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NmsOptions {
    /// Overlap above which the lower-scored polygon is suppressed, in `[0, 1]`.
    pub thresh: f32,
    pub use_bbox: bool,
    pub use_kdtree: bool,
}

impl Default for NmsOptions {
    fn default() -> Self {
        Self {
            thresh: 0.5,
            use_bbox: true,
            use_kdtree: true,
        }
    }
}

impl NmsOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.thresh) {
            return Err(PostprocessError::InvalidParameter {
                name: "nms_thresh",
                reason: format!("{} is outside [0, 1]", self.thresh),
            });
        }
        Ok(())
    }
}

/// Survivors of one NMS run.
#[derive(Clone, Debug)]
pub struct Selection {
    /// Accepted candidates in descending score order.
    pub candidates: CandidateSet,
    /// Index of each survivor in the input set.
    pub indices: Vec<usize>,
    pub stats: NmsStats,
}

/// Runs NMS over a candidate set, dense or sparse alike.
pub fn non_maximum_suppression(candidates: &CandidateSet, options: &NmsOptions) -> Result<Selection> {
    let (keep, stats) = engine::run(
        candidates.points(),
        candidates.dists(),
        candidates.n_rays(),
        Some(candidates.scores()),
        options,
    )?;
    let indices: Vec<usize> = candidates
        .score_order()
        .into_iter()
        .filter(|&i| keep[i])
        .collect();
    Ok(Selection {
        candidates: candidates.select(&indices),
        indices,
        stats,
    })
}
