//! Assembly of the final instance set from dense or sparse predictions.
use crate::candidates::CandidateSet;
use crate::error::{PostprocessError, Result};
use crate::geometry::{dist_to_coord, PolygonCoords};
use crate::image::{ImageF32, LabelImage, TensorF32};
use crate::labels::polygons_to_label;
use crate::nms::{non_maximum_suppression, NmsStats};
use crate::params::PostprocessParams;
use log::{debug, warn};
use serde::Serialize;

/// Network output for [`instances_from_prediction`].
#[derive(Clone, Debug)]
pub enum Prediction<'a> {
    /// Per-pixel maps at grid resolution; candidates are taken from pixels
    /// above `prob_thresh` outside the border band.
    Dense {
        prob: &'a ImageF32,
        dist: &'a TensorF32,
        class_prob: Option<&'a TensorF32>,
    },
    /// Candidates already extracted, in full-resolution coordinates.
    Sparse(CandidateSet),
}

/// Surviving instances, all arrays in descending score order.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instances {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<LabelImage>,
    pub coord: PolygonCoords,
    /// Polygon centers `[row, col]` in image coordinates.
    pub points: Vec<[f32; 2]>,
    pub prob: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_prob: Option<Vec<Vec<f32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<Vec<usize>>,
}

impl Instances {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub(crate) struct Assembled {
    pub instances: Instances,
    pub nms: NmsStats,
}

/// Runs NMS on the prediction and packages the survivors.
///
/// `img_shape` is the `(height, width)` of the label image. With a `scale` in
/// `params`, centers and ray offsets are mapped back by `(1 / Y, 1 / X)`.
pub fn instances_from_prediction(
    img_shape: (usize, usize),
    prediction: Prediction<'_>,
    params: &PostprocessParams,
) -> Result<Instances> {
    assemble(img_shape, prediction, params).map(|a| a.instances)
}

pub(crate) fn assemble(
    img_shape: (usize, usize),
    prediction: Prediction<'_>,
    params: &PostprocessParams,
) -> Result<Assembled> {
    if params.overlap_label.is_some() {
        return Err(PostprocessError::OverlapLabelUnsupported);
    }
    let candidates = match prediction {
        Prediction::Dense {
            prob,
            dist,
            class_prob,
        } => CandidateSet::dense(prob, dist, class_prob, params.prob_thresh, params.b, params.grid)?,
        Prediction::Sparse(set) => set,
    };
    check_channels(&candidates, params)?;
    if candidates.is_empty() {
        warn!("no candidates above prob_thresh={:.3}", params.prob_thresh);
    }

    let selection = non_maximum_suppression(&candidates, &params.nms_options())?;
    let kept = &selection.candidates;
    let n_rays = if kept.is_empty() {
        params.n_rays
    } else {
        kept.n_rays()
    };

    let rescale = params.rescale()?;
    let points: Vec<[f32; 2]> = kept
        .points()
        .iter()
        .map(|p| [p[0] as f32 * rescale.x, p[1] as f32 * rescale.y])
        .collect();

    let labels = if params.return_labels {
        Some(polygons_to_label(
            kept.dists(),
            n_rays,
            &points,
            img_shape,
            Some(kept.scores()),
            None,
            rescale,
        )?)
    } else {
        None
    };
    let coord = dist_to_coord(kept.dists(), n_rays, &points, rescale)?;

    let (class_prob, class_id) = if kept.has_classes() {
        let rows = kept
            .iter()
            .filter_map(|c| c.class_prob.map(<[f32]>::to_vec))
            .collect();
        (Some(rows), kept.class_ids())
    } else {
        (None, None)
    };

    debug!(
        "instances: {} of {} candidates kept, labels {}",
        kept.len(),
        candidates.len(),
        if params.return_labels { "drawn" } else { "skipped" }
    );
    Ok(Assembled {
        instances: Instances {
            labels,
            coord,
            points,
            prob: kept.scores().to_vec(),
            class_prob,
            class_id,
        },
        nms: selection.stats,
    })
}

fn check_channels(candidates: &CandidateSet, params: &PostprocessParams) -> Result<()> {
    if !candidates.is_empty() && candidates.n_rays() != params.n_rays {
        return Err(PostprocessError::ShapeMismatch(format!(
            "candidates have {} rays, expected n_rays = {}",
            candidates.n_rays(),
            params.n_rays
        )));
    }
    match (params.n_classes, candidates.has_classes()) {
        (Some(n), true) if !candidates.is_empty() && candidates.n_class_channels() != n + 1 => {
            Err(PostprocessError::ShapeMismatch(format!(
                "class probabilities have {} channels, expected n_classes + 1 = {}",
                candidates.n_class_channels(),
                n + 1
            )))
        }
        (None, true) => Err(PostprocessError::ShapeMismatch(
            "class probabilities given but n_classes is not set".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Border;
    use std::collections::BTreeMap;

    fn params(n_rays: usize) -> PostprocessParams {
        PostprocessParams {
            n_rays,
            nms_thresh: 0.3,
            ..Default::default()
        }
    }

    fn two_peaks() -> (ImageF32, TensorF32) {
        let mut prob = ImageF32::new(20, 20);
        prob.set(5, 5, 0.9);
        prob.set(6, 6, 0.8);
        let mut dist = TensorF32::new(20, 20, 8);
        dist.map_inplace(|_| 8.0);
        (prob, dist)
    }

    #[test]
    fn dense_prediction_keeps_the_strongest_peak() {
        let (prob, dist) = two_peaks();
        let pred = Prediction::Dense {
            prob: &prob,
            dist: &dist,
            class_prob: None,
        };
        let inst = instances_from_prediction((20, 20), pred, &params(8)).unwrap();
        assert_eq!(inst.points, vec![[5.0, 5.0]]);
        assert_eq!(inst.prob, vec![0.9]);
        assert_eq!(inst.coord.len(), 1);
        let labels = inst.labels.unwrap();
        assert_eq!(labels.get(5, 5), 1);
        assert_eq!(labels.instance_ids().len(), 1);
    }

    #[test]
    fn sparse_prediction_carries_classes() {
        let set = CandidateSet::sparse(
            vec![[10, 10], [30, 30]],
            vec![0.7, 0.9],
            vec![vec![4.0; 8]; 2],
            Some(vec![vec![0.1, 0.7, 0.2], vec![0.2, 0.1, 0.7]]),
        )
        .unwrap();
        let p = PostprocessParams {
            n_classes: Some(2),
            ..params(8)
        };
        let inst = instances_from_prediction((40, 40), Prediction::Sparse(set), &p).unwrap();
        assert_eq!(inst.points, vec![[30.0, 30.0], [10.0, 10.0]]);
        assert_eq!(inst.class_id, Some(vec![2, 1]));
        assert_eq!(inst.class_prob.as_ref().map(Vec::len), Some(2));
        // labels follow descending score order
        let labels = inst.labels.unwrap();
        assert_eq!(labels.get(30, 30), 1);
        assert_eq!(labels.get(10, 10), 2);
    }

    #[test]
    fn scale_maps_points_back() {
        let set = CandidateSet::sparse(vec![[10, 20]], vec![0.9], vec![vec![2.0; 4]], None).unwrap();
        let p = PostprocessParams {
            scale: Some(BTreeMap::from([("X".to_string(), 0.5), ("Y".to_string(), 2.0)])),
            return_labels: false,
            ..params(4)
        };
        let inst = instances_from_prediction((40, 40), Prediction::Sparse(set), &p).unwrap();
        assert_eq!(inst.points, vec![[5.0, 40.0]]);
        assert!(inst.labels.is_none());
        // ray 0 points along +col and is stretched by 1 / 0.5
        assert!((inst.coord.cols(0)[0] - 44.0).abs() < 1e-4);
    }

    #[test]
    fn empty_prediction_gives_background() {
        let prob = ImageF32::new(8, 8);
        let dist = TensorF32::new(8, 8, 8);
        let pred = Prediction::Dense {
            prob: &prob,
            dist: &dist,
            class_prob: None,
        };
        let inst = instances_from_prediction((8, 8), pred, &params(8)).unwrap();
        assert!(inst.is_empty());
        assert!(inst.coord.is_empty());
        assert!(inst.labels.unwrap().data.iter().all(|&v| v == 0));
    }

    #[test]
    fn border_peak_is_excluded() {
        let mut prob = ImageF32::new(20, 20);
        prob.set(0, 0, 0.95);
        let mut dist = TensorF32::new(20, 20, 8);
        dist.map_inplace(|_| 3.0);
        let pred = Prediction::Dense {
            prob: &prob,
            dist: &dist,
            class_prob: None,
        };
        let p = PostprocessParams {
            b: Some(Border::Uniform(2)),
            ..params(8)
        };
        assert!(instances_from_prediction((20, 20), pred, &p).unwrap().is_empty());
    }

    #[test]
    fn overlap_label_is_not_supported() {
        let p = PostprocessParams {
            overlap_label: Some(1),
            ..params(8)
        };
        let err = instances_from_prediction((4, 4), Prediction::Sparse(CandidateSet::empty(8)), &p);
        assert!(matches!(err, Err(PostprocessError::OverlapLabelUnsupported)));
    }

    #[test]
    fn ray_count_must_match_params() {
        let set = CandidateSet::sparse(vec![[1, 1]], vec![0.9], vec![vec![2.0; 4]], None).unwrap();
        let err = instances_from_prediction((4, 4), Prediction::Sparse(set), &params(8));
        assert!(matches!(err, Err(PostprocessError::ShapeMismatch(_))));
    }
}
