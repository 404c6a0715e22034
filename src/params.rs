//! Postprocessing parameters.
//!
//! Loadable from JSON; every field is optional and falls back to the defaults
//! below. A parameter set is validated once by [`PostprocessParams::validate`]
//! before any data is touched.
use crate::error::{PostprocessError, Result};
use crate::mask::Border;
use crate::nms::NmsOptions;
use crate::resize::Grid;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessParams {
    /// Minimum object probability (exclusive) for a pixel to become a candidate.
    pub prob_thresh: f32,
    /// Overlap (intersection over smaller area) above which NMS suppresses.
    pub nms_thresh: f32,
    pub grid: Grid,
    /// Border band excluded from candidates; `None` disables it.
    pub b: Option<Border>,
    pub n_rays: usize,
    /// Number of object classes; the class tensor then has `n_classes + 1` channels.
    pub n_classes: Option<usize>,
    /// Per-axis scale (`"X"`, `"Y"`) the input was resized by before inference.
    pub scale: Option<BTreeMap<String, f32>>,
    pub use_bbox: bool,
    pub use_kdtree: bool,
    pub return_labels: bool,
    /// Not supported for 2D; any value is rejected.
    pub overlap_label: Option<i32>,
    /// `(before, after)` padding per axis recorded when the input was padded.
    pub pad: [(usize, usize); 2],
}

impl Default for PostprocessParams {
    fn default() -> Self {
        Self {
            prob_thresh: 0.5,
            nms_thresh: 0.5,
            grid: Grid::unit(),
            b: Some(Border::Uniform(2)),
            n_rays: 32,
            n_classes: None,
            scale: None,
            use_bbox: true,
            use_kdtree: true,
            return_labels: true,
            overlap_label: None,
            pad: [(0, 0); 2],
        }
    }
}

impl PostprocessParams {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PostprocessError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.prob_thresh.is_finite() {
            return Err(PostprocessError::InvalidParameter {
                name: "prob_thresh",
                reason: format!("{} is not finite", self.prob_thresh),
            });
        }
        if self.n_rays == 0 {
            return Err(PostprocessError::InvalidParameter {
                name: "n_rays",
                reason: "must be positive".to_string(),
            });
        }
        if self.n_classes == Some(0) {
            return Err(PostprocessError::InvalidParameter {
                name: "n_classes",
                reason: "must be positive when given".to_string(),
            });
        }
        if self.overlap_label.is_some() {
            return Err(PostprocessError::OverlapLabelUnsupported);
        }
        self.nms_options().validate()?;
        self.rescale()?;
        Ok(())
    }

    pub fn nms_options(&self) -> NmsOptions {
        NmsOptions {
            thresh: self.nms_thresh,
            use_bbox: self.use_bbox,
            use_kdtree: self.use_kdtree,
        }
    }

    /// Factors `(1 / Y, 1 / X)` mapping network coordinates back to the
    /// original image; `(1, 1)` without a scale.
    pub fn rescale(&self) -> Result<Vector2<f32>> {
        let Some(scale) = &self.scale else {
            return Ok(Vector2::new(1.0, 1.0));
        };
        let invalid = || PostprocessError::InvalidScale {
            keys: scale.keys().cloned().collect(),
        };
        let y = *scale.get("Y").ok_or_else(invalid)?;
        let x = *scale.get("X").ok_or_else(invalid)?;
        if !(y.is_finite() && x.is_finite() && y > 0.0 && x > 0.0) {
            return Err(invalid());
        }
        Ok(Vector2::new(1.0 / y, 1.0 / x))
    }
}
