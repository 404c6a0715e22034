//! End-to-end postprocessing of a raw network output.
//
// Stages, in order:
// - split the `H × W × (1 + n_rays)` output into probability and distances,
// - threshold with the border band and scale centers by the grid,
// - drop centers that fall into the padded region,
// - sparse NMS, rescaling, label rasterization.

use crate::candidates::{CandidateSet, MIN_DIST};
use crate::diagnostics::{
    CandidateCounts, InputDescriptor, PipelineTrace, PostprocessReport, TimingBreakdown,
};
use crate::error::{PostprocessError, Result};
use crate::image::{ImageView, TensorF32};
use crate::instances::{assemble, Instances, Prediction};
use crate::params::PostprocessParams;
use crate::resize::PadAndCropResizer;
use log::debug;
use std::time::Instant;

/// Raw network output: channel 0 is the object probability, channels
/// `1..=n_rays` the ray distances. The optional class tensor has the same
/// spatial size and `n_classes + 1` channels (background last).
#[derive(Clone, Debug)]
pub struct RawPrediction {
    pub output: TensorF32,
    pub class_prob: Option<TensorF32>,
}

impl RawPrediction {
    pub fn new(output: TensorF32) -> Self {
        Self {
            output,
            class_prob: None,
        }
    }

    pub fn with_classes(output: TensorF32, class_prob: TensorF32) -> Self {
        Self {
            output,
            class_prob: Some(class_prob),
        }
    }

    /// Checks channel counts and spatial shapes against `params`.
    pub fn from_tensor(
        output: TensorF32,
        class_prob: Option<TensorF32>,
        params: &PostprocessParams,
    ) -> Result<Self> {
        let raw = Self { output, class_prob };
        raw.check(params)?;
        Ok(raw)
    }

    fn check(&self, params: &PostprocessParams) -> Result<()> {
        if self.output.c != 1 + params.n_rays {
            return Err(PostprocessError::ShapeMismatch(format!(
                "output has {} channels, expected 1 + n_rays = {}",
                self.output.c,
                1 + params.n_rays
            )));
        }
        match (&self.class_prob, params.n_classes) {
            (None, None) => Ok(()),
            (Some(cp), Some(n)) => {
                if cp.shape() != self.output.shape() {
                    return Err(PostprocessError::ShapeMismatch(format!(
                        "class_prob has spatial shape {:?}, expected {:?}",
                        cp.shape(),
                        self.output.shape()
                    )));
                }
                if cp.c != n + 1 {
                    return Err(PostprocessError::ShapeMismatch(format!(
                        "class_prob has {} channels, expected n_classes + 1 = {}",
                        cp.c,
                        n + 1
                    )));
                }
                Ok(())
            }
            (Some(_), None) => Err(PostprocessError::ShapeMismatch(
                "class_prob given but n_classes is not set".to_string(),
            )),
            (None, Some(n)) => Err(PostprocessError::ShapeMismatch(format!(
                "n_classes = {n} but no class_prob tensor was given"
            ))),
        }
    }
}

/// Converts raw predictions into instances with a fixed parameter set.
#[derive(Clone, Debug)]
pub struct Postprocessor {
    params: PostprocessParams,
}

impl Postprocessor {
    /// Validates `params` once; later calls only check the data.
    pub fn new(params: PostprocessParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PostprocessParams {
        &self.params
    }

    pub fn process(&self, raw: &RawPrediction) -> Result<Instances> {
        self.process_with_diagnostics(raw).map(|r| r.instances)
    }

    /// Run the full pipeline and capture per-stage counts and timings.
    pub fn process_with_diagnostics(&self, raw: &RawPrediction) -> Result<PostprocessReport> {
        let total_start = Instant::now();
        let params = &self.params;
        raw.check(params)?;
        let mut timings = TimingBreakdown::default();

        let stage = Instant::now();
        let prob = raw.output.channel(0)?;
        let mut dist = raw.output.channels_range(1..1 + params.n_rays)?;
        dist.map_inplace(|d| d.max(MIN_DIST));
        timings.push("split", ms(stage));

        let stage = Instant::now();
        let candidates = CandidateSet::dense(
            &prob,
            &dist,
            raw.class_prob.as_ref(),
            params.prob_thresh,
            params.b,
            params.grid,
        )?;
        timings.push("threshold", ms(stage));

        let stage = Instant::now();
        let (h, w) = prob.shape();
        let [gy, gx] = params.grid.as_array();
        let resizer = PadAndCropResizer::with_padding(params.grid, params.pad, (h * gy, w * gx));
        let inside = resizer.filter_points(candidates.points())?;
        let cropped = if inside.len() == candidates.len() {
            candidates.clone()
        } else {
            candidates.select(&inside)
        };
        let label_shape = resizer.valid_shape()?;
        timings.push("crop", ms(stage));

        let stage = Instant::now();
        let assembled = assemble(label_shape, Prediction::Sparse(cropped), params)?;
        timings.push("nms", assembled.nms.elapsed_ms);
        timings.push("instances", ms(stage));

        let counts = CandidateCounts {
            above_threshold: candidates.len(),
            inside_crop: inside.len(),
            kept: assembled.instances.len(),
        };
        timings.total_ms = ms(total_start);
        debug!(
            "Postprocessor::process {}x{} grid={:?}: {} above threshold, {} inside crop, {} kept in {:.3} ms",
            w,
            h,
            params.grid.as_array(),
            counts.above_threshold,
            counts.inside_crop,
            counts.kept,
            timings.total_ms
        );

        Ok(PostprocessReport {
            instances: assembled.instances,
            trace: PipelineTrace {
                input: InputDescriptor {
                    width: w,
                    height: h,
                    n_rays: params.n_rays,
                    grid: [gy, gx],
                    label_shape: [label_shape.0, label_shape.1],
                },
                counts,
                nms: assembled.nms,
                timings,
            },
        })
    }
}

fn ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
