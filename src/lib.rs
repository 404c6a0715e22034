#![doc = include_str!("../README.md")]

// Pipeline entry points and results.
pub mod diagnostics;
pub mod error;
pub mod instances;
pub mod params;
pub mod postprocessor;

// Building blocks, usable on their own.
pub mod candidates;
pub mod geometry;
pub mod image;
pub mod labels;
pub mod mask;
pub mod nms;
pub mod resize;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{PostprocessError, Result};
pub use crate::instances::{instances_from_prediction, Instances, Prediction};
pub use crate::params::PostprocessParams;
pub use crate::postprocessor::{Postprocessor, RawPrediction};

pub use crate::diagnostics::{PipelineTrace, PostprocessReport};

pub use crate::candidates::CandidateSet;
pub use crate::labels::{polygons_to_label, polygons_to_label_coord};
pub use crate::nms::{non_maximum_suppression, non_maximum_suppression_inds, NmsOptions};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use star_instances::prelude::*;
///
/// # fn main() -> star_instances::Result<()> {
/// let n_rays = 32;
/// let output = TensorF32::new(64, 64, 1 + n_rays);
///
/// let pp = Postprocessor::new(PostprocessParams {
///     n_rays,
///     prob_thresh: 0.6,
///     ..Default::default()
/// })?;
///
/// let report = pp.process_with_diagnostics(&RawPrediction::new(output))?;
/// println!(
///     "instances={} total_ms={:.3}",
///     report.instances.len(),
///     report.trace.timings.total_ms
/// );
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::candidates::CandidateSet;
    pub use crate::geometry::{dist_to_coord, PolygonCoords, StarPolygon};
    pub use crate::image::{ImageF32, ImageView, LabelImage, TensorF32};
    pub use crate::instances::{Instances, Prediction};
    pub use crate::mask::Border;
    pub use crate::nms::NmsOptions;
    pub use crate::params::PostprocessParams;
    pub use crate::postprocessor::{Postprocessor, RawPrediction};
    pub use crate::resize::Grid;
}
