//! Serializable trace of one postprocessing run.
use crate::instances::Instances;
use crate::nms::NmsStats;
use serde::{Deserialize, Serialize};

/// Timing entry describing a single stage of the pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn with_total(total_ms: f64) -> Self {
        Self {
            total_ms,
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Elapsed time of the first stage named `label`.
    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

/// Result produced by [`Postprocessor::process_with_diagnostics`](crate::Postprocessor).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostprocessReport {
    pub instances: Instances,
    pub trace: PipelineTrace,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTrace {
    pub input: InputDescriptor,
    pub counts: CandidateCounts,
    pub nms: NmsStats,
    pub timings: TimingBreakdown,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    /// Spatial size of the network output (grid resolution).
    pub width: usize,
    pub height: usize,
    pub n_rays: usize,
    pub grid: [usize; 2],
    /// `(height, width)` of the produced label image.
    pub label_shape: [usize; 2],
}

/// Candidate counts after each filtering stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCounts {
    pub above_threshold: usize,
    pub inside_crop: usize,
    pub kept: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_serialize_in_camel_case() {
        let mut t = TimingBreakdown::with_total(3.5);
        t.push("nms", 1.25);
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"totalMs\":3.5"), "{json}");
        assert!(json.contains("\"elapsedMs\":1.25"), "{json}");
        assert_eq!(t.stage_ms("nms"), Some(1.25));
        assert_eq!(t.stage_ms("labels"), None);
    }
}
