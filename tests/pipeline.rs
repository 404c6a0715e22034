mod common;

use common::init_logger;
use common::synthetic_prediction::{disk_prediction, peak_prediction, Disk};
use star_instances::prelude::*;
use star_instances::PostprocessError;

#[test]
fn overlapping_peaks_collapse_to_the_stronger() {
    init_logger();
    let output = peak_prediction(20, 20, 8, 8.0, &[([5, 5], 0.9), ([6, 6], 0.8)]);
    let pp = Postprocessor::new(PostprocessParams {
        n_rays: 8,
        prob_thresh: 0.5,
        nms_thresh: 0.3,
        ..Default::default()
    })
    .unwrap();

    let instances = pp.process(&RawPrediction::new(output)).unwrap();
    assert_eq!(instances.points, vec![[5.0, 5.0]]);
    assert_eq!(instances.prob, vec![0.9]);
    let labels = instances.labels.expect("labels requested");
    assert_eq!((labels.h, labels.w), (20, 20));
    assert_eq!(labels.instance_ids().into_iter().collect::<Vec<_>>(), vec![1]);
    assert_eq!(labels.get(5, 5), 1);
}

#[test]
fn peak_in_border_band_is_ignored() {
    init_logger();
    let output = peak_prediction(20, 20, 8, 3.0, &[([0, 0], 0.99)]);
    let pp = Postprocessor::new(PostprocessParams {
        n_rays: 8,
        b: Some(Border::Uniform(2)),
        ..Default::default()
    })
    .unwrap();

    let report = pp.process_with_diagnostics(&RawPrediction::new(output)).unwrap();
    assert!(report.instances.is_empty());
    assert_eq!(report.trace.counts.above_threshold, 0);
    let labels = report.instances.labels.unwrap();
    assert!(labels.data.iter().all(|&v| v == 0));
}

#[test]
fn disabled_border_keeps_corner_peak() {
    let output = peak_prediction(20, 20, 8, 3.0, &[([0, 0], 0.99)]);
    let pp = Postprocessor::new(PostprocessParams {
        n_rays: 8,
        b: None,
        ..Default::default()
    })
    .unwrap();
    let instances = pp.process(&RawPrediction::new(output)).unwrap();
    assert_eq!(instances.points, vec![[0.0, 0.0]]);
}

#[test]
fn separated_disks_become_separate_instances() {
    init_logger();
    let n_rays = 32;
    let disks = [
        Disk { center: [12.0, 12.0], radius: 6.0, peak: 0.95 },
        Disk { center: [12.0, 40.0], radius: 6.0, peak: 0.9 },
        Disk { center: [36.0, 26.0], radius: 6.0, peak: 0.85 },
    ];
    let output = disk_prediction(50, 56, n_rays, &disks);
    let pp = Postprocessor::new(PostprocessParams {
        n_rays,
        ..Default::default()
    })
    .unwrap();

    let report = pp.process_with_diagnostics(&RawPrediction::new(output)).unwrap();
    let instances = &report.instances;
    assert_eq!(instances.len(), 3, "kept points: {:?}", instances.points);
    assert!(report.trace.counts.above_threshold > 3);
    assert_eq!(instances.points, vec![[12.0, 12.0], [12.0, 40.0], [36.0, 26.0]]);

    let labels = instances.labels.as_ref().unwrap();
    for (i, disk) in disks.iter().enumerate() {
        let id = i as i32 + 1;
        assert_eq!(labels.get(disk.center[0] as usize, disk.center[1] as usize), id);
        let area = labels.area(id);
        assert!((100..=125).contains(&area), "instance {id} has area {area}");
    }
    assert_eq!(instances.coord.len(), 3);
}

#[test]
fn grid_scales_centers_to_full_resolution() {
    let output = peak_prediction(16, 16, 8, 3.0, &[([5, 7], 0.9)]);
    let pp = Postprocessor::new(PostprocessParams {
        n_rays: 8,
        grid: Grid::new(2, 2).unwrap(),
        ..Default::default()
    })
    .unwrap();

    let report = pp.process_with_diagnostics(&RawPrediction::new(output)).unwrap();
    assert_eq!(report.trace.input.label_shape, [32, 32]);
    assert_eq!(report.instances.points, vec![[10.0, 14.0]]);
    let labels = report.instances.labels.unwrap();
    assert_eq!((labels.h, labels.w), (32, 32));
    assert_eq!(labels.get(10, 14), 1);
}

#[test]
fn class_probabilities_follow_survivors() {
    let output = peak_prediction(20, 20, 8, 3.0, &[([5, 5], 0.8), ([14, 14], 0.9)]);
    let mut classes = TensorF32::new(20, 20, 3);
    for (y, x, probs) in [(5, 5, [0.1, 0.8, 0.1]), (14, 14, [0.6, 0.3, 0.1])] {
        for (ch, p) in probs.into_iter().enumerate() {
            classes.set(y, x, ch, p);
        }
    }
    let params = PostprocessParams {
        n_rays: 8,
        n_classes: Some(2),
        ..Default::default()
    };
    let raw = RawPrediction::from_tensor(output, Some(classes), &params).unwrap();
    let instances = Postprocessor::new(params).unwrap().process(&raw).unwrap();

    assert_eq!(instances.points, vec![[14.0, 14.0], [5.0, 5.0]]);
    assert_eq!(instances.class_id, Some(vec![0, 1]));
    let class_prob = instances.class_prob.unwrap();
    assert_eq!(class_prob[1], vec![0.1, 0.8, 0.1]);
}

#[test]
fn params_load_from_json() {
    let params = PostprocessParams::from_json_str(
        r#"{"n_rays": 8, "prob_thresh": 0.4, "nms_thresh": 0.3, "b": 1, "return_labels": false}"#,
    )
    .unwrap();
    let output = peak_prediction(12, 12, 8, 2.0, &[([1, 1], 0.45)]);
    let instances = Postprocessor::new(params)
        .unwrap()
        .process(&RawPrediction::new(output))
        .unwrap();
    assert_eq!(instances.len(), 1);
    assert!(instances.labels.is_none());
}

#[test]
fn report_serializes_to_json() {
    let output = peak_prediction(12, 12, 4, 2.0, &[([6, 6], 0.9)]);
    let pp = Postprocessor::new(PostprocessParams {
        n_rays: 4,
        ..Default::default()
    })
    .unwrap();
    let report = pp.process_with_diagnostics(&RawPrediction::new(output)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["trace"]["counts"]["kept"], 1);
    assert!(json["trace"]["timings"]["stages"].as_array().unwrap().len() >= 4);
    assert_eq!(json["instances"]["prob"][0].as_f64().map(|p| p as f32), Some(0.9));
}

#[test]
fn mismatched_output_is_rejected() {
    let output = peak_prediction(12, 12, 4, 2.0, &[]);
    let pp = Postprocessor::new(PostprocessParams {
        n_rays: 8,
        ..Default::default()
    })
    .unwrap();
    assert!(matches!(
        pp.process(&RawPrediction::new(output)),
        Err(PostprocessError::ShapeMismatch(_))
    ));
}
