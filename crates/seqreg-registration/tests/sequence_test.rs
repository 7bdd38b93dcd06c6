use std::sync::Arc;

use burn_ndarray::NdArray;
use seqreg_core::spatial::{Point2, Size2, Spacing2};
use seqreg_core::{Image, ImageSequence, ImageSource, Transform2D, TransformGroup};
use seqreg_registration::multires::{CoarseToFineConfig, ResolutionSchedule};
use seqreg_registration::optimizer::OptimizerStatus;
use seqreg_registration::progress::{CancellationCallback, HistoryCallback, ProgressTracker};
use seqreg_registration::sequence::{
    resample_sequence, SequenceRegistration, SequenceRegistrationConfig,
};
use seqreg_registration::{PreprocessConfig, RegistrationError};

type B = NdArray<f32>;

const SIZE: usize = 32;

fn blob_frame(cx: f32, cy: f32) -> Image<B> {
    let mut data = Vec::with_capacity(SIZE * SIZE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            data.push(100.0 * (-(dx * dx + dy * dy) / 32.0).exp());
        }
    }
    Image::from_vec(
        data,
        Size2::new(SIZE, SIZE),
        Point2::origin(),
        Spacing2::new(1.0, 1.0),
        &Default::default(),
    )
}

/// Blob drifting by `(2, -1)` pixels per frame.
fn drifting_sequence(frames: usize) -> ImageSequence<B> {
    (0..frames)
        .map(|i| blob_frame(13.0 + 2.0 * i as f32, 18.0 - i as f32))
        .collect()
}

fn config() -> SequenceRegistrationConfig {
    let schedule = CoarseToFineConfig::default().with_schedule(ResolutionSchedule::Pyramid {
        levels: 2,
        max_shrink: 2,
        min_shrink: 1,
    });
    SequenceRegistrationConfig::default().with_coarse_to_fine(schedule)
}

/// Source with one frame that cannot be produced.
struct Gappy {
    inner: ImageSequence<B>,
    missing: usize,
}

impl ImageSource<B> for Gappy {
    fn count(&self) -> usize {
        self.inner.count()
    }

    fn get_image(&self, index: usize) -> Option<Image<B>> {
        if index == self.missing {
            None
        } else {
            self.inner.get_image(index)
        }
    }

    fn current_index(&self) -> usize {
        self.inner.current_index()
    }

    fn set_current_index(&mut self, index: usize) {
        self.inner.set_current_index(index)
    }
}

#[test]
fn test_sequence_recovers_drift() {
    let mut source = drifting_sequence(3);
    let result = SequenceRegistration::new(config()).execute(&mut source).unwrap();

    assert!(!result.aborted);
    assert_eq!(result.transforms.len(), 2);
    assert_eq!(result.failed_pairs(), 0);
    for (i, transform) in result.transforms.iter().enumerate() {
        let p = transform.parameters();
        assert_eq!(transform.type_name(), "Rigid2D");
        assert!(p[0].abs() < 0.02, "pair {} angle {}", i, p[0]);
        assert!((p[3] - 2.0).abs() < 0.2, "pair {} tx {}", i, p[3]);
        assert!((p[4] + 1.0).abs() < 0.2, "pair {} ty {}", i, p[4]);
        assert_eq!(result.pairs[i].fixed_index, i);
        assert_eq!(result.pairs[i].moving_index, i + 1);
    }
    assert_eq!(source.current_index(), 2);
}

#[test]
fn test_parallel_matches_sequential() {
    let mut source = drifting_sequence(4);
    let sequential = SequenceRegistration::new(config()).execute(&mut source).unwrap();
    let parallel = SequenceRegistration::new(config().with_parallel(true))
        .execute(&mut source)
        .unwrap();

    assert_eq!(parallel.transforms.len(), 3);
    for (a, b) in sequential.transforms.iter().zip(parallel.transforms.iter()) {
        for (x, y) in a.parameters().iter().zip(b.parameters()) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}

#[test]
fn test_missing_frame_is_recorded_as_failure() {
    let mut source = Gappy {
        inner: drifting_sequence(4),
        missing: 2,
    };
    let result = SequenceRegistration::new(config()).execute(&mut source).unwrap();

    assert_eq!(result.transforms.len(), 3);
    assert!(!result.pairs[0].is_failed());
    assert!(result.pairs[1].is_failed());
    assert!(result.pairs[2].is_failed());
    assert_eq!(result.pairs[1].status, OptimizerStatus::Failed);
    assert!(result.pairs[1].error.is_some());
    assert_eq!(result.transforms.get(1), Some(&Transform2D::identity()));
    assert_eq!(result.transforms.get(2), Some(&Transform2D::identity()));
    assert_eq!(result.failed_pairs(), 2);
}

#[test]
fn test_abort_returns_prefix() {
    let cancel = CancellationCallback::abort_after(1);
    let history = HistoryCallback::new();
    let tracker = ProgressTracker::new()
        .with_callback(Arc::new(cancel.clone()))
        .with_callback(Arc::new(history.clone()));

    let mut source = drifting_sequence(4);
    let result = SequenceRegistration::new(config())
        .with_progress(tracker)
        .execute(&mut source)
        .unwrap();

    assert!(result.aborted);
    assert_eq!(result.transforms.len(), 1);
    assert_eq!(result.pairs.len(), 1);
    assert!(cancel.is_cancelled());
    assert!(history.get_history().iter().any(|info| info.completed == 1 && info.total == 3));
}

#[test]
fn test_too_few_frames() {
    let mut source = drifting_sequence(1);
    let err = SequenceRegistration::new(config()).execute(&mut source).unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidConfiguration(_)));
}

#[test]
fn test_invalid_preprocess_rejected() {
    let mut source = drifting_sequence(2);
    let bad = config().with_preprocess(PreprocessConfig::new(10.0, 0.0, 1.0));
    assert!(SequenceRegistration::new(bad).execute(&mut source).is_err());
}

#[test]
fn test_preprocessed_sequence_still_registers() {
    let mut source = drifting_sequence(2);
    let cfg = config().with_preprocess(PreprocessConfig::new(0.0, 80.0, 0.5));
    let result = SequenceRegistration::new(cfg).execute(&mut source).unwrap();
    let p = result.transforms.as_slice()[0].parameters();
    assert!((p[3] - 2.0).abs() < 0.25, "tx {}", p[3]);
    assert!((p[4] + 1.0).abs() < 0.25, "ty {}", p[4]);
}

#[test]
fn test_resample_sequence_aligns_frames() {
    let mut source = drifting_sequence(3);
    let result = SequenceRegistration::new(config()).execute(&mut source).unwrap();
    let aligned = resample_sequence(&source, &result.transforms, 0.0).unwrap();

    assert_eq!(aligned.len(), 3);
    let reference = source.get_image(0).unwrap().to_vec();
    assert_eq!(aligned[0].to_vec(), reference);

    // Peak of the first frame sits at (13, 18).
    let peak = 18 * SIZE + 13;
    for frame in &aligned[1..] {
        let values = frame.to_vec();
        assert!((values[peak] - 100.0).abs() < 5.0, "peak {}", values[peak]);
        let err: f32 = values
            .iter()
            .zip(&reference)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max);
        assert!(err < 10.0, "max abs difference {}", err);
    }
}

#[test]
fn test_resample_rejects_oversized_group() {
    let source = drifting_sequence(2);
    let group =
        TransformGroup::from_transforms(vec![Transform2D::identity(), Transform2D::identity()]);
    assert!(resample_sequence(&source, &group, 0.0).is_err());
}
