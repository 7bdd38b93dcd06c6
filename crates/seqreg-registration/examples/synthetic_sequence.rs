//! Register a synthetic drifting sequence, estimate a dense field and
//! round-trip the transforms through a file.
//!
//! Run with `RUST_LOG=debug` for per-level output.

use std::sync::Arc;

use anyhow::Result;
use burn_ndarray::NdArray;
use seqreg_core::spatial::{Index2, Point2, Size2, Spacing2};
use seqreg_core::{Image, ImageSequence};
use seqreg_registration::{
    resample_sequence, ConsoleProgressCallback, DenseRegistration, DenseRegistrationConfig,
    ProgressTracker, SampleLocations, SequenceRegistration, SequenceRegistrationConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

type B = NdArray<f32>;

const SIZE: usize = 48;

fn frame(dx: f32, dy: f32) -> Image<B> {
    let mut data = Vec::with_capacity(SIZE * SIZE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let u = x as f32 - dx;
            let v = y as f32 - dy;
            let blob = 120.0 * (-((u - 20.0).powi(2) + (v - 26.0).powi(2)) / 50.0).exp();
            let texture = 10.0 * (0.3 * u).sin() * (0.25 * v).cos();
            data.push(blob + texture + 20.0);
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

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut source: ImageSequence<B> = (0..5)
        .map(|i| frame(1.5 * i as f32, -0.75 * i as f32))
        .collect();
    let tracker = ProgressTracker::new().with_callback(Arc::new(ConsoleProgressCallback::new(1)));

    let result = SequenceRegistration::new(SequenceRegistrationConfig::default())
        .with_progress(tracker.clone())
        .execute(&mut source)?;
    for (report, transform) in result.pairs.iter().zip(result.transforms.iter()) {
        info!(
            fixed = report.fixed_index,
            moving = report.moving_index,
            status = ?report.status,
            transform = %seqreg_io::format_transform(transform),
            "pair"
        );
    }

    let aligned = resample_sequence(&source, &result.transforms, 0.0)?;
    info!(frames = aligned.len(), "sequence resampled onto frame 0");

    let fixed = frame(0.0, 0.0);
    let moving = frame(1.0, 0.5);
    let features = (8..40)
        .step_by(8)
        .flat_map(|y| (8..40).step_by(8).map(move |x| Index2::new(x, y)))
        .collect();
    let dense = DenseRegistration::new(DenseRegistrationConfig::default().with_parallel(true))
        .with_progress(tracker)
        .execute(&fixed, &moving, &SampleLocations::Features(features))?;
    let magnitudes = dense.field.magnitude().to_vec();
    let peak = magnitudes.iter().copied().fold(0.0f32, f32::max);
    info!(
        registered = dense.registered,
        failed = dense.failures.len(),
        peak_displacement = peak,
        "dense field estimated"
    );

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("transforms.txt");
    seqreg_io::save_transform_group(&path, &result.transforms)?;
    let reloaded = seqreg_io::read_transform_group(&path)?;
    info!(path = %path.display(), transforms = reloaded.len(), "transforms round-tripped");
    Ok(())
}
