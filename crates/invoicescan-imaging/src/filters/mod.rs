// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filter primitives on single-channel rasters. Most stages wrap
// `imageproc`; the tiled equalization and the Gaussian-weighted adaptive
// threshold are built here. Everything is pure and deterministic;
// stage-level validation lives with the callers.

pub mod contrast;
pub mod morphology;
pub mod smoothing;
pub mod threshold;

use image::GrayImage;
use invoicescan_core::error::{Result, ScanError};

/// Fail with [`ScanError::EmptyImage`] when `image` has no pixels.
pub fn ensure_non_empty(image: &GrayImage, stage: &'static str) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::EmptyImage { stage });
    }
    Ok(())
}

/// Build a `GrayImage` from a row-major buffer of already-clamped samples.
pub(crate) fn gray_from_samples(width: u32, height: u32, samples: &[u8]) -> GrayImage {
    let stride = width as usize;
    GrayImage::from_fn(width, height, |x, y| {
        image::Luma([samples[y as usize * stride + x as usize]])
    })
}

/// Round and saturate a float sample to `u8`.
#[inline]
pub(crate) fn saturate(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
