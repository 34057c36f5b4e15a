// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grayscale conversion and denoising ahead of boundary detection.

use image::GrayImage;
use invoicescan_core::error::Result;
use tracing::{debug, instrument};

use crate::filters::contrast::equalize_tiled;
use crate::filters::morphology::{StructuringElement, close};
use crate::filters::smoothing::{bilateral, median};
use crate::filters::ensure_non_empty;

/// Settings of the denoise stage. The defaults are tuned for phone photos
/// of thermal-paper receipts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenoiseSettings {
    /// Median window that removes salt-and-pepper noise.
    pub median_size: u32,
    pub bilateral_diameter: u32,
    /// Used for both the range and the spatial sigma.
    pub bilateral_sigma: f32,
    /// Elliptical closing kernel that fills pinholes.
    pub closing_size: u32,
    pub clip_limit: f32,
    pub grid_size: u32,
}

impl Default for DenoiseSettings {
    fn default() -> Self {
        Self {
            median_size: 5,
            bilateral_diameter: 9,
            bilateral_sigma: 75.0,
            closing_size: 3,
            clip_limit: 2.0,
            grid_size: 8,
        }
    }
}

/// Median, bilateral, closing, then tiled equalization.
///
/// The result has the same dimensions as the input.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn denoise_gray(gray: &GrayImage, settings: &DenoiseSettings) -> Result<GrayImage> {
    ensure_non_empty(gray, "denoise")?;

    let filtered = median(gray, settings.median_size);
    let smoothed = bilateral(
        &filtered,
        settings.bilateral_diameter,
        settings.bilateral_sigma,
        settings.bilateral_sigma,
    );
    let element = StructuringElement::ellipse(settings.closing_size, settings.closing_size);
    let closed = close(&smoothed, &element, 1);
    let equalized = equalize_tiled(&closed, settings.clip_limit, settings.grid_size);

    debug!("Denoise complete");
    Ok(equalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Luma, Rgb, RgbImage};
    use invoicescan_core::ScanError;

    use crate::image::to_gray;

    #[test]
    fn output_is_single_channel_with_same_size() {
        let rgb = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 5) as u8, (y * 7) as u8, 90]));
        let gray = to_gray(&DynamicImage::ImageRgb8(rgb));
        let out = denoise_gray(&gray, &DenoiseSettings::default()).unwrap();
        assert_eq!(out.dimensions(), (40, 30));
    }

    #[test]
    fn impulse_noise_is_removed() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([120]));
        for i in 0..10 {
            gray.put_pixel(3 + i * 3, 3 + i * 3, Luma([255]));
        }
        let out = denoise_gray(&gray, &DenoiseSettings::default()).unwrap();
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = denoise_gray(&GrayImage::new(0, 0), &DenoiseSettings::default()).unwrap_err();
        assert!(matches!(err, ScanError::EmptyImage { stage: "denoise" }));
    }
}
