// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization: global (fixed or Otsu) and Gaussian-weighted adaptive
// thresholds. Output pixels are always 0 or 255.

use image::GrayImage;
use imageproc::contrast::{self, ThresholdType};

use super::smoothing::{convolve_separable, gaussian_kernel};
use super::{gray_from_samples, saturate};

/// Which side of the threshold becomes white.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// `value > threshold` → 255.
    Normal,
    /// `value > threshold` → 0.
    Inverted,
}

/// Otsu's level: the split maximising between-class variance. A
/// single-valued image yields 0.
pub fn otsu_level(gray: &GrayImage) -> u8 {
    contrast::otsu_level(gray)
}

/// Global binarization at a fixed `level`.
pub fn binarize(gray: &GrayImage, level: u8, polarity: Polarity) -> GrayImage {
    let kind = match polarity {
        Polarity::Normal => ThresholdType::Binary,
        Polarity::Inverted => ThresholdType::BinaryInverted,
    };
    contrast::threshold(gray, level, kind)
}

/// Global binarization at a fractional level, compared as `value > floor(level)`.
///
/// Levels below zero make everything bright; levels at or above 255 make
/// everything dark (before polarity is applied).
pub fn binarize_at(gray: &GrayImage, level: f64, polarity: Polarity) -> GrayImage {
    let floor = level.floor();
    if floor < 0.0 {
        let bright = match polarity {
            Polarity::Normal => 255,
            Polarity::Inverted => 0,
        };
        return GrayImage::from_pixel(gray.width(), gray.height(), image::Luma([bright]));
    }
    binarize(gray, floor.min(255.0) as u8, polarity)
}

/// Adaptive threshold against a Gaussian-weighted local mean.
///
/// Each pixel is compared with the `block_size`×`block_size` Gaussian mean of
/// its neighbourhood (edge pixels replicated) minus `offset`: brighter pixels
/// become 255, the rest 0. `block_size` must be odd and at least 3; callers
/// validate this up front.
pub fn adaptive_gaussian(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let kernel = gaussian_kernel(block_size);
    let means = convolve_separable(gray, &kernel);
    let samples: Vec<u8> = gray
        .as_raw()
        .iter()
        .zip(means.into_raw())
        .map(|(&v, mean)| {
            let local = saturate(mean) as i32;
            if v as i32 > local - offset { 255 } else { 0 }
        })
        .collect();
    gray_from_samples(gray.width(), gray.height(), &samples)
}
