// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Smoothing filters over `imageproc::filter`: median, fixed-size Gaussian,
// and the edge-preserving bilateral filter.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::{bilateral_filter, median_filter, separable_filter_equal};

use super::{gray_from_samples, saturate};

/// Median filter with a square `size`×`size` window.
///
/// Sizes of 1 or less return a copy.
pub fn median(image: &GrayImage, size: u32) -> GrayImage {
    if size <= 1 {
        return image.clone();
    }
    let radius = size / 2;
    median_filter(image, radius, radius)
}

/// Standard deviation implied by a kernel size when none is given explicitly.
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1-D Gaussian kernel of odd length `ksize`.
///
/// Small kernels use the binomial coefficients so that 3/5/7-tap blurs are
/// exact fractions.
pub fn gaussian_kernel(ksize: u32) -> Vec<f32> {
    match ksize {
        0 | 1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![
            0.031_25, 0.109_375, 0.218_75, 0.281_25, 0.218_75, 0.109_375, 0.031_25,
        ],
        _ => {
            let sigma = sigma_for_kernel(ksize);
            let radius = (ksize / 2) as i32;
            let scale = -0.5 / (sigma * sigma);
            let raw: Vec<f32> = (-radius..=radius)
                .map(|i| ((i * i) as f32 * scale).exp())
                .collect();
            let sum: f32 = raw.iter().sum();
            raw.into_iter().map(|w| w / sum).collect()
        }
    }
}

/// Single-channel float raster; convolution results before rounding.
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Separable convolution of `image` with `kernel` on both axes, edge pixels
/// replicated.
///
/// Returns unrounded samples so that callers can compare against them
/// directly or round once at the end.
pub fn convolve_separable(image: &GrayImage, kernel: &[f32]) -> FloatImage {
    let float = FloatImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y).0[0] as f32])
    });
    separable_filter_equal(&float, kernel)
}

/// Gaussian blur with an explicit odd kernel size (`ksize`×`ksize`).
pub fn gaussian_blur(image: &GrayImage, ksize: u32) -> GrayImage {
    if ksize <= 1 {
        return image.clone();
    }
    let blurred = convolve_separable(image, &gaussian_kernel(ksize));
    let samples: Vec<u8> = blurred.into_raw().into_iter().map(saturate).collect();
    gray_from_samples(image.width(), image.height(), &samples)
}

/// Edge-preserving bilateral filter over a `diameter`-wide window.
///
/// A diameter of 0 derives the window from `sigma_space`; windows are at
/// least 3 wide. Non-positive sigmas are treated as 1.
pub fn bilateral(image: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    let sigma_color = if sigma_color <= 0.0 { 1.0 } else { sigma_color };
    let sigma_space = if sigma_space <= 0.0 { 1.0 } else { sigma_space };
    let window = if diameter == 0 {
        2 * (sigma_space * 1.5).round() as u32 + 1
    } else {
        diameter
    };
    bilateral_filter(image, window.max(3), sigma_color, sigma_space)
}
