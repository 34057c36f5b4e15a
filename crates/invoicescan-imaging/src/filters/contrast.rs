// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast operations: tiled (contrast-limited) histogram equalization and
// blend-based sharpening.

use image::GrayImage;

use super::{gray_from_samples, saturate};

const BINS: usize = 256;

/// Contrast-limited tiled histogram equalization.
///
/// The image is split into `grid`×`grid` tiles. Each tile gets its own
/// equalization curve whose histogram is clipped at
/// `clip_limit * tile_area / 256` (at least 1) with the excess spread evenly
/// over all bins. Output pixels bilinearly interpolate the curves of the four
/// nearest tile centres, so tile seams are invisible. A `clip_limit` of zero
/// disables clipping.
pub fn equalize_tiled(image: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }
    let grid = grid.max(1);
    let tile_w = w.div_ceil(grid.min(w));
    let tile_h = h.div_ceil(grid.min(h));
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);
    let src = image.as_raw();

    let mut luts: Vec<[u8; BINS]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut histogram = [0u32; BINS];
            for y in y0..y1 {
                let row = (y * w) as usize;
                for x in x0..x1 {
                    histogram[src[row + x as usize] as usize] += 1;
                }
            }
            let area = (x1 - x0) * (y1 - y0);
            luts.push(tile_curve(&mut histogram, area, clip_limit));
        }
    }

    let lut = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];
    let mut samples = vec![0u8; (w * h) as usize];

    for y in 0..h {
        let fy = y as f32 / tile_h as f32 - 0.5;
        let ty1 = fy.floor() as i64;
        let ya = fy - ty1 as f32;
        let ty2 = (ty1 + 1).min(tiles_y as i64 - 1) as u32;
        let ty1 = ty1.max(0) as u32;

        for x in 0..w {
            let fx = x as f32 / tile_w as f32 - 0.5;
            let tx1 = fx.floor() as i64;
            let xa = fx - tx1 as f32;
            let tx2 = (tx1 + 1).min(tiles_x as i64 - 1) as u32;
            let tx1 = tx1.max(0) as u32;

            let idx = (y * w + x) as usize;
            let v = src[idx] as usize;
            let top = lut(tx1, ty1)[v] as f32 * (1.0 - xa) + lut(tx2, ty1)[v] as f32 * xa;
            let bottom = lut(tx1, ty2)[v] as f32 * (1.0 - xa) + lut(tx2, ty2)[v] as f32 * xa;
            samples[idx] = saturate(top * (1.0 - ya) + bottom * ya);
        }
    }

    gray_from_samples(w, h, &samples)
}

/// Clip a tile histogram, redistribute the excess, and build its cumulative
/// mapping onto `0..=255`.
fn tile_curve(histogram: &mut [u32; BINS], area: u32, clip_limit: f32) -> [u8; BINS] {
    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
        let mut excess = 0u32;
        for count in histogram.iter_mut() {
            if *count > clip {
                excess += *count - clip;
                *count = clip;
            }
        }

        let per_bin = excess / BINS as u32;
        let mut residual = excess - per_bin * BINS as u32;
        for count in histogram.iter_mut() {
            *count += per_bin;
        }
        if residual > 0 {
            let step = (BINS as u32 / residual).max(1) as usize;
            let mut bin = 0;
            while bin < BINS && residual > 0 {
                histogram[bin] += 1;
                residual -= 1;
                bin += step;
            }
        }
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut curve = [0u8; BINS];
    let mut cumulative = 0u32;
    for (bin, count) in histogram.iter().enumerate() {
        cumulative += count;
        curve[bin] = saturate(cumulative as f32 * scale);
    }
    curve
}

/// Arithmetic mean of all samples; zero for an empty image.
pub fn mean_intensity(image: &GrayImage) -> f64 {
    let raw = image.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let sum: u64 = raw.iter().map(|&v| v as u64).sum();
    sum as f64 / raw.len() as f64
}

/// 3×3 smoothing with a heavy centre tap (`[1 1 1; 1 5 1; 1 1 1] / 13`).
///
/// The one-pixel frame is copied unchanged.
pub fn smooth_3x3(image: &GrayImage) -> GrayImage {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let src = image.as_raw();
    let mut samples = src.to_vec();
    if w < 3 || h < 3 {
        return image.clone();
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = 0u32;
            for dy in 0..3 {
                for dx in 0..3 {
                    let weight = if dx == 1 && dy == 1 { 5 } else { 1 };
                    acc += weight * src[(y + dy - 1) * w + (x + dx - 1)] as u32;
                }
            }
            samples[y * w + x] = saturate(acc as f32 / 13.0);
        }
    }
    gray_from_samples(image.width(), image.height(), &samples)
}

/// Sharpen (or soften) by extrapolating away from a smoothed copy.
///
/// `factor` 1.0 returns the input; values above 1.0 add
/// `(factor - 1) * (image - smoothed)` (an unsharp mask); values between 0 and
/// 1 blend towards the smoothed copy.
pub fn sharpen(image: &GrayImage, factor: f32) -> GrayImage {
    let smoothed = smooth_3x3(image);
    let samples: Vec<u8> = image
        .as_raw()
        .iter()
        .zip(smoothed.as_raw())
        .map(|(&orig, &soft)| saturate(soft as f32 + factor * (orig as f32 - soft as f32)))
        .collect();
    gray_from_samples(image.width(), image.height(), &samples)
}
