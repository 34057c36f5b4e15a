// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Margin expansion around a detected boundary and cropping of the original
// photo.

use image::DynamicImage;
use invoicescan_core::{ImageSize, Rectangle};
use tracing::debug;

use crate::image::ImageProcessor;

/// Margin added on each side, as a fraction of the boundary's own size.
pub const MARGIN_FRACTION: f64 = 0.03;

/// Grow `rect` by 3% of its width and height on every side, clamped to
/// `size`.
///
/// The result always contains `rect` (when `rect` fits) and never leaves the
/// image.
pub fn expand_with_margin(rect: Rectangle, size: ImageSize) -> Rectangle {
    let margin_x = (rect.width as f64 * MARGIN_FRACTION) as u32;
    let margin_y = (rect.height as f64 * MARGIN_FRACTION) as u32;

    let x = rect.x.saturating_sub(margin_x).min(size.width);
    let y = rect.y.saturating_sub(margin_y).min(size.height);
    let width = rect
        .width
        .saturating_add(2 * margin_x)
        .min(size.width - x);
    let height = rect
        .height
        .saturating_add(2 * margin_y)
        .min(size.height - y);

    debug!(margin_x, margin_y, x, y, width, height, "Boundary expanded");
    Rectangle::new(x, y, width, height)
}

/// Crop `image` to `rect` plus margin.
pub fn crop_with_margin(image: DynamicImage, rect: Rectangle) -> DynamicImage {
    let processor = ImageProcessor::from_dynamic(image);
    let region = expand_with_margin(rect, processor.size());
    processor.crop(region).into_dynamic()
}
