// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Brightness-split boundary detection around the mean intensity.

use image::GrayImage;
use invoicescan_core::{BoundaryCandidate, ImageSize, Strategy};
use tracing::debug;

use super::BoundaryDetector;
use super::contours::{ContourFilter, ContourShape};
use crate::filters::contrast::mean_intensity;
use crate::filters::morphology::{StructuringElement, close, open};
use crate::filters::threshold::{Polarity, binarize_at};

/// Assumes the page differs from the scene average: brighter than a dark
/// scene, or darker than a bright one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessDetector {
    /// Mean intensity separating "dark" from "bright" scenes.
    pub pivot: f64,
    /// Distance from the mean at which the split is made.
    pub offset: f64,
    pub kernel_size: u32,
    pub close_iterations: u32,
    pub open_iterations: u32,
}

impl Default for BrightnessDetector {
    fn default() -> Self {
        Self {
            pivot: 128.0,
            offset: 20.0,
            kernel_size: 7,
            close_iterations: 2,
            open_iterations: 1,
        }
    }
}

impl BrightnessDetector {
    /// Threshold level and polarity for a scene with the given mean.
    pub fn split(&self, mean: f64) -> (f64, Polarity) {
        if mean < self.pivot {
            (mean + self.offset, Polarity::Normal)
        } else {
            (mean - self.offset, Polarity::Inverted)
        }
    }

    /// Foreground mask after the close/open cleanup.
    pub fn mask(&self, gray: &GrayImage) -> GrayImage {
        let mean = mean_intensity(gray);
        let (level, polarity) = self.split(mean);
        debug!(mean, level, ?polarity, "Brightness split");

        let element = StructuringElement::rect(self.kernel_size, self.kernel_size);
        let binary = binarize_at(gray, level, polarity);
        let closed = close(&binary, &element, self.close_iterations);
        open(&closed, &element, self.open_iterations)
    }
}

impl BoundaryDetector for BrightnessDetector {
    fn strategy(&self) -> Strategy {
        Strategy::Brightness
    }

    fn detect(&self, gray: &GrayImage, size: ImageSize) -> Option<BoundaryCandidate> {
        let mask = self.mask(gray);
        let best: Option<ContourShape> = ContourFilter::new(size)
            .shapes(&mask)
            .into_iter()
            .fold(None, |best, shape| match best {
                Some(top) if top.area >= shape.area => Some(top),
                _ => Some(shape),
            });

        best.map(|shape| BoundaryCandidate {
            rectangle: shape.rectangle,
            area: shape.area,
            strategy: Strategy::Brightness,
            vertex_count: shape.vertex_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use invoicescan_core::Rectangle;

    #[test]
    fn split_direction_follows_the_mean() {
        let detector = BrightnessDetector::default();
        assert_eq!(detector.split(100.0), (120.0, Polarity::Normal));
        assert_eq!(detector.split(128.0), (108.0, Polarity::Inverted));
    }

    #[test]
    fn finds_bright_page_in_dark_scene() {
        let page = Rectangle::new(40, 40, 150, 200);
        let gray = GrayImage::from_fn(260, 300, |x, y| {
            let inside = x >= page.x && x < page.right() && y >= page.y && y < page.bottom();
            Luma([if inside { 210 } else { 25 }])
        });
        let candidate = BrightnessDetector::default()
            .detect(&gray, ImageSize::new(260, 300))
            .expect("page should be found");
        assert_eq!(candidate.strategy, Strategy::Brightness);
        assert_eq!(candidate.rectangle, page);
    }

    #[test]
    fn finds_dark_page_in_bright_scene() {
        let page = Rectangle::new(40, 40, 150, 200);
        let gray = GrayImage::from_fn(260, 300, |x, y| {
            let inside = x >= page.x && x < page.right() && y >= page.y && y < page.bottom();
            Luma([if inside { 30 } else { 235 }])
        });
        let candidate = BrightnessDetector::default()
            .detect(&gray, ImageSize::new(260, 300))
            .expect("inverted split should expose the page");
        assert_eq!(candidate.rectangle, page);
    }

    #[test]
    fn uniform_scene_yields_nothing() {
        let gray = GrayImage::from_pixel(120, 120, Luma([200]));
        assert!(
            BrightnessDetector::default()
                .detect(&gray, ImageSize::new(120, 120))
                .is_none()
        );
    }
}
