// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global-threshold boundary detection using Otsu's level in both polarities.

use image::GrayImage;
use invoicescan_core::{BoundaryCandidate, ImageSize, Strategy};
use tracing::debug;

use super::BoundaryDetector;
use super::contours::{ContourFilter, ContourShape};
use crate::filters::morphology::{StructuringElement, close, open};
use crate::filters::smoothing::gaussian_blur;
use crate::filters::threshold::{Polarity, binarize, otsu_level};

/// Separates page from background with a single global threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdDetector {
    pub blur_size: u32,
    /// Side of the rectangular kernel for the close/open cleanup.
    pub kernel_size: u32,
    pub close_iterations: u32,
    pub open_iterations: u32,
}

impl Default for ThresholdDetector {
    fn default() -> Self {
        Self {
            blur_size: 5,
            kernel_size: 10,
            close_iterations: 3,
            open_iterations: 1,
        }
    }
}

impl ThresholdDetector {
    fn clean(&self, binary: &GrayImage) -> GrayImage {
        let element = StructuringElement::rect(self.kernel_size, self.kernel_size);
        let closed = close(binary, &element, self.close_iterations);
        open(&closed, &element, self.open_iterations)
    }
}

impl BoundaryDetector for ThresholdDetector {
    fn strategy(&self) -> Strategy {
        Strategy::Threshold
    }

    fn detect(&self, gray: &GrayImage, size: ImageSize) -> Option<BoundaryCandidate> {
        let blurred = gaussian_blur(gray, self.blur_size);
        let level = otsu_level(&blurred);
        debug!(level, "Otsu threshold");

        let filter = ContourFilter::new(size);
        let mut best: Option<ContourShape> = None;
        for polarity in [Polarity::Normal, Polarity::Inverted] {
            let mask = self.clean(&binarize(&blurred, level, polarity));
            for shape in filter.shapes(&mask) {
                debug!(?polarity, area = shape.area, "Threshold contour");
                if best.is_none_or(|top| shape.area > top.area) {
                    best = Some(shape);
                }
            }
        }

        best.map(|shape| BoundaryCandidate {
            rectangle: shape.rectangle,
            area: shape.area,
            strategy: Strategy::Threshold,
            vertex_count: shape.vertex_count,
        })
    }
}
