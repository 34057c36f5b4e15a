// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-based boundary detection: Canny edges, dilated into closed outlines,
// traced as contours and scored by area and quadrilateral-ness.

use image::GrayImage;
use imageproc::edges::canny;
use invoicescan_core::{BoundaryCandidate, ImageSize, Strategy};
use tracing::debug;

use super::BoundaryDetector;
use super::contours::{ContourFilter, ContourShape};
use crate::filters::morphology::{StructuringElement, dilate};
use crate::filters::smoothing::gaussian_blur;

/// Finds the document outline from its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDetector {
    pub blur_size: u32,
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Side of the rectangular dilation kernel that bridges gaps in edges.
    pub dilation_size: u32,
    pub dilation_iterations: u32,
    /// Score multiplier for outlines that do not simplify to four corners.
    pub non_quad_penalty: f64,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self {
            blur_size: 5,
            low_threshold: 50.0,
            high_threshold: 150.0,
            dilation_size: 5,
            dilation_iterations: 2,
            non_quad_penalty: 0.7,
        }
    }
}

impl EdgeDetector {
    /// Area weighted by how rectangular the outline is.
    pub fn score(&self, shape: &ContourShape) -> f64 {
        if shape.vertex_count == 4 {
            shape.area
        } else {
            shape.area * self.non_quad_penalty
        }
    }

    /// Dilated edge map the contours are traced on.
    pub fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur(gray, self.blur_size);
        let edges = canny(&blurred, self.low_threshold, self.high_threshold);
        let element = StructuringElement::rect(self.dilation_size, self.dilation_size);
        dilate(&edges, &element, self.dilation_iterations)
    }
}

impl BoundaryDetector for EdgeDetector {
    fn strategy(&self) -> Strategy {
        Strategy::Edge
    }

    fn detect(&self, gray: &GrayImage, size: ImageSize) -> Option<BoundaryCandidate> {
        let edges = self.edge_map(gray);
        let filter = ContourFilter::new(size);

        let mut best: Option<(f64, ContourShape)> = None;
        for shape in filter.shapes(&edges) {
            let score = self.score(&shape);
            debug!(
                x = shape.rectangle.x,
                y = shape.rectangle.y,
                width = shape.rectangle.width,
                height = shape.rectangle.height,
                area = shape.area,
                vertices = shape.vertex_count,
                score,
                "Edge contour"
            );
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, shape));
            }
        }

        best.map(|(_, shape)| BoundaryCandidate {
            rectangle: shape.rectangle,
            area: shape.area,
            strategy: Strategy::Edge,
            vertex_count: shape.vertex_count,
        })
    }
}
