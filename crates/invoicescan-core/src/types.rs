// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for invoice image normalization.

use serde::{Deserialize, Serialize};

/// Lower bound of the valid candidate area band, as a fraction of the image.
pub const MIN_AREA_FRACTION: f64 = 0.10;

/// Upper bound of the valid candidate area band, as a fraction of the image.
pub const MAX_AREA_FRACTION: f64 = 0.98;

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count as a float, for area comparisons.
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Width divided by height; zero for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    /// Whether the rectangle lies entirely inside an image of `size`.
    pub fn fits_within(&self, size: ImageSize) -> bool {
        self.right() <= size.width && self.bottom() <= size.height
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rectangle) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// The heuristic that produced a boundary candidate.
///
/// Declaration order is the tie-break order used during arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Canny edges, dilated and traced as contours.
    Edge,
    /// Otsu global threshold, both polarities.
    Threshold,
    /// Split at the mean brightness plus or minus a fixed offset.
    Brightness,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Edge => "edge",
            Self::Threshold => "threshold",
            Self::Brightness => "brightness",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A proposed document region inside a larger photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCandidate {
    /// Bounding box of the traced contour.
    pub rectangle: Rectangle,
    /// Polygon area of the contour in pixels (not the bounding-box area).
    pub area: f64,
    pub strategy: Strategy,
    /// Vertex count of the Douglas-Peucker approximation of the contour.
    pub vertex_count: usize,
}

impl BoundaryCandidate {
    /// Fraction of `image` covered by the contour.
    pub fn area_fraction(&self, image: ImageSize) -> f64 {
        let total = image.area();
        if total == 0.0 { 0.0 } else { self.area / total }
    }
}

/// Whether `area` falls strictly inside the valid band for an image of `size`.
pub fn area_in_band(area: f64, size: ImageSize) -> bool {
    let total = size.area();
    area > total * MIN_AREA_FRACTION && area < total * MAX_AREA_FRACTION
}

/// How the HTTP layer should return the processed PNG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Raw `image/png` body.
    #[default]
    Binary,
    /// JSON envelope with a base64 data URL.
    Base64,
}

impl ResponseFormat {
    /// Parse a form value case-insensitively; anything unrecognised is `Binary`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("base64") {
            Self::Base64
        } else {
            Self::Binary
        }
    }
}
