// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour extraction and the geometric filter shared by every detector.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use invoicescan_core::{ImageSize, Rectangle, area_in_band};

/// Bounding boxes starting within this many pixels of the origin may count
/// as "the whole frame".
const WHOLE_IMAGE_ORIGIN_SLACK: u32 = 10;

/// ...and must also come within this many pixels of the full width/height.
const WHOLE_IMAGE_SIZE_SLACK: u32 = 20;

/// Accepted bounding-box aspect ratios (width / height), inclusive.
const MIN_ASPECT: f64 = 0.3;
const MAX_ASPECT: f64 = 3.0;

/// Douglas-Peucker tolerance as a fraction of the contour perimeter.
const APPROX_EPSILON_FRACTION: f64 = 0.02;

/// Geometry of a contour that survived [`ContourFilter::accept`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourShape {
    pub rectangle: Rectangle,
    pub area: f64,
    pub vertex_count: usize,
}

/// Outer borders of the foreground (non-zero) regions that are not nested
/// inside any other region.
pub fn external_contours(binary: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Area enclosed by a closed polygon, via the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// Smallest axis-aligned rectangle containing every point (inclusive of the
/// extreme pixels).
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rectangle> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rectangle::new(
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// Whether `rect` is effectively the entire frame rather than a document.
pub fn is_whole_image(rect: &Rectangle, size: ImageSize) -> bool {
    rect.x <= WHOLE_IMAGE_ORIGIN_SLACK
        && rect.y <= WHOLE_IMAGE_ORIGIN_SLACK
        && rect.width >= size.width.saturating_sub(WHOLE_IMAGE_SIZE_SLACK)
        && rect.height >= size.height.saturating_sub(WHOLE_IMAGE_SIZE_SLACK)
}

/// Vertex count of the closed Douglas-Peucker approximation with a tolerance
/// of 2% of the perimeter.
pub fn approx_vertex_count(points: &[Point<i32>]) -> usize {
    if points.len() < 3 {
        return points.len();
    }
    let epsilon = APPROX_EPSILON_FRACTION * arc_length(points, true);
    approximate_polygon_dp(points, epsilon, true).len()
}

/// Area band, whole-frame, and aspect-ratio filter for one image size.
#[derive(Debug, Clone, Copy)]
pub struct ContourFilter {
    size: ImageSize,
}

impl ContourFilter {
    pub fn new(size: ImageSize) -> Self {
        Self { size }
    }

    /// Measure a contour and keep it only if it plausibly outlines a
    /// document.
    pub fn accept(&self, points: &[Point<i32>]) -> Option<ContourShape> {
        let area = polygon_area(points);
        if !area_in_band(area, self.size) {
            return None;
        }
        let rectangle = bounding_rect(points)?;
        if is_whole_image(&rectangle, self.size) {
            return None;
        }
        let aspect = rectangle.aspect_ratio();
        if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect) {
            return None;
        }
        Some(ContourShape {
            rectangle,
            area,
            vertex_count: approx_vertex_count(points),
        })
    }

    /// Run [`accept`](Self::accept) over every external contour of `binary`.
    pub fn shapes(&self, binary: &GrayImage) -> Vec<ContourShape> {
        external_contours(binary)
            .iter()
            .filter_map(|points| self.accept(points))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled_rect(w: u32, h: u32, rect: Rectangle) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let inside = x >= rect.x && x < rect.right() && y >= rect.y && y < rect.bottom();
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn shoelace_area_rectangle() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(0, 5),
        ];
        assert!((polygon_area(&square) - 50.0).abs() < 1e-9);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn traced_rectangle_is_measured() {
        let rect = Rectangle::new(20, 30, 60, 80);
        let img = filled_rect(120, 150, rect);
        let contours = external_contours(&img);
        assert_eq!(contours.len(), 1);

        let bbox = bounding_rect(&contours[0]).unwrap();
        assert_eq!(bbox, rect);
        assert!((polygon_area(&contours[0]) - 59.0 * 79.0).abs() < 1e-6);
        assert_eq!(approx_vertex_count(&contours[0]), 4);
    }

    #[test]
    fn nested_regions_are_not_external() {
        let mut img = filled_rect(100, 100, Rectangle::new(10, 10, 80, 80));
        for y in 30..70 {
            for x in 30..70 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        for y in 40..60 {
            for x in 40..60 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        assert_eq!(external_contours(&img).len(), 1);
    }

    #[test]
    fn whole_frame_detection() {
        let size = ImageSize::new(500, 500);
        assert!(is_whole_image(&Rectangle::new(5, 5, 485, 490), size));
        assert!(!is_whole_image(&Rectangle::new(11, 5, 489, 495), size));
        assert!(!is_whole_image(&Rectangle::new(0, 0, 479, 500), size));
    }

    #[test]
    fn filter_rejects_out_of_band_areas() {
        let size = ImageSize::new(200, 200);
        let filter = ContourFilter::new(size);
        let tiny = filled_rect(200, 200, Rectangle::new(10, 10, 20, 20));
        assert!(filter.shapes(&tiny).is_empty());

        let decent = filled_rect(200, 200, Rectangle::new(40, 30, 100, 120));
        let shapes = filter.shapes(&decent);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].rectangle, Rectangle::new(40, 30, 100, 120));
    }

    #[test]
    fn filter_rejects_extreme_aspect_ratios() {
        let filter = ContourFilter::new(ImageSize::new(400, 400));
        let strip = filled_rect(400, 400, Rectangle::new(20, 150, 360, 100));
        assert!(filter.shapes(&strip).is_empty());
    }

    #[test]
    fn aspect_bounds_are_inclusive() {
        let filter = ContourFilter::new(ImageSize::new(300, 300));
        let outline = |w: i32, h: i32| {
            [
                Point::new(10, 10),
                Point::new(10 + w - 1, 10),
                Point::new(10 + w - 1, 10 + h - 1),
                Point::new(10, 10 + h - 1),
            ]
        };
        assert!(filter.accept(&outline(270, 90)).is_some());
        assert!(filter.accept(&outline(60, 200)).is_some());
        assert!(filter.accept(&outline(271, 90)).is_none());
        assert!(filter.accept(&outline(59, 200)).is_none());
    }

    #[test]
    fn filter_rejects_the_full_frame() {
        let filter = ContourFilter::new(ImageSize::new(300, 300));
        let almost_all = filled_rect(300, 300, Rectangle::new(2, 2, 296, 296));
        assert!(filter.shapes(&almost_all).is_empty());
    }
}
