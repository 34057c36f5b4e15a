// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grayscale morphology with rectangular and elliptical structuring elements,
// run through `imageproc::morphology`.
//
// Samples outside the image never contribute. Dilation uses the reflected
// element, so opening and closing with even-sized kernels do not shift the
// image.

use image::{GrayImage, Luma, imageops};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};

/// Longest side a structuring element can have; larger requests are clamped.
pub const MAX_ELEMENT_SIDE: u32 = 255;

/// A binary structuring element with its anchor at `(width / 2, height / 2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    cells: GrayImage,
    anchor: (u32, u32),
    mask: Mask,
    reflected: Mask,
}

impl StructuringElement {
    /// Filled `width`×`height` rectangle.
    pub fn rect(width: u32, height: u32) -> Self {
        let (width, height) = (clamp_side(width), clamp_side(height));
        Self::from_cells(GrayImage::from_pixel(width, height, Luma([255])))
    }

    /// Ellipse inscribed in a `width`×`height` box.
    ///
    /// Each row spans `round(c * sqrt(1 - dy²/r²))` cells either side of the
    /// centre column, giving a cross for 3×3 and an L-shaped triple for 2×2.
    pub fn ellipse(width: u32, height: u32) -> Self {
        let (width, height) = (clamp_side(width), clamp_side(height));
        let r = (height / 2) as i64;
        let c = (width / 2) as i64;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let mut cells = GrayImage::new(width, height);
        for row in 0..height as i64 {
            let dy = row - r;
            let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
            let start = (c - dx).max(0);
            let end = (c + dx + 1).min(width as i64);
            for col in start..end {
                cells.put_pixel(col as u32, row as u32, Luma([255]));
            }
        }
        Self::from_cells(cells)
    }

    fn from_cells(cells: GrayImage) -> Self {
        let (width, height) = cells.dimensions();
        let anchor = (width / 2, height / 2);
        // Sides never exceed MAX_ELEMENT_SIDE, so every anchor fits in a u8.
        let mask = Mask::from_image(&cells, anchor.0 as u8, anchor.1 as u8);
        let reflected = Mask::from_image(
            &imageops::rotate180(&cells),
            (width - 1 - anchor.0) as u8,
            (height - 1 - anchor.1) as u8,
        );
        Self {
            cells,
            anchor,
            mask,
            reflected,
        }
    }

    /// Number of active cells.
    pub fn len(&self) -> usize {
        self.cells.pixels().filter(|p| p.0[0] != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cell at `(dx, dy)` relative to the anchor is active.
    pub fn contains(&self, dx: i32, dy: i32) -> bool {
        let x = self.anchor.0 as i64 + dx as i64;
        let y = self.anchor.1 as i64 + dy as i64;
        let (w, h) = self.cells.dimensions();
        x >= 0
            && y >= 0
            && x < w as i64
            && y < h as i64
            && self.cells.get_pixel(x as u32, y as u32).0[0] != 0
    }
}

fn clamp_side(side: u32) -> u32 {
    side.clamp(1, MAX_ELEMENT_SIDE)
}

/// Neighbourhood minimum, applied `iterations` times.
pub fn erode(image: &GrayImage, element: &StructuringElement, iterations: u32) -> GrayImage {
    (0..iterations).fold(image.clone(), |current, _| {
        grayscale_erode(&current, &element.mask)
    })
}

/// Neighbourhood maximum over the reflected element, applied `iterations`
/// times.
pub fn dilate(image: &GrayImage, element: &StructuringElement, iterations: u32) -> GrayImage {
    (0..iterations).fold(image.clone(), |current, _| {
        grayscale_dilate(&current, &element.reflected)
    })
}

/// Erode then dilate: removes bright specks smaller than the element.
pub fn open(image: &GrayImage, element: &StructuringElement, iterations: u32) -> GrayImage {
    dilate(&erode(image, element, iterations), element, iterations)
}

/// Dilate then erode: fills dark specks and gaps smaller than the element.
pub fn close(image: &GrayImage, element: &StructuringElement, iterations: u32) -> GrayImage {
    erode(&dilate(image, element, iterations), element, iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_by_three_ellipse_is_a_cross() {
        let element = StructuringElement::ellipse(3, 3);
        assert_eq!(element.len(), 5);
        assert!(element.contains(0, 0));
        assert!(element.contains(0, -1));
        assert!(element.contains(-1, 0));
        assert!(!element.contains(-1, -1));
    }

    #[test]
    fn two_by_two_ellipse_anchors_bottom_right() {
        let element = StructuringElement::ellipse(2, 2);
        assert_eq!(element.len(), 3);
        assert!(element.contains(0, -1));
        assert!(element.contains(-1, 0));
        assert!(element.contains(0, 0));
        assert!(!element.contains(-1, -1));
    }

    #[test]
    fn even_rect_anchor_is_off_centre() {
        let element = StructuringElement::rect(10, 10);
        assert_eq!(element.len(), 100);
        assert!(element.contains(-5, -5));
        assert!(element.contains(4, 4));
        assert!(!element.contains(5, 5));
    }

    #[test]
    fn oversized_elements_are_clamped() {
        let element = StructuringElement::rect(10_000, 0);
        assert_eq!(element.len(), MAX_ELEMENT_SIDE as usize);
    }

    #[test]
    fn opening_removes_isolated_bright_pixel() {
        let mut img = GrayImage::from_pixel(11, 11, Luma([0]));
        img.put_pixel(5, 5, Luma([255]));
        let opened = open(&img, &StructuringElement::ellipse(3, 3), 1);
        assert_eq!(opened.get_pixel(5, 5).0[0], 0);
    }

    #[test]
    fn closing_fills_isolated_dark_pixel() {
        let mut img = GrayImage::from_pixel(11, 11, Luma([255]));
        img.put_pixel(5, 5, Luma([0]));
        let closed = close(&img, &StructuringElement::rect(3, 3), 1);
        assert_eq!(closed.get_pixel(5, 5).0[0], 255);
    }

    #[test]
    fn even_rect_erodes_towards_the_anchor() {
        // A 2x2 element anchored at (1, 1) covers (-1..=0, -1..=0): erosion
        // keeps a pixel only when its upper-left neighbours are bright too.
        let img = GrayImage::from_fn(6, 6, |x, y| {
            if (2..4).contains(&x) && (2..4).contains(&y) { Luma([255]) } else { Luma([0]) }
        });
        let eroded = erode(&img, &StructuringElement::rect(2, 2), 1);
        assert_eq!(eroded.get_pixel(3, 3).0[0], 255);
        assert_eq!(eroded.get_pixel(2, 2).0[0], 0);

        let dilated = dilate(&eroded, &StructuringElement::rect(2, 2), 1);
        assert_eq!(dilated, img);
    }

    #[test]
    fn even_kernel_closing_does_not_shift() {
        let square = GrayImage::from_fn(80, 80, |x, y| {
            if (30..50).contains(&x) && (32..48).contains(&y) { Luma([255]) } else { Luma([0]) }
        });
        let element = StructuringElement::rect(10, 10);
        assert_eq!(close(&square, &element, 3), square);
        assert_eq!(open(&square, &element, 1), square);
    }

    #[test]
    fn dilation_grows_a_square() {
        let img = GrayImage::from_fn(20, 20, |x, y| {
            if (8..12).contains(&x) && (8..12).contains(&y) { Luma([255]) } else { Luma([0]) }
        });
        let grown = dilate(&img, &StructuringElement::rect(5, 5), 2);
        assert_eq!(grown.get_pixel(4, 4).0[0], 255);
        assert_eq!(grown.get_pixel(3, 3).0[0], 0);
        assert_eq!(grown.get_pixel(15, 15).0[0], 255);
    }

    #[test]
    fn zero_iterations_is_identity() {
        let img = GrayImage::from_fn(5, 5, |x, _| Luma([x as u8 * 40]));
        assert_eq!(erode(&img, &StructuringElement::rect(3, 3), 0), img);
    }
}
