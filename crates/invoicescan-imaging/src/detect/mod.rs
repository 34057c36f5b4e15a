// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary detection: denoise, run independent detectors over the
// same field, then let an arbiter pick one rectangle (or none).

pub mod arbitration;
pub mod brightness;
pub mod contours;
pub mod denoise;
pub mod edge;
pub mod threshold;

use image::{DynamicImage, GrayImage};
use invoicescan_core::error::Result;
use invoicescan_core::{BoundaryCandidate, ImageSize, Strategy};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::image::to_gray;

pub use arbitration::{Arbiter, LargestArea};
pub use brightness::BrightnessDetector;
pub use denoise::{DenoiseSettings, denoise_gray};
pub use edge::EdgeDetector;
pub use threshold::ThresholdDetector;

/// One heuristic for locating a document inside a photo.
///
/// Implementations are pure functions of their inputs so that several of them
/// can run concurrently on the same denoised field.
pub trait BoundaryDetector: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Propose at most one boundary. `size` is the original image size; any
    /// returned candidate already satisfies the contour filter for it.
    fn detect(&self, gray: &GrayImage, size: ImageSize) -> Option<BoundaryCandidate>;
}

/// Runs the detectors and arbitrates between their proposals.
pub struct BoundaryFinder {
    denoise: DenoiseSettings,
    detectors: Vec<Box<dyn BoundaryDetector>>,
    arbiter: Box<dyn Arbiter>,
    parallel: bool,
}

impl Default for BoundaryFinder {
    fn default() -> Self {
        Self {
            denoise: DenoiseSettings::default(),
            detectors: vec![
                Box::new(EdgeDetector::default()),
                Box::new(ThresholdDetector::default()),
                Box::new(BrightnessDetector::default()),
            ],
            arbiter: Box::new(LargestArea),
            parallel: true,
        }
    }
}

impl BoundaryFinder {
    /// Empty finder; add detectors with [`with_detector`](Self::with_detector).
    pub fn new(arbiter: Box<dyn Arbiter>) -> Self {
        Self {
            denoise: DenoiseSettings::default(),
            detectors: Vec::new(),
            arbiter,
            parallel: true,
        }
    }

    /// Append a detector. Registration order is the arbitration tie-break.
    pub fn with_detector(mut self, detector: Box<dyn BoundaryDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Run detectors on the rayon pool (`true`) or one after another.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Every detector's proposal on an already-denoised field, in
    /// registration order.
    pub fn candidates(&self, denoised: &GrayImage, size: ImageSize) -> Vec<BoundaryCandidate> {
        let run = |detector: &dyn BoundaryDetector| {
            let found = detector.detect(denoised, size);
            debug!(
                strategy = %detector.strategy(),
                found = found.is_some(),
                "Detector finished"
            );
            found
        };

        let results: Vec<Option<BoundaryCandidate>> = if self.parallel {
            self.detectors.par_iter().map(|d| run(d.as_ref())).collect()
        } else {
            self.detectors.iter().map(|d| run(d.as_ref())).collect()
        };
        results.into_iter().flatten().collect()
    }

    /// Denoise `image`, run every detector, and arbitrate.
    ///
    /// `Ok(None)` means no usable boundary was found; that is not an error.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn locate(&self, image: &DynamicImage) -> Result<Option<BoundaryCandidate>> {
        let size = ImageSize::new(image.width(), image.height());
        let denoised = denoise_gray(&to_gray(image), &self.denoise)?;
        let candidates = self.candidates(&denoised, size);
        info!(
            count = candidates.len(),
            arbiter = self.arbiter.name(),
            "Boundary candidates collected"
        );
        Ok(self.arbiter.select(&candidates, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use invoicescan_core::Rectangle;

    struct Fixed(Strategy, f64);

    impl BoundaryDetector for Fixed {
        fn strategy(&self) -> Strategy {
            self.0
        }

        fn detect(&self, _gray: &GrayImage, _size: ImageSize) -> Option<BoundaryCandidate> {
            Some(BoundaryCandidate {
                rectangle: Rectangle::new(5, 5, 50, 50),
                area: self.1,
                strategy: self.0,
                vertex_count: 4,
            })
        }
    }

    struct Never;

    impl BoundaryDetector for Never {
        fn strategy(&self) -> Strategy {
            Strategy::Edge
        }

        fn detect(&self, _gray: &GrayImage, _size: ImageSize) -> Option<BoundaryCandidate> {
            None
        }
    }

    #[test]
    fn candidates_keep_registration_order() {
        let finder = BoundaryFinder::new(Box::new(LargestArea))
            .with_detector(Box::new(Fixed(Strategy::Brightness, 3000.0)))
            .with_detector(Box::new(Never))
            .with_detector(Box::new(Fixed(Strategy::Threshold, 2000.0)));
        let gray = GrayImage::new(100, 100);
        let size = ImageSize::new(100, 100);

        let parallel = finder.candidates(&gray, size);
        let strategies: Vec<_> = parallel.iter().map(|c| c.strategy).collect();
        assert_eq!(strategies, vec![Strategy::Brightness, Strategy::Threshold]);

        let finder = finder.parallel(false);
        assert_eq!(finder.candidates(&gray, size), parallel);
    }

    #[test]
    fn uniform_photo_has_no_boundary() {
        let photo = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 200, Luma([128])));
        assert!(BoundaryFinder::default().locate(&photo).unwrap().is_none());
    }

    #[test]
    fn bright_page_on_dark_desk_is_located() {
        let page = Rectangle::new(40, 50, 220, 290);
        let photo = DynamicImage::ImageLuma8(GrayImage::from_fn(300, 400, |x, y| {
            let inside = x >= page.x && x < page.right() && y >= page.y && y < page.bottom();
            Luma([if inside { 235 } else { 20 }])
        }));
        let found = BoundaryFinder::default().locate(&photo).unwrap().unwrap();
        let expected = page.width as f64 / page.height as f64;
        assert!((found.rectangle.aspect_ratio() - expected).abs() / expected < 0.05);
        assert!(found.rectangle.fits_within(ImageSize::new(300, 400)));
    }

    #[test]
    fn empty_image_is_an_error() {
        let photo = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(BoundaryFinder::default().locate(&photo).is_err());
    }
}
