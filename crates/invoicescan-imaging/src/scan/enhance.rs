// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement chain: noise cleanup, contrast equalization, sharpening,
// adaptive binarization, and speckle removal on a single-channel image.

use image::{DynamicImage, GrayImage};
use invoicescan_core::EnhancementParameters;
use invoicescan_core::error::{Result, ScanError};
use tracing::{debug, info, instrument};

use crate::filters::contrast::{equalize_tiled, sharpen};
use crate::filters::ensure_non_empty;
use crate::filters::morphology::{StructuringElement, close, open};
use crate::filters::smoothing::{bilateral, gaussian_blur, median};
use crate::filters::threshold::adaptive_gaussian;
use crate::image::to_gray;

/// Kernel side of the final speckle cleanup on the optimal path.
const CLEANUP_KERNEL: u32 = 2;
/// Median window that ends the final cleanup.
const CLEANUP_MEDIAN: u32 = 3;

/// Turns a cropped receipt photo into a clean black-and-white raster.
///
/// Every stage consumes `self` and returns a new `ScanEnhancer`, so the chain
/// reads top to bottom:
///
/// ```ignore
/// let binary = ScanEnhancer::from_dynamic(&photo)?
///     .bilateral(14, 100.0)
///     .gaussian(7)
///     .binarize(17, 2)?
///     .into_gray();
/// ```
///
/// Disabled stages (size 0, factor 1.0, and so on) pass the image through
/// untouched.
pub struct ScanEnhancer {
    /// The working image.
    image: GrayImage,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Wrap a grayscale image. Zero-area images are rejected.
    pub fn new(image: GrayImage) -> Result<Self> {
        ensure_non_empty(&image, "enhance")?;
        Ok(Self { image })
    }

    /// Luma-convert any decoded image with the BT.601 weights.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        Self::new(to_gray(image))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    /// Consume the enhancer and return the working image.
    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    // -- Noise cleanup --------------------------------------------------------

    /// Median filter; sizes of 1 or less are a no-op.
    pub fn median(self, size: u32) -> Self {
        if size <= 1 {
            return self;
        }
        debug!(size, "Median filter");
        Self {
            image: median(&self.image, size),
        }
    }

    /// Edge-preserving smoothing; a diameter of 0 is a no-op.
    pub fn bilateral(self, diameter: u32, sigma: f32) -> Self {
        if diameter == 0 {
            return self;
        }
        debug!(diameter, sigma, "Bilateral filter");
        Self {
            image: bilateral(&self.image, diameter, sigma, sigma),
        }
    }

    /// Gaussian blur with an odd kernel size; 0 is a no-op.
    pub fn gaussian(self, size: u32) -> Self {
        if size == 0 {
            return self;
        }
        debug!(size, "Gaussian blur");
        Self {
            image: gaussian_blur(&self.image, size),
        }
    }

    // -- Contrast -------------------------------------------------------------

    /// Tiled contrast-limited equalization; a clip limit of 0 is a no-op.
    pub fn equalize(self, clip_limit: f32, grid: u32) -> Self {
        if clip_limit <= 0.0 {
            return self;
        }
        debug!(clip_limit, grid, "Tiled equalization");
        Self {
            image: equalize_tiled(&self.image, clip_limit, grid),
        }
    }

    /// Sharpness adjustment around a smoothed copy. 1.0 is a no-op, 0 yields
    /// the smoothed copy, and negative factors push past it.
    pub fn sharpen(self, factor: f32) -> Self {
        if factor == 1.0 {
            return self;
        }
        debug!(factor, "Sharpening");
        Self {
            image: sharpen(&self.image, factor),
        }
    }

    // -- Binarization ---------------------------------------------------------

    /// Gaussian-weighted adaptive threshold. `block_size` must be odd and at
    /// least 3.
    #[instrument(skip(self), fields(block_size, offset))]
    pub fn binarize(self, block_size: u32, offset: i32) -> Result<Self> {
        if block_size < 3 || block_size % 2 == 0 {
            return Err(ScanError::invalid(
                "adaptive_block",
                format!("must be odd and at least 3, got {block_size}"),
            ));
        }
        info!(block_size, offset, "Applying adaptive binarization");
        Ok(Self {
            image: adaptive_gaussian(&self.image, block_size, offset),
        })
    }

    // -- Morphology -----------------------------------------------------------

    /// Opening with an elliptical kernel; removes white specks. 0 is a no-op.
    pub fn open(self, size: u32) -> Self {
        if size == 0 {
            return self;
        }
        let element = StructuringElement::ellipse(size, size);
        Self {
            image: open(&self.image, &element, 1),
        }
    }

    /// Closing with an elliptical kernel; fills black pinholes. 0 is a no-op.
    pub fn close(self, size: u32) -> Self {
        if size == 0 {
            return self;
        }
        let element = StructuringElement::ellipse(size, size);
        Self {
            image: close(&self.image, &element, 1),
        }
    }

    /// Small open, small close, then a 3×3 median.
    pub fn final_cleanup(self) -> Self {
        debug!("Final cleanup");
        let cleaned = self.open(CLEANUP_KERNEL).close(CLEANUP_KERNEL);
        Self {
            image: median(&cleaned.image, CLEANUP_MEDIAN),
        }
    }

    // -- Enhancement pipeline -------------------------------------------------

    /// Run every stage in order with `params`.
    ///
    /// Expects parameters that went through
    /// [`EnhancementParameters::prepare`]; they are validated again here.
    #[instrument(skip_all, fields(width = self.image.width(), height = self.image.height()))]
    pub fn apply(self, params: &EnhancementParameters) -> Result<Self> {
        params.validate()?;
        info!("Running enhancement chain");

        self.median(params.median_blur_size)
            .bilateral(params.bilateral_diameter, params.bilateral_sigma as f32)
            .equalize(params.contrast_clip_limit, params.contrast_grid_size)
            .gaussian(params.gaussian_blur_size)
            .sharpen(params.sharpness_factor)
            .binarize(params.adaptive_block_size, params.adaptive_offset)
            .map(|enhancer| {
                enhancer
                    .open(params.morph_open_size)
                    .close(params.morph_close_size)
            })
    }
}
