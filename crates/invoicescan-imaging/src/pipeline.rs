// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end normalization: decode, locate the receipt, crop with margin,
// enhance, encode as PNG.

use image::{DynamicImage, GrayImage};
use invoicescan_core::error::Result;
use invoicescan_core::{
    BoundaryCandidate, EnhancementParameters, EnhancementRequest, ImageSize, ServiceConfig,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use crate::detect::BoundaryFinder;
use crate::image::{ImageProcessor, encode_png};
use crate::scan::{ScanEnhancer, crop_with_margin};

/// Enhanced raster before encoding.
#[derive(Debug, Clone)]
pub struct ProcessedInvoice {
    pub image: GrayImage,
    pub original: ImageSize,
    pub boundary: Option<BoundaryCandidate>,
    /// Parameters after odd-size correction.
    pub params: EnhancementParameters,
}

/// Final output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedInvoice {
    /// Single-channel PNG.
    #[serde(skip)]
    pub png: Vec<u8>,
    pub original: ImageSize,
    pub processed: ImageSize,
    pub params: EnhancementParameters,
    pub boundary: Option<BoundaryCandidate>,
}

impl NormalizedInvoice {
    /// Lowercase hex SHA-256 of the PNG bytes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.png);
        hex::encode(hasher.finalize())
    }

    pub fn was_cropped(&self) -> bool {
        self.boundary.is_some()
    }
}

/// Owns the boundary finder and runs requests through the full chain.
#[derive(Default)]
pub struct InvoiceNormalizer {
    finder: BoundaryFinder,
}

impl InvoiceNormalizer {
    pub fn new(finder: BoundaryFinder) -> Self {
        Self { finder }
    }

    /// Default detectors, with parallelism taken from `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(BoundaryFinder::default().parallel(config.parallel_detection))
    }

    /// Decode `raw`, process it, and encode the result as PNG.
    #[instrument(skip(self, raw), fields(data_len = raw.len()))]
    pub fn normalize(&self, raw: &[u8], request: EnhancementRequest) -> Result<NormalizedInvoice> {
        // Bad parameters fail before any decoding work.
        request.parameters().prepare()?;

        let decoded = ImageProcessor::from_bytes(raw)?.into_dynamic();
        let processed = self.process(decoded, request)?;
        let png = encode_png(&processed.image)?;

        let output = NormalizedInvoice {
            png,
            original: processed.original,
            processed: ImageSize::new(processed.image.width(), processed.image.height()),
            params: processed.params,
            boundary: processed.boundary,
        };
        info!(
            original = %output.original,
            processed = %output.processed,
            cropped = output.was_cropped(),
            png_len = output.png.len(),
            "Invoice normalized"
        );
        Ok(output)
    }

    /// Crop (unless skipped or nothing was found) and enhance an already
    /// decoded image.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn process(&self, image: DynamicImage, request: EnhancementRequest) -> Result<ProcessedInvoice> {
        let params = request.parameters().prepare()?;
        let original = ImageSize::new(image.width(), image.height());

        let boundary = if params.skip_crop {
            info!("Crop skipped by request");
            None
        } else {
            self.finder.locate(&image)?
        };
        let working = match boundary {
            Some(candidate) => crop_with_margin(image, candidate.rectangle),
            None => image,
        };

        let mut enhancer = ScanEnhancer::from_dynamic(&working)?.apply(&params)?;
        if request.applies_final_cleanup() {
            enhancer = enhancer.final_cleanup();
        }

        Ok(ProcessedInvoice {
            image: enhancer.into_gray(),
            original,
            boundary,
            params,
        })
    }
}

/// Normalize one encoded photo with the default detectors.
pub fn normalize_invoice_image(raw: &[u8], request: EnhancementRequest) -> Result<NormalizedInvoice> {
    InvoiceNormalizer::default().normalize(raw, request)
}
