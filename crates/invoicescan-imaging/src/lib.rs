// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// invoicescan-imaging: turns a photo of a paper receipt into a cropped,
// binarized PNG ready for text extraction.
//
// Provides the filter primitives (smoothing, morphology, contrast,
// thresholding), document boundary detection with three independent
// detectors, margin cropping, and the enhancement chain.

pub mod detect;
pub mod filters;
pub mod image;
pub mod pipeline;
pub mod scan;

// Re-export the primary entry points so callers can use `invoicescan_imaging::InvoiceNormalizer` etc.
pub use detect::{Arbiter, BoundaryDetector, BoundaryFinder, LargestArea};
pub use image::processor::ImageProcessor;
pub use pipeline::{InvoiceNormalizer, NormalizedInvoice, ProcessedInvoice, normalize_invoice_image};
pub use scan::enhance::ScanEnhancer;
