// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-detection stages: margin crop of the original photo and the
// enhancement chain that binarizes it.

pub mod crop;
pub mod enhance;

pub use crop::{MARGIN_FRACTION, crop_with_margin, expand_with_margin};
pub use enhance::ScanEnhancer;
