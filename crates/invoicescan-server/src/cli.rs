// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-shot offline processing of a single photo.

use std::path::Path;
use std::time::Instant;

use invoicescan_core::error::Result;
use invoicescan_core::{EnhancementParameters, EnhancementRequest, ServiceConfig};
use invoicescan_imaging::{InvoiceNormalizer, NormalizedInvoice};
use tracing::info;

/// Build the request for `process`: a parameter file selects the custom
/// path, otherwise the tuned defaults run.
pub fn request_from(params_path: Option<&Path>, skip_crop: bool) -> Result<EnhancementRequest> {
    match params_path {
        None => Ok(EnhancementRequest::Optimal { skip_crop }),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let mut params: EnhancementParameters = serde_json::from_str(&text)?;
            params.skip_crop |= skip_crop;
            Ok(EnhancementRequest::Custom(params))
        }
    }
}

/// Normalize `input` and write the PNG to `output`.
pub fn process_file(
    input: &Path,
    output: &Path,
    request: EnhancementRequest,
    config: &ServiceConfig,
) -> Result<NormalizedInvoice> {
    let start = Instant::now();
    let raw = std::fs::read(input)?;
    info!("Loaded {} ({} bytes)", input.display(), raw.len());

    let normalizer = InvoiceNormalizer::from_config(config);
    let result = normalizer.normalize(&raw, request)?;
    std::fs::write(output, &result.png)?;

    info!(
        original = %result.original,
        processed = %result.processed,
        fingerprint = %result.fingerprint(),
        "Wrote {} in {:.2}ms",
        output.display(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(result)
}
