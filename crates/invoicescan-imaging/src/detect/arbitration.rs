// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Choosing one boundary among the detectors' proposals.

use invoicescan_core::{BoundaryCandidate, ImageSize, area_in_band};
use tracing::{debug, info, warn};

/// Picks the boundary to crop to, or `None` to keep the full image.
pub trait Arbiter: Send + Sync {
    /// `candidates` arrive in detector order (edge, threshold, brightness).
    fn select(&self, candidates: &[BoundaryCandidate], size: ImageSize) -> Option<BoundaryCandidate>;

    fn name(&self) -> &'static str;
}

/// The candidate with the largest contour area wins. Equal areas keep the
/// earlier candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestArea;

impl Arbiter for LargestArea {
    fn select(&self, candidates: &[BoundaryCandidate], size: ImageSize) -> Option<BoundaryCandidate> {
        let mut ranked: Vec<BoundaryCandidate> = candidates
            .iter()
            .copied()
            .filter(|c| area_in_band(c.area, size) && c.rectangle.fits_within(size))
            .collect();

        if ranked.is_empty() {
            warn!(offered = candidates.len(), "No usable document boundary, keeping full image");
            return None;
        }

        // Stable sort: ties stay in detector order.
        ranked.sort_by(|a, b| b.area.total_cmp(&a.area));
        for candidate in &ranked {
            debug!(
                strategy = %candidate.strategy,
                area = candidate.area,
                fraction = candidate.area_fraction(size),
                "Ranked candidate"
            );
        }

        let chosen = ranked[0];
        info!(
            strategy = %chosen.strategy,
            x = chosen.rectangle.x,
            y = chosen.rectangle.y,
            width = chosen.rectangle.width,
            height = chosen.rectangle.height,
            area = chosen.area,
            "Document boundary selected"
        );
        Some(chosen)
    }

    fn name(&self) -> &'static str {
        "largest_area"
    }
}
