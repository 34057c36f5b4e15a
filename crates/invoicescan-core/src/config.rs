// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement parameters and service configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Largest accepted side of a median, Gaussian, morphology, or adaptive
/// threshold kernel.
pub const MAX_KERNEL_SIZE: u32 = 99;
/// Largest accepted bilateral filter diameter.
pub const MAX_BILATERAL_DIAMETER: u32 = 25;
/// Largest accepted number of equalization tiles per axis.
pub const MAX_GRID_SIZE: u32 = 64;

/// Every numeric knob of the enhancement chain.
///
/// Serialized field names are the form-field names accepted by the HTTP
/// layer, so the same struct parses overrides and echoes effective values.
/// Kernel sizes that must be odd are corrected upward by [`normalized`].
///
/// [`normalized`]: EnhancementParameters::normalized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementParameters {
    /// Median filter window (odd, 1 disables).
    #[serde(rename = "median_blur")]
    pub median_blur_size: u32,
    /// Bilateral filter diameter (0 disables).
    #[serde(rename = "bilateral_d")]
    pub bilateral_diameter: u32,
    /// Shared range and spatial sigma of the bilateral filter.
    pub bilateral_sigma: u32,
    /// Tiled equalization clip limit (0 disables).
    #[serde(rename = "clahe_clip")]
    pub contrast_clip_limit: f32,
    /// Tiles per axis for tiled equalization.
    #[serde(rename = "clahe_grid")]
    pub contrast_grid_size: u32,
    /// Adaptive threshold neighbourhood (odd, at least 3).
    #[serde(rename = "adaptive_block")]
    pub adaptive_block_size: u32,
    /// Constant subtracted from the local weighted mean.
    #[serde(rename = "adaptive_c")]
    pub adaptive_offset: i32,
    /// Gaussian blur kernel (odd, 0 disables).
    #[serde(rename = "gaussian_blur")]
    pub gaussian_blur_size: u32,
    /// Elliptical opening kernel (0 disables).
    #[serde(rename = "morph_open")]
    pub morph_open_size: u32,
    /// Elliptical closing kernel (0 disables).
    #[serde(rename = "morph_close")]
    pub morph_close_size: u32,
    /// Sharpness blend factor; 1.0 is identity and 0 yields the smoothed image.
    #[serde(rename = "sharpness")]
    pub sharpness_factor: f32,
    /// Skip boundary detection and process the full frame.
    pub skip_crop: bool,
}

impl EnhancementParameters {
    /// The tuned production configuration.
    pub const fn optimal() -> Self {
        Self {
            median_blur_size: 1,
            bilateral_diameter: 14,
            bilateral_sigma: 100,
            contrast_clip_limit: 0.0,
            contrast_grid_size: 4,
            adaptive_block_size: 17,
            adaptive_offset: 2,
            gaussian_blur_size: 6,
            morph_open_size: 0,
            morph_close_size: 0,
            sharpness_factor: 0.0,
            skip_crop: false,
        }
    }

    /// Bump even kernel sizes to the next odd value.
    ///
    /// `gaussian_blur_size` stays at zero when disabled.
    pub fn normalized(mut self) -> Self {
        if self.median_blur_size % 2 == 0 {
            self.median_blur_size += 1;
        }
        if self.gaussian_blur_size > 0 && self.gaussian_blur_size % 2 == 0 {
            self.gaussian_blur_size += 1;
        }
        if self.adaptive_block_size % 2 == 0 {
            self.adaptive_block_size += 1;
        }
        self
    }

    /// Reject combinations that would produce a non-positive or oversized
    /// kernel, or a meaningless float. Expects already-normalized values.
    pub fn validate(&self) -> Result<()> {
        let kernels = [
            ("median_blur", self.median_blur_size, MAX_KERNEL_SIZE),
            ("bilateral_d", self.bilateral_diameter, MAX_BILATERAL_DIAMETER),
            ("clahe_grid", self.contrast_grid_size, MAX_GRID_SIZE),
            ("adaptive_block", self.adaptive_block_size, MAX_KERNEL_SIZE),
            ("gaussian_blur", self.gaussian_blur_size, MAX_KERNEL_SIZE),
            ("morph_open", self.morph_open_size, MAX_KERNEL_SIZE),
            ("morph_close", self.morph_close_size, MAX_KERNEL_SIZE),
        ];
        for (name, value, max) in kernels {
            if value > max {
                return Err(ScanError::invalid(
                    name,
                    format!("must be at most {max}, got {value}"),
                ));
            }
        }
        if self.median_blur_size < 1 {
            return Err(ScanError::invalid("median_blur", "must be at least 1"));
        }
        if self.adaptive_block_size < 3 {
            return Err(ScanError::invalid(
                "adaptive_block",
                format!("must be at least 3, got {}", self.adaptive_block_size),
            ));
        }
        if self.contrast_grid_size < 1 {
            return Err(ScanError::invalid("clahe_grid", "must be at least 1"));
        }
        if !self.contrast_clip_limit.is_finite() || self.contrast_clip_limit < 0.0 {
            return Err(ScanError::invalid(
                "clahe_clip",
                format!("must be a finite value >= 0, got {}", self.contrast_clip_limit),
            ));
        }
        if !self.sharpness_factor.is_finite() {
            return Err(ScanError::invalid("sharpness", "must be finite"));
        }
        Ok(())
    }

    /// Normalize then validate; the form every pipeline stage consumes.
    pub fn prepare(self) -> Result<Self> {
        let params = self.normalized();
        params.validate()?;
        Ok(params)
    }

    /// Apply a single textual override, as received from a form field.
    ///
    /// Returns `Ok(false)` for keys that are not parameters so callers can
    /// route them elsewhere.
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<bool> {
        let value = value.trim();
        match key {
            "median_blur" => self.median_blur_size = parse_field("median_blur", value)?,
            "bilateral_d" => self.bilateral_diameter = parse_field("bilateral_d", value)?,
            "bilateral_sigma" => self.bilateral_sigma = parse_field("bilateral_sigma", value)?,
            "clahe_clip" => self.contrast_clip_limit = parse_field("clahe_clip", value)?,
            "clahe_grid" => self.contrast_grid_size = parse_field("clahe_grid", value)?,
            "adaptive_block" => self.adaptive_block_size = parse_field("adaptive_block", value)?,
            "adaptive_c" => self.adaptive_offset = parse_field("adaptive_c", value)?,
            "gaussian_blur" => self.gaussian_blur_size = parse_field("gaussian_blur", value)?,
            "morph_open" => self.morph_open_size = parse_field("morph_open", value)?,
            "morph_close" => self.morph_close_size = parse_field("morph_close", value)?,
            "sharpness" => self.sharpness_factor = parse_field("sharpness", value)?,
            "skip_crop" => self.skip_crop = parse_flag(value),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Start from `self` and apply every recognised `(key, value)` pair.
    pub fn with_overrides<K, V>(
        mut self,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in fields {
            self.apply_override(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }
}

impl Default for EnhancementParameters {
    fn default() -> Self {
        Self::optimal()
    }
}

/// Parse a boolean form flag; only a case-insensitive `true` enables it.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_field<T>(name: &'static str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|err| ScanError::invalid(name, format!("cannot parse {value:?}: {err}")))
}

/// Which enhancement path a caller wants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnhancementRequest {
    /// Tuned defaults followed by the final speckle cleanup pass.
    Optimal { skip_crop: bool },
    /// Caller-supplied parameters, no final cleanup.
    Custom(EnhancementParameters),
}

impl EnhancementRequest {
    /// The parameters this request runs with, before normalization.
    pub fn parameters(&self) -> EnhancementParameters {
        match *self {
            Self::Optimal { skip_crop } => EnhancementParameters {
                skip_crop,
                ..EnhancementParameters::optimal()
            },
            Self::Custom(params) => params,
        }
    }

    /// Whether the final cleanup pass runs after the chain.
    pub fn applies_final_cleanup(&self) -> bool {
        matches!(self, Self::Optimal { .. })
    }
}

impl Default for EnhancementRequest {
    fn default() -> Self {
        Self::Optimal { skip_crop: false }
    }
}

/// Settings for the HTTP service and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
    /// Run the boundary detectors concurrently.
    pub parallel_detection: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            max_upload_bytes: 20 * 1024 * 1024,
            parallel_detection: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimal_values() {
        let params = EnhancementParameters::default();
        assert_eq!(params, EnhancementParameters::optimal());
        assert_eq!(params.bilateral_diameter, 14);
        assert_eq!(params.bilateral_sigma, 100);
        assert_eq!(params.adaptive_block_size, 17);
        assert_eq!(params.adaptive_offset, 2);
        assert!(!params.skip_crop);
    }

    #[test]
    fn even_sizes_become_odd() {
        let params = EnhancementParameters {
            median_blur_size: 4,
            adaptive_block_size: 16,
            gaussian_blur_size: 6,
            ..EnhancementParameters::optimal()
        }
        .normalized();
        assert_eq!(params.median_blur_size, 5);
        assert_eq!(params.adaptive_block_size, 17);
        assert_eq!(params.gaussian_blur_size, 7);
    }

    #[test]
    fn disabled_gaussian_stays_zero() {
        let params = EnhancementParameters {
            gaussian_blur_size: 0,
            median_blur_size: 0,
            ..EnhancementParameters::optimal()
        }
        .normalized();
        assert_eq!(params.gaussian_blur_size, 0);
        assert_eq!(params.median_blur_size, 1);
    }

    #[test]
    fn tiny_adaptive_block_is_rejected() {
        let err = EnhancementParameters {
            adaptive_block_size: 0,
            ..EnhancementParameters::optimal()
        }
        .prepare()
        .unwrap_err();
        assert!(matches!(
            err,
            ScanError::InvalidParameter {
                name: "adaptive_block",
                ..
            }
        ));
    }

    #[test]
    fn zero_grid_is_rejected() {
        let err = EnhancementParameters {
            contrast_grid_size: 0,
            ..EnhancementParameters::optimal()
        }
        .prepare()
        .unwrap_err();
        assert!(matches!(err, ScanError::InvalidParameter { name: "clahe_grid", .. }));
    }

    #[test]
    fn oversized_kernels_are_rejected() {
        let with = |edit: fn(&mut EnhancementParameters)| {
            let mut params = EnhancementParameters::optimal();
            edit(&mut params);
            params
        };
        let cases = [
            ("median_blur", with(|p| p.median_blur_size = 4_000_000_001)),
            ("bilateral_d", with(|p| p.bilateral_diameter = 8000)),
            ("clahe_grid", with(|p| p.contrast_grid_size = u32::MAX)),
            ("adaptive_block", with(|p| p.adaptive_block_size = 101)),
            ("gaussian_blur", with(|p| p.gaussian_blur_size = 4_000_000_001)),
            ("morph_open", with(|p| p.morph_open_size = 4_000_000_000)),
            ("morph_close", with(|p| p.morph_close_size = 100)),
        ];
        for (field, params) in cases {
            match params.prepare() {
                Err(ScanError::InvalidParameter { name, .. }) => assert_eq!(name, field),
                other => panic!("{field}: expected InvalidParameter, got {other:?}"),
            }
        }
    }

    #[test]
    fn kernels_at_the_cap_are_accepted() {
        let params = EnhancementParameters {
            median_blur_size: MAX_KERNEL_SIZE,
            bilateral_diameter: MAX_BILATERAL_DIAMETER,
            contrast_grid_size: MAX_GRID_SIZE,
            adaptive_block_size: MAX_KERNEL_SIZE,
            gaussian_blur_size: MAX_KERNEL_SIZE,
            morph_open_size: MAX_KERNEL_SIZE,
            morph_close_size: MAX_KERNEL_SIZE,
            ..EnhancementParameters::optimal()
        };
        assert_eq!(params.prepare().unwrap(), params);
    }

    #[test]
    fn negative_clip_is_rejected() {
        let params = EnhancementParameters {
            contrast_clip_limit: -1.0,
            ..EnhancementParameters::optimal()
        };
        assert!(params.prepare().is_err());
    }

    #[test]
    fn overrides_parse_form_fields() {
        let params = EnhancementParameters::optimal()
            .with_overrides([
                ("median_blur", "3"),
                ("clahe_clip", "2.5"),
                ("adaptive_c", "-4"),
                ("skip_crop", "TRUE"),
                ("response_format", "base64"),
            ])
            .unwrap();
        assert_eq!(params.median_blur_size, 3);
        assert!((params.contrast_clip_limit - 2.5).abs() < f32::EPSILON);
        assert_eq!(params.adaptive_offset, -4);
        assert!(params.skip_crop);
    }

    #[test]
    fn malformed_override_is_invalid_parameter() {
        let err = EnhancementParameters::optimal()
            .with_overrides([("bilateral_d", "-3")])
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidParameter { name: "bilateral_d", .. }));
    }

    #[test]
    fn json_uses_form_field_names() {
        let json = serde_json::to_value(EnhancementParameters::optimal()).unwrap();
        assert_eq!(json["median_blur"], 1);
        assert_eq!(json["bilateral_d"], 14);
        assert_eq!(json["adaptive_block"], 17);
        assert_eq!(json["skip_crop"], false);

        let partial: EnhancementParameters =
            serde_json::from_str(r#"{"median_blur": 4}"#).unwrap();
        assert_eq!(partial.median_blur_size, 4);
        assert_eq!(partial.bilateral_diameter, 14);
    }

    #[test]
    fn request_parameters() {
        let optimal = EnhancementRequest::Optimal { skip_crop: true };
        assert!(optimal.parameters().skip_crop);
        assert!(optimal.applies_final_cleanup());

        let custom = EnhancementRequest::Custom(EnhancementParameters::optimal());
        assert!(!custom.applies_final_cleanup());
        assert_eq!(EnhancementRequest::default(), EnhancementRequest::Optimal { skip_crop: false });
    }

    #[test]
    fn service_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 8000);
        assert!(config.parallel_detection);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    }
}
