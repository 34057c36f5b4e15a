// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart upload parsing and its translation into pipeline requests.

use axum::extract::Multipart;
use invoicescan_core::config::parse_flag;
use invoicescan_core::error::Result;
use invoicescan_core::{EnhancementParameters, EnhancementRequest, ResponseFormat};
use tracing::debug;

use crate::response::ApiError;

/// Form field carrying the photo.
pub const IMAGE_FIELD: &str = "image";
const FORMAT_FIELD: &str = "response_format";
const SKIP_CROP_FIELD: &str = "skip_crop";

/// Everything a client sent in one multipart body.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub image: Option<Vec<u8>>,
    pub format: ResponseFormat,
    /// Remaining text fields in arrival order.
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    /// Drain a multipart stream. Unnamed fields are ignored.
    pub async fn read(mut multipart: Multipart) -> std::result::Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == IMAGE_FIELD {
                let bytes = field.bytes().await.map_err(ApiError::multipart)?;
                debug!(len = bytes.len(), "Image field received");
                form.image = Some(bytes.to_vec());
            } else {
                let value = field.text().await.map_err(ApiError::multipart)?;
                form.push_text(name, value);
            }
        }
        Ok(form)
    }

    /// Record a text field, routing `response_format` to [`format`](Self::format).
    pub fn push_text(&mut self, name: String, value: String) {
        if name == FORMAT_FIELD {
            self.format = ResponseFormat::parse(&value);
        } else {
            self.fields.push((name, value));
        }
    }

    /// The photo bytes, or the "no image provided" error.
    pub fn take_image(&mut self) -> std::result::Result<Vec<u8>, ApiError> {
        match self.image.take() {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(ApiError::MissingImage),
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Request for the tuned path; only `skip_crop` is honoured.
    pub fn optimal_request(&self) -> EnhancementRequest {
        EnhancementRequest::Optimal {
            skip_crop: self.field(SKIP_CROP_FIELD).is_some_and(parse_flag),
        }
    }

    /// Request for the parametric path: optimal values overridden by every
    /// recognised field. Unknown fields are ignored.
    pub fn custom_request(&self) -> Result<EnhancementRequest> {
        let params = EnhancementParameters::optimal().with_overrides(
            self.fields
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        )?;
        Ok(EnhancementRequest::Custom(params))
    }
}
