// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Response bodies: raw PNG, base64 JSON envelope, and JSON errors.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use invoicescan_core::human_errors::{Severity, humanize_error};
use invoicescan_core::{EnhancementParameters, ResponseFormat, ScanError};
use invoicescan_imaging::NormalizedInvoice;
use serde::Serialize;
use tracing::warn;

const PNG_DISPOSITION: &str = "inline; filename=\"processed_invoice.png\"";

/// JSON envelope for `response_format=base64`.
#[derive(Debug, Serialize)]
pub struct Base64Envelope {
    pub success: bool,
    /// `data:image/png;base64,...`
    pub image: String,
    pub original_size: String,
    pub processed_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<EnhancementParameters>,
}

impl Base64Envelope {
    pub fn new(output: &NormalizedInvoice, echo_params: bool) -> Self {
        Self {
            success: true,
            image: format!("data:image/png;base64,{}", STANDARD.encode(&output.png)),
            original_size: output.original.to_string(),
            processed_size: output.processed.to_string(),
            params: echo_params.then_some(output.params),
        }
    }
}

/// Turn a pipeline result into the response the client asked for.
pub fn render(output: &NormalizedInvoice, format: ResponseFormat, echo_params: bool) -> Response {
    match format {
        ResponseFormat::Binary => png_response(output.png.clone()),
        ResponseFormat::Base64 => Json(Base64Envelope::new(output, echo_params)).into_response(),
    }
}

/// `200 image/png`, shown inline, never content-sniffed.
pub fn png_response(png: Vec<u8>) -> Response {
    let mut response = (StatusCode::OK, png).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(PNG_DISPOSITION),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    /// Plain-language summary for people, alongside the technical `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

/// Every way a request can fail.
#[derive(Debug)]
pub enum ApiError {
    /// No `image` field, or an empty one.
    MissingImage,
    /// The multipart body itself was malformed or too large.
    Multipart { status: StatusCode, detail: String },
    Scan(ScanError),
}

impl ApiError {
    pub fn multipart(err: MultipartError) -> Self {
        Self::Multipart {
            status: err.status(),
            detail: err.body_text(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingImage => StatusCode::BAD_REQUEST,
            Self::Multipart { status, .. } => *status,
            Self::Scan(err) => match humanize_error(err).severity {
                Severity::ClientFault => StatusCode::BAD_REQUEST,
                Severity::ServerFault => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        Self::Scan(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::MissingImage => ErrorBody {
                error: "no image provided".into(),
                message: None,
                suggestion: None,
            },
            Self::Multipart { detail, .. } => ErrorBody {
                error: detail.clone(),
                message: None,
                suggestion: None,
            },
            Self::Scan(err) => {
                let human = humanize_error(err);
                ErrorBody {
                    error: err.to_string(),
                    message: Some(human.message),
                    suggestion: Some(human.suggestion),
                }
            }
        };
        warn!(status = status.as_u16(), error = %body.error, "Request failed");
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use invoicescan_core::ImageSize;

    fn output() -> NormalizedInvoice {
        NormalizedInvoice {
            png: vec![0x89, b'P', b'N', b'G'],
            original: ImageSize::new(1000, 1400),
            processed: ImageSize::new(820, 1150),
            params: EnhancementParameters::optimal().normalized(),
            boundary: None,
        }
    }

    async fn json_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn binary_response_headers() {
        let response = render(&output(), ResponseFormat::Binary, false);
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "inline; filename=\"processed_invoice.png\""
        );
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn base64_envelope_without_params() {
        let json = json_of(render(&output(), ResponseFormat::Base64, false)).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["image"], "data:image/png;base64,iVBORw==");
        assert_eq!(json["original_size"], "1000x1400");
        assert_eq!(json["processed_size"], "820x1150");
        assert!(json.get("params").is_none());
    }

    #[tokio::test]
    async fn base64_envelope_echoes_effective_params() {
        let json = json_of(render(&output(), ResponseFormat::Base64, true)).await;
        assert_eq!(json["params"]["gaussian_blur"], 7);
        assert_eq!(json["params"]["bilateral_d"], 14);
        assert_eq!(json["params"]["skip_crop"], false);
    }

    #[tokio::test]
    async fn missing_image_is_bad_request() {
        let response = ApiError::MissingImage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await["error"], "no image provided");
    }

    #[tokio::test]
    async fn scan_error_body_carries_human_text() {
        let err = ScanError::invalid("bilateral_d", "must be at most 25, got 8000");
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_of(response).await;
        assert_eq!(
            json["error"],
            "invalid parameter `bilateral_d`: must be at most 25, got 8000"
        );
        assert_eq!(json["message"], "The setting `bilateral_d` isn't valid.");
        assert!(json["suggestion"].as_str().unwrap().contains("at most 25"));
    }

    #[tokio::test]
    async fn missing_image_body_has_no_human_text() {
        let json = json_of(ApiError::MissingImage.into_response()).await;
        assert!(json.get("message").is_none());
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn scan_errors_map_by_severity() {
        assert_eq!(
            ApiError::from(ScanError::ImageDecode("garbage".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ScanError::invalid("clahe_grid", "must be at least 1")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ScanError::ImageEncode("disk full".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
