// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, crop, BT.601 luma conversion, and PNG encoding
// of a single in-memory image using the `image` crate.

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use invoicescan_core::error::ScanError;
use invoicescan_core::{ImageSize, Rectangle};
use tracing::{debug, info, instrument};

/// Wrapper around the raster a pipeline invocation works on.
///
/// Methods that transform the image consume `self` and return a new
/// `ImageProcessor`, enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::from_bytes(&upload)?
///     .crop(Rectangle::new(10, 10, 300, 400))
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, TIFF, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanError> {
        let img = image::load_from_memory(data)
            .map_err(|err| ScanError::ImageDecode(format!("failed to decode image: {}", err)))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Self::checked(img)
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    fn checked(image: DynamicImage) -> Result<Self, ScanError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ScanError::EmptyImage { stage: "decode" });
        }
        Ok(Self { image })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.image.width(), self.image.height())
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Crop a rectangular region from the image.
    ///
    /// The rectangle is clamped to image bounds.
    #[instrument(skip(self), fields(x = rect.x, y = rect.y, width = rect.width, height = rect.height))]
    pub fn crop(self, rect: Rectangle) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = rect.x.min(img_w.saturating_sub(1));
        let safe_y = rect.y.min(img_h.saturating_sub(1));
        let safe_w = rect.width.min(img_w - safe_x);
        let safe_h = rect.height.min(img_h - safe_y);

        info!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h);
        Self { image: cropped }
    }
}

// BT.601 weights in 14-bit fixed point; they sum to 1 << 14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Single-channel copy using the BT.601 luma weights (0.299, 0.587, 0.114),
/// rounded to nearest.
///
/// Gray inputs keep their values (reduced to 8 bits); alpha is ignored.
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
        _ => {
            let rgb = image.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                let weighted = LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32;
                Luma([((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8])
            })
        }
    }
}

/// Encode a single-channel raster as PNG.
pub fn encode_png(gray: &GrayImage) -> Result<Vec<u8>, ScanError> {
    encode_to_format(&DynamicImage::ImageLuma8(gray.clone()), ImageFormat::Png)
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ScanError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ScanError::ImageEncode(format!("{:?} encoding failed: {}", format, err)))?;
    Ok(buffer)
}
