//! Signature placement requests

use crate::coords::{dom_length_to_pdf, dom_to_pdf, top_left_to_pdf};
use crate::error::EsignError;
use serde::{Deserialize, Serialize};

/// Rendered size of the page the placement was picked on, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// One signature image to stamp onto a page.
///
/// `x`/`y` locate the top-left corner of the image measured from the top-left
/// of the page. Without a viewport they are PDF points; with one they are
/// pixels of the rendered page and get scaled to the MediaBox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignaturePlacement {
    /// 1-indexed page number
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    /// Raw PNG or JPEG bytes
    #[serde(skip)]
    pub image: Vec<u8>,
}

/// Placement resolved to PDF user space: lower-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SignaturePlacement {
    pub fn new(page: u32, x: f64, y: f64, width: f64, height: f64, image: Vec<u8>) -> Self {
        Self {
            page,
            x,
            y,
            width,
            height,
            viewport: None,
            image,
        }
    }

    /// Interpret the coordinates as pixels of a page rendered at this size
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Some(Viewport { width, height });
        self
    }

    pub fn validate(&self) -> Result<(), EsignError> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(EsignError::InvalidPlacement(
                "Coordinates must be finite numbers".into(),
            ));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(EsignError::InvalidPlacement(
                "Signature dimensions must be positive".into(),
            ));
        }
        if let Some(vp) = self.viewport {
            if !(vp.width.is_finite() && vp.height.is_finite()) || vp.width <= 0.0 || vp.height <= 0.0 {
                return Err(EsignError::InvalidPlacement(
                    "Viewport dimensions must be positive".into(),
                ));
            }
        }
        if self.image.is_empty() {
            return Err(EsignError::InvalidPlacement(
                "Signature image is empty".into(),
            ));
        }
        Ok(())
    }

    /// Translate into the PDF-space rectangle the image is drawn in
    pub fn resolve(&self, media_box: [f64; 4]) -> PdfRect {
        match self.viewport {
            None => {
                let (x, y) = top_left_to_pdf(self.x, self.y, self.height, media_box);
                PdfRect {
                    x,
                    y,
                    width: self.width,
                    height: self.height,
                }
            }
            Some(vp) => {
                let [_, _, mb_width, mb_height] = media_box;
                let width = dom_length_to_pdf(self.width, vp.width, mb_width);
                let height = dom_length_to_pdf(self.height, vp.height, mb_height);
                // dom_to_pdf yields the top-left corner; drop by the height
                let (x, top) = dom_to_pdf(self.x, self.y, vp.width, vp.height, media_box);
                PdfRect {
                    x,
                    y: top - height,
                    width,
                    height,
                }
            }
        }
    }
}
