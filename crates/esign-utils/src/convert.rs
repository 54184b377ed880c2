//! Convert uploaded scans (PNG/JPEG) into a PDF, one image per page

use crate::error::EsignError;
use crate::image::PdfImage;
use crate::page::draw_image_ops;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};

/// Margin kept around each image, in points
const PAGE_MARGIN: f64 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Width and height in points
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

/// Largest box with the image's aspect ratio that fits inside the margins,
/// centred on the page. Returns lower-left x, y and size.
fn fit_centered(img_w: f64, img_h: f64, page: (f64, f64)) -> (f64, f64, f64, f64) {
    let avail_w = page.0 - 2.0 * PAGE_MARGIN;
    let avail_h = page.1 - 2.0 * PAGE_MARGIN;
    let scale = (avail_w / img_w).min(avail_h / img_h);
    let (w, h) = (img_w * scale, img_h * scale);
    ((page.0 - w) / 2.0, (page.1 - h) / 2.0, w, h)
}

pub fn images_to_pdf(images: &[Vec<u8>], page_size: PageSize) -> Result<Vec<u8>, EsignError> {
    if images.is_empty() {
        return Err(EsignError::OperationError("No images to convert".into()));
    }

    let (page_w, page_h) = page_size.dimensions();
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(images.len());

    for (i, bytes) in images.iter().enumerate() {
        let image = PdfImage::decode(bytes)
            .map_err(|e| EsignError::ImageError(format!("image {}: {}", i, e)))?;
        let (x, y, w, h) = fit_centered(image.width as f64, image.height as f64, (page_w, page_h));
        let image_id = image.insert_into(&mut doc);

        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            draw_image_ops("Im0", x, y, w, h),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => Object::Array(vec![
                0.into(),
                0.into(),
                Object::Real(page_w as f32),
                Object::Real(page_h as f32),
            ]),
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| EsignError::OperationError(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}
