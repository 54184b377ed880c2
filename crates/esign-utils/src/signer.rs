//! Signature embedding: stamp images onto pages, then a timestamp line
//! onto the final page.

use crate::document::PdfDocument;
use crate::error::EsignError;
use crate::image::PdfImage;
use crate::page::{
    append_content, draw_image_ops, draw_text_ops, insert_resource, isolate_existing_content,
    register_helvetica, STAMP_FONT,
};
use crate::placement::SignaturePlacement;
use chrono::{DateTime, Utc};
use lopdf::{Object, ObjectId};
use std::collections::HashSet;
use tracing::debug;

/// Controls the "digitally signed" stamp on the final page
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// Draw the timestamp line at all
    pub timestamp: bool,
    /// Appended as "by <name>" when present
    pub signer_name: Option<String>,
    /// Defaults to the current time
    pub signed_at: Option<DateTime<Utc>>,
    pub font_size: f64,
    /// Offset of the text baseline from the bottom-left of the MediaBox
    pub margin: (f64, f64),
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            timestamp: true,
            signer_name: None,
            signed_at: None,
            font_size: 10.0,
            margin: (50.0, 50.0),
        }
    }
}

impl SignOptions {
    pub fn without_timestamp() -> Self {
        Self {
            timestamp: false,
            ..Self::default()
        }
    }

    pub fn stamp_text(&self, now: DateTime<Utc>) -> String {
        let at = self.signed_at.unwrap_or(now);
        let mut text = format!("Digitally signed on {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        if let Some(name) = self.signer_name.as_deref().filter(|n| !n.trim().is_empty()) {
            text.push_str(" by ");
            text.push_str(name.trim());
        }
        text
    }
}

/// Embed each signature image at its placement and stamp the final page.
///
/// Placements are applied in order. A page outside `1..=page_count` fails
/// the whole call with [`EsignError::InvalidPage`] before anything is written.
pub fn sign_pdf(
    pdf_bytes: &[u8],
    placements: &[SignaturePlacement],
    options: &SignOptions,
) -> Result<Vec<u8>, EsignError> {
    if placements.is_empty() && !options.timestamp {
        return Ok(pdf_bytes.to_vec());
    }

    let mut pdf = PdfDocument::from_bytes(pdf_bytes)?;
    let page_count = pdf.page_count();
    if page_count == 0 {
        return Err(EsignError::ParseError("Document has no pages".into()));
    }

    // Validate everything up front so a bad placement leaves no partial edits
    for placement in placements {
        placement.validate()?;
        pdf.require_page(placement.page)?;
    }

    let mut isolated: HashSet<ObjectId> = HashSet::new();

    for (index, placement) in placements.iter().enumerate() {
        let page_id = pdf.require_page(placement.page)?;
        let media_box = pdf.page_dimensions(placement.page)?;
        let rect = placement.resolve(media_box);
        let image = PdfImage::decode(&placement.image)?;

        debug!(
            "Placing signature {} on page {} at ({:.1}, {:.1}) size {:.1}x{:.1}",
            index, placement.page, rect.x, rect.y, rect.width, rect.height
        );

        let doc = pdf.doc_mut();
        if isolated.insert(page_id) {
            isolate_existing_content(doc, page_id)?;
        }

        let image_id = image.insert_into(doc);
        let name = format!("EsvSig{}_{}", image_id.0, image_id.1);
        insert_resource(doc, page_id, "XObject", &name, Object::Reference(image_id))?;
        append_content(
            doc,
            page_id,
            draw_image_ops(&name, rect.x, rect.y, rect.width, rect.height),
        )?;
    }

    if options.timestamp {
        let last_page = page_count;
        let page_id = pdf.require_page(last_page)?;
        let [mb_x, mb_y, _, _] = pdf.page_dimensions(last_page)?;
        let text = options.stamp_text(Utc::now());
        debug!("Stamping page {}: {}", last_page, text);

        let doc = pdf.doc_mut();
        if isolated.insert(page_id) {
            isolate_existing_content(doc, page_id)?;
        }
        register_helvetica(doc, page_id)?;
        append_content(
            doc,
            page_id,
            draw_text_ops(
                STAMP_FONT,
                options.font_size,
                mb_x + options.margin.0,
                mb_y + options.margin.1,
                &text,
            ),
        )?;
    }

    pdf.save_to_bytes()
}
