//! PDF e-sign utilities for e-Sevai output documents
//!
//! The main entry point is [`sign_pdf`], which stamps one or more signature
//! images onto chosen pages of an existing PDF and adds a "digitally signed"
//! timestamp to the final page. Supporting helpers cover merging, compressing
//! and converting scanned images into PDFs.
//!
//! All manipulation goes through lopdf; images are decoded with `png` and
//! re-encoded with `flate2`.

pub mod convert;
pub mod coords;
pub mod document;
pub mod error;
pub mod image;
pub mod merge;
pub mod page;
pub mod placement;
pub mod signer;

pub use convert::{images_to_pdf, PageSize};
pub use coords::{dom_to_pdf, pdf_to_dom, top_left_to_pdf};
pub use document::PdfDocument;
pub use error::EsignError;
pub use image::{decode_data_url, detect_format, ImageFormat, PdfImage};
pub use merge::merge_pdfs;
pub use placement::{PdfRect, SignaturePlacement, Viewport};
pub use signer::{sign_pdf, SignOptions};

/// Parse PDF bytes and return page count
pub fn page_count(bytes: &[u8]) -> Result<u32, EsignError> {
    Ok(PdfDocument::from_bytes(bytes)?.page_count())
}

/// Drop unreferenced objects and empty streams, then Flate-compress the rest
pub fn compress_pdf(bytes: &[u8]) -> Result<Vec<u8>, EsignError> {
    let mut doc =
        lopdf::Document::load_mem(bytes).map_err(|e| EsignError::ParseError(e.to_string()))?;
    doc.prune_objects();
    doc.delete_zero_length_streams();
    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| EsignError::OperationError(e.to_string()))?;
    Ok(output)
}
