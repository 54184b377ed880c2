//! Loaded PDF wrapper with page lookup helpers

use crate::error::EsignError;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Fallback page size when no MediaBox is found anywhere in the page tree
pub const LETTER_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Wrapper around `lopdf::Document` with 1-indexed page access
pub struct PdfDocument {
    doc: Document,
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EsignError> {
        let doc = Document::load_mem(bytes).map_err(|e| EsignError::ParseError(e.to_string()))?;
        Ok(Self { doc })
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get page object ID for a given page number (1-indexed)
    pub fn page_id(&self, page_num: u32) -> Option<ObjectId> {
        self.doc.get_pages().get(&page_num).copied()
    }

    /// Resolve a page number, failing with `InvalidPage` when out of range
    pub fn require_page(&self, page_num: u32) -> Result<ObjectId, EsignError> {
        self.page_id(page_num).ok_or(EsignError::InvalidPage {
            page: page_num,
            page_count: self.page_count(),
        })
    }

    /// Get page dimensions (MediaBox) as [x, y, width, height]
    ///
    /// MediaBox is inheritable, so the Parent chain is walked before falling
    /// back to US Letter.
    pub fn page_dimensions(&self, page_num: u32) -> Result<[f64; 4], EsignError> {
        let mut current = Some(self.require_page(page_num)?);
        let mut depth = 0;

        while let Some(id) = current {
            // Malformed trees can loop through Parent
            if depth > 32 {
                break;
            }
            let dict = self.dictionary(id)?;
            if let Ok(media_box) = dict.get(b"MediaBox") {
                return self.parse_rect(media_box);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }

        Ok(LETTER_MEDIA_BOX)
    }

    /// Serialize the document
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, EsignError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| EsignError::OperationError(format!("Failed to save PDF: {}", e)))?;
        Ok(buffer)
    }

    fn dictionary(&self, id: ObjectId) -> Result<&Dictionary, EsignError> {
        self.doc
            .get_object(id)?
            .as_dict()
            .map_err(|_| EsignError::OperationError(format!("Object {:?} is not a dictionary", id)))
    }

    /// Parse a PDF rectangle array into [x, y, width, height]
    fn parse_rect(&self, obj: &Object) -> Result<[f64; 4], EsignError> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self.doc.get_object(*id)?.as_array().map_err(|_| {
                EsignError::OperationError("MediaBox reference is not an array".into())
            })?,
            _ => {
                return Err(EsignError::OperationError(
                    "MediaBox is not an array".into(),
                ))
            }
        };

        if arr.len() != 4 {
            return Err(EsignError::OperationError(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (i, obj) in arr.iter().enumerate() {
            values[i] = self.extract_number(obj)?;
        }

        Ok([
            values[0],
            values[1],
            values[2] - values[0],
            values[3] - values[1],
        ])
    }

    fn extract_number(&self, obj: &Object) -> Result<f64, EsignError> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r as f64),
            Object::Reference(id) => self.extract_number(self.doc.get_object(*id)?),
            _ => Err(EsignError::OperationError(
                "Expected a number in MediaBox".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_pdf, blank_pdf_with_inherited_media_box};

    #[test]
    fn test_page_count_and_lookup() {
        let doc = PdfDocument::from_bytes(&blank_pdf(3)).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert!(doc.page_id(1).is_some());
        assert!(doc.page_id(3).is_some());
        assert!(doc.page_id(0).is_none());
        assert!(doc.page_id(4).is_none());
    }

    #[test]
    fn test_require_page_reports_count() {
        let doc = PdfDocument::from_bytes(&blank_pdf(2)).unwrap();
        match doc.require_page(5) {
            Err(EsignError::InvalidPage { page, page_count }) => {
                assert_eq!(page, 5);
                assert_eq!(page_count, 2);
            }
            other => panic!("expected InvalidPage, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_page_dimensions_direct() {
        let doc = PdfDocument::from_bytes(&blank_pdf(1)).unwrap();
        assert_eq!(doc.page_dimensions(1).unwrap(), [0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn test_page_dimensions_inherited_from_parent() {
        let doc = PdfDocument::from_bytes(&blank_pdf_with_inherited_media_box()).unwrap();
        assert_eq!(doc.page_dimensions(1).unwrap(), [0.0, 0.0, 595.0, 842.0]);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let result = PdfDocument::from_bytes(b"not a pdf at all");
        assert!(matches!(result, Err(EsignError::ParseError(_))));
    }
}
