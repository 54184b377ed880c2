//! Combine several PDFs (e.g. a signed certificate plus its enclosures)
//! into one document.

use crate::error::EsignError;
use lopdf::{Document, Object, ObjectId};

/// Page attributes a page may take from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Merge multiple PDFs into one, keeping page order.
///
/// The first document is the base. Later documents are renumbered past the
/// base's highest object id and copied in. The base page tree is then
/// flattened so its root lists every page directly.
pub fn merge_pdfs(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, EsignError> {
    if documents.len() < 2 {
        return documents
            .into_iter()
            .next()
            .ok_or_else(|| EsignError::OperationError("No documents to merge".into()));
    }

    let mut merged = load(0, &documents[0])?;
    let mut pages: Vec<ObjectId> = merged.get_pages().into_values().collect();

    for (index, bytes) in documents.iter().enumerate().skip(1) {
        let mut source = load(index, bytes)?;
        source.renumber_objects_with(merged.max_id + 1);
        pages.extend(source.get_pages().into_values());

        merged.max_id = merged.max_id.max(source.max_id);
        merged.objects.extend(source.objects);
    }

    flatten_page_tree(&mut merged, &pages)?;
    merged.compress();

    let mut buffer = Vec::new();
    merged
        .save_to(&mut buffer)
        .map_err(|e| EsignError::OperationError(format!("Failed to save merged PDF: {}", e)))?;
    Ok(buffer)
}

fn load(index: usize, bytes: &[u8]) -> Result<Document, EsignError> {
    Document::load_mem(bytes)
        .map_err(|e| EsignError::ParseError(format!("Failed to load document {}: {}", index, e)))
}

/// Inheritable attributes the page does not set itself, taken from the
/// nearest ancestor that does
fn missing_inherited(doc: &Document, page_id: ObjectId) -> Vec<(&'static [u8], Object)> {
    let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
        return Vec::new();
    };
    let mut wanted: Vec<&'static [u8]> = INHERITABLE_KEYS
        .into_iter()
        .filter(|key| !page.has(key))
        .collect();
    let mut found = Vec::new();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        if wanted.is_empty() || depth > 32 {
            break;
        }
        let Ok(node) = doc.get_object(node_id).and_then(Object::as_dict) else {
            break;
        };
        wanted.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((*key, value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    found
}

/// Make the base root Pages node the direct parent of every page. Pages
/// carry their inherited attributes along since their old ancestors drop
/// out of the tree.
fn flatten_page_tree(doc: &mut Document, pages: &[ObjectId]) -> Result<(), EsignError> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|catalog_id| doc.get_object(catalog_id))
        .and_then(Object::as_dict)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| EsignError::OperationError("Catalog has no Pages".into()))?;

    for &page_id in pages {
        let inherited = missing_inherited(doc, page_id);
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for (key, value) in inherited {
                page.set(key, value);
            }
            page.set("Parent", Object::Reference(root_id));
        }
    }

    let root = doc
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| EsignError::OperationError("Invalid Pages dictionary".into()))?;
    root.set(
        "Kids",
        pages.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
    );
    root.set("Count", pages.len() as i64);

    Ok(())
}
