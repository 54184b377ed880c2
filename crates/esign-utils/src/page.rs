//! Low-level page editing: resource registration and content appends

use crate::error::EsignError;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Resource name of the stamp font registered by [`register_helvetica`]
pub const STAMP_FONT: &str = "EsvHelv";

/// Escape special characters for PDF string literals.
///
/// The stamp font uses WinAnsiEncoding, which agrees with Latin-1 from
/// U+00A0 up, so those characters become octal escapes. Anything outside
/// Latin-1 has no glyph and is replaced with `?`.
pub fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            '\n' | '\r' => " ".to_string(),
            _ if c.is_ascii() => c.to_string(),
            '\u{a0}'..='\u{ff}' => format!("\\{:03o}", c as u32),
            _ => "?".to_string(),
        })
        .collect()
}

fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, EsignError> {
    doc.get_object(page_id)?
        .as_dict()
        .map_err(|_| EsignError::OperationError("Page is not a dictionary".into()))
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, EsignError> {
    doc.get_object_mut(page_id)?
        .as_dict_mut()
        .map_err(|_| EsignError::OperationError("Page is not a dictionary".into()))
}

/// Resources are inheritable; copy the nearest ancestor's so a page-level
/// dictionary does not hide fonts the existing content relies on.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = page_dict(doc, page_id)
        .ok()
        .and_then(|d| d.get(b"Parent").and_then(Object::as_reference).ok());
    let mut depth = 0;

    while let Some(id) = current {
        if depth > 32 {
            break;
        }
        let Ok(Object::Dictionary(node)) = doc.get_object(id) else {
            break;
        };
        match node.get(b"Resources") {
            Ok(Object::Dictionary(res)) => return res.clone(),
            Ok(Object::Reference(res_id)) => {
                if let Ok(Object::Dictionary(res)) = doc.get_object(*res_id) {
                    return res.clone();
                }
            }
            _ => {}
        }
        current = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    Dictionary::new()
}

/// Make sure the page owns a Resources entry. Returns the object id when it
/// is indirect, `None` when it lives inline in the page dictionary.
fn ensure_resources(doc: &mut Document, page_id: ObjectId) -> Result<Option<ObjectId>, EsignError> {
    match page_dict(doc, page_id)?.get(b"Resources") {
        Ok(Object::Reference(id)) => return Ok(Some(*id)),
        Ok(Object::Dictionary(_)) => return Ok(None),
        _ => {}
    }
    let inherited = inherited_resources(doc, page_id);
    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(inherited));
    Ok(None)
}

fn resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
    indirect: Option<ObjectId>,
) -> Result<&mut Dictionary, EsignError> {
    let obj = match indirect {
        Some(id) => doc.get_object_mut(id)?,
        None => page_dict_mut(doc, page_id)?.get_mut(b"Resources")?,
    };
    obj.as_dict_mut()
        .map_err(|_| EsignError::OperationError("Resources is not a dictionary".into()))
}

/// Register `value` under `/Resources/<category>/<name>` for the page
pub fn insert_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    value: Object,
) -> Result<(), EsignError> {
    let indirect = ensure_resources(doc, page_id)?;

    let category_ref = resources_mut(doc, page_id, indirect)?
        .get(category.as_bytes())
        .and_then(Object::as_reference)
        .ok();

    if let Some(id) = category_ref {
        doc.get_object_mut(id)?
            .as_dict_mut()
            .map_err(|_| EsignError::OperationError(format!("{} is not a dictionary", category)))?
            .set(name, value);
        return Ok(());
    }

    let resources = resources_mut(doc, page_id, indirect)?;
    let has_inline = matches!(resources.get(category.as_bytes()), Ok(Object::Dictionary(_)));
    if has_inline {
        if let Ok(Object::Dictionary(entries)) = resources.get_mut(category.as_bytes()) {
            entries.set(name, value);
        }
    } else {
        let mut entries = Dictionary::new();
        entries.set(name, value);
        resources.set(category, Object::Dictionary(entries));
    }
    Ok(())
}

/// Register Helvetica as [`STAMP_FONT`] on the page
pub fn register_helvetica(doc: &mut Document, page_id: ObjectId) -> Result<(), EsignError> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    insert_resource(doc, page_id, "Font", STAMP_FONT, Object::Reference(font_id))
}

fn current_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, EsignError> {
    Ok(match page_dict(doc, page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    })
}

/// Append a content stream to the page, after all existing content
pub fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), EsignError> {
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content));
    let mut contents = current_contents(doc, page_id)?;
    contents.push(Object::Reference(stream_id));
    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Wrap the existing page content in `q ... Q` so whatever graphics state it
/// leaves behind cannot shift content appended afterwards.
pub fn isolate_existing_content(doc: &mut Document, page_id: ObjectId) -> Result<(), EsignError> {
    let mut contents = current_contents(doc, page_id)?;
    if contents.is_empty() {
        return Ok(());
    }
    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    contents.insert(0, Object::Reference(save_id));
    contents.push(Object::Reference(restore_id));
    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Content operators that paint XObject `name` into the given rectangle
pub fn draw_image_ops(name: &str, x: f64, y: f64, width: f64, height: f64) -> Vec<u8> {
    format!(
        "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/{} Do\nQ\n",
        width, height, x, y, name
    )
    .into_bytes()
}

/// Content operators that show a single line of black text
pub fn draw_text_ops(font: &str, size: f64, x: f64, y: f64, text: &str) -> Vec<u8> {
    format!(
        "q\n0 0 0 rg\nBT\n/{} {:.2} Tf\n{:.4} {:.4} Td\n({}) Tj\nET\nQ\n",
        font,
        size,
        x,
        y,
        escape_pdf_string(text)
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_pdf, blank_pdf_with_inherited_media_box};

    fn load(bytes: &[u8]) -> (Document, ObjectId) {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        (doc, page_id)
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_pdf_string("Tamil: தமிழ்"), "Tamil: ?????");
    }

    #[test]
    fn test_escape_latin1_as_octal() {
        assert_eq!(escape_pdf_string("José"), "Jos\\351");
        assert_eq!(escape_pdf_string("Zoë Müller"), "Zo\\353 M\\374ller");
        assert_eq!(escape_pdf_string("\u{a0}"), "\\240");
    }

    #[test]
    fn test_insert_resource_creates_category() {
        let (mut doc, page_id) = load(&blank_pdf(1));
        insert_resource(&mut doc, page_id, "XObject", "Im1", Object::Integer(7)).unwrap();

        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let res = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobj = res.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(xobj.get(b"Im1").unwrap(), &Object::Integer(7));
    }

    #[test]
    fn test_insert_resource_keeps_inherited_fonts() {
        let (mut doc, page_id) = load(&blank_pdf_with_inherited_media_box());
        insert_resource(&mut doc, page_id, "XObject", "Im1", Object::Integer(1)).unwrap();

        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let res = page.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(res.get(b"Font").is_ok(), "inherited Font resources must be copied");
        assert!(res.get(b"XObject").is_ok());
    }

    #[test]
    fn test_append_and_isolate_content() {
        let (mut doc, page_id) = load(&blank_pdf(1));
        isolate_existing_content(&mut doc, page_id).unwrap();
        append_content(&mut doc, page_id, b"% stamp".to_vec()).unwrap();

        let contents = current_contents(&doc, page_id).unwrap();
        // q, original, Q, appended
        assert_eq!(contents.len(), 4);
    }

    #[test]
    fn test_draw_text_ops_escapes() {
        let ops = String::from_utf8(draw_text_ops("F1", 10.0, 50.0, 50.0, "x (y)")).unwrap();
        assert!(ops.contains("(x \\(y\\)) Tj"));
        assert!(ops.contains("/F1 10.00 Tf"));
    }
}
