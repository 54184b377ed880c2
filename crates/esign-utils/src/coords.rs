//! Coordinate translation between overlay (top-left origin) and PDF
//! user space (bottom-left origin).
//!
//! Media boxes are passed as `[x, y, width, height]`, the shape returned by
//! [`crate::PdfDocument::page_dimensions`].

/// Convert DOM coordinates (top-left origin, pixels) to PDF coordinates (bottom-left origin, points)
pub fn dom_to_pdf(
    dom_x: f64,
    dom_y: f64,
    container_width: f64,
    container_height: f64,
    media_box: [f64; 4],
) -> (f64, f64) {
    let [mb_x, mb_y, mb_width, mb_height] = media_box;

    let x_pct = dom_x / container_width;
    let y_pct = dom_y / container_height;

    (mb_x + x_pct * mb_width, mb_y + (mb_height - y_pct * mb_height))
}

/// Convert PDF coordinates to DOM coordinates
pub fn pdf_to_dom(
    pdf_x: f64,
    pdf_y: f64,
    container_width: f64,
    container_height: f64,
    media_box: [f64; 4],
) -> (f64, f64) {
    let [mb_x, mb_y, mb_width, mb_height] = media_box;

    let x_pct = (pdf_x - mb_x) / mb_width;
    let y_pct = 1.0 - ((pdf_y - mb_y) / mb_height);

    (x_pct * container_width, y_pct * container_height)
}

/// Scale a DOM length (pixels) to PDF points along one axis.
pub fn dom_length_to_pdf(length: f64, container_extent: f64, page_extent: f64) -> f64 {
    length / container_extent * page_extent
}

/// Translate the top-left corner of a box given in top-left-origin points
/// into the PDF-space lower-left corner the box must be drawn at.
///
/// `y` measures down from the top edge of the media box, so the drawn
/// origin sits `height` below it.
pub fn top_left_to_pdf(x: f64, y: f64, height: f64, media_box: [f64; 4]) -> (f64, f64) {
    let [mb_x, mb_y, _, mb_height] = media_box;
    (mb_x + x, mb_y + mb_height - y - height)
}
