//! Signature image decoding into PDF image XObjects
//!
//! PNG is decoded to 8-bit samples and re-encoded with FlateDecode, with any
//! alpha channel split out into a soft mask. JPEG is embedded as-is with
//! DCTDecode; only its frame header is read for dimensions.

use crate::error::EsignError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::{write::ZlibEncoder, Compression};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// Sniff the image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(&JPEG_MAGIC) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Decode a `data:image/...;base64,` URL, or bare base64, into raw bytes
pub fn decode_data_url(input: &str) -> Result<Vec<u8>, EsignError> {
    let payload = match input.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        Some(_) => {
            return Err(EsignError::ImageError(
                "Malformed data URL prefix".into(),
            ))
        }
        None => input,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| EsignError::ImageError(format!("Invalid base64 image data: {}", e)))
}

/// A decoded image ready to be inserted into a document
#[derive(Debug, Clone)]
pub struct PdfImage {
    pub width: u32,
    pub height: u32,
    stream: Stream,
    soft_mask: Option<Stream>,
}

impl PdfImage {
    /// Decode PNG or JPEG bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, EsignError> {
        match detect_format(bytes) {
            Some(ImageFormat::Png) => decode_png(bytes),
            Some(ImageFormat::Jpeg) => decode_jpeg(bytes),
            None => Err(EsignError::ImageError(
                "Expected PNG or JPEG image data".into(),
            )),
        }
    }

    pub fn has_alpha(&self) -> bool {
        self.soft_mask.is_some()
    }

    /// Add the image (and its soft mask) to the document, returning the XObject id
    pub fn insert_into(self, doc: &mut Document) -> ObjectId {
        let mut stream = self.stream;
        if let Some(mask) = self.soft_mask {
            let mask_id = doc.add_object(mask);
            stream.dict.set("SMask", Object::Reference(mask_id));
        }
        doc.add_object(stream)
    }
}

fn decode_png(bytes: &[u8]) -> Result<PdfImage, EsignError> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .map_err(|e| EsignError::ImageError(format!("PNG header: {}", e)))?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| EsignError::ImageError(format!("PNG data: {}", e)))?;
    let pixels = &buf[..info.buffer_size()];

    let (channels, color_space, has_alpha) = match info.color_type {
        png::ColorType::Grayscale => (1, "DeviceGray", false),
        png::ColorType::GrayscaleAlpha => (2, "DeviceGray", true),
        png::ColorType::Rgb => (3, "DeviceRGB", false),
        png::ColorType::Rgba => (4, "DeviceRGB", true),
        png::ColorType::Indexed => {
            return Err(EsignError::ImageError(
                "Indexed PNG was not expanded".into(),
            ))
        }
    };

    let color_channels = if has_alpha { channels - 1 } else { channels };
    let pixel_count = (info.width * info.height) as usize;
    let mut color = Vec::with_capacity(pixel_count * color_channels);
    let mut alpha = Vec::with_capacity(if has_alpha { pixel_count } else { 0 });

    for px in pixels.chunks_exact(channels) {
        color.extend_from_slice(&px[..color_channels]);
        if has_alpha {
            alpha.push(px[color_channels]);
        }
    }

    let stream = flate_image_stream(info.width, info.height, color_space, &color)?;
    // Fully opaque masks add nothing
    let soft_mask = if has_alpha && alpha.iter().any(|&a| a != 0xFF) {
        Some(flate_image_stream(
            info.width,
            info.height,
            "DeviceGray",
            &alpha,
        )?)
    } else {
        None
    };

    Ok(PdfImage {
        width: info.width,
        height: info.height,
        stream,
        soft_mask,
    })
}

fn flate_image_stream(
    width: u32,
    height: u32,
    color_space: &str,
    samples: &[u8],
) -> Result<Stream, EsignError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(samples)
        .and_then(|_| encoder.finish())
        .map(|compressed| {
            let dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => Object::Name(color_space.as_bytes().to_vec()),
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            };
            Stream::new(dict, compressed).with_compression(false)
        })
        .map_err(|e| EsignError::ImageError(format!("Failed to compress image: {}", e)))
}

/// Frame dimensions and component count from the first SOF marker
fn jpeg_frame_header(bytes: &[u8]) -> Option<(u32, u32, u8)> {
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        // Fill bytes
        if marker == 0xFF {
            i += 1;
            continue;
        }
        let segment_len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let frame = bytes.get(i + 4..i + 10)?;
            let height = u16::from_be_bytes([frame[1], frame[2]]) as u32;
            let width = u16::from_be_bytes([frame[3], frame[4]]) as u32;
            return Some((width, height, frame[5]));
        }
        i += 2 + segment_len;
    }
    None
}

fn decode_jpeg(bytes: &[u8]) -> Result<PdfImage, EsignError> {
    let (width, height, components) = jpeg_frame_header(bytes)
        .ok_or_else(|| EsignError::ImageError("JPEG frame header not found".into()))?;

    let color_space = match components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        n => {
            return Err(EsignError::ImageError(format!(
                "Unsupported JPEG component count: {}",
                n
            )))
        }
    };
    if width == 0 || height == 0 {
        return Err(EsignError::ImageError("JPEG has zero dimensions".into()));
    }

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => Object::Name(color_space.as_bytes().to_vec()),
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };

    Ok(PdfImage {
        width,
        height,
        stream: Stream::new(dict, bytes.to_vec()).with_compression(false),
        soft_mask: None,
    })
}
