//! Turning picked files and drawings into uploadable images.

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, ImageFormat, Rgb, RgbaImage};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Drawings are upscaled by this factor before encoding
pub const DRAWING_SCALE: u32 = 2;
pub const DRAWING_FILE_NAME: &str = "drawing.png";
pub const PNG_MIME: &str = "image/png";

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

pub const EMPTY_DRAWING_GUIDANCE: &str =
    "Please draw something before sending! Try drawing with a darker color or thicker strokes.";

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("{file_name} is not an image ({mime_type})")]
    NotAnImage { file_name: String, mime_type: String },

    #[error("{}", EMPTY_DRAWING_GUIDANCE)]
    EmptyDrawing,

    #[error("could not encode drawing: {0}")]
    Encode(#[from] image::ImageError),

    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Image bytes ready for upload, with the MIME type they were declared as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    bytes: Bytes,
    mime_type: String,
    file_name: String,
}

impl Attachment {
    /// Accept a picked file as-is. Only `image/*` types are allowed.
    pub fn from_file(
        bytes: impl Into<Bytes>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Result<Self, AttachmentError> {
        let mime_type = mime_type.into();
        let file_name = file_name.into();
        if !mime_type.starts_with("image/") {
            return Err(AttachmentError::NotAnImage {
                file_name,
                mime_type,
            });
        }
        Ok(Attachment {
            bytes: bytes.into(),
            mime_type,
            file_name,
        })
    }

    /// Read a file from disk, deriving its MIME type from the extension.
    pub fn read(path: &Path) -> Result<Self, AttachmentError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime_type = ImageFormat::from_path(path)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        let bytes = std::fs::read(path).map_err(|source| AttachmentError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_file(bytes, mime_type, file_name)
    }

    pub(crate) fn png(bytes: impl Into<Bytes>) -> Self {
        Attachment {
            bytes: bytes.into(),
            mime_type: PNG_MIME.to_string(),
            file_name: DRAWING_FILE_NAME.to_string(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Rasterize a drawing surface onto white at `DRAWING_SCALE` and encode it as PNG.
///
/// Fails with `EmptyDrawing` when no pixel differs from the background.
pub fn rasterize_drawing(surface: &RgbaImage) -> Result<Bytes, AttachmentError> {
    let (width, height) = surface.dimensions();
    let mut has_content = false;

    let flattened: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        let [r, g, b, a] = surface.get_pixel(x, y).0;
        let pixel = composite([r, g, b], a);
        if a > 0 && pixel != BACKGROUND {
            has_content = true;
        }
        pixel
    });

    if !has_content {
        return Err(AttachmentError::EmptyDrawing);
    }

    let scaled = imageops::resize(
        &flattened,
        width * DRAWING_SCALE,
        height * DRAWING_SCALE,
        FilterType::Nearest,
    );

    let mut png_bytes = Cursor::new(Vec::new());
    scaled.write_to(&mut png_bytes, ImageFormat::Png)?;
    Ok(Bytes::from(png_bytes.into_inner()))
}

fn composite(color: [u8; 3], alpha: u8) -> Rgb<u8> {
    let a = u32::from(alpha);
    let blend = |c: u8, bg: u8| ((u32::from(c) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8;
    Rgb([
        blend(color[0], BACKGROUND.0[0]),
        blend(color[1], BACKGROUND.0[1]),
        blend(color[2], BACKGROUND.0[2]),
    ])
}

/// Locally resolvable reference to attachment bytes, rendered as `preview://N`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle(u64);

impl PreviewHandle {
    #[cfg(test)]
    pub(crate) fn from_raw(id: u64) -> Self {
        PreviewHandle(id)
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview://{}", self.0)
    }
}

/// Owns the bytes behind every live preview handle.
///
/// Handles are never reused. Dropping the registry releases everything.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next_id: u64,
    entries: HashMap<u64, Attachment>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, attachment: &Attachment) -> PreviewHandle {
        self.next_id += 1;
        self.entries.insert(self.next_id, attachment.clone());
        PreviewHandle(self.next_id)
    }

    pub fn resolve(&self, handle: &PreviewHandle) -> Option<&Attachment> {
        self.entries.get(&handle.0)
    }

    /// Returns false when the handle was already released
    pub fn release(&mut self, handle: &PreviewHandle) -> bool {
        self.entries.remove(&handle.0).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}
