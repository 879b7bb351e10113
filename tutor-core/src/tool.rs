use crate::attachment::{Attachment, AttachmentError, rasterize_drawing};
use crate::turn::TurnInput;
use bytes::Bytes;
use image::RgbaImage;

pub const DRAWING_PROMPT: &str = "Here is my drawing. What math do you see?";

/// Output of one of the side tools, submitted as a regular turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolResult {
    Calculation(String),
    /// PNG bytes of a rasterized drawing
    Drawing(Bytes),
}

impl ToolResult {
    pub fn from_canvas(surface: &RgbaImage) -> Result<Self, AttachmentError> {
        rasterize_drawing(surface).map(ToolResult::Drawing)
    }

    pub fn into_input(self) -> TurnInput {
        match self {
            ToolResult::Calculation(value) => {
                TurnInput::text(format!("My calculator says {value}. Can you check it?"))
            }
            ToolResult::Drawing(png) => TurnInput::with_image(DRAWING_PROMPT, Attachment::png(png)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::DRAWING_FILE_NAME;

    #[test]
    fn test_calculation_text() {
        let input = ToolResult::Calculation("42".into()).into_input();
        assert_eq!(input.shown_text(), "My calculator says 42. Can you check it?");
        assert!(input.attachment().is_none());
    }

    #[test]
    fn test_drawing_is_png_attachment() {
        let input = ToolResult::Drawing(Bytes::from_static(&[1, 2, 3])).into_input();
        let attachment = input.attachment().unwrap();
        assert_eq!(attachment.mime_type(), "image/png");
        assert_eq!(attachment.file_name(), DRAWING_FILE_NAME);
        assert_eq!(input.shown_text(), DRAWING_PROMPT);
    }

    #[test]
    fn test_blank_canvas_yields_no_tool_result() {
        let canvas = RgbaImage::new(8, 8);
        assert!(matches!(
            ToolResult::from_canvas(&canvas),
            Err(AttachmentError::EmptyDrawing)
        ));
    }
}
