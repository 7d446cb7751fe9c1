//! services/api/src/adapters/extractor.rs
//!
//! Turns uploaded sources into plain text. Only text-based documents are handled
//! here; binary formats and video transcripts need their own extractor.

use async_trait::async_trait;
use mindload_core::ports::{ContentExtractor, IngestSource, PortError, PortResult};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "csv", "text"];

#[derive(Clone, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Collapses runs of blank lines and trims trailing whitespace from every line.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[async_trait]
impl ContentExtractor for PlainTextExtractor {
    async fn extract_text(&self, source: IngestSource) -> PortResult<String> {
        match source {
            IngestSource::Text(text) => Ok(normalize(&text)),
            IngestSource::Document { file_name, bytes } => {
                let extension = file_name
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_lowercase())
                    .unwrap_or_default();
                if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
                    return Err(PortError::Unsupported(format!(
                        "Cannot extract text from '{}'",
                        file_name
                    )));
                }
                let text = String::from_utf8(bytes).map_err(|e| {
                    PortError::InvalidInput(format!("'{}' is not valid UTF-8 text: {}", file_name, e))
                })?;
                Ok(normalize(&text))
            }
            IngestSource::YouTube { video_id } => Err(PortError::Unsupported(format!(
                "No transcript source configured for video {}",
                video_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_markdown_documents() {
        let extractor = PlainTextExtractor::new();
        let source = IngestSource::Document {
            file_name: "Notes.MD".to_string(),
            bytes: b"# Mitosis  \n\n\n\nProphase first.\r\n".to_vec(),
        };

        let text = extractor.extract_text(source).await.unwrap();
        assert_eq!(text, "# Mitosis\n\nProphase first.");
    }

    #[tokio::test]
    async fn rejects_binary_formats_and_videos() {
        let extractor = PlainTextExtractor::new();

        let pdf = IngestSource::Document {
            file_name: "slides.pdf".to_string(),
            bytes: vec![0x25, 0x50, 0x44, 0x46],
        };
        assert!(matches!(extractor.extract_text(pdf).await, Err(PortError::Unsupported(_))));

        let video = IngestSource::YouTube {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        assert!(matches!(extractor.extract_text(video).await, Err(PortError::Unsupported(_))));
    }

    #[tokio::test]
    async fn invalid_utf8_is_invalid_input() {
        let extractor = PlainTextExtractor::new();
        let source = IngestSource::Document {
            file_name: "notes.txt".to_string(),
            bytes: vec![0xff, 0xfe, 0xfd],
        };
        assert!(matches!(
            extractor.extract_text(source).await,
            Err(PortError::InvalidInput(_))
        ));
    }
}
