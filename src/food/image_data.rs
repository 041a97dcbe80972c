use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

use super::cache::image_key;
use super::error::{Result, ScanError};

/// Raw image bytes submitted for recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImageData {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ScanError::EmptyImage);
        }
        let mime_type = guess_mime(&bytes);
        Ok(Self { bytes, mime_type })
    }

    /// Parse a `data:<mime>;base64,<payload>` URL as produced by a canvas
    /// or file reader.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ScanError::InvalidDataUrl("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ScanError::InvalidDataUrl("missing ',' separator".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ScanError::InvalidDataUrl("only base64 payloads are supported".to_string()))?;

        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ScanError::InvalidDataUrl(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ScanError::EmptyImage);
        }

        let mime_type = if mime_type.is_empty() {
            guess_mime(&bytes)
        } else {
            mime_type.to_string()
        };
        Ok(Self { bytes, mime_type })
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn cache_key(&self) -> String {
        image_key(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

fn guess_mime(bytes: &[u8]) -> String {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Gif) => "image/gif",
        Ok(image::ImageFormat::WebP) => "image/webp",
        Ok(image::ImageFormat::Bmp) => "image/bmp",
        _ => "image/jpeg",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base64_data_url() {
        let image = ImageData::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.bytes(), b"hello");
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.to_data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn rejects_malformed_data_urls() {
        assert!(matches!(
            ImageData::from_data_url("aGVsbG8="),
            Err(ScanError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            ImageData::from_data_url("data:image/png,hello"),
            Err(ScanError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            ImageData::from_data_url("data:image/png;base64,***"),
            Err(ScanError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            ImageData::from_data_url("data:image/png;base64,"),
            Err(ScanError::EmptyImage)
        ));
    }

    #[test]
    fn empty_bytes_are_rejected() {
        assert!(matches!(ImageData::from_bytes(Vec::new()), Err(ScanError::EmptyImage)));
    }

    #[test]
    fn same_content_same_key() {
        let a = ImageData::from_bytes(b"pixels".to_vec()).unwrap();
        let b = ImageData::from_data_url("data:image/jpeg;base64,cGl4ZWxz").unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
