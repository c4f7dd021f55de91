// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image references and image loading.
//!
//! Map and marker images are stored as opaque strings: either a URL /
//! file path or an embedded `data:<mime>;base64,<payload>` URI produced
//! from an uploaded file. This module builds those URIs and decodes map
//! images into RGBA pixels for display.

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};

/// Image file extensions accepted for maps and marker images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Decoded RGBA image.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Where the bytes of an image reference come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Embedded `data:` URI
    Embedded,
    /// Path on the local file system
    File(PathBuf),
    /// http(s) URL, not fetched
    Remote,
}

impl ImageSource {
    pub fn classify(reference: &str) -> Self {
        if reference.starts_with("data:") {
            ImageSource::Embedded
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            ImageSource::Remote
        } else {
            let path = reference.strip_prefix("file://").unwrap_or(reference);
            ImageSource::File(PathBuf::from(path))
        }
    }
}

/// Guess an image MIME type from a file name.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Encode raw bytes as a base64 data URI.
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read a file and embed it as a data URI.
pub fn file_to_data_uri(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(to_data_uri(mime_for_path(path), &bytes))
}

/// Decode the payload of a base64 data URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("Not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("Malformed data URI"))?;
    if !header.ends_with(";base64") {
        return Err(anyhow!("Only base64 data URIs are supported"));
    }
    STANDARD
        .decode(payload.trim())
        .context("Invalid base64 payload")
}

/// Load the bytes behind an image reference.
pub fn reference_bytes(reference: &str) -> Result<Vec<u8>> {
    match ImageSource::classify(reference) {
        ImageSource::Embedded => decode_data_uri(reference),
        ImageSource::File(path) => std::fs::read(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
        ImageSource::Remote => Err(anyhow!("Remote images are not fetched: {}", reference)),
    }
}

/// Decode encoded image bytes into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> Result<LoadedImage> {
    let img = image::load_from_memory(bytes).context("Failed to decode image")?;
    let rgba = img.to_rgba8();
    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Load and decode the image behind a map reference.
pub fn load_reference(reference: &str) -> Result<LoadedImage> {
    decode_image(&reference_bytes(reference)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let uri = to_data_uri("image/png", b"hello");
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_uri(&uri).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_non_base64_uri() {
        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("https://example.com/a.png").is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(ImageSource::classify("data:image/png;base64,AA=="), ImageSource::Embedded);
        assert_eq!(ImageSource::classify("https://example.com/map.png"), ImageSource::Remote);
        assert_eq!(
            ImageSource::classify("file:///tmp/map.png"),
            ImageSource::File(PathBuf::from("/tmp/map.png"))
        );
    }

    #[test]
    fn test_mime_and_extension() {
        assert_eq!(mime_for_path(Path::new("a/MAP.JPG")), "image/jpeg");
        assert!(is_image_path(Path::new("map.PNG")));
        assert!(!is_image_path(Path::new("project.json")));
    }

    #[test]
    fn test_load_embedded_reference() {
        let uri = to_data_uri("image/png", &tiny_png());
        let loaded = load_reference(&uri).unwrap();

        assert_eq!((loaded.width, loaded.height), (2, 3));
        assert_eq!(loaded.pixels.len(), 2 * 3 * 4);
        assert_eq!(&loaded.pixels[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_file_to_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        std::fs::write(&path, tiny_png()).unwrap();

        let uri = file_to_data_uri(&path).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(load_reference(path.to_str().unwrap()).is_ok());
    }
}
