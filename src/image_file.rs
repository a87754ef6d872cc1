//! 画像ファイルの読み込み
//!
//! 中身から形式を判定し、判定できなければ拡張子から推定する。

use crate::error::{MaizeScanError, Result};
use maize_scan_common::upload::mime_from_file_name;
use maize_scan_common::SelectedImage;
use std::path::Path;

pub fn load_image(path: &Path) -> Result<SelectedImage> {
    if !path.is_file() {
        return Err(MaizeScanError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mime_type = sniff_mime(&bytes)
        .or_else(|| mime_from_file_name(&file_name))
        .ok_or_else(|| {
            MaizeScanError::ImageLoad(format!("{}: 画像ファイルではありません", file_name))
        })?;

    Ok(SelectedImage::from_bytes(&file_name, mime_type, bytes)?)
}

/// 先頭バイトから画像形式を判定
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_sniff_png() {
        assert_eq!(sniff_mime(PNG_HEADER), Some("image/png"));
        assert_eq!(sniff_mime(b"hello world"), None);
    }

    #[test]
    fn test_load_png_with_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.dat");
        std::fs::write(&path, PNG_HEADER).unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.file_name, "leaf.dat");
        assert!(image.preview_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_load_rejects_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();
        assert!(matches!(load_image(&path), Err(MaizeScanError::ImageLoad(_))));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_image(Path::new("/nonexistent/leaf.jpg")),
            Err(MaizeScanError::FileNotFound(_))
        ));
    }
}
