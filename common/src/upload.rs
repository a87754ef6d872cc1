//! 画像の受け付け
//!
//! ファイル選択・ドロップされた画像を検証し、プレビュー用のData URLを作る。

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// 拡張子からMIMEタイプを推定する対応表
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("gif", "image/gif"),
];

/// 選択された画像
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// "data:image/jpeg;base64,..." 形式
    pub preview_url: String,
}

impl SelectedImage {
    /// バイト列から作成（MIMEタイプが image/* でなければエラー）
    pub fn from_bytes(file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<Self> {
        validate_mime(mime_type)?;
        if bytes.is_empty() {
            return Err(Error::InvalidImage(format!("{} is empty", file_name)));
        }
        let preview_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(&bytes));
        Ok(Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
            preview_url,
        })
    }

    /// FileReaderが返すData URLから作成
    pub fn from_data_url(file_name: &str, data_url: &str) -> Result<Self> {
        let mime_type = extract_mime_type_from_data_url(data_url);
        validate_mime(mime_type)?;
        let encoded = extract_base64_from_data_url(data_url)
            .ok_or_else(|| Error::InvalidImage(format!("{}: not a data URL", file_name)))?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::InvalidImage(format!("{}: {}", file_name, e)))?;
        Ok(Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
            preview_url: data_url.to_string(),
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// MIMEタイプが画像かどうか検証
pub fn validate_mime(mime_type: &str) -> Result<()> {
    if mime_type.starts_with("image/") {
        Ok(())
    } else {
        Err(Error::InvalidImage(format!("unsupported type: {}", mime_type)))
    }
}

/// ファイル名の拡張子からMIMEタイプを推定
pub fn mime_from_file_name(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Data URLからBase64データ部分を抽出
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式のData URL
///
/// # Returns
/// Base64エンコードされたデータ部分、または抽出失敗時はNone
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    data_url.split(',').nth(1)
}

/// Data URLからMIMEタイプを抽出（抽出失敗時は空文字）
pub fn extract_mime_type_from_data_url(data_url: &str) -> &str {
    data_url
        .strip_prefix("data:")
        .and_then(|s| s.split(';').next())
        .unwrap_or("")
}
