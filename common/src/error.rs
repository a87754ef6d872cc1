//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_status() {
        let error = Error::Status {
            status: 500,
            message: "Failed to fetch scan history".to_string(),
        };
        assert_eq!(format!("{}", error), "HTTP 500: Failed to fetch scan history");
    }

    #[test]
    fn test_error_display_config() {
        let error = Error::Config("base URL is empty".to_string());
        assert_eq!(format!("{}", error), "Config error: base URL is empty");
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::InvalidBoundary("ポリゴンの頂点が不足".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("InvalidBoundary"));
        assert!(debug.contains("ポリゴンの頂点が不足"));
    }
}
