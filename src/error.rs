use maize_scan_common::map::FarmSaveError;
use maize_scan_common::DetectError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaizeScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    /// 判定失敗（利用者向けの文言をそのまま表示）
    #[error(transparent)]
    Detect(#[from] DetectError),

    /// 圃場境界の保存失敗（追加は取り消し済み）
    #[error(transparent)]
    FarmSave(#[from] FarmSaveError),

    #[error("Unable to load history. Please try again later.")]
    HistoryUnavailable,

    #[error(transparent)]
    Common(#[from] maize_scan_common::Error),

    #[error("HTTPクライアントエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MaizeScanError>;
