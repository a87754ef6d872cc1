use crate::error::{MaizeScanError, Result};
use maize_scan_common::{Coordinates, DEFAULT_API_BASE_URL, DEMO_FARMER_ID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// APIのベースURLを上書きする環境変数
pub const API_BASE_URL_ENV: &str = "MAIZE_SCAN_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub farmer_id: String,
    pub history_limit: u32,
    pub geolocation_timeout_ms: u64,
    pub request_timeout_seconds: u64,
    /// 端末位置の代わりに使う座標
    pub default_location: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            farmer_id: DEMO_FARMER_ID.into(),
            history_limit: 100,
            geolocation_timeout_ms: 5000,
            request_timeout_seconds: 60,
            default_location: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスから読み込む（無ければ既定値）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 設定ディレクトリ（~/.config/maize-scan）
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MaizeScanError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("maize-scan"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// ベースURL（環境変数 → 設定ファイル → 既定値）
    pub fn api_base_url(&self) -> String {
        self.resolve_api_base_url(std::env::var(API_BASE_URL_ENV).ok())
    }

    pub fn resolve_api_base_url(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn geolocation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.geolocation_timeout_ms)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_seconds)
    }
}
