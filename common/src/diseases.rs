//! 病害情報カタログ
//!
//! `data/diseases.json` をバイナリに埋め込み、予測ラベルから病害情報を引く。
//! 表に無いラベルは汎用の「不明な病害」レコードにフォールバックする。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const BUILTIN_CATALOG: &str = include_str!("../data/diseases.json");

/// 重症度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Medium,
    High,
    Unknown,
}

impl Severity {
    /// バッジ表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Severity::None => "No Risk",
            Severity::Medium => "Moderate Risk",
            Severity::High => "High Risk",
            Severity::Unknown => "Unclassified",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::None => "severity-none",
            Severity::Medium => "severity-medium",
            Severity::High => "severity-high",
            Severity::Unknown => "severity-unknown",
        }
    }
}

/// 病害レコード（不変の参照データ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub label: String,
    pub description: String,
    pub causes: Vec<String>,
    pub yield_impact: String,
    /// 対策（順序に意味あり）
    pub controls: Vec<String>,
    pub severity: Severity,
}

/// ラベル照合の方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupMode {
    /// 完全一致（大文字小文字も区別）
    #[default]
    Exact,
    /// 前後の空白を除去し、大文字小文字を無視
    Normalized,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    unknown: DiseaseRecord,
    diseases: Vec<DiseaseRecord>,
}

/// 病害カタログ
#[derive(Debug, Clone)]
pub struct DiseaseCatalog {
    version: u32,
    unknown: DiseaseRecord,
    records: Vec<DiseaseRecord>,
    mode: LookupMode,
}

impl DiseaseCatalog {
    pub const CURRENT_VERSION: u32 = 1;

    /// 埋め込みカタログを読み込み
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// JSON文字列からカタログを構築
    ///
    /// # Arguments
    /// * `json` - `{"version", "unknown", "diseases": [...]}` 形式
    ///
    /// # Returns
    /// * `Err` - JSONが不正、またはバージョン不一致、ラベルが空
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        if file.version != Self::CURRENT_VERSION {
            return Err(Error::Config(format!(
                "unsupported disease catalog version {} (expected {})",
                file.version,
                Self::CURRENT_VERSION
            )));
        }
        if let Some(bad) = file.diseases.iter().find(|d| d.label.trim().is_empty()) {
            return Err(Error::Config(format!(
                "disease record with empty label: {}",
                bad.description
            )));
        }
        Ok(Self {
            version: file.version,
            unknown: file.unknown,
            records: file.diseases,
            mode: LookupMode::Exact,
        })
    }

    pub fn with_mode(mut self, mode: LookupMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> LookupMode {
        self.mode
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn unknown(&self) -> &DiseaseRecord {
        &self.unknown
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.label.as_str())
    }

    /// 表にあるラベルを引く（見つからなければNone）
    ///
    /// Normalizedモードで同じ正規化結果のラベルが複数ある場合は、
    /// 表の先頭に近いものが優先される。
    pub fn find(&self, label: &str) -> Option<&DiseaseRecord> {
        match self.mode {
            LookupMode::Exact => self.records.iter().find(|r| r.label == label),
            LookupMode::Normalized => {
                let key = normalize_label(label);
                self.records
                    .iter()
                    .find(|r| normalize_label(&r.label) == key)
            }
        }
    }

    /// ラベルから病害情報を取得（不明レコードへフォールバック）
    pub fn lookup(&self, label: &str) -> &DiseaseRecord {
        self.find(label).unwrap_or(&self.unknown)
    }
}

/// 照合用にラベルを正規化
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
