//! 判定結果の表示モデル
//!
//! PredictionResult と病害カタログから、表示に必要な値を一度に組み立てる。
//! 表示順は固定: 病名+重症度バッジ → 信頼度バー → 説明 → 原因 → 収量影響
//! → 対策（番号付き） → 候補内訳（候補が2件以上のときのみ）

use crate::diseases::{DiseaseCatalog, DiseaseRecord, Severity};
use crate::types::PredictionResult;
use crate::weather::WeatherSnapshot;

/// 内訳に表示する候補の最大数
pub const BREAKDOWN_LIMIT: usize = 5;

/// ラベルが「健康」かどうか
///
/// 大文字小文字を無視した部分一致のみで判定する。
/// そのため "Unhealthy-looking" も健康扱いになる。
///
/// # Examples
/// ```
/// use maize_scan_common::is_healthy;
///
/// assert!(is_healthy("Healthy"));
/// assert!(!is_healthy("Common Rust"));
/// ```
pub fn is_healthy(label: &str) -> bool {
    label.to_lowercase().contains("healthy")
}

/// 信頼度(0〜1)をパーセント整数に変換（四捨五入、0〜100に丸める）
pub fn confidence_percent(confidence: f64) -> u8 {
    if !confidence.is_finite() {
        return 0;
    }
    (confidence * 100.0).round().clamp(0.0, 100.0) as u8
}

/// 信頼度の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    VeryHigh,
    High,
    Moderate,
    Low,
}

impl ConfidenceBand {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            90..=u8::MAX => ConfidenceBand::VeryHigh,
            70..=89 => ConfidenceBand::High,
            50..=69 => ConfidenceBand::Moderate,
            _ => ConfidenceBand::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::VeryHigh => "Very high confidence",
            ConfidenceBand::High => "High confidence",
            ConfidenceBand::Moderate => "Moderate confidence",
            ConfidenceBand::Low => "Low confidence – consider retaking the image",
        }
    }
}

/// 候補内訳の1行
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub label: String,
    pub percent: u8,
    /// 最上位の予測と同じラベルか
    pub is_top: bool,
}

/// 候補を確率の降順で並べ、上位5件を返す（同率はラベル順）
pub fn ranked_breakdown(result: &PredictionResult) -> Vec<BreakdownRow> {
    let mut entries: Vec<(&String, &f64)> = result.all_predictions.iter().collect();
    entries.sort_by(|(la, pa), (lb, pb)| pb.total_cmp(pa).then_with(|| la.cmp(lb)));
    entries
        .into_iter()
        .take(BREAKDOWN_LIMIT)
        .map(|(label, prob)| BreakdownRow {
            label: label.clone(),
            percent: confidence_percent(*prob),
            is_top: *label == result.prediction,
        })
        .collect()
}

/// 結果表示モデル
#[derive(Debug, Clone)]
pub struct ResultView<'a> {
    pub condition: String,
    pub healthy: bool,
    pub severity: Severity,
    pub percent: u8,
    pub band: ConfidenceBand,
    pub record: &'a DiseaseRecord,
    /// 候補が1件以下なら空
    pub breakdown: Vec<BreakdownRow>,
    pub weather: Option<WeatherSnapshot>,
}

impl<'a> ResultView<'a> {
    pub fn build(result: &PredictionResult, catalog: &'a DiseaseCatalog) -> Self {
        let record = catalog.lookup(&result.prediction);
        let percent = confidence_percent(result.confidence);
        let breakdown = if result.all_predictions.len() > 1 {
            ranked_breakdown(result)
        } else {
            Vec::new()
        };

        Self {
            condition: result.prediction.clone(),
            healthy: is_healthy(&result.prediction),
            severity: record.severity,
            percent,
            band: ConfidenceBand::from_percent(percent),
            record,
            breakdown,
            weather: result.weather.as_ref().map(|w| w.snapshot().clone()),
        }
    }

    pub fn severity_label(&self) -> &'static str {
        self.severity.label()
    }

    /// 信頼度バーの色クラス（健康なら緑、それ以外はオレンジ）
    pub fn accent_class(&self) -> &'static str {
        if self.healthy {
            "accent-healthy"
        } else {
            "accent-diseased"
        }
    }
}

/// 結果が出る前に表示する撮影のコツ
pub const UPLOAD_TIPS: [&str; 4] = [
    "Use clear, well-lit images of maize leaves",
    "Ensure the leaf fills most of the frame",
    "Avoid blurry or dark images",
    "Capture both sides of the leaf if symptoms are visible",
];

/// 地域向けの一言（地名が取れなければ "your region"）
pub fn local_extension_advice(place: Option<&str>, condition: &str) -> String {
    let place = place
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(crate::geocode::DEFAULT_PLACE_NAME);
    format!(
        "Specific advice for {}: Monitoring weather patterns for increased {} risk.",
        place, condition
    )
}
