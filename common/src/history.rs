//! スキャン履歴の絞り込み・集計・表示
//!
//! 読み込んだ履歴はクライアント側だけで検索・絞り込みを行う。
//! 集計は絞り込み前の全件に対して計算する。

use crate::presentation::{confidence_percent, is_healthy};
use crate::types::ScanRecord;
use chrono::{DateTime, NaiveDateTime};
use std::collections::HashMap;
use std::str::FromStr;

/// 履歴の取得件数
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// 読み込み失敗時の表示
pub const HISTORY_ERROR_MESSAGE: &str = "Unable to load history. Please try again later.";

/// 絞り込みで0件になったときの表示
pub const NO_RESULTS_MESSAGE: &str = "No results found";

/// 健康状態による絞り込み
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthFilter {
    #[default]
    All,
    Diseased,
    Healthy,
}

impl HealthFilter {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            HealthFilter::All => true,
            HealthFilter::Diseased => !is_healthy(label),
            HealthFilter::Healthy => is_healthy(label),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthFilter::All => "All Scans",
            HealthFilter::Diseased => "Diseased Only",
            HealthFilter::Healthy => "Healthy Only",
        }
    }
}

impl FromStr for HealthFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(HealthFilter::All),
            "diseased" => Ok(HealthFilter::Diseased),
            "healthy" => Ok(HealthFilter::Healthy),
            _ => Err(format!("Unknown filter: {}. Use all, diseased or healthy", s)),
        }
    }
}

/// 並び順
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// 新しい順
    #[default]
    Date,
    /// 信頼度の高い順
    Confidence,
    /// 病名のアルファベット順
    Condition,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "confidence" => Ok(SortKey::Confidence),
            "condition" => Ok(SortKey::Condition),
            _ => Err(format!("Unknown sort key: {}. Use date, confidence or condition", s)),
        }
    }
}

/// 検索語（部分一致・大文字小文字無視）かつ絞り込み条件に合う履歴
pub fn filter_scans<'a>(
    scans: &'a [ScanRecord],
    search: &str,
    filter: HealthFilter,
) -> Vec<&'a ScanRecord> {
    let needle = search.to_lowercase();
    scans
        .iter()
        .filter(|scan| scan.prediction.to_lowercase().contains(&needle))
        .filter(|scan| filter.matches(&scan.prediction))
        .collect()
}

/// 並べ替え（安定ソート。日時が読めない行は末尾）
pub fn sort_scans(scans: &mut [&ScanRecord], key: SortKey) {
    match key {
        SortKey::Date => scans.sort_by(|a, b| {
            parse_timestamp(&b.timestamp).cmp(&parse_timestamp(&a.timestamp))
        }),
        SortKey::Confidence => scans.sort_by(|a, b| b.confidence.total_cmp(&a.confidence)),
        SortKey::Condition => scans.sort_by(|a, b| {
            a.prediction
                .to_lowercase()
                .cmp(&b.prediction.to_lowercase())
        }),
    }
}

/// 全件の集計
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    /// 健康な割合（%、四捨五入）
    pub healthy_percent: u8,
    /// 最も多い病名（同数なら先に出てきた方）
    pub most_common_risk: Option<String>,
}

impl HistoryStats {
    pub fn compute(scans: &[ScanRecord]) -> Self {
        let total = scans.len();
        let healthy = scans.iter().filter(|s| is_healthy(&s.prediction)).count();
        let healthy_percent = if total == 0 {
            0
        } else {
            confidence_percent(healthy as f64 / total as f64)
        };

        // (出現数, 初出位置)
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (index, scan) in scans.iter().enumerate() {
            if is_healthy(&scan.prediction) {
                continue;
            }
            counts.entry(scan.prediction.as_str()).or_insert((0, index)).0 += 1;
        }
        let most_common_risk = counts
            .into_iter()
            .max_by(|(_, (ca, ia)), (_, (cb, ib))| ca.cmp(cb).then(ib.cmp(ia)))
            .map(|(label, _)| label.to_string());

        Self {
            total,
            healthy_percent,
            most_common_risk,
        }
    }

    pub fn most_common_risk_label(&self) -> &str {
        self.most_common_risk.as_deref().unwrap_or("None")
    }
}

/// 履歴画面の読み込み状態
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HistoryState {
    #[default]
    Loading,
    Failed,
    Loaded(Vec<ScanRecord>),
}

/// 履歴画面に何を出すか
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryDisplay<'a> {
    Loading,
    Error(&'static str),
    /// まだ1件も保存されていない
    NoData,
    /// 保存はあるが絞り込みで0件
    NoResults(&'static str),
    Rows(Vec<&'a ScanRecord>),
}

impl HistoryState {
    pub fn display(&self, search: &str, filter: HealthFilter, sort: SortKey) -> HistoryDisplay<'_> {
        match self {
            HistoryState::Loading => HistoryDisplay::Loading,
            HistoryState::Failed => HistoryDisplay::Error(HISTORY_ERROR_MESSAGE),
            HistoryState::Loaded(scans) if scans.is_empty() => HistoryDisplay::NoData,
            HistoryState::Loaded(scans) => {
                let mut rows = filter_scans(scans, search, filter);
                if rows.is_empty() {
                    return HistoryDisplay::NoResults(NO_RESULTS_MESSAGE);
                }
                sort_scans(&mut rows, sort);
                HistoryDisplay::Rows(rows)
            }
        }
    }

    /// 集計（読み込み済みで1件以上あるときのみ）
    pub fn stats(&self) -> Option<HistoryStats> {
        match self {
            HistoryState::Loaded(scans) if !scans.is_empty() => Some(HistoryStats::compute(scans)),
            _ => None,
        }
    }
}

/// タイムスタンプを解釈（RFC 3339、またはタイムゾーン無しのISO形式）
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// 日付列（例: "19 Oct 2026"）。読めなければ元の文字列
pub fn format_scan_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%-d %b %Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// 時刻列（例: "14:05"）。読めなければ空
pub fn format_scan_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// 位置列（小数4桁）
pub fn format_location(scan: &ScanRecord) -> String {
    scan.coordinates()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// 天気列（気温と説明）。気温が無ければ None
pub fn weather_cell(scan: &ScanRecord) -> Option<(String, String)> {
    let snapshot = scan.weather_data.as_ref()?.snapshot();
    let temperature = snapshot.temperature?;
    Some((
        format!("{}°C", temperature),
        snapshot.summary().unwrap_or_default().to_string(),
    ))
}

/// 天気列の1行表示（無ければ "No data"）
pub fn weather_cell_text(scan: &ScanRecord) -> String {
    match weather_cell(scan) {
        Some((temp, summary)) if summary.is_empty() => temp,
        Some((temp, summary)) => format!("{} {}", temp, summary),
        None => "No data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(id: i64, prediction: &str, confidence: f64, timestamp: &str) -> ScanRecord {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "prediction": prediction,
            "confidence": confidence,
            "timestamp": timestamp,
        }))
        .unwrap()
    }

    fn sample() -> Vec<ScanRecord> {
        vec![
            scan(1, "Healthy", 0.95, "2026-10-17 09:00:00"),
            scan(2, "Common Rust", 0.82, "2026-10-19 14:05:00"),
            scan(3, "Gray Leaf Spot", 0.70, "2026-10-18T08:30:00"),
            scan(4, "Common Rust", 0.60, "2026-10-16 10:00:00"),
        ]
    }

    fn ids(rows: &[&ScanRecord]) -> Vec<i64> {
        rows.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_search_and_filter_combine() {
        let scans = sample();
        assert_eq!(ids(&filter_scans(&scans, "RUST", HealthFilter::All)), vec![2, 4]);
        assert_eq!(ids(&filter_scans(&scans, "", HealthFilter::Healthy)), vec![1]);
        assert_eq!(ids(&filter_scans(&scans, "", HealthFilter::Diseased)), vec![2, 3, 4]);
        assert!(filter_scans(&scans, "rust", HealthFilter::Healthy).is_empty());
    }

    #[test]
    fn test_search_is_raw_substring() {
        let scans = sample();
        // 前後の空白もそのまま検索語に含める
        assert_eq!(ids(&filter_scans(&scans, " rust", HealthFilter::All)), vec![2, 4]);
        assert!(filter_scans(&scans, "rust ", HealthFilter::All).is_empty());
        assert!(filter_scans(&scans, " healthy", HealthFilter::All).is_empty());
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("Diseased".parse::<HealthFilter>(), Ok(HealthFilter::Diseased));
        assert!("sick".parse::<HealthFilter>().is_err());
        assert_eq!("confidence".parse::<SortKey>(), Ok(SortKey::Confidence));
    }

    #[test]
    fn test_sort_by_date_newest_first() {
        let scans = sample();
        let mut rows: Vec<&ScanRecord> = scans.iter().collect();
        sort_scans(&mut rows, SortKey::Date);
        assert_eq!(ids(&rows), vec![2, 3, 1, 4]);

        sort_scans(&mut rows, SortKey::Confidence);
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);

        sort_scans(&mut rows, SortKey::Condition);
        assert_eq!(ids(&rows), vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_stats() {
        let stats = HistoryStats::compute(&sample());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.healthy_percent, 25);
        assert_eq!(stats.most_common_risk_label(), "Common Rust");
    }

    #[test]
    fn test_stats_tie_goes_to_first_seen() {
        let scans = vec![
            scan(1, "Blight", 0.5, ""),
            scan(2, "Common Rust", 0.5, ""),
            scan(3, "Common Rust", 0.5, ""),
            scan(4, "Blight", 0.5, ""),
        ];
        assert_eq!(HistoryStats::compute(&scans).most_common_risk.as_deref(), Some("Blight"));
    }

    #[test]
    fn test_stats_all_healthy() {
        let scans = vec![scan(1, "Healthy", 0.9, "")];
        let stats = HistoryStats::compute(&scans);
        assert_eq!(stats.healthy_percent, 100);
        assert_eq!(stats.most_common_risk_label(), "None");
    }

    #[test]
    fn test_display_states_are_distinct() {
        assert_eq!(
            HistoryState::Loading.display("", HealthFilter::All, SortKey::Date),
            HistoryDisplay::Loading
        );
        assert_eq!(
            HistoryState::Failed.display("", HealthFilter::All, SortKey::Date),
            HistoryDisplay::Error("Unable to load history. Please try again later.")
        );
        assert_eq!(
            HistoryState::Loaded(Vec::new()).display("", HealthFilter::All, SortKey::Date),
            HistoryDisplay::NoData
        );
        let loaded = HistoryState::Loaded(sample());
        assert_eq!(
            loaded.display("streak", HealthFilter::All, SortKey::Date),
            HistoryDisplay::NoResults("No results found")
        );
        assert!(matches!(
            loaded.display("", HealthFilter::All, SortKey::Date),
            HistoryDisplay::Rows(rows) if rows.len() == 4
        ));
        assert!(HistoryState::Loaded(Vec::new()).stats().is_none());
    }

    #[test]
    fn test_date_and_time_columns() {
        assert_eq!(format_scan_date("2026-10-19 14:05:00"), "19 Oct 2026");
        assert_eq!(format_scan_time("2026-10-19T14:05:33.120"), "14:05");
        assert_eq!(format_scan_date("2026-10-19T14:05:00+03:00"), "19 Oct 2026");
        assert_eq!(format_scan_date("yesterday"), "yesterday");
        assert_eq!(format_scan_time("yesterday"), "");
    }

    #[test]
    fn test_weather_cell_nested_and_flat() {
        let mut s = scan(1, "Healthy", 0.9, "");
        assert_eq!(weather_cell_text(&s), "No data");

        s.weather_data = serde_json::from_str(r#"{"data": {"temperature": 21.5, "description": "light rain"}}"#).unwrap();
        assert_eq!(weather_cell_text(&s), "21.5°C light rain");

        s.weather_data = serde_json::from_str(r#"{"temperature": 19, "condition": "Clouds"}"#).unwrap();
        assert_eq!(weather_cell_text(&s), "19°C Clouds");

        s.weather_data = serde_json::from_str(r#"{"humidity": 80}"#).unwrap();
        assert_eq!(weather_cell_text(&s), "No data");
    }

    #[test]
    fn test_location_column() {
        let mut s = scan(1, "Healthy", 0.9, "");
        assert_eq!(format_location(&s), "Unknown");
        s.latitude = Some(-1.292066);
        s.longitude = Some(36.821946);
        assert_eq!(format_location(&s), "-1.2921, 36.8219");
    }
}
