//! 気象データと病害リスク表示

use serde::{Deserialize, Serialize};

/// 気象スナップショット（すべての項目が省略可能）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSnapshot {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
    pub disease_risk: Option<String>,
    pub risk_factors: Vec<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub location_name: Option<String>,
}

impl WeatherSnapshot {
    /// 天候の説明文（description優先）
    pub fn summary(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.condition.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// 表示用の地点名。名前が無ければ座標（小数2桁）
    pub fn place_label(&self) -> Option<String> {
        if let Some(name) = self.location_name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(format!("{:.2}, {:.2}", lat, lon)),
            _ => None,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::classify(self.disease_risk.as_deref())
    }
}

/// スキャン履歴の気象データはネスト形式とフラット形式が混在する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeatherPayload {
    Nested { data: WeatherSnapshot },
    Flat(WeatherSnapshot),
}

impl WeatherPayload {
    pub fn snapshot(&self) -> &WeatherSnapshot {
        match self {
            WeatherPayload::Nested { data } => data,
            WeatherPayload::Flat(snapshot) => snapshot,
        }
    }
}

/// `/api/weather/current` のレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    pub data: WeatherSnapshot,
}

/// 予報1日分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastDay {
    pub date: String,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub precipitation: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub disease_risk: Option<String>,
}

/// `/api/weather/forecast` のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Forecast {
    pub status: Option<String>,
    pub forecast: Vec<ForecastDay>,
}

/// 病害リスクの段階（色分け用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
    Unknown,
}

impl RiskLevel {
    /// リスク文字列を部分一致で分類（high → moderate → low の順に判定）
    pub fn classify(risk: Option<&str>) -> Self {
        let Some(risk) = risk else {
            return RiskLevel::Unknown;
        };
        let lower = risk.to_lowercase();
        if lower.contains("high") {
            RiskLevel::High
        } else if lower.contains("moderate") {
            RiskLevel::Moderate
        } else if lower.contains("low") {
            RiskLevel::Low
        } else {
            RiskLevel::Unknown
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            RiskLevel::High => "risk-high",
            RiskLevel::Moderate => "risk-moderate",
            RiskLevel::Low => "risk-low",
            RiskLevel::Unknown => "risk-unknown",
        }
    }
}
