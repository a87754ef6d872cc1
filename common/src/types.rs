//! バックエンドとやり取りする型の定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - PredictionResult: 病害判定の結果（1回の解析ごとに丸ごと置き換え）
//! - ScanRecord: 過去のスキャン履歴（バックエンド所有、読み取り専用）
//! - FarmBoundary: 圃場の境界ポリゴン（バックエンド所有）

use crate::weather::WeatherPayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 緯度経度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::str::FromStr for Coordinates {
    type Err = String;

    /// "緯度,経度" 形式をパース
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("Invalid coordinates: {}. Use LAT,LON", s))?;
        let latitude: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("Invalid latitude: {}", lat.trim()))?;
        let longitude: f64 = lon
            .trim()
            .parse()
            .map_err(|_| format!("Invalid longitude: {}", lon.trim()))?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!("Coordinates out of range: {}", s));
        }
        Ok(Self { latitude, longitude })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// `/api/disease/predict` の生レスポンス
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PredictResponseBody {
    pub prediction: Option<String>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub confidence: Option<f64>,
    pub all_predictions: Option<BTreeMap<String, f64>>,
    pub weather: Option<WeatherPayload>,
}

/// 病害判定の結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    pub confidence: f64,
    #[serde(default)]
    pub all_predictions: BTreeMap<String, f64>,
    #[serde(default)]
    pub weather: Option<WeatherPayload>,
    /// リクエストに添付した位置（逆ジオコーディング用）
    #[serde(default)]
    pub location: Option<Coordinates>,
}

impl PredictionResult {
    /// レスポンス本体から結果を構築
    ///
    /// `prediction` を優先し、無ければ `class`、どちらも無ければ "Unknown"。
    /// `confidence` が無い場合は 0。
    pub fn from_body(body: PredictResponseBody, location: Option<Coordinates>) -> Self {
        Self {
            prediction: body
                .prediction
                .filter(|p| !p.is_empty())
                .or(body.class_name.filter(|c| !c.is_empty()))
                .unwrap_or_else(|| "Unknown".to_string()),
            confidence: body.confidence.unwrap_or(0.0),
            all_predictions: body.all_predictions.unwrap_or_default(),
            weather: body.weather,
            location,
        }
    }
}

/// 過去のスキャン記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: i64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub farmer_id: Option<String>,
    pub prediction: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub all_predictions: BTreeMap<String, f64>,
    #[serde(default)]
    pub weather_data: Option<WeatherPayload>,
}

impl ScanRecord {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// 圃場の境界（GeoJSONはそのまま保持）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmBoundary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub farmer_id: Option<String>,
    #[serde(default)]
    pub farm_name: Option<String>,
    #[serde(default)]
    pub boundary_geojson: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `/api/history/farms` へのPOST本体
#[derive(Debug, Clone, Serialize)]
pub struct NewFarmBoundary {
    pub farmer_id: String,
    pub farm_name: String,
    pub boundary: serde_json::Value,
}

/// `{"status": ..., "data": [...]}` 形式のエンベロープ
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// 圃場作成レスポンス（IDは返らない場合がある）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatedEnvelope {
    pub status: Option<String>,
    pub message: Option<String>,
    pub id: Option<i64>,
    pub data: Option<FarmBoundary>,
}

impl CreatedEnvelope {
    /// サーバーが割り当てたID（トップレベル優先）
    pub fn server_id(&self) -> Option<i64> {
        self.id.or_else(|| self.data.as_ref().and_then(|d| d.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_prefers_prediction_over_class() {
        let body: PredictResponseBody = serde_json::from_str(
            r#"{"prediction": "Common Rust", "class": "Blight", "confidence": 0.82}"#,
        )
        .unwrap();
        let result = PredictionResult::from_body(body, None);
        assert_eq!(result.prediction, "Common Rust");
        assert_eq!(result.confidence, 0.82);
        assert!(result.all_predictions.is_empty());
        assert!(result.weather.is_none());
    }

    #[test]
    fn test_prediction_falls_back_to_class_then_unknown() {
        let body: PredictResponseBody =
            serde_json::from_str(r#"{"class": "Blight"}"#).unwrap();
        let result = PredictionResult::from_body(body, None);
        assert_eq!(result.prediction, "Blight");
        assert_eq!(result.confidence, 0.0);

        let body: PredictResponseBody = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(PredictionResult::from_body(body, None).prediction, "Unknown");
    }

    #[test]
    fn test_prediction_with_all_predictions_and_weather() {
        let body: PredictResponseBody = serde_json::from_str(
            r#"{
                "prediction": "Healthy",
                "confidence": 0.97,
                "all_predictions": {"Healthy": 0.97, "Common Rust": 0.02, "Blight": 0.01},
                "message": "Prediction successful",
                "weather": {"temperature": 24.5, "humidity": 71, "disease_risk": "Low"}
            }"#,
        )
        .unwrap();
        let location = Some(Coordinates::new(-1.29, 36.82));
        let result = PredictionResult::from_body(body, location);
        assert_eq!(result.all_predictions.len(), 3);
        assert_eq!(result.location, location);
        let weather = result.weather.expect("weather missing");
        assert_eq!(weather.snapshot().temperature, Some(24.5));
    }

    #[test]
    fn test_scan_record_deserialize_backend_row() {
        let json = r#"{
            "id": 7,
            "timestamp": "2026-10-19 14:05:00",
            "farmer_id": "demo_farmer",
            "latitude": -1.2921,
            "longitude": 36.8219,
            "prediction": "Gray Leaf Spot",
            "confidence": 0.91,
            "all_predictions": {},
            "weather_data": null,
            "image_url": null
        }"#;
        let scan: ScanRecord = serde_json::from_str(json).unwrap();
        assert_eq!(scan.id, 7);
        assert_eq!(scan.coordinates(), Some(Coordinates::new(-1.2921, 36.8219)));
        assert!(scan.weather_data.is_none());
    }

    #[test]
    fn test_scan_record_without_coordinates() {
        let scan: ScanRecord =
            serde_json::from_str(r#"{"id": 1, "prediction": "Healthy"}"#).unwrap();
        assert_eq!(scan.coordinates(), None);
        assert_eq!(scan.confidence, 0.0);
    }

    #[test]
    fn test_coordinates_from_str() {
        let c: Coordinates = "-1.2921, 36.8219".parse().unwrap();
        assert_eq!(c, Coordinates::new(-1.2921, 36.8219));
        assert!("abc".parse::<Coordinates>().is_err());
        assert!("95,10".parse::<Coordinates>().is_err());
        assert_eq!(c.to_string(), "-1.2921, 36.8219");
    }

    #[test]
    fn test_created_envelope_server_id() {
        let env: CreatedEnvelope =
            serde_json::from_str(r#"{"status": "ok", "message": "Farm boundary saved"}"#).unwrap();
        assert_eq!(env.server_id(), None);

        let env: CreatedEnvelope = serde_json::from_str(r#"{"status": "ok", "id": 12}"#).unwrap();
        assert_eq!(env.server_id(), Some(12));

        let env: CreatedEnvelope =
            serde_json::from_str(r#"{"data": {"id": 3, "boundary_geojson": {}}}"#).unwrap();
        assert_eq!(env.server_id(), Some(3));
    }

    #[test]
    fn test_list_envelope_missing_data() {
        let env: ListEnvelope<ScanRecord> = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(env.data.is_empty());
    }
}
