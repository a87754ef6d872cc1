//! バックエンドAPIクライアント（CLI/WASM共通）
//!
//! HTTPの実処理は `ApiTransport` に任せ、URL組み立てとレスポンス解釈だけをここで行う。
//! CLIは reqwest、WASMは fetch で実装する。

use crate::detect::{interpret_predict_reply, DetectError, PredictForm};
use crate::enrichment::Enrichment;
use crate::error::{Error, Result};
use crate::geocode::{parse_reverse_geocode, reverse_geocode_url};
use crate::types::{
    Coordinates, CreatedEnvelope, FarmBoundary, ListEnvelope, NewFarmBoundary, PredictionResult,
    ScanRecord,
};
use crate::weather::{CurrentWeatherEnvelope, Forecast, WeatherSnapshot};
use serde::de::DeserializeOwned;

/// APIのデフォルトベースURL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// 利用者登録が無いため全員この農家IDで読み書きする
pub const DEMO_FARMER_ID: &str = "demo_farmer";

/// HTTPレスポンス（ステータスと本文のみ）
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// 2xx以外をエラーに変換（本文の detail/error を優先）
    fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = error_message_from_body(&self.body)
            .unwrap_or_else(|| format!("Request failed (HTTP {})", self.status));
        Err(Error::Status {
            status: self.status,
            message,
        })
    }
}

/// エラー本文から人が読めるメッセージを取り出す（`error` → `detail` の順）
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "detail"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// HTTP送受信の抽象
///
/// 接続失敗などでレスポンスが得られない場合は `Error::Transport` を返す。
/// ステータスコードの解釈は呼び出し側で行うため、4xx/5xxもOkで返すこと。
#[allow(async_fn_in_trait)]
pub trait ApiTransport {
    async fn get(&self, url: &str) -> Result<HttpReply>;

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply>;

    async fn post_multipart(&self, url: &str, form: &PredictForm) -> Result<HttpReply>;
}

/// エンドポイントURLの組み立て
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn predict(&self) -> String {
        format!("{}/api/disease/predict", self.base_url)
    }

    pub fn weather_current(&self, at: Coordinates) -> String {
        format!(
            "{}/api/weather/current?latitude={}&longitude={}",
            self.base_url, at.latitude, at.longitude
        )
    }

    pub fn weather_forecast(&self, at: Coordinates, days: u8) -> String {
        format!(
            "{}/api/weather/forecast?latitude={}&longitude={}&days={}",
            self.base_url, at.latitude, at.longitude, days
        )
    }

    pub fn history_scans(&self, farmer_id: &str, limit: u32) -> String {
        format!(
            "{}/api/history/scans?farmer_id={}&limit={}",
            self.base_url,
            encode_component(farmer_id),
            limit
        )
    }

    pub fn farms_for(&self, farmer_id: &str) -> String {
        format!(
            "{}/api/history/farms/{}",
            self.base_url,
            encode_component(farmer_id)
        )
    }

    pub fn farms_create(&self) -> String {
        format!("{}/api/history/farms", self.base_url)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

/// URLのパス/クエリ用にパーセントエンコード（RFC 3986 unreserved以外）
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// APIクライアント
pub struct ApiClient<T> {
    endpoints: Endpoints,
    transport: T,
}

impl<T: ApiTransport> ApiClient<T> {
    pub fn new(endpoints: Endpoints, transport: T) -> Self {
        Self {
            endpoints,
            transport,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 病害判定
    ///
    /// 失敗はすべて利用者向けの `DetectError` に変換して返す。
    pub async fn predict(&self, form: &PredictForm) -> std::result::Result<PredictionResult, DetectError> {
        let url = self.endpoints.predict();
        tracing::debug!(%url, file = %form.file_name, located = form.coordinates.is_some(), "submitting prediction");
        let reply = match self.transport.post_multipart(&url, form).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "prediction request failed");
                return Err(DetectError::Connectivity);
            }
        };
        tracing::debug!(status = reply.status, "prediction reply");
        interpret_predict_reply(&reply, form.coordinates)
    }

    /// 現在の天気（取れなければAbsent）
    pub async fn current_weather(&self, at: Coordinates) -> Enrichment<WeatherSnapshot> {
        let url = self.endpoints.weather_current(at);
        let result = async {
            let reply = self.transport.get(&url).await?.ensure_success()?;
            let envelope: CurrentWeatherEnvelope = reply.json()?;
            Ok::<_, Error>(envelope.data)
        }
        .await;
        Enrichment::from_result("weather/current", result)
    }

    /// 数日分の予報（取れなければAbsent）
    pub async fn forecast(&self, at: Coordinates, days: u8) -> Enrichment<Forecast> {
        let url = self.endpoints.weather_forecast(at, days);
        let result = async {
            let reply = self.transport.get(&url).await?.ensure_success()?;
            reply.json::<Forecast>()
        }
        .await;
        Enrichment::from_result("weather/forecast", result)
    }

    /// スキャン履歴
    pub async fn scans(&self, farmer_id: &str, limit: u32) -> Result<Vec<ScanRecord>> {
        let url = self.endpoints.history_scans(farmer_id, limit);
        let reply = self.transport.get(&url).await?.ensure_success()?;
        let envelope: ListEnvelope<ScanRecord> = reply.json()?;
        tracing::debug!(count = envelope.data.len(), "scan history loaded");
        Ok(envelope.data)
    }

    /// 保存済みの圃場境界
    pub async fn farms(&self, farmer_id: &str) -> Result<Vec<FarmBoundary>> {
        let url = self.endpoints.farms_for(farmer_id);
        let reply = self.transport.get(&url).await?.ensure_success()?;
        let envelope: ListEnvelope<FarmBoundary> = reply.json()?;
        Ok(envelope.data)
    }

    /// 圃場境界を保存
    pub async fn create_farm(&self, farm: &NewFarmBoundary) -> Result<CreatedEnvelope> {
        let url = self.endpoints.farms_create();
        let body = serde_json::to_value(farm)?;
        let reply = self.transport.post_json(&url, &body).await?.ensure_success()?;
        // 本文が空やJSON以外でも保存自体は成功している
        Ok(reply.json().unwrap_or_default())
    }

    /// 座標から地名を引く（Nominatim）
    pub async fn reverse_geocode(&self, at: Coordinates) -> Enrichment<String> {
        let url = reverse_geocode_url(at);
        let result = async {
            let reply = self.transport.get(&url).await?.ensure_success()?;
            parse_reverse_geocode(&reply.body)
        }
        .await;
        Enrichment::from_result("reverse-geocode", result)
    }
}
