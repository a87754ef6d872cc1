//! 病害判定リクエストの制御
//!
//! 画像選択 → 位置取得（ベストエフォート） → multipart送信 → レスポンス解釈 の流れと、
//! 画面側の状態（待機中・解析中・成功・失敗）を管理する。
//!
//! 自動リトライもキャンセルも行わない。新しい画像を選ぶと世代番号が進み、
//! 古い世代のレスポンスは届いても捨てられる。

use crate::api::{error_message_from_body, ApiClient, ApiTransport, HttpReply};
use crate::enrichment::Enrichment;
use crate::types::{Coordinates, PredictResponseBody, PredictionResult};
use crate::upload::SelectedImage;
use thiserror::Error;

/// 利用者に見せるエラー（Displayがそのまま表示文言）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("Please select an image first")]
    NoImageSelected,

    #[error("Analysis already in progress")]
    AlreadyAnalyzing,

    #[error("Cannot reach the Azure prediction model. Please try again later.")]
    ServiceUnavailable,

    #[error("{0}")]
    Rejected(String),

    #[error("Failed to analyze image. Please check your connection and try again.")]
    Connectivity,
}

/// `/api/disease/predict` に送る内容
#[derive(Debug, Clone, PartialEq)]
pub struct PredictForm {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub coordinates: Option<Coordinates>,
}

impl PredictForm {
    pub fn new(image: &SelectedImage, coordinates: Option<Coordinates>) -> Self {
        Self {
            file_name: image.file_name.clone(),
            mime_type: image.mime_type.clone(),
            bytes: image.bytes.clone(),
            coordinates,
        }
    }

    /// `file` 以外のテキスト項目
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        match self.coordinates {
            Some(c) => vec![
                ("latitude", c.latitude.to_string()),
                ("longitude", c.longitude.to_string()),
            ],
            None => Vec::new(),
        }
    }
}

/// 判定レスポンスを解釈
///
/// - 2xx + JSON → 結果
/// - 503 → サービス停止中
/// - その他 → 本文の error/detail、無ければステータスコード付きの文言
/// - JSONとして読めない2xx → 接続エラー扱い
pub fn interpret_predict_reply(
    reply: &HttpReply,
    location: Option<Coordinates>,
) -> Result<PredictionResult, DetectError> {
    if reply.is_success() {
        let body: PredictResponseBody = serde_json::from_str(&reply.body).map_err(|e| {
            tracing::warn!(error = %e, "unreadable prediction body");
            DetectError::Connectivity
        })?;
        return Ok(PredictionResult::from_body(body, location));
    }

    if reply.status == 503 {
        return Err(DetectError::ServiceUnavailable);
    }

    let message = error_message_from_body(&reply.body)
        .unwrap_or_else(|| format!("Prediction failed (HTTP {})", reply.status));
    Err(DetectError::Rejected(message))
}

/// 端末の位置を取得する手段
///
/// 待ち時間の上限は実装側が守る。失敗・未対応は Absent を返す。
#[allow(async_fn_in_trait)]
pub trait LocationProbe {
    async fn locate(&self) -> Enrichment<Coordinates>;
}

/// 位置を送らない
pub struct NoLocation;

impl LocationProbe for NoLocation {
    async fn locate(&self) -> Enrichment<Coordinates> {
        Enrichment::Absent
    }
}

/// 固定の位置を返す（CLIの --lat/--lon や設定値）
pub struct FixedLocation(pub Coordinates);

impl LocationProbe for FixedLocation {
    async fn locate(&self) -> Enrichment<Coordinates> {
        Enrichment::Present(self.0)
    }
}

/// 解析の進行状態
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DetectPhase {
    #[default]
    Idle,
    Analyzing,
    Done(PredictionResult),
    Failed(DetectError),
}

/// 解析開始時に払い出す引換券
#[derive(Debug, Clone)]
pub struct AnalyzeTicket {
    generation: u64,
    image: SelectedImage,
}

impl AnalyzeTicket {
    pub fn image(&self) -> &SelectedImage {
        &self.image
    }
}

/// 判定画面の状態
#[derive(Debug, Clone, Default)]
pub struct DetectSession {
    image: Option<SelectedImage>,
    phase: DetectPhase,
    result_open: bool,
    generation: u64,
}

impl DetectSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 画像を選択（以前の結果・エラーは消す）
    pub fn select(&mut self, image: SelectedImage) {
        self.image = Some(image);
        self.reset_outcome();
    }

    /// 画像も結果もすべて消す
    pub fn clear(&mut self) {
        self.image = None;
        self.reset_outcome();
    }

    fn reset_outcome(&mut self) {
        self.phase = DetectPhase::Idle;
        self.result_open = false;
        self.generation += 1;
    }

    /// 解析を開始
    ///
    /// 画像未選択なら入力エラーを表示状態にして返す。
    /// 解析中の二重実行は拒否する（状態は変えない）。
    pub fn begin(&mut self) -> Result<AnalyzeTicket, DetectError> {
        if self.is_busy() {
            return Err(DetectError::AlreadyAnalyzing);
        }
        let Some(image) = self.image.clone() else {
            self.phase = DetectPhase::Failed(DetectError::NoImageSelected);
            return Err(DetectError::NoImageSelected);
        };
        // 古い結果を先に消しておく
        self.phase = DetectPhase::Analyzing;
        self.result_open = false;
        Ok(AnalyzeTicket {
            generation: self.generation,
            image,
        })
    }

    /// 解析結果を反映。古い世代の結果なら捨てて false を返す
    pub fn complete(
        &mut self,
        ticket: AnalyzeTicket,
        outcome: Result<PredictionResult, DetectError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding stale prediction"
            );
            return false;
        }
        match outcome {
            Ok(result) => {
                self.phase = DetectPhase::Done(result);
                self.result_open = true;
            }
            Err(e) => {
                self.phase = DetectPhase::Failed(e);
            }
        }
        true
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.phase, DetectPhase::Failed(_)) {
            self.phase = DetectPhase::Idle;
        }
    }

    pub fn close_result(&mut self) {
        self.result_open = false;
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    pub fn phase(&self) -> &DetectPhase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, DetectPhase::Analyzing)
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match &self.phase {
            DetectPhase::Done(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DetectError> {
        match &self.phase {
            DetectPhase::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_result_open(&self) -> bool {
        self.result_open && self.result().is_some()
    }
}

/// 引換券の画像で判定を実行（位置は取れた場合のみ添付）
pub async fn run_prediction<T: ApiTransport, P: LocationProbe>(
    client: &ApiClient<T>,
    probe: &P,
    ticket: &AnalyzeTicket,
) -> Result<PredictionResult, DetectError> {
    let coordinates = probe.locate().await.into_option();
    let form = PredictForm::new(ticket.image(), coordinates);
    client.predict(&form).await
}
