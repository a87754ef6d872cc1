//! サブコマンドの処理本体

use crate::config::Config;
use crate::error::{MaizeScanError, Result};
use crate::image_file::load_image;
use crate::location::{LocationSource, TimedProbe};
use crate::report;
use crate::settings_file::JsonFileStore;
use crate::transport::ReqwestTransport;
use indicatif::{ProgressBar, ProgressStyle};
use maize_scan_common::api::ApiTransport;
use maize_scan_common::detect::{run_prediction, LocationProbe};
use maize_scan_common::map::{default_farm_name, plan_viewport, scan_markers, shape_from_geojson};
use maize_scan_common::{
    ApiClient, AppSettings, BoundaryShape, Coordinates, DetectSession, DiseaseCatalog, Endpoints,
    FarmLayer, HealthFilter, HistoryDisplay, HistoryState, MapStats, PredictionResult, ResultView,
    SelectedImage, SortKey,
};
use std::path::Path;
use std::time::Duration;

/// コマンド共通の実行環境
pub struct App<T> {
    pub config: Config,
    pub client: ApiClient<T>,
    pub catalog: DiseaseCatalog,
}

impl App<ReqwestTransport> {
    pub fn connect(config: Config, base_url_override: Option<String>) -> Result<Self> {
        let base_url = base_url_override.unwrap_or_else(|| config.api_base_url());
        tracing::info!(%base_url, "using prediction API");
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::new(config, ApiClient::new(Endpoints::new(&base_url), transport))?)
    }
}

impl<T: ApiTransport> App<T> {
    pub fn new(config: Config, client: ApiClient<T>) -> maize_scan_common::Result<Self> {
        Ok(Self {
            config,
            client,
            catalog: DiseaseCatalog::builtin()?,
        })
    }

    /// 画像1枚を判定（位置は取れた場合のみ添付）
    pub async fn detect<P: LocationProbe>(
        &self,
        image: SelectedImage,
        probe: &P,
    ) -> Result<PredictionResult> {
        let mut session = DetectSession::new();
        session.select(image);
        let ticket = session.begin()?;

        let spinner = spinner("Analyzing...");
        let outcome = run_prediction(&self.client, probe, &ticket).await;
        spinner.finish_and_clear();

        session.complete(ticket, outcome.clone());
        Ok(outcome?)
    }

    /// 判定結果の表示文（位置があれば地名を引く）
    pub async fn describe(&self, result: &PredictionResult) -> String {
        let place = match result.location {
            Some(at) => self.client.reverse_geocode(at).await.into_option(),
            None => None,
        };
        let view = ResultView::build(result, &self.catalog);
        report::render_result(&view, place.as_deref())
    }

    pub async fn history(
        &self,
        search: &str,
        filter: HealthFilter,
        sort: SortKey,
        limit: Option<u32>,
    ) -> Result<String> {
        let limit = limit.unwrap_or(self.config.history_limit);
        let scans = self
            .client
            .scans(&self.config.farmer_id, limit)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "history fetch failed");
                MaizeScanError::HistoryUnavailable
            })?;
        let state = HistoryState::Loaded(scans);
        let mut out = match state.display(search, filter, sort) {
            HistoryDisplay::Rows(rows) => report::render_history(&rows),
            HistoryDisplay::NoResults(message) => {
                format!("{}\nTry adjusting your search or filters\n", message)
            }
            HistoryDisplay::NoData => {
                return Ok("No scans recorded yet. Analyse a leaf image to start your history.\n".into());
            }
            HistoryDisplay::Error(message) => format!("{}\n", message),
            HistoryDisplay::Loading => String::new(),
        };
        if let Some(stats) = state.stats() {
            out.push('\n');
            out.push_str(&report::render_stats(&stats));
        }
        Ok(out)
    }

    pub async fn map(&self) -> Result<String> {
        // 圃場一覧の取得失敗は地図表示を止めない
        let (scans, farms) = tokio::join!(
            self.client.scans(&self.config.farmer_id, self.config.history_limit),
            self.client.farms(&self.config.farmer_id)
        );
        let scans = scans?;
        let farms = farms.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to fetch farms");
            Vec::new()
        });

        let viewport = plan_viewport(&scans, self.config.default_location);
        let farm_refs: Vec<_> = farms.iter().collect();
        Ok(report::render_map(
            &viewport,
            &MapStats::compute(&scans),
            &scan_markers(&scans),
            &farm_refs,
        ))
    }

    pub async fn farms(&self) -> Result<String> {
        let farms = self.client.farms(&self.config.farmer_id).await?;
        if farms.is_empty() {
            return Ok("No farm boundaries saved yet.\n".into());
        }
        Ok(farms
            .iter()
            .map(|f| format!("{}\n", report::farm_line(f)))
            .collect())
    }

    /// 圃場境界を追加（失敗時は追加を取り消す）
    pub async fn add_farm(&self, shape: &BoundaryShape, name: Option<String>) -> Result<String> {
        let mut layer = FarmLayer::new();
        match self.client.farms(&self.config.farmer_id).await {
            Ok(farms) => layer.load(farms),
            Err(e) => tracing::warn!(error = %e, "failed to fetch farms"),
        }
        let name = name.unwrap_or_else(|| default_farm_name(chrono::Local::now().time()));

        match layer
            .add_and_persist(&self.client, shape, &self.config.farmer_id, &name)
            .await
        {
            Ok(server_id) => Ok(format!(
                "✔ Saved \"{}\"{} ({} farms)\n",
                name,
                server_id.map(|id| format!(" as #{}", id)).unwrap_or_default(),
                layer.len()
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn weather(&self, at: Coordinates, days: u8) -> String {
        let (current, forecast) = tokio::join!(
            self.client.current_weather(at),
            self.client.forecast(at, days)
        );
        report::render_weather(current.into_option().as_ref(), forecast.into_option().as_ref())
    }
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// detect サブコマンド
pub async fn run_detect(
    app: &App<ReqwestTransport>,
    image_path: &Path,
    explicit: Option<Coordinates>,
    no_location: bool,
    json: bool,
) -> Result<()> {
    let image = load_image(image_path)?;
    println!("📷 {} ({} bytes)", image.file_name, image.size());

    let source = LocationSource::choose(explicit, app.config.default_location, no_location);
    let probe = TimedProbe::new(source, app.config.geolocation_timeout());
    let result = app.detect(image, &probe).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("\n{}", app.describe(&result).await);
        println!("Run `maize-scan detect <image>` to analyse another image.");
    }
    Ok(())
}

pub fn load_farm_shape(path: &Path) -> Result<BoundaryShape> {
    if !path.is_file() {
        return Err(MaizeScanError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(shape_from_geojson(&value)?)
}

/// config サブコマンド
pub fn run_config(
    mut config: Config,
    set_api_base_url: Option<String>,
    set_farmer_id: Option<String>,
    set_default_location: Option<Coordinates>,
    set_weather_widget: Option<bool>,
    show: bool,
) -> Result<()> {
    let store = JsonFileStore::new(Config::config_dir()?.join("settings.json"));
    let mut settings = AppSettings::load(&store);
    let mut changed = false;

    if let Some(url) = set_api_base_url {
        config.api_base_url = Some(url);
        changed = true;
    }
    if let Some(id) = set_farmer_id {
        config.farmer_id = id;
        changed = true;
    }
    if let Some(at) = set_default_location {
        config.default_location = Some(at);
        changed = true;
    }
    if changed {
        config.save()?;
        println!("✔ 設定を保存しました");
    }
    if let Some(visible) = set_weather_widget {
        settings.set_weather_widget_visible(visible, &store)?;
        println!("✔ 天気ウィジェット: {}", if visible { "表示" } else { "非表示" });
    }

    if show || (!changed && set_weather_widget.is_none()) {
        println!("設定:");
        println!("  APIベースURL: {}", config.api_base_url());
        println!("  農家ID: {}", config.farmer_id);
        println!("  履歴件数: {}", config.history_limit);
        println!("  位置取得の待ち時間: {}ms", config.geolocation_timeout_ms);
        println!("  リクエストタイムアウト: {}秒", config.request_timeout_seconds);
        println!(
            "  既定の位置: {}",
            config
                .default_location
                .map(|c| c.to_string())
                .unwrap_or_else(|| "未設定".into())
        );
        println!(
            "  天気ウィジェット: {}",
            if settings.weather_widget_visible { "表示" } else { "非表示" }
        );
    }
    Ok(())
}
