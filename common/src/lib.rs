//! Maize Scan Common Library
//!
//! CLIとWeb(WASM)で共有される型とクライアントロジック。
//! HTTPの実処理は持たず、`ApiTransport` を実装した側から呼び出される。

pub mod api;
pub mod detect;
pub mod diseases;
pub mod enrichment;
pub mod error;
pub mod geocode;
pub mod history;
pub mod map;
pub mod optimistic;
pub mod presentation;
pub mod settings;
pub mod types;
pub mod upload;
pub mod weather;

pub use api::{ApiClient, ApiTransport, Endpoints, HttpReply, DEFAULT_API_BASE_URL, DEMO_FARMER_ID};
pub use detect::{DetectError, DetectPhase, DetectSession, LocationProbe, PredictForm};
pub use diseases::{DiseaseCatalog, DiseaseRecord, LookupMode, Severity};
pub use enrichment::Enrichment;
pub use error::{Error, Result};
pub use history::{HealthFilter, HistoryDisplay, HistoryState, HistoryStats, SortKey};
pub use map::{BoundaryShape, FarmLayer, MapMarker, MapStats, MapViewport};
pub use optimistic::{TentativeId, TentativeList};
pub use presentation::{confidence_percent, is_healthy, ConfidenceBand, ResultView};
pub use settings::{AppSettings, MemoryStore, SettingsStore};
pub use types::{Coordinates, FarmBoundary, PredictionResult, ScanRecord};
pub use upload::SelectedImage;
pub use weather::{Forecast, RiskLevel, WeatherSnapshot};
