//! 地図表示の計画
//!
//! - スキャン地点のマーカー（健康: 緑、それ以外: オレンジ）
//! - 圃場境界（描画 → 楽観的に追加 → 保存、失敗時は取り消し）
//! - 表示中心の決定（最初のスキャン → 端末位置 → ナイロビ）

use crate::api::{ApiClient, ApiTransport};
use crate::error::{Error, Result};
use crate::history::format_scan_date;
use crate::optimistic::{TentativeId, TentativeList};
use crate::presentation::{confidence_percent, is_healthy};
use crate::types::{Coordinates, FarmBoundary, NewFarmBoundary, ScanRecord};
use chrono::NaiveTime;
use serde_json::{json, Value};

pub const HEALTHY_MARKER_COLOR: &str = "#10b981";
pub const DISEASED_MARKER_COLOR: &str = "#f97316";
pub const BOUNDARY_COLOR: &str = "#10b981";

/// 圃場境界の保存に失敗したときの通知
pub const FARM_SAVE_FAILED_MESSAGE: &str = "Failed to save farm boundary. Please try again.";

/// 初期表示の中心（ナイロビ）
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    latitude: -1.2921,
    longitude: 36.8219,
};
pub const DEFAULT_ZOOM: u8 = 13;
/// スキャン地点・端末位置に寄せたときのズーム
pub const FOCUSED_ZOOM: u8 = 16;

/// 地図の表示範囲
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapViewport {
    pub fn focused(center: Coordinates) -> Self {
        Self {
            center,
            zoom: FOCUSED_ZOOM,
        }
    }

    /// 座標を表示領域内のピクセル位置に変換（Webメルカトル、タイル256px）
    pub fn project(&self, at: Coordinates, width: f64, height: f64) -> (f64, f64) {
        let (cx, cy) = mercator(self.center, self.zoom);
        let (x, y) = mercator(at, self.zoom);
        (x - cx + width / 2.0, y - cy + height / 2.0)
    }

    /// ピクセル位置を座標に戻す（`project` の逆変換）
    pub fn unproject(&self, x: f64, y: f64, width: f64, height: f64) -> Coordinates {
        let world = world_size(self.zoom);
        let (cx, cy) = mercator(self.center, self.zoom);
        let wx = cx + x - width / 2.0;
        let wy = cy + y - height / 2.0;
        let longitude = wx / world * 360.0 - 180.0;
        let n = std::f64::consts::PI * (1.0 - 2.0 * wy / world);
        let latitude = n.sinh().atan().to_degrees();
        Coordinates::new(latitude, longitude)
    }
}

fn world_size(zoom: u8) -> f64 {
    256.0 * f64::powi(2.0, zoom as i32)
}

fn mercator(at: Coordinates, zoom: u8) -> (f64, f64) {
    let world = world_size(zoom);
    let lat = at.latitude.clamp(-85.0511, 85.0511).to_radians();
    let x = (at.longitude + 180.0) / 360.0 * world;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * world;
    (x, y)
}

/// スキャンがあれば最初の地点に寄せる。無ければ端末位置が必要
pub fn viewport_from_scans(scans: &[ScanRecord]) -> Option<MapViewport> {
    scans
        .iter()
        .find_map(ScanRecord::coordinates)
        .map(MapViewport::focused)
}

/// 表示中心を決める（スキャン → 端末位置 → 既定）
pub fn plan_viewport(scans: &[ScanRecord], located: Option<Coordinates>) -> MapViewport {
    viewport_from_scans(scans)
        .or_else(|| located.map(MapViewport::focused))
        .unwrap_or_default()
}

/// スキャン地点のマーカー
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub scan_id: i64,
    pub position: Coordinates,
    pub healthy: bool,
    pub label: String,
    pub confidence_percent: u8,
    pub date: String,
}

impl MapMarker {
    pub fn color(&self) -> &'static str {
        if self.healthy {
            HEALTHY_MARKER_COLOR
        } else {
            DISEASED_MARKER_COLOR
        }
    }

    /// ポップアップの3行（病名・信頼度・日付）
    pub fn popup_lines(&self) -> [String; 3] {
        [
            self.label.clone(),
            format!("Confidence: {}%", self.confidence_percent),
            self.date.clone(),
        ]
    }
}

/// 位置を持つスキャンだけをマーカーにする
pub fn scan_markers(scans: &[ScanRecord]) -> Vec<MapMarker> {
    scans
        .iter()
        .filter_map(|scan| {
            let position = scan.coordinates()?;
            Some(MapMarker {
                scan_id: scan.id,
                position,
                healthy: is_healthy(&scan.prediction),
                label: scan.prediction.clone(),
                confidence_percent: confidence_percent(scan.confidence),
                date: format_scan_date(&scan.timestamp),
            })
        })
        .collect()
}

/// 地図ページ上部の件数表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapStats {
    pub healthy_zones: usize,
    pub risk_spots: usize,
}

impl MapStats {
    pub fn compute(scans: &[ScanRecord]) -> Self {
        let healthy_zones = scans.iter().filter(|s| is_healthy(&s.prediction)).count();
        Self {
            healthy_zones,
            risk_spots: scans.len() - healthy_zones,
        }
    }
}

/// 描画された図形
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryShape {
    Polygon(Vec<Coordinates>),
    /// 対角の2点
    Rectangle(Coordinates, Coordinates),
}

impl BoundaryShape {
    /// 頂点列（閉じていない）
    pub fn vertices(&self) -> Vec<Coordinates> {
        match self {
            BoundaryShape::Polygon(points) => {
                let mut points = points.clone();
                if points.len() > 1 && points.first() == points.last() {
                    points.pop();
                }
                points
            }
            BoundaryShape::Rectangle(a, b) => {
                let (south, north) = min_max(a.latitude, b.latitude);
                let (west, east) = min_max(a.longitude, b.longitude);
                vec![
                    Coordinates::new(south, west),
                    Coordinates::new(south, east),
                    Coordinates::new(north, east),
                    Coordinates::new(north, west),
                ]
            }
        }
    }

    /// GeoJSON Feature に変換（リングは自動で閉じる）
    ///
    /// # Errors
    /// 異なる頂点が3つ未満、または座標が範囲外の場合
    pub fn to_geojson(&self) -> Result<Value> {
        let vertices = self.vertices();
        for v in &vertices {
            if !(-90.0..=90.0).contains(&v.latitude) || !(-180.0..=180.0).contains(&v.longitude) {
                return Err(Error::InvalidBoundary(format!("vertex out of range: {}", v)));
            }
        }
        let mut distinct: Vec<Coordinates> = Vec::new();
        for v in &vertices {
            if !distinct.contains(v) {
                distinct.push(*v);
            }
        }
        if distinct.len() < 3 {
            return Err(Error::InvalidBoundary(format!(
                "a boundary needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }

        let mut ring: Vec<[f64; 2]> = vertices.iter().map(|v| [v.longitude, v.latitude]).collect();
        ring.push(ring[0]);
        Ok(json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [ring],
            }
        }))
    }
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// GeoJSON（Feature または Polygon ジオメトリ）から外周の頂点を読む
pub fn shape_from_geojson(value: &Value) -> Result<BoundaryShape> {
    let geometry = match value.get("type").and_then(Value::as_str) {
        Some("Feature") => value
            .get("geometry")
            .ok_or_else(|| Error::InvalidBoundary("Feature without geometry".into()))?,
        Some("Polygon") => value,
        other => {
            return Err(Error::InvalidBoundary(format!(
                "expected a Polygon feature, got {}",
                other.unwrap_or("nothing")
            )))
        }
    };
    if geometry.get("type").and_then(Value::as_str) != Some("Polygon") {
        return Err(Error::InvalidBoundary("geometry is not a Polygon".into()));
    }
    let ring = geometry
        .get("coordinates")
        .and_then(|c| c.get(0))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidBoundary("Polygon without an outer ring".into()))?;

    let points = ring
        .iter()
        .map(|position| {
            let lon = position.get(0).and_then(Value::as_f64);
            let lat = position.get(1).and_then(Value::as_f64);
            match (lat, lon) {
                (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
                _ => Err(Error::InvalidBoundary(format!("bad position: {}", position))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(BoundaryShape::Polygon(points))
}

/// 既定の圃場名（例: "Farm Plot 14:05:09"）
pub fn default_farm_name(at: NaiveTime) -> String {
    format!("Farm Plot {}", at.format("%H:%M:%S"))
}

/// 地図上の圃場境界
#[derive(Debug, Clone, Default)]
pub struct FarmLayer {
    farms: TentativeList<FarmBoundary>,
}

impl FarmLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// サーバーから読み込んだ一覧で置き換え
    pub fn load(&mut self, farms: Vec<FarmBoundary>) {
        self.farms
            .replace_confirmed(farms.into_iter().map(|f| {
                let id = f.id;
                (f, id)
            }));
    }

    pub fn farms(&self) -> impl Iterator<Item = &FarmBoundary> {
        self.farms.items()
    }

    pub fn len(&self) -> usize {
        self.farms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.farms.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.farms.pending_count()
    }

    /// 描画した境界を一覧に先に出し、保存リクエストの本体を返す
    pub fn begin_add(
        &mut self,
        shape: &BoundaryShape,
        farmer_id: &str,
        farm_name: &str,
    ) -> Result<(TentativeId, NewFarmBoundary)> {
        let geojson = shape.to_geojson()?;
        let id = self.farms.apply(FarmBoundary {
            id: None,
            farmer_id: Some(farmer_id.to_string()),
            farm_name: Some(farm_name.to_string()),
            boundary_geojson: geojson.clone(),
            created_at: None,
        });
        let request = NewFarmBoundary {
            farmer_id: farmer_id.to_string(),
            farm_name: farm_name.to_string(),
            boundary: geojson,
        };
        Ok((id, request))
    }

    /// 保存成功。サーバーIDが返っていれば反映する
    pub fn confirm(&mut self, id: TentativeId, server_id: Option<i64>) {
        if self.farms.confirm(id, server_id) {
            tracing::debug!(?server_id, "farm boundary confirmed");
        } else {
            tracing::warn!(?id, "confirmed boundary no longer listed");
        }
    }

    /// 保存失敗。追加分を取り消して通知文言を返す
    pub fn rollback(&mut self, id: TentativeId) -> &'static str {
        if self.farms.revert(id).is_none() {
            tracing::warn!(?id, "rollback target already gone");
        }
        FARM_SAVE_FAILED_MESSAGE
    }

    /// 追加から保存までを通しで行う（CLI用）
    pub async fn add_and_persist<T: ApiTransport>(
        &mut self,
        client: &ApiClient<T>,
        shape: &BoundaryShape,
        farmer_id: &str,
        farm_name: &str,
    ) -> std::result::Result<Option<i64>, FarmSaveError> {
        let (id, request) = self
            .begin_add(shape, farmer_id, farm_name)
            .map_err(FarmSaveError::Invalid)?;
        match client.create_farm(&request).await {
            Ok(created) => {
                let server_id = created.server_id();
                self.confirm(id, server_id);
                Ok(server_id)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save farm boundary");
                Err(FarmSaveError::RolledBack(self.rollback(id)))
            }
        }
    }
}

/// 圃場保存の失敗
#[derive(thiserror::Error, Debug)]
pub enum FarmSaveError {
    /// 図形が不正（一覧には追加していない）
    #[error("{0}")]
    Invalid(Error),

    /// 保存に失敗し、追加を取り消した
    #[error("{0}")]
    RolledBack(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::ScriptedTransport;
    use crate::api::{Endpoints, HttpReply};

    fn scan(id: i64, prediction: &str, at: Option<(f64, f64)>) -> ScanRecord {
        ScanRecord {
            id,
            timestamp: "2026-10-19 14:05:00".into(),
            farmer_id: None,
            prediction: prediction.into(),
            confidence: 0.876,
            latitude: at.map(|a| a.0),
            longitude: at.map(|a| a.1),
            all_predictions: Default::default(),
            weather_data: None,
        }
    }

    fn square() -> BoundaryShape {
        BoundaryShape::Polygon(vec![
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.0, 1.0),
            Coordinates::new(1.0, 1.0),
        ])
    }

    fn existing_farm() -> FarmBoundary {
        FarmBoundary {
            id: Some(1),
            farmer_id: Some("demo_farmer".into()),
            farm_name: Some("North".into()),
            boundary_geojson: square().to_geojson().unwrap(),
            created_at: None,
        }
    }

    #[test]
    fn test_viewport_priority() {
        let scans = vec![scan(1, "Healthy", None), scan(2, "Blight", Some((0.5, 35.0)))];
        let here = Coordinates::new(1.0, 36.0);

        assert_eq!(
            plan_viewport(&scans, Some(here)),
            MapViewport::focused(Coordinates::new(0.5, 35.0))
        );
        assert_eq!(plan_viewport(&[], Some(here)), MapViewport { center: here, zoom: 16 });
        assert_eq!(
            plan_viewport(&[], None),
            MapViewport {
                center: Coordinates::new(-1.2921, 36.8219),
                zoom: 13
            }
        );
    }

    #[test]
    fn test_markers_and_stats() {
        let scans = vec![
            scan(1, "Healthy", Some((0.1, 36.0))),
            scan(2, "Common Rust", Some((0.2, 36.1))),
            scan(3, "Blight", None),
        ];
        let markers = scan_markers(&scans);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].color(), "#10b981");
        assert_eq!(markers[1].color(), "#f97316");
        assert_eq!(
            markers[1].popup_lines(),
            ["Common Rust".to_string(), "Confidence: 88%".to_string(), "19 Oct 2026".to_string()]
        );

        let stats = MapStats::compute(&scans);
        assert_eq!(stats, MapStats { healthy_zones: 1, risk_spots: 2 });
    }

    #[test]
    fn test_polygon_ring_is_closed() {
        let geojson = square().to_geojson().unwrap();
        let ring = geojson["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[3]);
        assert_eq!(ring[1], json!([1.0, 0.0]));
    }

    #[test]
    fn test_already_closed_polygon_is_not_doubled() {
        let mut points = square().vertices();
        points.push(points[0]);
        let geojson = BoundaryShape::Polygon(points).to_geojson().unwrap();
        assert_eq!(geojson["geometry"]["coordinates"][0].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_degenerate_boundaries_rejected() {
        let line = BoundaryShape::Polygon(vec![
            Coordinates::new(0.0, 0.0),
            Coordinates::new(1.0, 1.0),
            Coordinates::new(0.0, 0.0),
            Coordinates::new(1.0, 1.0),
        ]);
        assert!(matches!(line.to_geojson(), Err(Error::InvalidBoundary(_))));

        let flat = BoundaryShape::Rectangle(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0));
        assert!(flat.to_geojson().is_err());

        let outside = BoundaryShape::Polygon(vec![
            Coordinates::new(95.0, 0.0),
            Coordinates::new(0.0, 1.0),
            Coordinates::new(1.0, 1.0),
        ]);
        assert!(outside.to_geojson().is_err());
    }

    #[test]
    fn test_rectangle_from_any_corners() {
        let rect = BoundaryShape::Rectangle(Coordinates::new(1.0, 2.0), Coordinates::new(0.0, 0.0));
        assert_eq!(
            rect.vertices(),
            vec![
                Coordinates::new(0.0, 0.0),
                Coordinates::new(0.0, 2.0),
                Coordinates::new(1.0, 2.0),
                Coordinates::new(1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_shape_from_geojson_roundtrip_input() {
        let geojson = square().to_geojson().unwrap();
        let shape = shape_from_geojson(&geojson).unwrap();
        assert_eq!(shape.vertices(), square().vertices());
        assert!(shape_from_geojson(&geojson["geometry"]).is_ok());
        assert!(shape_from_geojson(&json!({"type": "Point", "coordinates": [0, 0]})).is_err());
    }

    #[test]
    fn test_default_farm_name() {
        let at = NaiveTime::from_hms_opt(9, 5, 7).unwrap();
        assert_eq!(default_farm_name(at), "Farm Plot 09:05:07");
    }

    #[test]
    fn test_projection_centers_viewport() {
        let vp = MapViewport::default();
        let (x, y) = vp.project(vp.center, 800.0, 600.0);
        assert!((x - 400.0).abs() < 1e-6);
        assert!((y - 300.0).abs() < 1e-6);

        let (east, _) = vp.project(Coordinates::new(-1.2921, 36.9), 800.0, 600.0);
        assert!(east > 400.0);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = MapViewport::focused(Coordinates::new(0.5, 35.2));
        let at = Coordinates::new(0.5012, 35.2034);
        let (x, y) = vp.project(at, 640.0, 480.0);
        let back = vp.unproject(x, y, 640.0, 480.0);
        assert!((back.latitude - at.latitude).abs() < 1e-9);
        assert!((back.longitude - at.longitude).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_save_restores_previous_list() {
        let client = ApiClient::new(
            Endpoints::default(),
            ScriptedTransport::with(vec![Ok(HttpReply::new(500, r#"{"detail": "Failed to save farm boundary"}"#))]),
        );
        let mut layer = FarmLayer::new();
        layer.load(vec![existing_farm()]);
        let before: Vec<FarmBoundary> = layer.farms().cloned().collect();

        let err = layer
            .add_and_persist(&client, &square(), "demo_farmer", "Farm Plot 10:00:00")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to save farm boundary. Please try again.");
        assert_eq!(layer.farms().cloned().collect::<Vec<_>>(), before);
        assert_eq!(layer.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_save_keeps_boundary() {
        let client = ApiClient::new(
            Endpoints::default(),
            ScriptedTransport::with(vec![Ok(HttpReply::new(200, r#"{"status": "ok", "message": "Farm boundary saved"}"#))]),
        );
        let mut layer = FarmLayer::new();
        let server_id = layer
            .add_and_persist(&client, &square(), "demo_farmer", "South")
            .await
            .unwrap();
        assert_eq!(server_id, None);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.pending_count(), 0);
        let body = &client.transport().bodies.borrow()[0];
        assert_eq!(body["farm_name"], "South");
        assert_eq!(body["boundary"]["geometry"]["type"], "Polygon");
    }

    #[test]
    fn test_invalid_shape_is_not_added() {
        let mut layer = FarmLayer::new();
        let line = BoundaryShape::Polygon(vec![Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0)]);
        assert!(layer.begin_add(&line, "demo_farmer", "x").is_err());
        assert!(layer.is_empty());
    }
}
