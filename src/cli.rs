use clap::{Parser, Subcommand};
use maize_scan_common::{Coordinates, HealthFilter, SortKey};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "maize-scan")]
#[command(about = "トウモロコシ葉の病害判定クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// APIのベースURL（環境変数・設定ファイルより優先）
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 葉の画像を送信して病害を判定
    Detect {
        /// 画像ファイル
        #[arg(required = true)]
        image: PathBuf,

        /// 緯度
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// 経度
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// 位置情報を送らない
        #[arg(long)]
        no_location: bool,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// スキャン履歴を表示
    History {
        /// 病名で検索（部分一致）
        #[arg(short, long, default_value = "")]
        search: String,

        /// 絞り込み (all/diseased/healthy)
        #[arg(short, long, default_value = "all")]
        filter: HealthFilter,

        /// 並び順 (date/confidence/condition)
        #[arg(long, default_value = "date")]
        sort: SortKey,

        /// 取得件数（省略時は設定値）
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// 地図ビュー（表示範囲・マーカー・圃場境界）
    Map,

    /// 圃場境界の管理
    Farms {
        #[command(subcommand)]
        action: FarmAction,
    },

    /// 現在の天気と病害リスク
    Weather {
        /// 地点 "緯度,経度"（省略時は設定の default_location）
        #[arg(long, allow_hyphen_values = true)]
        at: Option<Coordinates>,

        /// 予報日数
        #[arg(short, long, default_value = "3")]
        days: u8,
    },

    /// 設定を表示/編集
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_api_base_url: Option<String>,

        /// 農家IDを設定
        #[arg(long)]
        set_farmer_id: Option<String>,

        /// 既定の位置を設定 "緯度,経度"
        #[arg(long, allow_hyphen_values = true)]
        set_default_location: Option<Coordinates>,

        /// 天気ウィジェットの表示 (true/false)
        #[arg(long)]
        set_weather_widget: Option<bool>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum FarmAction {
    /// 保存済みの圃場を一覧
    List,

    /// GeoJSONファイルから圃場境界を追加
    Add {
        /// Polygon の Feature またはジオメトリ
        #[arg(required = true)]
        geojson: PathBuf,

        /// 圃場名（省略時は "Farm Plot HH:MM:SS"）
        #[arg(short, long)]
        name: Option<String>,
    },

    /// 対角の2点から長方形の圃場を追加
    AddRect {
        /// 1点目 "緯度,経度"
        #[arg(long, allow_hyphen_values = true)]
        from: Coordinates,

        /// 2点目 "緯度,経度"
        #[arg(long, allow_hyphen_values = true)]
        to: Coordinates,

        /// 圃場名
        #[arg(short, long)]
        name: Option<String>,
    },
}

impl Commands {
    /// --lat/--lon から座標を作る
    pub fn explicit_location(lat: Option<f64>, lon: Option<f64>) -> Option<Coordinates> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}
