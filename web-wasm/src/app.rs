//! メインアプリケーションコンポーネント

use crate::api::fetch::FetchTransport;
use crate::components::{
    detect_page::DetectPage, header::Header, history_page::HistoryPage, map_view::MapPage,
    weather_widget::WeatherWidget,
};
use leptos::prelude::*;
use maize_scan_common::{ApiClient, DiseaseCatalog, Endpoints, DEFAULT_API_BASE_URL};
use std::sync::Arc;

/// ビルド時に `MAIZE_SCAN_API_BASE_URL` が設定されていればそちらを使う
pub fn api_base_url() -> &'static str {
    option_env!("MAIZE_SCAN_API_BASE_URL")
        .filter(|url| !url.trim().is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL)
}

/// 画面共通で使うクライアントと病害カタログ
pub struct Services {
    pub client: ApiClient<FetchTransport>,
    pub catalog: DiseaseCatalog,
}

/// コンテキストから共通サービスを取得
pub fn use_services() -> Arc<Services> {
    expect_context::<Arc<Services>>()
}

/// 表示中のページ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Page {
    #[default]
    Detect,
    History,
    Map,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Detect, Page::History, Page::Map];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Detect => "Detect",
            Page::History => "History",
            Page::Map => "Map",
        }
    }
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let catalog = match DiseaseCatalog::builtin() {
        Ok(catalog) => catalog,
        Err(e) => {
            web_sys::console::error_1(&format!("disease catalog: {}", e).into());
            return view! {
                <div class="container">
                    <p class="error-message">"Failed to load disease information."</p>
                </div>
            }
            .into_any();
        }
    };

    provide_context(Arc::new(Services {
        client: ApiClient::new(Endpoints::new(api_base_url()), FetchTransport),
        catalog,
    }));

    let (page, set_page) = signal(Page::default());

    view! {
        <div class="container">
            <Header page=page set_page=set_page />

            {move || match page.get() {
                Page::Detect => view! { <DetectPage /> }.into_any(),
                Page::History => view! { <HistoryPage /> }.into_any(),
                Page::Map => view! { <MapPage /> }.into_any(),
            }}

            <WeatherWidget />
        </div>
    }
    .into_any()
}
