//! 信頼度バーと解析中表示

use leptos::prelude::*;

/// 信頼度バー（健康なら緑、それ以外はオレンジ）
#[component]
pub fn ConfidenceBar(percent: u8, accent: &'static str) -> impl IntoView {
    view! {
        <div class="progress-container">
            <div class="progress-bar">
                <div class=format!("progress-fill {}", accent) style=format!("width: {}%", percent) />
            </div>
            <p class="progress-text">{format!("{}%", percent)}</p>
        </div>
    }
}

/// 解析中の表示
#[component]
pub fn AnalyzingIndicator() -> impl IntoView {
    view! {
        <div class="progress-container analyzing">
            <div class="spinner" />
            <p class="progress-text">"Analyzing image..."</p>
        </div>
    }
}
