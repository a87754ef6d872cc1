//! 撮影のコツ（結果が出るまで表示）

use leptos::prelude::*;
use maize_scan_common::presentation::UPLOAD_TIPS;

#[component]
pub fn Tips() -> impl IntoView {
    view! {
        <div class="tips">
            <h3>"Tips for Best Results"</h3>
            <ul>
                {UPLOAD_TIPS.iter().map(|tip| view! { <li>{*tip}</li> }).collect_view()}
            </ul>
        </div>
    }
}
