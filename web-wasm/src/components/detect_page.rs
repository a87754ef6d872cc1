//! 病害判定ページ
//!
//! 画像選択 → 解析 → 結果パネル。状態は `DetectSession` が持ち、
//! ここはイベントを渡して表示するだけ。

use crate::app::use_services;
use crate::components::{
    detect_actions::DetectActions, progress_bar::AnalyzingIndicator, result_panel::ResultPanel,
    tips::Tips, upload_area::UploadArea,
};
use crate::geolocation::BrowserLocation;
use leptos::prelude::*;
use leptos::task::spawn_local;
use maize_scan_common::detect::run_prediction;
use maize_scan_common::{DetectSession, Enrichment, SelectedImage};

#[component]
pub fn DetectPage() -> impl IntoView {
    let services = use_services();
    let session = RwSignal::new(DetectSession::new());
    let (place, set_place) = signal(None::<String>);
    let (upload_error, set_upload_error) = signal(None::<String>);

    let is_busy = Signal::derive(move || session.with(|s| s.is_busy()));
    let has_image = Signal::derive(move || session.with(|s| s.image().is_some()));

    let on_image_selected = move |image: SelectedImage| {
        set_upload_error.set(None);
        set_place.set(None);
        session.update(|s| s.select(image));
    };

    let on_rejected = move |message: String| {
        set_upload_error.set(Some(message));
    };

    let on_analyze = move |_| {
        set_upload_error.set(None);
        let Some(Ok(ticket)) = session.try_update(|s| s.begin()) else {
            return;
        };
        let services = services.clone();
        spawn_local(async move {
            let outcome = run_prediction(&services.client, &BrowserLocation::default(), &ticket).await;
            if let Err(e) = &outcome {
                web_sys::console::error_1(&format!("Prediction error: {}", e).into());
            }
            let location = outcome.as_ref().ok().and_then(|r| r.location);
            let applied = session
                .try_update(|s| s.complete(ticket, outcome))
                .unwrap_or(false);

            // 地名は結果を出した後で補う
            let Some(at) = location.filter(|_| applied) else {
                return;
            };
            if let Enrichment::Present(name) = services.client.reverse_geocode(at).await {
                let still_current =
                    session.with_untracked(|s| s.result().and_then(|r| r.location)) == Some(at);
                if still_current {
                    set_place.set(Some(name));
                }
            }
        });
    };

    let on_clear = move |_| {
        set_upload_error.set(None);
        set_place.set(None);
        session.update(|s| s.clear());
    };

    view! {
        <div class="detect-page">
            <div class="page-header">
                <h2>"Disease Detection"</h2>
                <p class="text-muted">"Upload a clear photo of a maize leaf to detect potential diseases"</p>
            </div>

            <div class="card">
                <UploadArea
                    on_image_selected=on_image_selected
                    on_rejected=on_rejected
                />

                {move || {
                    session
                        .with(|s| s.image().map(|image| (image.preview_url.clone(), image.file_name.clone())))
                        .map(|(src, name)| {
                            view! {
                                <div class="image-preview">
                                    <img src=src alt=name.clone() />
                                    <p class="text-muted">{name}</p>
                                </div>
                            }
                        })
                }}

                <DetectActions
                    is_busy=is_busy
                    has_image=has_image
                    on_analyze=on_analyze
                    on_clear=on_clear
                />

                <Show when=move || is_busy.get()>
                    <AnalyzingIndicator />
                </Show>

                {move || {
                    let message = upload_error
                        .get()
                        .or_else(|| session.with(|s| s.error().map(|e| e.to_string())))?;
                    Some(view! {
                        <div class="error-message">
                            <h4>"Error"</h4>
                            <p>{message}</p>
                            <button
                                class="btn-icon"
                                on:click=move |_| {
                                    set_upload_error.set(None);
                                    session.update(|s| s.dismiss_error());
                                }
                            >
                                "×"
                            </button>
                        </div>
                    })
                }}
            </div>

            <Show when=move || session.with(|s| s.result().is_none())>
                <Tips />
            </Show>

            {move || {
                let result = session.with(|s| {
                    s.is_result_open().then(|| s.result().cloned()).flatten()
                })?;
                let image_url = session.with_untracked(|s| s.image().map(|i| i.preview_url.clone()));
                Some(view! {
                    <ResultPanel
                        result=result
                        image_url=image_url
                        place=place
                        on_close=move |_| session.update(|s| s.close_result())
                        on_reset=on_clear
                    />
                })
            }}
        </div>
    }
}
