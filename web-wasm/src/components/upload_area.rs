//! アップロードエリアコンポーネント
//!
//! 解析中でも選び直せる。古い解析結果は `DetectSession` 側で捨てる。

use leptos::prelude::*;
use maize_scan_common::upload::validate_mime;
use maize_scan_common::SelectedImage;
use wasm_bindgen::prelude::*;
use web_sys::{DragEvent, File, FileReader, HtmlInputElement};

#[component]
pub fn UploadArea<FS, FR>(
    on_image_selected: FS,
    on_rejected: FR,
) -> impl IntoView
where
    FS: Fn(SelectedImage) + 'static + Clone + Send + Sync,
    FR: Fn(String) + 'static + Clone + Send + Sync,
{
    let (is_dragover, set_is_dragover) = signal(false);

    let handle_file = move |file: File| {
        // 読み込む前に種類だけ確認する
        if let Err(e) = validate_mime(&file.type_()) {
            on_rejected(e.to_string());
            return;
        }
        read_file(file, on_image_selected.clone(), on_rejected.clone());
    };

    let on_drop = {
        let handle_file = handle_file.clone();
        move |ev: DragEvent| {
            ev.prevent_default();
            set_is_dragover.set(false);
            let file = ev
                .data_transfer()
                .and_then(|dt| dt.files())
                .and_then(|files| files.get(0));
            if let Some(file) = file {
                handle_file(file);
            }
        }
    };

    let on_dragover = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragover.set(true);
    };

    let on_dragleave = move |_: DragEvent| {
        set_is_dragover.set(false);
    };

    let on_click = move |_| {
        if let Err(e) = open_file_dialog(handle_file.clone()) {
            web_sys::console::error_1(&e);
        }
    };

    view! {
        <div
            class=move || {
                if is_dragover.get() { "upload-area dragover" } else { "upload-area" }
            }
            on:drop=on_drop
            on:dragover=on_dragover
            on:dragleave=on_dragleave
            on:click=on_click
        >
            <div class="upload-icon">"🌽"</div>
            <p>"Drag & drop a maize leaf image, or click to choose"</p>
            <p class="text-muted">"JPEG, PNG and other image formats"</p>
        </div>
    }
}

/// ファイル選択ダイアログを開く（1枚のみ）
fn open_file_dialog<F>(on_file: F) -> Result<(), JsValue>
where
    F: Fn(File) + 'static,
{
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document unavailable"))?;
    let input: HtmlInputElement = document.create_element("input")?.dyn_into()?;
    input.set_type("file");
    input.set_accept("image/*");

    let picked = input.clone();
    let closure = Closure::once_into_js(move |_: web_sys::Event| {
        if let Some(file) = picked.files().and_then(|files| files.get(0)) {
            on_file(file);
        }
    });
    input.set_onchange(Some(closure.unchecked_ref()));
    input.click();
    Ok(())
}

fn read_file<FS, FR>(file: File, on_image_selected: FS, on_rejected: FR)
where
    FS: Fn(SelectedImage) + 'static,
    FR: Fn(String) + 'static,
{
    let reader = match FileReader::new() {
        Ok(reader) => reader,
        Err(e) => {
            web_sys::console::error_1(&e);
            return;
        }
    };

    let file_name = file.name();
    let reader_clone = reader.clone();
    let closure = Closure::once_into_js(move |_: web_sys::ProgressEvent| {
        let Some(data_url) = reader_clone.result().ok().and_then(|r| r.as_string()) else {
            on_rejected(format!("Could not read {}", file_name));
            return;
        };
        match SelectedImage::from_data_url(&file_name, &data_url) {
            Ok(image) => on_image_selected(image),
            Err(e) => on_rejected(e.to_string()),
        }
    });
    reader.set_onload(Some(closure.unchecked_ref()));

    if let Err(e) = reader.read_as_data_url(&file) {
        web_sys::console::error_1(&e);
    }
}
