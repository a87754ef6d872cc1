//! fetch APIによる `ApiTransport` 実装

use js_sys::{Array, Uint8Array};
use maize_scan_common::api::{ApiTransport, HttpReply};
use maize_scan_common::{Error, PredictForm, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, FormData, Request, RequestInit, RequestMode, Response};

/// ブラウザの fetch で送受信する
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl ApiTransport for FetchTransport {
    async fn get(&self, url: &str) -> Result<HttpReply> {
        send(url, "GET", None, None).await.map_err(transport_error)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply> {
        let body = JsValue::from_str(&serde_json::to_string(body)?);
        send(url, "POST", Some(&body), Some("application/json"))
            .await
            .map_err(transport_error)
    }

    async fn post_multipart(&self, url: &str, form: &PredictForm) -> Result<HttpReply> {
        let data = build_form(form).map_err(transport_error)?;
        // Content-Type は boundary 付きでブラウザが設定する
        send(url, "POST", Some(&data), None)
            .await
            .map_err(transport_error)
    }
}

/// `file`（Blob）と緯度経度のテキスト項目
fn build_form(form: &PredictForm) -> std::result::Result<JsValue, JsValue> {
    let data = FormData::new()?;

    let parts = Array::of1(&Uint8Array::from(form.bytes.as_slice()));
    let bag = BlobPropertyBag::new();
    bag.set_type(&form.mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &bag)?;
    data.append_with_blob_and_filename("file", &blob, &form.file_name)?;

    for (name, value) in form.text_fields() {
        data.append_with_str(name, &value)?;
    }
    Ok(data.into())
}

async fn send(
    url: &str,
    method: &str,
    body: Option<&JsValue>,
    content_type: Option<&str>,
) -> std::result::Result<HttpReply, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))?;

    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = body {
        opts.set_body(body);
    }

    let request = Request::new_with_str_and_init(url, &opts)?;
    if let Some(content_type) = content_type {
        request.headers().set("Content-Type", content_type)?;
    }

    let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
    let resp: Response = resp_value.dyn_into()?;

    // ステータスの解釈は共通側で行うので、本文はテキストのまま返す
    let text = JsFuture::from(resp.text()?).await?;
    Ok(HttpReply::new(resp.status(), text.as_string().unwrap_or_default()))
}

fn transport_error(value: JsValue) -> Error {
    let message = value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value));
    web_sys::console::error_1(&value);
    Error::Transport(message)
}
