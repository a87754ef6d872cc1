//! 端末の位置取得（navigator.geolocation）
//!
//! 許可ダイアログが放置されると geolocation 側のタイムアウトは効かないため、
//! タイマーとの競争で待ち時間の上限を守る。

use futures::future::{select, Either};
use gloo::timers::future::TimeoutFuture;
use js_sys::{Promise, Reflect};
use maize_scan_common::{Coordinates, Enrichment, LocationProbe};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::PositionOptions;

/// 位置取得の待ち時間（ミリ秒）
pub const GEOLOCATION_TIMEOUT_MS: u32 = 5_000;

/// `GeolocationPosition.coords` のうち使う項目
#[derive(Debug, Deserialize)]
struct PositionCoords {
    latitude: f64,
    longitude: f64,
}

/// ブラウザの位置情報
#[derive(Debug, Clone, Copy)]
pub struct BrowserLocation {
    timeout_ms: u32,
}

impl BrowserLocation {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

impl Default for BrowserLocation {
    fn default() -> Self {
        Self::new(GEOLOCATION_TIMEOUT_MS)
    }
}

impl LocationProbe for BrowserLocation {
    async fn locate(&self) -> Enrichment<Coordinates> {
        let lookup = Box::pin(current_position(self.timeout_ms));
        let deadline = TimeoutFuture::new(self.timeout_ms);
        match select(lookup, deadline).await {
            Either::Left((result, _)) => {
                Enrichment::from_result("geolocation", result.map_err(describe))
            }
            Either::Right(_) => {
                tracing::debug!(timeout_ms = self.timeout_ms, "geolocation timed out");
                Enrichment::Absent
            }
        }
    }
}

async fn current_position(timeout_ms: u32) -> Result<Coordinates, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let geolocation = window.navigator().geolocation()?;

    let options = PositionOptions::new();
    options.set_timeout(timeout_ms);
    options.set_enable_high_accuracy(false);

    let mut requested = Ok(());
    let promise = Promise::new(&mut |resolve, reject| {
        let on_success = Closure::once_into_js(move |position: JsValue| {
            let _ = resolve.call1(&JsValue::UNDEFINED, &position);
        });
        let on_error = Closure::once_into_js(move |error: JsValue| {
            let _ = reject.call1(&JsValue::UNDEFINED, &error);
        });
        requested = geolocation.get_current_position_with_error_callback_and_options(
            on_success.unchecked_ref(),
            Some(on_error.unchecked_ref()),
            &options,
        );
    });
    requested?;

    let position = JsFuture::from(promise).await?;
    let coords = Reflect::get(&position, &JsValue::from_str("coords"))?;
    let coords: PositionCoords = serde_wasm_bindgen::from_value(coords)?;
    Ok(Coordinates::new(coords.latitude, coords.longitude))
}

/// GeolocationPositionError は message を持つ
fn describe(error: JsValue) -> String {
    Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", error))
}
