//! localStorage による設定の保存先

use gloo::storage::{LocalStorage, Storage};
use maize_scan_common::{Error, Result, SettingsStore};
use wasm_bindgen::JsValue;

/// ブラウザの localStorage
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStore;

impl SettingsStore for BrowserStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        LocalStorage::raw().get_item(key).map_err(storage_error)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(storage_error)
    }
}

fn storage_error(value: JsValue) -> Error {
    Error::Storage(format!("{:?}", value))
}
