//! アプリ設定の永続化
//!
//! 保存先はプラットフォームごとに異なる（ブラウザ: localStorage、CLI: JSONファイル）。
//! 画面側は `SettingsStore` 越しにだけ読み書きする。

use crate::error::Result;
use std::cell::RefCell;
use std::collections::HashMap;

/// 天気ウィジェットの表示/非表示を保存するキー
pub const WEATHER_WIDGET_KEY: &str = "weatherWidgetVisible";

/// キーと文字列値の保存先
pub trait SettingsStore {
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// メモリ上の保存先（テスト用・保存不要な環境用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// アプリ設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppSettings {
    pub weather_widget_visible: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            weather_widget_visible: true,
        }
    }
}

impl AppSettings {
    /// 起動時に読み込む。読めない値は既定値のまま
    pub fn load(store: &impl SettingsStore) -> Self {
        let mut settings = Self::default();
        match store.read(WEATHER_WIDGET_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<bool>(&raw) {
                Ok(visible) => settings.weather_widget_visible = visible,
                Err(e) => tracing::warn!(key = WEATHER_WIDGET_KEY, error = %e, "ignoring stored value"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "settings store unreadable"),
        }
        settings
    }

    /// 表示状態を変更して保存
    pub fn set_weather_widget_visible(
        &mut self,
        visible: bool,
        store: &impl SettingsStore,
    ) -> Result<()> {
        self.weather_widget_visible = visible;
        store.write(WEATHER_WIDGET_KEY, &serde_json::to_string(&visible)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct BrokenStore;

    impl SettingsStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Storage("quota exceeded".into()))
        }

        fn write(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("quota exceeded".into()))
        }
    }

    #[test]
    fn test_default_is_visible() {
        assert!(AppSettings::load(&MemoryStore::new()).weather_widget_visible);
    }

    #[test]
    fn test_toggle_persists() {
        let store = MemoryStore::new();
        let mut settings = AppSettings::load(&store);
        settings.set_weather_widget_visible(false, &store).unwrap();
        assert_eq!(store.read(WEATHER_WIDGET_KEY).unwrap().as_deref(), Some("false"));
        assert!(!AppSettings::load(&store).weather_widget_visible);
    }

    #[test]
    fn test_garbage_value_falls_back_to_default() {
        let store = MemoryStore::new();
        store.write(WEATHER_WIDGET_KEY, "maybe").unwrap();
        assert!(AppSettings::load(&store).weather_widget_visible);
        assert!(AppSettings::load(&BrokenStore).weather_widget_visible);
    }

    #[test]
    fn test_write_failure_keeps_in_memory_value() {
        let mut settings = AppSettings::default();
        assert!(settings.set_weather_widget_visible(false, &BrokenStore).is_err());
        assert!(!settings.weather_widget_visible);
    }
}
