//! 設定値のJSONファイル保存（~/.config/maize-scan/settings.json）

use maize_scan_common::{Error, Result, SettingsStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(storage_error)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn storage_error(e: std::io::Error) -> Error {
    Error::Storage(e.to_string())
}

impl SettingsStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all().unwrap_or_default();
        values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(storage_error)?;
        }
        let content = serde_json::to_string_pretty(&values)?;
        std::fs::write(&self.path, content).map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maize_scan_common::AppSettings;

    #[test]
    fn test_missing_file_reads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("settings.json"));
        assert_eq!(store.read("weatherWidgetVisible").unwrap(), None);
    }

    #[test]
    fn test_widget_visibility_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = JsonFileStore::new(&path);
        let mut settings = AppSettings::load(&store);
        assert!(settings.weather_widget_visible);
        settings.set_weather_widget_visible(false, &store).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert!(!AppSettings::load(&reopened).weather_widget_visible);
    }

    #[test]
    fn test_corrupt_file_is_overwritten_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.read("weatherWidgetVisible").is_err());
        store.write("weatherWidgetVisible", "true").unwrap();
        assert_eq!(store.read("weatherWidgetVisible").unwrap().as_deref(), Some("true"));
    }
}
