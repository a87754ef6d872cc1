//! 設定ファイルの読み書きテスト

use maize_scan::config::Config;
use maize_scan_common::Coordinates;
use tempfile::tempdir;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("config.json")).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.farmer_id, "demo_farmer");
    assert_eq!(config.history_limit, 100);
    assert_eq!(config.geolocation_timeout().as_millis(), 5000);
}

#[test]
fn test_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("maize-scan").join("config.json");

    let config = Config {
        api_base_url: Some("http://10.0.0.5:8000".into()),
        farmer_id: "farmer_42".into(),
        default_location: Some(Coordinates::new(1.0153, 35.0062)),
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    let reloaded = Config::load_from(&path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"farmer_id": "field_team"}"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.farmer_id, "field_team");
    assert_eq!(config.history_limit, 100);
    assert!(config.api_base_url.is_none());
}

#[test]
fn test_base_url_resolution_order() {
    let mut config = Config::default();
    assert_eq!(config.resolve_api_base_url(None), "http://localhost:8000");

    config.api_base_url = Some("http://from-file:8000".into());
    assert_eq!(config.resolve_api_base_url(None), "http://from-file:8000");
    assert_eq!(
        config.resolve_api_base_url(Some("http://from-env:9000".into())),
        "http://from-env:9000"
    );
    // 空の環境変数は無視
    assert_eq!(config.resolve_api_base_url(Some("  ".into())), "http://from-file:8000");
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "farmer_id = 1").unwrap();
    assert!(Config::load_from(&path).is_err());
}
