//! 端末表示のテスト

use maize_scan::report::{
    confidence_bar, farm_line, render_history, render_result, render_stats, render_tips,
};
use maize_scan_common::{
    DiseaseCatalog, FarmBoundary, HistoryStats, PredictionResult, ResultView, ScanRecord,
};
use std::collections::BTreeMap;

fn prediction(label: &str, confidence: f64, candidates: &[(&str, f64)]) -> PredictionResult {
    PredictionResult {
        prediction: label.into(),
        confidence,
        all_predictions: candidates
            .iter()
            .map(|(l, p)| (l.to_string(), *p))
            .collect::<BTreeMap<_, _>>(),
        weather: None,
        location: None,
    }
}

#[test]
fn test_confidence_bar() {
    assert_eq!(confidence_bar(0), "[--------------------]");
    assert_eq!(confidence_bar(100), "[####################]");
    assert_eq!(confidence_bar(82), "[################----]");
}

#[test]
fn test_result_sections_in_order() {
    let catalog = DiseaseCatalog::builtin().unwrap();
    let result = prediction("Northern Corn Leaf Blight", 0.895, &[]);
    let view = ResultView::build(&result, &catalog);
    let text = render_result(&view, Some("Nakuru"));

    assert!(text.contains("Very high confidence"));
    let order = [
        "Northern Corn Leaf Blight  [High Risk]",
        "Confidence: 90%",
        "About This Condition",
        "Causes",
        "Yield Impact",
        "Control Measures",
        "Local Extension",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|needle| text.find(needle).unwrap_or_else(|| panic!("missing {}", needle)))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
    assert!(text.contains("Specific advice for Nakuru"));
}

#[test]
fn test_result_breakdown_marks_top() {
    let catalog = DiseaseCatalog::builtin().unwrap();
    let result = prediction(
        "Healthy",
        0.93,
        &[("Healthy", 0.93), ("Common Rust", 0.05), ("Blight", 0.02)],
    );
    let view = ResultView::build(&result, &catalog);
    let text = render_result(&view, None);

    assert!(text.starts_with("Healthy  [No Risk]"));
    let breakdown: Vec<&str> = text
        .lines()
        .skip_while(|l| *l != "All Predictions")
        .skip(1)
        .take(3)
        .collect();
    assert!(breakdown[0].starts_with(" * Healthy"));
    assert!(breakdown[0].ends_with(" 93%"));
    assert!(breakdown[1].starts_with("   Common Rust"));
    assert!(breakdown[2].contains("Blight"));
}

#[test]
fn test_unknown_label_uses_generic_record() {
    let catalog = DiseaseCatalog::builtin().unwrap();
    let view = ResultView::build(&prediction("gray leaf spot", 0.45, &[]), &catalog);
    let text = render_result(&view, None);
    assert!(text.starts_with("gray leaf spot  [Unclassified]"));
    assert!(text.contains("Low confidence – consider retaking the image"));
    assert!(text.contains("Consult a local agronomist"));
}

#[test]
fn test_tips() {
    let text = render_tips();
    assert!(text.starts_with("Tips for Best Results"));
    assert_eq!(text.lines().count(), 5);
}

#[test]
fn test_history_row_without_location_or_weather() {
    let scan: ScanRecord = serde_json::from_str(
        r#"{"id": 4, "timestamp": "2026-10-19T06:30:00", "prediction": "Leaf Spot", "confidence": 0.5}"#,
    )
    .unwrap();
    let text = render_history(&[&scan]);
    let row = text.lines().nth(1).unwrap();
    assert!(row.starts_with("19 Oct 2026  06:30"));
    assert!(row.contains("Unknown"));
    assert!(row.ends_with("No data"));
}

#[test]
fn test_stats_text() {
    let stats = HistoryStats {
        total: 8,
        healthy_percent: 63,
        most_common_risk: None,
    };
    assert_eq!(
        render_stats(&stats),
        "Health Trend: 63% Overall Healthy (based on the last 8 scans)\nMost Common Risk: None\nTotal Scans: 8\n"
    );
}

#[test]
fn test_farm_line() {
    let farm: FarmBoundary = serde_json::from_str(
        r#"{
            "id": 3,
            "farmer_id": "demo_farmer",
            "farm_name": "River Plot",
            "boundary_geojson": {"type": "Feature", "geometry": {"type": "Polygon",
                "coordinates": [[[35.0, 0.0], [35.1, 0.0], [35.1, 0.1], [35.0, 0.0]]]}},
            "created_at": "2026-10-01 12:00:00"
        }"#,
    )
    .unwrap();
    assert_eq!(farm_line(&farm), "#3 River Plot (3 vertices) created 1 Oct 2026");
}
