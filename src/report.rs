//! 端末向けのテキスト表示
//!
//! 表示順は画面版と同じ。色付けはせず、プレーンテキストのみを返す。

use maize_scan_common::history::{
    format_location, format_scan_date, format_scan_time, weather_cell_text,
};
use maize_scan_common::presentation::{local_extension_advice, UPLOAD_TIPS};
use maize_scan_common::weather::ForecastDay;
use maize_scan_common::{
    FarmBoundary, Forecast, HistoryStats, MapMarker, MapStats, MapViewport, ResultView,
    ScanRecord, WeatherSnapshot,
};
use std::fmt::Write;

/// 信頼度バーの幅（文字数）
const BAR_WIDTH: usize = 20;

pub fn confidence_bar(percent: u8) -> String {
    let filled = (percent as usize * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// 判定結果
pub fn render_result(view: &ResultView<'_>, place: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  [{}]", view.condition, view.severity_label());
    let _ = writeln!(
        out,
        "Confidence: {}% {} {}",
        view.percent,
        confidence_bar(view.percent),
        view.band.label()
    );

    let _ = writeln!(out, "\nAbout This Condition\n  {}", view.record.description);

    let _ = writeln!(out, "\nCauses");
    for cause in &view.record.causes {
        let _ = writeln!(out, "  - {}", cause);
    }

    let _ = writeln!(out, "\nYield Impact\n  {}", view.record.yield_impact);

    let _ = writeln!(out, "\nControl Measures");
    for (i, control) in view.record.controls.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, control);
    }

    if !view.breakdown.is_empty() {
        let _ = writeln!(out, "\nAll Predictions");
        for row in &view.breakdown {
            let marker = if row.is_top { "*" } else { " " };
            let _ = writeln!(out, " {} {:<28} {:>3}%", marker, row.label, row.percent);
        }
    }

    if let Some(weather) = &view.weather {
        let _ = writeln!(out, "\nWeather at Scan\n  {}", weather_line(weather));
    }

    let _ = writeln!(
        out,
        "\nLocal Extension\n  {}",
        local_extension_advice(place, &view.condition)
    );
    out
}

/// 撮影のコツ
pub fn render_tips() -> String {
    let mut out = String::from("Tips for Best Results\n");
    for tip in UPLOAD_TIPS {
        let _ = writeln!(out, "  • {}", tip);
    }
    out
}

/// 気象スナップショットの1行要約
pub fn weather_line(weather: &WeatherSnapshot) -> String {
    let mut parts = Vec::new();
    if let Some(t) = weather.temperature {
        parts.push(format!("{}°C", t.round()));
    }
    if let Some(h) = weather.humidity {
        parts.push(format!("Humidity {}%", h));
    }
    if let Some(summary) = weather.summary() {
        parts.push(summary.to_string());
    }
    parts.push(format!(
        "Disease Risk: {}",
        weather.disease_risk.as_deref().unwrap_or("Unknown")
    ));
    parts.join(", ")
}

/// 天気ウィジェット相当（現在 + 予報）
pub fn render_weather(current: Option<&WeatherSnapshot>, forecast: Option<&Forecast>) -> String {
    let mut out = String::from("Weather & Disease Risk\n");
    let Some(weather) = current else {
        out.push_str("  Weather unavailable\n  Allow location access to see weather data\n");
        return out;
    };

    if let Some(t) = weather.temperature {
        let _ = writeln!(out, "  {}°C  {}", t.round(), weather.summary().unwrap_or_default());
    }
    if let Some(h) = weather.humidity {
        let _ = writeln!(out, "  Humidity: {}%", h);
    }
    if let Some(w) = weather.wind_speed {
        let _ = writeln!(out, "  Wind: {:.2} km/h", w);
    }
    if let Some(p) = weather.precipitation {
        let _ = writeln!(out, "  Precip: {} mm", p);
    }
    if let Some(place) = weather.place_label() {
        let _ = writeln!(out, "  Location: {}", place);
    }
    let _ = writeln!(
        out,
        "  Disease Risk: {} ({})",
        weather.disease_risk.as_deref().unwrap_or("Unknown"),
        weather.risk_level().css_class()
    );
    if let Some(factor) = weather.risk_factors.first() {
        let _ = writeln!(out, "    {}", factor);
    }

    if let Some(forecast) = forecast.filter(|f| !f.forecast.is_empty()) {
        let _ = writeln!(out, "\nForecast");
        for day in &forecast.forecast {
            let _ = writeln!(out, "  {}", forecast_line(day));
        }
    }
    out
}

fn forecast_line(day: &ForecastDay) -> String {
    let temps = match (day.temp_min, day.temp_max) {
        (Some(min), Some(max)) => format!("{}–{}°C", min.round(), max.round()),
        (None, Some(max)) => format!("{}°C", max.round()),
        _ => "-".to_string(),
    };
    format!(
        "{:<12} {:<10} risk {}",
        day.date,
        temps,
        day.disease_risk.as_deref().unwrap_or("Unknown")
    )
}

/// 履歴テーブル
pub fn render_history(rows: &[&ScanRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<6} {:<28} {:>5}  {:<20} {}",
        "Date", "Time", "Condition", "Conf", "Location", "Weather"
    );
    for scan in rows {
        let _ = writeln!(
            out,
            "{:<12} {:<6} {:<28} {:>4}%  {:<20} {}",
            format_scan_date(&scan.timestamp),
            format_scan_time(&scan.timestamp),
            scan.prediction,
            maize_scan_common::confidence_percent(scan.confidence),
            format_location(scan),
            weather_cell_text(scan)
        );
    }
    out
}

/// 履歴の集計
pub fn render_stats(stats: &HistoryStats) -> String {
    format!(
        "Health Trend: {}% Overall Healthy (based on the last {} scans)\nMost Common Risk: {}\nTotal Scans: {}\n",
        stats.healthy_percent,
        stats.total,
        stats.most_common_risk_label(),
        stats.total
    )
}

/// 地図ビュー（表示範囲・件数・マーカー・圃場）
pub fn render_map(
    viewport: &MapViewport,
    stats: &MapStats,
    markers: &[MapMarker],
    farms: &[&FarmBoundary],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Center: {} (zoom {})", viewport.center, viewport.zoom);
    let _ = writeln!(
        out,
        "Healthy Zones: {}  Risk Spots: {}",
        stats.healthy_zones, stats.risk_spots
    );

    if !markers.is_empty() {
        let _ = writeln!(out, "\nMarkers");
        for marker in markers {
            let [label, confidence, date] = marker.popup_lines();
            let _ = writeln!(
                out,
                "  {} {}  {}  {}  @ {}",
                marker.color(),
                label,
                confidence,
                date,
                marker.position
            );
        }
    }

    let _ = writeln!(out, "\nFarm Boundaries: {}", farms.len());
    for farm in farms {
        let _ = writeln!(out, "  {}", farm_line(farm));
    }
    out
}

pub fn farm_line(farm: &FarmBoundary) -> String {
    let vertices = farm.boundary_geojson["geometry"]["coordinates"][0]
        .as_array()
        .map(|ring| ring.len().saturating_sub(1))
        .unwrap_or(0);
    format!(
        "{} {} ({} vertices){}",
        farm.id.map(|id| format!("#{}", id)).unwrap_or_else(|| "#-".into()),
        farm.farm_name.as_deref().unwrap_or("Unnamed farm"),
        vertices,
        farm.created_at
            .as_deref()
            .map(|at| format!(" created {}", format_scan_date(at)))
            .unwrap_or_default()
    )
}
