//! 判定結果パネル（モーダル）

use crate::app::use_services;
use crate::components::progress_bar::ConfidenceBar;
use leptos::prelude::*;
use maize_scan_common::presentation::{local_extension_advice, BreakdownRow};
use maize_scan_common::{PredictionResult, ResultView, WeatherSnapshot};

/// 画面に出す内容（カタログ参照を外した所有データ）
#[derive(Debug, Clone, PartialEq)]
pub struct ResultContent {
    pub condition: String,
    pub healthy: bool,
    pub severity_label: &'static str,
    pub severity_class: &'static str,
    pub accent_class: &'static str,
    pub percent: u8,
    pub band: &'static str,
    pub description: String,
    pub causes: Vec<String>,
    pub yield_impact: String,
    pub controls: Vec<String>,
    pub breakdown: Vec<BreakdownRow>,
    pub weather: Option<WeatherSnapshot>,
}

impl From<&ResultView<'_>> for ResultContent {
    fn from(view: &ResultView<'_>) -> Self {
        Self {
            condition: view.condition.clone(),
            healthy: view.healthy,
            severity_label: view.severity_label(),
            severity_class: view.severity.css_class(),
            accent_class: view.accent_class(),
            percent: view.percent,
            band: view.band.label(),
            description: view.record.description.clone(),
            causes: view.record.causes.clone(),
            yield_impact: view.record.yield_impact.clone(),
            controls: view.record.controls.clone(),
            breakdown: view.breakdown.clone(),
            weather: view.weather.clone(),
        }
    }
}

/// 結果時点の天気（気温・湿度・リスク）
pub fn weather_summary(weather: &WeatherSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(t) = weather.temperature {
        lines.push(format!("{:.0}°C", t));
    }
    if let Some(h) = weather.humidity {
        lines.push(format!("Humidity {:.0}%", h));
    }
    if let Some(risk) = weather.disease_risk.as_deref() {
        lines.push(format!("Disease Risk: {}", risk));
    }
    lines
}

#[component]
pub fn ResultPanel<FC, FR>(
    result: PredictionResult,
    image_url: Option<String>,
    place: ReadSignal<Option<String>>,
    on_close: FC,
    on_reset: FR,
) -> impl IntoView
where
    FC: Fn(()) + 'static + Clone,
    FR: Fn(()) + 'static + Clone,
{
    let services = use_services();
    let content = ResultContent::from(&ResultView::build(&result, &services.catalog));
    let condition = content.condition.clone();
    let header_class = if content.healthy {
        "result-header healthy"
    } else {
        "result-header diseased"
    };

    view! {
        <div class="modal-backdrop">
            <div class="result-modal">
                <div class=header_class>
                    <h2>"Analysis Complete"</h2>
                    <button
                        class="btn-icon"
                        on:click={
                            let on_close = on_close.clone();
                            move |_| on_close(())
                        }
                    >
                        "×"
                    </button>
                </div>

                <div class="result-body">
                    <div class="result-summary">
                        {image_url.map(|src| view! { <img class="result-image" src=src alt="Analyzed leaf" /> })}
                        <div>
                            <span class="text-muted">"Detected Condition"</span>
                            <div class="condition-line">
                                <span class="condition">{content.condition.clone()}</span>
                                <span class=format!("badge {}", content.severity_class)>
                                    {content.severity_label}
                                </span>
                            </div>
                            <ConfidenceBar percent=content.percent accent=content.accent_class />
                            <p class="text-muted">{content.band}</p>
                        </div>
                    </div>

                    <div class="result-section local-extension">
                        <h4>"Local Extension"</h4>
                        <p>{move || local_extension_advice(place.get().as_deref(), &condition)}</p>
                    </div>

                    {content.weather.as_ref().map(|w| {
                        view! {
                            <div class="result-section">
                                <h4>"Weather at Scan"</h4>
                                <p>{weather_summary(w).join(" · ")}</p>
                            </div>
                        }
                    })}

                    <div class="result-section">
                        <h4>"About This Condition"</h4>
                        <p>{content.description.clone()}</p>
                    </div>

                    <div class="result-section">
                        <h4>"Causes"</h4>
                        <ul>
                            {content.causes.iter().map(|c| view! { <li>{c.clone()}</li> }).collect_view()}
                        </ul>
                    </div>

                    <div class="result-section">
                        <h4>"Yield Impact"</h4>
                        <p>{content.yield_impact.clone()}</p>
                    </div>

                    <div class="result-section">
                        <h4>"Control Measures"</h4>
                        <ol>
                            {content.controls.iter().map(|c| view! { <li>{c.clone()}</li> }).collect_view()}
                        </ol>
                    </div>

                    {(!content.breakdown.is_empty()).then(|| {
                        let accent = content.accent_class;
                        view! {
                            <div class="result-section">
                                <h4>"Prediction Breakdown"</h4>
                                {content
                                    .breakdown
                                    .iter()
                                    .map(|row| {
                                        let fill = if row.is_top { accent } else { "accent-other" };
                                        view! {
                                            <div class="breakdown-row">
                                                <span>{row.label.clone()}</span>
                                                <span>{format!("{}%", row.percent)}</span>
                                                <div class="progress-bar thin">
                                                    <div
                                                        class=format!("progress-fill {}", fill)
                                                        style=format!("width: {}%", row.percent)
                                                    />
                                                </div>
                                            </div>
                                        }
                                    })
                                    .collect_view()}
                            </div>
                        }
                    })}
                </div>

                <div class="result-footer">
                    <button
                        class="btn btn-primary"
                        on:click={
                            let on_reset = on_reset.clone();
                            move |_| on_reset(())
                        }
                    >
                        "Analyse Another Image"
                    </button>
                    <button
                        class="btn btn-secondary"
                        on:click={
                            let on_close = on_close.clone();
                            move |_| on_close(())
                        }
                    >
                        "Close"
                    </button>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maize_scan_common::DiseaseCatalog;
    use std::collections::BTreeMap;

    #[test]
    fn test_content_from_common_rust() {
        let catalog = DiseaseCatalog::builtin().unwrap();
        let result = PredictionResult {
            prediction: "Common Rust".into(),
            confidence: 0.82,
            all_predictions: BTreeMap::new(),
            weather: None,
            location: None,
        };
        let content = ResultContent::from(&ResultView::build(&result, &catalog));
        assert_eq!(content.severity_label, "Moderate Risk");
        assert_eq!(content.percent, 82);
        assert_eq!(content.band, "High confidence");
        assert_eq!(content.accent_class, "accent-diseased");
        assert!(content.breakdown.is_empty());
        assert!(!content.controls.is_empty());
    }

    #[test]
    fn test_weather_summary_skips_missing_fields() {
        let weather = WeatherSnapshot {
            temperature: Some(24.4),
            disease_risk: Some("High".into()),
            ..Default::default()
        };
        assert_eq!(weather_summary(&weather), ["24°C", "Disease Risk: High"]);
    }
}
