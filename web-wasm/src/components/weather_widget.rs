//! 天気と病害リスクの浮動ウィジェット
//!
//! 表示/非表示は `AppSettings` 経由で localStorage に保存する。

use crate::app::use_services;
use crate::geolocation::BrowserLocation;
use crate::storage::BrowserStore;
use leptos::prelude::*;
use leptos::task::spawn_local;
use maize_scan_common::weather::ForecastDay;
use maize_scan_common::{AppSettings, Enrichment, LocationProbe, RiskLevel, WeatherSnapshot};

/// 予報の日数
const FORECAST_DAYS: u8 = 3;

/// ウィジェットの表示項目
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDetails {
    pub temperature: String,
    pub summary: String,
    pub humidity: String,
    pub wind: String,
    pub precipitation: String,
    pub location: String,
    pub risk: String,
    pub risk_class: &'static str,
    pub risk_factor: Option<String>,
}

impl From<&WeatherSnapshot> for WeatherDetails {
    fn from(w: &WeatherSnapshot) -> Self {
        let or_dash = |v: Option<String>| v.unwrap_or_else(|| "–".to_string());
        Self {
            temperature: or_dash(w.temperature.map(|t| format!("{:.0}°C", t))),
            summary: w.summary().unwrap_or("Current conditions").to_string(),
            humidity: or_dash(w.humidity.map(|h| format!("{}%", h))),
            wind: or_dash(w.wind_speed.map(|s| format!("{:.2} km/h", s))),
            precipitation: or_dash(w.precipitation.map(|p| format!("{} mm", p))),
            location: or_dash(w.place_label()),
            risk: w.disease_risk.clone().unwrap_or_else(|| "Unknown".to_string()),
            risk_class: w.risk_level().css_class(),
            risk_factor: w.risk_factors.first().cloned(),
        }
    }
}

/// 予報1日分の表示（"15–25°C"）
pub fn forecast_range(day: &ForecastDay) -> String {
    match (day.temp_min, day.temp_max) {
        (Some(min), Some(max)) => format!("{:.0}–{:.0}°C", min, max),
        (None, Some(max)) => format!("{:.0}°C", max),
        (Some(min), None) => format!("{:.0}°C", min),
        (None, None) => "–".to_string(),
    }
}

/// 取得状態
#[derive(Debug, Clone, PartialEq)]
enum WeatherState {
    Loading,
    Unavailable,
    Ready(WeatherDetails, Vec<ForecastDay>),
}

#[component]
pub fn WeatherWidget() -> impl IntoView {
    let services = use_services();
    let settings = AppSettings::load(&BrowserStore);
    let (visible, set_visible) = signal(settings.weather_widget_visible);
    let state = RwSignal::new(WeatherState::Loading);

    spawn_local(async move {
        let Enrichment::Present(at) = BrowserLocation::default().locate().await else {
            state.set(WeatherState::Unavailable);
            return;
        };
        let client = &services.client;
        let (current, forecast) =
            futures::join!(client.current_weather(at), client.forecast(at, FORECAST_DAYS));
        match current {
            Enrichment::Present(weather) => {
                let days = forecast.map(|f| f.forecast).unwrap_or(Vec::new());
                state.set(WeatherState::Ready(WeatherDetails::from(&weather), days));
            }
            Enrichment::Absent => state.set(WeatherState::Unavailable),
        }
    });

    let set_visibility = move |next: bool| {
        let mut settings = AppSettings {
            weather_widget_visible: visible.get_untracked(),
        };
        if let Err(e) = settings.set_weather_widget_visible(next, &BrowserStore) {
            web_sys::console::warn_1(
                &format!("Failed to save weather widget state: {}", e).into(),
            );
        }
        set_visible.set(settings.weather_widget_visible);
    };

    view! {
        <Show
            when=move || visible.get()
            fallback=move || view! {
                <button class="weather-fab" title="Show Weather" on:click=move |_| set_visibility(true)>
                    "🌤"
                </button>
            }
        >
            <div class="weather-widget">
                <div class="weather-header">
                    <span>"Weather & Disease Risk"</span>
                    <button class="btn-icon" title="Hide Weather" on:click=move |_| set_visibility(false)>
                        "×"
                    </button>
                </div>
                {move || match state.get() {
                    WeatherState::Loading => view! {
                        <p class="text-muted">"Loading weather..."</p>
                    }.into_any(),
                    WeatherState::Unavailable => view! {
                        <div class="weather-empty">
                            <p>"Weather unavailable"</p>
                            <p class="text-muted">"Allow location access to see weather data"</p>
                        </div>
                    }.into_any(),
                    WeatherState::Ready(details, days) => view! {
                        <WeatherBody details=details days=days />
                    }.into_any(),
                }}
            </div>
        </Show>
    }
}

#[component]
fn WeatherBody(details: WeatherDetails, days: Vec<ForecastDay>) -> impl IntoView {
    view! {
        <div class="weather-body">
            <div class="weather-current">
                <strong>{details.temperature}</strong>
                <span class="text-muted">{details.summary}</span>
            </div>
            <dl class="weather-grid">
                <dt>"Humidity:"</dt><dd>{details.humidity}</dd>
                <dt>"Wind:"</dt><dd>{details.wind}</dd>
                <dt>"Precip:"</dt><dd>{details.precipitation}</dd>
                <dt>"Location:"</dt><dd>{details.location}</dd>
            </dl>
            <div class="weather-risk">
                <span>"Disease Risk:"</span>
                <strong class=details.risk_class>{details.risk}</strong>
                {details.risk_factor.map(|f| view! { <p class="text-muted">{f}</p> })}
            </div>
            {(!days.is_empty()).then(|| view! {
                <ul class="weather-forecast">
                    {days
                        .iter()
                        .map(|day| {
                            let risk_class = RiskLevel::classify(day.disease_risk.as_deref()).css_class();
                            view! {
                                <li>
                                    <span>{day.date.clone()}</span>
                                    <span>{forecast_range(day)}</span>
                                    <span class=risk_class>{day.disease_risk.clone().unwrap_or_default()}</span>
                                </li>
                            }
                        })
                        .collect_view()}
                </ul>
            })}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_from_snapshot() {
        let weather: WeatherSnapshot = serde_json::from_str(
            r#"{"temperature": 23.6, "humidity": 82, "wind_speed": 3.456, "precipitation": 1.2,
                "disease_risk": "High", "risk_factors": ["High humidity favours fungal growth", "Warm nights"],
                "latitude": 0.5143, "longitude": 35.2698}"#,
        )
        .unwrap();
        let details = WeatherDetails::from(&weather);
        assert_eq!(details.temperature, "24°C");
        assert_eq!(details.humidity, "82%");
        assert_eq!(details.wind, "3.46 km/h");
        assert_eq!(details.precipitation, "1.2 mm");
        assert_eq!(details.location, "0.51, 35.27");
        assert_eq!(details.risk_class, "risk-high");
        assert_eq!(details.risk_factor.as_deref(), Some("High humidity favours fungal growth"));
    }

    #[test]
    fn test_details_with_missing_values() {
        let details = WeatherDetails::from(&WeatherSnapshot::default());
        assert_eq!(details.temperature, "–");
        assert_eq!(details.risk, "Unknown");
        assert_eq!(details.risk_class, "risk-unknown");
        assert_eq!(details.risk_factor, None);
    }

    #[test]
    fn test_forecast_range() {
        let day = ForecastDay {
            date: "2026-10-20".into(),
            temp_min: Some(14.8),
            temp_max: Some(25.2),
            ..Default::default()
        };
        assert_eq!(forecast_range(&day), "15–25°C");
    }
}
