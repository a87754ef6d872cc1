//! スキャン履歴ページ

use crate::app::use_services;
use leptos::prelude::*;
use leptos::task::spawn_local;
use maize_scan_common::history::{
    format_location, format_scan_date, format_scan_time, weather_cell, DEFAULT_HISTORY_LIMIT,
};
use maize_scan_common::{
    confidence_percent, is_healthy, HealthFilter, HistoryDisplay, HistoryState, HistoryStats,
    ScanRecord, SortKey, DEMO_FARMER_ID,
};

/// 表の1行
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub date: String,
    pub time: String,
    pub condition: String,
    pub healthy: bool,
    pub confidence: String,
    pub location: String,
    /// 気温と説明。無ければ None（"No data" 表示）
    pub weather: Option<(String, String)>,
}

impl From<&ScanRecord> for HistoryRow {
    fn from(scan: &ScanRecord) -> Self {
        Self {
            date: format_scan_date(&scan.timestamp),
            time: format_scan_time(&scan.timestamp),
            condition: scan.prediction.clone(),
            healthy: is_healthy(&scan.prediction),
            confidence: format!("{}%", confidence_percent(scan.confidence)),
            location: format_location(scan),
            weather: weather_cell(scan),
        }
    }
}

/// 表示状態（借用を外したもの）
#[derive(Debug, Clone, PartialEq)]
enum Listing {
    Loading,
    Error(&'static str),
    NoData,
    NoResults(&'static str),
    Rows(Vec<HistoryRow>),
}

impl From<HistoryDisplay<'_>> for Listing {
    fn from(display: HistoryDisplay<'_>) -> Self {
        match display {
            HistoryDisplay::Loading => Listing::Loading,
            HistoryDisplay::Error(message) => Listing::Error(message),
            HistoryDisplay::NoData => Listing::NoData,
            HistoryDisplay::NoResults(message) => Listing::NoResults(message),
            HistoryDisplay::Rows(rows) => {
                Listing::Rows(rows.into_iter().map(HistoryRow::from).collect())
            }
        }
    }
}

#[component]
pub fn HistoryPage() -> impl IntoView {
    let services = use_services();
    let state = RwSignal::new(HistoryState::Loading);
    let (search, set_search) = signal(String::new());
    let (filter, set_filter) = signal(HealthFilter::default());
    let (sort, set_sort) = signal(SortKey::default());

    let load = move || {
        state.set(HistoryState::Loading);
        let services = services.clone();
        spawn_local(async move {
            match services.client.scans(DEMO_FARMER_ID, DEFAULT_HISTORY_LIMIT).await {
                Ok(scans) => state.set(HistoryState::Loaded(scans)),
                Err(e) => {
                    web_sys::console::error_1(&format!("Error fetching history: {}", e).into());
                    state.set(HistoryState::Failed);
                }
            }
        });
    };
    load();

    let listing = move || {
        let search = search.get();
        state.with(|s| Listing::from(s.display(&search, filter.get(), sort.get())))
    };

    view! {
        <div class="history-page">
            <div class="page-header">
                <h2>"Scan History"</h2>
                <button class="btn btn-secondary" on:click=move |_| load()>"Refresh"</button>
            </div>

            {move || state.with(HistoryState::stats).map(|stats| view! { <StatsCards stats=stats /> })}

            <div class="history-controls">
                <input
                    type="search"
                    placeholder="Search by condition..."
                    prop:value=move || search.get()
                    on:input=move |ev| set_search.set(event_target_value(&ev))
                />
                <select on:change=move |ev| {
                    if let Ok(value) = event_target_value(&ev).parse() {
                        set_filter.set(value);
                    }
                }>
                    {[HealthFilter::All, HealthFilter::Diseased, HealthFilter::Healthy]
                        .into_iter()
                        .map(|f| {
                            let value = format!("{:?}", f).to_lowercase();
                            view! {
                                <option value=value selected=move || filter.get() == f>{f.label()}</option>
                            }
                        })
                        .collect_view()}
                </select>
                <select on:change=move |ev| {
                    if let Ok(value) = event_target_value(&ev).parse() {
                        set_sort.set(value);
                    }
                }>
                    <option value="date" selected=move || sort.get() == SortKey::Date>"Newest First"</option>
                    <option value="confidence" selected=move || sort.get() == SortKey::Confidence>"Confidence"</option>
                    <option value="condition" selected=move || sort.get() == SortKey::Condition>"Condition"</option>
                </select>
            </div>

            {move || match listing() {
                Listing::Loading => view! { <p class="text-muted">"Loading history..."</p> }.into_any(),
                Listing::Error(message) => view! { <p class="error-message">{message}</p> }.into_any(),
                Listing::NoData => view! {
                    <div class="empty-state">
                        <p>"No scans yet"</p>
                        <p class="text-muted">"Analyze a leaf on the Detect page to start your history."</p>
                    </div>
                }.into_any(),
                Listing::NoResults(message) => view! {
                    <div class="empty-state">
                        <p>{message}</p>
                        <p class="text-muted">"Try adjusting your search or filters"</p>
                    </div>
                }.into_any(),
                Listing::Rows(rows) => view! { <HistoryTable rows=rows /> }.into_any(),
            }}
        </div>
    }
}

#[component]
fn StatsCards(stats: HistoryStats) -> impl IntoView {
    view! {
        <div class="stats-grid">
            <div class="stat-card">
                <span class="text-muted">"Health Trend"</span>
                <strong>{format!("{}%", stats.healthy_percent)}</strong>
                <span class="text-muted">{format!("Overall Healthy (based on the last {} scans)", stats.total)}</span>
            </div>
            <div class="stat-card">
                <span class="text-muted">"Most Common Risk"</span>
                <strong>{stats.most_common_risk_label().to_string()}</strong>
            </div>
            <div class="stat-card">
                <span class="text-muted">"Total Scans"</span>
                <strong>{stats.total}</strong>
            </div>
        </div>
    }
}

#[component]
fn HistoryTable(rows: Vec<HistoryRow>) -> impl IntoView {
    view! {
        <table class="history-table">
            <thead>
                <tr>
                    <th>"Date"</th>
                    <th>"Condition"</th>
                    <th>"Confidence"</th>
                    <th>"Location"</th>
                    <th>"Weather"</th>
                </tr>
            </thead>
            <tbody>
                {rows
                    .into_iter()
                    .map(|row| {
                        let badge = if row.healthy { "badge severity-none" } else { "badge severity-medium" };
                        view! {
                            <tr>
                                <td>
                                    <div>{row.date}</div>
                                    <div class="text-muted">{row.time}</div>
                                </td>
                                <td><span class=badge>{row.condition}</span></td>
                                <td>{row.confidence}</td>
                                <td>{row.location}</td>
                                <td>
                                    {match row.weather {
                                        Some((temp, summary)) => view! {
                                            <div>{temp}</div>
                                            <div class="text-muted">{summary}</div>
                                        }.into_any(),
                                        None => view! { <span class="text-muted">"No data"</span> }.into_any(),
                                    }}
                                </td>
                            </tr>
                        }
                    })
                    .collect_view()}
            </tbody>
        </table>
    }
}
