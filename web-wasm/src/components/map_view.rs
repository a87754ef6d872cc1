//! 地図ページ（スキャン地点と圃場境界）
//!
//! 背景タイルは描かず、表示範囲をSVGに投影して点と多角形だけを描く。
//! 境界はクリックで頂点を打って作成する。

use crate::app::use_services;
use crate::geolocation::BrowserLocation;
use chrono::NaiveTime;
use leptos::prelude::*;
use leptos::task::spawn_local;
use maize_scan_common::history::DEFAULT_HISTORY_LIMIT;
use maize_scan_common::map::{
    default_farm_name, plan_viewport, scan_markers, shape_from_geojson, viewport_from_scans,
    BOUNDARY_COLOR, FARM_SAVE_FAILED_MESSAGE,
};
use maize_scan_common::{
    BoundaryShape, Coordinates, FarmLayer, LocationProbe, MapStats, MapViewport, ScanRecord,
    DEMO_FARMER_ID,
};
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent};

pub const MAP_WIDTH: f64 = 800.0;
pub const MAP_HEIGHT: f64 = 480.0;
const MAX_ZOOM: u8 = 19;
const MIN_ZOOM: u8 = 3;

/// 描画モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawMode {
    #[default]
    Off,
    Polygon,
    /// 対角の2点をクリック
    Rectangle,
}

impl DrawMode {
    /// 打った頂点から図形を確定できるか
    pub fn finish(&self, draft: &[Coordinates]) -> Option<BoundaryShape> {
        match self {
            DrawMode::Off => None,
            DrawMode::Polygon if draft.len() >= 3 => Some(BoundaryShape::Polygon(draft.to_vec())),
            DrawMode::Polygon => None,
            DrawMode::Rectangle => match draft {
                [a, b] => Some(BoundaryShape::Rectangle(*a, *b)),
                _ => None,
            },
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            DrawMode::Off => "",
            DrawMode::Polygon => "Click to add vertices, then Finish",
            DrawMode::Rectangle => "Click two opposite corners",
        }
    }
}

/// SVGの points 属性（"x,y x,y ..."）
pub fn svg_points(vertices: &[Coordinates], viewport: &MapViewport) -> String {
    vertices
        .iter()
        .map(|v| {
            let (x, y) = viewport.project(*v, MAP_WIDTH, MAP_HEIGHT);
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// ブラウザの現在時刻（ローカル）
fn local_time_now() -> NaiveTime {
    let now = js_sys::Date::new_0();
    NaiveTime::from_hms_opt(now.get_hours(), now.get_minutes(), now.get_seconds())
        .unwrap_or(NaiveTime::MIN)
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.alert_with_message(message) {
            tracing::warn!(error = ?e, "alert could not be shown");
        }
    }
}

/// クリック位置をSVG座標に換算（表示サイズとviewBoxの差を補正）
fn click_position(ev: &MouseEvent) -> Option<(f64, f64)> {
    let target: Element = ev.current_target()?.dyn_into().ok()?;
    let rect = target.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let x = (ev.client_x() as f64 - rect.left()) * MAP_WIDTH / rect.width();
    let y = (ev.client_y() as f64 - rect.top()) * MAP_HEIGHT / rect.height();
    Some((x, y))
}

#[component]
pub fn MapPage() -> impl IntoView {
    let services = use_services();
    let scans = RwSignal::new(Vec::<ScanRecord>::new());
    let farms = RwSignal::new(FarmLayer::new());
    let viewport = RwSignal::new(MapViewport::default());
    let (scan_error, set_scan_error) = signal(false);
    let (mode, set_mode) = signal(DrawMode::Off);
    let draft = RwSignal::new(Vec::<Coordinates>::new());

    {
        let services = services.clone();
        spawn_local(async move {
            let client = &services.client;
            let (scan_result, farm_result) = futures::join!(
                client.scans(DEMO_FARMER_ID, DEFAULT_HISTORY_LIMIT),
                client.farms(DEMO_FARMER_ID)
            );
            let loaded = scan_result.unwrap_or_else(|e| {
                web_sys::console::error_1(&format!("Error fetching scans: {}", e).into());
                set_scan_error.set(true);
                Vec::new()
            });
            match farm_result {
                Ok(list) => farms.update(|layer| layer.load(list)),
                Err(e) => tracing::warn!(error = %e, "farm boundaries unavailable"),
            }

            // スキャン地点が無いときだけ端末位置を聞く
            let located = if viewport_from_scans(&loaded).is_none() {
                BrowserLocation::default().locate().await.into_option()
            } else {
                None
            };
            viewport.set(plan_viewport(&loaded, located));
            scans.set(loaded);
        });
    }

    let save_shape = move |shape: BoundaryShape| {
        let name = default_farm_name(local_time_now());
        let started = farms.try_update(|layer| layer.begin_add(&shape, DEMO_FARMER_ID, &name));
        let (id, request) = match started {
            Some(Ok(pending)) => pending,
            Some(Err(e)) => {
                alert(&e.to_string());
                return;
            }
            None => return,
        };
        let services = services.clone();
        spawn_local(async move {
            match services.client.create_farm(&request).await {
                Ok(created) => farms.update(|layer| layer.confirm(id, created.server_id())),
                Err(e) => {
                    web_sys::console::error_1(&format!("Error saving farm: {}", e).into());
                    let message = farms
                        .try_update(|layer| layer.rollback(id))
                        .unwrap_or(FARM_SAVE_FAILED_MESSAGE);
                    alert(message);
                }
            }
        });
    };

    let finish = {
        let save_shape = save_shape.clone();
        move || {
            let shape = draft.with_untracked(|points| mode.get_untracked().finish(points));
            if let Some(shape) = shape {
                draft.set(Vec::new());
                set_mode.set(DrawMode::Off);
                save_shape(shape);
            }
        }
    };

    let on_map_click = {
        let finish = finish.clone();
        move |ev: MouseEvent| {
            let current = mode.get_untracked();
            if current == DrawMode::Off {
                return;
            }
            let Some((x, y)) = click_position(&ev) else {
                return;
            };
            let at = viewport.with_untracked(|v| v.unproject(x, y, MAP_WIDTH, MAP_HEIGHT));
            draft.update(|points| points.push(at));
            // 矩形は2点目で確定
            if current == DrawMode::Rectangle {
                finish();
            }
        }
    };

    let start_drawing = move |next: DrawMode| {
        draft.set(Vec::new());
        set_mode.set(next);
    };

    let zoom_by = move |delta: i8| {
        viewport.update(|v| {
            v.zoom = (v.zoom as i16 + delta as i16).clamp(MIN_ZOOM as i16, MAX_ZOOM as i16) as u8;
        });
    };

    view! {
        <div class="map-page">
            <div class="page-header">
                <h2>"Farm Map"</h2>
            </div>

            {move || {
                let stats = scans.with(|s| MapStats::compute(s));
                view! {
                    <div class="stats-grid">
                        <div class="stat-card healthy">
                            <span class="text-muted">"Healthy Zones"</span>
                            <strong>{stats.healthy_zones}</strong>
                        </div>
                        <div class="stat-card risk">
                            <span class="text-muted">"Risk Spots"</span>
                            <strong>{stats.risk_spots}</strong>
                        </div>
                        <div class="stat-card">
                            <span class="text-muted">"Farm Boundaries"</span>
                            <strong>{farms.with(FarmLayer::len)}</strong>
                        </div>
                    </div>
                }
            }}

            <Show when=move || scan_error.get()>
                <p class="error-message">"Unable to load scan locations."</p>
            </Show>

            <div class="map-toolbar">
                <button class="btn btn-secondary btn-small" on:click=move |_| zoom_by(1)>"+"</button>
                <button class="btn btn-secondary btn-small" on:click=move |_| zoom_by(-1)>"−"</button>
                <button
                    class="btn btn-secondary btn-small"
                    on:click=move |_| start_drawing(DrawMode::Polygon)
                >
                    "Draw Polygon"
                </button>
                <button
                    class="btn btn-secondary btn-small"
                    on:click=move |_| start_drawing(DrawMode::Rectangle)
                >
                    "Draw Rectangle"
                </button>
                <Show when=move || mode.get() == DrawMode::Polygon>
                    <button
                        class="btn btn-primary btn-small"
                        disabled=move || draft.with(|d| d.len() < 3)
                        on:click={
                            let finish = finish.clone();
                            move |_| finish()
                        }
                    >
                        "Finish"
                    </button>
                </Show>
                <Show when=move || mode.get() != DrawMode::Off>
                    <button class="btn btn-tertiary btn-small" on:click=move |_| start_drawing(DrawMode::Off)>
                        "Cancel"
                    </button>
                    <span class="text-muted">{move || mode.get().hint()}</span>
                </Show>
            </div>

            <svg
                class="map-canvas"
                viewBox=format!("0 0 {} {}", MAP_WIDTH, MAP_HEIGHT)
                on:click=on_map_click
            >
                {move || {
                    let vp = viewport.get();
                    farms.with(|layer| {
                        layer
                            .farms()
                            .filter_map(|farm| {
                                let shape = shape_from_geojson(&farm.boundary_geojson).ok()?;
                                let name = farm.farm_name.clone().unwrap_or_default();
                                Some(view! {
                                    <polygon
                                        points=svg_points(&shape.vertices(), &vp)
                                        fill=BOUNDARY_COLOR
                                        fill-opacity="0.25"
                                        stroke=BOUNDARY_COLOR
                                        stroke-width="2"
                                    >
                                        <title>{name}</title>
                                    </polygon>
                                })
                            })
                            .collect_view()
                    })
                }}

                {move || {
                    let vp = viewport.get();
                    scans.with(|s| {
                        scan_markers(s)
                            .into_iter()
                            .map(|marker| {
                                let (x, y) = vp.project(marker.position, MAP_WIDTH, MAP_HEIGHT);
                                view! {
                                    <circle
                                        cx=format!("{:.1}", x)
                                        cy=format!("{:.1}", y)
                                        r="8"
                                        fill=marker.color()
                                        stroke="#ffffff"
                                        stroke-width="2"
                                    >
                                        <title>{marker.popup_lines().join("\n")}</title>
                                    </circle>
                                }
                            })
                            .collect_view()
                    })
                }}

                {move || {
                    let vp = viewport.get();
                    draft.with(|points| {
                        (!points.is_empty()).then(|| view! {
                            <polyline
                                points=svg_points(points, &vp)
                                fill="none"
                                stroke=BOUNDARY_COLOR
                                stroke-dasharray="6 4"
                                stroke-width="2"
                            />
                        })
                    })
                }}
            </svg>

            <p class="text-muted">
                {move || {
                    let vp = viewport.get();
                    format!("Center: {} (zoom {})", vp.center, vp.zoom)
                }}
            </p>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_needs_two_corners() {
        let a = Coordinates::new(0.0, 35.0);
        let b = Coordinates::new(0.01, 35.01);
        assert_eq!(DrawMode::Rectangle.finish(&[a]), None);
        assert_eq!(
            DrawMode::Rectangle.finish(&[a, b]),
            Some(BoundaryShape::Rectangle(a, b))
        );
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let pts = [
            Coordinates::new(0.0, 35.0),
            Coordinates::new(0.0, 35.01),
            Coordinates::new(0.01, 35.01),
        ];
        assert_eq!(DrawMode::Polygon.finish(&pts[..2]), None);
        assert!(matches!(DrawMode::Polygon.finish(&pts), Some(BoundaryShape::Polygon(v)) if v.len() == 3));
        assert_eq!(DrawMode::Off.finish(&pts), None);
    }

    #[test]
    fn test_center_projects_to_middle() {
        let vp = MapViewport::default();
        assert_eq!(svg_points(&[vp.center], &vp), "400.0,240.0");
    }
}
