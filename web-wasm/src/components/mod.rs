//! 画面コンポーネント

pub mod detect_actions;
pub mod detect_page;
pub mod header;
pub mod history_page;
pub mod map_view;
pub mod progress_bar;
pub mod result_panel;
pub mod tips;
pub mod upload_area;
pub mod weather_widget;
