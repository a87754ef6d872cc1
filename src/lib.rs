//! maize-scan CLI
//!
//! 共通ライブラリ（maize-scan-common）に、reqwestによる送受信・設定ファイル・
//! 端末向け表示を組み合わせる。

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod image_file;
pub mod location;
pub mod report;
pub mod settings_file;
pub mod transport;
