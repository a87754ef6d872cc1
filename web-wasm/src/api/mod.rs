//! バックエンドとの通信

pub mod fetch;
