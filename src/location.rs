//! CLIでの位置取得
//!
//! 端末の測位機能は持たないため、コマンドライン指定か設定ファイルの座標を使う。
//! どの取得手段も待ち時間の上限つきで呼び出す。

use maize_scan_common::detect::LocationProbe;
use maize_scan_common::{Coordinates, Enrichment};
use std::time::Duration;

/// 位置の出どころ
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationSource {
    /// --lat/--lon
    Explicit(Coordinates),
    /// 設定ファイルの default_location
    Configured(Coordinates),
    /// --no-location または未設定
    Disabled,
}

impl LocationSource {
    pub fn choose(
        explicit: Option<Coordinates>,
        configured: Option<Coordinates>,
        disabled: bool,
    ) -> Self {
        if disabled {
            return LocationSource::Disabled;
        }
        match (explicit, configured) {
            (Some(at), _) => LocationSource::Explicit(at),
            (None, Some(at)) => LocationSource::Configured(at),
            (None, None) => LocationSource::Disabled,
        }
    }
}

impl LocationProbe for LocationSource {
    async fn locate(&self) -> Enrichment<Coordinates> {
        match self {
            LocationSource::Explicit(at) | LocationSource::Configured(at) => Enrichment::Present(*at),
            LocationSource::Disabled => Enrichment::Absent,
        }
    }
}

/// 内側の取得手段に待ち時間の上限をかける
pub struct TimedProbe<P> {
    inner: P,
    timeout: Duration,
}

impl<P: LocationProbe> TimedProbe<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl<P: LocationProbe> LocationProbe for TimedProbe<P> {
    async fn locate(&self) -> Enrichment<Coordinates> {
        match tokio::time::timeout(self.timeout, self.inner.locate()).await {
            Ok(found) => found,
            Err(_) => {
                tracing::debug!(timeout_ms = self.timeout.as_millis() as u64, "location probe timed out");
                Enrichment::Absent
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverResponds;

    impl LocationProbe for NeverResponds {
        async fn locate(&self) -> Enrichment<Coordinates> {
            std::future::pending::<()>().await;
            Enrichment::Absent
        }
    }

    #[test]
    fn test_choose_priority() {
        let a = Coordinates::new(1.0, 2.0);
        let b = Coordinates::new(3.0, 4.0);
        assert_eq!(LocationSource::choose(Some(a), Some(b), false), LocationSource::Explicit(a));
        assert_eq!(LocationSource::choose(None, Some(b), false), LocationSource::Configured(b));
        assert_eq!(LocationSource::choose(Some(a), Some(b), true), LocationSource::Disabled);
        assert_eq!(LocationSource::choose(None, None, false), LocationSource::Disabled);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_absent() {
        let probe = TimedProbe::new(NeverResponds, Duration::from_millis(10));
        assert_eq!(probe.locate().await, Enrichment::Absent);
    }

    #[tokio::test]
    async fn test_timed_probe_passes_through() {
        let at = Coordinates::new(-1.2921, 36.8219);
        let probe = TimedProbe::new(LocationSource::Explicit(at), Duration::from_secs(5));
        assert_eq!(probe.locate().await, Enrichment::Present(at));
    }
}
