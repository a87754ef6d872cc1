//! ベストエフォートの付加情報
//!
//! 位置情報・予報・逆ジオコーディングなど、失敗しても主処理を止めない取得結果。
//! 失敗は呼び出し側で捕捉させず、ここで「無し」に畳み込む。

/// 取得できたか、できなかったか
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment<T> {
    Present(T),
    Absent,
}

impl<T> Enrichment<T> {
    /// Resultを畳み込む。エラーはログに残して Absent にする
    pub fn from_result<E: std::fmt::Display>(what: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Enrichment::Present(value),
            Err(e) => {
                tracing::debug!(step = what, error = %e, "best-effort step skipped");
                Enrichment::Absent
            }
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Enrichment::Present(_))
    }

    pub fn as_ref(&self) -> Enrichment<&T> {
        match self {
            Enrichment::Present(v) => Enrichment::Present(v),
            Enrichment::Absent => Enrichment::Absent,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Enrichment<U> {
        match self {
            Enrichment::Present(v) => Enrichment::Present(f(v)),
            Enrichment::Absent => Enrichment::Absent,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Enrichment::Present(v) => Some(v),
            Enrichment::Absent => None,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.into_option().unwrap_or(default)
    }
}

impl<T> From<Option<T>> for Enrichment<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Enrichment::Present(v),
            None => Enrichment::Absent,
        }
    }
}

impl<T> Default for Enrichment<T> {
    fn default() -> Self {
        Enrichment::Absent
    }
}
