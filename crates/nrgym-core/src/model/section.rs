// ── Section availability ──

use serde::Serialize;

use crate::error::CoreError;

/// One independently fetched part of a [`Snapshot`](super::Snapshot).
///
/// A failing fetch leaves its section `Unavailable` without touching the
/// others.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Section<T> {
    Available(T),
    Unavailable(String),
}

impl<T> Section<T> {
    /// Section for data that has not been fetched yet.
    pub fn pending() -> Self {
        Self::Unavailable("not refreshed yet".into())
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl<T> From<Result<T, CoreError>> for Section<T> {
    fn from(result: Result<T, CoreError>) -> Self {
        match result {
            Ok(value) => Self::Available(value),
            Err(e) => Self::Unavailable(e.to_string()),
        }
    }
}
