//! ColorClassifier: raw state string + category -> severity class.

#![allow(missing_docs)]

use crate::core::units::StateCategory;

/// Severity attached to one rendered status value.
///
/// `Neutral` is only produced for `SubState` values outside its tables; every
/// other category falls back to `Bad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Neutral,
    Good,
    Warn,
    Bad,
}

#[must_use]
pub fn classify(category: StateCategory, value: &str) -> Severity {
    match category {
        StateCategory::LoadState => match value {
            "loaded" => Severity::Good,
            _ => Severity::Bad,
        },
        StateCategory::ActiveState => match value {
            "active" => Severity::Good,
            "reloading" | "activating" | "deactivating" => Severity::Warn,
            _ => Severity::Bad,
        },
        StateCategory::SubState => match value {
            "running" => Severity::Good,
            "exited" => Severity::Bad,
            _ => Severity::Neutral,
        },
        StateCategory::UnitFileState => match value {
            "enabled" | "static" => Severity::Good,
            "enabled-runtime" | "linked" | "linked-runtime" | "masked-runtime" => Severity::Warn,
            _ => Severity::Bad,
        },
    }
}
