//! Load lifecycle state machine
//!
//! `Idle -> Loading -> {Loaded | Error}`. A load moves back to `Loading`.
//! A reload refreshes in the background and settles straight from `Loaded`
//! or `Error` into either result. Clearing returns to `Idle` from anywhere.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a page state manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Rejected phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal load phase transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub from: LoadPhase,
    pub to: LoadPhase,
}

/// Validate a phase change
///
/// # Errors
///
/// [`IllegalTransition`] when `to` is not reachable from `from`.
pub fn validate_transition(from: LoadPhase, to: LoadPhase) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: LoadPhase) -> Vec<LoadPhase> {
    use LoadPhase::{Error, Idle, Loaded, Loading};
    match from {
        Idle => vec![Loading],
        Loading => vec![Loading, Loaded, Error, Idle],
        Loaded | Error => vec![Loading, Loaded, Error, Idle],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        assert!(validate_transition(LoadPhase::Idle, LoadPhase::Loading).is_ok());
        assert!(validate_transition(LoadPhase::Loading, LoadPhase::Loaded).is_ok());
        assert!(validate_transition(LoadPhase::Loaded, LoadPhase::Loading).is_ok());
        assert!(validate_transition(LoadPhase::Loading, LoadPhase::Error).is_ok());
        assert!(validate_transition(LoadPhase::Error, LoadPhase::Loading).is_ok());
    }

    #[test]
    fn results_need_a_load_first() {
        let err = validate_transition(LoadPhase::Idle, LoadPhase::Loaded).unwrap_err();
        assert_eq!(err.to_string(), "illegal load phase transition: idle -> loaded");
        assert!(validate_transition(LoadPhase::Idle, LoadPhase::Error).is_err());
    }

    #[test]
    fn reloads_settle_without_loading() {
        assert!(validate_transition(LoadPhase::Loaded, LoadPhase::Error).is_ok());
        assert!(validate_transition(LoadPhase::Error, LoadPhase::Loaded).is_ok());
        assert!(validate_transition(LoadPhase::Loaded, LoadPhase::Loaded).is_ok());
    }
}
