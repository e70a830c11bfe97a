//! Exit codes for the CLI

use gantry_core::GantryError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Predictor evidence error (timeout or service failure)
pub const EVIDENCE_ERROR: i32 = 3;

/// Push log error
pub const PUSHLOG_ERROR: i32 = 4;

/// Unknown strategy or policy
pub const STRATEGY_ERROR: i32 = 5;

/// Exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<GantryError>() {
        Some(GantryError::Config(_)) => CONFIG_ERROR,
        Some(GantryError::Evidence(_)) => EVIDENCE_ERROR,
        Some(GantryError::PushLog(_)) => PUSHLOG_ERROR,
        Some(GantryError::Strategy(_)) => STRATEGY_ERROR,
        _ => ERROR,
    }
}
