// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical error type for flowjs-works (spec §7).
//!
//! Every subsystem error eventually lifts into a [`FlowError`] variant at
//! its crate boundary. HTTP status mapping lives in `flowjs-daemon`, not
//! here — this type stays transport-agnostic.

use thiserror::Error;

/// One of the error kinds named in spec §7.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("invalid DSL: {0}")]
    InvalidDsl(String),

    #[error("unknown activity type: {0}")]
    UnknownActivity(String),

    #[error("input resolution error: {0}")]
    InputResolution(String),

    #[error("secret resolution error: {0}")]
    SecretResolution(String),

    #[error("activity transport error: {0}")]
    ActivityTransport(String),

    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("script syntax error: {0}")]
    ScriptSyntaxError(String),

    #[error("script runtime error: {0}")]
    ScriptRuntimeError(String),

    #[error("persistence error: {0}")]
    PersistenceError(String),

    #[error("trigger start failure: {0}")]
    TriggerStartFailure(String),
}

impl FlowError {
    /// Short machine-readable kind tag, used in audit `error_msg`/HTTP bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::InvalidDsl(_) => "InvalidDSL",
            FlowError::UnknownActivity(_) => "UnknownActivity",
            FlowError::InputResolution(_) => "InputResolutionError",
            FlowError::SecretResolution(_) => "SecretResolutionError",
            FlowError::ActivityTransport(_) => "ActivityTransport",
            FlowError::Timeout(_) => "Timeout",
            FlowError::ScriptSyntaxError(_) => "ScriptSyntaxError",
            FlowError::ScriptRuntimeError(_) => "ScriptRuntimeError",
            FlowError::PersistenceError(_) => "PersistenceError",
            FlowError::TriggerStartFailure(_) => "TriggerStartFailure",
        }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;
