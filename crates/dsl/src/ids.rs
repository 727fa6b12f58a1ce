// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Id conventions (spec §6): process ids are kebab-case, node ids are
//! snake_case, trigger ids carry a `trg_` prefix, secret ids a `sec_` prefix.

use flowjs_core::FlowError;
use regex::Regex;
use std::sync::OnceLock;

fn process_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,255}$").expect("static regex"))
}

fn snake_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static regex"))
}

pub fn validate_process_id(id: &str) -> Result<(), FlowError> {
    if process_id_re().is_match(id) {
        Ok(())
    } else {
        Err(FlowError::InvalidDsl(format!("process id {id:?} is not kebab-case ^[A-Za-z0-9_-]{{1,255}}$")))
    }
}

pub fn validate_node_id(id: &str) -> Result<(), FlowError> {
    if snake_case_re().is_match(id) {
        Ok(())
    } else {
        Err(FlowError::InvalidDsl(format!("node id {id:?} is not snake_case")))
    }
}

pub fn validate_trigger_id(id: &str) -> Result<(), FlowError> {
    if id.starts_with("trg_") {
        Ok(())
    } else {
        Err(FlowError::InvalidDsl(format!("trigger id {id:?} must carry the trg_ prefix")))
    }
}

pub fn validate_secret_id(id: &str) -> Result<(), FlowError> {
    if id.starts_with("sec_") {
        Ok(())
    } else {
        Err(FlowError::InvalidDsl(format!("secret id {id:?} must carry the sec_ prefix")))
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
