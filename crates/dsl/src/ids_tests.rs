// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn process_id_accepts_kebab_case() {
    assert!(validate_process_id("invoice-sync").is_ok());
    assert!(validate_process_id("a").is_ok());
}

#[test]
fn process_id_rejects_empty() {
    assert!(validate_process_id("").is_err());
}

#[test]
fn process_id_rejects_disallowed_chars() {
    assert!(validate_process_id("invoice sync").is_err());
    assert!(validate_process_id("invoice/sync").is_err());
}

#[test]
fn node_id_accepts_snake_case() {
    assert!(validate_node_id("fetch_order").is_ok());
    assert!(validate_node_id("n1").is_ok());
}

#[test]
fn node_id_rejects_leading_digit() {
    assert!(validate_node_id("1fetch").is_err());
}

#[test]
fn node_id_rejects_kebab_case() {
    assert!(validate_node_id("fetch-order").is_err());
}

#[test]
fn trigger_id_requires_prefix() {
    assert!(validate_trigger_id("trg_abc123").is_ok());
    assert!(validate_trigger_id("abc123").is_err());
}

#[test]
fn secret_id_requires_prefix() {
    assert!(validate_secret_id("sec_abc123").is_ok());
    assert!(validate_secret_id("abc123").is_err());
}
