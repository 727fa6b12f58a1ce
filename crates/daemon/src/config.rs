// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment/config loading (spec §6 "Environment").

use flowjs_core::{parse_duration, FlowError, FlowResult};
use std::time::Duration;

/// Insecure fallback used only when `SECRETS_AES_KEY` is unset, so a dev
/// daemon still boots. Never use this in a deployed environment.
const DEV_FALLBACK_AES_KEY: &[u8; 32] = b"flowjs-works-dev-fallback-key!!!";

pub struct Config {
    pub http_addr: String,
    pub nats_url: String,
    pub database_url: String,
    pub secrets_aes_key: [u8; 32],
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> FlowResult<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let nats_url = env_or("NATS_URL", "nats://127.0.0.1:4222");
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("POSTGRES_DSN"))
            .map_err(|_| FlowError::InvalidDsl("DATABASE_URL or POSTGRES_DSN must be set".to_string()))?;
        let secrets_aes_key = load_aes_key();
        let request_timeout = match std::env::var("REQUEST_TIMEOUT") {
            Ok(raw) => parse_duration(&raw)?,
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self { http_addr, nats_url, database_url, secrets_aes_key, request_timeout })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn load_aes_key() -> [u8; 32] {
    match std::env::var("SECRETS_AES_KEY") {
        Ok(raw) => match base64_decode(&raw) {
            Some(bytes) if bytes.len() == 32 => {
                let mut key = [0u8; 32];
                key.copy_from_slice(&bytes);
                key
            }
            _ => {
                tracing::warn!("SECRETS_AES_KEY is set but is not 32 base64-encoded bytes; using the insecure development fallback key");
                *DEV_FALLBACK_AES_KEY
            }
        },
        Err(_) => {
            tracing::warn!("SECRETS_AES_KEY is not set; using the insecure development fallback key");
            *DEV_FALLBACK_AES_KEY
        }
    }
}

fn base64_decode(raw: &str) -> Option<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(raw.trim()).ok()
}
