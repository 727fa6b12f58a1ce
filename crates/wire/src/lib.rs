// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit event wire protocol: consumes `AuditEvent`s published to the
//! message bus and forwards them to the Audit Batcher (spec §4.9).

pub mod subscriber;

pub use subscriber::{connect, AuditSubscriber, SUBJECT};
