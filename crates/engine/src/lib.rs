// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow execution engine: secret resolution (C5), the `rhai` scripting
//! sandbox (C3), the process executor (C4), and the trigger manager (C6).

pub mod executor;
pub mod script;
pub mod secret;
pub mod trigger;

pub use executor::{ExecutionResult, ProcessExecutor};
pub use script::ScriptSandbox;
pub use secret::SecretResolver;
pub use trigger::{mcp_trigger_data, RestRoute, SoapRoute, TriggerManager, TriggerState};
