// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing bootstrap (SPEC_FULL.md §B.1). A library function rather than a
//! binary's `main`-time side effect, since `iml-daemon` builds no binary of
//! its own (spec.md §1 Non-goals) — whatever outer layer embeds this crate
//! calls `init_tracing` once at its own startup.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing_subscriber::fmt` subscriber filtered by `filter`
/// (typically `EnvFilter::from_default_env()`), falling back to `"info"`
/// when unset. Returns an error if a global subscriber is already set.
pub fn init_tracing(filter: EnvFilter) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::fmt().with_env_filter(filter).try_init()
}

/// Convenience wrapper over `init_tracing` using `RUST_LOG`, defaulting to
/// `info` when unset.
pub fn init_tracing_from_env() -> Result<(), tracing_subscriber::util::TryInitError> {
    init_tracing(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
}
