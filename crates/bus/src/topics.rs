// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Standard topic names (spec.md §4.5).

pub const PLANS: &str = "llmos.plans";
pub const ACTIONS: &str = "llmos.actions";
pub const SECURITY: &str = "llmos.security";
pub const ERRORS: &str = "llmos.errors";
pub const PERCEPTION: &str = "llmos.perception";
pub const IOT: &str = "llmos.iot";
pub const DB_CHANGES: &str = "llmos.db.changes";
pub const FILESYSTEM: &str = "llmos.filesystem";
pub const PERMISSIONS: &str = "llmos.permissions";
pub const TRIGGERS: &str = "llmos.triggers";
