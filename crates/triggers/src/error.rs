// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use iml_core::TriggerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("trigger not found: {0}")]
    NotFound(TriggerId),
    #[error("trigger {0} is not enabled or not in a fire-ready state")]
    NotFireReady(TriggerId),
    #[error("watcher setup failed for trigger {0}: {1}")]
    WatcherSetup(TriggerId, String),
    #[error(transparent)]
    Storage(#[from] iml_storage::StorageError),
}
