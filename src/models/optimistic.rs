// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Optimistic value with explicit reconciliation.
//!
//! A local change is applied immediately (`Pending`), then either confirmed
//! with the authoritative value read back from the store or rolled back to
//! the snapshot taken before the change.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Pending,
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct Optimistic<T: Clone> {
    value: T,
    snapshot: T,
    state: SyncState,
}

impl<T: Clone> Optimistic<T> {
    /// Wrap a value known to match the store.
    pub fn confirmed(value: T) -> Self {
        Self {
            snapshot: value.clone(),
            value,
            state: SyncState::Confirmed,
        }
    }

    /// Apply a local edit. The edit's return value is passed through.
    pub fn apply<R>(&mut self, edit: impl FnOnce(&mut T) -> R) -> R {
        self.snapshot = self.value.clone();
        self.state = SyncState::Pending;
        edit(&mut self.value)
    }

    /// Replace the local value with the authoritative one.
    pub fn confirm(&mut self, authoritative: T) {
        self.snapshot = authoritative.clone();
        self.value = authoritative;
        self.state = SyncState::Confirmed;
    }

    /// Restore the value from before the last edit.
    pub fn rollback(&mut self) {
        self.value = self.snapshot.clone();
        self.state = SyncState::RolledBack;
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
