// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notifications drained with [`ObjectStorage::take_changes`](crate::ObjectStorage::take_changes).

use alloc::vec::Vec;

use crate::protocol::IndexSet;

/// One mutation of a storage's drawing order.
///
/// Positions are expressed in the layout right after the change was applied, except for
/// [`Removed`](Self::Removed) whose positions refer to the layout right before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageChange {
    /// Objects now occupy these positions.
    Inserted(IndexSet),
    /// Objects formerly at these positions are gone.
    Removed(IndexSet),
    /// The object at this position was swapped for another.
    Replaced(usize),
    /// An object moved from one position to another.
    Moved {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// The whole sequence was replaced.
    Reset,
}

/// Pending changes in the order they happened.
///
/// Nothing is recorded until tracking is switched on, so a storage nobody observes keeps no
/// history.
#[derive(Clone, Debug, Default)]
pub(crate) struct ChangeLog {
    pending: Vec<StorageChange>,
    tracking: bool,
}

impl ChangeLog {
    pub(crate) fn push(&mut self, change: StorageChange) {
        if !self.tracking {
            return;
        }
        match &change {
            StorageChange::Inserted(set) | StorageChange::Removed(set) if set.is_empty() => {}
            _ => self.pending.push(change),
        }
    }

    pub(crate) fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Switching tracking off drops whatever is pending.
    pub(crate) fn set_tracking(&mut self, tracking: bool) {
        self.tracking = tracking;
        if !tracking {
            self.pending = Vec::new();
        }
    }

    pub(crate) fn take(&mut self) -> Vec<StorageChange> {
        core::mem::take(&mut self.pending)
    }
}
