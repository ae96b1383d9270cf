// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transient marking used to de-duplicate query results.

use core::cell::Cell;

/// A scratch flag carried by items stored in a [`DirectTree`](crate::DirectTree).
///
/// Objects that straddle a split line live in several leaves. A query sets the mark the first
/// time it meets an object and clears every mark it set before returning, so callers never
/// observe a marked object between queries.
///
/// Setters take `&self`: queries run on shared references, so implementations use interior
/// mutability (typically a [`Cell<bool>`]).
pub trait Mark {
    /// Whether the item is currently marked.
    fn is_marked(&self) -> bool;

    /// Set or clear the mark.
    fn set_marked(&self, marked: bool);
}

impl Mark for Cell<bool> {
    #[inline]
    fn is_marked(&self) -> bool {
        self.get()
    }

    #[inline]
    fn set_marked(&self, marked: bool) {
        self.set(marked);
    }
}
