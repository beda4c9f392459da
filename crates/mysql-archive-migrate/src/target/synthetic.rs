//! Synthetic identifier generation for dry runs.
//!
//! Migration call sites are linear: an id returned by one write is often the
//! foreign key of the next. A dry run therefore still has to hand out
//! something shaped like a real id, it just must not touch storage. Values
//! come from a plain monotonic counter so test assertions stay deterministic,
//! starting high enough that a synthetic id is recognizable in logs and never
//! mistaken for a zero/null key.

use std::sync::atomic::{AtomicI64, Ordering};

/// Default first value handed out by [`SyntheticIds::new`].
pub const SYNTHETIC_ID_BASE: i64 = 1_000_000_000;

/// Monotonic counter for dry-run identifiers.
///
/// Scoped to one adapter instance; ids are unique within that instance's
/// output but carry no durability guarantee. Dry run validates structure,
/// not data integrity.
pub struct SyntheticIds {
    next: AtomicI64,
}

impl SyntheticIds {
    /// Counter starting at [`SYNTHETIC_ID_BASE`].
    pub fn new() -> Self {
        Self::starting_at(SYNTHETIC_ID_BASE)
    }

    /// Counter starting at `base`; the first id handed out is `base` itself.
    pub fn starting_at(base: i64) -> Self {
        Self {
            next: AtomicI64::new(base),
        }
    }

    /// Next synthetic id.
    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for SyntheticIds {
    fn default() -> Self {
        Self::new()
    }
}
