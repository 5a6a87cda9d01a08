//! Background Tasks Module
//!
//! Contains the per-cache reconciliation task: the single periodic loop that
//! synchronizes write events into the expiration index, maintains the LRU
//! tracker, and sweeps expired entries.

mod reconcile;

pub(crate) use reconcile::spawn_reconcile_task;
