//! Core data structures shared across the crate.

mod entry;
mod feed;

pub use entry::{Entry, EntryStatus};
pub use feed::{Category, Feed};
