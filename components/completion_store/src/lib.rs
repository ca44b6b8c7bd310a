//! Durable record of which playlists have been fully synced
//!
//! The store is the durability boundary of a sync run:
//! - every mutation is flushed before the call returns, never batched
//! - writes go to a temporary file in the same directory which then replaces
//!   the state file, so readers never observe a half-written file
//! - an absent, empty or unparsable state file never aborts a run, it is
//!   replaced by an empty record
//!
//! Only one process should own a given state file at a time.

mod error;
mod record;
mod store;

pub use error::StoreError;
pub use record::{CompletionRecord, StoreStats};
pub use store::CompletionStore;
