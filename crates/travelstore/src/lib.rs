//! `travelstore` - A local record store for travel journal entries
//!
//! Entries are kept as one JSON collection under a single key of an
//! asynchronous key-value backend. The [`EntryStore`] enforces the entry
//! schema on everything it reads or writes, keeps ids unique, returns entries
//! newest first, and re-reads after every write to confirm the result.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod logging;
pub mod storage;
pub mod store;
pub mod validate;

pub use config::Config;
pub use entry::{generate_entry_id, TravelEntry, Weather};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{ConsistencyMode, EntryStore, StoreDiagnostics};
pub use validate::{is_travel_entry, is_travel_entry_collection};
