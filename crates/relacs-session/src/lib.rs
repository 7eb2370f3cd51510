//! Session-scoped metadata/stimulus-data/settings locking and lifecycle
//! (spec.md §4.8), plus the on-disk table writer spec.md §6 describes for
//! trace/event files, grounded on `original_source/datafile/src/
//! tablekey.cc`.

mod error;
mod session;
mod tablekey;

pub use error::{SessionError, SessionResult};
pub use session::{LockedOptions, Session, SessionState};
pub use tablekey::{TableColumn, TableKey, TableWriter};
