#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	clippy::expect_used,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::as_conversions,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Local, durable storage for pending asset and document drafts.
//!
//! Every record lives in one of two namespaces (`media` or `documents`), each backed by
//! its own redb table in the same database file. Readers work on MVCC snapshots so the
//! overlay can look records up while the editing surface is writing them.

mod error;
mod record;
mod store;

pub use error::{Error, Result};
pub use record::{DraftKey, DraftRecord, DraftStatus, ModifiedContent, OriginalRef};
pub use store::{DraftDatabase, DraftStore, Drafts, Namespace};
