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

//! Draft overlay: serves unpublished asset edits in place of the origin's copies.
//!
//! A request flows through the [`PathNormalizer`] (is this an asset, and under which
//! key would its draft live?), a single [`DraftStore`] lookup and the [`Resolver`]'s
//! state machine. The [`Overlay`] then turns the [`Resolution`] into a response, either
//! synthesized locally or fetched through the [`Upstream`].

pub mod config;
pub mod data_url;
pub mod drafts_api;
pub mod error;
pub mod media;
pub mod normalize;
pub mod overlay;
pub mod placeholder;
pub mod proxy;
pub mod request;
pub mod resolver;
pub mod serve;
pub mod upstream;

pub use config::OverlayConfig;
pub use dp_draft_store::{DraftKey, DraftRecord, DraftStatus, DraftStore};
pub use error::{Error, Result};
pub use normalize::PathNormalizer;
pub use overlay::Overlay;
pub use request::InterceptedRequest;
pub use resolver::{Resolution, Resolver, SiteOrigin};
pub use upstream::{HttpUpstream, Upstream};
