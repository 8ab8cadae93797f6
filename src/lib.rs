//! # refdoc-nav
//!
//! Client-side navigation index for generated reference documentation.
//!
//! ## Overview
//!
//! Every page of a generated reference manual carries a sidebar listing the modules, classes,
//! methods and other symbols reachable from it. Rather than baking that listing into each page,
//! the generator emits small per-directory *fragments*. Each fragment registers a symbol and the
//! children it defines, grouped by kind. A page loads the fragments relevant to it, merges what
//! they register, and renders one sidebar once everything has arrived.
//!
//! ### Key Features
//!
//! - **Order independent aggregation**: fragments complete in any order and the sidebar renders
//!   exactly once, when the DOM is ready and nothing is outstanding
//! - **Deferred inheritance**: a class can inherit from a parent whose fragment has not arrived
//!   yet; the request is retried after every registration
//! - **Session cache**: the rendered sidebar is reused on revisits until the documentation is
//!   republished
//! - **Relative links**: every emitted link is relative to the page being viewed
//!
//! ## Architecture
//!
//! - **[`context`]**: `NavContext`, the per-page aggregation state and the render gate
//! - **[`symbol`]**: symbol arena and name index
//! - **[`inherit`]**: deferred inheritance queue
//! - **[`loader`]**: fragment format, `FragmentSource` trait and load bookkeeping
//! - **[`merge`]**: name-keyed merge of child lists
//! - **[`render`]**: `NavTree` layout and sidebar markup
//! - **[`cache`]**: session storage of rendered sidebars
//! - **[`paths`]**: root-relative to page-relative link conversion
//! - **[`config`]**: per-page settings and the category table
//! - **[`event`]**: optional progress events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use refdoc_nav::{
//!     cache::MemorySessionStore, config::NavConfig, context::NavContext,
//!     event::CompletionTag, loader::FsFragmentSource,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut ctx = NavContext::new(NavConfig::for_page("predef/Stdio/File.html"))
//!         .with_source(Arc::new(FsFragmentSource::new("./html")))
//!         .with_session_store(Arc::new(MemorySessionStore::new()));
//!
//!     ctx.load("predef/Stdio/index.json", Some(CompletionTag::TopLevel), &[]);
//!     ctx.notify_dom_ready();
//!     println!("{:?}", ctx.run_until_idle().await);
//! }
//! ```
//!
//! ### Host-driven loading
//!
//! Without a fragment source the context only records what should be loaded. The host (for
//! instance the browser through the `wasm` feature) drains [`context::NavContext::take_requests`],
//! executes each fragment against the context and reports it with
//! [`context::NavContext::fragment_completed`].
//!
//! ## Feature Flags
//!
//! - **`bin`**: the `refdoc-nav` command line renderer
//! - **`wasm`**: browser bindings backed by `sessionStorage`

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod inherit;
pub mod loader;
pub mod merge;
pub mod paths;
pub mod render;
pub mod symbol;
#[cfg(test)]
mod tests;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::*;
