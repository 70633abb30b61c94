//! TitanWalk - campus navigation and accessibility state engine.
//!
//! This library owns the authoritative set of navigable campus locations
//! and their open/closed status, tracks a moving observer, mediates
//! walking-route requests to an external directions provider, and gates
//! every location mutation behind an authorization check tied to an
//! operating mode. Presentation (map rendering, sheets, pins) lives
//! outside this crate and only calls the [`engine::NavigationEngine`]
//! façade.
//!
//! # High-Level API
//!
//! ```ignore
//! use titanwalk::auth::StaticVerifier;
//! use titanwalk::campus::CAMPUS_SEED;
//! use titanwalk::engine::{EngineConfig, NavigationEngine};
//! use titanwalk::position::FixedSource;
//! use titanwalk::route::{OsrmDirections, ReqwestClient};
//!
//! let provider = OsrmDirections::new(ReqwestClient::new()?);
//! let source = FixedSource::new(start_point);
//! let engine = NavigationEngine::new(
//!     EngineConfig::default(),
//!     Box::new(StaticVerifier::default()),
//!     provider,
//!     source,
//!     &CAMPUS_SEED,
//! );
//!
//! engine.start();
//! let library = engine.search_by_name("Library")?;
//! engine.select_destination(library.id).await?;
//! ```

pub mod auth;
pub mod campus;
pub mod coord;
pub mod engine;
mod error;
pub mod position;
pub mod registry;
pub mod route;

pub use error::EngineError;

/// Version of the TitanWalk library and CLI.
///
/// Synchronized across the workspace; injected from `Cargo.toml` at
/// compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
