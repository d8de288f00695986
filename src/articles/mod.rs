//! Source-independent article handling.
//!
//! Everything in here is pure and synchronous: it works on payloads that
//! have already been fetched and never touches the network, the filesystem
//! or the clock.
//!
//! - [`path`]: dot-path lookup into JSON payloads
//! - [`timestamp`]: tolerant publication-time parsing
//! - [`mapper`]: payload → [`crate::models::NormalizedArticle`]
//! - [`rank`]: newest-first ordering and top-N truncation

pub mod mapper;
pub mod path;
pub mod rank;
pub mod timestamp;

pub use mapper::map_response;
pub use rank::rank_and_limit;
