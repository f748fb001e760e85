//! poetry-search - classical Chinese poetry search
//!
//! Local search over a static poetry corpus with weighted field scoring,
//! fuzzy matching, highlighted excerpts, a persisted result cache and a
//! bounded query history.

pub mod clock;
pub mod corpus;
pub mod error;
pub mod history;
pub mod search;
pub mod service;
pub mod storage;
pub mod types;

pub use corpus::Corpus;
pub use error::{PoetryError, Result};
pub use service::PoetrySearchService;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
