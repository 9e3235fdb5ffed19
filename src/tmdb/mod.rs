pub mod client;
pub mod types;

pub use client::{discover_url, search_url, MovieApi, TmdbClient, TmdbError, TmdbResult};
pub use types::*;
