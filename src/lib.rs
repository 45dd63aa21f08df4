#![forbid(unsafe_code)]

pub mod assemble;
pub mod campusnet;
pub mod cli;
pub mod crawl;
pub mod details;
pub mod envelope;
pub mod error;
pub mod formats;
pub mod logging;
pub mod normalize;
pub mod query;
pub mod report;
pub mod response_cache;
pub mod search;
pub mod terms;

pub use details::extract_details;
pub use error::ExtractError;
pub use response_cache::cache_key_for;
pub use search::extract_search;
