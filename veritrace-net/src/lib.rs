//! Veritrace network layer
//!
//! Reference implementations of the search and fetch collaborators:
//! - A shared HTTP transport with optional proxy and user-agent rotation
//! - DuckDuckGo HTML and Brave API search executors
//! - An HTML page fetcher reducing pages to title and visible text

pub mod transport;
pub mod search;
pub mod fetch;

pub use transport::*;
pub use search::*;
pub use fetch::*;
