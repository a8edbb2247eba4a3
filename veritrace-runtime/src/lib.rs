//! Veritrace Runtime
//!
//! Orchestration of one investigation:
//! - [`FrontierCrawler`]: budgeted breadth-first search/fetch/extract loop
//! - [`Investigator`]: concurrent fan-out to the crawler and source adapters
//! - [`MemoryCache`]: TTL cache for finished profiles

pub mod crawler;
pub mod investigator;
pub mod cache;

pub use crawler::*;
pub use investigator::*;
pub use cache::*;
