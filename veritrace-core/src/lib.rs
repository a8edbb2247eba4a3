//! Veritrace Core - evidence model and pure aggregation logic
//!
//! This crate provides the I/O-free half of an investigation:
//! - Typed leads (emails, handles, URLs, wallet-like tokens) and scam mentions
//! - Pattern-table lead extraction from unstructured text
//! - Dork-style query derivation from a target identifier
//! - Per-producer partial profiles and the merged aggregated profile
//! - A transparent keyword-severity risk scorer
//! - Collaborator traits for search, page fetching, sources and caching

pub mod leads;
pub mod extract;
pub mod queries;
pub mod profile;
pub mod merge;
pub mod risk;
pub mod config;
pub mod collaborators;

pub use leads::*;
pub use extract::*;
pub use queries::*;
pub use profile::*;
pub use merge::*;
pub use risk::*;
pub use config::*;
pub use collaborators::*;

/// Characters of surrounding text captured on each side of a scam keyword
pub const MENTION_CONTEXT_RADIUS: usize = 50;

/// Lowest possible risk score
pub const MIN_SCORE: u8 = 0;

/// Highest possible risk score
pub const MAX_SCORE: u8 = 100;
