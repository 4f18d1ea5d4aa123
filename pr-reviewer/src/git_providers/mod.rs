//! Source-control host access.
//!
//! GitHub is the only host.

pub mod types;
pub use types::*;

pub mod github;
pub use github::GitHubClient;
