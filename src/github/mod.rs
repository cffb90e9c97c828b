// GitHub API module.
// Provides client, commit source boundary, and types for the GitHub REST API.

pub mod client;
pub mod endpoints;
pub mod source;
pub mod types;

pub use client::GitHubClient;
pub use source::CommitSource;
pub use types::*;
