// Commit fetching across tracked repositories.
// Batches requests to stay under rate limits and resolves each repository's commits.

pub mod batch;
pub mod resolver;

pub use batch::BatchPolicy;
pub use resolver::CommitResolver;
