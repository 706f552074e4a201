//! Extraction run orchestration

pub mod coordinator;
pub mod summary;

pub use coordinator::ExtractCoordinator;
pub use summary::RunSummary;
