//! # Store Adapters
//!
//! Implementations of the project and build store contracts.

pub mod filesystem_recorder;
pub mod memory_store;
pub mod static_projects;

pub use filesystem_recorder::FilesystemBuildRecorder;
pub use memory_store::InMemoryStore;
pub use static_projects::StaticProjectStore;
