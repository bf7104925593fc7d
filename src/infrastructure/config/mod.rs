//! Config / project resolver (C1): locates the project root, derives the
//! state-directory layout, and loads validated settings.

pub mod loader;
pub mod project;
pub mod types;

pub use loader::ConfigLoader;
pub use project::{resolve_project_root, state_dir, StorePaths};
pub use types::AgentBrainConfig;
