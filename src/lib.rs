//! Agent Brain: a per-project retrieval daemon that indexes docs and code,
//! then answers queries via vector, BM25, hybrid, graph, and multi-mode
//! search.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod server;

pub use domain::error::{Error, Result};

pub use server::{run_server, StartupOptions};
