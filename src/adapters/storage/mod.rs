//! Bundled filesystem-backed implementations of the three storage ports
//! (C3). Each store owns one file (or one file per index) under the
//! project's state directory — see [`crate::infrastructure::config`].

pub mod graph_fs;
pub mod keyword_bm25;
pub mod vector_fs;

pub use graph_fs::FilesystemGraphStore;
pub use keyword_bm25::Bm25KeywordStore;
pub use vector_fs::FilesystemVectorStore;
