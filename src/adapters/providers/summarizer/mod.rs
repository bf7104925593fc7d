//! Summarizer / triple-extractor implementations selected at startup.

pub mod http;
pub mod null;

pub use http::HttpSummarizer;
pub use null::NullSummarizer;
