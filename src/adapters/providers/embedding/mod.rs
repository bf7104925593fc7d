//! Embedder implementations selected at startup from configuration.

pub mod http;
pub mod null;

pub use http::HttpEmbeddingProvider;
pub use null::NullEmbeddingProvider;

/// Tagged selector for the configured embedding implementation, resolved at
/// startup (spec §9: "variants ... are tagged implementations selected at
/// startup from settings").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// Deterministic hash embedder; no external dependency.
    Null,
    /// Generic HTTP-backed embedder.
    Http,
}

impl EmbeddingProviderKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "null" => Some(Self::Null),
            "http" => Some(Self::Http),
            _ => None,
        }
    }

    pub fn supported() -> &'static [&'static str] {
        &["null", "http"]
    }
}

impl std::fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Http => write!(f, "http"),
        }
    }
}
