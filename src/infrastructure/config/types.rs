//! Validated settings structure consumed by every other component (spec
//! §4.1's option table). C1 is the only component that parses configuration
//! files; downstream code only ever sees an already-validated [`AgentBrainConfig`].

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Daemon mode: one daemon per project, or one shared daemon for the host
/// (spec §3, `RuntimeMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Project,
    Shared,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Project
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmbeddingConfig {
    /// `null` (deterministic, no external dependency) or `http`.
    #[validate(length(min = 1))]
    pub provider: String,
    pub model: String,
    #[validate(range(min = 1))]
    pub dimensions: usize,
    /// HTTP endpoint, only consulted when `provider = "http"`.
    #[serde(default)]
    pub endpoint: String,
    #[validate(range(min = 1))]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "null".to_string(),
            model: "null-hash-embedder".to_string(),
            dimensions: 256,
            endpoint: String::new(),
            batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SummarizationConfig {
    /// `none` disables code summaries and LLM triple extraction, or `http`.
    #[validate(length(min = 1))]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub extract_endpoint: String,
    #[serde(default)]
    pub generate_summaries: bool,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            model: String::new(),
            endpoint: String::new(),
            extract_endpoint: String::new(),
            generate_summaries: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChunkingConfig {
    #[validate(range(min = 1))]
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    #[validate(range(min = 1))]
    pub min_chunk_size: usize,
    #[validate(range(min = 1))]
    pub max_chunk_size: usize,
    #[validate(range(min = 1))]
    pub chunk_lines: usize,
    pub chunk_lines_overlap: usize,
    #[validate(range(min = 1))]
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 64,
            min_chunk_size: 128,
            max_chunk_size: 2048,
            chunk_lines: 60,
            chunk_lines_overlap: 10,
            max_chars: 4000,
        }
    }
}

impl From<&ChunkingConfig> for crate::domain::chunking::ChunkConfig {
    fn from(c: &ChunkingConfig) -> Self {
        crate::domain::chunking::ChunkConfig {
            chunk_size: c.chunk_size,
            chunk_overlap: c.chunk_overlap,
            min_chunk_size: c.min_chunk_size,
            max_chunk_size: c.max_chunk_size,
            chunk_lines: c.chunk_lines,
            chunk_lines_overlap: c.chunk_lines_overlap,
            max_chars: c.max_chars,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IndexingConfig {
    #[validate(range(min = 1))]
    pub vector_write_batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            vector_write_batch_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QueryConfig {
    #[validate(range(min = 1, max = 50))]
    pub default_top_k: usize,
    #[validate(range(min = 0.0, max = 1.0))]
    pub default_similarity_threshold: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub default_alpha: f32,
    pub rrf_k: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            default_similarity_threshold: 0.0,
            default_alpha: 0.5,
            rrf_k: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GraphConfig {
    pub enable_graph_index: bool,
    #[validate(length(min = 1))]
    pub graph_store_type: String,
    #[validate(range(min = 1))]
    pub graph_max_triplets_per_chunk: usize,
    pub graph_use_code_metadata: bool,
    pub graph_use_llm_extraction: bool,
    #[validate(range(min = 1))]
    pub graph_traversal_depth: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enable_graph_index: false,
            graph_store_type: "filesystem".to_string(),
            graph_max_triplets_per_chunk: 10,
            graph_use_code_metadata: true,
            graph_use_llm_extraction: false,
            graph_traversal_depth: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LifecycleConfig {
    #[validate(length(min = 1))]
    pub bind_host: String,
    pub port_range_start: u16,
    pub port_range_end: u16,
    #[validate(range(min = 1))]
    pub startup_timeout_s: u64,
    #[validate(range(min = 1))]
    pub shutdown_timeout_s: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            port_range_start: 8700,
            port_range_end: 8799,
            startup_timeout_s: 10,
            shutdown_timeout_s: 10,
        }
    }
}

/// The fully validated settings structure every other component consumes
/// (spec §4.1). Produced once at startup by [`super::loader::ConfigLoader`];
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AgentBrainConfig {
    #[serde(default)]
    pub mode: Mode,
    #[validate(nested)]
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[validate(nested)]
    #[serde(default)]
    pub summarization: SummarizationConfig,
    #[validate(nested)]
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[validate(nested)]
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[validate(nested)]
    #[serde(default)]
    pub query: QueryConfig,
    #[validate(nested)]
    #[serde(default)]
    pub graph: GraphConfig,
    #[validate(nested)]
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

impl Default for AgentBrainConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            embedding: EmbeddingConfig::default(),
            summarization: SummarizationConfig::default(),
            chunking: ChunkingConfig::default(),
            indexing: IndexingConfig::default(),
            query: QueryConfig::default(),
            graph: GraphConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(AgentBrainConfig::default().validate().is_ok());
    }
}
