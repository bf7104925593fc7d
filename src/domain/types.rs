//! Core entity types shared by every component of the retrieval core.
//!
//! These are plain data types with no behavior beyond construction helpers
//! and invariant checks; the components in [`crate::application`] own the
//! logic that produces and consumes them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum allowed `token_count` for a persisted [`Chunk`].
pub const MIN_CHUNK_TOKENS: usize = 128;
/// Maximum allowed `token_count` for a persisted [`Chunk`].
pub const MAX_CHUNK_TOKENS: usize = 2048;

/// The coarse classification C4 assigns to every loaded file.
///
/// # Example
/// ```
/// use agent_brain::domain::types::SourceType;
/// assert_eq!(SourceType::Doc.as_str(), "doc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Prose documentation (markdown, plain text, reStructuredText).
    Doc,
    /// Application or library source code.
    Code,
    /// Source code that is itself a test file.
    Test,
}

impl SourceType {
    /// The lowercase wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Doc => "doc",
            SourceType::Code => "code",
            SourceType::Test => "test",
        }
    }
}

/// Source languages the code chunker has an AST-aware path for.
///
/// Unlisted extensions fall back to [`SourceType::Doc`] classification or to
/// the generic line-window chunker, per C4/C5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Markdown,
    PlainText,
}

impl Language {
    /// Map a file extension (without the leading dot) to a language, if known.
    ///
    /// # Example
    /// ```
    /// use agent_brain::domain::types::Language;
    /// assert_eq!(Language::from_extension("ts"), Some(Language::TypeScript));
    /// assert_eq!(Language::from_extension("xyz"), None);
    /// ```
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext.to_ascii_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cc" | "cpp" | "cxx" | "hpp" | "hh" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            "md" | "mdx" => Language::Markdown,
            "txt" | "rst" => Language::PlainText,
            _ => return None,
        })
    }

    /// Whether this language has an AST-aware chunker (as opposed to being
    /// handled purely by the prose chunker).
    pub fn is_code(&self) -> bool {
        !matches!(self, Language::Markdown | Language::PlainText)
    }
}

/// The kind of symbol a code chunk's dominant symbol metadata describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Type,
    Interface,
    Impl,
}

/// A file as discovered and read by C4, before chunking.
///
/// Not persisted: it is consumed exactly once by [`crate::domain::chunking`]
/// during an indexing run.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Absolute path to the file.
    pub source: String,
    /// File name, for display purposes.
    pub file_name: String,
    /// Decoded UTF-8 file contents.
    pub text: String,
    /// doc / code / test classification.
    pub source_type: SourceType,
    /// Detected language, when the extension is recognized.
    pub language: Option<Language>,
    /// Content hash, used to detect unchanged files across re-indexing runs.
    pub file_hash: String,
}

/// Optional code-specific attributes attached to a chunk's metadata when the
/// chunk's dominant symbol was resolved by the AST-aware chunker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeSymbolMetadata {
    pub symbol_name: Option<String>,
    pub symbol_kind: Option<SymbolKind>,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub docstring: Option<String>,
    pub parameters: Option<Vec<String>>,
    pub return_type: Option<String>,
    pub parent: Option<String>,
    pub imports: Option<Vec<String>>,
    /// Filled in by C6 when a `Summarizer` is configured; absent otherwise.
    pub summary: Option<String>,
}

/// Optional prose-specific attributes attached to a chunk's metadata by the
/// prose chunker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProseMetadata {
    /// Accumulated `#`-heading breadcrumb, e.g. `["Guide", "Setup"]`.
    pub heading_path: Vec<String>,
    /// The nearest enclosing heading's title, if any.
    pub section_title: Option<String>,
}

/// Semantic attributes attached to every chunk.
///
/// `chunk_id` is a deterministic function of `(source, chunk_index)` — see
/// [`crate::domain::chunking::chunk_id`] — so re-indexing unchanged content
/// reproduces the same ids and upserts rather than duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_id: String,
    pub source: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub source_type: SourceType,
    pub language: Option<Language>,
    #[serde(default, flatten)]
    pub code: CodeSymbolMetadata,
    #[serde(default, flatten)]
    pub prose: ProseMetadata,
}

/// A bounded, embeddable unit of text or code.
///
/// Invariant: `MIN_CHUNK_TOKENS <= token_count <= MAX_CHUNK_TOKENS` for every
/// chunk that reaches C6; see [`Chunk::new`].
///
/// # Example
/// ```
/// use agent_brain::domain::types::{Chunk, ChunkMetadata, ChunkKind, SourceType};
/// let metadata = ChunkMetadata {
///     chunk_id: "abc123".into(),
///     source: "notes.md".into(),
///     chunk_index: 0,
///     total_chunks: 1,
///     source_type: SourceType::Doc,
///     language: None,
///     code: Default::default(),
///     prose: Default::default(),
/// };
/// let chunk = Chunk::new("hello world".into(), 200, metadata, ChunkKind::Text);
/// assert!(chunk.is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub text: String,
    pub token_count: usize,
    pub metadata: ChunkMetadata,
    pub kind: ChunkKind,
}

/// Tag distinguishing a [`Chunk`] produced by the prose chunker from one
/// produced by the code chunker (`TextChunk | CodeChunk` in the data model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Text,
    Code,
}

impl Chunk {
    /// Construct a chunk, rejecting token counts outside the allowed band.
    pub fn new(
        text: String,
        token_count: usize,
        metadata: ChunkMetadata,
        kind: ChunkKind,
    ) -> Result<Self, String> {
        if !(MIN_CHUNK_TOKENS..=MAX_CHUNK_TOKENS).contains(&token_count) {
            return Err(format!(
                "token_count {token_count} outside allowed range [{MIN_CHUNK_TOKENS}, {MAX_CHUNK_TOKENS}]"
            ));
        }
        Ok(Self {
            chunk_id: metadata.chunk_id.clone(),
            text,
            token_count,
            metadata,
            kind,
        })
    }
}

/// A fixed-dimension embedding vector.
///
/// The dimension is fixed at vector-store initialization; every embedding
/// written to one collection must share it (see [`crate::domain::error::Error::DimensionMismatch`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub model: String,
    pub dimensions: usize,
}

impl Embedding {
    /// Cosine similarity between two embeddings of equal dimension, in `[-1, 1]`.
    ///
    /// # Example
    /// ```
    /// use agent_brain::domain::types::Embedding;
    /// let a = Embedding { vector: vec![1.0, 0.0], model: "m".into(), dimensions: 2 };
    /// let b = Embedding { vector: vec![1.0, 0.0], model: "m".into(), dimensions: 2 };
    /// assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
    /// ```
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        let dot: f32 = self
            .vector
            .iter()
            .zip(other.vector.iter())
            .map(|(a, b)| a * b)
            .sum();
        let norm_a = self.vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm_b = other.vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// The entity/relation type attached to either side of a [`GraphTriple`], when
/// the extractor is able to classify it (e.g. `function`, `module`, `concept`).
pub type EntityType = Option<String>;

/// An immutable `(subject, predicate, object)` fact produced by C7.
///
/// The graph is append-only: deleting the originating chunk does not remove
/// triplets derived from it (see spec data model, `GraphTriple`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphTriple {
    pub subject: String,
    pub subject_type: EntityType,
    pub predicate: String,
    pub object: String,
    pub object_type: EntityType,
    /// Back-reference to the chunk this fact was derived from.
    pub source_chunk_id: String,
}

/// Status of the singleton indexing job owned by C8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingStatus {
    Idle,
    Indexing,
    Completed,
    Failed,
}

/// The single in-process indexing job's state, mutated only by C8 and read
/// by C10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingState {
    pub current_job_id: Option<String>,
    pub status: IndexingStatus,
    pub is_indexing: bool,
    pub folder_path: Option<String>,
    pub total_documents: usize,
    pub processed_documents: usize,
    pub total_chunks: usize,
    pub total_doc_chunks: usize,
    pub total_code_chunks: usize,
    pub progress_percent: u8,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
    pub indexed_folders: std::collections::BTreeSet<String>,
    pub supported_languages: std::collections::BTreeSet<String>,
}

impl Default for IndexingState {
    fn default() -> Self {
        Self {
            current_job_id: None,
            status: IndexingStatus::Idle,
            is_indexing: false,
            folder_path: None,
            total_documents: 0,
            processed_documents: 0,
            total_chunks: 0,
            total_doc_chunks: 0,
            total_code_chunks: 0,
            progress_percent: 0,
            started_at: None,
            completed_at: None,
            error: None,
            indexed_folders: Default::default(),
            supported_languages: Default::default(),
        }
    }
}

/// Daemon mode: one daemon per project, or one shared daemon for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    Project,
    Shared,
}

/// The daemon's self-advertisement, written to `runtime.json` once the
/// server is ready to accept requests and removed on clean shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeRecord {
    pub schema_version: String,
    pub mode: RuntimeMode,
    pub project_root: String,
    pub instance_id: String,
    pub base_url: String,
    pub bind_host: String,
    pub port: u16,
    pub pid: u32,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// The single-instance lock written at startup to `lock.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub pid: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Recognized retrieval strategies for C9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    Vector,
    Bm25,
    Hybrid,
    Graph,
    Multi,
}

/// A metadata filter recognized by `search(..., filter)`.
///
/// Only the operators named in spec §4.3 are supported: equality, set
/// membership, and conjunction of either.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFilter {
    Eq { field: String, value: String },
    In { field: String, values: Vec<String> },
    And(Vec<MetadataFilter>),
}

impl MetadataFilter {
    /// Evaluate the filter against a chunk's metadata, expressed as a flat
    /// string map (the vector/keyword stores build this view from
    /// [`ChunkMetadata`] before calling in).
    pub fn matches(&self, fields: &HashMap<String, String>) -> bool {
        match self {
            MetadataFilter::Eq { field, value } => {
                fields.get(field).is_some_and(|v| v == value)
            }
            MetadataFilter::In { field, values } => {
                fields.get(field).is_some_and(|v| values.contains(v))
            }
            MetadataFilter::And(filters) => filters.iter().all(|f| f.matches(fields)),
        }
    }
}

/// A single scored hit returned by a storage manager's `search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping_is_case_insensitive() {
        assert_eq!(Language::from_extension("RS"), Some(Language::Rust));
        assert_eq!(Language::from_extension("Py"), Some(Language::Python));
    }

    #[test]
    fn chunk_rejects_out_of_band_token_counts() {
        let metadata = ChunkMetadata {
            chunk_id: "x".into(),
            source: "f.rs".into(),
            chunk_index: 0,
            total_chunks: 1,
            source_type: SourceType::Code,
            language: Some(Language::Rust),
            code: Default::default(),
            prose: Default::default(),
        };
        assert!(Chunk::new("a".into(), 10, metadata.clone(), ChunkKind::Code).is_err());
        assert!(Chunk::new("a".into(), 4096, metadata, ChunkKind::Code).is_err());
    }

    #[test]
    fn metadata_filter_and_requires_all() {
        let mut fields = HashMap::new();
        fields.insert("language".to_string(), "rust".to_string());
        fields.insert("source_type".to_string(), "code".to_string());
        let filter = MetadataFilter::And(vec![
            MetadataFilter::Eq {
                field: "language".into(),
                value: "rust".into(),
            },
            MetadataFilter::Eq {
                field: "source_type".into(),
                value: "doc".into(),
            },
        ]);
        assert!(!filter.matches(&fields));
    }
}
