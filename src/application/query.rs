//! Query engine (C9): routes to one of five retrieval modes and fuses
//! results.

use crate::application::indexing::IndexingCoordinator;
use crate::domain::error::{Error, Result};
use crate::domain::ports::vector_store::VectorBackendKind;
use crate::domain::ports::{EmbeddingProvider, GraphStore, KeywordStore, VectorStore};
use crate::domain::types::{ChunkMetadata, MetadataFilter, QueryMode, SourceType};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// `rrf_k` per spec §4.9's multi-mode fusion.
pub const RRF_K: f32 = 60.0;

/// Recognized request fields (spec §4.9).
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query_text: String,
    pub mode: QueryMode,
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub alpha: f32,
    pub source_types: Option<Vec<SourceType>>,
    pub languages: Option<Vec<String>>,
    pub file_paths: Option<Vec<String>>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            query_text: String::new(),
            mode: QueryMode::Hybrid,
            top_k: 5,
            similarity_threshold: 0.0,
            alpha: 0.5,
            source_types: None,
            languages: None,
            file_paths: None,
        }
    }
}

/// A single ranked result (spec §4.9 response shape).
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueryResultItem {
    pub chunk_id: String,
    pub text: String,
    pub source: String,
    pub score: f32,
    pub vector_score: Option<f32>,
    pub bm25_score: Option<f32>,
    pub graph_score: Option<f32>,
    pub source_type: SourceType,
    pub language: Option<String>,
    pub related_entities: Option<Vec<String>>,
    pub relationship_path: Option<String>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QueryResponse {
    pub results: Vec<QueryResultItem>,
    pub total_results: usize,
    pub query_time_ms: u64,
    pub warnings: Vec<String>,
}

pub struct QueryEngine {
    vector_store: Arc<dyn VectorStore>,
    keyword_store: Arc<dyn KeywordStore>,
    graph_store: Arc<dyn GraphStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    coordinator: Arc<IndexingCoordinator>,
    rrf_k: f32,
    graph_traversal_depth: usize,
}

impl QueryEngine {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        keyword_store: Arc<dyn KeywordStore>,
        graph_store: Arc<dyn GraphStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        coordinator: Arc<IndexingCoordinator>,
        rrf_k: f32,
        graph_traversal_depth: usize,
    ) -> Self {
        Self {
            vector_store,
            keyword_store,
            graph_store,
            embedder,
            coordinator,
            rrf_k,
            graph_traversal_depth,
        }
    }

    /// Whether graph mode can run: the vector backend must be graph-capable
    /// and the graph store must carry state (SPEC_FULL.md §2, spec §9 open
    /// question on backend capability probing).
    pub async fn graph_capable(&self) -> bool {
        matches!(
            self.vector_store.backend_kind(),
            VectorBackendKind::Filesystem | VectorBackendKind::Memory
        ) && self.graph_store.is_initialized().await
    }

    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let start = std::time::Instant::now();

        if request.query_text.trim().is_empty() {
            return Err(Error::bad_request("query_text must not be empty"));
        }
        if request.query_text.len() > 1000 {
            return Err(Error::bad_request("query_text exceeds 1000 characters"));
        }
        if request.top_k == 0 || request.top_k > 50 {
            return Err(Error::bad_request("top_k must be in [1, 50]"));
        }
        if !(0.0..=1.0).contains(&request.similarity_threshold) {
            return Err(Error::bad_request("similarity_threshold must be in [0,1]"));
        }
        if !(0.0..=1.0).contains(&request.alpha) {
            return Err(Error::bad_request("alpha must be in [0,1]"));
        }

        let status = self.coordinator.get_status().await;
        if status.is_indexing {
            return Err(Error::not_ready("an indexing job is currently running"));
        }
        if !self.vector_store.is_initialized().await {
            return Err(Error::not_ready("vector store is not initialized"));
        }

        let filter = build_filter(&request);
        let mut warnings = Vec::new();

        let mut results = match request.mode {
            QueryMode::Vector => self.vector_mode(&request, filter.as_ref()).await?,
            QueryMode::Bm25 => self.bm25_mode(&request, filter.as_ref()).await?,
            QueryMode::Hybrid => self.hybrid_mode(&request, filter.as_ref()).await?,
            QueryMode::Graph => self.graph_mode(&request, filter.as_ref()).await?,
            QueryMode::Multi => {
                if !self.graph_capable().await {
                    warnings.push(
                        "graph ranker dropped: active backend is not graph-capable or the graph store is empty"
                            .to_string(),
                    );
                }
                self.multi_mode(&request, filter.as_ref(), &mut warnings).await?
            }
        };

        results.truncate(request.top_k);
        let total_results = results.len();

        Ok(QueryResponse {
            results,
            total_results,
            query_time_ms: start.elapsed().as_millis() as u64,
            warnings,
        })
    }

    async fn vector_mode(
        &self,
        request: &QueryRequest,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryResultItem>> {
        let query_embedding = self.embedder.embed_query(&request.query_text).await?;
        let hits = self
            .vector_store
            .search(&query_embedding, request.top_k, request.similarity_threshold, filter)
            .await?;
        Ok(hits
            .into_iter()
            .map(|hit| QueryResultItem {
                chunk_id: hit.chunk_id,
                text: hit.text,
                source: hit.metadata.source.clone(),
                score: hit.score,
                vector_score: Some(hit.score),
                bm25_score: None,
                graph_score: None,
                source_type: hit.metadata.source_type,
                language: hit.metadata.language.map(|l| format!("{l:?}").to_lowercase()),
                related_entities: None,
                relationship_path: None,
                metadata: hit.metadata,
            })
            .collect())
    }

    async fn bm25_mode(
        &self,
        request: &QueryRequest,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryResultItem>> {
        if !self.keyword_store.is_initialized().await {
            return Err(Error::not_ready("keyword store is not initialized"));
        }
        let hits = self
            .keyword_store
            .search(&request.query_text, request.top_k, filter)
            .await?;
        Ok(hits
            .into_iter()
            .map(|hit| QueryResultItem {
                chunk_id: hit.chunk_id,
                text: hit.text,
                source: hit.metadata.source.clone(),
                score: hit.score,
                vector_score: None,
                bm25_score: Some(hit.score),
                graph_score: None,
                source_type: hit.metadata.source_type,
                language: hit.metadata.language.map(|l| format!("{l:?}").to_lowercase()),
                related_entities: None,
                relationship_path: None,
                metadata: hit.metadata,
            })
            .collect())
    }

    async fn hybrid_mode(
        &self,
        request: &QueryRequest,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryResultItem>> {
        let corpus_size = self.vector_store.count(filter).await?.max(1);
        let effective_top_k = request.top_k.min(corpus_size);

        let vector_results = self.vector_mode(
            &QueryRequest { top_k: effective_top_k.max(1), ..request.clone() },
            filter,
        ).await?;
        let bm25_results = if self.keyword_store.is_initialized().await {
            self.bm25_mode(
                &QueryRequest { top_k: effective_top_k.max(1), ..request.clone() },
                filter,
            )
            .await?
        } else {
            Vec::new()
        };

        let vector_max = vector_results.iter().map(|r| r.score).fold(0.0f32, f32::max);
        let bm25_max = bm25_results.iter().map(|r| r.score).fold(0.0f32, f32::max);

        let mut merged: HashMap<String, QueryResultItem> = HashMap::new();
        for mut item in vector_results {
            let normalized = if vector_max > 0.0 { item.score / vector_max } else { 0.0 };
            item.vector_score = Some(normalized);
            item.bm25_score = Some(0.0);
            item.score = request.alpha * normalized;
            merged.insert(item.chunk_id.clone(), item);
        }
        for item in bm25_results {
            let normalized = if bm25_max > 0.0 { item.score / bm25_max } else { 0.0 };
            merged
                .entry(item.chunk_id.clone())
                .and_modify(|existing| {
                    existing.bm25_score = Some(normalized);
                    existing.score += (1.0 - request.alpha) * normalized;
                })
                .or_insert_with(|| QueryResultItem {
                    bm25_score: Some(normalized),
                    vector_score: Some(0.0),
                    score: (1.0 - request.alpha) * normalized,
                    ..item
                });
        }

        let mut results: Vec<QueryResultItem> = merged.into_values().collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(results)
    }

    async fn graph_mode(
        &self,
        request: &QueryRequest,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryResultItem>> {
        if !self.graph_capable().await {
            return Err(Error::unsupported_backend(
                "graph mode requires the filesystem/memory vector backend and an initialized graph store",
            ));
        }

        let entities = extract_entities(&request.query_text);
        if entities.is_empty() {
            return self.vector_mode(request, filter).await;
        }

        // Iterative hop expansion (spec.md:189): hop 1 fetches triplets for the
        // query's own entities, each subsequent hop re-queries on the subjects
        // and objects discovered in the previous hop, up to `graph_traversal_depth`.
        let mut by_chunk: HashMap<String, (f32, HashSet<String>, Vec<String>)> = HashMap::new();
        let mut frontier: HashSet<String> = entities.iter().cloned().collect();
        let mut visited: HashSet<String> = HashSet::new();
        let depth = self.graph_traversal_depth.max(1);

        for hop in 0..depth {
            if frontier.is_empty() {
                break;
            }
            let mut next_frontier: HashSet<String> = HashSet::new();
            for entity in &frontier {
                if !visited.insert(entity.clone()) {
                    continue;
                }
                let triples = self.graph_store.triplets_for(entity).await?;
                for triple in triples.into_iter().take(20) {
                    let entry = by_chunk
                        .entry(triple.source_chunk_id.clone())
                        .or_insert_with(|| (0.0, HashSet::new(), Vec::new()));
                    // Shallower hops weigh more: the 1/(hop+1) falloff keeps
                    // direct hits ranked above transitively-reached ones.
                    entry.0 += 1.0 / (hop as f32 + 1.0);
                    entry.1.insert(triple.subject.clone());
                    entry.1.insert(triple.object.clone());
                    entry.2.push(format!("{} → {} → {}", triple.subject, triple.predicate, triple.object));
                    next_frontier.insert(triple.subject.clone());
                    next_frontier.insert(triple.object.clone());
                }
            }
            frontier = next_frontier;
        }

        if by_chunk.is_empty() {
            return self.vector_mode(request, filter).await;
        }

        let mut results = Vec::new();
        for (chunk_id, (score, related, paths)) in by_chunk {
            if let Some(hit) = self.vector_store.get(&chunk_id).await? {
                if let Some(f) = filter {
                    let mut fields = HashMap::new();
                    fields.insert("source".to_string(), hit.metadata.source.clone());
                    fields.insert("source_type".to_string(), hit.metadata.source_type.as_str().to_string());
                    if !f.matches(&fields) {
                        continue;
                    }
                }
                results.push(QueryResultItem {
                    chunk_id: hit.chunk_id,
                    text: hit.text,
                    source: hit.metadata.source.clone(),
                    score,
                    vector_score: None,
                    bm25_score: None,
                    graph_score: Some(score),
                    source_type: hit.metadata.source_type,
                    language: hit.metadata.language.map(|l| format!("{l:?}").to_lowercase()),
                    related_entities: Some(related.into_iter().sorted().collect()),
                    relationship_path: paths.first().cloned(),
                    metadata: hit.metadata,
                });
            }
        }

        if results.is_empty() {
            return self.vector_mode(request, filter).await;
        }
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(results)
    }

    async fn multi_mode(
        &self,
        request: &QueryRequest,
        filter: Option<&MetadataFilter>,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<QueryResultItem>> {
        let vector_future = self.vector_mode(request, filter);
        let bm25_future = async {
            if self.keyword_store.is_initialized().await {
                self.bm25_mode(request, filter).await
            } else {
                Ok(Vec::new())
            }
        };
        let graph_enabled = self.graph_capable().await;
        let graph_future = async {
            if graph_enabled {
                self.graph_mode(request, filter).await
            } else {
                Ok(Vec::new())
            }
        };

        let (vector_results, bm25_results, graph_results) =
            tokio::join!(vector_future, bm25_future, graph_future);
        let vector_results = vector_results?;
        let bm25_results = bm25_results?;
        let graph_results = match graph_results {
            Ok(r) => r,
            Err(Error::UnsupportedBackend { message }) => {
                warnings.push(message);
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let rankers: Vec<Vec<QueryResultItem>> = vec![vector_results, bm25_results, graph_results]
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect();

        let mut rrf_scores: HashMap<String, f32> = HashMap::new();
        let mut by_id: HashMap<String, QueryResultItem> = HashMap::new();
        for ranker in &rankers {
            for (rank, item) in ranker.iter().enumerate() {
                *rrf_scores.entry(item.chunk_id.clone()).or_insert(0.0) +=
                    1.0 / (self.rrf_k + rank as f32 + 1.0);
                by_id
                    .entry(item.chunk_id.clone())
                    .and_modify(|existing| {
                        existing.vector_score = existing.vector_score.or(item.vector_score);
                        existing.bm25_score = existing.bm25_score.or(item.bm25_score);
                        existing.graph_score = existing.graph_score.or(item.graph_score);
                        existing.related_entities =
                            existing.related_entities.clone().or(item.related_entities.clone());
                        existing.relationship_path =
                            existing.relationship_path.clone().or(item.relationship_path.clone());
                    })
                    .or_insert_with(|| item.clone());
            }
        }

        let mut results: Vec<QueryResultItem> = rrf_scores
            .into_iter()
            .filter_map(|(id, score)| {
                by_id.remove(&id).map(|mut item| {
                    item.score = score;
                    item
                })
            })
            .collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(results)
    }
}

fn build_filter(request: &QueryRequest) -> Option<MetadataFilter> {
    let mut clauses = Vec::new();
    if let Some(source_types) = &request.source_types {
        clauses.push(MetadataFilter::In {
            field: "source_type".to_string(),
            values: source_types.iter().map(|s| s.as_str().to_string()).collect(),
        });
    }
    if let Some(languages) = &request.languages {
        clauses.push(MetadataFilter::In {
            field: "language".to_string(),
            values: languages.clone(),
        });
    }
    if let Some(file_paths) = &request.file_paths {
        clauses.push(MetadataFilter::In {
            field: "source".to_string(),
            values: file_paths.clone(),
        });
    }
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(MetadataFilter::And(clauses)),
    }
}

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "in", "on", "for", "to", "is", "are", "how", "what",
    "find", "get", "does", "do",
];

/// Token heuristics from spec §4.9: CamelCase spans, snake_case identifiers,
/// ALL_CAPS, capitalized words; drop stopwords; cap at 10.
fn extract_entities(query_text: &str) -> Vec<String> {
    let mut entities = Vec::new();
    for word in query_text.split_whitespace() {
        let cleaned: String = word.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect();
        if cleaned.is_empty() {
            continue;
        }
        let lower = cleaned.to_lowercase();
        if STOPWORDS.contains(&lower.as_str()) {
            continue;
        }
        let is_camel = cleaned.chars().any(|c| c.is_uppercase())
            && cleaned.chars().any(|c| c.is_lowercase())
            && cleaned.chars().next().is_some_and(|c| c.is_uppercase());
        let is_snake = cleaned.contains('_') && cleaned.chars().all(|c| c.is_lowercase() || c == '_' || c.is_numeric());
        let is_all_caps = cleaned.len() > 1 && cleaned.chars().all(|c| c.is_uppercase() || c == '_');
        let is_capitalized = cleaned.chars().next().is_some_and(|c| c.is_uppercase());

        if is_camel || is_snake || is_all_caps || is_capitalized {
            entities.push(cleaned);
        }
        if entities.len() >= 10 {
            break;
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_camel_and_snake_and_caps() {
        let entities = extract_entities("how does AuthenticationError relate to db_connection and MAX_RETRY");
        assert!(entities.contains(&"AuthenticationError".to_string()));
        assert!(entities.contains(&"db_connection".to_string()));
        assert!(entities.contains(&"MAX_RETRY".to_string()));
    }

    #[test]
    fn caps_at_ten_entities() {
        let text: String = (0..20).map(|i| format!("EntityNum{i} ")).collect();
        let entities = extract_entities(&text);
        assert!(entities.len() <= 10);
    }
}
