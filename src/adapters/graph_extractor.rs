//! Graph extractor (C7): produces triplets from chunk metadata
//! deterministically, and optionally from chunk text via a configured
//! [`TripleExtractor`].

use crate::domain::ports::summarizer::ExtractionHint;
use crate::domain::ports::TripleExtractor;
use crate::domain::types::{Chunk, GraphTriple};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// `identifier(` with no keyword/control-flow prefix, i.e. a call site
/// rather than a function definition or an `if (...)`-style construct.
static CALL_SITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());

/// Keywords that parse as `identifier(` but are not call sites, across the
/// languages the code chunker supports (spec §4.5's language table).
const CALL_SITE_STOPWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "match", "fn", "def", "func",
    "function", "class", "struct", "impl", "interface", "sizeof", "typeof", "in",
    "foreach", "and", "or", "not",
];

/// Deterministic extractor over code chunk metadata (spec §4.7, "Code
/// metadata extractor").
pub fn extract_from_metadata(chunk: &Chunk, max_triplets: usize) -> Vec<GraphTriple> {
    let mut triples = Vec::new();
    let Some(symbol_name) = chunk.metadata.code.symbol_name.clone() else {
        return triples;
    };

    triples.push(GraphTriple {
        subject: symbol_name.clone(),
        subject_type: chunk.metadata.code.symbol_kind.map(|k| format!("{k:?}").to_lowercase()),
        predicate: "defined_in".to_string(),
        object: chunk.metadata.source.clone(),
        object_type: Some("file".to_string()),
        source_chunk_id: chunk.chunk_id.clone(),
    });

    if let Some(kind) = chunk.metadata.code.symbol_kind {
        triples.push(GraphTriple {
            subject: symbol_name.clone(),
            subject_type: None,
            predicate: "has_type".to_string(),
            object: format!("{kind:?}").to_lowercase(),
            object_type: Some("symbol_kind".to_string()),
            source_chunk_id: chunk.chunk_id.clone(),
        });
    }

    if let Some(parent) = &chunk.metadata.code.parent {
        triples.push(GraphTriple {
            subject: symbol_name.clone(),
            subject_type: None,
            predicate: "belongs_to".to_string(),
            object: parent.clone(),
            object_type: None,
            source_chunk_id: chunk.chunk_id.clone(),
        });
    }

    if let Some(imports) = &chunk.metadata.code.imports {
        for import in imports {
            triples.push(GraphTriple {
                subject: chunk.metadata.source.clone(),
                subject_type: Some("file".to_string()),
                predicate: "imports".to_string(),
                object: import.clone(),
                object_type: None,
                source_chunk_id: chunk.chunk_id.clone(),
            });
        }
    }

    for callee in scan_call_sites(&chunk.text, &symbol_name) {
        triples.push(GraphTriple {
            subject: symbol_name.clone(),
            subject_type: chunk.metadata.code.symbol_kind.map(|k| format!("{k:?}").to_lowercase()),
            predicate: "calls".to_string(),
            object: callee,
            object_type: None,
            source_chunk_id: chunk.chunk_id.clone(),
        });
    }

    triples.truncate(max_triplets);
    triples
}

/// Pattern-based call-site extraction (spec §4.7): every `identifier(` in
/// the chunk's text that isn't a keyword/control-flow construct and isn't
/// the dominant symbol's own definition, deduplicated and order-preserving.
fn scan_call_sites(text: &str, own_symbol: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut callees = Vec::new();
    for capture in CALL_SITE_RE.captures_iter(text) {
        let name = &capture[1];
        if name == own_symbol || CALL_SITE_STOPWORDS.contains(&name) {
            continue;
        }
        if seen.insert(name.to_string()) {
            callees.push(name.to_string());
        }
    }
    callees
}

/// Union of the deterministic extractor and an optional LLM extractor,
/// bounded by `graph_max_triplets_per_chunk`. LLM failures never fail the
/// pipeline (spec §4.7).
pub async fn extract(
    chunk: &Chunk,
    triple_extractor: Option<&Arc<dyn TripleExtractor>>,
    max_triplets: usize,
) -> Vec<GraphTriple> {
    let mut triples = extract_from_metadata(chunk, max_triplets);

    if let Some(extractor) = triple_extractor {
        if triples.len() < max_triplets {
            let hint = ExtractionHint {
                language: chunk.metadata.language.map(|l| format!("{l:?}").to_lowercase()),
                source: Some(chunk.metadata.source.clone()),
            };
            match extractor.extract_triples(&chunk.text, &hint).await {
                Ok(extracted) => {
                    for t in extracted {
                        if triples.len() >= max_triplets {
                            break;
                        }
                        triples.push(GraphTriple {
                            subject: t.subject,
                            subject_type: t.subject_type,
                            predicate: t.predicate,
                            object: t.object,
                            object_type: t.object_type,
                            source_chunk_id: chunk.chunk_id.clone(),
                        });
                    }
                }
                Err(err) => {
                    tracing::warn!(chunk_id = %chunk.chunk_id, error = %err, "LLM triple extraction failed, skipping");
                }
            }
        }
    }

    triples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChunkKind, ChunkMetadata, CodeSymbolMetadata, SourceType, SymbolKind};

    fn code_chunk_with_text(text: &str) -> Chunk {
        Chunk::new(
            text.into(),
            200,
            ChunkMetadata {
                chunk_id: "c1".into(),
                source: "lib.rs".into(),
                chunk_index: 0,
                total_chunks: 1,
                source_type: SourceType::Code,
                language: Some(crate::domain::types::Language::Rust),
                code: CodeSymbolMetadata {
                    symbol_name: Some("foo".into()),
                    symbol_kind: Some(SymbolKind::Function),
                    parent: Some("Widget".into()),
                    imports: Some(vec!["use std::fmt;".into()]),
                    ..Default::default()
                },
                prose: Default::default(),
            },
            ChunkKind::Code,
        )
        .unwrap()
    }

    fn code_chunk() -> Chunk {
        code_chunk_with_text("fn foo() {}")
    }

    #[test]
    fn metadata_extractor_emits_defined_in_and_belongs_to() {
        let triples = extract_from_metadata(&code_chunk(), 10);
        assert!(triples.iter().any(|t| t.predicate == "defined_in" && t.object == "lib.rs"));
        assert!(triples.iter().any(|t| t.predicate == "belongs_to" && t.object == "Widget"));
    }

    #[test]
    fn respects_max_triplets_bound() {
        let triples = extract_from_metadata(&code_chunk(), 2);
        assert_eq!(triples.len(), 2);
    }

    #[test]
    fn metadata_extractor_emits_call_sites() {
        let chunk = code_chunk_with_text("fn foo() {\n    bar(1);\n    if baz(2) {\n        qux();\n    }\n}");
        let triples = extract_from_metadata(&chunk, 20);
        assert!(triples.iter().any(|t| t.predicate == "calls" && t.object == "bar"));
        assert!(triples.iter().any(|t| t.predicate == "calls" && t.object == "qux"));
        // `baz` is a call site too; `if`/`foo` are filtered as keyword/self.
        assert!(triples.iter().any(|t| t.predicate == "calls" && t.object == "baz"));
        assert!(!triples.iter().any(|t| t.predicate == "calls" && t.object == "foo"));
        assert!(!triples.iter().any(|t| t.predicate == "calls" && t.object == "if"));
    }
}
