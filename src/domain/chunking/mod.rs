//! Chunking (C5): splits a [`LoadedDocument`] into token-bounded [`Chunk`]s.
//!
//! Two chunkers share this module: [`prose`] for doc/plain text, and
//! [`code`] (AST-aware, backed by the [`languages`] tree-sitter registry)
//! for everything else, with [`fallback`] taking over when AST parsing
//! fails for a given file.

pub mod code;
pub mod fallback;
pub mod languages;
pub mod prose;

use crate::domain::types::LoadedDocument;
use sha2::{Digest, Sha256};

pub use code::ChunkConfig;

/// Deterministic chunk id: a function of `(source, chunk_index)` so
/// re-indexing unchanged content reproduces the same ids (spec §3, §4.5).
pub fn chunk_id(source: &str, chunk_index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"#");
    hasher.update(chunk_index.to_string().as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], hex_chars: usize) -> String {
    let mut s = String::with_capacity(hex_chars);
    for byte in bytes {
        if s.len() >= hex_chars {
            break;
        }
        s.push_str(&format!("{byte:02x}"));
    }
    s.truncate(hex_chars);
    s
}

/// Approximate token count used uniformly by the chunker and the BM25
/// scorer. Spec §9 explicitly allows any tokenizer that keeps
/// `token_count` within `[MIN_CHUNK_TOKENS, MAX_CHUNK_TOKENS]`; we use a
/// whitespace/punctuation word-boundary count, which is cheap and doesn't
/// pull in a model-specific tokenizer dependency.
pub fn count_tokens(text: &str) -> usize {
    unicode_segmentation::UnicodeSegmentation::unicode_words(text).count()
}

/// Split `text` into chunk-sized windows by repeatedly trying a descending
/// list of separators, stopping as soon as a fragment fits within
/// `max_tokens`. Shared by the prose chunker and the fallback chunker.
pub fn split_by_separators(text: &str, max_tokens: usize) -> Vec<String> {
    const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];
    split_recursive(text, max_tokens, SEPARATORS)
}

fn split_recursive(text: &str, max_tokens: usize, separators: &[&str]) -> Vec<String> {
    if count_tokens(text) <= max_tokens || text.is_empty() {
        return vec![text.to_string()];
    }
    let Some((sep, rest)) = separators.split_first() else {
        // Down to character-level splitting.
        return split_by_chars(text, max_tokens);
    };
    let parts: Vec<&str> = text.split(sep).collect();
    if parts.len() <= 1 {
        return split_recursive(text, max_tokens, rest);
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for part in parts {
        let candidate = if current.is_empty() {
            part.to_string()
        } else {
            format!("{current}{sep}{part}")
        };
        if count_tokens(&candidate) > max_tokens && !current.is_empty() {
            out.push(current.clone());
            current = part.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    // Recurse on any fragment still too large (e.g. one huge paragraph).
    out.into_iter()
        .flat_map(|fragment| {
            if count_tokens(&fragment) > max_tokens {
                split_recursive(&fragment, max_tokens, rest)
            } else {
                vec![fragment]
            }
        })
        .collect()
}

fn split_by_chars(text: &str, max_tokens: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    // Rough chars-per-token heuristic; exactness doesn't matter, only that
    // chunks stay near the bound (spec §9 relaxes cross-tokenizer exactness).
    let max_chars = max_tokens.saturating_mul(5).max(1);
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

/// Take the trailing `overlap_tokens` worth of words from `text`, used to
/// seed the next chunk with [`chunk_overlap`](crate::infrastructure::config::types::ChunkingConfig).
pub fn trailing_overlap(text: &str, overlap_tokens: usize) -> String {
    if overlap_tokens == 0 {
        return String::new();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(overlap_tokens);
    words[start..].join(" ")
}

/// Given a document, choose the prose or code chunker and produce chunks.
/// Falls back to the prose chunker (still tagged with the document's
/// original `source_type`) when AST parsing fails — see spec §4.5.
pub fn chunk_document(
    document: &LoadedDocument,
    config: &ChunkConfig,
) -> crate::domain::error::Result<Vec<crate::domain::types::Chunk>> {
    use crate::domain::types::Language;

    let is_code = document
        .language
        .map(Language::is_code)
        .unwrap_or(false);

    if is_code {
        match code::chunk_code(document, config) {
            Ok(chunks) => return Ok(chunks),
            Err(err) => {
                tracing::warn!(
                    source = %document.source,
                    error = %err,
                    "AST parsing failed, falling back to prose chunker"
                );
                return fallback::chunk_fallback(document, config);
            }
        }
    }
    prose::chunk_prose(document, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        assert_eq!(chunk_id("a.rs", 0), chunk_id("a.rs", 0));
        assert_ne!(chunk_id("a.rs", 0), chunk_id("a.rs", 1));
        assert_ne!(chunk_id("a.rs", 0), chunk_id("b.rs", 0));
    }

    #[test]
    fn split_by_separators_respects_bound() {
        let text = "word ".repeat(500);
        let parts = split_by_separators(&text, 100);
        for part in &parts {
            assert!(count_tokens(part) <= 100 || part.split_whitespace().count() <= 1);
        }
        assert!(!parts.is_empty());
    }

    #[test]
    fn trailing_overlap_takes_last_n_words() {
        let overlap = trailing_overlap("one two three four five", 2);
        assert_eq!(overlap, "four five");
    }
}
