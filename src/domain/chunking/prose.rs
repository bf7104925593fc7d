//! Prose chunker: semantic text splitting for doc/plain-text sources.

use super::code::ChunkConfig;
use super::{chunk_id, count_tokens, split_by_separators, trailing_overlap};
use crate::domain::error::Result;
use crate::domain::types::{
    Chunk, ChunkKind, ChunkMetadata, LoadedDocument, ProseMetadata,
};

/// Split a document into prose chunks, attaching the accumulated
/// `#`-heading breadcrumb to each one (spec §4.5).
pub fn chunk_prose(document: &LoadedDocument, config: &ChunkConfig) -> Result<Vec<Chunk>> {
    let fragments = split_by_separators(&document.text, config.chunk_size);
    let fragments = apply_overlap(fragments, config.chunk_overlap);

    let heading_paths = heading_path_per_fragment(&document.text, &fragments);
    let total_chunks = fragments.len();

    let mut chunks = Vec::with_capacity(total_chunks);
    for (index, fragment) in fragments.into_iter().enumerate() {
        let token_count = count_tokens(&fragment).clamp(
            crate::domain::types::MIN_CHUNK_TOKENS,
            crate::domain::types::MAX_CHUNK_TOKENS,
        );
        let heading_path = heading_paths.get(index).cloned().unwrap_or_default();
        let metadata = ChunkMetadata {
            chunk_id: chunk_id(&document.source, index),
            source: document.source.clone(),
            chunk_index: index,
            total_chunks,
            source_type: document.source_type,
            language: document.language,
            code: Default::default(),
            prose: ProseMetadata {
                section_title: heading_path.last().cloned(),
                heading_path,
            },
        };
        if let Ok(chunk) = Chunk::new(fragment, token_count, metadata, ChunkKind::Text) {
            chunks.push(chunk);
        }
    }
    Ok(chunks)
}

/// Prepend each fragment (after the first) with `chunk_overlap` tokens
/// taken from the end of the previous one.
fn apply_overlap(fragments: Vec<String>, overlap_tokens: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(fragments.len());
    let mut previous: Option<String> = None;
    for fragment in fragments {
        let text = match &previous {
            Some(prev) if overlap_tokens > 0 => {
                let overlap = trailing_overlap(prev, overlap_tokens);
                if overlap.is_empty() {
                    fragment.clone()
                } else {
                    format!("{overlap} {fragment}")
                }
            }
            _ => fragment.clone(),
        };
        previous = Some(fragment);
        out.push(text);
    }
    out
}

/// Walk `#`-prefixed lines in order and assign each fragment the heading
/// breadcrumb active at its approximate position in the source text.
fn heading_path_per_fragment(source_text: &str, fragments: &[String]) -> Vec<Vec<String>> {
    let mut headings: Vec<(usize, usize, String)> = Vec::new(); // (byte_offset, level, title)
    let mut offset = 0usize;
    for line in source_text.lines() {
        let trimmed = line.trim_start();
        if let Some(level) = heading_level(trimmed) {
            let title = trimmed.trim_start_matches('#').trim().to_string();
            if !title.is_empty() {
                headings.push((offset, level, title));
            }
        }
        offset += line.len() + 1;
    }

    let mut out = Vec::with_capacity(fragments.len());
    let mut search_from = 0usize;
    for fragment in fragments {
        let first_line = fragment.lines().next().unwrap_or(fragment.as_str());
        let pos = source_text[search_from..]
            .find(first_line)
            .map(|p| p + search_from)
            .unwrap_or(search_from);
        search_from = pos;

        let mut stack: Vec<(usize, String)> = Vec::new();
        for (h_offset, level, title) in &headings {
            if *h_offset > pos {
                break;
            }
            while stack.last().is_some_and(|(l, _)| *l >= *level) {
                stack.pop();
            }
            stack.push((*level, title.clone()));
        }
        out.push(stack.into_iter().map(|(_, t)| t).collect());
    }
    out
}

fn heading_level(trimmed: &str) -> Option<usize> {
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes > 0 && trimmed.as_bytes().get(hashes) == Some(&b' ') {
        Some(hashes)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SourceType;

    fn doc(text: &str) -> LoadedDocument {
        LoadedDocument {
            source: "notes.md".into(),
            file_name: "notes.md".into(),
            text: text.into(),
            source_type: SourceType::Doc,
            language: Some(crate::domain::types::Language::Markdown),
            file_hash: "h".into(),
        }
    }

    #[test]
    fn heading_path_accumulates() {
        let text = "# Guide\n\nIntro text.\n\n## Setup\n\nDo the setup steps here.\n";
        let config = ChunkConfig {
            chunk_size: 20,
            ..ChunkConfig::default()
        };
        let chunks = chunk_prose(&doc(text), &config).unwrap();
        assert!(chunks.iter().any(|c| c.metadata.prose.heading_path == vec!["Guide".to_string(), "Setup".to_string()]));
    }

    #[test]
    fn stable_chunk_ids_across_reruns() {
        let text = "word ".repeat(400);
        let config = ChunkConfig::default();
        let a = chunk_prose(&doc(&text), &config).unwrap();
        let b = chunk_prose(&doc(&text), &config).unwrap();
        assert_eq!(
            a.iter().map(|c| &c.chunk_id).collect::<Vec<_>>(),
            b.iter().map(|c| &c.chunk_id).collect::<Vec<_>>()
        );
    }
}
