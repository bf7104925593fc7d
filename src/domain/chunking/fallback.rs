//! Fallback chunker: used when AST parsing fails for a code file. Splits on
//! blank-line/line boundaries like the prose chunker, but keeps the
//! document's original `source_type` (spec §4.5: "still tagged
//! `source_type = code`").

use super::code::ChunkConfig;
use super::{chunk_id, count_tokens, split_by_separators};
use crate::domain::error::Result;
use crate::domain::types::{Chunk, ChunkKind, ChunkMetadata, LoadedDocument};

/// Generic line-window fallback, with no symbol metadata.
pub fn chunk_fallback(document: &LoadedDocument, config: &ChunkConfig) -> Result<Vec<Chunk>> {
    let fragments = split_by_separators(&document.text, config.chunk_size);
    let total_chunks = fragments.len();

    let mut chunks = Vec::with_capacity(total_chunks);
    for (index, fragment) in fragments.into_iter().enumerate() {
        let token_count = count_tokens(&fragment).clamp(
            crate::domain::types::MIN_CHUNK_TOKENS,
            crate::domain::types::MAX_CHUNK_TOKENS,
        );
        let metadata = ChunkMetadata {
            chunk_id: chunk_id(&document.source, index),
            source: document.source.clone(),
            chunk_index: index,
            total_chunks,
            source_type: document.source_type,
            language: document.language,
            code: Default::default(),
            prose: Default::default(),
        };
        if let Ok(chunk) = Chunk::new(fragment, token_count, metadata, ChunkKind::Code) {
            chunks.push(chunk);
        }
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Language, SourceType};

    #[test]
    fn fallback_keeps_code_source_type() {
        let document = LoadedDocument {
            source: "broken.rs".into(),
            file_name: "broken.rs".into(),
            text: "fn (((( totally not valid rust".repeat(20),
            source_type: SourceType::Code,
            language: Some(Language::Rust),
            file_hash: "h".into(),
        };
        let chunks = chunk_fallback(&document, &ChunkConfig::default()).unwrap();
        assert!(chunks.iter().all(|c| c.metadata.source_type == SourceType::Code));
    }
}
