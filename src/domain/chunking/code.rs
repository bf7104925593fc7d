//! Code chunker: AST-aware line-window splitting with dominant-symbol
//! metadata attachment (spec §4.5).

use super::languages::{self, Symbol};
use super::{chunk_id, count_tokens};
use crate::domain::error::{Error, Result};
use crate::domain::types::{
    Chunk, ChunkKind, ChunkMetadata, CodeSymbolMetadata, LoadedDocument,
};

/// Thresholds governing both chunkers; sourced from
/// [`crate::infrastructure::config::types::ChunkingConfig`] at call sites.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    /// Line-window size used by the code chunker.
    pub chunk_lines: usize,
    /// Line-window overlap used by the code chunker.
    pub chunk_lines_overlap: usize,
    /// Hard character cap per code chunk, regardless of line count.
    pub max_chars: usize,
}

impl Default for ChunkConfig {
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

/// Parse `document` with the registered tree-sitter grammar for its
/// language, then split into line-bounded windows and attach each window's
/// dominant symbol metadata.
pub fn chunk_code(document: &LoadedDocument, config: &ChunkConfig) -> Result<Vec<Chunk>> {
    let language = document
        .language
        .ok_or_else(|| Error::internal("chunk_code called without a detected language"))?;

    let mut parser = languages::parser_for(language)
        .ok_or_else(|| Error::internal(format!("no tree-sitter grammar for {language:?}")))?;
    let processor = languages::processor_for(language)
        .ok_or_else(|| Error::internal(format!("no processor for {language:?}")))?;

    let tree = parser
        .parse(&document.text, None)
        .ok_or_else(|| Error::internal("tree-sitter failed to produce a parse tree"))?;

    let mut symbols = Vec::new();
    languages::collect_symbols(processor, tree.root_node(), &document.text, None, &mut symbols);

    let lines: Vec<&str> = document.text.lines().collect();
    let windows = line_windows(lines.len(), config.chunk_lines, config.chunk_lines_overlap);
    let total_chunks = windows.len();

    let mut chunks = Vec::with_capacity(total_chunks);
    for (index, (start, end)) in windows.into_iter().enumerate() {
        let mut text = lines[start..end].join("\n");
        if text.len() > config.max_chars {
            text.truncate(config.max_chars);
        }
        let dominant = dominant_symbol(&symbols, start + 1, end);
        let token_count = count_tokens(&text).clamp(
            crate::domain::types::MIN_CHUNK_TOKENS,
            crate::domain::types::MAX_CHUNK_TOKENS,
        );
        let metadata = ChunkMetadata {
            chunk_id: chunk_id(&document.source, index),
            source: document.source.clone(),
            chunk_index: index,
            total_chunks,
            source_type: document.source_type,
            language: Some(language),
            code: dominant
                .map(|s| CodeSymbolMetadata {
                    symbol_name: Some(s.name.clone()),
                    symbol_kind: Some(s.kind),
                    start_line: Some(s.start_line),
                    end_line: Some(s.end_line),
                    docstring: s.docstring.clone(),
                    parameters: Some(s.parameters.clone()),
                    return_type: s.return_type.clone(),
                    parent: s.parent.clone(),
                    imports: Some(scan_imports(&text, processor.import_prefixes())),
                    summary: None,
                })
                .unwrap_or_default(),
            prose: Default::default(),
        };
        if let Ok(chunk) = Chunk::new(text, token_count, metadata, ChunkKind::Code) {
            chunks.push(chunk);
        }
    }
    Ok(chunks)
}

/// Compute `[start, end)` line ranges of `chunk_lines` width with
/// `overlap` lines shared between adjacent windows.
fn line_windows(total_lines: usize, chunk_lines: usize, overlap: usize) -> Vec<(usize, usize)> {
    if total_lines == 0 {
        return Vec::new();
    }
    let step = chunk_lines.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    while start < total_lines {
        let end = (start + chunk_lines).min(total_lines);
        windows.push((start, end));
        if end == total_lines {
            break;
        }
        start += step;
    }
    windows
}

/// Pick the symbol whose start line lies inside `[window_start, window_end]`;
/// if several qualify, the innermost (latest start line); if none, the
/// nearest enclosing symbol (spec §4.5 step 4).
fn dominant_symbol(symbols: &[Symbol], window_start: usize, window_end: usize) -> Option<&Symbol> {
    let inside = symbols
        .iter()
        .filter(|s| s.start_line >= window_start && s.start_line <= window_end)
        .max_by_key(|s| s.start_line);
    if inside.is_some() {
        return inside;
    }
    symbols
        .iter()
        .filter(|s| s.start_line <= window_start && s.end_line >= window_end)
        .min_by_key(|s| s.end_line - s.start_line)
}

fn scan_imports(text: &str, prefixes: &[&str]) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| prefixes.iter().any(|p| line.starts_with(p)))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Language, SourceType};

    fn rust_doc(text: &str) -> LoadedDocument {
        LoadedDocument {
            source: "lib.rs".into(),
            file_name: "lib.rs".into(),
            text: text.into(),
            source_type: SourceType::Code,
            language: Some(Language::Rust),
            file_hash: "h".into(),
        }
    }

    #[test]
    fn line_windows_cover_all_lines() {
        let windows = line_windows(100, 30, 5);
        assert_eq!(windows.first(), Some(&(0, 30)));
        assert_eq!(windows.last().unwrap().1, 100);
    }

    #[test]
    fn chunk_code_attaches_dominant_symbol() {
        let source = "fn foo() {\n    let x = 1;\n    x\n}\n\nfn bar() {\n    2\n}\n";
        let config = ChunkConfig {
            chunk_lines: 4,
            chunk_lines_overlap: 0,
            ..ChunkConfig::default()
        };
        let chunks = chunk_code(&rust_doc(source), &config).unwrap();
        assert!(chunks
            .iter()
            .any(|c| c.metadata.code.symbol_name.as_deref() == Some("foo")));
    }

    #[test]
    fn stable_chunk_ids_across_reruns() {
        let source = "fn foo() {}\n".repeat(50);
        let config = ChunkConfig::default();
        let a = chunk_code(&rust_doc(&source), &config).unwrap();
        let b = chunk_code(&rust_doc(&source), &config).unwrap();
        assert_eq!(
            a.iter().map(|c| &c.chunk_id).collect::<Vec<_>>(),
            b.iter().map(|c| &c.chunk_id).collect::<Vec<_>>()
        );
    }
}
