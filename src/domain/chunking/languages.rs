//! Tree-sitter language registry: one [`LanguageProcessor`] per supported
//! language, looked up lazily by [`crate::domain::types::Language`].

use crate::domain::types::{Language, SymbolKind};
use std::collections::HashMap;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser};

/// A symbol discovered by walking a language's AST.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: usize,
    pub end_line: usize,
    pub docstring: Option<String>,
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub parent: Option<String>,
}

/// Per-language tree-sitter grammar plus the node-kind names that identify
/// symbols worth surfacing as chunk metadata.
pub trait LanguageProcessor: Send + Sync {
    /// Construct a fresh parser configured with this language's grammar.
    fn parser(&self) -> tree_sitter::Language;

    /// Node kinds that should be collected as [`Symbol`]s (function
    /// definitions, classes, impls, ...).
    fn symbol_node_kinds(&self) -> &'static [(&'static str, SymbolKind)];

    /// Extract the symbol name from a matched node, if resolvable.
    fn symbol_name(&self, node: Node, source: &str) -> Option<String> {
        let name_node = node.child_by_field_name("name")?;
        name_node.utf8_text(source.as_bytes()).ok().map(String::from)
    }

    /// Extract import statement text for this language; used by the graph
    /// extractor's pattern-based import scan (C7).
    fn import_prefixes(&self) -> &'static [&'static str];
}

macro_rules! grammar_processor {
    ($name:ident, $grammar:expr, $kinds:expr, $imports:expr) => {
        struct $name;
        impl LanguageProcessor for $name {
            fn parser(&self) -> tree_sitter::Language {
                $grammar
            }
            fn symbol_node_kinds(&self) -> &'static [(&'static str, SymbolKind)] {
                $kinds
            }
            fn import_prefixes(&self) -> &'static [&'static str] {
                $imports
            }
        }
    };
}

grammar_processor!(
    RustProcessor,
    tree_sitter_rust::LANGUAGE.into(),
    &[
        ("function_item", SymbolKind::Function),
        ("impl_item", SymbolKind::Impl),
        ("struct_item", SymbolKind::Type),
        ("trait_item", SymbolKind::Interface),
    ],
    &["use "]
);

grammar_processor!(
    PythonProcessor,
    tree_sitter_python::LANGUAGE.into(),
    &[
        ("function_definition", SymbolKind::Function),
        ("class_definition", SymbolKind::Class),
    ],
    &["import ", "from "]
);

grammar_processor!(
    JavaScriptProcessor,
    tree_sitter_javascript::LANGUAGE.into(),
    &[
        ("function_declaration", SymbolKind::Function),
        ("method_definition", SymbolKind::Method),
        ("class_declaration", SymbolKind::Class),
    ],
    &["import ", "require("]
);

grammar_processor!(
    TypeScriptProcessor,
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    &[
        ("function_declaration", SymbolKind::Function),
        ("method_definition", SymbolKind::Method),
        ("class_declaration", SymbolKind::Class),
        ("interface_declaration", SymbolKind::Interface),
    ],
    &["import ", "require("]
);

grammar_processor!(
    GoProcessor,
    tree_sitter_go::LANGUAGE.into(),
    &[
        ("function_declaration", SymbolKind::Function),
        ("method_declaration", SymbolKind::Method),
        ("type_declaration", SymbolKind::Type),
    ],
    &["import "]
);

grammar_processor!(
    JavaProcessor,
    tree_sitter_java::LANGUAGE.into(),
    &[
        ("method_declaration", SymbolKind::Method),
        ("class_declaration", SymbolKind::Class),
        ("interface_declaration", SymbolKind::Interface),
    ],
    &["import "]
);

grammar_processor!(
    CProcessor,
    tree_sitter_c::LANGUAGE.into(),
    &[("function_definition", SymbolKind::Function)],
    &["#include"]
);

grammar_processor!(
    CppProcessor,
    tree_sitter_cpp::LANGUAGE.into(),
    &[
        ("function_definition", SymbolKind::Function),
        ("class_specifier", SymbolKind::Class),
    ],
    &["#include"]
);

grammar_processor!(
    CSharpProcessor,
    tree_sitter_c_sharp::LANGUAGE.into(),
    &[
        ("method_declaration", SymbolKind::Method),
        ("class_declaration", SymbolKind::Class),
        ("interface_declaration", SymbolKind::Interface),
    ],
    &["using "]
);

grammar_processor!(
    RubyProcessor,
    tree_sitter_ruby::LANGUAGE.into(),
    &[
        ("method", SymbolKind::Method),
        ("class", SymbolKind::Class),
    ],
    &["require ", "require_relative "]
);

grammar_processor!(
    PhpProcessor,
    tree_sitter_php::LANGUAGE_PHP.into(),
    &[
        ("function_definition", SymbolKind::Function),
        ("method_declaration", SymbolKind::Method),
        ("class_declaration", SymbolKind::Class),
    ],
    &["use ", "require", "include"]
);

grammar_processor!(
    SwiftProcessor,
    tree_sitter_swift::LANGUAGE.into(),
    &[
        ("function_declaration", SymbolKind::Function),
        ("class_declaration", SymbolKind::Class),
    ],
    &["import "]
);

grammar_processor!(
    KotlinProcessor,
    tree_sitter_kotlin_ng::LANGUAGE.into(),
    &[
        ("function_declaration", SymbolKind::Function),
        ("class_declaration", SymbolKind::Class),
    ],
    &["import "]
);

static REGISTRY: LazyLock<HashMap<Language, Box<dyn LanguageProcessor>>> = LazyLock::new(|| {
    let mut map: HashMap<Language, Box<dyn LanguageProcessor>> = HashMap::new();
    map.insert(Language::Rust, Box::new(RustProcessor));
    map.insert(Language::Python, Box::new(PythonProcessor));
    map.insert(Language::JavaScript, Box::new(JavaScriptProcessor));
    map.insert(Language::TypeScript, Box::new(TypeScriptProcessor));
    map.insert(Language::Go, Box::new(GoProcessor));
    map.insert(Language::Java, Box::new(JavaProcessor));
    map.insert(Language::C, Box::new(CProcessor));
    map.insert(Language::Cpp, Box::new(CppProcessor));
    map.insert(Language::CSharp, Box::new(CSharpProcessor));
    map.insert(Language::Ruby, Box::new(RubyProcessor));
    map.insert(Language::Php, Box::new(PhpProcessor));
    map.insert(Language::Swift, Box::new(SwiftProcessor));
    map.insert(Language::Kotlin, Box::new(KotlinProcessor));
    map
});

/// Look up the registered processor for a language, if any.
pub fn processor_for(language: Language) -> Option<&'static dyn LanguageProcessor> {
    REGISTRY.get(&language).map(|b| b.as_ref())
}

/// Build a fresh [`tree_sitter::Parser`] for a language, or `None` if
/// unsupported.
pub fn parser_for(language: Language) -> Option<Parser> {
    let processor = processor_for(language)?;
    let mut parser = Parser::new();
    parser.set_language(&processor.parser()).ok()?;
    Some(parser)
}

/// Walk the AST rooted at `node`, collecting symbols via the processor's
/// registered node kinds.
pub fn collect_symbols(
    processor: &dyn LanguageProcessor,
    node: Node,
    source: &str,
    parent: Option<&str>,
    out: &mut Vec<Symbol>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();
        if let Some((_, symbol_kind)) = processor
            .symbol_node_kinds()
            .iter()
            .find(|(k, _)| *k == kind)
        {
            if let Some(name) = processor.symbol_name(child, source) {
                let docstring = leading_comment(child, source);
                out.push(Symbol {
                    name: name.clone(),
                    kind: *symbol_kind,
                    start_line: child.start_position().row + 1,
                    end_line: child.end_position().row + 1,
                    docstring,
                    parameters: extract_parameters(child, source),
                    return_type: extract_return_type(child, source),
                    parent: parent.map(String::from),
                });
                collect_symbols(processor, child, source, Some(&name), out);
                continue;
            }
        }
        collect_symbols(processor, child, source, parent, out);
    }
}

fn leading_comment(node: Node, source: &str) -> Option<String> {
    let mut sibling = node.prev_sibling()?;
    if sibling.kind().contains("comment") {
        return sibling.utf8_text(source.as_bytes()).ok().map(String::from);
    }
    while sibling.kind().contains("comment") {
        sibling = sibling.prev_sibling()?;
    }
    None
}

fn extract_parameters(node: Node, source: &str) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    params
        .children(&mut cursor)
        .filter(|c| c.is_named())
        .filter_map(|c| c.utf8_text(source.as_bytes()).ok().map(String::from))
        .collect()
}

/// Field names tree-sitter grammars use for a function-like node's return
/// type, tried in order: `return_type` (Rust, TypeScript, PHP), `result`
/// (Go, Swift), `type` (Java, C/C++, C#, Kotlin). Grammars with no static
/// return type (Python, Ruby, JavaScript) yield `None`.
const RETURN_TYPE_FIELDS: &[&str] = &["return_type", "result", "type"];

fn extract_return_type(node: Node, source: &str) -> Option<String> {
    RETURN_TYPE_FIELDS.iter().find_map(|field| {
        node.child_by_field_name(field)
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_processor_is_registered() {
        assert!(processor_for(Language::Rust).is_some());
        assert!(processor_for(Language::Markdown).is_none());
    }

    #[test]
    fn parser_for_rust_parses_a_function() {
        let mut parser = parser_for(Language::Rust).unwrap();
        let tree = parser.parse("fn foo() {}", None).unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
    }

    #[test]
    fn rust_function_return_type_is_extracted() {
        let processor = processor_for(Language::Rust).unwrap();
        let mut parser = parser_for(Language::Rust).unwrap();
        let source = "fn add(a: i32, b: i32) -> i32 { a + b }";
        let tree = parser.parse(source, None).unwrap();
        let mut symbols = Vec::new();
        collect_symbols(processor, tree.root_node(), source, None, &mut symbols);
        let add = symbols.iter().find(|s| s.name == "add").unwrap();
        assert_eq!(add.return_type.as_deref(), Some("i32"));
    }

    #[test]
    fn rust_function_without_return_type_yields_none() {
        let processor = processor_for(Language::Rust).unwrap();
        let mut parser = parser_for(Language::Rust).unwrap();
        let source = "fn greet() { println!(\"hi\"); }";
        let tree = parser.parse(source, None).unwrap();
        let mut symbols = Vec::new();
        collect_symbols(processor, tree.root_node(), source, None, &mut symbols);
        let greet = symbols.iter().find(|s| s.name == "greet").unwrap();
        assert_eq!(greet.return_type, None);
    }
}
