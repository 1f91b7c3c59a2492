use tree_sitter::Language;

/// Return the tree-sitter [`Language`] for an AST-backed language name
/// (spec §4.3/§4.4), or `None` if no grammar is linked for it — callers
/// fall back to the regex extractor in that case.
///
/// # Grammar selection rules
/// - `typescript` files ending in `.tsx` use the TSX grammar; `.ts` uses the
///   plain TypeScript grammar. They are NOT interchangeable: the TypeScript
///   grammar cannot parse JSX, and the TSX grammar breaks angle-bracket type
///   assertions (`<T>expr`).
pub fn language_for(name: &str, is_tsx_variant: bool) -> Option<Language> {
    match name {
        "typescript" if is_tsx_variant => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "typescript" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "javascript" => Some(tree_sitter_javascript::LANGUAGE.into()),
        "rust" => Some(tree_sitter_rust::LANGUAGE.into()),
        "python" => Some(tree_sitter_python::LANGUAGE.into()),
        "go" => Some(tree_sitter_go::LANGUAGE.into()),
        _ => None,
    }
}
