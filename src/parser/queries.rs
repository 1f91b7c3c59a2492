use std::sync::OnceLock;

use tree_sitter::{Language, Query};

/// Tag-style tree-sitter queries (spec §4.4): each pattern captures a
/// definition site as `@definition.<kind>` with its name as `@name`, and
/// calls/imports as `@reference.call`/`@reference.import`. One query per
/// AST-backed language, compiled once per process.

const QUERY_RUST: &str = r#"
(function_item name: (identifier) @name) @definition.function
(struct_item name: (type_identifier) @name) @definition.struct
(enum_item name: (type_identifier) @name) @definition.enum
(trait_item name: (type_identifier) @name) @definition.interface
(impl_item type: (type_identifier) @name) @definition.namespace
(const_item name: (identifier) @name) @definition.constant
(static_item name: (identifier) @name) @definition.constant
(mod_item name: (identifier) @name) @definition.module
(use_declaration argument: (_) @reference.import) @import.statement
(call_expression function: (identifier) @reference.call)
(call_expression function: (field_expression field: (field_identifier) @reference.call))
"#;

const QUERY_TS: &str = r#"
(function_declaration name: (identifier) @name) @definition.function
(class_declaration name: (type_identifier) @name) @definition.class
(interface_declaration name: (type_identifier) @name) @definition.interface
(enum_declaration name: (identifier) @name) @definition.enum
(method_definition name: (property_identifier) @name) @definition.method
(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (arrow_function))) @definition.function
(import_statement source: (string) @reference.import) @import.statement
(call_expression function: (identifier) @reference.call)
(call_expression function: (member_expression property: (property_identifier) @reference.call))
"#;

const QUERY_JS: &str = r#"
(function_declaration name: (identifier) @name) @definition.function
(class_declaration name: (identifier) @name) @definition.class
(method_definition name: (property_identifier) @name) @definition.method
(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (arrow_function))) @definition.function
(import_statement source: (string) @reference.import) @import.statement
(call_expression function: (identifier) @reference.call)
(call_expression function: (member_expression property: (property_identifier) @reference.call))
"#;

const QUERY_PYTHON: &str = r#"
(function_definition name: (identifier) @name) @definition.function
(class_definition name: (identifier) @name) @definition.class
(import_statement name: (dotted_name) @reference.import) @import.statement
(import_from_statement module_name: (dotted_name) @reference.import) @import.statement
(call function: (identifier) @reference.call)
(call function: (attribute attribute: (identifier) @reference.call))
"#;

const QUERY_GO: &str = r#"
(function_declaration name: (identifier) @name) @definition.function
(method_declaration name: (field_identifier) @name) @definition.method
(type_declaration (type_spec name: (type_identifier) @name type: (struct_type))) @definition.struct
(type_declaration (type_spec name: (type_identifier) @name type: (interface_type))) @definition.interface
(import_spec path: (interpreted_string_literal) @reference.import) @import.statement
(call_expression function: (identifier) @reference.call)
(call_expression function: (selector_expression field: (field_identifier) @reference.call))
"#;

static RUST_QUERY: OnceLock<Query> = OnceLock::new();
static TS_QUERY: OnceLock<Query> = OnceLock::new();
static TSX_QUERY: OnceLock<Query> = OnceLock::new();
static JS_QUERY: OnceLock<Query> = OnceLock::new();
static PYTHON_QUERY: OnceLock<Query> = OnceLock::new();
static GO_QUERY: OnceLock<Query> = OnceLock::new();

/// Return the cached tag query for `language_name`, compiling it against
/// `language` on first use. TSX and plain TypeScript share the same query
/// text but are cached separately because they bind to different grammars.
pub fn query_for(language_name: &str, language: &Language, is_tsx_variant: bool) -> &'static Query {
    match language_name {
        "rust" => RUST_QUERY.get_or_init(|| Query::new(language, QUERY_RUST).expect("invalid rust tag query")),
        "typescript" if is_tsx_variant => {
            TSX_QUERY.get_or_init(|| Query::new(language, QUERY_TS).expect("invalid tsx tag query"))
        }
        "typescript" => {
            TS_QUERY.get_or_init(|| Query::new(language, QUERY_TS).expect("invalid ts tag query"))
        }
        "javascript" => {
            JS_QUERY.get_or_init(|| Query::new(language, QUERY_JS).expect("invalid js tag query"))
        }
        "python" => PYTHON_QUERY
            .get_or_init(|| Query::new(language, QUERY_PYTHON).expect("invalid python tag query")),
        "go" => GO_QUERY.get_or_init(|| Query::new(language, QUERY_GO).expect("invalid go tag query")),
        other => panic!("no tag query registered for language {other:?}"),
    }
}
