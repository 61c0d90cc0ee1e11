//! Djot parser and HTML renderer.
//!
//! The pipeline is `bytes -> tokenizer -> AST builder -> render registry`:
//! [`tokenizer::build_djot_tokens`] and [`tokenizer::build_inline_djot_tokens`]
//! turn a document into a flat, paired token list; [`ast::parse`] rewrites
//! that list into a nested [`ast::TreeNode`] forest (sections, lists,
//! tables, smart typography all resolved); [`render::render`] walks the
//! forest into a target format.

pub mod ast;
pub mod cli;
pub mod error;
pub mod matchers;
pub mod reader;
pub mod render;
pub mod stack;
pub mod token;
pub mod tokenizer;

/// Parse a document straight to rendered HTML. A thin convenience wrapper
/// over [`ast::parse`] and [`render::render`] for callers that don't need
/// the intermediate tree.
pub fn parse_to_html(document: &str) -> String {
    render::render(&ast::parse(document), "html")
}
