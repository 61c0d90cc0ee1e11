//! Inline open/close-form recognition.
//!
//! Every paired inline kind has an open form and a close form, often
//! asymmetric (`_text_` is bare-delimited, `{=fmt}` is braced-only). This
//! module mirrors that asymmetry directly rather than deriving one form from
//! the other.

use crate::reader::{masks, TextReader};
use crate::token::DjotToken;

/// Try to match `kind`'s open form (`close = false`) or close form
/// (`close = true`) at `pos`, returning the position after the match.
pub fn match_inline_token(reader: &TextReader, pos: usize, kind: DjotToken, close: bool) -> Option<usize> {
    use DjotToken::*;
    match (kind, close) {
        (ImageSpan, false) => reader.token(pos, "!["),
        (Span, false) => reader.token(pos, "["),
        (Span, true) | (ImageSpan, true) => reader.token(pos, "]"),
        (LinkUrl, false) => reader.token(pos, "("),
        (LinkUrl, true) => reader.token(pos, ")"),
        (LinkReference, false) => reader.token(pos, "["),
        (LinkReference, true) => reader.token(pos, "]"),
        (Autolink, false) => reader.token(pos, "<"),
        (Autolink, true) => reader.token(pos, ">"),
        (Verbatim, false) => {
            let next = reader.mask_repeat(pos, &masks::DOLLAR, 0).unwrap();
            if next - pos > 2 {
                return None;
            }
            reader.mask_repeat(next, &masks::BACKTICK, 1)
        }
        (Verbatim, true) => reader.mask_repeat(pos, &masks::BACKTICK, 1),
        (Emphasis, false) => reader
            .token(pos, "{_")
            .or_else(|| reader.token(pos, "_").filter(|&next| !reader.has_mask(next, &masks::SPACE_NEWLINE))),
        (Emphasis, true) => reader
            .token(pos, "_}")
            .or_else(|| reader.token(pos, "_").filter(|_| pos > 0 && !reader.has_mask(pos - 1, &masks::SPACE_NEWLINE))),
        (Strong, false) => reader
            .token(pos, "{*")
            .or_else(|| reader.token(pos, "*").filter(|&next| !reader.has_mask(next, &masks::SPACE_NEWLINE))),
        (Strong, true) => reader
            .token(pos, "*}")
            .or_else(|| reader.token(pos, "*").filter(|_| pos > 0 && !reader.has_mask(pos - 1, &masks::SPACE_NEWLINE))),
        (Highlighted, false) => reader.token(pos, "{="),
        (Highlighted, true) => reader.token(pos, "=}"),
        (Superscript, false) => reader.token(pos, "{^").or_else(|| reader.token(pos, "^")),
        (Superscript, true) => reader.token(pos, "^}").or_else(|| reader.token(pos, "^")),
        (Subscript, false) => reader.token(pos, "{~").or_else(|| reader.token(pos, "~")),
        (Subscript, true) => reader.token(pos, "~}").or_else(|| reader.token(pos, "~")),
        (Insert, false) => reader.token(pos, "{+"),
        (Insert, true) => reader.token(pos, "+}"),
        (Delete, false) => reader.token(pos, "{-"),
        (Delete, true) => reader.token(pos, "-}"),
        (FootnoteReference, false) => reader.token(pos, "[^"),
        (FootnoteReference, true) => reader.token(pos, "]"),
        (EscapedSymbol, _) => {
            let next = reader.token(pos, "\\")?;
            if reader.is_empty_at(next) {
                return None;
            }
            if let Some(after) = reader.mask(next, &masks::ASCII_PUNCTUATION) {
                return Some(after);
            }
            let next = reader.mask_repeat(next, &masks::SPACE, 0).unwrap();
            reader.token(next, "\n")
        }
        (RawFormat, false) => reader.token(pos, "{="),
        (RawFormat, true) => reader.token(pos, "}"),
        (Symbols, false) => {
            let next = reader.token(pos, ":")?;
            let word = reader.mask_repeat(next, &masks::ALPHANUMERIC_SYMBOL, 0).unwrap();
            reader.has_token(word, ":").then_some(next)
        }
        (Symbols, true) => reader.token(pos, ":"),
        (SmartSymbol, _) => {
            if let Some(next) = reader.token(pos, "{") {
                return reader.mask(next, &masks::SMART_SYMBOL);
            }
            if let Some(next) = reader.mask(pos, &masks::SMART_SYMBOL) {
                return Some(if reader.has_token(next, "}") { next + 1 } else { next });
            }
            if let Some(next) = reader.token(pos, "...") {
                return Some(next);
            }
            reader.byte_repeat(pos, b'-', 2)
        }
        (PipeTableSeparator, false) => {
            let next = reader.token(pos, "|")?;
            reader.mask_repeat(next, &masks::SPACE, 0)
        }
        (PipeTableSeparator, true) => {
            let s = reader.mask_repeat(pos, &masks::SPACE, 0).unwrap();
            let next = reader.token(s, "|")?;
            if reader.is_empty_or_whitespace(next) {
                Some(next)
            } else {
                Some(s)
            }
        }
        _ => None,
    }
}
