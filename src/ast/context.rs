//! Document-global state collected in one pass before the tree is built:
//! reference/footnote definitions (which can be referenced before they're
//! defined) and implicit heading-slug references.

use crate::token::{DjotToken, Token, REFERENCE_KEY};
use std::collections::HashMap;

use super::node::select_text;

#[derive(Debug, Default)]
pub struct DjotContext {
    pub references: HashMap<String, String>,
    pub reference_attributes: HashMap<String, crate::token::Attributes>,
    pub footnote_ids: HashMap<String, usize>,
}

/// Scan the top-level token list once, recording every reference/footnote
/// definition and registering each heading's slug as an implicit `#slug`
/// reference (unless a real `ReferenceDef` already claimed that label).
pub fn build_djot_context(document: &str, list: &[Token]) -> DjotContext {
    let mut context = DjotContext::default();
    let mut footnote_id = 1usize;

    let mut i = 0usize;
    while i < list.len() {
        let mut attributes = crate::token::Attributes::new();
        while i < list.len() && list[i].kind == DjotToken::Attribute {
            attributes.merge_with(&list[i].attributes);
            i += 1;
        }
        if i >= list.len() {
            break;
        }
        let open_token = &list[i];
        if open_token.jump_to_pair <= 0 {
            i += 1;
            continue;
        }
        let close_index = (i as isize + open_token.jump_to_pair) as usize;
        match open_token.kind {
            DjotToken::ReferenceDef => {
                let reference = open_token.attributes.get(REFERENCE_KEY).unwrap_or("").to_string();
                let link = document[open_token.end..list[close_index].start].trim_matches(['\t', '\r', '\n', ' ']);
                context.references.insert(reference.clone(), link.to_string());
                context.reference_attributes.insert(reference, attributes);
            }
            DjotToken::FootnoteDef => {
                let reference = open_token.attributes.get(REFERENCE_KEY).unwrap_or("").to_string();
                context.footnote_ids.insert(reference, footnote_id);
                footnote_id += 1;
            }
            DjotToken::Heading => {
                let header_id = create_section_id(select_text(document, &list[i + 1..close_index]));
                context
                    .references
                    .entry(header_id.clone())
                    .or_insert_with(|| format!("#{header_id}"));
            }
            _ => {}
        }
        i += 1;
    }
    context
}

/// Collapse whitespace/punctuation runs to single dashes, keeping letters
/// and digits. A run at the very start of the string still produces a
/// leading dash (nothing suppresses it); a run at the very end never does,
/// since a dash is only written right before the next kept character.
pub fn create_section_id(s: &str) -> String {
    let mut id = String::new();
    let mut has_dash = false;
    for c in s.chars() {
        if c.is_whitespace() || c == '\n' || c == '\t' {
            has_dash = true;
        } else if c.is_alphanumeric() {
            if has_dash {
                id.push('-');
            }
            has_dash = false;
            id.push(c);
        } else {
            has_dash = true;
        }
    }
    id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteDirection {
    Open,
    Close,
}

/// Infer whether a smart quote at `position` opens or closes, from its
/// surrounding bytes. Falls back to `Close` when nothing else resolves it.
pub fn detect_quote_direction(document: &str, position: usize) -> QuoteDirection {
    let bytes = document.as_bytes();
    if bytes[position] == b'{' {
        return QuoteDirection::Open;
    }
    if position + 1 < bytes.len() && bytes[position + 1] == b'}' {
        return QuoteDirection::Close;
    }
    if position == 0 {
        return QuoteDirection::Open;
    }
    if position == bytes.len() - 1 {
        return QuoteDirection::Close;
    }
    let prev = bytes[position - 1] as char;
    let next = bytes[position + 1] as char;
    if prev.is_whitespace() {
        return QuoteDirection::Open;
    }
    if next.is_whitespace() {
        return QuoteDirection::Close;
    }
    if prev.is_ascii_punctuation() {
        return QuoteDirection::Open;
    }
    if next.is_ascii_punctuation() {
        return QuoteDirection::Close;
    }
    QuoteDirection::Close
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_id_collapses_runs_and_keeps_case() {
        assert_eq!(create_section_id("Hello, World!"), "Hello-World");
        assert_eq!(create_section_id("  leading and trailing  "), "-leading-and-trailing");
        assert_eq!(create_section_id("a---b"), "a-b");
        assert_eq!(create_section_id(""), "");
    }

    #[test]
    fn quote_direction_prefers_boundary_hints() {
        assert_eq!(detect_quote_direction("\"hi", 0), QuoteDirection::Open);
        assert_eq!(detect_quote_direction("hi\"", 2), QuoteDirection::Close);
        assert_eq!(detect_quote_direction("say \"hi\" now", 4), QuoteDirection::Open);
        assert_eq!(detect_quote_direction("say \"hi\" now", 7), QuoteDirection::Close);
    }

    #[test]
    fn quote_direction_defaults_to_close_with_no_hint() {
        assert_eq!(detect_quote_direction("a\"b", 1), QuoteDirection::Close);
    }
}
