//! Block-opener recognition: given a reader positioned at (post-indent) line
//! start, try to match one specific block kind.

use crate::reader::{masks, TextReader};
use crate::token::{DjotToken, Token, CODE_LANG_KEY, DIV_CLASS_KEY, REFERENCE_KEY};

/// Try to match `kind` at `pos`. On success, returns the block's opening
/// token (its `start..end` span covers the marker, not the block body) and
/// the position immediately after the marker.
pub fn match_block_token(reader: &TextReader, pos: usize, kind: DjotToken) -> Option<(Token, usize)> {
    let start = reader.mask_repeat(pos, &masks::SPACE, 0).unwrap();
    match kind {
        DjotToken::Heading => {
            let next = reader.byte_repeat(start, b'#', 1)?;
            let next = reader.mask(next, &masks::SPACE)?;
            Some((Token::new(kind, start, next), next))
        }
        DjotToken::Quote => {
            let next = reader.token(start, ">")?;
            let next = reader.mask(next, &masks::SPACE_NEWLINE)?;
            Some((Token::new(kind, start, next), next))
        }
        DjotToken::Div | DjotToken::Code => {
            let (symbol, attribute_key): (u8, &str) = match kind {
                DjotToken::Div => (b':', DIV_CLASS_KEY),
                _ => (b'`', CODE_LANG_KEY),
            };
            let next = reader.byte_repeat(start, symbol, 3)?;
            let next = reader.mask_repeat(next, &masks::SPACE, 0).unwrap();
            if reader.is_empty_or_whitespace(next) {
                return Some((Token::new(kind, start, next), next));
            }
            let meta_start = next;
            let next = reader.mask_repeat(next, &masks::NOT_SPACE_NEWLINE, 1)?;
            let meta_end = next;
            let next = reader.empty_or_whitespace(next)?;
            let mut token = Token::new(kind, start, next);
            token.attributes.set(attribute_key, reader.select(meta_start, meta_end));
            Some((token, next))
        }
        DjotToken::ReferenceDef | DjotToken::FootnoteDef => {
            let marker = if kind == DjotToken::ReferenceDef { "[" } else { "[^" };
            let label_start = reader.token(start, marker)?;
            let label_end = reader.mask_repeat(label_start, &masks::NOT_BRACKET, 0).unwrap();
            let next = reader.token(label_end, "]:")?;
            let mut token = Token::new(kind, start, next);
            token.attributes.set(REFERENCE_KEY, reader.select(label_start, label_end));
            Some((token, next))
        }
        DjotToken::ThematicBreak => {
            let next = reader.mask_repeat(start, &masks::THEMATIC_BREAK, 0).unwrap();
            if !reader.is_empty_at(next) {
                return None;
            }
            let span = reader.select(start, next);
            let stars = span.bytes().filter(|&b| b == b'*').count();
            let dashes = span.bytes().filter(|&b| b == b'-').count();
            if stars < 3 && dashes < 3 {
                return None;
            }
            Some((Token::new(kind, start, next), next))
        }
        DjotToken::ListItem => match_list_item(reader, start),
        DjotToken::PipeTable => {
            let next = reader.token(start, "|")?;
            let _ = next;
            Some((Token::new(kind, start, start), start))
        }
        DjotToken::Paragraph => {
            if reader.is_empty_at(start) {
                return None;
            }
            Some((Token::new(kind, start, start), start))
        }
        _ => None,
    }
}

/// Task-list prefixes must be tried before the plain `- ` unordered marker,
/// or the task checkbox gets swallowed as an ordinary list bullet.
const SIMPLE_LIST_MARKERS: &[&str] = &["- [ ] ", "- [x] ", "- [X] ", "+ ", "* ", "- ", ": "];

fn match_list_item(reader: &TextReader, start: usize) -> Option<(Token, usize)> {
    for marker in SIMPLE_LIST_MARKERS {
        if let Some(next) = reader.token(start, marker) {
            return Some((Token::new(DjotToken::ListItem, start, next), next));
        }
    }
    for complex in [&masks::DIGIT, &masks::LOWER_ALPHA, &masks::UPPER_ALPHA] {
        if let Some(paren_next) = reader.token(start, "(") {
            let Some(next) = reader.mask_repeat(paren_next, complex, 1) else { continue };
            if let Some(next) = reader.token(next, ") ") {
                return Some((Token::new(DjotToken::ListItem, start, next), next));
            }
            continue;
        }
        let Some(next) = reader.mask_repeat(start, complex, 1) else { continue };
        if let Some(next) = reader.token(next, ") ") {
            return Some((Token::new(DjotToken::ListItem, start, next), next));
        }
        if let Some(next) = reader.token(next, ". ") {
            return Some((Token::new(DjotToken::ListItem, start, next), next));
        }
    }
    None
}
