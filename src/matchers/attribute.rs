//! `{...}` attribute block recognition.

use crate::reader::{masks, ByteMask, TextReader};
use crate::token::Attributes;

const RAW_STRING: ByteMask = ByteMask::new(b"\\\"").negate();

/// Match a `"..."` quoted string starting at `pos`, unescaping `\"` and
/// `\\`. Returns the unescaped value and the position after the closing
/// quote.
pub fn match_quoted_string(reader: &TextReader, pos: usize) -> Option<(String, usize)> {
    let mut next = reader.token(pos, "\"")?;
    let mut value = String::new();
    let mut start = next;
    loop {
        next = reader.mask_repeat(next, &RAW_STRING, 0).unwrap();
        value.push_str(reader.select(start, next));
        start = next;
        if let Some(end) = reader.token(next, "\"") {
            return Some((value, end));
        }
        let escape = reader.token(next, "\\")?;
        if reader.is_empty_at(escape) {
            return None;
        }
        value.push(reader.peek(escape)? as char);
        start = escape + 1;
        next = escape + 1;
    }
}

/// Match a full `{ ... }` attribute block starting at `pos`.
pub fn match_djot_attribute(reader: &TextReader, pos: usize) -> Option<(Attributes, usize)> {
    let mut attributes = Attributes::new();
    let mut next = reader.token(pos, "{")?;
    let mut comment = false;
    loop {
        next = reader.mask_repeat(next, &masks::SPACE_NEWLINE, 0).unwrap();
        if reader.is_empty_at(next) {
            return None;
        }
        if let Some(after) = reader.token(next, "%") {
            comment = !comment;
            next = after;
            continue;
        }
        if comment {
            next += 1;
            continue;
        }
        if let Some(end) = reader.token(next, "}") {
            return Some((attributes, end));
        }
        if let Some(class_start) = reader.token(next, ".") {
            let end = reader.mask_repeat(class_start, &masks::ATTRIBUTE_TOKEN, 1)?;
            attributes.append("class", reader.select(class_start, end));
            next = end;
            continue;
        }
        if let Some(id_start) = reader.token(next, "#") {
            let end = reader.mask_repeat(id_start, &masks::ATTRIBUTE_TOKEN, 1)?;
            attributes.set("id", reader.select(id_start, end));
            next = end;
            continue;
        }
        let key_start = next;
        let key_end = reader.mask_repeat(next, &masks::ATTRIBUTE_TOKEN, 1)?;
        next = reader.token(key_end, "=")?;
        if let Some((value, after)) = match_quoted_string(reader, next) {
            attributes.set(reader.select(key_start, key_end), value);
            next = after;
        } else {
            let value_start = next;
            next = reader.mask_repeat(next, &masks::ATTRIBUTE_TOKEN, 1)?;
            attributes.set(reader.select(key_start, key_end), reader.select(value_start, next));
        }
    }
}
