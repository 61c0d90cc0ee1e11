//! The tokenizer driver: turns a document into a flat, paired `TokenList`.
//!
//! Two passes cooperate: an outer, line-oriented block pass (`build_djot_tokens`)
//! that tracks a stack of open containers (quote/list/div/code/heading/.../
//! paragraph) directly as parallel vectors, and an inner pass
//! (`build_inline_djot_tokens`) that re-tokenizes each accumulated
//! paragraph/heading's byte ranges using a `TokenStack`. The block pass
//! flushes to the inline pass whenever a block closes.

use crate::matchers::attribute::match_djot_attribute;
use crate::matchers::block::match_block_token;
use crate::matchers::inline::match_inline_token;
use crate::reader::{masks, TextReader};
use crate::stack::TokenStack;
use crate::token::{DjotToken, Token, TokenList};

fn prefix_length(document: &str, token: &Token, b: u8) -> usize {
    document.as_bytes()[token.start..token.end].iter().take_while(|&&c| c == b).count()
}

struct Driver<'a> {
    document: &'a str,
    final_tokens: TokenList,
    block_tokens: Vec<Token>,
    block_token_offset: Vec<usize>,
    block_line_offset: Vec<usize>,
    inline_parts: Vec<(usize, usize)>,
}

impl<'a> Driver<'a> {
    fn new(document: &'a str) -> Self {
        let root = Token::new(DjotToken::Document, 0, 0);
        Driver {
            document,
            final_tokens: vec![root.clone()],
            block_tokens: vec![root],
            block_token_offset: vec![0],
            block_line_offset: vec![0],
            inline_parts: Vec::new(),
        }
    }

    fn open_block_level(&mut self, token: Token, line_offset: usize) {
        self.final_tokens.push(token.clone());
        self.block_token_offset.push(self.final_tokens.len() - 1);
        self.block_tokens.push(token);
        self.block_line_offset.push(line_offset);
    }

    fn pop_metadata(&mut self) {
        self.block_line_offset.pop();
        self.block_token_offset.pop();
        self.block_tokens.pop();
    }

    fn close_block_levels_until(&mut self, start: usize, end: usize, level: isize) {
        if !self.inline_parts.is_empty() && self.block_tokens.last().unwrap().kind == DjotToken::Code {
            for (s, e) in self.inline_parts.drain(..) {
                self.final_tokens.push(Token::new(DjotToken::None, s, e));
            }
        } else if !self.inline_parts.is_empty() {
            let parts = std::mem::take(&mut self.inline_parts);
            self.final_tokens
                .extend(build_inline_djot_tokens(self.document, &parts));
        }
        let mut i = self.block_tokens.len() as isize - 1;
        while i > level {
            let idx = i as usize;
            let kind = self.block_tokens[idx].kind;
            self.final_tokens.push(Token::close(kind, start, end));
            let offset = self.block_token_offset[idx];
            let delta = (self.final_tokens.len() - 1 - offset) as isize;
            self.final_tokens[offset].jump_to_pair = delta;
            let last = self.final_tokens.len() - 1;
            self.final_tokens[last].jump_to_pair = -delta;
            self.pop_metadata();
            i -= 1;
        }
    }
}

fn scan_lines(document: &str) -> Vec<(usize, usize)> {
    let bytes = document.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        if bytes[i] == b'\n' {
            lines.push((start, i));
            start = i + 1;
        }
    }
    if start < bytes.len() {
        lines.push((start, bytes.len()));
    }
    lines
}

/// Tokenize a full document into a flat, paired `TokenList`.
pub fn build_djot_tokens(document: &str) -> TokenList {
    let mut d = Driver::new(document);

    for (line_start, line_end) in scan_lines(document) {
        let reader = TextReader::new(&document[..line_end]);
        let mut state = line_start;
        let last_block_type = d.block_tokens.last().unwrap().kind;

        // Block-level attribute pre-line, only directly under a container
        // that admits a leading sibling attribute block.
        if matches!(
            last_block_type,
            DjotToken::Document | DjotToken::Quote | DjotToken::ListItem | DjotToken::Div
        ) {
            let skip = reader.mask_repeat(state, &masks::SPACE, 0).unwrap();
            if let Some((attrs, next)) = match_djot_attribute(&reader, skip) {
                if let Some(next) = reader.empty_or_whitespace(next) {
                    d.final_tokens
                        .push(Token::new(DjotToken::Attribute, state, next).with_attributes(attrs));
                    continue;
                }
            }
        }

        let last_div_at = d.block_tokens.iter().rposition(|t| t.kind == DjotToken::Div);

        // Check container-continuation prefixes; track the deepest level
        // that still validly continues (`reset_block_at`).
        let mut reset_block_at: isize = 0;
        let mut potential_reset = false;
        for i in 0..d.block_tokens.len() {
            let kind = d.block_tokens[i].kind;
            if kind == DjotToken::ListItem || kind == DjotToken::FootnoteDef {
                let next = reader.mask_repeat(state, &masks::SPACE, 0).unwrap();
                if !reader.is_empty_or_whitespace(next) && next - line_start <= d.block_line_offset[i] {
                    potential_reset = true;
                    break;
                }
                reset_block_at = i as isize;
            } else if kind == DjotToken::Quote || kind == DjotToken::Heading {
                match match_block_token(&reader, state, kind) {
                    Some((_, next)) => {
                        state = next;
                        reset_block_at = i as isize;
                    }
                    None => {
                        potential_reset = true;
                        break;
                    }
                }
            } else if kind != DjotToken::Paragraph && kind != DjotToken::Heading && kind != DjotToken::ReferenceDef {
                reset_block_at = i as isize;
            }
        }

        if (last_block_type != DjotToken::Code || potential_reset) && reader.is_empty_or_whitespace(state) {
            d.close_block_levels_until(state, state, reset_block_at);
            continue;
        }

        if last_block_type == DjotToken::Code {
            let last_block = d.block_tokens.last().unwrap().clone();
            if let Some((token, _)) = match_block_token(&reader, state, DjotToken::Code) {
                if prefix_length(document, &last_block, b'`') <= prefix_length(document, &token, b'`')
                    && token.attributes.is_empty()
                {
                    let n = d.block_tokens.len();
                    d.close_block_levels_until(token.start, token.end, n as isize - 2);
                } else {
                    d.inline_parts.push((state, line_end));
                }
            } else {
                d.inline_parts.push((state, line_end));
            }
            continue;
        }

        if let Some(div_at) = last_div_at {
            let last_block = d.block_tokens.last().unwrap().clone();
            if let Some((token, _)) = match_block_token(&reader, state, DjotToken::Div) {
                if last_block.len() <= token.len() && token.attributes.is_empty() {
                    d.close_block_levels_until(token.start, token.end, div_at as isize - 1);
                    continue;
                }
            }
        }

        'block: loop {
            let last_block_type = d.block_tokens.last().unwrap().kind;

            if let Some((tb, next)) = match_block_token(&reader, state, DjotToken::ThematicBreak) {
                d.final_tokens.push(Token::new(DjotToken::ThematicBreak, tb.start, tb.end));
                state = next;
                continue 'block;
            }

            state = reader.mask_repeat(state, &masks::SPACE, 0).unwrap();

            let mut reset_list_position: Option<usize> = None;
            for i in (0..d.block_tokens.len()).rev() {
                if d.block_tokens[i].kind == DjotToken::ListItem && d.block_line_offset[i] >= state - line_start {
                    reset_list_position = Some(i);
                }
            }

            if last_block_type != DjotToken::Heading && last_block_type != DjotToken::Code {
                if let Some((list_item, next)) = match_block_token(&reader, state, DjotToken::ListItem) {
                    if let Some(pos) = reset_list_position {
                        d.close_block_levels_until(state, state, pos as isize - 1);
                    }
                    let fits_hierarchy = reset_list_position.is_some()
                        || !matches!(last_block_type, DjotToken::Paragraph | DjotToken::Heading | DjotToken::Code);
                    if fits_hierarchy {
                        let line_offset = list_item.start - line_start;
                        d.open_block_level(Token::new(DjotToken::ListItem, list_item.start, list_item.end), line_offset);
                        state = next;
                        continue 'block;
                    }
                }
            }

            let last_block_type = d.block_tokens.last().unwrap().kind;
            if last_block_type == DjotToken::Paragraph || last_block_type == DjotToken::Heading {
                d.inline_parts.push((state, line_end));
                break 'block;
            }
            if last_block_type == DjotToken::Code {
                break 'block;
            }

            if let Some(pos) = reset_list_position {
                d.close_block_levels_until(state, state, pos as isize - 1);
                continue 'block;
            }

            let candidates: &[DjotToken] = if last_block_type == DjotToken::Document {
                &[
                    DjotToken::FootnoteDef,
                    DjotToken::ReferenceDef,
                    DjotToken::Heading,
                    DjotToken::Quote,
                    DjotToken::ListItem,
                    DjotToken::Code,
                    DjotToken::Div,
                    DjotToken::PipeTable,
                    DjotToken::Paragraph,
                ]
            } else {
                &[
                    DjotToken::Heading,
                    DjotToken::Quote,
                    DjotToken::ListItem,
                    DjotToken::Code,
                    DjotToken::Div,
                    DjotToken::PipeTable,
                    DjotToken::Paragraph,
                ]
            };
            let mut matched = false;
            for &kind in candidates {
                if let Some((block, next)) = match_block_token(&reader, state, kind) {
                    let line_offset = block.start - line_start;
                    d.open_block_level(block, line_offset);
                    state = next;
                    matched = true;
                    break;
                }
            }
            if matched {
                continue 'block;
            }
            break 'block;
        }
    }

    d.close_block_levels_until(document.len(), document.len(), -1);
    d.final_tokens
}

/// Re-tokenize the accumulated inline byte ranges of a paragraph/heading.
pub fn build_inline_djot_tokens(document: &str, parts: &[(usize, usize)]) -> TokenList {
    let default_parts;
    let parts: &[(usize, usize)] = if parts.is_empty() {
        default_parts = [(0, document.len())];
        &default_parts
    } else {
        parts
    };

    let mut stack = TokenStack::new();
    let left = parts[0].0;
    let right = parts[parts.len() - 1].1;
    stack.open_level(Token::new(DjotToken::Paragraph, left, left));

    const PRIORITY: [DjotToken; 16] = [
        DjotToken::RawFormat,
        DjotToken::Verbatim,
        DjotToken::ImageSpan,
        DjotToken::LinkUrl,
        DjotToken::LinkReference,
        DjotToken::Autolink,
        DjotToken::Emphasis,
        DjotToken::Strong,
        DjotToken::Highlighted,
        DjotToken::Subscript,
        DjotToken::Superscript,
        DjotToken::Insert,
        DjotToken::Delete,
        DjotToken::FootnoteReference,
        DjotToken::Span,
        DjotToken::Symbols,
    ];

    for &(part_start, part_end) in parts {
        let reader = TextReader::new(&document[..part_end]);
        stack.fill_until(part_start, DjotToken::Ignore);
        let mut state = part_start;

        'inline: while !reader.is_empty_at(state) {
            let open_inline_kind = stack.last_level()[0].kind;
            let last_inline = stack.last_level().last().unwrap().clone();

            if open_inline_kind == DjotToken::Verbatim {
                let Some(next) = match_inline_token(&reader, state, DjotToken::Verbatim, true) else {
                    state += 1;
                    continue;
                };
                let open_token = stack.last_level()[0].clone();
                let open_text = reader.select(open_token.start, open_token.end);
                let close_text = reader.select(state, next);
                if open_text.trim_start_matches('$') != close_text {
                    state = next;
                    continue;
                }
                stack.close_level(Token::close(DjotToken::Verbatim, state, next));
                state = next;
                continue;
            }

            if let Some((attrs, next)) = match_djot_attribute(&reader, state) {
                stack.push(Token::new(DjotToken::Attribute, state, next).with_attributes(attrs));
                state = next;
                continue;
            }

            let mut matched_standalone = false;
            for &kind in &[DjotToken::EscapedSymbol, DjotToken::SmartSymbol] {
                if let Some(next) = match_inline_token(&reader, state, kind, false) {
                    stack.push(Token::new(kind, state, next));
                    state = next;
                    matched_standalone = true;
                    break;
                }
            }
            if matched_standalone {
                continue 'inline;
            }

            for &kind in &PRIORITY {
                let forbid_close = (kind == DjotToken::Emphasis
                    && last_inline.kind == DjotToken::Emphasis
                    && !last_inline.is_close
                    && last_inline.end == state)
                    || (kind == DjotToken::Strong
                        && last_inline.kind == DjotToken::Strong
                        && !last_inline.is_close
                        && last_inline.end == state);

                if let Some(next) = match_inline_token(&reader, state, kind, true) {
                    if !forbid_close && stack.pop_forget_until(kind) {
                        stack.close_level(Token::close(kind, state, next));
                        state = next;
                        continue 'inline;
                    }
                }

                if kind == DjotToken::RawFormat
                    && !(last_inline.kind == DjotToken::Verbatim && last_inline.is_close)
                {
                    continue;
                }
                if (kind == DjotToken::LinkReference || kind == DjotToken::LinkUrl)
                    && !((last_inline.kind == DjotToken::Span || last_inline.kind == DjotToken::ImageSpan)
                        && last_inline.is_close)
                {
                    continue;
                }

                if let Some(next) = match_inline_token(&reader, state, kind, false) {
                    let mut token = Token::new(kind, state, next);
                    if kind == DjotToken::Verbatim {
                        let text = reader.select(state, next);
                        if text.starts_with("$$") {
                            token.attributes.set(crate::token::DISPLAY_MATH_KEY, "");
                        } else if text.starts_with('$') {
                            token.attributes.set(crate::token::INLINE_MATH_KEY, "");
                        }
                    }
                    stack.open_level(token);
                    state = next;
                    continue 'inline;
                }
            }

            state += 1;
        }
    }

    if stack.last_level()[0].kind == DjotToken::Verbatim {
        stack.close_level(Token::close(DjotToken::Verbatim, right, right));
    }
    stack.pop_forget_until(DjotToken::Paragraph);
    stack.close_level(Token::close(DjotToken::Paragraph, right, right));

    let tokens = stack.last_level().clone();
    tokens[1..tokens.len() - 1].to_vec()
}
