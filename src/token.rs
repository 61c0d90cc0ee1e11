//! Lexical token types and the ordered attribute map they carry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The closed set of lexical token kinds produced by the tokenizer.
///
/// Every paired kind (a block opener or an inline opener) is emitted twice:
/// once as an open token and once as its close. `Token::is_close` carries
/// that distinction instead of the open/close-via-XOR trick used by the
/// reference implementation - the pairing contract is the same, only the
/// encoding differs (see the design notes in SPEC_FULL.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DjotToken {
    // Block openers
    Document,
    Heading,
    Quote,
    ListItem,
    Code,
    Div,
    PipeTable,
    PipeTableCaption,
    ReferenceDef,
    FootnoteDef,
    Paragraph,
    // Block markers (never paired)
    ThematicBreak,
    Attribute,
    Padding,
    Ignore,
    // Inline openers
    Span,
    ImageSpan,
    LinkUrl,
    LinkReference,
    Autolink,
    Verbatim,
    Emphasis,
    Strong,
    Highlighted,
    Subscript,
    Superscript,
    Insert,
    Delete,
    FootnoteReference,
    RawFormat,
    Symbols,
    PipeTableSeparator,
    // Non-paired inlines
    EscapedSymbol,
    SmartSymbol,
    None,
}

impl DjotToken {
    /// True for the block/inline opener kinds that are always matched with
    /// a corresponding close token of the same kind.
    pub fn is_paired(self) -> bool {
        use DjotToken::*;
        !matches!(
            self,
            ThematicBreak | Attribute | Padding | Ignore | EscapedSymbol | SmartSymbol | None
        )
    }
}

/// Internal metadata keys stashed on a token's attribute map. These never
/// reach the renderer (any key beginning with `$` is suppressed there).
pub const DIV_CLASS_KEY: &str = "$DivClassKey";
pub const CODE_LANG_KEY: &str = "$CodeLangKey";
pub const INLINE_MATH_KEY: &str = "$InlineMathKey";
pub const DISPLAY_MATH_KEY: &str = "$DisplayMathKey";
pub const REFERENCE_KEY: &str = "$ReferenceKey";
pub const HEADING_LEVEL_KEY: &str = "$HeadingLevelKey";
pub const SPARSE_LIST_KEY: &str = "$SparseListNodeKey";
pub const DEFINITION_LIST_ITEM_KEY: &str = "$DefinitionListItemKey";
pub const RAW_INLINE_FORMAT_KEY: &str = "$RawInlineFormatKey";
pub const RAW_BLOCK_FORMAT_KEY: &str = "$RawBlockFormatKey";

/// An insertion-ordered key/value map. `class` is special-cased by `append`,
/// which space-concatenates repeated values instead of overwriting them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    keys: Vec<String>,
    values: HashMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set `key` to `value`, overwriting any previous value but keeping the
    /// original insertion position if `key` was already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, value.into());
        self
    }

    /// Append `value` to `key`, space-separating it from any existing value.
    /// Used to accumulate `class` tokens from repeated attribute blocks.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.values.get_mut(&key) {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(&value);
            }
            None => {
                self.keys.push(key.clone());
                self.values.insert(key, value);
            }
        }
        self
    }

    /// Merge `other` into `self`, appending into `class` and overwriting
    /// everything else, in `other`'s insertion order.
    pub fn merge_with(&mut self, other: &Attributes) {
        for key in &other.keys {
            let value = &other.values[key];
            if key == "class" {
                self.append(key.clone(), value.clone());
            } else {
                self.set(key.clone(), value.clone());
            }
        }
    }

    /// Iterate entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys.iter().map(move |k| (k.as_str(), self.values[k].as_str()))
    }
}

/// A lexical atom: a byte range tagged with a kind, an optional attribute
/// block, and (for paired kinds) the signed index delta to its partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: DjotToken,
    pub is_close: bool,
    pub start: usize,
    pub end: usize,
    /// Signed offset, within the flat token list, from an open token to its
    /// matching close (and the negation on the close token back to its
    /// open). Zero for unpaired tokens.
    pub jump_to_pair: isize,
    pub attributes: Attributes,
}

impl Token {
    pub fn new(kind: DjotToken, start: usize, end: usize) -> Self {
        Token {
            kind,
            is_close: false,
            start,
            end,
            jump_to_pair: 0,
            attributes: Attributes::new(),
        }
    }

    pub fn close(kind: DjotToken, start: usize, end: usize) -> Self {
        Token {
            kind,
            is_close: true,
            start,
            end,
            jump_to_pair: 0,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn text<'a>(&self, document: &'a str) -> &'a str {
        &document[self.start..self.end]
    }

    /// The matching token for a paired open/close, given this token's own
    /// index within `list`.
    pub fn pair_index(&self, index: usize) -> Option<usize> {
        (self.jump_to_pair != 0).then(|| (index as isize + self.jump_to_pair) as usize)
    }
}

pub type TokenList = Vec<Token>;
