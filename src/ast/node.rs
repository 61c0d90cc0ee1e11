//! The parsed document tree: a closed set of node kinds plus a plain
//! n-ary tree shape, independent of the renderer that eventually walks it.

use crate::token::{Attributes, DjotToken, Token};
use serde::{Deserialize, Serialize};

/// The closed set of AST node kinds a document can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DjotNode {
    Document,
    Section,
    Paragraph,
    Heading,
    Quote,
    UnorderedList,
    OrderedList,
    DefinitionList,
    TaskList,
    ListItem,
    DefinitionTerm,
    DefinitionItem,
    Code,
    Raw,
    ThematicBreak,
    Div,
    Table,
    TableCaption,
    TableRow,
    TableHeader,
    TableCell,
    ReferenceDef,
    FootnoteDef,
    Text,
    Emphasis,
    Strong,
    Highlighted,
    Subscript,
    Superscript,
    Insert,
    Delete,
    Symbols,
    Verbatim,
    LineBreak,
    Link,
    Image,
    Span,
}

impl DjotNode {
    pub fn is_list(self) -> bool {
        matches!(
            self,
            DjotNode::UnorderedList | DjotNode::OrderedList | DjotNode::TaskList | DjotNode::DefinitionList
        )
    }
}

/// The handful of block/inline token kinds that map onto an AST node of the
/// same shape with no special-cased construction logic.
pub fn convert_token_to_node(token: DjotToken) -> Option<DjotNode> {
    use DjotToken::*;
    Some(match token {
        Document => DjotNode::Document,
        Heading => DjotNode::Heading,
        Quote => DjotNode::Quote,
        ListItem => DjotNode::ListItem,
        Code => DjotNode::Code,
        Div => DjotNode::Div,
        PipeTable => DjotNode::Table,
        FootnoteDef => DjotNode::FootnoteDef,
        Paragraph => DjotNode::Paragraph,
        ThematicBreak => DjotNode::ThematicBreak,
        Emphasis => DjotNode::Emphasis,
        Strong => DjotNode::Strong,
        Highlighted => DjotNode::Highlighted,
        Subscript => DjotNode::Subscript,
        Superscript => DjotNode::Superscript,
        Insert => DjotNode::Insert,
        Delete => DjotNode::Delete,
        _ => return None,
    })
}

/// One node of the parsed tree. Leaf text lives in `text`; everything else
/// nests through `children`. `index` is this node's position among its
/// siblings, filled in once the whole tree is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub kind: DjotNode,
    #[serde(skip_serializing_if = "Attributes::is_empty", default)]
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<TreeNode>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub text: String,
    #[serde(skip)]
    pub index: usize,
}

impl TreeNode {
    pub fn leaf(kind: DjotNode) -> Self {
        TreeNode { kind, attributes: Attributes::new(), children: Vec::new(), text: String::new(), index: 0 }
    }

    pub fn text(text: impl Into<String>) -> Self {
        TreeNode { kind: DjotNode::Text, attributes: Attributes::new(), children: Vec::new(), text: text.into(), index: 0 }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

pub fn update_indexes(nodes: &mut [TreeNode]) {
    for (i, node) in nodes.iter_mut().enumerate() {
        node.index = i;
        update_indexes(&mut node.children);
    }
}

/// A token only ever holds insignificant whitespace: a gap filler (`None`)
/// or a run of smart-symbol dashes/quotes, and its text is blank either way.
pub fn is_space_token(document: &str, token: &Token) -> bool {
    if token.kind != DjotToken::None && token.kind != DjotToken::SmartSymbol {
        return false;
    }
    document[token.start..token.end].trim_matches(['\r', '\n', '\t', ' ']).is_empty()
}

/// Drop leading/trailing whitespace-only tokens from a child range before
/// recursing into it.
pub fn trim_padding<'a>(document: &str, list: &'a [Token]) -> &'a [Token] {
    let mut start = 0;
    let mut end = list.len();
    while start < end && is_space_token(document, &list[start]) {
        start += 1;
    }
    while start < end && is_space_token(document, &list[end - 1]) {
        end -= 1;
    }
    &list[start..end]
}

/// Concatenate the raw text of every plain/smart-symbol token in `list`,
/// skipping markup tokens entirely.
pub fn select_text(document: &str, list: &[Token]) -> String {
    let mut text = String::new();
    for token in list {
        if token.kind == DjotToken::None || token.kind == DjotToken::SmartSymbol {
            text.push_str(&document[token.start..token.end]);
        }
    }
    text
}
