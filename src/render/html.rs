//! HTML conversion: a small output buffer plus a per-node dispatch that
//! mirrors the reference registry's three shapes (standalone void tags,
//! inline tags, and block tags that bracket their content with newlines).
//!
//! The reference keeps a `Parent` pointer around so the text converter can
//! tell whether it sits directly under a raw block/inline whose target
//! format matches the active one. Since that's the only place the parent is
//! ever consulted, it's threaded here as a plain `raw_passthrough` flag
//! instead of a tree pointer.

use crate::ast::{DjotNode, TreeNode};
use crate::token::{
    Attributes, DISPLAY_MATH_KEY, HEADING_LEVEL_KEY, INLINE_MATH_KEY, RAW_BLOCK_FORMAT_KEY, RAW_INLINE_FORMAT_KEY,
};

struct HtmlWriter {
    buffer: String,
}

impl HtmlWriter {
    fn new() -> Self {
        HtmlWriter { buffer: String::new() }
    }

    /// `class` sorts first, `id` second, everything else keeps the
    /// attribute map's insertion order. Keys starting with `$` are internal
    /// bookkeeping and never reach the output.
    fn open_tag(&mut self, tag: &str, attributes: &Attributes) -> &mut Self {
        self.buffer.push('<');
        self.buffer.push_str(tag);
        let mut entries: Vec<(&str, &str)> = attributes.entries().collect();
        entries.sort_by_key(|(key, _)| match *key {
            "class" => 0u8,
            "id" => 1u8,
            _ => 2u8,
        });
        for (key, value) in entries {
            if key.starts_with('$') {
                continue;
            }
            self.buffer.push(' ');
            self.buffer.push_str(key);
            self.buffer.push_str("=\"");
            self.buffer.push_str(value);
            self.buffer.push('"');
        }
        self.buffer.push('>');
        self
    }

    fn close_tag(&mut self, tag: &str) -> &mut Self {
        self.buffer.push_str("</");
        self.buffer.push_str(tag);
        self.buffer.push('>');
        self
    }

    fn write_str(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self
    }
}

/// Symbol names a `:name:` span can resolve to. Anything not listed here
/// renders as the literal `:name:` text instead.
fn lookup_symbol(name: &str) -> Option<&'static str> {
    match name {
        "+1" => Some("\u{1f44d}"),
        "smiley" => Some("\u{1f603}"),
        _ => None,
    }
}

/// Escape `&`, `<`, `>` and map smart-typography characters to their named
/// HTML entities. Applied to every text node except inside a raw
/// block/inline whose target format matches the one being rendered.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{2013}' => out.push_str("&ndash;"),
            '\u{2014}' => out.push_str("&mdash;"),
            '\u{201c}' => out.push_str("&ldquo;"),
            '\u{201d}' => out.push_str("&rdquo;"),
            '\u{2018}' => out.push_str("&lsquo;"),
            '\u{2019}' => out.push_str("&rsquo;"),
            '\u{2026}' => out.push_str("&hellip;"),
            other => out.push(other),
        }
    }
    out
}

pub fn render_html(nodes: &[TreeNode], format: &str) -> String {
    let mut writer = HtmlWriter::new();
    write_nodes(&mut writer, nodes, format, false);
    writer.buffer
}

fn write_nodes(writer: &mut HtmlWriter, nodes: &[TreeNode], format: &str, raw_passthrough: bool) {
    for node in nodes {
        write_node(writer, node, format, raw_passthrough);
    }
}

fn inline_tag(writer: &mut HtmlWriter, tag: &str, node: &TreeNode, format: &str) {
    writer.open_tag(tag, &node.attributes);
    write_nodes(writer, &node.children, format, false);
    writer.close_tag(tag);
}

fn block_tag(writer: &mut HtmlWriter, tag: &str, node: &TreeNode, format: &str) {
    writer.open_tag(tag, &node.attributes);
    writer.write_str("\n");
    write_nodes(writer, &node.children, format, false);
    writer.close_tag(tag);
    writer.write_str("\n");
}

fn write_node(writer: &mut HtmlWriter, node: &TreeNode, format: &str, raw_passthrough: bool) {
    match node.kind {
        DjotNode::ThematicBreak => {
            writer.open_tag("hr", &node.attributes).write_str("\n");
        }
        DjotNode::LineBreak => {
            writer.open_tag("br", &node.attributes).write_str("\n");
        }
        DjotNode::Text => {
            if raw_passthrough {
                writer.write_str(&node.text);
            } else {
                let escaped = escape_text(&node.text);
                writer.write_str(&escaped);
            }
        }
        DjotNode::Symbols => {
            let name = node.children.first().map(|c| c.text.as_str()).unwrap_or("");
            match lookup_symbol(name) {
                Some(rendered) => {
                    writer.write_str(rendered);
                }
                None => {
                    writer.write_str(":").write_str(name).write_str(":");
                }
            }
        }
        DjotNode::Insert => inline_tag(writer, "ins", node, format),
        DjotNode::Delete => inline_tag(writer, "del", node, format),
        DjotNode::Superscript => inline_tag(writer, "sup", node, format),
        DjotNode::Subscript => inline_tag(writer, "sub", node, format),
        DjotNode::Highlighted => inline_tag(writer, "mark", node, format),
        DjotNode::Emphasis => inline_tag(writer, "em", node, format),
        DjotNode::Strong => inline_tag(writer, "strong", node, format),
        DjotNode::Paragraph => {
            inline_tag(writer, "p", node, format);
            writer.write_str("\n");
        }
        DjotNode::Image => {
            writer.open_tag("img", &node.attributes);
        }
        DjotNode::Link => inline_tag(writer, "a", node, format),
        DjotNode::Span => inline_tag(writer, "span", node, format),
        DjotNode::Div => block_tag(writer, "div", node, format),
        DjotNode::TableCaption => write_nodes(writer, &node.children, format, raw_passthrough),
        DjotNode::Table => {
            if matches!(node.children.first(), Some(c) if c.kind == DjotNode::TableCaption) {
                writer.open_tag("table", &node.attributes);
                writer.write_str("\n");
                writer.open_tag("caption", &Attributes::new());
                write_nodes(writer, &node.children[..1], format, false);
                writer.close_tag("caption");
                writer.write_str("\n");
                writer.open_tag("tbody", &Attributes::new());
                write_nodes(writer, &node.children[1..], format, false);
                writer.close_tag("tbody");
                writer.close_tag("table");
            } else {
                block_tag(writer, "table", node, format);
            }
        }
        DjotNode::TableRow => block_tag(writer, "tr", node, format),
        DjotNode::TableHeader => {
            inline_tag(writer, "th", node, format);
            writer.write_str("\n");
        }
        DjotNode::TableCell => {
            inline_tag(writer, "td", node, format);
            writer.write_str("\n");
        }
        DjotNode::TaskList | DjotNode::UnorderedList => block_tag(writer, "ul", node, format),
        DjotNode::DefinitionList => block_tag(writer, "dl", node, format),
        DjotNode::OrderedList => block_tag(writer, "ol", node, format),
        DjotNode::ListItem => block_tag(writer, "li", node, format),
        DjotNode::DefinitionTerm => {
            inline_tag(writer, "dt", node, format);
            writer.write_str("\n");
        }
        DjotNode::DefinitionItem => block_tag(writer, "dd", node, format),
        DjotNode::Section => block_tag(writer, "section", node, format),
        DjotNode::Quote => block_tag(writer, "blockquote", node, format),
        DjotNode::Document | DjotNode::FootnoteDef | DjotNode::ReferenceDef => {
            write_nodes(writer, &node.children, format, raw_passthrough)
        }
        DjotNode::Code => {
            writer.open_tag("pre", &Attributes::new());
            writer.open_tag("code", &node.attributes);
            write_nodes(writer, &node.children, format, false);
            writer.close_tag("code").close_tag("pre").write_str("\n");
        }
        DjotNode::Verbatim => {
            if node.attributes.get(INLINE_MATH_KEY).is_some() {
                let mut attrs = Attributes::new();
                attrs.set("class", "math inline");
                writer.open_tag("span", &attrs);
                writer.write_str("\\(");
                write_nodes(writer, &node.children, format, false);
                writer.write_str("\\)");
                writer.close_tag("span");
            } else if node.attributes.get(DISPLAY_MATH_KEY).is_some() {
                let mut attrs = Attributes::new();
                attrs.set("class", "math display");
                writer.open_tag("span", &attrs);
                writer.write_str("\\[");
                write_nodes(writer, &node.children, format, false);
                writer.write_str("\\]");
                writer.close_tag("span");
            } else if node.attributes.get(RAW_INLINE_FORMAT_KEY) == Some(format) {
                write_nodes(writer, &node.children, format, true);
            } else {
                writer.open_tag("code", &Attributes::new());
                write_nodes(writer, &node.children, format, false);
                writer.close_tag("code");
            }
        }
        DjotNode::Heading => {
            let level = node.attributes.get(HEADING_LEVEL_KEY).map(str::len).unwrap_or(1).max(1);
            let tag = format!("h{level}");
            writer.open_tag(&tag, &node.attributes);
            write_nodes(writer, &node.children, format, raw_passthrough);
            writer.close_tag(&tag);
            writer.write_str("\n");
        }
        DjotNode::Raw => {
            if node.attributes.get(RAW_BLOCK_FORMAT_KEY) == Some(format) {
                write_nodes(writer, &node.children, format, true);
            }
        }
    }
}
