//! The two-pass tree builder: a grouping scan that decides which tokens
//! start a synthetic container (section, list, table) and how many of those
//! containers close at each index, followed by an emission pass that walks
//! the same token list again, actually building `TreeNode`s.

use std::collections::HashMap;

use crate::reader::masks;
use crate::token::{
    Attributes, DjotToken, Token, CODE_LANG_KEY, DIV_CLASS_KEY, RAW_BLOCK_FORMAT_KEY, RAW_INLINE_FORMAT_KEY,
    SPARSE_LIST_KEY,
};

use super::context::{detect_quote_direction, create_section_id, DjotContext, QuoteDirection};
use super::node::{convert_token_to_node, select_text, trim_padding, update_indexes, DjotNode, TreeNode};

/// A list's shape: its node kind, its CSS-visible numbering style, and (for
/// ordered lists) its marker alphabet (`1`, `a`, or `A`).
#[derive(Debug, Clone, PartialEq)]
pub struct ListProps {
    pub kind: DjotNode,
    pub style: String,
    pub marker: String,
}

fn detect_list_props(document: &str, token: &Token) -> (ListProps, String) {
    let bytes = document.as_bytes();
    let mut start = token.start;
    let mut style = String::new();
    if bytes[start] == b'(' {
        start += 1;
        style.push('(');
    }
    let mut end = start;
    while end < token.end && (masks::DIGIT.has(bytes[end]) || masks::LOWER_ALPHA.has(bytes[end]) || masks::UPPER_ALPHA.has(bytes[end])) {
        end += 1;
    }
    while end < token.end {
        style.push(bytes[end] as char);
        end += 1;
    }

    let pivot = bytes[start];
    let marker_text = &document[token.start..token.end];
    if marker_text.starts_with("- [") {
        return (ListProps { kind: DjotNode::TaskList, style: String::new(), marker: String::new() }, String::new());
    }
    if masks::UNORDERED_LIST.has(pivot) {
        return (ListProps { kind: DjotNode::UnorderedList, style, marker: String::new() }, String::new());
    }
    if pivot == b':' {
        return (ListProps { kind: DjotNode::DefinitionList, style: String::new(), marker: String::new() }, String::new());
    }
    if masks::DIGIT.has(pivot) {
        let prefix_len = document[start..].bytes().take_while(|&b| masks::DIGIT.has(b)).count();
        let prefix = document[start..start + prefix_len].to_string();
        return (ListProps { kind: DjotNode::OrderedList, style, marker: "1".to_string() }, prefix);
    }
    if masks::LOWER_ALPHA.has(pivot) {
        return (
            ListProps { kind: DjotNode::OrderedList, style, marker: "a".to_string() },
            ((pivot - b'a' + 1) as u32).to_string(),
        );
    }
    if masks::UPPER_ALPHA.has(pivot) {
        return (
            ListProps { kind: DjotNode::OrderedList, style, marker: "A".to_string() },
            ((pivot - b'A' + 1) as u32).to_string(),
        );
    }
    unreachable!("list item token with no recognizable marker byte: {marker_text:?}")
}

/// A list is tight unless some item's interior spans more than one line, or
/// a blank line separates two consecutive items.
fn is_tight(list: &[Token]) -> bool {
    let mut i = 0usize;
    while i < list.len() {
        let close_index = (i as isize + list[i].jump_to_pair) as usize;
        let close_end = list[close_index].end;
        i = (i as isize + list[i].jump_to_pair + 1) as usize;
        if i < list.len() && list[i].kind != DjotToken::ListItem && close_end != list[i].start {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Default)]
pub struct TableProps {
    pub table_index: usize,
    pub ignore: bool,
    pub is_header: bool,
    pub alignments: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DjotLocalContext {
    pub text_node: bool,
    pub table_node: bool,
    pub table_props: TableProps,
}

fn aggregate_attributes(position: &mut usize, attributes: &mut Attributes, list: &[Token]) {
    while *position < list.len() && list[*position].kind == DjotToken::Attribute {
        attributes.merge_with(&list[*position].attributes);
        *position += 1;
    }
}

fn children_at_mut<'a>(root: &'a mut Vec<TreeNode>, path: &[usize]) -> &'a mut Vec<TreeNode> {
    let mut current = root;
    for &idx in path {
        current = &mut current[idx].children;
    }
    current
}

struct GroupElem {
    kind: DjotNode,
    heading_level: usize,
}

/// Pass 1: decide, for each token index, how many open groups close (a
/// heading ending a shallower section, a non-list-item ending a list) and
/// which indices open a brand new group (section/list/table), plus the
/// resolved alignment/header metadata for every pipe-table row.
fn scan_groups(
    document: &str,
    context: &DjotContext,
    list: &[Token],
) -> (HashMap<usize, usize>, HashMap<usize, TreeNode>, HashMap<usize, TableProps>) {
    let mut group_pop: HashMap<usize, usize> = HashMap::new();
    let mut group_insert: HashMap<usize, TreeNode> = HashMap::new();
    let mut assigned_table_props: HashMap<usize, TableProps> = HashMap::new();

    let mut group_elements: Vec<GroupElem> = Vec::new();
    let mut active_list: Option<ListProps> = None;
    let mut active_list_sparse_key: Option<usize> = None;
    let mut active_list_last_item_sparse = false;
    let mut active_table_props = TableProps::default();

    let mut i = 0usize;
    let mut previous: isize = -1;
    while i < list.len() {
        let open_token = list[i].clone();
        let jump = open_token.jump_to_pair;
        match open_token.kind {
            DjotToken::PipeTableCaption => {
                let caption_children = build_djot_ast(
                    document,
                    context,
                    &DjotLocalContext { text_node: true, ..Default::default() },
                    &list[i + 1..i + jump as usize],
                );
                let caption = TreeNode::leaf(DjotNode::TableCaption).with_children(caption_children);
                group_insert.insert(active_table_props.table_index, TreeNode::leaf(DjotNode::Table).with_children(vec![caption]));
            }
            DjotToken::PipeTable => {
                let end_idx = i + jump as usize;
                let mut alignments: Vec<String> = Vec::new();
                let mut columns = 0usize;
                let mut s = i + 1;
                while s < end_idx {
                    if list[s].kind == DjotToken::PipeTableSeparator {
                        columns += 1;
                        let close_s = s + list[s].jump_to_pair as usize;
                        let content = &document[list[s].start + 1..list[close_s].start];
                        let dash_count = content.bytes().filter(|&b| b == b'-').count();
                        if dash_count > 0 {
                            if content.starts_with(":-") && dash_count == content.len() - 1 {
                                alignments.push("left".to_string());
                            } else if content.ends_with("-:") && dash_count == content.len() - 1 {
                                alignments.push("right".to_string());
                            } else if content.starts_with(":-") && content.ends_with("-:") && dash_count == content.len() - 2 {
                                alignments.push("center".to_string());
                            } else if dash_count == content.len() {
                                alignments.push(String::new());
                            }
                        }
                    }
                    s += 1;
                }
                if columns != active_table_props.alignments.len() {
                    group_insert.insert(i, TreeNode::leaf(DjotNode::Table));
                    active_table_props = TableProps { table_index: i, ignore: false, is_header: false, alignments: vec![String::new(); columns] };
                }
                if alignments.len() == columns {
                    active_table_props.alignments = alignments;
                    let mut header_props = active_table_props.clone();
                    header_props.is_header = true;
                    if previous >= 0 {
                        assigned_table_props.insert(previous as usize, header_props);
                    }
                    assigned_table_props.insert(i, TableProps { ignore: true, ..Default::default() });
                } else {
                    assigned_table_props.insert(i, active_table_props.clone());
                }
            }
            DjotToken::Heading => {
                let level = document[open_token.start..open_token.end].trim_end_matches(' ').to_string();
                let mut pop = 0usize;
                loop {
                    let Some(last) = group_elements.last() else { break };
                    if last.kind == DjotNode::Section && last.heading_level < level.len() {
                        break;
                    }
                    group_elements.pop();
                    pop += 1;
                }
                group_pop.insert(i, pop);
                let id = create_section_id(&select_text(document, &list[i + 1..i + jump as usize]));
                let section = TreeNode::leaf(DjotNode::Section).with_attributes({
                    let mut a = Attributes::new();
                    a.set("id", id);
                    a
                });
                group_insert.insert(i, section);
                group_elements.push(GroupElem { kind: DjotNode::Section, heading_level: level.len() });
            }
            DjotToken::ListItem => {
                let (current_list, current_start) = detect_list_props(document, &open_token);
                if !group_elements.is_empty() && active_list_sparse_key.is_some() && active_list.as_ref() != Some(&current_list) {
                    *group_pop.entry(i).or_insert(0) += 1;
                    group_elements.pop();
                    active_list_sparse_key = None;
                }
                if group_elements.last().map(|g| !g.kind.is_list()).unwrap_or(true) {
                    let mut attributes = Attributes::new();
                    if current_start != "1" && !current_start.is_empty() {
                        attributes.set("start", current_start.clone());
                    }
                    if current_list.marker != "1" && !current_list.marker.is_empty() {
                        attributes.set("type", current_list.marker.clone());
                    }
                    if current_list.kind == DjotNode::TaskList {
                        attributes.append("class", "task-list");
                    }
                    active_list = Some(current_list.clone());
                    let node = TreeNode::leaf(current_list.kind).with_attributes(attributes);
                    group_insert.insert(i, node);
                    group_elements.push(GroupElem { kind: current_list.kind, heading_level: 0 });
                    active_list_sparse_key = Some(i);
                }
                let interior = &list[i + 1..i + jump as usize];
                if !is_tight(interior) || active_list_last_item_sparse {
                    if let Some(key) = active_list_sparse_key {
                        group_insert.get_mut(&key).unwrap().attributes.set(SPARSE_LIST_KEY, "true");
                    }
                }
                active_list_last_item_sparse = list[i + jump as usize - 1].end < list[i + jump as usize].start;
            }
            _ => {
                if group_elements.last().map(|g| g.kind.is_list()).unwrap_or(false) {
                    *group_pop.entry(i).or_insert(0) += 1;
                    group_elements.pop();
                }
            }
        }
        if open_token.kind != DjotToken::ListItem {
            active_list = None;
            active_list_sparse_key = None;
            active_list_last_item_sparse = false;
        }
        if open_token.kind != DjotToken::PipeTable {
            active_table_props = TableProps::default();
        }
        previous = i as isize;
        i = (i as isize + jump + 1) as usize;
    }

    (group_pop, group_insert, assigned_table_props)
}

/// Pass 2 plus pass 1: rewrite a flat, paired token list into nested
/// `TreeNode`s. Recurses per structural container; `local_context` tracks
/// whether we're inside inline text (so bare whitespace tokens become text
/// rather than being discarded) and, inside a pipe table, which row/column
/// is being built.
pub fn build_djot_ast(document: &str, context: &DjotContext, local_context: &DjotLocalContext, list: &[Token]) -> Vec<TreeNode> {
    if list.is_empty() {
        return Vec::new();
    }

    let (group_pop, group_insert, assigned_table_props) = scan_groups(document, context, list);

    let mut nodes: Vec<TreeNode> = Vec::new();
    let mut footnotes: Vec<TreeNode> = Vec::new();
    let mut group_path_stack: Vec<Vec<usize>> = vec![Vec::new()];
    let mut is_sparse_list = false;
    let mut inserted_node_type: Option<DjotNode> = None;
    let mut table_cell_id = 0usize;

    let mut i = 0usize;
    while i < list.len() {
        let mut attributes = Attributes::new();
        if !local_context.text_node {
            aggregate_attributes(&mut i, &mut attributes, list);
        }
        if i == list.len() {
            break;
        }
        let open_token = list[i].clone();
        let text = document[open_token.start..open_token.end].to_string();
        let close_index = (i as isize + open_token.jump_to_pair) as usize;
        let close_token = list[close_index].clone();
        let mut next_i = i + open_token.jump_to_pair as usize + 1;
        attributes.merge_with(&open_token.attributes);
        if local_context.text_node {
            aggregate_attributes(&mut next_i, &mut attributes, list);
        }

        if let Some(&pop) = group_pop.get(&i) {
            if pop > 0 {
                let new_len = group_path_stack.len().saturating_sub(pop);
                group_path_stack.truncate(new_len.max(1));
            }
        }
        if let Some(insert) = group_insert.get(&i) {
            is_sparse_list = insert.attributes.get(SPARSE_LIST_KEY).is_some();
            inserted_node_type = Some(insert.kind);
            let current_path = group_path_stack.last().unwrap().clone();
            let target = children_at_mut(&mut nodes, &current_path);
            target.push(insert.clone());
            let new_index = target.len() - 1;
            let mut new_path = current_path;
            new_path.push(new_index);
            group_path_stack.push(new_path);
        }
        let current_path = group_path_stack.last().unwrap().clone();

        match open_token.kind {
            DjotToken::Document
            | DjotToken::Quote
            | DjotToken::Paragraph
            | DjotToken::Emphasis
            | DjotToken::Strong
            | DjotToken::Highlighted
            | DjotToken::Subscript
            | DjotToken::Superscript
            | DjotToken::Insert
            | DjotToken::Delete => {
                let child_text_node = local_context.text_node || open_token.kind == DjotToken::Paragraph;
                let children = build_djot_ast(
                    document,
                    context,
                    &DjotLocalContext { text_node: child_text_node, ..Default::default() },
                    trim_padding(document, &list[i + 1..close_index]),
                );
                children_at_mut(&mut nodes, &current_path)
                    .push(TreeNode::leaf(convert_token_to_node(open_token.kind).unwrap()).with_children(children).with_attributes(attributes));
            }
            DjotToken::Div => {
                let class = open_token.attributes.get(DIV_CLASS_KEY).unwrap_or("").to_string();
                if !class.is_empty() {
                    attributes.append("class", class);
                }
                let children = build_djot_ast(
                    document,
                    context,
                    &DjotLocalContext::default(),
                    trim_padding(document, &list[i + 1..close_index]),
                );
                children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Div).with_children(children).with_attributes(attributes));
            }
            DjotToken::Code => {
                let lang = open_token.attributes.get(CODE_LANG_KEY).unwrap_or("").to_string();
                let internal = build_djot_ast(
                    document,
                    context,
                    &DjotLocalContext { text_node: true, ..Default::default() },
                    trim_padding(document, &list[i + 1..close_index]),
                );
                if let Some(suffix) = lang.strip_prefix('=') {
                    attributes.set(RAW_BLOCK_FORMAT_KEY, suffix);
                    children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Raw).with_children(internal).with_attributes(attributes));
                } else {
                    if !lang.is_empty() {
                        attributes.append("class", format!("language-{lang}"));
                    }
                    children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Code).with_children(internal).with_attributes(attributes));
                }
            }
            DjotToken::ThematicBreak => {
                children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::ThematicBreak).with_attributes(attributes));
            }
            DjotToken::Heading => {
                attributes.set(crate::token::HEADING_LEVEL_KEY, text.trim_end_matches(' ').to_string());
                let children = build_djot_ast(
                    document,
                    context,
                    &DjotLocalContext { text_node: true, ..Default::default() },
                    trim_padding(document, &list[i + 1..close_index]),
                );
                children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Heading).with_children(children).with_attributes(attributes));
            }
            DjotToken::Symbols => {
                let inner = document[open_token.end..close_token.start].to_string();
                children_at_mut(&mut nodes, &current_path)
                    .push(TreeNode::leaf(DjotNode::Symbols).with_children(vec![TreeNode::text(inner)]).with_attributes(attributes));
            }
            DjotToken::Autolink => {
                let link = document[open_token.end..close_token.start].replace('\n', "");
                let href = if link.contains('@') { format!("mailto:{link}") } else { link.clone() };
                attributes.set("href", href);
                children_at_mut(&mut nodes, &current_path)
                    .push(TreeNode::leaf(DjotNode::Link).with_children(vec![TreeNode::text(link)]).with_attributes(attributes));
            }
            DjotToken::Verbatim => {
                let mut body = document[open_token.end..list[i + open_token.jump_to_pair as usize].start].to_string();
                let trimmed = body.trim_matches(' ');
                if trimmed.starts_with('`') && trimmed.ends_with('`') && body.len() >= 2 {
                    body = body[1..body.len() - 1].to_string();
                }
                if next_i < list.len() && list[next_i].kind == DjotToken::RawFormat {
                    let raw_open = list[next_i].clone();
                    let raw_close = list[next_i + raw_open.jump_to_pair as usize].clone();
                    attributes.set(RAW_INLINE_FORMAT_KEY, document[raw_open.end..raw_close.start].to_string());
                    next_i += raw_open.jump_to_pair as usize + 1;
                }
                children_at_mut(&mut nodes, &current_path)
                    .push(TreeNode::leaf(DjotNode::Verbatim).with_children(vec![TreeNode::text(body)]).with_attributes(attributes));
            }
            DjotToken::FootnoteReference => {
                let reference = &document[open_token.end..close_token.start];
                let footnote_id = *context.footnote_ids.get(reference).unwrap_or(&0);
                attributes.set("id", format!("fnref{footnote_id}"));
                attributes.set("href", format!("#fn{footnote_id}"));
                attributes.set("role", "doc-noteref");
                children_at_mut(&mut nodes, &current_path).push(
                    TreeNode::leaf(DjotNode::Link)
                        .with_children(vec![TreeNode::leaf(DjotNode::Superscript).with_children(vec![TreeNode::text(footnote_id.to_string())])])
                        .with_attributes(attributes),
                );
            }
            DjotToken::ImageSpan => {
                let mut next_token = if next_i < list.len() { Some(list[next_i].clone()) } else { None };
                let mut attributes_after = 0usize;
                if let Some(nt) = &next_token {
                    loop {
                        let position = next_i + nt.jump_to_pair as usize + 1 + attributes_after;
                        if position >= list.len() || list[position].kind != DjotToken::Attribute {
                            break;
                        }
                        attributes.merge_with(&list[position].attributes);
                        attributes_after += 1;
                    }
                }
                let alt = select_text(document, &list[i + 1..close_index]);
                match next_token.take() {
                    Some(nt) if nt.kind == DjotToken::LinkUrl => {
                        attributes.set("alt", alt);
                        let url_close = next_i + nt.jump_to_pair as usize;
                        attributes.set("src", document[nt.end..list[url_close].start].replace('\n', ""));
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Image).with_attributes(attributes));
                        next_i += nt.jump_to_pair as usize + 1;
                    }
                    Some(nt) if nt.kind == DjotToken::LinkReference => {
                        let ref_close = next_i + nt.jump_to_pair as usize;
                        let mut reference = document[nt.end..list[ref_close].start].replace('\n', "");
                        if reference.is_empty() {
                            reference = select_text(document, &list[i + 1..close_index]);
                        }
                        attributes.set("alt", alt);
                        if let Some(href) = context.references.get(&reference) {
                            let href = href.replace('\n', "");
                            if !href.is_empty() {
                                attributes.set("src", href);
                                if let Some(ref_attrs) = context.reference_attributes.get(&reference) {
                                    attributes.merge_with(ref_attrs);
                                }
                            }
                        }
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Image).with_attributes(attributes));
                        next_i += nt.jump_to_pair as usize + 1;
                    }
                    _ => {
                        let target = children_at_mut(&mut nodes, &current_path);
                        target.push(TreeNode::text(text.clone()));
                        target.extend(build_djot_ast(document, context, local_context, &list[i + 1..close_index]));
                        target.push(TreeNode::text(document[close_token.start..close_token.end].to_string()));
                    }
                }
                next_i += attributes_after;
            }
            DjotToken::Span => {
                let next_token = if next_i < list.len() { Some(list[next_i].clone()) } else { None };
                match next_token {
                    Some(nt) if nt.kind == DjotToken::LinkUrl => {
                        let url_close = next_i + nt.jump_to_pair as usize;
                        attributes.set("href", document[nt.end..list[url_close].start].replace('\n', ""));
                        next_i += nt.jump_to_pair as usize + 1;
                        aggregate_attributes(&mut next_i, &mut attributes, list);
                        let children = build_djot_ast(document, context, local_context, &list[i + 1..close_index]);
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Link).with_children(children).with_attributes(attributes));
                    }
                    Some(nt) if nt.kind == DjotToken::LinkReference => {
                        let ref_close = next_i + nt.jump_to_pair as usize;
                        let mut reference = document[nt.end..list[ref_close].start].replace('\n', "");
                        if reference.is_empty() {
                            reference = select_text(document, &list[i + 1..close_index]);
                        }
                        if let Some(href) = context.references.get(&reference) {
                            let href = href.replace('\n', "");
                            if !href.is_empty() {
                                attributes.set("href", href);
                                if let Some(ref_attrs) = context.reference_attributes.get(&reference) {
                                    attributes.merge_with(ref_attrs);
                                }
                            }
                        }
                        next_i += nt.jump_to_pair as usize + 1;
                        aggregate_attributes(&mut next_i, &mut attributes, list);
                        let children = build_djot_ast(document, context, local_context, &list[i + 1..close_index]);
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Link).with_children(children).with_attributes(attributes));
                    }
                    _ if !attributes.is_empty() => {
                        let children = build_djot_ast(document, context, local_context, &list[i + 1..close_index]);
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::Span).with_children(children).with_attributes(attributes));
                    }
                    _ => {
                        let target = children_at_mut(&mut nodes, &current_path);
                        target.push(TreeNode::text(text.clone()));
                        target.extend(build_djot_ast(document, context, local_context, &list[i + 1..close_index]));
                        target.push(TreeNode::text(document[close_token.start..close_token.end].to_string()));
                    }
                }
            }
            DjotToken::EscapedSymbol => {
                if local_context.text_node {
                    if text.ends_with('\n') {
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::LineBreak));
                    } else {
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::text(text[1..].to_string()));
                    }
                }
            }
            DjotToken::SmartSymbol => {
                if local_context.text_node {
                    let inner = text.trim_matches(['{', '}']).to_string();
                    let mut rendered = text.clone();
                    let direction = detect_quote_direction(document, open_token.start);
                    if inner == "\"" && direction == QuoteDirection::Open {
                        rendered = "\u{201c}".to_string();
                    } else if inner == "\"" && direction == QuoteDirection::Close {
                        rendered = "\u{201d}".to_string();
                    } else if inner == "'" && direction == QuoteDirection::Open {
                        rendered = "\u{2018}".to_string();
                    } else if inner == "'" && direction == QuoteDirection::Close {
                        rendered = "\u{2019}".to_string();
                    } else if inner == "..." {
                        rendered = "\u{2026}".to_string();
                    } else if !inner.is_empty() && inner.bytes().all(|b| b == b'-') {
                        let len = inner.len();
                        rendered = if len % 3 == 0 {
                            "\u{2014}".repeat(len / 3)
                        } else if len % 2 == 0 {
                            "\u{2013}".repeat(len / 2)
                        } else {
                            format!("{}{}", "\u{2013}".repeat((len - 3) / 2), "\u{2014}")
                        };
                    }
                    children_at_mut(&mut nodes, &current_path).push(TreeNode::text(rendered));
                }
            }
            DjotToken::ListItem => {
                if inserted_node_type == Some(DjotNode::DefinitionList) {
                    attributes.set(crate::token::DEFINITION_LIST_ITEM_KEY, "true");
                    let first_interior = i + 1;
                    let term_children = if list[first_interior].kind == DjotToken::Paragraph {
                        let para_close = first_interior + list[first_interior].jump_to_pair as usize;
                        build_djot_ast(
                            document,
                            context,
                            &DjotLocalContext { text_node: true, ..Default::default() },
                            trim_padding(document, &list[first_interior + 1..para_close]),
                        )
                    } else {
                        Vec::new()
                    };
                    let item_start = first_interior + list[first_interior].jump_to_pair as usize + 1;
                    let item_children = build_djot_ast(document, context, &DjotLocalContext::default(), &list[item_start..close_index]);
                    let target = children_at_mut(&mut nodes, &current_path);
                    target.push(TreeNode::leaf(DjotNode::DefinitionTerm).with_children(term_children).with_attributes(attributes));
                    target.push(TreeNode::leaf(DjotNode::DefinitionItem).with_children(item_children));
                } else {
                    if inserted_node_type == Some(DjotNode::TaskList) {
                        if text.starts_with("- [ ]") {
                            attributes.append("class", "unchecked");
                        } else {
                            attributes.append("class", "checked");
                        }
                    }
                    let first_interior = i + 1;
                    if !is_sparse_list && first_interior < close_index && list[first_interior].kind == DjotToken::Paragraph {
                        let para_close = first_interior + list[first_interior].jump_to_pair as usize;
                        let mut children = build_djot_ast(
                            document,
                            context,
                            &DjotLocalContext { text_node: true, ..Default::default() },
                            &list[first_interior + 1..para_close],
                        );
                        if list[para_close].end == document.len() {
                            children.push(TreeNode::text("\n"));
                        }
                        children.extend(build_djot_ast(
                            document,
                            context,
                            &DjotLocalContext::default(),
                            &list[para_close + 1..close_index],
                        ));
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::ListItem).with_children(children).with_attributes(attributes));
                    } else {
                        let children = build_djot_ast(document, context, local_context, &list[i + 1..close_index]);
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::ListItem).with_children(children).with_attributes(attributes));
                    }
                }
            }
            DjotToken::FootnoteDef => {
                let footnote_id = *context.footnote_ids.get(attributes.get(crate::token::REFERENCE_KEY).unwrap_or("")).unwrap_or(&0);
                let mut children = build_djot_ast(document, context, &DjotLocalContext::default(), &list[i + 1..close_index]);
                attributes.set("href", format!("#fnref{footnote_id}"));
                attributes.set("role", "doc-backlink");
                let backref = TreeNode::leaf(DjotNode::Link).with_children(vec![TreeNode::text("\u{21a9}\u{fe0e}")]).with_attributes(attributes.clone());
                if matches!(children.last(), Some(n) if n.kind == DjotNode::Paragraph) {
                    children.last_mut().unwrap().children.push(backref);
                } else {
                    children.push(TreeNode::leaf(DjotNode::Paragraph).with_children(vec![backref]));
                }
                let mut item_attrs = Attributes::new();
                item_attrs.set("id", format!("fn{footnote_id}"));
                footnotes.push(
                    TreeNode::leaf(DjotNode::ListItem)
                        .with_children(vec![TreeNode::leaf(DjotNode::FootnoteDef).with_children(children).with_attributes(attributes)])
                        .with_attributes(item_attrs),
                );
            }
            DjotToken::PipeTable => {
                if !assigned_table_props.get(&i).map(|p| p.ignore).unwrap_or(false) {
                    let table_props = assigned_table_props.get(&i).cloned().unwrap_or_default();
                    let children = build_djot_ast(
                        document,
                        context,
                        &DjotLocalContext { text_node: true, table_node: true, table_props },
                        trim_padding(document, &list[i + 1..close_index]),
                    );
                    children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(DjotNode::TableRow).with_children(children));
                }
            }
            DjotToken::PipeTableSeparator => {
                if local_context.table_node {
                    let node_kind = if local_context.table_props.is_header { DjotNode::TableHeader } else { DjotNode::TableCell };
                    let alignment = local_context.table_props.alignments.get(table_cell_id).cloned().unwrap_or_default();
                    table_cell_id += 1;
                    if !alignment.is_empty() {
                        attributes.set("style", format!("text-align: {alignment};"));
                    }
                    let children = build_djot_ast(
                        document,
                        context,
                        &DjotLocalContext { text_node: true, ..Default::default() },
                        trim_padding(document, &list[i + 1..close_index]),
                    );
                    children_at_mut(&mut nodes, &current_path).push(TreeNode::leaf(node_kind).with_children(children).with_attributes(attributes));
                } else {
                    let target = children_at_mut(&mut nodes, &current_path);
                    target.push(TreeNode::text(text.clone()));
                    target.extend(build_djot_ast(
                        document,
                        context,
                        local_context,
                        trim_padding(document, &list[i + 1..close_index]),
                    ));
                }
            }
            DjotToken::None => {
                if local_context.text_node {
                    if !attributes.is_empty() {
                        let split = text.rfind(' ').map(|p| p + 1).unwrap_or(0);
                        let target = children_at_mut(&mut nodes, &current_path);
                        target.push(TreeNode::text(text[..split].to_string()));
                        target.push(TreeNode::leaf(DjotNode::Span).with_children(vec![TreeNode::text(text[split..].to_string())]).with_attributes(attributes));
                    } else {
                        children_at_mut(&mut nodes, &current_path).push(TreeNode::text(text.clone()));
                    }
                }
            }
            // Resolved in BuildDjotContext, consumed alongside their owner token, or structurally inert.
            DjotToken::Attribute
            | DjotToken::RawFormat
            | DjotToken::LinkUrl
            | DjotToken::LinkReference
            | DjotToken::ReferenceDef
            | DjotToken::PipeTableCaption
            | DjotToken::Padding
            | DjotToken::Ignore => {}
        }
        i = next_i;
    }

    if !footnotes.is_empty() {
        let mut attrs = Attributes::new();
        attrs.set("role", "doc-endnotes");
        nodes.push(
            TreeNode::leaf(DjotNode::Section)
                .with_children(vec![TreeNode::leaf(DjotNode::ThematicBreak), TreeNode::leaf(DjotNode::OrderedList).with_children(footnotes)])
                .with_attributes(attrs),
        );
    }

    nodes
}

/// Parse a whole document into its forest of top-level nodes. An empty (or
/// all-whitespace) document yields an empty forest: the synthetic root
/// `Document` node the builder always produces internally is unwrapped here
/// rather than exposed, since its only role is bookkeeping during the
/// recursive build.
pub fn parse(document: &str) -> Vec<TreeNode> {
    let tokens = crate::tokenizer::build_djot_tokens(document);
    let context = super::context::build_djot_context(document, &tokens);
    let mut ast = build_djot_ast(document, &context, &DjotLocalContext::default(), &tokens);
    update_indexes(&mut ast);
    ast.into_iter().next().map(|root| root.children).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::build_djot_tokens;

    fn first_list_item(document: &str) -> (crate::token::TokenList, usize) {
        let tokens = build_djot_tokens(document);
        let index = tokens.iter().position(|t| t.kind == DjotToken::ListItem && !t.is_close).expect("no list item token found");
        (tokens, index)
    }

    #[test]
    fn detects_unordered_marker() {
        let document = "- one\n- two\n";
        let (tokens, index) = first_list_item(document);
        let (props, _) = detect_list_props(document, &tokens[index]);
        assert_eq!(props.kind, DjotNode::UnorderedList);
    }

    #[test]
    fn detects_ordered_digit_marker_and_start_value() {
        let document = "3. one\n4. two\n";
        let (tokens, index) = first_list_item(document);
        let (props, start) = detect_list_props(document, &tokens[index]);
        assert_eq!(props.kind, DjotNode::OrderedList);
        assert_eq!(props.marker, "1");
        assert_eq!(start, "3");
    }

    #[test]
    fn detects_ordered_lower_alpha_marker_and_start_value() {
        let document = "c. one\nd. two\n";
        let (tokens, index) = first_list_item(document);
        let (props, start) = detect_list_props(document, &tokens[index]);
        assert_eq!(props.kind, DjotNode::OrderedList);
        assert_eq!(props.marker, "a");
        assert_eq!(start, "3");
    }

    #[test]
    fn detects_parenthesized_alpha_marker() {
        let document = "(a) one\n(b) two\n";
        let (tokens, index) = first_list_item(document);
        let (props, start) = detect_list_props(document, &tokens[index]);
        assert_eq!(props.kind, DjotNode::OrderedList);
        assert_eq!(props.marker, "a");
        assert_eq!(start, "1");
    }

    #[test]
    fn detects_task_list_marker() {
        let document = "- [x] done\n- [ ] pending\n";
        let (tokens, index) = first_list_item(document);
        let (props, _) = detect_list_props(document, &tokens[index]);
        assert_eq!(props.kind, DjotNode::TaskList);
    }

    #[test]
    fn detects_definition_list_marker() {
        let document = ": term\n  definition\n";
        let (tokens, index) = first_list_item(document);
        let (props, _) = detect_list_props(document, &tokens[index]);
        assert_eq!(props.kind, DjotNode::DefinitionList);
    }

    #[test]
    fn tight_list_items_omit_the_paragraph_wrapper() {
        let forest = parse("- one\n- two\n");
        let item = &forest[0].children[0];
        assert!(item.children.iter().any(|c| c.kind == DjotNode::Text));
        assert!(!item.children.iter().any(|c| c.kind == DjotNode::Paragraph));
    }

    #[test]
    fn blank_line_between_items_keeps_the_paragraph_wrapper() {
        let forest = parse("- one\n\n- two\n");
        let item = &forest[0].children[0];
        assert!(item.children.iter().any(|c| c.kind == DjotNode::Paragraph));
    }
}
