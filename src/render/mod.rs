//! Registry-driven tree walk: every [`crate::ast::DjotNode`] kind maps onto
//! one rendering rule, dispatched by a plain `match` rather than a captured
//! closure table (the two are equivalent; see the design notes).

mod html;

pub use html::render_html;

/// Render a parsed forest to a target format. `"html"` is the only format
/// the registry below implements; everything else is a collaborator's call.
pub fn render(nodes: &[crate::ast::TreeNode], format: &str) -> String {
    render_html(nodes, format)
}
