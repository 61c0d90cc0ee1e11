//! Token list to document tree: reference/footnote resolution, heading
//! sectioning, list/table grouping, and smart-typography substitution.

mod builder;
mod context;
mod node;

pub use builder::{build_djot_ast, parse, DjotLocalContext, ListProps, TableProps};
pub use context::{build_djot_context, create_section_id, detect_quote_direction, DjotContext, QuoteDirection};
pub use node::{convert_token_to_node, update_indexes, DjotNode, TreeNode};
