//! Text rendering of decoded values.

use super::{ChildValue, DecodeContext, VisualNode};
use crate::error::InspectResult;
use crate::types::Value;

/// Nesting depth past which children render as `...`.
///
/// The cycle guard already stops self-referential graphs; this bounds deep
/// acyclic chains such as long linked lists.
pub const MAX_RENDER_DEPTH: usize = 64;

/// Render `value` with the current configuration.
///
/// ## Errors
///
/// Only `Interrupted`.
pub fn render_value(ctx: &mut DecodeContext<'_>, value: &Value) -> InspectResult<String>
{
    render_at(ctx, value, 0)
}

/// Render an already decoded node.
///
/// ## Errors
///
/// Only `Interrupted`.
pub fn render_node(ctx: &mut DecodeContext<'_>, node: &VisualNode) -> InspectResult<String>
{
    render_node_at(ctx, node, 0)
}

/// Display used when no decoder heuristic applies.
pub fn default_display(value: &Value) -> String
{
    match value {
        Value::Scalar(scalar) => scalar.to_string(),
        Value::Reference(handle) => format!("({} *) {}", handle.type_name, handle.address),
        Value::Array(array) => format!("({}[{}]) {}", array.element, array.length, array.address),
        Value::CString(address) => format!("(CPointer(char)) {address}"),
        Value::Opaque { type_name, bits } => format!("({type_name}) 0x{bits:x}"),
    }
}

fn render_at(ctx: &mut DecodeContext<'_>, value: &Value, depth: usize) -> InspectResult<String>
{
    match ctx.decode(value)? {
        Some(node) => render_node_at(ctx, &node, depth),
        None => Ok(default_display(value)),
    }
}

fn render_node_at(ctx: &mut DecodeContext<'_>, node: &VisualNode, depth: usize) -> InspectResult<String>
{
    let label = node.label(ctx.config);
    let named = node.has_named_children();
    let mut cursor = node.children(ctx.config);

    let mut parts = Vec::new();
    while let Some(child) = cursor.next(ctx)? {
        let text = match child.value {
            ChildValue::Elided => "...".to_string(),
            ChildValue::Fault(address) => format!("<error: Cannot access memory at {address}>"),
            ChildValue::Value(_) if depth + 1 >= MAX_RENDER_DEPTH => "...".to_string(),
            ChildValue::Value(value) => render_at(ctx, &value, depth + 1)?,
        };
        parts.push(if named { format!("{} = {text}", child.name) } else { text });
    }

    if parts.is_empty() {
        Ok(label)
    } else {
        Ok(format!("{label} = {{{}}}", parts.join(", ")))
    }
}
