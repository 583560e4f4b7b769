//! Path resolution against live target state.
//!
//! Resolution binds the primary (the longest dotted prefix the host can
//! evaluate as a variable, or `$last`) and then walks the remaining
//! segments through the decoded children of each intermediate value:
//! names select fields of objects, indices select children by position.
//!
//! Callers run resolution inside a lookup scope (see
//! [`crate::session::LookupScope`]) so display limits and cycle elision
//! never hide the child being asked for.

use tracing::debug;

use super::path::{parse_path, Segment};
use crate::error::{InspectError, InspectResult};
use crate::types::Value;
use crate::visual::{Child, ChildValue, DecodeContext};

/// Resolve `path` to a raw value.
///
/// ## Errors
///
/// - `Unresolved` when any step fails to bind or an index is malformed
/// - `Interrupted` when the user cancels
pub fn resolve(ctx: &mut DecodeContext<'_>, last: Option<&Value>, path: &str) -> InspectResult<Value>
{
    let unresolved = || InspectError::Unresolved(path.to_string());
    let segments = parse_path(path).ok_or_else(unresolved)?;
    resolve_segments(ctx, last, &segments)?.ok_or_else(unresolved)
}

/// Resolve already parsed segments. `Ok(None)` means "no binding".
///
/// ## Errors
///
/// Only `Interrupted`.
pub fn resolve_segments(
    ctx: &mut DecodeContext<'_>,
    last: Option<&Value>,
    segments: &[Segment],
) -> InspectResult<Option<Value>>
{
    let Some((primary, consumed)) = resolve_primary(ctx, last, segments)? else {
        return Ok(None);
    };
    let Some(mut current) = apply_indices(ctx, primary, &segments[consumed - 1])? else {
        return Ok(None);
    };

    for segment in &segments[consumed..] {
        let Some(field) = child_by_name(ctx, &current, &segment.name)? else {
            debug!(field = %segment.name, "no such field");
            return Ok(None);
        };
        let Some(next) = apply_indices(ctx, field, segment)? else {
            return Ok(None);
        };
        current = next;
    }
    Ok(Some(current))
}

// Bind the primary value. Returns it with the number of segments it used.
fn resolve_primary(
    ctx: &mut DecodeContext<'_>,
    last: Option<&Value>,
    segments: &[Segment],
) -> InspectResult<Option<(Value, usize)>>
{
    let Some(first) = segments.first() else {
        return Ok(None);
    };
    if first.is_last_result() {
        return Ok(last.cloned().map(|value| (value, 1)));
    }

    let mut best = None;
    let mut name = String::new();
    for (position, segment) in segments.iter().enumerate() {
        ctx.interrupt.check()?;
        if position > 0 {
            name.push('.');
        }
        name.push_str(&segment.name);

        match ctx.target.lookup_variable(&name) {
            Ok(value) => {
                debug!(primary = %name, "bound primary");
                best = Some((value, position + 1));
            }
            Err(err) => debug!(candidate = %name, error = %err, "not a variable"),
        }
        // An indexed segment ends the dotted name.
        if !segment.indices.is_empty() {
            break;
        }
    }
    Ok(best)
}

fn apply_indices(ctx: &mut DecodeContext<'_>, value: Value, segment: &Segment) -> InspectResult<Option<Value>>
{
    let mut current = value;
    for &index in &segment.indices {
        let Ok(index) = usize::try_from(index) else {
            return Ok(None);
        };
        match child_at(ctx, &current, index)? {
            Some(child) => current = child,
            None => {
                debug!(index, segment = %segment, "index out of range");
                return Ok(None);
            }
        }
    }
    Ok(Some(current))
}

/// Field `name` of `value`. Only objects have named children.
///
/// ## Errors
///
/// Only `Interrupted`.
pub fn child_by_name(ctx: &mut DecodeContext<'_>, value: &Value, name: &str) -> InspectResult<Option<Value>>
{
    let Some(node) = ctx.decode(value)? else {
        return Ok(None);
    };
    if !node.has_named_children() {
        return Ok(None);
    }
    let mut cursor = node.children(ctx.config);
    while let Some(child) = cursor.next(ctx)? {
        if child.name == name {
            return Ok(match child.value {
                ChildValue::Value(value) => Some(value),
                ChildValue::Elided | ChildValue::Fault(_) => None,
            });
        }
    }
    Ok(None)
}

/// Child at `index` of `value`: array element, or declared field by
/// position for objects.
///
/// ## Errors
///
/// Only `Interrupted`.
pub fn child_at(ctx: &mut DecodeContext<'_>, value: &Value, index: usize) -> InspectResult<Option<Value>>
{
    let Some(node) = ctx.decode(value)? else {
        return Ok(None);
    };
    let mut cursor = node.children(ctx.config);
    cursor.seek(index);
    Ok(match cursor.next(ctx)? {
        Some(Child {
            value: ChildValue::Value(value),
            ..
        }) => Some(value),
        _ => None,
    })
}

/// Names of the fields of `value`, in declaration order. Empty for
/// anything but objects.
///
/// ## Errors
///
/// Only `Interrupted`.
pub fn field_names(ctx: &mut DecodeContext<'_>, value: &Value) -> InspectResult<Vec<String>>
{
    let Some(node) = ctx.decode(value)? else {
        return Ok(Vec::new());
    };
    if !node.has_named_children() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    let mut cursor = node.children(ctx.config);
    while let Some(child) = cursor.next(ctx)? {
        names.push(child.name);
    }
    Ok(names)
}
