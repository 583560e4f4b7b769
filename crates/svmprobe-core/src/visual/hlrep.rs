//! High-level representations.
//!
//! A representation replaces the generic field listing of a well-known
//! runtime type with something closer to how a programmer thinks of it. The
//! registry is keyed by canonical runtime type name and is only consulted
//! while `svm-use-hlrep` is enabled.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::{payload, ArrayNode, ClassNode, DecodeContext, VisualNode};
use crate::error::{InspectError, InspectResult};
use crate::types::{InlineArray, Scalar, Value, ValueType};

/// Replacement display for one runtime type.
pub trait HighLevelRepresentation: Send + Sync
{
    /// Canonical runtime type name this representation handles.
    fn type_name(&self) -> &str;

    /// Build the replacement node for `object`.
    ///
    /// ## Errors
    ///
    /// Any error makes the decoder keep the generic object node, except
    /// `Interrupted`, which aborts the operation.
    fn represent(&self, ctx: &mut DecodeContext<'_>, object: &ClassNode) -> InspectResult<VisualNode>;
}

/// Representations by runtime type name.
#[derive(Default)]
pub struct RepresentationRegistry
{
    representations: HashMap<String, Box<dyn HighLevelRepresentation>>,
}

impl RepresentationRegistry
{
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Registry holding the built-in representations.
    #[must_use]
    pub fn with_builtins() -> Self
    {
        let mut registry = Self::new();
        registry
            .representations
            .insert(ArrayListRepresentation::TYPE_NAME.to_string(), Box::new(ArrayListRepresentation));
        registry
    }

    /// Add a representation.
    ///
    /// ## Errors
    ///
    /// `DuplicateRepresentation` when the type name is already taken.
    pub fn register(&mut self, representation: Box<dyn HighLevelRepresentation>) -> InspectResult<()>
    {
        let name = representation.type_name().to_string();
        if self.representations.contains_key(&name) {
            return Err(InspectError::DuplicateRepresentation(name));
        }
        debug!(type_name = %name, "registered high-level representation");
        self.representations.insert(name, representation);
        Ok(())
    }

    /// Representation for `type_name`.
    pub fn get(&self, type_name: &str) -> Option<&dyn HighLevelRepresentation>
    {
        self.representations.get(type_name).map(AsRef::as_ref)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str>
    {
        let mut names: Vec<&str> = self.representations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for RepresentationRegistry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("RepresentationRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// `java.util.ArrayList` as a flat sequence of its live elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayListRepresentation;

impl ArrayListRepresentation
{
    /// Handled runtime type.
    pub const TYPE_NAME: &'static str = "java.util.ArrayList";
}

impl HighLevelRepresentation for ArrayListRepresentation
{
    fn type_name(&self) -> &str
    {
        Self::TYPE_NAME
    }

    fn represent(&self, ctx: &mut DecodeContext<'_>, object: &ClassNode) -> InspectResult<VisualNode>
    {
        let size = ctx
            .target
            .read_field(&object.handle, "size")?
            .as_scalar()
            .and_then(Scalar::as_i64)
            .and_then(|size| u64::try_from(size).ok())
            .ok_or_else(|| InspectError::mismatch("ArrayList.size is not a count"))?;

        let elements = match ctx.target.read_field(&object.handle, "elementData")? {
            Value::Reference(data) if !data.is_null() => {
                let backing = payload::array_elements(ctx.target, &data)?;
                InlineArray {
                    length: size.min(backing.length),
                    ..backing
                }
            }
            Value::Reference(_) => InlineArray {
                address: object.handle.address,
                element: ValueType::reference("java.lang.Object"),
                length: 0,
            },
            other => return Err(InspectError::mismatch(format!("ArrayList.elementData is {other:?}"))),
        };

        Ok(VisualNode::ArrayValue(ArrayNode {
            label: format!("{}({size})", Self::TYPE_NAME),
            owner: object.handle.address,
            elements,
            self_ref: object.self_ref,
        }))
    }
}
