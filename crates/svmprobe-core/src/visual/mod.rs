//! # Visual Values
//!
//! The decoded, display-oriented form of a raw [`Value`].
//!
//! [`DecodeContext::decode`] classifies a value into one [`VisualNode`]
//! variant using a fixed, ordered list of heuristics. Nodes are shallow:
//! a node carries its label inputs plus a recipe for its children, and the
//! children are only read when a [`ChildCursor`] is advanced. Printing a
//! huge array with a limit of 10 therefore reads 10 elements.
//!
//! ## Labels
//!
//! | Node | Label |
//! |------|-------|
//! | string | `"text"` |
//! | array | `int[5]` |
//! | enum | `RED(0)` |
//! | object | runtime type name, `object` when unknown |
//!
//! A label gains ` = {...}` when the node's children are cut (cyclic
//! reference, or an array limit of 0), and ` @ 0x…` when addresses are shown.

use std::fmt;

use tracing::trace;

use crate::config::InspectorConfig;
use crate::error::InspectResult;
use crate::types::{Address, FieldDescriptor, InlineArray, ObjectHandle, Scalar, Value};

pub mod decoder;
pub mod hlrep;
pub mod payload;
pub mod render;

pub use decoder::DecodeContext;
pub use hlrep::{ArrayListRepresentation, HighLevelRepresentation, RepresentationRegistry};
pub use render::MAX_RENDER_DEPTH;

/// Decoded value, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualNode
{
    /// `char` or `byte` primitive.
    Primitive(Scalar),
    /// Managed string or bounded C string.
    StringValue(StringNode),
    /// Managed array, native inline array, or a sequence-shaped
    /// high-level representation.
    ArrayValue(ArrayNode),
    /// Managed enum constant.
    EnumValue(EnumNode),
    /// Any other object, or a native `CStruct`.
    ClassValue(ClassNode),
    /// Fixed text (`null`, `Invalid CString @ 0x…`).
    ConstLabel(String),
    /// Several labels joined together.
    CombinedLabel(CombinedLabel),
}

impl VisualNode
{
    /// One-line label for this node.
    pub fn label(&self, config: &InspectorConfig) -> String
    {
        let (mut label, address) = match self {
            VisualNode::Primitive(scalar) => return scalar.to_string(),
            VisualNode::ConstLabel(text) => return text.clone(),
            VisualNode::CombinedLabel(combined) => return combined.to_string(),
            VisualNode::StringValue(node) => (format!("{:?}", node.text), node.address),
            VisualNode::ArrayValue(node) => {
                let mut label = node.label.clone();
                if node.self_ref || config.array_element_limit == 0 {
                    label.push_str(" = {...}");
                }
                (label, node.owner)
            }
            VisualNode::EnumValue(node) => (
                CombinedLabel::new([node.name.clone(), node.ordinal.to_string()])
                    .separator("(")
                    .end(")")
                    .to_string(),
                node.address,
            ),
            VisualNode::ClassValue(node) => {
                let mut label = node.type_name.clone();
                if node.self_ref {
                    label.push_str(" = {...}");
                }
                (label, node.handle.address)
            }
        };
        if config.show_addresses && !address.is_null() {
            label.push_str(&format!(" @ {address}"));
        }
        label
    }

    /// Cursor over this node's children.
    ///
    /// Leaves (strings, enums, primitives, labels) and cut nodes yield
    /// nothing. So do arrays while the element limit is 0.
    pub fn children(&self, config: &InspectorConfig) -> ChildCursor
    {
        match self {
            VisualNode::ArrayValue(node) if !node.self_ref && config.array_element_limit > 0 => ChildCursor::new(
                ChildSource::Elements {
                    owner: node.owner,
                    elements: node.elements.clone(),
                },
                config.array_element_limit,
            ),
            VisualNode::ClassValue(node) if !node.self_ref => ChildCursor::new(
                ChildSource::Fields {
                    owner: node.handle.clone(),
                    fields: node.fields.clone(),
                },
                usize::MAX,
            ),
            _ => ChildCursor::new(ChildSource::Empty, 0),
        }
    }

    /// `true` for nodes whose children are listed as `name = value`.
    pub fn has_named_children(&self) -> bool
    {
        matches!(self, VisualNode::ClassValue(_))
    }
}

/// Decoded string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringNode
{
    /// Decoded text (or the invalid-string literal)
    pub text: String,
    /// Object or buffer address
    pub address: Address,
}

/// Array-shaped node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayNode
{
    /// Summary label (`int[5]`, `java.util.ArrayList(3)`)
    pub label: String,
    /// Address the node is displayed at and registers its elements under
    pub owner: Address,
    /// Element storage, sized to the number of logical elements
    pub elements: InlineArray,
    /// Set when the cycle guard cut this node
    pub self_ref: bool,
}

impl ArrayNode
{
    /// Logical element count.
    pub fn length(&self) -> u64
    {
        self.elements.length
    }
}

/// Enum constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumNode
{
    /// Constant name
    pub name: String,
    /// Declaration position
    pub ordinal: i64,
    /// Object address
    pub address: Address,
}

/// Generic object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode
{
    /// Label text: runtime type name for managed objects, static type name
    /// for `CStruct` values
    pub type_name: String,
    /// Object, typed as its runtime type where that is known
    pub handle: ObjectHandle,
    /// Fields listed as children, in declaration order
    pub fields: Vec<FieldDescriptor>,
    /// Set when the cycle guard cut this node
    pub self_ref: bool,
}

/// Labels joined as `begin + parts.join(separator) + end`.
///
/// ```rust
/// use svmprobe_core::visual::CombinedLabel;
///
/// let label = CombinedLabel::new(["RED", "0"]).separator("(").end(")");
/// assert_eq!(label.to_string(), "RED(0)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedLabel
{
    parts: Vec<String>,
    begin: String,
    separator: String,
    end: String,
}

impl CombinedLabel
{
    /// Join `parts` with `|` and no delimiters.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            begin: String::new(),
            separator: "|".to_string(),
            end: String::new(),
        }
    }

    /// Set the leading text.
    #[must_use]
    pub fn begin(mut self, begin: impl Into<String>) -> Self
    {
        self.begin = begin.into();
        self
    }

    /// Set the separator.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self
    {
        self.separator = separator.into();
        self
    }

    /// Set the trailing text.
    #[must_use]
    pub fn end(mut self, end: impl Into<String>) -> Self
    {
        self.end = end.into();
        self
    }
}

impl fmt::Display for CombinedLabel
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}{}{}", self.begin, self.parts.join(&self.separator), self.end)
    }
}

/// One child of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Child
{
    /// Field name or element index
    pub name: String,
    /// What the child holds
    pub value: ChildValue,
}

/// Payload of a [`Child`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChildValue
{
    /// Raw value, decoded lazily by whoever renders it
    Value(Value),
    /// Marker standing for the elements past the display limit
    Elided,
    /// The child's storage could not be read
    Fault(Address),
}

/// Where a cursor takes its children from.
#[derive(Debug, Clone)]
pub enum ChildSource
{
    /// Array elements
    Elements
    {
        /// Array the elements belong to
        owner: Address,
        /// Element storage
        elements: InlineArray,
    },
    /// Object fields
    Fields
    {
        /// Object the fields belong to
        owner: ObjectHandle,
        /// Fields to list
        fields: Vec<FieldDescriptor>,
    },
    /// No children
    Empty,
}

/// Lazy iterator over a node's children.
///
/// Every managed reference yielded is registered with the cycle guard under
/// the node's address before it is handed out.
#[derive(Debug, Clone)]
pub struct ChildCursor
{
    source: ChildSource,
    position: usize,
    limit: usize,
    finished: bool,
}

impl ChildCursor
{
    fn new(source: ChildSource, limit: usize) -> Self
    {
        Self {
            source,
            position: 0,
            limit,
            finished: false,
        }
    }

    /// Total children available before limits apply.
    pub fn available(&self) -> u64
    {
        match &self.source {
            ChildSource::Elements { elements, .. } => elements.length,
            ChildSource::Fields { fields, .. } => fields.len() as u64,
            ChildSource::Empty => 0,
        }
    }

    /// Skip ahead so the next child is the one at `index`.
    pub fn seek(&mut self, index: usize)
    {
        self.position = index;
    }

    /// Next child, `None` when exhausted.
    ///
    /// ## Errors
    ///
    /// Only `Interrupted`. Unreadable children come back as
    /// [`ChildValue::Fault`].
    pub fn next(&mut self, ctx: &mut DecodeContext<'_>) -> InspectResult<Option<Child>>
    {
        ctx.interrupt.check()?;
        if self.finished {
            return Ok(None);
        }

        let index = self.position;
        let available = self.available();
        if index as u64 >= available {
            self.finished = true;
            return Ok(None);
        }
        if index >= self.limit {
            self.finished = true;
            return Ok(Some(Child {
                name: index.to_string(),
                value: ChildValue::Elided,
            }));
        }
        self.position += 1;

        let (owner, name, read) = match &self.source {
            ChildSource::Elements { owner, elements } => {
                let address = elements.element_address(index as u64);
                let read = ctx.target.read_value(address, &elements.element).map_err(|err| (address, err));
                (*owner, index.to_string(), read)
            }
            ChildSource::Fields { owner, fields } => {
                let field = &fields[index];
                let address = field.address_in(owner.address);
                let read = ctx.target.read_value(address, &field.ty).map_err(|err| (address, err));
                (owner.address, field.name.clone(), read)
            }
            ChildSource::Empty => return Ok(None),
        };

        let value = match read {
            Ok(value) => {
                if let Value::Reference(handle) = &value {
                    if ctx.is_managed(handle) {
                        let policy = ctx.config.cycle_policy();
                        ctx.guard.add_ref(policy, owner, handle.address);
                    }
                }
                ChildValue::Value(value)
            }
            Err((address, err)) => {
                trace!(%address, error = %err, child = %name, "child unreadable");
                ChildValue::Fault(address)
            }
        };
        Ok(Some(Child { name, value }))
    }
}
