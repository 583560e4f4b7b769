//! Value classification.
//!
//! The heuristics run in a fixed order and the first match wins:
//!
//! 1. Typedefs on reference targets are replaced by the full type.
//! 2. A type with a `__hub__` header is managed; everything else takes the
//!    native path (step 9).
//! 3. A null managed reference is `null`.
//! 4. The reference is reinterpreted as its runtime type.
//! 5. `java.lang.String` decodes to its text.
//! 6. A layout with `__length__` and `__array__` is an array.
//! 7. A layout with a string `name` and an `ordinal` is an enum constant.
//! 8. Anything else is a generic object, possibly replaced by a registered
//!    high-level representation.
//! 9. Native values: inline arrays, `char`, `byte`, `CStruct` pointers and
//!    C strings.
//! 10. No match: the caller falls back to default display.
//!
//! A failed read inside a step drops to the next step or to the default
//! display. It never reaches the caller.

use std::sync::Arc;

use tracing::trace;

use super::payload::{self, INVALID_STRING};
use super::{ArrayNode, ClassNode, EnumNode, RepresentationRegistry, StringNode, VisualNode};
use crate::config::InspectorConfig;
use crate::cycles::CycleGuard;
use crate::error::InspectResult;
use crate::hub::HubResolver;
use crate::interrupt::InterruptHandle;
use crate::target::Target;
use crate::types::descriptor::{ENUM_NAME_FIELD, ENUM_ORDINAL_FIELD, STRING_TYPE};
use crate::types::{
    Address, FieldDescriptor, InlineArray, ObjectHandle, PrimitiveKind, Scalar, TypeDescriptor, TypeKind, Value,
    ValueType,
};

/// Everything one decode pass needs.
///
/// Built by [`crate::Session`] for each top-level operation; tests build it
/// directly.
pub struct DecodeContext<'a>
{
    /// Inspected process
    pub target: &'a dyn Target,
    /// Active limits and switches
    pub config: &'a InspectorConfig,
    /// Cycle state of the running evaluation
    pub guard: &'a mut CycleGuard,
    /// High-level representations
    pub registry: &'a RepresentationRegistry,
    /// User interrupt flag
    pub interrupt: &'a InterruptHandle,
}

impl<'a> DecodeContext<'a>
{
    /// Hub resolver over this context's target.
    pub fn hubs(&self) -> HubResolver<'a>
    {
        HubResolver::new(self.target)
    }

    /// Classify `value`.
    ///
    /// `Ok(None)` means "no override": render with the default display.
    ///
    /// ## Errors
    ///
    /// Only `Interrupted`.
    pub fn decode(&mut self, value: &Value) -> InspectResult<Option<VisualNode>>
    {
        self.interrupt.check()?;
        if !self.config.pretty_printing_enabled {
            return Ok(None);
        }

        match value {
            Value::Reference(handle) => {
                let handle = handle.with_type(self.hubs().resolve_alias(&handle.type_name));
                match self.lookup(&handle.type_name) {
                    Some(descriptor) if descriptor.has_header() => self.decode_managed(&handle).map(Some),
                    descriptor => Ok(self.decode_native_pointer(&handle, descriptor.as_deref())),
                }
            }
            Value::Array(elements) => Ok(Some(VisualNode::ArrayValue(ArrayNode {
                label: ValueType::inline_array(elements.element.clone(), elements.length).to_string(),
                owner: elements.address,
                elements: elements.clone(),
                self_ref: false,
            }))),
            Value::Scalar(scalar) => Ok(match scalar.kind() {
                PrimitiveKind::Char | PrimitiveKind::Byte => Some(VisualNode::Primitive(*scalar)),
                _ => None,
            }),
            Value::CString(address) => Ok(self.decode_c_string(*address)),
            Value::Opaque { .. } => Ok(None),
        }
    }

    /// `true` when `handle`'s declared type carries a hub header.
    pub fn is_managed(&self, handle: &ObjectHandle) -> bool
    {
        let name = self.hubs().resolve_alias(&handle.type_name);
        self.lookup(&name).is_some_and(|descriptor| descriptor.has_header())
    }

    fn lookup(&self, type_name: &str) -> Option<Arc<TypeDescriptor>>
    {
        self.target.lookup_type(type_name)
    }

    fn decode_managed(&mut self, handle: &ObjectHandle) -> InspectResult<VisualNode>
    {
        if handle.is_null() {
            return Ok(VisualNode::ConstLabel("null".to_string()));
        }

        let hubs = self.hubs();
        let handle = hubs.cast_to_runtime_type(handle);
        let Some(descriptor) = self.lookup(&handle.type_name) else {
            return Ok(VisualNode::ClassValue(self.class_node(&handle, None, &[])));
        };

        if handle.type_name == STRING_TYPE {
            let text = payload::decode_java_string(self.target, &handle).unwrap_or_else(|err| {
                trace!(address = %handle.address, error = %err, "invalid string");
                INVALID_STRING.to_string()
            });
            return Ok(VisualNode::StringValue(StringNode {
                text,
                address: handle.address,
            }));
        }

        if descriptor.is_array_layout() {
            match payload::array_elements(self.target, &handle) {
                Ok(elements) => return Ok(VisualNode::ArrayValue(self.array_node(&handle, elements))),
                Err(err) => trace!(address = %handle.address, error = %err, "array payload unreadable"),
            }
        }

        if descriptor.is_enum_layout() {
            if let Some(node) = self.enum_node(&handle) {
                return Ok(VisualNode::EnumValue(node));
            }
        }

        let type_name = hubs.runtime_type_name(&handle);
        let class = self.class_node(&handle, type_name, &descriptor.visible_fields(self.config.show_static_fields));
        if !self.config.high_level_representations_enabled {
            return Ok(VisualNode::ClassValue(class));
        }

        let registry = self.registry;
        let Some(representation) = registry.get(&handle.type_name) else {
            return Ok(VisualNode::ClassValue(class));
        };
        match representation.represent(self, &class) {
            Ok(replacement) => Ok(replacement),
            Err(err) if err.is_interrupt() => Err(err),
            Err(err) => {
                trace!(type_name = %handle.type_name, error = %err, "high-level representation failed");
                Ok(VisualNode::ClassValue(class))
            }
        }
    }

    /// Array node for a managed array whose payload was read as `elements`.
    pub(crate) fn array_node(&self, handle: &ObjectHandle, elements: InlineArray) -> ArrayNode
    {
        ArrayNode {
            label: format!("{}[{}]", elements.element, elements.length),
            owner: handle.address,
            self_ref: self.guard.is_self_ref(self.config.cycle_policy(), handle.address),
            elements,
        }
    }

    fn enum_node(&self, handle: &ObjectHandle) -> Option<EnumNode>
    {
        let ordinal = self
            .target
            .read_field(handle, ENUM_ORDINAL_FIELD)
            .ok()?
            .as_scalar()
            .and_then(Scalar::as_i64)?;
        let name = match self.target.read_field(handle, ENUM_NAME_FIELD) {
            Ok(Value::Reference(name)) if !name.is_null() => {
                payload::decode_java_string(self.target, &name).unwrap_or_else(|_| INVALID_STRING.to_string())
            }
            _ => INVALID_STRING.to_string(),
        };
        Some(EnumNode {
            name,
            ordinal,
            address: handle.address,
        })
    }

    fn class_node(&self, handle: &ObjectHandle, type_name: Option<String>, fields: &[FieldDescriptor]) -> ClassNode
    {
        ClassNode {
            type_name: type_name.unwrap_or_else(|| "object".to_string()),
            handle: handle.clone(),
            fields: fields.to_vec(),
            self_ref: self.guard.is_self_ref(self.config.cycle_policy(), handle.address),
        }
    }

    fn decode_native_pointer(&self, handle: &ObjectHandle, descriptor: Option<&TypeDescriptor>) -> Option<VisualNode>
    {
        let descriptor = descriptor?;
        if handle.is_null() || descriptor.kind != TypeKind::CStruct {
            return None;
        }
        Some(VisualNode::ClassValue(ClassNode {
            type_name: descriptor.name.clone(),
            handle: handle.clone(),
            fields: descriptor.visible_fields(self.config.show_static_fields),
            self_ref: false,
        }))
    }

    fn decode_c_string(&self, address: Address) -> Option<VisualNode>
    {
        let limit = self.config.cstring_length_limit;
        if address.is_null() || limit == 0 {
            return None;
        }
        Some(match payload::read_c_string(self.target, address, limit) {
            Ok(text) => VisualNode::StringValue(StringNode { text, address }),
            Err(err) => {
                trace!(%address, error = %err, "C string unreadable");
                VisualNode::ConstLabel(format!("Invalid CString @ {address}"))
            }
        })
    }
}
