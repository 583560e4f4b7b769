//! # Hub Resolver
//!
//! Finds the runtime type of a managed object.
//!
//! Every managed object starts with a header word, `__hub__`, pointing at
//! the `java.lang.Class` instance (the hub) describing its runtime type. The
//! low three bits of that word are tag bits and are cleared before the word
//! is used as a pointer. The hub's `name` field holds the type's signature
//! string (`java.util.ArrayList`, `[I`, `[Ljava.lang.String;`), which
//! [`canonical_type_name`] turns into the name the type catalog uses.
//!
//! Nothing here fails loudly. A missing header, an unreadable hub or an
//! unknown type name leaves the caller with the statically typed handle.

use tracing::trace;

use crate::target::Target;
use crate::types::descriptor::{HUB_FIELD, HUB_NAME_FIELD};
use crate::types::{Address, ObjectHandle, PrimitiveKind, TypeKind, Value, ValueType};
use crate::visual::payload::decode_java_string;

// Longest typedef chain followed before giving up.
const MAX_ALIAS_HOPS: usize = 8;

/// Runtime-type lookups for managed objects.
#[derive(Clone, Copy)]
pub struct HubResolver<'a>
{
    target: &'a dyn Target,
}

impl<'a> HubResolver<'a>
{
    /// Resolver over `target`.
    pub fn new(target: &'a dyn Target) -> Self
    {
        Self { target }
    }

    /// The object's hub, typed as the header field declares it.
    ///
    /// `None` when the type has no header or the header cannot be read.
    pub fn get_hub(&self, object: &ObjectHandle) -> Option<ObjectHandle>
    {
        let descriptor = self.target.describe(object).ok()?;
        let field = descriptor.field(HUB_FIELD)?;
        let ValueType::Reference(hub_type) = &field.ty else {
            trace!(type_name = %descriptor.name, "hub field is not a reference");
            return None;
        };
        match self.target.read_u64(field.address_in(object.address)) {
            Ok(word) => Some(ObjectHandle::new(Address::from(word).untagged(), hub_type.clone())),
            Err(err) => {
                trace!(object = %object.address, error = %err, "cannot read hub");
                None
            }
        }
    }

    /// Signature string of the object's runtime type, as stored in its hub.
    pub fn runtime_type_name(&self, object: &ObjectHandle) -> Option<String>
    {
        let hub = self.get_hub(object)?;
        let name = match self.target.read_field(&hub, HUB_NAME_FIELD) {
            Ok(Value::Reference(name)) if !name.is_null() => name,
            Ok(_) => return None,
            Err(err) => {
                trace!(hub = %hub.address, error = %err, "cannot read hub name");
                return None;
            }
        };
        decode_java_string(self.target, &name)
            .inspect_err(|err| trace!(hub = %hub.address, error = %err, "cannot decode hub name"))
            .ok()
    }

    /// Reinterpret `object` as its runtime type.
    ///
    /// Returns the handle unchanged when the runtime name cannot be read or
    /// decoded, or when the catalog does not know it.
    pub fn cast_to_runtime_type(&self, object: &ObjectHandle) -> ObjectHandle
    {
        let Some(signature) = self.runtime_type_name(object).filter(|name| !name.is_empty()) else {
            trace!(object = %object.address, "no runtime type name");
            return object.clone();
        };
        let Some(canonical) = canonical_type_name(&signature) else {
            trace!(%signature, "malformed type signature");
            return object.clone();
        };
        if canonical == object.type_name {
            return object.clone();
        }
        if self.target.lookup_type(&canonical).is_none() {
            trace!(%canonical, "runtime type not in catalog");
            return object.clone();
        }
        object.with_type(canonical)
    }

    /// Follow typedefs from runtime-compiled code to the full type name.
    pub fn resolve_alias(&self, type_name: &str) -> String
    {
        let mut name = type_name.to_string();
        for _ in 0..MAX_ALIAS_HOPS {
            match self.target.lookup_type(&name).map(|d| d.kind.clone()) {
                Some(TypeKind::Alias { target }) => name = target,
                _ => break,
            }
        }
        name
    }
}

/// Convert a type-signature string to a canonical type name.
///
/// Leading `[` count array dimensions. Under at least one dimension the
/// element is either `L<name>;` or a one-letter primitive code. Plain names
/// pass through.
///
/// ```rust
/// use svmprobe_core::hub::canonical_type_name;
///
/// assert_eq!(canonical_type_name("[[I").as_deref(), Some("int[][]"));
/// assert_eq!(canonical_type_name("[Ljava.lang.String;").as_deref(), Some("java.lang.String[]"));
/// assert_eq!(canonical_type_name("java.util.HashMap").as_deref(), Some("java.util.HashMap"));
/// ```
pub fn canonical_type_name(signature: &str) -> Option<String>
{
    let element = signature.trim_start_matches('[');
    let dimensions = signature.len() - element.len();
    if element.is_empty() {
        return None;
    }

    let mut name = if dimensions == 0 {
        element.to_string()
    } else if let Some(class) = element.strip_prefix('L').and_then(|rest| rest.strip_suffix(';')) {
        class.to_string()
    } else {
        let mut chars = element.chars();
        match (chars.next().and_then(PrimitiveKind::from_signature_code), chars.next()) {
            (Some(kind), None) => kind.name().to_string(),
            _ => element.to_string(),
        }
    };
    for _ in 0..dimensions {
        name.push_str("[]");
    }
    Some(name)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_canonical_primitive_arrays()
    {
        assert_eq!(canonical_type_name("[Z").as_deref(), Some("boolean[]"));
        assert_eq!(canonical_type_name("[J").as_deref(), Some("long[]"));
        assert_eq!(canonical_type_name("[[[C").as_deref(), Some("char[][][]"));
    }

    #[test]
    fn test_canonical_object_arrays()
    {
        assert_eq!(
            canonical_type_name("[[Ljava.lang.Object;").as_deref(),
            Some("java.lang.Object[][]")
        );
    }

    #[test]
    fn test_canonical_plain_names()
    {
        // Class names that happen to look like signatures are left alone.
        assert_eq!(canonical_type_name("Lunar").as_deref(), Some("Lunar"));
        assert_eq!(canonical_type_name("I").as_deref(), Some("I"));
        assert_eq!(canonical_type_name("int").as_deref(), Some("int"));
    }

    #[test]
    fn test_canonical_rejects_empty()
    {
        assert_eq!(canonical_type_name(""), None);
        assert_eq!(canonical_type_name("[["), None);
    }
}
