//! Type descriptors supplied by the host's type catalog.
//!
//! Descriptors describe layouts only. Whether a type is a string, an array
//! or an enum is derived from the fields it declares, the same way the
//! runtime's debug info exposes them.

use super::{Address, ValueType};

/// Header field holding the tagged hub pointer.
pub const HUB_FIELD: &str = "__hub__";
/// Field of a hub (`java.lang.Class`) holding the type-signature string.
pub const HUB_NAME_FIELD: &str = "name";
/// Element count of a managed array.
pub const ARRAY_LENGTH_FIELD: &str = "__length__";
/// Inline payload of a managed array.
pub const ARRAY_DATA_FIELD: &str = "__array__";
/// Canonical name of the managed string type.
pub const STRING_TYPE: &str = "java.lang.String";
/// Backing `char[]` of a managed string.
pub const STRING_VALUE_FIELD: &str = "value";
/// Constant name of an enum value.
pub const ENUM_NAME_FIELD: &str = "name";
/// Position of an enum value in its declaration.
pub const ENUM_ORDINAL_FIELD: &str = "ordinal";

/// What kind of type a descriptor describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind
{
    /// Managed (heap) type. Carries a [`HUB_FIELD`] header.
    Object,
    /// Native `CStruct` layout.
    CStruct,
    /// Typedef from runtime-compiled code that names a full type elsewhere.
    Alias
    {
        /// Name of the full type
        target: String,
    },
}

/// Where a field's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStorage
{
    /// Inside the object, at `offset` from its start.
    Instance
    {
        /// Byte offset from the object start
        offset: u64,
    },
    /// Static storage at a fixed address.
    Static
    {
        /// Storage address
        address: Address,
    },
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor
{
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: ValueType,
    /// Storage location
    pub storage: FieldStorage,
}

impl FieldDescriptor
{
    /// Instance field at `offset`.
    pub fn instance(name: impl Into<String>, offset: u64, ty: ValueType) -> Self
    {
        Self {
            name: name.into(),
            ty,
            storage: FieldStorage::Instance { offset },
        }
    }

    /// Static field stored at `address`.
    pub fn static_at(name: impl Into<String>, address: Address, ty: ValueType) -> Self
    {
        Self {
            name: name.into(),
            ty,
            storage: FieldStorage::Static { address },
        }
    }

    /// `true` for static fields.
    pub fn is_static(&self) -> bool
    {
        matches!(self.storage, FieldStorage::Static { .. })
    }

    /// Storage address of this field for an object at `base`.
    pub fn address_in(&self, base: Address) -> Address
    {
        match self.storage {
            FieldStorage::Instance { offset } => base + offset,
            FieldStorage::Static { address } => address,
        }
    }
}

/// Layout of one type, as enumerated by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor
{
    /// Canonical type name (`java.util.ArrayList`, `int[]`, ...)
    pub name: String,
    /// Kind of type
    pub kind: TypeKind,
    /// Declared fields, in declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor
{
    /// Empty descriptor of the given kind.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self
    {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
        }
    }

    /// Builder-style field append.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self
    {
        self.fields.push(field);
        self
    }

    /// Field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor>
    {
        self.fields.iter().find(|field| field.name == name)
    }

    /// `true` when objects of this type carry a hub header.
    pub fn has_header(&self) -> bool
    {
        self.field(HUB_FIELD).is_some()
    }

    /// `true` when the layout is that of a managed array.
    pub fn is_array_layout(&self) -> bool
    {
        self.field(ARRAY_LENGTH_FIELD).is_some() && self.field(ARRAY_DATA_FIELD).is_some()
    }

    /// `true` when the layout is that of a managed enum constant.
    pub fn is_enum_layout(&self) -> bool
    {
        let name_is_string = self
            .field(ENUM_NAME_FIELD)
            .is_some_and(|field| field.ty == ValueType::Reference(STRING_TYPE.to_string()));
        name_is_string && self.field(ENUM_ORDINAL_FIELD).is_some()
    }

    /// Fields shown when an object of this type is displayed.
    ///
    /// Skips the hub header and, unless `include_static`, static fields.
    pub fn visible_fields(&self, include_static: bool) -> Vec<FieldDescriptor>
    {
        self.fields
            .iter()
            .filter(|field| field.name != HUB_FIELD)
            .filter(|field| include_static || !field.is_static())
            .cloned()
            .collect()
    }
}
