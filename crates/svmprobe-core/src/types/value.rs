//! Raw values read from the target.
//!
//! A [`Value`] is what the decoder starts from: a scalar, a reference to a
//! typed object, an inline native array, a C string pointer, or an opaque
//! word. Values are plain data; reading one never mutates the target and a
//! value never owns target memory.

use std::fmt;

use super::Address;

/// Managed primitive kinds, named the way the runtime names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind
{
    /// `boolean` (1 byte)
    Boolean,
    /// `byte` (1 byte, signed)
    Byte,
    /// `char` (2 bytes, one UTF-16 code unit)
    Char,
    /// `short` (2 bytes)
    Short,
    /// `int` (4 bytes)
    Int,
    /// `long` (8 bytes)
    Long,
    /// `float` (4 bytes)
    Float,
    /// `double` (8 bytes)
    Double,
}

impl PrimitiveKind
{
    /// Size of the primitive in target memory.
    pub const fn size(self) -> u64
    {
        match self {
            PrimitiveKind::Boolean | PrimitiveKind::Byte => 1,
            PrimitiveKind::Char | PrimitiveKind::Short => 2,
            PrimitiveKind::Int | PrimitiveKind::Float => 4,
            PrimitiveKind::Long | PrimitiveKind::Double => 8,
        }
    }

    /// Source-level name (`int`, `char`, ...).
    pub const fn name(self) -> &'static str
    {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Map a one-letter type-signature code to its primitive.
    ///
    /// ```rust
    /// use svmprobe_core::types::PrimitiveKind;
    ///
    /// assert_eq!(PrimitiveKind::from_signature_code('J'), Some(PrimitiveKind::Long));
    /// assert_eq!(PrimitiveKind::from_signature_code('L'), None);
    /// ```
    pub const fn from_signature_code(code: char) -> Option<Self>
    {
        match code {
            'Z' => Some(PrimitiveKind::Boolean),
            'B' => Some(PrimitiveKind::Byte),
            'C' => Some(PrimitiveKind::Char),
            'D' => Some(PrimitiveKind::Double),
            'F' => Some(PrimitiveKind::Float),
            'I' => Some(PrimitiveKind::Int),
            'J' => Some(PrimitiveKind::Long),
            'S' => Some(PrimitiveKind::Short),
            _ => None,
        }
    }

    /// Decode little-endian bytes (exactly [`PrimitiveKind::size`] long).
    pub(crate) fn decode(self, bytes: &[u8]) -> Option<Scalar>
    {
        let scalar = match self {
            PrimitiveKind::Boolean => Scalar::Boolean(*bytes.first()? != 0),
            PrimitiveKind::Byte => Scalar::Byte(i8::from_le_bytes([*bytes.first()?])),
            PrimitiveKind::Char => Scalar::Char(u16::from_le_bytes(bytes.try_into().ok()?)),
            PrimitiveKind::Short => Scalar::Short(i16::from_le_bytes(bytes.try_into().ok()?)),
            PrimitiveKind::Int => Scalar::Int(i32::from_le_bytes(bytes.try_into().ok()?)),
            PrimitiveKind::Long => Scalar::Long(i64::from_le_bytes(bytes.try_into().ok()?)),
            PrimitiveKind::Float => Scalar::Float(f32::from_le_bytes(bytes.try_into().ok()?)),
            PrimitiveKind::Double => Scalar::Double(f64::from_le_bytes(bytes.try_into().ok()?)),
        };
        Some(scalar)
    }
}

impl fmt::Display for PrimitiveKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// A decoded primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar
{
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `char` as a raw UTF-16 code unit
    Char(u16),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
}

impl Scalar
{
    /// Integer view used for lengths, ordinals and frame sizes.
    ///
    /// Returns `None` for floating point and boolean values.
    pub fn as_i64(self) -> Option<i64>
    {
        match self {
            Scalar::Byte(v) => Some(i64::from(v)),
            Scalar::Char(v) => Some(i64::from(v)),
            Scalar::Short(v) => Some(i64::from(v)),
            Scalar::Int(v) => Some(i64::from(v)),
            Scalar::Long(v) => Some(v),
            Scalar::Boolean(_) | Scalar::Float(_) | Scalar::Double(_) => None,
        }
    }

    /// Kind of this scalar.
    pub fn kind(self) -> PrimitiveKind
    {
        match self {
            Scalar::Boolean(_) => PrimitiveKind::Boolean,
            Scalar::Byte(_) => PrimitiveKind::Byte,
            Scalar::Char(_) => PrimitiveKind::Char,
            Scalar::Short(_) => PrimitiveKind::Short,
            Scalar::Int(_) => PrimitiveKind::Int,
            Scalar::Long(_) => PrimitiveKind::Long,
            Scalar::Float(_) => PrimitiveKind::Float,
            Scalar::Double(_) => PrimitiveKind::Double,
        }
    }

    /// The character for a `char` scalar that is a complete code point.
    pub fn as_char(self) -> Option<char>
    {
        match self {
            Scalar::Char(unit) => char::decode_utf16([unit]).next()?.ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Scalar::Boolean(v) => write!(f, "{v}"),
            Scalar::Byte(v) => write!(f, "{v}"),
            Scalar::Char(unit) => match self.as_char() {
                Some(c) => write!(f, "'{c}'"),
                None => write!(f, "{unit}"),
            },
            Scalar::Short(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Long(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Double(v) => write!(f, "{v}"),
        }
    }
}

/// Static type of a field, array element or variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType
{
    /// Managed primitive stored inline.
    Primitive(PrimitiveKind),
    /// Pointer to a named type (managed object, `CStruct`, or alias).
    Reference(String),
    /// Fixed-size native array stored inline. Managed arrays declare their
    /// `__array__` payload this way with a length of 0.
    InlineArray
    {
        /// Element type
        element: Box<ValueType>,
        /// Declared element count
        length: u64,
    },
    /// `CPointer(char)`: pointer to a NUL-terminated byte string.
    CString,
    /// Any other word-sized value, kept opaque.
    Word(String),
}

impl ValueType
{
    /// Shorthand for [`ValueType::Reference`].
    pub fn reference(name: impl Into<String>) -> Self
    {
        ValueType::Reference(name.into())
    }

    /// Shorthand for [`ValueType::InlineArray`].
    pub fn inline_array(element: ValueType, length: u64) -> Self
    {
        ValueType::InlineArray {
            element: Box::new(element),
            length,
        }
    }

    /// Size in target memory. Pointers are 8 bytes.
    pub fn size(&self) -> u64
    {
        match self {
            ValueType::Primitive(kind) => kind.size(),
            ValueType::InlineArray { element, length } => element.size().saturating_mul(*length),
            ValueType::Reference(_) | ValueType::CString | ValueType::Word(_) => 8,
        }
    }
}

impl fmt::Display for ValueType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            ValueType::Primitive(kind) => write!(f, "{kind}"),
            ValueType::Reference(name) | ValueType::Word(name) => f.write_str(name),
            ValueType::InlineArray { element, length } => write!(f, "{element}[{length}]"),
            ValueType::CString => f.write_str("CPointer(char)"),
        }
    }
}

/// Reference to an object in the target
///
/// Address plus the declared static type the reference was read through.
/// The handle borrows nothing: it is only meaningful against the target and
/// session that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectHandle
{
    /// Object start (header) address
    pub address: Address,
    /// Declared static type name
    pub type_name: String,
}

impl ObjectHandle
{
    /// Build a handle.
    pub fn new(address: Address, type_name: impl Into<String>) -> Self
    {
        Self {
            address,
            type_name: type_name.into(),
        }
    }

    /// `true` for the `null` reference.
    pub fn is_null(&self) -> bool
    {
        self.address.is_null()
    }

    /// Reinterpret the same address as another type.
    #[must_use]
    pub fn with_type(&self, type_name: impl Into<String>) -> Self
    {
        Self::new(self.address, type_name)
    }
}

/// Inline array: `length` elements of `element` starting at `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineArray
{
    /// First element
    pub address: Address,
    /// Element type
    pub element: ValueType,
    /// Element count
    pub length: u64,
}

impl InlineArray
{
    /// Address of element `index` (no bounds check).
    pub fn element_address(&self, index: u64) -> Address
    {
        self.address + index.wrapping_mul(self.element.size())
    }
}

/// A value read from the target.
#[derive(Debug, Clone, PartialEq)]
pub enum Value
{
    /// Primitive stored inline
    Scalar(Scalar),
    /// Pointer to a typed object (may be null)
    Reference(ObjectHandle),
    /// Inline native array
    Array(InlineArray),
    /// `CPointer(char)` value
    CString(Address),
    /// Word of a type the decoder does not interpret
    Opaque
    {
        /// Static type name
        type_name: String,
        /// Raw bits
        bits: u64,
    },
}

impl Value
{
    /// The referenced handle, when this is a reference.
    pub fn as_reference(&self) -> Option<&ObjectHandle>
    {
        match self {
            Value::Reference(handle) => Some(handle),
            _ => None,
        }
    }

    /// The scalar, when this is a primitive.
    pub fn as_scalar(&self) -> Option<Scalar>
    {
        match self {
            Value::Scalar(scalar) => Some(*scalar),
            _ => None,
        }
    }
}
