//! # Target Traits
//!
//! The interface the host debugger implements so the core can look at the
//! inspected process.
//!
//! The core never talks to the process directly. A host adapter (a GDB or
//! LLDB bridge, a core-file reader, a test fake) implements [`Target`] and
//! hands it to [`crate::Session`] for each operation.
//!
//! ## Failure model
//!
//! Every read may fail: the target may be mid-mutation and pointers may be
//! stale. Implementations report failures as
//! [`InspectError::MemoryFault`](crate::error::InspectError::MemoryFault) and
//! must not retry on their own. The decoder turns each failure into a
//! fallback rendering for the affected piece only.

use std::sync::Arc;

use crate::error::{InspectError, InspectResult};
use crate::types::{Address, InlineArray, ObjectHandle, PrimitiveKind, Scalar, TypeDescriptor, Value, ValueType};

/// Raw memory access into the inspected process.
///
/// Only [`MemoryAccess::read_memory`] is required; the typed helpers decode
/// little-endian words on top of it.
pub trait MemoryAccess
{
    /// Fill `buf` with the bytes at `address`.
    ///
    /// ## Errors
    ///
    /// `MemoryFault` when any byte of the range is unreadable.
    fn read_memory(&self, address: Address, buf: &mut [u8]) -> InspectResult<()>;

    /// Read one byte.
    fn read_u8(&self, address: Address) -> InspectResult<u8>
    {
        let mut buf = [0u8; 1];
        self.read_memory(address, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a little-endian `u16`.
    fn read_u16(&self, address: Address) -> InspectResult<u16>
    {
        let mut buf = [0u8; 2];
        self.read_memory(address, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a little-endian `u32`.
    fn read_u32(&self, address: Address) -> InspectResult<u32>
    {
        let mut buf = [0u8; 4];
        self.read_memory(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a little-endian `u64` (one stack slot / pointer).
    fn read_u64(&self, address: Address) -> InspectResult<u64>
    {
        let mut buf = [0u8; 8];
        self.read_memory(address, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read a managed primitive.
    fn read_scalar(&self, address: Address, kind: PrimitiveKind) -> InspectResult<Scalar>
    {
        let mut buf = [0u8; 8];
        // Primitive sizes are at most 8 bytes.
        let len = usize::try_from(kind.size()).unwrap_or(8).min(buf.len());
        self.read_memory(address, &mut buf[..len])?;
        kind.decode(&buf[..len])
            .ok_or_else(|| InspectError::mismatch(format!("cannot decode {kind} at {address}")))
    }

    /// Read a value of static type `ty` stored at `address`.
    ///
    /// Inline arrays are not read eagerly: the result only records where the
    /// elements start.
    fn read_value(&self, address: Address, ty: &ValueType) -> InspectResult<Value>
    {
        let value = match ty {
            ValueType::Primitive(kind) => Value::Scalar(self.read_scalar(address, *kind)?),
            ValueType::Reference(name) => {
                Value::Reference(ObjectHandle::new(Address::from(self.read_u64(address)?), name.clone()))
            }
            ValueType::InlineArray { element, length } => Value::Array(InlineArray {
                address,
                element: (**element).clone(),
                length: *length,
            }),
            ValueType::CString => Value::CString(Address::from(self.read_u64(address)?)),
            ValueType::Word(name) => Value::Opaque {
                type_name: name.clone(),
                bits: self.read_u64(address)?,
            },
        };
        Ok(value)
    }
}

/// Everything the core consumes from the host debugger.
///
/// Required methods map one-to-one onto host facilities (type lookup, symbol
/// lookup, variable lookup in the selected frame). Listing methods default
/// to empty so minimal hosts only implement what they have.
pub trait Target: MemoryAccess
{
    /// Look up a type descriptor by canonical name.
    fn lookup_type(&self, name: &str) -> Option<Arc<TypeDescriptor>>;

    /// Address of a named symbol.
    fn resolve_symbol_address(&self, name: &str) -> Option<Address>;

    /// Name of the symbol containing `address`.
    fn resolve_address_symbol(&self, _address: Address) -> Option<String>
    {
        None
    }

    /// Evaluate a variable name (local, argument, or static) in the
    /// currently selected frame. Names may contain dots.
    ///
    /// ## Errors
    ///
    /// Any error means "not a variable here"; the resolver tries the next
    /// candidate name.
    fn lookup_variable(&self, name: &str) -> InspectResult<Value>;

    /// Names of locals and arguments of the selected frame, skipping
    /// optimized-out entries.
    fn frame_variable_names(&self) -> Vec<String>
    {
        Vec::new()
    }

    /// Fully qualified names of static variables (`pkg.Class.field`).
    fn static_variable_names(&self) -> Vec<String>
    {
        Vec::new()
    }

    /// Function listing in the host's `info functions` format.
    fn function_listing(&self) -> Vec<String>
    {
        Vec::new()
    }

    /// Descriptor for the declared type of `handle`.
    ///
    /// ## Errors
    ///
    /// `TypeMismatch` when the catalog has no such type.
    fn describe(&self, handle: &ObjectHandle) -> InspectResult<Arc<TypeDescriptor>>
    {
        self.lookup_type(&handle.type_name)
            .ok_or_else(|| InspectError::mismatch(format!("no type named {}", handle.type_name)))
    }

    /// Read field `name` of the object behind `handle`.
    ///
    /// ## Errors
    ///
    /// - `MemoryFault` for a null handle or an unreadable field
    /// - `TypeMismatch` when the type or the field is unknown
    fn read_field(&self, handle: &ObjectHandle, name: &str) -> InspectResult<Value>
    {
        let descriptor = self.describe(handle)?;
        let field = descriptor
            .field(name)
            .ok_or_else(|| InspectError::mismatch(format!("{} has no field {name}", descriptor.name)))?;
        if handle.is_null() && !field.is_static() {
            return Err(InspectError::MemoryFault {
                address: handle.address,
                length: 0,
            });
        }
        self.read_value(field.address_in(handle.address), &field.ty)
    }
}
