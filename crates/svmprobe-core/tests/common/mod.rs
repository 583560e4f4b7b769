//! In-memory target used by the integration tests.
//!
//! Objects are laid out the way native images lay them out: a tagged hub
//! word at offset 0, 8-byte field slots after it, and managed arrays with
//! `__length__` at 8 and their payload at 16.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use gimli::Register;
use svmprobe_core::error::{InspectError, InspectResult};
use svmprobe_core::target::{MemoryAccess, Target};
use svmprobe_core::types::{
    Address, FieldDescriptor, ObjectHandle, PrimitiveKind, TypeDescriptor, TypeKind, Value, ValueType,
};
use svmprobe_core::unwind::PendingFrame;
use svmprobe_core::InterruptHandle;

pub const CLASS_TYPE: &str = "java.lang.Class";
pub const STRING_TYPE: &str = "java.lang.String";
pub const OBJECT_TYPE: &str = "java.lang.Object";

// Tag bits OR'ed into every hub word written.
const HUB_TAG: u64 = 0b011;
const HEAP_START: u64 = 0x10000;

pub struct FakeTarget
{
    regions: BTreeMap<u64, Vec<u8>>,
    next: u64,
    types: HashMap<String, Arc<TypeDescriptor>>,
    hubs: HashMap<String, Address>,
    variables: HashMap<String, Value>,
    symbols: HashMap<String, Address>,
    pub frame_variables: Vec<String>,
    pub statics: Vec<String>,
    pub listing: Vec<String>,
    trip: Option<InterruptHandle>,
    pub reads: Cell<usize>,
}

impl FakeTarget
{
    pub fn new() -> Self
    {
        let mut target = Self {
            regions: BTreeMap::new(),
            next: HEAP_START,
            types: HashMap::new(),
            hubs: HashMap::new(),
            variables: HashMap::new(),
            symbols: HashMap::new(),
            frame_variables: Vec::new(),
            statics: Vec::new(),
            listing: Vec::new(),
            trip: None,
            reads: Cell::new(0),
        };
        target.define(
            TypeDescriptor::new(CLASS_TYPE, TypeKind::Object)
                .with_field(header())
                .with_field(FieldDescriptor::instance("name", 8, ValueType::reference(STRING_TYPE))),
        );
        target.define(
            TypeDescriptor::new(STRING_TYPE, TypeKind::Object)
                .with_field(header())
                .with_field(FieldDescriptor::instance("value", 8, ValueType::reference("char[]")))
                .with_field(FieldDescriptor::instance("hash", 16, ValueType::Primitive(PrimitiveKind::Int))),
        );
        target.define(TypeDescriptor::new(OBJECT_TYPE, TypeKind::Object).with_field(header()));
        target.define_array("char[]", ValueType::Primitive(PrimitiveKind::Char));
        target.define_array("int[]", ValueType::Primitive(PrimitiveKind::Int));
        target.define_array("java.lang.Object[]", ValueType::reference(OBJECT_TYPE));
        target
    }

    pub fn define(&mut self, descriptor: TypeDescriptor)
    {
        self.types.insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    pub fn define_array(&mut self, name: &str, element: ValueType)
    {
        self.define(
            TypeDescriptor::new(name, TypeKind::Object)
                .with_field(header())
                .with_field(FieldDescriptor::instance(
                    "__length__",
                    8,
                    ValueType::Primitive(PrimitiveKind::Int),
                ))
                .with_field(FieldDescriptor::instance("__array__", 16, ValueType::inline_array(element, 0))),
        );
    }

    /// Managed class with one 8-byte slot per field, starting after the
    /// header.
    pub fn define_class(&mut self, name: &str, fields: &[(&str, ValueType)])
    {
        let mut descriptor = TypeDescriptor::new(name, TypeKind::Object).with_field(header());
        for (slot, (field, ty)) in fields.iter().enumerate() {
            descriptor = descriptor.with_field(FieldDescriptor::instance(*field, 8 * (slot as u64 + 1), ty.clone()));
        }
        self.define(descriptor);
    }

    pub fn alloc(&mut self, size: u64) -> Address
    {
        let address = self.next;
        let size = size.max(8);
        self.regions.insert(address, vec![0; usize::try_from(size).unwrap()]);
        self.next = (address + size + 7) & !7;
        Address::from(address)
    }

    pub fn write(&mut self, address: Address, bytes: &[u8])
    {
        let (start, region) = self
            .regions
            .range_mut(..=address.value())
            .next_back()
            .expect("write outside any region");
        let offset = usize::try_from(address.value() - start).unwrap();
        region[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn write_u64(&mut self, address: Address, value: u64)
    {
        self.write(address, &value.to_le_bytes());
    }

    pub fn write_i32(&mut self, address: Address, value: i32)
    {
        self.write(address, &value.to_le_bytes());
    }

    /// Hub of `type_name`, created on first use.
    pub fn hub(&mut self, type_name: &str) -> Address
    {
        if let Some(hub) = self.hubs.get(type_name) {
            return *hub;
        }
        let hub = self.alloc(16);
        self.hubs.insert(type_name.to_string(), hub);
        let name = self.new_string(&signature(type_name));
        self.write_u64(hub + 8, name.value());
        hub
    }

    /// Object of `type_name` with every field zeroed and its hub written.
    pub fn new_object(&mut self, type_name: &str) -> Address
    {
        let size = self.types[type_name]
            .fields
            .iter()
            .filter(|field| !field.is_static())
            .map(|field| field.address_in(Address::ZERO).value() + field.ty.size().max(8))
            .max()
            .unwrap_or(8);
        let object = self.alloc(size);
        self.set_hub(object, type_name);
        object
    }

    /// Point the header of `object` at the hub of `type_name`.
    pub fn set_hub(&mut self, object: Address, type_name: &str)
    {
        let hub = self.hub(type_name);
        self.write_u64(object, hub.value() | HUB_TAG);
    }

    pub fn new_array(&mut self, type_name: &str, element_size: u64, payload: &[u8]) -> Address
    {
        let length = payload.len() as u64 / element_size;
        let array = self.alloc(16 + payload.len() as u64);
        self.set_hub(array, type_name);
        self.write_i32(array + 8, i32::try_from(length).unwrap());
        if !payload.is_empty() {
            self.write(array + 16, payload);
        }
        array
    }

    pub fn new_int_array(&mut self, values: &[i32]) -> Address
    {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.new_array("int[]", 4, &payload)
    }

    pub fn new_object_array(&mut self, type_name: &str, elements: &[Address]) -> Address
    {
        let payload: Vec<u8> = elements.iter().flat_map(|a| a.value().to_le_bytes()).collect();
        self.new_array(type_name, 8, &payload)
    }

    pub fn new_string(&mut self, text: &str) -> Address
    {
        let payload: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let chars = self.new_array("char[]", 2, &payload);
        self.new_string_over(chars)
    }

    /// String object whose backing array is `chars`.
    pub fn new_string_over(&mut self, chars: Address) -> Address
    {
        let string = self.new_object(STRING_TYPE);
        self.write_u64(string + 8, chars.value());
        string
    }

    pub fn new_c_string(&mut self, bytes: &[u8]) -> Address
    {
        let address = self.alloc(bytes.len() as u64 + 1);
        self.write(address, bytes);
        address
    }

    pub fn set_variable(&mut self, name: &str, value: Value)
    {
        self.variables.insert(name.to_string(), value);
    }

    /// Bind `name` to a reference of static type `type_name`.
    pub fn set_reference(&mut self, name: &str, type_name: &str, address: Address)
    {
        self.set_variable(name, Value::Reference(ObjectHandle::new(address, type_name)));
    }

    pub fn set_symbol(&mut self, name: &str, address: Address)
    {
        self.symbols.insert(name.to_string(), address);
    }

    /// Raise `handle` on every memory read.
    pub fn trip_on_read(&mut self, handle: InterruptHandle)
    {
        self.trip = Some(handle);
    }
}

impl MemoryAccess for FakeTarget
{
    fn read_memory(&self, address: Address, buf: &mut [u8]) -> InspectResult<()>
    {
        self.reads.set(self.reads.get() + 1);
        if let Some(trip) = &self.trip {
            trip.interrupt();
        }
        let fault = InspectError::MemoryFault {
            address,
            length: buf.len(),
        };
        let Some((start, region)) = self.regions.range(..=address.value()).next_back() else {
            return Err(fault);
        };
        let offset = usize::try_from(address.value() - start).map_err(|_| fault.clone())?;
        let bytes = region.get(offset..offset + buf.len()).ok_or(fault)?;
        buf.copy_from_slice(bytes);
        Ok(())
    }
}

impl Target for FakeTarget
{
    fn lookup_type(&self, name: &str) -> Option<Arc<TypeDescriptor>>
    {
        self.types.get(name).cloned()
    }

    fn resolve_symbol_address(&self, name: &str) -> Option<Address>
    {
        self.symbols.get(name).copied()
    }

    fn lookup_variable(&self, name: &str) -> InspectResult<Value>
    {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| InspectError::Unresolved(name.to_string()))
    }

    fn frame_variable_names(&self) -> Vec<String>
    {
        self.frame_variables.clone()
    }

    fn static_variable_names(&self) -> Vec<String>
    {
        self.statics.clone()
    }

    fn function_listing(&self) -> Vec<String>
    {
        self.listing.clone()
    }
}

/// Register file of a frame about to be unwound.
#[derive(Default)]
pub struct FakeFrame
{
    registers: HashMap<Register, u64>,
}

impl FakeFrame
{
    pub fn new(sp: u64, pc: u64) -> Self
    {
        let mut registers = HashMap::new();
        registers.insert(gimli::X86_64::RSP, sp);
        registers.insert(gimli::X86_64::RA, pc);
        Self { registers }
    }
}

impl PendingFrame for FakeFrame
{
    fn read_register(&self, register: Register) -> InspectResult<u64>
    {
        self.registers
            .get(&register)
            .copied()
            .ok_or_else(|| InspectError::TypeMismatch(format!("no register {}", register.0)))
    }
}

fn header() -> FieldDescriptor
{
    FieldDescriptor::instance("__hub__", 0, ValueType::reference(CLASS_TYPE))
}

/// Type-signature string stored in the hub of `type_name`.
fn signature(type_name: &str) -> String
{
    let Some(element) = type_name.strip_suffix("[]") else {
        return type_name.to_string();
    };
    let element = match element {
        "boolean" => "Z".to_string(),
        "byte" => "B".to_string(),
        "char" => "C".to_string(),
        "short" => "S".to_string(),
        "int" => "I".to_string(),
        "long" => "J".to_string(),
        "float" => "F".to_string(),
        "double" => "D".to_string(),
        nested if nested.ends_with("[]") => signature(nested),
        class => format!("L{class};"),
    };
    format!("[{element}")
}
