//! Target address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed address in the inspected process
///
/// Keeps addresses apart from sizes, ordinals and register payloads. Every
/// address handled by the core points into the target, never into the
/// inspector's own memory.
///
/// ## Tag bits
///
/// Object headers store the hub pointer with tag bits in its low three bits.
/// [`Address::untagged`] strips them before the value is used as a pointer.
///
/// ## Example
///
/// ```rust
/// use svmprobe_core::types::Address;
///
/// let hub = Address::from(0x7f00_1003);
/// assert_eq!(hub.untagged(), Address::from(0x7f00_1000));
/// assert_eq!((hub.untagged() + 0x10).value(), 0x7f00_1010);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// A managed reference with this value is the `null` literal and is never
    /// dereferenced.
    pub const ZERO: Self = Address(0);

    /// Low bits of a hub pointer reserved for header tags.
    pub const TAG_MASK: u64 = 0b111;

    /// Create a new address from a `u64` value (usable in const contexts).
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// `true` for the null address.
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Clear the header tag bits.
    #[must_use]
    pub const fn untagged(self) -> Self
    {
        Address(self.0 & !Self::TAG_MASK)
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use svmprobe_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Subtract an offset from this address, checking for underflow
    pub fn checked_sub(self, offset: u64) -> Option<Self>
    {
        self.0.checked_sub(offset).map(Address)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
