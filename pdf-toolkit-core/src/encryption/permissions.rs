//! PDF permissions according to ISO 32000-1 Table 22

use bitflags::bitflags;

/// Bits that must be set in `/P` regardless of the granted permissions
/// (reserved bits 7-8 and 13-32).
const RESERVED_BITS: u32 = 0xFFFF_F0C0;

bitflags! {
    /// User access permissions stored in the `/P` entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        /// Print the document (bit 3)
        const PRINT = 1 << 2;
        /// Modify document contents (bit 4)
        const MODIFY_CONTENTS = 1 << 3;
        /// Copy text and graphics (bit 5)
        const COPY = 1 << 4;
        /// Add or modify annotations (bit 6)
        const MODIFY_ANNOTATIONS = 1 << 5;
        /// Fill in form fields (bit 9)
        const FILL_FORMS = 1 << 8;
        /// Extract for accessibility (bit 10)
        const ACCESSIBILITY = 1 << 9;
        /// Assemble the document (bit 11)
        const ASSEMBLE = 1 << 10;
        /// High quality print (bit 12)
        const PRINT_HIGH_QUALITY = 1 << 11;
    }
}

impl Permissions {
    /// Signed `/P` value with the reserved bits set
    pub fn to_p_value(self) -> i32 {
        (self.bits() | RESERVED_BITS) as i32
    }

    /// Permissions from a `/P` value; reserved bits are ignored
    pub fn from_p_value(p: i64) -> Self {
        Self::from_bits_truncate(p as u32)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}
