/*++

Licensed under the Apache-2.0 license.

File Name:

    otp_flags.rs

Abstract:

    File contains bit definitions of the RP2350 boot configuration rows.

--*/

/// Number of boot key slots.
pub const BOOTKEY_SLOT_COUNT: u8 = 4;

bitflags::bitflags! {
    /// CRIT1 row (RBIT-8: replicated across eight rows).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Crit1Flags : u32 {
        const SECURE_BOOT_ENABLE = 1 << 0;
        const SECURE_DEBUG_DISABLE = 1 << 1;
        const DEBUG_DISABLE = 1 << 2;
        const BOOT_ARCH = 1 << 3;
        const GLITCH_DETECTOR_ENABLE = 1 << 4;
        /// Two-bit sensitivity field, both bits set is the maximum.
        const GLITCH_DETECTOR_SENS = 0b11 << 5;
    }
}

bitflags::bitflags! {
    /// BOOT_FLAGS1 row (RBIT-3: replicated across three rows).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BootFlags1 : u32 {
        const KEY_VALID = 0xf;
        const KEY_INVALID = 0xf << 8;
    }
}

impl BootFlags1 {
    /// Marks boot key `index` as valid.
    pub fn key_valid(index: u8) -> Self {
        Self::from_bits_truncate(1 << (index % BOOTKEY_SLOT_COUNT))
    }

    /// Revokes every boot key slot except `index`.
    pub fn key_invalid_except(index: u8) -> Self {
        let others = 0xf & !(1u32 << (index % BOOTKEY_SLOT_COUNT));
        Self::from_bits_truncate(others << 8)
    }
}

bitflags::bitflags! {
    /// Low byte of a PAGEn_LOCK1 row. The byte is replicated in all three
    /// lanes of the raw row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageLock1 : u8 {
        const LOCK_S = 0b11;
        const LOCK_NS = 0b11 << 2;
        const LOCK_BL = 0b11 << 4;
    }
}

impl PageLock1 {
    const LOCK_VALUE_READ_ONLY: u8 = 1;

    /// Bootloader access restricted to read-only.
    pub fn bootloader_read_only() -> Self {
        Self::from_bits_truncate(Self::LOCK_VALUE_READ_ONLY << 4)
    }

    /// The flags replicated across the three byte lanes of a raw row.
    pub fn replicated(self) -> u32 {
        let b = self.bits() as u32;
        b | (b << 8) | (b << 16)
    }
}
