/*++

Licensed under the Apache-2.0 license.

File Name:

    config.rs

Abstract:

    File contains the compile-time provisioning configuration and the
    fixed storage layout.

--*/

use mkek_drivers::{
    EfuseBlock, KeyPurpose, BOOTKEY_SLOT_COUNT, OTP_DATA_BOOTKEY0_0_ROW, OTP_DATA_BOOTKEY_STRIDE,
};

/// First ECC row of the MKEK (page 59).
pub const OTP_MKEK_ROW: u16 = 0xef0;

/// eFuse key block holding the MKEK.
pub const MKEK_EFUSE_BLOCK: EfuseBlock = EfuseBlock::Key3;

pub const MKEK_EFUSE_PURPOSE: KeyPurpose = KeyPurpose::User;

/// Hash of the boot public key installed in the configured boot key slot.
pub const BOOTKEY: [u8; 32] = [
    0xe1, 0xd1, 0x6b, 0xa7, 0x64, 0xab, 0xd7, 0x12, 0xd4, 0xef, 0x6e, 0x3e, 0xdd, 0x74, 0x4e, 0xd5,
    0x63, 0x8c, 0x26, 0x0b, 0x77, 0x1c, 0xf9, 0x81, 0x51, 0x11, 0x0b, 0xaf, 0xac, 0x9b, 0xc8, 0x71,
];

/// Boot key slot selected with `MKEK_BOOTKEY_INDEX` at build time.
pub const BOOTKEY_INDEX: u8 = match option_env!("MKEK_BOOTKEY_INDEX") {
    Some(value) => parse_bootkey_index(value),
    None => 0,
};

const fn parse_bootkey_index(value: &str) -> u8 {
    let bytes = value.as_bytes();
    if bytes.len() != 1 || bytes[0] < b'0' || bytes[0] - b'0' >= BOOTKEY_SLOT_COUNT {
        panic!("MKEK_BOOTKEY_INDEX must be 0, 1, 2 or 3");
    }
    bytes[0] - b'0'
}

/// Secure-boot provisioning switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecureBootConfig {
    /// Write the boot key, the key-valid flag and SECURE_BOOT_ENABLE.
    pub enabled: bool,

    /// Also revoke the other boot keys, disable debug, arm the glitch
    /// detector at maximum sensitivity and make the bootloader pages
    /// read-only.
    pub strict_lock: bool,

    pub bootkey_index: u8,
}

impl SecureBootConfig {
    pub const DISABLED: Self = Self {
        enabled: false,
        strict_lock: false,
        bootkey_index: 0,
    };

    /// The configuration selected by the `secure-boot`/`secure-boot-lock`
    /// features and `MKEK_BOOTKEY_INDEX`.
    pub const BUILD: Self = match Self::new(
        cfg!(feature = "secure-boot"),
        cfg!(feature = "secure-boot-lock"),
        BOOTKEY_INDEX,
    ) {
        Some(config) => config,
        None => panic!("invalid secure-boot configuration"),
    };

    /// Returns `None` if strict lock is requested without secure boot, or
    /// if the boot key index is out of range.
    pub const fn new(enabled: bool, strict_lock: bool, bootkey_index: u8) -> Option<Self> {
        if (strict_lock && !enabled) || bootkey_index >= BOOTKEY_SLOT_COUNT {
            return None;
        }
        Some(Self {
            enabled,
            strict_lock,
            bootkey_index,
        })
    }

    /// First row of the selected boot key slot.
    pub const fn bootkey_row(&self) -> u16 {
        OTP_DATA_BOOTKEY0_0_ROW + self.bootkey_index as u16 * OTP_DATA_BOOTKEY_STRIDE
    }
}

impl Default for SecureBootConfig {
    fn default() -> Self {
        Self::BUILD
    }
}
