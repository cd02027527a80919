/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the error type shared by the OTP provisioning crates.

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// Provisioning Error Type
///
/// The upper half-word identifies the component, the lower half-word the
/// condition within that component.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MkekError(pub NonZeroU32);

/// Macro to define error constants ensuring uniqueness
///
/// Takes a list of (name, value, doc) tuples and generates a constant for
/// each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: MkekError = MkekError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(&'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl MkekError {
    /// Create an error from a const context. Use `MkekError::try_from()` for
    /// runtime values.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("MkekError cannot be 0"),
        }
    }

    /// Component identifier (upper half-word).
    pub fn component(&self) -> u16 {
        (self.0.get() >> 16) as u16
    }

    define_error_constants![
        (
            DRIVER_OTP_WRITE_FAILED,
            0x0001_0001,
            "OTP Error: bootrom OTP access routine reported a write failure"
        ),
        (
            DRIVER_OTP_INVALID_ROW,
            0x0001_0002,
            "OTP Error: row is outside the OTP array"
        ),
        (
            DRIVER_OTP_INVALID_LENGTH,
            0x0001_0003,
            "OTP Error: write length does not match the row encoding"
        ),
        (
            DRIVER_OTP_INVALID_PAGE,
            0x0001_0004,
            "OTP Error: page is outside the OTP array"
        ),
        (
            DRIVER_OTP_ACCESS_UNAVAILABLE,
            0x0001_0005,
            "OTP Error: bootrom OTP access routine not found"
        ),
        (
            DRIVER_EFUSE_WRITE_KEY_FAILED,
            0x0002_0001,
            "eFuse Error: writing the key block failed"
        ),
        (
            DRIVER_EFUSE_KEY_DIS_WRITE_FAILED,
            0x0002_0002,
            "eFuse Error: disabling writes to the key block failed"
        ),
        (
            DRIVER_EFUSE_KEYPURPOSE_DIS_WRITE_FAILED,
            0x0002_0003,
            "eFuse Error: disabling writes to the key purpose failed"
        ),
        (
            DRIVER_EFUSE_READ_KEY_FAILED,
            0x0002_0004,
            "eFuse Error: reading the key block failed"
        ),
        (
            PROV_MKEK_READBACK_MISMATCH,
            0x0003_0001,
            "Provisioning Error: key read back differs from the key written"
        ),
        (
            PROV_MKEK_ALREADY_PUBLISHED,
            0x0003_0002,
            "Provisioning Error: key handle was already published"
        ),
        (
            PROV_MKEK_NOT_PROVISIONED,
            0x0003_0003,
            "Provisioning Error: key slot is still blank after provisioning"
        ),
    ];
}

impl From<core::num::NonZeroU32> for crate::MkekError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::MkekError(val)
    }
}

impl From<MkekError> for core::num::NonZeroU32 {
    fn from(val: MkekError) -> Self {
        val.0
    }
}

impl From<MkekError> for u32 {
    fn from(val: MkekError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for MkekError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(MkekError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type MkekResult<T> = Result<T, MkekError>;
