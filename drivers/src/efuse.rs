/*++

Licensed under the Apache-2.0 license.

File Name:

    efuse.rs

Abstract:

    File contains API for ESP32 eFuse key blocks.

--*/

use crate::cprintln;
use mkek_error::{MkekError, MkekResult};

/// Size of a key block in bytes.
pub const EFUSE_KEY_BLOCK_SIZE: usize = 32;

pub const ESP_OK: i32 = 0;
pub const ESP_FAIL: i32 = -1;
pub const ESP_ERR_INVALID_ARG: i32 = 0x102;
pub const ESP_ERR_INVALID_STATE: i32 = 0x103;
pub const ESP_ERR_EFUSE: i32 = 0x1600;

/// eFuse key blocks, numbered as `esp_efuse_block_t`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfuseBlock {
    Key0 = 4,
    Key1 = 5,
    Key2 = 6,
    Key3 = 7,
    Key4 = 8,
    Key5 = 9,
}

impl EfuseBlock {
    /// Position among the key blocks, starting at 0 for `Key0`.
    pub fn key_index(self) -> usize {
        self as usize - EfuseBlock::Key0 as usize
    }
}

impl From<EfuseBlock> for u32 {
    fn from(value: EfuseBlock) -> Self {
        value as u32
    }
}

/// Key purposes, numbered as `esp_efuse_purpose_t`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    User = 0,
    Reserved = 1,
    XtsAes256Key1 = 2,
    XtsAes256Key2 = 3,
    XtsAes128Key = 4,
    HmacDownAll = 5,
    HmacDownJtag = 6,
    HmacDownDigitalSignature = 7,
    HmacUp = 8,
    SecureBootDigest0 = 9,
    SecureBootDigest1 = 10,
    SecureBootDigest2 = 11,
}

impl From<KeyPurpose> for u32 {
    fn from(value: KeyPurpose) -> Self {
        value as u32
    }
}

/// Hardware access used by the [`Efuse`] driver. Every call returns an
/// `esp_err_t` status.
pub trait EfuseAccess {
    /// True if the block has purpose USER, no write/read protection and all
    /// bits unprogrammed.
    fn key_block_unused(&self, block: EfuseBlock) -> bool;

    fn write_key(&mut self, block: EfuseBlock, purpose: KeyPurpose, key: &[u8]) -> i32;

    fn set_key_dis_write(&mut self, block: EfuseBlock) -> i32;

    fn set_keypurpose_dis_write(&mut self, block: EfuseBlock) -> i32;

    fn get_key_dis_write(&self, block: EfuseBlock) -> bool;

    fn get_keypurpose_dis_write(&self, block: EfuseBlock) -> bool;

    /// Reads `out.len()` bytes of the key field of `block`.
    fn read_key(&self, block: EfuseBlock, out: &mut [u8]) -> i32;
}

pub struct Efuse<A: EfuseAccess> {
    access: A,
}

impl<A: EfuseAccess> Efuse<A> {
    pub fn new(access: A) -> Self {
        Self { access }
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut A {
        &mut self.access
    }

    pub fn into_inner(self) -> A {
        self.access
    }

    pub fn key_block_unused(&self, block: EfuseBlock) -> bool {
        self.access.key_block_unused(block)
    }

    /// Program `key` into `block` with the given purpose.
    pub fn write_key(
        &mut self,
        block: EfuseBlock,
        purpose: KeyPurpose,
        key: &[u8],
    ) -> MkekResult<()> {
        let ret = self.access.write_key(block, purpose, key);
        if ret != ESP_OK {
            cprintln!("[efuse] Error writing key block {} [{}]", block as u32, ret);
            return Err(MkekError::DRIVER_EFUSE_WRITE_KEY_FAILED);
        }
        Ok(())
    }

    /// True once the key value of `block` is write-protected.
    pub fn key_dis_write(&self, block: EfuseBlock) -> bool {
        self.access.get_key_dis_write(block)
    }

    /// True once the key purpose of `block` is write-protected.
    pub fn keypurpose_dis_write(&self, block: EfuseBlock) -> bool {
        self.access.get_keypurpose_dis_write(block)
    }

    /// Disable further writes to the key value of `block`.
    pub fn set_key_dis_write(&mut self, block: EfuseBlock) -> MkekResult<()> {
        let ret = self.access.set_key_dis_write(block);
        if ret != ESP_OK {
            cprintln!(
                "[efuse] Error setting key block {} to read only [{}]",
                block as u32,
                ret
            );
            return Err(MkekError::DRIVER_EFUSE_KEY_DIS_WRITE_FAILED);
        }
        Ok(())
    }

    /// Disable further changes to the key purpose of `block`.
    pub fn set_keypurpose_dis_write(&mut self, block: EfuseBlock) -> MkekResult<()> {
        let ret = self.access.set_keypurpose_dis_write(block);
        if ret != ESP_OK {
            cprintln!(
                "[efuse] Error setting key block {} purpose to read only [{}]",
                block as u32,
                ret
            );
            return Err(MkekError::DRIVER_EFUSE_KEYPURPOSE_DIS_WRITE_FAILED);
        }
        Ok(())
    }

    /// Read the key field of `block` into `out`.
    pub fn read_key(&self, block: EfuseBlock, out: &mut [u8]) -> MkekResult<()> {
        let ret = self.access.read_key(block, out);
        if ret != ESP_OK {
            cprintln!("[efuse] Error reading key block {} [{}]", block as u32, ret);
            return Err(MkekError::DRIVER_EFUSE_READ_KEY_FAILED);
        }
        Ok(())
    }
}

#[cfg(feature = "esp32")]
mod esp_idf {
    use super::*;
    use core::ffi::c_void;

    /// Opaque `esp_efuse_desc_t`.
    #[repr(C)]
    struct EspEfuseDesc {
        _private: [u8; 0],
    }

    extern "C" {
        fn esp_efuse_key_block_unused(block: u32) -> bool;
        fn esp_efuse_write_key(
            block: u32,
            purpose: u32,
            key: *const c_void,
            key_size_bytes: usize,
        ) -> i32;
        fn esp_efuse_set_key_dis_write(block: u32) -> i32;
        fn esp_efuse_set_keypurpose_dis_write(block: u32) -> i32;
        fn esp_efuse_get_key_dis_write(block: u32) -> bool;
        fn esp_efuse_get_keypurpose_dis_write(block: u32) -> bool;
        fn esp_efuse_get_key(block: u32) -> *const *const EspEfuseDesc;
        fn esp_efuse_read_field_blob(
            field: *const *const EspEfuseDesc,
            dst: *mut c_void,
            dst_size_bits: usize,
        ) -> i32;
    }

    /// eFuse access through the ESP-IDF eFuse component.
    #[derive(Default)]
    pub struct EspIdfEfuse;

    impl EfuseAccess for EspIdfEfuse {
        fn key_block_unused(&self, block: EfuseBlock) -> bool {
            unsafe { esp_efuse_key_block_unused(block.into()) }
        }

        fn write_key(&mut self, block: EfuseBlock, purpose: KeyPurpose, key: &[u8]) -> i32 {
            unsafe {
                esp_efuse_write_key(
                    block.into(),
                    purpose.into(),
                    key.as_ptr() as *const c_void,
                    key.len(),
                )
            }
        }

        fn set_key_dis_write(&mut self, block: EfuseBlock) -> i32 {
            unsafe { esp_efuse_set_key_dis_write(block.into()) }
        }

        fn set_keypurpose_dis_write(&mut self, block: EfuseBlock) -> i32 {
            unsafe { esp_efuse_set_keypurpose_dis_write(block.into()) }
        }

        fn get_key_dis_write(&self, block: EfuseBlock) -> bool {
            unsafe { esp_efuse_get_key_dis_write(block.into()) }
        }

        fn get_keypurpose_dis_write(&self, block: EfuseBlock) -> bool {
            unsafe { esp_efuse_get_keypurpose_dis_write(block.into()) }
        }

        fn read_key(&self, block: EfuseBlock, out: &mut [u8]) -> i32 {
            let desc = unsafe { esp_efuse_get_key(block.into()) };
            if desc.is_null() {
                cprintln!("[efuse] No field descriptor for block {}", block as u32);
                return ESP_FAIL;
            }
            unsafe {
                esp_efuse_read_field_blob(desc, out.as_mut_ptr() as *mut c_void, out.len() * 8)
            }
        }
    }
}

#[cfg(feature = "esp32")]
pub use esp_idf::EspIdfEfuse;
