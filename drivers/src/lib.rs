/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the OTP provisioning driver library.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

pub mod printer;

mod efuse;
mod key;
mod otp;
mod otp_flags;
mod rng;

pub use efuse::{
    Efuse, EfuseAccess, EfuseBlock, KeyPurpose, EFUSE_KEY_BLOCK_SIZE, ESP_ERR_EFUSE,
    ESP_ERR_INVALID_ARG, ESP_ERR_INVALID_STATE, ESP_FAIL, ESP_OK,
};
pub use key::{KeyCell, MkekKey, MKEK_SIZE};
pub use mkek_error::{MkekError, MkekResult};
pub use otp::{
    is_empty_buffer, page_lock_rows, page_of, Otp, OtpAccess, OtpCmd, OtpWriteMode,
    BOOTROM_ERROR_BAD_ALIGNMENT, BOOTROM_ERROR_INVALID_ADDRESS, BOOTROM_ERROR_NOT_PERMITTED,
    BOOTROM_ERROR_UNSUPPORTED_MODIFICATION, BOOTROM_OK, OTP_CMD_ECC_BITS, OTP_CMD_ROW_BITS,
    OTP_CMD_WRITE_BITS, OTP_DATA_BASE, OTP_DATA_BOOTKEY0_0_ROW, OTP_DATA_BOOTKEY_STRIDE,
    OTP_DATA_BOOT_FLAGS1_ROW, OTP_DATA_BOOT_FLAGS1_ROWS, OTP_DATA_CRIT1_ROW, OTP_DATA_CRIT1_ROWS,
    OTP_DATA_PAGE0_LOCK0_ROW, OTP_DATA_PAGE1_LOCK1_ROW, OTP_DATA_PAGE2_LOCK1_ROW, OTP_DATA_RAW_BASE,
    OTP_MAX_WRITE_LEN, OTP_PAGE_COUNT, OTP_PAGE_LOCK_SENTINEL, OTP_RAW_ROW_MASK, OTP_ROWS_PER_PAGE,
    OTP_ROW_COUNT, OTP_SW_LOCK_BASE, OTP_SW_LOCK_NSEC_INACCESSIBLE,
};
pub use otp_flags::{BootFlags1, Crit1Flags, PageLock1, BOOTKEY_SLOT_COUNT};
pub use rng::{GetrandomSource, RandomSource};

cfg_if::cfg_if! {
    if #[cfg(feature = "rp2350")] {
        pub use otp::Rp2350Otp;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "esp32")] {
        pub use efuse::EspIdfEfuse;
    }
}
