/*++

Licensed under the Apache-2.0 license.

File Name:

    otp.rs

Abstract:

    File contains API for the RP2350 OTP array: ECC and raw views, the
    bootrom write primitive, the emptiness check and page locking.

--*/

use crate::cprintln;
use mkek_error::{MkekError, MkekResult};

/// Number of rows in the OTP array.
pub const OTP_ROW_COUNT: u16 = 0x1000;

/// Rows covered by one lock page.
pub const OTP_ROWS_PER_PAGE: u16 = 0x40;

/// Number of lock pages.
pub const OTP_PAGE_COUNT: u8 = (OTP_ROW_COUNT / OTP_ROWS_PER_PAGE) as u8;

/// Significant bits of a row in the raw view (16 data bits plus ECC/BRBP).
pub const OTP_RAW_ROW_MASK: u32 = 0x00ff_ffff;

/// Largest payload accepted by a single write.
pub const OTP_MAX_WRITE_LEN: usize = 64;

/// ECC-corrected view, 16 bits per row.
pub const OTP_DATA_BASE: usize = 0x4013_0000;

/// Raw view, one 32-bit word per row.
pub const OTP_DATA_RAW_BASE: usize = 0x4013_4000;

/// OTP controller SW_LOCK0..SW_LOCK63, one register per page.
pub const OTP_SW_LOCK_BASE: usize = 0x4012_0000;

pub const OTP_DATA_CRIT1_ROW: u16 = 0x040;
pub const OTP_DATA_BOOT_FLAGS1_ROW: u16 = 0x04b;
pub const OTP_DATA_BOOTKEY0_0_ROW: u16 = 0x080;
pub const OTP_DATA_BOOTKEY_STRIDE: u16 = 0x10;
pub const OTP_DATA_PAGE0_LOCK0_ROW: u16 = 0xf80;
pub const OTP_DATA_PAGE1_LOCK1_ROW: u16 = 0xf83;
pub const OTP_DATA_PAGE2_LOCK1_ROW: u16 = 0xf85;

/// CRIT1 and its seven redundant copies.
pub const OTP_DATA_CRIT1_ROWS: [u16; 8] = [
    OTP_DATA_CRIT1_ROW,
    OTP_DATA_CRIT1_ROW + 1,
    OTP_DATA_CRIT1_ROW + 2,
    OTP_DATA_CRIT1_ROW + 3,
    OTP_DATA_CRIT1_ROW + 4,
    OTP_DATA_CRIT1_ROW + 5,
    OTP_DATA_CRIT1_ROW + 6,
    OTP_DATA_CRIT1_ROW + 7,
];

/// BOOT_FLAGS1 and its two redundant copies.
pub const OTP_DATA_BOOT_FLAGS1_ROWS: [u16; 3] = [
    OTP_DATA_BOOT_FLAGS1_ROW,
    OTP_DATA_BOOT_FLAGS1_ROW + 1,
    OTP_DATA_BOOT_FLAGS1_ROW + 2,
];

pub const OTP_CMD_ROW_BITS: u32 = 0x0000_ffff;
pub const OTP_CMD_WRITE_BITS: u32 = 0x0001_0000;
pub const OTP_CMD_ECC_BITS: u32 = 0x0002_0000;

/// LOCK1 value of a fully locked page: LOCK_NS and LOCK_BL inaccessible,
/// replicated in all three byte lanes.
pub const OTP_PAGE_LOCK_SENTINEL: u32 = 0x003c_3c3c;

/// SW_LOCK encoding that makes a page inaccessible to non-secure software
/// for the rest of the session.
pub const OTP_SW_LOCK_NSEC_INACCESSIBLE: u32 = 0b1100;

pub const BOOTROM_OK: i32 = 0;
pub const BOOTROM_ERROR_NOT_PERMITTED: i32 = -4;
pub const BOOTROM_ERROR_INVALID_ADDRESS: i32 = -10;
pub const BOOTROM_ERROR_BAD_ALIGNMENT: i32 = -11;
pub const BOOTROM_ERROR_UNSUPPORTED_MODIFICATION: i32 = -18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpWriteMode {
    /// 16 data bits per row, hardware ECC generated by the bootrom.
    Ecc,
    /// 24 bits per row written verbatim.
    Raw,
}

impl OtpWriteMode {
    /// Bytes consumed per row by this encoding.
    pub fn bytes_per_row(self) -> usize {
        match self {
            OtpWriteMode::Ecc => 2,
            OtpWriteMode::Raw => 4,
        }
    }
}

/// Command word passed to the bootrom OTP access routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpCmd(pub u32);

impl OtpCmd {
    pub fn write(row: u16, mode: OtpWriteMode) -> Self {
        let ecc = match mode {
            OtpWriteMode::Ecc => OTP_CMD_ECC_BITS,
            OtpWriteMode::Raw => 0,
        };
        Self(row as u32 | ecc | OTP_CMD_WRITE_BITS)
    }

    pub fn row(&self) -> u16 {
        (self.0 & OTP_CMD_ROW_BITS) as u16
    }

    pub fn is_write(&self) -> bool {
        self.0 & OTP_CMD_WRITE_BITS != 0
    }

    pub fn mode(&self) -> OtpWriteMode {
        if self.0 & OTP_CMD_ECC_BITS != 0 {
            OtpWriteMode::Ecc
        } else {
            OtpWriteMode::Raw
        }
    }
}

/// Hardware access used by the [`Otp`] driver.
///
/// Implementations alias the OTP array and the bootrom routine; they own no
/// data. Arguments are validated by the driver before any call.
pub trait OtpAccess {
    /// Reads `buf.len()` bytes from the ECC view starting at `row`.
    fn read_ecc(&self, row: u16, buf: &mut [u8]);

    /// Reads the raw-view word backing `row`.
    fn read_raw(&self, row: u16) -> u32;

    /// Runs the bootrom OTP access routine and returns its status code.
    fn program(&mut self, cmd: OtpCmd, data: &[u8]) -> i32;

    /// Writes the SW_LOCK register of `page`.
    fn write_sw_lock(&mut self, page: u8, value: u32);
}

/// Returns true iff every byte of `buffer` is 0x00.
pub fn is_empty_buffer(buffer: &[u8]) -> bool {
    buffer.iter().all(|&b| b == 0x00)
}

/// Lock page containing `row`.
pub fn page_of(row: u16) -> u8 {
    (row / OTP_ROWS_PER_PAGE) as u8
}

/// Returns the (LOCK0, LOCK1) rows describing `page`.
pub fn page_lock_rows(page: u8) -> (u16, u16) {
    let lock0 = OTP_DATA_PAGE0_LOCK0_ROW + page as u16 * 2;
    (lock0, lock0 + 1)
}

pub struct Otp<A: OtpAccess> {
    access: A,
}

impl<A: OtpAccess> Otp<A> {
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

    fn check_rows(row: u16, rows: usize) -> MkekResult<()> {
        if row as usize + rows > OTP_ROW_COUNT as usize {
            return Err(MkekError::DRIVER_OTP_INVALID_ROW);
        }
        Ok(())
    }

    /// Read `buf.len()` bytes from the ECC view starting at `row`.
    pub fn read_ecc(&self, row: u16, buf: &mut [u8]) -> MkekResult<()> {
        Self::check_rows(row, buf.len().div_ceil(2))?;
        self.access.read_ecc(row, buf);
        Ok(())
    }

    /// Copy `N` bytes out of the ECC view starting at `row`.
    pub fn ecc_bytes<const N: usize>(&self, row: u16) -> MkekResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_ecc(row, &mut buf)?;
        Ok(buf)
    }

    /// Raw-view word of `row`, limited to its significant bits.
    pub fn raw_word(&self, row: u16) -> MkekResult<u32> {
        Self::check_rows(row, 1)?;
        Ok(self.access.read_raw(row) & OTP_RAW_ROW_MASK)
    }

    /// Returns true if the `len` bytes of the ECC view starting at `row` are
    /// all zero.
    ///
    /// Only meaningful before the first write: a range that ever held data
    /// never reads blank again. An out-of-range request reports not-empty so
    /// that no write follows it.
    pub fn is_empty(&self, row: u16, len: usize) -> bool {
        if Self::check_rows(row, len.div_ceil(2)).is_err() {
            cprintln!("[otp] Emptiness check outside the OTP array at row 0x{:x}", row);
            return false;
        }
        let mut chunk = [0u8; 2];
        let mut remaining = len;
        let mut cur = row;
        while remaining > 0 {
            let n = remaining.min(chunk.len());
            self.access.read_ecc(cur, &mut chunk[..n]);
            if !is_empty_buffer(&chunk[..n]) {
                return false;
            }
            remaining -= n;
            cur += 1;
        }
        true
    }

    fn write_data_mode(&mut self, row: u16, data: &[u8], mode: OtpWriteMode) -> MkekResult<()> {
        let per_row = mode.bytes_per_row();
        if data.is_empty() || data.len() % per_row != 0 || data.len() > OTP_MAX_WRITE_LEN {
            cprintln!("[otp] Invalid write length {} at row 0x{:x}", data.len(), row);
            return Err(MkekError::DRIVER_OTP_INVALID_LENGTH);
        }
        Self::check_rows(row, data.len() / per_row)?;

        let ret = self.access.program(OtpCmd::write(row, mode), data);
        if ret != BOOTROM_OK {
            cprintln!("[otp] OTP Write failed with error: {}", ret);
            return Err(MkekError::DRIVER_OTP_WRITE_FAILED);
        }
        Ok(())
    }

    /// Write `data` through the ECC path, two bytes per row.
    pub fn write_data(&mut self, row: u16, data: &[u8]) -> MkekResult<()> {
        self.write_data_mode(row, data, OtpWriteMode::Ecc)
    }

    /// Write `data` through the raw path, four bytes per row.
    pub fn write_data_raw(&mut self, row: u16, data: &[u8]) -> MkekResult<()> {
        self.write_data_mode(row, data, OtpWriteMode::Raw)
    }

    /// Returns true if the LOCK1 row of `page` already carries the lock
    /// sentinel in all three byte lanes.
    ///
    /// Reads the 24-bit raw word of LOCK1, whose lanes are the redundant
    /// copies of the same byte. LOCK0 and the ECC view of the row are not
    /// consulted.
    pub fn is_locked_page(&self, page: u8) -> MkekResult<bool> {
        if page >= OTP_PAGE_COUNT {
            return Err(MkekError::DRIVER_OTP_INVALID_PAGE);
        }
        let (_, lock1) = page_lock_rows(page);
        let value = self.raw_word(lock1)?;
        Ok(value & OTP_PAGE_LOCK_SENTINEL == OTP_PAGE_LOCK_SENTINEL)
    }

    /// Permanently lock `page` and restrict it for the current session.
    ///
    /// The sentinel is only written when it is not present yet. The SW_LOCK
    /// register is volatile and is set on every call, including when the
    /// sentinel write fails.
    pub fn lock_page(&mut self, page: u8) -> MkekResult<()> {
        if page >= OTP_PAGE_COUNT {
            return Err(MkekError::DRIVER_OTP_INVALID_PAGE);
        }

        let mut result = Ok(());
        if !self.is_locked_page(page)? {
            let (_, lock1) = page_lock_rows(page);
            cprintln!("[otp] Locking page {}", page);
            let value = self.raw_word(lock1)? | OTP_PAGE_LOCK_SENTINEL;
            result = self.write_data_raw(lock1, &value.to_le_bytes());
        }

        self.access.write_sw_lock(page, OTP_SW_LOCK_NSEC_INACCESSIBLE);
        result
    }
}

#[cfg(feature = "rp2350")]
mod rp2350 {
    use super::*;
    use core::ptr::{read_volatile, write_volatile};

    /// 16-bit pointer to the bootrom table lookup function (Arm).
    const ROM_TABLE_LOOKUP_PTR: usize = 0x0000_0016;
    const RT_FLAG_FUNC_ARM_SEC: u32 = 0x0004;
    const ROM_FUNC_OTP_ACCESS: u32 = rom_table_code(b'O', b'A');

    const fn rom_table_code(c1: u8, c2: u8) -> u32 {
        (c1 as u32) | ((c2 as u32) << 8)
    }

    type RomTableLookupFn = unsafe extern "C" fn(code: u32, mask: u32) -> usize;
    type RomOtpAccessFn = unsafe extern "C" fn(buf: *mut u8, buf_len: u32, cmd: u32) -> i32;

    #[repr(C, align(4))]
    struct WordAligned([u8; OTP_MAX_WRITE_LEN]);

    /// OTP access on RP2350 hardware running in secure mode.
    pub struct Rp2350Otp {
        otp_access: RomOtpAccessFn,
    }

    impl Rp2350Otp {
        /// Resolve the bootrom OTP access routine.
        ///
        /// # Safety
        ///
        /// Must run on an RP2350 in secure mode, and at most one instance may
        /// exist at a time.
        pub unsafe fn new() -> MkekResult<Self> {
            let lookup_addr = read_volatile(ROM_TABLE_LOOKUP_PTR as *const u16) as usize;
            let lookup = core::mem::transmute::<usize, RomTableLookupFn>(lookup_addr);
            let func = lookup(ROM_FUNC_OTP_ACCESS, RT_FLAG_FUNC_ARM_SEC);
            if func == 0 {
                cprintln!("[otp] Bootrom OTP access routine not found");
                return Err(MkekError::DRIVER_OTP_ACCESS_UNAVAILABLE);
            }
            Ok(Self {
                otp_access: core::mem::transmute::<usize, RomOtpAccessFn>(func),
            })
        }
    }

    impl OtpAccess for Rp2350Otp {
        fn read_ecc(&self, row: u16, buf: &mut [u8]) {
            for (i, chunk) in buf.chunks_mut(2).enumerate() {
                let addr = OTP_DATA_BASE + (row as usize + i) * 2;
                let value = unsafe { read_volatile(addr as *const u16) };
                chunk.copy_from_slice(&value.to_le_bytes()[..chunk.len()]);
            }
        }

        fn read_raw(&self, row: u16) -> u32 {
            let addr = OTP_DATA_RAW_BASE + row as usize * 4;
            unsafe { read_volatile(addr as *const u32) }
        }

        fn program(&mut self, cmd: OtpCmd, data: &[u8]) -> i32 {
            // The bootrom requires a word-aligned buffer.
            let mut buf = WordAligned([0u8; OTP_MAX_WRITE_LEN]);
            buf.0[..data.len()].copy_from_slice(data);
            unsafe { (self.otp_access)(buf.0.as_mut_ptr(), data.len() as u32, cmd.0) }
        }

        fn write_sw_lock(&mut self, page: u8, value: u32) {
            let addr = OTP_SW_LOCK_BASE + page as usize * 4;
            unsafe { write_volatile(addr as *mut u32, value) }
        }
    }
}

#[cfg(feature = "rp2350")]
pub use rp2350::Rp2350Otp;
