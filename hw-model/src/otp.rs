// Licensed under the Apache-2.0 license

use mkek_drivers::{
    page_lock_rows, page_of, OtpAccess, OtpCmd, OtpWriteMode, BOOTROM_ERROR_BAD_ALIGNMENT,
    BOOTROM_ERROR_INVALID_ADDRESS, BOOTROM_ERROR_NOT_PERMITTED,
    BOOTROM_ERROR_UNSUPPORTED_MODIFICATION, BOOTROM_OK, OTP_PAGE_COUNT, OTP_RAW_ROW_MASK,
    OTP_ROW_COUNT,
};

/// One call into the simulated bootrom OTP access routine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpWrite {
    pub row: u16,
    pub mode: OtpWriteMode,
    pub data: Vec<u8>,
    pub status: i32,
}

/// Simulated RP2350 OTP array.
///
/// Rows hold 24 raw bits. Programming can only set bits: any write that
/// would clear a programmed bit is refused, as is any write into a page
/// whose LOCK1 row restricts non-secure access (the page lock sentinel).
/// The ECC view returns the low 16 bits of each row.
pub struct SimOtp {
    rows: Vec<u32>,
    sw_lock: [u32; OTP_PAGE_COUNT as usize],
    sw_lock_writes: Vec<(u8, u32)>,
    journal: Vec<OtpWrite>,
    fail_next: Option<i32>,
}

impl Default for SimOtp {
    fn default() -> Self {
        Self::new()
    }
}

/// Check bits stored above the 16 data bits of an ECC row.
fn ecc_check_bits(data: u16) -> u32 {
    let d = data as u32;
    let mut ecc = 0;
    for bit in 0..6 {
        let mut parity = 0;
        for i in 0..16 {
            if (i + 1) & (1 << bit) != 0 {
                parity ^= (d >> i) & 1;
            }
        }
        ecc |= parity << bit;
    }
    ecc << 16
}

fn ecc_row_value(data: u16) -> u32 {
    data as u32 | ecc_check_bits(data)
}

impl SimOtp {
    /// A blank OTP array.
    pub fn new() -> Self {
        Self {
            rows: vec![0; OTP_ROW_COUNT as usize],
            sw_lock: [0; OTP_PAGE_COUNT as usize],
            sw_lock_writes: Vec::new(),
            journal: Vec::new(),
            fail_next: None,
        }
    }

    /// Preload `data` at `row` as if written through the ECC path.
    pub fn with_ecc_data(mut self, row: u16, data: &[u8]) -> Self {
        for (i, chunk) in data.chunks(2).enumerate() {
            let mut word = [0u8; 2];
            word[..chunk.len()].copy_from_slice(chunk);
            self.rows[row as usize + i] = ecc_row_value(u16::from_le_bytes(word));
        }
        self
    }

    /// Preload a raw row value.
    pub fn with_raw(mut self, row: u16, value: u32) -> Self {
        self.rows[row as usize] = value & OTP_RAW_ROW_MASK;
        self
    }

    /// Make the next programming call fail with `status` without touching
    /// the array.
    pub fn fail_next_write(&mut self, status: i32) {
        self.fail_next = Some(status);
    }

    pub fn raw_row(&self, row: u16) -> u32 {
        self.rows[row as usize]
    }

    pub fn ecc_data(&self, row: u16, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.read_ecc(row, &mut buf);
        buf
    }

    pub fn sw_lock(&self, page: u8) -> u32 {
        self.sw_lock[page as usize]
    }

    pub fn sw_lock_writes(&self) -> &[(u8, u32)] {
        &self.sw_lock_writes
    }

    /// Every programming call, accepted or refused, in order.
    pub fn journal(&self) -> &[OtpWrite] {
        &self.journal
    }

    /// Programming calls that targeted `row` as their first row.
    pub fn writes_to(&self, row: u16) -> Vec<&OtpWrite> {
        self.journal.iter().filter(|w| w.row == row).collect()
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
        self.sw_lock_writes.clear();
    }

    /// True if `page` refuses writes.
    pub fn page_write_locked(&self, page: u8) -> bool {
        let (_, lock1) = page_lock_rows(page);
        self.rows[lock1 as usize] & 0x0c != 0
    }

    fn apply(&mut self, cmd: OtpCmd, data: &[u8]) -> i32 {
        let mode = cmd.mode();
        let per_row = mode.bytes_per_row();
        if data.len() % per_row != 0 {
            return BOOTROM_ERROR_BAD_ALIGNMENT;
        }
        let first = cmd.row() as usize;
        let count = data.len() / per_row;
        if first + count > self.rows.len() {
            return BOOTROM_ERROR_INVALID_ADDRESS;
        }

        let mut values = Vec::with_capacity(count);
        for (i, chunk) in data.chunks(per_row).enumerate() {
            let row = (first + i) as u16;
            if self.page_write_locked(page_of(row)) {
                return BOOTROM_ERROR_NOT_PERMITTED;
            }
            let value = match mode {
                OtpWriteMode::Ecc => ecc_row_value(u16::from_le_bytes([chunk[0], chunk[1]])),
                OtpWriteMode::Raw => {
                    u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) & OTP_RAW_ROW_MASK
                }
            };
            if self.rows[row as usize] & !value != 0 {
                return BOOTROM_ERROR_UNSUPPORTED_MODIFICATION;
            }
            values.push(value);
        }

        self.rows[first..first + count].copy_from_slice(&values);
        BOOTROM_OK
    }
}

impl OtpAccess for SimOtp {
    fn read_ecc(&self, row: u16, buf: &mut [u8]) {
        for (i, chunk) in buf.chunks_mut(2).enumerate() {
            let data = (self.rows[row as usize + i] & 0xffff) as u16;
            chunk.copy_from_slice(&data.to_le_bytes()[..chunk.len()]);
        }
    }

    fn read_raw(&self, row: u16) -> u32 {
        self.rows[row as usize]
    }

    fn program(&mut self, cmd: OtpCmd, data: &[u8]) -> i32 {
        let status = match self.fail_next.take() {
            Some(status) => status,
            None => self.apply(cmd, data),
        };
        self.journal.push(OtpWrite {
            row: cmd.row(),
            mode: cmd.mode(),
            data: data.to_vec(),
            status,
        });
        status
    }

    fn write_sw_lock(&mut self, page: u8, value: u32) {
        // SW_LOCK bits can be advanced but not cleared until reset.
        self.sw_lock[page as usize] |= value;
        self.sw_lock_writes.push((page, value));
    }
}
