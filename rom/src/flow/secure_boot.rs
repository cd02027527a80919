/*++

Licensed under the Apache-2.0 license.

File Name:

    secure_boot.rs

Abstract:

    File contains the secure-boot policy writer for the RP2350 OTP.

--*/

use crate::config::{SecureBootConfig, BOOTKEY};
use mkek_drivers::printer::HexBytes;
use mkek_drivers::{
    cprintln, BootFlags1, Crit1Flags, MkekError, MkekResult, Otp, OtpAccess, PageLock1,
    OTP_DATA_BOOT_FLAGS1_ROWS, OTP_DATA_CRIT1_ROWS, OTP_DATA_PAGE1_LOCK1_ROW,
    OTP_DATA_PAGE2_LOCK1_ROW, OTP_RAW_ROW_MASK,
};

/// Outcome of the policy writer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PolicyReport {
    pub bootkey_written: bool,

    /// Number of row writes that failed.
    pub failed_writes: u32,

    pub last_error: Option<MkekError>,
}

impl PolicyReport {
    fn record(&mut self, row: u16, result: MkekResult<()>) {
        if let Err(err) = result {
            cprintln!("[sboot] Update of row 0x{:x} failed: 0x{:x}", row, u32::from(err));
            self.failed_writes += 1;
            self.last_error = Some(err);
        }
    }
}

fn write_raw_row<A: OtpAccess>(otp: &mut Otp<A>, row: u16, value: u32) -> MkekResult<()> {
    otp.write_data_raw(row, &value.to_le_bytes())
}

/// OR `bits` into each row of `rows`, starting from that row's own value.
fn or_rows<A: OtpAccess>(otp: &mut Otp<A>, rows: &[u16], bits: u32, report: &mut PolicyReport) {
    for &row in rows {
        let result = otp
            .raw_word(row)
            .and_then(|current| write_raw_row(otp, row, (current | bits) & OTP_RAW_ROW_MASK));
        report.record(row, result);
    }
}

/// Write the boot key, boot flags and chip criticals for `config`.
///
/// Every flag write merges with what the rows already hold. Failed writes
/// are counted and do not stop the remaining ones.
pub fn write_secure_boot_policy<A: OtpAccess>(
    otp: &mut Otp<A>,
    config: &SecureBootConfig,
) -> PolicyReport {
    let mut report = PolicyReport::default();
    if !config.enabled {
        return report;
    }
    cprintln!("[sboot] ++");

    let bootkey_row = config.bootkey_row();
    if otp.is_empty(bootkey_row, BOOTKEY.len()) {
        cprintln!(
            "[sboot] Writing boot key {}: {}",
            config.bootkey_index,
            HexBytes(&BOOTKEY)
        );
        let result = otp.write_data(bootkey_row, &BOOTKEY);
        report.bootkey_written = result.is_ok();
        report.record(bootkey_row, result);
    } else {
        cprintln!("[sboot] Boot key {} already present", config.bootkey_index);
    }

    let mut boot_flags = BootFlags1::key_valid(config.bootkey_index);
    if config.strict_lock {
        boot_flags |= BootFlags1::key_invalid_except(config.bootkey_index);
    }
    or_rows(otp, &OTP_DATA_BOOT_FLAGS1_ROWS, boot_flags.bits(), &mut report);

    let mut crit1 = Crit1Flags::SECURE_BOOT_ENABLE;
    if config.strict_lock {
        crit1 |= Crit1Flags::DEBUG_DISABLE
            | Crit1Flags::GLITCH_DETECTOR_ENABLE
            | Crit1Flags::GLITCH_DETECTOR_SENS;
    }
    or_rows(otp, &OTP_DATA_CRIT1_ROWS, crit1.bits(), &mut report);

    if config.strict_lock {
        cprintln!("[sboot] Locking bootloader pages");
        let lock = PageLock1::bootloader_read_only().replicated();
        or_rows(
            otp,
            &[OTP_DATA_PAGE1_LOCK1_ROW, OTP_DATA_PAGE2_LOCK1_ROW],
            lock,
            &mut report,
        );
    }

    cprintln!("[sboot] --");
    report
}
