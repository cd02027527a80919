/*++

Licensed under the Apache-2.0 license.

File Name:

    mod.rs

Abstract:

    File contains the key provisioning routine shared by the OTP and eFuse
    pipelines.

--*/

mod efuse;
mod otp;
pub mod secure_boot;

pub use efuse::{run_efuse_flow, EfuseKeySlot};
pub use otp::{run_otp_flow, OtpFlowReport, OtpKeySlot};

use mkek_drivers::{cprintln, KeyCell, MkekError, MkekKey, MkekResult, RandomSource};
use zerocopy::IntoBytes;

/// Write-once storage slot holding the MKEK.
pub trait KeyStorage {
    /// True while the slot has never been written.
    fn is_key_blank(&self) -> bool;

    /// Persist `key`. Called at most once, on a blank slot.
    fn program_key(&mut self, key: &MkekKey) -> MkekResult<()>;

    /// Make the slot permanently read-only. Runs on every boot that finds
    /// the slot written.
    fn lock_key(&mut self) -> MkekResult<()>;

    fn read_key(&self) -> MkekResult<MkekKey>;
}

/// Outcome of one provisioning pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
    /// A new key was drawn from the random source.
    pub generated: bool,

    /// The key was published to the key cell.
    pub published: bool,

    pub write_error: Option<MkekError>,
    pub lock_error: Option<MkekError>,

    /// Readback or publication failure.
    pub read_error: Option<MkekError>,
}

fn log_error(step: &str, err: MkekError) {
    cprintln!("[mkek] {} failed: 0x{:x}", step, u32::from(err));
}

/// Provision the MKEK into `storage` and publish it in `cell`.
///
/// A blank slot gets a fresh key from `rng`; a written slot is only read.
/// Every step is attempted in order and failures are reported instead of
/// propagated. A write that leaves the slot blank ends the pass before the
/// lock. The key is published only once it reads back non-blank and,
/// when it was just written, equal to the generated key.
pub fn provision_mkek<S, R>(storage: &mut S, rng: &mut R, cell: &KeyCell) -> ProvisionReport
where
    S: KeyStorage,
    R: RandomSource,
{
    cprintln!("[mkek] ++");
    let mut report = ProvisionReport::default();

    let mut written = None;
    if storage.is_key_blank() {
        cprintln!("[mkek] Key slot blank, generating MKEK");
        let mut key = MkekKey::default();
        rng.fill_random(key.as_mut_bytes());
        report.generated = true;

        if key.is_blank() {
            // Nothing to persist. Leave the slot writable for the next boot.
            cprintln!("[mkek] Random source returned a blank key");
            report.write_error = Some(MkekError::PROV_MKEK_NOT_PROVISIONED);
            cprintln!("[mkek] --");
            return report;
        }

        if let Err(err) = storage.program_key(&key) {
            log_error("Key write", err);
            report.write_error = Some(err);
            if storage.is_key_blank() {
                // Nothing landed. Leave the slot writable for the next boot.
                cprintln!("[mkek] Key slot still blank, leaving it unlocked");
                cprintln!("[mkek] --");
                return report;
            }
        }
        written = Some(key);
    } else {
        cprintln!("[mkek] Key slot already provisioned");
    }

    if let Err(err) = storage.lock_key() {
        log_error("Key lock", err);
        report.lock_error = Some(err);
    }

    let result = storage.read_key().and_then(|key| {
        if key.is_blank() {
            return Err(MkekError::PROV_MKEK_NOT_PROVISIONED);
        }
        if written.as_ref().is_some_and(|w| *w != key) {
            return Err(MkekError::PROV_MKEK_READBACK_MISMATCH);
        }
        cell.publish(key).map(|_| ())
    });
    match result {
        Ok(()) => {
            cprintln!("[mkek] MKEK available");
            report.published = true;
        }
        Err(err) => {
            log_error("Key readback", err);
            report.read_error = Some(err);
        }
    }

    cprintln!("[mkek] --");
    report
}
