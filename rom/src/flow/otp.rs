/*++

Licensed under the Apache-2.0 license.

File Name:

    otp.rs

Abstract:

    File contains the RP2350 OTP provisioning pipeline.

--*/

use super::secure_boot::{write_secure_boot_policy, PolicyReport};
use super::{provision_mkek, KeyStorage, ProvisionReport};
use crate::config::{SecureBootConfig, OTP_MKEK_ROW};
use mkek_drivers::{
    page_of, KeyCell, MkekKey, MkekResult, Otp, OtpAccess, RandomSource, MKEK_SIZE,
};
use zerocopy::IntoBytes;

/// MKEK slot backed by consecutive ECC rows.
pub struct OtpKeySlot<'a, A: OtpAccess> {
    otp: &'a mut Otp<A>,
    row: u16,
}

impl<'a, A: OtpAccess> OtpKeySlot<'a, A> {
    pub fn new(otp: &'a mut Otp<A>, row: u16) -> Self {
        Self { otp, row }
    }
}

impl<A: OtpAccess> KeyStorage for OtpKeySlot<'_, A> {
    fn is_key_blank(&self) -> bool {
        self.otp.is_empty(self.row, MKEK_SIZE)
    }

    fn program_key(&mut self, key: &MkekKey) -> MkekResult<()> {
        self.otp.write_data(self.row, key.as_bytes())
    }

    /// Locks the whole page containing the key.
    fn lock_key(&mut self) -> MkekResult<()> {
        self.otp.lock_page(page_of(self.row))
    }

    fn read_key(&self) -> MkekResult<MkekKey> {
        let mut key = MkekKey::default();
        self.otp.read_ecc(self.row, key.as_mut_bytes())?;
        Ok(key)
    }
}

/// Outcome of the OTP pipeline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpFlowReport {
    pub mkek: ProvisionReport,

    /// `None` when secure-boot provisioning is disabled.
    pub policy: Option<PolicyReport>,
}

/// Provision the MKEK at its fixed row, lock its page, publish it and then
/// apply the secure-boot policy selected by `config`.
///
/// The policy is written even if the MKEK could not be provisioned.
pub fn run_otp_flow<A, R>(
    otp: &mut Otp<A>,
    rng: &mut R,
    cell: &KeyCell,
    config: SecureBootConfig,
) -> OtpFlowReport
where
    A: OtpAccess,
    R: RandomSource,
{
    let mkek = provision_mkek(&mut OtpKeySlot::new(otp, OTP_MKEK_ROW), rng, cell);
    let policy = config
        .enabled
        .then(|| write_secure_boot_policy(otp, &config));
    OtpFlowReport { mkek, policy }
}
