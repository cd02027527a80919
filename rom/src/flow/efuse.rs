/*++

Licensed under the Apache-2.0 license.

File Name:

    efuse.rs

Abstract:

    File contains the ESP32 eFuse provisioning pipeline.

--*/

use super::{provision_mkek, KeyStorage, ProvisionReport};
use crate::config::{MKEK_EFUSE_BLOCK, MKEK_EFUSE_PURPOSE};
use mkek_drivers::{
    Efuse, EfuseAccess, EfuseBlock, KeyCell, MkekKey, MkekResult, RandomSource,
};
use zerocopy::IntoBytes;

/// MKEK slot backed by an eFuse key block.
pub struct EfuseKeySlot<'a, A: EfuseAccess> {
    efuse: &'a mut Efuse<A>,
    block: EfuseBlock,
}

impl<'a, A: EfuseAccess> EfuseKeySlot<'a, A> {
    pub fn new(efuse: &'a mut Efuse<A>, block: EfuseBlock) -> Self {
        Self { efuse, block }
    }
}

impl<A: EfuseAccess> KeyStorage for EfuseKeySlot<'_, A> {
    fn is_key_blank(&self) -> bool {
        self.efuse.key_block_unused(self.block)
    }

    fn program_key(&mut self, key: &MkekKey) -> MkekResult<()> {
        self.efuse
            .write_key(self.block, MKEK_EFUSE_PURPOSE, key.as_bytes())
    }

    /// Write-protects the key value and its purpose, skipping whichever is
    /// already protected. Both are attempted; the first failure is returned.
    fn lock_key(&mut self) -> MkekResult<()> {
        let mut result = Ok(());
        if !self.efuse.key_dis_write(self.block) {
            result = self.efuse.set_key_dis_write(self.block);
        }
        if !self.efuse.keypurpose_dis_write(self.block) {
            result = result.and(self.efuse.set_keypurpose_dis_write(self.block));
        }
        result
    }

    fn read_key(&self) -> MkekResult<MkekKey> {
        let mut key = MkekKey::default();
        self.efuse.read_key(self.block, key.as_mut_bytes())?;
        Ok(key)
    }
}

/// Provision the MKEK into its key block and publish it.
pub fn run_efuse_flow<A, R>(efuse: &mut Efuse<A>, rng: &mut R, cell: &KeyCell) -> ProvisionReport
where
    A: EfuseAccess,
    R: RandomSource,
{
    provision_mkek(&mut EfuseKeySlot::new(efuse, MKEK_EFUSE_BLOCK), rng, cell)
}
