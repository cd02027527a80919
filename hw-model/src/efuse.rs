// Licensed under the Apache-2.0 license

use std::cell::{Cell, RefCell};

use mkek_drivers::{
    EfuseAccess, EfuseBlock, KeyPurpose, EFUSE_KEY_BLOCK_SIZE, ESP_ERR_INVALID_ARG,
    ESP_ERR_INVALID_STATE, ESP_OK,
};

/// State of one simulated key block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimKeyBlock {
    pub data: [u8; EFUSE_KEY_BLOCK_SIZE],
    pub purpose: KeyPurpose,
    pub key_dis_write: bool,
    pub purpose_dis_write: bool,
}

impl Default for SimKeyBlock {
    fn default() -> Self {
        Self {
            data: [0; EFUSE_KEY_BLOCK_SIZE],
            purpose: KeyPurpose::User,
            key_dis_write: false,
            purpose_dis_write: false,
        }
    }
}

/// Calls made into the simulated eFuse component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EfuseCall {
    WriteKey(EfuseBlock),
    SetKeyDisWrite(EfuseBlock),
    SetKeyPurposeDisWrite(EfuseBlock),
    ReadKey(EfuseBlock),
}

/// Simulated ESP32 eFuse controller with six key blocks.
#[derive(Default)]
pub struct SimEfuse {
    blocks: [SimKeyBlock; 6],
    calls: RefCell<Vec<EfuseCall>>,
    fail_write_key: Option<i32>,
    fail_key_dis_write: Option<i32>,
    fail_keypurpose_dis_write: Option<i32>,
    fail_read_key: Cell<Option<i32>>,
}

impl SimEfuse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload `block` as already provisioned with `key`.
    pub fn with_key(mut self, block: EfuseBlock, purpose: KeyPurpose, key: [u8; 32]) -> Self {
        self.blocks[block.key_index()] = SimKeyBlock {
            data: key,
            purpose,
            key_dis_write: true,
            purpose_dis_write: true,
        };
        self
    }

    pub fn block(&self, block: EfuseBlock) -> &SimKeyBlock {
        &self.blocks[block.key_index()]
    }

    pub fn calls(&self) -> Vec<EfuseCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: EfuseCall) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.borrow_mut().clear();
    }

    pub fn fail_write_key(&mut self, status: i32) {
        self.fail_write_key = Some(status);
    }

    pub fn fail_key_dis_write(&mut self, status: i32) {
        self.fail_key_dis_write = Some(status);
    }

    pub fn fail_keypurpose_dis_write(&mut self, status: i32) {
        self.fail_keypurpose_dis_write = Some(status);
    }

    pub fn fail_read_key(&mut self, status: i32) {
        self.fail_read_key.set(Some(status));
    }
}

impl EfuseAccess for SimEfuse {
    fn key_block_unused(&self, block: EfuseBlock) -> bool {
        let b = self.block(block);
        b.purpose == KeyPurpose::User
            && !b.key_dis_write
            && !b.purpose_dis_write
            && b.data.iter().all(|&x| x == 0)
    }

    fn write_key(&mut self, block: EfuseBlock, purpose: KeyPurpose, key: &[u8]) -> i32 {
        self.calls.borrow_mut().push(EfuseCall::WriteKey(block));
        if let Some(status) = self.fail_write_key.take() {
            return status;
        }
        if key.len() > EFUSE_KEY_BLOCK_SIZE {
            return ESP_ERR_INVALID_ARG;
        }
        if !self.key_block_unused(block) {
            return ESP_ERR_INVALID_STATE;
        }
        let b = &mut self.blocks[block.key_index()];
        b.data[..key.len()].copy_from_slice(key);
        b.purpose = purpose;
        ESP_OK
    }

    fn set_key_dis_write(&mut self, block: EfuseBlock) -> i32 {
        self.calls.borrow_mut().push(EfuseCall::SetKeyDisWrite(block));
        if let Some(status) = self.fail_key_dis_write.take() {
            return status;
        }
        self.blocks[block.key_index()].key_dis_write = true;
        ESP_OK
    }

    fn set_keypurpose_dis_write(&mut self, block: EfuseBlock) -> i32 {
        self.calls.borrow_mut().push(EfuseCall::SetKeyPurposeDisWrite(block));
        if let Some(status) = self.fail_keypurpose_dis_write.take() {
            return status;
        }
        self.blocks[block.key_index()].purpose_dis_write = true;
        ESP_OK
    }

    // Status reads are not journaled.
    fn get_key_dis_write(&self, block: EfuseBlock) -> bool {
        self.block(block).key_dis_write
    }

    fn get_keypurpose_dis_write(&self, block: EfuseBlock) -> bool {
        self.block(block).purpose_dis_write
    }

    fn read_key(&self, block: EfuseBlock, out: &mut [u8]) -> i32 {
        self.calls.borrow_mut().push(EfuseCall::ReadKey(block));
        if let Some(status) = self.fail_read_key.take() {
            return status;
        }
        if out.len() > EFUSE_KEY_BLOCK_SIZE {
            return ESP_ERR_INVALID_ARG;
        }
        out.copy_from_slice(&self.block(block).data[..out.len()]);
        ESP_OK
    }
}
