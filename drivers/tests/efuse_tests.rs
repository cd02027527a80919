// Licensed under the Apache-2.0 license

use mkek_drivers::{Efuse, EfuseBlock, KeyPurpose, MkekError, ESP_ERR_EFUSE, ESP_FAIL};
use mkek_hw_model::{EfuseCall, SimEfuse};

#[test]
fn test_write_and_read_key() {
    let mut efuse = Efuse::new(SimEfuse::new());
    assert!(efuse.key_block_unused(EfuseBlock::Key3));

    efuse
        .write_key(EfuseBlock::Key3, KeyPurpose::User, &[0x42; 32])
        .unwrap();

    assert!(!efuse.key_block_unused(EfuseBlock::Key3));
    assert!(efuse.key_block_unused(EfuseBlock::Key2));
    let mut out = [0u8; 32];
    efuse.read_key(EfuseBlock::Key3, &mut out).unwrap();
    assert_eq!(out, [0x42; 32]);
}

#[test]
fn test_used_block_refuses_writes() {
    let sim = SimEfuse::new().with_key(EfuseBlock::Key3, KeyPurpose::User, [0x11; 32]);
    let mut efuse = Efuse::new(sim);
    assert_eq!(
        efuse.write_key(EfuseBlock::Key3, KeyPurpose::User, &[0x42; 32]),
        Err(MkekError::DRIVER_EFUSE_WRITE_KEY_FAILED)
    );
    assert_eq!(efuse.access().block(EfuseBlock::Key3).data, [0x11; 32]);
}

#[test]
fn test_write_protection() {
    let mut efuse = Efuse::new(SimEfuse::new());
    assert!(!efuse.key_dis_write(EfuseBlock::Key1));
    efuse.set_key_dis_write(EfuseBlock::Key1).unwrap();
    assert!(efuse.key_dis_write(EfuseBlock::Key1));
    assert!(!efuse.keypurpose_dis_write(EfuseBlock::Key1));
    efuse.set_keypurpose_dis_write(EfuseBlock::Key1).unwrap();
    assert!(efuse.keypurpose_dis_write(EfuseBlock::Key1));

    let block = efuse.access().block(EfuseBlock::Key1);
    assert!(block.key_dis_write && block.purpose_dis_write);
    assert!(!efuse.key_dis_write(EfuseBlock::Key2));
    assert!(!efuse.key_block_unused(EfuseBlock::Key1));
}

#[test]
fn test_platform_errors_are_mapped() {
    let mut sim = SimEfuse::new();
    sim.fail_write_key(ESP_ERR_EFUSE);
    sim.fail_key_dis_write(ESP_FAIL);
    sim.fail_keypurpose_dis_write(ESP_FAIL);
    sim.fail_read_key(ESP_FAIL);
    let mut efuse = Efuse::new(sim);
    let block = EfuseBlock::Key0;

    assert_eq!(
        efuse.write_key(block, KeyPurpose::User, &[1; 32]),
        Err(MkekError::DRIVER_EFUSE_WRITE_KEY_FAILED)
    );
    assert_eq!(
        efuse.set_key_dis_write(block),
        Err(MkekError::DRIVER_EFUSE_KEY_DIS_WRITE_FAILED)
    );
    assert_eq!(
        efuse.set_keypurpose_dis_write(block),
        Err(MkekError::DRIVER_EFUSE_KEYPURPOSE_DIS_WRITE_FAILED)
    );
    let mut out = [0u8; 32];
    assert_eq!(
        efuse.read_key(block, &mut out),
        Err(MkekError::DRIVER_EFUSE_READ_KEY_FAILED)
    );
    assert_eq!(
        efuse.access().calls(),
        vec![
            EfuseCall::WriteKey(block),
            EfuseCall::SetKeyDisWrite(block),
            EfuseCall::SetKeyPurposeDisWrite(block),
            EfuseCall::ReadKey(block),
        ]
    );

    // Injected failures apply to one call only.
    assert!(efuse.read_key(block, &mut out).is_ok());
}
