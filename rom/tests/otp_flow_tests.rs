// Licensed under the Apache-2.0 license

use mkek_drivers::{
    page_lock_rows, KeyCell, MkekError, Otp, BOOTROM_ERROR_UNSUPPORTED_MODIFICATION,
    OTP_PAGE_LOCK_SENTINEL, OTP_SW_LOCK_NSEC_INACCESSIBLE,
};
use mkek_hw_model::{SimOtp, SimRng};
use mkek_rom::config::OTP_MKEK_ROW;
use mkek_rom::{run_otp_flow, SecureBootConfig};

const MKEK_PAGE: u8 = 59;

#[test]
fn test_blank_row_is_provisioned() {
    let mut otp = Otp::new(SimOtp::new());
    let mut rng = SimRng::new(1);
    let cell = KeyCell::new();
    assert!(otp.is_empty(OTP_MKEK_ROW, 32));

    let report = run_otp_flow(&mut otp, &mut rng, &cell, SecureBootConfig::DISABLED);

    assert!(report.mkek.generated);
    assert!(report.mkek.published);
    assert_eq!(report.mkek.write_error, None);
    assert_eq!(report.mkek.lock_error, None);
    assert_eq!(report.policy, None);
    assert_eq!(rng.draws(), 1);
    assert!(!otp.is_empty(OTP_MKEK_ROW, 32));

    let stored = otp.ecc_bytes::<32>(OTP_MKEK_ROW).unwrap();
    assert_eq!(cell.get().unwrap().0, stored);
    let writes = otp.access().writes_to(OTP_MKEK_ROW);
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].data, stored.to_vec());
}

#[test]
fn test_provisioned_row_is_only_read() {
    let key: [u8; 32] = core::array::from_fn(|i| 0x80 | i as u8);
    let mut otp = Otp::new(SimOtp::new().with_ecc_data(OTP_MKEK_ROW, &key));
    let mut rng = SimRng::new(1);
    let cell = KeyCell::new();

    let report = run_otp_flow(&mut otp, &mut rng, &cell, SecureBootConfig::DISABLED);

    assert!(!report.mkek.generated);
    assert!(report.mkek.published);
    assert_eq!(rng.draws(), 0);
    assert!(otp.access().writes_to(OTP_MKEK_ROW).is_empty());
    assert_eq!(cell.get().unwrap().0, key);
}

#[test]
fn test_provisioning_is_idempotent() {
    let mut otp = Otp::new(SimOtp::new());
    let mut rng = SimRng::new(7);

    let first = KeyCell::new();
    run_otp_flow(&mut otp, &mut rng, &first, SecureBootConfig::DISABLED);
    let journal_len = otp.access().journal().len();

    // Next boot: fresh key cell, same storage.
    let second = KeyCell::new();
    let report = run_otp_flow(&mut otp, &mut rng, &second, SecureBootConfig::DISABLED);

    assert!(!report.mkek.generated);
    assert!(report.mkek.published);
    assert_eq!(rng.draws(), 1);
    assert_eq!(otp.access().journal().len(), journal_len);
    assert_eq!(otp.access().writes_to(OTP_MKEK_ROW).len(), 1);
    assert_eq!(first.get(), second.get());
}

#[test]
fn test_key_page_is_locked() {
    let mut otp = Otp::new(SimOtp::new());
    let cell = KeyCell::new();
    run_otp_flow(&mut otp, &mut SimRng::new(3), &cell, SecureBootConfig::DISABLED);

    let (_, lock1) = page_lock_rows(MKEK_PAGE);
    assert!(otp.is_locked_page(MKEK_PAGE).unwrap());
    assert_eq!(otp.raw_word(lock1).unwrap(), OTP_PAGE_LOCK_SENTINEL);
    assert_eq!(otp.access().sw_lock(MKEK_PAGE), OTP_SW_LOCK_NSEC_INACCESSIBLE);

    // The key rows are now permanently read-only.
    assert_eq!(
        otp.write_data(OTP_MKEK_ROW, &[0xff; 32]),
        Err(MkekError::DRIVER_OTP_WRITE_FAILED)
    );
}

#[test]
fn test_locked_page_is_not_relocked() {
    let (_, lock1) = page_lock_rows(MKEK_PAGE);
    let key = [0x5au8; 32];
    let sim = SimOtp::new()
        .with_ecc_data(OTP_MKEK_ROW, &key)
        .with_raw(lock1, OTP_PAGE_LOCK_SENTINEL);
    let mut otp = Otp::new(sim);
    let cell = KeyCell::new();

    let report = run_otp_flow(&mut otp, &mut SimRng::new(3), &cell, SecureBootConfig::DISABLED);

    assert!(report.mkek.published);
    assert!(otp.access().journal().is_empty());
    assert_eq!(
        otp.access().sw_lock_writes(),
        &[(MKEK_PAGE, OTP_SW_LOCK_NSEC_INACCESSIBLE)][..]
    );
}

#[test]
fn test_write_failure_leaves_key_unpublished() {
    let mut otp = Otp::new(SimOtp::new());
    otp.access_mut()
        .fail_next_write(BOOTROM_ERROR_UNSUPPORTED_MODIFICATION);
    let cell = KeyCell::new();

    let report = run_otp_flow(&mut otp, &mut SimRng::new(1), &cell, SecureBootConfig::DISABLED);

    assert!(report.mkek.generated);
    assert!(!report.mkek.published);
    assert_eq!(
        report.mkek.write_error,
        Some(MkekError::DRIVER_OTP_WRITE_FAILED)
    );
    assert_eq!(report.mkek.read_error, None);
    assert!(cell.get().is_none());
    assert!(otp.is_empty(OTP_MKEK_ROW, 32));
    assert!(!otp.is_locked_page(MKEK_PAGE).unwrap());
    assert!(otp.access().sw_lock_writes().is_empty());
}

#[test]
fn test_key_written_on_boot_after_failed_write() {
    let mut otp = Otp::new(SimOtp::new());
    let mut rng = SimRng::new(1);
    otp.access_mut()
        .fail_next_write(BOOTROM_ERROR_UNSUPPORTED_MODIFICATION);

    let first = KeyCell::new();
    let report = run_otp_flow(&mut otp, &mut rng, &first, SecureBootConfig::DISABLED);
    assert!(!report.mkek.published);
    assert!(!otp.is_locked_page(MKEK_PAGE).unwrap());

    let second = KeyCell::new();
    let report = run_otp_flow(&mut otp, &mut rng, &second, SecureBootConfig::DISABLED);

    assert!(report.mkek.generated);
    assert!(report.mkek.published);
    assert_eq!(report.mkek.write_error, None);
    assert_eq!(rng.draws(), 2);
    assert!(otp.is_locked_page(MKEK_PAGE).unwrap());
    assert_eq!(
        second.get().unwrap().0,
        otp.ecc_bytes::<32>(OTP_MKEK_ROW).unwrap()
    );
}

#[test]
fn test_failing_random_source_leaves_slot_writable() {
    let mut otp = Otp::new(SimOtp::new());
    let mut rng = SimRng::failing();
    let cell = KeyCell::new();

    let report = run_otp_flow(&mut otp, &mut rng, &cell, SecureBootConfig::DISABLED);

    assert!(report.mkek.generated);
    assert!(!report.mkek.published);
    assert_eq!(
        report.mkek.write_error,
        Some(MkekError::PROV_MKEK_NOT_PROVISIONED)
    );
    assert!(otp.access().journal().is_empty());
    assert!(!otp.is_locked_page(MKEK_PAGE).unwrap());
    assert!(cell.get().is_none());
}

#[test]
fn test_policy_runs_after_failed_provisioning() {
    let mut otp = Otp::new(SimOtp::new());
    let config = SecureBootConfig::new(true, false, 0).unwrap();
    let cell = KeyCell::new();

    let report = run_otp_flow(&mut otp, &mut SimRng::failing(), &cell, config);

    assert!(!report.mkek.published);
    let policy = report.policy.unwrap();
    assert_eq!(policy.failed_writes, 0);
    assert_eq!(otp.raw_word(0x040).unwrap(), 0x01);
}
