// Licensed under the Apache-2.0 license

use mkek_drivers::{
    page_lock_rows, MkekError, Otp, BOOTROM_ERROR_NOT_PERMITTED, OTP_PAGE_LOCK_SENTINEL,
    OTP_SW_LOCK_NSEC_INACCESSIBLE,
};
use mkek_hw_model::SimOtp;

#[test]
fn test_write_rejects_bad_lengths() {
    let mut otp = Otp::new(SimOtp::new());
    assert_eq!(
        otp.write_data(0x100, &[]),
        Err(MkekError::DRIVER_OTP_INVALID_LENGTH)
    );
    assert_eq!(
        otp.write_data(0x100, &[1, 2, 3]),
        Err(MkekError::DRIVER_OTP_INVALID_LENGTH)
    );
    assert_eq!(
        otp.write_data(0x100, &[1; 66]),
        Err(MkekError::DRIVER_OTP_INVALID_LENGTH)
    );
    assert_eq!(
        otp.write_data_raw(0x100, &[1, 2]),
        Err(MkekError::DRIVER_OTP_INVALID_LENGTH)
    );
    assert!(otp.access().journal().is_empty());
}

#[test]
fn test_write_rejects_rows_outside_array() {
    let mut otp = Otp::new(SimOtp::new());
    assert_eq!(
        otp.write_data(0x1000, &[1, 0]),
        Err(MkekError::DRIVER_OTP_INVALID_ROW)
    );
    // The last row fits, the one after it does not.
    assert_eq!(
        otp.write_data(0xfff, &[1, 0, 1, 0]),
        Err(MkekError::DRIVER_OTP_INVALID_ROW)
    );
    assert_eq!(otp.raw_word(0x1000), Err(MkekError::DRIVER_OTP_INVALID_ROW));
    assert_eq!(otp.lock_page(64), Err(MkekError::DRIVER_OTP_INVALID_PAGE));
    assert!(otp.access().journal().is_empty());
    assert!(otp.access().sw_lock_writes().is_empty());
}

#[test]
fn test_ecc_write_and_read() {
    let mut otp = Otp::new(SimOtp::new());
    let data: Vec<u8> = (1..=32).collect();
    assert!(otp.is_empty(0xef0, 32));

    otp.write_data(0xef0, &data).unwrap();

    assert!(!otp.is_empty(0xef0, 32));
    assert_eq!(otp.ecc_bytes::<32>(0xef0).unwrap().to_vec(), data);
    assert_eq!(otp.raw_word(0xef0).unwrap() & 0xffff, 0x0201);
}

#[test]
fn test_is_empty_single_byte() {
    for i in 0..32 {
        let mut data = [0u8; 32];
        data[i] = 0x80;
        let otp = Otp::new(SimOtp::new().with_ecc_data(0x200, &data));
        assert!(!otp.is_empty(0x200, 32), "byte {i}");
        assert!(otp.is_empty(0x210, 32));
    }
}

#[test]
fn test_is_empty_outside_array() {
    let otp = Otp::new(SimOtp::new());
    assert!(otp.is_empty(0xff0, 32));
    assert!(!otp.is_empty(0xff1, 32));
}

#[test]
fn test_write_failure_is_reported() {
    let mut otp = Otp::new(SimOtp::new());
    otp.access_mut().fail_next_write(BOOTROM_ERROR_NOT_PERMITTED);
    assert_eq!(
        otp.write_data(0x300, &[1, 0]),
        Err(MkekError::DRIVER_OTP_WRITE_FAILED)
    );
    assert_eq!(otp.access().journal().len(), 1);
    assert!(otp.is_empty(0x300, 2));
}

#[test]
fn test_lock_page_writes_sentinel() {
    let mut otp = Otp::new(SimOtp::new());
    let (_, lock1) = page_lock_rows(59);
    assert!(!otp.is_locked_page(59).unwrap());

    otp.lock_page(59).unwrap();

    assert!(otp.is_locked_page(59).unwrap());
    assert_eq!(otp.raw_word(lock1).unwrap(), OTP_PAGE_LOCK_SENTINEL);
    assert_eq!(otp.access().writes_to(lock1).len(), 1);
    assert_eq!(otp.access().sw_lock(59), OTP_SW_LOCK_NSEC_INACCESSIBLE);

    // Rows of a locked page no longer accept writes.
    assert_eq!(
        otp.write_data(59 * 64, &[1, 0]),
        Err(MkekError::DRIVER_OTP_WRITE_FAILED)
    );
}

#[test]
fn test_lock_state_comes_from_lock1_only() {
    let (lock0, lock1) = page_lock_rows(59);
    let otp = Otp::new(SimOtp::new().with_raw(lock0, OTP_PAGE_LOCK_SENTINEL));
    assert!(!otp.is_locked_page(59).unwrap());

    // Two of three lanes is not enough.
    let otp = Otp::new(SimOtp::new().with_raw(lock1, OTP_PAGE_LOCK_SENTINEL & 0x00_ffff));
    assert!(!otp.is_locked_page(59).unwrap());
}

#[test]
fn test_lock_page_preserves_existing_bits() {
    let (_, lock1) = page_lock_rows(10);
    let mut otp = Otp::new(SimOtp::new().with_raw(lock1, 0x0001_0101));

    otp.lock_page(10).unwrap();

    assert_eq!(otp.raw_word(lock1).unwrap(), 0x003d_3d3d);
    assert!(otp.is_locked_page(10).unwrap());
}

#[test]
fn test_lock_page_already_locked() {
    let (_, lock1) = page_lock_rows(59);
    let mut otp = Otp::new(SimOtp::new().with_raw(lock1, OTP_PAGE_LOCK_SENTINEL));

    otp.lock_page(59).unwrap();
    otp.lock_page(59).unwrap();

    assert!(otp.access().journal().is_empty());
    let expected: [(u8, u32); 2] = [(59, OTP_SW_LOCK_NSEC_INACCESSIBLE); 2];
    assert_eq!(otp.access().sw_lock_writes(), &expected[..]);
}

#[test]
fn test_lock_page_sets_sw_lock_on_failure() {
    let mut otp = Otp::new(SimOtp::new());
    otp.access_mut().fail_next_write(-1);

    assert_eq!(otp.lock_page(5), Err(MkekError::DRIVER_OTP_WRITE_FAILED));

    assert!(!otp.is_locked_page(5).unwrap());
    assert_eq!(otp.access().sw_lock(5), OTP_SW_LOCK_NSEC_INACCESSIBLE);
}
