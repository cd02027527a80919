/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the boot-time entry point that provisions the MKEK into
    write-once storage and publishes it.

--*/
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(feature = "rp2350", feature = "esp32"))]
compile_error!("features `rp2350` and `esp32` are mutually exclusive");

pub mod config;
pub mod flow;

pub use config::SecureBootConfig;
pub use flow::secure_boot::{write_secure_boot_policy, PolicyReport};
pub use flow::{
    provision_mkek, run_efuse_flow, run_otp_flow, EfuseKeySlot, KeyStorage, OtpFlowReport,
    OtpKeySlot, ProvisionReport,
};

use mkek_drivers::{cprintln, KeyCell, MkekKey};
use spin::Once;

/// The published MKEK.
pub static OTP_KEY_1: KeyCell = KeyCell::new();

static INIT: Once<()> = Once::new();

/// The MKEK, or `None` if it could not be provisioned or read. Callers must
/// treat `None` as the key-protection feature being unavailable.
pub fn otp_key_1() -> Option<&'static MkekKey> {
    OTP_KEY_1.get()
}

/// Provision and publish the MKEK on the compiled-in target.
///
/// Runs once per boot; later calls return immediately. Failures are logged
/// and leave the key unpublished.
pub fn init_secure_storage() {
    INIT.call_once(|| {
        cprintln!("[mkek] Initializing secure storage");
        run_backend();
    });
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rp2350")] {
        fn run_backend() {
            use mkek_drivers::{GetrandomSource, Otp, Rp2350Otp};

            let access = match unsafe { Rp2350Otp::new() } {
                Ok(access) => access,
                Err(err) => {
                    cprintln!("[mkek] OTP unavailable: 0x{:x}", u32::from(err));
                    return;
                }
            };
            let mut otp = Otp::new(access);
            let _ = run_otp_flow(
                &mut otp,
                &mut GetrandomSource,
                &OTP_KEY_1,
                SecureBootConfig::BUILD,
            );
        }
    } else if #[cfg(feature = "esp32")] {
        fn run_backend() {
            use mkek_drivers::{Efuse, EspIdfEfuse, GetrandomSource};

            if SecureBootConfig::BUILD.enabled {
                cprintln!("[sboot] Secure-boot provisioning is not supported on this target");
            }
            let mut efuse = Efuse::new(EspIdfEfuse);
            let _ = run_efuse_flow(&mut efuse, &mut GetrandomSource, &OTP_KEY_1);
        }
    } else {
        fn run_backend() {
            cprintln!("[mkek] No OTP backend compiled in");
        }
    }
}
