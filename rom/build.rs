/*++

Licensed under the Apache-2.0 license.

File Name:

    build.rs

Abstract:

    Build script for the MKEK provisioning ROM library.

--*/

fn main() {
    println!("cargo:rerun-if-env-changed=MKEK_BOOTKEY_INDEX");
    println!("cargo:rerun-if-changed=build.rs");

    if let Ok(index) = std::env::var("MKEK_BOOTKEY_INDEX") {
        match index.parse::<u8>() {
            Ok(0..=3) => {}
            _ => panic!("MKEK_BOOTKEY_INDEX must be 0, 1, 2 or 3 (got {index:?})"),
        }
    }
}
