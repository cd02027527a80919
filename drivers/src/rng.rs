/*++

Licensed under the Apache-2.0 license.

File Name:

    rng.rs

Abstract:

    File contains the random source used to generate the MKEK.

--*/

use crate::cprintln;

/// Source of cryptographically strong random bytes.
///
/// Filling is infallible from the caller's point of view.
pub trait RandomSource {
    fn fill_random(&mut self, buf: &mut [u8]);
}

/// Random source backed by the platform entropy provider registered with
/// `getrandom`.
#[derive(Default)]
pub struct GetrandomSource;

impl RandomSource for GetrandomSource {
    fn fill_random(&mut self, buf: &mut [u8]) {
        if let Err(err) = getrandom::getrandom(buf) {
            // Leave the buffer blank so that nothing partial is persisted.
            buf.fill(0);
            cprintln!("[rng] getrandom failed: {}", err.code().get());
        }
    }
}
