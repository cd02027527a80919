/*++

Licensed under the Apache-2.0 license.

File Name:

    key.rs

Abstract:

    File contains the MKEK type and the write-once cell it is published in.

--*/

use core::fmt;

use mkek_error::{MkekError, MkekResult};
use spin::Once;
use subtle::{Choice, ConstantTimeEq};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the MKEK in bytes.
pub const MKEK_SIZE: usize = 32;

/// Master key-encryption key.
#[repr(transparent)]
#[derive(Clone, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize, ZeroizeOnDrop)]
pub struct MkekKey(pub [u8; MKEK_SIZE]);

impl MkekKey {
    /// True if every byte is zero, i.e. indistinguishable from blank storage.
    pub fn is_blank(&self) -> bool {
        crate::is_empty_buffer(&self.0)
    }
}

impl ConstantTimeEq for MkekKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

// Comparison time does not depend on where the keys differ.
impl PartialEq for MkekKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for MkekKey {}

impl fmt::Debug for MkekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MkekKey(..)")
    }
}

/// Holds the published MKEK.
///
/// Starts unset and is written at most once; an unset cell means the key is
/// unavailable, which is distinct from a key of all zeros.
pub struct KeyCell {
    key: Once<MkekKey>,
}

impl KeyCell {
    pub const fn new() -> Self {
        Self { key: Once::new() }
    }

    /// Publish `key`. Fails if a key was already published; the existing
    /// key is left untouched.
    pub fn publish(&self, key: MkekKey) -> MkekResult<&MkekKey> {
        let mut key = Some(key);
        let published = self.key.call_once(|| key.take().unwrap_or_default());
        match key {
            None => Ok(published),
            // `key` still held: the closure did not run.
            Some(_) => Err(MkekError::PROV_MKEK_ALREADY_PUBLISHED),
        }
    }

    pub fn get(&self) -> Option<&MkekKey> {
        self.key.get()
    }

    pub fn is_published(&self) -> bool {
        self.key.is_completed()
    }
}

impl Default for KeyCell {
    fn default() -> Self {
        Self::new()
    }
}
