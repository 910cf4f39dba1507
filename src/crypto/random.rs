//! CSPRNG access for salts, IVs and generated keys.

use crate::error::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Fill `buf` from the operating system CSPRNG.
///
/// A failing RNG is reported instead of panicking so callers never persist a
/// half-built envelope.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::CryptoPrimitive(format!("CSPRNG failure: {}", e)))
}

/// Return `N` random bytes.
pub fn random_array<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    fill_random(&mut out)?;
    Ok(out)
}
