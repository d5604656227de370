//! Cryptographic primitives for request verification.

pub mod certificate;
pub mod digest;
pub mod freshness;
pub mod pipeline;
pub mod signing;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_utils;
