//! Local trust policy: who may call, and where certificates may come from.

pub mod access;
pub mod source;
