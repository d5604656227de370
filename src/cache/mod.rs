//! Certificate cache layer.

pub mod certs;
