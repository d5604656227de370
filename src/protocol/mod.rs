//! Inbound request protocol types.

pub mod models;
