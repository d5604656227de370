//! Certificate retrieval.

pub mod http;
