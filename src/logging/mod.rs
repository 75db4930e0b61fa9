// file: src/logging/mod.rs
// version: 1.0.0
// guid: 5b0f3d8e-0c86-4a57-9a1b-7d4b3c1f2e60

//! Logging setup for the certificate installer

pub mod logger;

pub use logger::{init_json_logger, init_logger, with_async_operation_span};
