//! Shared infrastructure for the CoreBridge CLI binary.

pub mod logging;
