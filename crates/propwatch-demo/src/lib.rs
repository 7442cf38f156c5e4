#![forbid(unsafe_code)]

//! propwatch demo library.
//!
//! Exposes the demo scenarios and CLI parsing so tests can run them without
//! the binary.

pub mod cli;
pub mod scenarios;
