//! # Quantum-Seal Test Suite
//!
//! Unified test crate for flows that span crates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── collector.rs  # Mock collector transport that opens envelopes
//!     └── flows.rs      # End-to-end submission flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qs-tests
//! cargo test -p qs-tests integration::
//! ```

#![allow(dead_code)]

pub mod integration;
