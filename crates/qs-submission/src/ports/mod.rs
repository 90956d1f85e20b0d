//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that the form layer uses
//! - **Outbound (Driven)**: Collaborators this crate needs

pub mod inbound;
pub mod outbound;

pub use inbound::SecureSubmissionApi;
pub use outbound::{
    Canonicalizer, PrimitiveProbe, ScopedStorage, StrongSuiteLoader, StrongSuiteModule,
    SystemTimeSource, TimeSource, Timestamp, Transport,
};
