//! Adapters Layer (Driven Adapters)
//!
//! Reference implementations of the outbound ports.
//!
//! ## Adapters
//!
//! - `FormCanonicalizer` - Canonicalizer for JSON form payloads
//! - `InMemoryScopedStorage` - Session-lifetime key/value storage
//! - `HostPrimitiveProbe` - Capability probe running the primitive self-test
//! - `BuiltinStrongSuiteLoader` / `DisabledStrongSuiteLoader` - Strong-suite loaders

pub mod canonical;
pub mod probe;
pub mod storage;
pub mod strong_suite;

pub use canonical::FormCanonicalizer;
pub use probe::HostPrimitiveProbe;
pub use storage::InMemoryScopedStorage;
pub use strong_suite::{BuiltinStrongSuiteLoader, DisabledStrongSuiteLoader, MlKem768Module};
