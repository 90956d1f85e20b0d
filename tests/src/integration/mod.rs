//! Cross-crate integration flows.

pub mod collector;
mod flows;
