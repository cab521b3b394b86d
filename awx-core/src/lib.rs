//! AWX Core
//!
//! Provider-neutral types shared by the AWX provider, the state store and the
//! command-line harness: resource values, attribute schemas and the
//! `Provider` trait.

pub mod provider;
pub mod resource;
pub mod schema;
